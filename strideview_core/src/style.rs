//! Style selection state machine.
//!
//! One dispatcher per trajectory kind. A transition always tears down the
//! geometry of the previous style; the pipeline then repopulates under the
//! new style if a trajectory is loaded, so the display is never in a
//! mixed-style state.

use crate::config::RenderStyle;

/// Which trajectory a dispatcher (or a diagnostic) refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrajectoryKind {
    Base,
    Contact,
}

/// Outcome of a style-selection event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same style selected again; owned geometry stays valid.
    Unchanged,
    /// Style changed; destroy the old geometry and rebuild.
    Rebuild,
}

#[derive(Debug)]
pub struct StyleDispatcher {
    kind: TrajectoryKind,
    current: RenderStyle,
}

impl StyleDispatcher {
    pub fn new(kind: TrajectoryKind, initial: RenderStyle) -> Self {
        Self {
            kind,
            current: initial,
        }
    }

    pub fn kind(&self) -> TrajectoryKind {
        self.kind
    }

    pub fn current(&self) -> RenderStyle {
        self.current
    }

    /// Applies an external style selection.
    pub fn select(&mut self, next: RenderStyle) -> Transition {
        if next == self.current {
            Transition::Unchanged
        } else {
            self.current = next;
            Transition::Rebuild
        }
    }
}
