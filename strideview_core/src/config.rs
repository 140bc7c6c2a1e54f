//! Render style and appearance configuration.
//!
//! Values only; the interactive property widgets that edit them live in
//! the host.

use serde::{Deserialize, Serialize};

/// Smallest accepted line width, meters.
pub const MIN_LINE_WIDTH: f64 = 0.001;

/// RGBA color, all channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }
}

/// Geometric encoding of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderStyle {
    /// Connected zero-width strip through all samples.
    Polyline,
    /// Screen-facing band of explicit line width.
    Ribbon,
    /// One discrete marker per step.
    #[default]
    PointSamples,
}

/// Per-kind appearance parameters (one instance for the base trajectory,
/// one for the contact trajectories).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    pub style: RenderStyle,
    /// Line width / point radius, meters.
    pub line_width: f64,
    /// Trajectory color; the alpha channel is the trajectory transparency.
    pub color: Rgba,
    /// Scale of the orientation-frame annotations. Only the base
    /// trajectory places annotations, contacts ignore it.
    pub axes_scale: f64,
}

impl Appearance {
    /// Clamps the parameters into their accepted ranges.
    pub fn sanitized(mut self) -> Self {
        self.line_width = self.line_width.max(MIN_LINE_WIDTH);
        self.color = self.color.clamped();
        self.axes_scale = self.axes_scale.max(0.0);
        self
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            style: RenderStyle::default(),
            line_width: 0.01,
            color: Rgba::new(0.0, 85.0 / 255.0, 1.0, 1.0),
            axes_scale: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_width_and_color() {
        let appearance = Appearance {
            style: RenderStyle::Ribbon,
            line_width: 0.0,
            color: Rgba::new(-0.5, 2.0, 0.5, 1.7),
            axes_scale: -1.0,
        }
        .sanitized();

        assert_eq!(appearance.line_width, MIN_LINE_WIDTH);
        assert_eq!(appearance.color, Rgba::new(0.0, 1.0, 0.5, 1.0));
        assert_eq!(appearance.axes_scale, 0.0);
    }

    #[test]
    fn default_matches_property_panel() {
        let appearance = Appearance::default();
        assert_eq!(appearance.style, RenderStyle::PointSamples);
        assert_eq!(appearance.line_width, 0.01);
        assert_eq!(appearance.axes_scale, 1.0);
        assert_eq!(appearance.color.a, 1.0);
    }
}
