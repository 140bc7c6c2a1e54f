//! Error types for the visualization pipeline.

use thiserror::Error;

/// Errors raised at the pipeline's external seams.
///
/// None of these aborts a processing pass: frame failures fall back to the
/// identity transform, a busy sink drops the batch, and empty input turns
/// the pass into a no-op.
#[derive(Debug, Error)]
pub enum VizError {
    /// The frame provider could not resolve a message frame.
    #[error("cannot resolve frame '{frame}' at t={stamp}")]
    FrameUnresolved { frame: String, stamp: f64 },

    /// The marker sink was momentarily unavailable; the batch is dropped.
    #[error("marker sink busy, dropped batch of {0} markers")]
    SinkBusy(usize),

    /// The trajectory message carried no steps.
    #[error("trajectory has no steps")]
    EmptyTrajectory,

    /// The first trajectory step carried no base coordinates.
    #[error("trajectory step has no base coordinates")]
    MissingBase,
}

impl VizError {
    /// Creates a frame-resolution error.
    pub fn frame(frame: impl Into<String>, stamp: f64) -> Self {
        Self::FrameUnresolved {
            frame: frame.into(),
            stamp,
        }
    }
}
