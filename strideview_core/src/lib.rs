//! strideview - whole-body trajectory visualization pipeline
//!
//! Renders a legged robot's motion plan (a time-indexed sequence of base
//! poses and named end-effector contacts) as 3D drawable primitives:
//! 1. **Ad-hoc drawing path**: a validated, flushable buffer of typed
//!    draw requests published as one marker batch per cycle
//! 2. **Base trajectory**: style-selectable geometry with distance-gated
//!    orientation-frame annotations
//! 3. **Contact trajectories**: per-contact swing paths with stable slot
//!    identity across steps where the active contact set changes

pub mod base;
pub mod config;
pub mod contact;
pub mod draw;
pub mod error;
pub mod frames;
pub mod geometry;
pub mod pipeline;
pub mod style;
pub mod trajectory;

#[cfg(feature = "visualization")]
pub mod scene;

// Re-export key types for convenience
pub use config::{Appearance, RenderStyle, Rgba};
pub use draw::{DrawRequest, MarkerBatch, MarkerSink, PrimitiveBuffer};
pub use error::VizError;
pub use frames::{FrameTransform, FrameTransformProvider, StaticFrameProvider};
pub use pipeline::WholeBodyPipeline;
pub use trajectory::{BaseAxis, BaseCoordinate, ContactPoint, TrajectoryStep, WholeBodyTrajectory};
