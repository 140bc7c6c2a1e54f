//! Frame resolution seam.
//!
//! The pipeline needs one rigid transform per pass: message frame into the
//! render's fixed world frame. Lookup lives behind a trait so the host can
//! plug in its own transform tree; tests and the demo viewer use
//! [`StaticFrameProvider`].

use std::collections::HashMap;

use nalgebra::{UnitQuaternion, Vector3};

use crate::error::VizError;

/// A rigid transform from a message frame into the fixed world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl FrameTransform {
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }

    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Applies the transform to a point.
    pub fn apply(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.orientation * point + self.position
    }
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Resolves a message frame into the fixed world frame at a given time.
pub trait FrameTransformProvider {
    fn resolve(&self, frame_id: &str, stamp: f64) -> Result<FrameTransform, VizError>;
}

/// Table-backed provider for tests and the demo viewer.
#[derive(Debug, Default)]
pub struct StaticFrameProvider {
    frames: HashMap<String, FrameTransform>,
}

impl StaticFrameProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame_id: impl Into<String>, transform: FrameTransform) {
        self.frames.insert(frame_id.into(), transform);
    }
}

impl FrameTransformProvider for StaticFrameProvider {
    fn resolve(&self, frame_id: &str, stamp: f64) -> Result<FrameTransform, VizError> {
        self.frames
            .get(frame_id)
            .copied()
            .ok_or_else(|| VizError::frame(frame_id, stamp))
    }
}
