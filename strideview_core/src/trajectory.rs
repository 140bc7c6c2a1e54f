//! Whole-body trajectory message types.
//!
//! A trajectory is an ordered sequence of steps. Each step carries the
//! floating-base pose as a list of axis-tagged coordinates (tagged by
//! semantic axis, not by array position) and a variable-length list of
//! named end-effector contacts expressed in the instantaneous base frame.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::VizError;

/// Semantic identifier of one base degree of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseAxis {
    /// Translation along world X.
    LinearX,
    /// Translation along world Y.
    LinearY,
    /// Translation along world Z.
    LinearZ,
    /// Roll.
    AngularX,
    /// Pitch.
    AngularY,
    /// Yaw.
    AngularZ,
}

/// One tagged base coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseCoordinate {
    pub axis: BaseAxis,
    pub value: f64,
}

impl BaseCoordinate {
    pub fn new(axis: BaseAxis, value: f64) -> Self {
        Self { axis, value }
    }
}

/// A named contact position, relative to the base frame of its step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    pub name: String,
    pub position: Vector3<f64>,
}

impl ContactPoint {
    pub fn new(name: impl Into<String>, position: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// One instant of the motion plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    /// Axis-tagged base pose coordinates.
    pub base: Vec<BaseCoordinate>,
    /// Active contacts at this instant. Unordered; a contact is present
    /// only while relevant, so length varies step to step.
    pub contacts: Vec<ContactPoint>,
}

impl TrajectoryStep {
    /// Assembles the base pose from the tagged coordinates.
    ///
    /// Missing axes default to zero. A non-finite value poisons its whole
    /// component group: the position falls back to the origin and the
    /// orientation to identity, and processing continues.
    pub fn base_pose(&self) -> BasePose {
        let mut position = Vector3::zeros();
        let mut rpy = Vector3::zeros();
        for coord in &self.base {
            match coord.axis {
                BaseAxis::LinearX => position.x = coord.value,
                BaseAxis::LinearY => position.y = coord.value,
                BaseAxis::LinearZ => position.z = coord.value,
                BaseAxis::AngularX => rpy.x = coord.value,
                BaseAxis::AngularY => rpy.y = coord.value,
                BaseAxis::AngularZ => rpy.z = coord.value,
            }
        }

        if !(position.x.is_finite() && position.y.is_finite() && position.z.is_finite()) {
            warn!("base position is not finite, resetting to zero");
            position = Vector3::zeros();
        }
        let orientation = if rpy.x.is_finite() && rpy.y.is_finite() && rpy.z.is_finite() {
            UnitQuaternion::from_euler_angles(rpy.x, rpy.y, rpy.z)
        } else {
            warn!("base orientation is not finite, resetting to identity");
            UnitQuaternion::identity()
        };

        BasePose {
            position,
            orientation,
        }
    }

    /// Looks up an active contact by name.
    pub fn contact(&self, name: &str) -> Option<&ContactPoint> {
        self.contacts.iter().find(|c| c.name == name)
    }
}

/// Assembled base position and orientation for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasePose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

/// A time-indexed whole-body motion plan.
///
/// Read-only input to the pipeline; the first step defines the base-axis
/// set used for the whole sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WholeBodyTrajectory {
    /// Declared reference frame of the message.
    pub frame_id: String,
    /// Message timestamp, seconds.
    pub stamp: f64,
    pub steps: Vec<TrajectoryStep>,
}

impl WholeBodyTrajectory {
    pub fn new(frame_id: impl Into<String>, stamp: f64) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp,
            steps: Vec::new(),
        }
    }

    /// Checks that the message carries at least one step with at least one
    /// base coordinate, i.e. that there is something to draw.
    pub fn validate(&self) -> Result<(), VizError> {
        match self.steps.first() {
            None => Err(VizError::EmptyTrajectory),
            Some(step) if step.base.is_empty() => Err(VizError::MissingBase),
            Some(_) => Ok(()),
        }
    }

    pub fn is_drawable(&self) -> bool {
        self.validate().is_ok()
    }
}
