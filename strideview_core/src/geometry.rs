//! Built geometry owned by the pipeline.
//!
//! The three render styles are a closed set of plain-data encodings; the
//! host scene (or the Rerun adapter behind the `visualization` feature)
//! turns them into drawables. Everything here is rebuilt wholesale on
//! every new trajectory or style change, never mutated incrementally.

use nalgebra::{UnitQuaternion, Vector3};

use crate::config::{RenderStyle, Rgba};

/// One discrete trajectory sample.
///
/// The point stays in the message frame; the anchor carries the
/// message-to-world transform so the host can place the marker itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSample {
    pub point: Vector3<f64>,
    pub radius: f64,
    pub color: Rgba,
    pub frame_position: Vector3<f64>,
    pub frame_orientation: UnitQuaternion<f64>,
}

impl PointSample {
    /// The sample position in the world frame.
    pub fn world_point(&self) -> Vector3<f64> {
        self.frame_orientation * self.point + self.frame_position
    }
}

/// Style-selected geometric encoding of one trajectory.
#[derive(Debug, Clone, PartialEq)]
pub enum TrajectoryGeometry {
    /// Connected strip through world-frame vertices, per-vertex color.
    Polyline {
        vertices: Vec<Vector3<f64>>,
        colors: Vec<Rgba>,
    },
    /// Same vertex sequence rendered as a screen-facing band.
    Ribbon {
        vertices: Vec<Vector3<f64>>,
        width: f64,
        color: Rgba,
    },
    /// Independent markers, one per step.
    PointSamples { samples: Vec<PointSample> },
}

impl TrajectoryGeometry {
    pub fn style(&self) -> RenderStyle {
        match self {
            Self::Polyline { .. } => RenderStyle::Polyline,
            Self::Ribbon { .. } => RenderStyle::Ribbon,
            Self::PointSamples { .. } => RenderStyle::PointSamples,
        }
    }

    /// Number of encoded samples.
    pub fn len(&self) -> usize {
        match self {
            Self::Polyline { vertices, .. } | Self::Ribbon { vertices, .. } => vertices.len(),
            Self::PointSamples { samples } => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// World-frame sample positions, regardless of encoding.
    pub fn world_vertices(&self) -> Vec<Vector3<f64>> {
        match self {
            Self::Polyline { vertices, .. } | Self::Ribbon { vertices, .. } => vertices.clone(),
            Self::PointSamples { samples } => samples.iter().map(|s| s.world_point()).collect(),
        }
    }
}

/// An oriented-frame marker placed at a sparse trajectory point.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisAnnotation {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub scale: f64,
    pub alpha: f32,
}

/// Default annotation arm length before scaling, meters.
pub const AXES_ARM_LENGTH: f64 = 0.04;
/// Default annotation arm radius before scaling, meters.
pub const AXES_ARM_RADIUS: f64 = 0.008;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_sample_world_point_applies_anchor() {
        let sample = PointSample {
            point: Vector3::new(1.0, 0.0, 0.0),
            radius: 0.01,
            color: Rgba::new(1.0, 1.0, 1.0, 1.0),
            frame_position: Vector3::new(0.0, 0.0, 2.0),
            frame_orientation: UnitQuaternion::from_euler_angles(
                0.0,
                0.0,
                std::f64::consts::FRAC_PI_2,
            ),
        };
        assert_relative_eq!(
            sample.world_point(),
            Vector3::new(0.0, 1.0, 2.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn geometry_reports_style_and_len() {
        let geom = TrajectoryGeometry::Ribbon {
            vertices: vec![Vector3::zeros(), Vector3::x()],
            width: 0.02,
            color: Rgba::new(0.0, 0.0, 1.0, 1.0),
        };
        assert_eq!(geom.style(), RenderStyle::Ribbon);
        assert_eq!(geom.len(), 2);
        assert!(!geom.is_empty());
    }
}
