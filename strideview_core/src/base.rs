//! Base trajectory builder.
//!
//! Converts the per-step base poses into one style-selected geometry plus
//! sparse orientation-frame annotations. The annotation cursor always
//! marks the first and last step; an interior step is marked only once it
//! has moved far enough from the previously marked point, which keeps
//! dense trajectories readable.

use nalgebra::Vector3;

use crate::config::{Appearance, RenderStyle};
use crate::frames::FrameTransform;
use crate::geometry::{AxisAnnotation, PointSample, TrajectoryGeometry};
use crate::trajectory::WholeBodyTrajectory;

/// Relative gate factor: an interior step is annotated once its squared
/// distance from the last annotated point reaches `scale² × 0.0032`.
pub const ANNOTATION_GATE_FACTOR: f64 = 0.0032;

/// Distance-gated annotation cursor.
#[derive(Debug)]
pub struct AnnotationGate {
    threshold_sq: f64,
    last: Option<Vector3<f64>>,
}

impl AnnotationGate {
    pub fn new(scale: f64) -> Self {
        Self {
            threshold_sq: scale * scale * ANNOTATION_GATE_FACTOR,
            last: None,
        }
    }

    /// Decides whether the step at `index` (of `count`) gets an
    /// annotation, updating the cursor when it does. First and last steps
    /// always pass.
    pub fn admit(&mut self, index: usize, count: usize, position: &Vector3<f64>) -> bool {
        let forced = index == 0 || index + 1 == count;
        let pass = forced
            || self
                .last
                .is_none_or(|last| (position - last).norm_squared() >= self.threshold_sq);
        if pass {
            self.last = Some(*position);
        }
        pass
    }
}

/// Output of one base-trajectory pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseBuild {
    pub geometry: TrajectoryGeometry,
    pub annotations: Vec<AxisAnnotation>,
}

/// Builds the base geometry and annotations for one trajectory.
///
/// A malformed step degrades to origin/identity inside
/// [`TrajectoryStep::base_pose`](crate::trajectory::TrajectoryStep::base_pose)
/// and the pass continues.
pub fn build(
    trajectory: &WholeBodyTrajectory,
    world: &FrameTransform,
    appearance: &Appearance,
) -> BaseBuild {
    let appearance = appearance.sanitized();
    let count = trajectory.steps.len();

    let mut vertices = Vec::with_capacity(count);
    let mut colors = Vec::with_capacity(count);
    let mut samples = Vec::with_capacity(count);
    let mut annotations = Vec::new();
    let mut gate = AnnotationGate::new(appearance.axes_scale);

    for (i, step) in trajectory.steps.iter().enumerate() {
        let pose = step.base_pose();
        let world_pos = world.apply(&pose.position);

        match appearance.style {
            RenderStyle::Polyline => {
                vertices.push(world_pos);
                colors.push(appearance.color);
            }
            RenderStyle::Ribbon => vertices.push(world_pos),
            RenderStyle::PointSamples => samples.push(PointSample {
                point: pose.position,
                radius: appearance.line_width,
                color: appearance.color,
                frame_position: world.position,
                frame_orientation: world.orientation,
            }),
        }

        if gate.admit(i, count, &world_pos) {
            annotations.push(AxisAnnotation {
                position: world_pos,
                // Step-local orientation composed with the world rotation.
                orientation: pose.orientation * world.orientation,
                scale: appearance.axes_scale,
                alpha: appearance.color.a,
            });
        }
    }

    let geometry = match appearance.style {
        RenderStyle::Polyline => TrajectoryGeometry::Polyline { vertices, colors },
        RenderStyle::Ribbon => TrajectoryGeometry::Ribbon {
            vertices,
            width: appearance.line_width,
            color: appearance.color,
        },
        RenderStyle::PointSamples => TrajectoryGeometry::PointSamples { samples },
    };

    BaseBuild {
        geometry,
        annotations,
    }
}
