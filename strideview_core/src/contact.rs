//! Contact (end-effector) trajectory multiplexer.
//!
//! Contact names are not positionally stable across steps: a foot appears
//! while in stance or swing and vanishes otherwise, and its index within a
//! step's contact list carries no identity. A pre-scan assigns every
//! distinct name a stable slot in first-seen order; the assembly pass then
//! looks each slot up by name per step, so an absent contact produces a
//! visible gap in its own geometry instead of borrowing a neighbor's
//! position.

use nalgebra::Vector3;
use tracing::warn;

use crate::config::{Appearance, RenderStyle};
use crate::frames::FrameTransform;
use crate::geometry::{PointSample, TrajectoryGeometry};
use crate::trajectory::WholeBodyTrajectory;

/// Stable identity of one swing trajectory, valid for the lifetime of one
/// trajectory message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSlot {
    /// Discovery order, which is also the output ordering.
    pub index: usize,
    pub name: String,
}

/// One geometric object per distinct contact name.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactGeometry {
    pub slot: ContactSlot,
    pub geometry: TrajectoryGeometry,
}

/// Collects the distinct contact names across all steps, in first-seen
/// order.
pub fn scan_slots(trajectory: &WholeBodyTrajectory) -> Vec<ContactSlot> {
    let mut slots: Vec<ContactSlot> = Vec::new();
    for step in &trajectory.steps {
        for contact in &step.contacts {
            if !slots.iter().any(|s| s.name == contact.name) {
                slots.push(ContactSlot {
                    index: slots.len(),
                    name: contact.name.clone(),
                });
            }
        }
    }
    slots
}

/// Builds one style-selected geometry per contact slot.
///
/// Each contact position is expressed in its step's base frame; the world
/// position is `base_position + base_orientation · local`, recomputed per
/// step, then taken through the message-to-world transform. Non-finite
/// compositions clamp to the origin and the pass continues.
pub fn build(
    trajectory: &WholeBodyTrajectory,
    world: &FrameTransform,
    appearance: &Appearance,
) -> Vec<ContactGeometry> {
    let appearance = appearance.sanitized();
    let slots = scan_slots(trajectory);
    let count = trajectory.steps.len();

    // Per-slot accumulators; line styles share the vertex run layout.
    let mut runs: Vec<Vec<Vector3<f64>>> = vec![Vec::with_capacity(count); slots.len()];
    let mut samples: Vec<Vec<PointSample>> = vec![Vec::with_capacity(count); slots.len()];

    for step in &trajectory.steps {
        let pose = step.base_pose();

        for slot in &slots {
            let Some(contact) = step.contact(&slot.name) else {
                continue;
            };

            let mut local = pose.position + pose.orientation * contact.position;
            if !(local.x.is_finite() && local.y.is_finite() && local.z.is_finite()) {
                warn!(
                    contact = slot.name.as_str(),
                    "contact trajectory point is not finite, resetting to zero"
                );
                local = Vector3::zeros();
            }

            match appearance.style {
                RenderStyle::Polyline | RenderStyle::Ribbon => {
                    runs[slot.index].push(world.apply(&local));
                }
                RenderStyle::PointSamples => samples[slot.index].push(PointSample {
                    point: local,
                    radius: appearance.line_width,
                    color: appearance.color,
                    frame_position: world.position,
                    frame_orientation: world.orientation,
                }),
            }
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            let geometry = match appearance.style {
                RenderStyle::Polyline => {
                    let vertices = std::mem::take(&mut runs[slot.index]);
                    let colors = vec![appearance.color; vertices.len()];
                    TrajectoryGeometry::Polyline { vertices, colors }
                }
                RenderStyle::Ribbon => TrajectoryGeometry::Ribbon {
                    vertices: std::mem::take(&mut runs[slot.index]),
                    width: appearance.line_width,
                    color: appearance.color,
                },
                RenderStyle::PointSamples => TrajectoryGeometry::PointSamples {
                    samples: std::mem::take(&mut samples[slot.index]),
                },
            };
            ContactGeometry { slot, geometry }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::{BaseAxis, BaseCoordinate, ContactPoint, TrajectoryStep};
    use approx::assert_relative_eq;

    fn base_at(x: f64) -> Vec<BaseCoordinate> {
        vec![
            BaseCoordinate::new(BaseAxis::LinearX, x),
            BaseCoordinate::new(BaseAxis::LinearY, 0.0),
            BaseCoordinate::new(BaseAxis::LinearZ, 0.6),
        ]
    }

    fn step(x: f64, contacts: &[(&str, Vector3<f64>)]) -> TrajectoryStep {
        TrajectoryStep {
            base: base_at(x),
            contacts: contacts
                .iter()
                .map(|(name, p)| ContactPoint::new(*name, *p))
                .collect(),
        }
    }

    fn gap_trajectory() -> WholeBodyTrajectory {
        // "front-left" present in steps 0-2 and 5-7, "front-right" in all 8.
        let mut traj = WholeBodyTrajectory::new("odom", 0.0);
        for i in 0..8 {
            let x = i as f64 * 0.1;
            let fl = Vector3::new(0.3, 0.2, -0.6);
            let fr = Vector3::new(0.3, -0.2, -0.6);
            let contacts: Vec<(&str, Vector3<f64>)> = if (3..5).contains(&i) {
                vec![("front-right", fr)]
            } else {
                vec![("front-left", fl), ("front-right", fr)]
            };
            traj.steps.push(step(x, &contacts));
        }
        traj
    }

    #[test]
    fn slot_count_is_distinct_names_not_occurrences() {
        let slots = scan_slots(&gap_trajectory());
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].name, "front-left");
        assert_eq!(slots[0].index, 0);
        assert_eq!(slots[1].name, "front-right");
    }

    #[test]
    fn absent_steps_leave_a_gap_in_the_run() {
        let built = build(
            &gap_trajectory(),
            &FrameTransform::identity(),
            &Appearance::default().with_style(RenderStyle::Polyline),
        );

        assert_eq!(built.len(), 2);
        // front-left misses steps 3 and 4.
        assert_eq!(built[0].geometry.len(), 6);
        assert_eq!(built[1].geometry.len(), 8);
    }

    #[test]
    fn reordered_contact_lists_keep_slot_identity() {
        let fl = Vector3::new(0.3, 0.2, -0.6);
        let fr = Vector3::new(0.3, -0.2, -0.6);
        let mut traj = WholeBodyTrajectory::new("odom", 0.0);
        traj.steps.push(step(0.0, &[("lf", fl), ("rf", fr)]));
        // Same contacts, opposite list order.
        traj.steps.push(step(1.0, &[("rf", fr), ("lf", fl)]));

        let built = build(
            &traj,
            &FrameTransform::identity(),
            &Appearance::default().with_style(RenderStyle::Polyline),
        );

        let lf = built[0].geometry.world_vertices();
        assert_relative_eq!(lf[0], Vector3::new(0.3, 0.2, 0.0), epsilon = 1e-12);
        assert_relative_eq!(lf[1], Vector3::new(1.3, 0.2, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn contact_position_rotates_with_the_base() {
        let mut traj = WholeBodyTrajectory::new("odom", 0.0);
        let mut base = base_at(1.0);
        base.push(BaseCoordinate::new(
            BaseAxis::AngularZ,
            std::f64::consts::FRAC_PI_2,
        ));
        traj.steps.push(TrajectoryStep {
            base,
            contacts: vec![ContactPoint::new("lf", Vector3::new(0.3, 0.0, -0.6))],
        });

        let built = build(
            &traj,
            &FrameTransform::identity(),
            &Appearance::default().with_style(RenderStyle::Polyline),
        );

        // Base yaw of pi/2 carries the +X offset onto +Y.
        assert_relative_eq!(
            built[0].geometry.world_vertices()[0],
            Vector3::new(1.0, 0.3, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn non_finite_composition_clamps_to_zero() {
        let mut traj = WholeBodyTrajectory::new("odom", 0.0);
        traj.steps.push(step(
            0.0,
            &[("lf", Vector3::new(f64::NAN, 0.0, 0.0))],
        ));

        let built = build(
            &traj,
            &FrameTransform::identity(),
            &Appearance::default().with_style(RenderStyle::Polyline),
        );

        assert_eq!(built[0].geometry.len(), 1);
        assert_eq!(built[0].geometry.world_vertices()[0], Vector3::zeros());
    }

    #[test]
    fn no_contacts_means_no_slots_and_no_geometry() {
        let mut traj = WholeBodyTrajectory::new("odom", 0.0);
        for i in 0..5 {
            traj.steps.push(step(i as f64, &[]));
        }

        assert!(scan_slots(&traj).is_empty());
        assert!(build(
            &traj,
            &FrameTransform::identity(),
            &Appearance::default()
        )
        .is_empty());
    }

    #[test]
    fn point_samples_anchor_the_world_transform() {
        let world = FrameTransform::new(
            Vector3::new(0.0, 10.0, 0.0),
            nalgebra::UnitQuaternion::identity(),
        );
        let mut traj = WholeBodyTrajectory::new("odom", 0.0);
        traj.steps
            .push(step(0.0, &[("lf", Vector3::new(0.3, 0.2, -0.6))]));

        let built = build(
            &traj,
            &world,
            &Appearance::default().with_style(RenderStyle::PointSamples),
        );

        let TrajectoryGeometry::PointSamples { samples } = &built[0].geometry else {
            panic!("expected point samples");
        };
        assert_relative_eq!(samples[0].point, Vector3::new(0.3, 0.2, 0.0));
        assert_relative_eq!(
            samples[0].world_point(),
            Vector3::new(0.3, 10.2, 0.0),
            epsilon = 1e-12
        );
    }
}
