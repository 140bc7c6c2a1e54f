//! The whole-body visualization pipeline.
//!
//! Owns the last-received trajectory as explicit context plus the built
//! geometry arena, and runs the synchronous destroy → base build →
//! contact build pass on every message. Style and appearance changes
//! rebuild only the affected kind; every rebuild starts from a destroyed
//! arena, so the display always reflects the last selection and the last
//! message, never a mix.

use tracing::{debug, warn};

use crate::base::{self, BaseBuild};
use crate::config::{Appearance, RenderStyle};
use crate::contact::{self, ContactGeometry};
use crate::frames::{FrameTransform, FrameTransformProvider};
use crate::style::{StyleDispatcher, TrajectoryKind, Transition};
use crate::trajectory::WholeBodyTrajectory;

pub struct WholeBodyPipeline<P> {
    provider: P,
    base_appearance: Appearance,
    contact_appearance: Appearance,
    base_style: StyleDispatcher,
    contact_style: StyleDispatcher,
    /// The current trajectory; a new message fully supersedes it.
    trajectory: Option<WholeBodyTrajectory>,
    base_build: Option<BaseBuild>,
    contact_builds: Vec<ContactGeometry>,
}

impl<P: FrameTransformProvider> WholeBodyPipeline<P> {
    pub fn new(provider: P) -> Self {
        Self::with_appearance(provider, Appearance::default(), Appearance::default())
    }

    pub fn with_appearance(
        provider: P,
        base_appearance: Appearance,
        contact_appearance: Appearance,
    ) -> Self {
        let base_appearance = base_appearance.sanitized();
        let contact_appearance = contact_appearance.sanitized();
        Self {
            provider,
            base_style: StyleDispatcher::new(TrajectoryKind::Base, base_appearance.style),
            contact_style: StyleDispatcher::new(TrajectoryKind::Contact, contact_appearance.style),
            base_appearance,
            contact_appearance,
            trajectory: None,
            base_build: None,
            contact_builds: Vec::new(),
        }
    }

    /// Processes a newly delivered trajectory: destroys all previous
    /// geometry, then rebuilds both kinds. An empty message (no steps, or
    /// a first step without base coordinates) is a diagnostic no-op that
    /// still blanks the display.
    pub fn process(&mut self, trajectory: WholeBodyTrajectory) {
        self.destroy_base();
        self.destroy_contacts();

        if let Err(err) = trajectory.validate() {
            warn!(
                frame = trajectory.frame_id.as_str(),
                "skipping trajectory message, clearing display: {}", err
            );
            self.trajectory = None;
            return;
        }

        self.trajectory = Some(trajectory);
        self.rebuild_base();
        self.rebuild_contacts();
    }

    /// Selects the base rendering style, tearing down and rebuilding the
    /// base geometry when the selection actually changes.
    pub fn set_base_style(&mut self, style: RenderStyle) {
        if self.base_style.select(style) == Transition::Rebuild {
            self.base_appearance.style = style;
            self.destroy_base();
            self.rebuild_base();
        }
    }

    /// Selects the contact rendering style; same teardown rule per slot.
    pub fn set_contact_style(&mut self, style: RenderStyle) {
        if self.contact_style.select(style) == Transition::Rebuild {
            self.contact_appearance.style = style;
            self.destroy_contacts();
            self.rebuild_contacts();
        }
    }

    /// Replaces the base appearance (width, color, alpha, axes scale) and
    /// rebuilds the base geometry.
    pub fn set_base_appearance(&mut self, appearance: Appearance) {
        self.base_appearance = appearance.sanitized();
        self.base_style.select(self.base_appearance.style);
        self.destroy_base();
        self.rebuild_base();
    }

    /// Replaces the contact appearance and rebuilds the contact geometry.
    pub fn set_contact_appearance(&mut self, appearance: Appearance) {
        self.contact_appearance = appearance.sanitized();
        self.contact_style.select(self.contact_appearance.style);
        self.destroy_contacts();
        self.rebuild_contacts();
    }

    /// Re-runs both builders against the current trajectory, e.g. after
    /// the fixed world frame changed.
    pub fn fixed_frame_changed(&mut self) {
        self.destroy_base();
        self.destroy_contacts();
        self.rebuild_base();
        self.rebuild_contacts();
    }

    pub fn trajectory(&self) -> Option<&WholeBodyTrajectory> {
        self.trajectory.as_ref()
    }

    pub fn base_build(&self) -> Option<&BaseBuild> {
        self.base_build.as_ref()
    }

    pub fn contact_builds(&self) -> &[ContactGeometry] {
        &self.contact_builds
    }

    pub fn base_appearance(&self) -> &Appearance {
        &self.base_appearance
    }

    pub fn contact_appearance(&self) -> &Appearance {
        &self.contact_appearance
    }

    fn destroy_base(&mut self) {
        self.base_build = None;
    }

    fn destroy_contacts(&mut self) {
        self.contact_builds.clear();
    }

    fn rebuild_base(&mut self) {
        let Some(trajectory) = self.trajectory.as_ref() else {
            return;
        };
        let world = self.world_transform(trajectory);
        self.base_build = Some(base::build(trajectory, &world, &self.base_appearance));
    }

    fn rebuild_contacts(&mut self) {
        let Some(trajectory) = self.trajectory.as_ref() else {
            return;
        };
        let world = self.world_transform(trajectory);
        self.contact_builds = contact::build(trajectory, &world, &self.contact_appearance);
    }

    /// Resolves the message frame, falling back to identity on failure.
    fn world_transform(&self, trajectory: &WholeBodyTrajectory) -> FrameTransform {
        match self
            .provider
            .resolve(&trajectory.frame_id, trajectory.stamp)
        {
            Ok(tf) => tf,
            Err(err) => {
                debug!("frame lookup failed, using identity: {}", err);
                FrameTransform::identity()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::StaticFrameProvider;
    use crate::geometry::TrajectoryGeometry;
    use crate::trajectory::{BaseAxis, BaseCoordinate, ContactPoint, TrajectoryStep};
    use nalgebra::{UnitQuaternion, Vector3};

    fn sample_trajectory() -> WholeBodyTrajectory {
        let mut traj = WholeBodyTrajectory::new("odom", 2.0);
        for i in 0..6 {
            traj.steps.push(TrajectoryStep {
                base: vec![
                    BaseCoordinate::new(BaseAxis::LinearX, i as f64 * 0.2),
                    BaseCoordinate::new(BaseAxis::LinearZ, 0.55),
                ],
                contacts: if i % 2 == 0 {
                    vec![ContactPoint::new("lf", Vector3::new(0.3, 0.2, -0.55))]
                } else {
                    vec![
                        ContactPoint::new("lf", Vector3::new(0.3, 0.2, -0.55)),
                        ContactPoint::new("rf", Vector3::new(0.3, -0.2, -0.55)),
                    ]
                },
            });
        }
        traj
    }

    fn provider() -> StaticFrameProvider {
        let mut provider = StaticFrameProvider::new();
        provider.insert(
            "odom",
            FrameTransform::new(
                Vector3::new(1.0, 0.0, 0.0),
                UnitQuaternion::from_euler_angles(0.0, 0.0, 0.1),
            ),
        );
        provider
    }

    #[test]
    fn process_builds_both_kinds() {
        let mut pipeline = WholeBodyPipeline::new(provider());
        pipeline.process(sample_trajectory());

        assert_eq!(pipeline.base_build().unwrap().geometry.len(), 6);
        assert_eq!(pipeline.contact_builds().len(), 2);
        assert_eq!(pipeline.contact_builds()[0].slot.name, "lf");
        assert_eq!(pipeline.contact_builds()[1].geometry.len(), 3);
    }

    #[test]
    fn new_message_supersedes_previous_geometry() {
        let mut pipeline = WholeBodyPipeline::new(provider());
        pipeline.process(sample_trajectory());

        let mut shorter = sample_trajectory();
        shorter.steps.truncate(2);
        pipeline.process(shorter);

        assert_eq!(pipeline.base_build().unwrap().geometry.len(), 2);
    }

    #[test]
    fn empty_message_clears_display() {
        let mut pipeline = WholeBodyPipeline::new(provider());
        pipeline.process(sample_trajectory());
        assert!(pipeline.base_build().is_some());

        pipeline.process(WholeBodyTrajectory::new("odom", 3.0));

        assert!(pipeline.base_build().is_none());
        assert!(pipeline.contact_builds().is_empty());
        assert!(pipeline.trajectory().is_none());
    }

    #[test]
    fn style_round_trip_reproduces_identical_vertices() {
        let mut pipeline = WholeBodyPipeline::with_appearance(
            provider(),
            Appearance::default().with_style(RenderStyle::Polyline),
            Appearance::default().with_style(RenderStyle::Polyline),
        );
        pipeline.process(sample_trajectory());

        let before = pipeline.base_build().unwrap().clone();

        pipeline.set_base_style(RenderStyle::Ribbon);
        assert!(matches!(
            pipeline.base_build().unwrap().geometry,
            TrajectoryGeometry::Ribbon { .. }
        ));

        pipeline.set_base_style(RenderStyle::Polyline);
        assert_eq!(pipeline.base_build().unwrap(), &before);
    }

    #[test]
    fn style_change_without_trajectory_stays_empty() {
        let mut pipeline = WholeBodyPipeline::new(provider());
        pipeline.set_base_style(RenderStyle::Ribbon);
        pipeline.set_contact_style(RenderStyle::Polyline);

        assert!(pipeline.base_build().is_none());
        assert!(pipeline.contact_builds().is_empty());

        // The selection still sticks for the next message.
        pipeline.process(sample_trajectory());
        assert!(matches!(
            pipeline.base_build().unwrap().geometry,
            TrajectoryGeometry::Ribbon { .. }
        ));
    }

    #[test]
    fn contact_style_change_does_not_touch_base() {
        let mut pipeline = WholeBodyPipeline::new(provider());
        pipeline.process(sample_trajectory());
        let base_before = pipeline.base_build().unwrap().clone();

        pipeline.set_contact_style(RenderStyle::Ribbon);

        assert_eq!(pipeline.base_build().unwrap(), &base_before);
        assert!(matches!(
            pipeline.contact_builds()[0].geometry,
            TrajectoryGeometry::Ribbon { .. }
        ));
    }

    #[test]
    fn appearance_change_rebuilds_with_clamped_values() {
        let mut pipeline = WholeBodyPipeline::new(provider());
        pipeline.process(sample_trajectory());

        let mut appearance = *pipeline.base_appearance();
        appearance.line_width = 0.0;
        appearance.style = RenderStyle::Ribbon;
        pipeline.set_base_appearance(appearance);

        let TrajectoryGeometry::Ribbon { width, .. } =
            pipeline.base_build().unwrap().geometry.clone()
        else {
            panic!("expected ribbon");
        };
        assert_eq!(width, crate::config::MIN_LINE_WIDTH);

        // Dispatcher tracked the appearance's style: selecting it again
        // is a no-op, not a rebuild-from-scratch divergence.
        let before = pipeline.base_build().unwrap().clone();
        pipeline.set_base_style(RenderStyle::Ribbon);
        assert_eq!(pipeline.base_build().unwrap(), &before);
    }

    #[test]
    fn unresolved_frame_falls_back_to_identity() {
        let mut pipeline = WholeBodyPipeline::new(StaticFrameProvider::new());
        pipeline.process(sample_trajectory());

        let vertices = pipeline.base_build().unwrap().geometry.world_vertices();
        assert_eq!(vertices[0], Vector3::new(0.0, 0.0, 0.55));
    }

    #[test]
    fn fixed_frame_change_rebuilds_from_held_context() {
        let mut pipeline = WholeBodyPipeline::new(provider());
        pipeline.process(sample_trajectory());
        let before = pipeline.base_build().unwrap().clone();

        pipeline.fixed_frame_changed();

        assert_eq!(pipeline.base_build().unwrap(), &before);
        assert_eq!(pipeline.contact_builds().len(), 2);
    }
}
