//! Rerun scene adapter.
//!
//! Attaches the built trajectory geometry to a Rerun recording and acts as
//! the marker sink for the ad-hoc drawing path. Enable with the
//! `visualization` feature flag.

use nalgebra::Vector3;
use rerun::{RecordingStream, RecordingStreamBuilder};
use tracing::warn;

use crate::base::BaseBuild;
use crate::config::Rgba;
use crate::contact::ContactGeometry;
use crate::draw::{MarkerBatch, MarkerKind, MarkerSink};
use crate::error::VizError;
use crate::geometry::{AxisAnnotation, TrajectoryGeometry, AXES_ARM_LENGTH, AXES_ARM_RADIUS};

/// Rerun-backed scene for the whole-body pipeline.
pub struct RerunScene {
    rec: RecordingStream,
}

fn vec3(v: &Vector3<f64>) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

fn color(c: Rgba) -> [u8; 4] {
    [
        (c.r * 255.0) as u8,
        (c.g * 255.0) as u8,
        (c.b * 255.0) as u8,
        (c.a * 255.0) as u8,
    ]
}

impl RerunScene {
    /// Creates a scene that spawns the Rerun viewer.
    pub fn new(app_id: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let rec = RecordingStreamBuilder::new(app_id).spawn()?;
        rec.log_static("world", &rerun::ViewCoordinates::RIGHT_HAND_Z_UP())?;
        Ok(Self { rec })
    }

    /// Creates a scene that saves to a file (for sharing).
    pub fn new_to_file(app_id: &str, path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let rec = RecordingStreamBuilder::new(app_id).save(path)?;
        rec.log_static("world", &rerun::ViewCoordinates::RIGHT_HAND_Z_UP())?;
        Ok(Self { rec })
    }

    /// Sets the frame index for timeline scrubbing.
    pub fn set_frame(&self, frame: u64) {
        self.rec.set_time_sequence("frame", frame as i64);
    }

    /// Logs the base trajectory geometry and its axis annotations.
    pub fn log_base(&self, build: &BaseBuild) -> Result<(), Box<dyn std::error::Error>> {
        self.log_geometry("world/base/trajectory", &build.geometry)?;
        self.log_annotations("world/base/axes", &build.annotations)?;
        Ok(())
    }

    /// Logs one entity per contact slot, so lift-off gaps stay visually
    /// disconnected per limb.
    pub fn log_contacts(
        &self,
        builds: &[ContactGeometry],
    ) -> Result<(), Box<dyn std::error::Error>> {
        for build in builds {
            self.log_geometry(
                &format!("world/contacts/{}", build.slot.name),
                &build.geometry,
            )?;
        }
        Ok(())
    }

    fn log_geometry(
        &self,
        path: &str,
        geometry: &TrajectoryGeometry,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match geometry {
            TrajectoryGeometry::Polyline { vertices, colors } => {
                let strip: Vec<[f32; 3]> = vertices.iter().map(vec3).collect();
                let c = colors.first().copied().unwrap_or(Rgba::new(1.0, 1.0, 1.0, 1.0));
                self.rec
                    .log(path, &rerun::LineStrips3D::new([strip]).with_colors([color(c)]))?;
            }
            TrajectoryGeometry::Ribbon {
                vertices,
                width,
                color: c,
            } => {
                let strip: Vec<[f32; 3]> = vertices.iter().map(vec3).collect();
                self.rec.log(
                    path,
                    &rerun::LineStrips3D::new([strip])
                        .with_colors([color(*c)])
                        .with_radii([(*width / 2.0) as f32]),
                )?;
            }
            TrajectoryGeometry::PointSamples { samples } => {
                let points: Vec<[f32; 3]> =
                    samples.iter().map(|s| vec3(&s.world_point())).collect();
                let colors: Vec<[u8; 4]> = samples.iter().map(|s| color(s.color)).collect();
                let radii: Vec<f32> = samples.iter().map(|s| s.radius as f32).collect();
                self.rec.log(
                    path,
                    &rerun::Points3D::new(points)
                        .with_colors(colors)
                        .with_radii(radii),
                )?;
            }
        }
        Ok(())
    }

    /// Logs each annotation as a three-armed RGB frame.
    fn log_annotations(
        &self,
        path: &str,
        annotations: &[AxisAnnotation],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut origins = Vec::with_capacity(annotations.len() * 3);
        let mut vectors = Vec::with_capacity(annotations.len() * 3);
        let mut colors = Vec::with_capacity(annotations.len() * 3);
        let mut radii = Vec::with_capacity(annotations.len() * 3);

        for annotation in annotations {
            let arm = AXES_ARM_LENGTH * annotation.scale;
            let alpha = (annotation.alpha * 255.0) as u8;
            let axes = [
                (Vector3::x() * arm, [255, 0, 0, alpha]),
                (Vector3::y() * arm, [0, 255, 0, alpha]),
                (Vector3::z() * arm, [0, 0, 255, alpha]),
            ];
            for (axis, c) in axes {
                origins.push(vec3(&annotation.position));
                vectors.push(vec3(&(annotation.orientation * axis)));
                colors.push(c);
                radii.push((AXES_ARM_RADIUS * annotation.scale) as f32);
            }
        }

        self.rec.log(
            path,
            &rerun::Arrows3D::from_vectors(vectors)
                .with_origins(origins)
                .with_colors(colors)
                .with_radii(radii),
        )?;
        Ok(())
    }

    fn log_marker(&self, marker: &crate::draw::Marker) -> Result<(), Box<dyn std::error::Error>> {
        let path = format!("markers/{}/{}", marker.namespace, marker.id);
        let c = color(marker.color);
        match &marker.kind {
            MarkerKind::LineList { points } => {
                self.rec.log(
                    path,
                    &rerun::LineStrips3D::new([[vec3(&points[0]), vec3(&points[1])]])
                        .with_colors([c])
                        .with_radii([(marker.scale.x / 2.0) as f32]),
                )?;
            }
            MarkerKind::Arrow { points } => {
                let v = points[1] - points[0];
                self.rec.log(
                    path,
                    &rerun::Arrows3D::from_vectors([vec3(&v)])
                        .with_origins([vec3(&points[0])])
                        .with_colors([c]),
                )?;
            }
            MarkerKind::Points { position } => {
                self.rec.log(
                    path,
                    &rerun::Points3D::new([vec3(position)])
                        .with_colors([c])
                        .with_radii([marker.scale.x as f32]),
                )?;
            }
            MarkerKind::Sphere { position } => {
                self.rec.log(
                    path,
                    &rerun::Ellipsoids3D::from_centers_and_half_sizes(
                        [vec3(position)],
                        [[
                            marker.scale.x as f32,
                            marker.scale.y as f32,
                            marker.scale.z as f32,
                        ]],
                    )
                    .with_colors([c])
                    .with_fill_mode(rerun::FillMode::Solid),
                )?;
            }
            MarkerKind::Text { position, text } => {
                self.rec.log(
                    path,
                    &rerun::Points3D::new([vec3(position)])
                        .with_colors([c])
                        .with_radii([(marker.scale.z / 2.0) as f32])
                        .with_labels([text.as_str()]),
                )?;
            }
        }
        Ok(())
    }
}

impl MarkerSink for RerunScene {
    /// Best-effort publish: a marker that fails to log is reported and
    /// skipped, never retried.
    fn try_publish(&mut self, batch: MarkerBatch) -> Result<(), VizError> {
        for marker in &batch.markers {
            if let Err(err) = self.log_marker(marker) {
                warn!("failed to log marker {}: {}", marker.id, err);
            }
        }
        Ok(())
    }
}
