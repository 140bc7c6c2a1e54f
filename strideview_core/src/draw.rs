//! Ad-hoc drawing path: a per-cycle buffer of typed draw requests.
//!
//! Callers enqueue primitives during an update cycle; [`PrimitiveBuffer::flush`]
//! turns the queue into one marker batch, hands it to the sink without
//! blocking, and clears. Requests with any non-finite scalar are dropped at
//! admission — this is a best-effort visualization path, never a
//! correctness-critical one.

use nalgebra::{UnitQuaternion, Vector3};
use tracing::debug;

use crate::config::Rgba;
use crate::error::VizError;

/// Lifetime stamped on every published marker, seconds. Short enough that
/// stale frames disappear if no new flush arrives.
pub const MARKER_LIFETIME: f64 = 0.035;

/// Arrow head/shaft proportions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowShape {
    pub shaft_diameter: f64,
    pub head_diameter: f64,
    pub head_length: f64,
}

impl ArrowShape {
    /// Proportions derived from the arrow length.
    pub fn proportional(length: f64) -> Self {
        Self {
            shaft_diameter: length / 20.0,
            head_diameter: length / 10.0,
            head_length: length / 5.0,
        }
    }
}

/// One typed draw request.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawRequest {
    Line {
        start: Vector3<f64>,
        end: Vector3<f64>,
        width: f64,
        color: Rgba,
        frame: String,
    },
    Arrow {
        start: Vector3<f64>,
        end: Vector3<f64>,
        shape: ArrowShape,
        color: Rgba,
        frame: String,
    },
    Point {
        position: Vector3<f64>,
        scale: Vector3<f64>,
        color: Rgba,
        frame: String,
    },
    Sphere {
        position: Vector3<f64>,
        radius: f64,
        color: Rgba,
        frame: String,
    },
    Text {
        text: String,
        position: Vector3<f64>,
        /// Height of an uppercase glyph, meters.
        height: f64,
        color: Rgba,
        frame: String,
    },
}

fn finite3(v: &Vector3<f64>) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

impl DrawRequest {
    /// True when every scalar component is finite.
    pub fn is_finite(&self) -> bool {
        let color_ok = self.color().is_finite();
        let geometry_ok = match self {
            Self::Line {
                start, end, width, ..
            } => finite3(start) && finite3(end) && width.is_finite(),
            Self::Arrow {
                start, end, shape, ..
            } => {
                finite3(start)
                    && finite3(end)
                    && shape.shaft_diameter.is_finite()
                    && shape.head_diameter.is_finite()
                    && shape.head_length.is_finite()
            }
            Self::Point {
                position, scale, ..
            } => finite3(position) && finite3(scale),
            Self::Sphere {
                position, radius, ..
            } => finite3(position) && radius.is_finite(),
            Self::Text {
                position, height, ..
            } => finite3(position) && height.is_finite(),
        };
        color_ok && geometry_ok
    }

    fn color(&self) -> Rgba {
        match self {
            Self::Line { color, .. }
            | Self::Arrow { color, .. }
            | Self::Point { color, .. }
            | Self::Sphere { color, .. }
            | Self::Text { color, .. } => *color,
        }
    }
}

/// Geometry payload of a published marker.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    LineList { points: [Vector3<f64>; 2] },
    Arrow { points: [Vector3<f64>; 2] },
    Points { position: Vector3<f64> },
    Sphere { position: Vector3<f64> },
    Text { position: Vector3<f64>, text: String },
}

/// One renderable item of a flushed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: u32,
    pub namespace: String,
    pub frame_id: String,
    pub stamp: f64,
    pub lifetime: f64,
    pub kind: MarkerKind,
    pub color: Rgba,
    pub scale: Vector3<f64>,
}

/// The single payload produced by one flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerBatch {
    pub markers: Vec<Marker>,
}

impl MarkerBatch {
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Non-blocking publish target for marker batches.
///
/// `try_publish` must not block; a momentarily unavailable transport
/// returns [`VizError::SinkBusy`] and the batch is dropped by the caller.
pub trait MarkerSink {
    fn try_publish(&mut self, batch: MarkerBatch) -> Result<(), VizError>;
}

/// Sink that stores batches in memory, for tests and headless runs. Set
/// `busy` to simulate transport contention.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub batches: Vec<MarkerBatch>,
    pub busy: bool,
}

impl MarkerSink for CollectingSink {
    fn try_publish(&mut self, batch: MarkerBatch) -> Result<(), VizError> {
        if self.busy {
            return Err(VizError::SinkBusy(batch.len()));
        }
        self.batches.push(batch);
        Ok(())
    }
}

/// Transient queue of validated draw requests for one update cycle.
#[derive(Debug)]
pub struct PrimitiveBuffer {
    namespace: String,
    queue: Vec<DrawRequest>,
}

impl PrimitiveBuffer {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            queue: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Appends a request, dropping it silently when any scalar is
    /// non-finite.
    pub fn enqueue(&mut self, request: DrawRequest) {
        if request.is_finite() {
            self.queue.push(request);
        } else {
            debug!("dropping non-finite draw request: {:?}", request);
        }
    }

    pub fn draw_line(
        &mut self,
        start: Vector3<f64>,
        end: Vector3<f64>,
        width: f64,
        color: Rgba,
        frame: impl Into<String>,
    ) {
        self.enqueue(DrawRequest::Line {
            start,
            end,
            width,
            color,
            frame: frame.into(),
        });
    }

    pub fn draw_point(
        &mut self,
        position: Vector3<f64>,
        radius: f64,
        color: Rgba,
        frame: impl Into<String>,
    ) {
        self.enqueue(DrawRequest::Point {
            position,
            scale: Vector3::new(radius, radius, radius),
            color,
            frame: frame.into(),
        });
    }

    pub fn draw_sphere(
        &mut self,
        position: Vector3<f64>,
        radius: f64,
        color: Rgba,
        frame: impl Into<String>,
    ) {
        self.enqueue(DrawRequest::Sphere {
            position,
            radius,
            color,
            frame: frame.into(),
        });
    }

    pub fn draw_arrow(
        &mut self,
        start: Vector3<f64>,
        end: Vector3<f64>,
        shape: ArrowShape,
        color: Rgba,
        frame: impl Into<String>,
    ) {
        self.enqueue(DrawRequest::Arrow {
            start,
            end,
            shape,
            color,
            frame: frame.into(),
        });
    }

    /// Arrow between two points with proportions from its length.
    pub fn draw_arrow_between(
        &mut self,
        start: Vector3<f64>,
        end: Vector3<f64>,
        color: Rgba,
        frame: impl Into<String>,
    ) {
        let length = (end - start).norm();
        self.draw_arrow(start, end, ArrowShape::proportional(length), color, frame);
    }

    /// Arrow from an origin along a direction.
    pub fn draw_arrow_along(
        &mut self,
        origin: Vector3<f64>,
        direction: Vector3<f64>,
        length: f64,
        color: Rgba,
        frame: impl Into<String>,
    ) {
        let end = origin + length * direction.normalize();
        self.draw_arrow(origin, end, ArrowShape::proportional(length), color, frame);
    }

    /// Arrow from an origin along the +Z axis of an orientation.
    pub fn draw_arrow_oriented(
        &mut self,
        origin: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
        length: f64,
        color: Rgba,
        frame: impl Into<String>,
    ) {
        let end = origin + orientation * Vector3::new(0.0, 0.0, length);
        self.draw_arrow(origin, end, ArrowShape::proportional(length), color, frame);
    }

    /// Cone with its apex at `vertex`, opening along the +Z axis of
    /// `orientation`. Encoded as an arrow primitive with zero shaft.
    pub fn draw_cone(
        &mut self,
        vertex: Vector3<f64>,
        orientation: UnitQuaternion<f64>,
        height: f64,
        radius: f64,
        color: Rgba,
        frame: impl Into<String>,
    ) {
        let top = vertex + orientation * Vector3::new(0.0, 0.0, height);
        self.enqueue(DrawRequest::Arrow {
            start: top,
            end: vertex,
            shape: ArrowShape {
                shaft_diameter: 0.0,
                head_diameter: 2.0 * radius,
                head_length: height,
            },
            color,
            frame: frame.into(),
        });
    }

    /// Cone with its apex at `vertex`, opening along `direction`.
    pub fn draw_cone_along(
        &mut self,
        vertex: Vector3<f64>,
        direction: Vector3<f64>,
        height: f64,
        radius: f64,
        color: Rgba,
        frame: impl Into<String>,
    ) {
        let orientation = UnitQuaternion::rotation_between(&Vector3::z(), &direction)
            .unwrap_or_else(|| UnitQuaternion::from_euler_angles(std::f64::consts::PI, 0.0, 0.0));
        self.draw_cone(vertex, orientation, height, radius, color, frame);
    }

    pub fn draw_text(
        &mut self,
        text: impl Into<String>,
        position: Vector3<f64>,
        height: f64,
        color: Rgba,
        frame: impl Into<String>,
    ) {
        self.enqueue(DrawRequest::Text {
            text: text.into(),
            position,
            height,
            color,
            frame: frame.into(),
        });
    }

    /// Converts the queue into one batch, attempts a non-blocking publish
    /// and clears unconditionally. Returns the number of markers handed to
    /// the sink, zero when the sink was busy (the batch is dropped; a
    /// subsequent cycle supersedes it).
    pub fn flush(&mut self, stamp: f64, sink: &mut dyn MarkerSink) -> usize {
        let mut batch = MarkerBatch::default();
        for (id, request) in self.queue.drain(..).enumerate() {
            batch.markers.push(to_marker(id as u32, &self.namespace, stamp, request));
        }
        let count = batch.len();
        match sink.try_publish(batch) {
            Ok(()) => count,
            Err(err) => {
                debug!("marker publish skipped: {}", err);
                0
            }
        }
    }
}

fn to_marker(id: u32, namespace: &str, stamp: f64, request: DrawRequest) -> Marker {
    let (frame_id, kind, color, scale) = match request {
        DrawRequest::Line {
            start,
            end,
            width,
            color,
            frame,
        } => (
            frame,
            MarkerKind::LineList {
                points: [start, end],
            },
            color,
            Vector3::new(width, 0.0, 0.0),
        ),
        DrawRequest::Arrow {
            start,
            end,
            shape,
            color,
            frame,
        } => (
            frame,
            MarkerKind::Arrow {
                points: [start, end],
            },
            color,
            Vector3::new(shape.shaft_diameter, shape.head_diameter, shape.head_length),
        ),
        DrawRequest::Point {
            position,
            scale,
            color,
            frame,
        } => (frame, MarkerKind::Points { position }, color, scale),
        DrawRequest::Sphere {
            position,
            radius,
            color,
            frame,
        } => (
            frame,
            MarkerKind::Sphere { position },
            color,
            Vector3::new(radius, radius, radius),
        ),
        DrawRequest::Text {
            text,
            position,
            height,
            color,
            frame,
        } => (
            frame,
            MarkerKind::Text { position, text },
            color,
            Vector3::new(0.0, 0.0, height),
        ),
    };

    Marker {
        id,
        namespace: namespace.to_string(),
        frame_id,
        stamp,
        lifetime: MARKER_LIFETIME,
        kind,
        color,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WHITE: Rgba = Rgba {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    #[test]
    fn non_finite_request_leaves_buffer_unchanged() {
        let mut buffer = PrimitiveBuffer::new("test");
        buffer.draw_line(
            Vector3::zeros(),
            Vector3::new(1.0, f64::NAN, 0.0),
            0.01,
            WHITE,
            "odom",
        );
        assert!(buffer.is_empty());

        buffer.draw_sphere(Vector3::zeros(), f64::INFINITY, WHITE, "odom");
        assert!(buffer.is_empty());

        buffer.draw_text(
            "label",
            Vector3::zeros(),
            0.1,
            Rgba::new(f32::NAN, 0.0, 0.0, 1.0),
            "odom",
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn flush_stamps_and_clears() {
        let mut buffer = PrimitiveBuffer::new("dls");
        buffer.draw_line(Vector3::zeros(), Vector3::x(), 0.01, WHITE, "odom");
        buffer.draw_sphere(Vector3::y(), 0.05, WHITE, "base");
        buffer.draw_text("com", Vector3::z(), 0.1, WHITE, "odom");

        let mut sink = CollectingSink::default();
        let published = buffer.flush(12.5, &mut sink);

        assert_eq!(published, 3);
        assert!(buffer.is_empty());

        let batch = &sink.batches[0];
        assert_eq!(batch.len(), 3);
        for (i, marker) in batch.markers.iter().enumerate() {
            assert_eq!(marker.id, i as u32);
            assert_eq!(marker.namespace, "dls");
            assert_eq!(marker.stamp, 12.5);
            assert_eq!(marker.lifetime, MARKER_LIFETIME);
        }
        assert_eq!(batch.markers[1].frame_id, "base");

        // Second flush with an empty queue produces an empty batch.
        buffer.flush(12.6, &mut sink);
        assert!(sink.batches[1].is_empty());
    }

    #[test]
    fn busy_sink_drops_batch_without_retry() {
        let mut buffer = PrimitiveBuffer::new("test");
        buffer.draw_point(Vector3::zeros(), 0.02, WHITE, "odom");

        let mut sink = CollectingSink {
            busy: true,
            ..Default::default()
        };
        let published = buffer.flush(1.0, &mut sink);

        assert_eq!(published, 0);
        assert!(sink.batches.is_empty());
        // Queue cleared regardless: the next cycle supersedes this batch.
        assert!(buffer.is_empty());
    }

    #[test]
    fn cone_becomes_zero_shaft_arrow() {
        let mut buffer = PrimitiveBuffer::new("test");
        buffer.draw_cone_along(Vector3::zeros(), Vector3::z(), 0.2, 0.05, WHITE, "odom");

        let mut sink = CollectingSink::default();
        buffer.flush(0.0, &mut sink);

        let marker = &sink.batches[0].markers[0];
        assert!(matches!(marker.kind, MarkerKind::Arrow { .. }));
        assert_eq!(marker.scale, Vector3::new(0.0, 0.1, 0.2));
        if let MarkerKind::Arrow { points } = &marker.kind {
            // Apex is the arrow tip.
            assert_eq!(points[1], Vector3::zeros());
        }
    }

    #[test]
    fn arrow_along_normalizes_direction() {
        let mut buffer = PrimitiveBuffer::new("test");
        buffer.draw_arrow_along(Vector3::zeros(), Vector3::new(0.0, 3.0, 0.0), 0.5, WHITE, "odom");

        let mut sink = CollectingSink::default();
        buffer.flush(0.0, &mut sink);

        if let MarkerKind::Arrow { points } = &sink.batches[0].markers[0].kind {
            assert!((points[1] - Vector3::new(0.0, 0.5, 0.0)).norm() < 1e-12);
        } else {
            panic!("expected arrow marker");
        }
    }

    fn scalar() -> impl Strategy<Value = f64> {
        prop_oneof![
            -100.0..100.0f64,
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
        ]
    }

    proptest! {
        #[test]
        fn admission_matches_finiteness(
            sx in scalar(), sy in scalar(), sz in scalar(),
            ex in scalar(), ey in scalar(), ez in scalar(),
            width in scalar(),
        ) {
            let mut buffer = PrimitiveBuffer::new("prop");
            buffer.draw_line(
                Vector3::new(sx, sy, sz),
                Vector3::new(ex, ey, ez),
                width,
                WHITE,
                "odom",
            );

            let all_finite = [sx, sy, sz, ex, ey, ez, width]
                .iter()
                .all(|v| v.is_finite());
            prop_assert_eq!(buffer.len(), usize::from(all_finite));
        }
    }
}
