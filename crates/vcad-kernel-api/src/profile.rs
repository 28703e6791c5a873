//! 2D sketch profiles and sweep parameters.

use std::f64::consts::PI;

use crate::{KernelError, Point2, Point3, Result, Vec3};

/// Distance below which two sketch points are considered coincident.
pub const LINEAR_TOLERANCE: f64 = 1e-6;

/// A segment of a 2D sketch profile.
#[derive(Debug, Clone, PartialEq)]
pub enum SketchSegment {
    /// A line segment from start to end.
    Line {
        /// Start point in 2D sketch coordinates.
        start: Point2,
        /// End point in 2D sketch coordinates.
        end: Point2,
    },
    /// A circular arc from start to end around a center.
    Arc {
        /// Start point in 2D sketch coordinates.
        start: Point2,
        /// End point in 2D sketch coordinates.
        end: Point2,
        /// Center of the arc in 2D sketch coordinates.
        center: Point2,
        /// If true, arc goes counter-clockwise from start to end.
        ccw: bool,
    },
}

impl SketchSegment {
    /// Get the start point of this segment.
    pub fn start(&self) -> Point2 {
        match self {
            SketchSegment::Line { start, .. } | SketchSegment::Arc { start, .. } => *start,
        }
    }

    /// Get the end point of this segment.
    pub fn end(&self) -> Point2 {
        match self {
            SketchSegment::Line { end, .. } | SketchSegment::Arc { end, .. } => *end,
        }
    }

    /// Check if this segment is degenerate (zero length).
    pub fn is_degenerate(&self) -> bool {
        match self {
            SketchSegment::Line { start, end } => (end - start).norm() < LINEAR_TOLERANCE,
            SketchSegment::Arc {
                start, end, center, ..
            } => {
                (start - center).norm() < LINEAR_TOLERANCE
                    || (end - center).norm() < LINEAR_TOLERANCE
                    || (end - start).norm() < LINEAR_TOLERANCE
            }
        }
    }

    /// Signed sweep angle of an arc in radians (positive = counter-clockwise).
    fn arc_angle(start: Point2, end: Point2, center: Point2, ccw: bool) -> f64 {
        let d_start = start - center;
        let d_end = end - center;
        let mut angle = d_end.y.atan2(d_end.x) - d_start.y.atan2(d_start.x);
        if ccw {
            if angle < 0.0 {
                angle += 2.0 * PI;
            }
        } else if angle > 0.0 {
            angle -= 2.0 * PI;
        }
        angle
    }

    /// Points along the segment, starting at `start()` and excluding `end()`.
    ///
    /// Lines yield one point; arcs yield `arc_segments` points.
    pub fn sample(&self, arc_segments: u32) -> Vec<Point2> {
        match self {
            SketchSegment::Line { start, .. } => vec![*start],
            SketchSegment::Arc {
                start,
                end,
                center,
                ccw,
            } => {
                let n = arc_segments.max(1);
                let radius = (start - center).norm();
                let a0 = (start.y - center.y).atan2(start.x - center.x);
                let sweep = Self::arc_angle(*start, *end, *center, *ccw);
                (0..n)
                    .map(|i| {
                        let a = a0 + sweep * f64::from(i) / f64::from(n);
                        Point2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
                    })
                    .collect()
            }
        }
    }
}

/// One or more closed 2D loops on a sketch plane.
///
/// The loops are defined in a local 2D coordinate system with an origin
/// point in 3D and two direction vectors. Consecutive segments are chained;
/// a segment that does not start where the previous one ended begins a new
/// loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SketchProfile {
    /// Origin point of the sketch plane in 3D.
    pub origin: Point3,
    /// Unit vector along the local X axis.
    pub x_dir: Vec3,
    /// Unit vector along the local Y axis.
    pub y_dir: Vec3,
    /// Unit normal to the sketch plane (x_dir × y_dir).
    pub normal: Vec3,
    /// The segments forming the closed loops.
    pub segments: Vec<SketchSegment>,
}

impl SketchProfile {
    /// Create a new sketch profile.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The profile has no segments
    /// - Any segment is degenerate
    /// - Any loop is not closed
    /// - `x_dir` and `y_dir` are parallel or zero
    pub fn new(
        origin: Point3,
        x_dir: Vec3,
        y_dir: Vec3,
        segments: Vec<SketchSegment>,
    ) -> Result<Self> {
        if segments.is_empty() {
            return Err(KernelError::EmptyProfile);
        }
        if let Some(i) = segments.iter().position(SketchSegment::is_degenerate) {
            return Err(KernelError::DegenerateSegment(i));
        }
        let normal = x_dir.cross(&y_dir);
        if normal.norm() < LINEAR_TOLERANCE {
            return Err(KernelError::DegeneratePlane);
        }

        let profile = Self {
            origin,
            x_dir: x_dir.normalize(),
            y_dir: y_dir.normalize(),
            normal: normal.normalize(),
            segments,
        };
        for range in profile.loop_ranges() {
            let first = profile.segments[range.start].start();
            let last = profile.segments[range.end - 1].end();
            let gap = (last - first).norm();
            if gap > LINEAR_TOLERANCE {
                return Err(KernelError::NotClosed(gap));
            }
        }
        Ok(profile)
    }

    /// Create a rectangular profile with corners `(0, 0)` and `(width, height)`.
    ///
    /// Segments go counter-clockwise when viewed from the +normal direction.
    pub fn rectangle(origin: Point3, x_dir: Vec3, y_dir: Vec3, width: f64, height: f64) -> Self {
        let p0 = Point2::new(0.0, 0.0);
        let p1 = Point2::new(width, 0.0);
        let p2 = Point2::new(width, height);
        let p3 = Point2::new(0.0, height);
        Self {
            origin,
            x_dir: x_dir.normalize(),
            y_dir: y_dir.normalize(),
            normal: x_dir.cross(&y_dir).normalize(),
            segments: vec![
                SketchSegment::Line { start: p0, end: p1 },
                SketchSegment::Line { start: p1, end: p2 },
                SketchSegment::Line { start: p2, end: p3 },
                SketchSegment::Line { start: p3, end: p0 },
            ],
        }
    }

    /// Index ranges of the segments forming each loop.
    fn loop_ranges(&self) -> Vec<std::ops::Range<usize>> {
        let mut ranges = Vec::new();
        let mut begin = 0;
        for i in 1..self.segments.len() {
            let gap = (self.segments[i].start() - self.segments[i - 1].end()).norm();
            if gap > LINEAR_TOLERANCE {
                ranges.push(begin..i);
                begin = i;
            }
        }
        if begin < self.segments.len() {
            ranges.push(begin..self.segments.len());
        }
        ranges
    }

    /// Flatten each loop into a closed polyline (closing point not repeated).
    pub fn to_polyline(&self, arc_segments: u32) -> Vec<Vec<Point2>> {
        self.loop_ranges()
            .into_iter()
            .map(|range| {
                self.segments[range]
                    .iter()
                    .flat_map(|s| s.sample(arc_segments))
                    .collect()
            })
            .collect()
    }

    /// Map a 2D point in sketch coordinates to 3D.
    pub fn to_3d(&self, p: Point2) -> Point3 {
        self.origin + p.x * self.x_dir + p.y * self.y_dir
    }

    /// Map a 3D point to 2D sketch coordinates.
    pub fn to_2d(&self, p: Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(&self.x_dir), d.dot(&self.y_dir))
    }

    /// Number of closed loops.
    pub fn num_loops(&self) -> usize {
        self.loop_ranges().len()
    }
}

/// Options for the sweep operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOptions {
    /// Total twist angle along the path (in radians). Default: 0.0
    pub twist_angle: f64,
    /// Number of segments along the path. 0 = auto.
    pub path_segments: u32,
    /// Scale factor at the start of the path. Default: 1.0
    pub scale_start: f64,
    /// Scale factor at the end of the path. Default: 1.0
    pub scale_end: f64,
    /// Number of line segments per arc in the profile. Default: 8.
    pub arc_segments: u32,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            twist_angle: 0.0,
            path_segments: 0,
            scale_start: 1.0,
            scale_end: 1.0,
            arc_segments: 8,
        }
    }
}

/// A helix around the Z axis starting on the +X side of `center`.
///
/// ```text
/// x(t) = radius * cos(2π * turns * t)
/// y(t) = radius * sin(2π * turns * t)
/// z(t) = height * t
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Helix {
    /// Center of the helix at the base.
    pub center: Point3,
    /// Radius of the helix.
    pub radius: f64,
    /// Pitch (height per turn).
    pub pitch: f64,
    /// Total height of the helix.
    pub height: f64,
    /// Number of turns.
    pub turns: f64,
}

impl Helix {
    /// Create a new helix at the origin.
    ///
    /// A non-positive `turns` is derived from `height / pitch`.
    pub fn new(radius: f64, pitch: f64, height: f64, turns: f64) -> Self {
        let turns = if turns > 0.0 || pitch <= 0.0 {
            turns
        } else {
            height / pitch
        };
        Self {
            center: Point3::origin(),
            radius,
            pitch,
            height,
            turns,
        }
    }

    /// Point at parameter `t ∈ [0, 1]`.
    pub fn point(&self, t: f64) -> Point3 {
        let angle = 2.0 * PI * self.turns * t;
        Point3::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
            self.center.z + self.height * t,
        )
    }

    /// Unnormalized tangent at parameter `t`.
    pub fn tangent(&self, t: f64) -> Vec3 {
        let angle = 2.0 * PI * self.turns * t;
        let d_angle = 2.0 * PI * self.turns;
        Vec3::new(
            -self.radius * d_angle * angle.sin(),
            self.radius * d_angle * angle.cos(),
            self.height,
        )
    }

    /// Path samples for a smooth helix: 48 per turn, at least 64.
    pub fn suggested_segments(&self) -> usize {
        ((self.turns.abs() * 48.0).ceil() as usize).max(64)
    }
}
