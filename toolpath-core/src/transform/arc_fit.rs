//! Spline approximation by circular arcs fitted through point triples.

use crate::config::{COLLINEAR_EPS, DEFAULT_ARC_TOLERANCE};
use crate::model::{polar_angle_degrees, Curve, Point};

/// Converts spline curves into arcs (or lines) a controller can interpolate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineConverter {
    tolerance: f64,
}

impl Default for SplineConverter {
    fn default() -> Self {
        Self::new(DEFAULT_ARC_TOLERANCE)
    }
}

impl SplineConverter {
    /// Create a converter with the given fit tolerance.
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Fit one arc through every window of three consecutive spline points.
    ///
    /// Windows overlap (step 1), so a spline of n points yields n - 2
    /// curves. Collinear windows become three-point fallback lines.
    /// Anything other than a spline with at least three points yields
    /// nothing.
    pub fn convert_spline(&self, spline: &Curve) -> Vec<Curve> {
        let Curve::Spline { points } = spline else {
            return Vec::new();
        };
        points
            .windows(3)
            .map(|w| fit_arc_through_points(&w[0], &w[1], &w[2]))
            .collect()
    }

    /// Replace every spline in the list by its fitted arcs.
    pub fn convert_curves(&self, curves: &[Curve]) -> Vec<Curve> {
        let mut converted = Vec::with_capacity(curves.len());
        let mut splines = 0usize;

        for curve in curves {
            if matches!(curve, Curve::Spline { .. }) {
                splines += 1;
                converted.extend(self.convert_spline(curve));
            } else {
                converted.push(curve.clone());
            }
        }

        tracing::debug!(
            "Converted {} spline(s): {} curves in, {} out",
            splines,
            curves.len(),
            converted.len()
        );
        converted
    }

    /// Break a spline's chords into straight segments no longer than
    /// `segment_length`.
    pub fn approximate_with_lines(&self, spline: &Curve, segment_length: f64) -> Vec<Curve> {
        let Curve::Spline { points } = spline else {
            return Vec::new();
        };
        if segment_length <= 0.0 {
            return Vec::new();
        }

        let mut lines = Vec::new();
        for w in points.windows(2) {
            let (p1, p2) = (&w[0], &w[1]);
            let segments = (p1.distance_2d(p2) / segment_length).ceil() as usize;

            for j in 0..segments {
                let t1 = j as f64 / segments as f64;
                let t2 = (j + 1) as f64 / segments as f64;
                lines.push(Curve::line(p1.lerp(p2, t1), p1.lerp(p2, t2)));
            }
        }
        lines
    }

    /// Check that every point lies within tolerance of the arc's circle.
    pub fn arc_within_tolerance(&self, arc: &Curve, points: &[Point]) -> bool {
        let Curve::Arc { center, radius, .. } = arc else {
            return false;
        };
        if points.is_empty() {
            return false;
        }
        points
            .iter()
            .all(|p| (center.distance_2d(p) - radius).abs() <= self.tolerance)
    }
}

/// Circumscribed arc through three points, from `p1` to `p3`.
///
/// Near-collinear triples have no usable circumcircle and come back as a
/// line through all three points.
pub fn fit_arc_through_points(p1: &Point, p2: &Point, p3: &Point) -> Curve {
    let (ax, ay) = (p1.x, p1.y);
    let (bx, by) = (p2.x, p2.y);
    let (cx, cy) = (p3.x, p3.y);

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < COLLINEAR_EPS {
        return Curve::Line {
            points: vec![*p1, *p2, *p3],
        };
    }

    let a_sq = ax * ax + ay * ay;
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let ux = (a_sq * (by - cy) + b_sq * (cy - ay) + c_sq * (ay - by)) / d;
    let uy = (a_sq * (cx - bx) + b_sq * (ax - cx) + c_sq * (bx - ax)) / d;

    let center = Point::new(ux, uy, p1.z);
    Curve::Arc {
        center,
        start: *p1,
        end: *p3,
        radius: center.distance_2d(p1),
        start_angle: polar_angle_degrees(&center, p1),
        end_angle: polar_angle_degrees(&center, p3),
    }
}
