//! Typed curve records handed over by the drawing importer.

use super::{BoundingBox, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Kind of a curve, without its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveKind {
    Line,
    Circle,
    Arc,
    Polyline,
    Spline,
}

impl std::fmt::Display for CurveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CurveKind::Line => "Line",
            CurveKind::Circle => "Circle",
            CurveKind::Arc => "Arc",
            CurveKind::Polyline => "Polyline",
            CurveKind::Spline => "Spline",
        };
        f.write_str(name)
    }
}

/// A single drawing curve.
///
/// Point-count invariants (two points for a line, at least two for a
/// polyline) are the importer's responsibility; the only sanctioned
/// exception is the three-point line emitted by the arc fitter for
/// collinear triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Curve {
    /// Straight segment.
    Line { points: Vec<Point> },
    /// Full circle.
    Circle { center: Point, radius: f64 },
    /// Circular arc. Angles are in degrees.
    Arc {
        center: Point,
        start: Point,
        end: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    /// Open or closed chain of straight segments.
    Polyline { points: Vec<Point> },
    /// Free-form curve given by its fit points.
    Spline { points: Vec<Point> },
}

impl Curve {
    /// Create a two-point line.
    pub fn line(start: Point, end: Point) -> Self {
        Curve::Line {
            points: vec![start, end],
        }
    }

    /// Create a circle.
    pub fn circle(center: Point, radius: f64) -> Self {
        Curve::Circle { center, radius }
    }

    /// Create an arc from its center and end points.
    ///
    /// Radius is measured to the start point; angles are derived from the
    /// start and end positions relative to the center.
    pub fn arc(center: Point, start: Point, end: Point) -> Self {
        Curve::Arc {
            center,
            start,
            end,
            radius: center.distance_2d(&start),
            start_angle: polar_angle_degrees(&center, &start),
            end_angle: polar_angle_degrees(&center, &end),
        }
    }

    /// Create a polyline.
    pub fn polyline(points: Vec<Point>) -> Self {
        Curve::Polyline { points }
    }

    /// Create a spline from its fit points.
    pub fn spline(points: Vec<Point>) -> Self {
        Curve::Spline { points }
    }

    /// The kind of this curve.
    pub fn kind(&self) -> CurveKind {
        match self {
            Curve::Line { .. } => CurveKind::Line,
            Curve::Circle { .. } => CurveKind::Circle,
            Curve::Arc { .. } => CurveKind::Arc,
            Curve::Polyline { .. } => CurveKind::Polyline,
            Curve::Spline { .. } => CurveKind::Spline,
        }
    }

    /// Stored points, in storage order (center first for circles and arcs).
    pub fn points(&self) -> Vec<Point> {
        match self {
            Curve::Line { points } | Curve::Polyline { points } | Curve::Spline { points } => {
                points.clone()
            }
            Curve::Circle { center, .. } => vec![*center],
            Curve::Arc {
                center, start, end, ..
            } => vec![*center, *start, *end],
        }
    }

    /// Axis-aligned bounds.
    ///
    /// Circles span center ± radius; a negative radius yields an inverted
    /// (negative-size) box. Arcs use their stored center and end points.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Curve::Circle { center, radius } => Some(BoundingBox {
                min_x: center.x - radius,
                min_y: center.y - radius,
                max_x: center.x + radius,
                max_y: center.y + radius,
            }),
            _ => BoundingBox::from_points(&self.points()),
        }
    }

    /// Planar length of the path the tool follows along this curve.
    pub fn path_length(&self) -> f64 {
        match self {
            Curve::Line { points } | Curve::Polyline { points } | Curve::Spline { points } => {
                points.windows(2).map(|w| w[0].distance_2d(&w[1])).sum()
            }
            Curve::Circle { radius, .. } => 2.0 * PI * radius.abs(),
            Curve::Arc {
                radius,
                start_angle,
                end_angle,
                ..
            } => radius.abs() * arc_sweep_degrees(*start_angle, *end_angle).to_radians(),
        }
    }
}

/// Arc direction convention used by the program assembler: clockwise
/// when the stored start angle is below the end angle.
pub fn arc_is_clockwise(start_angle: f64, end_angle: f64) -> bool {
    start_angle < end_angle
}

/// Swept angle in degrees, in the direction given by [`arc_is_clockwise`].
pub fn arc_sweep_degrees(start_angle: f64, end_angle: f64) -> f64 {
    let raw = if arc_is_clockwise(start_angle, end_angle) {
        start_angle - end_angle
    } else {
        end_angle - start_angle
    };
    raw.rem_euclid(360.0)
}

/// Angle of `point` around `center`, in degrees.
pub fn polar_angle_degrees(center: &Point, point: &Point) -> f64 {
    (point.y - center.y).atan2(point.x - center.x).to_degrees()
}

/// Total path length of a curve list.
pub fn path_length(curves: &[Curve]) -> f64 {
    curves.iter().map(Curve::path_length).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc_constructor_angles() {
        let arc = Curve::arc(Point::xy(0.0, 0.0), Point::xy(5.0, 0.0), Point::xy(0.0, 5.0));
        match arc {
            Curve::Arc {
                radius,
                start_angle,
                end_angle,
                ..
            } => {
                assert_eq!(radius, 5.0);
                assert_eq!(start_angle, 0.0);
                assert!((end_angle - 90.0).abs() < 1e-9);
            }
            other => panic!("Expected arc, got {:?}", other),
        }
    }

    #[test]
    fn test_circle_bounding_box() {
        let circle = Curve::circle(Point::xy(10.0, 5.0), 2.0);
        let bb = circle.bounding_box().expect("bounds");
        assert_eq!(bb.width(), 4.0);
        assert_eq!(bb.height(), 4.0);
        assert_eq!(bb.min_x, 8.0);

        let inverted = Curve::circle(Point::xy(0.0, 0.0), -1.0);
        assert!(inverted.bounding_box().expect("bounds").width() < 0.0);
    }

    #[test]
    fn test_path_lengths() {
        let line = Curve::line(Point::xy(0.0, 0.0), Point::xy(3.0, 4.0));
        assert_eq!(line.path_length(), 5.0);

        let square = Curve::polyline(vec![
            Point::xy(0.0, 0.0),
            Point::xy(2.0, 0.0),
            Point::xy(2.0, 2.0),
            Point::xy(0.0, 2.0),
            Point::xy(0.0, 0.0),
        ]);
        assert_eq!(square.path_length(), 8.0);

        let circle = Curve::circle(Point::xy(0.0, 0.0), 1.0);
        assert!((circle.path_length() - 2.0 * PI).abs() < 1e-12);

        assert_eq!(path_length(&[line, square]), 13.0);
    }

    #[test]
    fn test_arc_sweep() {
        // start < end is clockwise, so 0 -> 90 sweeps the long way round
        assert_eq!(arc_sweep_degrees(0.0, 90.0), 270.0);
        assert_eq!(arc_sweep_degrees(90.0, 0.0), 90.0);
    }

    #[test]
    fn test_serde_tagging() {
        let json = r#"{ "type": "Circle", "center": { "x": 1.0, "y": 2.0 }, "radius": 3.0 }"#;
        let curve: Curve = serde_json::from_str(json).expect("valid curve");
        assert_eq!(curve, Curve::circle(Point::xy(1.0, 2.0), 3.0));
        assert_eq!(curve.kind(), CurveKind::Circle);
    }
}
