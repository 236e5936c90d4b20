//! Tool-radius compensation by per-primitive parallel curves.
//!
//! Each primitive is offset on its own: there is no corner mitering or
//! trimming, so adjacent offset segments may gap or overlap at sharp
//! corners. Arcs are not compensated and pass through unchanged.

use crate::config::MIN_EDGE_LENGTH;
use crate::model::{Curve, Point};

/// Offset every curve by `amount`, to the right of each edge when `inward`
/// and to the left otherwise.
pub fn offset_curves(curves: &[Curve], amount: f64, inward: bool) -> Vec<Curve> {
    let offset = if inward { -amount } else { amount };

    let arcs = curves
        .iter()
        .filter(|c| matches!(c, Curve::Arc { .. }))
        .count();
    if arcs > 0 {
        tracing::debug!("{} arc(s) passed through offset without compensation", arcs);
    }

    curves.iter().map(|c| offset_curve(c, offset)).collect()
}

/// Offset a single curve by a signed distance along its left-hand normal.
pub fn offset_curve(curve: &Curve, offset: f64) -> Curve {
    match curve {
        Curve::Line { points } => offset_line(curve, points, offset),
        Curve::Circle { center, radius } => Curve::Circle {
            center: *center,
            radius: radius + offset,
        },
        Curve::Polyline { points } => offset_polyline(curve, points, offset),
        Curve::Arc { .. } | Curve::Spline { .. } => curve.clone(),
    }
}

/// Unit left-hand normal of the edge a -> b, or `None` for a degenerate edge.
fn edge_normal(a: &Point, b: &Point) -> Option<(f64, f64)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length < MIN_EDGE_LENGTH {
        return None;
    }
    Some((-dy / length, dx / length))
}

fn offset_line(original: &Curve, points: &[Point], offset: f64) -> Curve {
    let (Some(p1), Some(p2)) = (points.first(), points.get(1)) else {
        return original.clone();
    };
    let Some((nx, ny)) = edge_normal(p1, p2) else {
        return original.clone();
    };

    Curve::Line {
        points: vec![
            p1.translated(nx * offset, ny * offset),
            p2.translated(nx * offset, ny * offset),
        ],
    }
}

fn offset_polyline(original: &Curve, points: &[Point], offset: f64) -> Curve {
    if points.len() < 2 {
        return original.clone();
    }

    let mut shifted: Vec<Point> = points
        .windows(2)
        .filter_map(|w| {
            edge_normal(&w[0], &w[1]).map(|(nx, ny)| w[0].translated(nx * offset, ny * offset))
        })
        .collect();

    let last = &points[points.len() - 1];
    let prev = &points[points.len() - 2];
    if let Some((nx, ny)) = edge_normal(prev, last) {
        shifted.push(last.translated(nx * offset, ny * offset));
    }

    // Every edge degenerate: nothing sensible to emit.
    if shifted.len() < 2 {
        return original.clone();
    }

    Curve::Polyline { points: shifted }
}
