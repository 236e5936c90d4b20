//! Concentric pocket clearing with bounding-box island exclusion.
//!
//! Both the collapse test and the island test work on axis-aligned
//! bounding boxes only. They are approximations: exact polygon clipping is
//! not attempted, so islands may be over- or under-rejected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{PocketSettings, EPS, POCKET_COLLAPSE_SIZE, POCKET_MAX_CURVES};
use crate::error::{Result, ToolpathError};
use crate::model::{BoundingBox, Curve, Point};

use super::offset::offset_curves;

/// Cooperative cancellation for long pocket runs.
///
/// Clones share the same flag, so a token handed to another thread can stop
/// a pocket in progress. An optional deadline trips the token on its own.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also trips once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Why the ring loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PocketStop {
    /// Offsetting produced no curves.
    Empty,
    /// The next ring fell under the collapse size.
    Collapsed,
    /// The last ring did not shrink relative to its input.
    Stalled,
    /// The curve cap was reached.
    CurveLimit,
}

/// Rings produced by a pocket run.
#[derive(Debug, Clone, PartialEq)]
pub struct Pocket {
    /// Every accumulated ring curve, outermost ring first.
    pub curves: Vec<Curve>,
    /// Number of rings produced before island filtering.
    pub rings: usize,
    pub stop: PocketStop,
}

/// Generate pocket rings inside `boundary`.
pub fn generate_pocket(boundary: &[Curve], settings: &PocketSettings) -> Vec<Curve> {
    match run_pocket(boundary, settings, None) {
        Ok(pocket) => pocket.curves,
        // Without a token nothing can cancel the run.
        Err(_) => Vec::new(),
    }
}

/// Generate pocket rings, polling `cancel` once per ring.
///
/// A tripped token fails the whole call; partial rings are discarded.
pub fn generate_pocket_with_cancel(
    boundary: &[Curve],
    settings: &PocketSettings,
    cancel: &CancelToken,
) -> Result<Pocket> {
    run_pocket(boundary, settings, Some(cancel))
}

fn run_pocket(
    boundary: &[Curve],
    settings: &PocketSettings,
    cancel: Option<&CancelToken>,
) -> Result<Pocket> {
    let stepover = settings.stepover;
    if boundary.is_empty() || !(stepover > 0.0) {
        if !boundary.is_empty() {
            tracing::warn!("Pocket stepover {} is not positive, no rings generated", stepover);
        }
        return Ok(Pocket {
            curves: Vec::new(),
            rings: 0,
            stop: PocketStop::Empty,
        });
    }

    let mut rings_out: Vec<Curve> = Vec::new();
    let mut current: Vec<Curve> = boundary.to_vec();
    let mut current_bounds = BoundingBox::of_curves(&current);
    let mut rings = 0usize;

    let stop = loop {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                tracing::warn!("Pocket generation cancelled after {} ring(s)", rings);
                return Err(ToolpathError::Cancelled { rings });
            }
        }

        let ring = offset_curves(&current, stepover, true);
        if ring.is_empty() {
            break PocketStop::Empty;
        }

        let ring_bounds = BoundingBox::of_curves(&ring);
        if is_collapsed(ring_bounds.as_ref()) {
            break PocketStop::Collapsed;
        }

        rings_out.extend(ring.iter().cloned());
        rings += 1;

        if rings_out.len() >= POCKET_MAX_CURVES {
            rings_out.truncate(POCKET_MAX_CURVES);
            break PocketStop::CurveLimit;
        }

        if !has_shrunk(current_bounds.as_ref(), ring_bounds.as_ref()) {
            break PocketStop::Stalled;
        }

        current = ring;
        current_bounds = ring_bounds;
    };

    tracing::debug!(
        "Pocket: {} ring(s), {} curve(s), stopped: {:?}",
        rings,
        rings_out.len(),
        stop
    );

    let curves = if settings.detect_islands {
        let islands = select_islands(boundary, settings.island_indices.as_deref());
        remove_island_intersections(rings_out, &islands)
    } else {
        rings_out
    };

    Ok(Pocket {
        curves,
        rings,
        stop,
    })
}

fn is_collapsed(bounds: Option<&BoundingBox>) -> bool {
    match bounds {
        Some(bb) => bb.width() < POCKET_COLLAPSE_SIZE || bb.height() < POCKET_COLLAPSE_SIZE,
        None => true,
    }
}

/// A ring has made progress when it is narrower or shorter than its input.
fn has_shrunk(before: Option<&BoundingBox>, after: Option<&BoundingBox>) -> bool {
    match (before, after) {
        (Some(b), Some(a)) => a.width() < b.width() - EPS || a.height() < b.height() - EPS,
        _ => false,
    }
}

fn select_islands(boundary: &[Curve], indices: Option<&[usize]>) -> Vec<BoundingBox> {
    match indices {
        Some(indices) => indices
            .iter()
            .filter_map(|&i| boundary.get(i))
            .filter_map(Curve::bounding_box)
            .collect(),
        None => boundary.iter().filter_map(Curve::bounding_box).collect(),
    }
}

/// Drop every ring curve whose bounds touch an island's bounds.
fn remove_island_intersections(rings: Vec<Curve>, islands: &[BoundingBox]) -> Vec<Curve> {
    let before = rings.len();
    let kept: Vec<Curve> = rings
        .into_iter()
        .filter(|ring| match ring.bounding_box() {
            Some(bb) => !islands.iter().any(|island| bb.intersects(island)),
            None => true,
        })
        .collect();

    if kept.len() < before {
        tracing::debug!("Island filter removed {} curve(s)", before - kept.len());
    }
    kept
}

/// Back-and-forth raster over a rectangle, one row per stepover.
pub fn zigzag_pattern(bounds: &BoundingBox, stepover: f64) -> Vec<Point> {
    let mut points = Vec::new();
    if !(stepover > 0.0) {
        return points;
    }

    let mut y = bounds.min_y;
    let mut left_to_right = true;
    while y <= bounds.max_y {
        let (from, to) = if left_to_right {
            (bounds.min_x, bounds.max_x)
        } else {
            (bounds.max_x, bounds.min_x)
        };
        points.push(Point::xy(from, y));
        points.push(Point::xy(to, y));

        y += stepover;
        left_to_right = !left_to_right;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Clockwise closed square, so inward offsets move into the square.
    fn square(side: f64) -> Curve {
        Curve::polyline(vec![
            Point::xy(0.0, 0.0),
            Point::xy(0.0, side),
            Point::xy(side, side),
            Point::xy(side, 0.0),
            Point::xy(0.0, 0.0),
        ])
    }

    fn pocket_settings(stepover: f64) -> PocketSettings {
        PocketSettings {
            enabled: true,
            stepover,
            ..Default::default()
        }
    }

    #[test]
    fn test_unit_square_single_ring() {
        let pocket = generate_pocket_with_cancel(&[square(1.0)], &pocket_settings(1.0), &CancelToken::new())
            .expect("not cancelled");
        assert_eq!(pocket.rings, 1);
        assert_eq!(pocket.curves.len(), 1);
        assert_eq!(pocket.stop, PocketStop::Stalled);
    }

    #[test]
    fn test_circle_shrinks_until_collapse() {
        let boundary = [Curve::circle(Point::xy(0.0, 0.0), 5.0)];
        let pocket = generate_pocket_with_cancel(&boundary, &pocket_settings(1.0), &CancelToken::new())
            .expect("not cancelled");

        // radii 4, 3, 2, 1; radius 0 collapses
        assert_eq!(pocket.rings, 4);
        assert_eq!(pocket.stop, PocketStop::Collapsed);
        let radii: Vec<f64> = pocket
            .curves
            .iter()
            .map(|c| match c {
                Curve::Circle { radius, .. } => *radius,
                other => panic!("Expected circle, got {:?}", other),
            })
            .collect();
        assert_eq!(radii, vec![4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_curve_cap() {
        let boundary = [Curve::circle(Point::xy(0.0, 0.0), 100.0)];
        let pocket = generate_pocket_with_cancel(&boundary, &pocket_settings(0.01), &CancelToken::new())
            .expect("not cancelled");
        assert_eq!(pocket.curves.len(), POCKET_MAX_CURVES);
        assert_eq!(pocket.stop, PocketStop::CurveLimit);
    }

    #[test]
    fn test_cap_holds_for_multi_curve_rings() {
        let boundary: Vec<Curve> = (0..3)
            .map(|i| Curve::circle(Point::xy(i as f64 * 500.0, 0.0), 200.0))
            .collect();
        let curves = generate_pocket(&boundary, &pocket_settings(0.05));
        assert_eq!(curves.len(), POCKET_MAX_CURVES);
    }

    #[test]
    fn test_empty_and_invalid_input() {
        assert!(generate_pocket(&[], &pocket_settings(1.0)).is_empty());
        assert!(generate_pocket(&[square(10.0)], &pocket_settings(0.0)).is_empty());
        assert!(generate_pocket(&[square(10.0)], &pocket_settings(-1.0)).is_empty());
    }

    #[test]
    fn test_cancelled_token() {
        let token = CancelToken::new();
        token.cancel();
        let err = generate_pocket_with_cancel(
            &[Curve::circle(Point::xy(0.0, 0.0), 10.0)],
            &pocket_settings(1.0),
            &token,
        )
        .unwrap_err();
        assert!(matches!(err, ToolpathError::Cancelled { rings: 0 }));
    }

    #[test]
    fn test_expired_deadline() {
        let token = CancelToken::with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());
        assert!(token.clone().is_cancelled());
    }

    #[test]
    fn test_island_filter() {
        let pocket = Curve::circle(Point::xy(0.0, 0.0), 5.0);
        let island = Curve::circle(Point::xy(100.0, 0.0), 5.0);
        let settings = PocketSettings {
            enabled: true,
            stepover: 1.0,
            detect_islands: true,
            island_indices: Some(vec![1]),
        };

        // both circles shrink together; only the rings inside the island go
        let curves = generate_pocket(&[pocket, island], &settings);
        assert_eq!(curves.len(), 4);
        for curve in &curves {
            match curve {
                Curve::Circle { center, .. } => assert_eq!(center.x, 0.0),
                other => panic!("Expected circle, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_islands_default_to_whole_boundary() {
        let settings = PocketSettings {
            enabled: true,
            stepover: 1.0,
            detect_islands: true,
            island_indices: None,
        };
        // every ring lies inside the boundary, so every ring is rejected
        let curves = generate_pocket(&[Curve::circle(Point::xy(0.0, 0.0), 5.0)], &settings);
        assert!(curves.is_empty());
    }

    #[test]
    fn test_zigzag_pattern() {
        let bounds = BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 2.0,
        };
        let points = zigzag_pattern(&bounds, 1.0);
        assert_eq!(
            points,
            vec![
                Point::xy(0.0, 0.0),
                Point::xy(10.0, 0.0),
                Point::xy(10.0, 1.0),
                Point::xy(0.0, 1.0),
                Point::xy(0.0, 2.0),
                Point::xy(10.0, 2.0),
            ]
        );
        assert!(zigzag_pattern(&bounds, 0.0).is_empty());
    }
}
