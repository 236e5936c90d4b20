//! Depth-pass planning for step-down cutting.

use crate::config::{EPS, MAX_DEPTH_PASSES};
use crate::model::DepthPass;

/// Split `total_depth` into passes of at most `depth_per_pass`.
///
/// Depths are negative (cutting downwards) and the last pass is clamped to
/// the total depth. Non-positive or non-finite inputs produce no passes, and
/// a plan never holds more than [`MAX_DEPTH_PASSES`] passes.
pub fn plan_passes(total_depth: f64, depth_per_pass: f64) -> Vec<DepthPass> {
    let mut passes = Vec::new();
    if !total_depth.is_finite() || !depth_per_pass.is_finite() {
        return passes;
    }
    if !(total_depth > 0.0) || !(depth_per_pass > 0.0) {
        return passes;
    }

    let mut reached = 0.0;
    for pass_number in 1..=MAX_DEPTH_PASSES {
        // Pass k sits at k * depth_per_pass; never accumulate.
        let mut current = (pass_number as f64 * depth_per_pass).min(total_depth);
        if total_depth - current < EPS {
            current = total_depth;
        }
        if current <= reached {
            break;
        }
        passes.push(DepthPass {
            pass_number,
            depth: -current,
            depth_increment: depth_per_pass,
        });
        reached = current;
        if current >= total_depth {
            break;
        }
    }

    if reached < total_depth {
        tracing::warn!(
            "Depth plan stopped at {} after {} pass(es), short of {}",
            reached,
            passes.len(),
            total_depth
        );
    }
    tracing::debug!(
        "Planned {} pass(es) to depth {}",
        passes.len(),
        total_depth
    );
    passes
}

/// Rough machining time in minutes: the path cut once per pass at `feed_rate`.
pub fn estimate_minutes(passes: &[DepthPass], path_length: f64, feed_rate: f64) -> f64 {
    if feed_rate <= 0.0 {
        return 0.0;
    }
    path_length * passes.len() as f64 / feed_rate
}
