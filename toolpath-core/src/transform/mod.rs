//! Geometry transforms applied before program assembly.

mod arc_fit;
mod depth;
mod offset;
mod pocket;

pub use arc_fit::{fit_arc_through_points, SplineConverter};
pub use depth::{estimate_minutes, plan_passes};
pub use offset::{offset_curve, offset_curves};
pub use pocket::{
    generate_pocket, generate_pocket_with_cancel, zigzag_pattern, CancelToken, Pocket, PocketStop,
};
