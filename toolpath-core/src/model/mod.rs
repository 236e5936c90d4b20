//! Data model for curves, passes and programs.

mod bounds;
mod curve;
mod point;
mod program;

pub use bounds::BoundingBox;
pub use curve::{
    arc_is_clockwise, arc_sweep_degrees, path_length, polar_angle_degrees, Curve, CurveKind,
};
pub use point::Point;
pub use program::{DepthPass, Program};
