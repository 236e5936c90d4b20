//! Input and output checks.

mod validate;

pub use validate::{
    quick_validate, validate_curve, validate_curves, validate_gcode, ValidationResult,
};
