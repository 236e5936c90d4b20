//! toolpath-core - Toolpath generation for 2.5D CNC milling.
//!
//! Takes an already-imported curve list (lines, circles, arcs, polylines,
//! splines) and produces a G-code program: optional spline-to-arc fitting,
//! tool-radius offsetting, pocket clearing and depth slicing, then assembly
//! through either the built-in dialect or user-editable motion templates.
//!
//! # Example
//!
//! ```
//! use toolpath_core::{generate_program, Curve, GenerationSettings, Point};
//!
//! let curves = vec![
//!     Curve::line(Point::xy(0.0, 0.0), Point::xy(10.0, 0.0)),
//!     Curve::circle(Point::xy(5.0, 5.0), 2.5),
//! ];
//! let settings = GenerationSettings::new(300.0, 12000, 3.0);
//! let program = generate_program(&curves, &settings).unwrap();
//! assert!(program.code().ends_with("M30 ; Program end"));
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod model;
pub mod transform;
pub mod validation;

// Re-exports for convenience
pub use config::{GenerationSettings, Unit};
pub use error::{ErrorCode, Result, ToolpathError};
pub use generator::{MotionTemplate, ProgramAssembler};
pub use model::{BoundingBox, Curve, CurveKind, DepthPass, Point, Program};
pub use transform::CancelToken;
pub use validation::{validate_curves, validate_gcode, ValidationResult};

/// Apply the enabled geometry transforms.
///
/// Order: spline conversion, offset, pocket. Pocket rings are appended after
/// the (possibly offset) input curves.
pub fn prepare_curves(
    curves: &[Curve],
    settings: &GenerationSettings,
    cancel: &CancelToken,
) -> Result<Vec<Curve>> {
    let mut prepared = curves.to_vec();

    if settings.spline.enabled {
        let converter = transform::SplineConverter::new(settings.spline.tolerance);
        prepared = converter.convert_curves(&prepared);
        tracing::debug!("Spline conversion produced {} curve(s)", prepared.len());
    }

    if settings.offset.enabled {
        prepared =
            transform::offset_curves(&prepared, settings.offset.amount, settings.offset.inward);
        tracing::debug!(
            "Offset {} curve(s) by {} ({})",
            prepared.len(),
            settings.offset.amount,
            if settings.offset.inward { "inward" } else { "outward" }
        );
    }

    if settings.pocket.enabled {
        let pocket = transform::generate_pocket_with_cancel(&prepared, &settings.pocket, cancel)?;
        prepared.extend(pocket.curves);
    }

    Ok(prepared)
}

/// Run the full pipeline and assemble a program.
///
/// This is the main high-level function:
/// 1. Validate the settings
/// 2. Apply the enabled transforms
/// 3. Assemble the program
pub fn generate_program(curves: &[Curve], settings: &GenerationSettings) -> Result<Program> {
    generate_program_with_cancel(curves, settings, &CancelToken::new())
}

/// Like [`generate_program`], with a token that can stop pocket generation.
pub fn generate_program_with_cancel(
    curves: &[Curve],
    settings: &GenerationSettings,
    cancel: &CancelToken,
) -> Result<Program> {
    if curves.is_empty() {
        return Err(ToolpathError::EmptyInput);
    }

    let assembler = ProgramAssembler::new(settings)?;
    let prepared = prepare_curves(curves, settings, cancel)?;
    let program = assembler.assemble(&prepared)?;

    tracing::info!(
        "Generated {} line(s) from {} input curve(s) ({} after transforms)",
        program.len(),
        curves.len(),
        prepared.len()
    );

    Ok(program)
}
