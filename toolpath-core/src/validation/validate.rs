//! Validation of curve lists and generated programs.

use crate::error::{Result, ToolpathError};
use crate::model::{Curve, Point};

/// Validation result with warnings.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Whether validation passed.
    pub passed: bool,
    /// Warning messages.
    pub warnings: Vec<String>,
    /// Error messages.
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// Create a passing result.
    pub fn ok() -> Self {
        Self {
            passed: true,
            ..Default::default()
        }
    }

    /// Create a failing result with an error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            errors: vec![message.into()],
            ..Default::default()
        }
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.passed = false;
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
        if !other.passed {
            self.passed = false;
        }
    }
}

/// Validate a curve list before generation.
pub fn validate_curves(curves: &[Curve]) -> Result<ValidationResult> {
    if curves.is_empty() {
        return Err(ToolpathError::EmptyInput);
    }

    let mut result = ValidationResult::ok();
    for (idx, curve) in curves.iter().enumerate() {
        result.merge(validate_curve(curve, idx + 1));
    }
    Ok(result)
}

/// Validate a single curve. `curve_num` is 1-based and only used in messages.
pub fn validate_curve(curve: &Curve, curve_num: usize) -> ValidationResult {
    let mut result = ValidationResult::ok();
    let kind = curve.kind();

    if !curve.points().iter().all(is_finite) {
        result.add_error(format!("Curve {} ({}): Non-finite coordinate", curve_num, kind));
    }

    match curve {
        Curve::Line { points } => match points.len() {
            0 => result.add_error(format!("Curve {} ({}): No points", curve_num, kind)),
            2 | 3 => {}
            n => result.add_warning(format!(
                "Curve {} ({}): Expected 2 points, found {}",
                curve_num, kind, n
            )),
        },
        Curve::Polyline { points } => match points.len() {
            0 => result.add_error(format!("Curve {} ({}): No points", curve_num, kind)),
            1 => result.add_warning(format!(
                "Curve {} ({}): Single point, nothing to cut",
                curve_num, kind
            )),
            _ => {}
        },
        Curve::Circle { radius, .. } | Curve::Arc { radius, .. } => {
            if !(*radius > 0.0) {
                result.add_error(format!(
                    "Curve {} ({}): Invalid radius {}",
                    curve_num, kind, radius
                ));
            }
        }
        Curve::Spline { .. } => result.add_warning(format!(
            "Curve {} ({}): Splines are skipped unless spline conversion is enabled",
            curve_num, kind
        )),
    }

    result
}

fn is_finite(p: &Point) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

/// Quick validation check for the command-line `--validate` flag.
pub fn quick_validate(curves: &[Curve]) -> Result<()> {
    let result = validate_curves(curves)?;

    if !result.passed {
        return Err(ToolpathError::InvalidGeometry(result.errors.join("; ")));
    }

    Ok(())
}

/// Check that every command line of a program starts with a known word.
///
/// Blank lines and `;` comments are ignored.
pub fn validate_gcode(code: &str) -> bool {
    const WORDS: &str = "GMSFXYZIJKRABCDHPTEO";

    code.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
        .all(|line| {
            line.chars()
                .next()
                .is_some_and(|c| WORDS.contains(c.to_ascii_uppercase()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_result_ok() {
        let result = ValidationResult::ok();
        assert!(result.passed);
        assert!(result.warnings.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_validation_result_error() {
        let result = ValidationResult::error("bad");
        assert!(!result.passed);
        assert_eq!(result.errors, vec!["bad"]);
    }

    #[test]
    fn test_validation_result_merge() {
        let mut result = ValidationResult::ok();
        let mut other = ValidationResult::ok();
        other.add_warning("w");
        result.merge(other);
        assert!(result.passed);

        result.merge(ValidationResult::error("e"));
        assert!(!result.passed);
        assert_eq!(result.warnings, vec!["w"]);
        assert_eq!(result.errors, vec!["e"]);
    }

    #[test]
    fn test_validate_curves_empty() {
        assert!(matches!(validate_curves(&[]), Err(ToolpathError::EmptyInput)));
    }

    #[test]
    fn test_validate_curves_valid() {
        let curves = vec![
            Curve::line(Point::xy(0.0, 0.0), Point::xy(1.0, 0.0)),
            Curve::circle(Point::xy(0.0, 0.0), 2.0),
            Curve::polyline(vec![Point::xy(0.0, 0.0), Point::xy(1.0, 1.0)]),
        ];
        let result = validate_curves(&curves).expect("non-empty");
        assert!(result.passed);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_collinear_fallback_line_accepted() {
        let line = Curve::Line {
            points: vec![Point::xy(0.0, 0.0), Point::xy(1.0, 0.0), Point::xy(2.0, 0.0)],
        };
        let result = validate_curve(&line, 1);
        assert!(result.passed);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_curves() {
        let curves = vec![
            Curve::circle(Point::xy(0.0, 0.0), 0.0),
            Curve::Line { points: vec![] },
            Curve::line(Point::xy(f64::NAN, 0.0), Point::xy(1.0, 0.0)),
        ];
        let result = validate_curves(&curves).expect("non-empty");
        assert!(!result.passed);
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors[0].starts_with("Curve 1 (Circle)"));
        assert!(result.errors[1].starts_with("Curve 2 (Line)"));

        let err = quick_validate(&curves).unwrap_err();
        assert!(matches!(err, ToolpathError::InvalidGeometry(_)));
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let curves = vec![
            Curve::spline(vec![Point::xy(0.0, 0.0), Point::xy(1.0, 1.0)]),
            Curve::polyline(vec![Point::xy(0.0, 0.0)]),
        ];
        let result = validate_curves(&curves).expect("non-empty");
        assert!(result.passed);
        assert_eq!(result.warnings.len(), 2);
        assert!(quick_validate(&curves).is_ok());
    }

    #[test]
    fn test_validate_gcode() {
        assert!(validate_gcode("; comment\n\nG21 ; Metric\nM3\nS1000\nX1 Y2"));
        assert!(validate_gcode("g0 x1"));
        assert!(!validate_gcode("G0 X1\nQ5"));
        assert!(!validate_gcode("N10 G0"));
        assert!(validate_gcode(""));
    }
}
