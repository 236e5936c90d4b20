//! Integration tests for curve-list to G-code generation.
//!
//! Programs are split into sections (header comments, setup, body, shutdown)
//! and checked structurally, plus a few exact comparisons where the output
//! is fully determined by the settings.

use pretty_assertions::assert_eq;
use std::path::Path;
use toolpath_core::generator::{extract_values, retemplate_lines, CompiledTemplate};
use toolpath_core::{
    generate_program, generate_program_with_cancel, validate_curves, validate_gcode, CancelToken,
    Curve, ErrorCode, GenerationSettings, Point, Program, ToolpathError,
};

/// Fixture directory for integration tests
const FIXTURE_DIR: &str = "tests/fixtures";

fn load_curves(name: &str) -> Vec<Curve> {
    let path = Path::new(FIXTURE_DIR).join(name);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e))
}

// ==================== Program Structure Parsing ====================

/// A program split at its fixed landmarks.
#[derive(Debug)]
struct ProgramSections {
    /// Leading `;` comment lines.
    header: Vec<String>,
    /// Everything between the header and the first body line.
    setup: Vec<String>,
    /// Motion and pass lines.
    body: Vec<String>,
    /// Spindle stop onwards.
    shutdown: Vec<String>,
}

impl ProgramSections {
    /// Split on the first safe-height move and the last spindle stop.
    fn parse(program: &Program) -> Self {
        let lines: Vec<String> = program.lines().to_vec();

        let header_end = lines
            .iter()
            .position(|l| !l.starts_with(';'))
            .expect("program has commands");
        let setup_end = lines
            .iter()
            .position(|l| l.starts_with("G0 Z"))
            .expect("safe height move")
            + 1;
        let shutdown_start = lines
            .iter()
            .rposition(|l| l.starts_with("M5"))
            .expect("spindle stop");

        ProgramSections {
            header: lines[..header_end].to_vec(),
            setup: lines[header_end..setup_end].to_vec(),
            body: lines[setup_end..shutdown_start].to_vec(),
            shutdown: lines[shutdown_start..].to_vec(),
        }
    }

    fn count_body(&self, prefix: &str) -> usize {
        self.body.iter().filter(|l| l.starts_with(prefix)).count()
    }

    fn count_body_containing(&self, needle: &str) -> usize {
        self.body.iter().filter(|l| l.contains(needle)).count()
    }
}

// ==================== End-to-End Tests ====================

#[test]
fn test_single_line_only_positions_tool() {
    let curves = load_curves("single_line.json");
    let settings = GenerationSettings::new(100.0, 12000, 3.0);
    let program = generate_program(&curves, &settings).expect("program");
    let sections = ProgramSections::parse(&program);

    assert_eq!(
        sections.body,
        vec![
            "G0 X0.000 Y0.000 ; Rapid move to start",
            "G0 Z-5 ; Move to depth",
        ]
    );
    assert_eq!(sections.count_body("G1"), 0);
    assert_eq!(sections.count_body("G2"), 0);
    assert!(validate_gcode(&program.code()));
}

#[test]
fn test_program_sections() {
    let curves = load_curves("single_line.json");
    let settings = GenerationSettings::new(100.0, 12000, 3.0);
    let program = generate_program(&curves, &settings).expect("program");
    let sections = ProgramSections::parse(&program);

    assert_eq!(sections.header[0], "; Generated G-Code from DXF");
    assert_eq!(sections.header.last().map(String::as_str), Some("; "));
    assert_eq!(
        sections.setup,
        vec![
            "G21 ; Metric",
            "G90 ; Absolute positioning",
            "S12000 ; Set spindle speed",
            "M3 ; Spindle on",
            "F100 ; Set feed rate",
            "G0 Z10 ; Move to safe height",
        ]
    );
    assert_eq!(
        sections.shutdown,
        vec!["M5 ; Spindle off", "G0 Z10 ; Move to safe height", "M30 ; Program end"]
    );
    assert_eq!(program.code(), program.lines().join("\n"));
}

#[test]
fn test_empty_input() {
    let settings = GenerationSettings::default();
    let err = generate_program(&[], &settings).unwrap_err();
    assert!(matches!(err, ToolpathError::EmptyInput));
    assert_eq!(err.code(), ErrorCode::EmptyInput);
    assert_eq!(err.code_value(), -1);
}

#[test]
fn test_mixed_curves() {
    let curves = load_curves("mixed.json");
    let result = validate_curves(&curves).expect("non-empty");
    assert!(result.passed);
    assert_eq!(result.warnings.len(), 1, "spline warning expected");

    let program = generate_program(&curves, &GenerationSettings::default()).expect("program");
    let sections = ProgramSections::parse(&program);

    assert_eq!(
        sections.body,
        vec![
            "G0 X0.000 Y0.000 ; Rapid move to start",
            "G0 Z-5 ; Move to depth",
            "G1 X20.000 Y0.000 Z0.000 ; Linear move",
            "G1 X20.000 Y20.000 Z-1.000 ; Linear move",
            "G0 X14.000 Y10.000 ; Rapid move to start",
            "G0 Z-5 ; Move to depth",
            "G2 X14.000 Y10.000 I-4.000 J0.000 ; Clockwise arc",
            "G0 X5.000 Y0.000 ; Rapid move to start",
            "G0 Z-5 ; Move to depth",
            "G2 X0.000 Y5.000 I-5.000 J0.000 ; Clockwise arc",
        ]
    );
}

#[test]
fn test_spline_conversion_emits_arc() {
    let curves = load_curves("mixed.json");
    let mut settings = GenerationSettings::default();
    settings.spline.enabled = true;
    let program = generate_program(&curves, &settings).expect("program");
    let sections = ProgramSections::parse(&program);

    assert!(program.lines().contains(&"; Enabled: spline to arc".to_string()));
    assert_eq!(
        sections.body.last().map(String::as_str),
        Some("G3 X2.000 Y0.000 I1.000 J0.000 ; Counter-clockwise arc")
    );
}

#[test]
fn test_multi_pass_structure() {
    let curves = load_curves("mixed.json");
    let mut settings = GenerationSettings::default();
    settings.multi_pass.enabled = true;
    settings.multi_pass.total_depth = 3.0;
    settings.multi_pass.depth_per_pass = 1.0;
    let program = generate_program(&curves, &settings).expect("program");
    let sections = ProgramSections::parse(&program);

    assert_eq!(sections.count_body("; Pass "), 3);
    assert_eq!(sections.count_body_containing("; Retract"), 3);
    assert_eq!(sections.count_body("G2"), 6);
    assert!(sections
        .body
        .contains(&"; Pass 3 - Depth: -3.000 mm".to_string()));
    // Z of every cut is the pass depth, never the point's own Z.
    assert_eq!(sections.count_body_containing("Z-1.000 ; Linear move"), 2);
    assert_eq!(sections.count_body_containing("Z-3.000 ; Linear move"), 2);
}

#[test]
fn test_template_settings_file() {
    let settings =
        GenerationSettings::from_json_file(&Path::new(FIXTURE_DIR).join("template_settings.json"))
            .expect("settings");
    let curves = load_curves("single_line.json");
    let program = generate_program(&curves, &settings).expect("program");

    let lines = program.lines();
    let start = lines
        .iter()
        .position(|l| l.starts_with("M3"))
        .expect("pre-cut line");
    assert_eq!(
        &lines[start..],
        &[
            "M3 S18000",
            "G0 Z10.000",
            "; Pass 1 - Depth: -1.000 mm",
            "G0 X0.000 Y0.000",
            "G1 Z-1.00 F125",
            "G0 Z5.000",
            "; Pass 2 - Depth: -2.000 mm",
            "G0 X0.000 Y0.000",
            "G1 Z-2.00 F125",
            "G0 Z5.000",
            "M5",
            "G0 Z10.000",
            "M30 ; Program end",
        ]
    );
}

#[test]
fn test_retemplate_program_lines() {
    let curves = load_curves("mixed.json");
    let program = generate_program(&curves, &GenerationSettings::default()).expect("program");
    let compact = CompiledTemplate::compile("X{X:F1} Y{Y:F1}").expect("template");

    let rewritten = retemplate_lines(program.lines(), &compact);
    assert_eq!(rewritten.len(), program.len());
    assert!(rewritten.contains(&"X14.0 Y10.0".to_string()));
    // Comment-only lines survive untouched.
    assert_eq!(rewritten[0], "; Generated G-Code from DXF");

    let values = extract_values("G2 X14.000 Y10.000 I-4.000 J0.000 ; Clockwise arc");
    assert_eq!(values.i, Some(-4.0));
}

#[test]
fn test_offset_and_pocket_pipeline() {
    let curves = vec![Curve::circle(Point::xy(0.0, 0.0), 5.0)];
    let mut settings = GenerationSettings::default();
    settings.offset.enabled = true;
    settings.offset.amount = 1.5;
    settings.offset.inward = true;
    settings.pocket.enabled = true;
    settings.pocket.stepover = 1.0;

    let program = generate_program(&curves, &settings).expect("program");
    let sections = ProgramSections::parse(&program);

    let rapids: Vec<&String> = sections
        .body
        .iter()
        .filter(|l| l.starts_with("G0 X"))
        .collect();
    assert_eq!(
        rapids,
        vec![
            "G0 X3.500 Y0.000 ; Rapid move to start",
            "G0 X2.500 Y0.000 ; Rapid move to start",
            "G0 X1.500 Y0.000 ; Rapid move to start",
            "G0 X0.500 Y0.000 ; Rapid move to start",
        ]
    );
    assert_eq!(sections.count_body("G2"), 4);
}

#[test]
fn test_cancelled_pocket_fails_generation() {
    let curves = vec![Curve::circle(Point::xy(0.0, 0.0), 50.0)];
    let mut settings = GenerationSettings::default();
    settings.pocket.enabled = true;

    let token = CancelToken::new();
    token.cancel();
    let err = generate_program_with_cancel(&curves, &settings, &token).unwrap_err();
    assert!(matches!(err, ToolpathError::Cancelled { rings: 0 }));
}

#[test]
fn test_invalid_template_rejected_on_load() {
    let json = r#"{ "template": { "plane_fast_move": "G0 X{X:K}" } }"#;
    let err = GenerationSettings::from_json_str(json).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidFormat);
}
