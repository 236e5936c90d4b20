//! Program assembly: header, spindle start, body, spindle stop, footer.

use chrono::{DateTime, Local};

use crate::config::GenerationSettings;
use crate::error::{Result, ToolpathError};
use crate::model::{arc_is_clockwise, Curve, DepthPass, Program};
use crate::transform::plan_passes;

use super::gcode::GcodeWriter;
use super::template::CompiledMotionTemplate;

/// Turns a curve list into a [`Program`].
///
/// The assembler keeps no state between runs; the same curves, settings and
/// timestamp always produce the same program.
#[derive(Debug, Clone)]
pub struct ProgramAssembler<'a> {
    settings: &'a GenerationSettings,
    template: Option<CompiledMotionTemplate>,
}

/// Z handling for one traversal of the curves.
#[derive(Debug, Clone, Copy)]
struct DepthContext {
    /// Replaces every point Z when set.
    cut_z: Option<f64>,
    plunge_z: f64,
    plunge_feed: f64,
}

impl<'a> ProgramAssembler<'a> {
    /// Validate the settings and compile the motion template, if any.
    pub fn new(settings: &'a GenerationSettings) -> Result<Self> {
        settings.validate()?;
        let template = settings
            .template
            .as_ref()
            .map(|t| t.compile())
            .transpose()?;
        Ok(Self { settings, template })
    }

    pub fn settings(&self) -> &GenerationSettings {
        self.settings
    }

    /// Assemble a program stamped with the current local time.
    pub fn assemble(&self, curves: &[Curve]) -> Result<Program> {
        self.assemble_at(curves, Local::now())
    }

    /// Assemble a program with an explicit timestamp.
    pub fn assemble_at(&self, curves: &[Curve], generated_at: DateTime<Local>) -> Result<Program> {
        if curves.is_empty() {
            return Err(ToolpathError::EmptyInput);
        }

        let settings = self.settings;
        let splines = curves
            .iter()
            .filter(|c| matches!(c, Curve::Spline { .. }))
            .count();
        if splines > 0 {
            tracing::warn!("{} spline(s) have no motion form and were skipped", splines);
        }

        let mut writer = GcodeWriter::with_template(self.template.as_ref());

        self.write_header(&mut writer);
        writer.spindle_start(settings.spindle_speed, settings.feed_rate);
        writer.safe_height(settings.safe_height);

        if settings.multi_pass.enabled {
            let passes = plan_passes(
                settings.multi_pass.total_depth,
                settings.multi_pass.depth_per_pass,
            );
            self.write_multi_pass(&mut writer, curves, &passes);
        } else {
            let depth = DepthContext {
                cut_z: None,
                plunge_z: settings.plunge_depth,
                plunge_feed: settings.feed_rate,
            };
            self.write_pass(&mut writer, curves, &depth);
        }

        writer.spindle_stop();
        writer.safe_height(settings.safe_height);
        writer.end_program();

        let lines = writer.into_lines();
        tracing::debug!("Assembled {} line(s) from {} curve(s)", lines.len(), curves.len());

        Ok(Program::new(
            lines,
            settings.feed_rate,
            settings.spindle_speed,
            settings.tool_diameter,
            generated_at,
        ))
    }

    fn write_header(&self, writer: &mut GcodeWriter<'_>) {
        let settings = self.settings;
        let unit = settings.unit;

        writer.write_comment("Generated G-Code from DXF");
        writer.write_comment(&format!("Feed Rate: {} {}/min", settings.feed_rate, unit));
        writer.write_comment(&format!("Spindle Speed: {} RPM", settings.spindle_speed));
        writer.write_comment(&format!(
            "Tool Diameter: {} {}",
            settings.tool_diameter, unit
        ));
        for feature in settings.active_features() {
            writer.write_comment(&format!("Enabled: {}", feature));
        }
        writer.write_comment("");
        writer.write_raw(format!("{} ; {}", unit.gcode(), unit.description()));
        writer.write_raw("G90 ; Absolute positioning");
    }

    fn write_multi_pass(&self, writer: &mut GcodeWriter<'_>, curves: &[Curve], passes: &[DepthPass]) {
        if passes.is_empty() {
            tracing::warn!("Multi-pass enabled but no depth passes were planned");
            return;
        }

        let half_feed = self.settings.feed_rate / 2.0;
        for pass in passes {
            writer.write_comment(&format!(
                "Pass {} - Depth: {:.3} {}",
                pass.pass_number, pass.depth, self.settings.unit
            ));
            let depth = DepthContext {
                cut_z: Some(pass.depth),
                plunge_z: pass.depth,
                plunge_feed: half_feed,
            };
            self.write_pass(writer, curves, &depth);
            writer.retract(self.settings.retract_height);
        }
    }

    /// One traversal of every curve. The first-point flag starts set.
    fn write_pass(&self, writer: &mut GcodeWriter<'_>, curves: &[Curve], depth: &DepthContext) {
        let feed = self.settings.feed_rate;
        let mut first_point = true;

        for curve in curves {
            match curve {
                Curve::Line { points } => {
                    if first_point {
                        // The opening line only positions the tool.
                        if let Some(start) = points.first() {
                            writer.rapid_move(start.x, start.y);
                            writer.plunge(depth.plunge_z, depth.plunge_feed);
                            first_point = false;
                        }
                    } else {
                        for p in points {
                            writer.linear_move(p.x, p.y, Some(depth.cut_z.unwrap_or(p.z)), feed);
                        }
                    }
                }
                Curve::Circle { center, radius } => {
                    let start_x = center.x + radius;
                    writer.rapid_move(start_x, center.y);
                    writer.plunge(depth.plunge_z, depth.plunge_feed);
                    writer.arc_move(true, start_x, center.y, -radius, 0.0, feed);
                    first_point = false;
                }
                Curve::Arc {
                    center,
                    start,
                    end,
                    start_angle,
                    end_angle,
                    ..
                } => {
                    writer.rapid_move(start.x, start.y);
                    writer.plunge(depth.plunge_z, depth.plunge_feed);
                    writer.arc_move(
                        arc_is_clockwise(*start_angle, *end_angle),
                        end.x,
                        end.y,
                        center.x - start.x,
                        center.y - start.y,
                        feed,
                    );
                    first_point = false;
                }
                Curve::Polyline { points } => {
                    for (idx, p) in points.iter().enumerate() {
                        if idx == 0 && first_point {
                            writer.rapid_move(p.x, p.y);
                            writer.plunge(depth.plunge_z, depth.plunge_feed);
                            first_point = false;
                        } else {
                            writer.linear_move(p.x, p.y, None, feed);
                        }
                    }
                }
                Curve::Spline { .. } => {}
            }
        }
    }
}
