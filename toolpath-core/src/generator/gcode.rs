//! G-code line writer.
//!
//! Every motion event goes through [`GcodeWriter`], which renders it either in
//! the built-in commented dialect or through a compiled motion template.

use super::template::CompiledMotionTemplate;

/// Collects program lines for one assembly run.
pub struct GcodeWriter<'t> {
    /// Output lines, without terminators.
    lines: Vec<String>,
    /// Template overriding the built-in dialect.
    template: Option<&'t CompiledMotionTemplate>,
}

impl<'t> GcodeWriter<'t> {
    /// Create a writer that renders motion through `template`, or through the
    /// built-in dialect when `None`.
    pub fn with_template(template: Option<&'t CompiledMotionTemplate>) -> Self {
        Self {
            lines: Vec::new(),
            template,
        }
    }

    pub fn is_templated(&self) -> bool {
        self.template.is_some()
    }

    /// Lines written so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Take the written lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Write a line verbatim.
    pub fn write_raw(&mut self, content: impl Into<String>) {
        self.lines.push(content.into());
    }

    /// Write a comment line.
    pub fn write_comment(&mut self, comment: &str) {
        self.lines.push(format!("; {}", comment));
    }

    // === Spindle ===

    /// Spindle on. The built-in dialect also sets the modal feed rate.
    pub fn spindle_start(&mut self, speed: u32, feed_rate: f64) {
        match self.template {
            Some(t) => self.lines.push(t.spindle_start(speed)),
            None => {
                self.lines.push(format!("S{} ; Set spindle speed", speed));
                self.lines.push("M3 ; Spindle on".to_string());
                self.lines
                    .push(format!("F{} ; Set feed rate", format_number(feed_rate)));
            }
        }
    }

    pub fn spindle_stop(&mut self) {
        match self.template {
            Some(t) => self.lines.push(t.spindle_stop()),
            None => self.lines.push("M5 ; Spindle off".to_string()),
        }
    }

    // === Z moves ===

    pub fn safe_height(&mut self, z: f64) {
        self.depth_rapid(z, "Move to safe height");
    }

    pub fn retract(&mut self, z: f64) {
        self.depth_rapid(z, "Retract");
    }

    /// Move down to cutting depth. Templates render a feed move at
    /// `feed_rate`; the built-in dialect uses a rapid.
    pub fn plunge(&mut self, z: f64, feed_rate: f64) {
        match self.template {
            Some(t) => self.lines.push(t.depth_linear_move(z, feed_rate)),
            None => self
                .lines
                .push(format!("G0 Z{} ; Move to depth", format_number(z))),
        }
    }

    fn depth_rapid(&mut self, z: f64, comment: &str) {
        match self.template {
            Some(t) => self.lines.push(t.depth_fast_move(z)),
            None => self
                .lines
                .push(format!("G0 Z{} ; {}", format_number(z), comment)),
        }
    }

    // === Plane moves ===

    /// Rapid move (G0) in the XY plane.
    pub fn rapid_move(&mut self, x: f64, y: f64) {
        match self.template {
            Some(t) => self.lines.push(t.plane_fast_move(x, y)),
            None => self.lines.push(format!(
                "G0 X{} Y{} ; Rapid move to start",
                format_coord(x),
                format_coord(y)
            )),
        }
    }

    /// Linear interpolation (G1), with Z when given.
    pub fn linear_move(&mut self, x: f64, y: f64, z: Option<f64>, feed_rate: f64) {
        if let Some(t) = self.template {
            self.lines.push(t.plane_linear_move(x, y, z, feed_rate));
            return;
        }
        let line = match z {
            Some(z) => format!(
                "G1 X{} Y{} Z{} ; Linear move",
                format_coord(x),
                format_coord(y),
                format_coord(z)
            ),
            None => format!("G1 X{} Y{} ; Linear move", format_coord(x), format_coord(y)),
        };
        self.lines.push(line);
    }

    /// Circular interpolation, G2 when `clockwise` and G3 otherwise.
    pub fn arc_move(&mut self, clockwise: bool, x: f64, y: f64, i: f64, j: f64, feed_rate: f64) {
        if let Some(t) = self.template {
            self.lines.push(t.arc_move(clockwise, x, y, i, j, feed_rate));
            return;
        }
        let (code, comment) = if clockwise {
            ("G2", "Clockwise arc")
        } else {
            ("G3", "Counter-clockwise arc")
        };
        self.lines.push(format!(
            "{} X{} Y{} I{} J{} ; {}",
            code,
            format_coord(x),
            format_coord(y),
            format_coord(i),
            format_coord(j),
            comment
        ));
    }

    pub fn end_program(&mut self) {
        self.lines.push("M30 ; Program end".to_string());
    }
}

/// Format a coordinate with three decimals.
///
/// Values that round to zero print unsigned.
pub fn format_coord(value: f64) -> String {
    let text = format!("{:.3}", value);
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

/// Format a number in its shortest form (`100`, `-5`, `1.5`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}
