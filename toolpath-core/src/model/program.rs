//! Generated program and depth-pass records.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One full traversal of the geometry at a fixed depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthPass {
    /// 1-based position in the pass sequence.
    pub pass_number: usize,
    /// Cutting depth; negative is below the reference surface.
    pub depth: f64,
    /// Configured per-pass step (the last pass may cut less).
    pub depth_increment: f64,
}

/// A finished toolpath program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    lines: Vec<String>,
    pub feed_rate: f64,
    pub spindle_speed: u32,
    pub tool_diameter: f64,
    pub generated_at: DateTime<Local>,
}

impl Program {
    pub(crate) fn new(
        lines: Vec<String>,
        feed_rate: f64,
        spindle_speed: u32,
        tool_diameter: f64,
        generated_at: DateTime<Local>,
    ) -> Self {
        Self {
            lines,
            feed_rate,
            spindle_speed,
            tool_diameter,
            generated_at,
        }
    }

    /// Program lines in emission order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The program text: every line joined with `\n`.
    pub fn code(&self) -> String {
        self.lines.join("\n")
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code())
    }
}
