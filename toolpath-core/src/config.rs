//! Configuration constants and generation settings.

use crate::error::{Result, ToolpathError};
use crate::generator::MotionTemplate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Floating-point comparison epsilon.
pub const EPS: f64 = 0.0001;

/// Below this determinant three points are treated as collinear.
pub const COLLINEAR_EPS: f64 = 0.0001;

/// Edges shorter than this have no usable normal.
pub const MIN_EDGE_LENGTH: f64 = 0.0001;

/// A pocket ring narrower or shorter than this has collapsed.
pub const POCKET_COLLAPSE_SIZE: f64 = 0.1;

/// Hard cap on the number of curves a pocket may accumulate.
pub const POCKET_MAX_CURVES: usize = 1000;

/// Default height for rapid moves between program sections.
pub const DEFAULT_SAFE_HEIGHT: f64 = 10.0;

/// Default height to retract to after each depth pass.
pub const DEFAULT_RETRACT_HEIGHT: f64 = 5.0;

/// Default plunge depth for single-pass programs.
pub const DEFAULT_PLUNGE_DEPTH: f64 = -5.0;

/// Default spline-to-arc fitting tolerance.
pub const DEFAULT_ARC_TOLERANCE: f64 = 0.01;

/// Hard cap on the number of depth passes a plan may contain.
pub const MAX_DEPTH_PASSES: usize = 10_000;

/// Unit of measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    Millimeters,
    Inches,
}

impl Unit {
    /// Parse unit from a short name ("mm", "inch", "in").
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mm" => Some(Unit::Millimeters),
            "inch" | "in" => Some(Unit::Inches),
            _ => None,
        }
    }

    /// Get the G-code for this unit system.
    pub fn gcode(&self) -> &'static str {
        match self {
            Unit::Millimeters => "G21",
            Unit::Inches => "G20",
        }
    }

    /// Human-readable name used in program comments.
    pub fn description(&self) -> &'static str {
        match self {
            Unit::Millimeters => "Metric",
            Unit::Inches => "Imperial",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::Millimeters => write!(f, "mm"),
            Unit::Inches => write!(f, "inch"),
        }
    }
}

/// Tool-radius compensation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetSettings {
    pub enabled: bool,
    /// Offset distance, always given as a magnitude.
    pub amount: f64,
    /// Offset towards the right-hand side of each edge instead of the left.
    pub inward: bool,
}

impl Default for OffsetSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            amount: 1.5,
            inward: true,
        }
    }
}

/// Concentric pocket clearing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PocketSettings {
    pub enabled: bool,
    /// Distance between successive rings.
    pub stepover: f64,
    /// Drop rings that touch an island's bounding box.
    pub detect_islands: bool,
    /// Indices of the boundary curves that are islands. `None` treats every
    /// boundary curve as an island.
    pub island_indices: Option<Vec<usize>>,
}

impl Default for PocketSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            stepover: 1.5,
            detect_islands: false,
            island_indices: None,
        }
    }
}

/// Step-down cutting in several depth passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiPassSettings {
    pub enabled: bool,
    pub total_depth: f64,
    pub depth_per_pass: f64,
}

impl Default for MultiPassSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            total_depth: 3.0,
            depth_per_pass: 1.0,
        }
    }
}

/// Spline approximation by fitted arcs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineSettings {
    pub enabled: bool,
    pub tolerance: f64,
}

impl Default for SplineSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            tolerance: DEFAULT_ARC_TOLERANCE,
        }
    }
}

/// Everything the pipeline needs to turn curves into a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Cutting feed rate (length per minute).
    pub feed_rate: f64,
    /// Spindle speed (RPM).
    pub spindle_speed: u32,
    /// Tool diameter, echoed in the header.
    pub tool_diameter: f64,
    pub unit: Unit,
    pub safe_height: f64,
    pub retract_height: f64,
    /// Plunge depth used by single-pass programs.
    pub plunge_depth: f64,
    pub offset: OffsetSettings,
    pub pocket: PocketSettings,
    pub multi_pass: MultiPassSettings,
    pub spline: SplineSettings,
    /// Custom motion templates. `None` emits the built-in dialect.
    pub template: Option<MotionTemplate>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            feed_rate: 100.0,
            spindle_speed: 12000,
            tool_diameter: 3.0,
            unit: Unit::default(),
            safe_height: DEFAULT_SAFE_HEIGHT,
            retract_height: DEFAULT_RETRACT_HEIGHT,
            plunge_depth: DEFAULT_PLUNGE_DEPTH,
            offset: OffsetSettings::default(),
            pocket: PocketSettings::default(),
            multi_pass: MultiPassSettings::default(),
            spline: SplineSettings::default(),
            template: None,
        }
    }
}

impl GenerationSettings {
    /// Create settings with the three basic machining parameters.
    pub fn new(feed_rate: f64, spindle_speed: u32, tool_diameter: f64) -> Self {
        Self {
            feed_rate,
            spindle_speed,
            tool_diameter,
            ..Default::default()
        }
    }

    /// Parse settings from a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: GenerationSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check the values the assembler cannot work around.
    ///
    /// Stepover is not checked here since the pocket generator degrades to
    /// empty output on its own. Multi-pass depths are checked only for
    /// values that would make the pass plan unbounded.
    pub fn validate(&self) -> Result<()> {
        if !(self.feed_rate > 0.0) || !self.feed_rate.is_finite() {
            return Err(ToolpathError::invalid_setting("feed_rate", self.feed_rate));
        }
        if !(self.tool_diameter >= 0.0) {
            return Err(ToolpathError::invalid_setting(
                "tool_diameter",
                self.tool_diameter,
            ));
        }
        if self.offset.enabled && !(self.offset.amount >= 0.0) {
            return Err(ToolpathError::invalid_setting(
                "offset.amount",
                self.offset.amount,
            ));
        }
        if self.multi_pass.enabled {
            self.validate_multi_pass()?;
        }
        if let Some(template) = &self.template {
            template.compile()?;
        }
        Ok(())
    }

    /// Non-positive depths still plan zero passes; only values the planner
    /// cannot bound are rejected.
    fn validate_multi_pass(&self) -> Result<()> {
        let mp = &self.multi_pass;
        if !mp.total_depth.is_finite() {
            return Err(ToolpathError::invalid_setting(
                "multi_pass.total_depth",
                mp.total_depth,
            ));
        }
        if !mp.depth_per_pass.is_finite() {
            return Err(ToolpathError::invalid_setting(
                "multi_pass.depth_per_pass",
                mp.depth_per_pass,
            ));
        }
        if mp.total_depth > 0.0
            && mp.depth_per_pass > 0.0
            && (mp.total_depth / mp.depth_per_pass).ceil() > MAX_DEPTH_PASSES as f64
        {
            return Err(ToolpathError::invalid_setting(
                "multi_pass.depth_per_pass",
                format!(
                    "{} (more than {} passes to reach {})",
                    mp.depth_per_pass, MAX_DEPTH_PASSES, mp.total_depth
                ),
            ));
        }
        Ok(())
    }

    /// Names of the advanced features that are switched on.
    pub fn active_features(&self) -> Vec<&'static str> {
        let mut features = Vec::new();
        if self.offset.enabled {
            features.push("path offset");
        }
        if self.pocket.enabled {
            features.push("pocket");
        }
        if self.multi_pass.enabled {
            features.push("multi-pass");
        }
        if self.spline.enabled {
            features.push("spline to arc");
        }
        features
    }
}
