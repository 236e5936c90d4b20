//! User-editable motion templates.
//!
//! A template is plain text with placeholders of the form `{NAME}` or
//! `{NAME:FORMAT}`, where NAME is one of `X Y Z I J F S` and FORMAT is a
//! numeric format specifier (`F3`, `D`, `E2`, `G5`, `N2`, `0.00#`, ...).
//! Templates are parsed once into a token list and rendered in one pass.
//! Placeholders with an unknown name, or with no value supplied at render
//! time, are kept verbatim.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolpathError};

/// Names a template can substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    X,
    Y,
    Z,
    I,
    J,
    F,
    S,
}

impl Variable {
    pub const ALL: [Variable; 7] = [
        Variable::X,
        Variable::Y,
        Variable::Z,
        Variable::I,
        Variable::J,
        Variable::F,
        Variable::S,
    ];

    /// Look a variable up by its placeholder name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "X" => Some(Variable::X),
            "Y" => Some(Variable::Y),
            "Z" => Some(Variable::Z),
            "I" => Some(Variable::I),
            "J" => Some(Variable::J),
            "F" => Some(Variable::F),
            "S" => Some(Variable::S),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Variable::X => "X",
            Variable::Y => "Y",
            Variable::Z => "Z",
            Variable::I => "I",
            Variable::J => "J",
            Variable::F => "F",
            Variable::S => "S",
        }
    }
}

/// Values to substitute, one optional slot per variable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionValues {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub i: Option<f64>,
    pub j: Option<f64>,
    pub f: Option<f64>,
    pub s: Option<f64>,
}

impl MotionValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, var: Variable, value: f64) -> Self {
        self.set(var, value);
        self
    }

    pub fn get(&self, var: Variable) -> Option<f64> {
        match var {
            Variable::X => self.x,
            Variable::Y => self.y,
            Variable::Z => self.z,
            Variable::I => self.i,
            Variable::J => self.j,
            Variable::F => self.f,
            Variable::S => self.s,
        }
    }

    pub fn set(&mut self, var: Variable, value: f64) {
        let slot = match var {
            Variable::X => &mut self.x,
            Variable::Y => &mut self.y,
            Variable::Z => &mut self.z,
            Variable::I => &mut self.i,
            Variable::J => &mut self.j,
            Variable::F => &mut self.f,
            Variable::S => &mut self.s,
        };
        *slot = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        Variable::ALL.iter().all(|v| self.get(*v).is_none())
    }
}

/// A parsed numeric format specifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberFormat {
    /// Shortest text that round-trips.
    Default,
    /// `Fn` / `Nn`: fixed decimals, optionally with thousands separators.
    Fixed { decimals: usize, grouped: bool },
    /// `Dn`: rounded integer, zero-padded to `digits`.
    Integer { digits: usize },
    /// `En`: scientific with a signed three-digit exponent.
    Exponent { decimals: usize, uppercase: bool },
    /// `Gn`: `n` significant digits.
    General { digits: usize, uppercase: bool },
    /// Digit pattern such as `0.000` or `#.##`.
    Pattern {
        int_digits: usize,
        min_decimals: usize,
        max_decimals: usize,
    },
}

impl NumberFormat {
    /// Parse a specifier, or `None` if it is not recognised.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut chars = spec.chars();
        let letter = chars.next()?;
        let rest = chars.as_str();

        if letter.is_ascii_alphabetic() {
            let precision = if rest.is_empty() {
                None
            } else if rest.len() <= 2 && rest.chars().all(|c| c.is_ascii_digit()) {
                rest.parse::<usize>().ok()
            } else {
                return None;
            };

            return match letter {
                'F' | 'f' => Some(NumberFormat::Fixed {
                    decimals: precision.unwrap_or(2),
                    grouped: false,
                }),
                'N' | 'n' => Some(NumberFormat::Fixed {
                    decimals: precision.unwrap_or(2),
                    grouped: true,
                }),
                'D' | 'd' => Some(NumberFormat::Integer {
                    digits: precision.unwrap_or(0),
                }),
                'E' | 'e' => Some(NumberFormat::Exponent {
                    decimals: precision.unwrap_or(6),
                    uppercase: letter == 'E',
                }),
                'G' | 'g' => match precision {
                    None | Some(0) => Some(NumberFormat::Default),
                    Some(digits) => Some(NumberFormat::General {
                        digits,
                        uppercase: letter == 'G',
                    }),
                },
                'R' | 'r' if precision.is_none() => Some(NumberFormat::Default),
                _ => None,
            };
        }

        Self::parse_pattern(spec)
    }

    fn parse_pattern(spec: &str) -> Option<Self> {
        if !spec.chars().all(|c| matches!(c, '0' | '#' | '.')) {
            return None;
        }
        let (int_part, frac_part) = match spec.split_once('.') {
            Some((i, f)) if !f.contains('.') => (i, f),
            Some(_) => return None,
            None => (spec, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        // Optional digits must come after the required ones.
        if frac_part.trim_end_matches('#').contains('#') {
            return None;
        }

        Some(NumberFormat::Pattern {
            int_digits: int_part.chars().filter(|c| *c == '0').count(),
            min_decimals: frac_part.chars().filter(|c| *c == '0').count(),
            max_decimals: frac_part.len(),
        })
    }

    /// Render a value.
    pub fn render(&self, value: f64) -> String {
        match *self {
            NumberFormat::Default => format!("{}", value),
            NumberFormat::Fixed { decimals, grouped } => {
                let text = format!("{:.*}", decimals, value);
                if grouped {
                    group_thousands(&text)
                } else {
                    text
                }
            }
            NumberFormat::Integer { digits } => {
                let rounded = value.round();
                let sign = if rounded < 0.0 { "-" } else { "" };
                format!("{}{:0width$}", sign, rounded.abs(), width = digits)
            }
            NumberFormat::Exponent {
                decimals,
                uppercase,
            } => format_exponent(value, decimals, uppercase, 3),
            NumberFormat::General { digits, uppercase } => format_general(value, digits, uppercase),
            NumberFormat::Pattern {
                int_digits,
                min_decimals,
                max_decimals,
            } => format_pattern(value, int_digits, min_decimals, max_decimals),
        }
    }
}

fn group_thousands(text: &str) -> String {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

fn format_exponent(value: f64, decimals: usize, uppercase: bool, min_exp_digits: usize) -> String {
    let text = format!("{:.*e}", decimals, value);
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let exp: i32 = exponent.parse().unwrap_or(0);
    let marker = if uppercase { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!(
        "{}{}{}{:0width$}",
        mantissa,
        marker,
        sign,
        exp.abs(),
        width = min_exp_digits
    )
}

fn format_general(value: f64, digits: usize, uppercase: bool) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }

    // Round to the requested significant digits first; the exponent of the
    // rounded value decides between fixed and scientific notation.
    let sci = format!("{:.*e}", digits - 1, value);
    let exp: i32 = sci
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    if exp < -5 || exp >= digits as i32 {
        let text = format_exponent(value, digits - 1, uppercase, 2);
        let (mantissa, exponent) = text.split_at(text.find(['E', 'e']).unwrap_or(text.len()));
        format!("{}{}", trim_fraction(mantissa), exponent)
    } else {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value))
    }
}

fn format_pattern(value: f64, int_digits: usize, min_decimals: usize, max_decimals: usize) -> String {
    let text = format!("{:.*}", max_decimals, value.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut frac = frac_part.to_string();
    while frac.len() > min_decimals && frac.ends_with('0') {
        frac.pop();
    }

    let int_trimmed = int_part.trim_start_matches('0');
    let int_text = if int_trimmed.len() >= int_digits {
        int_trimmed.to_string()
    } else {
        format!("{:0>width$}", int_trimmed, width = int_digits)
    };

    let body = match (int_text.is_empty(), frac.is_empty()) {
        (true, true) => "0".to_string(),
        (_, true) => int_text,
        (_, false) => format!("{}.{}", int_text, frac),
    };

    let is_zero = body.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{}", body)
    } else {
        body
    }
}

/// Drop trailing zeros (and a bare trailing point) from a decimal string.
fn trim_fraction(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Placeholder {
        var: Variable,
        format: NumberFormat,
        /// Original text, emitted when no value is supplied.
        raw: String,
    },
}

/// A template parsed into literal and placeholder tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    source: String,
    tokens: Vec<Token>,
}

impl CompiledTemplate {
    /// Parse a template string.
    ///
    /// Only a recognised variable with an unrecognised format specifier is
    /// an error; any other brace text is kept as a literal.
    pub fn compile(source: &str) -> Result<Self> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let parsed = match after.find('}') {
                Some(close) => parse_placeholder(&after[..close])?.map(|(var, format)| {
                    let raw = format!("{{{}}}", &after[..close]);
                    (var, format, raw, close)
                }),
                None => None,
            };

            match parsed {
                Some((var, format, raw, close)) => {
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(Token::Placeholder { var, format, raw });
                    rest = &after[close + 1..];
                }
                None => {
                    literal.push('{');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            tokens,
        })
    }

    /// Template text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Variables referenced by the template, in order of appearance.
    pub fn variables(&self) -> Vec<Variable> {
        let mut vars = Vec::new();
        for token in &self.tokens {
            if let Token::Placeholder { var, .. } = token {
                if !vars.contains(var) {
                    vars.push(*var);
                }
            }
        }
        vars
    }

    /// Substitute values in a single pass over the tokens.
    pub fn render(&self, values: &MotionValues) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Placeholder { var, format, raw } => match values.get(*var) {
                    Some(value) => out.push_str(&format.render(value)),
                    None => out.push_str(raw),
                },
            }
        }
        out
    }
}

/// Split placeholder content into a variable and format.
///
/// `Ok(None)` means "not a placeholder" (unknown name, empty format).
fn parse_placeholder(content: &str) -> Result<Option<(Variable, NumberFormat)>> {
    let (name, spec) = match content.split_once(':') {
        Some((name, spec)) => (name, Some(spec)),
        None => (content, None),
    };
    let Some(var) = Variable::from_name(name) else {
        return Ok(None);
    };

    match spec {
        None => Ok(Some((var, NumberFormat::Default))),
        Some("") => Ok(None),
        Some(spec) => match NumberFormat::parse(spec) {
            Some(format) => Ok(Some((var, format))),
            None => Err(ToolpathError::InvalidFormat {
                placeholder: name.to_string(),
                format: spec.to_string(),
            }),
        },
    }
}

/// Compile and render a template in one call.
pub fn format_command(template: &str, values: &MotionValues) -> Result<String> {
    Ok(CompiledTemplate::compile(template)?.render(values))
}

/// Pull `X Y Z I J F S` values back out of a rendered motion line.
///
/// Each letter takes the first signed decimal that immediately follows it.
pub fn extract_values(line: &str) -> MotionValues {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = WORD_REGEX
        .get_or_init(|| Regex::new(r"([XYZIJFS])([-+]?[0-9]*\.?[0-9]+)").expect("invalid word regex"));

    let mut values = MotionValues::new();
    for caps in regex.captures_iter(line) {
        let Some(var) = Variable::from_name(&caps[1]) else {
            continue;
        };
        if values.get(var).is_some() {
            continue;
        }
        if let Ok(value) = caps[2].parse::<f64>() {
            values.set(var, value);
        }
    }
    values
}

/// Re-render motion lines under a different template.
///
/// Lines with no extractable value (comments, unit codes) pass through.
pub fn retemplate_lines(lines: &[String], template: &CompiledTemplate) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let values = extract_values(line);
            if values.is_empty() {
                line.clone()
            } else {
                template.render(&values)
            }
        })
        .collect()
}

/// The eight user-editable motion templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTemplate {
    pub pre_cut: String,
    pub post_cut: String,
    pub plane_fast_move: String,
    pub plane_linear_move: String,
    pub depth_fast_move: String,
    pub depth_linear_move: String,
    pub cw_arc_move: String,
    pub ccw_arc_move: String,
}

impl Default for MotionTemplate {
    fn default() -> Self {
        Self {
            pre_cut: "M4 S{S}".to_string(),
            post_cut: "M5".to_string(),
            plane_fast_move: "G0 X{X:F3} Y{Y:F3}".to_string(),
            plane_linear_move: "G1 X{X:F3} Y{Y:F3} F{F:F3}".to_string(),
            depth_fast_move: "G0 Z{Z:F3}".to_string(),
            depth_linear_move: "G1 Z{Z:F3} F{F:F3}".to_string(),
            cw_arc_move: "G2 X{X:F3} Y{Y:F3} I{I:F3} J{J:F3} F{F:F3}".to_string(),
            ccw_arc_move: "G3 X{X:F3} Y{Y:F3} I{I:F3} J{J:F3} F{F:F3}".to_string(),
        }
    }
}

impl MotionTemplate {
    /// Parse all eight templates.
    pub fn compile(&self) -> Result<CompiledMotionTemplate> {
        Ok(CompiledMotionTemplate {
            pre_cut: CompiledTemplate::compile(&self.pre_cut)?,
            post_cut: CompiledTemplate::compile(&self.post_cut)?,
            plane_fast_move: CompiledTemplate::compile(&self.plane_fast_move)?,
            plane_linear_move: CompiledTemplate::compile(&self.plane_linear_move)?,
            depth_fast_move: CompiledTemplate::compile(&self.depth_fast_move)?,
            depth_linear_move: CompiledTemplate::compile(&self.depth_linear_move)?,
            cw_arc_move: CompiledTemplate::compile(&self.cw_arc_move)?,
            ccw_arc_move: CompiledTemplate::compile(&self.ccw_arc_move)?,
        })
    }
}

/// Parsed form of [`MotionTemplate`], with one renderer per motion event.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMotionTemplate {
    pre_cut: CompiledTemplate,
    post_cut: CompiledTemplate,
    plane_fast_move: CompiledTemplate,
    plane_linear_move: CompiledTemplate,
    depth_fast_move: CompiledTemplate,
    depth_linear_move: CompiledTemplate,
    cw_arc_move: CompiledTemplate,
    ccw_arc_move: CompiledTemplate,
}

impl CompiledMotionTemplate {
    pub fn spindle_start(&self, speed: u32) -> String {
        self.pre_cut
            .render(&MotionValues::new().with(Variable::S, f64::from(speed)))
    }

    pub fn spindle_stop(&self) -> String {
        self.post_cut.render(&MotionValues::new())
    }

    pub fn plane_fast_move(&self, x: f64, y: f64) -> String {
        self.plane_fast_move.render(
            &MotionValues::new()
                .with(Variable::X, x)
                .with(Variable::Y, y),
        )
    }

    /// Feed move in the cutting plane; `z` is offered to templates that
    /// reference `{Z}`.
    pub fn plane_linear_move(&self, x: f64, y: f64, z: Option<f64>, feed: f64) -> String {
        let mut values = MotionValues::new()
            .with(Variable::X, x)
            .with(Variable::Y, y)
            .with(Variable::F, feed);
        if let Some(z) = z {
            values.set(Variable::Z, z);
        }
        self.plane_linear_move.render(&values)
    }

    pub fn depth_fast_move(&self, z: f64) -> String {
        self.depth_fast_move
            .render(&MotionValues::new().with(Variable::Z, z))
    }

    pub fn depth_linear_move(&self, z: f64, feed: f64) -> String {
        self.depth_linear_move.render(
            &MotionValues::new()
                .with(Variable::Z, z)
                .with(Variable::F, feed),
        )
    }

    pub fn arc_move(&self, clockwise: bool, x: f64, y: f64, i: f64, j: f64, feed: f64) -> String {
        let template = if clockwise {
            &self.cw_arc_move
        } else {
            &self.ccw_arc_move
        };
        template.render(
            &MotionValues::new()
                .with(Variable::X, x)
                .with(Variable::Y, y)
                .with(Variable::I, i)
                .with(Variable::J, j)
                .with(Variable::F, feed),
        )
    }
}
