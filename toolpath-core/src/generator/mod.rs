//! Program generation: motion templates, the G-code writer and the assembler.

mod assembler;
mod gcode;
mod template;

pub use assembler::ProgramAssembler;
pub use gcode::{format_coord, format_number, GcodeWriter};
pub use template::{
    extract_values, format_command, retemplate_lines, CompiledMotionTemplate, CompiledTemplate,
    MotionTemplate, MotionValues, NumberFormat, Variable,
};
