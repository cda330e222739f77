#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::{
    ast::ast::parse_program,
    backend::backend::Backend,
    compiler::compiler::{transpile, CompilerConfig},
    errors::errors::{Error, ErrorTip},
};

pub mod ast;
pub mod backend;
pub mod compiler;
pub mod errors;
pub mod macros;
pub mod scope;

extern crate regex;

/// Parses a program in the parser's JSON form and returns the generated
/// source for the configured target.
pub fn transpile_json(source: &str, config: CompilerConfig) -> Result<String, Error> {
    let program = parse_program(source)?;
    let backend: Rc<dyn Backend> = config.target.backend();
    let output = transpile(&program, config)?;
    Ok(output.assemble(backend.as_ref()))
}

/// Renders an error for the driver.
///
/// ```text
/// Error: UnsupportedConstruct (This construct is not lowered by the transpiler yet)
/// -> shapes
///    | unsupported construct: duplicate method `area` in class `Circle`
/// ```
pub fn format_error(error: &Error) -> String {
    let header = match error.get_tip() {
        ErrorTip::None => format!("Error: {}", error.get_error_name()),
        tip => format!("Error: {} ({})", error.get_error_name(), tip),
    };

    let unit = error.get_unit().unwrap_or("<input>");
    format!("{}\n-> {}\n   | {}", header, unit, error.get_impl())
}
