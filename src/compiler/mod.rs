//! Analysis and code generation engine.
//!
//! This module walks the syntax tree once and renders the target program
//! through a `Backend`. It handles:
//!
//! - Operator precedence reduction and type inference of expressions
//! - Statement lowering and scope tracking
//! - Two-phase function lowering and deferred method emission for classes
//! - Import of local units through a `ModuleResolver`

pub mod compiler;
pub mod emitter;
pub mod expr;
pub mod imports;
pub mod lowering;
pub mod stmt;

#[cfg(test)]
mod tests;
