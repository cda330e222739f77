//! Error types and error handling for the transpiler.
//!
//! Every failure is fatal: the engine stops at the first construct it cannot
//! lower and hands the error back to the driver. This module defines:
//!
//! - The error structure, optionally tagged with the compilation unit
//! - The error variants raised during analysis, import resolution and AST loading
//! - Error names and tips for the driver to display

pub mod errors;
