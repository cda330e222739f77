//! Scope and type state.
//!
//! Tracks what the engine knows about each identifier while it walks the
//! tree: the inferred type, array element type and size, function
//! signatures and the body scope of compiled functions. Scopes nest through
//! an explicit stack so bindings made inside a function do not leak out.

pub mod scope;
