//! Backend contract and target implementations.
//!
//! The analysis engine renders every line through the `Backend` trait. Each
//! target language gets one implementation; Python is the reference one and
//! doubles as the conformance example for new targets.

pub mod backend;
pub mod python;
