//! # Tanksim Headless
//!
//! Headless front-end for the tank-battle simulation: level registry,
//! cheat-script loading, JSON match reports, and parallel batch runs.
//! The binary in `main.rs` wires these into a CLI.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod levels;
pub mod report;
