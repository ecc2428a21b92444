//! CLI argument parsing and request assembly.

pub mod args;
pub mod options;
