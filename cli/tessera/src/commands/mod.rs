//! CLI command implementations.

pub mod kinds;
pub mod parse;
pub mod tags;
