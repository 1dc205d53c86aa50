//! Command-line interface module.

mod args;
pub mod check;
pub mod resolve;
pub mod serve;

pub use args::{Cli, Commands};
