//! The `hearth` command line: load listings, then query them.

pub mod args;
pub mod commands;
pub mod output;

pub use args::{Command, HearthArgs, OutputFormat};
pub use commands::execute_command;
