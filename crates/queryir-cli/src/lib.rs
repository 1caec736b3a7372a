//! Library half of the `qir` binary: argument definitions and commands.

pub mod cli;
pub mod commands;
