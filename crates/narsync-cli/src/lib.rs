//! Narration timing CLI library.
//!
//! This crate provides the command-line interface for the timing engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, dirs_config_path};
