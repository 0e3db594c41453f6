//! CLI subcommand implementations.

pub mod build;
pub mod parse_script;
pub mod show_config;
pub mod validate;
