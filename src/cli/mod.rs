//! CLI module - argument parsing and subcommands

mod args;
pub mod init_config;

pub use args::{Cli, Commands};
pub use init_config::run_init_config;
