//! CLI command definitions and argument parsing.
//!
//! Each command group lives in its own module and is assembled here.

use clap::{ArgMatches, Command};

pub mod auth;
pub mod boxes;
pub mod config;
pub mod params;
pub mod provider;
pub mod search;
pub mod version;

pub use params::*;

/// The complete command tree, without parsing anything.
pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(verbose_parameter())
        .arg(token_parameter())
        .subcommand(boxes::box_command())
        .subcommand(version::version_command())
        .subcommand(provider::provider_command())
        .subcommand(search::search_command())
        .subcommand(auth::auth_command())
        .subcommand(config::config_command())
}

/// Parse the process arguments, exiting with usage information on error.
pub fn create_cli_commands() -> ArgMatches {
    build_cli().get_matches()
}
