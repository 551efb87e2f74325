//! Configuration command definitions.

use crate::commands::params::{COMMAND_CONFIG, COMMAND_PATH, COMMAND_SHOW};
use clap::Command;

pub fn config_command() -> Command {
    Command::new(COMMAND_CONFIG)
        .about("Configuration management")
        .subcommand_required(true)
        .subcommand(Command::new(COMMAND_PATH).about("Show configuration file path"))
        .subcommand(Command::new(COMMAND_SHOW).about("Show the effective configuration"))
}
