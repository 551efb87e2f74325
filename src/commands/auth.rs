//! Authentication command definitions.

use crate::commands::params::{COMMAND_AUTH, COMMAND_VALIDATE};
use clap::Command;

pub fn auth_command() -> Command {
    Command::new(COMMAND_AUTH)
        .about("Authentication")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_VALIDATE)
                .about("Check the access token and show the account it belongs to"),
        )
}
