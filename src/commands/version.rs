//! Version command definitions.

use crate::commands::params::{
    box_parameter, description_parameter, version_parameter, COMMAND_CREATE, COMMAND_DELETE,
    COMMAND_RELEASE, COMMAND_REVOKE, COMMAND_VERSION,
};
use clap::Command;

fn version_subcommand(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(box_parameter())
        .arg(version_parameter())
}

pub fn version_command() -> Command {
    Command::new(COMMAND_VERSION)
        .about("Manage box versions")
        .subcommand_required(true)
        .subcommand(
            version_subcommand(COMMAND_CREATE, "Create a version").arg(description_parameter()),
        )
        .subcommand(version_subcommand(
            COMMAND_RELEASE,
            "Release a version, making it available for download",
        ))
        .subcommand(version_subcommand(COMMAND_REVOKE, "Revoke a released version"))
        .subcommand(version_subcommand(COMMAND_DELETE, "Delete a version"))
}
