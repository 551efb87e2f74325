//! Provider command definitions.

use crate::commands::params::{
    architecture_parameter, box_parameter, flag_parameter, option_parameter,
    provider_parameter, version_parameter, COMMAND_CREATE, COMMAND_DELETE, COMMAND_PROVIDER,
    COMMAND_UPLOAD_URL, PARAMETER_CHECKSUM, PARAMETER_CHECKSUM_TYPE,
    PARAMETER_DEFAULT_ARCHITECTURE, PARAMETER_DIRECT, PARAMETER_URL,
};
use clap::Command;

fn provider_subcommand(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(box_parameter())
        .arg(version_parameter())
        .arg(provider_parameter())
        .arg(architecture_parameter())
}

pub fn provider_command() -> Command {
    Command::new(COMMAND_PROVIDER)
        .about("Manage version providers")
        .subcommand_required(true)
        .subcommand(
            provider_subcommand(COMMAND_CREATE, "Add a provider to a version")
                .arg(option_parameter(
                    PARAMETER_URL,
                    "Remote URL of the box file, when not uploading",
                ))
                .arg(option_parameter(PARAMETER_CHECKSUM, "Checksum of the box file"))
                .arg(option_parameter(
                    PARAMETER_CHECKSUM_TYPE,
                    "Checksum algorithm, for example sha256",
                ))
                .arg(flag_parameter(
                    PARAMETER_DEFAULT_ARCHITECTURE,
                    "Serve this architecture when none is requested",
                )),
        )
        .subcommand(provider_subcommand(COMMAND_DELETE, "Delete a provider"))
        .subcommand(
            provider_subcommand(COMMAND_UPLOAD_URL, "Request an upload URL for the box file")
                .arg(flag_parameter(
                    PARAMETER_DIRECT,
                    "Upload directly to backend storage",
                )),
        )
}
