//! Box command definitions.

use crate::commands::params::{
    box_parameter, description_parameter, flag_parameter, option_parameter, COMMAND_BOX,
    COMMAND_CREATE, COMMAND_DELETE, COMMAND_GET, PARAMETER_PRIVATE, PARAMETER_SHORT_DESCRIPTION,
};
use clap::Command;

pub fn box_command() -> Command {
    Command::new(COMMAND_BOX)
        .about("Manage boxes")
        .subcommand_required(true)
        .subcommand(
            Command::new(COMMAND_GET)
                .about("Show a box with its versions")
                .arg(box_parameter()),
        )
        .subcommand(
            Command::new(COMMAND_CREATE)
                .about("Create a box")
                .arg(box_parameter())
                .arg(option_parameter(
                    PARAMETER_SHORT_DESCRIPTION,
                    "Short description shown in listings",
                ))
                .arg(description_parameter())
                .arg(flag_parameter(PARAMETER_PRIVATE, "Make the box private")),
        )
        .subcommand(
            Command::new(COMMAND_DELETE)
                .about("Delete a box and all of its versions")
                .arg(box_parameter()),
        )
}
