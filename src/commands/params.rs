//! Command and parameter names shared by the command definitions and the
//! dispatcher.

use clap::{Arg, ArgAction};

pub const COMMAND_BOX: &str = "box";
pub const COMMAND_VERSION: &str = "version";
pub const COMMAND_PROVIDER: &str = "provider";
pub const COMMAND_SEARCH: &str = "search";
pub const COMMAND_AUTH: &str = "auth";
pub const COMMAND_CONFIG: &str = "config";
pub const COMMAND_GET: &str = "get";
pub const COMMAND_CREATE: &str = "create";
pub const COMMAND_DELETE: &str = "delete";
pub const COMMAND_RELEASE: &str = "release";
pub const COMMAND_REVOKE: &str = "revoke";
pub const COMMAND_UPLOAD_URL: &str = "upload-url";
pub const COMMAND_VALIDATE: &str = "validate";
pub const COMMAND_PATH: &str = "path";
pub const COMMAND_SHOW: &str = "show";

pub const PARAMETER_VERBOSE: &str = "verbose";
pub const PARAMETER_TOKEN: &str = "token";
pub const PARAMETER_BOX: &str = "box";
// clap reserves the `version` id for the version flag
pub const PARAMETER_VERSION: &str = "box-version";
pub const PARAMETER_PROVIDER: &str = "provider";
pub const PARAMETER_ARCHITECTURE: &str = "architecture";
pub const PARAMETER_DESCRIPTION: &str = "description";
pub const PARAMETER_SHORT_DESCRIPTION: &str = "short-description";
pub const PARAMETER_PRIVATE: &str = "private";
pub const PARAMETER_URL: &str = "url";
pub const PARAMETER_CHECKSUM: &str = "checksum";
pub const PARAMETER_CHECKSUM_TYPE: &str = "checksum-type";
pub const PARAMETER_DEFAULT_ARCHITECTURE: &str = "default-architecture";
pub const PARAMETER_DIRECT: &str = "direct";
pub const PARAMETER_QUERY: &str = "query";
pub const PARAMETER_SORT: &str = "sort";
pub const PARAMETER_ORDER: &str = "order";
pub const PARAMETER_LIMIT: &str = "limit";
pub const PARAMETER_PAGE: &str = "page";

/// A box addressed as `username/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxTag {
    pub username: String,
    pub name: String,
}

pub fn parse_box_tag(value: &str) -> Result<BoxTag, String> {
    match value.split_once('/') {
        Some((username, name))
            if !username.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok(BoxTag {
                username: username.to_string(),
                name: name.to_string(),
            })
        }
        _ => Err(format!("expected USERNAME/NAME, got {:?}", value)),
    }
}

pub fn verbose_parameter() -> Arg {
    Arg::new(PARAMETER_VERBOSE)
        .short('v')
        .long(PARAMETER_VERBOSE)
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Enable verbose output for debugging")
}

/// Access token, overriding the environment.
pub fn token_parameter() -> Arg {
    Arg::new(PARAMETER_TOKEN)
        .long(PARAMETER_TOKEN)
        .num_args(1)
        .global(true)
        .help("Access token used for this invocation")
}

pub fn box_parameter() -> Arg {
    Arg::new(PARAMETER_BOX)
        .required(true)
        .value_name("USERNAME/NAME")
        .value_parser(parse_box_tag)
        .help("Box tag, for example hashicorp/precise64")
}

pub fn version_parameter() -> Arg {
    Arg::new(PARAMETER_VERSION)
        .required(true)
        .value_name("VERSION")
        .help("Box version")
}

pub fn provider_parameter() -> Arg {
    Arg::new(PARAMETER_PROVIDER)
        .required(true)
        .value_name("PROVIDER")
        .help("Provider name, for example virtualbox")
}

pub fn architecture_parameter() -> Arg {
    Arg::new(PARAMETER_ARCHITECTURE)
        .short('a')
        .long(PARAMETER_ARCHITECTURE)
        .num_args(1)
        .help("Provider architecture, for example amd64")
}

pub fn description_parameter() -> Arg {
    Arg::new(PARAMETER_DESCRIPTION)
        .short('d')
        .long(PARAMETER_DESCRIPTION)
        .num_args(1)
        .help("Description in markdown")
}

pub fn flag_parameter(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .action(ArgAction::SetTrue)
        .help(help)
}

pub fn option_parameter(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).num_args(1).help(help)
}
