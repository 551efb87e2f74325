use crate::commands::params::{
    option_parameter, COMMAND_SEARCH, PARAMETER_LIMIT, PARAMETER_ORDER, PARAMETER_PAGE,
    PARAMETER_PROVIDER, PARAMETER_QUERY, PARAMETER_SORT,
};
use clap::{value_parser, Command};

pub fn search_command() -> Command {
    Command::new(COMMAND_SEARCH)
        .about("Search public boxes")
        .arg(option_parameter(PARAMETER_QUERY, "Text to search for").short('q'))
        .arg(option_parameter(PARAMETER_PROVIDER, "Only boxes with this provider"))
        .arg(
            option_parameter(PARAMETER_SORT, "Sort field")
                .value_parser(["downloads", "created", "updated"]),
        )
        .arg(option_parameter(PARAMETER_ORDER, "Sort order").value_parser(["desc", "asc"]))
        .arg(
            option_parameter(PARAMETER_LIMIT, "Results per page")
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            option_parameter(PARAMETER_PAGE, "Page number, starting at 1")
                .value_parser(value_parser!(u32).range(1..)),
        )
}
