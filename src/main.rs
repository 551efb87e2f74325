use tracing_subscriber::EnvFilter;
use vagrant_cloud::{
    commands::{create_cli_commands, PARAMETER_VERBOSE},
    configuration::Configuration,
    Error,
};

mod cli;
use cli::execute_command;

/// Environment variable holding the log filter directives
const LOG_ENV: &str = "VAGRANT_CLOUD_LOG";

fn exit_with(error: Error) -> ! {
    let code = error.exit_code();
    eprintln!("ERROR: {}", error);
    ::std::process::exit(code.into());
}

/// Main entry point for the program
#[tokio::main]
async fn main() {
    let commands = create_cli_commands();

    // Intialize the logging subsystem, logs go to stderr to keep stdout parseable
    let filter = if commands.get_flag(PARAMETER_VERBOSE) {
        EnvFilter::new("vagrant_cloud=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("error"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let configuration = match Configuration::load_or_default() {
        Ok(configuration) => configuration,
        Err(e) => exit_with(e.into()),
    };

    if let Err(e) = execute_command(configuration, commands).await {
        exit_with(e);
    }
}
