use thiserror::Error;

use crate::{
    auth::AuthError,
    boxes::BoxError,
    client::ClientError,
    configuration::ConfigurationError,
    data::{DataError, SchemaError},
    exit_codes::CliExitCode,
    search::SearchError,
};

/// Any error produced by the library or the command line front-end
#[derive(Debug, Error)]
pub enum Error {
    /// Error related to configuration loading or management
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Invalid attribute data supplied by the caller or the server
    #[error("Invalid data: {0}")]
    Data(#[from] DataError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Client(#[from] ClientError),
    #[error("{0}")]
    Resource(#[from] BoxError),
    #[error("{0}")]
    Search(#[from] SearchError),
    /// Error when an unsupported or undefined subcommand is encountered
    #[error("Undefined or unsupported subcommand")]
    UnsupportedSubcommand(String),
    /// Error when a required command-line argument is missing
    #[error("Missing required argument: {0}")]
    MissingRequiredArgument(String),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Misdeclared schema or incomplete credential configuration
    Configuration,
    /// Bad caller input, never retried
    Validation,
    /// Token exchange failed
    Authentication,
    /// Non-blocking connection access under contention, safe to retry
    ConnectionLocked,
    /// The server answered with an unexpected status
    Request,
    /// Operation not allowed in the resource's current state
    State,
    /// Transport or response decoding failure
    Client,
    /// Command line misuse
    Usage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) | Error::Schema(_) => ErrorKind::Configuration,
            Error::Data(_) => ErrorKind::Validation,
            Error::Auth(AuthError::MissingConfiguration { .. }) => ErrorKind::Configuration,
            Error::Auth(_) => ErrorKind::Authentication,
            Error::Client(error) => match error {
                ClientError::Request(_) => ErrorKind::Request,
                ClientError::ConnectionLocked => ErrorKind::ConnectionLocked,
                ClientError::Auth(AuthError::MissingConfiguration { .. }) => {
                    ErrorKind::Configuration
                }
                ClientError::Auth(_) => ErrorKind::Authentication,
                ClientError::Transport(_) | ClientError::Json(_) | ClientError::InvalidUrl(_) => {
                    ErrorKind::Client
                }
            },
            Error::Resource(error) => match error {
                BoxError::VersionStatusChange { .. } | BoxError::ProviderNotFound { .. } => {
                    ErrorKind::State
                }
                _ => ErrorKind::Validation,
            },
            Error::Search(SearchError::NoActiveSearch) => ErrorKind::State,
            Error::Search(_) => ErrorKind::Validation,
            Error::UnsupportedSubcommand(_) | Error::MissingRequiredArgument(_) => {
                ErrorKind::Usage
            }
            Error::Json(_) => ErrorKind::Client,
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> CliExitCode {
        match self.kind() {
            ErrorKind::Configuration => CliExitCode::ConfigError,
            ErrorKind::Validation | ErrorKind::State => CliExitCode::DataError,
            ErrorKind::Authentication => CliExitCode::AuthError,
            ErrorKind::ConnectionLocked => CliExitCode::TempFail,
            ErrorKind::Usage => CliExitCode::UsageError,
            ErrorKind::Request => match self {
                Error::Client(ClientError::Request(e)) if e.status == 404 => {
                    CliExitCode::NotFound
                }
                Error::Client(ClientError::Request(e)) if e.status == 401 || e.status == 403 => {
                    CliExitCode::AuthError
                }
                _ => CliExitCode::ApiError,
            },
            ErrorKind::Client => match self {
                Error::Client(ClientError::Transport(_)) => CliExitCode::NetworkError,
                _ => CliExitCode::SoftwareError,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RequestError;

    fn request_error(status: u16) -> Error {
        Error::Client(ClientError::Request(RequestError {
            message: "failed".to_string(),
            errors: Vec::new(),
            status,
        }))
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            Error::from(ClientError::ConnectionLocked).kind(),
            ErrorKind::ConnectionLocked
        );
        assert_eq!(request_error(500).kind(), ErrorKind::Request);
        assert_eq!(
            Error::from(BoxError::BoxExists {
                name: "precise64".to_string()
            })
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::from(AuthError::MissingConfiguration {
                name: "HCP_CLIENT_ID".to_string()
            })
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(Error::from(SearchError::NoActiveSearch).kind(), ErrorKind::State);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(request_error(404).exit_code(), CliExitCode::NotFound);
        assert_eq!(request_error(401).exit_code(), CliExitCode::AuthError);
        assert_eq!(request_error(422).exit_code(), CliExitCode::ApiError);
        assert_eq!(
            Error::MissingRequiredArgument("name".to_string()).exit_code(),
            CliExitCode::UsageError
        );
    }
}
