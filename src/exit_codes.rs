//! Process exit codes for the `vagrant-cloud` binary
//!
//! These codes follow the BSD sysexits.h conventions where possible:
//! - 0: Success
//! - 64-78: Standard exit codes from sysexits.h
//! - 100+: Custom application-specific codes

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliExitCode {
    /// Success (0) - Command completed successfully
    Success = exitcode::OK as isize,

    /// Command line usage error (64) - User input error
    UsageError = exitcode::USAGE as isize,

    /// Data format error (65) - Input data was incorrect
    DataError = exitcode::DATAERR as isize,

    /// Addressee unknown (67) - Box, version or provider not found
    NotFound = exitcode::NOUSER as isize,

    /// Temporary failure (75) - Connection busy, try again
    TempFail = exitcode::TEMPFAIL as isize,

    /// Internal software error (70) - Unexpected application error
    SoftwareError = exitcode::SOFTWARE as isize,

    /// Configuration error (78) - Application configuration issue
    ConfigError = exitcode::CONFIG as isize,

    /// Authentication error (100) - Login or token issues
    AuthError = 100,

    /// Network error (101) - Connection or communication issues
    NetworkError = 101,

    /// API error (102) - Remote API returned an error
    ApiError = 102,
}

impl CliExitCode {
    /// Convert to numeric exit code
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn message(&self) -> &'static str {
        match self {
            CliExitCode::Success => "Success",
            CliExitCode::UsageError => "Command line usage error",
            CliExitCode::DataError => "Data format error",
            CliExitCode::NotFound => "Resource not found",
            CliExitCode::TempFail => "Temporary failure",
            CliExitCode::SoftwareError => "Internal software error",
            CliExitCode::ConfigError => "Configuration error",
            CliExitCode::AuthError => "Authentication error",
            CliExitCode::NetworkError => "Network communication error",
            CliExitCode::ApiError => "Remote API error",
        }
    }
}

impl From<CliExitCode> for i32 {
    fn from(code: CliExitCode) -> Self {
        code.code()
    }
}
