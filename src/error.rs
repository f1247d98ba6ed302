//! Failure taxonomy for the launcher.
//!
//! Everything raised before a child process exists is fatal and maps to exit
//! code 1 at the entry point. `Spawn`, `Execute` and `Interrupted` are produced
//! by the executor only and never leave it as errors; they become 127, 1 and 130.
use std::path::PathBuf;

/// Exit code for internal or configuration failures.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when the child executable does not exist.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit code when the user interrupts the child.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Target or a required sibling file is absent after every lookup.
    #[error("{what} not found: {}", .path.display())]
    NotFound { what: &'static str, path: PathBuf },

    /// Incompatible flags or environment, detected before spawning.
    #[error("{0}")]
    Configuration(String),

    /// Tar extraction failed or the expected member is missing.
    #[error("archive {}: {message} (extracting to {})", .archive.display(), .destination.display())]
    Archive {
        archive: PathBuf,
        destination: PathBuf,
        message: String,
    },

    /// The child executable does not exist.
    #[error("execute not found: {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Any other failure while starting or waiting on the child.
    #[error("execute error: {program}: {source}")]
    Execute {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("execute interrupted")]
    Interrupted,
}

impl LaunchError {
    pub fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what,
            path: path.into(),
        }
    }

    /// Exit code reported when this error ends the invocation.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Spawn { .. } => EXIT_NOT_FOUND,
            Self::Interrupted => EXIT_INTERRUPTED,
            Self::NotFound { .. }
            | Self::Configuration(_)
            | Self::Archive { .. }
            | Self::Execute { .. } => EXIT_FAILURE,
        }
    }
}

/// Map any launcher error to its exit code, defaulting to a plain failure.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<LaunchError>()
        .map(LaunchError::exit_code)
        .unwrap_or(EXIT_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_setup_errors_map_to_one() {
        let err = anyhow::Error::from(LaunchError::not_found("target file", "missing.wasm"));
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
        assert_eq!(err.to_string(), "target file not found: missing.wasm");

        let err = anyhow::Error::from(LaunchError::Configuration("bad flags".into()));
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
    }

    #[test]
    fn executor_errors_keep_their_codes() {
        let spawn = LaunchError::Spawn {
            program: "node".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(spawn.exit_code(), EXIT_NOT_FOUND);
        assert_eq!(LaunchError::Interrupted.exit_code(), EXIT_INTERRUPTED);

        let denied = LaunchError::Execute {
            program: "./tool".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(denied.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn untyped_errors_fall_back_to_failure() {
        let err = anyhow::anyhow!("read .env");
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
    }
}
