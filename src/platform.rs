//! Requested and effective execution platforms.
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;

/// Platform requested on the command line. `Auto` asks for detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Platform {
    #[default]
    Auto,
    Exec,
    Wasm,
    Python,
}

/// Platform a command is built for. There is no `Auto` here, so an
/// unresolved request cannot reach command construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecPlatform {
    Exec,
    Wasm,
    Python,
}

impl Platform {
    /// The concrete platform, or `None` when detection is still required.
    pub fn concrete(self) -> Option<ExecPlatform> {
        match self {
            Self::Auto => None,
            Self::Exec => Some(ExecPlatform::Exec),
            Self::Wasm => Some(ExecPlatform::Wasm),
            Self::Python => Some(ExecPlatform::Python),
        }
    }

    /// Resolve to a concrete platform, running `detect` only for `Auto`.
    pub fn resolve_with<F>(self, detect: F) -> ExecPlatform
    where
        F: FnOnce() -> ExecPlatform,
    {
        self.concrete().unwrap_or_else(detect)
    }
}

impl ExecPlatform {
    pub fn label(self) -> &'static str {
        match self {
            Self::Exec => "exec",
            Self::Wasm => "wasm",
            Self::Python => "python",
        }
    }

    /// Scope label used by the executor banners.
    pub fn scope(self) -> String {
        format!("[{}]", self.label().to_uppercase())
    }
}

impl fmt::Display for ExecPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Start options for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub file: PathBuf,
    /// Passed verbatim to the launched program.
    pub args: Vec<String>,
    pub platform: Platform,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_runs_detection_and_concrete_platforms_do_not() {
        assert_eq!(
            Platform::Auto.resolve_with(|| ExecPlatform::Wasm),
            ExecPlatform::Wasm
        );
        assert_eq!(
            Platform::Python.resolve_with(|| panic!("detection must not run")),
            ExecPlatform::Python
        );
    }

    #[test]
    fn scope_label_is_upper_case() {
        assert_eq!(ExecPlatform::Wasm.scope(), "[WASM]");
        assert_eq!(ExecPlatform::Exec.to_string(), "exec");
    }

    #[test]
    fn value_names_match_cli_choices() {
        let names: Vec<String> = Platform::value_variants()
            .iter()
            .filter_map(|value| value.to_possible_value())
            .map(|value| value.get_name().to_string())
            .collect();
        assert_eq!(names, ["auto", "exec", "wasm", "python"]);
    }
}
