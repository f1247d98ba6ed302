//! Process environment snapshot.
//!
//! Build wrappers communicate through environment variables. They are read
//! once per invocation into [`LaunchEnv`] and handed to components explicitly.
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

pub const BUILD_WORKING_DIRECTORY: &str = "BUILD_WORKING_DIRECTORY";
pub const BUILD_WORKSPACE_DIRECTORY: &str = "BUILD_WORKSPACE_DIRECTORY";
pub const RUNFILES_MANIFEST_FILE: &str = "RUNFILES_MANIFEST_FILE";
pub const RUNFILES_DIR: &str = "RUNFILES_DIR";
pub const TEST_TARGET: &str = "TEST_TARGET";
pub const BAZEL_TEST: &str = "BAZEL_TEST";

#[derive(Debug, Clone, Default)]
pub struct LaunchEnv {
    /// Directory the user invoked the build wrapper from.
    pub build_working_directory: Option<PathBuf>,
    /// Workspace root of an interactive build invocation.
    pub build_workspace_directory: Option<PathBuf>,
    pub runfiles_manifest_file: Option<PathBuf>,
    pub runfiles_dir: Option<PathBuf>,
    /// Set when running under non-interactive test execution.
    pub test_mode: bool,
    /// Path this launcher was started as.
    pub argv0: Option<PathBuf>,
    /// Full command line, for the process header only.
    pub argv: Vec<String>,
    /// Every variable at startup, for the process header only.
    pub vars: BTreeMap<String, String>,
}

impl LaunchEnv {
    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        let mut env = Self::from_lookup(process_var, std::env::args_os().next());
        env.argv = std::env::args_os()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        env.vars = std::env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect();
        env
    }

    /// Build a snapshot from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F, argv0: Option<OsString>) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let path = |key: &str| non_empty(lookup(key)).map(PathBuf::from);
        Self {
            build_working_directory: path(BUILD_WORKING_DIRECTORY),
            build_workspace_directory: path(BUILD_WORKSPACE_DIRECTORY),
            runfiles_manifest_file: path(RUNFILES_MANIFEST_FILE),
            runfiles_dir: path(RUNFILES_DIR),
            test_mode: non_empty(lookup(TEST_TARGET)).is_some()
                || non_empty(lookup(BAZEL_TEST)).is_some(),
            argv0: non_empty(argv0).map(PathBuf::from),
            argv: Vec::new(),
            vars: BTreeMap::new(),
        }
    }

    /// True when an interactive build invocation provided a directory to work in.
    pub fn has_interactive_directory(&self) -> bool {
        self.build_working_directory.is_some() || self.build_workspace_directory.is_some()
    }
}

fn process_var(key: &str) -> Option<OsString> {
    std::env::var_os(key)
}

fn non_empty(value: Option<OsString>) -> Option<OsString> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> LaunchEnv {
        let vars: BTreeMap<String, OsString> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), OsString::from(value)))
            .collect();
        LaunchEnv::from_lookup(|key| vars.get(key).cloned(), None)
    }

    #[test]
    fn reads_build_and_runfiles_variables() {
        let env = env_from(&[
            (BUILD_WORKING_DIRECTORY, "/home/user/project"),
            (RUNFILES_DIR, "/tmp/runfiles"),
        ]);
        assert_eq!(
            env.build_working_directory,
            Some(PathBuf::from("/home/user/project"))
        );
        assert_eq!(env.runfiles_dir, Some(PathBuf::from("/tmp/runfiles")));
        assert!(env.runfiles_manifest_file.is_none());
        assert!(!env.test_mode);
        assert!(env.has_interactive_directory());
    }

    #[test]
    fn empty_values_count_as_unset() {
        let env = env_from(&[(BUILD_WORKING_DIRECTORY, ""), (TEST_TARGET, "")]);
        assert!(env.build_working_directory.is_none());
        assert!(!env.test_mode);
        assert!(!env.has_interactive_directory());
    }

    #[test]
    fn either_test_indicator_enables_test_mode() {
        assert!(env_from(&[(TEST_TARGET, "//pkg:test")]).test_mode);
        assert!(env_from(&[(BAZEL_TEST, "1")]).test_mode);
    }
}
