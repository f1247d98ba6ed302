//! Shared test infrastructure for launcher integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Variables that would change resolution or mode selection if inherited.
const LAUNCH_VARS: [&str; 7] = [
    "BUILD_WORKING_DIRECTORY",
    "BUILD_WORKSPACE_DIRECTORY",
    "RUNFILES_MANIFEST_FILE",
    "RUNFILES_DIR",
    "TEST_TARGET",
    "BAZEL_TEST",
    "RUNNER_LOG",
];

/// Scratch workspace with a private `bin/` directory for fake tools.
pub struct Sandbox {
    pub root: TempDir,
}

impl Sandbox {
    pub fn create() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(root.path().join("bin")).expect("create bin dir");
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.path().join("bin")
    }

    pub fn write(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Write an executable shell script.
    #[cfg(unix)]
    pub fn script(&self, relative: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.write(relative, format!("#!/bin/sh\n{body}\n").as_bytes());
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
        path
    }

    /// Fake tool on the private PATH that prints one argument per line.
    #[cfg(unix)]
    pub fn fake_tool(&self, name: &str, exit_code: i32) -> PathBuf {
        self.script(
            &format!("bin/{name}"),
            &format!("for arg in \"$@\"; do echo \"$arg\"; done\nexit {exit_code}"),
        )
    }

    /// Launcher binary with a clean build environment, running in `cwd` with
    /// only the private `bin/` and the system directories on PATH.
    pub fn command(&self, bin: &str, cwd: &Path) -> Command {
        let mut command = Command::new(bin);
        for key in LAUNCH_VARS {
            command.env_remove(key);
        }
        let path = std::env::join_paths([self.bin_dir(), "/bin".into(), "/usr/bin".into()])
            .expect("join PATH");
        command.env("PATH", path).current_dir(cwd);
        command
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
