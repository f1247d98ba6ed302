//! Scoped child-process execution.
//!
//! Every run is bracketed by a begin banner and a matching end banner, and
//! every failure mode of the child becomes an exit code:
//! - executable not found: 127
//! - interrupted by the user: 130
//! - any other launch failure: 1
//! - otherwise the child's own code (`128 + signal` when killed on unix)
use crate::error::{LaunchError, EXIT_FAILURE};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{self, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const DELIMITER_LEN: usize = 64;

#[derive(Debug)]
pub struct Command {
    argv: Vec<String>,
    cwd: Option<PathBuf>,
    cwd_label: Option<String>,
    /// Extracted bundle the command runs from; removed on drop.
    scratch: Option<TempDir>,
}

impl Command {
    /// `program` becomes `argv[0]`, so the vector is never empty.
    pub fn new<I>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut argv = vec![program.into()];
        argv.extend(args);
        Self {
            argv,
            cwd: None,
            cwd_label: None,
            scratch: None,
        }
    }

    pub fn with_cwd(mut self, cwd: PathBuf, label: Option<String>) -> Self {
        self.cwd = Some(cwd);
        self.cwd_label = label;
        self
    }

    pub fn with_scratch(mut self, scratch: TempDir) -> Self {
        self.scratch = Some(scratch);
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    /// Shell-quoted rendering of the full command line.
    pub fn command_line(&self) -> String {
        shell_words::join(&self.argv)
    }

    /// Run the command between begin/end banners and return its exit code.
    pub fn scoped_execute(&self, scope: &str) -> i32 {
        tracing::info!("➡️  {scope}");
        self.log_location();
        tracing::info!("  {}", self.command_line());
        log_delimiter('>');

        let exit_code = match self.execute() {
            Ok(code) => code,
            Err(err) => {
                match &err {
                    LaunchError::Interrupted => tracing::warn!("⚠️ Execute interrupted"),
                    other => tracing::error!("❌ {other}"),
                }
                err.exit_code()
            }
        };

        log_delimiter('<');
        if exit_code == 0 {
            tracing::info!("⬅️  {scope} ✅ Success: {exit_code}");
        } else {
            tracing::info!("⬅️  {scope} ❌ Error: {exit_code}");
        }
        exit_code
    }

    fn log_location(&self) {
        let cwd = self
            .cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        let label = match (&self.cwd, &self.cwd_label) {
            (_, Some(label)) => Some(label.as_str()),
            (None, None) => Some("CWD"),
            (Some(_), None) => None,
        };
        match label {
            Some(label) => tracing::info!("  cd {} # {label}", cwd.display()),
            None => tracing::info!("  cd {}", cwd.display()),
        }
    }

    /// Spawn the child, inheriting standard streams, and wait for it.
    pub fn execute(&self) -> Result<i32, LaunchError> {
        let interrupted = Arc::new(AtomicBool::new(false));
        let _guard = InterruptGuard::register(&interrupted);

        let program = self.program().to_string();
        let status = self.process_command().status().map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                LaunchError::Spawn { program, source }
            } else {
                LaunchError::Execute { program, source }
            }
        })?;

        if interrupted.load(Ordering::SeqCst) || killed_by_interrupt(&status) {
            return Err(LaunchError::Interrupted);
        }
        Ok(exit_code_of(&status))
    }

    fn process_command(&self) -> process::Command {
        let program = self.program();
        match which::which(program) {
            Ok(path) => tracing::debug!("  exe: {}", path.display()),
            Err(_) => tracing::debug!("  exe: {program} (not on PATH)"),
        }

        let mut command = if needs_shell(program) {
            let mut command = process::Command::new("cmd");
            command.arg("/C").args(&self.argv);
            command
        } else {
            let mut command = process::Command::new(program);
            command.args(&self.argv[1..]);
            command
        };
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }
}

fn log_delimiter(symbol: char) {
    tracing::info!("{}", symbol.to_string().repeat(DELIMITER_LEN));
}

/// Batch files only run through the command interpreter on Windows.
fn needs_shell(program: &str) -> bool {
    if !cfg!(windows) {
        return false;
    }
    which::which(program)
        .ok()
        .and_then(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        })
        .is_some_and(|ext| ext == "bat" || ext == "cmd")
}

/// Keeps the launcher alive through a terminal interrupt while the child runs.
///
/// The interrupt reaches the whole foreground process group; the child handles
/// it and the launcher only records that it happened.
struct InterruptGuard {
    id: Option<signal_hook::SigId>,
}

impl InterruptGuard {
    fn register(flag: &Arc<AtomicBool>) -> Self {
        match signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(flag)) {
            Ok(id) => Self { id: Some(id) },
            Err(err) => {
                tracing::debug!("  interrupt handler unavailable: {err}");
                Self { id: None }
            }
        }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            signal_hook::low_level::unregister(id);
        }
    }
}

#[cfg(unix)]
fn killed_by_interrupt(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(signal_hook::consts::SIGINT)
}

#[cfg(not(unix))]
fn killed_by_interrupt(_status: &ExitStatus) -> bool {
    false
}

fn exit_code_of(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    EXIT_FAILURE
}
