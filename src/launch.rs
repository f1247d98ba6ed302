//! Top-level launch flow.
//!
//! `Options -> Finder -> platform detection -> command -> executor -> exit code`.
//! Nothing here terminates the process; entry points exit with the returned code.
use crate::cmd::Command;
use crate::detect::detect_platform;
use crate::env::LaunchEnv;
use crate::error::{exit_code_for, LaunchError};
use crate::find::{Finder, ResolvedFile};
use crate::platform::{ExecPlatform, Options};
use crate::runfiles::{Runfiles, RunfilesLookup};
use crate::wasm::args::ParsedArgs;
use crate::wasm::WasmCommandBuilder;
use anyhow::Result;
use regex::RegexSet;
use std::path::Path;

/// Interpreter for `--platform python`.
pub const PYTHON: &str = "python3";

const HEADER_INCLUDE: [&str; 3] = [r"^BUILD_", r"^RUNFILES_", r"^TEST_"];
// Large file paths the test runner exports.
const HEADER_EXCLUDE: &str = r"^TEST_.*(_FILE|DIR)$";

pub struct Launcher {
    env: LaunchEnv,
    header_printed: bool,
}

impl Launcher {
    pub fn new(env: LaunchEnv) -> Self {
        Self {
            env,
            header_printed: false,
        }
    }

    /// Run `options` to completion and return the exit code for the caller.
    pub fn start(&mut self, options: &Options) -> i32 {
        self.log_header();
        tracing::info!("  {options:?}");
        match self.prepare(options) {
            Ok((command, platform)) => command.scoped_execute(&platform.scope()),
            Err(err) => fail(&err),
        }
    }

    /// Entry for the standalone WASM runner: `args` follow its own grammar
    /// and must name the target file.
    pub fn start_wasm(&mut self, args: &[String]) -> i32 {
        self.log_header();
        match self.prepare_wasm(args) {
            Ok(command) => command.scoped_execute(&ExecPlatform::Wasm.scope()),
            Err(err) => fail(&err),
        }
    }

    fn finder(&self) -> Finder {
        let runfiles = Runfiles::discover(&self.env);
        tracing::debug!("  runfiles: {}", runfiles.describe());
        Finder::new(self.env.build_working_directory.clone(), Box::new(runfiles))
    }

    fn prepare(&self, options: &Options) -> Result<(Command, ExecPlatform)> {
        let finder = self.finder();
        let resolved = resolve_target(&finder, &options.file)?;
        let platform = options
            .platform
            .resolve_with(|| detect_platform(&resolved.path));

        let target = resolved.path.display().to_string();
        let command = match platform {
            ExecPlatform::Exec => Command::new(target, options.args.iter().cloned()),
            ExecPlatform::Python => Command::new(
                PYTHON,
                std::iter::once(target).chain(options.args.iter().cloned()),
            ),
            ExecPlatform::Wasm => {
                WasmCommandBuilder::new(&finder, &self.env).build(&resolved, &options.args)?
            }
        };
        Ok((command, platform))
    }

    fn prepare_wasm(&self, args: &[String]) -> Result<Command> {
        tracing::info!("⚙️  WASM Runner {args:?}");
        let mut parsed = ParsedArgs::parse(args, true);
        let file = parsed.file.take().ok_or_else(|| {
            LaunchError::Configuration("missing WASM target file".to_string())
        })?;
        let finder = self.finder();
        let resolved = resolve_target(&finder, Path::new(&file))?;
        WasmCommandBuilder::new(&finder, &self.env).build_parsed(&resolved, parsed)
    }

    /// Title, working directory, argv and build-related variables. Once per launcher.
    fn log_header(&mut self) {
        if self.header_printed {
            return;
        }
        self.header_printed = true;

        tracing::info!("⭐ Runner");
        if let Ok(cwd) = std::env::current_dir() {
            tracing::info!("  CWD {}", cwd.display());
        }
        for (index, arg) in self.env.argv.iter().enumerate() {
            tracing::info!("  [{index}] {arg}");
        }
        for (key, value) in header_vars(&self.env) {
            tracing::info!("  {key}={value}");
        }
    }
}

fn resolve_target(finder: &Finder, file: &Path) -> Result<ResolvedFile> {
    let resolved = finder
        .resolve(file)
        .ok_or_else(|| LaunchError::not_found("target file", file))?;
    tracing::info!("  Target({}): {}", resolved.origin, resolved.path.display());
    Ok(resolved)
}

/// Single fatal line for an error raised before any child exists.
fn fail(err: &anyhow::Error) -> i32 {
    tracing::error!("❌ {err:#}");
    exit_code_for(err)
}

/// Variables shown in the header, in name order.
pub fn header_vars(env: &LaunchEnv) -> Vec<(&str, &str)> {
    let (include, exclude) = match (
        RegexSet::new(HEADER_INCLUDE),
        RegexSet::new([HEADER_EXCLUDE]),
    ) {
        (Ok(include), Ok(exclude)) => (include, exclude),
        (Err(err), _) | (_, Err(err)) => {
            tracing::debug!("  header filter unavailable: {err}");
            return Vec::new();
        }
    };
    env.vars
        .iter()
        .filter(|(key, _)| include.is_match(key) && !exclude.is_match(key))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}
