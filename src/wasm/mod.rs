//! WASM bundle launching.
//!
//! A WASM target runs either through the script runtime (`node <stem>.js`,
//! console mode) or in an automated browser session (`emrun <stem>.html`).
//! Options come from the command line merged over the `.env` sidecar next to
//! the target; packaged bundles are unpacked before the command is built.
pub mod archive;
pub mod args;
pub mod env_file;

use crate::cmd::Command;
use crate::env::LaunchEnv;
use crate::error::LaunchError;
use crate::find::{Finder, ResolvedFile};
use anyhow::Result;
use args::ParsedArgs;
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Script runtime for console mode.
pub const SCRIPT_RUNTIME: &str = "node";
/// Browser automation tool for browser mode.
pub const BROWSER_RUNNER: &str = "emrun";
pub const BROWSER: &str = "chrome";

// https://peter.sh/experiments/chromium-command-line-switches/
const BASE_BROWSER_ARGS: [&str; 2] = [
    "--disable-background-networking",
    "--allow-insecure-localhost",
];
const DEVTOOLS_BROWSER_ARG: &str = "--auto-open-devtools-for-tabs";
const HEADLESS_BROWSER_ARG: &str = "--headless";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmrunOptions {
    pub show: bool,
    pub nokill: bool,
    pub devtool: bool,
}

impl fmt::Display for EmrunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(show={}, nokill={}, devtool={})",
            self.show, self.nokill, self.devtool
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasmOptions {
    pub file: String,
    /// `None` selects the script runtime, not a browser run with defaults.
    pub emrun: Option<EmrunOptions>,
    /// Arguments for the launched program, not for the runner.
    pub args: Vec<String>,
}

pub struct WasmCommandBuilder<'a> {
    finder: &'a Finder,
    env: &'a LaunchEnv,
}

impl<'a> WasmCommandBuilder<'a> {
    pub fn new(finder: &'a Finder, env: &'a LaunchEnv) -> Self {
        Self { finder, env }
    }

    /// Build the command for `resolved` from launcher passthrough args.
    pub fn build(&self, resolved: &ResolvedFile, cli_args: &[String]) -> Result<Command> {
        tracing::info!("⚙️  WASM Runner {} {cli_args:?}", resolved.path.display());
        self.build_parsed(resolved, ParsedArgs::parse(cli_args, false))
    }

    /// Build from already parsed command-line args (file excluded).
    pub fn build_parsed(&self, resolved: &ResolvedFile, cli: ParsedArgs) -> Result<Command> {
        tracing::debug!("  parsed: {cli:?}");
        let sidecar = ParsedArgs::parse(&self.sidecar_args(resolved), false);
        if sidecar != ParsedArgs::default() {
            tracing::debug!("  env parsed: {sidecar:?}");
        }

        let real = resolved
            .path
            .canonicalize()
            .unwrap_or_else(|_| resolved.path.clone());
        let options = cli
            .merge_sidecar(sidecar)
            .into_options(real.display().to_string());
        match options.emrun {
            Some(emrun) => tracing::info!("  emrun {emrun} args {:?}", options.args),
            None => tracing::info!("  node args {:?}", options.args),
        }
        self.check_interactive(&options)?;

        let (markup, scratch) = locate_markup(&real)?;
        let command = match options.emrun {
            Some(emrun) => emrun_command(&markup, &options.args, emrun)?,
            None => node_command(&markup, &options.args)?,
        };
        Ok(match scratch {
            Some(dir) => command.with_scratch(dir),
            None => command,
        })
    }

    /// Arguments from the `.env` sidecar, looked up next to the requested
    /// path first and next to the resolved file second.
    fn sidecar_args(&self, resolved: &ResolvedFile) -> Vec<String> {
        let requested = resolved.requested.with_file_name(env_file::ENV_FILE_NAME);
        let sidecar = self
            .finder
            .resolve(&requested)
            .map(|found| found.path)
            .or_else(|| {
                let beside = resolved.path.with_file_name(env_file::ENV_FILE_NAME);
                beside.is_file().then_some(beside)
            });
        let Some(path) = sidecar else {
            return Vec::new();
        };
        tracing::debug!("  sidecar: {}", path.display());
        match env_file::read_env_file(&path) {
            Ok(args) => args,
            Err(err) => {
                tracing::warn!("❌ Failed reading/parsing: {err:#}");
                Vec::new()
            }
        }
    }

    fn check_interactive(&self, options: &WasmOptions) -> Result<()> {
        if options.emrun.is_some() && self.env.test_mode && !self.env.has_interactive_directory() {
            return Err(LaunchError::Configuration(
                "--emrun cannot be used in test mode (no BUILD_WORKING_DIRECTORY or BUILD_WORKSPACE_DIRECTORY)"
                    .to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// Markup entry point for `real`, unpacking it first when it is a bundle.
fn locate_markup(real: &Path) -> Result<(PathBuf, Option<TempDir>)> {
    if archive::is_tar(real) {
        tracing::debug!("Found tar archive: {}", real.display());
        let extracted = archive::extract_bundle(real)?;
        return Ok((extracted.markup, Some(extracted.dir)));
    }
    Ok((real.with_extension("html"), None))
}

/// Console mode: run the sibling script with the script runtime.
pub fn node_command(markup: &Path, args: &[String]) -> Result<Command> {
    tracing::info!("🚀 WASM Console mode (via {SCRIPT_RUNTIME})");
    let script = markup.with_extension("js");
    if !script.is_file() {
        return Err(LaunchError::not_found("JavaScript file", script).into());
    }
    tracing::debug!("  js: {}", script.display());

    let mut argv = vec![script.display().to_string()];
    argv.extend(args.iter().cloned());
    Ok(Command::new(SCRIPT_RUNTIME, argv))
}

/// Browser mode: serve the markup file through the browser automation tool.
pub fn emrun_command(markup: &Path, args: &[String], emrun: EmrunOptions) -> Result<Command> {
    tracing::info!("🚀 WASM Browser mode (via {BROWSER_RUNNER})");
    if !markup.is_file() {
        return Err(LaunchError::not_found("HTML file", markup).into());
    }
    tracing::debug!("  html: {}", markup.display());

    let mut argv = Vec::new();
    if !emrun.nokill {
        argv.extend(["--kill_start".to_string(), "--kill_exit".to_string()]);
    }
    argv.push(format!("--browser={BROWSER}"));

    let mut browser_args: Vec<&str> = BASE_BROWSER_ARGS.to_vec();
    if emrun.devtool {
        browser_args.push(DEVTOOLS_BROWSER_ARG);
    }
    if !emrun.show {
        browser_args.push(HEADLESS_BROWSER_ARG);
    }
    // emrun strips the surrounding quotes before splitting.
    argv.push(format!("--browser_args=\"{}\"", browser_args.join(" ")));

    argv.push(markup.display().to_string());
    if !args.is_empty() {
        // Everything after the separator goes to the WASM program.
        argv.push("--".to_string());
        argv.extend(args.iter().cloned());
    }
    Ok(Command::new(BROWSER_RUNNER, argv))
}

#[cfg(test)]
#[path = "wasm_tests.rs"]
mod tests;
