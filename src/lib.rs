//! Run wrapper for build outputs.
//!
//! Locates a target handed over by a build orchestrator, decides whether it is
//! a native executable or a WASM bundle, builds the command line and runs it,
//! reporting the child's exit code back unchanged.
pub mod cli;
pub mod cmd;
pub mod detect;
pub mod env;
pub mod error;
pub mod find;
pub mod launch;
pub mod logging;
pub mod platform;
pub mod runfiles;
pub mod wasm;

pub use cmd::Command;
pub use env::LaunchEnv;
pub use error::LaunchError;
pub use find::{Finder, Origin, ResolvedFile};
pub use launch::Launcher;
pub use platform::{ExecPlatform, Options, Platform};
pub use wasm::{EmrunOptions, WasmCommandBuilder, WasmOptions};
