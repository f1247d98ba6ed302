//! `.env` sidecar next to a WASM target.
//!
//! Only `WASM_RUNNER_ARGS=<shell-quoted args>` is recognized. Blank lines and
//! `#` comments are skipped; repeated keys accumulate in file order.
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const ENV_FILE_NAME: &str = ".env";
pub const RUNNER_ARGS_KEY: &str = "WASM_RUNNER_ARGS";

/// Read and parse a sidecar file.
pub fn read_env_file(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    tracing::debug!("  content: {}", content.trim());
    parse_env_file(&content).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_env_file(content: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() != RUNNER_ARGS_KEY {
            continue;
        }
        let value = strip_quotes(value.trim());
        let words = shell_words::split(value)
            .with_context(|| format!("split {RUNNER_ARGS_KEY} value: {value}"))?;
        args.extend(words);
    }
    Ok(args)
}

/// Remove one layer of matching surrounding quotes.
fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
