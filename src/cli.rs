//! Command-line surface of the launcher.
//!
//! Everything after the target file belongs to the launched program, including
//! tokens that look like launcher flags.
use crate::platform::{Options, Platform};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "runner",
    version,
    about = "Locate a build artifact and run it natively or as a WASM bundle",
    after_help = "Examples:\n  runner bazel-bin/app/demo.wasm -- --level 2\n  runner --platform wasm bazel-bin/app/bundle.tar --emrun\n  runner -p python tools/report.py --out report.txt"
)]
pub struct RootArgs {
    /// Execution platform; `auto` inspects the resolved file
    #[arg(long, short, value_enum, default_value_t = Platform::Auto)]
    pub platform: Platform,

    /// Target file, as a path or a runfiles-logical path
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Arguments passed verbatim to the launched program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl RootArgs {
    pub fn into_options(self) -> Options {
        Options {
            file: self.file,
            args: self.args,
            platform: self.platform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Options {
        RootArgs::try_parse_from(argv)
            .expect("parse args")
            .into_options()
    }

    #[test]
    fn defaults_to_auto_platform() {
        let options = parse(&["runner", "demo.wasm"]);
        assert_eq!(options.platform, Platform::Auto);
        assert_eq!(options.file, PathBuf::from("demo.wasm"));
        assert!(options.args.is_empty());
    }

    #[test]
    fn platform_accepts_short_and_long_forms() {
        assert_eq!(parse(&["runner", "-p", "wasm", "x"]).platform, Platform::Wasm);
        assert_eq!(
            parse(&["runner", "--platform", "python", "x.py"]).platform,
            Platform::Python
        );
        assert!(RootArgs::try_parse_from(["runner", "-p", "jvm", "x"]).is_err());
    }

    #[test]
    fn trailing_args_keep_hyphens_and_order() {
        let options = parse(&["runner", "demo", "--emrun", "-p", "exec", "--", "x"]);
        assert_eq!(options.file, PathBuf::from("demo"));
        assert_eq!(options.platform, Platform::Auto);
        assert_eq!(options.args, ["--emrun", "-p", "exec", "--", "x"]);
    }

    #[test]
    fn file_is_required() {
        assert!(RootArgs::try_parse_from(["runner"]).is_err());
    }
}
