//! Known-args grammar for the WASM runner.
//!
//! Recognized flags may appear anywhere, before or after the file. Every token
//! the grammar does not recognize is kept, in order, for the launched program.
use super::{EmrunOptions, WasmOptions};

/// Help text of the standalone runner.
pub const USAGE: &str = "\
Run a WASM bundle with node (console) or emrun (browser)

Usage: wasm-runner [-e|-s|-n|-d] <FILE> [ARGS]...

Options:
  -e, --emrun    Run in a browser through emrun instead of node
  -s, --show     Show the browser window (implies --emrun)
  -n, --nokill   Keep the browser running after exit (implies --show)
  -d, --devtool  Open devtools in the browser (implies --nokill)
  -h, --help     Print help (only before FILE)

Flags must be spelled in full; abbreviations such as --dev pass through to
the program. Short flags may be combined (-sd). Unrecognized tokens and every
token after `--` go to the program in order. Defaults are read from
WASM_RUNNER_ARGS in a `.env` file next to FILE.

Examples:
  wasm-runner bazel-bin/app/demo.wasm --level 2
  wasm-runner --emrun bazel-bin/app/bundle.tar
  wasm-runner -d demo.html -- --show
";

/// Raw parse result before sidecar merge and flag implication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub emrun: bool,
    pub show: bool,
    pub nokill: bool,
    pub devtool: bool,
    /// `-h`/`--help` seen while the file was still expected.
    pub help: bool,
    pub file: Option<String>,
    /// Unrecognized tokens, destined for the launched program.
    pub rest: Vec<String>,
}

enum Flag {
    Emrun,
    Show,
    NoKill,
    DevTool,
}

impl Flag {
    fn from_long(name: &str) -> Option<Self> {
        match name {
            "emrun" => Some(Self::Emrun),
            "show" => Some(Self::Show),
            "nokill" => Some(Self::NoKill),
            "devtool" => Some(Self::DevTool),
            _ => None,
        }
    }

    fn from_short(letter: char) -> Option<Self> {
        match letter {
            'e' => Some(Self::Emrun),
            's' => Some(Self::Show),
            'n' => Some(Self::NoKill),
            'd' => Some(Self::DevTool),
            _ => None,
        }
    }
}

impl ParsedArgs {
    /// Parse `args`. With `expect_file`, the first positional is the target
    /// file; otherwise every positional passes through.
    pub fn parse(args: &[String], expect_file: bool) -> Self {
        let mut parsed = Self::default();
        // Build wrappers leave their own separator in front of tool args.
        let args = match args.split_first() {
            Some((first, rest)) if first == "--" => rest,
            _ => args,
        };

        let mut positional_only = false;
        for token in args {
            if positional_only {
                parsed.push_positional(token, expect_file);
                continue;
            }
            if token == "--" {
                positional_only = true;
                continue;
            }
            if expect_file && parsed.file.is_none() && (token == "-h" || token == "--help") {
                parsed.help = true;
                continue;
            }
            if let Some(flags) = parse_flag_token(token) {
                flags.into_iter().for_each(|flag| parsed.set(flag));
                continue;
            }
            if token.len() > 1 && token.starts_with('-') {
                parsed.rest.push(token.clone());
                continue;
            }
            parsed.push_positional(token, expect_file);
        }
        parsed
    }

    fn push_positional(&mut self, token: &str, expect_file: bool) {
        if expect_file && self.file.is_none() {
            self.file = Some(token.to_string());
        } else {
            self.rest.push(token.to_string());
        }
    }

    fn set(&mut self, flag: Flag) {
        match flag {
            Flag::Emrun => self.emrun = true,
            Flag::Show => self.show = true,
            Flag::NoKill => self.nokill = true,
            Flag::DevTool => self.devtool = true,
        }
    }

    /// Merge sidecar arguments under these command-line arguments.
    ///
    /// A flag set on the command line wins; an unset one takes the sidecar
    /// value. Sidecar passthrough args come first so later command-line args
    /// can override them positionally.
    pub fn merge_sidecar(mut self, sidecar: ParsedArgs) -> Self {
        self.emrun = self.emrun || sidecar.emrun;
        self.show = self.show || sidecar.show;
        self.nokill = self.nokill || sidecar.nokill;
        self.devtool = self.devtool || sidecar.devtool;
        let mut rest = sidecar.rest;
        rest.append(&mut self.rest);
        self.rest = rest;
        self
    }

    /// Apply the implication chain `devtool => nokill => show => emrun`.
    pub fn emrun_options(&self) -> Option<EmrunOptions> {
        if !(self.emrun || self.show || self.nokill || self.devtool) {
            return None;
        }
        Some(EmrunOptions {
            show: self.show || self.nokill || self.devtool,
            nokill: self.nokill || self.devtool,
            devtool: self.devtool,
        })
    }

    pub fn into_options(self, file: String) -> WasmOptions {
        let emrun = self.emrun_options();
        WasmOptions {
            file,
            emrun,
            args: self.rest,
        }
    }
}

/// `--name` or a cluster of short letters where every letter is a flag.
fn parse_flag_token(token: &str) -> Option<Vec<Flag>> {
    if let Some(name) = token.strip_prefix("--") {
        return Flag::from_long(name).map(|flag| vec![flag]);
    }
    let letters = token.strip_prefix('-')?;
    if letters.is_empty() {
        return None;
    }
    letters.chars().map(Flag::from_short).collect()
}
