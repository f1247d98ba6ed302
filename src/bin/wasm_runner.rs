//! Standalone WASM runner: `wasm-runner [-e|-s|-n|-d] <file> [args...]`.
use runner::wasm::args::{ParsedArgs, USAGE};
use runner::{logging, LaunchEnv, Launcher};

fn main() {
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    if ParsedArgs::parse(&args, true).help {
        print!("{USAGE}");
        return;
    }
    logging::init_tracing();
    let code = Launcher::new(LaunchEnv::from_process()).start_wasm(&args);
    std::process::exit(code);
}
