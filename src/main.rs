use clap::Parser;
use runner::cli::RootArgs;
use runner::{logging, LaunchEnv, Launcher};

fn main() {
    logging::init_tracing();
    let options = RootArgs::parse().into_options();
    let code = Launcher::new(LaunchEnv::from_process()).start(&options);
    std::process::exit(code);
}
