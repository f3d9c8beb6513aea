//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use georisk_cli::CliError;
use georisk_data::batch::error_chain;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match georisk_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("georisk: {}", error_chain(&err));
            std::process::exit(1);
        }
    }
}
