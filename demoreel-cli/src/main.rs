//! # Reel
//!
//! A command-line front end for rendering mastered demo reels.

use log::error;

mod cli;
mod logging;
mod progress;
mod runner;

fn main() {
    let args = cli::args::build_cli().get_matches();
    logging::init(&args);

    let code = match runner::run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}
