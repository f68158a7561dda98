//! Entry point for the hashmake CLI.

use clap::Parser;
use hashmake::cancel::{self, CancelFlag};
use hashmake::cli::Cli;
use hashmake::logging;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    let cancel = CancelFlag::new();
    if let Err(e) = cancel::install_ctrlc(&cancel) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }

    match hashmake::run_app(cli, &cancel) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            log::error!("{err:#}");
            std::process::exit(hashmake::EXIT_FAILURE);
        }
    }
}
