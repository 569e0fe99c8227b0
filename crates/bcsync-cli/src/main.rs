use bcsync_core::logging;
use clap::Parser;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // Initialize logging as early as possible; a read-only state dir is not fatal.
    if logging::init_logging(args.verbose).is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = args.run().await {
        tracing::error!("{:#}", err);
        eprintln!("bcsync error: {:#}", err);
        std::process::exit(cli::exit_code(&err));
    }
}
