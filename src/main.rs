//! nlm CLI entry point
//!
//! Parses arguments, sets up logging and prints failures through
//! [`user_friendly_error`] before exiting with status 1.
//!
//! Logging goes to stderr. `--debug` (or `DEBUG=1|true|nlm`) enables debug
//! output; otherwise `RUST_LOG` is honoured and the default level is `warn`.

use anyhow::Result;
use clap::Parser;
use nlm_cli::cli;
use nlm_cli::core::user_friendly_error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    init_logging(cli.debug_enabled());

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("nlm_cli=debug,package_manager=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
