mod capture;
mod cli;
mod core;
mod error;
mod interface;
mod packet;

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::CliArgs;
use crate::core::capture_loop::Outcome;
use crate::core::runner;
use crate::core::signal::{setup_ctrlc_handler, CancelToken};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // stdout carries payload bytes only; all diagnostics go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .init();

    let config = args.into_config();
    tracing::debug!("{:?}", config);

    // Shared shutdown token
    let token = CancelToken::new();
    if let Err(e) = setup_ctrlc_handler(token.clone()) {
        tracing::error!("{}", e);
        return ExitCode::FAILURE;
    }

    let mut stdout = io::stdout().lock();
    match runner::run(&config, &token, &mut stdout) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Cancelled) => {
            tracing::info!("Terminated by user");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
