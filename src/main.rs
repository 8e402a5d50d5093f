use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod client;
mod codec;
mod error;
mod frame;
mod interactive;
mod port;
mod rx;
mod scenario;
mod sim;
mod stats;
mod tx;
mod verify;

fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let summary = match args.cmd {
        cli::Cmd::Sim(opts) => sim::bench::run(opts)?,
        cli::Cmd::Uart(opts) => client::run(opts)?,
    };
    Ok(summary.exit_code())
}
