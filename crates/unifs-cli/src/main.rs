//! unifs entry point.
//!
//! ```bash
//! RUST_LOG=unifs=debug unifs --config sftp.toml ls /
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use unifs_cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("unifs=info".parse()?))
        .init();

    let cli = Cli::parse();
    if unifs_cli::run(cli).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
