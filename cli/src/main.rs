//! TeaPOS command line client
//!
//! Signs in against the TeaPOS backend, keeps the session on disk and
//! makes authenticated API calls with it.

mod commands;
mod state;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    teapos_core::init_logging();

    let cli = commands::Cli::parse();
    cli.run().await
}
