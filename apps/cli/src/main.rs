//! sitekit CLI: render content-site blocks from a live site index.
//!
//! Fetches index sheets, placeholders and the nav tree from a site origin
//! and prints the decorated block markup.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
