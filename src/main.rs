use anyhow::Result;
use clap::Parser;
use fidelis::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    fidelis::logging::init(cli.verbose);
    cli.run().await
}
