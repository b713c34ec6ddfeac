//! `trellis` binary.

use anyhow::Context;
use clap::Parser;

use trellis_cli::{CliArgs, TrellisCli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    TrellisCli::init_logging(args.verbose, args.quiet);

    let cli = TrellisCli::from_args(&args).context("failed to load the manifest")?;
    cli.run(args).await?;
    Ok(())
}
