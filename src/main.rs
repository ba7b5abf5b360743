use anyhow::Result;
use clap::Parser;

use chorus::{cli::Cli, runtime::Runtime, utils::init_logger};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let code = Runtime::new(cli)?.run().await?;

    // One-shot runs report model failures through the exit code
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
