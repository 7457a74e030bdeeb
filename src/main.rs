use anyhow::Context;
use clap::Parser;
use estest_gen::cmd::{run_generate, Cli};
use estest_gen::log::init_tracing;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing().context("failed to set up logging")?;

    let cli = Cli::parse();
    let cfg = cli.into_config().context("failed to load configuration")?;
    let summary = run_generate(&cfg)?;
    tracing::info!(generated = summary.generated, "done");
    Ok(())
}
