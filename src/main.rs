mod app;
mod cli;

use clap::Parser;
use cli::Cli;
use upscaler::config::Config;
use upscaler::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    observability::init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    app::run(config).await?;

    Ok(())
}
