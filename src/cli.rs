use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "upscaler")]
#[command(about = "Upscale images from the queue", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (YAML, TOML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
