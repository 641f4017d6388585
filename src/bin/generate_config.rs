//! generate_config - Build Frigate's config.yml from general.yml and cameras/*.yml.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use frigate_notifier::config_merge::{self, OUTPUT_FILE};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Merge general.yml and per-camera fragments into Frigate's config.yml"
)]
struct Args {
    /// Directory holding general.yml and the cameras/ fragments.
    #[arg(long, env = "FRIGATE_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Output path (default: <config-dir>/config.yml).
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let output = args
        .output
        .unwrap_or_else(|| args.config_dir.join(OUTPUT_FILE));
    let cameras = config_merge::generate(&args.config_dir, &output)?;
    log::info!(
        "Merged config with {} camera(s) written to {}",
        cameras,
        output.display()
    );
    Ok(())
}
