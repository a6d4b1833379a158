use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "camscan")]
#[command(about = "Audit authorized networks for unauthenticated camera streams")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, default_value = "config.json", help = "Configuration file path")]
    pub config: PathBuf,

    #[arg(long, help = "Override the configured batch size")]
    pub batch_size: Option<usize>,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            batch_size: self.batch_size,
        }
    }
}

/// Crates whose logs drown the scan summary.
const NOISY_TARGETS: [&str; 3] = ["hyper", "reqwest", "h2"];

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    NOISY_TARGETS
        .iter()
        .fold(level.to_string(), |filter, target| {
            format!("{filter},{target}=error")
        })
}

pub fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()?;

    Ok(())
}
