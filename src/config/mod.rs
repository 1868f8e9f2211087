pub mod toml_config;

pub use toml_config::RotationConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "court-rotation")]
#[command(about = "Simulate a round-robin court rotation session")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Comma separated participant names
    #[arg(long, value_delimiter = ',', required = true)]
    pub players: Vec<String>,

    /// Number of courts (defaults to session.default_courts)
    #[arg(long)]
    pub courts: Option<usize>,

    #[arg(long, default_value = "3")]
    pub rounds: u32,

    /// Seed for reproducible rotations
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn load_rotation_config(&self) -> crate::Result<RotationConfig> {
        match &self.config {
            Some(path) => RotationConfig::from_file(path),
            None => Ok(RotationConfig::default()),
        }
    }
}
