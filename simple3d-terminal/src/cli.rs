/// Command line for the terminal demo
use std::path::PathBuf;

use clap::Parser;
use simple3d_core::DeliveryMode;

use crate::config::{ConfigError, DemoConfig};

#[derive(Parser, Debug)]
#[command(name = "simple3d-terminal", about = "Pick and hover a small 3D scene in the terminal")]
pub struct Cli {
    /// TOML settings file; built-in defaults when omitted
    pub config: Option<PathBuf>,

    /// Which hits receive callbacks: all_hits or nearest_hit
    #[arg(long)]
    pub delivery_mode: Option<DeliveryMode>,

    /// Frame rate cap, overriding the config file
    #[arg(long)]
    pub fps: Option<u32>,
}

impl Cli {
    /// Load the config file, if any, and apply the command line overrides
    pub fn resolve(&self) -> Result<DemoConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => DemoConfig::load(path)?,
            None => DemoConfig::default(),
        };
        if let Some(mode) = self.delivery_mode {
            config.delivery_mode = mode;
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        config.validate()?;
        Ok(config)
    }
}
