//! Configuration loading

use std::path::Path;

use anyhow::{Context, Result};
use maat_reactor::ReactorConfig;
use tracing::{debug, warn};

/// Load the configuration at `path`, or the defaults when no file is given
/// or the file does not exist.
///
/// `stress` swaps the default base for [`ReactorConfig::stress`]; a file
/// still wins when present.
pub fn load(path: Option<&Path>, stress: bool) -> Result<ReactorConfig> {
    let base = || {
        if stress {
            ReactorConfig::stress()
        } else {
            ReactorConfig::default()
        }
    };

    let config = match path {
        None => base(),
        Some(path) if !path.exists() => {
            warn!(path = %path.display(), "Config file not found, using defaults");
            base()
        }
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            debug!(path = %path.display(), "Loaded config file");
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
    };

    config.validate().context("invalid configuration")?;
    Ok(config)
}

pub fn to_toml(config: &ReactorConfig) -> Result<String> {
    toml::to_string_pretty(config).context("failed to render configuration")
}
