//! Configuration display command.

use ocrmerge::Config;

use crate::cli::icons::{dim_arrow, warn};

/// Print the effective configuration as TOML.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match &config.source_path {
        Some(path) => eprintln!("{} Loaded from {}", dim_arrow(), path.display()),
        None => eprintln!("{} No config file found, using defaults", warn()),
    }

    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
