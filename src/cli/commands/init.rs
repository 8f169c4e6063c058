//! Init command handler

use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!(
            "Wrote default config to {}",
            Config::default_config_path().display()
        );
    } else {
        println!(
            "{} already exists, leaving it untouched",
            Config::default_config_path().display()
        );
    }

    Ok(())
}
