//! Show the effective configuration

use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let rendered = config
        .to_toml_string()
        .context("Failed to render configuration")?;

    print!("{}", rendered);
    Ok(())
}
