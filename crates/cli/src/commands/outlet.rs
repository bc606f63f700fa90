//! `ragbridge outlet` — Run a response through the outlet hook.

use std::path::{Path, PathBuf};

use ragbridge_filter::ContextFilter;

pub async fn run(config_path: &Path, file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let filter = ContextFilter::from_config(config.filter)?;

    let body: serde_json::Value = serde_json::from_str(&super::read_input(file)?)?;
    let body = filter.outlet(body, None, None).await;

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
