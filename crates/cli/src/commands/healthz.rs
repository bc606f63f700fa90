//! `ragbridge healthz` — Serve the liveness probe.
//!
//! Only the `[healthz]` section and `HEALTHZ_*` variables are read, so a
//! broken filter configuration never takes the probe down.

use std::path::{Path, PathBuf};

use ragbridge_config::AppConfig;

pub async fn run(
    config_path: &Path,
    port: Option<u16>,
    ready_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::read(config_path)?.healthz;
    config.apply_env(&|key: &str| std::env::var(key).ok())?;

    if let Some(port) = port {
        config.port = port;
    }
    if let Some(ready_file) = ready_file {
        config.ready_file = ready_file;
    }

    ragbridge_healthz::serve(config).await?;
    Ok(())
}
