pub mod check;
pub mod healthz;
pub mod inlet;
pub mod outlet;
pub mod query;

use std::io::Read;
use std::path::{Path, PathBuf};

/// Read a JSON document from `file`, or stdin when none is given.
pub fn read_input(file: Option<PathBuf>) -> Result<String, std::io::Error> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

/// Load, override from the environment, and validate.
pub fn load_config(path: &Path) -> Result<ragbridge_config::AppConfig, ragbridge_config::ConfigError> {
    ragbridge_config::AppConfig::load_from(path)
}
