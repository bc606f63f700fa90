//! `ragbridge check` — Validate configuration.

use std::path::Path;

use ragbridge_config::{AppConfig, ENV_URL};

pub async fn run(config_path: &Path, print_default: bool) -> Result<(), Box<dyn std::error::Error>> {
    if print_default {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    println!("RagBridge configuration check");
    println!("=============================\n");

    if config_path.exists() {
        println!("  ✅ Config file: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file at {}, using defaults", config_path.display());
    }

    let config = match AppConfig::load_from(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ {e}");
            return Err(e.into());
        }
    };

    let filter = &config.filter;
    if !filter.enabled {
        println!("  ⚠️  Filter disabled");
    } else if filter.is_configured() {
        println!("  ✅ Retrieval endpoint: {}", filter.rag_service_url);
    } else {
        println!("  ⚠️  No retrieval endpoint, set rag_service_url or {ENV_URL}");
    }

    println!(
        "  ✅ API key: {}",
        if filter.api_key().is_some() { "set" } else { "not set" }
    );
    println!("  ✅ Timeout: {}s, top_k: {}", filter.rag_service_timeout, filter.top_k);
    println!(
        "  ✅ Context injection: {}",
        if filter.inject_context { "on" } else { "off" }
    );
    println!("  ✅ Pipelines: {}", filter.pipelines.join(", "));
    println!(
        "  ✅ Probe: port {}, ready file {}",
        config.healthz.port,
        config.healthz.ready_file.display()
    );

    println!("\n  🎉 Configuration is valid.");
    Ok(())
}
