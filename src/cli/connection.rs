use anyhow::{Context, Result};
use std::sync::Arc;

use crate::harbor::HarborClient;
use crate::service::RegistryService;
use crate::settings::{Settings, SettingsOverrides};

/// Validate settings and report; exits non-zero on error
pub fn check_config(overrides: &SettingsOverrides) {
    println!("Checking configuration...");
    match Settings::new(overrides) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!("  harbor.url:      {}", settings.harbor.url);
            println!("  harbor.username: {}", settings.harbor.username);
            println!("  harbor.password: {}", mask(&settings.harbor.password));
            if settings.harbor.insecure {
                println!("  harbor.insecure: true (TLS verification disabled)");
            }
            println!(
                "  server:          {}:{}",
                settings.server.host, settings.server.port
            );
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Fixed-width placeholder so the output does not leak the password length
fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "(empty)"
    } else {
        "********"
    }
}

/// Number of projects visible to the configured credentials
pub async fn count_projects(service: &RegistryService) -> Result<usize> {
    let projects = service
        .list_projects()
        .await
        .context("Failed to list projects")?;
    Ok(projects.len())
}

pub async fn test_connection(settings: &Settings) -> Result<()> {
    let client = HarborClient::from_settings(&settings.harbor)
        .context("Failed to create Harbor client")?;
    let api_base = client.api_base_url().to_string();
    let service = RegistryService::new(Arc::new(client));

    println!("Connecting to {}...", api_base);
    match count_projects(&service).await {
        Ok(count) => {
            println!(
                "✓ Connected as {} ({} project(s) visible)",
                settings.harbor.username, count
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Connection failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
