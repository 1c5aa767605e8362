use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::harbor::{HarborClient, RegistryClient};
use crate::mcp::transport::{http, stdio, Transport};
use crate::mcp::HarborMcp;
use crate::service::RegistryService;
use crate::settings::Settings;

/// Wire a registry client into the tool handler
pub fn build_handler(client: Arc<dyn RegistryClient>) -> HarborMcp {
    HarborMcp::new(RegistryService::new(client))
}

pub async fn run(transport: Transport, settings: Settings) -> Result<()> {
    let client = HarborClient::from_settings(&settings.harbor)
        .context("Failed to create Harbor client")?;
    info!(
        transport = %transport,
        registry = %client.api_base_url(),
        "Starting harbor-mcp {}",
        env!("CARGO_PKG_VERSION")
    );

    let handler = build_handler(Arc::new(client));
    match transport {
        Transport::Stdio => stdio::serve_stdio(handler).await,
        Transport::Http => http::serve_http(handler, &settings.server).await,
    }
}
