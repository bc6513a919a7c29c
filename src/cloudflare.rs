//! Cloudflare API Client
//!
//! Read-only zone lookup against the v4 REST API. Record, page rule and
//! ruleset creation belong to the provisioning engine that consumes the
//! compiled plan.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::zones::ZoneLookup;

pub const CLOUDFLARE_API: &str = "https://api.cloudflare.com/client/v4";

/// Cloudflare API client
pub struct CloudflareClient {
    client: Client,
    api_base: String,
    api_token: String,
}

// ============================================================
// API Response Types
// ============================================================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
    name: String,
}

// ============================================================
// Client Implementation
// ============================================================

impl CloudflareClient {
    /// Create a new Cloudflare client with API token
    pub fn new(api_token: String, api_base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("edge-dns/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    /// Look up zone ID by name
    pub async fn get_zone_id(&self, zone_name: &str) -> Result<String> {
        debug!("Looking up zone ID for: {}", zone_name);

        let url = format!(
            "{}/zones?name={}",
            self.api_base,
            urlencoding::encode(zone_name)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .context("Failed to query zones")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Cloudflare API error {}: {}", status, text);
        }

        let response: ApiResponse<Vec<Zone>> = response
            .json()
            .await
            .context("Failed to parse zones response")?;

        if !response.success {
            let errors: Vec<String> = response
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect();
            bail!("Cloudflare API error: {}", errors.join(", "));
        }

        let zones = response.result.unwrap_or_default();
        let zone = zones
            .iter()
            .find(|z| z.name.eq_ignore_ascii_case(zone_name))
            .with_context(|| format!("Zone not found: {}", zone_name))?;

        debug!("Found zone ID: {}", zone.id);
        Ok(zone.id.clone())
    }
}

#[async_trait]
impl ZoneLookup for CloudflareClient {
    async fn zone_id(&self, domain: &str) -> Result<String> {
        self.get_zone_id(domain).await
    }
}
