//! Cloudflare API token sourcing
//!
//! The token comes from an environment variable when set, otherwise from
//! Google Secret Manager using Application Default Credentials:
//! - Local: `gcloud auth application-default login`
//! - GKE: Workload Identity
//! - Cloud Run: Service account

use std::env;

use anyhow::{bail, Context, Result};
use gcloud_sdk::google::cloud::secretmanager::v1::secret_manager_service_client::SecretManagerServiceClient;
use gcloud_sdk::google::cloud::secretmanager::v1::AccessSecretVersionRequest;
use gcloud_sdk::GoogleApi;
use tracing::{debug, info};

use crate::config::CloudflareConfig;

const SECRET_MANAGER_API: &str = "https://secretmanager.googleapis.com";

/// Where the token for this run will be read from
#[derive(Debug, PartialEq, Eq)]
enum TokenSource<'a> {
    Env { var: &'a str, token: String },
    SecretManager { version: String },
}

/// Pick the token source from config and the current value of `token_env`.
///
/// A blank variable counts as unset.
fn token_source(config: &CloudflareConfig, from_env: Option<String>) -> Result<TokenSource<'_>> {
    if let Some(token) = from_env.map(|t| t.trim().to_string()) {
        if !token.is_empty() {
            return Ok(TokenSource::Env {
                var: &config.token_env,
                token,
            });
        }
    }

    match config.gcp_project.as_deref() {
        Some(project) => Ok(TokenSource::SecretManager {
            version: secret_version_name(project, &config.secret_name),
        }),
        None => bail!(
            "{} is not set and no cloudflare.gcp_project is configured",
            config.token_env
        ),
    }
}

/// Resolve the Cloudflare API token for this run
pub async fn api_token(config: &CloudflareConfig) -> Result<String> {
    match token_source(config, env::var(&config.token_env).ok())? {
        TokenSource::Env { var, token } => {
            info!(var = %var, "Using Cloudflare token from environment");
            Ok(token)
        }
        TokenSource::SecretManager { version } => {
            info!(secret = %version, "Fetching Cloudflare token from Secret Manager");
            access_latest(version)
                .await
                .context("Failed to fetch Cloudflare API token from GSM")
        }
    }
}

/// Read one secret version's payload, trimmed
async fn access_latest(version: String) -> Result<String> {
    let client = GoogleApi::from_function(SecretManagerServiceClient::new, SECRET_MANAGER_API, None)
        .await
        .context("Failed to initialize GSM client")?;

    let payload = client
        .get()
        .access_secret_version(AccessSecretVersionRequest { name: version })
        .await
        .context("Failed to access secret version")?
        .into_inner()
        .payload
        .context("Secret has no payload")?;

    let token = payload.data.as_sensitive_str().trim().to_string();
    if token.is_empty() {
        bail!("Secret payload is empty");
    }
    debug!(bytes = token.len(), "Token retrieved");

    Ok(token)
}

fn secret_version_name(project_id: &str, secret_name: &str) -> String {
    format!(
        "projects/{}/secrets/{}/versions/latest",
        project_id, secret_name
    )
}
