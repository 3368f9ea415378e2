//! Internal vault listing endpoint (`GET /api/v1/vaults`)

use serde::Deserialize;
use serde_json::Value;

use super::{respond, ApiResponse};
use crate::domain::{Record, Vault};
use crate::error::{ApiError, BackendError};

/// Error text for any non-2xx listing response
pub const LISTING_FAILED: &str = "Failed to fetch vaults";

#[derive(Debug, Deserialize)]
struct VaultListing {
    vaults: Vec<Value>,
}

pub async fn fetch_vault_listing(base_url: &str) -> ApiResponse<Vec<Vault>> {
    respond("fetch_vault_listing", listing(base_url).await)
}

async fn listing(base_url: &str) -> Result<Vec<Vault>, ApiError> {
    let url = format!("{}/api/v1/vaults", base_url.trim_end_matches('/'));
    tracing::debug!(%url, "fetching vault listing");
    let response = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .map_err(BackendError::from)?;
    if !response.status().is_success() {
        tracing::warn!(status = response.status().as_u16(), "vault listing request failed");
        return Err(ApiError::Other(LISTING_FAILED.to_string()));
    }
    let body: VaultListing = response.json().await.map_err(BackendError::from)?;
    Ok(Vault::from_rows(body.vaults)?)
}
