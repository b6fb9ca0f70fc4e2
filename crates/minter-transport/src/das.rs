//! Digital Asset Standard (DAS) JSON-RPC client.
//!
//! The DAS API is the read-optimized indexing service that exposes compressed
//! assets by id, owner and collection. It is eventually consistent: an item
//! minted a moment ago may not be visible yet.
//!
//! ## Methods used
//!
//! - `getAsset` - display metadata for one asset id
//! - `getAssetsByOwner` - assets held by an owner, optionally grouped by collection
//!
//! ## Usage
//!
//! ```ignore
//! let client = DasClient::new("https://devnet.helius-rpc.com/?api-key=...");
//! let assets = client.get_assets_by_owner("Owner111...", None)?;
//! ```

use std::time::Duration;

use minter_types::env_utils::env_var_or;
use minter_types::ItemId;
use serde_json::{json, Value};
use tracing::debug;

use crate::ledger::{Asset, AssetIndex, LedgerError};

/// Page size requested from `getAssetsByOwner` (the API maximum).
const OWNER_PAGE_LIMIT: u32 = 1000;

/// JSON-RPC error code some providers use for throttling.
const RPC_RATE_LIMIT_CODE: i64 = -32429;

/// Blocking DAS client; async callers go through the [`AssetIndex`] impl.
#[derive(Clone)]
pub struct DasClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl std::fmt::Debug for DasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Endpoints often embed an API key.
        f.debug_struct("DasClient")
            .field("endpoint", &redact_api_key(&self.endpoint))
            .finish()
    }
}

impl DasClient {
    /// Default request timeout in seconds (can be overridden by env).
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Default connect timeout in seconds (can be overridden by env).
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    fn default_timeouts() -> (Duration, Duration) {
        let timeout_secs = env_var_or("MINTER_DAS_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS);
        let connect_secs = env_var_or(
            "MINTER_DAS_CONNECT_TIMEOUT_SECS",
            Self::DEFAULT_CONNECT_TIMEOUT_SECS,
        );
        (
            Duration::from_secs(timeout_secs),
            Duration::from_secs(connect_secs),
        )
    }

    /// Create a client with default timeouts.
    pub fn new(endpoint: &str) -> Self {
        let (timeout, connect_timeout) = Self::default_timeouts();
        Self::with_timeouts(endpoint, timeout, connect_timeout)
    }

    /// Create a client with explicit timeouts.
    pub fn with_timeouts(endpoint: &str, timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .timeout_connect(connect_timeout)
                .build(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute one JSON-RPC call and return its `result`.
    fn call(&self, request_id: &str, method: &str, params: Value) -> Result<Value, LedgerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "method": method,
            "params": params,
        });

        debug!(method, endpoint = %redact_api_key(&self.endpoint), "DAS request");

        let response: Value = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_json(&body)
            .map_err(classify_http_error)?
            .into_json()
            .map_err(|e| LedgerError::Other(format!("failed to parse DAS response: {}", e)))?;

        parse_rpc_response(response)
    }

    /// Fetch one asset by id (`getAsset`).
    pub fn get_asset(&self, id: &ItemId) -> Result<Asset, LedgerError> {
        let result = self.call("minter-get-asset", "getAsset", json!({ "id": id.as_str() }))?;
        parse_asset(&result)
            .ok_or_else(|| LedgerError::Other(format!("asset {} missing from DAS response", id)))
    }

    /// List assets held by `owner` (`getAssetsByOwner`), newest first.
    pub fn get_assets_by_owner(
        &self,
        owner: &str,
        collection: Option<&str>,
    ) -> Result<Vec<Asset>, LedgerError> {
        let params = owner_query_params(owner, collection);
        let result = self.call("minter-assets-by-owner", "getAssetsByOwner", params)?;
        Ok(result
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_asset).collect())
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl AssetIndex for DasClient {
    async fn query_metadata(&self, id: &ItemId) -> Result<Asset, LedgerError> {
        let client = self.clone();
        let id = id.clone();
        tokio::task::spawn_blocking(move || client.get_asset(&id))
            .await
            .map_err(|e| LedgerError::Other(format!("DAS task failed: {}", e)))?
    }

    async fn query_items_by_owner(
        &self,
        owner: &str,
        collection: Option<&str>,
    ) -> Result<Vec<Asset>, LedgerError> {
        let client = self.clone();
        let owner = owner.to_string();
        let collection = collection.map(str::to_string);
        tokio::task::spawn_blocking(move || {
            client.get_assets_by_owner(&owner, collection.as_deref())
        })
        .await
        .map_err(|e| LedgerError::Other(format!("DAS task failed: {}", e)))?
    }
}

fn owner_query_params(owner: &str, collection: Option<&str>) -> Value {
    let mut params = json!({
        "ownerAddress": owner,
        "limit": OWNER_PAGE_LIMIT,
        "page": 1,
        "sortBy": { "sortBy": "created", "sortDirection": "desc" },
    });
    if let Some(group) = collection {
        params["grouping"] = json!({ "groupKey": "collection", "groupValue": group });
    }
    params
}

fn classify_http_error(err: ureq::Error) -> LedgerError {
    match err {
        ureq::Error::Status(429, _) => {
            LedgerError::RateLimited("DAS endpoint returned 429 Too Many Requests".to_string())
        }
        ureq::Error::Status(code, _) => {
            LedgerError::Other(format!("DAS endpoint returned HTTP {}", code))
        }
        ureq::Error::Transport(t) => LedgerError::Other(format!("DAS request failed: {}", t)),
    }
}

fn parse_rpc_response(response: Value) -> Result<Value, LedgerError> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        if code == RPC_RATE_LIMIT_CODE || code == 429 {
            return Err(LedgerError::RateLimited(message));
        }
        return Err(LedgerError::Other(format!("DAS error {}: {}", code, message)));
    }

    response
        .get("result")
        .filter(|r| !r.is_null())
        .cloned()
        .ok_or_else(|| LedgerError::Other("no result in DAS response".to_string()))
}

fn parse_asset(value: &Value) -> Option<Asset> {
    let id = value.get("id").and_then(Value::as_str)?;
    let name = value
        .pointer("/content/metadata/name")
        .and_then(Value::as_str)
        .map(str::to_string);
    let owner = value
        .pointer("/ownership/owner")
        .and_then(Value::as_str)
        .map(str::to_string);
    let collection = value
        .get("grouping")
        .and_then(Value::as_array)
        .and_then(|groups| {
            groups.iter().find(|g| {
                g.get("group_key").and_then(Value::as_str) == Some("collection")
            })
        })
        .and_then(|g| g.get("group_value"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(Asset {
        id: ItemId::new(id),
        name,
        owner,
        collection,
    })
}

/// Hide the value of an `api-key` query parameter.
pub fn redact_api_key(url: &str) -> String {
    match url.find("api-key=") {
        Some(pos) => {
            let start = pos + "api-key=".len();
            let end = url[start..]
                .find('&')
                .map(|offset| start + offset)
                .unwrap_or(url.len());
            format!("{}***{}", &url[..start], &url[end..])
        }
        None => url.to_string(),
    }
}
