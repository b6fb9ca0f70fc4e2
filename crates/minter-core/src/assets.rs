//! Best-effort owner asset listing.

use minter_transport::{Asset, AssetIndex};
use tracing::warn;

/// Assets held by `owner`, newest first. Indexer errors yield an empty list.
pub async fn list_owned_assets(
    index: &dyn AssetIndex,
    owner: &str,
    collection: Option<&str>,
) -> Vec<Asset> {
    match index.query_items_by_owner(owner, collection).await {
        Ok(assets) => assets,
        Err(err) => {
            warn!(owner, error = %err, "failed to list assets, returning none");
            Vec::new()
        }
    }
}
