//! Seed endpoint

use crate::GridClient;
use crate::error::Result;
use tracing::debug;

impl GridClient {
    /// Fetch the shared randomness seeds
    ///
    /// # Returns
    /// `None` when the server has no seeds to hand out yet. An empty array is
    /// returned as-is; deciding what it means is up to the caller.
    pub async fn fetch_seeds(&self) -> Result<Option<Vec<u64>>> {
        let url = self.url("seeds");
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        self.read_optional(response).await
    }
}
