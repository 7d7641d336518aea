//! Seeds repository
//!
//! Fetches the seed set used to build the node's random stream source.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lattice_client::GridClient;
use std::sync::Arc;

/// Repository trait for the seed endpoint
#[async_trait]
pub trait SeedRepository: Send + Sync {
    /// Fetches the current seed set
    ///
    /// `None` means the server has not published seeds yet.
    async fn fetch_seeds(&self) -> Result<Option<Vec<u64>>>;
}

/// HTTP implementation of SeedRepository
pub struct HttpSeedRepository {
    client: Arc<GridClient>,
}

impl HttpSeedRepository {
    pub fn new(client: Arc<GridClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SeedRepository for HttpSeedRepository {
    async fn fetch_seeds(&self) -> Result<Option<Vec<u64>>> {
        self.client
            .fetch_seeds()
            .await
            .context("Failed to fetch seeds")
    }
}
