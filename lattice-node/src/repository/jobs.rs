//! Jobs repository
//!
//! Pulls the next job queued for this node.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lattice_client::GridClient;
use lattice_core::domain::job::JobDescriptor;
use std::sync::Arc;

/// Repository trait for the next-job endpoint
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Fetches the next job for the given node
    ///
    /// # Arguments
    /// * `node_id` - Composite identity of this node
    ///
    /// Returns `None` when the queue is empty.
    async fn next_job(&self, node_id: &str) -> Result<Option<JobDescriptor>>;
}

/// HTTP implementation of JobRepository
pub struct HttpJobRepository {
    client: Arc<GridClient>,
}

impl HttpJobRepository {
    pub fn new(client: Arc<GridClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobRepository for HttpJobRepository {
    async fn next_job(&self, node_id: &str) -> Result<Option<JobDescriptor>> {
        self.client
            .next_job(node_id)
            .await
            .context("Failed to fetch next job")
    }
}
