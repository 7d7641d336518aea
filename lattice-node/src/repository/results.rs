//! Results repository
//!
//! Posts finished job results back to the server.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lattice_client::{Acknowledgement, GridClient};
use lattice_core::domain::job::JobResult;
use std::sync::Arc;

/// Repository trait for the result endpoint
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Posts a job result
    ///
    /// # Arguments
    /// * `result` - The finished result; the node keeps no copy after a successful post
    async fn post_result(&self, result: &JobResult) -> Result<Acknowledgement>;
}

/// HTTP implementation of ResultRepository
pub struct HttpResultRepository {
    client: Arc<GridClient>,
}

impl HttpResultRepository {
    pub fn new(client: Arc<GridClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResultRepository for HttpResultRepository {
    async fn post_result(&self, result: &JobResult) -> Result<Acknowledgement> {
        self.client
            .post_result(result)
            .await
            .with_context(|| format!("Failed to post result for job {}", result.job_id))
    }
}
