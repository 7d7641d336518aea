//! Next-job endpoint

use crate::GridClient;
use crate::error::{ClientError, Result};
use lattice_core::domain::job::JobDescriptor;
use lattice_core::dto::job::NextJobQuery;
use tracing::debug;

impl GridClient {
    /// Pull the next job queued for a node
    ///
    /// # Arguments
    /// * `node_id` - Composite identity of the requesting node
    ///
    /// # Returns
    /// `None` when the queue is empty
    pub async fn next_job(&self, node_id: &str) -> Result<Option<JobDescriptor>> {
        if node_id.is_empty() {
            return Err(ClientError::InvalidRequest(
                "node_id cannot be empty".to_string(),
            ));
        }

        let url = self.url("jobs/next");
        debug!("GET {} (nodeId={})", url, node_id);

        let response = self
            .client
            .get(&url)
            .query(&NextJobQuery {
                node_id: node_id.to_string(),
            })
            .send()
            .await?;

        self.read_optional(response).await
    }
}
