//! Result endpoint

use crate::GridClient;
use crate::error::{ClientError, Result};
use lattice_core::domain::job::JobResult;
use lattice_core::dto::result::Acknowledgement;
use tracing::debug;

impl GridClient {
    /// Post a finished job result
    ///
    /// An empty success body counts as an implicit acknowledgement. An
    /// explicit `accepted: false` is reported as [`ClientError::Rejected`].
    pub async fn post_result(&self, result: &JobResult) -> Result<Acknowledgement> {
        let url = self.url("results");
        debug!("POST {} (job {})", url, result.job_id);

        let response = self.client.post(&url).json(result).send().await?;

        let ack = self
            .read_optional::<Acknowledgement>(response)
            .await?
            .unwrap_or_else(Acknowledgement::implicit);

        check_acknowledgement(ack)
    }
}

fn check_acknowledgement(ack: Acknowledgement) -> Result<Acknowledgement> {
    if ack.accepted {
        Ok(ack)
    } else {
        Err(ClientError::Rejected(
            ack.message
                .unwrap_or_else(|| "result not accepted".to_string()),
        ))
    }
}
