//! Computation capability interface
//!
//! A [`Model`] turns a job into a result. The node never looks inside; it
//! only selects a model by the job's declared type and awaits the outcome.

use anyhow::Result;
use async_trait::async_trait;
use lattice_core::domain::job::{Job, JobResult};

use crate::logging::Logger;
use crate::random::RandomStreamSource;

#[async_trait]
pub trait Model: Send + Sync {
    /// Job type this model handles; matched case-sensitively
    fn name(&self) -> &str;

    /// Executes a job
    ///
    /// # Arguments
    /// * `job` - The validated job
    /// * `randomness` - Shared, read-only random stream source
    /// * `logger` - Logger scoped to this model
    /// * `node_id` - Identity to stamp on the result
    /// * `save_full_trace` - Whether to include the full execution trace in the outputs
    async fn run(
        &self,
        job: &Job,
        randomness: &RandomStreamSource,
        logger: &Logger,
        node_id: &str,
        save_full_trace: bool,
    ) -> Result<JobResult>;
}
