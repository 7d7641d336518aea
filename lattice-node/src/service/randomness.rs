//! Randomness initializer
//!
//! Fetches the seed set once, builds the [`RandomStreamSource`] and memoizes
//! it. Concurrent callers wait on the same construction; later callers get
//! the stored instance without touching the network. "No seeds yet" (absent
//! or empty array) counts as a failed attempt of the seed-fetch retry policy.
//! Once that policy is exhausted the failure is memoized too: the
//! initializer stays failed for the life of the process.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::logging::Logger;
use crate::random::RandomStreamSource;
use crate::repository::SeedRepository;
use crate::service::retry::RetryPolicy;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InitError {
    /// The server has not published seeds yet
    #[error("server returned no seeds")]
    NoSeeds,

    /// Permanent failure; the node must not enter the main loop
    #[error("randomness unavailable after {attempts} attempt(s): {reason}")]
    Exhausted { attempts: u32, reason: String },
}

pub struct RandomnessInitializer {
    seeds: Arc<dyn SeedRepository>,
    policy: RetryPolicy,
    logger: Logger,
    source: OnceCell<Result<Arc<RandomStreamSource>, InitError>>,
}

impl RandomnessInitializer {
    pub fn new(seeds: Arc<dyn SeedRepository>, logger: Logger) -> Self {
        Self {
            seeds,
            policy: RetryPolicy::seed_fetch(),
            logger,
            source: OnceCell::new(),
        }
    }

    /// Returns the shared source, building it on first use
    pub async fn initialize(&self) -> Result<Arc<RandomStreamSource>, InitError> {
        self.source.get_or_init(|| self.build()).await.clone()
    }

    /// The source if it has already been built
    pub fn get(&self) -> Option<Arc<RandomStreamSource>> {
        self.source
            .get()
            .and_then(|built| built.as_ref().ok())
            .cloned()
    }

    async fn build(&self) -> Result<Arc<RandomStreamSource>, InitError> {
        self.logger.info("Requesting randomness seeds");

        match self
            .policy
            .run(&self.logger, "seed fetch", |_| self.fetch_and_build())
            .await
        {
            Ok(source) => {
                self.logger.info(format!(
                    "Random stream source ready ({} seed(s))",
                    source.seeds().len()
                ));
                Ok(Arc::new(source))
            }
            Err(e) => {
                self.logger
                    .error(format!("Randomness initialization failed: {}", e));
                Err(InitError::Exhausted {
                    attempts: e.attempts,
                    reason: format!("{:#}", e.last_error),
                })
            }
        }
    }

    async fn fetch_and_build(&self) -> anyhow::Result<RandomStreamSource> {
        match self.seeds.fetch_seeds().await? {
            Some(seeds) if !seeds.is_empty() => RandomStreamSource::from_seeds(&seeds),
            _ => {
                self.logger.info("Server has no seeds yet");
                Err(InitError::NoSeeds.into())
            }
        }
    }
}
