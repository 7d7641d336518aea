//! Node orchestrator
//!
//! Owns the node's state and drives the polling loop:
//! 1. Initialize the random stream source once (fatal if it never arrives)
//! 2. On every clock tick, fetch the next job for this node
//! 3. Dispatch and execute it
//! 4. Report the result under the exponential report policy
//!
//! Every failure inside a tick is caught at the tick boundary and turned into
//! a `false` outcome. At most one tick does work at any time: ticks that fire
//! while a job is in flight are dropped, never queued.

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::NodeConfig;
use crate::identity::NodeIdentity;
use crate::logging::Logger;
use crate::random::RandomStreamSource;
use crate::repository::{JobRepository, ResultRepository, SeedRepository};
use crate::scheduler::state::NodeState;
use crate::service::{InitError, JobDispatcher, Model, RandomnessInitializer, RetryPolicy};

const OUTCOME_CAPACITY: usize = 64;

pub struct Orchestrator {
    identity: NodeIdentity,
    logger: Logger,
    initializer: RandomnessInitializer,
    dispatcher: JobDispatcher,
    jobs: Arc<dyn JobRepository>,
    results: Arc<dyn ResultRepository>,
    report_policy: RetryPolicy,
    loop_interval: Duration,
    save_full_trace: bool,
    busy: AtomicBool,
    state: watch::Sender<NodeState>,
    outcomes: broadcast::Sender<bool>,
}

impl Orchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    /// * `config` - Node configuration (loop interval, trace flag)
    /// * `identity` - Identity stamped on every request and result
    /// * `logger` - Root logger; sub-components get scoped children
    /// * `models` - Fixed set of computation models
    pub fn new(
        config: &NodeConfig,
        identity: NodeIdentity,
        logger: Logger,
        seeds: Arc<dyn SeedRepository>,
        jobs: Arc<dyn JobRepository>,
        results: Arc<dyn ResultRepository>,
        models: Vec<Arc<dyn Model>>,
    ) -> Self {
        let initializer = RandomnessInitializer::new(seeds, logger.scoped("randomness"));
        let dispatcher = JobDispatcher::new(models, logger.scoped("dispatcher"));
        let (state, _) = watch::channel(NodeState::Uninitialized);
        let (outcomes, _) = broadcast::channel(OUTCOME_CAPACITY);

        Self {
            identity,
            logger,
            initializer,
            dispatcher,
            jobs,
            results,
            report_policy: RetryPolicy::result_report(),
            loop_interval: config.loop_interval,
            save_full_trace: config.save_full_trace,
            busy: AtomicBool::new(false),
            state,
            outcomes,
        }
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The random stream source, once initialization has succeeded
    pub fn randomness(&self) -> Option<Arc<RandomStreamSource>> {
        self.initializer.get()
    }

    pub fn models(&self) -> Vec<&str> {
        self.dispatcher.names()
    }

    pub fn state(&self) -> NodeState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<NodeState> {
        self.state.subscribe()
    }

    /// Per-tick outcomes: `true` only when a job was executed and reported
    pub fn subscribe_outcomes(&self) -> broadcast::Receiver<bool> {
        self.outcomes.subscribe()
    }

    fn set_state(&self, state: NodeState) {
        self.state.send_replace(state);
    }

    /// Builds the random stream source, moving to `Failed` if it never arrives
    pub async fn initialize(&self) -> Result<Arc<RandomStreamSource>, InitError> {
        self.set_state(NodeState::Initializing);

        match self.initializer.initialize().await {
            Ok(randomness) => {
                self.set_state(NodeState::Idle);
                Ok(randomness)
            }
            Err(e) => {
                self.set_state(NodeState::Failed);
                self.logger.error(format!("Cannot start polling: {}", e));
                Err(e)
            }
        }
    }

    /// Runs the node until `cancel` fires
    ///
    /// Returns an error only when randomness initialization fails for good.
    /// On cancellation the in-flight tick (including its report) is allowed
    /// to finish before this returns.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), InitError> {
        let randomness = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.logger.info("Cancelled before initialization completed");
                return Ok(());
            }
            result = self.initialize() => result?,
        };

        self.logger.info(format!(
            "Node {} ready ({} seed(s)), polling every {:?}",
            self.identity,
            randomness.seeds().len(),
            self.loop_interval
        ));

        let mut clock = time::interval(self.loop_interval);
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = clock.tick() => {}
            }

            while ticks.try_join_next().is_some() {}
            ticks.spawn(Arc::clone(&self).on_tick());
        }

        self.logger
            .info("Shutdown requested; waiting for the in-flight job to finish");
        while ticks.join_next().await.is_some() {}
        self.logger.info("Polling loop stopped");

        Ok(())
    }

    /// Handles one clock tick
    ///
    /// Returns `None` when the tick was dropped because another tick is
    /// still processing a job, otherwise the tick's outcome.
    pub async fn on_tick(self: Arc<Self>) -> Option<bool> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!("Tick dropped: a job is still in flight");
            return None;
        };

        // Run the tick on its own task so a panicking model only fails this tick
        let worker = Arc::clone(&self);
        let outcome = match tokio::spawn(async move { worker.tick().await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.logger.error_with(
                    format!("Tick aborted: {}", e),
                    json!({ "panic": e.is_panic() }),
                );
                false
            }
        };

        self.set_state(NodeState::Idle);
        let _ = self.outcomes.send(outcome);
        Some(outcome)
    }

    async fn tick(&self) -> bool {
        match self.process_next_job().await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.logger.error_with(
                    format!("Tick failed: {:#}", e),
                    json!({ "error": format!("{:#}", e) }),
                );
                false
            }
        }
    }

    async fn process_next_job(&self) -> Result<bool> {
        self.set_state(NodeState::Fetching);
        let node_id = self.identity.node_id();

        let Some(descriptor) = self.jobs.next_job(node_id).await? else {
            self.logger.info("No job available");
            return Ok(false);
        };

        let Some(job) = descriptor.clone().into_job() else {
            self.logger.warn_with(
                "Ignoring job descriptor without id or type",
                serde_json::to_value(&descriptor).unwrap_or_default(),
            );
            return Ok(false);
        };

        self.logger.reset_progress();
        self.logger.info(format!(
            "Received job {} (type '{}')",
            job.id, job.config_type
        ));

        self.set_state(NodeState::Executing);
        let randomness = self.randomness();
        let Some(result) = self
            .dispatcher
            .execute(&job, randomness.as_deref(), node_id, self.save_full_trace)
            .await?
        else {
            return Ok(false);
        };
        self.logger.info(format!(
            "Job {} produced {} trace record(s)",
            job.id,
            self.logger.trace_count()
        ));

        self.set_state(NodeState::Reporting);
        let report = self
            .report_policy
            .run(&self.logger, "result report", |_| {
                self.results.post_result(&result)
            })
            .await;

        match report {
            Ok(_) => {
                self.logger.info(format!(
                    "Reported job {} ({:.3}s)",
                    result.job_id, result.duration_seconds
                ));
                Ok(true)
            }
            Err(e) => {
                self.logger.error_with(
                    format!("Abandoning job {}: {}", result.job_id, e),
                    json!({ "jobId": result.job_id.to_string(), "attempts": e.attempts }),
                );
                Ok(false)
            }
        }
    }
}

/// Single-flight flag; released when dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
