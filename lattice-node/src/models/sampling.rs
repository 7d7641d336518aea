//! Uniform sampling model
//!
//! Draws `samples` values from the "sampling" sub-stream and reports their
//! summary statistics. Every draw is emitted as a trace record, so the quiet
//! console shows progress markers while it runs.

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use lattice_core::domain::job::{Job, JobResult};
use rand::Rng;
use serde_json::{Map, Value, json};

use crate::logging::Logger;
use crate::random::RandomStreamSource;
use crate::service::Model;

const DEFAULT_SAMPLES: u64 = 1000;
const MAX_SAMPLES: u64 = 10_000_000;
/// Well below any sensible log bus capacity, so subscribers keep up
const YIELD_EVERY: u64 = 64;

pub struct SamplingModel;

#[async_trait]
impl Model for SamplingModel {
    fn name(&self) -> &str {
        "sampling"
    }

    async fn run(
        &self,
        job: &Job,
        randomness: &RandomStreamSource,
        logger: &Logger,
        node_id: &str,
        save_full_trace: bool,
    ) -> Result<JobResult> {
        let samples = job.param_u64("samples").unwrap_or(DEFAULT_SAMPLES);
        if samples == 0 || samples > MAX_SAMPLES {
            bail!("samples must be between 1 and {}, got {}", MAX_SAMPLES, samples);
        }

        let start_time = Utc::now();
        let mut rng = randomness.stream("sampling");
        let mut trace = save_full_trace.then(Vec::new);
        let (mut sum, mut min, mut max) = (0.0f64, f64::INFINITY, f64::NEG_INFINITY);

        for i in 0..samples {
            let value: f64 = rng.r#gen();
            sum += value;
            min = min.min(value);
            max = max.max(value);
            logger.trace(format!("sample {} = {:.6}", i, value));

            if let Some(trace) = trace.as_mut() {
                trace.push(value);
            }
            if (i + 1) % YIELD_EVERY == 0 {
                tokio::task::yield_now().await;
            }
        }

        let mut outputs = Map::new();
        outputs.insert("samples".to_string(), json!(samples));
        outputs.insert("mean".to_string(), json!(sum / samples as f64));
        outputs.insert("min".to_string(), json!(min));
        outputs.insert("max".to_string(), json!(max));
        if let Some(trace) = trace {
            outputs.insert("trace".to_string(), Value::from(trace));
        }

        logger.info(format!("Drew {} sample(s) for job {}", samples, job.id));

        Ok(JobResult::new(
            job.id.clone(),
            node_id,
            start_time,
            Utc::now(),
            outputs,
        ))
    }
}
