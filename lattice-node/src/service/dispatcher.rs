//! Job dispatcher
//!
//! Maps a job's declared type to a registered [`Model`]. A miss is not an
//! error: it is logged at warn level and the tick simply produces no result.

use anyhow::{Context, Result};
use lattice_core::domain::job::{Job, JobResult};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::logging::Logger;
use crate::random::RandomStreamSource;
use crate::service::model::Model;

pub struct JobDispatcher {
    models: HashMap<String, Arc<dyn Model>>,
    logger: Logger,
}

impl JobDispatcher {
    /// Creates a dispatcher over a fixed set of models
    ///
    /// When two models claim the same name the first one is kept.
    pub fn new(models: Vec<Arc<dyn Model>>, logger: Logger) -> Self {
        let mut registry: HashMap<String, Arc<dyn Model>> = HashMap::new();
        for model in models {
            let name = model.name().to_string();
            if registry.contains_key(&name) {
                logger.warn(format!("Ignoring duplicate model registration '{}'", name));
                continue;
            }
            registry.insert(name, model);
        }

        Self {
            models: registry,
            logger,
        }
    }

    /// Registered model names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Selects the model for a job, logging a warning on a miss
    pub fn dispatch(&self, job: &Job) -> Option<Arc<dyn Model>> {
        let model = self.models.get(&job.config_type).cloned();
        if model.is_none() {
            self.logger.warn_with(
                format!("No model registered for job type '{}'", job.config_type),
                json!({ "jobId": job.id.to_string(), "type": job.config_type }),
            );
        }
        model
    }

    /// Dispatches and runs a job
    ///
    /// Returns `Ok(None)` when no model matches or the randomness source is
    /// not ready yet; both are transient and leave the loop running. Model
    /// failures are returned as errors.
    pub async fn execute(
        &self,
        job: &Job,
        randomness: Option<&RandomStreamSource>,
        node_id: &str,
        save_full_trace: bool,
    ) -> Result<Option<JobResult>> {
        let Some(model) = self.dispatch(job) else {
            return Ok(None);
        };

        let Some(randomness) = randomness else {
            self.logger.info(format!(
                "Randomness not ready; job {} will be picked up on a later tick",
                job.id
            ));
            return Ok(None);
        };

        self.logger
            .info(format!("Running job {} with model '{}'", job.id, model.name()));

        let logger = self.logger.scoped(format!("model:{}", model.name()));
        let result = model
            .run(job, randomness, &logger, node_id, save_full_trace)
            .await
            .with_context(|| format!("Model '{}' failed on job {}", model.name(), job.id))?;

        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogBus;
    use async_trait::async_trait;
    use chrono::Utc;
    use lattice_core::domain::job::JobId;
    use lattice_core::domain::log::LogLevel;
    use serde_json::{Map, Value};

    struct NamedModel(&'static str);

    #[async_trait]
    impl Model for NamedModel {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(
            &self,
            job: &Job,
            _randomness: &RandomStreamSource,
            _logger: &Logger,
            node_id: &str,
            _save_full_trace: bool,
        ) -> Result<JobResult> {
            let mut outputs = Map::new();
            outputs.insert("model".to_string(), Value::from(self.0));
            let now = Utc::now();
            Ok(JobResult::new(job.id.clone(), node_id, now, now, outputs))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl Model for FailingModel {
        fn name(&self) -> &str {
            "broken"
        }

        async fn run(
            &self,
            _job: &Job,
            _randomness: &RandomStreamSource,
            _logger: &Logger,
            _node_id: &str,
            _save_full_trace: bool,
        ) -> Result<JobResult> {
            anyhow::bail!("division by zero")
        }
    }

    fn job(config_type: &str) -> Job {
        Job {
            id: JobId::Number(1),
            config_type: config_type.to_string(),
            parameters: Map::new(),
        }
    }

    fn dispatcher(bus: &LogBus) -> JobDispatcher {
        JobDispatcher::new(
            vec![
                Arc::new(NamedModel("A")),
                Arc::new(NamedModel("B")),
                Arc::new(FailingModel),
            ],
            bus.logger("dispatcher"),
        )
    }

    #[test]
    fn test_selects_exact_match() {
        let bus = LogBus::new(16);
        let dispatcher = dispatcher(&bus);
        assert_eq!(dispatcher.dispatch(&job("B")).unwrap().name(), "B");
        assert_eq!(dispatcher.dispatch(&job("A")).unwrap().name(), "A");
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let bus = LogBus::new(16);
        assert!(dispatcher(&bus).dispatch(&job("b")).is_none());
    }

    #[tokio::test]
    async fn test_miss_logs_warning_with_type() {
        let bus = LogBus::new(16);
        let mut rx = bus.subscribe();
        let dispatcher = dispatcher(&bus);

        assert!(dispatcher.dispatch(&job("epidemic")).is_none());

        let record = rx.recv().await.unwrap();
        assert_eq!(record.level, LogLevel::Warn);
        assert!(record.message.contains("epidemic"));
        assert_eq!(record.data.unwrap()["type"], "epidemic");
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let bus = LogBus::new(16);
        let dispatcher = JobDispatcher::new(
            vec![Arc::new(NamedModel("A")), Arc::new(NamedModel("A"))],
            bus.logger("dispatcher"),
        );
        assert_eq!(dispatcher.names(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_execute_runs_selected_model() {
        let bus = LogBus::new(16);
        let randomness = RandomStreamSource::from_seeds(&[1, 2, 3]).unwrap();

        let result = dispatcher(&bus)
            .execute(&job("B"), Some(&randomness), "m:1", false)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.outputs["model"], "B");
        assert_eq!(result.node_id, "m:1");
    }

    #[tokio::test]
    async fn test_execute_without_randomness_yields_nothing() {
        let bus = LogBus::new(16);
        let result = dispatcher(&bus)
            .execute(&job("A"), None, "m:1", false)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_execute_unknown_type_yields_nothing() {
        let bus = LogBus::new(16);
        let randomness = RandomStreamSource::from_seeds(&[1]).unwrap();
        let result = dispatcher(&bus)
            .execute(&job("Z"), Some(&randomness), "m:1", false)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_model_failure_is_an_error() {
        let bus = LogBus::new(16);
        let randomness = RandomStreamSource::from_seeds(&[1]).unwrap();
        let err = dispatcher(&bus)
            .execute(&job("broken"), Some(&randomness), "m:1", false)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("division by zero"));
    }
}
