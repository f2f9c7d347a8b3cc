use std::sync::Arc;

use dashmap::DashMap;

use arena_common::{Job, JobMetrics, JobStatus, NodeStatus, WorkloadSpec};
use arena_registry::{NodeFilter, Registry};

pub mod backend;
pub mod strategy;
mod util;

use backend::ExecutionBackend;
use strategy::{Candidate, LowestUtilization, PlacementStrategy};
use util::now_ms;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("job '{0}' not found")]
    NotFound(String),

    #[error("no eligible node for model '{0}'")]
    NoEligibleNode(String),

    #[error("job '{job_id}' is not running (status {status:?})")]
    InvalidState { job_id: String, status: JobStatus },

    #[error("invalid workload: {0}")]
    Validation(String),
}

/// Job table shared between the dispatcher and the tasks it spawns.
/// Terminal transitions are write-once: whichever signal lands first wins,
/// every later one is rejected with `InvalidState`.
#[derive(Clone, Default)]
struct JobStore {
    jobs: Arc<DashMap<String, Job>>,
}

impl JobStore {
    fn insert(&self, job: Job) {
        self.jobs.insert(job.job_id.clone(), job);
    }

    fn get(&self, job_id: &str) -> Result<Job, DispatchError> {
        self.jobs
            .get(job_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| DispatchError::NotFound(job_id.to_string()))
    }

    fn complete(
        &self,
        job_id: &str,
        result: String,
        metrics: JobMetrics,
    ) -> Result<Job, DispatchError> {
        let mut entry = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| DispatchError::NotFound(job_id.to_string()))?;

        if entry.status != JobStatus::Running {
            return Err(DispatchError::InvalidState {
                job_id: job_id.to_string(),
                status: entry.status,
            });
        }

        entry.status = JobStatus::Completed;
        entry.result = Some(result);
        entry.metrics = Some(metrics);
        entry.completed_at_ms = Some(now_ms());
        tracing::info!(job_id = %job_id, node_id = %entry.node_id, "job completed");
        Ok(entry.clone())
    }

    fn fail(&self, job_id: &str, reason: &str) -> Result<Job, DispatchError> {
        let mut entry = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| DispatchError::NotFound(job_id.to_string()))?;

        if entry.status != JobStatus::Running {
            return Err(DispatchError::InvalidState {
                job_id: job_id.to_string(),
                status: entry.status,
            });
        }

        entry.status = JobStatus::Failed;
        entry.error = Some(reason.to_string());
        entry.completed_at_ms = Some(now_ms());
        tracing::warn!(job_id = %job_id, node_id = %entry.node_id, reason, "job failed");
        Ok(entry.clone())
    }
}

/// Routes inference requests to registry nodes and owns the job lifecycle:
/// `queued → running → {completed, failed}`.
pub struct Dispatcher {
    store: JobStore,
    registry: Arc<Registry>,
    backend: Arc<dyn ExecutionBackend>,
    strategy: Box<dyn PlacementStrategy>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, backend: Arc<dyn ExecutionBackend>) -> Arc<Self> {
        Self::with_strategy(registry, backend, Box::new(LowestUtilization))
    }

    pub fn with_strategy(
        registry: Arc<Registry>,
        backend: Arc<dyn ExecutionBackend>,
        strategy: Box<dyn PlacementStrategy>,
    ) -> Arc<Self> {
        tracing::info!(strategy = strategy.name(), "dispatcher initialized");
        Arc::new(Self {
            store: JobStore::default(),
            registry,
            backend,
            strategy,
        })
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Validate the workload, place it on an eligible node, and hand it to
    /// the execution backend. Returns the job record without waiting for
    /// completion; placement failures create no job at all.
    pub fn submit(&self, workload: WorkloadSpec) -> Result<Job, DispatchError> {
        if workload.model.trim().is_empty() {
            return Err(DispatchError::Validation("model name is empty".to_string()));
        }
        if workload.input.trim().is_empty() {
            return Err(DispatchError::Validation(
                "input payload is empty".to_string(),
            ));
        }

        let eligible = self.registry.list(&NodeFilter {
            status: Some(NodeStatus::Online),
            min_vram_mb: workload.required_vram_mb,
            gpu_model: None,
        });

        let candidates: Vec<Candidate> = eligible.iter().map(|n| Candidate { node: n }).collect();
        let selected = self
            .strategy
            .select(&candidates)
            .map(|i| &eligible[i])
            .ok_or_else(|| DispatchError::NoEligibleNode(workload.model.clone()))?;

        // Placement already established feasibility, so the job becomes
        // runnable immediately with no separate queueing delay.
        let job_id = format!("job_{}", uuid::Uuid::new_v4());
        let job = Job {
            job_id: job_id.clone(),
            node_id: selected.node_id.clone(),
            workload: workload.clone(),
            status: JobStatus::Running,
            result: None,
            error: None,
            metrics: None,
            created_at_ms: now_ms(),
            completed_at_ms: None,
        };
        self.store.insert(job.clone());
        tracing::info!(
            job_id = %job_id,
            node_id = %job.node_id,
            model = %job.workload.model,
            kind = ?job.workload.kind,
            "job dispatched"
        );

        // The backend call runs outside any map guard; its outcome lands
        // through the same complete/fail funnel external callers use.
        let store = self.store.clone();
        let backend = self.backend.clone();
        let node_id = job.node_id.clone();
        tokio::spawn(async move {
            let outcome = match backend.run(&node_id, &workload).await {
                Ok(res) => store.complete(&job_id, res.output, res.metrics),
                Err(e) => store.fail(&job_id, &e.to_string()),
            };
            if let Err(e) = outcome {
                tracing::warn!(job_id = %job_id, error = %e, "dropping late backend signal");
            }
        });

        Ok(job)
    }

    /// Terminal callback from the execution backend. Fails with
    /// `InvalidState` unless the job is currently running, so a duplicate
    /// completion can never overwrite the first.
    pub fn complete(
        &self,
        job_id: &str,
        result: String,
        metrics: JobMetrics,
    ) -> Result<Job, DispatchError> {
        self.store.complete(job_id, result, metrics)
    }

    /// Terminal failure callback. The reason is recorded verbatim; the
    /// dispatcher never retries; resubmission is the caller's decision.
    pub fn fail(&self, job_id: &str, reason: &str) -> Result<Job, DispatchError> {
        self.store.fail(job_id, reason)
    }

    pub fn get_status(&self, job_id: &str) -> Result<Job, DispatchError> {
        self.store.get(job_id)
    }

    /// Job history, newest first.
    pub fn list_jobs(&self) -> Vec<Job> {
        let mut out: Vec<Job> = self.store.jobs.iter().map(|e| e.value().clone()).collect();
        out.sort_by(|a, b| {
            b.created_at_ms
                .cmp(&a.created_at_ms)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        out
    }

    /// Returns (total, completed, failed) for the network stats view.
    pub fn job_counts(&self) -> (usize, usize, usize) {
        let mut completed = 0;
        let mut failed = 0;
        for e in self.store.jobs.iter() {
            match e.value().status {
                JobStatus::Completed => completed += 1,
                JobStatus::Failed => failed += 1,
                _ => {}
            }
        }
        (self.store.jobs.len(), completed, failed)
    }
}
