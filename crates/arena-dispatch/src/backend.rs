use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use arena_common::{JobMetrics, WorkloadKind, WorkloadSpec};

/// What the backend hands back for a finished workload.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub output: String,
    pub metrics: JobMetrics,
}

/// External collaborator that performs the actual workload. Any
/// implementation that can be invoked with (node_id, workload) and
/// eventually produces one terminal outcome is acceptable.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn run(&self, node_id: &str, workload: &WorkloadSpec) -> Result<ExecutionResult>;
}

// ---------------------------------------------------------------------------
// HttpBackend — remote compute-network client
// ---------------------------------------------------------------------------

pub struct HttpBackend {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(300))
            .build()
            .expect("reqwest client");

        Self {
            base_url,
            api_key,
            http,
        }
    }
}

#[async_trait]
impl ExecutionBackend for HttpBackend {
    async fn run(&self, node_id: &str, workload: &WorkloadSpec) -> Result<ExecutionResult> {
        let url = format!("{}/inference", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "node_id": node_id,
            "model": workload.model,
            "kind": workload.kind,
            "input": workload.input,
        });

        let mut req = self.http.post(url).json(&body);
        if let Some(key) = self.api_key.as_deref() {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("backend returned {status}: {text}");
        }

        let v: serde_json::Value = resp.json().await?;
        let output = v
            .get("output")
            .and_then(|o| o.as_str())
            .unwrap_or_default()
            .to_string();
        let metrics = v
            .get("metrics")
            .and_then(|m| serde_json::from_value::<JobMetrics>(m.clone()).ok())
            .unwrap_or(JobMetrics {
                inference_ms: 0,
                tokens_generated: None,
                vram_peak_pct: None,
                cost_usd: None,
            });

        Ok(ExecutionResult { output, metrics })
    }
}

// ---------------------------------------------------------------------------
// SimulatedBackend — deterministic stand-in for development and demos
// ---------------------------------------------------------------------------

pub struct SimulatedBackend {
    delay: Duration,
}

impl SimulatedBackend {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    fn preview(input: &str, max_chars: usize) -> String {
        input.chars().take(max_chars).collect()
    }

    fn estimate_tokens(s: &str) -> u64 {
        if s.is_empty() {
            return 0;
        }
        ((s.len() as f64) / 4.0).ceil() as u64
    }
}

#[async_trait]
impl ExecutionBackend for SimulatedBackend {
    async fn run(&self, node_id: &str, workload: &WorkloadSpec) -> Result<ExecutionResult> {
        tokio::time::sleep(self.delay).await;

        let artifact_id = uuid::Uuid::new_v4();
        let output = match workload.kind {
            WorkloadKind::Text => format!(
                "Response from {} on {}: simulated completion for '{}...'",
                workload.model,
                node_id,
                Self::preview(&workload.input, 50)
            ),
            WorkloadKind::Image => {
                format!("https://artifacts.arena.local/generated/{artifact_id}.png")
            }
            WorkloadKind::Video => {
                format!("https://artifacts.arena.local/video/{artifact_id}.mp4")
            }
        };

        let tokens_generated = match workload.kind {
            WorkloadKind::Text => Some(Self::estimate_tokens(&workload.input)),
            _ => None,
        };

        Ok(ExecutionResult {
            output,
            metrics: JobMetrics {
                inference_ms: self.delay.as_millis() as u64,
                tokens_generated,
                vram_peak_pct: None,
                cost_usd: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_workload(kind: WorkloadKind) -> WorkloadSpec {
        WorkloadSpec {
            model: "llama-3.2".to_string(),
            kind,
            input: "describe the aurora borealis".to_string(),
            required_vram_mb: None,
        }
    }

    #[tokio::test]
    async fn test_simulated_text_output() {
        let backend = SimulatedBackend::new(Duration::ZERO);
        let res = backend
            .run("node-a", &make_workload(WorkloadKind::Text))
            .await
            .unwrap();

        assert!(res.output.contains("llama-3.2"));
        assert!(res.output.contains("node-a"));
        assert_eq!(res.metrics.tokens_generated, Some(7));
    }

    #[tokio::test]
    async fn test_simulated_media_outputs() {
        let backend = SimulatedBackend::new(Duration::ZERO);

        let image = backend
            .run("node-a", &make_workload(WorkloadKind::Image))
            .await
            .unwrap();
        assert!(image.output.ends_with(".png"));
        assert_eq!(image.metrics.tokens_generated, None);

        let video = backend
            .run("node-a", &make_workload(WorkloadKind::Video))
            .await
            .unwrap();
        assert!(video.output.ends_with(".mp4"));
    }
}
