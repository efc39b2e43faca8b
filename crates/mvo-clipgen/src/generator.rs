//! The Clip Generator (§4.6, Phase 5 core): bounded-concurrency map over
//! per-clip generation jobs with per-item retry and fallback backend on
//! failure.

use std::sync::Arc;

use mvo_models::{ClipDesign, ClipResult, GenerationStrategy};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::ClipGenConfig;
use crate::selector::BackendSelector;
use crate::BackendClient;

pub struct ClipGenerator {
    config: ClipGenConfig,
    selector: Arc<BackendSelector>,
    client: Arc<dyn BackendClient>,
}

impl ClipGenerator {
    pub fn new(config: ClipGenConfig, selector: BackendSelector, client: Arc<dyn BackendClient>) -> Self {
        Self {
            config,
            selector: Arc::new(selector),
            client,
        }
    }

    /// Generate every clip in `designs`, preserving `clip_id` order in the
    /// returned results regardless of completion order (C2). Exactly one
    /// semaphore of capacity `max_parallel` bounds concurrency (§4.6, §9).
    pub async fn generate_all(
        &self,
        designs: &[ClipDesign],
        strategies: &[Option<GenerationStrategy>],
    ) -> Vec<ClipResult> {
        let total = designs.len();
        info!(total, max_parallel = self.config.max_parallel, "starting clip generation");

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel.max(1)));
        let mut handles = Vec::with_capacity(total);

        for (index, design) in designs.iter().cloned().enumerate() {
            let strategy = strategies.get(index).cloned().flatten();
            let permit = Arc::clone(&semaphore);
            let selector = Arc::clone(&self.selector);
            let client = Arc::clone(&self.client);
            let max_retries = self.config.max_retries;
            let output_dir = std::path::PathBuf::from(&self.config.output_dir);

            handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await;
                generate_one_clip(&design, strategy.as_ref(), &selector, client, max_retries, &output_dir).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (handle, design) in handles.into_iter().zip(designs.iter()) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => results.push(ClipResult {
                    clip_id: design.clip_id,
                    success: false,
                    output_path: None,
                    backend_name: String::new(),
                    attempts: 0,
                    error: Some(e.to_string()),
                }),
            }
        }

        results.sort_by_key(|r| r.clip_id);

        let successful = results.iter().filter(|r| r.success).count();
        info!(successful, total, "clip generation complete");

        results
    }
}

/// Per-clip algorithm (§4.6): pick a backend via the Selector, retry up
/// to `max_retries` times, switching to the strategy's fallback backend
/// on a mid-run failure if one is named and available.
async fn generate_one_clip(
    design: &ClipDesign,
    strategy: Option<&GenerationStrategy>,
    selector: &BackendSelector,
    client: Arc<dyn BackendClient>,
    max_retries: u32,
    output_dir: &std::path::Path,
) -> ClipResult {
    let preferred = strategy.and_then(|s| s.preferred_mcp.as_deref());
    let Some(initial_backend) = selector.select_best(design, preferred) else {
        return ClipResult {
            clip_id: design.clip_id,
            success: false,
            output_path: None,
            backend_name: String::new(),
            attempts: 0,
            error: Some("no backend available".to_string()),
        };
    };

    let mut backend = initial_backend.clone();
    let mut last_error = String::new();

    for attempt in 1..=max_retries.max(1) {
        match client.generate(&backend, design, output_dir).await {
            Ok(path) => {
                return ClipResult {
                    clip_id: design.clip_id,
                    success: true,
                    output_path: Some(path.to_string_lossy().into_owned()),
                    backend_name: backend.name.clone(),
                    attempts: attempt,
                    error: None,
                };
            }
            Err(e) => {
                warn!(clip_id = design.clip_id, attempt, backend = %backend.name, error = %e, "clip generation attempt failed");
                last_error = e.to_string();

                if attempt < max_retries.max(1) {
                    if let Some(fallback_name) = strategy
                        .and_then(|s| s.fallback_strategy.as_ref())
                        .map(|f| f.alternative_mcp.as_str())
                    {
                        if let Some(fallback) = selector.get_by_name(fallback_name) {
                            if fallback.available {
                                info!(clip_id = design.clip_id, fallback = fallback_name, "switching to fallback backend");
                                backend = fallback.clone();
                            }
                        }
                    }
                }
            }
        }
    }

    ClipResult {
        clip_id: design.clip_id,
        success: false,
        output_path: None,
        backend_name: backend.name,
        attempts: max_retries.max(1),
        error: Some(last_error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mvo_models::{BackendProfile, FallbackStrategy};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fails for a configured backend name on its first call, succeeds
    /// thereafter; records concurrent-in-flight high-water mark.
    struct FlakyClient {
        fail_backend_once: String,
        already_failed: Mutex<std::collections::HashSet<u32>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FlakyClient {
        fn new(fail_backend_once: &str) -> Self {
            Self {
                fail_backend_once: fail_backend_once.to_string(),
                already_failed: Mutex::new(std::collections::HashSet::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BackendClient for FlakyClient {
        async fn generate(
            &self,
            backend: &BackendProfile,
            design: &ClipDesign,
            _output_dir: &Path,
        ) -> Result<PathBuf, crate::error::ClipGenError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if backend.name == self.fail_backend_once {
                let mut failed = self.already_failed.lock().unwrap();
                if failed.insert(design.clip_id) {
                    return Err(crate::error::ClipGenError::SubprocessFailed("flaky".to_string()));
                }
            }

            Ok(PathBuf::from(format!("/tmp/clip_{}_{}.mp4", design.clip_id, backend.name)))
        }
    }

    fn backend(name: &str, priority: u32) -> BackendProfile {
        BackendProfile {
            name: name.to_string(),
            endpoint: format!("mcp://{name}"),
            capabilities: vec!["general".to_string()],
            priority,
            cost_per_clip: 1.0,
            available: true,
        }
    }

    fn design(id: u32) -> ClipDesign {
        ClipDesign {
            clip_id: id,
            start_time: 0.0,
            end_time: 4.0,
            duration: 4.0,
            section: "verse".to_string(),
            prompt: "a plain cinematic shot".to_string(),
            strategy: None,
        }
    }

    #[tokio::test]
    async fn results_are_sorted_by_clip_id_regardless_of_completion_order() {
        let selector = BackendSelector::new(vec![backend("A", 1)]);
        let client: Arc<dyn BackendClient> = Arc::new(FlakyClient::new("never"));
        let generator = ClipGenerator::new(
            ClipGenConfig {
                max_parallel: 2,
                ..Default::default()
            },
            selector,
            client,
        );

        let designs = vec![design(5), design(1), design(3)];
        let results = generator.generate_all(&designs, &[None, None, None]).await;

        let ids: Vec<u32> = results.iter().map(|r| r.clip_id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn retry_with_fallback_backend_succeeds_on_second_attempt() {
        let selector = BackendSelector::new(vec![backend("A", 1), backend("B", 2)]);
        let client: Arc<dyn BackendClient> = Arc::new(FlakyClient::new("A"));
        let generator = ClipGenerator::new(ClipGenConfig::default(), selector, client);

        let strategy = GenerationStrategy {
            preferred_mcp: Some("A".to_string()),
            fallback_strategy: Some(FallbackStrategy {
                alternative_mcp: "B".to_string(),
            }),
        };

        let results = generator.generate_all(&[design(3)], &[Some(strategy)]).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert_eq!(results[0].backend_name, "B");
        assert_eq!(results[0].attempts, 2);
    }

    #[tokio::test]
    async fn exhausting_retries_returns_failure_result() {
        struct AlwaysFails;
        #[async_trait]
        impl BackendClient for AlwaysFails {
            async fn generate(
                &self,
                _backend: &BackendProfile,
                _design: &ClipDesign,
                _output_dir: &Path,
            ) -> Result<PathBuf, crate::error::ClipGenError> {
                Err(crate::error::ClipGenError::SubprocessFailed("down".to_string()))
            }
        }

        let selector = BackendSelector::new(vec![backend("A", 1)]);
        let client: Arc<dyn BackendClient> = Arc::new(AlwaysFails);
        let generator = ClipGenerator::new(
            ClipGenConfig {
                max_retries: 2,
                ..Default::default()
            },
            selector,
            client,
        );

        let results = generator.generate_all(&[design(1)], &[None]).await;
        assert!(!results[0].success);
        assert_eq!(results[0].attempts, 2);
        assert!(results[0].error.is_some());
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_max_parallel() {
        let selector = BackendSelector::new(vec![backend("A", 1)]);
        let flaky = Arc::new(FlakyClient::new("never"));
        let client: Arc<dyn BackendClient> = flaky.clone();
        let generator = ClipGenerator::new(
            ClipGenConfig {
                max_parallel: 2,
                ..Default::default()
            },
            selector,
            client,
        );

        let designs: Vec<ClipDesign> = (1..=6).map(design).collect();
        let strategies = vec![None; 6];
        let _ = generator.generate_all(&designs, &strategies).await;

        assert!(flaky.max_in_flight.load(Ordering::SeqCst) <= 2);
    }
}
