//! Cross-file parallel batch processing (SPEC_FULL.md §4.H, §5). The
//! primary concurrency source is cross-file parallelism: each file gets its
//! own spawned `tokio` task, with the actual parse/analyze/format work run
//! inside `spawn_blocking` since it's synchronous CPU-bound code that must
//! never stall the reactor. Per-file results land in a `dashmap::DashMap`,
//! mirroring the corpus's `all_violations: DashMap<PathBuf, Vec<...>>`
//! aggregation in `lib.rs::run`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Semaphore;

use crate::pipeline::{Pipeline, PipelineOutcome};
use crate::rule::RuleConfiguration;

/// Default memory budget for the whole batch when no operator override is
/// supplied and the host's available memory can't be queried.
const DEFAULT_AVAILABLE_MEMORY_BYTES: u64 = 512 * 1024 * 1024;

/// Assumed size for a file whose on-disk size can't be read (e.g. it's
/// missing) — just enough to reserve something sane before the pipeline's
/// own read stage reports the real error.
const FALLBACK_FILE_BYTES: u64 = 64 * 1024;

/// How long admission waits once the reservation pool is saturated, to let
/// in-flight tasks release memory back (§4.H "throttle pause").
const THROTTLE_PAUSE: Duration = Duration::from_millis(100);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorStrategy {
    FailFast,
    Continue,
    AbortAfterThreshold(usize),
}

impl Default for ErrorStrategy {
    fn default() -> Self {
        ErrorStrategy::Continue
    }
}

/// A byte-budgeted admission pool: the semaphore's permits *are* bytes, so
/// each reservation's weight (SPEC_FULL.md §4.H) is the file's own on-disk
/// size rather than a flat per-task slot. Reservations pause briefly first
/// if the pool is already saturated, and a request for more bytes than the
/// whole pool holds is clamped to the pool's total budget so a single huge
/// file is still admitted (using the entire pool) instead of blocking
/// forever waiting for permits that can never exist.
struct MemoryReservationManager {
    semaphore: Arc<Semaphore>,
    total_budget_bytes: u64,
}

impl MemoryReservationManager {
    fn new(total_budget_bytes: u64) -> Self {
        let total_budget_bytes = total_budget_bytes.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(total_budget_bytes as usize)),
            total_budget_bytes,
        }
    }

    /// Reserves a byte budget equal to `file_bytes` (clamped to the pool's
    /// total budget), pausing briefly first if the pool doesn't currently
    /// have that many bytes free, to let in-flight tasks release memory
    /// back under pressure.
    async fn reserve(&self, file_bytes: u64) -> ReservationGuard {
        let permits = file_bytes.clamp(1, self.total_budget_bytes) as u32;
        if (self.semaphore.available_permits() as u64) < permits as u64 {
            tokio::time::sleep(THROTTLE_PAUSE).await;
        }
        let permit = Arc::clone(&self.semaphore)
            .acquire_many_owned(permits)
            .await
            .expect("semaphore is never closed");
        ReservationGuard { _permit: permit }
    }
}

/// RAII guard: memory is released back to the pool (semaphore permits
/// returned) on drop, mirroring the corpus's scoped-fixer-on-exit idiom.
struct ReservationGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

#[derive(Clone)]
pub struct BatchConfig {
    pub memory_budget_bytes: u64,
    pub error_strategy: ErrorStrategy,
}

impl BatchConfig {
    pub fn with_available_memory(available_memory_bytes: u64, error_strategy: ErrorStrategy) -> Self {
        Self { memory_budget_bytes: available_memory_bytes.max(1), error_strategy }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::with_available_memory(DEFAULT_AVAILABLE_MEMORY_BYTES, ErrorStrategy::default())
    }
}

pub struct BatchResult {
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub per_file_results: Vec<(PathBuf, PipelineOutcome)>,
    pub errors: Vec<(PathBuf, String)>,
    pub duration: Duration,
    pub throughput_files_per_second: f64,
}

/// Cooperative cancellation flag, polled by each in-flight task before
/// submitting new work and surfaced to the pipeline's deadline mechanism.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BatchProcessor {
    pipeline: Arc<Pipeline>,
    config: BatchConfig,
}

impl BatchProcessor {
    pub fn new(pipeline: Pipeline, config: BatchConfig) -> Self {
        Self { pipeline: Arc::new(pipeline), config }
    }

    /// Runs `files` to completion, fanning each out onto its own task.
    /// `configurations` is shared, immutable, read-only data across every
    /// task (SPEC_FULL.md §5 "tasks share only immutable data").
    pub async fn run(
        &self,
        files: &[PathBuf],
        configurations: Arc<Vec<RuleConfiguration>>,
        cancellation: CancellationToken,
    ) -> BatchResult {
        let started = Instant::now();
        let total = files.len();
        let results: DashMap<PathBuf, PipelineOutcome> = DashMap::new();
        let errors: DashMap<PathBuf, String> = DashMap::new();
        let reservations = Arc::new(MemoryReservationManager::new(self.config.memory_budget_bytes));
        let error_count = Arc::new(AtomicUsize::new(0));
        let stop_submitting = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(total);
        let mut submitted = 0usize;
        for path in files {
            if cancellation.is_cancelled() || stop_submitting.load(Ordering::SeqCst) {
                break;
            }
            submitted += 1;

            let pipeline = Arc::clone(&self.pipeline);
            let configurations = Arc::clone(&configurations);
            let reservations = Arc::clone(&reservations);
            let path = path.clone();
            let strategy = self.config.error_strategy;
            let error_count = Arc::clone(&error_count);
            let stop_submitting = Arc::clone(&stop_submitting);
            let cancellation = cancellation.clone();

            let handle = tokio::spawn(async move {
                let file_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(FALLBACK_FILE_BYTES);
                let _reservation = reservations.reserve(file_bytes).await;
                if cancellation.is_cancelled() {
                    return (path, Err("cancelled before execution".to_string()));
                }

                let result = tokio::task::spawn_blocking(move || {
                    pipeline.run_file(&path, &configurations)
                })
                .await;

                match result {
                    Ok(outcome) => {
                        if !outcome.overall_success {
                            let n = error_count.fetch_add(1, Ordering::SeqCst) + 1;
                            match strategy {
                                ErrorStrategy::FailFast => stop_submitting.store(true, Ordering::SeqCst),
                                ErrorStrategy::AbortAfterThreshold(k) if n >= k => {
                                    stop_submitting.store(true, Ordering::SeqCst)
                                }
                                _ => {}
                            }
                        }
                        (outcome.path.clone(), Ok(outcome))
                    }
                    Err(join_err) => (PathBuf::new(), Err(format!("task panicked: {join_err}"))),
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            match handle.await {
                Ok((path, Ok(outcome))) => {
                    if !outcome.overall_success {
                        errors.insert(path.clone(), "pipeline stage failed".to_string());
                    }
                    results.insert(path, outcome);
                }
                Ok((path, Err(message))) => {
                    errors.insert(path, message);
                }
                Err(join_err) => {
                    errors.insert(PathBuf::new(), format!("join error: {join_err}"));
                }
            }
        }

        // Files past an early FailFast/AbortAfterThreshold stop were never
        // submitted; they still count against `total` so the invariant
        // `success_count + failure_count == total` holds unconditionally.
        for path in &files[submitted..] {
            errors.insert(path.clone(), "not submitted: batch stopped after prior error".to_string());
        }

        let success_count = results.iter().filter(|entry| entry.value().overall_success).count();
        let failure_count = total - success_count;
        let duration = started.elapsed();
        let throughput = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            total as f64
        };

        BatchResult {
            total,
            success_count,
            failure_count,
            per_file_results: results.into_iter().collect(),
            errors: errors.into_iter().collect(),
            duration,
            throughput_files_per_second: throughput,
        }
    }
}

pub fn resolve_classpath_list(raw: Option<&str>) -> Vec<PathBuf> {
    match raw {
        None => Vec::new(),
        Some(s) if s.is_empty() => Vec::new(),
        Some(s) => std::env::split_paths(s).map(PathBuf::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{RuleEngine, TypeResolutionConfig};
    use crate::security::SecurityConfig;
    use std::io::Write;

    fn test_pipeline() -> Pipeline {
        Pipeline::new(
            RuleEngine::with_defaults(),
            SecurityConfig::default(),
            TypeResolutionConfig::default(),
            crate::pipeline::RecoveryStrategy::FailFast,
            true,
        )
    }

    #[tokio::test]
    async fn runs_all_files_and_counts_match_invariant() {
        let mut files = Vec::new();
        let mut handles = Vec::new();
        for i in 0..3 {
            let mut f = tempfile::NamedTempFile::new().unwrap();
            writeln!(f, "class Foo{i} {{}}").unwrap();
            files.push(f.path().to_path_buf());
            handles.push(f);
        }

        let processor = BatchProcessor::new(test_pipeline(), BatchConfig::default());
        let result = processor
            .run(&files, Arc::new(Vec::new()), CancellationToken::new())
            .await;

        assert_eq!(result.total, 3);
        assert_eq!(result.success_count + result.failure_count, result.total);
    }

    #[tokio::test]
    async fn missing_file_counts_as_failure_without_stopping_others() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "class Foo {{}}").unwrap();
        let files = vec![PathBuf::from("/does/not/exist.java"), good.path().to_path_buf()];

        let processor = BatchProcessor::new(test_pipeline(), BatchConfig::default());
        let result = processor
            .run(&files, Arc::new(Vec::new()), CancellationToken::new())
            .await;

        assert_eq!(result.total, 2);
        assert_eq!(result.failure_count, 1);
        assert_eq!(result.success_count, 1);
    }

    #[test]
    fn classpath_list_splits_on_platform_separator() {
        let sep = if cfg!(windows) { ';' } else { ':' };
        let raw = format!("a{sep}b");
        let parsed = resolve_classpath_list(Some(&raw));
        assert_eq!(parsed, vec![PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn empty_classpath_value_yields_empty_list() {
        assert!(resolve_classpath_list(Some("")).is_empty());
    }
}
