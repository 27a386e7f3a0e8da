//! Bounded job executor.
//!
//! Jobs are spawned onto the runtime immediately and wait on a semaphore for
//! one of `max_concurrent_jobs` encode slots. The number of jobs that may
//! wait is capped too, so a burst of requests cannot pile up unbounded
//! subprocesses and open files.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use zclip_models::RenderJob;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::pipeline::{JobOutcome, RenderPipeline};

/// Handle to a submitted job.
///
/// Dropping it detaches the job; it keeps running to completion.
#[derive(Debug)]
pub struct JobHandle {
    record_id: String,
    handle: JoinHandle<WorkerResult<JobOutcome>>,
}

impl JobHandle {
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// Wait for the job to reach a terminal state.
    pub async fn wait(self) -> WorkerResult<JobOutcome> {
        self.handle
            .await
            .map_err(|e| WorkerError::JobPanicked(e.to_string()))?
    }
}

/// Decrements the pending count when a job task ends, even by panic.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let remaining = self.0.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_jobs_in_flight(remaining);
    }
}

/// Job executor that runs render jobs off the request path.
pub struct JobExecutor {
    pipeline: Arc<RenderPipeline>,
    job_semaphore: Arc<Semaphore>,
    max_concurrent_jobs: usize,
    max_pending_jobs: usize,
    pending: Arc<AtomicUsize>,
    shutdown: watch::Sender<bool>,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: &WorkerConfig, pipeline: RenderPipeline) -> Self {
        let max_concurrent_jobs = config.max_concurrent_jobs.max(1);
        let (shutdown, _) = watch::channel(false);

        info!(
            "Creating job executor with {} concurrent slots and {} queued",
            max_concurrent_jobs, config.max_queued_jobs
        );

        Self {
            pipeline: Arc::new(pipeline),
            job_semaphore: Arc::new(Semaphore::new(max_concurrent_jobs)),
            max_concurrent_jobs,
            max_pending_jobs: max_concurrent_jobs + config.max_queued_jobs,
            pending: Arc::new(AtomicUsize::new(0)),
            shutdown,
        }
    }

    /// Create an executor backed by FFmpeg and the HTTP webhook client.
    pub fn from_config(config: &WorkerConfig) -> WorkerResult<Self> {
        Ok(Self::new(config, RenderPipeline::from_config(config)?))
    }

    /// Submit a job without waiting for it.
    ///
    /// Fails fast when the pool is shutting down or saturated.
    pub fn submit(&self, job: RenderJob) -> WorkerResult<JobHandle> {
        if *self.shutdown.borrow() {
            metrics::record_job_rejected("shutting_down");
            return Err(WorkerError::ShuttingDown);
        }

        let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
        if pending > self.max_pending_jobs {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            metrics::record_job_rejected("saturated");
            warn!(
                record_id = %job.record_id,
                pending = pending - 1,
                limit = self.max_pending_jobs,
                "Worker pool saturated, rejecting job"
            );
            return Err(WorkerError::PoolSaturated {
                pending: pending - 1,
                limit: self.max_pending_jobs,
            });
        }

        metrics::record_job_submitted();
        metrics::set_jobs_in_flight(pending);

        let record_id = job.record_id.clone();
        let guard = PendingGuard(Arc::clone(&self.pending));
        let semaphore = Arc::clone(&self.job_semaphore);
        let pipeline = Arc::clone(&self.pipeline);
        let span = JobLogger::new(&record_id, "executor").create_span();

        let handle = tokio::spawn(
            async move {
                let _guard = guard;
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| WorkerError::ShuttingDown)?;

                debug!("Acquired encode slot");
                Self::execute_job(&pipeline, &job).await
            }
            .instrument(span),
        );

        Ok(JobHandle { record_id, handle })
    }

    /// Execute a single job and log how it ended.
    async fn execute_job(pipeline: &RenderPipeline, job: &RenderJob) -> WorkerResult<JobOutcome> {
        let result = pipeline.run(job).await;

        match &result {
            Ok(outcome) => info!(outcome = outcome.as_str(), "Job finished"),
            Err(e) => error!("Job aborted: {}", e),
        }

        result
    }

    /// Jobs submitted and not yet finished (running or waiting for a slot).
    pub fn pending_jobs(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Jobs currently holding an encode slot.
    pub fn running_jobs(&self) -> usize {
        self.max_concurrent_jobs - self.job_semaphore.available_permits()
    }

    /// Most jobs that may be pending before submissions are refused.
    pub fn capacity(&self) -> usize {
        self.max_pending_jobs
    }

    /// False once shutdown has begun.
    pub fn is_accepting(&self) -> bool {
        !*self.shutdown.borrow()
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        while self.pending.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Stop accepting jobs and wait for in-flight ones, up to `timeout`.
    ///
    /// Running jobs are never cancelled. Returns `true` if everything drained.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        let _ = self.shutdown.send(true);

        info!("Waiting for {} in-flight jobs to complete...", self.pending_jobs());
        let drained = tokio::time::timeout(timeout, self.wait_for_jobs()).await.is_ok();

        if drained {
            info!("Job executor stopped");
        } else {
            warn!(
                "Shutdown timed out with {} jobs still pending",
                self.pending_jobs()
            );
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Encoder, MockNotifier};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::path::PathBuf;
    use zclip_media::{EncodeOutput, FfmpegCommand, MediaResult};

    /// Encoder that sleeps and records the peak number of concurrent calls.
    struct SlowEncoder {
        delay: Duration,
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl SlowEncoder {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Encoder for SlowEncoder {
        async fn encode(&self, _command: &FfmpegCommand) -> MediaResult<EncodeOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(EncodeOutput {
                stdout: String::new(),
                stderr: String::new(),
                elapsed: self.delay,
            })
        }
    }

    fn job(record_id: &str) -> RenderJob {
        RenderJob {
            record_id: record_id.to_string(),
            input_path: PathBuf::from("cache/in.jpg"),
            input_width: 1024,
            input_height: 1024,
            output_width: 1024,
            output_height: 1024,
            framerate: 25,
            duration_secs: 2,
            zoom_percent: 0,
            crop_enabled: false,
            output_path: PathBuf::from(format!("key/{}.mp4", record_id)),
            webhook_url: "https://hooks.example.com/done".to_string(),
            callback_host: "localhost".to_string(),
            created_at: Utc::now(),
        }
    }

    fn executor(encoder: Arc<SlowEncoder>, max_jobs: usize, max_queued: usize) -> JobExecutor {
        let config = WorkerConfig {
            max_concurrent_jobs: max_jobs,
            max_queued_jobs: max_queued,
            ..WorkerConfig::default()
        };
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().returning(|_, _| Ok(()));
        let pipeline = RenderPipeline::new(&config, encoder, Arc::new(notifier));
        JobExecutor::new(&config, pipeline)
    }

    #[tokio::test]
    async fn test_submit_returns_before_job_finishes() {
        let encoder = SlowEncoder::new(Duration::from_millis(200));
        let executor = executor(Arc::clone(&encoder), 1, 4);

        let handle = executor.submit(job("a1")).unwrap();
        assert_eq!(handle.record_id(), "a1");
        assert_eq!(executor.pending_jobs(), 1);

        let outcome = handle.wait().await.unwrap();
        assert!(matches!(outcome, JobOutcome::Completed { .. }));
        assert_eq!(executor.pending_jobs(), 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let encoder = SlowEncoder::new(Duration::from_millis(100));
        let executor = executor(Arc::clone(&encoder), 2, 10);

        let handles: Vec<_> = (0..6)
            .map(|i| executor.submit(job(&format!("j{}", i))).unwrap())
            .collect();
        for handle in handles {
            handle.wait().await.unwrap();
        }

        assert_eq!(encoder.calls.load(Ordering::SeqCst), 6);
        assert!(encoder.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(executor.running_jobs(), 0);
    }

    #[tokio::test]
    async fn test_saturated_pool_rejects() {
        let encoder = SlowEncoder::new(Duration::from_millis(300));
        let executor = executor(Arc::clone(&encoder), 1, 1);

        let first = executor.submit(job("s1")).unwrap();
        let second = executor.submit(job("s2")).unwrap();
        let err = executor.submit(job("s3")).unwrap_err();

        assert_eq!(executor.capacity(), 2);
        assert_eq!(executor.pending_jobs(), executor.capacity());
        assert!(matches!(err, WorkerError::PoolSaturated { pending: 2, limit: 2 }));
        assert!(err.is_rejection());

        first.wait().await.unwrap();
        second.wait().await.unwrap();
        assert!(executor.submit(job("s4")).is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_running_jobs() {
        let encoder = SlowEncoder::new(Duration::from_millis(150));
        let executor = executor(Arc::clone(&encoder), 2, 4);

        let _detached = executor.submit(job("d1")).unwrap();
        assert!(executor.is_accepting());
        let drained = executor.shutdown(Duration::from_secs(5)).await;

        assert!(drained);
        assert!(!executor.is_accepting());
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            executor.submit(job("late")),
            Err(WorkerError::ShuttingDown)
        ));
    }

    #[tokio::test]
    async fn test_contract_violation_surfaces_through_handle() {
        let encoder = SlowEncoder::new(Duration::from_millis(10));
        let executor = executor(Arc::clone(&encoder), 1, 1);

        let bad = RenderJob {
            output_width: 0,
            ..job("bad")
        };
        let err = executor.submit(bad).unwrap().wait().await.unwrap_err();

        assert!(err.is_contract_violation());
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
    }
}
