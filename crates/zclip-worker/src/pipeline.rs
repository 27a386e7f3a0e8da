//! Per-job render pipeline: encode, then notify.
//!
//! The request layer has already validated the parameters and cached the
//! source image, so a job enters here in the `Downloading` state and leaves
//! in exactly one terminal state. Nothing is retried.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tracing::Instrument;

use zclip_media::{
    create_render_command, EncodeOutput, FfmpegCommand, FfmpegRunner, FilterGraph, FilterOptions,
    MediaResult,
};
use zclip_models::{JobState, RenderJob, WebhookPayload};
use zclip_webhook::{artifact_url, ArtifactUrlConfig, WebhookClient, WebhookResult};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobTracker;
use crate::metrics;

/// Runs the external encoder.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, command: &FfmpegCommand) -> MediaResult<EncodeOutput>;
}

#[async_trait]
impl Encoder for FfmpegRunner {
    async fn encode(&self, command: &FfmpegCommand) -> MediaResult<EncodeOutput> {
        self.run(command).await
    }
}

/// Delivers the completion callback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, webhook_url: &str, payload: &WebhookPayload) -> WebhookResult<()>;
}

#[async_trait]
impl Notifier for WebhookClient {
    async fn notify(&self, webhook_url: &str, payload: &WebhookPayload) -> WebhookResult<()> {
        WebhookClient::notify(self, webhook_url, payload).await
    }
}

/// Terminal result of a job that made it through the contract check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed {
        artifact_url: String,
        artifact_path: PathBuf,
    },
    EncodeFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },
    /// The artifact was rendered but the caller was never told about it.
    NotifyFailed {
        artifact_path: PathBuf,
        artifact_url: Option<String>,
        error: String,
    },
}

impl JobOutcome {
    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Completed { .. } => JobState::Completed,
            JobOutcome::EncodeFailed { .. } => JobState::EncodeFailed,
            JobOutcome::NotifyFailed { .. } => JobState::NotifyFailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.state().as_str()
    }
}

/// Drives a single render job through encoding and notification.
pub struct RenderPipeline {
    encoder: Arc<dyn Encoder>,
    notifier: Arc<dyn Notifier>,
    filter_options: FilterOptions,
    output_root: PathBuf,
    artifact: ArtifactUrlConfig,
}

impl RenderPipeline {
    /// Create a pipeline with explicit collaborators.
    pub fn new(config: &WorkerConfig, encoder: Arc<dyn Encoder>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            encoder,
            notifier,
            filter_options: config.filter_options(),
            output_root: config.output_root.clone(),
            artifact: config.artifact.clone(),
        }
    }

    /// Create a pipeline backed by FFmpeg and the HTTP webhook client.
    pub fn from_config(config: &WorkerConfig) -> WorkerResult<Self> {
        let mut runner = FfmpegRunner::new().with_binary(config.ffmpeg_bin.clone());
        if let Some(timeout) = config.encode_timeout {
            runner = runner.with_timeout(timeout.as_secs());
        }
        let notifier = WebhookClient::new(config.webhook.clone())?;

        Ok(Self::new(config, Arc::new(runner), Arc::new(notifier)))
    }

    /// Absolute (or cwd-relative) location of a job's artifact.
    pub fn output_file(&self, job: &RenderJob) -> PathBuf {
        self.output_root.join(&job.output_path)
    }

    /// Run the job to a terminal state.
    ///
    /// Returns `Err` only for a contract violation, which is raised before
    /// any subprocess is spawned. Encode and notify failures are terminal
    /// outcomes, not errors.
    pub async fn run(&self, job: &RenderJob) -> WorkerResult<JobOutcome> {
        let mut tracker = JobTracker::resume(&job.record_id, "render", JobState::Downloading);
        let span = tracker.logger().create_span();

        async move {
            tracker.advance(JobState::Encoding);

            if let Err(violation) = job.check_contract() {
                tracker
                    .logger()
                    .log_error(&format!("Contract violation, refusing to encode: {}", violation));
                metrics::record_contract_violation();
                return Err(WorkerError::contract_violation(&job.record_id, violation));
            }

            let output = self.output_file(job);
            let graph = FilterGraph::build(job, &self.filter_options);
            let command = create_render_command(
                job,
                &output,
                &graph.to_filter_string(),
                &self.filter_options.pixel_format,
            );
            tracker.logger().log_start(&format!("encoding with filter graph {}", graph));

            let started = Instant::now();
            match self.encoder.encode(&command).await {
                Ok(encoded) => {
                    metrics::record_ffmpeg_duration(true, started.elapsed().as_secs_f64());
                    tracker.logger().log_progress(&format!(
                        "encoded {} in {:.2}s",
                        output.display(),
                        encoded.elapsed.as_secs_f64()
                    ));
                }
                Err(e) => {
                    metrics::record_ffmpeg_duration(false, started.elapsed().as_secs_f64());
                    tracker.advance(JobState::EncodeFailed);
                    tracker.logger().log_error(&format!(
                        "encode failed (exit code {:?}): {}; stderr: {}",
                        e.exit_code(),
                        e,
                        e.stderr().unwrap_or("").trim()
                    ));
                    return Ok(self.finish(JobOutcome::EncodeFailed {
                        message: e.to_string(),
                        stderr: e.stderr().map(str::to_string),
                        exit_code: e.exit_code(),
                    }));
                }
            }

            tracker.advance(JobState::Notifying);

            let url = match artifact_url(&self.artifact, &job.callback_host, &job.output_path) {
                Ok(url) => url,
                Err(e) => {
                    tracker.advance(JobState::NotifyFailed);
                    tracker.logger().log_error(&format!(
                        "cannot build artifact URL, artifact left at {}: {}",
                        output.display(),
                        e
                    ));
                    return Ok(self.finish(JobOutcome::NotifyFailed {
                        artifact_path: output,
                        artifact_url: None,
                        error: e.to_string(),
                    }));
                }
            };

            let payload = WebhookPayload {
                record_id: job.record_id.clone(),
                filename: url.clone(),
            };

            let started = Instant::now();
            let delivered = self.notifier.notify(&job.webhook_url, &payload).await;
            metrics::record_webhook_duration(delivered.is_ok(), started.elapsed().as_secs_f64());

            match delivered {
                Ok(()) => {
                    tracker.advance(JobState::Completed);
                    tracker.logger().log_completion(&url);
                    Ok(self.finish(JobOutcome::Completed {
                        artifact_url: url,
                        artifact_path: output,
                    }))
                }
                Err(e) => {
                    tracker.advance(JobState::NotifyFailed);
                    tracker.logger().log_error(&format!(
                        "webhook failed, artifact left at {}: {}",
                        output.display(),
                        e
                    ));
                    Ok(self.finish(JobOutcome::NotifyFailed {
                        artifact_path: output,
                        artifact_url: Some(url),
                        error: e.to_string(),
                    }))
                }
            }
        }
        .instrument(span)
        .await
    }

    fn finish(&self, outcome: JobOutcome) -> JobOutcome {
        metrics::record_job_outcome(outcome.as_str());
        outcome
    }
}
