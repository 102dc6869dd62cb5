use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{BrightDataError, Result};
use crate::shape::{classify, SnapshotShape};
use crate::types::{CompletedSnapshot, DatasetKind, JobState, ScrapeJob, TriggerInput};
use crate::ScrapeProvider;

/// Timing and acceptance thresholds for snapshot polling.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Delay between status checks while the job is running.
    pub poll_interval: Duration,
    /// Give up with `JobTimeout` once this much time has passed.
    pub max_wait: Duration,
    /// After this many attempts the interval widens to `extended_interval`.
    pub extended_after_attempts: u32,
    pub extended_interval: Duration,
    /// After this many attempts any object body is accepted as a partial result.
    pub accept_partial_after: u32,
    /// Delay after a transport or HTTP error before checking again.
    pub error_backoff: Duration,
    /// Treat an object without a `status` field as a finished single record.
    pub accept_bare_objects: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(20),
            max_wait: Duration::from_secs(60 * 60),
            extended_after_attempts: 100,
            extended_interval: Duration::from_secs(30),
            accept_partial_after: 150,
            error_backoff: Duration::from_secs(30),
            accept_bare_objects: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollPhase {
    Regular,
    Extended,
}

/// Outcome of one status check.
#[derive(Debug)]
enum Decision {
    Complete { payload: Value, partial: bool },
    Continue(Duration),
    Fail(String),
}

/// Submits snapshot jobs and drives them to a terminal state.
#[derive(Clone)]
pub struct JobPoller {
    provider: Arc<dyn ScrapeProvider>,
    policy: PollPolicy,
}

impl JobPoller {
    pub fn new(provider: Arc<dyn ScrapeProvider>, policy: PollPolicy) -> Self {
        Self { provider, policy }
    }

    /// Trigger a collection job for `urls`.
    pub async fn submit(&self, kind: DatasetKind, urls: &[String]) -> Result<ScrapeJob> {
        let inputs: Vec<TriggerInput> = urls.iter().map(TriggerInput::new).collect();
        let snapshot_id = self.provider.trigger(kind, &inputs).await?;
        info!(job_id = %snapshot_id, dataset = %kind, inputs = inputs.len(), "Snapshot job submitted");
        Ok(ScrapeJob::new(snapshot_id, kind))
    }

    /// Submit then poll to completion.
    pub async fn run(&self, kind: DatasetKind, urls: &[String]) -> Result<CompletedSnapshot> {
        let mut job = self.submit(kind, urls).await?;
        self.poll(&mut job).await
    }

    /// Poll `job` until the payload classifies as finished, the provider reports
    /// failure, or `max_wait` elapses. The first check is immediate.
    pub async fn poll(&self, job: &mut ScrapeJob) -> Result<CompletedSnapshot> {
        let started = Instant::now();
        let mut phase = PollPhase::Regular;
        job.state = JobState::Running;

        while started.elapsed() < self.policy.max_wait {
            job.attempts += 1;
            let attempt = job.attempts;

            let wait = match self.provider.snapshot(&job.id).await {
                Ok(payload) => {
                    if attempt % 10 == 1 {
                        debug!(job_id = %job.id, attempt, preview = %preview(&payload), "Snapshot body");
                    }
                    let shape = classify(payload);
                    debug!(job_id = %job.id, attempt, shape = shape.label(), "Snapshot status");

                    match self.decide(attempt, shape) {
                        Decision::Complete { payload, partial } => {
                            job.state = JobState::Ready;
                            if partial {
                                warn!(
                                    job_id = %job.id,
                                    attempt,
                                    "Accepting partial snapshot after attempt ceiling"
                                );
                            } else {
                                info!(job_id = %job.id, attempt, "Snapshot ready");
                            }
                            return Ok(CompletedSnapshot {
                                job_id: job.id.clone(),
                                payload,
                                attempts: attempt,
                                elapsed: started.elapsed(),
                                partial,
                            });
                        }
                        Decision::Fail(message) => {
                            job.state = JobState::Failed;
                            warn!(job_id = %job.id, attempt, %message, "Snapshot job failed");
                            return Err(BrightDataError::JobFailed {
                                job_id: job.id.clone(),
                                message,
                            });
                        }
                        Decision::Continue(wait) => wait,
                    }
                }
                Err(e) => {
                    warn!(job_id = %job.id, attempt, error = %e, "Snapshot check failed, backing off");
                    self.policy.error_backoff
                }
            };

            if phase == PollPhase::Regular && attempt > self.policy.extended_after_attempts {
                phase = PollPhase::Extended;
                info!(
                    job_id = %job.id,
                    attempt,
                    interval_secs = self.policy.extended_interval.as_secs(),
                    "Job still running, widening poll interval"
                );
            }

            tokio::time::sleep(wait).await;
        }

        job.state = JobState::TimedOut;
        Err(BrightDataError::JobTimeout {
            job_id: job.id.clone(),
            elapsed: started.elapsed(),
            attempts: job.attempts,
        })
    }

    fn decide(&self, attempt: u32, shape: SnapshotShape) -> Decision {
        let policy = &self.policy;
        match shape {
            SnapshotShape::Array(rows) => Decision::Complete {
                payload: Value::Array(rows),
                partial: false,
            },
            SnapshotShape::Wrapped(payload) => Decision::Complete {
                payload,
                partial: false,
            },
            SnapshotShape::Bare(payload) if policy.accept_bare_objects => Decision::Complete {
                payload,
                partial: false,
            },
            SnapshotShape::Failed { message } => Decision::Fail(message),
            SnapshotShape::Bare(payload) | SnapshotShape::Pending { payload, .. } => {
                if attempt >= policy.accept_partial_after && payload.is_object() {
                    Decision::Complete {
                        payload,
                        partial: true,
                    }
                } else if attempt > policy.extended_after_attempts {
                    Decision::Continue(policy.extended_interval)
                } else {
                    Decision::Continue(policy.poll_interval)
                }
            }
        }
    }
}

fn preview(payload: &Value) -> String {
    let text = payload.to_string();
    match text.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}
