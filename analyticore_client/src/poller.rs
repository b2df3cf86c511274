//! Client-side submit/poll state machine.
//!
//! A [`PollingSession`] walks `Form → Submitting → Polling → Results | Error`.
//! Polls run one at a time on a fixed interval and stop as soon as the job
//! reaches a terminal state, a request fails, or the session is cancelled.

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::gateway::GatewayClient;
use crate::validation::{validate_text, ValidationError};
use crate::{Analysis, ClientError, JobRecord, JobStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub const SUBMIT_ERROR: &str =
    "Could not connect to the server. Check that the backend is running.";
pub const ANALYSIS_ERROR: &str = "Error during text analysis";
pub const POLLING_ERROR: &str = "Connection error during analysis";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    Form,
    Submitting,
    Polling {
        job_id: String,
    },
    Results {
        job_id: String,
        analysis: Analysis,
        text: String,
    },
    Error {
        message: String,
    },
}

impl AppState {
    fn error(message: &str) -> Self {
        AppState::Error {
            message: message.to_string(),
        }
    }
}

pub struct PollingSession {
    gateway: GatewayClient,
    interval: Duration,
    state: AppState,
    text: String,
    last_record: Option<JobRecord>,
}

impl PollingSession {
    pub fn new(gateway: GatewayClient) -> Self {
        Self {
            gateway,
            interval: DEFAULT_POLL_INTERVAL,
            state: AppState::Form,
            text: String::new(),
            last_record: None,
        }
    }

    /// Sets the poll period, clamped to [`MIN_POLL_INTERVAL`].
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// The terminal record observed by the last run, if any.
    pub fn last_record(&self) -> Option<&JobRecord> {
        self.last_record.as_ref()
    }

    /// Back to an empty form.
    pub fn reset(&mut self) {
        self.state = AppState::Form;
        self.text.clear();
        self.last_record = None;
    }

    /// Back to the form, keeping the text for another attempt.
    pub fn retry(&mut self) {
        self.state = AppState::Form;
        self.last_record = None;
    }

    /// Submits the current text and polls until the job settles.
    ///
    /// `on_change` sees every state the session enters. Validation failures
    /// leave the session in `Form` and are returned as errors; everything else
    /// ends in `Results`, `Error`, or `Form` when `cancel` fires.
    pub async fn run<F>(
        &mut self,
        cancel: &CancellationToken,
        mut on_change: F,
    ) -> Result<&AppState, ValidationError>
    where
        F: FnMut(&AppState),
    {
        let text = validate_text(&self.text)?.to_string();
        self.last_record = None;
        self.enter(AppState::Submitting, &mut on_change);

        let submitted = tokio::select! {
            _ = cancel.cancelled() => None,
            result = self.gateway.submit(&text) => Some(result),
        };
        let job_id = match submitted {
            None => {
                self.enter(AppState::Form, &mut on_change);
                return Ok(&self.state);
            }
            Some(Ok(job_id)) => job_id,
            Some(Err(ClientError::Rejected {
                status,
                message,
                job_id: Some(job_id),
            })) => {
                warn!(%job_id, status, %message, "submission failed");
                self.enter(AppState::error(ANALYSIS_ERROR), &mut on_change);
                return Ok(&self.state);
            }
            Some(Err(e)) => {
                warn!(error = %e, "submission failed");
                self.enter(AppState::error(SUBMIT_ERROR), &mut on_change);
                return Ok(&self.state);
            }
        };

        self.enter(
            AppState::Polling {
                job_id: job_id.clone(),
            },
            &mut on_change,
        );
        let next = self.poll_until_settled(&job_id, cancel).await;
        self.enter(next, &mut on_change);
        Ok(&self.state)
    }

    async fn poll_until_settled(&mut self, job_id: &str, cancel: &CancellationToken) -> AppState {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let polled = tokio::select! {
                _ = cancel.cancelled() => None,
                result = async {
                    ticker.tick().await;
                    self.gateway.status(job_id).await
                } => Some(result),
            };
            let Some(polled) = polled else {
                debug!(%job_id, "polling cancelled");
                return AppState::Form;
            };

            let record = match polled {
                Ok(record) => record,
                Err(e) => {
                    warn!(%job_id, error = %e, "polling failed");
                    return AppState::error(POLLING_ERROR);
                }
            };

            match record.status() {
                Ok(JobStatus::Pending | JobStatus::Processing) => {
                    debug!(%job_id, state = %record.estado, "job still running");
                }
                Ok(JobStatus::Completed(analysis)) => {
                    let text = record.texto.clone();
                    self.last_record = Some(record);
                    return AppState::Results {
                        job_id: job_id.to_string(),
                        analysis,
                        text,
                    };
                }
                Ok(JobStatus::Failed { error }) => {
                    debug!(%job_id, %error, "job failed");
                    self.last_record = Some(record);
                    return AppState::error(ANALYSIS_ERROR);
                }
                Err(e) => {
                    warn!(%job_id, error = %e, "unreadable job record");
                    return AppState::error(POLLING_ERROR);
                }
            }
        }
    }

    fn enter<F: FnMut(&AppState)>(&mut self, next: AppState, on_change: &mut F) {
        self.state = next;
        on_change(&self.state);
    }
}
