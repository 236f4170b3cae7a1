//! Agent invocation with bounded retry

use crate::application::normalizer::normalize_response;
use crate::constants::{DEFAULT_BASE_BACKOFF, DEFAULT_MAX_ATTEMPTS};
use crate::infrastructure::directory::{AgentDirectory, DirectoryError, FailureClass};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, info};

const QUERY_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("unexpected error querying agent '{agent}' after {attempts} attempts: {source}")]
    Unexpected {
        agent: String,
        attempts: u32,
        #[source]
        source: DirectoryError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Delay slept after the zero-based `attempt` fails.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

pub struct InvocationClient {
    directory: Arc<dyn AgentDirectory>,
    policy: RetryPolicy,
}

impl InvocationClient {
    pub fn new(directory: Arc<dyn AgentDirectory>) -> Self {
        Self::with_policy(directory, RetryPolicy::default())
    }

    pub fn with_policy(directory: Arc<dyn AgentDirectory>, policy: RetryPolicy) -> Self {
        Self { directory, policy }
    }

    /// Queries `agent_name` and returns its text.
    ///
    /// Failures the caller can act on come back as `Ok` text prefixed with
    /// `Error:`. Only an unclassified failure on the final attempt is `Err`.
    pub async fn invoke(&self, agent_name: &str, query: &str) -> Result<String, InvocationError> {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 0..attempts {
            let is_last = attempt + 1 == attempts;
            debug!(
                agent = agent_name,
                attempt = attempt + 1,
                query = %preview(query),
                "Invoking agent"
            );

            match self.directory.create_response(agent_name, query).await {
                Ok(response) if response.is_failed() => {
                    let message = response.failure_message();
                    error!(agent = agent_name, attempt = attempt + 1, %message, "Agent response failed");
                    if is_last {
                        return Ok(format!("Error: {message}"));
                    }
                }
                Ok(response) => {
                    debug!(agent = agent_name, status = ?response.status, "Agent responded");
                    return Ok(normalize_response(Some(&response)));
                }
                Err(err) => match err.failure_class() {
                    FailureClass::NotFound => {
                        error!(agent = agent_name, %err, "Agent could not be resolved");
                        return Ok(format!(
                            "Error: The agent {agent_name} could not be found or accessed."
                        ));
                    }
                    FailureClass::Transient => {
                        error!(
                            agent = agent_name,
                            attempt = attempt + 1,
                            max_attempts = attempts,
                            %err,
                            "Service error querying agent"
                        );
                        if is_last {
                            error!(agent = agent_name, attempts, "Giving up on agent query");
                            return Ok(format!(
                                "Error: Failed to get a response after multiple attempts: {err}"
                            ));
                        }
                    }
                    FailureClass::Unexpected => {
                        error!(agent = agent_name, attempt = attempt + 1, %err, "Unexpected error querying agent");
                        if is_last {
                            return Err(InvocationError::Unexpected {
                                agent: agent_name.to_string(),
                                attempts,
                                source: err,
                            });
                        }
                    }
                },
            }

            let delay = self.policy.delay_for(attempt);
            info!(
                agent = agent_name,
                delay_ms = delay.as_millis() as u64,
                next_attempt = attempt + 2,
                "Retrying agent query"
            );
            sleep(delay).await;
        }

        Ok("Error: Failed to get a response after multiple attempts.".to_string())
    }
}

fn preview(query: &str) -> String {
    match query.char_indices().nth(QUERY_PREVIEW_CHARS) {
        Some((index, _)) => format!("{}...", &query[..index]),
        None => query.to_string(),
    }
}
