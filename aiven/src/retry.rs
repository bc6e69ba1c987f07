//! Poll-until-state driver used by resource code to wait for asynchronous
//! backend operations to settle.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum WaitError<E> {
    #[error("timeout while waiting for state to become '{target}' (last state: '{last_state}', timeout: {timeout:?})")]
    Timeout {
        last_state: String,
        target: String,
        timeout: Duration,
    },

    #[error("couldn't find resource ({checks} retries)")]
    NotFound { checks: u32 },

    #[error("unexpected state '{state}', wanted target '{target}'")]
    UnexpectedState { state: String, target: String },

    #[error(transparent)]
    Refresh(E),
}

/// Configuration of a single wait. A refresh returning `Ok(None)` means the
/// resource was not found on that tick.
#[derive(Debug, Clone)]
pub struct StateChangeConf<S> {
    pub pending: Vec<S>,
    pub target: Vec<S>,
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Consecutive not-found ticks tolerated before giving up.
    pub not_found_checks: u32,
}

impl<S> StateChangeConf<S>
where
    S: Clone + PartialEq + Display,
{
    pub fn new(pending: Vec<S>, target: Vec<S>, timeout: Duration) -> Self {
        Self {
            pending,
            target,
            timeout,
            poll_interval: Duration::from_secs(5),
            not_found_checks: 20,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    fn target_names(&self) -> String {
        join_states(&self.target)
    }

    /// Calls `refresh` until it reports a target state, an error, an
    /// unexpected state, too many not-found ticks, or the timeout elapses.
    pub async fn wait_for_state<T, E, F, Fut>(&self, mut refresh: F) -> Result<T, WaitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<(T, S)>, E>>,
    {
        let mut last_state: Option<S> = None;

        let run = async {
            let mut not_found_ticks = 0u32;
            loop {
                let refreshed = match refresh().await {
                    Ok(refreshed) => refreshed,
                    Err(e) => return Err(WaitError::Refresh(e)),
                };

                match refreshed {
                    None => {
                        not_found_ticks += 1;
                        tracing::trace!("resource not found ({} of {})", not_found_ticks, self.not_found_checks);
                        if not_found_ticks > self.not_found_checks {
                            return Err(WaitError::NotFound {
                                checks: not_found_ticks,
                            });
                        }
                    }
                    Some((value, state)) => {
                        not_found_ticks = 0;

                        if self.target.contains(&state) {
                            tracing::debug!("reached target state {}", state);
                            return Ok(value);
                        }

                        if !self.pending.contains(&state) {
                            return Err(WaitError::UnexpectedState {
                                state: state.to_string(),
                                target: self.target_names(),
                            });
                        }

                        tracing::trace!("still in pending state {}", state);
                        last_state = Some(state);
                    }
                }

                tokio::time::sleep(self.poll_interval).await;
            }
        };

        let result = tokio::time::timeout(self.timeout, run).await;
        match result {
            Ok(outcome) => outcome,
            Err(_) => Err(WaitError::Timeout {
                last_state: last_state.map(|s| s.to_string()).unwrap_or_default(),
                target: self.target_names(),
                timeout: self.timeout,
            }),
        }
    }
}

fn join_states<S: Display>(states: &[S]) -> String {
    states
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
