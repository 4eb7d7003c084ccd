//! Decryption poller.
//!
//! A [`DecryptionSession`] resolves one ciphertext handle by polling the
//! gateway until the cleartext is published. State changes go through the
//! pure [`transition`] function; the async loop only feeds it events.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use signalpool_core::{CiphertextHandle, U256};
use signalpool_rpc::{DecryptionGateway, GatewayError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::wait::Sleeper;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("decryption not available after {attempts} attempts")]
    Timeout { attempts: u32 },
    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),
    #[error("session is already polling")]
    AlreadyPolling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionOptions {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for DecryptionOptions {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecryptionStatus {
    Idle,
    Polling,
    Completed,
    Failed,
}

/// Snapshot of a decryption session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub status: DecryptionStatus,
    pub attempts_made: u32,
    pub max_attempts: u32,
    /// 0..=100. Never reaches 100 before completion.
    pub progress: u8,
    pub result: Option<U256>,
    pub error_detail: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: DecryptionStatus::Idle,
            attempts_made: 0,
            max_attempts: 0,
            progress: 0,
            result: None,
            error_detail: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Started { max_attempts: u32 },
    Attempt { attempt: u32 },
    NotReady,
    GatewayFailed { detail: String },
    Decrypted { value: U256 },
    Failed { detail: String },
    Stopped,
    Reset,
}

/// Reported once per attempt, before any wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
    pub percentage: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(U256),
    /// `stop_polling` was called while the loop was running.
    Stopped,
}

fn percentage(attempt: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u64::from(attempt) * 100 + u64::from(total) / 2) / u64::from(total);
    pct.min(99) as u8
}

/// Pure state transition.
pub fn transition(state: &SessionState, event: PollEvent) -> SessionState {
    let mut next = state.clone();
    match event {
        PollEvent::Started { max_attempts } => {
            next = SessionState {
                status: DecryptionStatus::Polling,
                max_attempts,
                ..SessionState::default()
            };
        }
        PollEvent::Attempt { attempt } => {
            next.attempts_made = attempt;
            next.progress = next.progress.max(percentage(attempt, next.max_attempts));
        }
        PollEvent::NotReady => {}
        PollEvent::GatewayFailed { detail } => {
            next.error_detail = Some(detail);
        }
        PollEvent::Decrypted { value } => {
            next.status = DecryptionStatus::Completed;
            next.progress = 100;
            next.result = Some(value);
            next.error_detail = None;
        }
        PollEvent::Failed { detail } => {
            next.status = DecryptionStatus::Failed;
            next.error_detail = Some(detail);
        }
        PollEvent::Stopped => {
            next.status = DecryptionStatus::Idle;
            next.progress = 0;
        }
        PollEvent::Reset => {
            next = SessionState {
                max_attempts: state.max_attempts,
                ..SessionState::default()
            };
        }
    }
    next
}

/// Polls the gateway for one handle. Share through `Arc` to stop it from
/// another task.
pub struct DecryptionSession {
    handle: CiphertextHandle,
    gateway: Arc<dyn DecryptionGateway>,
    sleeper: Arc<dyn Sleeper>,
    state: Mutex<SessionState>,
    cancel: watch::Sender<u64>,
}

impl DecryptionSession {
    pub fn new(
        handle: CiphertextHandle,
        gateway: Arc<dyn DecryptionGateway>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let (cancel, _) = watch::channel(0);
        Self {
            handle,
            gateway,
            sleeper,
            state: Mutex::new(SessionState::default()),
            cancel,
        }
    }

    pub fn handle(&self) -> CiphertextHandle {
        self.handle
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn status(&self) -> DecryptionStatus {
        self.lock().status
    }

    pub fn progress(&self) -> u8 {
        self.lock().progress
    }

    pub fn result(&self) -> Option<U256> {
        self.lock().result
    }

    pub fn error_detail(&self) -> Option<String> {
        self.lock().error_detail.clone()
    }

    /// Return to `Idle`, clearing result and error. Does not stop a running loop.
    pub fn reset(&self) {
        self.apply(PollEvent::Reset);
    }

    /// Cancel the running loop, if any, and return to `Idle`.
    pub fn stop_polling(&self) {
        self.cancel.send_modify(|generation| *generation += 1);
        self.apply(PollEvent::Stopped);
        info!(handle = %self.handle, "decryption polling stopped");
    }

    /// Poll until decrypted, exhausted or stopped.
    pub async fn start_polling<F>(
        &self,
        options: &DecryptionOptions,
        mut on_progress: F,
    ) -> Result<PollOutcome, DecryptionError>
    where
        F: FnMut(Progress) + Send,
    {
        let mut cancelled = self.cancel.subscribe();
        {
            let mut state = self.lock();
            if state.status == DecryptionStatus::Polling {
                return Err(DecryptionError::AlreadyPolling);
            }
            *state = transition(
                &state,
                PollEvent::Started {
                    max_attempts: options.max_attempts,
                },
            );
        }
        cancelled.borrow_and_update();

        info!(
            handle = %self.handle,
            max_attempts = options.max_attempts,
            "decryption polling started"
        );

        let total = options.max_attempts;
        for attempt in 1..=total {
            if cancelled.has_changed().unwrap_or(false) {
                return Ok(PollOutcome::Stopped);
            }

            let state = self.apply(PollEvent::Attempt { attempt });
            on_progress(Progress {
                current: attempt,
                total,
                percentage: state.progress,
            });
            if cancelled.has_changed().unwrap_or(false) {
                return Ok(PollOutcome::Stopped);
            }

            let outcome = self.gateway.public_decrypt(&self.handle).await;
            if cancelled.has_changed().unwrap_or(false) {
                return Ok(PollOutcome::Stopped);
            }

            match outcome {
                Ok(value) => {
                    self.apply(PollEvent::Decrypted { value });
                    info!(handle = %self.handle, attempt, "decryption completed");
                    return Ok(PollOutcome::Completed(value));
                }
                Err(GatewayError::NotReady) => {
                    debug!(handle = %self.handle, attempt, max_attempts = total, "gateway not ready");
                    self.apply(PollEvent::NotReady);
                }
                Err(e) => {
                    warn!(handle = %self.handle, attempt, error = %e, "decryption attempt failed");
                    self.apply(PollEvent::GatewayFailed {
                        detail: e.to_string(),
                    });
                    if attempt == total {
                        self.apply(PollEvent::Failed {
                            detail: e.to_string(),
                        });
                        return Err(DecryptionError::Gateway(e));
                    }
                }
            }

            if attempt < total {
                tokio::select! {
                    _ = self.sleeper.sleep(options.interval) => {}
                    _ = cancelled.changed() => return Ok(PollOutcome::Stopped),
                }
            }
        }

        let err = DecryptionError::Timeout { attempts: total };
        self.apply(PollEvent::Failed {
            detail: err.to_string(),
        });
        warn!(handle = %self.handle, attempts = total, "decryption timed out");
        Err(err)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply(&self, event: PollEvent) -> SessionState {
        let mut state = self.lock();
        *state = transition(&state, event);
        state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polling(max_attempts: u32) -> SessionState {
        transition(&SessionState::default(), PollEvent::Started { max_attempts })
    }

    #[test]
    fn test_started_clears_previous_run() {
        let done = SessionState {
            status: DecryptionStatus::Completed,
            progress: 100,
            result: Some(U256::from(9u8)),
            ..SessionState::default()
        };
        let next = transition(&done, PollEvent::Started { max_attempts: 4 });
        assert_eq!(next.status, DecryptionStatus::Polling);
        assert_eq!(next.progress, 0);
        assert_eq!(next.result, None);
        assert_eq!(next.max_attempts, 4);
    }

    #[test]
    fn test_progress_capped_below_completion() {
        let state = polling(1);
        let state = transition(&state, PollEvent::Attempt { attempt: 1 });
        assert_eq!(state.progress, 99);
        let state = transition(&state, PollEvent::Decrypted { value: U256::from(5u8) });
        assert_eq!(state.progress, 100);
        assert_eq!(state.status, DecryptionStatus::Completed);
        assert_eq!(state.result, Some(U256::from(5u8)));
    }

    #[test]
    fn test_progress_non_decreasing() {
        let mut state = polling(7);
        let mut last = 0;
        for attempt in 1..=7 {
            state = transition(&state, PollEvent::Attempt { attempt });
            assert!(state.progress >= last);
            assert!(state.progress <= 99);
            last = state.progress;
        }
    }

    #[test]
    fn test_gateway_failure_keeps_polling() {
        let state = polling(3);
        let state = transition(
            &state,
            PollEvent::GatewayFailed {
                detail: "HTTP 503".to_string(),
            },
        );
        assert_eq!(state.status, DecryptionStatus::Polling);
        assert_eq!(state.error_detail.as_deref(), Some("HTTP 503"));
    }

    #[test]
    fn test_stop_and_reset() {
        let state = transition(&polling(3), PollEvent::Attempt { attempt: 2 });
        let stopped = transition(&state, PollEvent::Stopped);
        assert_eq!(stopped.status, DecryptionStatus::Idle);
        assert_eq!(stopped.progress, 0);

        let failed = transition(
            &state,
            PollEvent::Failed {
                detail: "timeout".to_string(),
            },
        );
        let reset = transition(&failed, PollEvent::Reset);
        assert_eq!(reset.status, DecryptionStatus::Idle);
        assert_eq!(reset.error_detail, None);
        assert_eq!(reset.attempts_made, 0);
    }
}
