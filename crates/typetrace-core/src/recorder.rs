//! The recording state machine.
//!
//! A [`Recorder`] observes full-buffer snapshots from the input source,
//! turns each accepted change into a patch record, and owns the session
//! until it is finalized. States run `NotStarted → Recording → Stopped`;
//! the only way back is an explicit [`Recorder::reset`].

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::diff::{self, char_len};
use crate::generate_session_id;
use crate::patch::Patch;
use crate::record::{Record, RecordLog};
use crate::session::Session;

/// Bounds on one recording session. The defaults match the shipped input
/// surface: 500-char buffer, 1500 records, a 15-minute countdown.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub max_input_chars: usize,
    pub max_records: usize,
    pub time_budget_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 500,
            max_records: 1500,
            time_budget_ms: 15 * 60 * 1000,
        }
    }
}

/// Why a session left the `Recording` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Explicit stop or finalize.
    Requested,
    /// The recording countdown expired.
    TimeBudget,
    /// Appending would have grown the log past the record cap.
    RecordCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    NotStarted,
    Recording,
    Stopped(StopReason),
}

/// Why an input was rejected. Rejections are expected live-typing
/// behavior, not faults; the log and previous text stay untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotRecording,
    InputTooLong,
    NoChange,
}

/// Outcome of one `observe_change` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observe {
    /// A record was appended.
    Recorded,
    Ignored(IgnoreReason),
    /// This call force-closed the session.
    Stopped(StopReason),
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("cannot finalize a session with no records")]
    EmptyLog,
}

pub struct Recorder {
    config: RecorderConfig,
    session_id: String,
    state: RecorderState,
    started_at_ms: Option<u64>,
    last_text: String,
    log: RecordLog,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            session_id: generate_session_id(),
            state: RecorderState::NotStarted,
            started_at_ms: None,
            last_text: String::new(),
            log: RecordLog::new(),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn log(&self) -> &RecordLog {
        &self.log
    }

    /// The most recently accepted buffer content.
    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    /// Milliseconds left on the recording countdown, for the UI timer.
    pub fn remaining_budget_ms(&self, now_ms: u64) -> u64 {
        match (self.state, self.started_at_ms) {
            (RecorderState::Stopped(_), _) => 0,
            (_, Some(started)) => self
                .config
                .time_budget_ms
                .saturating_sub(now_ms.saturating_sub(started)),
            (_, None) => self.config.time_budget_ms,
        }
    }

    /// Observes the complete current buffer content (not a delta).
    pub fn observe_change(&mut self, new_text: &str) -> Observe {
        self.observe_change_at(new_text, now_ms())
    }

    /// Clock-injected variant of [`Recorder::observe_change`].
    pub fn observe_change_at(&mut self, new_text: &str, now_ms: u64) -> Observe {
        match self.state {
            RecorderState::Stopped(_) => return Observe::Ignored(IgnoreReason::NotRecording),
            RecorderState::Recording => {
                if let Some(started) = self.started_at_ms {
                    if now_ms.saturating_sub(started) >= self.config.time_budget_ms {
                        self.state = RecorderState::Stopped(StopReason::TimeBudget);
                        return Observe::Stopped(StopReason::TimeBudget);
                    }
                }
            }
            RecorderState::NotStarted => {}
        }

        if char_len(new_text) > self.config.max_input_chars {
            return Observe::Ignored(IgnoreReason::InputTooLong);
        }

        let mut d = diff::diff(&self.last_text, new_text);
        if diff::is_identity(&d) {
            return Observe::Ignored(IgnoreReason::NoChange);
        }
        diff::cleanup_semantic(&mut d);
        let patch = Patch::from_diff(&self.last_text, &d);

        if self.log.len() >= self.config.max_records {
            self.state = RecorderState::Stopped(StopReason::RecordCap);
            return Observe::Stopped(StopReason::RecordCap);
        }

        let time_diff = match self.log.last() {
            Some(prev) => now_ms.saturating_sub(prev.timestamp),
            None => 0,
        };
        self.log.push(Record {
            patch,
            timestamp: now_ms,
            time_diff,
        });
        self.last_text = new_text.to_string();

        if self.state == RecorderState::NotStarted {
            self.state = RecorderState::Recording;
            self.started_at_ms = Some(now_ms);
        }
        Observe::Recorded
    }

    /// Explicitly stops recording. Idempotent; an earlier stop reason is
    /// kept.
    pub fn stop(&mut self) {
        if !matches!(self.state, RecorderState::Stopped(_)) {
            self.state = RecorderState::Stopped(StopReason::Requested);
        }
    }

    /// Discards the log and re-initializes a fresh session.
    pub fn reset(&mut self) {
        self.session_id = generate_session_id();
        self.state = RecorderState::NotStarted;
        self.started_at_ms = None;
        self.last_text.clear();
        self.log = RecordLog::new();
    }

    /// Freezes the log and moves it out as a [`Session`] for the storage
    /// handoff. Fails on an empty log: an empty session must never be
    /// persisted or replayed.
    pub fn finalize(&mut self) -> Result<Session, RecorderError> {
        if self.log.is_empty() {
            return Err(RecorderError::EmptyLog);
        }
        self.stop();
        let log = std::mem::take(&mut self.log);
        Ok(Session {
            id: self.session_id.clone(),
            log,
        })
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
