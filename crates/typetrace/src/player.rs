//! Timed replay of a record log.
//!
//! A replay runs as a single cancellable task: apply the next record's
//! patch to the text accumulator, surface the new state, sleep until the
//! next step. No two steps of one replay are ever in flight at once, and
//! a [`Player`] enforces that starting a new replay cancels the previous
//! one — two interleaved loops racing to mutate the same displayed text is
//! the failure mode this API exists to rule out.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use typetrace_core::record::Record;

pub const DEFAULT_SPEED_FLOOR: Duration = Duration::from_millis(100);
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Apply every record back-to-back at the speed floor without
    /// surfacing intermediate states; only the final text reaches the
    /// caller. Used to catch up to the end state before visible playback.
    pub warmup: bool,
    /// Minimum wait between visible updates, whatever the recorded delay.
    pub speed_floor: Duration,
    /// Wait substituted for a record whose recorded delay is missing or
    /// zero.
    pub default_delay: Duration,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            warmup: false,
            speed_floor: DEFAULT_SPEED_FLOOR,
            default_delay: DEFAULT_DELAY,
        }
    }
}

impl ReplayOptions {
    /// Options for the invisible catch-up pass.
    pub fn warmup() -> Self {
        Self {
            warmup: true,
            ..Self::default()
        }
    }
}

/// Display sink for replay output.
pub trait ReplaySink: Send + 'static {
    /// Invoked with the new text state after each record is applied.
    /// Skipped entirely in warmup mode.
    fn update(&mut self, text: &str);

    /// Invoked once after the last record has been applied.
    fn complete(&mut self) {}
}

/// Adapts a pair of closures to [`ReplaySink`].
pub struct CallbackSink<U, C>
where
    U: FnMut(&str) + Send + 'static,
    C: FnMut() + Send + 'static,
{
    on_update: U,
    on_complete: C,
}

impl<U, C> CallbackSink<U, C>
where
    U: FnMut(&str) + Send + 'static,
    C: FnMut() + Send + 'static,
{
    pub fn new(on_update: U, on_complete: C) -> Self {
        Self {
            on_update,
            on_complete,
        }
    }
}

impl<U, C> ReplaySink for CallbackSink<U, C>
where
    U: FnMut(&str) + Send + 'static,
    C: FnMut() + Send + 'static,
{
    fn update(&mut self, text: &str) {
        (self.on_update)(text)
    }

    fn complete(&mut self) {
        (self.on_complete)()
    }
}

/// Where a finished (or cancelled) replay ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// The accumulator at the moment the task ended. For a completed
    /// replay this is the exact final authored text.
    pub final_text: String,
    /// `false` when the replay was cancelled before the last record.
    pub completed: bool,
    /// Records whose patch only applied partially.
    pub failed_records: Vec<usize>,
}

/// Handle to a running replay task.
pub struct ReplayHandle {
    token: CancellationToken,
    task: JoinHandle<ReplayOutcome>,
}

impl ReplayHandle {
    /// Stops all pending steps. Idempotent; cancelling after completion
    /// is a no-op.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits for the task to finish and returns its outcome. `None` only
    /// if the task panicked.
    pub async fn finished(self) -> Option<ReplayOutcome> {
        self.task.await.ok()
    }
}

/// Owns at most one running replay over one displayed text accumulator.
#[derive(Default)]
pub struct Player {
    current: Option<CancellationToken>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a replay of `records`, cancelling whatever replay this
    /// player started before.
    pub fn start<S: ReplaySink>(
        &mut self,
        records: Vec<Record>,
        options: ReplayOptions,
        sink: S,
    ) -> ReplayHandle {
        if let Some(prev) = self.current.take() {
            prev.cancel();
        }
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        let task = tokio::spawn(run(records, options, sink, token.clone()));
        ReplayHandle { token, task }
    }
}

async fn run<S: ReplaySink>(
    records: Vec<Record>,
    options: ReplayOptions,
    mut sink: S,
    token: CancellationToken,
) -> ReplayOutcome {
    let mut current = String::new();
    let mut failed_records = Vec::new();
    let total = records.len();

    for (index, record) in records.iter().enumerate() {
        if token.is_cancelled() {
            return ReplayOutcome {
                final_text: current,
                completed: false,
                failed_records,
            };
        }

        let outcome = record.patch.apply(&current);
        if !outcome.is_clean() {
            // A lost hunk degrades the reconstruction; freezing playback
            // would lose everything after it.
            warn!(
                record = index,
                failed_hunks = outcome.failed_hunks.len(),
                "patch applied partially, continuing with best-effort text"
            );
            failed_records.push(index);
        }
        current = outcome.text;

        if !options.warmup {
            sink.update(&current);
        }

        if index + 1 < total {
            let wait = step_wait(&records[index + 1], &options);
            tokio::select! {
                _ = token.cancelled() => {
                    return ReplayOutcome {
                        final_text: current,
                        completed: false,
                        failed_records,
                    };
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    sink.complete();
    ReplayOutcome {
        final_text: current,
        completed: true,
        failed_records,
    }
}

/// Wait before applying `upcoming`: its recorded delay (default-filled
/// when missing), floored; warmup fast-forwards at the floor alone.
fn step_wait(upcoming: &Record, options: &ReplayOptions) -> Duration {
    if options.warmup {
        return options.speed_floor;
    }
    let recorded = if upcoming.time_diff == 0 {
        options.default_delay
    } else {
        Duration::from_millis(upcoming.time_diff)
    };
    recorded.max(options.speed_floor)
}
