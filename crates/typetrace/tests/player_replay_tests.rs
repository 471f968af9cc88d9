use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use typetrace::diff::{cleanup_semantic, diff};
use typetrace::patch::Patch;
use typetrace::player::{CallbackSink, Player, ReplayOptions, ReplaySink};
use typetrace::record::Record;

/// Sink that journals every surfaced state with its paused-clock offset.
#[derive(Clone)]
struct TestSink {
    started: Instant,
    updates: Arc<Mutex<Vec<(String, Duration)>>>,
    completions: Arc<Mutex<usize>>,
}

impl TestSink {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            updates: Arc::new(Mutex::new(Vec::new())),
            completions: Arc::new(Mutex::new(0)),
        }
    }

    fn updates(&self) -> Vec<(String, Duration)> {
        self.updates.lock().expect("sink lock").clone()
    }

    fn texts(&self) -> Vec<String> {
        self.updates().into_iter().map(|(text, _)| text).collect()
    }

    fn completions(&self) -> usize {
        *self.completions.lock().expect("sink lock")
    }
}

impl ReplaySink for TestSink {
    fn update(&mut self, text: &str) {
        self.updates
            .lock()
            .expect("sink lock")
            .push((text.to_string(), self.started.elapsed()));
    }

    fn complete(&mut self) {
        *self.completions.lock().expect("sink lock") += 1;
    }
}

/// Builds a record log by diffing a sequence of buffer states, attaching
/// the given recorded delays.
fn records_from(states: &[&str], delays: &[u64]) -> Vec<Record> {
    assert_eq!(states.len(), delays.len());
    let mut prev = String::new();
    let mut records = Vec::with_capacity(states.len());
    for (i, state) in states.iter().enumerate() {
        let mut d = diff(&prev, state);
        cleanup_semantic(&mut d);
        records.push(Record {
            patch: Patch::from_diff(&prev, &d),
            timestamp: 1_000 + i as u64 * 100,
            time_diff: delays[i],
        });
        prev = state.to_string();
    }
    records
}

#[tokio::test(start_paused = true)]
async fn visible_replay_honors_recorded_delays() {
    let records = records_from(&["a", "ab", "abc"], &[0, 200, 300]);
    let sink = TestSink::new();
    let mut player = Player::new();

    let handle = player.start(records, ReplayOptions::default(), sink.clone());
    let outcome = handle.finished().await.expect("replay task must finish");

    assert!(outcome.completed);
    assert_eq!(outcome.final_text, "abc");
    assert!(outcome.failed_records.is_empty());
    assert_eq!(sink.completions(), 1);

    let updates = sink.updates();
    assert_eq!(
        sink.texts(),
        vec!["a".to_string(), "ab".to_string(), "abc".to_string()]
    );
    assert_eq!(updates[0].1, Duration::from_millis(0));
    assert_eq!(updates[1].1, Duration::from_millis(200));
    assert_eq!(updates[2].1, Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn speed_floor_bounds_fast_sequences() {
    let records = records_from(&["a", "ab", "abc"], &[0, 10, 50]);
    let sink = TestSink::new();
    let mut player = Player::new();

    let handle = player.start(records, ReplayOptions::default(), sink.clone());
    handle.finished().await.expect("replay task must finish");

    let updates = sink.updates();
    assert_eq!(updates[1].1, Duration::from_millis(100));
    assert_eq!(updates[2].1, Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn zero_time_diff_is_replayed_with_the_default_delay() {
    let records = records_from(&["a", "ab"], &[0, 0]);
    let sink = TestSink::new();
    let mut player = Player::new();

    let handle = player.start(records, ReplayOptions::default(), sink.clone());
    handle.finished().await.expect("replay task must finish");

    let updates = sink.updates();
    assert_eq!(updates[1].1, Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn warmup_surfaces_nothing_but_reaches_the_end() {
    let records = records_from(&["a", "ab", "abc"], &[0, 4000, 9000]);
    let sink = TestSink::new();
    let mut player = Player::new();

    let started = Instant::now();
    let handle = player.start(records, ReplayOptions::warmup(), sink.clone());
    let outcome = handle.finished().await.expect("replay task must finish");

    assert!(outcome.completed);
    assert_eq!(outcome.final_text, "abc");
    assert!(sink.updates().is_empty());
    assert_eq!(sink.completions(), 1);
    // Fast-forward ignores the recorded delays entirely.
    assert_eq!(started.elapsed(), Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_replay_keeps_the_last_applied_state() {
    let records = records_from(&["a", "ab", "abc", "abcd"], &[0, 200, 200, 200]);
    let sink = TestSink::new();
    let mut player = Player::new();

    let handle = player.start(records, ReplayOptions::default(), sink.clone());
    assert!(!handle.is_cancelled());
    tokio::time::sleep(Duration::from_millis(250)).await;
    handle.cancel();
    handle.cancel(); // repeated cancel is a no-op
    assert!(handle.is_cancelled());
    let outcome = handle.finished().await.expect("replay task must finish");

    assert!(!outcome.completed);
    assert_eq!(outcome.final_text, "ab");
    assert_eq!(
        sink.texts(),
        vec!["a".to_string(), "ab".to_string()],
        "records after the cancel point must never surface"
    );
    assert_eq!(sink.completions(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_after_completion_is_a_no_op() {
    let records = records_from(&["a"], &[0]);
    let sink = TestSink::new();
    let mut player = Player::new();

    let handle = player.start(records, ReplayOptions::default(), sink.clone());
    // A single record completes on the first poll; let the task run.
    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.cancel();
    let outcome = handle.finished().await.expect("replay task must finish");

    assert!(outcome.completed);
    assert_eq!(sink.completions(), 1);
    assert_eq!(outcome.final_text, "a");
}

#[tokio::test(start_paused = true)]
async fn starting_a_new_replay_cancels_the_previous_one() {
    let slow = records_from(&["x", "xy"], &[0, 60_000]);
    let fast = records_from(&["a", "ab"], &[0, 200]);
    let slow_sink = TestSink::new();
    let fast_sink = TestSink::new();
    let mut player = Player::new();

    let first = player.start(slow, ReplayOptions::default(), slow_sink.clone());
    let second = player.start(fast, ReplayOptions::default(), fast_sink.clone());

    let first_outcome = first.finished().await.expect("first task must finish");
    let second_outcome = second.finished().await.expect("second task must finish");

    assert!(!first_outcome.completed);
    assert!(second_outcome.completed);
    assert_eq!(second_outcome.final_text, "ab");
    assert_eq!(slow_sink.completions(), 0);
    assert_eq!(fast_sink.completions(), 1);
}

#[tokio::test(start_paused = true)]
async fn replay_of_two_logs_yields_identical_finals() {
    let records = records_from(&["t", "ty", "typ", "type"], &[0, 120, 80, 240]);
    let mut player = Player::new();

    let first = player
        .start(records.clone(), ReplayOptions::warmup(), TestSink::new())
        .finished()
        .await
        .expect("first replay must finish");
    let second = player
        .start(records, ReplayOptions::warmup(), TestSink::new())
        .finished()
        .await
        .expect("second replay must finish");

    assert_eq!(first.final_text, second.final_text);
    assert_eq!(first.final_text, "type");
}

#[tokio::test(start_paused = true)]
async fn callback_sink_adapts_closures() {
    let records = records_from(&["a", "ab"], &[0, 150]);
    let texts = Arc::new(Mutex::new(Vec::new()));
    let done = Arc::new(Mutex::new(false));
    let sink = {
        let texts = Arc::clone(&texts);
        let done = Arc::clone(&done);
        CallbackSink::new(
            move |text: &str| texts.lock().expect("texts lock").push(text.to_string()),
            move || *done.lock().expect("done lock") = true,
        )
    };

    let mut player = Player::new();
    player
        .start(records, ReplayOptions::default(), sink)
        .finished()
        .await
        .expect("replay task must finish");

    assert_eq!(
        *texts.lock().expect("texts lock"),
        vec!["a".to_string(), "ab".to_string()]
    );
    assert!(*done.lock().expect("done lock"));
}

#[tokio::test(start_paused = true)]
async fn empty_log_completes_immediately() {
    let sink = TestSink::new();
    let mut player = Player::new();

    let outcome = player
        .start(Vec::new(), ReplayOptions::default(), sink.clone())
        .finished()
        .await
        .expect("empty replay must finish");

    assert!(outcome.completed);
    assert_eq!(outcome.final_text, "");
    assert!(sink.updates().is_empty());
    assert_eq!(sink.completions(), 1);
}

#[tokio::test(start_paused = true)]
async fn partial_patch_failure_degrades_instead_of_aborting() {
    // First record expects a source that will not be there; the second is
    // a pure insertion that applies anywhere.
    let mismatched = {
        let mut d = diff("qwerty", "qwerty!");
        cleanup_semantic(&mut d);
        Record {
            patch: Patch::from_diff("qwerty", &d),
            timestamp: 1_000,
            time_diff: 0,
        }
    };
    let insertion = {
        let mut d = diff("", "x");
        cleanup_semantic(&mut d);
        Record {
            patch: Patch::from_diff("", &d),
            timestamp: 1_100,
            time_diff: 100,
        }
    };

    let sink = TestSink::new();
    let mut player = Player::new();
    let outcome = player
        .start(
            vec![mismatched, insertion],
            ReplayOptions::default(),
            sink.clone(),
        )
        .finished()
        .await
        .expect("replay task must finish");

    assert!(outcome.completed);
    assert_eq!(outcome.failed_records, vec![0]);
    assert_eq!(outcome.final_text, "x");
    assert_eq!(sink.completions(), 1);
}
