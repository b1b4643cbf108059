//! Lookahead step sequencer.
//!
//! A coarse polling thread wakes every 25 ms and schedules every step that
//! falls inside a 100 ms window ahead of the backend clock. Sample-accurate
//! timing is the backend's job; the polling loop only has to stay ahead of
//! it, which absorbs timer jitter without drift. The schedule target
//! (`next_note_time`) advances monotonically by exact sixteenth-note
//! increments and is only ever reset by an explicit [`Sequencer::start`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::backend::{AudioBackend, NodeId};
use crate::stage::Stage;

/// Steps per pattern. One bar of sixteenth notes.
pub const STEPS_PER_PATTERN: usize = 16;

/// One instrument's step pattern, `true` = hit.
///
/// `Copy` semantics mean pattern reads hand out independent copies, so a
/// caller mutating a returned pattern can never alias the sequencer's own
/// state.
pub type StepPattern = [bool; STEPS_PER_PATTERN];

/// Polling interval of the scheduler thread.
const LOOKAHEAD: Duration = Duration::from_millis(25);

/// How far ahead of the backend clock each tick schedules, in seconds.
/// Must comfortably exceed the polling interval.
const SCHEDULE_AHEAD_TIME: f64 = 0.1;

/// What [`Sequencer::stop`] does with triggers already committed to the
/// backend's future-time queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopPolicy {
    /// Committed triggers still sound. The schedule-ahead window bounds the
    /// tail to at most 100 ms of material.
    #[default]
    LetRing,
    /// Sources scheduled at a still-future time are stopped immediately.
    CancelPending,
}

/// Construction options for a [`Sequencer`].
///
/// # Examples
///
/// ```
/// use gooey::{SequencerOpts, StopPolicy, STEPS_PER_PATTERN};
///
/// let mut kick = [false; STEPS_PER_PATTERN];
/// kick[0] = true;
/// kick[8] = true;
///
/// let opts = SequencerOpts::new(120.0)
///     .with_pattern("kick", kick)
///     .with_stop_policy(StopPolicy::CancelPending);
/// ```
#[derive(Debug, Clone)]
pub struct SequencerOpts {
    tempo: f64,
    pattern: HashMap<String, StepPattern>,
    stop_policy: StopPolicy,
}

impl SequencerOpts {
    /// Starts an option set at the given tempo in beats per minute.
    pub fn new(tempo: f64) -> Self {
        Self {
            tempo,
            pattern: HashMap::new(),
            stop_policy: StopPolicy::default(),
        }
    }

    /// Adds or replaces one instrument's initial pattern.
    pub fn with_pattern(mut self, name: impl Into<String>, pattern: StepPattern) -> Self {
        self.pattern.insert(name.into(), pattern);
        self
    }

    /// Chooses what `stop()` does with already-committed triggers.
    pub fn with_stop_policy(mut self, stop_policy: StopPolicy) -> Self {
        self.stop_policy = stop_policy;
        self
    }
}

/// Cursor and pattern table, guarded together so a tick sees a consistent
/// snapshot.
#[derive(Debug)]
struct SchedulerState {
    pattern: HashMap<String, StepPattern>,
    next_note_time: f64,
    current_step: usize,
    /// Voices committed to the backend, kept only under
    /// [`StopPolicy::CancelPending`]
    pending: Vec<(f64, NodeId)>,
}

#[derive(Debug)]
struct Shared {
    running: AtomicBool,
    state: Mutex<SchedulerState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SchedulerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// The step sequencer.
///
/// Tempo is fixed for the lifetime of an instance; changing it means
/// stopping and constructing a new sequencer. Patterns may be edited live
/// while running; each scheduling tick reads the table under the state
/// lock, so an edit lands on the next tick boundary at the latest.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gooey::backend::RecordingBackend;
/// use gooey::{kits, Sequencer, SequencerOpts, Stage, STEPS_PER_PATTERN};
///
/// let backend = Arc::new(RecordingBackend::new());
/// let stage = Arc::new(Stage::new(backend.clone()));
/// stage.add_instrument("kick", kits::make_kick(50.0, 80.0));
///
/// let mut four_on_floor = [false; STEPS_PER_PATTERN];
/// for step in (0..STEPS_PER_PATTERN).step_by(4) {
///     four_on_floor[step] = true;
/// }
///
/// let mut sequencer = Sequencer::new(
///     backend,
///     stage,
///     SequencerOpts::new(120.0).with_pattern("kick", four_on_floor),
/// );
/// assert_eq!(sequencer.sixteenth_note_time(), 0.125);
///
/// sequencer.start();
/// assert!(sequencer.is_running());
/// sequencer.stop();
/// ```
#[derive(Debug)]
pub struct Sequencer {
    backend: Arc<dyn AudioBackend>,
    stage: Arc<Stage>,
    tempo: f64,
    sixteenth_note_time: f64,
    stop_policy: StopPolicy,
    start_time: Option<f64>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Sequencer {
    /// Creates a stopped sequencer.
    ///
    /// # Panics
    ///
    /// Panics if the tempo is not strictly positive.
    pub fn new(backend: Arc<dyn AudioBackend>, stage: Arc<Stage>, opts: SequencerOpts) -> Self {
        assert!(opts.tempo > 0.0, "tempo must be positive");
        let seconds_per_beat = 60.0 / opts.tempo;
        Self {
            backend,
            stage,
            tempo: opts.tempo,
            sixteenth_note_time: seconds_per_beat / 4.0,
            stop_policy: opts.stop_policy,
            start_time: None,
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                state: Mutex::new(SchedulerState {
                    pattern: opts.pattern,
                    next_note_time: 0.0,
                    current_step: 0,
                    pending: Vec::new(),
                }),
            }),
            worker: None,
        }
    }

    /// Tempo in beats per minute.
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Seconds per step. For any tempo this is exactly `15 / bpm`.
    pub fn sixteenth_note_time(&self) -> f64 {
        self.sixteenth_note_time
    }

    /// Backend time at which the current run started, if running.
    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    /// Step index (0..16) the scheduler will fill next.
    pub fn current_step(&self) -> usize {
        self.shared.state().current_step
    }

    /// Whether the scheduling thread is live.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Replaces one instrument's pattern. Takes effect on the next
    /// scheduling tick, even mid-run.
    ///
    /// A name with no matching stage instrument is accepted; its steps
    /// schedule triggers that the stage ignores.
    pub fn set_pattern(&self, name: impl Into<String>, pattern: StepPattern) {
        self.shared.state().pattern.insert(name.into(), pattern);
    }

    /// Returns a copy of one instrument's pattern.
    pub fn get_pattern(&self, name: &str) -> Option<StepPattern> {
        self.shared.state().pattern.get(name).copied()
    }

    /// Returns a copy of the whole pattern table.
    pub fn patterns(&self) -> HashMap<String, StepPattern> {
        self.shared.state().pattern.clone()
    }

    /// Begins scheduling from the backend's current time at step 0 and
    /// spawns the polling thread. A no-op while already running.
    pub fn start(&mut self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let now = self.backend.now();
        {
            let mut state = self.shared.state();
            state.next_note_time = now;
            state.current_step = 0;
            state.pending.clear();
        }
        self.start_time = Some(now);
        log::debug!("sequencer started at {now}");

        let backend = Arc::clone(&self.backend);
        let stage = Arc::clone(&self.stage);
        let shared = Arc::clone(&self.shared);
        let sixteenth_note_time = self.sixteenth_note_time;
        let track_pending = self.stop_policy == StopPolicy::CancelPending;
        self.worker = Some(thread::spawn(move || {
            while shared.running.load(Ordering::SeqCst) {
                run_scheduler_tick(
                    backend.as_ref(),
                    &stage,
                    &shared,
                    sixteenth_note_time,
                    track_pending,
                );
                thread::sleep(LOOKAHEAD);
            }
        }));
    }

    /// Halts scheduling, joins the polling thread, and resets the cursor.
    /// Idempotent.
    ///
    /// Under [`StopPolicy::CancelPending`], voices committed at a time
    /// still in the future are stopped now instead of sounding.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("scheduler thread panicked");
            }
        }
        self.start_time = None;

        let now = self.backend.now();
        let mut state = self.shared.state();
        state.current_step = 0;
        for (time, node) in state.pending.drain(..) {
            if self.stop_policy == StopPolicy::CancelPending && time > now {
                self.backend.stop_source(node, now);
            }
        }
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One scheduling pass: commit every step whose target time falls within
/// the schedule-ahead window.
///
/// The state lock is held for the whole pass so pattern edits land between
/// ticks, never between two instruments of the same step.
fn run_scheduler_tick(
    backend: &dyn AudioBackend,
    stage: &Stage,
    shared: &Shared,
    sixteenth_note_time: f64,
    track_pending: bool,
) {
    let now = backend.now();
    let horizon = now + SCHEDULE_AHEAD_TIME;
    let mut state = shared.state();
    if track_pending {
        // Voices whose trigger time has passed can no longer be cancelled;
        // dropping them keeps the ledger bounded by the lookahead window.
        state.pending.retain(|(time, _)| *time > now);
    }
    while state.next_note_time < horizon {
        let time = state.next_note_time;
        let step = state.current_step;

        let due: Vec<String> = state
            .pattern
            .iter()
            .filter(|(_, pattern)| pattern[step])
            .map(|(name, _)| name.clone())
            .collect();
        for name in due {
            let voices = stage.trigger_at(&name, time);
            if track_pending {
                state.pending.extend(voices.into_iter().map(|v| (time, v)));
            }
        }

        state.next_note_time = time + sixteenth_note_time;
        state.current_step = (step + 1) % STEPS_PER_PATTERN;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOp, RecordingBackend, Waveform};
    use crate::generators::Oscillator;
    use crate::instrument::Instrument;

    fn kick_stage(backend: &Arc<RecordingBackend>) -> Arc<Stage> {
        let stage = Arc::new(Stage::new(backend.clone() as Arc<dyn AudioBackend>));
        let mut kick = Instrument::new();
        kick.add_generator("sub", Oscillator::new(Waveform::Sine, 50.0));
        stage.add_instrument("kick", kick);
        stage
    }

    fn four_on_floor() -> StepPattern {
        let mut pattern = [false; STEPS_PER_PATTERN];
        for step in (0..STEPS_PER_PATTERN).step_by(4) {
            pattern[step] = true;
        }
        pattern
    }

    /// Drives ticks by hand against the manual clock, advancing in 25 ms
    /// hops like the polling thread would.
    fn run_ticks(
        backend: &RecordingBackend,
        stage: &Stage,
        shared: &Shared,
        sixteenth_note_time: f64,
        until: f64,
    ) {
        while backend.now() < until {
            run_scheduler_tick(backend, stage, shared, sixteenth_note_time, false);
            backend.advance(0.025);
        }
    }

    fn shared_with(pattern: HashMap<String, StepPattern>) -> Shared {
        Shared {
            running: AtomicBool::new(false),
            state: Mutex::new(SchedulerState {
                pattern,
                next_note_time: 0.0,
                current_step: 0,
                pending: Vec::new(),
            }),
        }
    }

    #[test]
    fn test_sixteenth_note_time_is_exact() {
        for bpm in [60.0, 90.0, 120.0, 128.0, 174.0] {
            let backend = Arc::new(RecordingBackend::new());
            let stage = kick_stage(&backend);
            let sequencer = Sequencer::new(backend, stage, SequencerOpts::new(bpm));
            assert_eq!(sequencer.sixteenth_note_time(), 15.0 / bpm);
        }
    }

    #[test]
    #[should_panic(expected = "tempo must be positive")]
    fn test_zero_tempo_rejected() {
        let backend = Arc::new(RecordingBackend::new());
        let stage = kick_stage(&backend);
        Sequencer::new(backend, stage, SequencerOpts::new(0.0));
    }

    #[test]
    fn test_four_on_floor_at_120_bpm() {
        let backend = Arc::new(RecordingBackend::new());
        let stage = kick_stage(&backend);
        let shared = shared_with(HashMap::from([("kick".to_string(), four_on_floor())]));

        run_ticks(&backend, &stage, &shared, 0.125, 1.9);

        let times: Vec<f64> = backend.scheduled_starts().iter().map(|(_, t)| *t).collect();
        assert_eq!(&times[..4], &[0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_all_ones_pattern_is_drift_free() {
        let backend = Arc::new(RecordingBackend::new());
        let stage = kick_stage(&backend);
        let shared = shared_with(HashMap::from([(
            "kick".to_string(),
            [true; STEPS_PER_PATTERN],
        )]));
        let sixteenth = 15.0 / 97.0; // awkward tempo, times never land on round numbers

        run_ticks(&backend, &stage, &shared, sixteenth, 5.0);

        let times: Vec<f64> = backend.scheduled_starts().iter().map(|(_, t)| *t).collect();
        assert!(times.len() > 16, "ran for multiple bars");
        for (i, pair) in times.windows(2).enumerate() {
            assert!(pair[1] > pair[0], "strictly increasing at index {i}");
            // Monotonic accumulation: step i is exactly i additions from 0
            let expected = (0..=i).fold(0.0, |acc, _| acc + sixteenth);
            assert_eq!(pair[1], expected, "no drift at index {i}");
        }
    }

    #[test]
    fn test_pattern_edit_lands_on_next_tick() {
        let backend = Arc::new(RecordingBackend::new());
        let stage = kick_stage(&backend);
        let shared = shared_with(HashMap::from([(
            "kick".to_string(),
            [false; STEPS_PER_PATTERN],
        )]));

        run_ticks(&backend, &stage, &shared, 0.125, 0.5);
        assert!(backend.scheduled_starts().is_empty());

        shared.state().pattern.insert("kick".to_string(), [true; STEPS_PER_PATTERN]);
        run_ticks(&backend, &stage, &shared, 0.125, 1.0);
        assert!(!backend.scheduled_starts().is_empty());
    }

    #[test]
    fn test_pattern_for_unknown_instrument_is_harmless() {
        let backend = Arc::new(RecordingBackend::new());
        let stage = kick_stage(&backend);
        let shared = shared_with(HashMap::from([(
            "cowbell".to_string(),
            [true; STEPS_PER_PATTERN],
        )]));

        run_ticks(&backend, &stage, &shared, 0.125, 1.0);
        assert!(backend.scheduled_starts().is_empty());
    }

    #[test]
    fn test_get_pattern_returns_independent_copy() {
        let backend = Arc::new(RecordingBackend::new());
        let stage = kick_stage(&backend);
        let sequencer = Sequencer::new(
            backend,
            stage,
            SequencerOpts::new(120.0).with_pattern("kick", four_on_floor()),
        );

        let mut copy = sequencer.get_pattern("kick").expect("pattern exists");
        copy[1] = true;
        assert_eq!(sequencer.get_pattern("kick"), Some(four_on_floor()));
        assert_eq!(sequencer.get_pattern("ghost"), None);
    }

    #[test]
    fn test_start_is_reentrant_and_stop_is_idempotent() {
        let backend = Arc::new(RecordingBackend::new());
        let stage = kick_stage(&backend);
        let mut sequencer = Sequencer::new(
            backend,
            stage,
            SequencerOpts::new(120.0).with_pattern("kick", four_on_floor()),
        );

        sequencer.start();
        let started_at = sequencer.start_time();
        sequencer.start(); // must not reset the in-progress run
        assert_eq!(sequencer.start_time(), started_at);
        assert!(sequencer.is_running());

        sequencer.stop();
        sequencer.stop();
        assert!(!sequencer.is_running());
        assert_eq!(sequencer.start_time(), None);
        assert_eq!(sequencer.current_step(), 0);
    }

    #[test]
    fn test_cancel_pending_stops_future_voices() {
        let backend = Arc::new(RecordingBackend::new());
        let stage = kick_stage(&backend);
        let shared = shared_with(HashMap::from([(
            "kick".to_string(),
            [true; STEPS_PER_PATTERN],
        )]));

        // One tick at t=0 commits steps at 0 and 0.0625 within the window
        run_scheduler_tick(&*backend, &stage, &shared, 0.0625, true);
        let committed = shared.state().pending.len();
        assert!(committed >= 2);

        // Emulate stop at t=0.03: the step at 0 has sounded, later ones not
        backend.set_time(0.03);
        let now = backend.now();
        backend.clear_ops();
        let mut state = shared.state();
        for (time, node) in state.pending.drain(..) {
            if time > now {
                backend.stop_source(node, now);
            }
        }
        drop(state);

        let stops = backend
            .ops()
            .iter()
            .filter(|op| matches!(op, BackendOp::StopSource { time, .. } if *time == 0.03))
            .count();
        assert_eq!(stops, committed - 1);
    }

    #[test]
    fn test_pending_ledger_bounded_by_lookahead_window() {
        let backend = Arc::new(RecordingBackend::new());
        let stage = kick_stage(&backend);
        let shared = shared_with(HashMap::from([(
            "kick".to_string(),
            [true; STEPS_PER_PATTERN],
        )]));

        // One simulated minute at 120 BPM with cancellation tracking on:
        // already-sounded voices must be pruned as the run progresses
        while backend.now() < 60.0 {
            run_scheduler_tick(&*backend, &stage, &shared, 0.125, true);
            backend.advance(0.025);
        }

        let pending = shared.state().pending.len();
        // At 0.125s per step, at most one step fits the 0.1s window
        assert!(
            pending <= 2,
            "only voices still inside the window are retained, got {pending}"
        );
        assert!(
            shared
                .state()
                .pending
                .iter()
                .all(|(time, _)| *time > backend.now() - SCHEDULE_AHEAD_TIME),
            "every retained voice is within the schedule-ahead window"
        );
    }
}
