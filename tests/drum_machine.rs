//! End-to-end tests driving a full stage and sequencer against the
//! recording backend.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gooey::backend::{BackendOp, RecordingBackend};
use gooey::{
    kits, ADSRConfig, Instrument, Oscillator, OverdriveParams, Sequencer, SequencerOpts, Stage,
    StopPolicy, Waveform, STEPS_PER_PATTERN,
};

fn four_on_floor() -> [bool; STEPS_PER_PATTERN] {
    let mut pattern = [false; STEPS_PER_PATTERN];
    for step in (0..STEPS_PER_PATTERN).step_by(4) {
        pattern[step] = true;
    }
    pattern
}

/// Four-on-the-floor kick at 120 BPM lands on 0, 0.5, 1.0, 1.5 seconds,
/// scheduled by the real polling thread against a manually advanced clock.
#[test]
fn kick_pattern_schedules_on_the_beat() {
    let backend = Arc::new(RecordingBackend::new());
    let stage = Arc::new(Stage::new(backend.clone()));
    // Single-voice kick so every step maps to exactly one source start
    let mut kick = Instrument::new();
    let mut sub = Oscillator::new(Waveform::Sine, 50.0);
    sub.set_adsr(ADSRConfig::new(0.001, 0.3, 0.0, 0.05));
    kick.add_generator("sub", sub);
    stage.add_instrument("kick", kick);

    let mut sequencer = Sequencer::new(
        backend.clone(),
        stage,
        SequencerOpts::new(120.0).with_pattern("kick", four_on_floor()),
    );
    sequencer.start();

    // Walk the backend clock past 1.5s while the polling thread runs
    for _ in 0..40 {
        backend.advance(0.05);
        thread::sleep(Duration::from_millis(10));
    }
    thread::sleep(Duration::from_millis(60));
    sequencer.stop();

    let times: Vec<f64> = backend.scheduled_starts().iter().map(|(_, t)| *t).collect();
    assert!(times.len() >= 4, "expected at least one bar, got {times:?}");
    assert_eq!(&times[..4], &[0.0, 0.5, 1.0, 1.5]);
    // Monotonic throughout, even past the asserted prefix
    assert!(times.windows(2).all(|w| w[1] > w[0]));
}

/// Replacing an instrument under a live name must not break scheduling:
/// triggers resolve by name at fire time, not by captured reference.
#[test]
fn replacing_an_instrument_mid_run_is_safe() {
    let backend = Arc::new(RecordingBackend::new());
    let stage = Arc::new(Stage::new(backend.clone()));
    stage.add_instrument("snare", kits::make_snare(backend.as_ref(), Default::default()));

    let mut sequencer = Sequencer::new(
        backend.clone(),
        stage.clone(),
        SequencerOpts::new(120.0).with_pattern("snare", [true; STEPS_PER_PATTERN]),
    );
    sequencer.start();

    for i in 0..30 {
        backend.advance(0.05);
        if i == 10 {
            // Swap in a different voice under the same name while running
            let mut replacement = Instrument::new();
            replacement.add_generator("tone", Oscillator::new(Waveform::Triangle, 400.0));
            stage.add_instrument("snare", replacement);
        }
        thread::sleep(Duration::from_millis(10));
    }
    sequencer.stop();

    assert!(stage.has_instrument("snare"));
    let times: Vec<f64> = backend.scheduled_starts().iter().map(|(_, t)| *t).collect();
    assert!(!times.is_empty());
    assert!(times.windows(2).all(|w| w[1] >= w[0]));
}

/// Bypassing an effect after it was added changes gains only; the next
/// trigger flows through the untouched topology.
#[test]
fn bypassing_an_effect_never_rewires() {
    let backend = Arc::new(RecordingBackend::new());
    let stage = Arc::new(Stage::new(backend.clone()));
    stage.add_instrument(
        "kick",
        kits::make_snare(
            backend.as_ref(),
            kits::SnareConfig {
                overdrive: Some(OverdriveParams::default()),
                overdrive_enabled: true,
                ..Default::default()
            },
        ),
    );

    stage.trigger_at("kick", 0.0);
    backend.clear_ops();

    assert!(stage.set_instrument_effect_bypassed("kick", "Overdrive", true));
    let rewired = backend.ops().iter().any(|op| {
        matches!(
            op,
            BackendOp::Connect { .. } | BackendOp::Disconnect { .. } | BackendOp::DisconnectAll { .. }
        )
    });
    assert!(!rewired, "bypass must be a gain-only change");

    // Next trigger still schedules voices normally
    let voices = stage.trigger_at("kick", 0.5);
    assert_eq!(voices.len(), 2);
}

/// Stopping under CancelPending silences voices committed beyond "now".
#[test]
fn cancel_pending_cuts_committed_tail() {
    let backend = Arc::new(RecordingBackend::new());
    let stage = Arc::new(Stage::new(backend.clone()));
    let mut kick = Instrument::new();
    let mut sub = Oscillator::new(Waveform::Sine, 50.0);
    sub.set_adsr(ADSRConfig::new(0.001, 0.2, 0.0, 0.05));
    kick.add_generator("sub", sub);
    stage.add_instrument("kick", kick);

    let mut sequencer = Sequencer::new(
        backend.clone(),
        stage,
        SequencerOpts::new(120.0)
            .with_pattern("kick", [true; STEPS_PER_PATTERN])
            .with_stop_policy(StopPolicy::CancelPending),
    );
    sequencer.start();
    // First tick commits the step at t=0; nudging the clock to 0.05 pulls
    // the step at t=0.125 into the window, still in the future at stop time
    thread::sleep(Duration::from_millis(60));
    backend.advance(0.05);
    thread::sleep(Duration::from_millis(60));
    sequencer.stop();

    let cut = backend
        .ops()
        .iter()
        .filter(|op| matches!(op, BackendOp::StopSource { time, .. } if *time == 0.05))
        .count();
    assert!(cut >= 1, "future-committed voices are stopped at now");
    assert!(!sequencer.is_running());
}
