//! Simple drum machine demonstration.
//!
//! Builds a four-voice kit, runs a bar of a classic house pattern through
//! the lookahead sequencer against the recording backend, and prints the
//! schedule the backend received. Swap in a real backend implementation to
//! hear it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use gooey::backend::RecordingBackend;
use gooey::{kits, Sequencer, SequencerOpts, Stage, STEPS_PER_PATTERN};

fn steps(on: &[usize]) -> [bool; STEPS_PER_PATTERN] {
    let mut pattern = [false; STEPS_PER_PATTERN];
    for &step in on {
        pattern[step] = true;
    }
    pattern
}

fn main() -> Result<()> {
    println!("Gooey Drum Machine Demo\n");

    let backend = Arc::new(RecordingBackend::new());
    let stage = Arc::new(Stage::new(backend.clone()));

    stage.add_instrument("kick", kits::make_kick(50.0, 80.0));
    stage.add_instrument(
        "snare",
        kits::make_snare(backend.as_ref(), kits::SnareConfig::default()),
    );
    stage.add_instrument("hat", kits::make_closed_hihat());
    stage.add_instrument("open-hat", kits::make_open_hihat());

    let mut sequencer = Sequencer::new(
        backend.clone(),
        stage,
        SequencerOpts::new(120.0)
            .with_pattern("kick", steps(&[0, 4, 8, 12]))
            .with_pattern("snare", steps(&[4, 12]))
            .with_pattern("hat", steps(&[0, 2, 4, 6, 8, 10, 12, 14]))
            .with_pattern("open-hat", steps(&[2, 6, 10, 14])),
    );

    println!(
        "120 BPM, one step every {} seconds\n",
        sequencer.sixteenth_note_time()
    );

    // Two bars: walk the backend clock forward under the polling thread
    sequencer.start();
    for _ in 0..80 {
        backend.advance(0.05);
        thread::sleep(Duration::from_millis(10));
    }
    sequencer.stop();

    println!("Scheduled {} voice starts:", backend.scheduled_starts().len());
    for (node, time) in backend.scheduled_starts() {
        println!("  t={time:>6.3}s  node {}", node.0);
    }

    Ok(())
}
