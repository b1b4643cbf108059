//! Gooey - a drum machine engine for Rust
//!
//! This library builds percussive voices from primitive signal generators,
//! shapes them with envelope and filter automation, routes them through
//! per-voice effect chains, mixes named instruments on a shared bus, and
//! triggers them against a 16-step pattern with a lookahead scheduler.
//!
//! All audio goes through the [`backend::AudioBackend`] trait; the crate
//! itself composes and schedules the signal graph but renders nothing. The
//! bundled [`backend::RecordingBackend`] logs every backend operation and
//! is what the tests (and the doc examples throughout) run against.

pub mod backend;
pub mod effects;
pub mod envelope;
pub mod filter;
pub mod generators;
pub mod instrument;
pub mod kits;
pub mod sequencer;
pub mod stage;

// Re-export commonly used types at the crate root
pub use backend::{AudioBackend, FilterType, NodeId, Waveform};
pub use effects::{
    Effect, EffectChain, EffectParams, OverdriveEffect, OverdriveParams, ReverbEffect,
    ReverbParams, WetDryRouter,
};
pub use envelope::{ADSRConfig, Envelope};
pub use filter::{Filter, FilterConfig};
pub use generators::{Generator, Noise, NoiseColor, Oscillator};
pub use instrument::Instrument;
pub use sequencer::{Sequencer, SequencerOpts, StepPattern, StopPolicy, STEPS_PER_PATTERN};
pub use stage::Stage;
