//! Sound sources that build a fresh backend sub-graph per trigger.
//!
//! A generator is configuration for one voice component (an oscillator or a
//! noise source). Calling [`Generator::start`] allocates brand-new backend
//! nodes (`source → [filter] → gain → destination`), applies the amplitude
//! and pitch envelopes anchored at the trigger time, and starts the source.
//! Nothing is reused between triggers, mirroring the one-shot nature of a
//! struck drum: a new hit's envelope always restarts from silence and no
//! filter state leaks between hits.

mod noise;
mod oscillator;

pub use noise::{Noise, NoiseColor};
pub use oscillator::Oscillator;

use crate::backend::{AudioBackend, NodeId};
use crate::envelope::ADSRConfig;
use crate::filter::FilterConfig;

/// A sound source for one instrument voice component.
///
/// The set of generator kinds is closed; graph wiring and parameter updates
/// match on it exhaustively.
///
/// # Examples
///
/// ```
/// use gooey::backend::{AudioBackend, RecordingBackend, Waveform};
/// use gooey::{ADSRConfig, Generator, Noise, Oscillator};
///
/// let backend = RecordingBackend::new();
///
/// let mut sub = Generator::from(Oscillator::new(Waveform::Sine, 60.0));
/// sub.set_adsr(ADSRConfig::new(0.001, 0.3, 0.0, 0.05));
///
/// let snap = Generator::from(Noise::white());
///
/// // Each start builds and fires a fresh sub-graph.
/// let source = sub.start(&backend, 0.5, backend.destination());
/// snap.start(&backend, 0.5, backend.destination());
/// assert_eq!(backend.scheduled_starts()[0], (source, 0.5));
/// ```
#[derive(Debug, Clone)]
pub enum Generator {
    /// Periodic oscillator voice
    Oscillator(Oscillator),
    /// Buffered noise voice (white or pink)
    Noise(Noise),
}

impl Generator {
    /// Sets the amplitude envelope.
    pub fn set_adsr(&mut self, config: ADSRConfig) {
        match self {
            Generator::Oscillator(osc) => osc.set_adsr(config),
            Generator::Noise(noise) => noise.set_adsr(config),
        }
    }

    /// Sets the pitch envelope. Noise sources have no pitch; for them this
    /// is a logged no-op rather than an error.
    pub fn set_pitch_adsr(&mut self, config: ADSRConfig) {
        match self {
            Generator::Oscillator(osc) => osc.set_pitch_adsr(config),
            Generator::Noise(_) => {
                log::debug!("pitch envelope ignored for noise generator");
            }
        }
    }

    /// Sets or clears the per-voice filter.
    pub fn set_filter(&mut self, config: Option<FilterConfig>) {
        match self {
            Generator::Oscillator(osc) => osc.set_filter(config),
            Generator::Noise(noise) => noise.set_filter(config),
        }
    }

    /// Sets the voice volume (the amplitude envelope's peak scale).
    pub fn set_volume(&mut self, volume: f64) {
        match self {
            Generator::Oscillator(osc) => osc.set_volume(volume),
            Generator::Noise(noise) => noise.set_volume(volume),
        }
    }

    /// Builds a fresh backend sub-graph and starts it at `time`, routed
    /// into `destination`. Returns the source node so a scheduler can
    /// cancel not-yet-sounded voices.
    pub fn start(&self, backend: &dyn AudioBackend, time: f64, destination: NodeId) -> NodeId {
        match self {
            Generator::Oscillator(osc) => osc.start(backend, time, destination),
            Generator::Noise(noise) => noise.start(backend, time, destination),
        }
    }
}

impl From<Oscillator> for Generator {
    fn from(oscillator: Oscillator) -> Self {
        Generator::Oscillator(oscillator)
    }
}

impl From<Noise> for Generator {
    fn from(noise: Noise) -> Self {
        Generator::Noise(noise)
    }
}

/// Fallback amplitude shape when no envelope is configured: unity gain with
/// a fixed exponential decay, the original one-shot oscillator behavior.
pub(crate) const DEFAULT_DECAY_SECONDS: f64 = 0.2;

/// Fallback source lifetime when no envelope bounds the tail.
pub(crate) const DEFAULT_TAIL_SECONDS: f64 = 0.5;

/// Margin added past the envelope tail before stopping a source, so release
/// ramps are never cut off audibly.
pub(crate) const STOP_MARGIN_SECONDS: f64 = 0.1;
