//! Buffered noise generators.
//!
//! Noise voices play a short pre-rendered buffer (0.2 s) through a fresh
//! buffer source per trigger. White noise is uniform random samples; pink
//! noise applies Paul Kellet's filtered-white approximation while filling
//! the buffer.

use rand::Rng;

use crate::backend::{AudioBackend, AudioParam, NodeId};
use crate::envelope::{ADSRConfig, Envelope, EXP_RAMP_EPSILON};
use crate::filter::{Filter, FilterConfig};

use super::{DEFAULT_DECAY_SECONDS, DEFAULT_TAIL_SECONDS, STOP_MARGIN_SECONDS};

/// Length of the pre-rendered noise buffer in seconds.
const BUFFER_SECONDS: f64 = 0.2;

/// Spectral color of a noise voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseColor {
    /// Equal power across all frequencies
    White,
    /// Power falls off at ~3 dB per octave
    Pink,
}

/// A buffered noise voice component.
///
/// # Examples
///
/// ```
/// use gooey::{ADSRConfig, Noise};
///
/// let mut hat = Noise::pink();
/// hat.set_adsr(ADSRConfig::new(0.001, 0.12, 0.0, 0.045));
/// ```
#[derive(Debug, Clone)]
pub struct Noise {
    color: NoiseColor,
    volume: f64,
    envelope: Option<Envelope>,
    filter: Option<Filter>,
}

impl Noise {
    /// Creates a white noise voice.
    pub fn white() -> Self {
        Self::with_color(NoiseColor::White)
    }

    /// Creates a pink noise voice.
    pub fn pink() -> Self {
        Self::with_color(NoiseColor::Pink)
    }

    /// Creates a noise voice of the given color.
    pub fn with_color(color: NoiseColor) -> Self {
        Self {
            color,
            volume: 1.0,
            envelope: None,
            filter: None,
        }
    }

    /// Spectral color of this voice.
    pub fn color(&self) -> NoiseColor {
        self.color
    }

    /// Sets the amplitude envelope.
    pub fn set_adsr(&mut self, config: ADSRConfig) {
        self.envelope = Some(Envelope::new(config));
    }

    /// Sets or clears the per-voice filter.
    pub fn set_filter(&mut self, config: Option<FilterConfig>) {
        self.filter = config.map(Filter::new);
    }

    /// Sets the voice volume.
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.max(0.0);
    }

    /// Builds `buffer source → [filter] → gain → destination` from fresh
    /// nodes, applies the amplitude envelope anchored at `time`, and starts
    /// the source. Returns the source node.
    pub fn start(&self, backend: &dyn AudioBackend, time: f64, destination: NodeId) -> NodeId {
        let samples = self.render_buffer(backend.sample_rate());
        let source = backend.create_buffer_source(&samples);
        let gain = backend.create_gain(1.0);

        match &self.filter {
            Some(filter) => {
                filter.apply(backend, source, gain, time);
            }
            None => backend.connect(source, gain),
        }
        backend.connect(gain, destination);

        let tail = match &self.envelope {
            Some(envelope) => {
                envelope.apply(backend, gain, time, None, self.volume);
                envelope.tail_seconds().max(DEFAULT_DECAY_SECONDS)
            }
            None => {
                backend.set_value_at_time(gain, AudioParam::Gain, self.volume, time);
                backend.exponential_ramp_to_value_at_time(
                    gain,
                    AudioParam::Gain,
                    EXP_RAMP_EPSILON,
                    time + DEFAULT_DECAY_SECONDS,
                );
                DEFAULT_TAIL_SECONDS
            }
        };

        backend.start_source(source, time);
        backend.stop_source(source, time + tail + STOP_MARGIN_SECONDS);
        source
    }

    fn render_buffer(&self, sample_rate: f64) -> Vec<f32> {
        let length = (sample_rate * BUFFER_SECONDS).max(1.0) as usize;
        match self.color {
            NoiseColor::White => white_buffer(length),
            NoiseColor::Pink => pink_buffer(length),
        }
    }
}

fn white_buffer(length: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..length).map(|_| rng.gen_range(-1.0..=1.0)).collect()
}

/// Pink noise via Paul Kellet's economy method: seven one-pole filters over
/// a white source, summed with fixed weights.
fn pink_buffer(length: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    let (mut b0, mut b1, mut b2, mut b3, mut b4, mut b5, mut b6) =
        (0.0f64, 0.0f64, 0.0f64, 0.0f64, 0.0f64, 0.0f64, 0.0f64);

    (0..length)
        .map(|_| {
            let white: f64 = rng.gen_range(-1.0..=1.0);

            b0 = 0.99886 * b0 + white * 0.0555179;
            b1 = 0.99332 * b1 + white * 0.0750759;
            b2 = 0.969 * b2 + white * 0.153852;
            b3 = 0.8665 * b3 + white * 0.3104856;
            b4 = 0.55 * b4 + white * 0.5329522;
            b5 = -0.7616 * b5 - white * 0.016898;

            let pink = (b0 + b1 + b2 + b3 + b4 + b5 + b6 + white * 0.5362) * 0.11;
            b6 = white * 0.115926;
            pink as f32
        })
        .collect()
}
