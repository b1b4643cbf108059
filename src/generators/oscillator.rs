//! Periodic oscillator generator.

use crate::backend::{AudioBackend, AudioParam, NodeId, Waveform};
use crate::envelope::{ADSRConfig, Envelope, EXP_RAMP_EPSILON, MIN_FREQUENCY};
use crate::filter::{Filter, FilterConfig};

use super::{DEFAULT_DECAY_SECONDS, DEFAULT_TAIL_SECONDS, STOP_MARGIN_SECONDS};

/// A periodic oscillator voice component.
///
/// Holds a base frequency and waveform plus optional amplitude envelope,
/// pitch envelope, and per-voice filter. Every [`start`](Oscillator::start)
/// allocates a fresh backend oscillator (and filter, if configured), so
/// repeated triggers never share node state.
///
/// # Examples
///
/// ```
/// use gooey::backend::Waveform;
/// use gooey::{ADSRConfig, Oscillator};
///
/// let mut osc = Oscillator::new(Waveform::Sine, 200.0);
/// osc.set_adsr(ADSRConfig::new(0.001, 0.06, 0.0, 0.015));
/// osc.set_pitch_adsr(
///     ADSRConfig::new(0.001, 0.049, 0.0, 0.0)
///         .with_peak(220.0)
///         .with_end(180.0)
///         .with_curve(0.01),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f64,
    volume: f64,
    envelope: Option<Envelope>,
    pitch_envelope: Option<Envelope>,
    filter: Option<Filter>,
}

impl Oscillator {
    /// Creates an oscillator voice with the given waveform and base
    /// frequency (clamped to the audible floor).
    pub fn new(waveform: Waveform, frequency: f64) -> Self {
        Self {
            waveform,
            frequency: frequency.max(MIN_FREQUENCY),
            volume: 1.0,
            envelope: None,
            pitch_envelope: None,
            filter: None,
        }
    }

    /// Base frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Waveform of the backend source this voice creates.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Sets the amplitude envelope.
    pub fn set_adsr(&mut self, config: ADSRConfig) {
        self.envelope = Some(Envelope::new(config));
    }

    /// Sets the pitch envelope applied to the fresh oscillator's frequency.
    pub fn set_pitch_adsr(&mut self, config: ADSRConfig) {
        self.pitch_envelope = Some(Envelope::new(config));
    }

    /// Sets or clears the per-voice filter.
    pub fn set_filter(&mut self, config: Option<FilterConfig>) {
        self.filter = config.map(Filter::new);
    }

    /// Sets the voice volume.
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.max(0.0);
    }

    /// Builds `oscillator → [filter] → gain → destination` from fresh
    /// nodes, applies the envelopes anchored at `time`, and starts the
    /// source. Returns the source node.
    pub fn start(&self, backend: &dyn AudioBackend, time: f64, destination: NodeId) -> NodeId {
        let source = backend.create_oscillator(self.waveform, self.frequency);
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

        if let Some(pitch) = &self.pitch_envelope {
            pitch.apply_to_pitch(backend, source, self.frequency, time);
        }

        backend.start_source(source, time);
        backend.stop_source(source, time + tail + STOP_MARGIN_SECONDS);
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOp, NodeKind, RecordingBackend};

    #[test]
    fn test_start_wires_source_gain_destination() {
        let backend = RecordingBackend::new();
        let destination = backend.create_gain(1.0);

        let osc = Oscillator::new(Waveform::Sine, 150.0);
        let source = osc.start(&backend, 0.0, destination);

        assert_eq!(backend.node_kind(source), Some(NodeKind::Oscillator));
        let gain = backend.outputs_of(source)[0];
        assert_eq!(backend.node_kind(gain), Some(NodeKind::Gain));
        assert_eq!(backend.outputs_of(gain), vec![destination]);
    }

    #[test]
    fn test_filter_spliced_before_gain() {
        let backend = RecordingBackend::new();
        let destination = backend.create_gain(1.0);

        let mut osc = Oscillator::new(Waveform::Square, 300.0);
        osc.set_filter(Some(FilterConfig::new(900.0)));
        let source = osc.start(&backend, 0.0, destination);

        let filter = backend.outputs_of(source)[0];
        assert_eq!(backend.node_kind(filter), Some(NodeKind::Filter));
        let gain = backend.outputs_of(filter)[0];
        assert_eq!(backend.node_kind(gain), Some(NodeKind::Gain));
    }

    #[test]
    fn test_repeated_triggers_allocate_fresh_nodes() {
        let backend = RecordingBackend::new();
        let destination = backend.create_gain(1.0);

        let osc = Oscillator::new(Waveform::Sine, 60.0);
        let first = osc.start(&backend, 0.0, destination);
        let second = osc.start(&backend, 0.125, destination);

        assert_ne!(first, second);
        assert_eq!(
            backend.scheduled_starts(),
            vec![(first, 0.0), (second, 0.125)]
        );
    }

    #[test]
    fn test_default_decay_when_no_envelope() {
        let backend = RecordingBackend::new();
        let destination = backend.create_gain(1.0);
        backend.clear_ops();

        let osc = Oscillator::new(Waveform::Sine, 440.0);
        osc.start(&backend, 1.0, destination);

        let decay = backend.ops().into_iter().find_map(|op| match op {
            BackendOp::ExponentialRamp {
                param: AudioParam::Gain,
                value,
                time,
                ..
            } => Some((value, time)),
            _ => None,
        });
        assert_eq!(decay, Some((EXP_RAMP_EPSILON, 1.0 + DEFAULT_DECAY_SECONDS)));
    }

    #[test]
    fn test_stop_scheduled_past_envelope_tail() {
        let backend = RecordingBackend::new();
        let destination = backend.create_gain(1.0);

        let mut osc = Oscillator::new(Waveform::Sine, 200.0);
        osc.set_adsr(ADSRConfig::new(0.001, 0.3, 0.0, 0.1));
        let source = osc.start(&backend, 2.0, destination);

        let stop = backend.ops().into_iter().find_map(|op| match op {
            BackendOp::StopSource { node, time } if node == source => Some(time),
            _ => None,
        });
        let tail_end = 2.0 + 0.001 + 0.3 + 0.1;
        assert!(stop.expect("stop scheduled") > tail_end);
    }

    #[test]
    fn test_frequency_clamped_to_floor() {
        let osc = Oscillator::new(Waveform::Sine, 1.0);
        assert_eq!(osc.frequency(), MIN_FREQUENCY);
    }
}
