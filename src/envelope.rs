//! ADSR envelopes as scheduled parameter automation.
//!
//! An [`Envelope`] does not generate samples. It *programs* a sequence of
//! backend automation primitives (set, linear ramp, exponential ramp,
//! target-decay ramp) onto a node parameter, anchored at an absolute start
//! time. Because the automation is scheduled against the backend clock, the
//! envelope is sample-accurate no matter how coarsely the control thread
//! runs.

use crate::backend::{AudioBackend, AudioParam, NodeId};

/// Exponential ramps are undefined at exactly zero, so every "silence"
/// target lands here instead.
pub(crate) const EXP_RAMP_EPSILON: f64 = 0.001;

/// Floor for every frequency-domain automation target, in Hz.
pub(crate) const MIN_FREQUENCY: f64 = 20.0;

/// Configuration for one ADSR automation curve.
///
/// `attack`, `decay`, and `release` are durations in seconds; `sustain` is a
/// level ratio in `[0, 1]`. The optional fields only matter for pitch
/// envelopes: `peak` and `end` are absolute frequencies in Hz, and `curve`
/// (when positive) selects a target-decay ramp with that time constant
/// instead of a fixed-duration exponential ramp, the "snappy pitch drop"
/// shape.
///
/// A config is immutable once constructed; an [`Envelope`] holds exactly one.
///
/// # Examples
///
/// ```
/// use gooey::ADSRConfig;
///
/// // A drum-style amplitude envelope: no sustain, quick decay.
/// let amp = ADSRConfig::new(0.001, 0.08, 0.0, 0.02);
///
/// // A snare pitch drop: 220 Hz gliding to 180 Hz with a fast curve.
/// let pitch = ADSRConfig::new(0.001, 0.049, 0.0, 0.0)
///     .with_peak(220.0)
///     .with_end(180.0)
///     .with_curve(0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ADSRConfig {
    /// Attack time in seconds
    pub attack: f64,
    /// Decay time in seconds
    pub decay: f64,
    /// Sustain level (0.0 to 1.0)
    pub sustain: f64,
    /// Release time in seconds
    pub release: f64,
    /// Peak value; defaults to 1.0 for amplitude, twice the base frequency
    /// for pitch
    pub peak: Option<f64>,
    /// End value for pitch envelopes; defaults to the base frequency
    pub end: Option<f64>,
    /// Decay time constant for target-decay pitch ramps
    pub curve: Option<f64>,
}

impl ADSRConfig {
    /// Creates a config from the four classic ADSR values.
    ///
    /// Times are clamped to be non-negative and `sustain` to `[0, 1]`.
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.0),
            peak: None,
            end: None,
            curve: None,
        }
    }

    /// Sets the peak value.
    pub fn with_peak(mut self, peak: f64) -> Self {
        self.peak = Some(peak);
        self
    }

    /// Sets the end value (pitch envelopes).
    pub fn with_end(mut self, end: f64) -> Self {
        self.end = Some(end);
        self
    }

    /// Sets the target-decay time constant (pitch envelopes).
    pub fn with_curve(mut self, curve: f64) -> Self {
        self.curve = Some(curve);
        self
    }
}

/// A time-parameterized automation curve applied to a backend parameter.
///
/// The same envelope can drive amplitude ([`apply`](Envelope::apply)),
/// oscillator pitch ([`apply_to_pitch`](Envelope::apply_to_pitch)), or
/// filter cutoff ([`apply_to_filter`](Envelope::apply_to_filter)); each
/// follows the same attack/decay phase structure against a different
/// parameter target.
///
/// # Examples
///
/// ```
/// use gooey::backend::{AudioBackend, RecordingBackend};
/// use gooey::{ADSRConfig, Envelope};
///
/// let backend = RecordingBackend::new();
/// let gain = backend.create_gain(1.0);
///
/// let env = Envelope::new(ADSRConfig::new(0.001, 0.1, 0.0, 0.05));
/// env.apply(&backend, gain, 2.0, None, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    config: ADSRConfig,
}

impl Envelope {
    /// Creates an envelope from a config.
    pub fn new(config: ADSRConfig) -> Self {
        Self { config }
    }

    /// Returns the config this envelope was built from.
    pub fn config(&self) -> &ADSRConfig {
        &self.config
    }

    /// Total attack + decay + release duration in seconds. Used to schedule
    /// source stop times past the end of the audible tail.
    pub fn tail_seconds(&self) -> f64 {
        self.config.attack + self.config.decay + self.config.release
    }

    /// Programs the amplitude envelope onto a gain node, anchored at
    /// `start_time`.
    ///
    /// The gain is set to zero at `start_time`, ramps linearly to the peak
    /// by `attack`, then ramps exponentially down to the sustain level by
    /// `attack + decay`. If `sustain` is zero (drum one-shots) or an
    /// explicit `note_length` is given, a final exponential ramp to silence
    /// is scheduled `release` seconds after the decay point (or after
    /// `note_length`). Otherwise the gain holds at the sustain level.
    ///
    /// `level` scales the whole curve and carries the per-generator volume.
    pub fn apply(
        &self,
        backend: &dyn AudioBackend,
        node: NodeId,
        start_time: f64,
        note_length: Option<f64>,
        level: f64,
    ) {
        let ADSRConfig {
            attack,
            decay,
            sustain,
            release,
            ..
        } = self.config;

        let peak = level * self.config.peak.unwrap_or(1.0);

        backend.set_value_at_time(node, AudioParam::Gain, 0.0, start_time);
        backend.linear_ramp_to_value_at_time(node, AudioParam::Gain, peak, start_time + attack);
        backend.exponential_ramp_to_value_at_time(
            node,
            AudioParam::Gain,
            (peak * sustain).max(EXP_RAMP_EPSILON),
            start_time + attack + decay,
        );

        if sustain == 0.0 || note_length.is_some() {
            let release_start = match note_length {
                Some(length) => start_time + length.max(0.0),
                None => start_time + attack + decay,
            };
            backend.exponential_ramp_to_value_at_time(
                node,
                AudioParam::Gain,
                EXP_RAMP_EPSILON,
                release_start + release,
            );
        }
        // With sustain > 0 and no note length the envelope holds at the
        // sustain level until the source's own stop time.
    }

    /// Programs a pitch envelope onto an oscillator's frequency, anchored
    /// at `start_time`.
    ///
    /// The frequency is pinned at the peak (default: twice `base_frequency`)
    /// and then falls to the end value (default: `base_frequency`). When the
    /// config carries a positive `curve`, the fall is a target-decay ramp
    /// with that time constant; otherwise it is an exponential ramp
    /// arriving at `attack + decay`. All targets are clamped to the audible
    /// floor.
    pub fn apply_to_pitch(
        &self,
        backend: &dyn AudioBackend,
        node: NodeId,
        base_frequency: f64,
        start_time: f64,
    ) {
        let base = base_frequency.max(MIN_FREQUENCY);
        let peak = self.config.peak.unwrap_or(base * 2.0).max(MIN_FREQUENCY);
        let end = self.config.end.unwrap_or(base).max(MIN_FREQUENCY);

        backend.set_value_at_time(node, AudioParam::Frequency, peak, start_time);

        match self.config.curve {
            Some(time_constant) if time_constant > 0.0 => {
                backend.set_target_at_time(
                    node,
                    AudioParam::Frequency,
                    end,
                    start_time + self.config.attack,
                    time_constant,
                );
            }
            _ => {
                backend.exponential_ramp_to_value_at_time(
                    node,
                    AudioParam::Frequency,
                    end,
                    start_time + self.config.attack + self.config.decay,
                );
            }
        }
    }

    /// Programs a cutoff sweep onto a filter's frequency, anchored at
    /// `start_time`.
    ///
    /// This is the amplitude shape mapped into the frequency domain: the
    /// cutoff starts at `base_frequency`, ramps up to
    /// `base * (1 + frequency_range)` by `attack`, falls exponentially back
    /// toward `base * sustain` by `attack + decay`, and for non-sustaining
    /// envelopes closes down to the audible floor after `release`.
    pub fn apply_to_filter(
        &self,
        backend: &dyn AudioBackend,
        node: NodeId,
        base_frequency: f64,
        frequency_range: f64,
        start_time: f64,
    ) {
        let ADSRConfig {
            attack,
            decay,
            sustain,
            release,
            ..
        } = self.config;

        let base = base_frequency.max(MIN_FREQUENCY);
        let range = frequency_range.max(0.0);
        let peak = (base * (1.0 + range)).max(MIN_FREQUENCY);

        backend.set_value_at_time(node, AudioParam::Frequency, base, start_time);
        backend.linear_ramp_to_value_at_time(
            node,
            AudioParam::Frequency,
            peak,
            start_time + attack,
        );
        backend.exponential_ramp_to_value_at_time(
            node,
            AudioParam::Frequency,
            (base * sustain).max(MIN_FREQUENCY),
            start_time + attack + decay,
        );

        if sustain == 0.0 {
            backend.exponential_ramp_to_value_at_time(
                node,
                AudioParam::Frequency,
                MIN_FREQUENCY,
                start_time + attack + decay + release,
            );
        }
    }
}
