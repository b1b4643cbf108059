//! Factory functions for ready-made drum voices.
//!
//! Each factory assembles an [`Instrument`] from the primitive generators,
//! tuned by ear. They double as worked examples of the composition API.

use crate::backend::{AudioBackend, Waveform};
use crate::effects::{Effect, OverdriveEffect, OverdriveParams, ReverbEffect, ReverbParams};
use crate::envelope::ADSRConfig;
use crate::filter::FilterConfig;
use crate::generators::{Noise, Oscillator};
use crate::instrument::Instrument;

/// A two-oscillator kick: a sub layer and a main layer, each at its own
/// frequency.
pub fn make_kick(freq1: f64, freq2: f64) -> Instrument {
    let mut instrument = Instrument::new();
    instrument.add_generator("sub", Oscillator::new(Waveform::Sine, freq1));
    instrument.add_generator("main", Oscillator::new(Waveform::Sine, freq2));
    instrument
}

/// Configuration for [`make_snare`].
#[derive(Debug, Clone, Copy)]
pub struct SnareConfig {
    /// Overall decay scale in seconds; the noise and tonal layers derive
    /// their envelope times from it
    pub decay_time: f64,
    /// Filter applied to the tonal oscillator
    pub filter: Option<FilterConfig>,
    /// Filter applied to the noise layer; falls back to `filter` when unset
    pub noise_filter: Option<FilterConfig>,
    /// Overdrive on the snare bus; starts bypassed unless
    /// `overdrive_enabled`
    pub overdrive: Option<OverdriveParams>,
    /// Whether the overdrive starts active rather than bypassed
    pub overdrive_enabled: bool,
    /// Reverb on the snare bus; starts bypassed unless `reverb_enabled`
    pub reverb: Option<ReverbParams>,
    /// Whether the reverb starts active rather than bypassed
    pub reverb_enabled: bool,
}

impl Default for SnareConfig {
    fn default() -> Self {
        Self {
            decay_time: 0.3,
            filter: None,
            noise_filter: None,
            overdrive: None,
            overdrive_enabled: false,
            reverb: None,
            reverb_enabled: false,
        }
    }
}

/// A snare: a 200 Hz sine body with a snappy 220→180 Hz pitch drop, layered
/// with filtered white noise, optionally through overdrive and reverb.
///
/// Effects given in the config are always added to the chain; the enabled
/// flags only control their initial bypass state, so toggling them later is
/// a gain change rather than a graph rebuild.
pub fn make_snare(backend: &dyn AudioBackend, config: SnareConfig) -> Instrument {
    let mut instrument = Instrument::new();

    let mut body = Oscillator::new(Waveform::Sine, 200.0);
    body.set_adsr(ADSRConfig::new(
        0.001,
        config.decay_time * 0.2,
        0.0,
        config.decay_time * 0.05,
    ));
    body.set_pitch_adsr(
        ADSRConfig::new(0.001, 0.049, 0.0, 0.0)
            .with_peak(220.0)
            .with_end(180.0)
            .with_curve(0.01),
    );

    let mut noise = Noise::white();
    noise.set_adsr(ADSRConfig::new(
        0.001,
        config.decay_time * 0.1,
        0.0,
        config.decay_time * 0.02,
    ));

    if let Some(filter) = config.filter {
        body.set_filter(Some(filter));
    }
    if let Some(filter) = config.noise_filter.or(config.filter) {
        noise.set_filter(Some(filter));
    }

    instrument.add_generator("sub", body);
    instrument.add_generator("noise", noise);

    if let Some(params) = config.overdrive {
        let mut effect = Effect::from(OverdriveEffect::new(backend, params));
        effect.set_bypassed(backend, !config.overdrive_enabled);
        instrument.add_effect(backend, effect);
    }
    if let Some(params) = config.reverb {
        let mut effect = Effect::from(ReverbEffect::new(backend, None, params));
        effect.set_bypassed(backend, !config.reverb_enabled);
        instrument.add_effect(backend, effect);
    }

    instrument
}

/// A closed hi-hat: two white-noise layers plus an 8 kHz sine for metallic
/// character, all with very short envelopes.
pub fn make_closed_hihat() -> Instrument {
    let mut instrument = Instrument::new();

    let mut main = Noise::white();
    main.set_adsr(ADSRConfig::new(0.001, 0.08, 0.0, 0.02));

    let mut brightness = Noise::white();
    brightness.set_adsr(ADSRConfig::new(0.001, 0.03, 0.0, 0.01));

    let mut metallic = Oscillator::new(Waveform::Sine, 8000.0);
    metallic.set_adsr(ADSRConfig::new(0.001, 0.09, 0.0, 0.01));
    metallic.set_pitch_adsr(ADSRConfig::new(0.001, 0.02, 0.0, 0.01));

    instrument.add_generator("main", main);
    instrument.add_generator("brightness", brightness);
    instrument.add_generator("metallic", metallic);
    instrument
}

/// An open hi-hat: same layering as the closed hat but with longer decays
/// and a little sustain so it rings.
pub fn make_open_hihat() -> Instrument {
    let mut instrument = Instrument::new();

    let mut main = Noise::white();
    main.set_adsr(ADSRConfig::new(0.001, 0.24, 0.3, 0.56));

    let mut brightness = Noise::white();
    brightness.set_adsr(ADSRConfig::new(0.001, 0.24, 0.0, 0.08));

    let mut metallic = Oscillator::new(Waveform::Sine, 5000.0);
    metallic.set_adsr(ADSRConfig::new(0.001, 0.32, 0.05, 0.24));
    metallic.set_pitch_adsr(ADSRConfig::new(0.001, 0.16, 0.0, 0.08));

    instrument.add_generator("main", main);
    instrument.add_generator("brightness", brightness);
    instrument.add_generator("metallic", metallic);
    instrument
}

/// Configuration for [`make_pink_hat`].
#[derive(Debug, Clone, Copy)]
pub struct PinkHatConfig {
    /// Overall decay scale in seconds
    pub decay_time: f64,
}

impl Default for PinkHatConfig {
    fn default() -> Self {
        Self { decay_time: 0.15 }
    }
}

/// A hat voice built from a single pink-noise burst. Softer than the
/// white-noise hats.
pub fn make_pink_hat(config: PinkHatConfig) -> Instrument {
    let mut instrument = Instrument::new();

    let mut pink = Noise::pink();
    pink.set_adsr(ADSRConfig::new(
        0.001,
        config.decay_time * 0.8,
        0.0,
        config.decay_time * 0.3,
    ));

    instrument.add_generator("pink", pink);
    instrument
}
