//! The mixing stage: named instruments feeding a shared main output.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::{AudioBackend, AudioParam, NodeId};
use crate::effects::EffectParams;
use crate::filter::FilterConfig;
use crate::instrument::Instrument;

/// A named instrument and its per-channel gain node.
#[derive(Debug)]
struct Channel {
    instrument: Instrument,
    gain: NodeId,
}

/// The mixing stage.
///
/// Instruments register under a name and get a dedicated channel gain
/// feeding the main output gain, which in turn feeds the backend
/// destination (or wherever [`connect`](Self::connect) points it).
/// Triggers address instruments by name; unknown names are ignored.
///
/// The stage holds the backend as `Arc<dyn AudioBackend>` and is itself
/// shared behind an `Arc` so the sequencer's worker thread can trigger
/// into it. Channel state lives under a single mutex; no lock is held
/// across backend calls that could re-enter the stage.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gooey::backend::RecordingBackend;
/// use gooey::{kits, Stage};
///
/// let backend = Arc::new(RecordingBackend::new());
/// let stage = Stage::new(backend.clone());
/// stage.add_instrument("kick", kits::make_kick(50.0, 80.0));
/// stage.trigger("kick");
/// assert!(stage.has_instrument("kick"));
/// ```
#[derive(Debug)]
pub struct Stage {
    backend: Arc<dyn AudioBackend>,
    main_out: NodeId,
    channels: Mutex<HashMap<String, Channel>>,
}

impl Stage {
    /// Creates a stage wired to the backend destination.
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        let main_out = backend.create_gain(1.0);
        backend.connect(main_out, backend.destination());
        Self {
            backend,
            main_out,
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, Channel>> {
        // A panic while holding this lock leaves the map structurally
        // intact, so the poisoned state is safe to take over.
        match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// The backend this stage plays through.
    pub fn backend(&self) -> &Arc<dyn AudioBackend> {
        &self.backend
    }

    /// The main output gain node.
    pub fn main_output(&self) -> NodeId {
        self.main_out
    }

    /// Registers an instrument under `name`, giving it a fresh channel
    /// gain. Re-using a name replaces the old instrument and disconnects
    /// its channel.
    pub fn add_instrument(&self, name: impl Into<String>, instrument: Instrument) {
        let name = name.into();
        let gain = self.backend.create_gain(1.0);
        self.backend.connect(gain, self.main_out);

        let previous = self.channels().insert(name.clone(), Channel { instrument, gain });
        if let Some(previous) = previous {
            log::warn!("instrument {name:?} replaced");
            self.backend.disconnect_all(previous.gain);
        }
    }

    /// Whether an instrument named `name` is registered.
    pub fn has_instrument(&self, name: &str) -> bool {
        self.channels().contains_key(name)
    }

    /// Names of all registered instruments, sorted.
    pub fn instrument_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels().keys().cloned().collect();
        names.sort();
        names
    }

    /// Triggers the named instrument now.
    pub fn trigger(&self, name: &str) -> Vec<NodeId> {
        self.trigger_at(name, self.backend.now())
    }

    /// Triggers the named instrument at the absolute backend `time`.
    /// Returns the started source nodes, or an empty vec for an unknown
    /// name.
    pub fn trigger_at(&self, name: &str, time: f64) -> Vec<NodeId> {
        let mut channels = self.channels();
        match channels.get_mut(name) {
            Some(channel) => {
                let gain = channel.gain;
                channel.instrument.trigger_at(self.backend.as_ref(), time, gain)
            }
            None => {
                log::debug!("trigger for unknown instrument {name:?}");
                Vec::new()
            }
        }
    }

    /// Sets the main output volume (clamped to >= 0).
    pub fn set_main_volume(&self, volume: f64) {
        self.backend.set_value_at_time(
            self.main_out,
            AudioParam::Gain,
            volume.max(0.0),
            self.backend.now(),
        );
    }

    /// Sets the named instrument's channel volume (clamped to >= 0).
    /// Returns `false` for an unknown name.
    pub fn set_instrument_volume(&self, name: &str, volume: f64) -> bool {
        let gain = match self.channels().get(name) {
            Some(channel) => channel.gain,
            None => return false,
        };
        self.backend.set_value_at_time(
            gain,
            AudioParam::Gain,
            volume.max(0.0),
            self.backend.now(),
        );
        true
    }

    /// Sets or clears the per-voice filter on every generator of the named
    /// instrument. Returns `false` for an unknown name.
    pub fn set_instrument_filter(&self, name: &str, config: Option<FilterConfig>) -> bool {
        match self.channels().get_mut(name) {
            Some(channel) => {
                channel.instrument.set_filter(config);
                true
            }
            None => false,
        }
    }

    /// Bypasses or restores an effect on the named instrument. Returns
    /// `false` when either name is unknown.
    pub fn set_instrument_effect_bypassed(
        &self,
        name: &str,
        effect_name: &str,
        bypassed: bool,
    ) -> bool {
        match self.channels().get_mut(name) {
            Some(channel) => channel.instrument.set_effect_bypassed(
                self.backend.as_ref(),
                effect_name,
                bypassed,
            ),
            None => false,
        }
    }

    /// Updates an effect's parameters on the named instrument. Returns
    /// `false` when either name is unknown.
    pub fn update_instrument_effect(
        &self,
        name: &str,
        effect_name: &str,
        params: EffectParams,
    ) -> bool {
        match self.channels().get_mut(name) {
            Some(channel) => {
                channel
                    .instrument
                    .update_effect(self.backend.as_ref(), effect_name, params)
            }
            None => false,
        }
    }

    /// Mutates the named instrument in place. Returns `false` for an
    /// unknown name.
    pub fn with_instrument_mut(&self, name: &str, f: impl FnOnce(&mut Instrument)) -> bool {
        match self.channels().get_mut(name) {
            Some(channel) => {
                f(&mut channel.instrument);
                true
            }
            None => false,
        }
    }

    /// Repoints the main output at `destination`, or back at the backend
    /// destination when `None`.
    pub fn connect(&self, destination: Option<NodeId>) {
        self.backend.disconnect_all(self.main_out);
        let target = destination.unwrap_or_else(|| self.backend.destination());
        self.backend.connect(self.main_out, target);
    }

    /// Detaches the main output entirely. Silences the whole stage.
    pub fn disconnect(&self) {
        self.backend.disconnect_all(self.main_out);
    }
}
