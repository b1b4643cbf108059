//! A named bundle of generators behind an optional effect chain.

use crate::backend::{AudioBackend, NodeId};
use crate::effects::{Effect, EffectChain, EffectParams};
use crate::filter::FilterConfig;
use crate::generators::Generator;

/// One logical drum voice: a set of named generators fired together,
/// optionally routed through an [`EffectChain`] on their way to the mix.
///
/// Generators are added at construction time and persist across triggers;
/// the backend sub-graphs they build are single-use per hit. The effect
/// chain is created lazily on the first [`add_effect`](Self::add_effect).
///
/// # Examples
///
/// ```
/// use gooey::backend::{AudioBackend, RecordingBackend, Waveform};
/// use gooey::{ADSRConfig, Instrument, Oscillator};
///
/// let backend = RecordingBackend::new();
/// let mut kick = Instrument::new();
///
/// let mut sub = Oscillator::new(Waveform::Sine, 50.0);
/// sub.set_adsr(ADSRConfig::new(0.001, 0.3, 0.0, 0.05));
/// kick.add_generator("sub", sub);
///
/// let voices = kick.trigger_at(&backend, 0.5, backend.destination());
/// assert_eq!(voices.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Instrument {
    /// Insertion-ordered so triggers fire generators deterministically
    generators: Vec<(String, Generator)>,
    chain: Option<EffectChain>,
    /// Where the chain output currently feeds, if anywhere
    chain_destination: Option<NodeId>,
}

impl Instrument {
    /// Creates an instrument with no generators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named generator. Re-using a name replaces the previous
    /// generator.
    pub fn add_generator(&mut self, name: impl Into<String>, generator: impl Into<Generator>) {
        let name = name.into();
        let generator = generator.into();
        match self.generators.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = generator,
            None => self.generators.push((name, generator)),
        }
    }

    /// Looks up a generator by name, mutably (for per-generator volume,
    /// envelope, or filter edits).
    pub fn generator_mut(&mut self, name: &str) -> Option<&mut Generator> {
        self.generators
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g)
    }

    /// Generator names in insertion order.
    pub fn generator_names(&self) -> Vec<&str> {
        self.generators.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Appends an effect, creating the chain on first use.
    pub fn add_effect(&mut self, backend: &dyn AudioBackend, effect: Effect) {
        if self.chain.is_none() {
            self.chain = Some(EffectChain::new(backend));
        }
        if let Some(chain) = &mut self.chain {
            chain.add(backend, effect);
        }
    }

    /// The effect chain, if one has been created.
    pub fn effect_chain(&self) -> Option<&EffectChain> {
        self.chain.as_ref()
    }

    /// Sets or clears the per-voice filter on every generator.
    pub fn set_filter(&mut self, config: Option<FilterConfig>) {
        for (_, generator) in &mut self.generators {
            generator.set_filter(config);
        }
    }

    /// Bypasses or restores a chained effect by name. Returns `false` when
    /// there is no chain or no such effect.
    pub fn set_effect_bypassed(
        &mut self,
        backend: &dyn AudioBackend,
        effect_name: &str,
        bypassed: bool,
    ) -> bool {
        match &mut self.chain {
            Some(chain) => chain.set_bypassed_by_name(backend, effect_name, bypassed),
            None => false,
        }
    }

    /// Updates a chained effect's parameters by name. Returns `false` when
    /// there is no chain or no such effect.
    pub fn update_effect(
        &mut self,
        backend: &dyn AudioBackend,
        effect_name: &str,
        params: EffectParams,
    ) -> bool {
        match &mut self.chain {
            Some(chain) => chain.update_by_name(backend, effect_name, params),
            None => false,
        }
    }

    /// Fires every generator now.
    pub fn trigger(&mut self, backend: &dyn AudioBackend, destination: NodeId) -> Vec<NodeId> {
        self.trigger_at(backend, backend.now(), destination)
    }

    /// Fires every generator at the shared absolute `time`, routed into
    /// `destination` (directly, or through the effect chain when present).
    /// Returns the started source nodes.
    ///
    /// The chain output holds exactly one connection to the current
    /// destination: when the destination changes between triggers, the old
    /// edge is torn down before the new one is made, so repeated triggers
    /// never accumulate duplicate connections.
    pub fn trigger_at(
        &mut self,
        backend: &dyn AudioBackend,
        time: f64,
        destination: NodeId,
    ) -> Vec<NodeId> {
        let target = match &self.chain {
            Some(chain) => {
                if self.chain_destination != Some(destination) {
                    if let Some(previous) = self.chain_destination {
                        backend.disconnect(chain.output(), previous);
                    }
                    backend.connect(chain.output(), destination);
                    self.chain_destination = Some(destination);
                }
                chain.input()
            }
            None => destination,
        };

        self.generators
            .iter()
            .map(|(_, generator)| generator.start(backend, time, target))
            .collect()
    }
}
