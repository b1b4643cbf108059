//! Ordered, rebuildable pipeline of effects.

use crate::backend::{AudioBackend, NodeId};

use super::{Effect, EffectParams};

/// An ordered effect pipeline with a stable input/output pair.
///
/// The chain owns only the links *between* effects; each effect's private
/// sub-graph hangs off its own input node and is never touched by the
/// chain. Structural edits (`add`, `remove`, `move_to`) trigger a full
/// relink; bypass and parameter updates go straight to the named effect and
/// never change topology, so they are safe while audio is running.
///
/// # Examples
///
/// ```
/// use gooey::backend::RecordingBackend;
/// use gooey::{EffectChain, OverdriveEffect, OverdriveParams};
///
/// let backend = RecordingBackend::new();
/// let mut chain = EffectChain::new(&backend);
/// chain.add(&backend, OverdriveEffect::new(&backend, OverdriveParams::default()).into());
///
/// chain.set_bypassed_by_name(&backend, "Overdrive", true);
/// assert_eq!(chain.effect_names(), vec!["Overdrive"]);
/// ```
#[derive(Debug)]
pub struct EffectChain {
    input: NodeId,
    output: NodeId,
    effects: Vec<Effect>,
}

impl EffectChain {
    /// Creates an empty chain: `input → output`.
    pub fn new(backend: &dyn AudioBackend) -> Self {
        let input = backend.create_gain(1.0);
        let output = backend.create_gain(1.0);
        backend.connect(input, output);
        Self {
            input,
            output,
            effects: Vec::new(),
        }
    }

    /// The chain's input node. Voices feed this.
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// The chain's output node. This feeds the instrument's destination.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Number of effects in the chain.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether the chain holds no effects.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effect names in chain order.
    pub fn effect_names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.name()).collect()
    }

    /// Appends an effect and relinks.
    pub fn add(&mut self, backend: &dyn AudioBackend, effect: Effect) {
        self.insert(backend, self.effects.len(), effect);
    }

    /// Inserts an effect at `index` (clamped to the list length) and
    /// relinks.
    pub fn insert(&mut self, backend: &dyn AudioBackend, index: usize, effect: Effect) {
        let index = index.min(self.effects.len());
        self.effects.insert(index, effect);
        self.rebuild(backend);
    }

    /// Removes the named effect, relinks, and tears the effect down.
    /// Returns `false` when no effect has that name.
    pub fn remove(&mut self, backend: &dyn AudioBackend, name: &str) -> bool {
        let Some(position) = self.effects.iter().position(|e| e.name() == name) else {
            return false;
        };
        let effect = self.effects.remove(position);
        self.rebuild(backend);
        effect.teardown(backend);
        true
    }

    /// Moves the named effect to `new_index` (clamped) and relinks.
    /// Returns `false` when no effect has that name.
    pub fn move_to(&mut self, backend: &dyn AudioBackend, name: &str, new_index: usize) -> bool {
        let Some(position) = self.effects.iter().position(|e| e.name() == name) else {
            return false;
        };
        let effect = self.effects.remove(position);
        let new_index = new_index.min(self.effects.len());
        self.effects.insert(new_index, effect);
        self.rebuild(backend);
        true
    }

    /// Looks up an effect by name.
    pub fn find(&self, name: &str) -> Option<&Effect> {
        self.effects.iter().find(|e| e.name() == name)
    }

    /// Looks up an effect by name, mutably.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|e| e.name() == name)
    }

    /// Bypasses or restores the named effect. Gain change only, no
    /// relink. Returns `false` when no effect has that name.
    pub fn set_bypassed_by_name(
        &mut self,
        backend: &dyn AudioBackend,
        name: &str,
        bypassed: bool,
    ) -> bool {
        match self.find_mut(name) {
            Some(effect) => {
                effect.set_bypassed(backend, bypassed);
                true
            }
            None => false,
        }
    }

    /// Updates the named effect's parameters. No relink. Returns `false`
    /// when no effect has that name.
    pub fn update_by_name(
        &mut self,
        backend: &dyn AudioBackend,
        name: &str,
        params: EffectParams,
    ) -> bool {
        match self.find_mut(name) {
            Some(effect) => {
                effect.update(backend, params);
                true
            }
            None => false,
        }
    }

    /// Tears down every inter-effect link and relinks the whole pipeline
    /// in list order.
    ///
    /// Only chain-owned edges are dropped: the chain input's outgoing edges
    /// and each effect's *output* edges. Effect inputs are left alone
    /// because their internal graphs are wired from them.
    fn rebuild(&self, backend: &dyn AudioBackend) {
        backend.disconnect_all(self.input);
        for effect in &self.effects {
            backend.disconnect_all(effect.output());
        }

        let mut head = self.input;
        for effect in &self.effects {
            backend.connect(head, effect.input());
            head = effect.output();
        }
        backend.connect(head, self.output);
    }
}
