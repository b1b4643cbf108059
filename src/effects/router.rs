//! Shared wet/dry routing for single-in single-out effects.

use crate::backend::{AudioBackend, AudioParam, NodeId};

/// The uniform split/dry/wet/sum topology every effect is built on.
///
/// ```text
/// input → split → dry ────────→ sum → output
///            └──→ core…core ──→ wet ──┘
/// ```
///
/// The dry path carries `1 - mix`, the wet path `mix`. Bypassing forces wet
/// gain to 0 and dry gain to 1 **without disconnecting anything**, so
/// un-bypassing is an instantaneous, glitch-free gain change. The effect's
/// core nodes are installed once with [`install_core`](Self::install_core);
/// only the router-owned hookups (`split → core_in`, `core_out → wet`) are
/// ever rewired.
#[derive(Debug, Clone)]
pub struct WetDryRouter {
    input: NodeId,
    output: NodeId,
    split: NodeId,
    dry: NodeId,
    wet: NodeId,
    sum: NodeId,
    core: Option<(NodeId, NodeId)>,
    mix: f64,
    bypassed: bool,
}

impl WetDryRouter {
    /// Builds the router topology with the given initial mix (clamped to
    /// `[0, 1]`).
    pub fn new(backend: &dyn AudioBackend, mix: f64) -> Self {
        let mix = mix.clamp(0.0, 1.0);

        let input = backend.create_gain(1.0);
        let output = backend.create_gain(1.0);
        let split = backend.create_gain(1.0);
        let dry = backend.create_gain(1.0 - mix);
        let wet = backend.create_gain(mix);
        let sum = backend.create_gain(1.0);

        backend.connect(input, split);
        backend.connect(split, dry);
        backend.connect(dry, sum);
        backend.connect(sum, output);
        // Wet path is completed by install_core
        backend.connect(wet, sum);

        Self {
            input,
            output,
            split,
            dry,
            wet,
            sum,
            core: None,
            mix,
            bypassed: false,
        }
    }

    /// The router's input gain (fed by the chain).
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// The router's output gain (feeds the chain).
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Current wet mix in `[0, 1]`.
    pub fn mix(&self) -> f64 {
        self.mix
    }

    /// Whether the wet path is currently muted.
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Wires the effect's core processing nodes into the wet path:
    /// `split → core_in` and `core_out → wet`. Re-installing tears down
    /// only the previous router-owned hookups, never the core's internal
    /// wiring.
    pub fn install_core(&mut self, backend: &dyn AudioBackend, core_in: NodeId, core_out: NodeId) {
        if let Some((old_in, old_out)) = self.core {
            backend.disconnect(self.split, old_in);
            backend.disconnect(old_out, self.wet);
        }
        backend.connect(self.split, core_in);
        backend.connect(core_out, self.wet);
        self.core = Some((core_in, core_out));
    }

    /// Sets the wet mix (clamped to `[0, 1]`). A bypassed router keeps its
    /// wet gain at zero but remembers the mix for un-bypassing.
    pub fn set_mix(&mut self, backend: &dyn AudioBackend, mix: f64) {
        self.mix = mix.clamp(0.0, 1.0);
        let now = backend.now();
        let wet = if self.bypassed { 0.0 } else { self.mix };
        backend.set_value_at_time(self.wet, AudioParam::Gain, wet, now);
        backend.set_value_at_time(self.dry, AudioParam::Gain, 1.0 - self.mix, now);
    }

    /// Mutes or restores the wet path via gain values only; topology is
    /// untouched.
    pub fn set_bypassed(&mut self, backend: &dyn AudioBackend, bypassed: bool) {
        self.bypassed = bypassed;
        let now = backend.now();
        if bypassed {
            backend.set_value_at_time(self.wet, AudioParam::Gain, 0.0, now);
            backend.set_value_at_time(self.dry, AudioParam::Gain, 1.0, now);
        } else {
            backend.set_value_at_time(self.wet, AudioParam::Gain, self.mix, now);
            backend.set_value_at_time(self.dry, AudioParam::Gain, 1.0 - self.mix, now);
        }
    }

    /// Disconnects every router-owned node. Used when an effect is removed
    /// from a chain for good.
    pub fn teardown(&self, backend: &dyn AudioBackend) {
        backend.disconnect_all(self.input);
        backend.disconnect_all(self.output);
        backend.disconnect_all(self.split);
        backend.disconnect_all(self.dry);
        backend.disconnect_all(self.wet);
        backend.disconnect_all(self.sum);
        if let Some((core_in, core_out)) = self.core {
            backend.disconnect_all(core_in);
            backend.disconnect_all(core_out);
        }
    }
}
