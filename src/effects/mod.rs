//! Per-voice audio effects and the effect chain.
//!
//! Effects follow a uniform wet/dry topology (see [`WetDryRouter`]) and a
//! closed set of kinds: the [`Effect`] sum type matches exhaustively for
//! graph wiring and parameter updates. Ordering and routing between effects
//! is the [`EffectChain`]'s job.

mod chain;
mod overdrive;
mod reverb;
mod router;

pub use chain::EffectChain;
pub use overdrive::{OverdriveEffect, OverdriveParams};
pub use reverb::{ReverbEffect, ReverbParams};
pub use router::WetDryRouter;

use crate::backend::{AudioBackend, NodeId};

/// A per-voice audio effect. The set of kinds is closed and matched
/// exhaustively.
///
/// Effects are addressed by stable name (`"Overdrive"`, `"Reverb"`) when
/// bypassing or updating through a chain, instrument, or stage.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Arctangent soft-clip distortion
    Overdrive(OverdriveEffect),
    /// Convolution reverberator
    Reverb(ReverbEffect),
}

/// A parameter update addressed to one effect kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectParams {
    /// Update for an overdrive effect
    Overdrive(OverdriveParams),
    /// Update for a reverb effect
    Reverb(ReverbParams),
}

impl Effect {
    /// Stable lookup name of this effect kind.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Overdrive(_) => "Overdrive",
            Effect::Reverb(_) => "Reverb",
        }
    }

    /// Input node of the effect's wet/dry router.
    pub fn input(&self) -> NodeId {
        self.router().input()
    }

    /// Output node of the effect's wet/dry router.
    pub fn output(&self) -> NodeId {
        self.router().output()
    }

    /// Whether the wet path is currently muted.
    pub fn is_bypassed(&self) -> bool {
        self.router().is_bypassed()
    }

    /// Mutes or restores the wet path. Gain values only; never a graph
    /// change.
    pub fn set_bypassed(&mut self, backend: &dyn AudioBackend, bypassed: bool) {
        self.router_mut().set_bypassed(backend, bypassed);
    }

    /// Sets the wet mix (clamped to `[0, 1]`).
    pub fn set_mix(&mut self, backend: &dyn AudioBackend, mix: f64) {
        self.router_mut().set_mix(backend, mix);
    }

    /// Applies a parameter update. A params variant that doesn't match the
    /// effect kind is logged and ignored rather than being an error.
    pub fn update(&mut self, backend: &dyn AudioBackend, params: EffectParams) {
        match (self, params) {
            (Effect::Overdrive(effect), EffectParams::Overdrive(params)) => {
                effect.update(backend, params);
            }
            (Effect::Reverb(effect), EffectParams::Reverb(params)) => {
                effect.update(backend, params);
            }
            (effect, params) => {
                log::warn!(
                    "effect parameter kind mismatch: {:?} sent to {}",
                    params,
                    effect.name()
                );
            }
        }
    }

    /// Disconnects the effect's router nodes. Used on permanent removal
    /// from a chain.
    pub fn teardown(&self, backend: &dyn AudioBackend) {
        self.router().teardown(backend);
    }

    fn router(&self) -> &WetDryRouter {
        match self {
            Effect::Overdrive(effect) => effect.router(),
            Effect::Reverb(effect) => effect.router(),
        }
    }

    fn router_mut(&mut self) -> &mut WetDryRouter {
        match self {
            Effect::Overdrive(effect) => effect.router_mut(),
            Effect::Reverb(effect) => effect.router_mut(),
        }
    }
}

impl From<OverdriveEffect> for Effect {
    fn from(effect: OverdriveEffect) -> Self {
        Effect::Overdrive(effect)
    }
}

impl From<ReverbEffect> for Effect {
    fn from(effect: ReverbEffect) -> Self {
        Effect::Reverb(effect)
    }
}
