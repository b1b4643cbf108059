//! Convolution reverb effect.

use rand::Rng;

use crate::backend::{AudioBackend, AudioParam, NodeId};

use super::router::WetDryRouter;

const DEFAULT_MIX: f64 = 0.3;
const DEFAULT_IMPULSE_SECONDS: f64 = 2.0;
const DEFAULT_IMPULSE_DECAY: f64 = 2.0;

/// Parameter update for a reverb effect. Fields left `None` are untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReverbParams {
    /// Wet mix in `[0, 1]`
    pub mix: Option<f64>,
    /// Pre-delay before the reverberator, in milliseconds; clamped to >= 0
    pub pre_delay_ms: Option<f64>,
}

/// Convolution reverberator on the wet path, with an optional pre-delay.
///
/// If no impulse response is supplied, a generated one (exponentially
/// decaying noise) keeps the effect audible out of the box. The pre-delay
/// node is created lazily on the first `pre_delay_ms` update and spliced in
/// front of the convolver; later updates only retune it.
#[derive(Debug, Clone)]
pub struct ReverbEffect {
    router: WetDryRouter,
    convolver: NodeId,
    pre_delay: Option<NodeId>,
}

impl ReverbEffect {
    /// Creates a reverb effect, applying any parameters given. `impulse`
    /// overrides the generated default response.
    pub fn new(
        backend: &dyn AudioBackend,
        impulse: Option<&[f32]>,
        params: ReverbParams,
    ) -> Self {
        let mix = params.mix.unwrap_or(DEFAULT_MIX);
        let mut router = WetDryRouter::new(backend, mix);

        let generated;
        let impulse = match impulse {
            Some(samples) => samples,
            None => {
                generated = default_impulse_response(
                    backend.sample_rate(),
                    DEFAULT_IMPULSE_SECONDS,
                    DEFAULT_IMPULSE_DECAY,
                );
                &generated
            }
        };
        let convolver = backend.create_convolver(impulse);
        router.install_core(backend, convolver, convolver);

        let mut effect = Self {
            router,
            convolver,
            pre_delay: None,
        };
        if params.pre_delay_ms.is_some() {
            effect.update(backend, ReverbParams {
                mix: None,
                pre_delay_ms: params.pre_delay_ms,
            });
        }
        effect
    }

    pub(crate) fn router(&self) -> &WetDryRouter {
        &self.router
    }

    pub(crate) fn router_mut(&mut self) -> &mut WetDryRouter {
        &mut self.router
    }

    /// Replaces the impulse response on the live convolver.
    pub fn set_impulse(&self, backend: &dyn AudioBackend, impulse: &[f32]) {
        backend.set_convolver_impulse(self.convolver, impulse);
    }

    /// Applies a partial parameter update to the live nodes.
    pub fn update(&mut self, backend: &dyn AudioBackend, params: ReverbParams) {
        if let Some(mix) = params.mix {
            self.router.set_mix(backend, mix);
        }
        if let Some(pre_delay_ms) = params.pre_delay_ms {
            let seconds = pre_delay_ms.max(0.0) / 1000.0;
            match self.pre_delay {
                Some(delay) => {
                    backend.set_value_at_time(
                        delay,
                        AudioParam::DelayTime,
                        seconds,
                        backend.now(),
                    );
                }
                None => {
                    // First pre-delay request: splice delay -> convolver
                    let delay = backend.create_delay(seconds);
                    backend.connect(delay, self.convolver);
                    self.router.install_core(backend, delay, self.convolver);
                    self.pre_delay = Some(delay);
                }
            }
        }
    }
}

/// Exponentially decaying noise impulse: `noise(t) * (1 - t)^decay`.
fn default_impulse_response(sample_rate: f64, duration_seconds: f64, decay: f64) -> Vec<f32> {
    let length = ((duration_seconds * sample_rate) as usize).max(1);
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|i| {
            let t = i as f64 / length as f64;
            let sample: f64 = rng.gen_range(-1.0..=1.0);
            (sample * (1.0 - t).powf(decay)) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NodeKind, RecordingBackend};

    #[test]
    fn test_default_impulse_decays() {
        let impulse = default_impulse_response(44100.0, 1.0, 2.0);
        assert_eq!(impulse.len(), 44100);
        let head: f32 = impulse[..1000].iter().map(|s| s.abs()).sum();
        let tail: f32 = impulse[impulse.len() - 1000..].iter().map(|s| s.abs()).sum();
        assert!(head > tail * 10.0, "impulse energy decays over time");
    }

    #[test]
    fn test_convolver_installed_as_core() {
        let backend = RecordingBackend::new();
        let effect = ReverbEffect::new(&backend, None, ReverbParams::default());
        assert_eq!(backend.node_kind(effect.convolver), Some(NodeKind::Convolver));
    }

    #[test]
    fn test_pre_delay_created_lazily_then_retuned() {
        let backend = RecordingBackend::new();
        let mut effect = ReverbEffect::new(&backend, None, ReverbParams::default());
        assert!(effect.pre_delay.is_none());

        effect.update(
            &backend,
            ReverbParams {
                pre_delay_ms: Some(30.0),
                ..ReverbParams::default()
            },
        );
        let delay = effect.pre_delay.expect("pre-delay created");
        assert_eq!(backend.outputs_of(delay), vec![effect.convolver]);

        effect.update(
            &backend,
            ReverbParams {
                pre_delay_ms: Some(50.0),
                ..ReverbParams::default()
            },
        );
        assert_eq!(
            backend.last_set_value(delay, AudioParam::DelayTime).map(|v| v.0),
            Some(0.05)
        );
    }

    #[test]
    fn test_set_impulse_replaces_live_response() {
        let backend = RecordingBackend::new();
        let effect = ReverbEffect::new(&backend, None, ReverbParams::default());
        backend.clear_ops();

        let custom = vec![0.5f32; 1024];
        effect.set_impulse(&backend, &custom);

        assert_eq!(
            backend.ops().last(),
            Some(&crate::backend::BackendOp::SetImpulse {
                node: effect.convolver,
                samples: 1024,
            })
        );
    }

    #[test]
    fn test_negative_pre_delay_clamped() {
        let backend = RecordingBackend::new();
        let mut effect = ReverbEffect::new(&backend, None, ReverbParams::default());
        effect.update(
            &backend,
            ReverbParams {
                pre_delay_ms: Some(-10.0),
                ..ReverbParams::default()
            },
        );
        let delay = effect.pre_delay.expect("pre-delay created");
        assert_eq!(
            backend.last_set_value(delay, AudioParam::DelayTime).map(|v| v.0),
            Some(0.0)
        );
    }
}
