//! Wave-shaping overdrive effect.

use std::f64::consts::PI;

use crate::backend::{AudioBackend, AudioParam, FilterType, NodeId};
use crate::envelope::MIN_FREQUENCY;

use super::router::WetDryRouter;

/// Number of entries in the transfer curve table.
const CURVE_LEN: usize = 44100;

const DEFAULT_MIX: f64 = 0.5;

/// Parameter update for an overdrive effect. Fields left `None` are
/// untouched.
///
/// # Examples
///
/// ```
/// use gooey::OverdriveParams;
///
/// let crunchier = OverdriveParams {
///     drive: Some(6.0),
///     ..OverdriveParams::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OverdriveParams {
    /// Wet mix in `[0, 1]`
    pub mix: Option<f64>,
    /// Pre-gain before the soft clip; clamped to at least 1
    pub drive: Option<f64>,
    /// Cutoff of the post-shaper tone filter in Hz
    pub tone_hz: Option<f64>,
}

/// Arctangent soft-clip overdrive on the wet path, with an optional
/// low-pass tone filter after the shaper.
///
/// Drive updates swap the shaper's transfer curve on the live node; no
/// graph rebuild is ever needed.
#[derive(Debug, Clone)]
pub struct OverdriveEffect {
    router: WetDryRouter,
    shaper: NodeId,
    tone: Option<NodeId>,
    drive: f64,
}

impl OverdriveEffect {
    /// Creates an overdrive effect, applying any parameters given.
    pub fn new(backend: &dyn AudioBackend, params: OverdriveParams) -> Self {
        let drive = params.drive.unwrap_or(1.0).max(1.0);
        let mix = params.mix.unwrap_or(DEFAULT_MIX);

        let mut router = WetDryRouter::new(backend, mix);
        let shaper = backend.create_wave_shaper(&soft_clip_curve(drive));

        let tone = params.tone_hz.map(|hz| {
            let filter = backend.create_filter(FilterType::LowPass, hz.max(MIN_FREQUENCY), 0.707);
            backend.connect(shaper, filter);
            filter
        });
        router.install_core(backend, shaper, tone.unwrap_or(shaper));

        Self {
            router,
            shaper,
            tone,
            drive,
        }
    }

    /// Current drive amount.
    pub fn drive(&self) -> f64 {
        self.drive
    }

    pub(crate) fn router(&self) -> &WetDryRouter {
        &self.router
    }

    pub(crate) fn router_mut(&mut self) -> &mut WetDryRouter {
        &mut self.router
    }

    /// Applies a partial parameter update to the live nodes.
    pub fn update(&mut self, backend: &dyn AudioBackend, params: OverdriveParams) {
        if let Some(mix) = params.mix {
            self.router.set_mix(backend, mix);
        }
        if let Some(drive) = params.drive {
            self.drive = drive.max(1.0);
            backend.set_wave_shaper_curve(self.shaper, &soft_clip_curve(self.drive));
        }
        if let Some(tone_hz) = params.tone_hz {
            let tone_hz = tone_hz.max(MIN_FREQUENCY);
            match self.tone {
                Some(filter) => {
                    backend.set_value_at_time(
                        filter,
                        AudioParam::Frequency,
                        tone_hz,
                        backend.now(),
                    );
                }
                None => {
                    // First tone request: splice the filter after the shaper
                    let filter = backend.create_filter(FilterType::LowPass, tone_hz, 0.707);
                    backend.connect(self.shaper, filter);
                    self.router.install_core(backend, self.shaper, filter);
                    self.tone = Some(filter);
                }
            }
        }
    }
}

/// Pre-gain followed by arctangent soft clipping, normalized to `2/π` so
/// the curve tops out at ±1.
fn soft_clip_curve(drive: f64) -> Vec<f32> {
    let g = drive.max(1.0);
    (0..CURVE_LEN)
        .map(|i| {
            let x = (i as f64 * 2.0) / CURVE_LEN as f64 - 1.0;
            ((2.0 / PI) * (g * x).atan()) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOp, NodeKind, RecordingBackend};

    #[test]
    fn test_curve_shape() {
        let curve = soft_clip_curve(1.0);
        assert_eq!(curve.len(), CURVE_LEN);
        // Odd-symmetric, bounded, monotone increasing
        assert!(curve[0] < 0.0);
        assert!(curve[CURVE_LEN - 1] > 0.0);
        assert!(curve.iter().all(|y| y.abs() <= 1.0));
        assert!(curve.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_higher_drive_clips_harder() {
        let soft = soft_clip_curve(1.0);
        let hard = soft_clip_curve(10.0);
        // At the same input point, higher drive pushes output closer to the rail
        let i = CURVE_LEN / 8; // a strongly negative input
        assert!(hard[i] < soft[i]);
    }

    #[test]
    fn test_drive_update_swaps_curve_without_rewiring() {
        let backend = RecordingBackend::new();
        let mut effect = OverdriveEffect::new(&backend, OverdriveParams::default());
        backend.clear_ops();

        effect.update(
            &backend,
            OverdriveParams {
                drive: Some(8.0),
                ..OverdriveParams::default()
            },
        );

        let ops = backend.ops();
        assert!(ops.iter().any(|op| matches!(op, BackendOp::SetCurve { .. })));
        assert!(
            !ops.iter().any(|op| matches!(
                op,
                BackendOp::Connect { .. } | BackendOp::Disconnect { .. }
            )),
            "drive update must not rewire"
        );
        assert_eq!(effect.drive(), 8.0);
    }

    #[test]
    fn test_drive_clamped_to_unity() {
        let backend = RecordingBackend::new();
        let effect = OverdriveEffect::new(
            &backend,
            OverdriveParams {
                drive: Some(0.2),
                ..OverdriveParams::default()
            },
        );
        assert_eq!(effect.drive(), 1.0);
    }

    #[test]
    fn test_tone_filter_created_lazily() {
        let backend = RecordingBackend::new();
        let mut effect = OverdriveEffect::new(&backend, OverdriveParams::default());
        assert!(effect.tone.is_none());

        effect.update(
            &backend,
            OverdriveParams {
                tone_hz: Some(3000.0),
                ..OverdriveParams::default()
            },
        );

        let filter = effect.tone.expect("tone filter created");
        assert_eq!(backend.node_kind(filter), Some(NodeKind::Filter));
        assert_eq!(backend.outputs_of(effect.shaper), vec![filter]);

        // Second update only retunes the existing filter
        backend.clear_ops();
        effect.update(
            &backend,
            OverdriveParams {
                tone_hz: Some(1500.0),
                ..OverdriveParams::default()
            },
        );
        assert_eq!(
            backend.last_set_value(filter, AudioParam::Frequency).map(|v| v.0),
            Some(1500.0)
        );
    }
}
