//! Per-trigger tunable filter wrapper.
//!
//! A [`Filter`] is configuration, not a live node: filters are recreated
//! fresh on every generator trigger so no envelope state leaks between
//! hits. `apply` splices a new backend filter node between an input and an
//! output and programs the optional cutoff envelope onto it.

use crate::backend::{AudioBackend, FilterType, NodeId};
use crate::envelope::{ADSRConfig, Envelope, MIN_FREQUENCY};

/// Describes a tunable filter instantiated fresh per trigger.
///
/// # Examples
///
/// ```
/// use gooey::{FilterConfig, FilterType};
///
/// // Defaults: low-pass, Q = 1
/// let lp = FilterConfig::new(800.0);
/// assert_eq!(lp.kind, FilterType::LowPass);
///
/// let hp = FilterConfig::new(2000.0).with_kind(FilterType::HighPass).with_q(2.5);
/// assert_eq!(hp.q, 2.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Cutoff frequency in Hz
    pub frequency: f64,
    /// Resonance
    pub q: f64,
    /// Filter type
    pub kind: FilterType,
}

impl FilterConfig {
    /// Creates a low-pass config with Q = 1 at the given cutoff.
    pub fn new(frequency: f64) -> Self {
        Self {
            frequency,
            q: 1.0,
            kind: FilterType::LowPass,
        }
    }

    /// Sets the filter type.
    pub fn with_kind(mut self, kind: FilterType) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the resonance.
    pub fn with_q(mut self, q: f64) -> Self {
        self.q = q;
        self
    }
}

/// A filter wrapper that creates a fresh backend node per trigger and
/// optionally sweeps its cutoff with an envelope.
#[derive(Debug, Clone)]
pub struct Filter {
    config: FilterConfig,
    envelope: Option<Envelope>,
    /// Cutoff modulation depth passed to the envelope (1.0 = sweep up to
    /// twice the base cutoff)
    frequency_range: f64,
}

impl Filter {
    /// Creates a filter wrapper from a config.
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            envelope: None,
            frequency_range: 1.0,
        }
    }

    /// Returns the config this wrapper was built from.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Attaches an ADSR envelope to the cutoff frequency.
    ///
    /// `frequency_range` scales the sweep depth; see
    /// [`Envelope::apply_to_filter`].
    pub fn set_frequency_adsr(&mut self, config: ADSRConfig, frequency_range: f64) {
        self.envelope = Some(Envelope::new(config));
        self.frequency_range = frequency_range.max(0.0);
    }

    /// Creates a fresh backend filter node from the config.
    ///
    /// Cutoff is clamped to the audible floor, Q away from zero.
    pub fn create_node(&self, backend: &dyn AudioBackend) -> NodeId {
        backend.create_filter(
            self.config.kind,
            self.config.frequency.max(MIN_FREQUENCY),
            self.config.q.max(0.0001),
        )
    }

    /// Splices a fresh filter node between `input` and `output` and applies
    /// the cutoff envelope, if any, anchored at `start_time`.
    pub fn apply(
        &self,
        backend: &dyn AudioBackend,
        input: NodeId,
        output: NodeId,
        start_time: f64,
    ) -> NodeId {
        let node = self.create_node(backend);
        backend.connect(input, node);
        backend.connect(node, output);

        if let Some(envelope) = &self.envelope {
            envelope.apply_to_filter(
                backend,
                node,
                self.config.frequency,
                self.frequency_range,
                start_time,
            );
        }

        node
    }
}
