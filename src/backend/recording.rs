//! A non-rendering backend that records every operation.
//!
//! `RecordingBackend` implements [`AudioBackend`] by logging each call as a
//! [`BackendOp`] and tracking the live connection set, with a manually
//! advanced clock. It renders nothing. It exists so that scheduling, graph
//! topology, and automation can be asserted on directly (every guarantee
//! this crate makes is phrased over backend operations, not rendered audio)
//! and it doubles as a schedule inspector for downstream consumers.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{AudioBackend, AudioParam, FilterType, NodeId, Waveform};

/// What kind of node a recorded handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The final output sink
    Destination,
    /// Gain node
    Gain,
    /// Periodic oscillator source
    Oscillator,
    /// One-shot buffer source
    BufferSource,
    /// Tunable filter
    Filter,
    /// Wave-shaping distortion
    WaveShaper,
    /// Convolution reverberator
    Convolver,
    /// Delay line
    Delay,
}

/// One recorded backend operation.
///
/// Buffer-carrying operations record only the sample count; the recorded
/// stream is meant for topology and timing assertions, not signal analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOp {
    /// A node was created
    Create { node: NodeId, kind: NodeKind },
    /// An edge was added
    Connect { source: NodeId, target: NodeId },
    /// A single edge was removed
    Disconnect { source: NodeId, target: NodeId },
    /// All outgoing edges of a node were removed
    DisconnectAll { source: NodeId },
    /// A source was scheduled to start
    StartSource { node: NodeId, time: f64 },
    /// A source was scheduled to stop
    StopSource { node: NodeId, time: f64 },
    /// Immediate parameter set
    SetValue {
        node: NodeId,
        param: AudioParam,
        value: f64,
        time: f64,
    },
    /// Linear ramp
    LinearRamp {
        node: NodeId,
        param: AudioParam,
        value: f64,
        time: f64,
    },
    /// Exponential ramp
    ExponentialRamp {
        node: NodeId,
        param: AudioParam,
        value: f64,
        time: f64,
    },
    /// Target-decay ramp
    SetTarget {
        node: NodeId,
        param: AudioParam,
        target: f64,
        start_time: f64,
        time_constant: f64,
    },
    /// Wave-shaper curve replaced
    SetCurve { node: NodeId, samples: usize },
    /// Convolver impulse replaced
    SetImpulse { node: NodeId, samples: usize },
}

#[derive(Debug)]
struct Inner {
    time: f64,
    sample_rate: f64,
    next_id: u64,
    kinds: HashMap<NodeId, NodeKind>,
    connections: Vec<(NodeId, NodeId)>,
    ops: Vec<BackendOp>,
}

/// A backend that records operations instead of rendering audio.
///
/// # Examples
///
/// ```
/// use gooey::backend::{AudioBackend, RecordingBackend};
///
/// let backend = RecordingBackend::new();
/// let gain = backend.create_gain(1.0);
/// backend.connect(gain, backend.destination());
///
/// assert_eq!(backend.outputs_of(gain), vec![backend.destination()]);
/// backend.set_time(1.5);
/// assert_eq!(backend.now(), 1.5);
/// ```
#[derive(Debug)]
pub struct RecordingBackend {
    inner: Mutex<Inner>,
}

const DESTINATION: NodeId = NodeId(0);

impl RecordingBackend {
    /// Creates a recording backend with a 44.1 kHz nominal sample rate and
    /// the clock at zero.
    pub fn new() -> Self {
        Self::with_sample_rate(44100.0)
    }

    /// Creates a recording backend with the given sample rate.
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        let mut kinds = HashMap::new();
        kinds.insert(DESTINATION, NodeKind::Destination);
        Self {
            inner: Mutex::new(Inner {
                time: 0.0,
                sample_rate,
                next_id: 1,
                kinds,
                connections: Vec::new(),
                ops: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic mid-assertion shouldn't wedge every later test helper.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Moves the clock to an absolute time. Never moves it backwards.
    pub fn set_time(&self, time: f64) {
        let mut inner = self.lock();
        if time > inner.time {
            inner.time = time;
        }
    }

    /// Advances the clock by `delta` seconds.
    pub fn advance(&self, delta: f64) {
        let mut inner = self.lock();
        inner.time += delta.max(0.0);
    }

    /// Returns a copy of every recorded operation, in call order.
    pub fn ops(&self) -> Vec<BackendOp> {
        self.lock().ops.clone()
    }

    /// Forgets recorded operations (the graph and clock are kept).
    /// Useful for scoping assertions to "what happened after this point".
    pub fn clear_ops(&self) {
        self.lock().ops.clear();
    }

    /// Returns the current live connection set as `(source, target)` pairs.
    pub fn connections(&self) -> Vec<(NodeId, NodeId)> {
        self.lock().connections.clone()
    }

    /// Returns the targets currently fed by `node`, in connection order.
    pub fn outputs_of(&self, node: NodeId) -> Vec<NodeId> {
        self.lock()
            .connections
            .iter()
            .filter(|(s, _)| *s == node)
            .map(|(_, t)| *t)
            .collect()
    }

    /// Returns the kind of a recorded node, if the handle is known.
    pub fn node_kind(&self, node: NodeId) -> Option<NodeKind> {
        self.lock().kinds.get(&node).copied()
    }

    /// Every `(node, time)` pair for which a source start was scheduled,
    /// in call order.
    pub fn scheduled_starts(&self) -> Vec<(NodeId, f64)> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                BackendOp::StartSource { node, time } => Some((*node, *time)),
                _ => None,
            })
            .collect()
    }

    /// Every recorded operation that targets the given node.
    pub fn events_for(&self, node: NodeId) -> Vec<BackendOp> {
        self.lock()
            .ops
            .iter()
            .filter(|op| match op {
                BackendOp::Create { node: n, .. }
                | BackendOp::StartSource { node: n, .. }
                | BackendOp::StopSource { node: n, .. }
                | BackendOp::SetValue { node: n, .. }
                | BackendOp::LinearRamp { node: n, .. }
                | BackendOp::ExponentialRamp { node: n, .. }
                | BackendOp::SetTarget { node: n, .. }
                | BackendOp::SetCurve { node: n, .. }
                | BackendOp::SetImpulse { node: n, .. } => *n == node,
                BackendOp::Connect { source, target }
                | BackendOp::Disconnect { source, target } => *source == node || *target == node,
                BackendOp::DisconnectAll { source } => *source == node,
            })
            .cloned()
            .collect()
    }

    /// The most recent immediate `set_value_at_time` for a node parameter,
    /// as `(value, time)`.
    pub fn last_set_value(&self, node: NodeId, param: AudioParam) -> Option<(f64, f64)> {
        self.lock().ops.iter().rev().find_map(|op| match op {
            BackendOp::SetValue {
                node: n,
                param: p,
                value,
                time,
            } if *n == node && *p == param => Some((*value, *time)),
            _ => None,
        })
    }

    fn create_node(&self, kind: NodeKind) -> NodeId {
        let mut inner = self.lock();
        let node = NodeId(inner.next_id);
        inner.next_id += 1;
        inner.kinds.insert(node, kind);
        inner.ops.push(BackendOp::Create { node, kind });
        node
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for RecordingBackend {
    fn now(&self) -> f64 {
        self.lock().time
    }

    fn sample_rate(&self) -> f64 {
        self.lock().sample_rate
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }

    fn create_gain(&self, gain: f64) -> NodeId {
        let node = self.create_node(NodeKind::Gain);
        let time = self.now();
        self.set_value_at_time(node, AudioParam::Gain, gain, time);
        node
    }

    fn create_oscillator(&self, _waveform: Waveform, frequency: f64) -> NodeId {
        let node = self.create_node(NodeKind::Oscillator);
        let time = self.now();
        self.set_value_at_time(node, AudioParam::Frequency, frequency, time);
        node
    }

    fn create_buffer_source(&self, _samples: &[f32]) -> NodeId {
        self.create_node(NodeKind::BufferSource)
    }

    fn create_filter(&self, _kind: FilterType, frequency: f64, q: f64) -> NodeId {
        let node = self.create_node(NodeKind::Filter);
        let time = self.now();
        self.set_value_at_time(node, AudioParam::Frequency, frequency, time);
        self.set_value_at_time(node, AudioParam::Q, q, time);
        node
    }

    fn create_wave_shaper(&self, curve: &[f32]) -> NodeId {
        let node = self.create_node(NodeKind::WaveShaper);
        self.lock().ops.push(BackendOp::SetCurve {
            node,
            samples: curve.len(),
        });
        node
    }

    fn create_convolver(&self, impulse: &[f32]) -> NodeId {
        let node = self.create_node(NodeKind::Convolver);
        self.lock().ops.push(BackendOp::SetImpulse {
            node,
            samples: impulse.len(),
        });
        node
    }

    fn create_delay(&self, delay_seconds: f64) -> NodeId {
        let node = self.create_node(NodeKind::Delay);
        let time = self.now();
        self.set_value_at_time(node, AudioParam::DelayTime, delay_seconds, time);
        node
    }

    fn connect(&self, source: NodeId, target: NodeId) {
        let mut inner = self.lock();
        if !inner.connections.contains(&(source, target)) {
            inner.connections.push((source, target));
        }
        inner.ops.push(BackendOp::Connect { source, target });
    }

    fn disconnect(&self, source: NodeId, target: NodeId) {
        let mut inner = self.lock();
        inner.connections.retain(|edge| *edge != (source, target));
        inner.ops.push(BackendOp::Disconnect { source, target });
    }

    fn disconnect_all(&self, source: NodeId) {
        let mut inner = self.lock();
        inner.connections.retain(|(s, _)| *s != source);
        inner.ops.push(BackendOp::DisconnectAll { source });
    }

    fn start_source(&self, node: NodeId, time: f64) {
        self.lock().ops.push(BackendOp::StartSource { node, time });
    }

    fn stop_source(&self, node: NodeId, time: f64) {
        self.lock().ops.push(BackendOp::StopSource { node, time });
    }

    fn set_wave_shaper_curve(&self, node: NodeId, curve: &[f32]) {
        self.lock().ops.push(BackendOp::SetCurve {
            node,
            samples: curve.len(),
        });
    }

    fn set_convolver_impulse(&self, node: NodeId, impulse: &[f32]) {
        self.lock().ops.push(BackendOp::SetImpulse {
            node,
            samples: impulse.len(),
        });
    }

    fn set_value_at_time(&self, node: NodeId, param: AudioParam, value: f64, time: f64) {
        self.lock().ops.push(BackendOp::SetValue {
            node,
            param,
            value,
            time,
        });
    }

    fn linear_ramp_to_value_at_time(&self, node: NodeId, param: AudioParam, value: f64, time: f64) {
        self.lock().ops.push(BackendOp::LinearRamp {
            node,
            param,
            value,
            time,
        });
    }

    fn exponential_ramp_to_value_at_time(
        &self,
        node: NodeId,
        param: AudioParam,
        value: f64,
        time: f64,
    ) {
        self.lock().ops.push(BackendOp::ExponentialRamp {
            node,
            param,
            value,
            time,
        });
    }

    fn set_target_at_time(
        &self,
        node: NodeId,
        param: AudioParam,
        target: f64,
        start_time: f64,
        time_constant: f64,
    ) {
        self.lock().ops.push(BackendOp::SetTarget {
            node,
            param,
            target,
            start_time,
            time_constant,
        });
    }
}
