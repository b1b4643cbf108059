//! Audio backend abstraction.
//!
//! Every audible thing this crate does goes through the [`AudioBackend`]
//! trait: node construction, graph wiring, and clock-scheduled parameter
//! automation. The crate itself renders no audio; it composes and schedules
//! a directed node graph against a backend clock, and the backend is free to
//! realize that graph however it likes (a real-time audio engine, an offline
//! renderer, or the bundled [`recording::RecordingBackend`] used in tests).
//!
//! The backend handle is passed explicitly into every component
//! (`Arc<dyn AudioBackend>`), so multiple independent sessions can coexist
//! in one process.

pub mod recording;

pub use recording::{BackendOp, NodeKind, RecordingBackend};

/// Opaque handle to a node owned by the backend.
///
/// Handles are cheap to copy and compare; the backend defines what they
/// refer to. A handle stays valid until the node it names is garbage
/// (one-shot sources are simply abandoned after their stop time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Waveform of a periodic oscillator source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    /// Pure sine tone
    Sine,
    /// Triangle wave
    Triangle,
    /// Square wave
    Square,
    /// Sawtooth wave
    Sawtooth,
}

/// The type of a tunable filter node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Low-pass filter - attenuates frequencies above the cutoff
    LowPass,
    /// High-pass filter - attenuates frequencies below the cutoff
    HighPass,
    /// Band-pass filter - passes frequencies near the center, attenuates others
    BandPass,
    /// Notch/band-reject filter - attenuates frequencies near the center
    Notch,
}

/// Which automatable parameter of a node an automation call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioParam {
    /// Amplitude of a gain node
    Gain,
    /// Frequency of an oscillator or cutoff of a filter, in Hz
    Frequency,
    /// Resonance of a filter
    Q,
    /// Delay time of a delay node, in seconds
    DelayTime,
}

/// The signal-processing backend every component talks to.
///
/// Implementations must provide a monotonically increasing clock, a small
/// set of primitive node constructors, explicit connect/disconnect graph
/// edges, and clock-scheduled parameter automation. All methods take
/// `&self`; implementations use interior mutability so a backend can be
/// shared between the control thread and the scheduler thread behind an
/// `Arc`.
///
/// # Graph model
///
/// Any node's output may feed any number of inputs. `disconnect` removes a
/// single edge and is idempotent; `disconnect_all` removes every *outgoing*
/// edge of a node and never touches its incoming edges.
///
/// # Scheduling model
///
/// Source nodes are one-shot: they are created, started once at an absolute
/// clock time, and never restarted. Parameter automation
/// (`set_value_at_time` and the ramps) is likewise anchored at absolute
/// times, which is what lets a coarse polling scheduler produce
/// sample-accurate triggers.
pub trait AudioBackend: std::fmt::Debug + Send + Sync {
    /// Current backend clock time in seconds. Monotonically increasing.
    fn now(&self) -> f64;

    /// Sample rate in Hz, used when sizing noise and impulse buffers.
    fn sample_rate(&self) -> f64;

    /// The final output sink (speakers).
    fn destination(&self) -> NodeId;

    /// Creates a gain node with the given initial gain.
    fn create_gain(&self, gain: f64) -> NodeId;

    /// Creates a periodic oscillator source.
    fn create_oscillator(&self, waveform: Waveform, frequency: f64) -> NodeId;

    /// Creates a one-shot source that plays the given sample buffer.
    fn create_buffer_source(&self, samples: &[f32]) -> NodeId;

    /// Creates a tunable filter node.
    fn create_filter(&self, kind: FilterType, frequency: f64, q: f64) -> NodeId;

    /// Creates a wave-shaping distortion node with the given transfer curve.
    fn create_wave_shaper(&self, curve: &[f32]) -> NodeId;

    /// Creates a convolution reverberator with the given impulse response.
    fn create_convolver(&self, impulse: &[f32]) -> NodeId;

    /// Creates a delay node with the given initial delay in seconds.
    fn create_delay(&self, delay_seconds: f64) -> NodeId;

    /// Connects `source`'s output to `target`'s input.
    fn connect(&self, source: NodeId, target: NodeId);

    /// Removes the `source -> target` edge. No-op if the edge doesn't exist.
    fn disconnect(&self, source: NodeId, target: NodeId);

    /// Removes every outgoing edge of `source`. Incoming edges are kept.
    fn disconnect_all(&self, source: NodeId);

    /// Starts a source node at the given absolute time.
    fn start_source(&self, node: NodeId, time: f64);

    /// Stops a source node at the given absolute time.
    fn stop_source(&self, node: NodeId, time: f64);

    /// Replaces the transfer curve of a wave-shaper node.
    fn set_wave_shaper_curve(&self, node: NodeId, curve: &[f32]);

    /// Replaces the impulse response of a convolver node.
    fn set_convolver_impulse(&self, node: NodeId, impulse: &[f32]);

    /// Sets a parameter to `value` at the given time.
    fn set_value_at_time(&self, node: NodeId, param: AudioParam, value: f64, time: f64);

    /// Ramps a parameter linearly to `value`, arriving at the given time.
    fn linear_ramp_to_value_at_time(&self, node: NodeId, param: AudioParam, value: f64, time: f64);

    /// Ramps a parameter exponentially to `value`, arriving at the given
    /// time. `value` must be non-zero; callers clamp away from zero.
    fn exponential_ramp_to_value_at_time(
        &self,
        node: NodeId,
        param: AudioParam,
        value: f64,
        time: f64,
    );

    /// Starts an exponential approach toward `target` at `start_time` with
    /// the given time constant (a target-decay ramp).
    fn set_target_at_time(
        &self,
        node: NodeId,
        param: AudioParam,
        target: f64,
        start_time: f64,
        time_constant: f64,
    );
}
