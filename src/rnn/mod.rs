//! # Sequence Layers
//!
//! Layers that unroll a recurrent spiking neuron over the time axis, threading
//! the state between timesteps.
//!
//! ## Available Layers
//!
//! | Layer | Neuron | Recorded state |
//! |-------|--------|----------------|
//! | [`RLeakySequence`] | [`RLeaky`](crate::neurons::RLeaky) | spike, membrane |
//! | [`RSynapticSequence`] | [`RSynaptic`](crate::neurons::RSynaptic) | spike, synaptic current, membrane |
//!
//! ## Tensor Shapes
//!
//! | Format | Input shape | Default |
//! |--------|-------------|---------|
//! | Batch-first | `[batch, seq_len, neurons]` | ✓ Yes |
//! | Sequence-first | `[seq_len, batch, neurons]` | No |
//!
//! Recordings are always `[batch, seq_len, neurons]` (or `[batch, 1, neurons]`
//! with `with_return_sequences(false)`); the final state is `[batch, neurons]`.
//!
//! ## Stateful Processing
//!
//! ```ignore
//! let layer = RLeakySequence::new(RLeakyConfig::new(0.9, 0.5).init(&device)?);
//!
//! let out1 = layer.forward(chunk1, None)?;
//! let out2 = layer.forward(chunk2, Some(out1.state))?;
//! ```

pub mod rleaky;
pub mod rsynaptic;

pub use rleaky::{RLeakySequence, RLeakySequenceOutput};
pub use rsynaptic::{RSynapticSequence, RSynapticSequenceOutput, RSynapticState};
