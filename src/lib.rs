//! # snn-recurrent - Recurrent spiking neurons for Burn
//!
//! Differentiable recurrent leaky integrate-and-fire layers for training
//! spiking neural networks with gradient descent.
//!
//! ## Features
//!
//! - **RLeaky**: first-order recurrent leaky integrator with explicit recurrent weight `V`
//! - **RSynaptic**: second-order recurrent integrator with synaptic current
//! - **Reset Mechanisms**: subtract, zero, or none
//! - **Surrogate Gradients**: ATan, fast sigmoid, sigmoid, straight-through
//! - **Hidden State**: explicit state threading or layer-owned state with detach/reset for truncated BPTT
//! - **Sequence Layers**: unroll either neuron over `[batch, seq, neurons]` inputs
//!
//! ## Quick Start
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use snn_recurrent::prelude::*;
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let neuron = RLeakyConfig::new(0.5, 1.0)
//!     .with_reset_mechanism(ResetMechanism::Subtract)
//!     .init::<Backend>(&device)
//!     .unwrap();
//!
//! let input = Tensor::<Backend, 2>::ones([1, 1], &device);
//! let (spk, mem) = neuron.forward(input, LazyState::Uninitialized, LazyState::Uninitialized);
//!
//! assert_eq!(mem.into_scalar(), 1.0);
//! assert_eq!(spk.into_scalar(), 1.0);
//! ```
//!
//! ## Hidden-State Usage
//!
//! ```ignore
//! let mut lif = RSynapticConfig::new(0.9, 0.8, 0.5)
//!     .with_output(true)
//!     .init_hidden::<Backend, 2>(&device)?;
//!
//! let out = lif.forward(input)?;
//! let (syn, mem) = out.state.unwrap();
//! ```

pub mod config;
pub mod error;
pub mod neurons;
pub mod rnn;
pub mod surrogate;

pub use error::{NeuronError, Result};

pub mod prelude {
    pub use crate::config::{JsonConfig, NeuronParam};
    pub use crate::error::NeuronError;
    pub use crate::neurons::{
        detach_hidden, reset_hidden, HiddenRLeaky, HiddenRSynaptic, HiddenState, LazyState,
        RLeaky, RLeakyConfig, RSynaptic, RSynapticConfig, ResetMechanism,
    };
    pub use crate::rnn::{RLeakySequence, RSynapticSequence};
    pub use crate::surrogate::{Surrogate, SurrogateSpike};
}
