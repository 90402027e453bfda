//! # Recurrent Spiking Neurons
//!
//! Single-timestep neuron layers. Each step integrates the input current and
//! the neuron's own previous spike, then emits a spike where the membrane
//! reaches threshold. The sequence layers in [`crate::rnn`] unroll these over
//! time.
//!
//! ## Neuron Types
//!
//! | Neuron | State | Recurrence |
//! |--------|-------|------------|
//! | [`RLeaky`] | spike, membrane | `U ← βU + I + V·S` |
//! | [`RSynaptic`] | spike, synaptic current, membrane | `I_syn ← αI_syn + I + V·S`, `U ← βU + I_syn` |
//!
//! ## Calling Conventions
//!
//! The state-threading convention is fixed by the type you build:
//!
//! - [`RLeaky`] / [`RSynaptic`] take the previous state as arguments and
//!   return the new state. Pass [`LazyState::Uninitialized`] on the first
//!   step and the state is zero-filled in the shape of the input.
//! - [`HiddenRLeaky`] / [`HiddenRSynaptic`] own their state and take only the
//!   input. Output layers (`with_output(true)`) also return the state.
//!
//! The hidden-state layers are plain structs, not burn [`Module`]s: they
//! cannot be fields of a `#[derive(Module)]` network, and their parameters are
//! not visited by an optimizer through them. Reach the wrapped neuron with
//! `neuron()` / `neuron_mut()` (or `into_neuron()`) to record, load or update
//! its parameters.
//!
//! [`Module`]: burn::module::Module
//!
//! ## Reset Mechanisms
//!
//! [`ResetMechanism`] selects the post-spike adjustment:
//!
//! - **Subtract**: remove the threshold from the membrane (default)
//! - **Zero**: clear the freshly integrated state
//! - **None**: pure integration
//!
//! ## Truncated BPTT
//!
//! ```ignore
//! use snn_recurrent::neurons::{detach_hidden, reset_hidden, HiddenState, RLeakyConfig};
//!
//! let mut lif1 = RLeakyConfig::new(0.9, 0.5).init_hidden::<Backend, 2>(&device)?;
//! let mut lif2 = RLeakyConfig::new(0.9, 0.5).with_output(true).init_hidden::<Backend, 2>(&device)?;
//!
//! for window in windows {
//!     for step in window {
//!         let spk1 = lif1.forward(step)?.spk;
//!         let out = lif2.forward(spk1)?;
//!     }
//!     // backward + optimizer step ...
//!     detach_hidden([&mut lif1, &mut lif2]);
//! }
//! reset_hidden([&mut lif1, &mut lif2]);
//! ```

pub mod lif;
pub mod reset;
pub mod rleaky;
pub mod rsynaptic;
pub mod state;

pub use lif::{Lif, LifConfig};
pub use reset::ResetMechanism;
pub use rleaky::{HiddenRLeaky, RLeaky, RLeakyConfig, RLeakyOutput};
pub use rsynaptic::{HiddenRSynaptic, RSynaptic, RSynapticConfig, RSynapticOutput};
pub use state::{detach_hidden, reset_hidden, HiddenState, LazyState};
