//! First-order recurrent leaky integrate-and-fire neuron
//!
//! The membrane decays at rate β and integrates the input current plus the
//! neuron's own previous spike scaled by the recurrent weight V:
//!
//! ```text
//! base      = clamp(β, 0, 1)·U[t] + I_in[t+1] + V·S[t]
//! subtract: U[t+1] = base - R·U_thr
//! zero:     U[t+1] = base - R·base
//! none:     U[t+1] = base
//! S[t+1]    = H(U[t+1] - U_thr)
//! ```
//!
//! `R` is 1 where the membrane *before* the update had reached threshold.

use core::mem::take;

use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::lif::{broadcast, decay, param, Lif, LifConfig};
use super::reset::ResetMechanism;
use super::state::{HiddenState, LazyState};
use crate::config::{JsonConfig, NeuronParam};
use crate::error::Result;
use crate::surrogate::Surrogate;

/// Configuration for [`RLeaky`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RLeakyConfig {
    /// Membrane decay rate, clamped to `[0, 1]` when used
    pub beta: NeuronParam,
    /// Recurrent weight applied to the previous spike
    #[serde(alias = "V")]
    pub v: NeuronParam,
    #[serde(default)]
    pub learn_beta: bool,
    #[serde(default = "default_learn_v", alias = "learn_V")]
    pub learn_v: bool,
    #[serde(flatten)]
    pub lif: LifConfig,
}

fn default_learn_v() -> bool {
    true
}

impl JsonConfig for RLeakyConfig {}

impl RLeakyConfig {
    pub fn new(beta: impl Into<NeuronParam>, v: impl Into<NeuronParam>) -> Self {
        Self {
            beta: beta.into(),
            v: v.into(),
            learn_beta: false,
            learn_v: true,
            lif: LifConfig::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.lif.threshold = threshold;
        self
    }

    pub fn with_spike_grad(mut self, spike_grad: Surrogate) -> Self {
        self.lif.spike_grad = spike_grad;
        self
    }

    pub fn with_inhibition(mut self, inhibition: bool) -> Self {
        self.lif.inhibition = inhibition;
        self
    }

    pub fn with_learn_beta(mut self, learn: bool) -> Self {
        self.learn_beta = learn;
        self
    }

    pub fn with_learn_threshold(mut self, learn: bool) -> Self {
        self.lif.learn_threshold = learn;
        self
    }

    pub fn with_learn_v(mut self, learn: bool) -> Self {
        self.learn_v = learn;
        self
    }

    pub fn with_reset_mechanism(mut self, reset_mechanism: ResetMechanism) -> Self {
        self.lif.reset_mechanism = reset_mechanism;
        self
    }

    pub fn with_output(mut self, output: bool) -> Self {
        self.lif.output = output;
        self
    }

    /// Neuron stepped with explicitly threaded state.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<RLeaky<B>> {
        Ok(RLeaky {
            lif: self.lif.init(device),
            beta: param(self.beta.to_tensor("beta", device)?, self.learn_beta),
            v: param(self.v.to_tensor("V", device)?, self.learn_v),
        })
    }

    /// Neuron that owns its spike and membrane between calls.
    pub fn init_hidden<B: Backend, const D: usize>(
        &self,
        device: &B::Device,
    ) -> Result<HiddenRLeaky<B, D>> {
        Ok(HiddenRLeaky::new(self.init(device)?, self.lif.output))
    }
}

/// Recurrent leaky integrate-and-fire neuron layer.
///
/// Works on state of any rank with the neuron axis last, e.g.
/// `[batch, neurons]` or `[batch, channels, height, width]`.
#[derive(Module, Debug)]
pub struct RLeaky<B: Backend> {
    lif: Lif<B>,
    beta: Param<Tensor<B, 1>>,
    v: Param<Tensor<B, 1>>,
}

impl<B: Backend> RLeaky<B> {
    /// Stored (unclamped) membrane decay rate
    pub fn beta(&self) -> Tensor<B, 1> {
        self.beta.val()
    }

    /// Recurrent weight
    pub fn v(&self) -> Tensor<B, 1> {
        self.v.val()
    }

    pub fn lif(&self) -> &Lif<B> {
        &self.lif
    }

    pub fn reset_mechanism(&self) -> ResetMechanism {
        self.lif.reset_mechanism()
    }

    fn base_state<const D: usize>(
        &self,
        input: Tensor<B, D>,
        spk: Tensor<B, D>,
        mem: Tensor<B, D>,
    ) -> Tensor<B, D> {
        decay::<B, D>(&self.beta) * mem + input + broadcast::<B, D>(&self.v) * spk
    }

    /// Next membrane potential. The reset indicator comes from `mem` as
    /// received, before the update.
    pub fn state_fn<const D: usize>(
        &self,
        input: Tensor<B, D>,
        spk: Tensor<B, D>,
        mem: Tensor<B, D>,
    ) -> Tensor<B, D> {
        let reset = self.lif.mem_reset(mem.clone());
        let base = self.base_state(input, spk, mem);

        match self.lif.reset_mechanism() {
            ResetMechanism::Subtract => base - reset * self.lif.threshold::<D>(),
            ResetMechanism::Zero => base.clone() - reset * base,
            ResetMechanism::None => base,
        }
    }

    /// Advances one timestep with explicit state.
    ///
    /// # Arguments
    /// * `input` - Input current
    /// * `spk` - Previous output spike, or [`LazyState::Uninitialized`] on the first step
    /// * `mem` - Previous membrane potential, or [`LazyState::Uninitialized`]
    ///
    /// # Returns
    /// Tuple of (spike, membrane), both shaped like `input`
    pub fn forward<const D: usize>(
        &self,
        input: Tensor<B, D>,
        spk: LazyState<B, D>,
        mem: LazyState<B, D>,
    ) -> (Tensor<B, D>, Tensor<B, D>) {
        let spk = spk.resolve(&input);
        let mem = mem.resolve(&input);

        tracing::trace!(reset = %self.lif.reset_mechanism(), "rleaky step");
        let mem = self.state_fn(input, spk, mem);
        let spk = self.lif.emit(mem.clone());

        (spk, mem)
    }
}

/// Output of a [`HiddenRLeaky`] step.
#[derive(Debug, Clone)]
pub struct RLeakyOutput<B: Backend, const D: usize> {
    pub spk: Tensor<B, D>,
    /// Present only for output (read-out) layers
    pub mem: Option<Tensor<B, D>>,
}

/// [`RLeaky`] that keeps its spike and membrane between calls.
///
/// Intended for truncated backpropagation through time: call
/// [`HiddenState::detach_hidden`] between windows and
/// [`HiddenState::reset_hidden`] between sequences.
///
/// Not a burn `Module`; optimizer updates go through [`HiddenRLeaky::neuron_mut`].
#[derive(Debug)]
pub struct HiddenRLeaky<B: Backend, const D: usize> {
    neuron: RLeaky<B>,
    spk: LazyState<B, D>,
    mem: LazyState<B, D>,
    output: bool,
}

impl<B: Backend, const D: usize> HiddenRLeaky<B, D> {
    pub fn new(neuron: RLeaky<B>, output: bool) -> Self {
        Self {
            neuron,
            spk: LazyState::Uninitialized,
            mem: LazyState::Uninitialized,
            output,
        }
    }

    pub fn neuron(&self) -> &RLeaky<B> {
        &self.neuron
    }

    /// Mutable access, e.g. to swap in parameters updated by an optimizer
    pub fn neuron_mut(&mut self) -> &mut RLeaky<B> {
        &mut self.neuron
    }

    pub fn into_neuron(self) -> RLeaky<B> {
        self.neuron
    }

    pub fn is_output(&self) -> bool {
        self.output
    }

    pub fn spk(&self) -> &LazyState<B, D> {
        &self.spk
    }

    pub fn mem(&self) -> &LazyState<B, D> {
        &self.mem
    }

    /// Advances one timestep using and overwriting the owned state.
    ///
    /// The first call (and the first call after a reset) zero-fills the
    /// state in the shape of `input`. Later inputs must keep that shape.
    pub fn forward(&mut self, input: Tensor<B, D>) -> Result<RLeakyOutput<B, D>> {
        self.spk.check_shape(&input)?;
        self.mem.check_shape(&input)?;

        if !self.mem.is_initialized() {
            tracing::debug!(shape = ?input.dims(), "materializing rleaky hidden state");
        }

        let (spk, mem) =
            self.neuron
                .forward(input, take(&mut self.spk), take(&mut self.mem));
        self.spk = LazyState::Value(spk.clone());
        self.mem = LazyState::Value(mem.clone());

        Ok(RLeakyOutput {
            spk,
            mem: self.output.then_some(mem),
        })
    }
}

impl<B: Backend, const D: usize> HiddenState for HiddenRLeaky<B, D> {
    fn detach_hidden(&mut self) {
        self.spk = take(&mut self.spk).detach();
        self.mem = take(&mut self.mem).detach();
    }

    fn reset_hidden(&mut self) {
        self.spk = LazyState::Uninitialized;
        self.mem = LazyState::Uninitialized;
    }

    fn is_initialized(&self) -> bool {
        self.mem.is_initialized()
    }
}
