//! Second-order recurrent leaky integrate-and-fire neuron
//!
//! Synaptic current jumps on input and on the neuron's own previous spike,
//! then decays at rate α; the membrane integrates the synaptic current and
//! decays at rate β:
//!
//! ```text
//! syn_base = clamp(α, 0, 1)·I_syn[t] + I_in[t+1] + V·S[t]
//! mem_base = clamp(β, 0, 1)·U[t] + syn_base
//!
//! subtract: I_syn[t+1] = syn_base             U[t+1] = mem_base - R·U_thr
//! zero:     I_syn[t+1] = syn_base - R·syn_base U[t+1] = mem_base - R·mem_base
//! none:     I_syn[t+1] = syn_base             U[t+1] = mem_base
//! ```
//!
//! Subtraction never touches the synaptic current. Zeroing clears each
//! component by its own base value.

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

/// Configuration for [`RSynaptic`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RSynapticConfig {
    /// Synaptic current decay rate, clamped to `[0, 1]` when used
    pub alpha: NeuronParam,
    /// Membrane decay rate, clamped to `[0, 1]` when used
    pub beta: NeuronParam,
    /// Recurrent weight applied to the previous spike
    #[serde(alias = "V")]
    pub v: NeuronParam,
    #[serde(default)]
    pub learn_alpha: bool,
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

impl JsonConfig for RSynapticConfig {}

impl RSynapticConfig {
    pub fn new(
        alpha: impl Into<NeuronParam>,
        beta: impl Into<NeuronParam>,
        v: impl Into<NeuronParam>,
    ) -> Self {
        Self {
            alpha: alpha.into(),
            beta: beta.into(),
            v: v.into(),
            learn_alpha: false,
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

    pub fn with_learn_alpha(mut self, learn: bool) -> Self {
        self.learn_alpha = learn;
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
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<RSynaptic<B>> {
        Ok(RSynaptic {
            lif: self.lif.init(device),
            alpha: param(self.alpha.to_tensor("alpha", device)?, self.learn_alpha),
            beta: param(self.beta.to_tensor("beta", device)?, self.learn_beta),
            v: param(self.v.to_tensor("V", device)?, self.learn_v),
        })
    }

    /// Neuron that owns its spike, synaptic current and membrane between calls.
    pub fn init_hidden<B: Backend, const D: usize>(
        &self,
        device: &B::Device,
    ) -> Result<HiddenRSynaptic<B, D>> {
        Ok(HiddenRSynaptic::new(self.init(device)?, self.lif.output))
    }
}

/// Recurrent synaptic-conductance integrate-and-fire neuron layer.
#[derive(Module, Debug)]
pub struct RSynaptic<B: Backend> {
    lif: Lif<B>,
    alpha: Param<Tensor<B, 1>>,
    beta: Param<Tensor<B, 1>>,
    v: Param<Tensor<B, 1>>,
}

impl<B: Backend> RSynaptic<B> {
    /// Stored (unclamped) synaptic decay rate
    pub fn alpha(&self) -> Tensor<B, 1> {
        self.alpha.val()
    }

    /// Stored (unclamped) membrane decay rate
    pub fn beta(&self) -> Tensor<B, 1> {
        self.beta.val()
    }

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
        syn: Tensor<B, D>,
        mem: Tensor<B, D>,
    ) -> (Tensor<B, D>, Tensor<B, D>) {
        let syn_base =
            decay::<B, D>(&self.alpha) * syn + input + broadcast::<B, D>(&self.v) * spk;
        let mem_base = decay::<B, D>(&self.beta) * mem + syn_base.clone();
        (syn_base, mem_base)
    }

    /// Next (synaptic current, membrane). The reset indicator comes from
    /// `mem` as received, before the update.
    pub fn state_fn<const D: usize>(
        &self,
        input: Tensor<B, D>,
        spk: Tensor<B, D>,
        syn: Tensor<B, D>,
        mem: Tensor<B, D>,
    ) -> (Tensor<B, D>, Tensor<B, D>) {
        let reset = self.lif.mem_reset(mem.clone());
        let (syn_base, mem_base) = self.base_state(input, spk, syn, mem);

        match self.lif.reset_mechanism() {
            ResetMechanism::Subtract => (syn_base, mem_base - reset * self.lif.threshold::<D>()),
            ResetMechanism::Zero => (
                syn_base.clone() - reset.clone() * syn_base,
                mem_base.clone() - reset * mem_base,
            ),
            ResetMechanism::None => (syn_base, mem_base),
        }
    }

    /// Advances one timestep with explicit state.
    ///
    /// # Returns
    /// Tuple of (spike, synaptic current, membrane), all shaped like `input`
    pub fn forward<const D: usize>(
        &self,
        input: Tensor<B, D>,
        spk: LazyState<B, D>,
        syn: LazyState<B, D>,
        mem: LazyState<B, D>,
    ) -> (Tensor<B, D>, Tensor<B, D>, Tensor<B, D>) {
        let spk = spk.resolve(&input);
        let syn = syn.resolve(&input);
        let mem = mem.resolve(&input);

        tracing::trace!(reset = %self.lif.reset_mechanism(), "rsynaptic step");
        let (syn, mem) = self.state_fn(input, spk, syn, mem);
        let spk = self.lif.emit(mem.clone());

        (spk, syn, mem)
    }
}

/// Output of a [`HiddenRSynaptic`] step.
#[derive(Debug, Clone)]
pub struct RSynapticOutput<B: Backend, const D: usize> {
    pub spk: Tensor<B, D>,
    /// `(synaptic current, membrane)`, present only for output layers
    pub state: Option<(Tensor<B, D>, Tensor<B, D>)>,
}

/// [`RSynaptic`] that keeps its spike, synaptic current and membrane
/// between calls.
///
/// Not a burn `Module`; optimizer updates go through [`HiddenRSynaptic::neuron_mut`].
#[derive(Debug)]
pub struct HiddenRSynaptic<B: Backend, const D: usize> {
    neuron: RSynaptic<B>,
    spk: LazyState<B, D>,
    syn: LazyState<B, D>,
    mem: LazyState<B, D>,
    output: bool,
}

impl<B: Backend, const D: usize> HiddenRSynaptic<B, D> {
    pub fn new(neuron: RSynaptic<B>, output: bool) -> Self {
        Self {
            neuron,
            spk: LazyState::Uninitialized,
            syn: LazyState::Uninitialized,
            mem: LazyState::Uninitialized,
            output,
        }
    }

    pub fn neuron(&self) -> &RSynaptic<B> {
        &self.neuron
    }

    pub fn neuron_mut(&mut self) -> &mut RSynaptic<B> {
        &mut self.neuron
    }

    pub fn into_neuron(self) -> RSynaptic<B> {
        self.neuron
    }

    pub fn is_output(&self) -> bool {
        self.output
    }

    pub fn spk(&self) -> &LazyState<B, D> {
        &self.spk
    }

    pub fn syn(&self) -> &LazyState<B, D> {
        &self.syn
    }

    pub fn mem(&self) -> &LazyState<B, D> {
        &self.mem
    }

    /// Advances one timestep using and overwriting the owned state.
    pub fn forward(&mut self, input: Tensor<B, D>) -> Result<RSynapticOutput<B, D>> {
        self.spk.check_shape(&input)?;
        self.syn.check_shape(&input)?;
        self.mem.check_shape(&input)?;

        if !self.mem.is_initialized() {
            tracing::debug!(shape = ?input.dims(), "materializing rsynaptic hidden state");
        }

        let (spk, syn, mem) = self.neuron.forward(
            input,
            take(&mut self.spk),
            take(&mut self.syn),
            take(&mut self.mem),
        );
        self.spk = LazyState::Value(spk.clone());
        self.syn = LazyState::Value(syn.clone());
        self.mem = LazyState::Value(mem.clone());

        Ok(RSynapticOutput {
            spk,
            state: self.output.then_some((syn, mem)),
        })
    }
}

impl<B: Backend, const D: usize> HiddenState for HiddenRSynaptic<B, D> {
    fn detach_hidden(&mut self) {
        self.spk = take(&mut self.spk).detach();
        self.syn = take(&mut self.syn).detach();
        self.mem = take(&mut self.mem).detach();
    }

    fn reset_hidden(&mut self) {
        self.spk = LazyState::Uninitialized;
        self.syn = LazyState::Uninitialized;
        self.mem = LazyState::Uninitialized;
    }

    fn is_initialized(&self) -> bool {
        self.mem.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn values(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    fn step_from_spiking_state(mechanism: ResetMechanism) -> (Vec<f32>, Vec<f32>) {
        let device = Default::default();
        let neuron = RSynapticConfig::new(0.5, 0.5, 1.0)
            .with_reset_mechanism(mechanism)
            .init::<TestBackend>(&device)
            .unwrap();

        let input = Tensor::<TestBackend, 2>::from_floats([[1.0]], &device);
        let spk = Tensor::<TestBackend, 2>::from_floats([[1.0]], &device);
        let syn = Tensor::<TestBackend, 2>::from_floats([[1.0]], &device);
        let mem = Tensor::<TestBackend, 2>::from_floats([[1.0]], &device);

        let (syn, mem) = neuron.state_fn(input, spk, syn, mem);
        (values(syn), values(mem))
    }

    #[test]
    fn test_rsynaptic_creation() {
        let device = Default::default();
        let neuron = RSynapticConfig::new(0.8, 0.6, vec![0.1, 0.2])
            .init::<TestBackend>(&device)
            .unwrap();

        assert_eq!(neuron.alpha().into_scalar(), 0.8);
        assert_eq!(neuron.beta().into_scalar(), 0.6);
        assert_eq!(neuron.v().dims(), [2]);
        assert_eq!(neuron.reset_mechanism(), ResetMechanism::Subtract);
    }

    #[test]
    fn test_subtract_keeps_synaptic_current() {
        // syn_base = 0.5 + 1 + 1 = 2.5, mem_base = 0.5 + 2.5 = 3.0, prior mem at threshold
        let (syn, mem) = step_from_spiking_state(ResetMechanism::Subtract);
        assert_eq!(syn, vec![2.5]);
        assert_eq!(mem, vec![2.0]);
    }

    #[test]
    fn test_zero_clears_both_components() {
        let (syn, mem) = step_from_spiking_state(ResetMechanism::Zero);
        assert_eq!(syn, vec![0.0]);
        assert_eq!(mem, vec![0.0]);
    }

    #[test]
    fn test_no_reset_is_pure_integration() {
        let (syn, mem) = step_from_spiking_state(ResetMechanism::None);
        assert_eq!(syn, vec![2.5]);
        assert_eq!(mem, vec![3.0]);
    }

    #[test]
    fn test_hidden_output_layer_returns_state() {
        let device = Default::default();
        let mut layer = RSynapticConfig::new(0.9, 0.8, 0.5)
            .with_output(true)
            .init_hidden::<TestBackend, 2>(&device)
            .unwrap();

        let out = layer
            .forward(Tensor::<TestBackend, 2>::ones([3, 4], &device))
            .unwrap();
        let (syn, mem) = out.state.expect("output layer returns its state");

        assert_eq!(out.spk.dims(), [3, 4]);
        assert_eq!(values(syn), vec![1.0; 12]);
        assert_eq!(values(mem), vec![1.0; 12]);
    }
}
