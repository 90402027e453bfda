//! Leaky integrate-and-fire base shared by the recurrent neurons
//!
//! Holds the threshold and the spike policy. Reset indicators and spikes are
//! both derived from the threshold-shifted membrane:
//!
//! ```text
//! reset = H(U[t]   - U_thr)    (detached, from the membrane before the update)
//! S     = H(U[t+1] - U_thr)    (surrogate gradient on the backward pass)
//! ```

use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::reset::ResetMechanism;
use crate::surrogate::{Surrogate, SurrogateSpike};

/// Options common to every recurrent neuron.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifConfig {
    /// Firing threshold
    pub threshold: f32,
    /// Surrogate used to differentiate through the threshold
    pub spike_grad: Surrogate,
    /// Only the most depolarized neuron(s) in each batch row may spike
    pub inhibition: bool,
    pub learn_threshold: bool,
    pub reset_mechanism: ResetMechanism,
    /// Hidden-state layers also return their state when set (read-out layers)
    pub output: bool,
}

impl Default for LifConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            spike_grad: Surrogate::default(),
            inhibition: false,
            learn_threshold: false,
            reset_mechanism: ResetMechanism::Subtract,
            output: false,
        }
    }
}

impl LifConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Lif<B> {
        Lif {
            threshold: param(
                Tensor::from_floats([self.threshold], device),
                self.learn_threshold,
            ),
            spike_grad: self.spike_grad,
            inhibition: self.inhibition,
            reset_mechanism: self.reset_mechanism,
        }
    }
}

/// Threshold comparison and spike emission.
#[derive(Module, Debug)]
pub struct Lif<B: Backend> {
    threshold: Param<Tensor<B, 1>>,
    spike_grad: Surrogate,
    inhibition: bool,
    reset_mechanism: ResetMechanism,
}

impl<B: Backend> Lif<B> {
    pub fn reset_mechanism(&self) -> ResetMechanism {
        self.reset_mechanism
    }

    pub fn spike_grad(&self) -> Surrogate {
        self.spike_grad
    }

    pub fn inhibition(&self) -> bool {
        self.inhibition
    }

    /// Stored threshold, shape `[1]`
    pub fn threshold_value(&self) -> Tensor<B, 1> {
        self.threshold.val()
    }

    /// Threshold broadcastable against a rank-`D` membrane
    pub fn threshold<const D: usize>(&self) -> Tensor<B, D> {
        self.threshold.val().unsqueeze::<D>()
    }

    /// 1 where the membrane has reached threshold, 0 elsewhere. No gradient.
    pub fn mem_reset<const D: usize>(&self, mem: Tensor<B, D>) -> Tensor<B, D> {
        let shifted = mem - self.threshold::<D>();
        self.spike_grad.spike(shifted).detach()
    }

    /// Elementwise spike emission.
    pub fn fire<const D: usize>(&self, mem: Tensor<B, D>) -> Tensor<B, D> {
        (mem - self.threshold::<D>()).spike_with(&self.spike_grad)
    }

    /// Spike emission where only the maximum-potential neuron(s) of each
    /// batch row may spike. Every axis after the first counts as part of the
    /// row; a rank-1 membrane is a single row. Ties all keep their spike.
    pub fn fire_inhibition<const D: usize>(&self, mem: Tensor<B, D>) -> Tensor<B, D> {
        let shape = mem.shape();
        let dims = mem.dims();
        let numel: usize = dims.iter().product();
        let batch = if D < 2 { 1 } else { dims[0] };
        let width = if batch == 0 { 0 } else { numel / batch };

        let shifted = mem - self.threshold::<D>();
        let rows: Tensor<B, 2> = shifted.clone().reshape([batch, width]);
        let row_max = rows.clone().max_dim(1).expand(rows.shape());
        let winners: Tensor<B, D> = rows.greater_equal(row_max).float().reshape(shape);

        shifted.spike_with(&self.spike_grad) * winners
    }

    /// Spikes under the policy chosen at construction.
    pub fn emit<const D: usize>(&self, mem: Tensor<B, D>) -> Tensor<B, D> {
        if self.inhibition {
            self.fire_inhibition(mem)
        } else {
            self.fire(mem)
        }
    }
}

/// Wraps a parameter tensor, trainable only when `learn` is set.
pub(crate) fn param<B: Backend>(values: Tensor<B, 1>, learn: bool) -> Param<Tensor<B, 1>> {
    Param::from_tensor(values).set_require_grad(learn)
}

/// Decay rate clamped to `[0, 1]`, broadcastable against a rank-`D` state.
///
/// The stored parameter is left untouched.
pub(crate) fn decay<B: Backend, const D: usize>(rate: &Param<Tensor<B, 1>>) -> Tensor<B, D> {
    rate.val().clamp(0.0, 1.0).unsqueeze::<D>()
}

/// Parameter broadcastable against a rank-`D` state.
pub(crate) fn broadcast<B: Backend, const D: usize>(value: &Param<Tensor<B, 1>>) -> Tensor<B, D> {
    value.val().unsqueeze::<D>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type Backend = NdArray<f32>;

    fn values<const D: usize>(t: Tensor<Backend, D>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_fire_compares_against_threshold() {
        let device = Default::default();
        let lif = LifConfig {
            threshold: 0.5,
            ..Default::default()
        }
        .init::<Backend>(&device);

        let mem = Tensor::<Backend, 2>::from_floats([[0.2, 0.5, 0.9]], &device);

        assert_eq!(values(lif.fire(mem.clone())), vec![0.0, 1.0, 1.0]);
        assert_eq!(values(lif.mem_reset(mem)), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_fire_inhibition_keeps_row_maximum() {
        let device = Default::default();
        let lif = LifConfig {
            inhibition: true,
            ..Default::default()
        }
        .init::<Backend>(&device);

        let mem = Tensor::<Backend, 2>::from_floats(
            [[1.5, 3.0, 2.0], [0.1, 0.4, 0.2], [2.0, 2.0, 1.0]],
            &device,
        );

        let spikes = values(lif.emit(mem));
        // row 0: only the max fires, row 1: max is below threshold, row 2: tie
        assert_eq!(spikes, vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_fire_inhibition_spans_whole_batch_row() {
        let device = Default::default();
        let lif = LifConfig {
            inhibition: true,
            ..Default::default()
        }
        .init::<Backend>(&device);

        let mem = Tensor::<Backend, 3>::from_floats(
            [[[2.0, 3.0], [4.0, 1.0]], [[0.5, 1.5], [1.0, 0.2]]],
            &device,
        );
        assert_eq!(
            values(lif.emit(mem)),
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
        );

        let mem = Tensor::<Backend, 1>::from_floats([2.0, 3.0], &device);
        assert_eq!(values(lif.emit(mem)), vec![0.0, 1.0]);
    }

    #[test]
    fn test_decay_clamps_without_touching_parameter() {
        let device = Default::default();
        let rate = param(Tensor::<Backend, 1>::from_floats([1.5, -0.25, 0.3], &device), false);

        let clamped: Tensor<Backend, 2> = decay(&rate);

        assert_eq!(clamped.dims(), [1, 3]);
        assert_eq!(values(clamped), vec![1.0, 0.0, 0.3]);
        assert_eq!(values(rate.val()), vec![1.5, -0.25, 0.3]);
    }

    #[test]
    fn test_default_config() {
        let config = LifConfig::default();
        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.reset_mechanism, ResetMechanism::Subtract);
        assert_eq!(config.spike_grad, Surrogate::ATan { alpha: 2.0 });
        assert!(!config.inhibition && !config.learn_threshold && !config.output);
    }
}
