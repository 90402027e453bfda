//! Lazily materialized neuron state and the hidden-state lifecycle

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{NeuronError, Result};

/// A state slot that is either not yet materialized or holds a tensor.
///
/// Uninitialized slots resolve to zeros shaped like the first input they meet,
/// so state never has to be allocated before the batch size is known.
#[derive(Debug, Clone)]
pub enum LazyState<B: Backend, const D: usize> {
    Uninitialized,
    Value(Tensor<B, D>),
}

impl<B: Backend, const D: usize> Default for LazyState<B, D> {
    fn default() -> Self {
        LazyState::Uninitialized
    }
}

impl<B: Backend, const D: usize> From<Tensor<B, D>> for LazyState<B, D> {
    fn from(tensor: Tensor<B, D>) -> Self {
        LazyState::Value(tensor)
    }
}

impl<B: Backend, const D: usize> LazyState<B, D> {
    pub fn is_initialized(&self) -> bool {
        matches!(self, LazyState::Value(_))
    }

    pub fn value(&self) -> Option<&Tensor<B, D>> {
        match self {
            LazyState::Value(tensor) => Some(tensor),
            LazyState::Uninitialized => None,
        }
    }

    pub fn into_value(self) -> Option<Tensor<B, D>> {
        match self {
            LazyState::Value(tensor) => Some(tensor),
            LazyState::Uninitialized => None,
        }
    }

    /// Concrete state, zero-filled in the shape of `like` when uninitialized.
    pub fn resolve(self, like: &Tensor<B, D>) -> Tensor<B, D> {
        match self {
            LazyState::Value(tensor) => tensor,
            LazyState::Uninitialized => like.zeros_like(),
        }
    }

    /// Same values, no gradient history.
    pub fn detach(self) -> Self {
        match self {
            LazyState::Value(tensor) => LazyState::Value(tensor.detach()),
            LazyState::Uninitialized => LazyState::Uninitialized,
        }
    }

    /// Fails when a materialized slot was shaped for a different input.
    pub(crate) fn check_shape(&self, input: &Tensor<B, D>) -> Result<()> {
        if let LazyState::Value(tensor) = self {
            let state = tensor.dims();
            let input = input.dims();
            if state != input {
                return Err(NeuronError::StaleStateShape {
                    state: state.to_vec(),
                    input: input.to_vec(),
                });
            }
        }
        Ok(())
    }
}

/// A layer that owns its recurrent state between calls.
///
/// Used for truncated backpropagation through time: detach between windows,
/// reset between sequences.
pub trait HiddenState {
    /// Severs the owned state from its gradient history, keeping its values
    fn detach_hidden(&mut self);

    /// Returns the owned state to [`LazyState::Uninitialized`]
    fn reset_hidden(&mut self);

    /// Whether the state has been materialized by a forward call
    fn is_initialized(&self) -> bool;
}

/// Detaches every layer in a caller-owned collection.
///
/// ```ignore
/// let mut layers: [&mut dyn HiddenState; 2] = [&mut lif1, &mut lif2];
/// detach_hidden(layers.iter_mut().map(|l| &mut **l));
/// ```
pub fn detach_hidden<'a, H, I>(layers: I)
where
    H: HiddenState + ?Sized + 'a,
    I: IntoIterator<Item = &'a mut H>,
{
    let mut count = 0usize;
    for layer in layers {
        layer.detach_hidden();
        count += 1;
    }
    tracing::debug!(layers = count, "detached hidden state");
}

/// Resets every layer in a caller-owned collection.
pub fn reset_hidden<'a, H, I>(layers: I)
where
    H: HiddenState + ?Sized + 'a,
    I: IntoIterator<Item = &'a mut H>,
{
    let mut count = 0usize;
    for layer in layers {
        layer.reset_hidden();
        count += 1;
    }
    tracing::debug!(layers = count, "reset hidden state");
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type Backend = NdArray<f32>;

    #[test]
    fn test_uninitialized_resolves_to_zeros_like_input() {
        let device = Default::default();
        let input = Tensor::<Backend, 2>::ones([3, 4], &device);

        let state = LazyState::<Backend, 2>::Uninitialized.resolve(&input);

        assert_eq!(state.dims(), [3, 4]);
        assert_eq!(state.abs().sum().into_scalar(), 0.0);
    }

    #[test]
    fn test_value_passes_through() {
        let device = Default::default();
        let input = Tensor::<Backend, 2>::zeros([2, 2], &device);
        let held = Tensor::<Backend, 2>::from_floats([[1.0, 2.0], [3.0, 4.0]], &device);

        let state = LazyState::from(held).resolve(&input);

        assert_eq!(state.into_data().to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_check_shape() {
        let device = Default::default();
        let held = LazyState::from(Tensor::<Backend, 2>::zeros([2, 5], &device));

        assert!(held.check_shape(&Tensor::zeros([2, 5], &device)).is_ok());
        match held.check_shape(&Tensor::zeros([3, 5], &device)) {
            Err(NeuronError::StaleStateShape { state, input }) => {
                assert_eq!(state, vec![2, 5]);
                assert_eq!(input, vec![3, 5]);
            }
            other => panic!("expected stale shape error, got {:?}", other),
        }
        assert!(LazyState::<Backend, 2>::Uninitialized
            .check_shape(&Tensor::zeros([7, 1], &device))
            .is_ok());
    }

    #[test]
    fn test_detach_keeps_marker() {
        let state = LazyState::<Backend, 2>::Uninitialized.detach();
        assert!(!state.is_initialized());
    }
}
