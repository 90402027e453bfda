//! Serializable neuron parameters and config helpers

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use ndarray::Array1;
use rand::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{NeuronError, Result};

/// A neuron parameter shared by the whole layer or given per neuron.
///
/// Serialized untagged, so a config holds either `0.5` or `[0.1, 0.7, 0.3]`.
/// Per-neuron values run along the last (neuron) axis of the input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NeuronParam {
    Scalar(f32),
    PerNeuron(Vec<f32>),
}

impl NeuronParam {
    /// Per-neuron values drawn uniformly from `[0, 1)`.
    pub fn random(width: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        NeuronParam::PerNeuron((0..width).map(|_| rng.gen::<f32>()).collect())
    }

    /// Number of neurons this parameter is specified for (`None` if shared)
    pub fn width(&self) -> Option<usize> {
        match self {
            NeuronParam::Scalar(_) => None,
            NeuronParam::PerNeuron(values) => Some(values.len()),
        }
    }

    pub(crate) fn to_tensor<B: Backend>(
        &self,
        name: &'static str,
        device: &B::Device,
    ) -> Result<Tensor<B, 1>> {
        match self {
            NeuronParam::Scalar(value) => Ok(Tensor::from_floats([*value], device)),
            NeuronParam::PerNeuron(values) if values.is_empty() => {
                Err(NeuronError::EmptyParameter(name))
            }
            NeuronParam::PerNeuron(values) => Ok(Tensor::from_floats(values.as_slice(), device)),
        }
    }
}

impl From<f32> for NeuronParam {
    fn from(value: f32) -> Self {
        NeuronParam::Scalar(value)
    }
}

impl From<Vec<f32>> for NeuronParam {
    fn from(values: Vec<f32>) -> Self {
        NeuronParam::PerNeuron(values)
    }
}

impl From<&[f32]> for NeuronParam {
    fn from(values: &[f32]) -> Self {
        NeuronParam::PerNeuron(values.to_vec())
    }
}

impl From<Array1<f32>> for NeuronParam {
    fn from(values: Array1<f32>) -> Self {
        NeuronParam::PerNeuron(values.to_vec())
    }
}

/// JSON load/save for neuron configs.
pub trait JsonConfig: Serialize + DeserializeOwned + Sized {
    fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type Backend = NdArray<f32>;

    #[test]
    fn test_random_is_seeded() {
        let a = NeuronParam::random(16, 42);
        let b = NeuronParam::random(16, 42);
        let c = NeuronParam::random(16, 43);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.width(), Some(16));

        if let NeuronParam::PerNeuron(values) = a {
            assert!(values.iter().all(|v| (0.0..1.0).contains(v)));
        }
    }

    #[test]
    fn test_to_tensor_shapes() {
        let device = Default::default();

        let scalar = NeuronParam::from(0.5).to_tensor::<Backend>("beta", &device).unwrap();
        assert_eq!(scalar.dims(), [1]);

        let per_neuron = NeuronParam::from(Array1::from(vec![0.1f32, 0.2, 0.3]))
            .to_tensor::<Backend>("beta", &device)
            .unwrap();
        assert_eq!(per_neuron.dims(), [3]);
    }

    #[test]
    fn test_empty_per_neuron_rejected() {
        let device = Default::default();
        let err = NeuronParam::PerNeuron(vec![])
            .to_tensor::<Backend>("V", &device)
            .unwrap_err();

        assert!(matches!(err, NeuronError::EmptyParameter("V")));
    }

    #[test]
    fn test_untagged_serde() {
        let scalar: NeuronParam = serde_json::from_str("0.25").unwrap();
        assert_eq!(scalar, NeuronParam::Scalar(0.25));

        let list: NeuronParam = serde_json::from_str("[0.5, 1.0]").unwrap();
        assert_eq!(list, NeuronParam::PerNeuron(vec![0.5, 1.0]));
    }
}
