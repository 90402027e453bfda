//! Surrogate gradients for the spike nonlinearity
//!
//! Spike emission is a Heaviside step, whose derivative is zero almost
//! everywhere. A surrogate keeps the exact step on the forward pass and swaps
//! in a smooth derivative on the backward pass so gradients can flow through
//! the threshold.
//!
//! The substitution is done with plain tensor ops:
//!
//! ```text
//! spike = H(x) + (x - detach(x)) * detach(g(x))
//! ```
//!
//! The second term is exactly zero in value, and its gradient with respect
//! to `x` is `g(x)`.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use burn::constant;
use serde::{Deserialize, Serialize};

use crate::error::NeuronError;

/// Surrogate derivative used on the backward pass of spike emission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Surrogate {
    /// Arctangent surrogate: `(α/2) / (1 + (π α x / 2)²)`
    #[serde(rename = "atan")]
    ATan { alpha: f32 },
    /// Fast sigmoid surrogate: `1 / (slope·|x| + 1)²`
    FastSigmoid { slope: f32 },
    /// Logistic surrogate: `slope · σ(slope·x) · (1 - σ(slope·x))`
    Sigmoid { slope: f32 },
    /// Passes the upstream gradient through unchanged
    StraightThrough,
}

impl Default for Surrogate {
    fn default() -> Self {
        Surrogate::ATan { alpha: 2.0 }
    }
}

burn::constant!(Surrogate);

impl fmt::Display for Surrogate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surrogate::ATan { alpha } => write!(f, "atan(alpha={alpha})"),
            Surrogate::FastSigmoid { slope } => write!(f, "fast_sigmoid(slope={slope})"),
            Surrogate::Sigmoid { slope } => write!(f, "sigmoid(slope={slope})"),
            Surrogate::StraightThrough => f.write_str("straight_through"),
        }
    }
}

impl FromStr for Surrogate {
    type Err = NeuronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "atan" => Ok(Surrogate::ATan { alpha: 2.0 }),
            "fast_sigmoid" => Ok(Surrogate::FastSigmoid { slope: 25.0 }),
            "sigmoid" => Ok(Surrogate::Sigmoid { slope: 25.0 }),
            "straight_through" => Ok(Surrogate::StraightThrough),
            _ => Err(NeuronError::UnknownSurrogate(s.to_string())),
        }
    }
}

impl Surrogate {
    /// Surrogate derivative evaluated at `x`.
    pub fn derivative<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        match *self {
            Surrogate::ATan { alpha } => {
                let scaled = x.mul_scalar(PI * alpha / 2.0);
                (scaled.clone() * scaled)
                    .add_scalar(1.0)
                    .recip()
                    .mul_scalar(alpha / 2.0)
            }
            Surrogate::FastSigmoid { slope } => {
                let denom = x.abs().mul_scalar(slope).add_scalar(1.0);
                (denom.clone() * denom).recip()
            }
            Surrogate::Sigmoid { slope } => {
                let s = activation::sigmoid(x.mul_scalar(slope));
                s.clone().neg().add_scalar(1.0).mul(s).mul_scalar(slope)
            }
            Surrogate::StraightThrough => x.ones_like(),
        }
    }

    /// Heaviside step `x >= 0` with this surrogate's gradient.
    pub fn spike<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        let hard = x.clone().greater_equal_elem(0.0).float();
        let slope = self.derivative(x.clone().detach()).detach();
        hard + (x.clone() - x.detach()) * slope
    }
}

/// Tensor extension for surrogate spiking.
pub trait SurrogateSpike {
    /// Emits `x >= 0` spikes, differentiated through `surrogate`
    fn spike_with(self, surrogate: &Surrogate) -> Self;
}

impl<B: Backend, const D: usize> SurrogateSpike for Tensor<B, D> {
    fn spike_with(self, surrogate: &Surrogate) -> Self {
        surrogate.spike(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type Backend = NdArray<f32>;
    type AutodiffBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_spike_is_exact_step() {
        let device = Default::default();
        let x = Tensor::<Backend, 1>::from_floats([-1.0, -0.001, 0.0, 0.5, 3.0], &device);

        for surrogate in [
            Surrogate::default(),
            Surrogate::FastSigmoid { slope: 25.0 },
            Surrogate::Sigmoid { slope: 25.0 },
            Surrogate::StraightThrough,
        ] {
            let spikes = surrogate.spike(x.clone()).into_data().to_vec::<f32>().unwrap();
            assert_eq!(spikes, vec![0.0, 0.0, 1.0, 1.0, 1.0], "{:?}", surrogate);
        }
    }

    #[test]
    fn test_atan_gradient() {
        let device = Default::default();
        let x = Tensor::<AutodiffBackend, 1>::from_floats([0.0, 1.0], &device).require_grad();

        let grads = Surrogate::ATan { alpha: 2.0 }.spike(x.clone()).sum().backward();
        let grad = x.grad(&grads).unwrap().into_data().to_vec::<f32>().unwrap();

        assert!((grad[0] - 1.0).abs() < 1e-6);
        let expected = 1.0 / (1.0 + PI * PI);
        assert!((grad[1] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_fast_sigmoid_gradient() {
        let device = Default::default();
        let x = Tensor::<AutodiffBackend, 1>::from_floats([0.0, -0.2], &device).require_grad();

        let grads = x.clone().spike_with(&Surrogate::FastSigmoid { slope: 5.0 }).sum().backward();
        let grad = x.grad(&grads).unwrap().into_data().to_vec::<f32>().unwrap();

        assert!((grad[0] - 1.0).abs() < 1e-6);
        assert!((grad[1] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_straight_through_gradient() {
        let device = Default::default();
        let x = Tensor::<AutodiffBackend, 1>::from_floats([-3.0, 0.0, 7.0], &device).require_grad();

        let grads = Surrogate::StraightThrough.spike(x.clone()).sum().backward();
        let grad = x.grad(&grads).unwrap().into_data().to_vec::<f32>().unwrap();

        assert_eq!(grad, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!("atan".parse::<Surrogate>().unwrap(), Surrogate::default());
        assert_eq!(
            "Straight_Through".parse::<Surrogate>().unwrap(),
            Surrogate::StraightThrough
        );
        assert!(matches!(
            "heaviside".parse::<Surrogate>(),
            Err(NeuronError::UnknownSurrogate(token)) if token == "heaviside"
        ));
    }

    #[test]
    fn test_serde_kind_matches_parse_tokens() {
        let atan: Surrogate = serde_json::from_str(r#"{"kind":"atan","alpha":2.0}"#).unwrap();
        assert_eq!(atan, Surrogate::default());
        assert_eq!(
            serde_json::to_string(&atan).unwrap(),
            r#"{"kind":"atan","alpha":2.0}"#
        );

        let fast: Surrogate =
            serde_json::from_str(r#"{"kind":"fast_sigmoid","slope":25.0}"#).unwrap();
        assert_eq!(fast, "fast_sigmoid".parse().unwrap());
        assert_eq!(fast.to_string(), "fast_sigmoid(slope=25)");
    }
}
