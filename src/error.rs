//! Error types for neuron construction and hidden-state stepping

use thiserror::Error;

/// Errors raised while configuring or stepping recurrent neurons.
///
/// Shape mismatches between explicit state tensors and the input are not
/// caught here; they surface from the tensor backend unchanged.
#[derive(Debug, Error)]
pub enum NeuronError {
    /// Reset mechanism token was not one of `subtract`, `zero`, `none`
    #[error("unknown reset mechanism `{0}`, expected one of \"subtract\", \"zero\", \"none\"")]
    UnknownResetMechanism(String),

    /// Surrogate gradient token was not recognized
    #[error("unknown surrogate gradient `{0}`, expected one of \"atan\", \"fast_sigmoid\", \"sigmoid\", \"straight_through\"")]
    UnknownSurrogate(String),

    /// A per-neuron parameter was given with no values
    #[error("per-neuron parameter `{0}` must contain at least one value")]
    EmptyParameter(&'static str),

    /// Hidden state was materialized for a different input shape
    #[error(
        "hidden state shape {state:?} does not match input shape {input:?}; \
         call reset_hidden before changing the batch size"
    )]
    StaleStateShape { state: Vec<usize>, input: Vec<usize> },

    /// Sequence layers need at least one timestep
    #[error("input sequence has no timesteps")]
    EmptySequence,

    /// Config could not be parsed or written
    #[error("invalid neuron config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, NeuronError>;
