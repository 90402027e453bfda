//! RLeaky sequence layer
//!
//! Unrolls an [`RLeaky`] neuron over the time axis of a 3D input.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{NeuronError, Result};
use crate::neurons::{LazyState, RLeaky};

/// Spike and membrane recordings of an [`RLeakySequence`] pass.
#[derive(Debug, Clone)]
pub struct RLeakySequenceOutput<B: Backend> {
    /// `[batch, seq, neurons]`, or `[batch, 1, neurons]` without `return_sequences`
    pub spk: Tensor<B, 3>,
    /// Membrane recording, same shape as `spk`
    pub mem: Tensor<B, 3>,
    /// Final `(spike, membrane)`, each `[batch, neurons]`
    pub state: (Tensor<B, 2>, Tensor<B, 2>),
}

/// RLeaky layer over whole sequences.
#[derive(Module, Debug)]
pub struct RLeakySequence<B: Backend> {
    neuron: RLeaky<B>,
    /// Whether input is batch-first
    batch_first: bool,
    /// Whether to record every timestep or just the last
    return_sequences: bool,
}

impl<B: Backend> RLeakySequence<B> {
    pub fn new(neuron: RLeaky<B>) -> Self {
        Self {
            neuron,
            batch_first: true,
            return_sequences: true,
        }
    }

    /// Set whether input is batch-first (default: true)
    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    /// Set whether to return full sequences (default: true)
    pub fn with_return_sequences(mut self, return_sequences: bool) -> Self {
        self.return_sequences = return_sequences;
        self
    }

    pub fn neuron(&self) -> &RLeaky<B> {
        &self.neuron
    }

    /// Forward pass over a sequence
    ///
    /// # Arguments
    /// * `input` - Input current of shape:
    ///   - `[batch, seq, neurons]` if batch_first=true
    ///   - `[seq, batch, neurons]` if batch_first=false
    /// * `state` - Optional initial `(spike, membrane)`, each `[batch, neurons]`;
    ///   zeros when `None`
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        state: Option<(Tensor<B, 2>, Tensor<B, 2>)>,
    ) -> Result<RLeakySequenceOutput<B>> {
        let [d0, d1, neurons] = input.dims();
        let (batch_size, seq_len) = if self.batch_first { (d0, d1) } else { (d1, d0) };
        if seq_len == 0 {
            return Err(NeuronError::EmptySequence);
        }

        let (mut spk, mut mem): (LazyState<B, 2>, LazyState<B, 2>) = match state {
            Some((spk, mem)) => (spk.into(), mem.into()),
            None => (LazyState::Uninitialized, LazyState::Uninitialized),
        };

        let mut spk_rec: Vec<Tensor<B, 2>> = Vec::with_capacity(seq_len);
        let mut mem_rec: Vec<Tensor<B, 2>> = Vec::with_capacity(seq_len);
        let mut last = None;

        for t in 0..seq_len {
            let step_input: Tensor<B, 2> = if self.batch_first {
                input.clone().narrow(1, t, 1).reshape([batch_size, neurons])
            } else {
                input.clone().narrow(0, t, 1).reshape([batch_size, neurons])
            };

            let (new_spk, new_mem) = self.neuron.forward(step_input, spk, mem);

            if self.return_sequences || t == seq_len - 1 {
                spk_rec.push(new_spk.clone());
                mem_rec.push(new_mem.clone());
            }

            spk = LazyState::Value(new_spk.clone());
            mem = LazyState::Value(new_mem.clone());
            last = Some((new_spk, new_mem));
        }

        let state = last.ok_or(NeuronError::EmptySequence)?;
        Ok(RLeakySequenceOutput {
            spk: Tensor::stack(spk_rec, 1),
            mem: Tensor::stack(mem_rec, 1),
            state,
        })
    }
}
