//! RSynaptic sequence layer

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{NeuronError, Result};
use crate::neurons::{LazyState, RSynaptic};

/// Final `(spike, synaptic current, membrane)` of an RSynaptic pass.
pub type RSynapticState<B> = (Tensor<B, 2>, Tensor<B, 2>, Tensor<B, 2>);

/// Spike and state recordings of an [`RSynapticSequence`] pass.
#[derive(Debug, Clone)]
pub struct RSynapticSequenceOutput<B: Backend> {
    /// `[batch, seq, neurons]`, or `[batch, 1, neurons]` without `return_sequences`
    pub spk: Tensor<B, 3>,
    pub syn: Tensor<B, 3>,
    pub mem: Tensor<B, 3>,
    pub state: RSynapticState<B>,
}

/// RSynaptic layer over whole sequences.
#[derive(Module, Debug)]
pub struct RSynapticSequence<B: Backend> {
    neuron: RSynaptic<B>,
    batch_first: bool,
    return_sequences: bool,
}

impl<B: Backend> RSynapticSequence<B> {
    pub fn new(neuron: RSynaptic<B>) -> Self {
        Self {
            neuron,
            batch_first: true,
            return_sequences: true,
        }
    }

    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    pub fn with_return_sequences(mut self, return_sequences: bool) -> Self {
        self.return_sequences = return_sequences;
        self
    }

    pub fn neuron(&self) -> &RSynaptic<B> {
        &self.neuron
    }

    /// Forward pass over a `[batch, seq, neurons]` (or `[seq, batch, neurons]`)
    /// input, starting from `state` or from zeros.
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        state: Option<RSynapticState<B>>,
    ) -> Result<RSynapticSequenceOutput<B>> {
        let [d0, d1, neurons] = input.dims();
        let (batch_size, seq_len) = if self.batch_first { (d0, d1) } else { (d1, d0) };
        if seq_len == 0 {
            return Err(NeuronError::EmptySequence);
        }

        let (mut spk, mut syn, mut mem): (LazyState<B, 2>, LazyState<B, 2>, LazyState<B, 2>) =
            match state {
                Some((spk, syn, mem)) => (spk.into(), syn.into(), mem.into()),
                None => Default::default(),
            };

        let mut spk_rec: Vec<Tensor<B, 2>> = Vec::with_capacity(seq_len);
        let mut syn_rec: Vec<Tensor<B, 2>> = Vec::with_capacity(seq_len);
        let mut mem_rec: Vec<Tensor<B, 2>> = Vec::with_capacity(seq_len);
        let mut last = None;

        for t in 0..seq_len {
            let time_axis = if self.batch_first { 1 } else { 0 };
            let step_input: Tensor<B, 2> = input
                .clone()
                .narrow(time_axis, t, 1)
                .reshape([batch_size, neurons]);

            let (new_spk, new_syn, new_mem) = self.neuron.forward(step_input, spk, syn, mem);

            if self.return_sequences || t == seq_len - 1 {
                spk_rec.push(new_spk.clone());
                syn_rec.push(new_syn.clone());
                mem_rec.push(new_mem.clone());
            }

            spk = LazyState::Value(new_spk.clone());
            syn = LazyState::Value(new_syn.clone());
            mem = LazyState::Value(new_mem.clone());
            last = Some((new_spk, new_syn, new_mem));
        }

        let state = last.ok_or(NeuronError::EmptySequence)?;
        Ok(RSynapticSequenceOutput {
            spk: Tensor::stack(spk_rec, 1),
            syn: Tensor::stack(syn_rec, 1),
            mem: Tensor::stack(mem_rec, 1),
            state,
        })
    }
}
