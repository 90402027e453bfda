//! Recurrent spiking neurons, step by step and over whole sequences
//!
//! Shows explicit state threading with RLeaky, layer-owned state with
//! RSynaptic and truncated BPTT, and the sequence wrappers.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use snn_recurrent::prelude::*;

fn main() -> snn_recurrent::Result<()> {
    println!("=== Recurrent Spiking Neurons ===\n");

    type Backend = NdArray<f32>;
    let device = Default::default();

    // Example 1: explicit state, the caller threads spk/mem
    println!("Example 1: RLeaky with explicit state");
    let neuron = RLeakyConfig::new(0.5, 1.0).init::<Backend>(&device)?;

    let mut spk = LazyState::Uninitialized;
    let mut mem = LazyState::Uninitialized;
    for t in 0..3 {
        let input = Tensor::<Backend, 2>::ones([1, 1], &device);
        let (new_spk, new_mem) = neuron.forward(input, spk, mem);
        println!(
            "  t={}  spk={}  mem={}",
            t,
            new_spk.clone().into_scalar(),
            new_mem.clone().into_scalar()
        );
        spk = new_spk.into();
        mem = new_mem.into();
    }
    println!();

    // Example 2: layer-owned state with windowed detach
    println!("Example 2: RSynaptic hidden state, truncated BPTT");
    let mut lif = RSynapticConfig::new(0.9, 0.8, NeuronParam::random(16, 42))
        .with_reset_mechanism(ResetMechanism::Zero)
        .with_output(true)
        .init_hidden::<Backend, 2>(&device)?;

    let window = 5;
    for step in 0..20 {
        let input = Tensor::<Backend, 2>::random([4, 16], Distribution::Uniform(0.0, 0.6), &device);
        let out = lif.forward(input)?;

        if (step + 1) % window == 0 {
            let rate = out.spk.mean().into_scalar();
            println!("  step {:>2}: firing rate {:.3}", step + 1, rate);
            lif.detach_hidden();
        }
    }

    // New sequence, possibly a different batch size
    lif.reset_hidden();
    let out = lif.forward(Tensor::<Backend, 2>::zeros([8, 16], &device))?;
    println!("  after reset, spike shape {:?}", out.spk.dims());
    println!();

    // Example 3: whole sequences
    println!("Example 3: Sequence layers");
    let layer = RLeakySequence::new(RLeakyConfig::new(0.9, 0.5).init::<Backend>(&device)?);
    let input = Tensor::<Backend, 3>::random([4, 25, 10], Distribution::Uniform(0.0, 0.5), &device);
    let out = layer.forward(input, None)?;
    println!("  spk record: {:?}", out.spk.dims());
    println!("  final mem:  {:?}", out.state.1.dims());

    let layer = RSynapticSequence::new(
        RSynapticConfig::new(0.8, 0.9, 0.5)
            .with_spike_grad(Surrogate::FastSigmoid { slope: 25.0 })
            .init::<Backend>(&device)?,
    )
    .with_batch_first(false)
    .with_return_sequences(false);
    let input = Tensor::<Backend, 3>::random([25, 4, 10], Distribution::Uniform(0.0, 0.5), &device);
    let out = layer.forward(input, None)?;
    println!("  last-step syn: {:?}", out.syn.dims());

    println!("\n=== Done ===");
    Ok(())
}
