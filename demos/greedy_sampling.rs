//! Step-by-step greedy sampling
//!
//! Walks the greedy decoder one token at a time and shows that two images
//! decoded in separate calls never share state.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use captioner::decoder::CaptionDecoderConfig;

fn main() -> captioner::Result<()> {
    env_logger::init();

    println!("=== Greedy Sampling Example ===\n");

    type Backend = NdArray<f32>;
    let device = Default::default();

    let decoder = CaptionDecoderConfig::new(16, 32, 40).init::<Backend>(&device)?;
    let features = Tensor::<Backend, 2>::random([2, 16], Distribution::Uniform(-1.0, 1.0), &device);

    println!("Decoding {} steps lazily:", decoder.max_seq_length());
    for (t, step) in decoder
        .greedy_steps(features.clone(), decoder.max_seq_length(), None)?
        .enumerate()
    {
        let step = step?;
        println!("  t={:2} tokens={:?}", t, step.into_data().to_vec::<i64>().ok());
    }
    println!();

    println!("Repeat call with the same features:");
    let first = decoder.sample(features.clone(), None)?;
    let second = decoder.sample(features, None)?;
    println!(
        "  Identical: {}",
        first.into_data().to_vec::<i64>().ok() == second.into_data().to_vec::<i64>().ok()
    );
    println!();

    println!("=== Example completed successfully! ===");
    Ok(())
}
