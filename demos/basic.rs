//! Basic usage example of the caption decoder
//!
//! Runs one teacher-forced pass over a padded caption batch and one greedy
//! sampling pass over the same image features.
//!
//! Set `RUST_LOG=debug` to see the decoder's log output.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Int, Tensor};
use captioner::decoder::{pack_targets, CaptionDecoderConfig, PackOrder};

fn main() -> captioner::Result<()> {
    env_logger::init();

    println!("=== Captioner Basic Example ===\n");

    // Use the NdArray backend (CPU)
    type Backend = NdArray<f32>;
    let device = Default::default();

    let decoder = CaptionDecoderConfig::new(32, 64, 100)
        .with_max_seq_length(12)
        .init::<Backend>(&device)?;

    println!("Created caption decoder:");
    println!("  Embed size:  {}", decoder.embed_size());
    println!("  Hidden size: {}", decoder.hidden_size());
    println!("  Vocab size:  {}", decoder.vocab_size());
    println!();

    // Stand-in for encoder output: [batch=3, embed=32]
    let features = Tensor::<Backend, 2>::random([3, 32], Distribution::Uniform(-1.0, 1.0), &device);

    // Padded captions, sorted longest first: [batch=3, steps=5]
    let captions = Tensor::<Backend, 2, Int>::from_ints(
        [[1, 14, 27, 8, 2], [1, 33, 9, 2, 0], [1, 51, 2, 0, 0]],
        &device,
    );
    // Lengths count the image step
    let lengths = [6, 5, 4];

    println!("Example 1: Teacher-forced pass");
    let packed = decoder.forward_with_order(
        features.clone(),
        captions.clone(),
        &lengths,
        PackOrder::TimeMajor,
    )?;
    println!("  Captions shape:      {:?}", captions.dims());
    println!("  Packed scores shape: {:?}", packed.data().dims());
    println!("  Batch sizes:         {:?}", packed.batch_sizes());

    // Score at step t predicts caption token t; pad one column to cover all steps
    let targets = Tensor::cat(
        vec![captions, Tensor::<Backend, 2, Int>::zeros([3, 1], &device)],
        1,
    );
    let targets = pack_targets(targets, &lengths, PackOrder::TimeMajor)?;
    println!("  Packed targets:      {:?}", targets.dims());
    println!();

    println!("Example 2: Greedy sampling");
    let tokens = decoder.sample(features, None)?;
    println!("  Token shape: {:?}", tokens.dims());
    println!("  Tokens:      {:?}", tokens.into_data().to_vec::<i64>().ok());
    println!();

    println!("=== Examples completed successfully! ===");
    Ok(())
}
