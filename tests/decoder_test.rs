use burn::backend::NdArray;
use burn::module::Param;
use burn::nn::{EmbeddingConfig, Initializer, LinearConfig};
use burn::tensor::{Distribution, Int, Tensor};
use captioner::decoder::{CaptionDecoder, CaptionDecoderConfig, PackOrder};
use captioner::rnn::LstmConfig;
use captioner::CaptionError;

type Backend = NdArray<f32>;

fn values<const D: usize>(tensor: Tensor<Backend, D>) -> Vec<f32> {
    tensor.into_data().to_vec::<f32>().unwrap()
}

fn ids<const D: usize>(tensor: Tensor<Backend, D, Int>) -> Vec<i64> {
    tensor.into_data().to_vec::<i64>().unwrap()
}

fn assert_close(actual: Vec<f32>, expected: Vec<f32>) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!((a - e).abs() < 1e-5, "{} != {}", a, e);
    }
}

fn decoder(embed: usize, hidden: usize, vocab: usize) -> CaptionDecoder<Backend> {
    let device = Default::default();
    CaptionDecoderConfig::new(embed, hidden, vocab)
        .init(&device)
        .unwrap()
}

/// Score row `t` of sequence `seq` from an unpacked `[batch, steps, vocab]` tensor.
fn row(scores: &Tensor<Backend, 3>, seq: usize, t: usize) -> Vec<f32> {
    let [_, _, vocab] = scores.dims();
    values(
        scores
            .clone()
            .narrow(0, seq, 1)
            .narrow(1, t, 1)
            .reshape([vocab]),
    )
}

#[test]
fn test_compaction_keeps_valid_rows_in_sequence_order() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    let features = Tensor::<Backend, 2>::random([2, 6], Distribution::Uniform(-1.0, 1.0), &device);
    let captions = Tensor::<Backend, 2, Int>::from_ints([[1, 2, 3], [4, 0, 0]], &device);

    let scores = decoder
        .scores(features.clone(), captions.clone())
        .unwrap();
    assert_eq!(scores.dims(), [2, 4, 11]);

    let packed = decoder.forward(features, captions, &[3, 1]).unwrap();
    assert_eq!(packed.num_rows(), 4);
    assert_eq!(packed.data().dims(), [4, 11]);

    let rows = packed.into_inner();
    let expected = [(0, 0), (0, 1), (0, 2), (1, 0)];
    for (i, (seq, t)) in expected.into_iter().enumerate() {
        let packed_row = values(rows.clone().narrow(0, i, 1).reshape([11]));
        assert_close(packed_row, row(&scores, seq, t));
    }
}

#[test]
fn test_time_major_compaction_order() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    let features = Tensor::<Backend, 2>::random([2, 6], Distribution::Uniform(-1.0, 1.0), &device);
    let captions = Tensor::<Backend, 2, Int>::from_ints([[1, 2, 3], [4, 5, 0]], &device);

    let scores = decoder
        .scores(features.clone(), captions.clone())
        .unwrap();
    let packed = decoder
        .forward_with_order(features, captions, &[4, 2], PackOrder::TimeMajor)
        .unwrap();
    assert_eq!(packed.batch_sizes(), vec![2, 2, 1, 1]);

    let rows = packed.into_inner();
    let expected = [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2), (0, 3)];
    for (i, (seq, t)) in expected.into_iter().enumerate() {
        let packed_row = values(rows.clone().narrow(0, i, 1).reshape([11]));
        assert_close(packed_row, row(&scores, seq, t));
    }
}

#[test]
fn test_time_major_requires_sorted_lengths() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    let features = Tensor::<Backend, 2>::zeros([2, 6], &device);
    let captions = Tensor::<Backend, 2, Int>::zeros([2, 3], &device);

    let err = decoder
        .forward_with_order(features, captions, &[2, 4], PackOrder::TimeMajor)
        .unwrap_err();
    assert!(matches!(err, CaptionError::UnsortedLengths { index: 1, .. }));
}

#[test]
fn test_padding_does_not_leak_into_valid_rows() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    let features = Tensor::<Backend, 2>::random([2, 6], Distribution::Uniform(-1.0, 1.0), &device);
    let clean = Tensor::<Backend, 2, Int>::from_ints([[1, 2, 3], [4, 0, 0]], &device);
    let noisy = Tensor::<Backend, 2, Int>::from_ints([[1, 2, 3], [4, 9, 7]], &device);

    let lengths = [4, 2];
    let expected = decoder.forward(features.clone(), clean, &lengths).unwrap();
    let actual = decoder.forward(features, noisy, &lengths).unwrap();

    assert_close(values(actual.into_inner()), values(expected.into_inner()));
}

#[test]
fn test_length_beyond_unrolled_steps_fails() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    let features = Tensor::<Backend, 2>::zeros([2, 6], &device);
    let captions = Tensor::<Backend, 2, Int>::zeros([2, 3], &device);

    let err = decoder.forward(features, captions, &[5, 1]).unwrap_err();
    assert_eq!(
        err,
        CaptionError::Length {
            index: 0,
            length: 5,
            available: 4
        }
    );
}

#[test]
fn test_feature_width_mismatch_fails() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    let features = Tensor::<Backend, 2>::zeros([2, 5], &device);
    let captions = Tensor::<Backend, 2, Int>::zeros([2, 3], &device);

    let err = decoder.forward(features, captions, &[1, 1]).unwrap_err();
    assert_eq!(
        err,
        CaptionError::Shape {
            operand: "image features",
            expected: vec![2, 6],
            actual: vec![2, 5],
        }
    );
}

#[test]
fn test_sample_is_fixed_width() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    for batch_size in [1, 3, 8] {
        let features = Tensor::<Backend, 2>::random(
            [batch_size, 6],
            Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let tokens = decoder.sample(features, None).unwrap();
        assert_eq!(tokens.dims(), [batch_size, 20]);
        assert!(ids(tokens).iter().all(|&id| (0..11).contains(&id)));
    }
}

#[test]
fn test_sample_is_repeatable() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    let features = Tensor::<Backend, 2>::random([4, 6], Distribution::Uniform(-1.0, 1.0), &device);
    let first = decoder.sample(features.clone(), None).unwrap();
    let second = decoder.sample(features, None).unwrap();

    assert_eq!(ids(first), ids(second));
}

#[test]
fn test_sample_feeds_back_its_own_predictions() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    let features = Tensor::<Backend, 2>::random([2, 6], Distribution::Uniform(-1.0, 1.0), &device);
    let sampled = ids(decoder.sample_steps(features.clone(), 6, None).unwrap());

    // Replay by hand: image first, then the embedding of each arg-max token
    let mut input = features.unsqueeze_dim::<3>(1);
    let mut state = None;
    let mut columns = Vec::new();
    for _ in 0..6 {
        let (hiddens, next) = decoder.lstm().forward(input, state).unwrap();
        state = Some(next);
        let scores = decoder.project(hiddens.reshape([2, 8]));
        let predicted = scores.argmax(1);
        columns.push(ids(predicted.clone()));
        input = decoder.embed_tokens(predicted);
    }

    for (t, column) in columns.iter().enumerate() {
        assert_eq!(column[0], sampled[t]);
        assert_eq!(column[1], sampled[6 + t]);
    }
}

#[test]
fn test_ties_resolve_to_lowest_index() {
    let device = Default::default();
    let embed = EmbeddingConfig::new(5, 3).init::<Backend>(&device);
    let lstm = LstmConfig::new(3, 4).init::<Backend>(&device).unwrap();
    let output = LinearConfig::new(4, 5)
        .with_initializer(Initializer::Zeros)
        .init::<Backend>(&device);
    let decoder = CaptionDecoder::from_parts(embed, lstm, output, 7).unwrap();

    let features = Tensor::<Backend, 2>::random([3, 3], Distribution::Uniform(-1.0, 1.0), &device);
    let tokens = decoder.sample(features, None).unwrap();

    assert_eq!(tokens.dims(), [3, 7]);
    assert!(ids(tokens).iter().all(|&id| id == 0));
}

#[test]
fn test_biased_projection_always_wins() {
    let device = Default::default();
    let embed = EmbeddingConfig::new(5, 3).init::<Backend>(&device);
    let lstm = LstmConfig::new(3, 4).init::<Backend>(&device).unwrap();
    let mut output = LinearConfig::new(4, 5)
        .with_initializer(Initializer::Zeros)
        .init::<Backend>(&device);
    output.bias = Some(Param::from_tensor(Tensor::from_floats(
        [0.0, 0.0, 0.0, 1.0, 0.0],
        &device,
    )));
    let decoder = CaptionDecoder::from_parts(embed, lstm, output, 4).unwrap();

    let features = Tensor::<Backend, 2>::random([2, 3], Distribution::Uniform(-1.0, 1.0), &device);
    let tokens = decoder.sample(features, None).unwrap();

    assert_eq!(ids(tokens), vec![3; 8]);
}

#[test]
fn test_greedy_steps_match_sample_columns() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    let features = Tensor::<Backend, 2>::random([2, 6], Distribution::Uniform(-1.0, 1.0), &device);
    let sampled = ids(decoder.sample_steps(features.clone(), 5, None).unwrap());

    let steps = decoder.greedy_steps(features, 5, None).unwrap();
    for (t, step) in steps.enumerate() {
        let column = ids(step.unwrap());
        assert_eq!(column, vec![sampled[t], sampled[5 + t]]);
    }
}

#[test]
fn test_explicit_zero_state_matches_default() {
    let device = Default::default();
    let decoder = decoder(6, 8, 11);

    let features = Tensor::<Backend, 2>::random([2, 6], Distribution::Uniform(-1.0, 1.0), &device);
    let zero = decoder.zero_state(2, &device);

    let implicit = decoder.sample(features.clone(), None).unwrap();
    let explicit = decoder.sample(features, Some(zero)).unwrap();

    assert_eq!(ids(implicit), ids(explicit));
}

#[test]
fn test_from_parts_feeds_sequence_first_lstm_batch_first() {
    let device = Default::default();
    let embed = EmbeddingConfig::new(5, 3).init::<Backend>(&device);
    let lstm = LstmConfig::new(3, 4).init::<Backend>(&device).unwrap();
    let output = LinearConfig::new(4, 5).init::<Backend>(&device);

    let batch_first =
        CaptionDecoder::from_parts(embed.clone(), lstm.clone(), output.clone(), 3).unwrap();
    let seq_first =
        CaptionDecoder::from_parts(embed, lstm.with_batch_first(false), output, 3).unwrap();
    assert!(seq_first.lstm().batch_first());

    // batch == steps + 1, where a time/batch mix-up would still pass shape checks
    let features = Tensor::<Backend, 2>::random([2, 3], Distribution::Uniform(-1.0, 1.0), &device);
    let captions = Tensor::<Backend, 2, Int>::from_ints([[1], [2]], &device);

    let expected = batch_first
        .forward(features.clone(), captions.clone(), &[2, 2])
        .unwrap();
    let actual = seq_first
        .forward(features.clone(), captions, &[2, 2])
        .unwrap();
    assert_close(values(actual.into_inner()), values(expected.into_inner()));

    let expected = batch_first.sample(features.clone(), None).unwrap();
    let actual = seq_first.sample(features, None).unwrap();
    assert_eq!(ids(actual), ids(expected));
}
