//! End-to-end training tests: convergence on a separable toy problem,
//! learning-rate scheduling at epoch boundaries, determinism, and the
//! orchestrator's error conditions.

use approx::assert_relative_eq;
use mlp_classifier::config::TrainingConfig;
use mlp_classifier::network::Network;
use mlp_classifier::utils::activations::Activation;
use mlp_classifier::utils::lr_scheduler::{Constant, ExponentialDecay};
use mlp_classifier::utils::rng::SimpleRng;

/// 20 linearly-separable points in 4 dimensions, two classes with a wide
/// margin: class 0 has positive leading features, class 1 the mirror image.
fn separable_dataset() -> (Vec<Vec<f32>>, Vec<usize>) {
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for i in 0..10 {
        let t = i as f32 * 0.05;
        features.push(vec![0.8 + t, 0.6 + t, -0.7 - t, -0.5 - t]);
        labels.push(0);
        features.push(vec![-0.8 - t, -0.6 - t, 0.7 + t, 0.5 + t]);
        labels.push(1);
    }
    (features, labels)
}

// ============================================================================
// Convergence
// ============================================================================

#[test]
fn test_two_layer_network_converges_on_separable_data() {
    let (features, labels) = separable_dataset();
    let mut rng = SimpleRng::new(42);
    let mut network =
        Network::new(4, &[3], 2, 0.02, 0.9, 0.0, Activation::LeakyRelu, &mut rng).unwrap();
    let mut scheduler = Constant::new(0.02);

    let stats = network
        .train(&features, &labels, 4, 50, &mut scheduler, &mut rng)
        .unwrap();

    assert_eq!(stats.len(), 50);
    let final_stats = stats.last().unwrap();
    assert!(
        final_stats.accuracy >= 95.0,
        "final training accuracy {} below 95%",
        final_stats.accuracy
    );
    assert!(final_stats.loss < stats[0].loss);

    // Smoothed loss keeps decreasing over the last 10 epochs.
    let moving_average: Vec<f32> = (0..48)
        .map(|i| (stats[i].loss + stats[i + 1].loss + stats[i + 2].loss) / 3.0)
        .collect();
    for i in 38..47 {
        assert!(
            moving_average[i + 1] <= moving_average[i] + 1e-3,
            "smoothed loss rose at window {}: {} -> {}",
            i,
            moving_average[i],
            moving_average[i + 1]
        );
    }

    // Validation on the training set agrees once dropout is off.
    let report = network.validate(&features, &labels).unwrap();
    assert!(report.accuracy >= 95.0);
    assert_eq!(report.predictions.len(), 20);
}

#[test]
fn test_training_reduces_loss_with_dropout() {
    let (features, labels) = separable_dataset();
    let mut rng = SimpleRng::new(7);
    let mut network =
        Network::new(4, &[8], 2, 0.02, 0.9, 0.2, Activation::LeakyRelu, &mut rng).unwrap();
    let mut scheduler = Constant::new(0.02);

    let stats = network
        .train(&features, &labels, 4, 40, &mut scheduler, &mut rng)
        .unwrap();

    // Dropout adds noise; compare smoothed start against smoothed end.
    let early: f32 = stats[..5].iter().map(|s| s.loss).sum::<f32>() / 5.0;
    let late: f32 = stats[35..].iter().map(|s| s.loss).sum::<f32>() / 5.0;
    assert!(
        late < early,
        "loss did not improve under dropout: {} -> {}",
        early,
        late
    );
}

// ============================================================================
// Learning-rate scheduling at epoch boundaries
// ============================================================================

#[test]
fn test_exponential_decay_applied_per_epoch() {
    let (features, labels) = separable_dataset();
    let mut rng = SimpleRng::new(42);
    let mut network =
        Network::new(4, &[3], 2, 0.1, 0.0, 0.0, Activation::LeakyRelu, &mut rng).unwrap();
    let mut scheduler = ExponentialDecay::new(0.1, 0.1);

    let stats = network
        .train(&features, &labels, 4, 6, &mut scheduler, &mut rng)
        .unwrap();

    // Epoch 0 runs at the initial rate; epoch 5 at lr0 * exp(-0.5).
    assert_eq!(stats[0].learning_rate, 0.1);
    assert_relative_eq!(
        stats[5].learning_rate,
        0.1 * (-0.5f32).exp(),
        epsilon = 1e-6
    );
    for (epoch, s) in stats.iter().enumerate() {
        let expected = 0.1 * (-0.1 * epoch as f32).exp();
        assert_relative_eq!(s.learning_rate, expected, epsilon = 1e-6);
    }

    // The last scheduled rate was pushed into every layer.
    assert_relative_eq!(
        network.hidden_layers()[0].learning_rate(),
        stats[5].learning_rate,
        epsilon = 1e-6
    );
    assert_relative_eq!(
        network.output_layer().learning_rate(),
        stats[5].learning_rate,
        epsilon = 1e-6
    );
}

#[test]
fn test_config_built_scheduler_drives_training() {
    let (features, labels) = separable_dataset();
    let config = TrainingConfig {
        learning_rate: 0.05,
        epochs: 4,
        decay_rate: Some(0.2),
        ..TrainingConfig::default()
    };

    let mut rng = SimpleRng::new(42);
    let mut network = Network::new(
        4,
        &[3],
        2,
        config.learning_rate,
        config.momentum,
        0.0,
        config.hidden_activation().unwrap(),
        &mut rng,
    )
    .unwrap();
    let mut scheduler = config.build_scheduler().unwrap();

    let stats = network
        .train(
            &features,
            &labels,
            config.batch_size,
            config.epochs,
            scheduler.as_mut(),
            &mut rng,
        )
        .unwrap();

    for (epoch, s) in stats.iter().enumerate() {
        let expected = 0.05 * (-0.2 * epoch as f32).exp();
        assert_relative_eq!(s.learning_rate, expected, epsilon = 1e-6);
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_training_is_reproducible_for_same_seed() {
    let (features, labels) = separable_dataset();

    let run = |seed: u64| {
        let mut rng = SimpleRng::new(seed);
        let mut network =
            Network::new(4, &[3], 2, 0.02, 0.9, 0.1, Activation::LeakyRelu, &mut rng).unwrap();
        let mut scheduler = Constant::new(0.02);
        let stats = network
            .train(&features, &labels, 4, 10, &mut scheduler, &mut rng)
            .unwrap();
        let weights = network.hidden_layers()[0].weights().to_vec();
        (stats, weights)
    };

    let (stats_a, weights_a) = run(99);
    let (stats_b, weights_b) = run(99);

    assert_eq!(weights_a, weights_b);
    for (a, b) in stats_a.iter().zip(stats_b.iter()) {
        assert_eq!(a.loss, b.loss);
        assert_eq!(a.accuracy, b.accuracy);
    }
}

// ============================================================================
// Error conditions
// ============================================================================

#[test]
fn test_empty_dataset_is_error() {
    let mut rng = SimpleRng::new(42);
    let mut network =
        Network::new(4, &[3], 2, 0.02, 0.9, 0.0, Activation::LeakyRelu, &mut rng).unwrap();
    let mut scheduler = Constant::new(0.02);

    let err = network
        .train(&[], &[], 4, 1, &mut scheduler, &mut rng)
        .unwrap_err();
    assert!(err.to_string().contains("at least one example"));
}

#[test]
fn test_zero_batch_size_is_error() {
    let (features, labels) = separable_dataset();
    let mut rng = SimpleRng::new(42);
    let mut network =
        Network::new(4, &[3], 2, 0.02, 0.9, 0.0, Activation::LeakyRelu, &mut rng).unwrap();
    let mut scheduler = Constant::new(0.02);

    assert!(network
        .train(&features, &labels, 0, 1, &mut scheduler, &mut rng)
        .is_err());
}

#[test]
fn test_label_out_of_range_is_error() {
    let mut rng = SimpleRng::new(42);
    let mut network =
        Network::new(4, &[3], 2, 0.02, 0.9, 0.0, Activation::LeakyRelu, &mut rng).unwrap();
    let mut scheduler = Constant::new(0.02);

    let features = vec![vec![0.1, 0.2, 0.3, 0.4]];
    let labels = vec![5];
    let err = network
        .train(&features, &labels, 1, 1, &mut scheduler, &mut rng)
        .unwrap_err();
    assert!(err.to_string().contains("out of range"));
}

#[test]
fn test_nan_features_surface_as_error() {
    let mut rng = SimpleRng::new(42);
    let mut network =
        Network::new(4, &[3], 2, 0.02, 0.9, 0.0, Activation::LeakyRelu, &mut rng).unwrap();
    let mut scheduler = Constant::new(0.02);

    let features = vec![vec![f32::NAN, 0.0, 0.0, 0.0]];
    let labels = vec![0];
    let err = network
        .train(&features, &labels, 1, 1, &mut scheduler, &mut rng)
        .unwrap_err();
    assert!(err.to_string().contains("non-finite"));
}

#[test]
fn test_validation_mismatched_labels_is_error() {
    let mut rng = SimpleRng::new(42);
    let mut network =
        Network::new(4, &[3], 2, 0.02, 0.9, 0.0, Activation::LeakyRelu, &mut rng).unwrap();

    let features = vec![vec![0.1, 0.2, 0.3, 0.4], vec![0.4, 0.3, 0.2, 0.1]];
    let labels = vec![0];
    assert!(network.validate(&features, &labels).is_err());
}
