use mlp_classifier::config::{load_config, TrainingConfig};
use mlp_classifier::data::{
    load_features, load_labels, save_predictions, split_data, Normalization,
};
use mlp_classifier::network::Network;
use mlp_classifier::utils::lr_scheduler::LRScheduler;
use mlp_classifier::utils::rng::SimpleRng;
use std::process;
use std::time::Instant;

// Mini-batch MLP with momentum and dropout for fashion-MNIST CSV vectors.
const NUM_FEATURES: usize = 784;
const HIDDEN_SIZES: [usize; 2] = [256, 128];
const NUM_CLASSES: usize = 10;
const TRAIN_SPLIT: f32 = 0.8;
const SEED: u64 = 1;

const TRAIN_VECTORS: &str = "./data/fashion_mnist_train_vectors.csv";
const TRAIN_LABELS: &str = "./data/fashion_mnist_train_labels.csv";
const TEST_VECTORS: &str = "./data/fashion_mnist_test_vectors.csv";
const TEST_LABELS: &str = "./data/fashion_mnist_test_labels.csv";

fn main() {
    let program_start = Instant::now();

    // Optional JSON config path; the reference hyperparameters otherwise.
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path).unwrap_or_else(|err| {
            eprintln!("Could not load config {}: {}", path, err);
            process::exit(1);
        }),
        None => TrainingConfig::default(),
    };

    println!("Loading training data...");
    let load_start = Instant::now();
    let mut train_features = load_features(TRAIN_VECTORS, NUM_FEATURES).unwrap_or_else(|err| {
        eprintln!("Could not load {}: {}", TRAIN_VECTORS, err);
        process::exit(1);
    });
    let train_labels = load_labels(TRAIN_LABELS).unwrap_or_else(|err| {
        eprintln!("Could not load {}: {}", TRAIN_LABELS, err);
        process::exit(1);
    });

    println!("Loading test data...");
    let mut test_features = load_features(TEST_VECTORS, NUM_FEATURES).unwrap_or_else(|err| {
        eprintln!("Could not load {}: {}", TEST_VECTORS, err);
        process::exit(1);
    });
    let test_labels = load_labels(TEST_LABELS).unwrap_or_else(|err| {
        eprintln!("Could not load {}: {}", TEST_LABELS, err);
        process::exit(1);
    });
    println!(
        "Data loading time: {:.2} seconds",
        load_start.elapsed().as_secs_f64()
    );

    // One set of standardization statistics, fitted on the training vectors
    // and reapplied to the test vectors.
    let normalization = Normalization::fit(&train_features);
    normalization.apply(&mut train_features);
    normalization.apply(&mut test_features);

    let mut rng = SimpleRng::new(SEED);
    let split = split_data(&train_features, &train_labels, TRAIN_SPLIT, &mut rng)
        .unwrap_or_else(|err| {
            eprintln!("Could not split training data: {}", err);
            process::exit(1);
        });

    println!("Initializing neural network...");
    let activation = config.hidden_activation().unwrap_or_else(|err| {
        eprintln!("Invalid config: {}", err);
        process::exit(1);
    });
    let mut network = Network::new(
        NUM_FEATURES,
        &HIDDEN_SIZES,
        NUM_CLASSES,
        config.learning_rate,
        config.momentum,
        config.dropout_rate,
        activation,
        &mut rng,
    )
    .unwrap_or_else(|err| {
        eprintln!("Could not build network: {}", err);
        process::exit(1);
    });
    println!("Model parameters: {}", network.parameter_count());

    let mut scheduler = config.build_scheduler().unwrap_or_else(|err| {
        eprintln!("Invalid config: {}", err);
        process::exit(1);
    });

    println!("Training neural network...");
    let train_start = Instant::now();
    for epoch in 0..config.epochs {
        let epoch_start = Instant::now();
        let learning_rate = scheduler.get_lr();
        let stats = network
            .train_epoch(
                &split.train_features,
                &split.train_labels,
                config.batch_size,
                learning_rate,
                &mut rng,
            )
            .unwrap_or_else(|err| {
                eprintln!("Training failed at epoch {}: {}", epoch + 1, err);
                process::exit(1);
            });
        scheduler.step();

        println!(
            "Epoch {}, LR: {:.6}, Loss: {:.6}, Accuracy: {:.2}%, Time: {:.2}s",
            epoch + 1,
            stats.learning_rate,
            stats.loss,
            stats.accuracy,
            epoch_start.elapsed().as_secs_f32()
        );
    }
    println!(
        "Total training time: {:.2} seconds",
        train_start.elapsed().as_secs_f64()
    );

    println!("Validating on held-out split...");
    let report = network
        .validate(&split.val_features, &split.val_labels)
        .unwrap_or_else(|err| {
            eprintln!("Validation failed: {}", err);
            process::exit(1);
        });
    println!(
        "Validation Loss: {:.6}, Accuracy: {:.2}%",
        report.loss, report.accuracy
    );
    save_predictions("train_predictions.csv", &report.predictions).unwrap_or_else(|err| {
        eprintln!("Could not write train_predictions.csv: {}", err);
        process::exit(1);
    });

    println!("Final test evaluation...");
    let test_start = Instant::now();
    let test_report = network
        .validate(&test_features, &test_labels)
        .unwrap_or_else(|err| {
            eprintln!("Test evaluation failed: {}", err);
            process::exit(1);
        });
    println!(
        "Test Loss: {:.6}, Accuracy: {:.2}%, Time: {:.2}s",
        test_report.loss,
        test_report.accuracy,
        test_start.elapsed().as_secs_f32()
    );
    save_predictions("test_predictions.csv", &test_report.predictions).unwrap_or_else(|err| {
        eprintln!("Could not write test_predictions.csv: {}", err);
        process::exit(1);
    });

    println!(
        "Total program time: {:.2} seconds",
        program_start.elapsed().as_secs_f64()
    );
}
