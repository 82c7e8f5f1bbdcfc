//! Training orchestrator for the feedforward classifier
//!
//! This module drives the whole training loop: it owns the ordered stack of
//! hidden layers plus the output stage, schedules the learning rate at every
//! epoch boundary, walks the mini-batch pipeline, runs forward and backward
//! per example, accumulates gradients across each batch, and invokes every
//! layer's momentum update exactly once per batch. The orchestrator performs
//! no file or console I/O; per-epoch statistics and validation predictions
//! are returned to the caller.

use std::error::Error;

use crate::data::one_hot;
use crate::layers::{HiddenLayer, OutputLayer};
use crate::pipeline::BatchPipeline;
use crate::utils::activations::{cross_entropy, Activation};
use crate::utils::lr_scheduler::LRScheduler;
use crate::utils::rng::SimpleRng;

/// Per-epoch training statistics handed to the result sink.
#[derive(Debug, Clone, Copy)]
pub struct EpochStats {
    /// Mean per-example cross-entropy loss over the epoch.
    pub loss: f32,
    /// Training accuracy over the epoch, as a percentage.
    pub accuracy: f32,
    /// Learning rate that was pushed into every layer for this epoch.
    pub learning_rate: f32,
}

/// Result of a validation run.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Mean per-example cross-entropy loss.
    pub loss: f32,
    /// Accuracy as a percentage.
    pub accuracy: f32,
    /// Predicted class indices aligned to the input order.
    pub predictions: Vec<usize>,
}

/// Transient per-layer gradient sums, zeroed at every batch boundary.
struct GradientAccumulator {
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl GradientAccumulator {
    fn zeros(weight_len: usize, bias_len: usize) -> Self {
        Self {
            weights: vec![0.0; weight_len],
            biases: vec![0.0; bias_len],
        }
    }

    fn reset(&mut self) {
        self.weights.fill(0.0);
        self.biases.fill(0.0);
    }

    fn add(&mut self, weight_grads: &[f32], bias_grads: &[f32]) {
        for (acc, &g) in self.weights.iter_mut().zip(weight_grads) {
            *acc += g;
        }
        for (acc, &g) in self.biases.iter_mut().zip(bias_grads) {
            *acc += g;
        }
    }
}

/// Feedforward classifier: an ordered stack of hidden layers and the output
/// stage, trained with mini-batch gradient descent with momentum.
///
/// One orchestrator covers every depth; the hidden topology is just the
/// ordered size list passed to [`Network::new`]. All randomness (weight
/// initialization, dropout, shuffling) comes from explicitly seeded
/// generators supplied by the caller.
pub struct Network {
    hidden_layers: Vec<HiddenLayer>,
    output_layer: OutputLayer,
    input_len: usize,
    num_classes: usize,
}

impl Network {
    /// Build a network from an ordered list of hidden layer sizes.
    ///
    /// # Arguments
    ///
    /// * `input_len` - Feature vector length
    /// * `hidden_sizes` - Output width of each hidden layer, in order
    /// * `num_classes` - Number of classes (output stage width)
    /// * `learning_rate` - Initial learning rate, pushed into every layer
    /// * `momentum` - Momentum coefficient in [0, 1)
    /// * `dropout_rate` - Hidden-layer dropout probability in [0, 1)
    /// * `activation` - Hidden-layer activation variant
    /// * `rng` - Seeded generator for weight initialization
    ///
    /// # Errors
    ///
    /// Returns an error for zero sizes or hyperparameters outside their
    /// valid ranges.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input_len: usize,
        hidden_sizes: &[usize],
        num_classes: usize,
        learning_rate: f32,
        momentum: f32,
        dropout_rate: f32,
        activation: Activation,
        rng: &mut SimpleRng,
    ) -> Result<Self, Box<dyn Error>> {
        if input_len == 0 {
            return Err(invalid_data("input_len must be greater than 0"));
        }
        if num_classes == 0 {
            return Err(invalid_data("num_classes must be greater than 0"));
        }
        if hidden_sizes.iter().any(|&size| size == 0) {
            return Err(invalid_data("hidden layer sizes must be greater than 0"));
        }
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(invalid_data("learning_rate must be finite and positive"));
        }
        if !(momentum.is_finite() && (0.0..1.0).contains(&momentum)) {
            return Err(invalid_data("momentum must be in range [0.0, 1.0)"));
        }
        if !(dropout_rate.is_finite() && (0.0..1.0).contains(&dropout_rate)) {
            return Err(invalid_data("dropout_rate must be in range [0.0, 1.0)"));
        }

        let mut hidden_layers = Vec::with_capacity(hidden_sizes.len());
        let mut prev_len = input_len;
        for &size in hidden_sizes {
            hidden_layers.push(HiddenLayer::new(
                prev_len,
                size,
                learning_rate,
                momentum,
                dropout_rate,
                activation,
                rng,
            ));
            prev_len = size;
        }
        let output_layer = OutputLayer::new(prev_len, num_classes, learning_rate, momentum, rng);

        Ok(Self {
            hidden_layers,
            output_layer,
            input_len,
            num_classes,
        })
    }

    /// Train for a full schedule of epochs.
    ///
    /// At every epoch boundary the scheduler's current rate is pushed into
    /// every layer, then the scheduler is stepped. Returns one
    /// [`EpochStats`] per epoch, in order.
    pub fn train(
        &mut self,
        features: &[Vec<f32>],
        labels: &[usize],
        batch_size: usize,
        epochs: usize,
        scheduler: &mut dyn LRScheduler,
        rng: &mut SimpleRng,
    ) -> Result<Vec<EpochStats>, Box<dyn Error>> {
        let mut stats = Vec::with_capacity(epochs);
        for _ in 0..epochs {
            let learning_rate = scheduler.get_lr();
            stats.push(self.train_epoch(features, labels, batch_size, learning_rate, rng)?);
            scheduler.step();
        }
        Ok(stats)
    }

    /// Run one training epoch at a fixed learning rate.
    ///
    /// Per batch: gradient accumulators are zeroed; every example runs a
    /// full forward and backward pass and its per-layer gradients are summed
    /// into the accumulators; then every layer's `update_parameters` is
    /// invoked exactly once with the batch's example count. Epoch loss is
    /// the mean per-example loss.
    pub fn train_epoch(
        &mut self,
        features: &[Vec<f32>],
        labels: &[usize],
        batch_size: usize,
        learning_rate: f32,
        rng: &mut SimpleRng,
    ) -> Result<EpochStats, Box<dyn Error>> {
        self.validate_dataset(features, labels)?;
        self.set_training(true);
        self.set_learning_rate(learning_rate);

        let mut pipeline = BatchPipeline::new(features.len(), batch_size)?;

        let mut hidden_accs: Vec<GradientAccumulator> = self
            .hidden_layers
            .iter()
            .map(|layer| GradientAccumulator::zeros(layer.weights().len(), layer.output_len()))
            .collect();
        let mut output_acc = GradientAccumulator::zeros(
            self.output_layer.weights().len(),
            self.output_layer.output_len(),
        );

        let mut total_loss = 0.0f32;
        let mut correct = 0usize;

        for batch in pipeline.epoch_batches(rng) {
            for acc in hidden_accs.iter_mut() {
                acc.reset();
            }
            output_acc.reset();

            for &example_idx in batch {
                let input = &features[example_idx];
                let label = labels[example_idx];
                let target = one_hot(label, self.num_classes);

                let probs = forward_example(
                    &mut self.hidden_layers,
                    &mut self.output_layer,
                    input,
                )?;

                total_loss += cross_entropy(&target, &probs);
                if argmax(&probs) == label {
                    correct += 1;
                }

                let mut grad = self.output_layer.backward(&target);
                output_acc.add(
                    self.output_layer.weight_gradients(),
                    self.output_layer.bias_gradients(),
                );

                for (layer, acc) in self
                    .hidden_layers
                    .iter_mut()
                    .zip(hidden_accs.iter_mut())
                    .rev()
                {
                    grad = layer.backward(&grad);
                    acc.add(layer.weight_gradients(), layer.bias_gradients());
                }
            }

            for (layer, acc) in self.hidden_layers.iter_mut().zip(hidden_accs.iter()) {
                layer.update_parameters(&acc.weights, &acc.biases, batch.len());
            }
            self.output_layer
                .update_parameters(&output_acc.weights, &output_acc.biases, batch.len());
        }

        let num_examples = features.len() as f32;
        Ok(EpochStats {
            loss: total_loss / num_examples,
            accuracy: correct as f32 / num_examples * 100.0,
            learning_rate,
        })
    }

    /// Validate on a dataset: forward passes only, dropout disabled.
    ///
    /// The argmax of each output distribution is compared against the true
    /// label; the report carries the mean loss, the accuracy percentage, and
    /// the predicted class indices aligned to the input order (for the
    /// caller to persist).
    pub fn validate(
        &mut self,
        features: &[Vec<f32>],
        labels: &[usize],
    ) -> Result<ValidationReport, Box<dyn Error>> {
        self.validate_dataset(features, labels)?;
        self.set_training(false);

        let mut total_loss = 0.0f32;
        let mut correct = 0usize;
        let mut predictions = Vec::with_capacity(features.len());

        for (input, &label) in features.iter().zip(labels.iter()) {
            let target = one_hot(label, self.num_classes);
            let probs = forward_example(&mut self.hidden_layers, &mut self.output_layer, input)?;

            total_loss += cross_entropy(&target, &probs);
            let predicted = argmax(&probs);
            if predicted == label {
                correct += 1;
            }
            predictions.push(predicted);
        }

        let num_examples = features.len() as f32;
        Ok(ValidationReport {
            loss: total_loss / num_examples,
            accuracy: correct as f32 / num_examples * 100.0,
            predictions,
        })
    }

    /// Predict the class index for a single feature vector (inference mode).
    pub fn predict(&mut self, input: &[f32]) -> Result<usize, Box<dyn Error>> {
        if input.len() != self.input_len {
            return Err(invalid_data(&format!(
                "input length {} does not match network input length {}",
                input.len(),
                self.input_len
            )));
        }
        self.set_training(false);
        let probs = forward_example(&mut self.hidden_layers, &mut self.output_layer, input)?;
        Ok(argmax(&probs))
    }

    /// Switch every hidden layer between training and inference mode.
    pub fn set_training(&mut self, training: bool) {
        for layer in self.hidden_layers.iter_mut() {
            layer.set_training(training);
        }
    }

    /// Push a learning rate into every layer and the output stage.
    pub fn set_learning_rate(&mut self, learning_rate: f32) {
        for layer in self.hidden_layers.iter_mut() {
            layer.set_learning_rate(learning_rate);
        }
        self.output_layer.set_learning_rate(learning_rate);
    }

    /// Feature vector length the network expects.
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Number of classes the network predicts.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Total trainable parameter count across all layers.
    pub fn parameter_count(&self) -> usize {
        self.hidden_layers
            .iter()
            .map(|layer| layer.parameter_count())
            .sum::<usize>()
            + self.output_layer.parameter_count()
    }

    /// Read-only view of the hidden layer stack.
    pub fn hidden_layers(&self) -> &[HiddenLayer] {
        &self.hidden_layers
    }

    /// Read-only view of the output stage.
    pub fn output_layer(&self) -> &OutputLayer {
        &self.output_layer
    }

    /// Check the dataset boundary contract before touching any layer.
    fn validate_dataset(
        &self,
        features: &[Vec<f32>],
        labels: &[usize],
    ) -> Result<(), Box<dyn Error>> {
        if features.is_empty() {
            return Err(invalid_data("dataset must contain at least one example"));
        }
        if features.len() != labels.len() {
            return Err(invalid_data(&format!(
                "feature/label count mismatch: {} rows vs {} labels",
                features.len(),
                labels.len()
            )));
        }
        for (row_idx, row) in features.iter().enumerate() {
            if row.len() != self.input_len {
                return Err(invalid_data(&format!(
                    "row {}: feature length {} does not match network input length {}",
                    row_idx,
                    row.len(),
                    self.input_len
                )));
            }
        }
        for (row_idx, &label) in labels.iter().enumerate() {
            if label >= self.num_classes {
                return Err(invalid_data(&format!(
                    "row {}: label {} out of range for {} classes",
                    row_idx, label, self.num_classes
                )));
            }
        }
        Ok(())
    }
}

/// Forward one example through the hidden stack and the output stage.
///
/// Surfaces non-finite probabilities as an error immediately after the
/// softmax normalization instead of letting them corrupt later epochs.
fn forward_example(
    hidden_layers: &mut [HiddenLayer],
    output_layer: &mut OutputLayer,
    input: &[f32],
) -> Result<Vec<f32>, Box<dyn Error>> {
    let probs = match hidden_layers.split_first_mut() {
        Some((first, rest)) => {
            let mut current = first.forward(input);
            for layer in rest {
                current = layer.forward(&current);
            }
            output_layer.forward(&current)
        }
        None => output_layer.forward(input),
    };

    if probs.iter().any(|p| !p.is_finite()) {
        return Err(invalid_data(
            "non-finite probability after softmax normalization",
        ));
    }

    Ok(probs)
}

/// Index of the largest value; first index wins ties.
fn argmax(values: &[f32]) -> usize {
    let mut max_index = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[max_index] {
            max_index = i;
        }
    }
    max_index
}

fn invalid_data(message: &str) -> Box<dyn Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message.to_string(),
    ))
}
