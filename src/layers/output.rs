//! Output stage: dense projection, softmax, and cross-entropy
//!
//! This module provides the final layer of the classifier. It shares the
//! dense forward of the hidden layer but applies no activation and no
//! dropout; the logits go through a numerically-stable softmax, and the
//! cross-entropy gradient is fused with the softmax into the analytic form
//! `softmax - target`, so no explicit softmax Jacobian is ever built.

use crate::optimizer::momentum_update;
use crate::utils::activations::softmax;
use crate::utils::rng::SimpleRng;

/// State captured by a forward pass for the paired backward call.
struct ForwardCache {
    input: Vec<f32>,
    probabilities: Vec<f32>,
}

/// Dense output layer with fused softmax and cross-entropy gradient.
///
/// Weights are stored row-major as a flat buffer of shape
/// (input_len x output_len), matching the hidden layer. `output_len` is the
/// number of classes. The layer caches its input and the softmax output of
/// the most recent forward pass; the immediately following backward call
/// consumes that cache.
pub struct OutputLayer {
    input_len: usize,
    output_len: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
    velocity_weights: Vec<f32>,
    velocity_biases: Vec<f32>,
    grad_weights: Vec<f32>,
    grad_biases: Vec<f32>,
    learning_rate: f32,
    momentum: f32,
    cache: Option<ForwardCache>,
}

impl OutputLayer {
    /// Create a new output layer with Xavier-uniform initialization.
    ///
    /// Weights are sampled from the uniform distribution `[-limit, limit]`
    /// with `limit = sqrt(6 / (input_len + output_len))`; biases start at
    /// zero. Without a ReLU-family activation after the projection the
    /// symmetric Xavier range is the appropriate choice here.
    ///
    /// # Panics
    ///
    /// Panics if `input_len` or `output_len` is zero.
    pub fn new(
        input_len: usize,
        output_len: usize,
        learning_rate: f32,
        momentum: f32,
        rng: &mut SimpleRng,
    ) -> Self {
        assert!(input_len > 0, "input_len must be greater than 0");
        assert!(output_len > 0, "output_len must be greater than 0");

        let limit = (6.0 / (input_len + output_len) as f32).sqrt();
        let mut weights = vec![0.0f32; input_len * output_len];
        for value in &mut weights {
            *value = rng.gen_range_f32(-limit, limit);
        }

        Self {
            input_len,
            output_len,
            weights,
            biases: vec![0.0; output_len],
            velocity_weights: vec![0.0; input_len * output_len],
            velocity_biases: vec![0.0; output_len],
            grad_weights: vec![0.0; input_len * output_len],
            grad_biases: vec![0.0; output_len],
            learning_rate,
            momentum,
            cache: None,
        }
    }

    /// Forward pass: logits `z = W^T x + b` followed by stable softmax.
    ///
    /// Returns the class probability distribution and caches the input and
    /// probabilities for the paired backward call.
    ///
    /// # Panics
    ///
    /// Panics if `input.len() != input_len`.
    pub fn forward(&mut self, input: &[f32]) -> Vec<f32> {
        assert_eq!(
            input.len(),
            self.input_len,
            "input len mismatch: expected {}, got {}",
            self.input_len,
            input.len()
        );

        let mut logits = vec![0.0f32; self.output_len];
        for (j, z) in logits.iter_mut().enumerate() {
            let mut acc = self.biases[j];
            for (i, &x) in input.iter().enumerate() {
                acc += x * self.weights[i * self.output_len + j];
            }
            *z = acc;
        }

        let probabilities = softmax(&logits);

        self.cache = Some(ForwardCache {
            input: input.to_vec(),
            probabilities: probabilities.clone(),
        });

        probabilities
    }

    /// Backward pass from a one-hot (or soft) target vector.
    ///
    /// The softmax and cross-entropy gradients cancel into
    /// `gz[j] = softmax[j] - target[j]`; weight and bias gradients follow the
    /// usual dense pattern from `gz` and the cached input, stored internally
    /// for the accessors. Returns `gz @ W^T`, the gradient to propagate into
    /// the last hidden layer.
    ///
    /// # Panics
    ///
    /// Panics if `target.len() != output_len`, or if no forward call has been
    /// made since the last backward (the cache is single-use).
    pub fn backward(&mut self, target: &[f32]) -> Vec<f32> {
        assert_eq!(
            target.len(),
            self.output_len,
            "target len mismatch: expected {}, got {}",
            self.output_len,
            target.len()
        );

        let cache = self
            .cache
            .take()
            .expect("backward requires the cached state of a preceding forward call");

        let mut gz = vec![0.0f32; self.output_len];
        for (j, g) in gz.iter_mut().enumerate() {
            *g = cache.probabilities[j] - target[j];
        }

        let mut grad_input = vec![0.0f32; self.input_len];
        for (i, gx) in grad_input.iter_mut().enumerate() {
            let row = &self.weights[i * self.output_len..(i + 1) * self.output_len];
            let mut acc = 0.0f32;
            for (j, &g) in gz.iter().enumerate() {
                self.grad_weights[i * self.output_len + j] = g * cache.input[i];
                acc += row[j] * g;
            }
            *gx = acc;
        }
        self.grad_biases.copy_from_slice(&gz);

        grad_input
    }

    /// Apply one momentum update from gradients accumulated over a mini-batch.
    ///
    /// Must be invoked exactly once per mini-batch, after every example's
    /// gradients have been summed into the accumulators.
    pub fn update_parameters(&mut self, acc_weights: &[f32], acc_biases: &[f32], batch_size: usize) {
        momentum_update(
            &mut self.weights,
            &mut self.velocity_weights,
            acc_weights,
            batch_size,
            self.learning_rate,
            self.momentum,
        );
        momentum_update(
            &mut self.biases,
            &mut self.velocity_biases,
            acc_biases,
            batch_size,
            self.learning_rate,
            self.momentum,
        );
    }

    /// Weight gradients from the most recent backward call.
    pub fn weight_gradients(&self) -> &[f32] {
        &self.grad_weights
    }

    /// Bias gradients from the most recent backward call.
    pub fn bias_gradients(&self) -> &[f32] {
        &self.grad_biases
    }

    /// Push a new (scheduled) learning rate into the layer.
    pub fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    /// Learning rate currently applied by the update rule.
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Get the input size of the layer.
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Get the number of classes.
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Get the number of trainable parameters.
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Flat row-major view of the weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Mutable view of the weights, for tests and external tooling.
    pub fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    /// Bias vector.
    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Mutable view of the biases, for tests and external tooling.
    pub fn biases_mut(&mut self) -> &mut [f32] {
        &mut self.biases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_layer_creation() {
        let mut rng = SimpleRng::new(42);
        let layer = OutputLayer::new(8, 3, 0.01, 0.9, &mut rng);

        assert_eq!(layer.input_len(), 8);
        assert_eq!(layer.output_len(), 3);
        assert_eq!(layer.parameter_count(), 8 * 3 + 3);
    }

    #[test]
    fn test_xavier_initialization_range() {
        let mut rng = SimpleRng::new(42);
        let layer = OutputLayer::new(100, 50, 0.01, 0.9, &mut rng);

        let limit = (6.0f32 / 150.0).sqrt();
        for &w in layer.weights() {
            assert!(
                (-limit..=limit).contains(&w),
                "weight {} outside Xavier range [{}, {}]",
                w,
                -limit,
                limit
            );
        }
        assert!(layer.biases().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_forward_is_distribution() {
        let mut rng = SimpleRng::new(42);
        let mut layer = OutputLayer::new(4, 3, 0.01, 0.9, &mut rng);

        let probs = layer.forward(&[0.5, -0.5, 1.0, 0.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_backward_fused_gradient() {
        let mut rng = SimpleRng::new(42);
        let mut layer = OutputLayer::new(2, 2, 0.01, 0.0, &mut rng);

        let probs = layer.forward(&[1.0, -1.0]);
        let target = [1.0, 0.0];
        layer.backward(&target);

        assert!((layer.bias_gradients()[0] - (probs[0] - 1.0)).abs() < 1e-6);
        assert!((layer.bias_gradients()[1] - probs[1]).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "input len mismatch")]
    fn test_forward_dimension_mismatch_panics() {
        let mut rng = SimpleRng::new(42);
        let mut layer = OutputLayer::new(4, 2, 0.01, 0.9, &mut rng);
        layer.forward(&[1.0]);
    }

    #[test]
    #[should_panic(expected = "cached state of a preceding forward call")]
    fn test_backward_without_forward_panics() {
        let mut rng = SimpleRng::new(42);
        let mut layer = OutputLayer::new(2, 2, 0.01, 0.9, &mut rng);
        layer.backward(&[1.0, 0.0]);
    }
}
