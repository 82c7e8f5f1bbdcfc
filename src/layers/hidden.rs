//! Dense hidden layer implementation
//!
//! This module provides the fully connected hidden layer: a linear
//! transformation followed by an element-wise activation and, in training
//! mode, inverted dropout. The layer owns its weights, biases, and the
//! momentum velocity buffers; it exposes per-example gradients through
//! accessors and leaves applying them to the update rule.

use crate::optimizer::momentum_update;
use crate::utils::activations::Activation;
use crate::utils::rng::SimpleRng;

/// State captured by a forward pass for the paired backward call.
struct ForwardCache {
    input: Vec<f32>,
    pre_activation: Vec<f32>,
    dropout_mask: Option<Vec<f32>>,
}

/// Fully connected hidden layer with activation and inverted dropout.
///
/// Weights are stored row-major as a flat buffer of shape
/// (input_len x output_len), so `W[i][j]` lives at `i * output_len + j`.
/// Biases, velocity buffers, and gradient buffers all have their natural
/// shapes. The layer keeps the input, pre-activation vector, and dropout mask
/// of the most recent forward pass; the immediately following backward call
/// consumes that cache. Calling backward twice, or without a forward, is a
/// precondition violation and panics.
///
/// # Example
///
/// ```ignore
/// let mut rng = SimpleRng::new(42);
/// let mut layer = HiddenLayer::new(784, 256, 0.01, 0.9, 0.2, Activation::LeakyRelu, &mut rng);
/// let out = layer.forward(&input);
/// let grad_input = layer.backward(&upstream);
/// ```
pub struct HiddenLayer {
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
    dropout_rate: f32,
    activation: Activation,
    training: bool,
    rng: SimpleRng,
    cache: Option<ForwardCache>,
}

impl HiddenLayer {
    /// Create a new hidden layer with He-style initialization.
    ///
    /// Each weight is a standard normal draw scaled by `sqrt(2 / input_len)`,
    /// which keeps activation variance stable through leaky-ReLU stacks.
    /// Biases and velocities start at zero. The layer derives its own RNG
    /// stream for dropout masks from the provided generator.
    ///
    /// # Panics
    ///
    /// Panics if `input_len` or `output_len` is zero, or if `dropout_rate`
    /// is outside `[0.0, 1.0)`.
    pub fn new(
        input_len: usize,
        output_len: usize,
        learning_rate: f32,
        momentum: f32,
        dropout_rate: f32,
        activation: Activation,
        rng: &mut SimpleRng,
    ) -> Self {
        assert!(input_len > 0, "input_len must be greater than 0");
        assert!(output_len > 0, "output_len must be greater than 0");
        assert!(
            (0.0..1.0).contains(&dropout_rate),
            "dropout_rate must be in range [0.0, 1.0)"
        );

        let stddev = (2.0 / input_len as f32).sqrt();
        let mut weights = vec![0.0f32; input_len * output_len];
        for value in &mut weights {
            *value = rng.next_gaussian() * stddev;
        }

        let layer_seed = ((rng.next_u32() as u64) << 32) | rng.next_u32() as u64;

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
            dropout_rate,
            activation,
            training: true,
            rng: SimpleRng::new(layer_seed),
            cache: None,
        }
    }

    /// Forward pass: `z = W^T x + b`, activation, then inverted dropout.
    ///
    /// In training mode every output unit is kept with probability
    /// `1 - dropout_rate`; surviving units are rescaled by
    /// `1 / (1 - dropout_rate)` so the expected activation magnitude matches
    /// inference. The input, pre-activation vector, and mask are cached for
    /// the paired backward call. In inference mode no mask is drawn and the
    /// activation passes through unchanged.
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

        let mut pre_activation = vec![0.0f32; self.output_len];
        for (j, z) in pre_activation.iter_mut().enumerate() {
            let mut acc = self.biases[j];
            for (i, &x) in input.iter().enumerate() {
                acc += x * self.weights[i * self.output_len + j];
            }
            *z = acc;
        }

        let mut output: Vec<f32> = pre_activation
            .iter()
            .map(|&z| self.activation.apply(z))
            .collect();

        let dropout_mask = if self.training && self.dropout_rate > 0.0 {
            let scale = 1.0 / (1.0 - self.dropout_rate);
            let mut mask = vec![0.0f32; self.output_len];
            for (out, m) in output.iter_mut().zip(mask.iter_mut()) {
                if self.rng.next_f32() > self.dropout_rate {
                    *m = 1.0;
                    *out *= scale;
                } else {
                    *m = 0.0;
                    *out = 0.0;
                }
            }
            Some(mask)
        } else {
            None
        };

        self.cache = Some(ForwardCache {
            input: input.to_vec(),
            pre_activation,
            dropout_mask,
        });

        output
    }

    /// Backward pass: maps the gradient of the loss with respect to this
    /// layer's output into parameter gradients and the gradient with respect
    /// to its input.
    ///
    /// `gz[j] = upstream[j] * act'(z[j])`, gated by the cached dropout mask
    /// (and its rescale factor) when one was drawn, so exactly the units that
    /// fired in the forward pass carry gradient. Weight and bias gradients
    /// are stored internally and exposed via [`weight_gradients`] and
    /// [`bias_gradients`]; they are never applied here. Returns
    /// `gX[i] = sum_j W[i][j] * gz[j]` for the previous layer.
    ///
    /// [`weight_gradients`]: HiddenLayer::weight_gradients
    /// [`bias_gradients`]: HiddenLayer::bias_gradients
    ///
    /// # Panics
    ///
    /// Panics if `upstream.len() != output_len`, or if no forward call has
    /// been made since the last backward (the cache is single-use).
    pub fn backward(&mut self, upstream: &[f32]) -> Vec<f32> {
        assert_eq!(
            upstream.len(),
            self.output_len,
            "upstream gradient len mismatch: expected {}, got {}",
            self.output_len,
            upstream.len()
        );

        let cache = self
            .cache
            .take()
            .expect("backward requires the cached state of a preceding forward call");

        let mut gz = vec![0.0f32; self.output_len];
        for (j, g) in gz.iter_mut().enumerate() {
            *g = upstream[j] * self.activation.derivative(cache.pre_activation[j]);
        }
        if let Some(mask) = &cache.dropout_mask {
            let scale = 1.0 / (1.0 - self.dropout_rate);
            for (g, &m) in gz.iter_mut().zip(mask.iter()) {
                *g *= m * scale;
            }
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

    /// Switch between training (dropout active) and inference mode.
    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    /// Whether the layer currently draws dropout masks.
    pub fn is_training(&self) -> bool {
        self.training
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

    /// Get the output size of the layer.
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
