//! Activation functions for the classifier.
//!
//! This module provides the scalar activations used by the hidden layers:
//! - Leaky ReLU (the default, with a fixed slope of 0.01 on the negative side)
//! - ReLU (secondary option with a {0, 1} derivative)
//!
//! It also hosts the numerically-stable softmax and the cross-entropy loss
//! shared by the output stage. All functions here are pure over finite floats
//! and safe to call from independent threads.

/// Negative-side slope of the leaky ReLU.
pub const LEAKY_ALPHA: f32 = 0.01;

/// Epsilon guarding `log(0)` in the cross-entropy loss.
pub const LOSS_EPSILON: f32 = 1e-7;

/// Leaky ReLU activation: `x` for positive inputs, `0.01 * x` otherwise.
///
/// The leaky variant keeps a small gradient on negative pre-activations so
/// hidden units cannot get permanently stuck at zero.
pub fn leaky_relu(x: f32) -> f32 {
    if x > 0.0 {
        x
    } else {
        LEAKY_ALPHA * x
    }
}

/// Derivative of the leaky ReLU with respect to its input.
pub fn d_leaky_relu(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else {
        LEAKY_ALPHA
    }
}

/// ReLU activation: `max(0, x)`.
pub fn relu(x: f32) -> f32 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}

/// Derivative of the ReLU with respect to its input.
pub fn d_relu(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Hidden-layer activation selector.
///
/// Dispatches to the scalar functions above so layers can be configured with
/// either variant. Leaky ReLU is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Leaky ReLU with slope 0.01 (default).
    #[default]
    LeakyRelu,
    /// Plain ReLU.
    Relu,
}

impl Activation {
    /// Apply the activation to a single pre-activation value.
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::LeakyRelu => leaky_relu(x),
            Activation::Relu => relu(x),
        }
    }

    /// Derivative of the activation at a single pre-activation value.
    pub fn derivative(self, x: f32) -> f32 {
        match self {
            Activation::LeakyRelu => d_leaky_relu(x),
            Activation::Relu => d_relu(x),
        }
    }

    /// Resolve a configuration name ("leaky_relu" or "relu").
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "leaky_relu" => Some(Activation::LeakyRelu),
            "relu" => Some(Activation::Relu),
            _ => None,
        }
    }
}

/// Numerically-stable softmax over a logits vector.
///
/// Subtracts the maximum logit before exponentiating so large logits cannot
/// overflow. The max-subtraction is mandatory for correctness on real inputs,
/// not an optimization.
///
/// # Panics
///
/// Panics if `logits` is empty.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    assert!(!logits.is_empty(), "softmax over empty logits");

    let mut max_logit = logits[0];
    for &value in logits.iter().skip(1) {
        if value > max_logit {
            max_logit = value;
        }
    }

    let mut output = vec![0.0f32; logits.len()];
    let mut sum = 0.0f32;
    for (out, &z) in output.iter_mut().zip(logits.iter()) {
        *out = (z - max_logit).exp();
        sum += *out;
    }

    let inv_sum = 1.0 / sum;
    for out in output.iter_mut() {
        *out *= inv_sum;
    }

    output
}

/// Cross-entropy loss of a probability vector against a one-hot (or soft)
/// target: `-sum_j target[j] * ln(probs[j] + epsilon)`.
///
/// # Panics
///
/// Panics if the target and probability vectors have different lengths.
pub fn cross_entropy(target: &[f32], probs: &[f32]) -> f32 {
    assert_eq!(
        target.len(),
        probs.len(),
        "cross_entropy length mismatch: target {} vs probs {}",
        target.len(),
        probs.len()
    );

    let mut loss = 0.0f32;
    for (&t, &p) in target.iter().zip(probs.iter()) {
        loss -= t * (p + LOSS_EPSILON).ln();
    }
    loss
}
