//! Momentum-based gradient descent update rule
//!
//! This module provides the single parameter update rule shared by the hidden
//! layers and the output stage. Gradients are accumulated over a mini-batch by
//! the training orchestrator; the rule folds the batch-averaged gradient into
//! a velocity buffer and applies the velocity to the parameters:
//!
//! `v = momentum * v - (learning_rate / batch_size) * accumulated_gradient`
//! `param = param + v`
//!
//! With `momentum = 0` this reduces exactly to plain mini-batch gradient
//! descent: `param -= (learning_rate / batch_size) * accumulated_gradient`.

/// Apply one momentum update step to a parameter buffer.
///
/// # Arguments
///
/// * `params` - Parameters to update in place (a layer's weights or biases)
/// * `velocity` - Velocity buffer of the same shape, persisted across batches
/// * `accumulated` - Gradients summed over every example of the mini-batch
/// * `batch_size` - Number of examples that contributed to `accumulated`
/// * `learning_rate` - Current (possibly decayed) learning rate
/// * `momentum` - Momentum coefficient in [0, 1)
///
/// # Panics
///
/// Panics if the three buffers have mismatched lengths or `batch_size` is 0.
pub fn momentum_update(
    params: &mut [f32],
    velocity: &mut [f32],
    accumulated: &[f32],
    batch_size: usize,
    learning_rate: f32,
    momentum: f32,
) {
    assert_eq!(
        params.len(),
        accumulated.len(),
        "parameters and gradients must have the same length"
    );
    assert_eq!(
        params.len(),
        velocity.len(),
        "parameters and velocity must have the same length"
    );
    assert!(batch_size > 0, "batch_size must be greater than 0");

    let scale = learning_rate / batch_size as f32;
    for ((param, v), &grad) in params.iter_mut().zip(velocity.iter_mut()).zip(accumulated) {
        *v = momentum * *v - scale * grad;
        *param += *v;
    }
}
