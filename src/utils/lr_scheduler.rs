//! Learning rate scheduler trait and implementations
//!
//! This module defines the LRScheduler trait for adjusting learning rates during
//! training. The orchestrator reads the scheduled rate at every epoch boundary
//! and pushes it into each layer before processing any batch of that epoch.

/// Core trait for learning rate schedulers.
///
/// Schedulers adjust the learning rate during training based on the current
/// epoch. `get_lr` returns the rate for the epoch currently being processed;
/// `step` advances to the next epoch.
///
/// # Example
///
/// ```ignore
/// let mut scheduler = ExponentialDecay::new(0.1, 0.1);
///
/// for epoch in 0..num_epochs {
///     let lr = scheduler.get_lr();
///     // ... train the epoch with lr ...
///     scheduler.step();
/// }
/// ```
pub trait LRScheduler {
    /// Get the learning rate for the current epoch.
    fn get_lr(&self) -> f32;

    /// Advance the scheduler to the next epoch.
    fn step(&mut self);

    /// Reset the scheduler to its initial state (epoch 0).
    fn reset(&mut self);
}

/// Constant learning rate.
///
/// The trivial schedule for decay-free runs; `step` has no effect.
pub struct Constant {
    lr: f32,
}

impl Constant {
    /// Creates a constant scheduler with the given rate.
    pub fn new(lr: f32) -> Self {
        Self { lr }
    }
}

impl LRScheduler for Constant {
    fn get_lr(&self) -> f32 {
        self.lr
    }

    fn step(&mut self) {}

    fn reset(&mut self) {}
}

/// Continuous exponential decay.
///
/// Formula: `lr_k = initial_lr * exp(-decay_rate * k)` for epoch k, so epoch 0
/// always uses the initial rate unchanged. With `decay_rate = 0` this is the
/// constant schedule.
///
/// # Example
///
/// ```ignore
/// let mut scheduler = ExponentialDecay::new(0.1, 0.1);
/// assert_eq!(scheduler.get_lr(), 0.1);
///
/// for _ in 0..5 {
///     scheduler.step();
/// }
/// // Epoch 5 uses 0.1 * exp(-0.5)
/// ```
pub struct ExponentialDecay {
    initial_lr: f32,
    decay_rate: f32,
    current_epoch: usize,
    current_lr: f32,
}

impl ExponentialDecay {
    /// Creates an exponential decay scheduler.
    ///
    /// # Arguments
    ///
    /// * `initial_lr` - Starting learning rate (must be positive)
    /// * `decay_rate` - Decay constant applied per epoch (must be non-negative)
    pub fn new(initial_lr: f32, decay_rate: f32) -> Self {
        Self {
            initial_lr,
            decay_rate,
            current_epoch: 0,
            current_lr: initial_lr,
        }
    }
}

impl LRScheduler for ExponentialDecay {
    fn get_lr(&self) -> f32 {
        self.current_lr
    }

    fn step(&mut self) {
        self.current_epoch += 1;
        self.current_lr = self.initial_lr * (-self.decay_rate * self.current_epoch as f32).exp();
    }

    fn reset(&mut self) {
        self.current_epoch = 0;
        self.current_lr = self.initial_lr;
    }
}

/// Step decay learning rate scheduler.
///
/// Reduces the learning rate by a multiplicative factor (gamma) every
/// `step_size` epochs, letting the model make large updates early and
/// fine-tune with smaller updates later.
///
/// Formula: `lr = initial_lr * gamma^(epoch / step_size)`
pub struct StepDecay {
    initial_lr: f32,
    step_size: usize,
    gamma: f32,
    current_epoch: usize,
    current_lr: f32,
}

impl StepDecay {
    /// Creates a new step decay scheduler.
    ///
    /// # Arguments
    ///
    /// * `initial_lr` - Starting learning rate (must be positive)
    /// * `step_size` - Number of epochs between decay steps (must be > 0)
    /// * `gamma` - Decay factor applied at each step (typically 0.1-0.5)
    pub fn new(initial_lr: f32, step_size: usize, gamma: f32) -> Self {
        Self {
            initial_lr,
            step_size,
            gamma,
            current_epoch: 0,
            current_lr: initial_lr,
        }
    }
}

impl LRScheduler for StepDecay {
    fn get_lr(&self) -> f32 {
        self.current_lr
    }

    fn step(&mut self) {
        self.current_epoch += 1;
        let num_decays = self.current_epoch / self.step_size;
        self.current_lr = self.initial_lr * self.gamma.powi(num_decays as i32);
    }

    fn reset(&mut self) {
        self.current_epoch = 0;
        self.current_lr = self.initial_lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_never_changes() {
        let mut scheduler = Constant::new(0.05);
        for _ in 0..10 {
            scheduler.step();
        }
        assert_eq!(scheduler.get_lr(), 0.05);
    }

    #[test]
    fn test_exponential_decay_epoch_zero() {
        let scheduler = ExponentialDecay::new(0.1, 0.1);
        assert_eq!(scheduler.get_lr(), 0.1);
    }

    #[test]
    fn test_exponential_decay_epoch_five() {
        let mut scheduler = ExponentialDecay::new(0.1, 0.1);
        for _ in 0..5 {
            scheduler.step();
        }
        let expected = 0.1 * (-0.5f32).exp();
        assert!((scheduler.get_lr() - expected).abs() < 1e-7);
    }

    #[test]
    fn test_exponential_decay_reset() {
        let mut scheduler = ExponentialDecay::new(0.1, 0.2);
        for _ in 0..3 {
            scheduler.step();
        }
        scheduler.reset();
        assert_eq!(scheduler.get_lr(), 0.1);
    }

    #[test]
    fn test_step_decay_boundaries() {
        let mut scheduler = StepDecay::new(0.1, 3, 0.5);

        // Before the first boundary the rate is unchanged.
        for _ in 0..2 {
            scheduler.step();
            assert_eq!(scheduler.get_lr(), 0.1);
        }

        // At epoch 3 the first decay applies.
        scheduler.step();
        assert!((scheduler.get_lr() - 0.05).abs() < 1e-7);
    }
}
