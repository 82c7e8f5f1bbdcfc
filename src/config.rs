//! Configuration structures for training
//!
//! This module provides the training configuration parsed from JSON files,
//! covering the optimizer hyperparameters, the mini-batch schedule, the
//! learning rate scheduler, and the hidden-layer activation choice.
//!
//! Scheduler types require different optional fields:
//!
//! - **constant**: no extra fields
//! - **exponential**: requires `decay_rate` (lr = lr0 * exp(-decay_rate * epoch))
//! - **step**: requires `step_size` and `gamma`
//!
//! # Example
//!
//! ```json
//! {
//!   "learning_rate": 0.008,
//!   "momentum": 0.9,
//!   "dropout_rate": 0.1,
//!   "batch_size": 32,
//!   "epochs": 10,
//!   "scheduler_type": "exponential",
//!   "decay_rate": 0.02,
//!   "activation": "leaky_relu"
//! }
//! ```

use serde::Deserialize;
use std::error::Error;
use std::fs;

use crate::utils::activations::Activation;
use crate::utils::lr_scheduler::{Constant, ExponentialDecay, LRScheduler, StepDecay};

/// Training configuration, deserialized from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Initial learning rate pushed into every layer
    pub learning_rate: f32,

    /// Momentum coefficient in [0.0, 1.0)
    pub momentum: f32,

    /// Hidden-layer dropout probability in [0.0, 1.0)
    pub dropout_rate: f32,

    /// Mini-batch size
    pub batch_size: usize,

    /// Number of training epochs
    pub epochs: usize,

    /// Type of learning rate scheduler: "constant", "exponential", or "step"
    pub scheduler_type: String,

    /// Decay constant for the exponential scheduler (per-epoch exponent)
    pub decay_rate: Option<f32>,

    /// Epochs between reductions for the step scheduler
    pub step_size: Option<usize>,

    /// Multiplicative factor for the step scheduler
    pub gamma: Option<f32>,

    /// Hidden-layer activation: "leaky_relu" (default) or "relu"
    pub activation: Option<String>,
}

impl Default for TrainingConfig {
    /// Defaults matching the fashion-MNIST reference run: lr 0.008 with
    /// exponential decay 0.02, momentum 0.9, dropout 0.1, batches of 32
    /// for 10 epochs, leaky ReLU hidden activations.
    fn default() -> Self {
        Self {
            learning_rate: 0.008,
            momentum: 0.9,
            dropout_rate: 0.1,
            batch_size: 32,
            epochs: 10,
            scheduler_type: "exponential".to_string(),
            decay_rate: Some(0.02),
            step_size: None,
            gamma: None,
            activation: Some("leaky_relu".to_string()),
        }
    }
}

impl TrainingConfig {
    /// Build the configured learning rate scheduler.
    pub fn build_scheduler(&self) -> Result<Box<dyn LRScheduler>, Box<dyn Error>> {
        match self.scheduler_type.as_str() {
            "constant" => Ok(Box::new(Constant::new(self.learning_rate))),
            "exponential" => {
                let decay_rate = self.decay_rate.ok_or_else(|| {
                    invalid_config("exponential scheduler requires 'decay_rate'")
                })?;
                Ok(Box::new(ExponentialDecay::new(self.learning_rate, decay_rate)))
            }
            "step" => {
                let step_size = self
                    .step_size
                    .ok_or_else(|| invalid_config("step scheduler requires 'step_size'"))?;
                let gamma = self
                    .gamma
                    .ok_or_else(|| invalid_config("step scheduler requires 'gamma'"))?;
                Ok(Box::new(StepDecay::new(self.learning_rate, step_size, gamma)))
            }
            other => Err(invalid_config(&format!(
                "Invalid scheduler_type '{}'. Must be one of: constant, exponential, step",
                other
            ))),
        }
    }

    /// Resolve the configured hidden-layer activation (leaky ReLU when the
    /// field is absent).
    pub fn hidden_activation(&self) -> Result<Activation, Box<dyn Error>> {
        match &self.activation {
            None => Ok(Activation::LeakyRelu),
            Some(name) => Activation::from_name(name).ok_or_else(|| {
                invalid_config(&format!(
                    "Invalid activation '{}'. Must be one of: leaky_relu, relu",
                    name
                ))
            }),
        }
    }
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path`, deserializes its JSON contents, and validates
/// the result.
///
/// # Returns
///
/// `Ok(TrainingConfig)` on success, or an error if the file cannot be read,
/// the JSON is invalid, or a field is out of range.
pub fn load_config(path: &str) -> Result<TrainingConfig, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate field ranges and scheduler/activation requirements.
pub fn validate_config(config: &TrainingConfig) -> Result<(), Box<dyn Error>> {
    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        return Err(invalid_config("learning_rate must be finite and positive"));
    }

    if !(config.momentum.is_finite() && (0.0..1.0).contains(&config.momentum)) {
        return Err(invalid_config("momentum must be in range [0.0, 1.0)"));
    }

    if !(config.dropout_rate.is_finite() && (0.0..1.0).contains(&config.dropout_rate)) {
        return Err(invalid_config("dropout_rate must be in range [0.0, 1.0)"));
    }

    if config.batch_size == 0 {
        return Err(invalid_config("batch_size must be greater than 0"));
    }

    if config.epochs == 0 {
        return Err(invalid_config("epochs must be greater than 0"));
    }

    if let Some(decay_rate) = config.decay_rate {
        if decay_rate < 0.0 {
            return Err(invalid_config("decay_rate must be non-negative"));
        }
    }

    if let Some(step_size) = config.step_size {
        if step_size == 0 {
            return Err(invalid_config("step_size must be greater than 0"));
        }
    }

    if let Some(gamma) = config.gamma {
        if gamma < 0.0 {
            return Err(invalid_config("gamma must be non-negative"));
        }
    }

    // Scheduler and activation names are checked together with their
    // required fields.
    config.build_scheduler()?;
    config.hidden_activation()?;

    Ok(())
}

fn invalid_config(message: &str) -> Box<dyn Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message.to_string(),
    ))
}
