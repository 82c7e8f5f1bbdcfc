//! Shared utilities for the classifier
//!
//! This module provides the seeded random number generator, the scalar
//! activation functions with the softmax/cross-entropy pair, and the
//! learning rate schedulers.

pub mod activations;
pub mod lr_scheduler;
pub mod rng;

pub use activations::{cross_entropy, softmax, Activation};
pub use lr_scheduler::LRScheduler;
pub use rng::SimpleRng;
