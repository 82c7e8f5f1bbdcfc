//! Layer implementations for the classifier
//!
//! This module provides the dense hidden layer (activation + dropout) and the
//! output stage (dense + softmax + cross-entropy).

pub mod hidden;
pub mod output;

pub use hidden::HiddenLayer;
pub use output::OutputLayer;
