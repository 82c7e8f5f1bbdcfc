//! Mini-batch pipeline
//!
//! This module partitions a training set into mini-batches of example
//! indices. Each epoch draws one uniform random permutation (Fisher-Yates)
//! of all indices and splits it into `ceil(N / B)` contiguous batches, so
//! every example is visited exactly once per epoch and the last batch may be
//! smaller than the rest. The permutation is regenerated at every epoch.

use std::error::Error;
use std::slice::Chunks;

use crate::utils::rng::SimpleRng;

/// Index-level mini-batch producer.
///
/// The pipeline owns the index permutation buffer and hands out batches as
/// slices into it; callers map the indices back to their feature rows and
/// labels. Batch membership lives only for the optimizer step consuming it.
///
/// # Example
///
/// ```ignore
/// let mut pipeline = BatchPipeline::new(10, 3)?;
/// let mut rng = SimpleRng::new(42);
/// for batch in pipeline.epoch_batches(&mut rng) {
///     // batch is a &[usize] of 3 (or 1, for the final batch) indices
/// }
/// ```
#[derive(Debug)]
pub struct BatchPipeline {
    indices: Vec<usize>,
    batch_size: usize,
}

impl BatchPipeline {
    /// Create a pipeline over `num_examples` examples with the given batch
    /// size.
    ///
    /// # Errors
    ///
    /// Zero examples or a zero batch size is a configuration error, not a
    /// case to skip silently.
    pub fn new(num_examples: usize, batch_size: usize) -> Result<Self, Box<dyn Error>> {
        if num_examples == 0 {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "mini-batch pipeline requires at least one example",
            )));
        }
        if batch_size == 0 {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "batch_size must be greater than 0",
            )));
        }

        Ok(Self {
            indices: (0..num_examples).collect(),
            batch_size,
        })
    }

    /// Number of batches produced per epoch: `ceil(N / B)`.
    pub fn num_batches(&self) -> usize {
        self.indices.len().div_ceil(self.batch_size)
    }

    /// Number of examples covered per epoch.
    pub fn num_examples(&self) -> usize {
        self.indices.len()
    }

    /// Reshuffle the permutation and iterate one epoch worth of batches.
    ///
    /// Batches are consumed in permuted order; calling this again starts a
    /// fresh epoch with a fresh permutation.
    pub fn epoch_batches(&mut self, rng: &mut SimpleRng) -> Chunks<'_, usize> {
        rng.shuffle_usize(&mut self.indices);
        self.indices.chunks(self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_sizes_ten_by_three() {
        let mut pipeline = BatchPipeline::new(10, 3).unwrap();
        let mut rng = SimpleRng::new(42);

        let sizes: Vec<usize> = pipeline.epoch_batches(&mut rng).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(pipeline.num_batches(), 4);
    }

    #[test]
    fn test_every_index_exactly_once() {
        let mut pipeline = BatchPipeline::new(10, 3).unwrap();
        let mut rng = SimpleRng::new(42);

        let mut seen: Vec<usize> = pipeline.epoch_batches(&mut rng).flatten().copied().collect();
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<usize>>());
    }

    #[test]
    fn test_exact_division_has_no_short_batch() {
        let mut pipeline = BatchPipeline::new(9, 3).unwrap();
        let mut rng = SimpleRng::new(42);

        let sizes: Vec<usize> = pipeline.epoch_batches(&mut rng).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3, 3, 3]);
    }

    #[test]
    fn test_permutation_changes_between_epochs() {
        let mut pipeline = BatchPipeline::new(32, 8).unwrap();
        let mut rng = SimpleRng::new(42);

        let first: Vec<usize> = pipeline.epoch_batches(&mut rng).flatten().copied().collect();
        let second: Vec<usize> = pipeline.epoch_batches(&mut rng).flatten().copied().collect();

        assert_ne!(first, second);

        let mut sorted = second.clone();
        sorted.sort();
        assert_eq!(sorted, (0..32).collect::<Vec<usize>>());
    }

    #[test]
    fn test_zero_examples_is_error() {
        assert!(BatchPipeline::new(0, 4).is_err());
    }

    #[test]
    fn test_zero_batch_size_is_error() {
        assert!(BatchPipeline::new(10, 0).is_err());
    }

    #[test]
    fn test_batch_larger_than_dataset() {
        let mut pipeline = BatchPipeline::new(3, 8).unwrap();
        let mut rng = SimpleRng::new(42);

        let sizes: Vec<usize> = pipeline.epoch_batches(&mut rng).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3]);
    }
}
