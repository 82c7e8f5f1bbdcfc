//! Data collaborator: CSV loading, normalization, and prediction output
//!
//! The training core consumes plain rectangular arrays of f32 features and
//! integer labels; everything that touches the filesystem lives here. Feature
//! CSVs hold one example per row with raw pixel values in [0, 255], scaled to
//! [0, 1] on load and then standardized by a single global mean and standard
//! deviation computed once from the training set and reapplied to every other
//! split. No state survives between runs; the fitted statistics travel in an
//! explicit [`Normalization`] value.

use std::error::Error;
use std::path::Path;

use crate::utils::rng::SimpleRng;

/// Global standardization statistics fitted on the training set.
///
/// Values already scaled to [0, 1] are shifted by one global mean and
/// divided by one global standard deviation, shared by all features.
/// Validation and test data reuse the training statistics.
#[derive(Debug, Clone, Copy)]
pub struct Normalization {
    pub mean: f32,
    pub std: f32,
}

impl Normalization {
    /// Fit the global mean and standard deviation over every value of the
    /// training features.
    ///
    /// # Panics
    ///
    /// Panics if `features` contains no values.
    pub fn fit(features: &[Vec<f32>]) -> Self {
        let count: usize = features.iter().map(|row| row.len()).sum();
        assert!(count > 0, "cannot fit normalization on empty data");

        let mut sum = 0.0f64;
        for row in features {
            for &value in row {
                sum += value as f64;
            }
        }
        let mean = (sum / count as f64) as f32;

        let mut sum_sq = 0.0f64;
        for row in features {
            for &value in row {
                let diff = value - mean;
                sum_sq += (diff * diff) as f64;
            }
        }
        let mut std = ((sum_sq / count as f64) as f32).sqrt();
        if std == 0.0 {
            // Constant data would otherwise divide by zero.
            std = 1.0;
        }

        Self { mean, std }
    }

    /// Standardize features in place using the fitted statistics.
    pub fn apply(&self, features: &mut [Vec<f32>]) {
        for row in features {
            for value in row.iter_mut() {
                *value = (*value - self.mean) / self.std;
            }
        }
    }
}

/// Load a feature matrix from a headerless CSV of raw pixel rows.
///
/// Every value is scaled by 1/255 into [0, 1]. Each row must have exactly
/// `num_features` columns; a ragged row is an error, never truncated or
/// padded.
pub fn load_features<P: AsRef<Path>>(
    path: P,
    num_features: usize,
) -> Result<Vec<Vec<f32>>, Box<dyn Error>> {
    // Flexible parsing so ragged rows reach the explicit shape check below
    // instead of surfacing as a generic CSV error.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path.as_ref())?;

    let mut features = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != num_features {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "row {}: expected {} features, got {}",
                    row_idx,
                    num_features,
                    record.len()
                ),
            )));
        }

        let mut row = Vec::with_capacity(num_features);
        for field in record.iter() {
            let value: f32 = field.trim().parse().map_err(|_| {
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("row {}: invalid feature value '{}'", row_idx, field),
                )) as Box<dyn Error>
            })?;
            row.push(value / 255.0);
        }
        features.push(row);
    }

    if features.is_empty() {
        return Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "no feature rows loaded",
        )));
    }

    Ok(features)
}

/// Load class labels from a CSV with one integer index per line.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<usize>, Box<dyn Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path.as_ref())?;

    let mut labels = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        let field = record.get(0).unwrap_or("");
        let label: usize = field.trim().parse().map_err(|_| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("row {}: invalid label '{}'", row_idx, field),
            )) as Box<dyn Error>
        })?;
        labels.push(label);
    }

    if labels.is_empty() {
        return Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "no labels loaded",
        )));
    }

    Ok(labels)
}

/// One-hot target vector: 1.0 at the label index, 0.0 elsewhere.
///
/// # Panics
///
/// Panics if `label >= num_classes`.
pub fn one_hot(label: usize, num_classes: usize) -> Vec<f32> {
    assert!(
        label < num_classes,
        "label {} out of range for {} classes",
        label,
        num_classes
    );
    let mut target = vec![0.0f32; num_classes];
    target[label] = 1.0;
    target
}

/// A shuffled train/validation split of a dataset.
pub struct DataSplit {
    pub train_features: Vec<Vec<f32>>,
    pub train_labels: Vec<usize>,
    pub val_features: Vec<Vec<f32>>,
    pub val_labels: Vec<usize>,
}

/// Split features and labels into shuffled train and validation partitions.
///
/// `split_ratio` is the fraction of examples assigned to the training
/// partition; the shuffle draws from the injected generator so splits are
/// reproducible.
pub fn split_data(
    features: &[Vec<f32>],
    labels: &[usize],
    split_ratio: f32,
    rng: &mut SimpleRng,
) -> Result<DataSplit, Box<dyn Error>> {
    if features.len() != labels.len() {
        return Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "feature/label count mismatch: {} rows vs {} labels",
                features.len(),
                labels.len()
            ),
        )));
    }
    if !(0.0..=1.0).contains(&split_ratio) {
        return Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "split_ratio must be in range [0.0, 1.0]",
        )));
    }

    let total = features.len();
    let train_size = (total as f32 * split_ratio) as usize;

    let mut indices: Vec<usize> = (0..total).collect();
    rng.shuffle_usize(&mut indices);

    let mut split = DataSplit {
        train_features: Vec::with_capacity(train_size),
        train_labels: Vec::with_capacity(train_size),
        val_features: Vec::with_capacity(total - train_size),
        val_labels: Vec::with_capacity(total - train_size),
    };

    for (position, &idx) in indices.iter().enumerate() {
        if position < train_size {
            split.train_features.push(features[idx].clone());
            split.train_labels.push(labels[idx]);
        } else {
            split.val_features.push(features[idx].clone());
            split.val_labels.push(labels[idx]);
        }
    }

    Ok(split)
}

/// Write predicted class indices to a CSV file, one per line, aligned to the
/// input order of the validation run that produced them.
pub fn save_predictions<P: AsRef<Path>>(
    path: P,
    predictions: &[usize],
) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;

    for &label in predictions {
        writer.write_record([label.to_string()])?;
    }
    writer.flush()?;

    Ok(())
}
