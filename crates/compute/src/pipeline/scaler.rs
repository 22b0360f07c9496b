//! Per-column standardization.
//!
//! Fits mean and population standard deviation on a matrix and rescales it to
//! zero mean / unit variance. Columns without spread map to constant 0.

use callwatch_core::{CallwatchError, Result};

use super::matrix::FeatureMatrix;

/// Compute population-level mean and stddev per column (ddof = 0).
///
/// A column whose values are all equal gets a stddev of exactly 0, even when
/// floating-point summation would leave a tiny residue.
pub fn compute_population_stats(matrix: &FeatureMatrix) -> (Vec<f64>, Vec<f64>) {
    if matrix.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let n = matrix.n_rows() as f64;
    let mut means = Vec::with_capacity(matrix.n_cols());
    let mut stddevs = Vec::with_capacity(matrix.n_cols());

    for j in 0..matrix.n_cols() {
        let mean = matrix.column(j).sum::<f64>() / n;

        let (min, max) = matrix
            .column(j)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        let std = if min == max {
            0.0
        } else {
            let variance = matrix.column(j).map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            variance.sqrt()
        };

        means.push(mean);
        stddevs.push(std);
    }

    (means, stddevs)
}

/// Fitted z-score transform for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    stddevs: Vec<f64>,
}

impl StandardScaler {
    /// Fit on `matrix`. An empty matrix has no statistics and is a FeatureError.
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self> {
        if matrix.is_empty() {
            return Err(CallwatchError::Feature(
                "cannot fit a scaler on zero rows".into(),
            ));
        }
        let (means, stddevs) = compute_population_stats(matrix);
        Ok(Self { means, stddevs })
    }

    pub fn fit_transform(matrix: &FeatureMatrix) -> Result<(Self, FeatureMatrix)> {
        let scaler = Self::fit(matrix)?;
        let scaled = scaler.transform(matrix)?;
        Ok((scaler, scaled))
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stddevs(&self) -> &[f64] {
        &self.stddevs
    }

    fn check_width(&self, matrix: &FeatureMatrix) -> Result<()> {
        if matrix.n_cols() != self.means.len() {
            return Err(CallwatchError::Feature(format!(
                "scaler fitted on {} columns, got {}",
                self.means.len(),
                matrix.n_cols()
            )));
        }
        Ok(())
    }

    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        self.check_width(matrix)?;
        let rows = matrix
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.stddevs))
                    .map(|(&x, (&mean, &std))| if std > 0.0 { (x - mean) / std } else { 0.0 })
                    .collect()
            })
            .collect();
        Ok(matrix.with_rows(rows))
    }

    /// Map standardized values back. Zero-spread columns come back as their mean.
    pub fn inverse_transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        self.check_width(matrix)?;
        let rows = matrix
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.stddevs))
                    .map(|(&z, (&mean, &std))| z * std + mean)
                    .collect()
            })
            .collect();
        Ok(matrix.with_rows(rows))
    }
}
