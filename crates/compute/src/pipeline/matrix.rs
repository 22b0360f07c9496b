use callwatch_core::{CallwatchError, Result};

/// Dense row-major feature matrix with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Build a matrix, rejecting ragged rows and non-finite values.
    ///
    /// Zero rows is allowed here; the scorer decides whether it can work with it.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(CallwatchError::Feature(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(CallwatchError::Feature(format!(
                    "row {} column {:?} is not finite ({})",
                    i, columns[j], row[j]
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn from_static(columns: &[&str], rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the values of column `j`.
    pub fn column(&self, j: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |r| r[j])
    }

    /// Same column names, new rows. Callers guarantee the row width.
    pub(crate) fn with_rows(&self, rows: Vec<Vec<f64>>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let err = FeatureMatrix::from_static(&["a", "b"], vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(err, Err(CallwatchError::Feature(_))));
    }

    #[test]
    fn rejects_nan() {
        let err = FeatureMatrix::from_static(&["a"], vec![vec![f64::NAN]]);
        assert!(matches!(err, Err(CallwatchError::Feature(_))));
    }

    #[test]
    fn column_access() {
        let m = FeatureMatrix::from_static(&["a", "b"], vec![vec![1.0, 2.0], vec![3.0, 4.0]])
            .unwrap();
        assert_eq!(m.column(1).collect::<Vec<_>>(), vec![2.0, 4.0]);
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 2);
    }
}
