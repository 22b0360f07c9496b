use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use callwatch_core::{CallwatchError, DetectionConfig, Result, MAX_TREE_DEPTH};

use crate::pipeline::matrix::FeatureMatrix;

/// Euler–Mascheroni constant, used to approximate harmonic numbers.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Parameters of an isolation forest fit.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForestParams {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Upper bound on rows drawn (without replacement) per tree.
    pub max_samples: usize,
    /// Depth limit; `None` means `ceil(log2(subsample size))`.
    pub max_depth: Option<usize>,
    /// Expected fraction of anomalies, used to place the flag threshold.
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForestParams {
    fn default() -> Self {
        Self::from(&DetectionConfig::default())
    }
}

impl From<&DetectionConfig> for IsolationForestParams {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            max_samples: config.max_samples,
            max_depth: config.max_depth,
            contamination: config.contamination,
            seed: config.seed,
        }
    }
}

/// Per-row output of [`fit_score`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForestScores {
    /// `2^(-E[h(x)] / c(ψ))`; lower mean depth gives a higher value.
    pub raw_scores: Vec<f64>,
    /// `raw - threshold`: positive on the flagged side, same ordering as `raw_scores`.
    pub scores: Vec<f64>,
    pub flags: Vec<bool>,
    /// Raw score at the `(1 - contamination)` quantile of this batch.
    pub threshold: f64,
}

impl ForestScores {
    pub fn flagged_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }
}

/// Fit a forest on `data` and score the same rows.
///
/// There is no separate inference step: each run fits on its own batch.
/// Rows with a raw score at or above the contamination quantile are flagged.
/// Rows tied at the threshold are all flagged, so repeated scores can push the
/// flagged count past `contamination * n`.
/// When every row scores the same there is nothing to single out, and no row
/// is flagged.
///
/// # Errors
/// `Feature` for an empty or zero-width matrix, `Config` for invalid params.
pub fn fit_score(data: &FeatureMatrix, params: &IsolationForestParams) -> Result<ForestScores> {
    if !(params.contamination > 0.0 && params.contamination < 1.0) {
        return Err(CallwatchError::Config(format!(
            "contamination must be in (0, 1), got {}",
            params.contamination
        )));
    }

    let forest = IsolationForest::fit(data, params)?;
    let raw_scores = forest.score_samples(data)?;

    let threshold = contamination_threshold(&raw_scores, params.contamination)
        .ok_or_else(|| CallwatchError::Feature("no rows to threshold".into()))?;

    let spread = raw_scores
        .iter()
        .any(|&s| s != raw_scores[0]);

    let flags: Vec<bool> = raw_scores
        .iter()
        .map(|&s| spread && s >= threshold)
        .collect();
    let scores = raw_scores.iter().map(|&s| s - threshold).collect();

    let result = ForestScores {
        raw_scores,
        scores,
        flags,
        threshold,
    };

    debug!(
        rows = data.n_rows(),
        trees = forest.n_trees(),
        subsample = forest.subsample_size(),
        max_depth = forest.max_depth(),
        threshold,
        flagged = result.flagged_count(),
        "isolation forest scored"
    );

    Ok(result)
}

/// Ensemble of isolation trees fitted on one feature matrix.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    n_features: usize,
    subsample_size: usize,
    max_depth: usize,
}

impl IsolationForest {
    /// Build `params.n_trees` trees, each over its own random subsample.
    ///
    /// A master generator seeded with `params.seed` hands out one seed per
    /// tree, so trees are built in parallel yet the forest is identical
    /// across runs on the same input.
    ///
    /// # Arguments
    /// * `data`: feature matrix; must have at least one row and one column
    /// * `params`: ensemble size, subsample bound, depth limit and seed
    pub fn fit(data: &FeatureMatrix, params: &IsolationForestParams) -> Result<Self> {
        if data.is_empty() {
            return Err(CallwatchError::Feature(
                "cannot fit isolation forest on zero rows".into(),
            ));
        }
        if data.n_cols() == 0 {
            return Err(CallwatchError::Feature(
                "cannot fit isolation forest on zero feature columns".into(),
            ));
        }
        if params.n_trees == 0 {
            return Err(CallwatchError::Config("n_trees must be at least 1".into()));
        }
        if params.max_samples == 0 {
            return Err(CallwatchError::Config("max_samples must be at least 1".into()));
        }
        if let Some(depth) = params.max_depth {
            if depth == 0 || depth > MAX_TREE_DEPTH {
                return Err(CallwatchError::Config(format!(
                    "max_depth must be within 1-{MAX_TREE_DEPTH}, got {depth}"
                )));
            }
        }

        let n = data.n_rows();
        let subsample_size = params.max_samples.min(n);
        let max_depth = params
            .max_depth
            .unwrap_or_else(|| default_max_depth(subsample_size));

        let mut master = StdRng::seed_from_u64(params.seed);
        let tree_seeds: Vec<u64> = (0..params.n_trees).map(|_| master.gen()).collect();

        let rows = data.rows();
        let trees = tree_seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let sample = index::sample(&mut rng, n, subsample_size).into_vec();
                IsolationTree::build(rows, &sample, max_depth, &mut rng)
            })
            .collect();

        Ok(Self {
            trees,
            n_features: data.n_cols(),
            subsample_size,
            max_depth,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn subsample_size(&self) -> usize {
        self.subsample_size
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Mean isolation depth of `row` across all trees.
    pub fn mean_path_length(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(row)).sum();
        total / self.trees.len() as f64
    }

    /// Raw anomaly score per row, `2^(-E[h(x)] / c(ψ))`.
    ///
    /// With a subsample of one row there is no expected depth to compare
    /// against; every row then scores 0.5.
    pub fn score_samples(&self, data: &FeatureMatrix) -> Result<Vec<f64>> {
        if data.n_cols() != self.n_features {
            return Err(CallwatchError::Feature(format!(
                "forest fitted on {} columns, got {}",
                self.n_features,
                data.n_cols()
            )));
        }

        let norm = average_path_length(self.subsample_size);
        Ok(data
            .rows()
            .par_iter()
            .map(|row| {
                if norm > 0.0 {
                    2f64.powf(-self.mean_path_length(row) / norm)
                } else {
                    0.5
                }
            })
            .collect())
    }
}

/// Raw score at the `(1 - contamination)` quantile, linearly interpolated
/// between order statistics. `None` for an empty slice.
pub fn contamination_threshold(scores: &[f64], contamination: f64) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = (1.0 - contamination) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Expected path length of an unsuccessful BST search over `n` points, c(n).
///
/// c(n) = 2·H(n−1) − 2(n−1)/n with H(i) ≈ ln(i) + γ; c(1) = 0, c(2) = 1.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────

fn default_max_depth(subsample_size: usize) -> usize {
    if subsample_size <= 1 {
        0
    } else {
        (subsample_size as f64).log2().ceil() as usize
    }
}

#[derive(Debug, Clone)]
enum IsolationNode {
    Internal {
        feature: usize,
        /// Rows with `x[feature] <= split` go left.
        split: f64,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: IsolationNode,
}

impl IsolationTree {
    fn build(rows: &[Vec<f64>], sample: &[usize], max_depth: usize, rng: &mut StdRng) -> Self {
        Self {
            root: build_node(rows, sample, 0, max_depth, rng),
        }
    }

    /// Edges from the root to `row`'s leaf, plus c(leaf size) for leaves
    /// that stopped before isolating every row.
    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                IsolationNode::Leaf { size } => {
                    return depth as f64 + average_path_length(*size);
                }
                IsolationNode::Internal {
                    feature,
                    split,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *split { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

/// Recursively partition `indices`.
///
/// The split feature is drawn uniformly among the features that still vary
/// inside the node, so a node only stops early when its rows are identical.
/// The split value is drawn from `[min, max)`, which with `<=` routing keeps
/// both children non-empty.
fn build_node(
    rows: &[Vec<f64>],
    indices: &[usize],
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> IsolationNode {
    if depth >= max_depth || indices.len() <= 1 {
        return IsolationNode::Leaf {
            size: indices.len(),
        };
    }

    let n_features = rows[indices[0]].len();
    let candidates: Vec<(usize, f64, f64)> = (0..n_features)
        .filter_map(|f| {
            let (lo, hi) = indices
                .iter()
                .map(|&i| rows[i][f])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            (hi > lo).then_some((f, lo, hi))
        })
        .collect();

    if candidates.is_empty() {
        return IsolationNode::Leaf {
            size: indices.len(),
        };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let split = rng.gen_range(lo..hi);

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| rows[i][feature] <= split);

    IsolationNode::Internal {
        feature,
        split,
        left: Box::new(build_node(rows, &left, depth + 1, max_depth, rng)),
        right: Box::new(build_node(rows, &right, depth + 1, max_depth, rng)),
    }
}
