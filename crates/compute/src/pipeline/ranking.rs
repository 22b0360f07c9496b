use callwatch_core::{ScoredCall, ScoredCaller};

/// Rows carrying an anomaly verdict.
///
/// Implemented by both output row types so ranking and top-K selection are
/// shared between the caller and call paths.
pub trait Scored {
    fn anomaly_score(&self) -> f64;
    fn is_anomaly(&self) -> bool;
}

impl Scored for ScoredCaller {
    fn anomaly_score(&self) -> f64 {
        self.anomaly_score
    }

    fn is_anomaly(&self) -> bool {
        self.anomaly
    }
}

impl Scored for ScoredCall {
    fn anomaly_score(&self) -> f64 {
        self.anomaly_score
    }

    fn is_anomaly(&self) -> bool {
        self.anomaly
    }
}

/// Sort by score descending. Stable: ties keep their prior relative order.
pub fn rank_by_score<T: Scored>(rows: &mut [T]) {
    rows.sort_by(|a, b| b.anomaly_score().total_cmp(&a.anomaly_score()));
}

/// First `k` flagged rows of an already ranked slice.
///
/// A view over the ranking; the ranked rows themselves are left untouched.
pub fn top_flagged<T: Scored + Clone>(ranked: &[T], k: usize) -> Vec<T> {
    ranked
        .iter()
        .filter(|r| r.is_anomaly())
        .take(k)
        .cloned()
        .collect()
}
