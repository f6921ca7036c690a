//! Feature clustering for the top-tracks scatter plot
//!
//! Pipeline:
//! 1. N×9 audio-feature matrix
//! 2. PCA to two components. The raw features are projected without
//!    standardization, unlike the radar-chart path; `loudness` and `tempo`
//!    therefore dominate the projection.
//! 3. k-means for every k in `[2, k_max]`, scored by mean silhouette
//! 4. Highest score wins, ties go to the smaller k
//!
//! PCA, k-means and the silhouette score come from linfa. All preconditions
//! are checked up front and reported as [`ClusterError`].

use crate::features::{feature_matrix, FeatureRow, FEATURE_COUNT};
use linfa::metrics::SilhouetteScore;
use linfa::traits::{Fit, Predict};
use linfa::{DatasetBase, ParamGuard};
use linfa_clustering::KMeans;
use linfa_reduction::Pca;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Number of projected dimensions
const COMPONENTS: usize = 2;

/// k-means restarts per candidate k; the lowest-inertia run wins
const KMEANS_RUNS: usize = 10;

/// k-means convergence tolerance
const KMEANS_TOLERANCE: f64 = 1e-4;

/// Spread below which all projected points count as identical
const DEGENERATE_SPREAD: f64 = 1e-12;

/// Clustering precondition failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    /// Not enough rows for the requested cluster range
    #[error("Not enough rows to cluster: got {rows}, need at least {required}")]
    TooFewRows { rows: usize, required: usize },

    /// Upper bound on k is below the smallest candidate
    #[error("Maximum cluster count must be at least 2 (got {0})")]
    InvalidMaxClusters(usize),

    /// Every row projects to the same point; silhouette is undefined
    #[error("All feature rows are identical; clusters are undefined")]
    DegenerateFeatures,

    /// NaN or infinite value in the input
    #[error("Non-finite feature value in row {row}")]
    NonFiniteValue { row: usize },

    /// The projection or k-means fit itself failed
    #[error("Clustering failed: {0}")]
    Numerical(String),
}

/// Clusterer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Largest candidate cluster count (inclusive)
    pub k_max: usize,
    /// Seed for k-means initialisation
    pub seed: u64,
    /// Lloyd iteration cap per k-means run
    pub max_iterations: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k_max: 5,
            seed: 42,
            max_iterations: 300,
        }
    }
}

/// One row's 2-D projection and cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub cluster: usize,
}

/// Silhouette score for one candidate k
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KScore {
    pub k: usize,
    pub score: f64,
}

/// Row id → cluster label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterAssignment {
    labels: BTreeMap<String, usize>,
}

impl ClusterAssignment {
    pub fn get(&self, id: &str) -> Option<usize> {
        self.labels.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Distinct labels in ascending order
    pub fn label_set(&self) -> Vec<usize> {
        let mut set: Vec<usize> = self.labels.values().copied().collect();
        set.sort_unstable();
        set.dedup();
        set
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(id, label)| (id.as_str(), *label))
    }
}

/// Clustering output
#[derive(Debug, Clone, Serialize)]
pub struct ClusterResult {
    /// Selected cluster count
    pub k: usize,
    /// One point per input row, in input order
    pub points: Vec<ProjectedPoint>,
    /// Score for every candidate k that could be scored, ascending k
    pub scores: Vec<KScore>,
}

impl ClusterResult {
    pub fn assignment(&self) -> ClusterAssignment {
        ClusterAssignment {
            labels: self
                .points
                .iter()
                .map(|p| (p.id.clone(), p.cluster))
                .collect(),
        }
    }

    pub fn labels(&self) -> Vec<usize> {
        self.points.iter().map(|p| p.cluster).collect()
    }
}

/// PCA + k-means clusterer with automatic choice of k
#[derive(Debug, Clone, Default)]
pub struct FeatureClusterer {
    config: ClusterConfig,
}

impl FeatureClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Smallest row count accepted for the configured `k_max`
    pub fn min_rows(&self) -> usize {
        self.config.k_max.saturating_add(1).max(3)
    }

    /// Cluster `rows`
    ///
    /// The fit for the winning k is returned as-is: every candidate is
    /// fitted with the same seed, so refitting would reproduce it exactly.
    pub fn cluster(&self, rows: &[FeatureRow]) -> Result<ClusterResult, ClusterError> {
        let k_max = self.config.k_max;
        if k_max < 2 {
            return Err(ClusterError::InvalidMaxClusters(k_max));
        }
        let required = self.min_rows();
        if rows.len() < required {
            return Err(ClusterError::TooFewRows {
                rows: rows.len(),
                required,
            });
        }

        let matrix = feature_matrix(rows);
        if let Some(row) = matrix.iter().position(|r| r.iter().any(|v| !v.is_finite())) {
            return Err(ClusterError::NonFiniteValue { row });
        }

        if matrix.iter().all(|r| r == &matrix[0]) {
            return Err(ClusterError::DegenerateFeatures);
        }

        let projected = project(&matrix)?;
        if is_degenerate(&projected) {
            return Err(ClusterError::DegenerateFeatures);
        }

        let mut scores = Vec::with_capacity(k_max - 1);
        let mut fits = HashMap::new();
        for k in 2..=k_max {
            let labels = self.fit_labels(&projected, k)?;
            let distinct: HashSet<usize> = labels.iter().copied().collect();
            if distinct.len() < 2 {
                debug!(k, "Fit collapsed to a single cluster, skipping");
                continue;
            }
            let score = DatasetBase::new(projected.clone(), labels.clone())
                .silhouette_score()
                .map_err(|e| ClusterError::Numerical(e.to_string()))?;
            if score.is_finite() {
                debug!(k, score, "Scored candidate cluster count");
                scores.push(KScore { k, score });
                fits.insert(k, labels.to_vec());
            } else {
                debug!(k, "Silhouette undefined for candidate, skipping");
            }
        }

        let k = select_best_k(&scores).ok_or(ClusterError::DegenerateFeatures)?;
        let labels = fits
            .remove(&k)
            .map(|labels| relabel_by_first_appearance(&labels))
            .ok_or(ClusterError::DegenerateFeatures)?;

        // A centroid can end a run with no members; report the labels actually used
        let used = labels.iter().max().map_or(0, |m| m + 1);
        if used != k {
            debug!(selected = k, used, "Winning fit left empty clusters");
        }
        let k = used;

        let points = rows
            .iter()
            .zip(projected.rows())
            .zip(labels)
            .map(|((row, xy), cluster)| ProjectedPoint {
                id: row.id.clone(),
                name: row.name.clone(),
                x: xy[0],
                y: xy[1],
                cluster,
            })
            .collect();

        Ok(ClusterResult { k, points, scores })
    }

    /// Seeded k-means fit for one candidate k, returning a label per point
    fn fit_labels(&self, points: &Array2<f64>, k: usize) -> Result<Array1<usize>, ClusterError> {
        let dataset = DatasetBase::from(points.clone());
        let rng = StdRng::seed_from_u64(self.config.seed);
        let model = KMeans::params_with_rng(k, rng)
            .n_runs(KMEANS_RUNS)
            .max_n_iterations(self.config.max_iterations as u64)
            .tolerance(KMEANS_TOLERANCE)
            .check()
            .map_err(|e| ClusterError::Numerical(e.to_string()))?
            .fit(&dataset)
            .map_err(|e| ClusterError::Numerical(e.to_string()))?;
        Ok(model.predict(&dataset))
    }
}

/// Project the feature matrix onto its first two principal components
fn project(matrix: &[[f64; FEATURE_COUNT]]) -> Result<Array2<f64>, ClusterError> {
    let records = Array2::from_shape_vec(
        (matrix.len(), FEATURE_COUNT),
        matrix.iter().flatten().copied().collect(),
    )
    .map_err(|e| ClusterError::Numerical(e.to_string()))?;
    let dataset = DatasetBase::from(records);

    let pca: Pca<f64> = Pca::params(COMPONENTS)
        .fit(&dataset)
        .map_err(|e| ClusterError::Numerical(e.to_string()))?;
    Ok(pca.predict(&dataset))
}

/// Candidate with the highest score; the first (smallest k) wins ties
pub fn select_best_k(scores: &[KScore]) -> Option<usize> {
    let mut best: Option<KScore> = None;
    for candidate in scores {
        match best {
            Some(b) if candidate.score <= b.score => {}
            _ => best = Some(*candidate),
        }
    }
    best.map(|b| b.k)
}

/// Map labels onto `0..k` in order of first appearance
fn relabel_by_first_appearance(labels: &[usize]) -> Vec<usize> {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect()
}

fn is_degenerate(points: &Array2<f64>) -> bool {
    let mut rows = points.rows().into_iter();
    let Some(first) = rows.next() else {
        return true;
    };
    rows.all(|p| {
        p.iter()
            .zip(first.iter())
            .all(|(a, b)| (a - b).abs() < DEGENERATE_SPREAD)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::AudioFeatures;

    fn row(i: usize, values: [f64; 9]) -> FeatureRow {
        FeatureRow::new(format!("t{}", i), format!("Track {}", i), AudioFeatures::from_array(values))
    }

    #[test]
    fn test_select_best_k_prefers_smaller_on_tie() {
        let scores = [
            KScore { k: 2, score: 0.5 },
            KScore { k: 3, score: 0.7 },
            KScore { k: 4, score: 0.7 },
            KScore { k: 5, score: 0.1 },
        ];
        assert_eq!(select_best_k(&scores), Some(3));
    }

    #[test]
    fn test_select_best_k_all_equal_picks_first() {
        let scores = [KScore { k: 2, score: 0.4 }, KScore { k: 3, score: 0.4 }];
        assert_eq!(select_best_k(&scores), Some(2));
    }

    #[test]
    fn test_select_best_k_empty() {
        assert_eq!(select_best_k(&[]), None);
    }

    #[test]
    fn test_relabel_is_contiguous() {
        assert_eq!(relabel_by_first_appearance(&[3, 3, 1, 4, 1]), vec![0, 0, 1, 2, 1]);
    }

    #[test]
    fn test_rejects_small_k_max() {
        let clusterer = FeatureClusterer::new(ClusterConfig {
            k_max: 1,
            ..Default::default()
        });
        let rows: Vec<FeatureRow> = (0..5).map(|i| row(i, [i as f64; 9])).collect();
        assert_eq!(clusterer.cluster(&rows).unwrap_err(), ClusterError::InvalidMaxClusters(1));
    }

    #[test]
    fn test_rejects_too_few_rows() {
        let clusterer = FeatureClusterer::default();
        let rows: Vec<FeatureRow> = (0..5).map(|i| row(i, [i as f64; 9])).collect();
        let err = clusterer.cluster(&rows).unwrap_err();
        assert_eq!(err, ClusterError::TooFewRows { rows: 5, required: 6 });
    }

    #[test]
    fn test_rejects_identical_rows() {
        let clusterer = FeatureClusterer::default();
        let rows: Vec<FeatureRow> = (0..8).map(|i| row(i, [0.5; 9])).collect();
        assert_eq!(clusterer.cluster(&rows).unwrap_err(), ClusterError::DegenerateFeatures);
    }

    #[test]
    fn test_huge_k_max_does_not_overflow() {
        let clusterer = FeatureClusterer::new(ClusterConfig {
            k_max: usize::MAX,
            ..Default::default()
        });
        assert_eq!(clusterer.min_rows(), usize::MAX);
        let rows: Vec<FeatureRow> = (0..8).map(|i| row(i, [i as f64; 9])).collect();
        assert_eq!(
            clusterer.cluster(&rows).unwrap_err(),
            ClusterError::TooFewRows { rows: 8, required: usize::MAX }
        );
    }

    #[test]
    fn test_rejects_nan() {
        let clusterer = FeatureClusterer::default();
        let mut rows: Vec<FeatureRow> = (0..8).map(|i| row(i, [i as f64; 9])).collect();
        rows[3].features.tempo = f64::NAN;
        assert_eq!(
            clusterer.cluster(&rows).unwrap_err(),
            ClusterError::NonFiniteValue { row: 3 }
        );
    }
}
