//! Analysis routines over a single batch of listening-history rows
//!
//! Everything here is pure and synchronous: no I/O, no state kept between
//! calls. Statistics are computed over the batch passed in and discarded.
//!
//! - **Clustering** (`cluster`): PCA to 2-D, k-means with silhouette-based
//!   choice of k, on linfa
//! - **Standardization** (`normalize`): per-column z-scores for the radar chart
//! - **Genre counts** (`genres`): flattened, title-cased genre tallies

pub mod cluster;
pub mod genres;
pub mod normalize;

pub use cluster::{
    ClusterAssignment, ClusterConfig, ClusterError, ClusterResult, FeatureClusterer, KScore,
    ProjectedPoint,
};
pub use genres::{count_genres, title_case, GenreCount};
pub use normalize::{melt, standardize_rows, StandardizedValue};

