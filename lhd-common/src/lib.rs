//! # LHD Common Library
//!
//! Shared code for the Listening History Dashboard including:
//! - Audio-feature data model (FeatureRow, AudioFeatures)
//! - Listening-history time ranges
//! - Analysis routines (feature clustering, standardization, genre counts)
//! - Configuration loading
//! - Common error type

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod time_range;

pub use error::{Error, Result};
pub use features::{AudioFeatures, FeatureRow, FEATURE_COUNT, FEATURE_NAMES};
pub use time_range::TimeRange;
