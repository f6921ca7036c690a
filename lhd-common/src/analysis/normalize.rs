//! Batch z-score standardization for the radar chart
//!
//! Statistics come from the rows passed in and are not kept anywhere.
//! Population standard deviation is used; a constant column maps to zeros.

use super::genres::title_case;
use crate::features::{AudioFeatures, FeatureRow, FEATURE_COUNT, FEATURE_NAMES};
use serde::Serialize;

/// One cell of the melted (long-form) feature table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardizedValue {
    pub id: String,
    pub name: String,
    /// Display label, e.g. "Danceability"
    pub feature: String,
    pub value: f64,
}

/// Z-score each column of `matrix`
pub fn standardize_columns<const D: usize>(matrix: &[[f64; D]]) -> Vec<[f64; D]> {
    if matrix.is_empty() {
        return Vec::new();
    }
    let n = matrix.len() as f64;

    let mut means = [0.0; D];
    for row in matrix {
        for j in 0..D {
            means[j] += row[j];
        }
    }
    for mean in means.iter_mut() {
        *mean /= n;
    }

    let mut stds = [0.0; D];
    for row in matrix {
        for j in 0..D {
            stds[j] += (row[j] - means[j]).powi(2) / n;
        }
    }
    for std in stds.iter_mut() {
        *std = std.sqrt();
    }

    matrix
        .iter()
        .map(|row| {
            let mut out = [0.0; D];
            for j in 0..D {
                out[j] = if stds[j] > f64::EPSILON {
                    (row[j] - means[j]) / stds[j]
                } else {
                    0.0
                };
            }
            out
        })
        .collect()
}

/// Standardize the audio features of a batch of rows
pub fn standardize_rows(rows: &[FeatureRow]) -> Vec<FeatureRow> {
    let matrix: Vec<[f64; FEATURE_COUNT]> = rows.iter().map(|r| r.features.to_array()).collect();
    standardize_columns(&matrix)
        .into_iter()
        .zip(rows)
        .map(|(values, row)| FeatureRow {
            id: row.id.clone(),
            name: row.name.clone(),
            features: AudioFeatures::from_array(values),
        })
        .collect()
}

/// Reshape rows into `(id, name, feature, value)` records
pub fn melt(rows: &[FeatureRow]) -> Vec<StandardizedValue> {
    let labels: Vec<String> = FEATURE_NAMES.iter().map(|n| title_case(n)).collect();
    rows.iter()
        .flat_map(|row| {
            let values = row.features.to_array();
            labels.iter().zip(values).map(move |(label, value)| StandardizedValue {
                id: row.id.clone(),
                name: row.name.clone(),
                feature: label.clone(),
                value,
            })
        })
        .collect()
}
