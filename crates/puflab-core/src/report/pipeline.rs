//! Metric pipelines
//!
//! Select readings from a store, compute one metric and export the series.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::table::write_series;
use crate::model::Reading;
use crate::stats::{bias, fhd, known_fingerprint, reliability, uniformity};
use crate::store::{BoardId, ReadingQuery, ReadingStore};

/// Metric computed over a selection of readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// One value: mean bias
    Uniformity,
    /// One value: 1 - mean FHD to the known fingerprint
    Reliability,
    /// FHD of every reading to the known fingerprint
    IntraDistances,
    /// Temperature of every reading
    Temperatures,
    /// Bias of every reading
    Biases,
}

impl Metric {
    /// Column header used on export
    pub fn header(&self) -> &'static str {
        match self {
            Metric::Uniformity => "uniformity",
            Metric::Reliability => "reliability",
            Metric::IntraDistances => "intra_fhd",
            Metric::Temperatures => "temperature",
            Metric::Biases => "bias",
        }
    }

    /// Compute the metric.
    ///
    /// Metrics that need a known fingerprint yield nothing when the readings
    /// are empty or of differing sizes.
    pub fn compute(&self, readings: &[Reading]) -> Vec<f64> {
        match self {
            Metric::Uniformity if readings.is_empty() => Vec::new(),
            Metric::Uniformity => vec![uniformity(readings)],
            Metric::Reliability => known_fingerprint(readings)
                .map(|known| vec![reliability(&known, readings)])
                .unwrap_or_default(),
            Metric::IntraDistances => known_fingerprint(readings)
                .map(|known| readings.iter().map(|r| fhd(&known, r)).collect())
                .unwrap_or_default(),
            Metric::Temperatures => readings.iter().map(Reading::temperature).collect(),
            Metric::Biases => readings.iter().map(bias).collect(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Readings of one board, one metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPipeline {
    /// Board to select from
    pub board_id: BoardId,
    /// Which of its readings
    pub query: ReadingQuery,
    /// What to compute
    pub metric: Metric,
}

impl MetricPipeline {
    /// Create a pipeline
    pub fn new(board_id: BoardId, query: ReadingQuery, metric: Metric) -> Self {
        Self {
            board_id,
            query,
            metric,
        }
    }

    /// Query the store and compute the metric
    pub fn run<S: ReadingStore + ?Sized>(&self, store: &S) -> Result<Vec<f64>> {
        let readings = store
            .query_readings(self.board_id, &self.query)
            .with_context(|| format!("Failed to query readings of board {}", self.board_id))?;
        let values = self.metric.compute(&readings);
        tracing::debug!(
            board = %self.board_id,
            metric = %self.metric,
            readings = readings.len(),
            values = values.len(),
            "computed metric"
        );
        Ok(values)
    }

    /// Run and write the values as a one-column CSV
    pub fn export<S: ReadingStore + ?Sized, P: AsRef<Path>>(&self, store: &S, path: P) -> Result<usize> {
        let values = self.run(store)?;
        write_series(path, self.metric.header(), &values)?;
        Ok(values.len())
    }
}
