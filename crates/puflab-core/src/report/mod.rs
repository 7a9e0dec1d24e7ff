//! Reports
//!
//! Turns stored readings into files: metric series as CSV and fingerprints
//! as PNG images.

mod bitmap;
mod pipeline;
mod table;

pub use bitmap::{render_bits, render_heatmap, save_png};
pub use pipeline::{Metric, MetricPipeline};
pub use table::{write_rows, write_series, write_series_to, ROW_DELIMITER};
