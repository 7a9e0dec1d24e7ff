//! Statistics Engine
//!
//! Pure functions over fingerprints: Hamming distances, bias, majority-vote
//! reconstruction and the standard PUF quality metrics.
//!
//! Every function accepts anything that is `AsRef<[u8]>`, so raw buffers and
//! [`crate::model::Reading`] values can be mixed freely.

mod compare;
mod fingerprint;
mod hamming;
mod metrics;

pub use compare::{compare, compare_files, Comparison, MAX_COMPARE_FILE_SIZE};
pub use fingerprint::{bit_counts, known_fingerprint};
pub use hamming::{bias, fhd, fractional_hamming_distance, hamming_distance, popcount};
pub use metrics::{intra_distance, population_uniqueness, reliability, uniformity, uniqueness};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the file-based helpers
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is too large ({size} bytes, limit 1 MiB)", path.display())]
    FileTooLarge { path: PathBuf, size: u64 },
}
