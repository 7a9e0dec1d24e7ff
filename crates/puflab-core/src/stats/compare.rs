//! Side-by-side comparison of two fingerprint dumps

use serde::Serialize;
use std::fs;
use std::path::Path;

use super::hamming::{fractional_hamming_distance, hamming_distance};
use super::StatsError;

/// Largest dump accepted by [`compare_files`]
pub const MAX_COMPARE_FILE_SIZE: u64 = 1024 * 1024;

/// Result of comparing two buffers over their common prefix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Number of bytes compared
    pub bytes: usize,
    /// Number of bits compared
    pub bits: usize,
    /// Hamming distance
    pub hd: u64,
    /// Fractional Hamming distance
    pub fhd: f64,
    /// Offsets of the bytes that differ
    pub differing_offsets: Vec<usize>,
}

/// Compare `a` and `b` over `min(a.len(), b.len())` bytes
pub fn compare(a: &[u8], b: &[u8]) -> Comparison {
    let bytes = a.len().min(b.len());
    let hd = hamming_distance(a, b);
    let differing_offsets = a
        .iter()
        .zip(b)
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(i, _)| i)
        .collect();

    Comparison {
        bytes,
        bits: bytes * 8,
        hd,
        fhd: fractional_hamming_distance(hd, bytes),
        differing_offsets,
    }
}

fn read_dump(path: &Path) -> Result<Vec<u8>, StatsError> {
    let len = fs::metadata(path)
        .map_err(|source| StatsError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if len > MAX_COMPARE_FILE_SIZE {
        return Err(StatsError::FileTooLarge {
            path: path.to_path_buf(),
            size: len,
        });
    }
    fs::read(path).map_err(|source| StatsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Compare two binary dumps on disk, each at most 1 MiB
pub fn compare_files(a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<Comparison, StatsError> {
    let a = read_dump(a.as_ref())?;
    let b = read_dump(b.as_ref())?;
    Ok(compare(&a, &b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_summary() {
        let c = compare(&[0x00, 0x11, 0xFF], &[0x00, 0x10, 0x0F, 0xAA]);
        assert_eq!(c.bytes, 3);
        assert_eq!(c.bits, 24);
        assert_eq!(c.hd, 5);
        assert_eq!(c.differing_offsets, vec![1, 2]);
        assert!((c.fhd - 5.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_compare_identical() {
        let c = compare(&[1, 2, 3], &[1, 2, 3]);
        assert_eq!(c.hd, 0);
        assert_eq!(c.fhd, 0.0);
        assert!(c.differing_offsets.is_empty());
    }
}
