//! PUF quality metrics
//!
//! - reliability: 1 - mean FHD between readings and the known fingerprint (ideal 1.0)
//! - uniformity: mean bias of the readings (ideal 0.5)
//! - uniqueness: mean FHD between two devices (ideal 0.5)

use super::hamming::{bias, fhd};

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Mean FHD between `known` and every reading (intra-device distance).
/// `0.0` for an empty list.
pub fn intra_distance<T: AsRef<[u8]>>(known: &[u8], readings: &[T]) -> f64 {
    mean(readings.iter().map(|r| fhd(known, r)))
}

/// `1 - intra_distance(known, readings)`
pub fn reliability<T: AsRef<[u8]>>(known: &[u8], readings: &[T]) -> f64 {
    1.0 - intra_distance(known, readings)
}

/// Mean bias over the readings, `0.0` for an empty list
pub fn uniformity<T: AsRef<[u8]>>(readings: &[T]) -> f64 {
    mean(readings.iter().map(bias))
}

/// Mean FHD over every cross pair `(a[i], b[j])`.
///
/// Both lists must be non-empty and of equal length; otherwise `0.0`.
pub fn uniqueness<A: AsRef<[u8]>, B: AsRef<[u8]>>(a: &[A], b: &[B]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    mean(a.iter().flat_map(|x| b.iter().map(move |y| fhd(x, y))))
}

/// Inter-device uniqueness over k devices, one reference fingerprint each:
/// `2 / (k(k-1)) * sum_{i<j} FHD(R_i, R_j)`. `0.0` for fewer than two devices.
pub fn population_uniqueness<T: AsRef<[u8]>>(devices: &[T]) -> f64 {
    let k = devices.len();
    if k < 2 {
        return 0.0;
    }
    let sum: f64 = (0..k - 1)
        .flat_map(|i| (i + 1..k).map(move |j| (i, j)))
        .map(|(i, j)| fhd(&devices[i], &devices[j]))
        .sum();
    sum * 2.0 / (k * (k - 1)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reliability_of_identical_readings() {
        let readings = vec![vec![0xA5u8; 4]; 3];
        assert_eq!(reliability(&[0xA5; 4], &readings), 1.0);
    }

    #[test]
    fn test_reliability_empty() {
        let readings: Vec<Vec<u8>> = Vec::new();
        assert_eq!(intra_distance(&[0xFF], &readings), 0.0);
        assert_eq!(reliability(&[0xFF], &readings), 1.0);
    }

    #[test]
    fn test_intra_distance_mean() {
        // 0 and 8 of 16 bits differ
        let readings = [vec![0x00u8, 0x00], vec![0xFFu8, 0x00]];
        assert_eq!(intra_distance(&[0x00, 0x00], &readings), 0.25);
    }

    #[test]
    fn test_uniformity() {
        let readings = [vec![0x00u8], vec![0xFFu8]];
        assert_eq!(uniformity(&readings), 0.5);
        assert_eq!(uniformity::<Vec<u8>>(&[]), 0.0);
    }

    #[test]
    fn test_uniqueness_half_bits() {
        let a = [vec![0x00u8], vec![0x00u8]];
        let b = [vec![0x0Fu8], vec![0xF0u8]];
        assert!((uniqueness(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_uniqueness_counts_every_cross_pair() {
        // a[0] = b[0] and a[1] = b[1], cross pairs differ completely
        let a = [vec![0x00u8], vec![0xFFu8]];
        let b = [vec![0x00u8], vec![0xFFu8]];
        assert!((uniqueness(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_uniqueness_mismatched_lists() {
        let a = [vec![0x00u8]];
        let b = [vec![0xFFu8], vec![0xFFu8]];
        assert_eq!(uniqueness(&a, &b), 0.0);
        assert_eq!(uniqueness::<Vec<u8>, Vec<u8>>(&[], &[]), 0.0);
    }

    #[test]
    fn test_population_uniqueness() {
        let devices = [vec![0x00u8], vec![0x0Fu8], vec![0xFFu8]];
        // pairs: 0.5, 1.0, 0.5
        assert!((population_uniqueness(&devices) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(population_uniqueness(&devices[..1]), 0.0);
    }
}
