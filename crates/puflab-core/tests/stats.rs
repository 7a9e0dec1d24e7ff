//! Statistics engine properties and evaluation scenarios

use pretty_assertions::assert_eq;
use puflab_core::demo::SimulatedBoard;
use puflab_core::model::BoardSpecifier;
use puflab_core::stats::{
    bias, bit_counts, compare_files, fhd, fractional_hamming_distance, hamming_distance,
    known_fingerprint, population_uniqueness, reliability, uniformity, uniqueness, StatsError,
    MAX_COMPARE_FILE_SIZE,
};

fn buffers() -> Vec<Vec<u8>> {
    vec![
        vec![],
        vec![0x00],
        vec![0xFF, 0x00, 0xAA],
        vec![0x5A, 0xC3, 0x0F],
        (0..64).map(|i| (i * 37) as u8).collect(),
    ]
}

#[test]
fn test_hamming_properties() {
    for a in buffers() {
        assert_eq!(hamming_distance(&a, &a), 0);
        for b in buffers() {
            let hd = hamming_distance(&a, &b);
            assert_eq!(hd, hamming_distance(&b, &a));
            assert!(hd <= 8 * a.len().min(b.len()) as u64);
        }
    }
}

#[test]
fn test_fhd_and_bias_ranges() {
    for a in buffers() {
        let b = bias(&a);
        assert!((0.0..=1.0).contains(&b));
        for other in buffers() {
            let d = fhd(&a, &other);
            assert!((0.0..=1.0).contains(&d));
        }
    }
    assert_eq!(fractional_hamming_distance(9, 1), 0.0);
    assert_eq!(fractional_hamming_distance(4, 1), 0.5);
}

#[test]
fn test_known_fingerprint_majority() {
    let readings = [vec![0b1010_1010u8], vec![0b1010_1010], vec![0b0101_0101]];
    assert_eq!(known_fingerprint(&readings), Some(vec![0b1010_1010]));
    assert_eq!(bit_counts(&readings), Some(vec![2, 1, 2, 1, 2, 1, 2, 1]));
}

#[test]
fn test_known_fingerprint_invalid_input() {
    let empty: [Vec<u8>; 0] = [];
    assert_eq!(known_fingerprint(&empty), None);
    assert_eq!(known_fingerprint(&[vec![0u8; 2], vec![0u8; 3]]), None);
}

#[test]
fn test_uniqueness_half_bits() {
    let a = [vec![0x00u8; 4], vec![0x00; 4]];
    let b = [vec![0x0Fu8; 4], vec![0xF0; 4]];
    assert_eq!(uniqueness(&a, &b), 0.5);
    assert_eq!(uniqueness(&a, &b[..1]), 0.0);
    assert_eq!(population_uniqueness(&[vec![0x00u8], vec![0xFF], vec![0x0F]]), 2.0 / 3.0);
}

#[test]
fn test_simulated_device_metrics() {
    let mut sim = SimulatedBoard::new(42, BoardSpecifier::NucleoF401RE, 0x2000_0000, 512)
        .with_flip_probability(0.05);
    let readings: Vec<_> = (0..15).map(|_| sim.next_reading(25.0).unwrap()).collect();

    let known = known_fingerprint(&readings).unwrap();
    // Majority vote over 15 readings recovers the noise-free pattern almost exactly
    assert!(fhd(&known, sim.reference()) < 0.01);

    let r = reliability(&known, &readings);
    assert!(r > 0.9 && r <= 1.0, "reliability {}", r);

    let u = uniformity(&readings);
    assert!(u > 0.4 && u < 0.6, "uniformity {}", u);

    let mut other = SimulatedBoard::new(43, BoardSpecifier::NucleoF401RE, 0x2000_0000, 512);
    let other_readings: Vec<_> = (0..15).map(|_| other.next_reading(25.0).unwrap()).collect();
    let inter = uniqueness(&readings, &other_readings);
    assert!(inter > 0.4 && inter < 0.6, "uniqueness {}", inter);
}

#[test]
fn test_compare_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    std::fs::write(&a, [0xFF, 0x00, 0x10]).unwrap();
    std::fs::write(&b, [0xFF, 0x01, 0x10, 0x77]).unwrap();

    let result = compare_files(&a, &b).unwrap();
    assert_eq!(result.hd, 1);
    assert_eq!(result.differing_offsets, vec![1]);

    let big = dir.path().join("big.bin");
    std::fs::write(&big, vec![0u8; MAX_COMPARE_FILE_SIZE as usize + 1]).unwrap();
    assert!(matches!(
        compare_files(&a, &big),
        Err(StatsError::FileTooLarge { .. })
    ));
    assert!(matches!(
        compare_files(&a, dir.path().join("missing.bin")),
        Err(StatsError::Io { .. })
    ));
}
