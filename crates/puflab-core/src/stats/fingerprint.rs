//! Known-fingerprint reconstruction
//!
//! Bits are numbered MSB first: bit 0 is the most significant bit of byte 0.

/// Length shared by all fingerprints, or `None` if the set is empty or ragged
fn common_len<T: AsRef<[u8]>>(fingerprints: &[T]) -> Option<usize> {
    let len = fingerprints.first()?.as_ref().len();
    fingerprints
        .iter()
        .all(|f| f.as_ref().len() == len)
        .then_some(len)
}

/// Per-bit count of readings that powered up to one.
///
/// `counts[k * 8 + b]` holds the count for bit `b` (MSB first) of byte `k`.
/// Returns `None` for an empty set or fingerprints of different length.
pub fn bit_counts<T: AsRef<[u8]>>(fingerprints: &[T]) -> Option<Vec<u32>> {
    let len = common_len(fingerprints)?;
    let mut counts = vec![0u32; len * 8];

    for fp in fingerprints {
        for (k, byte) in fp.as_ref().iter().enumerate() {
            for b in 0..8 {
                counts[k * 8 + b] += u32::from((byte >> (7 - b)) & 1);
            }
        }
    }

    Some(counts)
}

/// Majority-vote reconstruction of the reference fingerprint.
///
/// A bit is set iff at least half of the readings have it set.
/// Returns `None` for an empty set or fingerprints of different length.
pub fn known_fingerprint<T: AsRef<[u8]>>(fingerprints: &[T]) -> Option<Vec<u8>> {
    let counts = bit_counts(fingerprints)?;
    let n = fingerprints.len() as f64;

    let known = counts
        .chunks(8)
        .map(|bits| {
            bits.iter().enumerate().fold(0u8, |byte, (b, &count)| {
                if f64::from(count) / n >= 0.5 {
                    byte | (1 << (7 - b))
                } else {
                    byte
                }
            })
        })
        .collect();

    Some(known)
}
