//! Bitwise distance primitives

/// Number of set bits in `data`
pub fn popcount(data: &[u8]) -> u64 {
    data.iter().map(|b| u64::from(b.count_ones())).sum()
}

/// Hamming distance over the common prefix of `a` and `b`.
///
/// Buffers of different length are compared over `min(a.len(), b.len())`
/// bytes; the excess is ignored.
pub fn hamming_distance(a: impl AsRef<[u8]>, b: impl AsRef<[u8]>) -> u64 {
    a.as_ref()
        .iter()
        .zip(b.as_ref())
        .map(|(x, y)| u64::from((x ^ y).count_ones()))
        .sum()
}

/// Normalize a Hamming distance by the bit length of `length_bytes` bytes.
///
/// Returns `0.0` for a zero distance, a zero length, or a distance larger
/// than the number of bits, instead of failing.
pub fn fractional_hamming_distance(hd: u64, length_bytes: usize) -> f64 {
    let bits = (length_bytes as u64).saturating_mul(8);
    if hd == 0 || length_bytes == 0 || hd > bits {
        return 0.0;
    }
    hd as f64 / bits as f64
}

/// Fractional Hamming distance between two buffers over their common prefix
pub fn fhd(a: impl AsRef<[u8]>, b: impl AsRef<[u8]>) -> f64 {
    let (a, b) = (a.as_ref(), b.as_ref());
    fractional_hamming_distance(hamming_distance(a, b), a.len().min(b.len()))
}

/// Fraction of bits set to one, the per-fingerprint uniformity sample
pub fn bias(data: impl AsRef<[u8]>) -> f64 {
    let data = data.as_ref();
    if data.is_empty() {
        return 0.0;
    }
    popcount(data) as f64 / (data.len() as f64 * 8.0)
}
