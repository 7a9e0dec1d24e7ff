//! Demo Mode - Simulated board for testing without hardware
//!
//! A simulated device has a fixed random "true" SRAM start-up pattern. Every
//! power-up flips each bit independently with a small probability, which is
//! how real SRAM cells with weak bias behave.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{Board, BoardSpecifier, RangeError, Reading, Uid};
use crate::protocol::{encode, MAX_FINGERPRINT_SIZE};

/// Default per-bit flip probability per power-up
pub const DEFAULT_FLIP_PROBABILITY: f64 = 0.05;

/// Simulated board producing noisy readings of one PUF region
pub struct SimulatedBoard {
    board: Board,
    puf_start: u32,
    /// Start-up pattern without noise
    reference: Vec<u8>,
    flip_probability: f64,
    rng: StdRng,
}

impl SimulatedBoard {
    /// Create a device from `seed`; the same seed yields the same device.
    ///
    /// `puf_size` is clamped to the largest fingerprint the wire format carries.
    pub fn new(seed: u64, specifier: BoardSpecifier, puf_start: u32, puf_size: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let uid = Uid::new(rng.gen(), rng.gen(), rng.gen());
        let mut reference = vec![0u8; puf_size.clamp(1, MAX_FINGERPRINT_SIZE)];
        rng.fill(reference.as_mut_slice());

        Self {
            board: Board::new(specifier, uid),
            puf_start,
            reference,
            flip_probability: DEFAULT_FLIP_PROBABILITY,
            rng,
        }
    }

    /// Set the per-bit flip probability, clamped to `[0, 1]`
    pub fn with_flip_probability(mut self, probability: f64) -> Self {
        self.flip_probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    /// Board identity
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Noise-free start-up pattern
    pub fn reference(&self) -> &[u8] {
        &self.reference
    }

    /// One power-up: the reference with random bit flips
    pub fn next_fingerprint(&mut self) -> Vec<u8> {
        let p = self.flip_probability;
        let rng = &mut self.rng;
        self.reference
            .iter()
            .map(|&byte| {
                (0..8).fold(byte, |acc, bit| {
                    if rng.gen_bool(p) {
                        acc ^ (1 << bit)
                    } else {
                        acc
                    }
                })
            })
            .collect()
    }

    /// One power-up as a reading taken at `temperature` °C
    pub fn next_reading(&mut self, temperature: f64) -> Result<Reading, RangeError> {
        let fingerprint = self.next_fingerprint();
        let end = self.puf_start.saturating_add(fingerprint.len() as u32);
        Reading::new(self.puf_start, end, temperature, fingerprint)
    }

    /// One power-up encoded as the packet the firmware would send
    pub fn next_packet(&mut self, temperature: f64) -> Result<Vec<u8>, RangeError> {
        let reading = self.next_reading(temperature)?;
        Ok(encode(&self.board, &reading))
    }
}
