//! Parity quantization of DCT coefficients.
//!
//! A bit is stored in a coefficient `c` by snapping it to the nearest
//! multiple `q * Q` of the quantization step whose index `q` has the bit's
//! parity. Reading it back is `round(c / Q) mod 2`, which survives any
//! perturbation smaller than `Q / 2`.

pub mod region;

use crate::config::{self, CodecParams};
use crate::transform::{max_basis_amplitude, zigzag, Block};

pub use region::{EmbedError, Region};

/// Snap `coefficient` to the nearest multiple of `step` whose index has parity `bit`.
pub fn quantize_bit(coefficient: f64, bit: u8, step: f64) -> f64 {
    let scaled = coefficient / step;
    let mut q = scaled.round();
    if parity(q) != bit & 1 {
        q += if scaled >= q { 1.0 } else { -1.0 };
    }
    q * step
}

/// Recover the bit stored in `coefficient`.
pub fn read_bit(coefficient: f64, step: f64) -> u8 {
    parity((coefficient / step).round())
}

fn parity(q: f64) -> u8 {
    (q as i64).rem_euclid(2) as u8
}

/// Fixed coefficient order inside a block, shared by embedding and extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    block_size: usize,
    quant_step: f64,
    /// Row-major coefficient indices, in embedding order.
    positions: Vec<usize>,
}

impl Traversal {
    /// Build from zig-zag ordinals. Ordinals must already be validated.
    pub fn new(block_size: usize, quant_step: f64, ordinals: &[usize]) -> Self {
        let order = zigzag(block_size);
        Self {
            block_size,
            quant_step,
            positions: ordinals.iter().map(|&o| order[o]).collect(),
        }
    }

    pub fn for_params(params: &CodecParams) -> Self {
        Self::new(params.block_size, params.quant_step, &params.coefficients)
    }

    /// The frozen traversal of the version marker.
    pub fn marker() -> Self {
        Self::new(
            config::MARKER_BLOCK_SIZE,
            config::MARKER_QUANT_STEP,
            &config::MARKER_COEFFICIENTS,
        )
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn bits_per_block(&self) -> usize {
        self.positions.len()
    }

    /// Pixel margin that keeps a fully re-embedded block clear of 0 and 255.
    ///
    /// Each selected coefficient moves by at most Q, and a single basis image
    /// never exceeds 2/N at a pixel.
    pub fn headroom(&self) -> u8 {
        let deviation =
            self.bits_per_block() as f64 * self.quant_step * max_basis_amplitude(self.block_size);
        (deviation.ceil() + 1.0).min(127.0) as u8
    }

    /// Write up to `bits_per_block` bits into one block's coefficients.
    pub fn embed(&self, coefficients: &mut Block, bits: &[u8]) {
        debug_assert!(bits.len() <= self.positions.len());
        let values = coefficients.values_mut();
        for (&position, &bit) in self.positions.iter().zip(bits) {
            values[position] = quantize_bit(values[position], bit, self.quant_step);
        }
    }

    /// Read the first `count` bits of one block.
    pub fn extract(&self, coefficients: &Block, count: usize) -> Vec<u8> {
        let values = coefficients.values();
        self.positions
            .iter()
            .take(count)
            .map(|&position| read_bit(values[position], self.quant_step))
            .collect()
    }
}
