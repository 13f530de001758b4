use std::f64::consts::PI;

/// A square block of sample values (or coefficients), row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    size: usize,
    values: Vec<f64>,
}

impl Block {
    /// Wrap `values` as a `size`x`size` block. Returns `None` on a shape mismatch.
    #[cfg(test)]
    pub fn new(size: usize, values: Vec<f64>) -> Option<Self> {
        if size == 0 || values.len() != size * size {
            return None;
        }
        Some(Self { size, values })
    }

    /// Wrap values whose length is already known to be `size * size`.
    pub(crate) fn from_values(size: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), size * size);
        Self { size, values }
    }

    #[cfg(test)]
    pub fn filled(size: usize, value: f64) -> Self {
        Self {
            size,
            values: vec![value; size * size],
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

/// Precomputed orthonormal DCT-II / DCT-III basis for NxN blocks.
///
/// The 2-D transform is separable: a 1-D pass over every row followed by a
/// 1-D pass over every column. With orthonormal scaling the inverse is the
/// transpose, so `inverse(forward(b)) == b` up to floating-point error.
pub struct DctTables {
    size: usize,
    /// `basis[k * n + x]` = alpha(k) * cos((2x + 1) k pi / 2n)
    basis: Vec<f64>,
}

impl DctTables {
    pub fn new(size: usize) -> Self {
        let n = size as f64;
        let mut basis = vec![0.0f64; size * size];
        for k in 0..size {
            let alpha = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            for x in 0..size {
                basis[k * size + x] =
                    alpha * ((2 * x + 1) as f64 * k as f64 * PI / (2.0 * n)).cos();
            }
        }
        Self { size, basis }
    }

    /// Forward 2-D DCT (type II).
    pub fn forward(&self, block: &Block) -> Block {
        assert_eq!(block.size, self.size, "block size does not match DCT tables");
        let rows = self.pass(&block.values, Direction::Rows, Self::dct_1d);
        let values = self.pass(&rows, Direction::Columns, Self::dct_1d);
        Block {
            size: self.size,
            values,
        }
    }

    /// Inverse 2-D DCT (type III).
    pub fn inverse(&self, coefficients: &Block) -> Block {
        assert_eq!(coefficients.size, self.size, "block size does not match DCT tables");
        let columns = self.pass(&coefficients.values, Direction::Columns, Self::idct_1d);
        let values = self.pass(&columns, Direction::Rows, Self::idct_1d);
        Block {
            size: self.size,
            values,
        }
    }

    fn dct_1d(&self, input: &[f64], output: &mut [f64]) {
        let n = self.size;
        for (k, out) in output.iter_mut().enumerate() {
            let row = &self.basis[k * n..(k + 1) * n];
            *out = row.iter().zip(input).map(|(b, v)| b * v).sum();
        }
    }

    fn idct_1d(&self, input: &[f64], output: &mut [f64]) {
        let n = self.size;
        for (x, out) in output.iter_mut().enumerate() {
            *out = (0..n).map(|k| self.basis[k * n + x] * input[k]).sum();
        }
    }

    fn pass(
        &self,
        values: &[f64],
        direction: Direction,
        transform: fn(&Self, &[f64], &mut [f64]),
    ) -> Vec<f64> {
        let n = self.size;
        let mut result = vec![0.0f64; n * n];
        let mut line = vec![0.0f64; n];
        let mut transformed = vec![0.0f64; n];
        for i in 0..n {
            for j in 0..n {
                line[j] = match direction {
                    Direction::Rows => values[i * n + j],
                    Direction::Columns => values[j * n + i],
                };
            }
            transform(self, &line, &mut transformed);
            for j in 0..n {
                match direction {
                    Direction::Rows => result[i * n + j] = transformed[j],
                    Direction::Columns => result[j * n + i] = transformed[j],
                }
            }
        }
        result
    }
}

/// Largest magnitude any single NxN basis image reaches at a pixel.
pub fn max_basis_amplitude(size: usize) -> f64 {
    2.0 / size as f64
}

#[derive(Clone, Copy)]
enum Direction {
    Rows,
    Columns,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_random_block(size: usize, seed: u32) -> Block {
        let mut state = seed;
        let values = (0..size * size)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                ((state >> 16) % 256) as f64
            })
            .collect();
        Block::new(size, values).unwrap()
    }

    #[test]
    fn test_block_shape_checked() {
        assert!(Block::new(8, vec![0.0; 64]).is_some());
        assert!(Block::new(8, vec![0.0; 63]).is_none());
        assert!(Block::new(0, Vec::new()).is_none());
    }

    #[test]
    fn test_roundtrip_within_one_after_rounding() {
        for size in [4, 8, 16] {
            let tables = DctTables::new(size);
            for seed in 0..16 {
                let block = pseudo_random_block(size, seed);
                let restored = tables.inverse(&tables.forward(&block));
                for (a, b) in block.values().iter().zip(restored.values()) {
                    assert!((a - b.round()).abs() <= 1.0, "size {} seed {}", size, seed);
                    assert!((a - b).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_flat_block_has_only_dc() {
        let tables = DctTables::new(8);
        let coefficients = tables.forward(&Block::filled(8, 128.0));
        // Orthonormal DC = mean * N
        assert!((coefficients.values()[0] - 1024.0).abs() < 1e-9);
        for &c in &coefficients.values()[1..] {
            assert!(c.abs() < 1e-9);
        }
    }

    #[test]
    fn test_energy_preserved() {
        let tables = DctTables::new(8);
        let block = pseudo_random_block(8, 99);
        let coefficients = tables.forward(&block);
        let spatial: f64 = block.values().iter().map(|v| v * v).sum();
        let spectral: f64 = coefficients.values().iter().map(|v| v * v).sum();
        assert!((spatial - spectral).abs() / spatial < 1e-12);
    }

    #[test]
    fn test_single_coefficient_amplitude_bounded() {
        let tables = DctTables::new(8);
        for k in 1..64 {
            let mut coefficients = Block::filled(8, 0.0);
            coefficients.values_mut()[k] = 1.0;
            let spatial = tables.inverse(&coefficients);
            for &v in spatial.values() {
                assert!(v.abs() <= max_basis_amplitude(8) + 1e-12);
            }
        }
    }
}
