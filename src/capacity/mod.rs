use thiserror::Error;

use crate::config::{self, CodecParams};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("insufficient capacity: need {required} bits, only {available} available")]
pub struct CapacityError {
    pub required: usize,
    pub available: usize,
}

/// Block grid and embeddable bit count of an image under a set of codec parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityPlan {
    pub width: u32,
    pub height: u32,
    pub block_size: usize,
    /// Full payload-grid blocks per row.
    pub blocks_x: usize,
    /// Full payload-grid block rows.
    pub blocks_y: usize,
    /// Whether the version marker fits in the image at all.
    pub marker_fits: bool,
    /// Pixel rows occupied by the version marker.
    pub marker_rows: usize,
    /// Raster-order index, in the payload grid, of the first payload block.
    pub first_payload_block: usize,
    pub payload_blocks: usize,
    pub bits_per_block: usize,
    pub capacity_bits: usize,
}

impl CapacityPlan {
    /// Fail fast when `required_bits` does not fit.
    pub fn require(&self, required_bits: usize) -> Result<(), CapacityError> {
        if required_bits > self.capacity_bits {
            return Err(CapacityError {
                required: required_bits,
                available: self.capacity_bits,
            });
        }
        Ok(())
    }

    /// Largest message (in bytes) that fits, given the frame and encryption overhead.
    pub fn max_message_bytes(&self, checksum: bool, encrypted: bool) -> usize {
        let overhead = config::frame_bits(0, checksum);
        let bytes = self.capacity_bits.saturating_sub(overhead) / 8;
        if encrypted {
            bytes.saturating_sub(config::ENCRYPTION_OVERHEAD)
        } else {
            bytes
        }
    }

    /// Pixel origins of payload blocks, in traversal (raster) order.
    pub fn payload_origins(&self) -> Vec<(usize, usize)> {
        if !self.marker_fits {
            return Vec::new();
        }
        let n = self.block_size;
        (self.first_payload_block..self.blocks_x * self.blocks_y)
            .map(|i| ((i % self.blocks_x) * n, (i / self.blocks_x) * n))
            .collect()
    }

    /// Pixel origins of the marker blocks, in traversal (raster) order.
    pub fn marker_origins(&self) -> Vec<(usize, usize)> {
        if !self.marker_fits {
            return Vec::new();
        }
        let n = config::MARKER_BLOCK_SIZE;
        let per_row = self.width as usize / n;
        (0..config::MARKER_BLOCKS)
            .map(|i| ((i % per_row) * n, (i / per_row) * n))
            .collect()
    }
}

/// Plan where the marker and the payload go in a `width`x`height` image.
///
/// Incomplete edge blocks are never used. The marker takes the first
/// [`config::MARKER_BLOCKS`] full 8x8 blocks in raster order. With 8x8
/// payload blocks the payload continues at the next block in raster order;
/// with any other size it starts on the first payload-grid row below the
/// marker.
pub fn plan(width: u32, height: u32, params: &CodecParams) -> CapacityPlan {
    let n = params.block_size;
    let blocks_x = width as usize / n;
    let blocks_y = height as usize / n;

    let marker_per_row = width as usize / config::MARKER_BLOCK_SIZE;
    let marker_total = marker_per_row * (height as usize / config::MARKER_BLOCK_SIZE);
    let marker_fits = marker_total >= config::MARKER_BLOCKS;
    let marker_rows = if marker_fits {
        config::MARKER_BLOCKS.div_ceil(marker_per_row) * config::MARKER_BLOCK_SIZE
    } else {
        0
    };

    let total_blocks = blocks_x * blocks_y;
    let first_payload_block = if n == config::MARKER_BLOCK_SIZE {
        config::MARKER_BLOCKS.min(total_blocks)
    } else {
        marker_rows.div_ceil(n).min(blocks_y) * blocks_x
    };
    let payload_blocks = if marker_fits {
        total_blocks - first_payload_block
    } else {
        0
    };
    let bits_per_block = params.bits_per_block();

    CapacityPlan {
        width,
        height,
        block_size: n,
        blocks_x,
        blocks_y,
        marker_fits,
        marker_rows,
        first_payload_block,
        payload_blocks,
        bits_per_block,
        capacity_bits: payload_blocks * bits_per_block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_64() {
        let plan = plan(64, 64, &CodecParams::v1());
        assert!(plan.marker_fits);
        assert_eq!(plan.marker_rows, 8);
        assert_eq!(plan.first_payload_block, 8);
        assert_eq!(plan.payload_blocks, 56);
        assert_eq!(plan.capacity_bits, 224);
        assert_eq!(plan.payload_origins()[0], (0, 8));
        assert_eq!(plan.payload_origins().len(), 56);
    }

    #[test]
    fn test_single_block_image_has_no_capacity() {
        let plan = plan(8, 8, &CodecParams::v1());
        assert!(!plan.marker_fits);
        assert_eq!(plan.capacity_bits, 0);
        assert!(plan.payload_origins().is_empty());
        assert!(plan.require(56).is_err());
    }

    #[test]
    fn test_narrow_image_wraps_marker() {
        // 3 marker blocks per row -> 3 rows of marker blocks
        let plan = plan(24, 64, &CodecParams::v1());
        assert!(plan.marker_fits);
        assert_eq!(plan.marker_rows, 24);
        assert_eq!(plan.marker_origins()[7], (8, 16));
        assert_eq!(plan.payload_blocks, 3 * 8 - 8);
        assert_eq!(plan.payload_origins()[0], (16, 16));
    }

    #[test]
    fn test_strip_image_carries_payload_beside_marker() {
        let plan = plan(1024, 8, &CodecParams::v1());
        assert!(plan.marker_fits);
        assert_eq!(plan.payload_blocks, 128 - 8);
        assert_eq!(plan.capacity_bits, 120 * 4);
        assert_eq!(plan.payload_origins()[0], (64, 0));
    }

    #[test]
    fn test_marker_and_payload_disjoint() {
        for (w, h) in [(24, 64), (64, 64), (100, 8), (1024, 8), (96, 80)] {
            let plan = plan(w, h, &CodecParams::v1());
            let marker = plan.marker_origins();
            for origin in plan.payload_origins() {
                assert!(!marker.contains(&origin), "{}x{}: {:?}", w, h, origin);
            }
        }
    }

    #[test]
    fn test_incomplete_edge_blocks_excluded() {
        let plan = plan(70, 69, &CodecParams::v1());
        assert_eq!(plan.blocks_x, 8);
        assert_eq!(plan.blocks_y, 8);
        assert_eq!(plan.payload_blocks, 56);
    }

    #[test]
    fn test_marker_rows_align_to_larger_blocks() {
        let mut params = CodecParams::v1();
        params.block_size = 16;
        params.quant_step = 24.0;
        let plan = plan(64, 64, &params);
        assert_eq!(plan.marker_rows, 8);
        assert_eq!(plan.first_payload_block, 4);
        assert_eq!(plan.payload_blocks, 3 * 4);
        for (_, y) in plan.payload_origins() {
            assert!(y >= 16);
        }
    }

    #[test]
    fn test_monotonic_in_dimensions() {
        let params = CodecParams::v1();
        let mut previous = 0;
        for side in (0..200).step_by(3) {
            let bits = plan(side, side, &params).capacity_bits;
            assert!(bits >= previous, "capacity dropped at {}", side);
            previous = bits;
        }
        for h in [16u32, 40, 100] {
            let mut previous = 0;
            for w in 0..300 {
                let bits = plan(w, h, &params).capacity_bits;
                assert!(bits >= previous, "capacity dropped at {}x{}", w, h);
                previous = bits;
            }
        }
    }

    #[test]
    fn test_require_reports_numbers() {
        let plan = plan(64, 64, &CodecParams::v1());
        assert!(plan.require(224).is_ok());
        assert_eq!(
            plan.require(225),
            Err(CapacityError {
                required: 225,
                available: 224
            })
        );
    }

    #[test]
    fn test_max_message_bytes() {
        let plan = plan(64, 64, &CodecParams::v1());
        assert_eq!(plan.max_message_bytes(true, false), (224 - 48) / 8);
        assert_eq!(plan.max_message_bytes(true, true), 0);
    }
}
