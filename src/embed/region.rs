use log::debug;
use rayon::prelude::*;
use thiserror::Error;

use crate::capacity::CapacityPlan;
use crate::embed::Traversal;
use crate::raster::{Carrier, PixelBlock, Raster};
use crate::transform::{Block, DctTables};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("block {block} at {origin:?} could not hold its bits")]
pub struct EmbedError {
    pub block: usize,
    pub origin: (usize, usize),
}

/// One block in flight: its pixels and their transform.
#[derive(Debug, Clone)]
pub struct BlockJob {
    pub pixels: PixelBlock,
    pub coefficients: Block,
}

/// An ordered set of blocks written or read with one traversal through one carrier.
///
/// Every per-block step runs as a rayon parallel map; results always come
/// back in block-index order.
pub struct Region {
    origins: Vec<(usize, usize)>,
    traversal: Traversal,
    carrier: Carrier,
    dct: DctTables,
}

impl Region {
    pub fn new(origins: Vec<(usize, usize)>, traversal: Traversal, carrier: Carrier) -> Self {
        let dct = DctTables::new(traversal.block_size());
        Self {
            origins,
            traversal,
            carrier,
            dct,
        }
    }

    /// The marker blocks of `plan`. Callers pass the luma carrier regardless of
    /// the payload's channel policy.
    pub fn marker(plan: &CapacityPlan, carrier: Carrier) -> Self {
        Self::new(plan.marker_origins(), Traversal::marker(), carrier)
    }

    /// The payload blocks of `plan`, limited to the first blocks needed for `bit_count` bits.
    pub fn payload(plan: &CapacityPlan, traversal: Traversal, carrier: Carrier, bit_count: usize) -> Self {
        let needed = bit_count.div_ceil(traversal.bits_per_block());
        let mut origins = plan.payload_origins();
        origins.truncate(needed);
        Self::new(origins, traversal, carrier)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn capacity_bits(&self) -> usize {
        self.origins.len() * self.traversal.bits_per_block()
    }

    /// Copy every block out of `raster` and forward-transform its carrier plane.
    pub fn transform(&self, raster: &Raster) -> Vec<BlockJob> {
        let n = self.traversal.block_size();
        self.origins
            .par_iter()
            .map(|&origin| {
                let pixels = raster.read_block(origin, n);
                let coefficients = self.dct.forward(&pixels.plane(self.carrier));
                BlockJob {
                    pixels,
                    coefficients,
                }
            })
            .collect()
    }

    /// Quantize the coefficients of each job to carry its share of `bits`.
    pub fn embed(&self, jobs: &mut [BlockJob], bits: &[u8]) {
        jobs.par_iter_mut()
            .zip(bits.par_chunks(self.traversal.bits_per_block()))
            .for_each(|(job, chunk)| self.traversal.embed(&mut job.coefficients, chunk));
    }

    /// Read `bit_count` bits from transformed jobs in traversal order.
    pub fn extract(&self, jobs: &[BlockJob], bit_count: usize) -> Vec<u8> {
        let per_block = self.traversal.bits_per_block();
        let chunks: Vec<Vec<u8>> = jobs
            .par_iter()
            .enumerate()
            .map(|(i, job)| {
                let remaining = bit_count.saturating_sub(i * per_block);
                self.traversal
                    .extract(&job.coefficients, remaining.min(per_block))
            })
            .collect();
        chunks.concat()
    }

    /// Inverse-transform embedded jobs back into pixels and verify each block
    /// reads back its bits after rounding and clamping.
    ///
    /// A block whose pixels saturated is squeezed into the traversal's
    /// headroom and embedded again from scratch.
    pub fn settle(&self, jobs: Vec<BlockJob>, bits: &[u8]) -> Result<Vec<PixelBlock>, EmbedError> {
        jobs.into_par_iter()
            .zip(bits.par_chunks(self.traversal.bits_per_block()))
            .enumerate()
            .map(|(index, (job, chunk))| {
                self.settle_block(job, chunk).ok_or_else(|| EmbedError {
                    block: index,
                    origin: self.origins[index],
                })
            })
            .collect()
    }

    fn settle_block(&self, job: BlockJob, bits: &[u8]) -> Option<PixelBlock> {
        let mut candidate = job.pixels.clone();
        candidate.set_plane(self.carrier, &self.dct.inverse(&job.coefficients));
        if self.holds(&candidate, bits) {
            return Some(candidate);
        }

        let headroom = self.traversal.headroom();
        debug!(
            "block at {:?} saturated; re-embedding within headroom {}",
            job.pixels.origin(),
            headroom
        );
        let mut squeezed = job.pixels;
        squeezed.squeeze(self.carrier, headroom);
        let mut coefficients = self.dct.forward(&squeezed.plane(self.carrier));
        self.traversal.embed(&mut coefficients, bits);
        squeezed.set_plane(self.carrier, &self.dct.inverse(&coefficients));
        self.holds(&squeezed, bits).then_some(squeezed)
    }

    fn holds(&self, pixels: &PixelBlock, bits: &[u8]) -> bool {
        let coefficients = self.dct.forward(&pixels.plane(self.carrier));
        self.traversal.extract(&coefficients, bits.len()) == bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity;
    use crate::config::CodecParams;

    fn flat_raster(value: u8) -> Raster {
        Raster::from_raw(64, 64, 1, vec![value; 64 * 64]).unwrap()
    }

    fn write_and_read(raster: &mut Raster, bits: &[u8]) -> Vec<u8> {
        let params = CodecParams::v1();
        let plan = capacity::plan(64, 64, &params);
        let carrier = Carrier::Channel(0);
        let region = Region::payload(&plan, Traversal::for_params(&params), carrier, bits.len());

        let mut jobs = region.transform(raster);
        region.embed(&mut jobs, bits);
        for block in region.settle(jobs, bits).unwrap() {
            raster.write_block(&block);
        }

        let reader = Region::payload(&plan, Traversal::for_params(&params), carrier, bits.len());
        reader.extract(&reader.transform(raster), bits.len())
    }

    #[test]
    fn test_payload_region_size() {
        let params = CodecParams::v1();
        let plan = capacity::plan(64, 64, &params);
        let region = Region::payload(&plan, Traversal::for_params(&params), Carrier::Channel(0), 10);
        assert_eq!(region.len(), 3);
        assert_eq!(region.capacity_bits(), 12);
    }

    #[test]
    fn test_mid_gray_roundtrip() {
        let mut raster = flat_raster(128);
        let bits: Vec<u8> = (0..37).map(|i| (i % 3 == 1) as u8).collect();
        assert_eq!(write_and_read(&mut raster, &bits), bits);
    }

    #[test]
    fn test_saturated_blocks_are_squeezed() {
        for value in [0u8, 255] {
            let mut raster = flat_raster(value);
            let bits = vec![1u8; 40];
            assert_eq!(write_and_read(&mut raster, &bits), bits, "flat {}", value);
        }
    }

    #[test]
    fn test_untouched_blocks_stay_untouched() {
        let mut raster = flat_raster(90);
        let bits = vec![1u8; 8];
        write_and_read(&mut raster, &bits);
        // Only the first two payload blocks (row 8..16, x 0..16) may change.
        let data = raster.data();
        for y in 0..64 {
            for x in 0..64 {
                if !(8..16).contains(&y) || x >= 16 {
                    assert_eq!(data[y * 64 + x], 90, "pixel ({}, {})", x, y);
                }
            }
        }
    }
}
