use log::info;

use crate::capacity;
use crate::config::{self, ChannelPolicy, CodecParams, EncodeOptions};
use crate::crypto;
use crate::embed::{Region, Traversal};
use crate::frame::{self, marker::Marker};
use crate::pipeline::error::CodecError;
use crate::pipeline::hook::PipelineHook;
use crate::pipeline::state::{Session, Stage};
use crate::raster::{Carrier, Raster};

/// Full encode pipeline: image bytes -> blocks -> DCT -> embed marker + frame -> IDCT -> PNG.
pub(crate) fn encode_image<H: PipelineHook + ?Sized>(
    params: &CodecParams,
    image: &[u8],
    message: &[u8],
    options: &EncodeOptions,
    hook: &H,
) -> Result<Vec<u8>, CodecError> {
    let mut session = Session::new("encode", hook);
    let result = run(params, image, message, options, &mut session);
    session.conclude(result)
}

fn run<H: PipelineHook + ?Sized>(
    params: &CodecParams,
    image: &[u8],
    message: &[u8],
    options: &EncodeOptions,
    session: &mut Session<'_, H>,
) -> Result<Vec<u8>, CodecError> {
    // Step 1: Validate parameters, image, and capacity before touching any pixel
    session.advance(Stage::Validating);
    params.validate().map_err(CodecError::InvalidParams)?;
    let mut raster = Raster::decode(image)?;

    let payload = match options.password.as_deref() {
        Some(password) => crypto::seal(password, message)?,
        None => message.to_vec(),
    };
    let bits = frame::frame(&payload, options.checksum);

    let plan = capacity::plan(raster.width(), raster.height(), params);
    plan.require(bits.len())?;

    let mut flags = 0u8;
    if options.checksum {
        flags |= config::FLAG_CHECKSUM;
    }
    if options.password.is_some() {
        flags |= config::FLAG_ENCRYPTED;
    }
    if options.channel == ChannelPolicy::Blue {
        flags |= config::FLAG_BLUE_CHANNEL;
    }
    let marker_bits = Marker::new(params.version, flags).to_bits();

    info!(
        "embedding {} message bytes ({} frame bits) into {}x{} image, capacity {} bits",
        message.len(),
        bits.len(),
        raster.width(),
        raster.height(),
        plan.capacity_bits
    );

    let marker_region = Region::marker(&plan, Carrier::resolve(raster.channels(), ChannelPolicy::Luma));
    let payload_region = Region::payload(
        &plan,
        Traversal::for_params(params),
        Carrier::resolve(raster.channels(), options.channel),
        bits.len(),
    );

    // Step 2: Forward-transform every block that will carry a bit
    session.advance(Stage::Transforming);
    let mut marker_jobs = marker_region.transform(&raster);
    let mut payload_jobs = payload_region.transform(&raster);

    // Step 3: Quantize the selected coefficients
    session.advance(Stage::Embedding);
    marker_region.embed(&mut marker_jobs, &marker_bits);
    payload_region.embed(&mut payload_jobs, &bits);

    // Step 4: Back to pixels, verified, then written in block order
    session.advance(Stage::Reassembling);
    let marker_blocks = marker_region.settle(marker_jobs, &marker_bits)?;
    let payload_blocks = payload_region.settle(payload_jobs, &bits)?;
    for block in marker_blocks.iter().chain(&payload_blocks) {
        raster.write_block(block);
    }
    let png = raster.encode_png()?;

    info!(
        "encode complete: {} payload blocks modified, {} bytes of PNG",
        payload_region.len(),
        png.len()
    );
    session.advance(Stage::Done);
    Ok(png)
}
