use log::info;

use crate::capacity;
use crate::config::{ChannelPolicy, DecodeOptions};
use crate::crypto;
use crate::embed::{Region, Traversal};
use crate::frame::{self, marker::Marker, FrameError};
use crate::pipeline::error::CodecError;
use crate::pipeline::hook::PipelineHook;
use crate::pipeline::state::{Session, Stage};
use crate::pipeline::Codec;
use crate::raster::{Carrier, Raster};

/// Full decode pipeline: image bytes -> marker -> blocks -> DCT -> bits -> frame -> [decrypt] -> message.
pub(crate) fn decode_image<H: PipelineHook + ?Sized>(
    codec: &Codec,
    image: &[u8],
    options: &DecodeOptions,
    hook: &H,
) -> Result<Vec<u8>, CodecError> {
    let mut session = Session::new("decode", hook);
    let result = run(codec, image, options, &mut session);
    session.conclude(result)
}

fn run<H: PipelineHook + ?Sized>(
    codec: &Codec,
    image: &[u8],
    options: &DecodeOptions,
    session: &mut Session<'_, H>,
) -> Result<Vec<u8>, CodecError> {
    // Step 1: Decode the image and identify the codec version from its marker
    session.advance(Stage::Validating);
    let raster = Raster::decode(image)?;
    let marker = read_marker(codec, &raster)?;
    let params = codec
        .params_for(marker.version)
        .ok_or(CodecError::UnsupportedVersion(marker.version))?;

    let plan = capacity::plan(raster.width(), raster.height(), params);
    let policy = if marker.uses_blue_channel() {
        ChannelPolicy::Blue
    } else {
        ChannelPolicy::Luma
    };
    let region = Region::payload(
        &plan,
        Traversal::for_params(params),
        Carrier::resolve(raster.channels(), policy),
        plan.capacity_bits,
    );
    info!(
        "found codec v{} marker in {}x{} image; reading up to {} bits",
        marker.version,
        raster.width(),
        raster.height(),
        region.capacity_bits()
    );

    // Step 2: Forward-transform every payload block
    session.advance(Stage::Transforming);
    let jobs = region.transform(&raster);

    // Step 3: Read one bit per selected coefficient
    session.advance(Stage::Extracting);
    let bits = region.extract(&jobs, region.capacity_bits());

    // Step 4: Parse the frame and undo encryption
    session.advance(Stage::Reassembling);
    let payload = frame::unframe(&bits, marker.has_checksum())?;
    let message = if marker.is_encrypted() {
        let password = options
            .password
            .as_deref()
            .ok_or(CodecError::PasswordRequired)?;
        crypto::open(password, &payload)?
    } else {
        payload
    };

    info!("decode complete: {} message bytes", message.len());
    session.advance(Stage::Done);
    Ok(message)
}

/// Read the version marker. Its layout does not depend on any codec version.
fn read_marker(codec: &Codec, raster: &Raster) -> Result<Marker, CodecError> {
    let plan = capacity::plan(raster.width(), raster.height(), codec.params());
    if !plan.marker_fits {
        return Err(FrameError::MissingMarker { found: 0 }.into());
    }
    let region = Region::marker(&plan, Carrier::resolve(raster.channels(), ChannelPolicy::Luma));
    let bits = region.extract(&region.transform(raster), region.capacity_bits());
    Ok(Marker::from_bits(&bits)?)
}
