pub mod decode;
pub mod encode;
pub mod error;
pub mod hook;
pub mod state;

use anyhow::{Context, Result};

use crate::capacity::{self, CapacityPlan};
use crate::config::{CodecParams, DecodeOptions, EncodeOptions};
use crate::integrity;
use crate::raster::Raster;
use error::CodecError;
use hook::{NoopHook, PipelineHook};

/// The steganographic codec.
///
/// Encodes with one set of [`CodecParams`] and decodes any image whose
/// marker names a version it knows: its own parameters plus the built-in
/// versions. Holds no other state, so independent codecs with different
/// parameters can coexist.
#[derive(Debug, Clone)]
pub struct Codec {
    params: CodecParams,
    known: Vec<CodecParams>,
}

impl Codec {
    /// Build a codec that encodes with `params`. A version number already
    /// taken by a built-in parameter set must come with exactly those parameters.
    pub fn new(params: CodecParams) -> Result<Self, CodecError> {
        let mut codec = Self {
            params: params.clone(),
            known: CodecParams::builtin(),
        };
        codec.register(params)?;
        Ok(codec)
    }

    /// Teach the codec to decode another parameter version.
    pub fn register(&mut self, params: CodecParams) -> Result<(), CodecError> {
        params.validate().map_err(CodecError::InvalidParams)?;
        if let Some(existing) = self.params_for(params.version) {
            if *existing != params {
                return Err(CodecError::InvalidParams(format!(
                    "version {} is already registered with different parameters",
                    params.version
                )));
            }
            return Ok(());
        }
        self.known.push(params);
        Ok(())
    }

    /// Parameters used for encoding.
    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    pub fn params_for(&self, version: u8) -> Option<&CodecParams> {
        self.known.iter().find(|p| p.version == version)
    }

    /// Capacity of `image` under the encoding parameters.
    pub fn capacity(&self, image: &[u8]) -> Result<CapacityPlan, CodecError> {
        let raster = Raster::decode(image)?;
        Ok(capacity::plan(raster.width(), raster.height(), &self.params))
    }

    /// Hide `message` in `image`, returning a PNG.
    pub fn encode(
        &self,
        image: &[u8],
        message: &[u8],
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        self.encode_with_hook(image, message, options, &NoopHook)
    }

    pub fn encode_with_hook<H: PipelineHook + ?Sized>(
        &self,
        image: &[u8],
        message: &[u8],
        options: &EncodeOptions,
        hook: &H,
    ) -> Result<Vec<u8>, CodecError> {
        encode::encode_image(&self.params, image, message, options, hook)
    }

    /// Recover the message hidden in `image`.
    pub fn decode(&self, image: &[u8], options: &DecodeOptions) -> Result<Vec<u8>, CodecError> {
        self.decode_with_hook(image, options, &NoopHook)
    }

    pub fn decode_with_hook<H: PipelineHook + ?Sized>(
        &self,
        image: &[u8],
        options: &DecodeOptions,
        hook: &H,
    ) -> Result<Vec<u8>, CodecError> {
        decode::decode_image(self, image, options, hook)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            params: CodecParams::v1(),
            known: CodecParams::builtin(),
        }
    }
}

/// Hide a text message with the default codec.
pub fn encode_message(
    image: &[u8],
    message: &str,
    options: &EncodeOptions,
) -> Result<Vec<u8>, CodecError> {
    Codec::default().encode(image, message.as_bytes(), options)
}

/// Recover a text message with the default codec.
pub fn decode_message(image: &[u8], options: &DecodeOptions) -> Result<String, CodecError> {
    let bytes = Codec::default().decode(image, options)?;
    Ok(String::from_utf8(bytes)?)
}

/// Result of a full encode → hook → decode roundtrip.
pub struct RoundtripResult {
    /// The encoded PNG as it left the encoder.
    pub encoded: Vec<u8>,
    /// SHA-256 hex digest of the original message.
    pub original_hash: String,
    /// SHA-256 hex digest of the decoded message.
    pub decoded_hash: String,
    /// `true` if the hashes match (lossless round-trip).
    pub matched: bool,
}

/// Run a full encode → hook → decode roundtrip.
///
/// Steps:
/// 1. SHA-256 hashes `message`.
/// 2. Encodes `message` into `image`.
/// 3. Calls `hook.after_encode` with the PNG: upload/download happens here.
/// 4. Decodes the bytes returned by the hook.
/// 5. SHA-256 hashes the decoded message and compares with the original.
///
/// # Example
///
/// ```rust,no_run
/// use kalupto::{roundtrip, Codec, EncodeOptions, NoopHook};
///
/// let cover = std::fs::read("cover.png").unwrap();
/// let result = roundtrip(&Codec::default(), &cover, b"hi", &EncodeOptions::default(), &NoopHook).unwrap();
///
/// assert!(result.matched, "round-trip failed: {} != {}", result.original_hash, result.decoded_hash);
/// ```
pub fn roundtrip<H: PipelineHook>(
    codec: &Codec,
    image: &[u8],
    message: &[u8],
    options: &EncodeOptions,
    hook: &H,
) -> Result<RoundtripResult> {
    let original_hash = integrity::sha256_hex(message);

    let encoded = codec
        .encode_with_hook(image, message, options, hook)
        .context("failed to encode message")?;

    let fetched = hook
        .after_encode(encoded.clone())
        .context("post-encode hook failed")?;

    let decode_options = DecodeOptions {
        password: options.password.clone(),
    };
    let decoded = codec
        .decode_with_hook(&fetched, &decode_options, hook)
        .context("failed to decode message")?;

    let decoded_hash = integrity::sha256_hex(&decoded);
    let matched = original_hash == decoded_hash;

    Ok(RoundtripResult {
        encoded,
        original_hash,
        decoded_hash,
        matched,
    })
}
