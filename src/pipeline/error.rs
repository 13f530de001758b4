use std::string::FromUtf8Error;

use thiserror::Error;

use crate::capacity::CapacityError;
use crate::crypto::CryptoError;
use crate::embed::EmbedError;
use crate::frame::FrameError;
use crate::raster::RasterError;

/// Everything an `encode` or `decode` call can fail with. All variants are
/// terminal for the call; the caller's input is never modified.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The input bytes are not a decodable image in an accepted format.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The framed message needs more bits than the image can carry.
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    /// No marker, a damaged payload, or a frame cut short.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The marker names a codec version this codec does not know.
    #[error("unsupported codec version: {0}")]
    UnsupportedVersion(u8),

    #[error("invalid codec parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("message is encrypted; a password is required")]
    PasswordRequired,

    #[error("decoded message is not valid UTF-8")]
    InvalidText(#[from] FromUtf8Error),

    #[error(transparent)]
    Embedding(#[from] EmbedError),

    #[error("failed to write output image: {0}")]
    Output(String),
}

impl From<RasterError> for CodecError {
    fn from(error: RasterError) -> Self {
        match error {
            RasterError::Encode(message) => CodecError::Output(message),
            other => CodecError::UnsupportedFormat(other.to_string()),
        }
    }
}
