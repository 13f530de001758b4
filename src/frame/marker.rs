use byteorder::{BigEndian, ByteOrder};

use crate::config;
use crate::frame::{bits_to_bytes, bytes_to_bits, FrameError};

/// The 32-bit version marker written ahead of every payload:
/// `[u16 magic][u8 version][u8 flags]`, big-endian, MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub version: u8,
    pub flags: u8,
}

impl Marker {
    pub fn new(version: u8, flags: u8) -> Self {
        Self { version, flags }
    }

    pub fn has_checksum(&self) -> bool {
        self.flags & config::FLAG_CHECKSUM != 0
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & config::FLAG_ENCRYPTED != 0
    }

    pub fn uses_blue_channel(&self) -> bool {
        self.flags & config::FLAG_BLUE_CHANNEL != 0
    }

    pub fn to_bits(&self) -> Vec<u8> {
        let mut bytes = [0u8; 4];
        BigEndian::write_u16(&mut bytes[..2], config::MAGIC);
        bytes[2] = self.version;
        bytes[3] = self.flags;
        bytes_to_bits(&bytes)
    }

    /// Parse a marker. A magic mismatch means the image carries no payload.
    pub fn from_bits(bits: &[u8]) -> Result<Self, FrameError> {
        if bits.len() < config::MARKER_BITS {
            return Err(FrameError::MissingMarker { found: 0 });
        }
        let bytes = bits_to_bytes(&bits[..config::MARKER_BITS]);
        let magic = BigEndian::read_u16(&bytes[..2]);
        if magic != config::MAGIC {
            return Err(FrameError::MissingMarker { found: magic });
        }
        Ok(Self {
            version: bytes[2],
            flags: bytes[3],
        })
    }
}
