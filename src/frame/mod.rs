//! Message framing.
//!
//! A frame is the self-describing bit sequence actually embedded:
//!
//! ```text
//! [32 bits] message length in bytes (big-endian u32)
//! [N bytes] message
//! [16 bits] CRC-16/IBM-3740 of length + message (only when the checksum flag is set)
//! ```
//!
//! Bits are MSB first. The version marker that precedes every frame lives in
//! [`marker`].

pub mod marker;

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

use crate::config;
use crate::integrity;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("no codec marker found (read 0x{found:04X}): not an image produced by this codec")]
    MissingMarker { found: u16 },
    #[error("payload corrupt: checksum expected 0x{expected:04X}, computed 0x{computed:04X}")]
    Corrupt { expected: u16, computed: u16 },
    #[error("payload truncated: frame declares {declared_bits} bits, only {available_bits} available")]
    Truncated {
        declared_bits: usize,
        available_bits: usize,
    },
}

/// Expand bytes into one `0`/`1` entry per bit, MSB first.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Pack MSB-first bits into bytes. A trailing partial byte is zero-padded.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &bit)| byte | ((bit & 1) << (7 - i)))
        })
        .collect()
}

/// Serialize `message` into frame bits.
pub fn frame(message: &[u8], checksum: bool) -> Vec<u8> {
    let mut header = [0u8; 4];
    BigEndian::write_u32(&mut header, message.len() as u32);

    let mut bytes = Vec::with_capacity(4 + message.len() + 2);
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(message);
    if checksum {
        let mut crc = [0u8; 2];
        BigEndian::write_u16(&mut crc, integrity::frame_crc16(&header, message));
        bytes.extend_from_slice(&crc);
    }
    bytes_to_bits(&bytes)
}

/// Parse a frame from the start of `bits`. Bits past the frame are ignored.
pub fn unframe(bits: &[u8], checksum: bool) -> Result<Vec<u8>, FrameError> {
    if bits.len() < config::LENGTH_PREFIX_BITS {
        return Err(FrameError::Truncated {
            declared_bits: config::LENGTH_PREFIX_BITS,
            available_bits: bits.len(),
        });
    }

    let header = bits_to_bytes(&bits[..config::LENGTH_PREFIX_BITS]);
    let declared_len = BigEndian::read_u32(&header) as usize;
    let trailer = if checksum { config::CHECKSUM_BITS } else { 0 };
    let declared_bits = declared_len
        .saturating_mul(8)
        .saturating_add(config::LENGTH_PREFIX_BITS + trailer);
    if declared_bits > bits.len() {
        return Err(FrameError::Truncated {
            declared_bits,
            available_bits: bits.len(),
        });
    }

    let payload_end = config::LENGTH_PREFIX_BITS + declared_len * 8;
    let message = bits_to_bytes(&bits[config::LENGTH_PREFIX_BITS..payload_end]);

    if checksum {
        let crc_bytes = bits_to_bytes(&bits[payload_end..payload_end + config::CHECKSUM_BITS]);
        let expected = BigEndian::read_u16(&crc_bytes);
        let computed = integrity::frame_crc16(&header, &message);
        if expected != computed {
            return Err(FrameError::Corrupt { expected, computed });
        }
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_msb_first() {
        assert_eq!(bytes_to_bits(&[0b1010_0001]), vec![1, 0, 1, 0, 0, 0, 0, 1]);
        assert_eq!(bits_to_bytes(&[1, 0, 1, 0, 0, 0, 0, 1]), vec![0b1010_0001]);
        assert_eq!(bits_to_bytes(&[1, 1]), vec![0b1100_0000]);
    }

    #[test]
    fn test_frame_layout() {
        let bits = frame(b"hi", true);
        assert_eq!(bits.len(), 64);
        let bytes = bits_to_bytes(&bits);
        assert_eq!(&bytes[..6], &[0, 0, 0, 2, b'h', b'i']);
        let crc = integrity::crc16(&bytes[..6]);
        assert_eq!(&bytes[6..], &crc.to_be_bytes());
    }

    #[test]
    fn test_unframe_ignores_trailing_bits() {
        let mut bits = frame(b"hello", true);
        bits.extend_from_slice(&[1, 0, 1, 1, 0, 0, 1]);
        assert_eq!(unframe(&bits, true).unwrap(), b"hello");

        let mut bits = frame(b"hello", false);
        bits.extend_from_slice(&[0; 40]);
        assert_eq!(unframe(&bits, false).unwrap(), b"hello");
    }

    #[test]
    fn test_empty_message() {
        let bits = frame(b"", true);
        assert_eq!(bits.len(), 48);
        assert_eq!(unframe(&bits, true).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_truncated_header() {
        let result = unframe(&[0; 20], true);
        assert!(matches!(result, Err(FrameError::Truncated { available_bits: 20, .. })));
    }

    #[test]
    fn test_truncated_payload() {
        let bits = frame(b"toolong", true);
        let result = unframe(&bits[..bits.len() - 9], true);
        assert_eq!(
            result,
            Err(FrameError::Truncated {
                declared_bits: 32 + 56 + 16,
                available_bits: 32 + 56 + 16 - 9,
            })
        );
    }

    #[test]
    fn test_flipped_bit_is_corrupt() {
        let mut bits = frame(b"secret", true);
        bits[40] ^= 1;
        assert!(matches!(unframe(&bits, true), Err(FrameError::Corrupt { .. })));
    }

    #[test]
    fn test_all_zero_bits_are_corrupt() {
        let bits = vec![0u8; 128];
        assert_eq!(
            unframe(&bits, true),
            Err(FrameError::Corrupt {
                expected: 0,
                computed: 0x84C0
            })
        );
    }
}
