pub const MAGIC: u16 = 0x4B4C; // "KL"
pub const CODEC_VERSION: u8 = 1;

// Version marker layout. Frozen across codec versions so any decoder can
// read it before it knows which parameters the payload was written with.
pub const MARKER_BITS: usize = 32;
pub const MARKER_BLOCK_SIZE: usize = 8;
pub const MARKER_QUANT_STEP: f64 = 24.0;
pub const MARKER_COEFFICIENTS: [usize; 4] = [1, 2, 3, 4];
pub const MARKER_BLOCKS: usize = MARKER_BITS / MARKER_COEFFICIENTS.len();

// Version 1 payload parameters
pub const DEFAULT_BLOCK_SIZE: usize = 8;
pub const DEFAULT_QUANT_STEP: f64 = 16.0;
pub const DEFAULT_COEFFICIENTS: [usize; 4] = [5, 6, 7, 8];

// Frame layout
pub const LENGTH_PREFIX_BITS: usize = 32;
pub const CHECKSUM_BITS: usize = 16;

// Marker flag bits
pub const FLAG_CHECKSUM: u8 = 0x01;
pub const FLAG_ENCRYPTED: u8 = 0x02;
pub const FLAG_BLUE_CHANNEL: u8 = 0x04;

// Passphrase protection: [salt][nonce][ciphertext + tag]
pub const SALT_SIZE: usize = 16;
pub const NONCE_SIZE: usize = 24;
pub const AEAD_TAG_SIZE: usize = 16;
pub const ENCRYPTION_OVERHEAD: usize = SALT_SIZE + NONCE_SIZE + AEAD_TAG_SIZE;

// Argon2id parameters
pub const ARGON2_MEM_COST: u32 = 19_456; // 19 MiB
pub const ARGON2_TIME_COST: u32 = 2;
pub const ARGON2_PARALLELISM: u32 = 1;
pub const ARGON2_OUTPUT_LEN: usize = 32;

/// Number of bits a frame occupies for a message of `message_len` bytes.
pub fn frame_bits(message_len: usize, checksum: bool) -> usize {
    LENGTH_PREFIX_BITS + message_len * 8 + if checksum { CHECKSUM_BITS } else { 0 }
}

/// Which image plane carries the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelPolicy {
    /// Integer luma of colour images; the gray channel of grayscale images.
    #[default]
    Luma,
    /// Blue channel of colour images; the gray channel of grayscale images.
    Blue,
}

/// Version-tagged embedding parameters.
///
/// Changing any field changes where and how bits land in the image, so every
/// distinct set must carry its own `version`. Images written with one set can
/// only be read by a codec that knows that version.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecParams {
    pub version: u8,
    /// Edge length N of the square transform block.
    pub block_size: usize,
    /// Quantization step Q used by the parity rule.
    pub quant_step: f64,
    /// Zig-zag ordinals of the coefficients that carry bits, in embedding order.
    pub coefficients: Vec<usize>,
}

impl CodecParams {
    /// The built-in version 1 parameters.
    pub fn v1() -> Self {
        Self {
            version: CODEC_VERSION,
            block_size: DEFAULT_BLOCK_SIZE,
            quant_step: DEFAULT_QUANT_STEP,
            coefficients: DEFAULT_COEFFICIENTS.to_vec(),
        }
    }

    /// Parameters of every version this crate ships.
    pub fn builtin() -> Vec<CodecParams> {
        vec![Self::v1()]
    }

    pub fn bits_per_block(&self) -> usize {
        self.coefficients.len()
    }

    /// Check the parameters describe a usable embedding.
    ///
    /// `quant_step` must exceed `block_size`: pixel rounding moves a
    /// coefficient by at most N/2, which then stays below Q/2.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.block_size;
        if n < 2 {
            return Err(format!("block size must be at least 2, got {}", n));
        }
        if !self.quant_step.is_finite() || self.quant_step <= n as f64 {
            return Err(format!(
                "quantization step {} must be finite and greater than the block size {}",
                self.quant_step, n
            ));
        }
        if self.coefficients.is_empty() {
            return Err("at least one coefficient position is required".into());
        }
        let mut seen = vec![false; n * n];
        for &ordinal in &self.coefficients {
            if ordinal == 0 {
                return Err("the DC coefficient cannot carry payload".into());
            }
            if ordinal >= n * n {
                return Err(format!("coefficient ordinal {} out of range for {}x{} blocks", ordinal, n, n));
            }
            if seen[ordinal] {
                return Err(format!("coefficient ordinal {} listed twice", ordinal));
            }
            seen[ordinal] = true;
        }
        Ok(())
    }
}

impl Default for CodecParams {
    fn default() -> Self {
        Self::v1()
    }
}

/// Per-call options for encoding.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub channel: ChannelPolicy,
    /// Append a CRC-16 to the frame.
    pub checksum: bool,
    /// Encrypt the message with a key derived from this passphrase.
    pub password: Option<String>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            channel: ChannelPolicy::Luma,
            checksum: true,
            password: None,
        }
    }
}

/// Per-call options for decoding.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_is_valid() {
        assert!(CodecParams::v1().validate().is_ok());
        assert_eq!(CodecParams::v1().bits_per_block(), 4);
    }

    #[test]
    fn test_marker_fills_whole_blocks() {
        assert_eq!(MARKER_BLOCKS * MARKER_COEFFICIENTS.len(), MARKER_BITS);
        assert!(MARKER_QUANT_STEP > MARKER_BLOCK_SIZE as f64);
    }

    #[test]
    fn test_validate_rejects_bad_params() {
        let mut params = CodecParams::v1();
        params.coefficients = vec![0, 5];
        assert!(params.validate().is_err());

        let mut params = CodecParams::v1();
        params.coefficients = vec![5, 5];
        assert!(params.validate().is_err());

        let mut params = CodecParams::v1();
        params.coefficients = vec![64];
        assert!(params.validate().is_err());

        let mut params = CodecParams::v1();
        params.quant_step = 8.0;
        assert!(params.validate().is_err());

        let mut params = CodecParams::v1();
        params.block_size = 1;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_frame_bits() {
        assert_eq!(frame_bits(2, true), 64);
        assert_eq!(frame_bits(2, false), 48);
        assert_eq!(frame_bits(0, true), 48);
    }
}
