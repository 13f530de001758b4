use crc::{Crc, CRC_16_IBM_3740};
use sha2::{Digest, Sha256};

/// CRC-16/IBM-3740 (a.k.a. CCITT-FALSE) calculator.
const CRC_3740: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Compute CRC-16/IBM-3740 over a byte slice.
#[cfg(test)]
pub fn crc16(data: &[u8]) -> u16 {
    CRC_3740.checksum(data)
}

/// Compute the frame checksum: CRC over the length header followed by the payload.
pub fn frame_crc16(header: &[u8], payload: &[u8]) -> u16 {
    let mut digest = CRC_3740.digest();
    digest.update(header);
    digest.update(payload);
    digest.finalize()
}

/// SHA-256 digest type.
pub type Sha256Digest = [u8; 32];

/// Compute SHA-256 hash of a byte slice.
pub fn sha256(data: &[u8]) -> Sha256Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    digest
}

/// Lowercase hex rendering of a SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    sha256(data).iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_known_value() {
        // "123456789" has a well-known CRC-16/IBM-3740 checksum
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_crc16_of_zeroed_header_is_nonzero() {
        // A wiped payload reads back as all-zero bits; it must not self-validate.
        assert_eq!(crc16(&[0u8; 4]), 0x84C0);
    }

    #[test]
    fn test_frame_crc_matches_contiguous() {
        let header = [0x00, 0x00, 0x00, 0x02];
        let payload = b"hi";
        let mut joined = header.to_vec();
        joined.extend_from_slice(payload);
        assert_eq!(frame_crc16(&header, payload), crc16(&joined));
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
