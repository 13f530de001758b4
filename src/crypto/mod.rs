use argon2::Argon2;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use thiserror::Error;

use crate::config;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("encryption failed: {0}")]
    Encryption(String),
    #[error("decryption failed: {0}")]
    Decryption(String),
}

/// Fill a fixed-size array with cryptographically random bytes.
fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Derive a 32-byte key from a password and salt using Argon2id.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; config::SALT_SIZE],
) -> Result<[u8; config::ARGON2_OUTPUT_LEN], CryptoError> {
    let params = argon2::Params::new(
        config::ARGON2_MEM_COST,
        config::ARGON2_TIME_COST,
        config::ARGON2_PARALLELISM,
        Some(config::ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key = [0u8; config::ARGON2_OUTPUT_LEN];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(key)
}

/// Encrypt a message with XChaCha20-Poly1305 under a password.
/// Returns: [salt(16)] || [nonce(24)] || [ciphertext + tag]
pub fn seal(password: &str, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let salt: [u8; config::SALT_SIZE] = random_bytes();
    let nonce_bytes: [u8; config::NONCE_SIZE] = random_bytes();
    let mut key = derive_key(password.as_bytes(), &salt)?;

    let cipher = XChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(&key));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()));
    secure_zero(&mut key);
    let ciphertext = ciphertext?;

    let mut sealed = Vec::with_capacity(config::SALT_SIZE + config::NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt the output of [`seal`].
pub fn open(password: &str, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < config::ENCRYPTION_OVERHEAD {
        return Err(CryptoError::Decryption("data too short".into()));
    }

    let (salt, rest) = sealed.split_at(config::SALT_SIZE);
    let (nonce_bytes, ciphertext) = rest.split_at(config::NONCE_SIZE);
    let salt: &[u8; config::SALT_SIZE] = salt
        .try_into()
        .map_err(|_| CryptoError::Decryption("invalid salt".into()))?;

    let mut key = derive_key(password.as_bytes(), salt)?;
    let cipher = XChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(&key));
    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| CryptoError::Decryption(e.to_string()));
    secure_zero(&mut key);
    plaintext
}

/// Securely zero a key buffer.
pub fn secure_zero(buf: &mut [u8]) {
    for byte in buf.iter_mut() {
        unsafe {
            std::ptr::write_volatile(byte, 0);
        }
    }
    std::sync::atomic::fence(std::sync::atomic::Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation() {
        let salt = [7u8; config::SALT_SIZE];
        let key1 = derive_key(b"password123", &salt).unwrap();
        let key2 = derive_key(b"password123", &salt).unwrap();
        assert_eq!(key1, key2);

        let key3 = derive_key(b"different", &salt).unwrap();
        assert_ne!(key1, key3);
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let plaintext = b"meet at noon";
        let sealed = seal("hunter2", plaintext).unwrap();
        assert_eq!(sealed.len(), plaintext.len() + config::ENCRYPTION_OVERHEAD);
        assert_eq!(open("hunter2", &sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_salt_and_nonce_are_fresh() {
        let a = seal("pw", b"same").unwrap();
        let b = seal("pw", b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_password_fails() {
        let sealed = seal("correct", b"secret data").unwrap();
        assert!(matches!(open("wrong", &sealed), Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_short_input_fails() {
        assert!(matches!(open("pw", &[0u8; 10]), Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_secure_zero() {
        let mut buf = [0xFFu8; 32];
        secure_zero(&mut buf);
        assert_eq!(buf, [0u8; 32]);
    }
}
