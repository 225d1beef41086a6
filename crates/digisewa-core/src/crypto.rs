//! Document cipher unit
//!
//! Per-document AES-256-GCM encryption. Every uploaded document gets its own
//! random key, and every encrypt call generates a fresh random nonce; key and
//! nonce are stored base64-encoded on the document record and handed back to
//! the cipher at retrieval time. GCM authentication means truncated or
//! tampered ciphertext fails decryption instead of yielding garbage bytes.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};

use crate::AppError;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Base64-encoded 256-bit symmetric key. `Debug` redacts the material so the
/// record can be logged without leaking it.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey(String);

impl EncryptionKey {
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        EncryptionKey(encoded.into())
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }

    fn decode(&self) -> Result<Vec<u8>, AppError> {
        let bytes = general_purpose::STANDARD
            .decode(&self.0)
            .map_err(|e| AppError::Decryption(format!("Failed to decode key: {}", e)))?;
        if bytes.len() != KEY_LEN {
            return Err(AppError::Decryption(format!(
                "Key must be {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }
        Ok(bytes)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// Base64-encoded 96-bit GCM nonce, stored next to the key on the record.
#[derive(Clone, PartialEq, Eq)]
pub struct Iv(String);

impl Iv {
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        Iv(encoded.into())
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }

    fn decode(&self) -> Result<Vec<u8>, AppError> {
        let bytes = general_purpose::STANDARD
            .decode(&self.0)
            .map_err(|e| AppError::Decryption(format!("Failed to decode IV: {}", e)))?;
        if bytes.len() != NONCE_LEN {
            return Err(AppError::Decryption(format!(
                "IV must be {} bytes, got {}",
                NONCE_LEN,
                bytes.len()
            )));
        }
        Ok(bytes)
    }
}

impl std::fmt::Debug for Iv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Iv(<redacted>)")
    }
}

/// Stateless cipher unit for document custody.
#[derive(Clone, Default)]
pub struct DocumentCipher;

impl DocumentCipher {
    pub fn new() -> Self {
        DocumentCipher
    }

    /// Generate a fresh random 256-bit key for one document.
    pub fn generate_key(&self) -> EncryptionKey {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        EncryptionKey(general_purpose::STANDARD.encode(key))
    }

    /// Encrypt plaintext under the given key with a fresh random nonce.
    /// Returns the ciphertext (auth tag appended) and the nonce used.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        key: &EncryptionKey,
    ) -> Result<(Vec<u8>, Iv), AppError> {
        let key_bytes = key.decode()?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| AppError::Internal(format!("Encryption failed: {}", e)))?;

        Ok((ciphertext, Iv(general_purpose::STANDARD.encode(nonce))))
    }

    /// Decrypt ciphertext produced by `encrypt`. Fails with a `Decryption`
    /// error on malformed key/IV or when GCM tag verification rejects the
    /// ciphertext.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &EncryptionKey,
        iv: &Iv,
    ) -> Result<Vec<u8>, AppError> {
        let key_bytes = key.decode()?;
        let nonce_bytes = iv.decode()?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        let nonce = Nonce::from_slice(&nonce_bytes);

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| AppError::Decryption("Ciphertext rejected (tag mismatch)".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_round_trip() {
        let cipher = DocumentCipher::new();
        let key = cipher.generate_key();

        for plaintext in [
            b"".to_vec(),
            b"x".to_vec(),
            b"hello government".to_vec(),
            vec![0u8; 1024 * 1024],
        ] {
            let (ciphertext, iv) = cipher.encrypt(&plaintext, &key).unwrap();
            let decrypted = cipher.decrypt(&ciphertext, &key, &iv).unwrap();
            assert_eq!(decrypted, plaintext);
        }
    }

    #[test]
    fn test_iv_unique_across_calls() {
        let cipher = DocumentCipher::new();
        let key = cipher.generate_key();
        let plaintext = b"same plaintext every time";

        let mut seen = HashSet::new();
        for _ in 0..256 {
            let (_, iv) = cipher.encrypt(plaintext, &key).unwrap();
            assert!(
                seen.insert(iv.as_base64().to_string()),
                "nonce reused across encrypt calls"
            );
        }
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let cipher = DocumentCipher::new();
        let key = cipher.generate_key();
        let (mut ciphertext, iv) = cipher.encrypt(b"land ownership certificate", &key).unwrap();

        ciphertext[0] ^= 0x01;

        let err = cipher.decrypt(&ciphertext, &key, &iv).unwrap_err();
        assert!(matches!(err, AppError::Decryption(_)));
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let cipher = DocumentCipher::new();
        let key = cipher.generate_key();
        let (ciphertext, iv) = cipher.encrypt(b"trade license", &key).unwrap();

        let err = cipher
            .decrypt(&ciphertext[..ciphertext.len() - 4], &key, &iv)
            .unwrap_err();
        assert!(matches!(err, AppError::Decryption(_)));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let cipher = DocumentCipher::new();
        let key = cipher.generate_key();
        let other = cipher.generate_key();
        let (ciphertext, iv) = cipher.encrypt(b"birth certificate", &key).unwrap();

        let err = cipher.decrypt(&ciphertext, &other, &iv).unwrap_err();
        assert!(matches!(err, AppError::Decryption(_)));
    }

    #[test]
    fn test_malformed_key_material() {
        use base64::Engine;

        let cipher = DocumentCipher::new();
        let key = cipher.generate_key();
        let (ciphertext, iv) = cipher.encrypt(b"payload", &key).unwrap();

        let short_key = EncryptionKey::from_base64(
            base64::engine::general_purpose::STANDARD.encode(b"too-short"),
        );
        assert!(matches!(
            cipher.decrypt(&ciphertext, &short_key, &iv).unwrap_err(),
            AppError::Decryption(_)
        ));

        let bad_iv = Iv::from_base64("not!!base64");
        assert!(matches!(
            cipher.decrypt(&ciphertext, &key, &bad_iv).unwrap_err(),
            AppError::Decryption(_)
        ));
    }

    #[test]
    fn test_debug_redacts_material() {
        let cipher = DocumentCipher::new();
        let key = cipher.generate_key();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(key.as_base64()));
        assert!(debug.contains("redacted"));
    }
}
