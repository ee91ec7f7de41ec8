// src/crypto/mod.rs
//! Column cipher: deterministic AES-CBC over single string values
//!
//! One key and one IV serve the whole process, so equal plaintexts always
//! produce equal ciphertexts. Output is standard base64 and fits any TEXT
//! column without escaping.

mod decrypt;
mod encrypt;
mod key;

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::aliases::CipherIv16;
use crate::consts::{AES_BLOCK_LEN, KEY_FINGERPRINT_LEN};
use crate::error::CryptoError;

pub use decrypt::decrypt_to_vec;
pub use encrypt::encrypt_to_vec;
pub use key::{decode_secret, iv_from_bytes, parse_iv, KeyMaterial};

pub struct ColumnCipher {
    key: KeyMaterial,
    iv: CipherIv16,
}

impl ColumnCipher {
    pub fn new(key: KeyMaterial, iv: CipherIv16) -> Self {
        Self { key, iv }
    }

    /// Build from config strings (raw UTF-8, or `hex:` / `base64:` prefixed)
    pub fn from_secrets(key: &str, iv: &str) -> Result<Self, CryptoError> {
        Ok(Self::new(KeyMaterial::parse(key)?, parse_iv(iv)?))
    }

    pub fn algorithm(&self) -> &'static str {
        self.key.algorithm()
    }

    /// Encrypt one value → base64 ciphertext
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let raw = encrypt_to_vec(&self.key, &self.iv, plaintext.as_bytes())?;
        Ok(STANDARD.encode(raw))
    }

    /// Decrypt base64 ciphertext → original string
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let raw = STANDARD.decode(ciphertext.trim())?;
        let plain = decrypt_to_vec(&self.key, &self.iv, &raw)?;
        Ok(String::from_utf8(plain)?)
    }

    /// True when `candidate` is exactly what `encrypt` would have produced
    /// for some string under this key and IV.
    pub fn is_ciphertext(&self, candidate: &str) -> bool {
        // base64 of whole AES blocks is always a multiple of 4 chars
        if candidate.is_empty() || candidate.len() % 4 != 0 {
            return false;
        }
        match STANDARD.decode(candidate) {
            Ok(raw) if !raw.is_empty() && raw.len() % AES_BLOCK_LEN == 0 => {}
            _ => return false,
        }
        match self.decrypt(candidate) {
            Ok(plain) => self
                .encrypt(&plain)
                .map(|again| again == candidate)
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Short hex digest identifying the key + IV pair without revealing it
    pub fn key_fingerprint(&self) -> String {
        let digest = Sha256::new()
            .chain_update(self.key.as_bytes())
            .chain_update(self.iv.expose_secret())
            .finalize();
        hex::encode(&digest[..KEY_FINGERPRINT_LEN])
    }
}

impl fmt::Debug for ColumnCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnCipher")
            .field("algorithm", &self.algorithm())
            .field("fingerprint", &self.key_fingerprint())
            .finish()
    }
}
