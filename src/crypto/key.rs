// src/crypto/key.rs
//! Key and IV material for the column cipher
//!
//! Secrets arrive as config strings. By default the string's UTF-8 bytes are
//! the key, matching how existing deployments configured it; `hex:` and
//! `base64:` prefixes allow binary keys.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::aliases::{AesKey16, AesKey24, AesKey32, CipherIv16, SecretBytes};
use crate::consts::{AES_BLOCK_LEN, BASE64_SECRET_PREFIX, HEX_SECRET_PREFIX};
use crate::error::CryptoError;

/// AES key, sized by the configured secret
pub enum KeyMaterial {
    Aes128(AesKey16),
    Aes192(AesKey24),
    Aes256(AesKey32),
}

impl KeyMaterial {
    /// Pick the AES variant from the key length (16/24/32 bytes)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let len = bytes.len();
        let invalid = |_| CryptoError::InvalidKeyLength(len);
        match len {
            16 => <[u8; 16]>::try_from(bytes)
                .map(|k| Self::Aes128(AesKey16::new(k)))
                .map_err(invalid),
            24 => <[u8; 24]>::try_from(bytes)
                .map(|k| Self::Aes192(AesKey24::new(k)))
                .map_err(invalid),
            32 => <[u8; 32]>::try_from(bytes)
                .map(|k| Self::Aes256(AesKey32::new(k)))
                .map_err(invalid),
            _ => Err(CryptoError::InvalidKeyLength(len)),
        }
    }

    /// Decode a config string and size it
    pub fn parse(secret: &str) -> Result<Self, CryptoError> {
        let bytes = decode_secret(secret)?;
        Self::from_bytes(bytes.expose_secret())
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Aes128(k) => k.expose_secret(),
            Self::Aes192(k) => k.expose_secret(),
            Self::Aes256(k) => k.expose_secret(),
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Aes128(_) => "AES-128-CBC",
            Self::Aes192(_) => "AES-192-CBC",
            Self::Aes256(_) => "AES-256-CBC",
        }
    }
}

/// Build the fixed IV from raw bytes
pub fn iv_from_bytes(bytes: &[u8]) -> Result<CipherIv16, CryptoError> {
    <[u8; AES_BLOCK_LEN]>::try_from(bytes)
        .map(CipherIv16::new)
        .map_err(|_| CryptoError::InvalidIvLength(bytes.len()))
}

/// Decode an IV config string
pub fn parse_iv(secret: &str) -> Result<CipherIv16, CryptoError> {
    let bytes = decode_secret(secret)?;
    iv_from_bytes(bytes.expose_secret())
}

/// Strip the optional encoding prefix and return the raw secret bytes
pub fn decode_secret(secret: &str) -> Result<SecretBytes, CryptoError> {
    let bytes = if let Some(rest) = secret.strip_prefix(HEX_SECRET_PREFIX) {
        hex::decode(rest.trim()).map_err(|e| CryptoError::KeyEncoding(e.to_string()))?
    } else if let Some(rest) = secret.strip_prefix(BASE64_SECRET_PREFIX) {
        STANDARD
            .decode(rest.trim())
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?
    } else {
        secret.as_bytes().to_vec()
    };
    Ok(SecretBytes::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_length_selects_variant() {
        assert_eq!(
            KeyMaterial::parse("0123456789abcdef").unwrap().algorithm(),
            "AES-128-CBC"
        );
        assert_eq!(
            KeyMaterial::parse("0123456789abcdef01234567")
                .unwrap()
                .algorithm(),
            "AES-192-CBC"
        );
        assert_eq!(
            KeyMaterial::parse("0123456789abcdef0123456789abcdef")
                .unwrap()
                .algorithm(),
            "AES-256-CBC"
        );
    }

    #[test]
    fn rejects_odd_key_lengths() {
        assert!(matches!(
            KeyMaterial::parse("too-short"),
            Err(CryptoError::InvalidKeyLength(9))
        ));
    }

    #[test]
    fn hex_and_base64_prefixes_decode() {
        let hex_key = format!("hex:{}", "11".repeat(32));
        let key = KeyMaterial::parse(&hex_key).unwrap();
        assert_eq!(key.as_bytes(), [0x11u8; 32].as_slice());

        let b64_iv = format!("base64:{}", STANDARD.encode([7u8; 16]));
        let iv = parse_iv(&b64_iv).unwrap();
        assert_eq!(iv.expose_secret(), &[7u8; 16]);
    }

    #[test]
    fn bad_hex_is_an_encoding_error() {
        assert!(matches!(
            KeyMaterial::parse("hex:zz"),
            Err(CryptoError::KeyEncoding(_))
        ));
    }

    #[test]
    fn iv_must_be_one_block() {
        assert!(matches!(
            parse_iv("short-iv"),
            Err(CryptoError::InvalidIvLength(8))
        ));
    }
}
