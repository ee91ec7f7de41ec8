// src/crypto/encrypt.rs
use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockCipher, BlockEncryptMut, KeyIvInit};

use super::key::KeyMaterial;
use crate::aliases::CipherIv16;
use crate::error::CryptoError;

/// Encrypt plaintext → raw CBC ciphertext (PKCS#7 padded, in-memory)
pub fn encrypt_to_vec(
    key: &KeyMaterial,
    iv: &CipherIv16,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let iv = iv.expose_secret();
    match key {
        KeyMaterial::Aes128(k) => encrypt_with::<Aes128>(k.expose_secret(), iv, plaintext),
        KeyMaterial::Aes192(k) => encrypt_with::<Aes192>(k.expose_secret(), iv, plaintext),
        KeyMaterial::Aes256(k) => encrypt_with::<Aes256>(k.expose_secret(), iv, plaintext),
    }
}

fn encrypt_with<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    C: BlockEncryptMut + BlockCipher,
    cbc::Encryptor<C>: KeyIvInit + BlockEncryptMut,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}
