// src/crypto/decrypt.rs
use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockCipher, BlockDecryptMut, KeyIvInit};

use super::key::KeyMaterial;
use crate::aliases::CipherIv16;
use crate::consts::AES_BLOCK_LEN;
use crate::error::CryptoError;

/// Decrypt raw CBC ciphertext → plaintext bytes (in-memory)
pub fn decrypt_to_vec(
    key: &KeyMaterial,
    iv: &CipherIv16,
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_LEN != 0 {
        return Err(CryptoError::BlockLength(ciphertext.len()));
    }
    let iv = iv.expose_secret();
    match key {
        KeyMaterial::Aes128(k) => decrypt_with::<Aes128>(k.expose_secret(), iv, ciphertext),
        KeyMaterial::Aes192(k) => decrypt_with::<Aes192>(k.expose_secret(), iv, ciphertext),
        KeyMaterial::Aes256(k) => decrypt_with::<Aes256>(k.expose_secret(), iv, ciphertext),
    }
}

fn decrypt_with<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    C: BlockDecryptMut + BlockCipher,
    cbc::Decryptor<C>: KeyIvInit + BlockDecryptMut,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Padding)
}
