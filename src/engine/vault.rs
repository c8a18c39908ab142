use aes_gcm::{
    aead::{rand_core::RngCore, Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Error, Result};

/// PBKDF2 rounds used to stretch the passphrase.
pub const KDF_ITERATIONS: u32 = 100_000;
pub const KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 16;
/// 96-bit GCM nonce.
pub const IV_LEN: usize = 12;

/// Fixed salt from the first release. Only used when explicitly requested, since a
/// shared salt lets one precomputed dictionary attack every installation.
pub const LEGACY_SALT: &[u8] = b"KairOS_Fixed_Salt_MVP_2024";

/// A 256-bit AES key. Wiped from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// A fresh random key, mostly useful in tests.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.0).map_err(|e| Error::Internal(e.to_string()))
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Output of [`encrypt`]: base64 ciphertext (with GCM tag) and base64 IV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub cipher_text: String,
    pub iv: String,
}

/// Derives a 256-bit key from a passphrase with PBKDF2-HMAC-SHA256.
pub fn derive_key(passphrase: &str, salt: &[u8]) -> Result<MasterKey> {
    if passphrase.is_empty() {
        return Err(Error::InvalidPassphrase);
    }
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, KDF_ITERATIONS, &mut key);
    let master = MasterKey(key);
    key.zeroize();
    Ok(master)
}

/// Returns a random per-installation salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Encrypts bytes with AES-256-GCM under a fresh random IV.
pub fn encrypt(plaintext: &[u8], key: &MasterKey) -> Result<Sealed> {
    let cipher = key.cipher()?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| Error::Internal(e.to_string()))?;

    Ok(Sealed {
        cipher_text: BASE64.encode(ciphertext),
        iv: BASE64.encode(nonce),
    })
}

/// Decrypts the output of [`encrypt`].
///
/// Any mismatch between key, IV and ciphertext, as well as malformed base64 or a
/// wrong IV length, is reported as [`Error::DecryptionFailure`].
pub fn decrypt(cipher_text: &str, iv: &str, key: &MasterKey) -> Result<Vec<u8>> {
    let iv = BASE64
        .decode(iv)
        .map_err(|e| Error::DecryptionFailure(format!("bad iv encoding: {}", e)))?;
    if iv.len() != IV_LEN {
        return Err(Error::DecryptionFailure(format!("iv must be {} bytes, got {}", IV_LEN, iv.len())));
    }
    let ciphertext = BASE64
        .decode(cipher_text)
        .map_err(|e| Error::DecryptionFailure(format!("bad ciphertext encoding: {}", e)))?;

    key.cipher()?
        .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
        .map_err(|_| Error::DecryptionFailure("wrong key or tampered data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = MasterKey::generate();
        let plaintext = b"Hello, Kairos!";
        let sealed = encrypt(plaintext, &key).unwrap();
        assert_ne!(sealed.cipher_text.as_bytes(), plaintext);
        assert_eq!(decrypt(&sealed.cipher_text, &sealed.iv, &key).unwrap(), plaintext);
    }

    #[test]
    fn test_decrypt_with_wrong_key() {
        let sealed = encrypt(b"Secret message", &MasterKey::generate()).unwrap();
        let res = decrypt(&sealed.cipher_text, &sealed.iv, &MasterKey::generate());
        assert!(matches!(res, Err(Error::DecryptionFailure(_))));
    }

    #[test]
    fn test_fresh_iv_per_encryption() {
        let key = MasterKey::generate();
        let a = encrypt(b"same", &key).unwrap();
        let b = encrypt(b"same", &key).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.cipher_text, b.cipher_text);
        assert_eq!(BASE64.decode(&a.iv).unwrap().len(), IV_LEN);
    }

    #[test]
    fn test_corrupted_iv_fails() {
        let key = MasterKey::generate();
        let sealed = encrypt(b"data", &key).unwrap();

        assert!(matches!(decrypt(&sealed.cipher_text, "!!!", &key), Err(Error::DecryptionFailure(_))));
        assert!(matches!(decrypt(&sealed.cipher_text, "AAAA", &key), Err(Error::DecryptionFailure(_))));
        let other_iv = BASE64.encode([7u8; IV_LEN]);
        assert!(matches!(decrypt(&sealed.cipher_text, &other_iv, &key), Err(Error::DecryptionFailure(_))));
    }

    #[test]
    fn test_derive_key_is_deterministic_per_salt() {
        let salt = generate_salt();
        let a = derive_key("correct horse", &salt).unwrap();
        let b = derive_key("correct horse", &salt).unwrap();
        let c = derive_key("correct horse", LEGACY_SALT).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(matches!(derive_key("", LEGACY_SALT), Err(Error::InvalidPassphrase)));
    }
}
