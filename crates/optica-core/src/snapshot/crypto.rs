//! Passphrase sealing for the offline snapshot.
//!
//! Layout: `MAGIC || salt || nonce || ciphertext`. The key is derived from
//! the passphrase with Argon2id (default parameters) and the payload is
//! sealed with ChaCha20-Poly1305, so a wrong passphrase or a tampered file
//! fails to open.

use anyhow::{anyhow, bail, Result};
use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;

const MAGIC: &[u8; 8] = b"OPTSNAP1";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + SALT_LEN + NONCE_LEN;

pub fn is_sealed(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<[u8; KEY_LEN]> {
    let mut key = [0u8; KEY_LEN];
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow!("Failed to derive snapshot key: {}", e))?;
    Ok(key)
}

pub fn seal(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce);

    let key = derive_key(passphrase, &salt)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| anyhow!("Failed to seal snapshot: {}", e))?;

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

pub fn open(sealed: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    if !is_sealed(sealed) || sealed.len() < HEADER_LEN {
        bail!("Snapshot is not sealed or is truncated");
    }
    let salt = &sealed[MAGIC.len()..MAGIC.len() + SALT_LEN];
    let nonce = &sealed[MAGIC.len() + SALT_LEN..HEADER_LEN];
    let ciphertext = &sealed[HEADER_LEN..];

    let key = derive_key(passphrase, salt)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| anyhow!("Failed to open snapshot: wrong passphrase or corrupted file"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let sealed = seal(b"{\"products\":[]}", "olho-de-gato").unwrap();
        assert!(is_sealed(&sealed));
        assert_eq!(open(&sealed, "olho-de-gato").unwrap(), b"{\"products\":[]}");
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let sealed = seal(b"secret", "right").unwrap();
        assert!(open(&sealed, "wrong").is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let mut sealed = seal(b"secret", "pw").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        assert!(open(&sealed, "pw").is_err());
    }

    #[test]
    fn test_plain_json_is_not_sealed() {
        assert!(!is_sealed(b"{\"products\":[]}"));
        assert!(open(b"OPTSNAP1short", "pw").is_err());
    }
}
