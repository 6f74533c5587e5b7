//! Persisted key store format.
//!
//! version (2 bytes LE) | store GUID (16) | nonce (12) | length (4 bytes LE) | ciphertext
//!
//! The ciphertext is ChaCha20-Poly1305 over the bincode-encoded key map, with
//! version and GUID bound as associated data.

use std::collections::BTreeMap;

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::guid::{Guid128, GUID_SIZE};
use crate::key_blob::KeyBlob;

/// Current key store format version.
pub const KEY_STORE_VERSION: u16 = 0x0201;

const VERSION_SIZE: usize = 2;
const NONCE_SIZE: usize = 12;
const LEN_SIZE: usize = 4;
const HEADER_SIZE: usize = VERSION_SIZE + GUID_SIZE;
const TAG_SIZE: u64 = 16;
const MAX_CIPHERTEXT_LEN: u32 = 64_000;

/// Keys indexed by the peer (or bus) they belong to.
pub type KeyMap = BTreeMap<Guid128, KeyBlob>;

/// Symmetric key protecting a persisted store.
pub type StoreKey = Zeroizing<[u8; 32]>;

/// Derive the store key from the password and the store's GUID.
pub fn derive_store_key(password: &str, guid: &Guid128) -> StoreKey {
    let mut hasher = Sha256::new();
    hasher.update(b"orbus-keystore-v1");
    hasher.update(password.as_bytes());
    hasher.update(guid.hex_str().as_bytes());
    Zeroizing::new(hasher.finalize().into())
}

/// Header of a persisted store, readable before the store key is known.
#[derive(Debug)]
pub struct Envelope<'a> {
    pub guid: Guid128,
    header: &'a [u8],
    nonce: &'a [u8],
    ciphertext: &'a [u8],
}

/// Split a persisted blob into its parts. Authenticity is not checked yet.
pub fn open_envelope(bytes: &[u8]) -> Result<Envelope<'_>, CodecError> {
    if bytes.len() < VERSION_SIZE {
        return Err(CodecError::Truncated);
    }
    let version = u16::from_le_bytes([bytes[0], bytes[1]]);
    if version != KEY_STORE_VERSION {
        return Err(CodecError::VersionMismatch {
            expected: KEY_STORE_VERSION,
            found: version,
        });
    }
    if bytes.len() < HEADER_SIZE + NONCE_SIZE + LEN_SIZE {
        return Err(CodecError::Truncated);
    }
    let mut guid = [0u8; GUID_SIZE];
    guid.copy_from_slice(&bytes[VERSION_SIZE..HEADER_SIZE]);
    let nonce = &bytes[HEADER_SIZE..HEADER_SIZE + NONCE_SIZE];
    let len_at = HEADER_SIZE + NONCE_SIZE;
    let len = u32::from_le_bytes([
        bytes[len_at],
        bytes[len_at + 1],
        bytes[len_at + 2],
        bytes[len_at + 3],
    ]);
    if len > MAX_CIPHERTEXT_LEN {
        return Err(CodecError::TooLarge);
    }
    let body = &bytes[len_at + LEN_SIZE..];
    if body.len() != len as usize {
        return Err(CodecError::Truncated);
    }
    Ok(Envelope {
        guid: Guid128::from_bytes(guid),
        header: &bytes[..HEADER_SIZE],
        nonce,
        ciphertext: body,
    })
}

impl Envelope<'_> {
    /// Decrypt and decode the key map.
    pub fn decrypt(&self, key: &StoreKey) -> Result<KeyMap, CodecError> {
        let cipher = ChaCha20Poly1305::new_from_slice(key.as_slice())
            .map_err(|_| CodecError::Key)?;
        let plain = cipher
            .decrypt(
                Nonce::from_slice(self.nonce),
                Payload {
                    msg: self.ciphertext,
                    aad: self.header,
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| CodecError::Decrypt)?;
        bincode::deserialize(&plain).map_err(CodecError::Decode)
    }
}

/// Fail with [`CodecError::TooLarge`] if `keys` would not fit in one persisted store.
pub fn check_size(keys: &KeyMap) -> Result<(), CodecError> {
    let plain = bincode::serialized_size(keys).map_err(CodecError::Encode)?;
    if plain + TAG_SIZE > u64::from(MAX_CIPHERTEXT_LEN) {
        return Err(CodecError::TooLarge);
    }
    Ok(())
}

/// Encode and encrypt `keys` for the store named by `guid`.
pub fn seal(guid: &Guid128, key: &StoreKey, keys: &KeyMap) -> Result<Vec<u8>, CodecError> {
    let plain = Zeroizing::new(bincode::serialize(keys).map_err(CodecError::Encode)?);
    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(&KEY_STORE_VERSION.to_le_bytes());
    header.extend_from_slice(guid.as_bytes());

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    let cipher = ChaCha20Poly1305::new_from_slice(key.as_slice())
        .map_err(|_| CodecError::Key)?;
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plain.as_slice(),
                aad: &header,
            },
        )
        .map_err(|_| CodecError::Encrypt)?;
    let len = u32::try_from(ciphertext.len())
        .ok()
        .filter(|len| *len <= MAX_CIPHERTEXT_LEN)
        .ok_or(CodecError::TooLarge)?;

    let mut out = Vec::with_capacity(HEADER_SIZE + NONCE_SIZE + LEN_SIZE + ciphertext.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Error encoding or decoding a persisted key store.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("key store version mismatch: expected {expected:#06x}, found {found:#06x}")]
    VersionMismatch { expected: u16, found: u16 },
    #[error("key store is truncated")]
    Truncated,
    #[error("key store too large")]
    TooLarge,
    #[error("invalid store key")]
    Key,
    #[error("key store encryption failed")]
    Encrypt,
    #[error("key store decryption failed (wrong password or corrupt data)")]
    Decrypt,
    #[error("encode error: {0}")]
    Encode(#[source] bincode::Error),
    #[error("decode error: {0}")]
    Decode(#[source] bincode::Error),
}
