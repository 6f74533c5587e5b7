//! Key material held in the key store.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Longest tag kept on a key blob, in characters.
pub const MAX_TAG_LEN: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyBlobType {
    /// Opaque secret (e.g. a peer master secret).
    Generic,
    Aes,
    /// PKCS#8 encoded private key.
    Pkcs8,
    /// PEM encoded certificate.
    Pem,
}

/// A typed secret with an optional tag and expiration. Bytes are wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyBlob {
    data: Vec<u8>,
    #[zeroize(skip)]
    blob_type: KeyBlobType,
    tag: String,
    /// Seconds since the unix epoch.
    #[zeroize(skip)]
    expires_at: Option<u64>,
}

impl KeyBlob {
    pub fn new(data: impl Into<Vec<u8>>, blob_type: KeyBlobType) -> Self {
        Self {
            data: data.into(),
            blob_type,
            tag: String::new(),
            expires_at: None,
        }
    }

    /// `len` random bytes from the OS CSPRNG.
    pub fn random(len: usize, blob_type: KeyBlobType) -> Self {
        let mut data = vec![0u8; len];
        OsRng.fill_bytes(&mut data);
        Self::new(data, blob_type)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn blob_type(&self) -> KeyBlobType {
        self.blob_type
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Set the tag, keeping at most [`MAX_TAG_LEN`] characters.
    pub fn set_tag(&mut self, tag: &str) {
        self.tag = tag.chars().take(MAX_TAG_LEN).collect();
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.set_tag(tag);
        self
    }

    pub fn set_expiration(&mut self, expires: SystemTime) {
        let secs = expires
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        self.expires_at = Some(secs);
    }

    pub fn expiration(&self) -> Option<SystemTime> {
        self.expires_at
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs))
    }

    pub fn has_expired(&self) -> bool {
        self.expiration()
            .map_or(false, |at| at <= SystemTime::now())
    }
}

impl fmt::Debug for KeyBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBlob")
            .field("blob_type", &self.blob_type)
            .field("len", &self.data.len())
            .field("tag", &self.tag)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
