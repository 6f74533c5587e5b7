//! Bus identity keys and peer master secrets.
//!
//! The bus keeps one X25519 keypair, persisted in its key store under the
//! store's own GUID. A master secret with a peer is derived from the shared
//! secret and both GUIDs, and is stored under the peer's GUID.

use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::guid::Guid128;
use crate::key_blob::{KeyBlob, KeyBlobType};

/// Tag on key blobs holding the bus's own X25519 secret.
pub const IDENTITY_TAG: &str = "x25519-identity";

/// Tag on key blobs holding a derived peer master secret.
pub const MASTER_SECRET_TAG: &str = "x25519";

/// X25519 public key (32 bytes).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        PublicKey(bytes)
    }
}

/// X25519 keypair of a bus instance.
pub struct Keypair {
    secret: StaticSecret,
    public: PublicKey,
}

impl Keypair {
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(OsRng))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let public = PublicKey(X25519PublicKey::from(&secret).to_bytes());
        Self { secret, public }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn shared_secret(&self, other_public: &PublicKey) -> Zeroizing<[u8; 32]> {
        let other = X25519PublicKey::from(other_public.0);
        Zeroizing::new(self.secret.diffie_hellman(&other).to_bytes())
    }

    /// Key blob suitable for `KeyStore::add_key` under the bus GUID.
    pub fn to_key_blob(&self) -> KeyBlob {
        let secret = Zeroizing::new(self.secret.to_bytes());
        KeyBlob::new(secret.to_vec(), KeyBlobType::Generic).with_tag(IDENTITY_TAG)
    }

    pub fn from_key_blob(blob: &KeyBlob) -> Result<Self, PeerKeyError> {
        if blob.blob_type() != KeyBlobType::Generic || blob.tag() != IDENTITY_TAG {
            return Err(PeerKeyError::NotIdentity);
        }
        let bytes: [u8; 32] = blob
            .as_bytes()
            .try_into()
            .map_err(|_| PeerKeyError::Length(blob.len()))?;
        Ok(Self::from_secret(StaticSecret::from(bytes)))
    }
}

/// Master secret shared with a peer. Both sides derive the same blob.
pub fn derive_master_secret(
    local: &Keypair,
    remote_public: &PublicKey,
    local_guid: &Guid128,
    peer_guid: &Guid128,
) -> KeyBlob {
    let shared = local.shared_secret(remote_public);
    let (first, second) = if local_guid <= peer_guid {
        (local_guid, peer_guid)
    } else {
        (peer_guid, local_guid)
    };
    let mut hasher = Sha256::new();
    hasher.update(b"orbus-master-secret-v1");
    hasher.update(shared.as_slice());
    hasher.update(first.as_bytes());
    hasher.update(second.as_bytes());
    let digest = Zeroizing::new(<[u8; 32]>::from(hasher.finalize()));
    KeyBlob::new(digest.to_vec(), KeyBlobType::Generic).with_tag(MASTER_SECRET_TAG)
}

#[derive(Debug, thiserror::Error)]
pub enum PeerKeyError {
    #[error("key blob is not a bus identity key")]
    NotIdentity,
    #[error("identity key must be 32 bytes, got {0}")]
    Length(usize),
}
