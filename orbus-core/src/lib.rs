//! Orbus message bus core.
//! Method dispatch, bus identifiers and the key store persistence protocol; no transport.

pub mod codec;
pub mod guid;
pub mod key_blob;
pub mod key_store;
pub mod listener;
pub mod map_key;
pub mod method_table;
pub mod peer_key;

pub use codec::{CodecError, KEY_STORE_VERSION};
pub use guid::Guid128;
pub use key_blob::{KeyBlob, KeyBlobType};
pub use key_store::{KeyStore, KeyStoreError, KeyStoreState};
pub use listener::{DefaultKeyStoreListener, KeyStoreListener};
pub use map_key::StringMapKey;
pub use method_table::{BusObject, InstallMethods, Member, MemberKind, MethodEntry, MethodTable};
pub use peer_key::{derive_master_secret, Keypair, PeerKeyError, PublicKey};
