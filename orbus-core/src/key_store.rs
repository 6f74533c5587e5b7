//! In-memory key store with a pluggable load/store protocol.
//!
//! State machine: `Unloaded -> LoadRequested -> Loaded <-> Dirty -> StoreRequested -> Loaded`.
//! Keys can only be read or written in `Loaded` and `Dirty`. Persistence is
//! delegated to a [`KeyStoreListener`]; the store never flushes on its own.

use std::io::{Read, Write};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use zeroize::Zeroizing;

use crate::codec::{self, CodecError, KeyMap, StoreKey};
use crate::guid::Guid128;
use crate::key_blob::KeyBlob;
use crate::listener::{DefaultKeyStoreListener, KeyStoreListener};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStoreState {
    Unloaded,
    LoadRequested,
    Loaded,
    Dirty,
    StoreRequested,
}

struct Inner {
    state: KeyStoreState,
    keys: KeyMap,
    guid: Guid128,
    store_key: Option<StoreKey>,
    /// Bumped on every in-memory mutation.
    generation: u64,
    /// Set by the store completion while a store request is in flight.
    store_completed: bool,
}

impl Inner {
    fn readable(&self) -> Result<(), KeyStoreError> {
        match self.state {
            KeyStoreState::Loaded | KeyStoreState::Dirty => Ok(()),
            KeyStoreState::StoreRequested => Err(KeyStoreError::RequestPending),
            KeyStoreState::Unloaded | KeyStoreState::LoadRequested => Err(KeyStoreError::NotLoaded),
        }
    }

    fn touch(&mut self) {
        self.state = KeyStoreState::Dirty;
        self.generation += 1;
    }
}

/// Authentication keys known to a bus, indexed by peer GUID.
pub struct KeyStore {
    application: String,
    inner: Mutex<Inner>,
    listener: RwLock<Arc<dyn KeyStoreListener>>,
}

impl KeyStore {
    /// Key store persisted by the default file listener for `application`.
    pub fn new(application: &str) -> Self {
        Self::with_listener(application, Arc::new(DefaultKeyStoreListener::new(application)))
    }

    pub fn with_listener(application: &str, listener: Arc<dyn KeyStoreListener>) -> Self {
        Self {
            application: application.to_owned(),
            inner: Mutex::new(Inner {
                state: KeyStoreState::Unloaded,
                keys: KeyMap::new(),
                guid: Guid128::filled(0),
                store_key: None,
                generation: 0,
                store_completed: false,
            }),
            listener: RwLock::new(listener),
        }
    }

    /// Replace the listener that services load and store requests.
    pub fn set_listener(&self, listener: Arc<dyn KeyStoreListener>) {
        *self.listener.write() = listener;
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn state(&self) -> KeyStoreState {
        self.inner.lock().state
    }

    /// Ask the listener to load the store. No-op once loaded.
    pub fn load(&self) -> Result<(), KeyStoreError> {
        {
            let mut inner = self.inner.lock();
            match inner.state {
                KeyStoreState::Unloaded => inner.state = KeyStoreState::LoadRequested,
                KeyStoreState::LoadRequested => return Err(KeyStoreError::RequestPending),
                _ => return Ok(()),
            }
        }
        self.run_load_request()
    }

    /// Drop all in-memory keys and load again through the listener.
    pub fn reload(&self) -> Result<(), KeyStoreError> {
        {
            let mut inner = self.inner.lock();
            inner.readable()?;
            inner.keys.clear();
            inner.store_key = None;
            inner.generation += 1;
            inner.state = KeyStoreState::LoadRequested;
        }
        self.run_load_request()
    }

    fn run_load_request(&self) -> Result<(), KeyStoreError> {
        let listener = self.listener.read().clone();
        let result = listener.load_request(self);
        let mut inner = self.inner.lock();
        let pending = inner.state == KeyStoreState::LoadRequested;
        if pending {
            inner.state = KeyStoreState::Unloaded;
        }
        match result {
            Ok(()) if pending => Err(KeyStoreError::LoadNotCompleted),
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(application = %self.application, error = %e, "key store load failed");
                Err(e)
            }
        }
    }

    /// Load completion: decrypt and parse a persisted store from `source`.
    ///
    /// An empty source is an uninitialized store; it gets a fresh GUID and
    /// starts `Dirty`. On any error the store stays unloaded.
    pub fn load_from<R: Read>(&self, mut source: R, password: &str) -> Result<(), KeyStoreError> {
        let mut bytes = Zeroizing::new(Vec::new());
        source.read_to_end(&mut bytes)?;

        let mut inner = self.inner.lock();
        match inner.state {
            KeyStoreState::Unloaded | KeyStoreState::LoadRequested => {}
            KeyStoreState::StoreRequested => return Err(KeyStoreError::RequestPending),
            KeyStoreState::Loaded | KeyStoreState::Dirty => return Err(KeyStoreError::AlreadyLoaded),
        }

        if bytes.is_empty() {
            let guid = Guid128::generate();
            inner.store_key = Some(codec::derive_store_key(password, &guid));
            inner.keys.clear();
            tracing::debug!(guid = guid.short_str(), "initialized empty key store");
            inner.guid = guid;
            inner.touch();
            return Ok(());
        }

        let envelope = codec::open_envelope(&bytes)?;
        let store_key = codec::derive_store_key(password, &envelope.guid);
        let mut keys = envelope.decrypt(&store_key).map_err(|e| match e {
            CodecError::Decrypt => KeyStoreError::Decrypt,
            other => KeyStoreError::Codec(other),
        })?;
        let evicted = evict_expired(&mut keys);

        tracing::debug!(
            guid = envelope.guid.short_str(),
            keys = keys.len(),
            evicted,
            "loaded key store"
        );
        inner.guid = envelope.guid;
        inner.keys = keys;
        inner.store_key = Some(store_key);
        if evicted > 0 {
            inner.touch();
        } else {
            inner.state = KeyStoreState::Loaded;
        }
        Ok(())
    }

    /// Ask the listener to persist the store if it has been modified.
    pub fn store(&self) -> Result<(), KeyStoreError> {
        {
            let mut inner = self.inner.lock();
            match inner.state {
                KeyStoreState::Unloaded | KeyStoreState::LoadRequested => {
                    return Err(KeyStoreError::NotLoaded)
                }
                KeyStoreState::StoreRequested => return Err(KeyStoreError::RequestPending),
                KeyStoreState::Loaded => return Ok(()),
                KeyStoreState::Dirty => {
                    inner.state = KeyStoreState::StoreRequested;
                    inner.store_completed = false;
                }
            }
        }

        let listener = self.listener.read().clone();
        let result = listener.store_request(self);
        let mut inner = self.inner.lock();
        // Mutations are refused while the request is in flight, so a completed
        // store covers every key in memory.
        let completed = inner.store_completed;
        inner.state = if result.is_ok() && completed {
            KeyStoreState::Loaded
        } else {
            KeyStoreState::Dirty
        };
        match result {
            Ok(()) if completed => Ok(()),
            Ok(()) => Err(KeyStoreError::StoreNotCompleted),
            Err(e) => {
                tracing::warn!(application = %self.application, error = %e, "key store store failed");
                Err(e)
            }
        }
    }

    /// Store completion: encrypt the current keys and write them to `sink`.
    /// On failure the in-memory state is unchanged.
    pub fn store_to<W: Write>(&self, mut sink: W) -> Result<(), KeyStoreError> {
        let (bytes, generation) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if matches!(
                inner.state,
                KeyStoreState::Unloaded | KeyStoreState::LoadRequested
            ) {
                return Err(KeyStoreError::NotLoaded);
            }
            let store_key = inner.store_key.as_ref().ok_or(KeyStoreError::NotLoaded)?;
            if evict_expired(&mut inner.keys) > 0 {
                inner.generation += 1;
            }
            let bytes = codec::seal(&inner.guid, store_key, &inner.keys)?;
            (bytes, inner.generation)
        };

        sink.write_all(&bytes)?;
        sink.flush()?;

        let mut inner = self.inner.lock();
        if inner.generation == generation {
            match inner.state {
                KeyStoreState::Dirty => inner.state = KeyStoreState::Loaded,
                KeyStoreState::StoreRequested => inner.store_completed = true,
                _ => {}
            }
        }
        tracing::debug!(guid = inner.guid.short_str(), keys = inner.keys.len(), "stored key store");
        Ok(())
    }

    /// GUID of the bus instance that owns this store.
    pub fn guid(&self) -> Result<Guid128, KeyStoreError> {
        let inner = self.inner.lock();
        match inner.state {
            KeyStoreState::Unloaded | KeyStoreState::LoadRequested => Err(KeyStoreError::NotLoaded),
            _ => Ok(inner.guid.clone()),
        }
    }

    pub fn get_key(&self, guid: &Guid128) -> Result<KeyBlob, KeyStoreError> {
        let inner = self.inner.lock();
        inner.readable()?;
        tracing::trace!(guid = guid.short_str(), "get key");
        match inner.keys.get(guid) {
            Some(key) if key.has_expired() => Err(KeyStoreError::KeyExpired(guid.clone())),
            Some(key) => Ok(key.clone()),
            None => Err(KeyStoreError::KeyUnavailable(guid.clone())),
        }
    }

    pub fn has_key(&self, guid: &Guid128) -> bool {
        let inner = self.inner.lock();
        inner.readable().is_ok() && inner.keys.contains_key(guid)
    }

    /// Add or replace the key for `guid`. Marks the store dirty.
    ///
    /// Fails with [`CodecError::TooLarge`], leaving the keys unchanged, if the
    /// result could no longer be persisted.
    pub fn add_key(&self, guid: &Guid128, key: KeyBlob) -> Result<(), KeyStoreError> {
        let mut inner = self.inner.lock();
        inner.readable()?;
        tracing::trace!(guid = guid.short_str(), "add key");
        let previous = inner.keys.insert(guid.clone(), key);
        if let Err(e) = codec::check_size(&inner.keys) {
            match previous {
                Some(old) => inner.keys.insert(guid.clone(), old),
                None => inner.keys.remove(guid),
            };
            tracing::warn!(guid = guid.short_str(), keys = inner.keys.len(), "key store is full");
            return Err(e.into());
        }
        inner.touch();
        Ok(())
    }

    /// Remove the key for `guid`. Returns whether a key was present.
    pub fn del_key(&self, guid: &Guid128) -> Result<bool, KeyStoreError> {
        let mut inner = self.inner.lock();
        inner.readable()?;
        tracing::trace!(guid = guid.short_str(), "delete key");
        let removed = inner.keys.remove(guid).is_some();
        if removed {
            inner.touch();
        }
        Ok(removed)
    }

    /// Remove every key. Marks the store dirty.
    pub fn clear(&self) -> Result<(), KeyStoreError> {
        let mut inner = self.inner.lock();
        inner.readable()?;
        inner.keys.clear();
        inner.touch();
        Ok(())
    }

    pub fn key_count(&self) -> Result<usize, KeyStoreError> {
        let inner = self.inner.lock();
        inner.readable()?;
        Ok(inner.keys.len())
    }
}

fn evict_expired(keys: &mut KeyMap) -> usize {
    let before = keys.len();
    keys.retain(|guid, key| {
        let expired = key.has_expired();
        if expired {
            tracing::warn!(guid = guid.short_str(), "evicting expired key");
        }
        !expired
    });
    before - keys.len()
}

/// Error from the key store or its listener.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("key store is not loaded")]
    NotLoaded,
    #[error("a key store load or store request is in progress")]
    RequestPending,
    #[error("key store is already loaded")]
    AlreadyLoaded,
    #[error("load request returned without loading keys")]
    LoadNotCompleted,
    #[error("store request returned without storing keys")]
    StoreNotCompleted,
    #[error("key store decryption failed")]
    Decrypt,
    #[error("key store format error: {0}")]
    Codec(#[from] CodecError),
    #[error("key store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no key for {0}")]
    KeyUnavailable(Guid128),
    #[error("key for {0} has expired")]
    KeyExpired(Guid128),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_blob::KeyBlobType;
    use std::time::{Duration, SystemTime};

    /// Listener keeping the persisted blob in memory.
    #[derive(Default)]
    struct MemoryListener {
        blob: Mutex<Vec<u8>>,
        password: String,
        loads: Mutex<u32>,
    }

    impl MemoryListener {
        fn with_password(password: &str) -> Self {
            Self {
                password: password.to_owned(),
                ..Default::default()
            }
        }
    }

    impl KeyStoreListener for MemoryListener {
        fn load_request(&self, store: &KeyStore) -> Result<(), KeyStoreError> {
            *self.loads.lock() += 1;
            let blob = self.blob.lock().clone();
            self.load_keys(store, &blob, &self.password)
        }

        fn store_request(&self, store: &KeyStore) -> Result<(), KeyStoreError> {
            let mut sink = Vec::new();
            self.store_keys(store, &mut sink)?;
            *self.blob.lock() = sink;
            Ok(())
        }
    }

    /// Listener that forgets to call its completions.
    struct LazyListener;

    impl KeyStoreListener for LazyListener {
        fn load_request(&self, _: &KeyStore) -> Result<(), KeyStoreError> {
            Ok(())
        }

        fn store_request(&self, _: &KeyStore) -> Result<(), KeyStoreError> {
            Ok(())
        }
    }

    /// Listener whose medium rejects writes after serializing.
    struct BrokenSinkListener(MemoryListener);

    impl KeyStoreListener for BrokenSinkListener {
        fn load_request(&self, store: &KeyStore) -> Result<(), KeyStoreError> {
            self.0.load_request(store)
        }

        fn store_request(&self, store: &KeyStore) -> Result<(), KeyStoreError> {
            let mut sink = Vec::new();
            self.store_keys(store, &mut sink)?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "medium offline").into())
        }
    }

    fn peer_key() -> KeyBlob {
        KeyBlob::random(32, KeyBlobType::Generic)
    }

    #[test]
    fn empty_source_initializes_dirty_store() {
        let listener = Arc::new(MemoryListener::with_password("pw"));
        let store = KeyStore::with_listener("app", listener);
        assert_eq!(store.state(), KeyStoreState::Unloaded);
        store.load().unwrap();
        assert_eq!(store.state(), KeyStoreState::Dirty);
        assert_eq!(store.key_count().unwrap(), 0);
        assert_ne!(store.guid().unwrap(), Guid128::filled(0));
    }

    #[test]
    fn keys_survive_store_and_load() {
        let listener = Arc::new(MemoryListener::with_password("pw"));
        let store = KeyStore::with_listener("app", listener.clone());
        store.load().unwrap();
        let peer = Guid128::generate();
        let key = peer_key().with_tag("peer");
        store.add_key(&peer, key.clone()).unwrap();
        store.store().unwrap();
        assert_eq!(store.state(), KeyStoreState::Loaded);
        let guid = store.guid().unwrap();

        let again = KeyStore::with_listener("app", listener);
        again.load().unwrap();
        assert_eq!(again.state(), KeyStoreState::Loaded);
        assert_eq!(again.guid().unwrap(), guid);
        assert_eq!(again.get_key(&peer).unwrap(), key);
    }

    #[test]
    fn load_is_idempotent() {
        let listener = Arc::new(MemoryListener::with_password("pw"));
        let store = KeyStore::with_listener("app", listener.clone());
        store.load().unwrap();
        store.load().unwrap();
        assert_eq!(*listener.loads.lock(), 1);
    }

    #[test]
    fn store_before_load_is_rejected() {
        let store = KeyStore::with_listener("app", Arc::new(MemoryListener::default()));
        assert!(matches!(store.store(), Err(KeyStoreError::NotLoaded)));
        let mut sink = Vec::new();
        assert!(matches!(store.store_to(&mut sink), Err(KeyStoreError::NotLoaded)));
        assert!(sink.is_empty());
        assert_eq!(store.state(), KeyStoreState::Unloaded);
    }

    #[test]
    fn wrong_password_leaves_store_unloaded() {
        let writer = KeyStore::with_listener("app", Arc::new(MemoryListener::with_password("right")));
        writer.load().unwrap();
        let mut blob = Vec::new();
        writer.store_to(&mut blob).unwrap();

        let reader = KeyStore::with_listener("app", Arc::new(MemoryListener::default()));
        assert!(matches!(
            reader.load_from(blob.as_slice(), "wrong"),
            Err(KeyStoreError::Decrypt)
        ));
        assert_eq!(reader.state(), KeyStoreState::Unloaded);
        assert!(matches!(reader.guid(), Err(KeyStoreError::NotLoaded)));
        reader.load_from(blob.as_slice(), "right").unwrap();
        assert_eq!(reader.guid().unwrap(), writer.guid().unwrap());
    }

    #[test]
    fn corrupt_blob_is_a_codec_error() {
        let store = KeyStore::with_listener("app", Arc::new(MemoryListener::default()));
        let result = store.load_from(&[0x01, 0x01, 0x00][..], "pw");
        assert!(matches!(
            result,
            Err(KeyStoreError::Codec(CodecError::VersionMismatch { .. }))
        ));
        assert_eq!(store.state(), KeyStoreState::Unloaded);
    }

    #[test]
    fn listener_that_skips_completion_is_an_error() {
        let store = KeyStore::with_listener("app", Arc::new(LazyListener));
        assert!(matches!(store.load(), Err(KeyStoreError::LoadNotCompleted)));
        assert_eq!(store.state(), KeyStoreState::Unloaded);

        store.load_from(std::io::empty(), "pw").unwrap();
        assert!(matches!(store.store(), Err(KeyStoreError::StoreNotCompleted)));
        assert_eq!(store.state(), KeyStoreState::Dirty);
    }

    #[test]
    fn failed_store_request_stays_dirty() {
        let store = KeyStore::with_listener(
            "app",
            Arc::new(BrokenSinkListener(MemoryListener::with_password("pw"))),
        );
        store.load().unwrap();
        store.add_key(&Guid128::generate(), peer_key()).unwrap();
        assert!(matches!(store.store(), Err(KeyStoreError::Io(_))));
        assert_eq!(store.state(), KeyStoreState::Dirty);
        assert_eq!(store.key_count().unwrap(), 1);
    }

    #[test]
    fn unmodified_store_skips_listener() {
        let store = KeyStore::with_listener("app", Arc::new(MemoryListener::with_password("pw")));
        store.load().unwrap();
        store.store().unwrap();
        store.set_listener(Arc::new(LazyListener));
        store.store().unwrap();
        assert_eq!(store.state(), KeyStoreState::Loaded);
    }

    #[test]
    fn mutations_mark_dirty_without_persisting() {
        let listener = Arc::new(MemoryListener::with_password("pw"));
        let store = KeyStore::with_listener("app", listener.clone());
        store.load().unwrap();
        store.store().unwrap();
        let persisted = listener.blob.lock().clone();

        let peer = Guid128::generate();
        store.add_key(&peer, peer_key()).unwrap();
        assert_eq!(store.state(), KeyStoreState::Dirty);
        assert!(store.has_key(&peer));
        assert!(store.del_key(&peer).unwrap());
        assert!(!store.del_key(&peer).unwrap());
        store.clear().unwrap();
        assert_eq!(*listener.blob.lock(), persisted);
    }

    #[test]
    fn missing_and_expired_keys() {
        let store = KeyStore::with_listener("app", Arc::new(MemoryListener::with_password("pw")));
        store.load().unwrap();
        let peer = Guid128::generate();
        assert!(matches!(store.get_key(&peer), Err(KeyStoreError::KeyUnavailable(_))));

        let mut stale = peer_key();
        stale.set_expiration(SystemTime::now() - Duration::from_secs(60));
        store.add_key(&peer, stale).unwrap();
        assert!(matches!(store.get_key(&peer), Err(KeyStoreError::KeyExpired(_))));

        store.store().unwrap();
        assert!(!store.has_key(&peer));
    }

    #[test]
    fn reload_reads_persisted_state() {
        let listener = Arc::new(MemoryListener::with_password("pw"));
        let store = KeyStore::with_listener("app", listener.clone());
        assert!(matches!(store.reload(), Err(KeyStoreError::NotLoaded)));
        store.load().unwrap();
        let kept = Guid128::generate();
        store.add_key(&kept, peer_key()).unwrap();
        store.store().unwrap();

        let dropped = Guid128::generate();
        store.add_key(&dropped, peer_key()).unwrap();
        store.reload().unwrap();
        assert!(store.has_key(&kept));
        assert!(!store.has_key(&dropped));
        assert_eq!(*listener.loads.lock(), 2);
    }

    #[test]
    fn second_load_completion_is_rejected() {
        let writer = KeyStore::with_listener("app", Arc::new(MemoryListener::default()));
        writer.load_from(std::io::empty(), "pw").unwrap();
        let peer = Guid128::generate();
        writer.add_key(&peer, peer_key()).unwrap();
        let mut blob = Vec::new();
        writer.store_to(&mut blob).unwrap();

        let store = KeyStore::with_listener("app", Arc::new(MemoryListener::default()));
        store.load_from(std::io::empty(), "pw").unwrap();
        let guid = store.guid().unwrap();
        assert!(matches!(
            store.load_from(blob.as_slice(), "pw"),
            Err(KeyStoreError::AlreadyLoaded)
        ));
        assert_eq!(store.guid().unwrap(), guid);
        assert!(!store.has_key(&peer));
        assert_eq!(store.state(), KeyStoreState::Dirty);
    }

    #[test]
    fn add_key_refuses_to_outgrow_persisted_format() {
        let listener = Arc::new(MemoryListener::with_password("pw"));
        let store = KeyStore::with_listener("app", listener.clone());
        store.load().unwrap();
        let first = Guid128::generate();
        let first_key = KeyBlob::random(4096, KeyBlobType::Generic);
        store.add_key(&first, first_key.clone()).unwrap();

        let mut added = 1;
        let err = loop {
            match store.add_key(&Guid128::generate(), KeyBlob::random(4096, KeyBlobType::Generic)) {
                Ok(()) => added += 1,
                Err(e) => break e,
            }
            assert!(added < 64, "key store accepted more than it can persist");
        };
        assert!(matches!(err, KeyStoreError::Codec(CodecError::TooLarge)));
        assert_eq!(store.key_count().unwrap(), added);

        // Replacing a key with one that no longer fits keeps the old key.
        assert!(matches!(
            store.add_key(&first, KeyBlob::random(60_000, KeyBlobType::Generic)),
            Err(KeyStoreError::Codec(CodecError::TooLarge))
        ));
        assert_eq!(store.get_key(&first).unwrap(), first_key);

        store.store().unwrap();
        assert_eq!(store.state(), KeyStoreState::Loaded);
        let again = KeyStore::with_listener("app", listener);
        again.load().unwrap();
        assert_eq!(again.key_count().unwrap(), added);
    }

    #[test]
    fn unloaded_store_rejects_key_access() {
        let store = KeyStore::with_listener("app", Arc::new(MemoryListener::default()));
        let peer = Guid128::generate();
        assert!(matches!(store.add_key(&peer, peer_key()), Err(KeyStoreError::NotLoaded)));
        assert!(matches!(store.get_key(&peer), Err(KeyStoreError::NotLoaded)));
        assert!(!store.has_key(&peer));
        assert!(matches!(store.clear(), Err(KeyStoreError::NotLoaded)));
    }

    #[test]
    fn concurrent_mutation_and_flush() {
        let listener = Arc::new(MemoryListener::with_password("pw"));
        let store = Arc::new(KeyStore::with_listener("app", listener.clone()));
        store.load().unwrap();

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let peer = Guid128::generate();
                        loop {
                            match store.add_key(&peer, peer_key()) {
                                Ok(()) => break,
                                Err(KeyStoreError::RequestPending) => std::thread::yield_now(),
                                Err(e) => panic!("unexpected error: {e}"),
                            }
                        }
                        match store.store() {
                            Ok(()) | Err(KeyStoreError::RequestPending) => {}
                            Err(e) => panic!("unexpected error: {e}"),
                        }
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        while store.state() != KeyStoreState::Loaded {
            match store.store() {
                Ok(()) | Err(KeyStoreError::RequestPending) => std::thread::yield_now(),
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        let again = KeyStore::with_listener("app", listener);
        again.load().unwrap();
        assert_eq!(again.key_count().unwrap(), 100);
    }
}
