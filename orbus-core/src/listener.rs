//! Load/store hooks that decide where key store bytes live.
//!
//! A listener answers `load_request`/`store_request` by moving bytes between
//! its medium and the store through the provided `load_keys`/`store_keys`
//! completions. Overriding only the requests keeps the default encoding.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::key_store::{KeyStore, KeyStoreError};

/// Directory under `$HOME` holding default key stores.
pub const DEFAULT_KEYSTORE_DIR: &str = ".orbus_keystore";

pub trait KeyStoreListener: Send + Sync {
    /// Called when the store must be loaded. Must call [`Self::load_keys`]
    /// (even for an empty medium) before returning `Ok`.
    fn load_request(&self, store: &KeyStore) -> Result<(), KeyStoreError>;

    /// Read keys from `source`, decrypting with `password`.
    fn load_keys(&self, store: &KeyStore, source: &[u8], password: &str) -> Result<(), KeyStoreError> {
        store.load_from(source, password)
    }

    /// Called when a modified store must be persisted. Must call
    /// [`Self::store_keys`] before returning `Ok`.
    fn store_request(&self, store: &KeyStore) -> Result<(), KeyStoreError>;

    /// Write the encrypted store into `sink`, replacing its contents.
    /// `sink` keeps its previous contents if encoding fails.
    fn store_keys(&self, store: &KeyStore, sink: &mut Vec<u8>) -> Result<(), KeyStoreError> {
        let mut sealed = Vec::new();
        store.store_to(&mut sealed)?;
        *sink = sealed;
        Ok(())
    }
}

/// File-backed listener. Unless overridden the password is the file path.
#[derive(Debug, Clone)]
pub struct DefaultKeyStoreListener {
    path: PathBuf,
    password: Option<String>,
}

impl DefaultKeyStoreListener {
    /// Store at `$HOME/.orbus_keystore/<application>`.
    pub fn new(application: &str) -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::with_path(home.join(DEFAULT_KEYSTORE_DIR).join(application))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn password(&self) -> String {
        self.password
            .clone()
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

impl KeyStoreListener for DefaultKeyStoreListener {
    fn load_request(&self, store: &KeyStore) -> Result<(), KeyStoreError> {
        let password = self.password();
        match fs::read(&self.path) {
            Ok(bytes) => {
                self.load_keys(store, &bytes, &password)?;
                tracing::debug!(path = %self.path.display(), "read key store");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                write_private(&self.path, &[]).map_err(|e| {
                    tracing::warn!(path = %self.path.display(), error = %e, "cannot initialize key store");
                    e
                })?;
                self.load_keys(store, &[], &password)?;
                tracing::debug!(path = %self.path.display(), "initialized key store");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read key store");
                Err(e.into())
            }
        }
    }

    fn store_request(&self, store: &KeyStore) -> Result<(), KeyStoreError> {
        let mut sink = Vec::new();
        self.store_keys(store, &mut sink)?;
        write_private(&self.path, &sink).map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot write key store");
            e
        })?;
        tracing::debug!(path = %self.path.display(), "wrote key store");
        Ok(())
    }
}

/// Replace `path` with `bytes` via a sibling temp file, owner-only on unix.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}
