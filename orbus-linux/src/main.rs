// Orbus Linux host tool: bus identifiers and key store maintenance.

mod config;

use std::sync::Arc;

use anyhow::Context;
use orbus_core::{DefaultKeyStoreListener, Guid128, KeyStore, KeyStoreError, Keypair};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "usage: orbus-linux [--version] <guid | keystore [clear]>";

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("orbus-linux {}", VERSION);
        return Ok(());
    }

    let cfg = config::load()?;
    tracing_subscriber::fmt().with_env_filter(log_filter(&cfg)?).init();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["guid"] => {
            let guid = Guid128::generate();
            println!("{} {}", guid, guid.short_str());
            Ok(())
        }
        ["keystore"] => show_keystore(&open_keystore(&cfg)?),
        ["keystore", "clear"] => {
            let store = open_keystore(&cfg)?;
            store.clear()?;
            store.store().context("flushing cleared key store")?;
            tracing::info!(application = %cfg.application, "key store cleared");
            Ok(())
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

fn log_filter(cfg: &config::Config) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_new(&cfg.log_filter)
        .with_context(|| format!("parsing log_filter {:?}", cfg.log_filter))
}

fn open_keystore(cfg: &config::Config) -> anyhow::Result<KeyStore> {
    let mut listener = match &cfg.keystore_path {
        Some(path) => DefaultKeyStoreListener::with_path(path),
        None => DefaultKeyStoreListener::new(&cfg.application),
    };
    if let Some(password) = &cfg.keystore_password {
        listener = listener.with_password(password.clone());
    }
    let path = listener.path().to_owned();
    let store = KeyStore::with_listener(&cfg.application, Arc::new(listener));
    store
        .load()
        .with_context(|| format!("loading key store {}", path.display()))?;
    Ok(store)
}

/// Print the store identity, creating the bus identity key on first use.
fn show_keystore(store: &KeyStore) -> anyhow::Result<()> {
    let guid = store.guid()?;
    let identity = match store.get_key(&guid) {
        Ok(blob) => Keypair::from_key_blob(&blob)?,
        Err(KeyStoreError::KeyUnavailable(_)) => {
            let keypair = Keypair::generate();
            store.add_key(&guid, keypair.to_key_blob())?;
            tracing::info!(guid = guid.short_str(), "created bus identity key");
            keypair
        }
        Err(e) => return Err(e.into()),
    };
    store.store().context("flushing key store")?;

    println!("application: {}", store.application());
    println!("guid:        {} ({})", guid, guid.short_str());
    println!("identity:    {}", hex::encode(identity.public_key().as_bytes()));
    println!("keys:        {}", store.key_count()?);
    Ok(())
}
