//! Load config from file and environment.

use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

/// Host configuration. File: ~/.config/orbus/config.toml or /etc/orbus/config.toml.
/// Env overrides: ORBUS_APPLICATION, ORBUS_KEYSTORE_PATH, ORBUS_KEYSTORE_PASSWORD, ORBUS_LOG.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Application name; selects the default key store file (default "orbus").
    #[serde(default = "default_application")]
    pub application: String,
    /// Explicit key store file instead of ~/.orbus_keystore/<application>.
    #[serde(default)]
    pub keystore_path: Option<PathBuf>,
    /// Key store password. Defaults to the key store path.
    #[serde(default)]
    pub keystore_password: Option<String>,
    /// tracing-subscriber filter directive (default "info").
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_application() -> String {
    "orbus".to_owned()
}
fn default_log_filter() -> String {
    "info".to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            application: default_application(),
            keystore_path: None,
            keystore_password: None,
            log_filter: default_log_filter(),
        }
    }
}

/// Load config: default, then config file (if present), then env vars.
pub fn load() -> anyhow::Result<Config> {
    let mut c = load_file()?.unwrap_or_default();
    apply_env(&mut c, |key| std::env::var(key).ok());
    Ok(c)
}

fn apply_env(c: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(s) = var("ORBUS_APPLICATION") {
        c.application = s;
    }
    if let Some(s) = var("ORBUS_KEYSTORE_PATH") {
        c.keystore_path = Some(PathBuf::from(s));
    }
    if let Some(s) = var("ORBUS_KEYSTORE_PASSWORD") {
        c.keystore_password = Some(s);
    }
    if let Some(s) = var("ORBUS_LOG") {
        c.log_filter = s;
    }
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/orbus/config.toml"));
    }
    out.push(PathBuf::from("/etc/orbus/config.toml"));
    out
}

fn load_file() -> anyhow::Result<Option<Config>> {
    for p in config_paths() {
        if p.exists() {
            let s = std::fs::read_to_string(&p)
                .with_context(|| format!("reading {}", p.display()))?;
            let c = parse(&s).with_context(|| format!("parsing {}", p.display()))?;
            return Ok(Some(c));
        }
    }
    Ok(None)
}

fn parse(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(s)
}
