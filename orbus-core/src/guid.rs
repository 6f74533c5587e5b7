//! Bus identifiers: 128-bit GUIDs naming bus instances, sessions and peers.
//!
//! Two string forms are provided. The canonical form is 32 lowercase hex
//! characters. The short form is 8 characters derived from the first 8 bytes
//! only; it is for display and must never be used to decide identity.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Size of a GUID in bytes.
pub const GUID_SIZE: usize = 16;

/// Length of the string returned by [`Guid128::short_str`].
pub const SHORT_SIZE: usize = 8;

/// 128-bit bus identifier. Equality, ordering and hashing are over the raw bytes.
#[derive(Clone, Serialize, Deserialize)]
pub struct Guid128 {
    #[serde(with = "bytes_16")]
    bytes: [u8; GUID_SIZE],
    #[serde(skip)]
    hex: OnceLock<String>,
    #[serde(skip)]
    short: OnceLock<String>,
}

mod bytes_16 {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    pub fn serialize<S: Serializer>(v: &[u8; 16], serializer: S) -> Result<S::Ok, S::Error> {
        v.as_slice().serialize(serializer)
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 16], D::Error> {
        let buf: Vec<u8> = Deserialize::deserialize(d)?;
        buf.try_into()
            .map_err(|_| serde::de::Error::custom("expected 16 bytes"))
    }
}

impl Guid128 {
    /// Fresh identifier from the operating system's CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; GUID_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    /// Identifier with every byte set to `init`.
    pub fn filled(init: u8) -> Self {
        Self::from_bytes([init; GUID_SIZE])
    }

    pub fn from_bytes(bytes: [u8; GUID_SIZE]) -> Self {
        Self {
            bytes,
            hex: OnceLock::new(),
            short: OnceLock::new(),
        }
    }

    /// Parse leading hex digit pairs. Decoding stops at the first pair that is
    /// not valid hex or after 16 bytes; any bytes not supplied are zero.
    pub fn from_hex(s: &str) -> Self {
        let mut bytes = [0u8; GUID_SIZE];
        decode_prefix(s, &mut bytes);
        Self::from_bytes(bytes)
    }

    /// True if `s` is a 32 character hex encoding of a GUID or, when `exact`
    /// is false, starts with one.
    pub fn is_guid(s: &str, exact: bool) -> bool {
        if exact && s.len() != 2 * GUID_SIZE {
            return false;
        }
        let mut scratch = [0u8; GUID_SIZE];
        decode_prefix(s, &mut scratch) == GUID_SIZE
    }

    /// Case-insensitive comparison against a hex string.
    pub fn matches_hex(&self, s: &str) -> bool {
        let mut other = [0u8; GUID_SIZE];
        decode_prefix(s, &mut other) == GUID_SIZE && other == self.bytes
    }

    pub fn as_bytes(&self) -> &[u8; GUID_SIZE] {
        &self.bytes
    }

    /// Replace the raw value. Cached string forms are discarded.
    pub fn set_bytes(&mut self, bytes: [u8; GUID_SIZE]) {
        self.bytes = bytes;
        self.hex = OnceLock::new();
        self.short = OnceLock::new();
    }

    /// Canonical lowercase hex form of all 16 bytes.
    pub fn hex_str(&self) -> &str {
        self.hex.get_or_init(|| hex::encode(self.bytes))
    }

    /// Compact 8 character form over the first 8 bytes, 6 bits per byte.
    pub fn short_str(&self) -> &str {
        self.short.get_or_init(|| {
            self.bytes[..SHORT_SIZE]
                .iter()
                .map(|b| short_symbol(b & 0x3f))
                .collect()
        })
    }
}

fn short_symbol(v: u8) -> char {
    match v {
        0..=9 => (b'0' + v) as char,
        10..=35 => (b'A' + (v - 10)) as char,
        36..=61 => (b'a' + (v - 36)) as char,
        62 => '_',
        _ => '-',
    }
}

/// Decode as many whole hex pairs from the front of `s` as fit in `out`.
/// Returns the number of bytes written.
fn decode_prefix(s: &str, out: &mut [u8]) -> usize {
    let digits = s
        .bytes()
        .take(out.len() * 2)
        .take_while(u8::is_ascii_hexdigit)
        .count();
    let n = digits / 2;
    match hex::decode_to_slice(&s[..n * 2], &mut out[..n]) {
        Ok(()) => n,
        Err(_) => 0,
    }
}

impl PartialEq for Guid128 {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Guid128 {}

impl PartialOrd for Guid128 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Guid128 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl Hash for Guid128 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for Guid128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex_str())
    }
}

impl fmt::Debug for Guid128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guid128").field(&self.hex_str()).finish()
    }
}

impl From<[u8; GUID_SIZE]> for Guid128 {
    fn from(bytes: [u8; GUID_SIZE]) -> Self {
        Self::from_bytes(bytes)
    }
}
