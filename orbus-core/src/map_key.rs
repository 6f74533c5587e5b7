//! String map key that can be probed without allocating.
//!
//! A backed key owns its string and is what gets stored. An unbacked key
//! borrows the caller's string and carries that lifetime, so it can only be
//! used to probe a table whose keys are `StringMapKey<'static>`.

use std::borrow::{Borrow, Cow};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone)]
pub struct StringMapKey<'a>(Cow<'a, str>);

impl StringMapKey<'static> {
    /// Owned key, used when inserting.
    pub fn backed(key: impl Into<String>) -> Self {
        StringMapKey(Cow::Owned(key.into()))
    }
}

impl<'a> StringMapKey<'a> {
    /// Borrowed key, used for lookups. `key` must outlive the probe.
    pub fn unbacked(key: &'a str) -> Self {
        StringMapKey(Cow::Borrowed(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_backed(&self) -> bool {
        matches!(self.0, Cow::Owned(_))
    }

    pub fn into_backed(self) -> StringMapKey<'static> {
        StringMapKey(Cow::Owned(self.0.into_owned()))
    }
}

impl PartialEq for StringMapKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for StringMapKey<'_> {}

impl PartialOrd for StringMapKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StringMapKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

// Must hash exactly like `str` for the `Borrow<str>` impl to be sound.
impl Hash for StringMapKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for StringMapKey<'_> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StringMapKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for StringMapKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl From<String> for StringMapKey<'static> {
    fn from(s: String) -> Self {
        Self::backed(s)
    }
}
