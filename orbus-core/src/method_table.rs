//! Method dispatch table: resolves (object path, interface, member) to a handler.
//!
//! Every member registered under a named interface is reachable twice: with
//! its interface and without one, because callers on the bus may omit the
//! interface of a method call. Both keys share one [`MethodEntry`].

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::Arc;

use hashbrown::hash_table::Entry;
use hashbrown::HashTable;
use parking_lot::Mutex;

use crate::map_key::StringMapKey;

/// Whether a member is invoked or emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    MethodCall,
    Signal,
}

/// Description of an interface member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    /// Owning interface. `None` for members exposed without one.
    pub interface: Option<String>,
    pub kind: MemberKind,
    /// Input argument signature.
    pub signature: String,
    /// Output argument signature.
    pub return_signature: String,
}

impl Member {
    /// Method call member. An empty interface name is treated as no interface.
    pub fn method(interface: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interface: interface.filter(|i| !i.is_empty()).map(str::to_owned),
            kind: MemberKind::MethodCall,
            signature: String::new(),
            return_signature: String::new(),
        }
    }

    pub fn signal(interface: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Signal,
            ..Self::method(interface, name)
        }
    }

    pub fn with_signature(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.signature = input.into();
        self.return_signature = output.into();
        self
    }
}

/// An object that can be registered on the bus.
pub trait BusObject: Send + Sync {
    fn path(&self) -> &str;
}

/// Objects that know how to register all of their own members.
pub trait InstallMethods<H>: BusObject + Sized {
    fn install_methods(object: &Arc<Self>, table: &MethodTable<Self, H>);
}

/// What a lookup resolves to: the registering object, its handler and the member.
pub struct MethodEntry<O: ?Sized, H> {
    pub object: Arc<O>,
    pub handler: H,
    pub member: Arc<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MethodKey<'a> {
    path: StringMapKey<'a>,
    interface: Option<StringMapKey<'a>>,
    member: StringMapKey<'a>,
}

impl<'a> MethodKey<'a> {
    fn borrowed(path: &'a str, interface: Option<&'a str>, member: &'a str) -> Self {
        Self {
            path: StringMapKey::unbacked(path),
            interface: interface.map(StringMapKey::unbacked),
            member: StringMapKey::unbacked(member),
        }
    }
}

type Slot<O, H> = (MethodKey<'static>, Arc<MethodEntry<O, H>>);

/// Concurrent dispatch table. One lock covers every read and write.
pub struct MethodTable<O: ?Sized, H> {
    hasher: RandomState,
    table: Mutex<HashTable<Slot<O, H>>>,
}

impl<O: BusObject + ?Sized, H> MethodTable<O, H> {
    pub fn new() -> Self {
        Self {
            hasher: RandomState::new(),
            table: Mutex::new(HashTable::new()),
        }
    }

    /// Register `handler` for `member` of `object`. A registration for a key
    /// that already exists replaces it; this includes the interface-less key,
    /// so the last interface registered for a member name wins there.
    pub fn add(&self, object: &Arc<O>, handler: H, member: Member) {
        let path = object.path().to_owned();
        let member = Arc::new(member);
        let entry = Arc::new(MethodEntry {
            object: object.clone(),
            handler,
            member: member.clone(),
        });
        let qualified = MethodKey {
            path: StringMapKey::backed(path.clone()),
            interface: member.interface.clone().map(StringMapKey::backed),
            member: StringMapKey::backed(member.name.clone()),
        };
        let unqualified = member.interface.as_ref().map(|_| MethodKey {
            path: StringMapKey::backed(path),
            interface: None,
            member: StringMapKey::backed(member.name.clone()),
        });

        let mut table = self.table.lock();
        self.upsert(&mut table, qualified, entry.clone());
        if let Some(key) = unqualified {
            self.upsert(&mut table, key, entry);
        }
        tracing::trace!(
            path = object.path(),
            interface = member.interface.as_deref().unwrap_or(""),
            member = %member.name,
            "registered method"
        );
    }

    /// Register everything `object` installs.
    pub fn add_all(&self, object: &Arc<O>)
    where
        O: InstallMethods<H>,
    {
        O::install_methods(object, self);
    }

    /// Exact lookup. Pass `interface: None` to resolve a call that omitted it.
    pub fn find(
        &self,
        path: &str,
        interface: Option<&str>,
        member: &str,
    ) -> Option<Arc<MethodEntry<O, H>>> {
        let key = MethodKey::borrowed(path, interface, member);
        let hash = self.hasher.hash_one(&key);
        let table = self.table.lock();
        table
            .find(hash, |(k, _)| *k == key)
            .map(|(_, entry)| entry.clone())
    }

    /// Drop every entry registered by `object`. Returns how many were removed.
    pub fn remove_all(&self, object: &Arc<O>) -> usize {
        let mut table = self.table.lock();
        let before = table.len();
        table.retain(|(_, entry)| !Arc::ptr_eq(&entry.object, object));
        let removed = before - table.len();
        tracing::debug!(path = object.path(), removed, "unregistered object methods");
        removed
    }

    /// Number of keys, counting both keys of interface-qualified members.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    fn upsert(
        &self,
        table: &mut HashTable<Slot<O, H>>,
        key: MethodKey<'static>,
        entry: Arc<MethodEntry<O, H>>,
    ) {
        let hash = self.hasher.hash_one(&key);
        match table.entry(hash, |(k, _)| *k == key, |(k, _)| self.hasher.hash_one(k)) {
            Entry::Occupied(mut slot) => slot.get_mut().1 = entry,
            Entry::Vacant(slot) => {
                slot.insert((key, entry));
            }
        }
    }
}

impl<O: BusObject + ?Sized, H> Default for MethodTable<O, H> {
    fn default() -> Self {
        Self::new()
    }
}
