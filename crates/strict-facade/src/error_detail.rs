//! Out-of-band diagnostic data for `KeyError` instances.
//!
//! The offending key of a `KeyError` is not an own property of the error
//! object. It lives here, keyed by object identity. The table holds handles,
//! never objects, and is not a collection root: once an error object is
//! reclaimed its entry is dropped by [`ErrorDetailTable::retain_live`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::object_model::{ObjectHandle, PropertyKey};

/// Result of looking an object up in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLookup<'a> {
    /// An authentic instance and its offending key.
    Key(&'a PropertyKey),
    /// Registered without a payload (the shared prototype).
    Empty,
    /// Never registered: not built by the internal constructor.
    Missing,
}

/// Identity-keyed, non-owning association from error objects to their
/// offending key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetailTable {
    entries: BTreeMap<ObjectHandle, Option<PropertyKey>>,
}

impl ErrorDetailTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `key` with a freshly built instance. Each instance is
    /// written once; a second write is refused and returns `false`.
    pub fn attach(&mut self, instance: ObjectHandle, key: PropertyKey) -> bool {
        if self.entries.contains_key(&instance) {
            return false;
        }
        self.entries.insert(instance, Some(key));
        true
    }

    /// Register an object with no payload.
    pub fn register_empty(&mut self, holder: ObjectHandle) {
        self.entries.entry(holder).or_insert(None);
    }

    pub fn lookup(&self, instance: ObjectHandle) -> DetailLookup<'_> {
        match self.entries.get(&instance) {
            Some(Some(key)) => DetailLookup::Key(key),
            Some(None) => DetailLookup::Empty,
            None => DetailLookup::Missing,
        }
    }

    /// Drop entries whose object is gone. Returns how many were dropped.
    pub fn retain_live(&mut self, is_live: impl Fn(ObjectHandle) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|handle, _| is_live(*handle));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
