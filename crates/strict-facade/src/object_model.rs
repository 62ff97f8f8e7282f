//! Arena-backed ES object model: property keys, values, descriptors,
//! ordinary objects, proxies and the managed heap.
//!
//! Key features:
//!
//! - **Property descriptors**: data vs accessor, configurable/enumerable/writable
//! - **Delegation chains**: `[[Prototype]]` slot with bounded, cycle-checked traversal
//! - **Proxy**: a target plus a handler policy; only `[[Get]]` is ever trapped,
//!   every other internal method sees straight through to the target
//! - **Symbol keys**: property keys that are either strings or symbols
//! - **Reclamation**: mark-sweep over the arena; handles are never reused
//!
//! Getter invocation and trap dispatch need the function table, so they live
//! in [`crate::realm`]. The heap only stores and walks structure.
//!
//! `BTreeMap`/`BTreeSet` for deterministic ordering.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Serialize/deserialize `BTreeMap<PropertyKey, PropertyDescriptor>` as a
/// sorted sequence of `[key, descriptor]` pairs.  serde_json requires string
/// keys for JSON maps but `PropertyKey` is an enum, so we use a vec-of-pairs
/// representation to preserve full round-trip fidelity.
mod properties_as_seq {
    use super::{BTreeMap, PropertyDescriptor, PropertyKey};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<PropertyKey, PropertyDescriptor>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let pairs: Vec<(&PropertyKey, &PropertyDescriptor)> = map.iter().collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<PropertyKey, PropertyDescriptor>, D::Error> {
        let pairs: Vec<(PropertyKey, PropertyDescriptor)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

/// Default bound on delegation chain walks.
pub const DEFAULT_MAX_CHAIN_DEPTH: u32 = 1024;

// ---------------------------------------------------------------------------
// PropertyKey: string or symbol
// ---------------------------------------------------------------------------

/// Unique symbol identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// A property key: either a string or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    /// String key.
    String(String),
    /// Symbol key (references the realm's symbol registry).
    Symbol(SymbolId),
}

impl PropertyKey {
    /// The key as a runtime value (`"x"` or the symbol itself).
    pub fn to_value(&self) -> JsValue {
        match self {
            Self::String(s) => JsValue::Str(s.clone()),
            Self::Symbol(id) => JsValue::Symbol(*id),
        }
    }

    /// Canonical array index, if this key is one (`"0"`, `"17"`, not `"01"`).
    pub fn as_array_index(&self) -> Option<u32> {
        let Self::String(s) = self else {
            return None;
        };
        let index: u32 = s.parse().ok()?;
        // 2^32 - 1 is the length ceiling, not an index.
        if index == u32::MAX || index.to_string() != *s {
            return None;
        }
        Some(index)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Symbol(id) => write!(f, "Symbol({})", id.0),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        Self::String(index.to_string())
    }
}

impl From<SymbolId> for PropertyKey {
    fn from(id: SymbolId) -> Self {
        Self::Symbol(id)
    }
}

// ---------------------------------------------------------------------------
// SymbolRegistry: symbol descriptions
// ---------------------------------------------------------------------------

/// Symbol registry: descriptions for every allocated symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolRegistry {
    /// SymbolId → description for every symbol created through the registry.
    descriptions: BTreeMap<SymbolId, Option<String>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Symbol(description)`: always a fresh symbol.
    pub fn create(&mut self, description: Option<&str>, heap: &mut ObjectHeap) -> SymbolId {
        let id = heap.alloc_symbol();
        self.descriptions
            .insert(id, description.map(str::to_string));
        id
    }

    /// Description of a symbol, `None` for unknown or description-less symbols.
    pub fn description(&self, sym: SymbolId) -> Option<&str> {
        self.descriptions.get(&sym).and_then(|d| d.as_deref())
    }

    /// `Symbol.prototype.toString` rendering: `Symbol(description)`.
    pub fn render(&self, sym: SymbolId) -> String {
        format!("Symbol({})", self.description(sym).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// ObjectHandle: typed reference to heap objects
// ---------------------------------------------------------------------------

/// Opaque handle referencing an object on the managed heap.
///
/// Handles are identities: two handles are the same object iff they are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub u32);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// JsValue: runtime value for the object model
// ---------------------------------------------------------------------------

/// Runtime value for the object model.
///
/// Numbers are IEEE-754 doubles so `NaN` and signed zero survive. Functions
/// are ordinary objects flagged callable; there is no separate variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    Str(String),
    Symbol(SymbolId),
    Object(ObjectHandle),
}

impl JsValue {
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Self::Object(h) => Some(*h),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Object(_) => "object",
        }
    }

    /// SameValue comparison (ES2020 §7.2.10): `NaN` equals `NaN`, `+0` and
    /// `-0` differ.
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", crate::conversion::number_to_string(*n)),
            Self::BigInt(n) => write!(f, "{n}n"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Symbol(id) => write!(f, "Symbol({})", id.0),
            Self::Object(h) => write!(f, "[object#{}]", h.0),
        }
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<ObjectHandle> for JsValue {
    fn from(h: ObjectHandle) -> Self {
        Self::Object(h)
    }
}

// ---------------------------------------------------------------------------
// PropertyDescriptor
// ---------------------------------------------------------------------------

/// ES2020 property descriptor (§6.2.5).
///
/// The two shapes are mutually exclusive by construction. An accessor with
/// neither getter nor setter is representable but never produced by this
/// crate; readers treat it as an invariant violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyDescriptor {
    /// Data descriptor: has `value` and `writable`.
    Data {
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    /// Accessor descriptor: has `get` and/or `set` (callable object handles).
    Accessor {
        get: Option<ObjectHandle>,
        set: Option<ObjectHandle>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Create a default data descriptor (writable, enumerable, configurable).
    pub fn data(value: JsValue) -> Self {
        Self::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Create a non-writable, non-enumerable, non-configurable data descriptor.
    pub fn data_frozen(value: JsValue) -> Self {
        Self::Data {
            value,
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    /// Getter-only accessor, non-enumerable and configurable (class getter shape).
    pub fn getter(get: ObjectHandle) -> Self {
        Self::Accessor {
            get: Some(get),
            set: None,
            enumerable: false,
            configurable: true,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => *configurable,
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    /// Get the value if this is a data descriptor.
    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// Is this a data descriptor with writable=true?
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Data { writable, .. } => *writable,
            Self::Accessor { .. } => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ObjectError
// ---------------------------------------------------------------------------

/// Errors from heap-level object operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectError {
    /// TypeError raised by a structural check (proxy invariants, kinds).
    TypeError(String),
    /// Object not found in the heap (never allocated, or reclaimed).
    ObjectNotFound(ObjectHandle),
    /// Prototype chain cycle detected.
    PrototypeCycleDetected,
    /// Maximum prototype chain depth exceeded.
    PrototypeChainTooDeep { depth: u32, max: u32 },
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeError(msg) => write!(f, "TypeError: {msg}"),
            Self::ObjectNotFound(h) => write!(f, "object#{} not found", h.0),
            Self::PrototypeCycleDetected => write!(f, "TypeError: prototype chain cycle detected"),
            Self::PrototypeChainTooDeep { depth, max } => {
                write!(
                    f,
                    "TypeError: prototype chain depth {depth} exceeds max {max}"
                )
            }
        }
    }
}

impl std::error::Error for ObjectError {}

// ---------------------------------------------------------------------------
// OrdinaryObject
// ---------------------------------------------------------------------------

/// An ordinary object with internal slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdinaryObject {
    /// `[[Prototype]]` internal slot (None means end of chain).
    pub prototype: Option<ObjectHandle>,
    /// `[[Extensible]]` internal slot.
    pub extensible: bool,
    /// Own properties with descriptors, keyed by PropertyKey.
    #[serde(with = "properties_as_seq")]
    pub properties: BTreeMap<PropertyKey, PropertyDescriptor>,
    /// `[[Class]]` tag for intrinsic identification (`"Array"`, `"Error"`, ...).
    pub class_tag: Option<String>,
    /// `[[BooleanData]]` / `[[NumberData]]` / `[[StringData]]` for wrappers.
    pub primitive: Option<JsValue>,
    /// Is this object callable (i.e. a function)?
    pub callable: bool,
    /// Is this object a constructor?
    pub constructable: bool,
}

impl Default for OrdinaryObject {
    fn default() -> Self {
        Self {
            prototype: None,
            extensible: true,
            properties: BTreeMap::new(),
            class_tag: None,
            primitive: None,
            callable: false,
            constructable: false,
        }
    }
}

impl OrdinaryObject {
    /// Create a new ordinary object with the given prototype.
    pub fn with_prototype(proto: Option<ObjectHandle>) -> Self {
        Self {
            prototype: proto,
            ..Self::default()
        }
    }

    /// `[[GetOwnProperty]](P)`.
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    pub fn is_array(&self) -> bool {
        self.class_tag.as_deref() == Some("Array")
    }

    /// `[[DefineOwnProperty]](P, Desc)`: define or update a property.
    ///
    /// Returns `Ok(true)` if the property was successfully defined,
    /// `Ok(false)` if rejected (non-configurable conflict or non-extensible).
    pub fn define_own_property(
        &mut self,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, ObjectError> {
        if let Some(current) = self.properties.get(&key) {
            if !current.is_configurable() {
                if desc.is_configurable() {
                    return Ok(false);
                }
                if desc.is_enumerable() != current.is_enumerable() {
                    return Ok(false);
                }
                // Cannot change data↔accessor type.
                if current.is_data() != desc.is_data() {
                    return Ok(false);
                }
                if let (
                    PropertyDescriptor::Data {
                        writable: current_w,
                        value: current_v,
                        ..
                    },
                    PropertyDescriptor::Data {
                        writable: new_w,
                        value: new_v,
                        ..
                    },
                ) = (current, &desc)
                    && !current_w
                {
                    if *new_w {
                        return Ok(false);
                    }
                    if !current_v.same_value(new_v) {
                        return Ok(false);
                    }
                }
                if let (
                    PropertyDescriptor::Accessor {
                        get: cur_get,
                        set: cur_set,
                        ..
                    },
                    PropertyDescriptor::Accessor {
                        get: new_get,
                        set: new_set,
                        ..
                    },
                ) = (current, &desc)
                    && (cur_get != new_get || cur_set != new_set)
                {
                    return Ok(false);
                }
            }
            self.properties.insert(key, desc);
            Ok(true)
        } else {
            if !self.extensible {
                return Ok(false);
            }
            self.properties.insert(key, desc);
            Ok(true)
        }
    }

    /// `[[OwnPropertyKeys]]()`: integer indices (numeric order), then
    /// string keys, then symbol keys.
    pub fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut int_keys: Vec<(u32, PropertyKey)> = Vec::new();
        let mut str_keys: Vec<PropertyKey> = Vec::new();
        let mut sym_keys: Vec<PropertyKey> = Vec::new();

        for key in self.properties.keys() {
            match key {
                PropertyKey::String(_) => match key.as_array_index() {
                    Some(n) => int_keys.push((n, key.clone())),
                    None => str_keys.push(key.clone()),
                },
                PropertyKey::Symbol(_) => sym_keys.push(key.clone()),
            }
        }

        int_keys.sort_by_key(|(n, _)| *n);
        let mut result: Vec<PropertyKey> = int_keys.into_iter().map(|(_, k)| k).collect();
        result.extend(str_keys);
        result.extend(sym_keys);
        result
    }

    /// Outgoing object references (for marking).
    fn references(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        let slots = self
            .prototype
            .into_iter()
            .chain(self.primitive.as_ref().and_then(JsValue::as_object));
        let props = self.properties.values().flat_map(|desc| {
            let (a, b, c) = match desc {
                PropertyDescriptor::Data { value, .. } => (value.as_object(), None, None),
                PropertyDescriptor::Accessor { get, set, .. } => (None, *get, *set),
            };
            a.into_iter().chain(b).chain(c)
        });
        slots.chain(props)
    }
}

// ---------------------------------------------------------------------------
// ProxyObject
// ---------------------------------------------------------------------------

/// Handler policy of a proxy.
///
/// Only `[[Get]]` is ever trapped; every other internal method forwards to
/// the target regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyHandler {
    /// No traps: reads go straight to the target.
    Forwarding,
    /// Reads of keys absent from the whole chain raise `KeyError`.
    StrictGet,
}

/// Proxy internal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyObject {
    /// `[[ProxyTarget]]`: the wrapped target object.
    pub target: ObjectHandle,
    /// `[[ProxyHandler]]`: the handler policy.
    pub handler: ProxyHandler,
}

impl ProxyObject {
    pub fn new(target: ObjectHandle, handler: ProxyHandler) -> Self {
        Self { target, handler }
    }
}

// ---------------------------------------------------------------------------
// ManagedObject: union of ordinary and proxy
// ---------------------------------------------------------------------------

/// A managed object: either ordinary or a Proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ManagedObject {
    Ordinary(OrdinaryObject),
    Proxy(ProxyObject),
}

impl ManagedObject {
    pub fn as_ordinary(&self) -> Option<&OrdinaryObject> {
        match self {
            Self::Ordinary(o) => Some(o),
            Self::Proxy(_) => None,
        }
    }

    pub fn as_ordinary_mut(&mut self) -> Option<&mut OrdinaryObject> {
        match self {
            Self::Ordinary(o) => Some(o),
            Self::Proxy(_) => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&ProxyObject> {
        match self {
            Self::Proxy(p) => Some(p),
            Self::Ordinary(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CollectionStats
// ---------------------------------------------------------------------------

/// Result of one mark-sweep pass over the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Objects found reachable from the roots.
    pub marked_count: u64,
    /// Objects reclaimed in this pass.
    pub swept_count: u64,
    /// Live objects after the pass.
    pub live_count: u64,
}

// ---------------------------------------------------------------------------
// ObjectHeap: the managed object store
// ---------------------------------------------------------------------------

/// The object heap: arena of managed objects.
///
/// Reclaimed slots become tombstones and are never reallocated, so a handle
/// held past its object's lifetime fails with `ObjectNotFound` instead of
/// aliasing a newer object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectHeap {
    objects: Vec<Option<ManagedObject>>,
    next_symbol: u32,
    max_chain_depth: u32,
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self::with_max_chain_depth(DEFAULT_MAX_CHAIN_DEPTH)
    }

    pub fn with_max_chain_depth(max_chain_depth: u32) -> Self {
        Self {
            objects: Vec::new(),
            next_symbol: 1,
            max_chain_depth,
        }
    }

    pub fn max_chain_depth(&self) -> u32 {
        self.max_chain_depth
    }

    fn push(&mut self, obj: ManagedObject) -> ObjectHandle {
        let handle = ObjectHandle(self.objects.len() as u32);
        self.objects.push(Some(obj));
        handle
    }

    /// Allocate a new ordinary object with the given prototype.
    pub fn alloc(&mut self, proto: Option<ObjectHandle>) -> ObjectHandle {
        self.push(ManagedObject::Ordinary(OrdinaryObject::with_prototype(
            proto,
        )))
    }

    /// Allocate a fully-built ordinary object.
    pub fn alloc_ordinary(&mut self, obj: OrdinaryObject) -> ObjectHandle {
        self.push(ManagedObject::Ordinary(obj))
    }

    /// Allocate a Proxy object.
    pub fn alloc_proxy(&mut self, target: ObjectHandle, handler: ProxyHandler) -> ObjectHandle {
        self.push(ManagedObject::Proxy(ProxyObject::new(target, handler)))
    }

    /// Allocate a new unique symbol id.
    pub fn alloc_symbol(&mut self) -> SymbolId {
        let id = SymbolId(self.next_symbol);
        self.next_symbol += 1;
        id
    }

    pub fn get(&self, handle: ObjectHandle) -> Result<&ManagedObject, ObjectError> {
        self.objects
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(ObjectError::ObjectNotFound(handle))
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Result<&mut ManagedObject, ObjectError> {
        self.objects
            .get_mut(handle.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(ObjectError::ObjectNotFound(handle))
    }

    /// Has this handle been allocated and not reclaimed?
    pub fn is_live(&self, handle: ObjectHandle) -> bool {
        self.get(handle).is_ok()
    }

    /// Number of slots ever allocated (including reclaimed ones).
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.objects.iter().filter(|slot| slot.is_some()).count()
    }

    /// Follow proxy targets until an ordinary object is reached.
    pub fn unwrap_proxy(&self, handle: ObjectHandle) -> Result<ObjectHandle, ObjectError> {
        let mut current = handle;
        let mut depth: u32 = 0;
        loop {
            match self.get(current)? {
                ManagedObject::Ordinary(_) => return Ok(current),
                ManagedObject::Proxy(p) => current = p.target,
            }
            depth += 1;
            if depth > self.max_chain_depth {
                return Err(ObjectError::PrototypeChainTooDeep {
                    depth,
                    max: self.max_chain_depth,
                });
            }
        }
    }

    /// The ordinary object behind `handle`, seeing through proxies.
    pub fn ordinary(&self, handle: ObjectHandle) -> Result<&OrdinaryObject, ObjectError> {
        let h = self.unwrap_proxy(handle)?;
        self.get(h)?
            .as_ordinary()
            .ok_or(ObjectError::ObjectNotFound(h))
    }

    pub fn ordinary_mut(&mut self, handle: ObjectHandle) -> Result<&mut OrdinaryObject, ObjectError> {
        let h = self.unwrap_proxy(handle)?;
        self.get_mut(h)?
            .as_ordinary_mut()
            .ok_or(ObjectError::ObjectNotFound(h))
    }

    // -- Internal methods (proxies forward) ---------------------------------

    /// `[[GetPrototypeOf]]`.
    pub fn get_prototype_of(
        &self,
        handle: ObjectHandle,
    ) -> Result<Option<ObjectHandle>, ObjectError> {
        Ok(self.ordinary(handle)?.prototype)
    }

    /// `[[GetOwnProperty]]`.
    pub fn get_own_property_descriptor(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ObjectError> {
        Ok(self.ordinary(handle)?.get_own_property(key).cloned())
    }

    pub fn has_own(&self, handle: ObjectHandle, key: &PropertyKey) -> Result<bool, ObjectError> {
        Ok(self.ordinary(handle)?.has_own_property(key))
    }

    /// `[[HasProperty]](O, P)`: walks the prototype chain.
    pub fn has_property(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<bool, ObjectError> {
        let mut current = Some(handle);
        let mut depth: u32 = 0;
        let mut visited = BTreeSet::new();

        while let Some(h) = current {
            if depth > self.max_chain_depth {
                return Err(ObjectError::PrototypeChainTooDeep {
                    depth,
                    max: self.max_chain_depth,
                });
            }
            if !visited.insert(h) {
                return Err(ObjectError::PrototypeCycleDetected);
            }
            let o = self.ordinary(h)?;
            if o.has_own_property(key) {
                return Ok(true);
            }
            current = o.prototype;
            depth += 1;
        }
        Ok(false)
    }

    /// `Object.defineProperty(O, P, Desc)`.
    pub fn define_property(
        &mut self,
        handle: ObjectHandle,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, ObjectError> {
        self.ordinary_mut(handle)?.define_own_property(key, desc)
    }

    /// Own-property `[[Set]]`: updates a writable data property or adds a
    /// new one on an extensible object. Accessors and non-writable data
    /// properties reject the write.
    pub fn set_property(
        &mut self,
        handle: ObjectHandle,
        key: PropertyKey,
        value: JsValue,
    ) -> Result<bool, ObjectError> {
        let o = self.ordinary_mut(handle)?;
        if let Some(desc) = o.properties.get_mut(&key) {
            return Ok(match desc {
                PropertyDescriptor::Data {
                    value: slot,
                    writable: true,
                    ..
                } => {
                    *slot = value;
                    true
                }
                _ => false,
            });
        }
        if !o.extensible {
            return Ok(false);
        }
        o.properties.insert(key, PropertyDescriptor::data(value));
        Ok(true)
    }

    /// `Object.setPrototypeOf(O, proto)`.
    pub fn set_prototype_of(
        &mut self,
        handle: ObjectHandle,
        proto: Option<ObjectHandle>,
    ) -> Result<bool, ObjectError> {
        let target = self.unwrap_proxy(handle)?;
        if let Some(p) = proto {
            let mut current = Some(p);
            let mut visited = BTreeSet::new();
            visited.insert(target);
            while let Some(h) = current {
                let h = self.unwrap_proxy(h)?;
                if !visited.insert(h) {
                    return Err(ObjectError::PrototypeCycleDetected);
                }
                current = self.ordinary(h)?.prototype;
            }
        }

        let o = self.ordinary_mut(target)?;
        if !o.extensible {
            return Ok(o.prototype == proto);
        }
        o.prototype = proto;
        Ok(true)
    }

    // -- Reclamation ---------------------------------------------------------

    /// Mark-sweep from `roots`. Unreachable objects become tombstones.
    pub fn collect(&mut self, roots: &BTreeSet<ObjectHandle>) -> CollectionStats {
        let mut marked = BTreeSet::new();
        let mut stack: Vec<ObjectHandle> = roots.iter().copied().collect();

        while let Some(h) = stack.pop() {
            let Ok(obj) = self.get(h) else {
                continue;
            };
            if !marked.insert(h) {
                continue;
            }
            match obj {
                ManagedObject::Ordinary(o) => stack.extend(o.references()),
                ManagedObject::Proxy(p) => stack.push(p.target),
            }
        }

        let mut swept: u64 = 0;
        for (index, slot) in self.objects.iter_mut().enumerate() {
            if slot.is_some() && !marked.contains(&ObjectHandle(index as u32)) {
                *slot = None;
                swept += 1;
            }
        }

        CollectionStats {
            marked_count: marked.len() as u64,
            swept_count: swept,
            live_count: self.live_count() as u64,
        }
    }
}

// ---------------------------------------------------------------------------
// ProxyInvariantChecker
// ---------------------------------------------------------------------------

/// Proxy invariant checks per ES2020 §9.5.x, for the one trap we install.
pub struct ProxyInvariantChecker;

impl ProxyInvariantChecker {
    /// Validate a `[[Get]]` trap result (§9.5.8).
    pub fn check_get(
        target: &OrdinaryObject,
        key: &PropertyKey,
        trap_result: &JsValue,
    ) -> Result<(), ObjectError> {
        if let Some(td) = target.get_own_property(key)
            && !td.is_configurable()
        {
            match td {
                PropertyDescriptor::Data {
                    value, writable, ..
                } if !writable => {
                    if !trap_result.same_value(value) {
                        return Err(ObjectError::TypeError(format!(
                            "proxy get: non-configurable non-writable property '{key}' must return same value"
                        )));
                    }
                }
                PropertyDescriptor::Accessor { get: None, .. } => {
                    if *trap_result != JsValue::Undefined {
                        return Err(ObjectError::TypeError(format!(
                            "proxy get: non-configurable accessor property '{key}' with undefined getter must return undefined"
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
