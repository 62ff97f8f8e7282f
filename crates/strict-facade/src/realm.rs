//! The realm: one heap plus everything needed to run behavior over it.
//!
//! A [`Realm`] owns the [`ObjectHeap`], the table of function bodies behind
//! callable objects, the intrinsic prototypes and constructors, the
//! `KeyError` class, the error-detail side table, configuration, and the
//! event log. Property reads go through [`Realm::get`], which walks the
//! delegation chain and hands reads that reach a strict view to
//! [`crate::interception::on_get`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use crate::config::RealmConfig;
use crate::descriptor::{AttributeFlags, data_descriptor};
use crate::error::FacadeError;
use crate::error_detail::ErrorDetailTable;
use crate::events::{EventLog, FacadeEvent};
use crate::facade::{CallContext, ConstructContext, EntryBehavior, Specialization};
use crate::interception;
use crate::intrinsics::{self, Intrinsics};
use crate::key_error::{self, KeyErrorClass};
use crate::object_model::{
    CollectionStats, JsValue, ManagedObject, ObjectError, ObjectHandle, ObjectHeap,
    OrdinaryObject, PropertyDescriptor, PropertyKey, ProxyHandler, SymbolId, SymbolRegistry,
};

/// Host function: `(realm, this, args) -> value`.
pub type NativeFn = Rc<dyn Fn(&mut Realm, &JsValue, &[JsValue]) -> Result<JsValue, FacadeError>>;

/// Post-construction step of a derived constructor: `(realm, instance, args)`.
pub type InitFn = Rc<dyn Fn(&mut Realm, ObjectHandle, &[JsValue]) -> Result<(), FacadeError>>;

#[derive(Clone)]
pub(crate) enum FunctionBody {
    /// Callable only.
    Native(NativeFn),
    /// Callable and constructible through the two-method interface.
    Entry(Rc<dyn EntryBehavior>),
    /// Constructible only; a variant of `base`.
    Derived {
        base: ObjectHandle,
        init: Option<InitFn>,
    },
}

impl FunctionBody {
    fn kind(&self) -> &'static str {
        match self {
            Self::Native(_) => "native",
            Self::Entry(_) => "entry",
            Self::Derived { .. } => "derived",
        }
    }
}

#[derive(Clone)]
struct FunctionRecord {
    name: String,
    body: FunctionBody,
}

impl fmt::Debug for FunctionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRecord")
            .field("name", &self.name)
            .field("kind", &self.body.kind())
            .finish()
    }
}

/// Allocate the object half of a function; its body is registered later.
pub(crate) fn alloc_function_object(
    heap: &mut ObjectHeap,
    proto: ObjectHandle,
    constructable: bool,
) -> ObjectHandle {
    heap.alloc_ordinary(OrdinaryObject {
        class_tag: Some("Function".to_string()),
        callable: true,
        constructable,
        ..OrdinaryObject::with_prototype(Some(proto))
    })
}

enum Step {
    Intercept(ObjectHandle, ProxyHandler),
    Found(PropertyDescriptor),
    Parent(Option<ObjectHandle>),
}

#[derive(Debug)]
pub struct Realm {
    heap: ObjectHeap,
    symbols: SymbolRegistry,
    functions: BTreeMap<ObjectHandle, FunctionRecord>,
    /// derived constructor -> the base it specializes
    variant_of: BTreeMap<ObjectHandle, ObjectHandle>,
    pinned: BTreeSet<ObjectHandle>,
    error_details: ErrorDetailTable,
    events: EventLog,
    config: RealmConfig,
    intrinsics: Intrinsics,
    key_error: KeyErrorClass,
}

impl Realm {
    pub fn new(config: RealmConfig) -> Result<Self, FacadeError> {
        config.validate()?;
        let mut heap = ObjectHeap::with_max_chain_depth(config.max_chain_depth);
        let intrinsics = Intrinsics::allocate(&mut heap);
        let key_error = KeyErrorClass::allocate(&mut heap, &intrinsics);
        let mut realm = Self {
            heap,
            symbols: SymbolRegistry::new(),
            functions: BTreeMap::new(),
            variant_of: BTreeMap::new(),
            pinned: BTreeSet::new(),
            error_details: ErrorDetailTable::new(),
            events: EventLog::new(&config),
            config,
            intrinsics,
            key_error,
        };
        intrinsics::install(&mut realm)?;
        key_error::install(&mut realm)?;
        Ok(realm)
    }

    // -- Accessors -----------------------------------------------------------

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut ObjectHeap {
        &mut self.heap
    }

    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    pub fn key_error_class(&self) -> &KeyErrorClass {
        &self.key_error
    }

    pub fn symbols(&self) -> &SymbolRegistry {
        &self.symbols
    }

    pub fn error_details(&self) -> &ErrorDetailTable {
        &self.error_details
    }

    pub(crate) fn error_details_mut(&mut self) -> &mut ErrorDetailTable {
        &mut self.error_details
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<FacadeEvent> {
        self.events.drain()
    }

    pub(crate) fn record_pass(&mut self, component: &str, event: &str, detail: Option<String>) {
        self.events.record_pass(component, event, detail);
    }

    pub(crate) fn record_failure(
        &mut self,
        component: &str,
        event: &str,
        error_code: &str,
        detail: Option<String>,
    ) {
        self.events
            .record_failure(component, event, error_code, detail);
    }

    // -- Symbols -------------------------------------------------------------

    pub fn new_symbol(&mut self, description: Option<&str>) -> SymbolId {
        self.symbols.create(description, &mut self.heap)
    }

    /// Key as a human would read it: the bare string, or `Symbol(desc)`.
    pub fn describe_key(&self, key: &PropertyKey) -> String {
        match key {
            PropertyKey::String(s) => s.clone(),
            PropertyKey::Symbol(id) => self.symbols.render(*id),
        }
    }

    // -- Functions -----------------------------------------------------------

    pub(crate) fn register_function(
        &mut self,
        handle: ObjectHandle,
        name: &str,
        body: FunctionBody,
    ) -> Result<(), FacadeError> {
        self.define(
            handle,
            "name",
            JsValue::from(name),
            AttributeFlags::CONFIGURABLE,
        )?;
        self.functions.insert(
            handle,
            FunctionRecord {
                name: name.to_string(),
                body,
            },
        );
        Ok(())
    }

    pub fn create_native_function(
        &mut self,
        name: &str,
        f: NativeFn,
    ) -> Result<ObjectHandle, FacadeError> {
        let handle = alloc_function_object(&mut self.heap, self.intrinsics.function_prototype, false);
        self.register_function(handle, name, FunctionBody::Native(f))?;
        Ok(handle)
    }

    /// A callable and constructible function backed by `behavior`, with a
    /// fresh writable `prototype` object.
    pub fn create_entry_point(
        &mut self,
        behavior: Rc<dyn EntryBehavior>,
    ) -> Result<ObjectHandle, FacadeError> {
        let handle = alloc_function_object(&mut self.heap, self.intrinsics.function_prototype, true);
        let name = behavior.name().to_string();
        self.register_function(handle, &name, FunctionBody::Entry(behavior))?;
        let prototype = self.create_plain_object();
        self.define(
            handle,
            "prototype",
            JsValue::Object(prototype),
            AttributeFlags::WRITABLE,
        )?;
        self.define(
            prototype,
            "constructor",
            JsValue::Object(handle),
            AttributeFlags::HIDDEN,
        )?;
        Ok(handle)
    }

    /// Install a native method as a hidden data member of `target`.
    pub fn define_method(
        &mut self,
        target: ObjectHandle,
        name: &str,
        f: NativeFn,
    ) -> Result<ObjectHandle, FacadeError> {
        let function = self.create_native_function(name, f)?;
        self.define(target, name, JsValue::Object(function), AttributeFlags::HIDDEN)?;
        Ok(function)
    }

    /// Install a native getter as an accessor member of `target`.
    pub fn define_getter(
        &mut self,
        target: ObjectHandle,
        key: PropertyKey,
        f: NativeFn,
    ) -> Result<ObjectHandle, FacadeError> {
        let name = format!("get {}", self.describe_key(&key));
        let getter = self.create_native_function(&name, f)?;
        self.heap
            .define_property(target, key, PropertyDescriptor::getter(getter))?;
        Ok(getter)
    }

    pub fn is_callable(&self, value: &JsValue) -> bool {
        value
            .as_object()
            .is_some_and(|h| self.functions.contains_key(&h))
    }

    pub fn is_constructor(&self, value: &JsValue) -> bool {
        value
            .as_object()
            .and_then(|h| self.functions.get(&h))
            .is_some_and(|record| !matches!(record.body, FunctionBody::Native(_)))
    }

    pub fn function_name(&self, handle: ObjectHandle) -> Option<&str> {
        self.functions.get(&handle).map(|r| r.name.as_str())
    }

    /// Keep `handle` alive across every collection.
    pub fn pin(&mut self, handle: ObjectHandle) {
        self.pinned.insert(handle);
    }

    fn function_record(&self, handle: ObjectHandle) -> Result<FunctionRecord, FacadeError> {
        self.functions
            .get(&handle)
            .cloned()
            .ok_or_else(|| FacadeError::type_error(format!("{handle} is not a function")))
    }

    // -- Object creation -----------------------------------------------------

    pub fn create_object(&mut self, proto: Option<ObjectHandle>) -> ObjectHandle {
        self.heap.alloc(proto)
    }

    /// A fresh object delegating to `Object.prototype`.
    pub fn create_plain_object(&mut self) -> ObjectHandle {
        self.heap.alloc(Some(self.intrinsics.object_prototype))
    }

    /// An array delegating to `proto` holding `elements` at indices `0..n`.
    pub fn create_array(
        &mut self,
        proto: ObjectHandle,
        elements: &[JsValue],
    ) -> Result<ObjectHandle, FacadeError> {
        let handle = self.heap.alloc_ordinary(OrdinaryObject {
            class_tag: Some("Array".to_string()),
            ..OrdinaryObject::with_prototype(Some(proto))
        });
        self.define(handle, "length", JsValue::Number(0.0), AttributeFlags::WRITABLE)?;
        for (index, value) in (0u32..).zip(elements) {
            self.set(handle, PropertyKey::from(index), value.clone())?;
        }
        Ok(handle)
    }

    /// `new_target.prototype` if it is an object, else `fallback`.
    pub fn prototype_from_constructor(
        &mut self,
        new_target: ObjectHandle,
        fallback: ObjectHandle,
    ) -> Result<ObjectHandle, FacadeError> {
        let proto = self.get(&JsValue::Object(new_target), &PropertyKey::from("prototype"))?;
        Ok(proto.as_object().unwrap_or(fallback))
    }

    /// Default construction: a fresh object delegating to
    /// `new_target.prototype`, optionally tagged and carrying a primitive.
    pub fn create_from_constructor(
        &mut self,
        new_target: ObjectHandle,
        fallback: ObjectHandle,
        class_tag: Option<&str>,
        primitive: Option<JsValue>,
    ) -> Result<ObjectHandle, FacadeError> {
        let proto = self.prototype_from_constructor(new_target, fallback)?;
        Ok(self.heap.alloc_ordinary(OrdinaryObject {
            class_tag: class_tag.map(str::to_string),
            primitive,
            ..OrdinaryObject::with_prototype(Some(proto))
        }))
    }

    pub fn define(
        &mut self,
        target: ObjectHandle,
        key: impl Into<PropertyKey>,
        value: JsValue,
        flags: AttributeFlags,
    ) -> Result<bool, FacadeError> {
        Ok(self
            .heap
            .define_property(target, key.into(), data_descriptor(value, flags))?)
    }

    /// Re-parent `target` onto `proto`. `false` when `target` is not
    /// extensible and already delegates elsewhere.
    pub fn set_prototype_of(
        &mut self,
        target: ObjectHandle,
        proto: Option<ObjectHandle>,
    ) -> Result<bool, FacadeError> {
        Ok(self.heap.set_prototype_of(target, proto)?)
    }

    // -- Property access -----------------------------------------------------

    /// `[[Get]]` on any value. Primitives read from their prototype with
    /// the primitive itself as receiver.
    pub fn get(&mut self, receiver: &JsValue, key: &PropertyKey) -> Result<JsValue, FacadeError> {
        let start = match receiver {
            JsValue::Object(h) => *h,
            JsValue::Undefined | JsValue::Null => {
                return Err(FacadeError::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    receiver.type_name(),
                    self.describe_key(key)
                )));
            }
            JsValue::Str(s) => {
                if let Some(value) = string_own_property(s, key) {
                    return Ok(value);
                }
                self.intrinsics.string_prototype
            }
            JsValue::Bool(_) => self.intrinsics.boolean_prototype,
            JsValue::Number(_) => self.intrinsics.number_prototype,
            JsValue::Symbol(_) | JsValue::BigInt(_) => self.intrinsics.object_prototype,
        };
        self.get_from(start, key, receiver)
    }

    /// Chain-respecting read starting at `start`, with getters bound to
    /// `receiver`.
    pub fn get_from(
        &mut self,
        start: ObjectHandle,
        key: &PropertyKey,
        receiver: &JsValue,
    ) -> Result<JsValue, FacadeError> {
        let max = self.heap.max_chain_depth();
        let mut current = start;
        let mut depth: u32 = 0;
        loop {
            if depth > max {
                return Err(ObjectError::PrototypeChainTooDeep { depth, max }.into());
            }
            let step = match self.heap.get(current)? {
                ManagedObject::Proxy(proxy) => Step::Intercept(proxy.target, proxy.handler),
                ManagedObject::Ordinary(obj) => match obj.get_own_property(key) {
                    Some(desc) => Step::Found(desc.clone()),
                    None => Step::Parent(obj.prototype),
                },
            };
            match step {
                Step::Intercept(target, ProxyHandler::Forwarding) => {
                    return self.get_from(target, key, receiver);
                }
                Step::Intercept(target, ProxyHandler::StrictGet) => {
                    return interception::on_get(self, target, key, receiver);
                }
                Step::Found(desc) => return self.read_descriptor(desc, receiver),
                Step::Parent(Some(parent)) => current = parent,
                Step::Parent(None) => return Ok(JsValue::Undefined),
            }
            depth += 1;
        }
    }

    fn read_descriptor(
        &mut self,
        desc: PropertyDescriptor,
        receiver: &JsValue,
    ) -> Result<JsValue, FacadeError> {
        match desc {
            PropertyDescriptor::Data { value, .. } => Ok(value),
            PropertyDescriptor::Accessor {
                get: Some(getter), ..
            } => self.call(&JsValue::Object(getter), receiver, &[]),
            PropertyDescriptor::Accessor {
                get: None,
                set: Some(_),
                ..
            } => Ok(JsValue::Undefined),
            PropertyDescriptor::Accessor {
                get: None, set: None, ..
            } => Err(FacadeError::Unreachable {
                context: "accessor descriptor with neither getter nor setter",
            }),
        }
    }

    /// `[[HasProperty]]`: own or inherited, never trapped.
    pub fn has(&self, target: ObjectHandle, key: &PropertyKey) -> Result<bool, FacadeError> {
        Ok(self.heap.has_property(target, key)?)
    }

    /// Own-property write. Writing an array index at or past `length`
    /// grows `length`.
    pub fn set(
        &mut self,
        target: ObjectHandle,
        key: PropertyKey,
        value: JsValue,
    ) -> Result<bool, FacadeError> {
        let index = key.as_array_index();
        let written = self.heap.set_property(target, key, value)?;
        if written
            && let Some(index) = index
            && self.heap.ordinary(target)?.is_array()
        {
            let length_key = PropertyKey::from("length");
            let length = match self.heap.get_own_property_descriptor(target, &length_key)? {
                Some(PropertyDescriptor::Data {
                    value: JsValue::Number(n),
                    ..
                }) => n,
                _ => 0.0,
            };
            let needed = f64::from(index) + 1.0;
            if needed > length {
                self.heap
                    .set_property(target, length_key, JsValue::Number(needed))?;
            }
        }
        Ok(written)
    }

    // -- Calls and construction ----------------------------------------------

    pub fn call(
        &mut self,
        callee: &JsValue,
        this: &JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, FacadeError> {
        let Some(handle) = callee.as_object() else {
            return Err(FacadeError::type_error(format!(
                "{} is not a function",
                callee.type_name()
            )));
        };
        let record = self.function_record(handle)?;
        match record.body {
            FunctionBody::Native(f) => f(self, this, args),
            FunctionBody::Entry(behavior) => {
                let cx = CallContext {
                    callee: handle,
                    this: this.clone(),
                };
                behavior.invoke(self, &cx, args)
            }
            FunctionBody::Derived { .. } => Err(FacadeError::type_error(format!(
                "Class constructor {} cannot be invoked without 'new'",
                record.name
            ))),
        }
    }

    /// Call the member `name` of `receiver` with `receiver` as `this`.
    pub fn invoke_method(
        &mut self,
        receiver: &JsValue,
        name: &str,
        args: &[JsValue],
    ) -> Result<JsValue, FacadeError> {
        let method = self.get(receiver, &PropertyKey::from(name))?;
        if !self.is_callable(&method) {
            return Err(FacadeError::type_error(format!("{name} is not a function")));
        }
        self.call(&method, receiver, args)
    }

    pub fn construct(
        &mut self,
        ctor: ObjectHandle,
        args: &[JsValue],
    ) -> Result<ObjectHandle, FacadeError> {
        self.construct_with(ctor, args, ctor)
    }

    /// Construct `ctor` on behalf of `new_target`.
    pub fn construct_with(
        &mut self,
        ctor: ObjectHandle,
        args: &[JsValue],
        new_target: ObjectHandle,
    ) -> Result<ObjectHandle, FacadeError> {
        if !self.is_constructor(&JsValue::Object(new_target)) {
            return Err(FacadeError::type_error(format!(
                "{new_target} is not a constructor"
            )));
        }
        let record = self.function_record(ctor)?;
        match record.body {
            FunctionBody::Native(_) => Err(FacadeError::type_error(format!(
                "{} is not a constructor",
                record.name
            ))),
            FunctionBody::Entry(behavior) => {
                let cx = ConstructContext {
                    callee: ctor,
                    new_target,
                    specialization: self.specialization(ctor, new_target),
                };
                match behavior.construct(self, &cx, args)? {
                    Some(instance) => Ok(instance),
                    None => {
                        let fallback = self.intrinsics.object_prototype;
                        self.create_from_constructor(new_target, fallback, None, None)
                    }
                }
            }
            FunctionBody::Derived { base, init } => {
                let instance = self.construct_with(base, args, new_target)?;
                if let Some(init) = init {
                    init(self, instance, args)?;
                }
                Ok(instance)
            }
        }
    }

    fn specialization(&self, ctor: ObjectHandle, new_target: ObjectHandle) -> Specialization {
        if ctor == new_target {
            Specialization::Exact
        } else if self.is_variant_of(new_target, ctor) {
            Specialization::Variant {
                derived: new_target,
            }
        } else {
            Specialization::Retargeted { new_target }
        }
    }

    /// Subclass `base`: the new constructor's `prototype` delegates to
    /// `base.prototype`; construction runs `base` on behalf of the derived
    /// constructor, then `init` on the instance.
    pub fn derive_constructor(
        &mut self,
        base: ObjectHandle,
        name: &str,
        init: Option<InitFn>,
    ) -> Result<ObjectHandle, FacadeError> {
        if !self.is_constructor(&JsValue::Object(base)) {
            return Err(FacadeError::type_error(format!(
                "Class extends value {base} is not a constructor"
            )));
        }
        let parent = match self.get(&JsValue::Object(base), &PropertyKey::from("prototype"))? {
            JsValue::Object(p) => Some(p),
            JsValue::Null => None,
            other => {
                return Err(FacadeError::type_error(format!(
                    "Class extends value does not have valid prototype property {}",
                    other.type_name()
                )));
            }
        };
        let prototype = self.heap.alloc(parent);
        let ctor = alloc_function_object(&mut self.heap, base, true);
        self.register_function(ctor, name, FunctionBody::Derived { base, init })?;
        self.define(
            ctor,
            "prototype",
            JsValue::Object(prototype),
            AttributeFlags::FROZEN,
        )?;
        self.define(
            prototype,
            "constructor",
            JsValue::Object(ctor),
            AttributeFlags::HIDDEN,
        )?;
        self.variant_of.insert(ctor, base);
        Ok(ctor)
    }

    /// Record that `derived` specializes `base` without building it through
    /// [`Realm::derive_constructor`].
    pub(crate) fn declare_variant(&mut self, derived: ObjectHandle, base: ObjectHandle) {
        self.variant_of.insert(derived, base);
    }

    /// Is `derived` a (transitive) variant of `base`?
    pub fn is_variant_of(&self, derived: ObjectHandle, base: ObjectHandle) -> bool {
        let mut current = derived;
        let mut steps = 0usize;
        while let Some(&parent) = self.variant_of.get(&current) {
            if parent == base {
                return true;
            }
            current = parent;
            steps += 1;
            if steps > self.variant_of.len() {
                return false;
            }
        }
        false
    }

    /// `value instanceof ctor`.
    pub fn instance_of(&mut self, value: &JsValue, ctor: ObjectHandle) -> Result<bool, FacadeError> {
        if !self.is_callable(&JsValue::Object(ctor)) {
            return Err(FacadeError::type_error(
                "Right-hand side of 'instanceof' is not callable",
            ));
        }
        let &JsValue::Object(mut current) = value else {
            return Ok(false);
        };
        let JsValue::Object(proto) =
            self.get(&JsValue::Object(ctor), &PropertyKey::from("prototype"))?
        else {
            return Err(FacadeError::type_error(
                "Function has non-object prototype in instanceof check",
            ));
        };
        let max = self.heap.max_chain_depth();
        let mut depth: u32 = 0;
        while let Some(next) = self.heap.get_prototype_of(current)? {
            if next == proto {
                return Ok(true);
            }
            current = next;
            depth += 1;
            if depth > max {
                return Err(ObjectError::PrototypeChainTooDeep { depth, max }.into());
            }
        }
        Ok(false)
    }

    // -- Reclamation ---------------------------------------------------------

    /// Mark-sweep from the intrinsics, the `KeyError` class, pinned handles
    /// and `extra_roots`. Error details of reclaimed instances are dropped.
    pub fn collect_garbage(&mut self, extra_roots: &[ObjectHandle]) -> CollectionStats {
        let mut roots: BTreeSet<ObjectHandle> = self.intrinsics.handles().into_iter().collect();
        roots.extend(self.key_error.handles());
        roots.extend(self.pinned.iter().copied());
        roots.extend(extra_roots.iter().copied());

        let stats = self.heap.collect(&roots);

        let heap = &self.heap;
        self.functions.retain(|h, _| heap.is_live(*h));
        self.variant_of
            .retain(|derived, base| heap.is_live(*derived) && heap.is_live(*base));
        let details_dropped = self.error_details.retain_live(|h| heap.is_live(h));

        self.events.record_pass(
            "realm",
            "collection_complete",
            Some(format!(
                "marked={} swept={} details_dropped={details_dropped}",
                stats.marked_count, stats.swept_count
            )),
        );
        stats
    }
}

/// Own members of a string primitive: `length` and index positions, in
/// UTF-16 code units.
fn string_own_property(s: &str, key: &PropertyKey) -> Option<JsValue> {
    if let PropertyKey::String(name) = key
        && name == "length"
    {
        return Some(JsValue::Number(s.encode_utf16().count() as f64));
    }
    let index = key.as_array_index()? as usize;
    let unit = s.encode_utf16().nth(index)?;
    Some(JsValue::Str(String::from_utf16_lossy(&[unit])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn realm() -> Realm {
        Realm::new(RealmConfig::default()).unwrap()
    }

    fn key(s: &str) -> PropertyKey {
        PropertyKey::from(s)
    }

    fn counting_getter() -> NativeFn {
        Rc::new(|realm: &mut Realm, this: &JsValue, _args: &[JsValue]| {
            realm.get(this, &PropertyKey::from("base"))
        })
    }

    // -----------------------------------------------------------------------
    // Section 1: reads
    // -----------------------------------------------------------------------

    #[test]
    fn get_walks_chain() {
        let mut realm = realm();
        let parent = realm.create_plain_object();
        realm.set(parent, key("a"), JsValue::Number(1.0)).unwrap();
        let child = realm.create_object(Some(parent));
        let value = realm.get(&JsValue::Object(child), &key("a")).unwrap();
        assert_eq!(value, JsValue::Number(1.0));
        let missing = realm.get(&JsValue::Object(child), &key("b")).unwrap();
        assert_eq!(missing, JsValue::Undefined);
    }

    #[test]
    fn getter_binds_original_receiver() {
        let mut realm = realm();
        let parent = realm.create_plain_object();
        realm.set(parent, key("base"), JsValue::Number(1.0)).unwrap();
        realm
            .define_getter(parent, key("computed"), counting_getter())
            .unwrap();
        let child = realm.create_object(Some(parent));
        realm.set(child, key("base"), JsValue::Number(2.0)).unwrap();

        let value = realm.get(&JsValue::Object(child), &key("computed")).unwrap();
        assert_eq!(value, JsValue::Number(2.0));
    }

    #[test]
    fn read_of_nullish_is_type_error() {
        let mut realm = realm();
        let err = realm.get(&JsValue::Undefined, &key("x")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: Cannot read properties of undefined (reading 'x')"
        );
    }

    #[test]
    fn string_primitive_members() {
        let mut realm = realm();
        let s = JsValue::from("héllo");
        assert_eq!(realm.get(&s, &key("length")).unwrap(), JsValue::Number(5.0));
        assert_eq!(realm.get(&s, &key("1")).unwrap(), JsValue::from("é"));
        let to_string = realm.get(&s, &key("toString")).unwrap();
        assert!(realm.is_callable(&to_string));
    }

    #[test]
    fn forwarding_proxy_reads_target() {
        let mut realm = realm();
        let target = realm.create_plain_object();
        realm.set(target, key("v"), JsValue::Bool(true)).unwrap();
        let proxy = realm
            .heap_mut()
            .alloc_proxy(target, ProxyHandler::Forwarding);
        let value = realm.get(&JsValue::Object(proxy), &key("v")).unwrap();
        assert_eq!(value, JsValue::Bool(true));
        assert_eq!(
            realm.get(&JsValue::Object(proxy), &key("nope")).unwrap(),
            JsValue::Undefined
        );
    }

    #[test]
    fn accessor_without_either_half_is_unreachable() {
        let mut realm = realm();
        let obj = realm.create_plain_object();
        realm
            .heap_mut()
            .define_property(
                obj,
                key("hole"),
                PropertyDescriptor::Accessor {
                    get: None,
                    set: None,
                    enumerable: false,
                    configurable: true,
                },
            )
            .unwrap();
        let err = realm.get(&JsValue::Object(obj), &key("hole")).unwrap_err();
        assert!(matches!(err, FacadeError::Unreachable { .. }));
    }

    // -----------------------------------------------------------------------
    // Section 2: writes
    // -----------------------------------------------------------------------

    #[test]
    fn set_rejects_frozen_member() {
        let mut realm = realm();
        let obj = realm.create_plain_object();
        realm
            .define(obj, "fixed", JsValue::Number(1.0), AttributeFlags::FROZEN)
            .unwrap();
        assert!(!realm.set(obj, key("fixed"), JsValue::Number(2.0)).unwrap());
        assert_eq!(
            realm.get(&JsValue::Object(obj), &key("fixed")).unwrap(),
            JsValue::Number(1.0)
        );
    }

    #[test]
    fn array_index_write_grows_length() {
        let mut realm = realm();
        let proto = realm.intrinsics().array_prototype;
        let array = realm.create_array(proto, &[JsValue::Number(1.0)]).unwrap();
        realm.set(array, PropertyKey::from(4u32), JsValue::Null).unwrap();
        assert_eq!(
            realm.get(&JsValue::Object(array), &key("length")).unwrap(),
            JsValue::Number(5.0)
        );
        realm.set(array, PropertyKey::from(0u32), JsValue::Null).unwrap();
        assert_eq!(
            realm.get(&JsValue::Object(array), &key("length")).unwrap(),
            JsValue::Number(5.0)
        );
    }

    // -----------------------------------------------------------------------
    // Section 3: calls and construction
    // -----------------------------------------------------------------------

    #[test]
    fn calling_non_function_fails() {
        let mut realm = realm();
        let obj = realm.create_plain_object();
        let err = realm
            .call(&JsValue::Object(obj), &JsValue::Undefined, &[])
            .unwrap_err();
        assert!(matches!(err, FacadeError::TypeError { .. }));
        let err = realm
            .call(&JsValue::Number(1.0), &JsValue::Undefined, &[])
            .unwrap_err();
        assert_eq!(err.to_string(), "TypeError: number is not a function");
    }

    #[test]
    fn native_function_is_not_a_constructor() {
        let mut realm = realm();
        let f = realm
            .create_native_function("noop", Rc::new(|_: &mut Realm, _: &JsValue, _: &[JsValue]| {
                Ok(JsValue::Undefined)
            }))
            .unwrap();
        assert!(realm.is_callable(&JsValue::Object(f)));
        assert!(!realm.is_constructor(&JsValue::Object(f)));
        assert!(realm.construct(f, &[]).is_err());
        assert_eq!(realm.function_name(f), Some("noop"));
    }

    #[test]
    fn derived_constructor_runs_base_then_init() {
        let mut realm = realm();
        let base = realm.intrinsics().object_constructor;
        let init: InitFn = Rc::new(|realm: &mut Realm, this: ObjectHandle, args: &[JsValue]| {
            let x = args.first().cloned().unwrap_or(JsValue::Number(0.0));
            realm.set(this, PropertyKey::from("x"), x)?;
            Ok(())
        });
        let point = realm.derive_constructor(base, "Point", Some(init)).unwrap();
        let p = realm.construct(point, &[JsValue::Number(3.0)]).unwrap();

        assert_eq!(
            realm.get(&JsValue::Object(p), &key("x")).unwrap(),
            JsValue::Number(3.0)
        );
        assert!(realm.instance_of(&JsValue::Object(p), point).unwrap());
        assert!(realm.instance_of(&JsValue::Object(p), base).unwrap());
        assert!(realm.is_variant_of(point, base));
        assert!(!realm.is_variant_of(base, point));
    }

    #[test]
    fn derived_constructor_cannot_be_called() {
        let mut realm = realm();
        let base = realm.intrinsics().object_constructor;
        let derived = realm.derive_constructor(base, "Plain", None).unwrap();
        let err = realm
            .call(&JsValue::Object(derived), &JsValue::Undefined, &[])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: Class constructor Plain cannot be invoked without 'new'"
        );
    }

    #[test]
    fn derived_prototype_is_frozen() {
        let mut realm = realm();
        let base = realm.intrinsics().object_constructor;
        let derived = realm.derive_constructor(base, "Frozen", None).unwrap();
        let other = realm.create_plain_object();
        assert!(!realm.set(derived, key("prototype"), JsValue::Object(other)).unwrap());
    }

    #[test]
    fn instance_of_primitive_is_false() {
        let mut realm = realm();
        let ctor = realm.intrinsics().number_constructor;
        assert!(!realm.instance_of(&JsValue::Number(1.0), ctor).unwrap());
    }

    // -----------------------------------------------------------------------
    // Section 4: reclamation
    // -----------------------------------------------------------------------

    #[test]
    fn collection_keeps_roots_and_drops_garbage() {
        let mut realm = realm();
        let kept = realm.create_plain_object();
        let dropped = realm.create_plain_object();
        let stats = realm.collect_garbage(&[kept]);

        assert!(stats.swept_count >= 1);
        assert!(realm.heap().is_live(kept));
        assert!(!realm.heap().is_live(dropped));
        assert!(realm.heap().is_live(realm.intrinsics().object_prototype));
        let last = realm.events().events().last().unwrap().clone();
        assert_eq!(last.event, "collection_complete");
    }

    #[test]
    fn collection_drops_dead_functions() {
        let mut realm = realm();
        let f = realm
            .create_native_function("tmp", Rc::new(|_: &mut Realm, _: &JsValue, _: &[JsValue]| {
                Ok(JsValue::Null)
            }))
            .unwrap();
        realm.collect_garbage(&[]);
        assert!(!realm.is_callable(&JsValue::Object(f)));
    }

    #[test]
    fn pinned_handles_survive() {
        let mut realm = realm();
        let obj = realm.create_plain_object();
        realm.pin(obj);
        realm.collect_garbage(&[]);
        assert!(realm.heap().is_live(obj));
    }
}
