//! Base prototypes and constructors every realm starts with.
//!
//! Each constructor is an entry point backed by [`NativeConstructor`]: a
//! plain call converts its argument, construction builds an instance
//! delegating to `new_target.prototype`. The facades delegate to these.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::conversion::{self, number_to_string, to_boolean, to_property_key};
use crate::descriptor::AttributeFlags;
use crate::error::FacadeError;
use crate::facade::{CallContext, ConstructContext, EntryBehavior};
use crate::object_model::{JsValue, ObjectHandle, ObjectHeap, OrdinaryObject, PropertyKey};
use crate::realm::{FunctionBody, Realm, alloc_function_object};

type NativeMethod = fn(&mut Realm, &JsValue, &[JsValue]) -> Result<JsValue, FacadeError>;

/// Handles of the intrinsic objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub object_prototype: ObjectHandle,
    pub function_prototype: ObjectHandle,
    pub boolean_prototype: ObjectHandle,
    pub number_prototype: ObjectHandle,
    pub string_prototype: ObjectHandle,
    pub array_prototype: ObjectHandle,
    pub error_prototype: ObjectHandle,
    pub range_error_prototype: ObjectHandle,
    pub object_constructor: ObjectHandle,
    pub boolean_constructor: ObjectHandle,
    pub number_constructor: ObjectHandle,
    pub string_constructor: ObjectHandle,
    pub array_constructor: ObjectHandle,
    pub error_constructor: ObjectHandle,
    pub range_error_constructor: ObjectHandle,
}

impl Intrinsics {
    /// Allocate the bare objects. Bodies and members come from [`install`].
    pub(crate) fn allocate(heap: &mut ObjectHeap) -> Self {
        let object_prototype = heap.alloc(None);
        let tagged = |heap: &mut ObjectHeap, tag: &str, primitive: Option<JsValue>| {
            heap.alloc_ordinary(OrdinaryObject {
                class_tag: Some(tag.to_string()),
                primitive,
                ..OrdinaryObject::with_prototype(Some(object_prototype))
            })
        };
        let function_prototype = tagged(heap, "Function", None);
        let boolean_prototype = tagged(heap, "Boolean", Some(JsValue::Bool(false)));
        let number_prototype = tagged(heap, "Number", Some(JsValue::Number(0.0)));
        let string_prototype = tagged(heap, "String", Some(JsValue::Str(String::new())));
        let array_prototype = tagged(heap, "Array", None);
        let error_prototype = heap.alloc(Some(object_prototype));
        let range_error_prototype = heap.alloc(Some(error_prototype));

        let object_constructor = alloc_function_object(heap, function_prototype, true);
        let boolean_constructor = alloc_function_object(heap, function_prototype, true);
        let number_constructor = alloc_function_object(heap, function_prototype, true);
        let string_constructor = alloc_function_object(heap, function_prototype, true);
        let array_constructor = alloc_function_object(heap, function_prototype, true);
        let error_constructor = alloc_function_object(heap, function_prototype, true);
        let range_error_constructor = alloc_function_object(heap, error_constructor, true);

        Self {
            object_prototype,
            function_prototype,
            boolean_prototype,
            number_prototype,
            string_prototype,
            array_prototype,
            error_prototype,
            range_error_prototype,
            object_constructor,
            boolean_constructor,
            number_constructor,
            string_constructor,
            array_constructor,
            error_constructor,
            range_error_constructor,
        }
    }

    pub fn handles(&self) -> [ObjectHandle; 15] {
        [
            self.object_prototype,
            self.function_prototype,
            self.boolean_prototype,
            self.number_prototype,
            self.string_prototype,
            self.array_prototype,
            self.error_prototype,
            self.range_error_prototype,
            self.object_constructor,
            self.boolean_constructor,
            self.number_constructor,
            self.string_constructor,
            self.array_constructor,
            self.error_constructor,
            self.range_error_constructor,
        ]
    }
}

/// Which built-in a [`NativeConstructor`] implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativeKind {
    Object,
    Boolean,
    Number,
    String,
    Array,
    Error,
    RangeError,
}

impl NativeKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Boolean => "Boolean",
            Self::Number => "Number",
            Self::String => "String",
            Self::Array => "Array",
            Self::Error => "Error",
            Self::RangeError => "RangeError",
        }
    }
}

pub(crate) fn install(realm: &mut Realm) -> Result<(), FacadeError> {
    let i = *realm.intrinsics();
    let constructors = [
        (i.object_constructor, i.object_prototype, NativeKind::Object),
        (i.boolean_constructor, i.boolean_prototype, NativeKind::Boolean),
        (i.number_constructor, i.number_prototype, NativeKind::Number),
        (i.string_constructor, i.string_prototype, NativeKind::String),
        (i.array_constructor, i.array_prototype, NativeKind::Array),
        (i.error_constructor, i.error_prototype, NativeKind::Error),
        (i.range_error_constructor, i.range_error_prototype, NativeKind::RangeError),
    ];
    for (ctor, proto, kind) in constructors {
        realm.register_function(
            ctor,
            kind.name(),
            FunctionBody::Entry(Rc::new(NativeConstructor { kind })),
        )?;
        realm.define(ctor, "prototype", JsValue::Object(proto), AttributeFlags::FROZEN)?;
        realm.define(proto, "constructor", JsValue::Object(ctor), AttributeFlags::HIDDEN)?;
    }
    realm.declare_variant(i.range_error_constructor, i.error_constructor);

    let methods: [(ObjectHandle, &str, NativeMethod); 12] = [
        (i.object_prototype, "toString", object_to_string),
        (i.object_prototype, "valueOf", object_value_of),
        (i.object_prototype, "hasOwnProperty", object_has_own_property),
        (i.function_prototype, "toString", function_to_string),
        (i.boolean_prototype, "toString", boolean_to_string),
        (i.boolean_prototype, "valueOf", boolean_value_of),
        (i.number_prototype, "toString", number_to_string_method),
        (i.number_prototype, "valueOf", number_value_of),
        (i.string_prototype, "toString", string_value_of),
        (i.string_prototype, "valueOf", string_value_of),
        (i.array_prototype, "push", array_push),
        (i.array_prototype, "join", array_join),
    ];
    for (target, name, f) in methods {
        realm.define_method(target, name, Rc::new(f))?;
    }
    realm.define(i.array_prototype, "length", JsValue::Number(0.0), AttributeFlags::WRITABLE)?;

    realm.define(i.error_prototype, "name", JsValue::from("Error"), AttributeFlags::HIDDEN)?;
    realm.define(i.error_prototype, "message", JsValue::from(""), AttributeFlags::HIDDEN)?;
    realm.define_method(i.error_prototype, "toString", Rc::new(error_to_string_method))?;
    realm.define(
        i.range_error_prototype,
        "name",
        JsValue::from("RangeError"),
        AttributeFlags::HIDDEN,
    )?;
    realm.define(i.range_error_prototype, "message", JsValue::from(""), AttributeFlags::HIDDEN)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

struct NativeConstructor {
    kind: NativeKind,
}

impl EntryBehavior for NativeConstructor {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn invoke(
        &self,
        realm: &mut Realm,
        cx: &CallContext,
        args: &[JsValue],
    ) -> Result<JsValue, FacadeError> {
        let arg = args.first().unwrap_or(&JsValue::Undefined);
        match self.kind {
            NativeKind::Object => Ok(JsValue::Object(to_object(realm, arg)?)),
            NativeKind::Boolean => Ok(JsValue::Bool(to_boolean(arg))),
            NativeKind::Number => Ok(JsValue::Number(number_argument(realm, args)?)),
            NativeKind::String => Ok(JsValue::Str(string_argument(realm, args)?)),
            NativeKind::Array => {
                let proto = realm.intrinsics().array_prototype;
                Ok(JsValue::Object(array_from_arguments(realm, proto, args)?))
            }
            NativeKind::Error | NativeKind::RangeError => {
                let instance = realm.construct_with(cx.callee, args, cx.callee)?;
                Ok(JsValue::Object(instance))
            }
        }
    }

    fn construct(
        &self,
        realm: &mut Realm,
        cx: &ConstructContext,
        args: &[JsValue],
    ) -> Result<Option<ObjectHandle>, FacadeError> {
        let i = *realm.intrinsics();
        let arg = args.first().unwrap_or(&JsValue::Undefined);
        let instance = match self.kind {
            NativeKind::Object if cx.specialization.is_exact() => to_object(realm, arg)?,
            NativeKind::Object => {
                realm.create_from_constructor(cx.new_target, i.object_prototype, None, None)?
            }
            NativeKind::Boolean => realm.create_from_constructor(
                cx.new_target,
                i.boolean_prototype,
                Some("Boolean"),
                Some(JsValue::Bool(to_boolean(arg))),
            )?,
            NativeKind::Number => {
                let n = number_argument(realm, args)?;
                realm.create_from_constructor(
                    cx.new_target,
                    i.number_prototype,
                    Some("Number"),
                    Some(JsValue::Number(n)),
                )?
            }
            NativeKind::String => {
                let s = match arg {
                    JsValue::Symbol(_) => {
                        return Err(FacadeError::type_error(
                            "Cannot convert a Symbol value to a string",
                        ));
                    }
                    _ => string_argument(realm, args)?,
                };
                let proto = realm.prototype_from_constructor(cx.new_target, i.string_prototype)?;
                string_wrapper(realm, proto, s)?
            }
            NativeKind::Array => {
                let proto = realm.prototype_from_constructor(cx.new_target, i.array_prototype)?;
                array_from_arguments(realm, proto, args)?
            }
            NativeKind::Error | NativeKind::RangeError => {
                let fallback = if self.kind == NativeKind::Error {
                    i.error_prototype
                } else {
                    i.range_error_prototype
                };
                let instance =
                    realm.create_from_constructor(cx.new_target, fallback, Some("Error"), None)?;
                if !matches!(arg, JsValue::Undefined) {
                    let message = conversion::to_string(realm, arg)?;
                    realm.define(instance, "message", JsValue::Str(message), AttributeFlags::HIDDEN)?;
                }
                let stack = error_to_string(realm, &JsValue::Object(instance))?;
                realm.define(instance, "stack", JsValue::Str(stack), AttributeFlags::HIDDEN)?;
                instance
            }
        };
        Ok(Some(instance))
    }
}

/// `Number(value)`: no argument is `0`, big integers convert directly.
fn number_argument(realm: &mut Realm, args: &[JsValue]) -> Result<f64, FacadeError> {
    match args.first() {
        None => Ok(0.0),
        Some(JsValue::BigInt(n)) => Ok(*n as f64),
        Some(value) => conversion::to_number(realm, value),
    }
}

/// `String(value)`: no argument is `""`, symbols render descriptively.
fn string_argument(realm: &mut Realm, args: &[JsValue]) -> Result<String, FacadeError> {
    match args.first() {
        None => Ok(String::new()),
        Some(JsValue::Symbol(id)) => Ok(realm.symbols().render(*id)),
        Some(value) => conversion::to_string(realm, value),
    }
}

fn string_wrapper(
    realm: &mut Realm,
    proto: ObjectHandle,
    s: String,
) -> Result<ObjectHandle, FacadeError> {
    let length = s.encode_utf16().count() as f64;
    let handle = realm.heap_mut().alloc_ordinary(OrdinaryObject {
        class_tag: Some("String".to_string()),
        primitive: Some(JsValue::Str(s)),
        ..OrdinaryObject::with_prototype(Some(proto))
    });
    realm.define(handle, "length", JsValue::Number(length), AttributeFlags::FROZEN)?;
    Ok(handle)
}

/// `Array(n)` makes `n` empty slots; any other argument list becomes the
/// elements.
fn array_from_arguments(
    realm: &mut Realm,
    proto: ObjectHandle,
    args: &[JsValue],
) -> Result<ObjectHandle, FacadeError> {
    if let [JsValue::Number(n)] = args {
        let valid = *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX);
        if !valid {
            return Err(FacadeError::range_error("Invalid array length"));
        }
        let array = realm.create_array(proto, &[])?;
        realm.set(array, PropertyKey::from("length"), JsValue::Number(*n))?;
        return Ok(array);
    }
    realm.create_array(proto, args)
}

/// ToObject.
pub fn to_object(realm: &mut Realm, value: &JsValue) -> Result<ObjectHandle, FacadeError> {
    let i = *realm.intrinsics();
    let wrap = |realm: &mut Realm, proto: ObjectHandle, tag: &str| {
        realm.heap_mut().alloc_ordinary(OrdinaryObject {
            class_tag: Some(tag.to_string()),
            primitive: Some(value.clone()),
            ..OrdinaryObject::with_prototype(Some(proto))
        })
    };
    Ok(match value {
        JsValue::Undefined | JsValue::Null => realm.create_plain_object(),
        JsValue::Object(h) => *h,
        JsValue::Bool(_) => wrap(realm, i.boolean_prototype, "Boolean"),
        JsValue::Number(_) => wrap(realm, i.number_prototype, "Number"),
        JsValue::Str(s) => string_wrapper(realm, i.string_prototype, s.clone())?,
        JsValue::Symbol(_) => wrap(realm, i.object_prototype, "Symbol"),
        JsValue::BigInt(_) => wrap(realm, i.object_prototype, "BigInt"),
    })
}

// ---------------------------------------------------------------------------
// Prototype methods
// ---------------------------------------------------------------------------

fn object_to_string(realm: &mut Realm, this: &JsValue, _: &[JsValue]) -> Result<JsValue, FacadeError> {
    let tag = match this {
        JsValue::Undefined => "Undefined".to_string(),
        JsValue::Null => "Null".to_string(),
        JsValue::Bool(_) => "Boolean".to_string(),
        JsValue::Number(_) => "Number".to_string(),
        JsValue::Str(_) => "String".to_string(),
        JsValue::Symbol(_) => "Symbol".to_string(),
        JsValue::BigInt(_) => "BigInt".to_string(),
        JsValue::Object(h) => realm
            .heap()
            .ordinary(*h)?
            .class_tag
            .clone()
            .unwrap_or_else(|| "Object".to_string()),
    };
    Ok(JsValue::Str(format!("[object {tag}]")))
}

fn object_value_of(realm: &mut Realm, this: &JsValue, _: &[JsValue]) -> Result<JsValue, FacadeError> {
    if this.is_nullish() {
        return Err(FacadeError::type_error("Cannot convert undefined or null to object"));
    }
    Ok(JsValue::Object(to_object(realm, this)?))
}

fn object_has_own_property(
    realm: &mut Realm,
    this: &JsValue,
    args: &[JsValue],
) -> Result<JsValue, FacadeError> {
    let key = to_property_key(realm, args.first().unwrap_or(&JsValue::Undefined))?;
    if this.is_nullish() {
        return Err(FacadeError::type_error("Cannot convert undefined or null to object"));
    }
    let holder = to_object(realm, this)?;
    Ok(JsValue::Bool(realm.heap().has_own(holder, &key)?))
}

fn function_to_string(realm: &mut Realm, this: &JsValue, _: &[JsValue]) -> Result<JsValue, FacadeError> {
    match this.as_object().and_then(|h| realm.function_name(h)) {
        Some(name) => Ok(JsValue::Str(format!("function {name}() {{ [native code] }}"))),
        None => Err(FacadeError::type_error(
            "Function.prototype.toString requires that 'this' be a Function",
        )),
    }
}

/// The primitive behind `this`: the primitive itself, or a wrapper's slot.
fn this_primitive(
    realm: &Realm,
    this: &JsValue,
    accepts: fn(&JsValue) -> bool,
    method: &str,
    type_name: &str,
) -> Result<JsValue, FacadeError> {
    if accepts(this) {
        return Ok(this.clone());
    }
    if let Some(h) = this.as_object()
        && let Some(prim) = &realm.heap().ordinary(h)?.primitive
        && accepts(prim)
    {
        return Ok(prim.clone());
    }
    Err(FacadeError::type_error(format!(
        "{method} requires that 'this' be a {type_name}"
    )))
}

fn boolean_value_of(realm: &mut Realm, this: &JsValue, _: &[JsValue]) -> Result<JsValue, FacadeError> {
    this_primitive(
        realm,
        this,
        |v| matches!(v, JsValue::Bool(_)),
        "Boolean.prototype.valueOf",
        "Boolean",
    )
}

fn boolean_to_string(realm: &mut Realm, this: &JsValue, _: &[JsValue]) -> Result<JsValue, FacadeError> {
    let prim = this_primitive(
        realm,
        this,
        |v| matches!(v, JsValue::Bool(_)),
        "Boolean.prototype.toString",
        "Boolean",
    )?;
    Ok(JsValue::Str(prim.to_string()))
}

fn number_value_of(realm: &mut Realm, this: &JsValue, _: &[JsValue]) -> Result<JsValue, FacadeError> {
    this_primitive(
        realm,
        this,
        |v| matches!(v, JsValue::Number(_)),
        "Number.prototype.valueOf",
        "Number",
    )
}

fn number_to_string_method(
    realm: &mut Realm,
    this: &JsValue,
    args: &[JsValue],
) -> Result<JsValue, FacadeError> {
    let JsValue::Number(n) = this_primitive(
        realm,
        this,
        |v| matches!(v, JsValue::Number(_)),
        "Number.prototype.toString",
        "Number",
    )?
    else {
        return Err(FacadeError::Unreachable {
            context: "number primitive check accepted a non-number",
        });
    };
    match args.first() {
        None | Some(JsValue::Undefined) => {}
        Some(JsValue::Number(radix)) if *radix == 10.0 => {}
        Some(_) => {
            return Err(FacadeError::type_error(
                "toString() radix other than 10 is not supported",
            ));
        }
    }
    Ok(JsValue::Str(number_to_string(n)))
}

fn string_value_of(realm: &mut Realm, this: &JsValue, _: &[JsValue]) -> Result<JsValue, FacadeError> {
    this_primitive(
        realm,
        this,
        |v| matches!(v, JsValue::Str(_)),
        "String.prototype.valueOf",
        "String",
    )
}

/// Longest string `join` will build, in bytes.
const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

fn array_length(realm: &mut Realm, this: &JsValue) -> Result<u32, FacadeError> {
    let length = realm.get(this, &PropertyKey::from("length"))?;
    let n = conversion::to_number(realm, &length)?;
    if n.is_nan() || n <= 0.0 {
        return Ok(0);
    }
    Ok(n.min(f64::from(u32::MAX)).trunc() as u32)
}

fn array_push(realm: &mut Realm, this: &JsValue, args: &[JsValue]) -> Result<JsValue, FacadeError> {
    let Some(target) = this.as_object() else {
        return Err(FacadeError::type_error(
            "Array.prototype.push called on a non-object",
        ));
    };
    let start = array_length(realm, this)?;
    let end = u32::try_from(args.len())
        .ok()
        .and_then(|count| start.checked_add(count))
        .ok_or_else(|| FacadeError::range_error("Invalid array length"))?;
    for (index, value) in (start..end).zip(args) {
        if !realm.set(target, PropertyKey::from(index), value.clone())? {
            return Err(FacadeError::type_error(format!(
                "Cannot assign to read only property '{index}'"
            )));
        }
    }
    let new_length = JsValue::Number(f64::from(end));
    if !realm.set(target, PropertyKey::from("length"), new_length.clone())? {
        return Err(FacadeError::type_error(
            "Cannot assign to read only property 'length'",
        ));
    }
    Ok(new_length)
}

fn array_join(realm: &mut Realm, this: &JsValue, args: &[JsValue]) -> Result<JsValue, FacadeError> {
    let separator = match args.first() {
        None | Some(JsValue::Undefined) => ",".to_string(),
        Some(sep) => conversion::to_string(realm, sep)?,
    };
    let length = array_length(realm, this)?;
    let separators = (length as usize).saturating_sub(1);
    if separators.saturating_mul(separator.len()) > MAX_STRING_LENGTH {
        return Err(FacadeError::range_error("Invalid string length"));
    }
    let mut joined = String::new();
    for index in 0..length {
        if index > 0 {
            joined.push_str(&separator);
        }
        let element = realm.get(this, &PropertyKey::from(index))?;
        if !element.is_nullish() {
            joined.push_str(&conversion::to_string(realm, &element)?);
        }
        if joined.len() > MAX_STRING_LENGTH {
            return Err(FacadeError::range_error("Invalid string length"));
        }
    }
    Ok(JsValue::Str(joined))
}

/// `name: message`, dropping whichever half is empty.
pub fn error_to_string(realm: &mut Realm, this: &JsValue) -> Result<String, FacadeError> {
    let name = match realm.get(this, &PropertyKey::from("name"))? {
        JsValue::Undefined => "Error".to_string(),
        other => conversion::to_string(realm, &other)?,
    };
    let message = match realm.get(this, &PropertyKey::from("message"))? {
        JsValue::Undefined => String::new(),
        other => conversion::to_string(realm, &other)?,
    };
    Ok(match (name.is_empty(), message.is_empty()) {
        (true, _) => message,
        (false, true) => name,
        (false, false) => format!("{name}: {message}"),
    })
}

fn error_to_string_method(
    realm: &mut Realm,
    this: &JsValue,
    _: &[JsValue],
) -> Result<JsValue, FacadeError> {
    if !this.is_object() {
        return Err(FacadeError::type_error(
            "Error.prototype.toString requires that 'this' be an Object",
        ));
    }
    Ok(JsValue::Str(error_to_string(realm, this)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RealmConfig;

    fn realm() -> Realm {
        Realm::new(RealmConfig::default()).unwrap()
    }

    fn call_ctor(realm: &mut Realm, ctor: ObjectHandle, args: &[JsValue]) -> JsValue {
        realm
            .call(&JsValue::Object(ctor), &JsValue::Undefined, args)
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // Section 1: wiring
    // -----------------------------------------------------------------------

    #[test]
    fn prototypes_and_constructors_point_at_each_other() {
        let mut realm = realm();
        let i = *realm.intrinsics();
        for (ctor, proto) in [
            (i.object_constructor, i.object_prototype),
            (i.number_constructor, i.number_prototype),
            (i.range_error_constructor, i.range_error_prototype),
        ] {
            assert_eq!(
                realm
                    .get(&JsValue::Object(ctor), &PropertyKey::from("prototype"))
                    .unwrap(),
                JsValue::Object(proto)
            );
            assert_eq!(
                realm
                    .get(&JsValue::Object(proto), &PropertyKey::from("constructor"))
                    .unwrap(),
                JsValue::Object(ctor)
            );
        }
    }

    #[test]
    fn builtin_members_are_hidden() {
        let realm = realm();
        let proto = realm.intrinsics().object_prototype;
        let desc = realm
            .heap()
            .get_own_property_descriptor(proto, &PropertyKey::from("toString"))
            .unwrap()
            .unwrap();
        assert!(!desc.is_enumerable());
        assert!(desc.is_writable());
        assert!(desc.is_configurable());
    }

    // -----------------------------------------------------------------------
    // Section 2: plain-call conversions
    // -----------------------------------------------------------------------

    #[test]
    fn plain_calls_convert() {
        let mut realm = realm();
        let i = *realm.intrinsics();
        assert_eq!(
            call_ctor(&mut realm, i.boolean_constructor, &[JsValue::from("")]),
            JsValue::Bool(false)
        );
        assert_eq!(
            call_ctor(&mut realm, i.number_constructor, &[JsValue::from("12")]),
            JsValue::Number(12.0)
        );
        assert_eq!(
            call_ctor(&mut realm, i.number_constructor, &[]),
            JsValue::Number(0.0)
        );
        assert_eq!(
            call_ctor(&mut realm, i.number_constructor, &[JsValue::BigInt(5)]),
            JsValue::Number(5.0)
        );
        assert_eq!(
            call_ctor(&mut realm, i.string_constructor, &[JsValue::Number(9.0)]),
            JsValue::from("9")
        );
        let sym = realm.new_symbol(Some("tag"));
        assert_eq!(
            call_ctor(&mut realm, i.string_constructor, &[JsValue::Symbol(sym)]),
            JsValue::from("Symbol(tag)")
        );
    }

    #[test]
    fn object_call_passes_objects_through() {
        let mut realm = realm();
        let ctor = realm.intrinsics().object_constructor;
        let obj = realm.create_plain_object();
        assert_eq!(
            call_ctor(&mut realm, ctor, &[JsValue::Object(obj)]),
            JsValue::Object(obj)
        );
        let a = call_ctor(&mut realm, ctor, &[]);
        let b = call_ctor(&mut realm, ctor, &[]);
        assert_ne!(a, b);
    }

    // -----------------------------------------------------------------------
    // Section 3: construction
    // -----------------------------------------------------------------------

    #[test]
    fn wrappers_answer_value_of() {
        let mut realm = realm();
        let i = *realm.intrinsics();
        let n = realm.construct(i.number_constructor, &[JsValue::Number(2.5)]).unwrap();
        let value = realm.invoke_method(&JsValue::Object(n), "valueOf", &[]).unwrap();
        assert_eq!(value, JsValue::Number(2.5));

        let s = realm.construct(i.string_constructor, &[JsValue::from("ab")]).unwrap();
        assert_eq!(
            realm.get(&JsValue::Object(s), &PropertyKey::from("length")).unwrap(),
            JsValue::Number(2.0)
        );
        let text = realm.invoke_method(&JsValue::Object(s), "toString", &[]).unwrap();
        assert_eq!(text, JsValue::from("ab"));
    }

    #[test]
    fn value_of_rejects_foreign_receiver() {
        let mut realm = realm();
        let proto = realm.intrinsics().number_prototype;
        let f = realm
            .get(&JsValue::Object(proto), &PropertyKey::from("valueOf"))
            .unwrap();
        let err = realm.call(&f, &JsValue::from("x"), &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: Number.prototype.valueOf requires that 'this' be a Number"
        );
    }

    #[test]
    fn string_construct_rejects_symbol() {
        let mut realm = realm();
        let ctor = realm.intrinsics().string_constructor;
        let sym = realm.new_symbol(None);
        assert!(realm.construct(ctor, &[JsValue::Symbol(sym)]).is_err());
    }

    #[test]
    fn array_constructor_forms() {
        let mut realm = realm();
        let ctor = realm.intrinsics().array_constructor;
        let sized = realm.construct(ctor, &[JsValue::Number(3.0)]).unwrap();
        assert_eq!(
            realm.get(&JsValue::Object(sized), &PropertyKey::from("length")).unwrap(),
            JsValue::Number(3.0)
        );
        let listed = realm
            .construct(ctor, &[JsValue::Number(1.0), JsValue::Number(2.0)])
            .unwrap();
        let joined = realm
            .invoke_method(&JsValue::Object(listed), "join", &[JsValue::from("-")])
            .unwrap();
        assert_eq!(joined, JsValue::from("1-2"));
        assert!(realm.construct(ctor, &[JsValue::Number(-1.0)]).is_err());
    }

    #[test]
    fn push_appends_and_returns_length() {
        let mut realm = realm();
        let proto = realm.intrinsics().array_prototype;
        let array = realm.create_array(proto, &[]).unwrap();
        let len = realm
            .invoke_method(
                &JsValue::Object(array),
                "push",
                &[JsValue::Number(1.0), JsValue::from("two")],
            )
            .unwrap();
        assert_eq!(len, JsValue::Number(2.0));
        let joined = realm.invoke_method(&JsValue::Object(array), "join", &[]).unwrap();
        assert_eq!(joined, JsValue::from("1,two"));
    }

    #[test]
    fn push_past_max_length_is_a_range_error() {
        let mut realm = realm();
        let obj = realm.create_plain_object();
        let full = JsValue::Number(f64::from(u32::MAX));
        realm.set(obj, PropertyKey::from("length"), full.clone()).unwrap();
        let err = array_push(&mut realm, &JsValue::Object(obj), &[JsValue::Null]).unwrap_err();
        assert_eq!(err, FacadeError::range_error("Invalid array length"));
        assert_eq!(
            realm.get(&JsValue::Object(obj), &PropertyKey::from("length")).unwrap(),
            full
        );
        assert!(
            !realm
                .heap()
                .has_own(obj, &PropertyKey::from(u32::MAX))
                .unwrap()
        );
    }

    #[test]
    fn join_over_huge_length_is_a_range_error() {
        let mut realm = realm();
        let obj = realm.create_plain_object();
        realm
            .set(obj, PropertyKey::from("length"), JsValue::Number(f64::from(u32::MAX)))
            .unwrap();
        let err = array_join(&mut realm, &JsValue::Object(obj), &[]).unwrap_err();
        assert_eq!(err.to_string(), "RangeError: Invalid string length");
        assert_eq!(err.stable_code(), crate::error::ERROR_RANGE);
    }

    #[test]
    fn join_skips_nullish_elements() {
        let mut realm = realm();
        let proto = realm.intrinsics().array_prototype;
        let array = realm
            .create_array(proto, &[JsValue::Null, JsValue::Number(2.0), JsValue::Undefined])
            .unwrap();
        let joined = array_join(&mut realm, &JsValue::Object(array), &[JsValue::from("+")]).unwrap();
        assert_eq!(joined, JsValue::from("+2+"));
    }

    #[test]
    fn errors_render_name_and_message() {
        let mut realm = realm();
        let ctor = realm.intrinsics().range_error_constructor;
        let err = realm.construct(ctor, &[JsValue::from("out of range")]).unwrap();
        let text = realm.invoke_method(&JsValue::Object(err), "toString", &[]).unwrap();
        assert_eq!(text, JsValue::from("RangeError: out of range"));
        let bare = realm.construct(ctor, &[]).unwrap();
        let text = realm.invoke_method(&JsValue::Object(bare), "toString", &[]).unwrap();
        assert_eq!(text, JsValue::from("RangeError"));
    }

    #[test]
    fn object_to_string_tags() {
        let mut realm = realm();
        let i = *realm.intrinsics();
        let b = realm.construct(i.boolean_constructor, &[JsValue::Bool(true)]).unwrap();
        let tag = object_to_string(&mut realm, &JsValue::Object(b), &[]).unwrap();
        assert_eq!(tag, JsValue::from("[object Boolean]"));
        let tag = object_to_string(&mut realm, &JsValue::Null, &[]).unwrap();
        assert_eq!(tag, JsValue::from("[object Null]"));
        let tag = object_to_string(&mut realm, &JsValue::Object(i.number_constructor), &[]).unwrap();
        assert_eq!(tag, JsValue::from("[object Function]"));
    }

    #[test]
    fn has_own_property_checks_own_only() {
        let mut realm = realm();
        let obj = realm.create_plain_object();
        realm.set(obj, PropertyKey::from("own"), JsValue::Null).unwrap();
        let own = realm
            .invoke_method(&JsValue::Object(obj), "hasOwnProperty", &[JsValue::from("own")])
            .unwrap();
        let inherited = realm
            .invoke_method(
                &JsValue::Object(obj),
                "hasOwnProperty",
                &[JsValue::from("toString")],
            )
            .unwrap();
        assert_eq!(own, JsValue::Bool(true));
        assert_eq!(inherited, JsValue::Bool(false));
    }
}
