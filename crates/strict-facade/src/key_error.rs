//! `KeyError`: the strict-access error.
//!
//! Two construction paths share one class:
//!
//! - the public constructor validates its argument is a string or symbol
//!   and fails with `InvalidArgument` otherwise;
//! - the internal fast path ([`construct_internal`], used by the strict get
//!   trap) skips validation.
//!
//! Both build a `RangeError` on behalf of the requesting constructor with a
//! rendered label as message, then record the original key in the realm's
//! error-detail table. The key is readable only through the `key` accessor
//! on `KeyError.prototype`, which fails with `NotAKeyError` on objects the
//! class never built.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::conversion::as_property_key;
use crate::descriptor::AttributeFlags;
use crate::error::{ERROR_INVALID_ARGUMENT, ERROR_NOT_A_KEY_ERROR, FacadeError};
use crate::error_detail::DetailLookup;
use crate::facade::{CallContext, ConstructContext, EntryBehavior};
use crate::intrinsics::Intrinsics;
use crate::object_model::{JsValue, ObjectHandle, ObjectHeap, PropertyKey};
use crate::realm::{FunctionBody, Realm, alloc_function_object};

/// Handles of the `KeyError` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyErrorClass {
    /// The public, validating constructor.
    pub constructor: ObjectHandle,
    /// Shared prototype carrying `name` and the `key` accessor.
    pub prototype: ObjectHandle,
    pub key_getter: ObjectHandle,
}

impl KeyErrorClass {
    pub(crate) fn allocate(heap: &mut ObjectHeap, intrinsics: &Intrinsics) -> Self {
        let prototype = heap.alloc(Some(intrinsics.range_error_prototype));
        // KeyError[[Prototype]] = RangeError
        let constructor = alloc_function_object(heap, intrinsics.range_error_constructor, true);
        let key_getter = alloc_function_object(heap, intrinsics.function_prototype, false);
        Self {
            constructor,
            prototype,
            key_getter,
        }
    }

    pub fn handles(&self) -> [ObjectHandle; 3] {
        [self.constructor, self.prototype, self.key_getter]
    }
}

pub(crate) fn install(realm: &mut Realm) -> Result<(), FacadeError> {
    let class = *realm.key_error_class();
    let range_error = realm.intrinsics().range_error_constructor;

    realm.register_function(
        class.constructor,
        "KeyError",
        FunctionBody::Entry(Rc::new(PublicConstructor)),
    )?;
    realm.register_function(
        class.key_getter,
        "get key",
        FunctionBody::Native(Rc::new(key_accessor)),
    )?;
    realm.declare_variant(class.constructor, range_error);

    realm.define(
        class.constructor,
        "prototype",
        JsValue::Object(class.prototype),
        AttributeFlags::FROZEN,
    )?;
    realm.define(
        class.prototype,
        "constructor",
        JsValue::Object(class.constructor),
        AttributeFlags::HIDDEN,
    )?;
    realm.define(
        class.prototype,
        "name",
        JsValue::from("KeyError"),
        AttributeFlags::HIDDEN,
    )?;
    realm.heap_mut().define_property(
        class.prototype,
        PropertyKey::from("key"),
        crate::object_model::PropertyDescriptor::getter(class.key_getter),
    )?;
    // KeyError.prototype.key is null rather than an interface violation.
    realm.error_details_mut().register_empty(class.prototype);
    Ok(())
}

/// Label shown in the message: `"name"` for strings, `Symbol(desc)` for
/// symbols.
pub fn render_key(realm: &Realm, key: &PropertyKey) -> String {
    match key {
        PropertyKey::String(s) => format!("\"{s}\""),
        PropertyKey::Symbol(id) => realm.symbols().render(*id),
    }
}

fn build(
    realm: &mut Realm,
    key: PropertyKey,
    new_target: ObjectHandle,
    origin: &str,
) -> Result<ObjectHandle, FacadeError> {
    let label = render_key(realm, &key);
    let range_error = realm.intrinsics().range_error_constructor;
    let instance = realm.construct_with(range_error, &[JsValue::Str(label.clone())], new_target)?;
    if !realm.error_details_mut().attach(instance, key) {
        return Err(FacadeError::Unreachable {
            context: "error detail written twice for one instance",
        });
    }
    realm.record_pass(
        "key_error",
        "key_error_constructed",
        Some(format!("{origin} {label}")),
    );
    Ok(instance)
}

/// Internal fast path: build a `KeyError` for a key already known to be
/// valid.
pub fn construct_internal(realm: &mut Realm, key: PropertyKey) -> Result<ObjectHandle, FacadeError> {
    let ctor = realm.key_error_class().constructor;
    build(realm, key, ctor, "internal")
}

/// The error a strict read raises for `key`.
pub fn raise(realm: &mut Realm, key: PropertyKey) -> FacadeError {
    let label = render_key(realm, &key);
    match construct_internal(realm, key) {
        Ok(instance) => FacadeError::KeyError { instance, label },
        Err(err) => err,
    }
}

/// Read `key` off `instance` the way user code would, through the accessor.
pub fn key_of(realm: &mut Realm, instance: &JsValue) -> Result<JsValue, FacadeError> {
    realm.get(instance, &PropertyKey::from("key"))
}

struct PublicConstructor;

impl EntryBehavior for PublicConstructor {
    fn name(&self) -> &str {
        "KeyError"
    }

    /// Called without `new`: constructs as `KeyError` itself.
    fn invoke(
        &self,
        realm: &mut Realm,
        cx: &CallContext,
        args: &[JsValue],
    ) -> Result<JsValue, FacadeError> {
        let instance = realm.construct_with(cx.callee, args, cx.callee)?;
        Ok(JsValue::Object(instance))
    }

    fn construct(
        &self,
        realm: &mut Realm,
        cx: &ConstructContext,
        args: &[JsValue],
    ) -> Result<Option<ObjectHandle>, FacadeError> {
        let argument = args.first().unwrap_or(&JsValue::Undefined);
        let Some(key) = as_property_key(argument) else {
            let received = argument.type_name();
            realm.record_failure(
                "key_error",
                "invalid_key_argument",
                ERROR_INVALID_ARGUMENT,
                Some(received.to_string()),
            );
            return Err(FacadeError::InvalidArgument { received });
        };
        build(realm, key, cx.new_target, "public").map(Some)
    }
}

fn key_accessor(realm: &mut Realm, this: &JsValue, _args: &[JsValue]) -> Result<JsValue, FacadeError> {
    let lookup = match this.as_object() {
        Some(handle) => match realm.error_details().lookup(handle) {
            DetailLookup::Key(key) => return Ok(key.to_value()),
            DetailLookup::Empty => return Ok(JsValue::Null),
            DetailLookup::Missing => handle.to_string(),
        },
        None => this.type_name().to_string(),
    };
    realm.record_failure(
        "key_error",
        "interface_violation",
        ERROR_NOT_A_KEY_ERROR,
        Some(lookup),
    );
    Err(FacadeError::NotAKeyError)
}
