//! The five built-in facades.
//!
//! | entry point     | delegation target   | plain call               | construction              |
//! |-----------------|---------------------|--------------------------|---------------------------|
//! | `StaticObject`  | `Object.prototype`  | category dispatch        | dispatch if exact         |
//! | `StaticBoolean` | `Boolean.prototype` | `Boolean(v)`             | wrapper on the view       |
//! | `StaticNumber`  | `Number.prototype`  | `Number(v)`              | wrapper on the view       |
//! | `StaticString`  | `String.prototype`  | `String(v)`              | wrapper on the view       |
//! | `StaticArray`   | `Array.prototype`   | empty array on the view  | default construction      |

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{ERROR_UNIMPLEMENTED, FacadeError};
use crate::facade::{CallContext, ConstructContext, EntryBehavior, build_facade, intercepted_view};
use crate::object_model::{JsValue, ObjectHandle, SymbolId};
use crate::realm::Realm;

/// Runtime category of a construction argument. Matched exhaustively by
/// the generic-object facade.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueCategory {
    Nullish,
    Boolean(bool),
    Number(f64),
    String(String),
    Symbol(SymbolId),
    BigInt(i128),
    Object(ObjectHandle),
}

impl ValueCategory {
    pub fn of(value: &JsValue) -> Self {
        match value {
            JsValue::Undefined | JsValue::Null => Self::Nullish,
            JsValue::Bool(b) => Self::Boolean(*b),
            JsValue::Number(n) => Self::Number(*n),
            JsValue::Str(s) => Self::String(s.clone()),
            JsValue::Symbol(id) => Self::Symbol(*id),
            JsValue::BigInt(n) => Self::BigInt(*n),
            JsValue::Object(h) => Self::Object(*h),
        }
    }
}

/// Which facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacadeKind {
    Object,
    Boolean,
    Number,
    String,
    Array,
}

/// Entry points of the five built-in facades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facades {
    pub object: ObjectHandle,
    pub boolean: ObjectHandle,
    pub number: ObjectHandle,
    pub string: ObjectHandle,
    pub array: ObjectHandle,
}

impl Facades {
    /// Build all five facades in `realm`.
    pub fn install(realm: &mut Realm) -> Result<Self, FacadeError> {
        let i = *realm.intrinsics();
        let boolean = build_facade(realm, i.boolean_prototype, |_, _| {
            Ok(Rc::new(PrimitiveFacade {
                name: "StaticBoolean",
                native: i.boolean_constructor,
            }))
        })?;
        let number = build_facade(realm, i.number_prototype, |_, _| {
            Ok(Rc::new(PrimitiveFacade {
                name: "StaticNumber",
                native: i.number_constructor,
            }))
        })?;
        let string = build_facade(realm, i.string_prototype, |_, _| {
            Ok(Rc::new(PrimitiveFacade {
                name: "StaticString",
                native: i.string_constructor,
            }))
        })?;
        let object = build_facade(realm, i.object_prototype, |_, view| {
            Ok(Rc::new(ObjectFacade {
                view,
                boolean,
                number,
                string,
            }))
        })?;
        let array = build_facade(realm, i.array_prototype, |_, view| {
            Ok(Rc::new(ListFacade { view }))
        })?;
        Ok(Self {
            object,
            boolean,
            number,
            string,
            array,
        })
    }

    pub fn entry(&self, kind: FacadeKind) -> ObjectHandle {
        match kind {
            FacadeKind::Object => self.object,
            FacadeKind::Boolean => self.boolean,
            FacadeKind::Number => self.number,
            FacadeKind::String => self.string,
            FacadeKind::Array => self.array,
        }
    }

    /// The strict view behind a facade.
    pub fn view(&self, realm: &Realm, kind: FacadeKind) -> Result<ObjectHandle, FacadeError> {
        intercepted_view(realm, self.entry(kind))
    }
}

/// Boolean, number and string facades: plain calls convert through the
/// native constructor; construction asks the native constructor for a
/// wrapper delegating to `new_target.prototype`.
struct PrimitiveFacade {
    name: &'static str,
    native: ObjectHandle,
}

impl EntryBehavior for PrimitiveFacade {
    fn name(&self) -> &str {
        self.name
    }

    fn invoke(
        &self,
        realm: &mut Realm,
        _cx: &CallContext,
        args: &[JsValue],
    ) -> Result<JsValue, FacadeError> {
        realm.call(&JsValue::Object(self.native), &JsValue::Undefined, args)
    }

    fn construct(
        &self,
        realm: &mut Realm,
        cx: &ConstructContext,
        args: &[JsValue],
    ) -> Result<Option<ObjectHandle>, FacadeError> {
        realm
            .construct_with(self.native, args, cx.new_target)
            .map(Some)
    }
}

struct ObjectFacade {
    view: ObjectHandle,
    boolean: ObjectHandle,
    number: ObjectHandle,
    string: ObjectHandle,
}

impl ObjectFacade {
    fn dispatch(&self, realm: &mut Realm, value: &JsValue) -> Result<ObjectHandle, FacadeError> {
        let unimplemented = |realm: &mut Realm, category: &'static str| {
            realm.record_failure(
                "categories",
                "category_unimplemented",
                ERROR_UNIMPLEMENTED,
                Some(category.to_string()),
            );
            Err(FacadeError::Unimplemented { category })
        };
        match ValueCategory::of(value) {
            ValueCategory::Nullish => Ok(realm.create_object(Some(self.view))),
            ValueCategory::Boolean(_) => realm.construct(self.boolean, std::slice::from_ref(value)),
            ValueCategory::Number(_) => realm.construct(self.number, std::slice::from_ref(value)),
            ValueCategory::String(_) => realm.construct(self.string, std::slice::from_ref(value)),
            ValueCategory::Symbol(_) => unimplemented(realm, "symbol"),
            ValueCategory::BigInt(_) => unimplemented(realm, "bigint"),
            ValueCategory::Object(handle) => Ok(handle),
        }
    }
}

impl EntryBehavior for ObjectFacade {
    fn name(&self) -> &str {
        "StaticObject"
    }

    fn invoke(
        &self,
        realm: &mut Realm,
        _cx: &CallContext,
        args: &[JsValue],
    ) -> Result<JsValue, FacadeError> {
        let value = args.first().unwrap_or(&JsValue::Undefined);
        self.dispatch(realm, value).map(JsValue::Object)
    }

    fn construct(
        &self,
        realm: &mut Realm,
        cx: &ConstructContext,
        args: &[JsValue],
    ) -> Result<Option<ObjectHandle>, FacadeError> {
        if !cx.specialization.is_exact() {
            return Ok(None);
        }
        let value = args.first().unwrap_or(&JsValue::Undefined);
        self.dispatch(realm, value).map(Some)
    }
}

struct ListFacade {
    view: ObjectHandle,
}

impl EntryBehavior for ListFacade {
    fn name(&self) -> &str {
        "StaticArray"
    }

    fn invoke(
        &self,
        realm: &mut Realm,
        _cx: &CallContext,
        args: &[JsValue],
    ) -> Result<JsValue, FacadeError> {
        // Initial elements are not supported yet; they are dropped.
        if !args.is_empty() {
            realm.record_pass(
                "categories",
                "array_initial_elements_ignored",
                Some(args.len().to_string()),
            );
        }
        let array_prototype = realm.intrinsics().array_prototype;
        let array = realm.create_array(array_prototype, &[])?;
        realm.set_prototype_of(array, Some(self.view))?;
        Ok(JsValue::Object(array))
    }

    fn construct(
        &self,
        _realm: &mut Realm,
        _cx: &ConstructContext,
        _args: &[JsValue],
    ) -> Result<Option<ObjectHandle>, FacadeError> {
        Ok(None)
    }
}
