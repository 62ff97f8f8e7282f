//! Facade factory.
//!
//! An entry point is one function identity with two behaviors selected by
//! caller intent: [`EntryBehavior::invoke`] for a plain call and
//! [`EntryBehavior::construct`] for construction. [`build_facade`] wraps a
//! delegation target in a strict view, asks a builder for the behavior, and
//! binds the entry point's `prototype` to the view so it cannot be swapped.

use std::rc::Rc;

use crate::descriptor::AttributeFlags;
use crate::error::FacadeError;
use crate::object_model::{JsValue, ObjectHandle, PropertyDescriptor, PropertyKey, ProxyHandler};
use crate::realm::Realm;

/// Context of a plain call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallContext {
    /// The function object being called.
    pub callee: ObjectHandle,
    pub this: JsValue,
}

/// Relation between the constructor running and the one construction was
/// requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specialization {
    /// Constructed as itself.
    Exact,
    /// Constructed on behalf of a declared variant (a derived constructor).
    Variant { derived: ObjectHandle },
    /// Constructed on behalf of an unrelated constructor.
    Retargeted { new_target: ObjectHandle },
}

impl Specialization {
    pub fn is_exact(self) -> bool {
        matches!(self, Self::Exact)
    }
}

/// Context of a construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructContext {
    pub callee: ObjectHandle,
    /// Whose `prototype` the new instance should delegate to.
    pub new_target: ObjectHandle,
    pub specialization: Specialization,
}

/// The dual behavior behind an entry point.
pub trait EntryBehavior {
    fn name(&self) -> &str;

    /// Plain call.
    fn invoke(
        &self,
        realm: &mut Realm,
        cx: &CallContext,
        args: &[JsValue],
    ) -> Result<JsValue, FacadeError>;

    /// Construction. `Ok(None)` leaves the decision to default
    /// construction, which delegates the new object to
    /// `cx.new_target.prototype`.
    fn construct(
        &self,
        realm: &mut Realm,
        cx: &ConstructContext,
        args: &[JsValue],
    ) -> Result<Option<ObjectHandle>, FacadeError>;
}

/// Build a strict facade over `target`.
///
/// `builder` receives the intercepted view and returns the entry point's
/// behavior. The returned entry point's `prototype` is the view, bound
/// non-writable and non-configurable. The entry point is pinned.
pub fn build_facade<F>(
    realm: &mut Realm,
    target: ObjectHandle,
    builder: F,
) -> Result<ObjectHandle, FacadeError>
where
    F: FnOnce(&mut Realm, ObjectHandle) -> Result<Rc<dyn EntryBehavior>, FacadeError>,
{
    let view = realm
        .heap_mut()
        .alloc_proxy(target, ProxyHandler::StrictGet);
    let behavior = builder(realm, view)?;
    let name = behavior.name().to_string();
    let entry = realm.create_entry_point(behavior)?;

    let bound = realm.heap_mut().define_property(
        entry,
        PropertyKey::from("prototype"),
        crate::descriptor::data_descriptor(JsValue::Object(view), AttributeFlags::FROZEN),
    )?;
    if !bound {
        return Err(FacadeError::Unreachable {
            context: "entry point refused its prototype binding",
        });
    }

    realm.pin(entry);
    realm.record_pass("facade", "facade_built", Some(name));
    Ok(entry)
}

/// The strict view bound to `entry`'s `prototype`.
pub fn intercepted_view(realm: &Realm, entry: ObjectHandle) -> Result<ObjectHandle, FacadeError> {
    match realm
        .heap()
        .get_own_property_descriptor(entry, &PropertyKey::from("prototype"))?
    {
        Some(PropertyDescriptor::Data {
            value: JsValue::Object(view),
            ..
        }) => Ok(view),
        _ => Err(FacadeError::type_error(format!(
            "{entry} has no bound prototype"
        ))),
    }
}
