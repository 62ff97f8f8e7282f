//! Delegation-chain resolver.
//!
//! Walks a receiver's delegation chain link by link looking for an own
//! descriptor of `key`. The first link that declares the key decides the
//! outcome; links without it are skipped. Getters run bound to the original
//! receiver, never to the link that declared them.

use std::collections::BTreeSet;

use crate::error::FacadeError;
use crate::object_model::{JsValue, ObjectError, ObjectHandle, ObjectHeap, PropertyDescriptor, PropertyKey};
use crate::realm::Realm;

/// Outcome of a chain walk.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Value(JsValue),
    /// No link declares the key, or the declaring link has a setter only.
    Absent,
}

/// Iterator over a delegation chain, starting with the receiver itself.
///
/// Proxies are transparent: each step asks the heap for the link's
/// prototype, which forwards to the proxy's target. Cycles and chains
/// longer than the heap's depth limit yield one error and then stop.
pub struct DelegationChain<'h> {
    heap: &'h ObjectHeap,
    next: Option<ObjectHandle>,
    visited: BTreeSet<ObjectHandle>,
    depth: u32,
    failed: bool,
}

pub fn delegation_chain(heap: &ObjectHeap, start: ObjectHandle) -> DelegationChain<'_> {
    DelegationChain {
        heap,
        next: Some(start),
        visited: BTreeSet::new(),
        depth: 0,
        failed: false,
    }
}

impl Iterator for DelegationChain<'_> {
    type Item = Result<ObjectHandle, ObjectError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let current = self.next?;
        let max = self.heap.max_chain_depth();
        if self.depth > max {
            self.failed = true;
            return Some(Err(ObjectError::PrototypeChainTooDeep {
                depth: self.depth,
                max,
            }));
        }
        if !self.visited.insert(current) {
            self.failed = true;
            return Some(Err(ObjectError::PrototypeCycleDetected));
        }
        match self.heap.get_prototype_of(current) {
            Ok(parent) => self.next = parent,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        }
        self.depth += 1;
        Some(Ok(current))
    }
}

/// Resolve `key` on `receiver`, starting at the receiver itself.
pub fn resolve(
    realm: &mut Realm,
    receiver: ObjectHandle,
    key: &PropertyKey,
) -> Result<Resolution, FacadeError> {
    resolve_from(realm, receiver, key, &JsValue::Object(receiver))
}

/// Resolve `key` walking from `start`, binding getters to `receiver`.
pub fn resolve_from(
    realm: &mut Realm,
    start: ObjectHandle,
    key: &PropertyKey,
    receiver: &JsValue,
) -> Result<Resolution, FacadeError> {
    let mut found = None;
    for link in delegation_chain(realm.heap(), start) {
        let link = link?;
        if let Some(desc) = realm.heap().get_own_property_descriptor(link, key)? {
            found = Some(desc);
            break;
        }
    }
    let Some(desc) = found else {
        return Ok(Resolution::Absent);
    };
    match desc {
        PropertyDescriptor::Accessor {
            get: Some(getter), ..
        } => Ok(Resolution::Value(realm.call(
            &JsValue::Object(getter),
            receiver,
            &[],
        )?)),
        PropertyDescriptor::Accessor {
            get: None,
            set: Some(_),
            ..
        } => Ok(Resolution::Absent),
        PropertyDescriptor::Data { value, .. } => Ok(Resolution::Value(value)),
        PropertyDescriptor::Accessor {
            get: None, set: None, ..
        } => Err(FacadeError::Unreachable {
            context: "resolver found an accessor with neither getter nor setter",
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::RealmConfig;
    use crate::realm::NativeFn;

    fn realm() -> Realm {
        Realm::new(RealmConfig::default()).unwrap()
    }

    fn key(s: &str) -> PropertyKey {
        PropertyKey::from(s)
    }

    fn this_tag_getter() -> NativeFn {
        Rc::new(|realm: &mut Realm, this: &JsValue, _: &[JsValue]| {
            realm.get(this, &PropertyKey::from("tag"))
        })
    }

    #[test]
    fn chain_starts_at_receiver() {
        let mut realm = realm();
        let a = realm.create_object(None);
        let b = realm.create_object(Some(a));
        let c = realm.create_object(Some(b));
        let links: Vec<_> = delegation_chain(realm.heap(), c)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(links, vec![c, b, a]);
    }

    #[test]
    fn chain_sees_through_proxies() {
        let mut realm = realm();
        let root = realm.create_object(None);
        let target = realm.create_object(Some(root));
        let view = realm
            .heap_mut()
            .alloc_proxy(target, crate::object_model::ProxyHandler::StrictGet);
        let leaf = realm.create_object(Some(view));
        let links: Vec<_> = delegation_chain(realm.heap(), leaf)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(links, vec![leaf, view, root]);
    }

    #[test]
    fn data_member_on_ancestor() {
        let mut realm = realm();
        let parent = realm.create_object(None);
        realm.set(parent, key("v"), JsValue::Number(4.0)).unwrap();
        let child = realm.create_object(Some(parent));
        assert_eq!(
            resolve(&mut realm, child, &key("v")).unwrap(),
            Resolution::Value(JsValue::Number(4.0))
        );
    }

    #[test]
    fn links_without_the_key_are_skipped() {
        let mut realm = realm();
        let grand = realm.create_object(None);
        realm.set(grand, key("deep"), JsValue::Bool(true)).unwrap();
        let parent = realm.create_object(Some(grand));
        let child = realm.create_object(Some(parent));
        assert_eq!(
            resolve(&mut realm, child, &key("deep")).unwrap(),
            Resolution::Value(JsValue::Bool(true))
        );
    }

    #[test]
    fn exhausted_chain_is_absent() {
        let mut realm = realm();
        let obj = realm.create_object(None);
        assert_eq!(
            resolve(&mut realm, obj, &key("missing")).unwrap(),
            Resolution::Absent
        );
    }

    #[test]
    fn getter_runs_against_original_receiver() {
        let mut realm = realm();
        let parent = realm.create_object(None);
        realm.set(parent, key("tag"), JsValue::from("parent")).unwrap();
        realm
            .define_getter(parent, key("who"), this_tag_getter())
            .unwrap();
        let child = realm.create_object(Some(parent));
        realm.set(child, key("tag"), JsValue::from("child")).unwrap();
        assert_eq!(
            resolve(&mut realm, child, &key("who")).unwrap(),
            Resolution::Value(JsValue::from("child"))
        );
    }

    #[test]
    fn setter_only_accessor_is_absent() {
        let mut realm = realm();
        let obj = realm.create_object(None);
        let setter = realm
            .create_native_function(
                "set only",
                Rc::new(|_: &mut Realm, _: &JsValue, _: &[JsValue]| Ok(JsValue::Undefined)),
            )
            .unwrap();
        realm
            .heap_mut()
            .define_property(
                obj,
                key("w"),
                PropertyDescriptor::Accessor {
                    get: None,
                    set: Some(setter),
                    enumerable: false,
                    configurable: true,
                },
            )
            .unwrap();
        assert_eq!(resolve(&mut realm, obj, &key("w")).unwrap(), Resolution::Absent);
    }

    #[test]
    fn empty_accessor_is_unreachable() {
        let mut realm = realm();
        let obj = realm.create_object(None);
        realm
            .heap_mut()
            .define_property(
                obj,
                key("e"),
                PropertyDescriptor::Accessor {
                    get: None,
                    set: None,
                    enumerable: false,
                    configurable: true,
                },
            )
            .unwrap();
        let err = resolve(&mut realm, obj, &key("e")).unwrap_err();
        assert_eq!(err.stable_code(), crate::error::ERROR_UNREACHABLE);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut realm = Realm::new(RealmConfig {
            max_chain_depth: 3,
            ..RealmConfig::default()
        })
        .unwrap();
        let mut current = realm.create_object(None);
        for _ in 0..6 {
            current = realm.create_object(Some(current));
        }
        let err = resolve(&mut realm, current, &key("nothing")).unwrap_err();
        assert!(matches!(
            err,
            FacadeError::Object(ObjectError::PrototypeChainTooDeep { .. })
        ));
    }
}
