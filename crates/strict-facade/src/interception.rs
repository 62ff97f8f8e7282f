//! The strict get policy behind every facade view.
//!
//! A read that reaches a strict view either produces what an ordinary
//! chain-respecting read of the target would produce, or raises `KeyError`
//! when the key is declared nowhere on the target's chain.

use crate::config::ResolutionPolicy;
use crate::error::{ERROR_KEY_ERROR, FacadeError};
use crate::key_error;
use crate::object_model::{JsValue, ObjectHandle, PropertyKey, ProxyInvariantChecker};
use crate::realm::Realm;
use crate::resolver::{self, Resolution};

/// `get` trap of a strict view over `target`.
pub fn on_get(
    realm: &mut Realm,
    target: ObjectHandle,
    key: &PropertyKey,
    receiver: &JsValue,
) -> Result<JsValue, FacadeError> {
    let value = match realm.config().resolution_policy {
        ResolutionPolicy::Reflective => {
            if !realm.has(target, key)? {
                return Err(strict_miss(realm, key));
            }
            realm.get_from(target, key, receiver)?
        }
        ResolutionPolicy::ChainWalk => {
            match resolver::resolve_from(realm, target, key, receiver)? {
                Resolution::Value(value) => value,
                Resolution::Absent => {
                    if !realm.has(target, key)? {
                        return Err(strict_miss(realm, key));
                    }
                    JsValue::Undefined
                }
            }
        }
    };
    ProxyInvariantChecker::check_get(realm.heap().ordinary(target)?, key, &value)?;
    Ok(value)
}

fn strict_miss(realm: &mut Realm, key: &PropertyKey) -> FacadeError {
    let detail = realm.describe_key(key);
    realm.record_failure(
        "interception",
        "strict_access_miss",
        ERROR_KEY_ERROR,
        Some(detail),
    );
    key_error::raise(realm, key.clone())
}
