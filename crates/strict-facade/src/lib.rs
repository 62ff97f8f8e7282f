#![forbid(unsafe_code)]

//! Strict member-access facades.
//!
//! A facade is a callable and constructible entry point whose `prototype`
//! is a strict view of a built-in prototype. Reading a member that nothing
//! on the receiver's delegation chain declares raises `KeyError` instead of
//! producing `undefined`.

pub mod categories;
pub mod config;
pub mod conversion;
pub mod descriptor;
pub mod error;
pub mod error_detail;
pub mod events;
pub mod facade;
pub mod interception;
pub mod intrinsics;
pub mod key_error;
pub mod object_model;
pub mod realm;
pub mod resolver;

pub use categories::{FacadeKind, Facades, ValueCategory};
pub use config::{RealmConfig, ResolutionPolicy};
pub use error::FacadeError;
pub use events::{EventLog, FacadeEvent};
pub use facade::{CallContext, ConstructContext, EntryBehavior, Specialization, build_facade};
pub use object_model::{JsValue, ObjectHandle, PropertyKey, SymbolId};
pub use realm::Realm;

/// A realm with the five built-in facades installed.
pub fn bootstrap(config: RealmConfig) -> Result<(Realm, Facades), FacadeError> {
    let mut realm = Realm::new(config)?;
    let facades = Facades::install(&mut realm)?;
    Ok((realm, facades))
}
