use std::rc::Rc;

use strict_facade::key_error;
use strict_facade::object_model::PropertyDescriptor;
use strict_facade::realm::InitFn;
use strict_facade::{
    FacadeError, FacadeKind, Facades, JsValue, ObjectHandle, PropertyKey, Realm, RealmConfig,
    ResolutionPolicy, bootstrap,
};

fn main() {
    if let Err(error) = run(std::env::args().skip(1).collect()) {
        eprintln!("{error}");
        std::process::exit(2);
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let mut config = RealmConfig::default();
    let mut print_events = false;

    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--events" => print_events = true,
            "--policy" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--policy requires a value".to_string())?;
                config.resolution_policy = parse_policy(value)?;
            }
            "--trace-id" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| "--trace-id requires a value".to_string())?;
                config.trace_id = value.clone();
            }
            "help" | "--help" | "-h" => {
                println!("{}", usage());
                return Ok(());
            }
            other => return Err(format!("unknown flag '{other}'\n\n{}", usage())),
        }
        index += 1;
    }

    let (mut realm, facades) = bootstrap(config).map_err(|e| e.to_string())?;
    demo(&mut realm, &facades).map_err(|e| format!("demo failed: {e}"))?;

    if print_events {
        let events = realm.drain_events();
        println!(
            "{}",
            serde_json::to_string_pretty(&events)
                .map_err(|error| format!("failed to encode events: {error}"))?
        );
    }
    Ok(())
}

fn usage() -> String {
    [
        "strict_facade_demo usage:",
        "  strict_facade_demo [--events] [--policy reflective|chain_walk] [--trace-id <id>]",
    ]
    .join("\n")
}

fn parse_policy(raw: &str) -> Result<ResolutionPolicy, String> {
    match raw {
        "reflective" => Ok(ResolutionPolicy::Reflective),
        "chain_walk" => Ok(ResolutionPolicy::ChainWalk),
        other => Err(format!("unknown policy '{other}'")),
    }
}

fn demo(realm: &mut Realm, facades: &Facades) -> Result<(), FacadeError> {
    let view = facades.view(realm, FacadeKind::Object)?;

    let object = realm.create_object(Some(view));
    realm.set(object, PropertyKey::from("x"), JsValue::Number(f64::NAN))?;
    realm.set(object, PropertyKey::from("y"), JsValue::Number(9.0))?;
    print_properties(realm, object)?;

    let init: InitFn = Rc::new(|realm: &mut Realm, this: ObjectHandle, args: &[JsValue]| {
        let x = args.first().cloned().unwrap_or(JsValue::Number(0.0));
        let y = args.get(1).cloned().unwrap_or(JsValue::Number(0.0));
        realm.set(this, PropertyKey::from("x"), x)?;
        realm.set(this, PropertyKey::from("y"), y)?;
        Ok(())
    });
    let point = realm.derive_constructor(facades.object, "Point", Some(init))?;
    let instance = realm.construct(point, &[JsValue::Number(f64::NAN), JsValue::Number(9.0)])?;
    print_properties(realm, instance)?;

    let object_ctor = realm.intrinsics().object_constructor;
    let native = realm.construct(object_ctor, &[])?;
    let strict = realm.construct(facades.object, &[])?;
    println!("{} {}", inspect(realm, native)?, inspect(realm, strict)?);

    let first = call(realm, object_ctor)?;
    let second = call(realm, facades.object)?;
    println!("{} {}", inspect(realm, first)?, inspect(realm, second)?);

    let plain_native = call(realm, object_ctor)? == call(realm, object_ctor)?;
    let plain_strict = call(realm, facades.object)? == call(realm, facades.object)?;
    println!("{plain_native} {plain_strict}");

    let new_native = realm.construct(object_ctor, &[])? == realm.construct(object_ctor, &[])?;
    let new_strict = realm.construct(facades.object, &[])? == realm.construct(facades.object, &[])?;
    println!("{new_native} {new_strict}");

    let array = call(realm, facades.array)?;
    realm.invoke_method(&JsValue::Object(array), "push", &[JsValue::Number(123.0)])?;
    let first = realm.get(&JsValue::Object(array), &PropertyKey::from(0u32))?;
    println!("{first}");
    println!("{}", inspect(realm, array)?);

    match realm.get(&JsValue::Object(array), &PropertyKey::from(1u32)) {
        Ok(value) => println!("{value}"),
        Err(error) => report(realm, &error)?,
    }
    Ok(())
}

fn call(realm: &mut Realm, callee: ObjectHandle) -> Result<ObjectHandle, FacadeError> {
    match realm.call(&JsValue::Object(callee), &JsValue::Undefined, &[])? {
        JsValue::Object(handle) => Ok(handle),
        other => Err(FacadeError::type_error(format!(
            "expected an object, got {}",
            other.type_name()
        ))),
    }
}

fn print_properties(realm: &mut Realm, object: ObjectHandle) -> Result<(), FacadeError> {
    let receiver = JsValue::Object(object);
    let x = realm.get(&receiver, &PropertyKey::from("x"))?;
    let y = realm.get(&receiver, &PropertyKey::from("y"))?;
    println!("x: {x}, y: {y}");
    match realm.get(&receiver, &PropertyKey::from("z")) {
        Ok(z) => println!("z: {z}"),
        Err(error) => report(realm, &error)?,
    }
    Ok(())
}

/// Print a caught error; for `KeyError` also show the offending key.
fn report(realm: &mut Realm, error: &FacadeError) -> Result<(), FacadeError> {
    match error.key_error_instance() {
        Some(instance) => {
            let key = key_error::key_of(realm, &JsValue::Object(instance))?;
            eprintln!("{error} (key: {key})");
            Ok(())
        }
        None => Err(error.clone()),
    }
}

/// One-line rendering of an object's own enumerable data members.
fn inspect(realm: &Realm, object: ObjectHandle) -> Result<String, FacadeError> {
    let ordinary = realm.heap().ordinary(object)?;
    let mut parts = Vec::new();
    for key in ordinary.own_property_keys() {
        let Some(PropertyDescriptor::Data {
            value, enumerable, ..
        }) = ordinary.get_own_property(&key)
        else {
            continue;
        };
        if !enumerable {
            continue;
        }
        if ordinary.is_array() {
            parts.push(value.to_string());
        } else {
            parts.push(format!("{}: {value}", realm.describe_key(&key)));
        }
    }
    let (open, close) = if ordinary.is_array() { ("[", "]") } else { ("{", "}") };
    if parts.is_empty() {
        return Ok(format!("{open}{close}"));
    }
    Ok(format!("{open} {} {close}", parts.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strict_facade::descriptor::AttributeFlags;

    #[test]
    fn unknown_flag_is_rejected() {
        let err = run(vec!["--bogus".to_string()]).unwrap_err();
        assert!(err.starts_with("unknown flag '--bogus'"));
    }

    #[test]
    fn policy_flag_requires_value() {
        let err = run(vec!["--policy".to_string()]).unwrap_err();
        assert_eq!(err, "--policy requires a value");
        assert!(parse_policy("chain_walk").is_ok());
        assert!(parse_policy("eager").is_err());
    }

    #[test]
    fn demo_runs_under_both_policies() {
        for policy in [ResolutionPolicy::Reflective, ResolutionPolicy::ChainWalk] {
            let (mut realm, facades) = bootstrap(RealmConfig {
                resolution_policy: policy,
                ..RealmConfig::default()
            })
            .unwrap();
            demo(&mut realm, &facades).unwrap();
            let misses = realm
                .events()
                .events()
                .filter(|e| e.event == "strict_access_miss")
                .count();
            assert_eq!(misses, 3);
        }
    }

    #[test]
    fn inspect_hides_non_enumerable_members() {
        let (mut realm, _) = bootstrap(RealmConfig::default()).unwrap();
        let obj = realm.create_plain_object();
        realm
            .define(obj, "hidden", JsValue::Bool(true), AttributeFlags::HIDDEN)
            .unwrap();
        realm.set(obj, PropertyKey::from("a"), JsValue::Number(1.0)).unwrap();
        assert_eq!(inspect(&realm, obj).unwrap(), "{ a: 1 }");
    }
}
