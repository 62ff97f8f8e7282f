#![no_main]

use libfuzzer_sys::fuzz_target;
use strict_facade::key_error;
use strict_facade::{FacadeKind, JsValue, PropertyKey, RealmConfig, ResolutionPolicy, bootstrap};

const MAX_MEMBERS: usize = 16;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let policy = if data[0] & 1 == 0 {
        ResolutionPolicy::Reflective
    } else {
        ResolutionPolicy::ChainWalk
    };
    let Ok((mut realm, facades)) = bootstrap(RealmConfig {
        resolution_policy: policy,
        ..RealmConfig::default()
    }) else {
        return;
    };
    let Ok(view) = facades.view(&realm, FacadeKind::Object) else {
        return;
    };
    let receiver = realm.create_object(Some(view));

    // Even chunks declare members; odd chunks read them.
    let text = String::from_utf8_lossy(&data[1..]);
    let mut declared = Vec::new();
    for (i, chunk) in text.split('\0').enumerate() {
        let key = PropertyKey::from(chunk);
        if i % 2 == 0 && declared.len() < MAX_MEMBERS {
            let _ = realm.set(receiver, key.clone(), JsValue::Number(i as f64));
            declared.push(key);
            continue;
        }
        match realm.get(&JsValue::Object(receiver), &key) {
            Ok(_) => {}
            Err(err) => {
                assert!(!declared.contains(&key));
                if let Some(instance) = err.key_error_instance() {
                    let recovered = key_error::key_of(&mut realm, &JsValue::Object(instance));
                    assert_eq!(recovered.ok(), Some(key.to_value()));
                }
            }
        }
    }

    realm.collect_garbage(&[receiver]);
    let events = realm.drain_events();
    let _ = serde_json::to_string(&events);
});
