//! Abstract conversions used by the plain-call behavior of the facades.
//!
//! Objects convert through their own `valueOf` / `toString` members, so
//! reads made during a conversion go through whatever strict views sit on
//! the object's chain.

use crate::error::FacadeError;
use crate::object_model::{JsValue, PropertyKey};
use crate::realm::Realm;

/// Which method ToPrimitive tries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Number,
    String,
}

/// ToBoolean.
pub fn to_boolean(value: &JsValue) -> bool {
    match value {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Bool(b) => *b,
        JsValue::Number(n) => !(*n == 0.0 || n.is_nan()),
        JsValue::BigInt(n) => *n != 0,
        JsValue::Str(s) => !s.is_empty(),
        JsValue::Symbol(_) | JsValue::Object(_) => true,
    }
}

/// ToPrimitive: objects try `valueOf`/`toString` in hint order.
pub fn to_primitive(
    realm: &mut Realm,
    value: &JsValue,
    hint: PreferredType,
) -> Result<JsValue, FacadeError> {
    if !value.is_object() {
        return Ok(value.clone());
    }
    let order = match hint {
        PreferredType::Number => ["valueOf", "toString"],
        PreferredType::String => ["toString", "valueOf"],
    };
    for name in order {
        let method = realm.get(value, &PropertyKey::from(name))?;
        if realm.is_callable(&method) {
            let result = realm.call(&method, value, &[])?;
            if !result.is_object() {
                return Ok(result);
            }
        }
    }
    Err(FacadeError::type_error(
        "Cannot convert object to primitive value",
    ))
}

/// ToNumber.
pub fn to_number(realm: &mut Realm, value: &JsValue) -> Result<f64, FacadeError> {
    match value {
        JsValue::Undefined => Ok(f64::NAN),
        JsValue::Null => Ok(0.0),
        JsValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        JsValue::Number(n) => Ok(*n),
        JsValue::Str(s) => Ok(string_to_number(s)),
        JsValue::Symbol(_) => Err(FacadeError::type_error(
            "Cannot convert a Symbol value to a number",
        )),
        JsValue::BigInt(_) => Err(FacadeError::type_error(
            "Cannot convert a BigInt value to a number",
        )),
        JsValue::Object(_) => {
            let prim = to_primitive(realm, value, PreferredType::Number)?;
            to_number(realm, &prim)
        }
    }
}

/// ToString.
pub fn to_string(realm: &mut Realm, value: &JsValue) -> Result<String, FacadeError> {
    match value {
        JsValue::Undefined => Ok("undefined".to_string()),
        JsValue::Null => Ok("null".to_string()),
        JsValue::Bool(b) => Ok(b.to_string()),
        JsValue::Number(n) => Ok(number_to_string(*n)),
        JsValue::BigInt(n) => Ok(n.to_string()),
        JsValue::Str(s) => Ok(s.clone()),
        JsValue::Symbol(_) => Err(FacadeError::type_error(
            "Cannot convert a Symbol value to a string",
        )),
        JsValue::Object(_) => {
            let prim = to_primitive(realm, value, PreferredType::String)?;
            to_string(realm, &prim)
        }
    }
}

/// ToPropertyKey: symbols stay symbols, everything else goes through ToString.
pub fn to_property_key(realm: &mut Realm, value: &JsValue) -> Result<PropertyKey, FacadeError> {
    match value {
        JsValue::Symbol(id) => Ok(PropertyKey::Symbol(*id)),
        JsValue::Str(s) => Ok(PropertyKey::String(s.clone())),
        other => {
            let prim = to_primitive(realm, other, PreferredType::String)?;
            if let JsValue::Symbol(id) = prim {
                return Ok(PropertyKey::Symbol(id));
            }
            Ok(PropertyKey::String(to_string(realm, &prim)?))
        }
    }
}

/// The value as a member key without coercion: only strings and symbols
/// qualify.
pub fn as_property_key(value: &JsValue) -> Option<PropertyKey> {
    match value {
        JsValue::Str(s) => Some(PropertyKey::String(s.clone())),
        JsValue::Symbol(id) => Some(PropertyKey::Symbol(*id)),
        _ => None,
    }
}

/// Number::toString(10).
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{n}");
    }
    let rendered = format!("{n:e}");
    match rendered.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => rendered,
    }
}

/// StringToNumber: decimal literals, `Infinity`, and `0x`/`0o`/`0b` integers.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &trimmed[2..];
        if digits.is_empty() {
            return f64::NAN;
        }
        return digits.chars().try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN);
    }
    let well_formed = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !well_formed {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}
