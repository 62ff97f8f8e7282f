use crate::object_model::{ObjectError, ObjectHandle};

pub const ERROR_KEY_ERROR: &str = "FE-STRICT-0001";
pub const ERROR_INVALID_ARGUMENT: &str = "FE-STRICT-0002";
pub const ERROR_NOT_A_KEY_ERROR: &str = "FE-STRICT-0003";
pub const ERROR_UNREACHABLE: &str = "FE-STRICT-0004";
pub const ERROR_UNIMPLEMENTED: &str = "FE-STRICT-0005";
pub const ERROR_TYPE: &str = "FE-STRICT-0006";
pub const ERROR_OBJECT_MODEL: &str = "FE-STRICT-0007";
pub const ERROR_INVALID_CONFIG: &str = "FE-STRICT-0008";
pub const ERROR_RANGE: &str = "FE-STRICT-0009";

/// Everything a facade operation can raise. Nothing is swallowed: each
/// variant propagates to the immediate caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FacadeError {
    /// A read through a strict view named a member absent from the whole
    /// delegation chain. `instance` is the thrown `KeyError` object; its
    /// offending key is only reachable through the `key` accessor.
    #[error("KeyError: {label}")]
    KeyError { instance: ObjectHandle, label: String },
    /// The public `KeyError` constructor received something that is not a
    /// string or symbol.
    #[error("TypeError: argument received isn't a valid PropertyKey")]
    InvalidArgument { received: &'static str },
    /// The `key` accessor ran against an object the internal path never built.
    #[error(
        "TypeError: \"get key\" called on an object that does not implement interface KeyError."
    )]
    NotAKeyError,
    /// The object model produced a shape that cannot exist.
    #[error("InternalError: unreachable ({context})")]
    Unreachable { context: &'static str },
    #[error("Error: Not implemented: {category} facade construction")]
    Unimplemented { category: &'static str },
    #[error("TypeError: {detail}")]
    TypeError { detail: String },
    /// A length or size left the range the object model can represent.
    #[error("RangeError: {detail}")]
    RangeError { detail: String },
    #[error("invalid realm config: {reason}")]
    InvalidConfig { reason: String },
    #[error(transparent)]
    Object(#[from] ObjectError),
}

impl FacadeError {
    pub fn type_error(detail: impl Into<String>) -> Self {
        Self::TypeError {
            detail: detail.into(),
        }
    }

    pub fn range_error(detail: impl Into<String>) -> Self {
        Self::RangeError {
            detail: detail.into(),
        }
    }

    pub fn stable_code(&self) -> &'static str {
        match self {
            Self::KeyError { .. } => ERROR_KEY_ERROR,
            Self::InvalidArgument { .. } => ERROR_INVALID_ARGUMENT,
            Self::NotAKeyError => ERROR_NOT_A_KEY_ERROR,
            Self::Unreachable { .. } => ERROR_UNREACHABLE,
            Self::Unimplemented { .. } => ERROR_UNIMPLEMENTED,
            Self::TypeError { .. } => ERROR_TYPE,
            Self::RangeError { .. } => ERROR_RANGE,
            Self::Object(_) => ERROR_OBJECT_MODEL,
            Self::InvalidConfig { .. } => ERROR_INVALID_CONFIG,
        }
    }

    /// The thrown `KeyError` object, when this is a strict-access failure.
    pub fn key_error_instance(&self) -> Option<ObjectHandle> {
        match self {
            Self::KeyError { instance, .. } => Some(*instance),
            _ => None,
        }
    }

    pub fn is_key_error(&self) -> bool {
        matches!(self, Self::KeyError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_host_messages() {
        let err = FacadeError::KeyError {
            instance: ObjectHandle(3),
            label: "\"z\"".to_string(),
        };
        assert_eq!(err.to_string(), "KeyError: \"z\"");
        assert_eq!(
            FacadeError::NotAKeyError.to_string(),
            "TypeError: \"get key\" called on an object that does not implement interface KeyError."
        );
        assert_eq!(
            FacadeError::InvalidArgument { received: "number" }.to_string(),
            "TypeError: argument received isn't a valid PropertyKey"
        );
        assert_eq!(
            FacadeError::range_error("Invalid string length").to_string(),
            "RangeError: Invalid string length"
        );
    }

    #[test]
    fn stable_codes_are_distinct() {
        let errors = [
            FacadeError::KeyError {
                instance: ObjectHandle(0),
                label: String::new(),
            },
            FacadeError::InvalidArgument { received: "number" },
            FacadeError::NotAKeyError,
            FacadeError::Unreachable { context: "test" },
            FacadeError::Unimplemented { category: "symbol" },
            FacadeError::type_error("x"),
            FacadeError::range_error("x"),
            FacadeError::Object(ObjectError::PrototypeCycleDetected),
            FacadeError::InvalidConfig {
                reason: String::new(),
            },
        ];
        let mut codes: Vec<_> = errors.iter().map(FacadeError::stable_code).collect();
        assert!(codes.iter().all(|c| c.starts_with("FE-STRICT-")));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn key_error_instance_only_for_key_errors() {
        let err = FacadeError::KeyError {
            instance: ObjectHandle(7),
            label: "\"a\"".to_string(),
        };
        assert_eq!(err.key_error_instance(), Some(ObjectHandle(7)));
        assert!(err.is_key_error());
        assert_eq!(FacadeError::NotAKeyError.key_error_instance(), None);
    }
}
