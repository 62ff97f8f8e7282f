//! Compact attribute flags for building data descriptors.
//!
//! A flag set packs writable/enumerable/configurable into the low three bits
//! (`0b_w_e_c`), so `0b101` reads "writable, not enumerable, configurable".

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::object_model::{JsValue, PropertyDescriptor};

/// Writable / enumerable / configurable as a three-bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeFlags(u8);

impl AttributeFlags {
    pub const WRITABLE: Self = Self(0b100);
    pub const ENUMERABLE: Self = Self(0b010);
    pub const CONFIGURABLE: Self = Self(0b001);

    /// `0b000`: the shape of a constructor's `prototype` once bound.
    pub const FROZEN: Self = Self(0b000);
    /// `0b101`: the shape of built-in `name`, `constructor`, `message`.
    pub const HIDDEN: Self = Self(0b101);
    /// `0b111`: the shape of an assignment-created property.
    pub const OPEN: Self = Self(0b111);

    pub const fn writable(self) -> bool {
        self.0 & Self::WRITABLE.0 != 0
    }

    pub const fn enumerable(self) -> bool {
        self.0 & Self::ENUMERABLE.0 != 0
    }

    pub const fn configurable(self) -> bool {
        self.0 & Self::CONFIGURABLE.0 != 0
    }
}

impl fmt::Display for AttributeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = if self.writable() { 'w' } else { '-' };
        let e = if self.enumerable() { 'e' } else { '-' };
        let c = if self.configurable() { 'c' } else { '-' };
        write!(f, "{w}{e}{c}")
    }
}

/// Wrap `value` as a data descriptor with the given attributes.
pub fn data_descriptor(value: JsValue, flags: AttributeFlags) -> PropertyDescriptor {
    PropertyDescriptor::Data {
        value,
        writable: flags.writable(),
        enumerable: flags.enumerable(),
        configurable: flags.configurable(),
    }
}
