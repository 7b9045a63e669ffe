use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::DesignError;

/// A scalar type that can be carried on a wire. Fixed-point width is bounded
/// to 31 bits so the sign bit always has room in a 32-bit digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Bool,
    I32,
    I64,
    F64,
    DynFix {
        signed: bool,
        word_width: u8,
        fractional: u8,
    },
}

impl TypeDescriptor {
    /// Address buses (memory read/write address inputs) must be unsigned
    /// integers with no fractional part and a word width under 32 bits.
    pub fn validate_as_address(&self) -> Result<(), DesignError> {
        match *self {
            TypeDescriptor::DynFix {
                fractional,
                word_width,
                ..
            } if fractional == 0 && word_width < 32 => Ok(()),
            TypeDescriptor::DynFix { .. } => Err(DesignError::InvalidType {
                message: "address type must have zero fractional bits and word width < 32".into(),
            }),
            _ => Err(DesignError::InvalidType {
                message: "address type must be a fixed-point integer".into(),
            }),
        }
    }

    pub fn default_value(&self) -> Value {
        match *self {
            TypeDescriptor::Bool => Value::Bool(false),
            TypeDescriptor::I32 => Value::I32(0),
            TypeDescriptor::I64 => Value::I64(0),
            TypeDescriptor::F64 => Value::F64(0.0),
            TypeDescriptor::DynFix {
                signed,
                word_width,
                fractional,
            } => Value::DynFix(DynFix::zero(signed, word_width, fractional)),
        }
    }
}

/// A dynamically sized fixed-point scalar: `word_width` total bits (of which
/// the top bit is the sign when `signed`), `fractional` of them below the
/// binary point. Backed by a small inline digit vector per spec.md's
/// storage recommendation rather than a fixed-width type, since word width
/// is a runtime property of the port, not a compile-time one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynFix {
    pub signed: bool,
    pub word_width: u8,
    pub fractional: u8,
    data: SmallVec<[u32; 1]>,
}

impl DynFix {
    pub fn zero(signed: bool, word_width: u8, fractional: u8) -> Self {
        DynFix {
            signed,
            word_width,
            fractional,
            data: SmallVec::from_elem(0, Self::digit_count(word_width)),
        }
    }

    fn digit_count(word_width: u8) -> usize {
        (word_width as usize).div_ceil(32).max(1)
    }

    fn mask(&self) -> u32 {
        if self.word_width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.word_width) - 1
        }
    }

    /// Construct from a raw two's-complement integer already shifted by
    /// `fractional` bits. Truncates to `word_width`.
    pub fn from_raw_bits(signed: bool, word_width: u8, fractional: u8, raw: i64) -> Self {
        let mut v = DynFix::zero(signed, word_width, fractional);
        v.data[0] = (raw as u32) & v.mask();
        v
    }

    pub fn to_raw_bits(&self) -> i64 {
        let bits = self.data[0] & self.mask();
        if self.signed && self.word_width > 0 && (bits >> (self.word_width - 1)) & 1 == 1 {
            let extended = bits | !self.mask();
            extended as i32 as i64
        } else {
            bits as i64
        }
    }

    pub fn to_address(&self) -> i64 {
        self.to_raw_bits()
    }
}

/// A typed sample value carried on a wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    DynFix(DynFix),
}

impl Value {
    pub fn type_descriptor(&self) -> TypeDescriptor {
        match self {
            Value::Bool(_) => TypeDescriptor::Bool,
            Value::I32(_) => TypeDescriptor::I32,
            Value::I64(_) => TypeDescriptor::I64,
            Value::F64(_) => TypeDescriptor::F64,
            Value::DynFix(d) => TypeDescriptor::DynFix {
                signed: d.signed,
                word_width: d.word_width,
                fractional: d.fractional,
            },
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<i64> {
        match self {
            Value::DynFix(d) => Some(d.to_address()),
            Value::I32(i) => Some(*i as i64),
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_value_matches_descriptor() {
        assert_eq!(TypeDescriptor::Bool.default_value(), Value::Bool(false));
        assert_eq!(TypeDescriptor::I64.default_value(), Value::I64(0));
    }

    #[test]
    fn dynfix_roundtrip_positive() {
        let v = DynFix::from_raw_bits(true, 8, 0, 42);
        assert_eq!(v.to_raw_bits(), 42);
    }

    #[test]
    fn dynfix_roundtrip_negative_sign_extends() {
        let v = DynFix::from_raw_bits(true, 8, 0, -1);
        assert_eq!(v.to_raw_bits(), -1);
    }

    #[test]
    fn dynfix_unsigned_does_not_sign_extend() {
        let v = DynFix::from_raw_bits(false, 4, 0, 0b1111);
        assert_eq!(v.to_raw_bits(), 15);
    }

    #[test]
    fn address_validation_rejects_fractional_bits() {
        let t = TypeDescriptor::DynFix {
            signed: false,
            word_width: 8,
            fractional: 2,
        };
        assert!(t.validate_as_address().is_err());
    }

    #[test]
    fn address_validation_rejects_full_width() {
        let t = TypeDescriptor::DynFix {
            signed: false,
            word_width: 32,
            fractional: 0,
        };
        assert!(t.validate_as_address().is_err());
    }

    #[test]
    fn address_validation_accepts_valid_address_type() {
        let t = TypeDescriptor::DynFix {
            signed: false,
            word_width: 8,
            fractional: 0,
        };
        assert!(t.validate_as_address().is_ok());
    }
}
