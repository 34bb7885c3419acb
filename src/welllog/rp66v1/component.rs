//! Component descriptors, the first byte of every EFLR component.
//!
//! ```text
//!  bit  7 6 5 | 4 3 2 1 0
//!       role  | characteristics
//!
//!  role 000 ABSATR  001 ATTRIB  010 INVATR  011 OBJECT
//!       100 -       101 RDSET   110 RSET    111 SET
//!
//!  SET group:  T N 0 0 0     (T required)
//!  OBJECT:     N 0 0 0 0     (N required)
//!  attributes: L C R U V
//! ```

use std::fmt;

use crate::welllog::types::error::{Result, WellLogError};

const ROLE_MASK: u8 = 0xE0;
const SET_T: u8 = 0x10;
const SET_N: u8 = 0x08;
const SET_RESERVED: u8 = 0x07;
const OBJECT_N: u8 = 0x10;
const OBJECT_RESERVED: u8 = 0x0F;
const ATTRIBUTE_L: u8 = 0x10;
const ATTRIBUTE_C: u8 = 0x08;
const ATTRIBUTE_R: u8 = 0x04;
const ATTRIBUTE_U: u8 = 0x02;
const ATTRIBUTE_V: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    AbsentAttribute,
    Attribute,
    InvariantAttribute,
    Object,
    Reserved,
    RedundantSet,
    ReplacementSet,
    Set,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::AbsentAttribute => "ABSATR",
            Role::Attribute => "ATTRIB",
            Role::InvariantAttribute => "INVATR",
            Role::Object => "OBJECT",
            Role::Reserved => "reserved",
            Role::RedundantSet => "RDSET",
            Role::ReplacementSet => "RSET",
            Role::Set => "SET",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentDescriptor(u8);

impl ComponentDescriptor {
    /// # Errors
    /// `MalformedEflr` for the reserved role, reserved bits set, a set without
    /// a type or an object without a name.
    pub fn new(descriptor: u8) -> Result<Self> {
        let cd = Self(descriptor);
        let fail = |why: &str| {
            Err(WellLogError::MalformedEflr(format!(
                "component descriptor 0x{:02x}: {}",
                descriptor, why
            )))
        };
        if cd.role() == Role::Reserved {
            return fail("reserved role");
        }
        if cd.is_set_group() {
            if descriptor & SET_RESERVED != 0 {
                return fail("reserved bits set for a set");
            }
            if descriptor & SET_T == 0 {
                return fail("a set must have a type");
            }
        }
        if cd.is_object() {
            if descriptor & OBJECT_RESERVED != 0 {
                return fail("reserved bits set for an object");
            }
            if descriptor & OBJECT_N == 0 {
                return fail("an object must have a name");
            }
        }
        Ok(cd)
    }

    pub fn byte(self) -> u8 {
        self.0
    }

    pub fn role(self) -> Role {
        match self.0 & ROLE_MASK {
            0x00 => Role::AbsentAttribute,
            0x20 => Role::Attribute,
            0x40 => Role::InvariantAttribute,
            0x60 => Role::Object,
            0x80 => Role::Reserved,
            0xA0 => Role::RedundantSet,
            0xC0 => Role::ReplacementSet,
            _ => Role::Set,
        }
    }

    /// Absent, plain or invariant attribute.
    pub fn is_attribute_group(self) -> bool {
        self.0 & ROLE_MASK < 0x60
    }

    /// Set, redundant set or replacement set.
    pub fn is_set_group(self) -> bool {
        self.0 & ROLE_MASK > 0x80
    }

    pub fn is_object(self) -> bool {
        self.role() == Role::Object
    }

    pub fn is_absent_attribute(self) -> bool {
        self.role() == Role::AbsentAttribute
    }

    pub fn is_invariant_attribute(self) -> bool {
        self.role() == Role::InvariantAttribute
    }

    pub fn has_set_name(self) -> bool {
        self.is_set_group() && self.0 & SET_N != 0
    }

    pub fn has_label(self) -> bool {
        self.is_attribute_group() && self.0 & ATTRIBUTE_L != 0
    }

    pub fn has_count(self) -> bool {
        self.is_attribute_group() && self.0 & ATTRIBUTE_C != 0
    }

    pub fn has_rep_code(self) -> bool {
        self.is_attribute_group() && self.0 & ATTRIBUTE_R != 0
    }

    pub fn has_units(self) -> bool {
        self.is_attribute_group() && self.0 & ATTRIBUTE_U != 0
    }

    pub fn has_value(self) -> bool {
        self.is_attribute_group() && self.0 & ATTRIBUTE_V != 0
    }
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03b} {:05b}", self.0 >> 5, self.0 & 0x1F)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_and_characteristics() {
        let set = ComponentDescriptor::new(0xF8).unwrap();
        assert_eq!(set.role(), Role::Set);
        assert!(set.has_set_name());
        let attr = ComponentDescriptor::new(0x35).unwrap();
        assert_eq!(attr.role(), Role::Attribute);
        assert!(attr.has_label() && attr.has_rep_code() && attr.has_value());
        assert!(!attr.has_count() && !attr.has_units());
        assert!(ComponentDescriptor::new(0x70).unwrap().is_object());
        assert!(ComponentDescriptor::new(0x00).unwrap().is_absent_attribute());
        assert_eq!(attr.to_string(), "001 10101");
    }

    #[test]
    fn invalid_descriptors() {
        assert!(ComponentDescriptor::new(0x80).is_err());
        assert!(ComponentDescriptor::new(0xE8).is_err());
        assert!(ComponentDescriptor::new(0xF1).is_err());
        assert!(ComponentDescriptor::new(0x60).is_err());
        assert!(ComponentDescriptor::new(0x71).is_err());
    }
}
