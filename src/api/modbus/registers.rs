//! Static register map of the drive.
//!
//! Reads and writes live in separate namespaces on this drive: address 0 is
//! the output frequency when read and the control word when written.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Whether a register is polled or commanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Read,
    Write,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RegisterName {
    Frequency,
    Current,
    ControlWord,
    #[strum(serialize = "reference_1")]
    #[serde(rename = "reference_1")]
    Reference1,
    #[strum(serialize = "reference_2")]
    #[serde(rename = "reference_2")]
    Reference2,
    StatusWord,
    FaultCode,
}

/// One entry of the register map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegisterDef {
    pub name: RegisterName,
    pub address: u16,
    /// Fixed-point divisor: physical value = raw / scale.
    pub scale: u16,
    pub access: Access,
    pub unit: &'static str,
}

impl RegisterDef {
    pub fn to_physical(&self, raw: u16) -> f64 {
        f64::from(raw) / f64::from(self.scale)
    }

    /// Convert a physical value to the raw register integer.
    ///
    /// The fractional part is discarded, not rounded. Callers validate the
    /// range first; out-of-range input saturates at the u16 bounds.
    pub fn to_raw(&self, value: f64) -> u16 {
        (value * f64::from(self.scale)).trunc() as u16
    }

    pub fn is_writable(&self) -> bool {
        self.access == Access::Write
    }
}

// Order must follow the `RegisterName` declaration order.
const REGISTER_MAP: [RegisterDef; 7] = [
    RegisterDef {
        name: RegisterName::Frequency,
        address: 0,
        scale: 100,
        access: Access::Read,
        unit: "Hz",
    },
    RegisterDef {
        name: RegisterName::Current,
        address: 1,
        scale: 10,
        access: Access::Read,
        unit: "A",
    },
    RegisterDef {
        name: RegisterName::ControlWord,
        address: 0,
        scale: 1,
        access: Access::Write,
        unit: "",
    },
    RegisterDef {
        name: RegisterName::Reference1,
        address: 1,
        scale: 1,
        access: Access::Write,
        unit: "",
    },
    RegisterDef {
        name: RegisterName::Reference2,
        address: 2,
        scale: 1,
        access: Access::Write,
        unit: "",
    },
    RegisterDef {
        name: RegisterName::StatusWord,
        address: 50,
        scale: 1,
        access: Access::Read,
        unit: "",
    },
    RegisterDef {
        name: RegisterName::FaultCode,
        address: 102,
        scale: 1,
        access: Access::Read,
        unit: "",
    },
];

pub fn register(name: RegisterName) -> &'static RegisterDef {
    &REGISTER_MAP[name as usize]
}

/// Look a register up by its textual name, e.g. `"status_word"`.
pub fn lookup(name: &str) -> Option<&'static RegisterDef> {
    name.parse::<RegisterName>().ok().map(register)
}

pub fn all_registers() -> &'static [RegisterDef] {
    &REGISTER_MAP
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_map_order_matches_names() {
        for name in RegisterName::iter() {
            assert_eq!(register(name).name, name);
        }
        assert_eq!(all_registers().len(), RegisterName::iter().count());
    }

    #[test]
    fn test_known_addresses() {
        assert_eq!(register(RegisterName::Frequency).address, 0);
        assert_eq!(register(RegisterName::Current).address, 1);
        assert_eq!(register(RegisterName::ControlWord).address, 0);
        assert_eq!(register(RegisterName::Reference1).address, 1);
        assert_eq!(register(RegisterName::StatusWord).address, 50);
        assert_eq!(register(RegisterName::FaultCode).address, 102);
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(lookup("status_word").map(|r| r.address), Some(50));
        assert_eq!(lookup("reference_1").map(|r| r.address), Some(1));
        assert!(lookup("speed").is_none());
        assert_eq!(RegisterName::Reference2.to_string(), "reference_2");
    }

    #[test]
    fn test_scaling() {
        let freq = register(RegisterName::Frequency);
        assert_eq!(freq.to_physical(5000), 50.0);
        let current = register(RegisterName::Current);
        assert_eq!(current.to_physical(42), 4.2);

        let reference = register(RegisterName::Reference1);
        assert_eq!(reference.to_raw(1234.99), 1234);
        assert!(reference.is_writable());
        assert!(!freq.is_writable());
    }
}
