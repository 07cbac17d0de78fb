//! Error register decoding
//!
//! The controller reports faults as a 16-bit register. Bit positions follow
//! the MTD415T datasheet (p. 18); undocumented bits are kept in the raw
//! flags but never named.

use serde::{Deserialize, Serialize};

/// Documented bits, ascending
pub const ERROR_NAMES: [(usize, &str); 9] = [
    (0, "not enabled"),
    (1, "internal temperature too high"),
    (2, "thermal latch-up"),
    (3, "cycling time too small"),
    (4, "no sensor"),
    (5, "no tec"),
    (6, "tec polarity reversed"),
    (13, "value out of range"),
    (14, "invalid command"),
];

/// Raw content of the error register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorRegister(pub u16);

impl ErrorRegister {
    /// Raw register value
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Whether bit `index` is set
    pub fn is_set(self, index: usize) -> bool {
        index < 16 && self.0 & (1 << index) != 0
    }

    /// Every bit as a flag, bit 0 (least significant) first
    pub fn flags(self) -> [bool; 16] {
        std::array::from_fn(|i| self.is_set(i))
    }

    /// Names of the documented conditions that are set, ascending bit order
    pub fn errors(self) -> Vec<&'static str> {
        ERROR_NAMES
            .iter()
            .filter(|(bit, _)| self.is_set(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl From<u16> for ErrorRegister {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}
