//! Board identity
//!
//! A board is identified by its specifier and the 96-bit unique id burned
//! into the microcontroller.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::RangeError;

/// Number of 32-bit words in a board UID
pub const UID_WORDS: usize = 3;

/// Device type reported by the board firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum BoardSpecifier {
    /// Unspecified board
    Default = 0,
    /// STM32 Nucleo-F401RE
    NucleoF401RE = 1,
    /// STM32 Nucleo-F446RE
    NucleoF446RE = 2,
}

impl BoardSpecifier {
    /// Human readable name, used as the board description
    pub fn description(&self) -> &'static str {
        match self {
            BoardSpecifier::Default => "Default",
            BoardSpecifier::NucleoF401RE => "NucleoF401RE",
            BoardSpecifier::NucleoF446RE => "NucleoF446RE",
        }
    }

    /// Raw value as sent on the wire
    pub fn raw(&self) -> i32 {
        *self as i32
    }
}

impl TryFrom<i32> for BoardSpecifier {
    type Error = RangeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BoardSpecifier::Default),
            1 => Ok(BoardSpecifier::NucleoF401RE),
            2 => Ok(BoardSpecifier::NucleoF446RE),
            other => Err(RangeError::new(
                "board_specifier",
                format!("expected one of 0, 1, 2, got {}", other),
            )),
        }
    }
}

impl fmt::Display for BoardSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// 96-bit chip identifier, stored as three little-endian words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Uid(pub [u32; UID_WORDS]);

impl Uid {
    /// Create a UID from its three words
    pub fn new(w0: u32, w1: u32, w2: u32) -> Self {
        Self([w0, w1, w2])
    }

    /// The raw words
    pub fn words(&self) -> &[u32; UID_WORDS] {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X} 0x{:08X} 0x{:08X}", self.0[0], self.0[1], self.0[2])
    }
}

/// Identity of a physical device
///
/// `(specifier, uid)` is the natural key. Boards are plain values; the
/// reading store decides whether a board already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    specifier: BoardSpecifier,
    uid: Uid,
}

impl Board {
    /// Create a board identity
    pub fn new(specifier: BoardSpecifier, uid: Uid) -> Self {
        Self { specifier, uid }
    }

    /// Device type
    pub fn specifier(&self) -> BoardSpecifier {
        self.specifier
    }

    /// Chip identifier
    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// Description derived from the specifier
    pub fn description(&self) -> &'static str {
        self.specifier.description()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (UID {})", self.specifier, self.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specifier_from_raw() {
        assert_eq!(BoardSpecifier::try_from(1).unwrap(), BoardSpecifier::NucleoF401RE);
        assert_eq!(BoardSpecifier::try_from(2).unwrap().raw(), 2);
        let err = BoardSpecifier::try_from(3).unwrap_err();
        assert_eq!(err.field, "board_specifier");
        assert!(BoardSpecifier::try_from(-1).is_err());
    }

    #[test]
    fn test_uid_display() {
        let uid = Uid::new(0x0012_0034, 0xDEAD_BEEF, 1);
        assert_eq!(uid.to_string(), "0x00120034 0xDEADBEEF 0x00000001");
    }

    #[test]
    fn test_board_is_natural_key() {
        let a = Board::new(BoardSpecifier::NucleoF446RE, Uid::new(1, 2, 3));
        let b = Board::new(BoardSpecifier::NucleoF446RE, Uid::new(1, 2, 3));
        let c = Board::new(BoardSpecifier::NucleoF401RE, Uid::new(1, 2, 3));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.description(), "NucleoF446RE");
    }
}
