//! Where each field lives in a status response frame.
//!
//! Offsets count ASCII characters from the start of the frame.
//! Both decoding and encoding walk this table, so it is the only
//! place the frame format is written down.

use std::{fmt::Display, ops::Range};

/// How the characters of a field are to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Hexadecimal digits, upper or lower case.
    Hex,

    /// A single decimal digit.
    Decimal,

    /// One hex digit expanded into its four bits, most significant first.
    Nibble,

    /// Bytes kept as they are, as long as none is a control character.
    Raw,
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Encoding::Hex => "hex",
            Encoding::Decimal => "decimal",
            Encoding::Nibble => "hex nibble",
            Encoding::Raw => "free of control characters",
        };

        write!(f, "{s}")
    }
}

/// A named region of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Human readable field name, used in errors and logs.
    pub name: &'static str,

    /// Character range within the frame.
    pub range: Range<usize>,

    /// How to interpret the characters.
    pub encoding: Encoding,
}

impl Field {
    const fn new(name: &'static str, start: usize, end: usize, encoding: Encoding) -> Self {
        Self {
            name,
            range: start..end,
            encoding,
        }
    }

    /// The number of characters this field spans.
    pub fn width(&self) -> usize {
        self.range.len()
    }
}

/// Hardware version.
pub const HARDWARE_VERSION: Field = Field::new("hardware version", 6, 8, Encoding::Hex);

/// Software version.
pub const SOFTWARE_VERSION: Field = Field::new("software version", 8, 10, Encoding::Hex);

/// Optical relays, four of them packed in one hex digit.
pub const OPTICAL_RELAY: Field = Field::new("optical relay", 15, 16, Encoding::Nibble);

/// Electromagnetic relay.
pub const RELAY: Field = Field::new("relay", 19, 20, Encoding::Decimal);

/// One character per dry contact.
pub const DRY_CONTACT: Field = Field::new("dry contact", 20, 40, Encoding::Raw);

/// Device internal temperature.
pub const SELF_TEMPERATURE: Field = Field::new("self temperature", 40, 42, Encoding::Hex);

/// Every field of the frame, in offset order.
pub const FIELDS: [Field; 6] = [
    HARDWARE_VERSION,
    SOFTWARE_VERSION,
    OPTICAL_RELAY,
    RELAY,
    DRY_CONTACT,
    SELF_TEMPERATURE,
];

/// Frames shorter than this cannot hold every field.
pub const FRAME_LEN: usize = 42;

/// The number of dry contacts the device reports.
pub const DRY_CONTACTS: usize = 20;

/// The number of optical relays the device reports.
pub const OPTICAL_RELAYS: usize = 4;
