use std::fmt;

use crate::error::WireError;
use crate::width::{Signedness, Width};

/// Raw tag bytes of the supported subset.
///
/// Fixints occupy two ranges instead of a single byte, so they are
/// described by their bounds.
pub mod tag {
    pub const POS_FIXINT_LAST: u8 = 0x7F;
    pub const NEG_FIXINT_FIRST: u8 = 0xE0;
    pub const NIL: u8 = 0xC0;
    pub const FALSE: u8 = 0xC2;
    pub const TRUE: u8 = 0xC3;
    pub const BIN8: u8 = 0xC4;
    pub const BIN16: u8 = 0xC5;
    pub const BIN32: u8 = 0xC6;
    pub const FLOAT32: u8 = 0xCA;
    pub const FLOAT64: u8 = 0xCB;
    pub const UINT8: u8 = 0xCC;
    pub const UINT16: u8 = 0xCD;
    pub const UINT32: u8 = 0xCE;
    pub const UINT64: u8 = 0xCF;
    pub const INT8: u8 = 0xD0;
    pub const INT16: u8 = 0xD1;
    pub const INT32: u8 = 0xD2;
    pub const INT64: u8 = 0xD3;
}

/// Coarse token category, one per typed read on the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Nil,
    Bool,
    Int,
    Float,
    Bin,
}

/// A classified tag byte.
///
/// ```text
/// ┌─────────────┬───────────────────┬──────────────────────────────┐
/// │ Tag byte(s) │ Marker            │ Bytes after the tag          │
/// ├─────────────┼───────────────────┼──────────────────────────────┤
/// │ 0x00–0x7F   │ PosFixInt(v)      │ none, value is the tag       │
/// │ 0xE0–0xFF   │ NegFixInt(v)      │ none, value is the tag (i8)  │
/// │ 0xC0        │ Nil               │ none                         │
/// │ 0xC2 / 0xC3 │ False / True      │ none                         │
/// │ 0xC4–0xC6   │ Bin8/16/32        │ 1/2/4-byte length + N bytes  │
/// │ 0xCA / 0xCB │ F32 / F64         │ 4 / 8 bytes IEEE-754         │
/// │ 0xCC–0xCF   │ U8/U16/U32/U64    │ 1/2/4/8 bytes unsigned       │
/// │ 0xD0–0xD3   │ I8/I16/I32/I64    │ 1/2/4/8 bytes two's-compl.   │
/// └─────────────┴───────────────────┴──────────────────────────────┘
/// ```
///
/// All multi-byte fields are big-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
    PosFixInt(u8),
    NegFixInt(i8),
    Nil,
    False,
    True,
    Bin8,
    Bin16,
    Bin32,
    F32,
    F64,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl Marker {
    /// Classify a tag byte, returning `None` for anything outside the
    /// supported subset.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        let marker = match byte {
            0x00..=tag::POS_FIXINT_LAST => Self::PosFixInt(byte),
            tag::NEG_FIXINT_FIRST..=0xFF => Self::NegFixInt(i8::from_be_bytes([byte])),
            tag::NIL => Self::Nil,
            tag::FALSE => Self::False,
            tag::TRUE => Self::True,
            tag::BIN8 => Self::Bin8,
            tag::BIN16 => Self::Bin16,
            tag::BIN32 => Self::Bin32,
            tag::FLOAT32 => Self::F32,
            tag::FLOAT64 => Self::F64,
            tag::UINT8 => Self::U8,
            tag::UINT16 => Self::U16,
            tag::UINT32 => Self::U32,
            tag::UINT64 => Self::U64,
            tag::INT8 => Self::I8,
            tag::INT16 => Self::I16,
            tag::INT32 => Self::I32,
            tag::INT64 => Self::I64,
            _ => return None,
        };
        Some(marker)
    }

    /// The tag byte this marker is written as.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        match self {
            // Fixint payloads are masked into their range so a hand-built
            // marker can never produce a byte of another tag.
            Self::PosFixInt(v) => v & tag::POS_FIXINT_LAST,
            Self::NegFixInt(v) => v.to_be_bytes()[0] | tag::NEG_FIXINT_FIRST,
            Self::Nil => tag::NIL,
            Self::False => tag::FALSE,
            Self::True => tag::TRUE,
            Self::Bin8 => tag::BIN8,
            Self::Bin16 => tag::BIN16,
            Self::Bin32 => tag::BIN32,
            Self::F32 => tag::FLOAT32,
            Self::F64 => tag::FLOAT64,
            Self::U8 => tag::UINT8,
            Self::U16 => tag::UINT16,
            Self::U32 => tag::UINT32,
            Self::U64 => tag::UINT64,
            Self::I8 => tag::INT8,
            Self::I16 => tag::INT16,
            Self::I32 => tag::INT32,
            Self::I64 => tag::INT64,
        }
    }

    #[must_use]
    pub fn family(self) -> Family {
        match self {
            Self::Nil => Family::Nil,
            Self::False | Self::True => Family::Bool,
            Self::Bin8 | Self::Bin16 | Self::Bin32 => Family::Bin,
            Self::F32 | Self::F64 => Family::Float,
            Self::PosFixInt(_)
            | Self::NegFixInt(_)
            | Self::U8
            | Self::U16
            | Self::U32
            | Self::U64
            | Self::I8
            | Self::I16
            | Self::I32
            | Self::I64 => Family::Int,
        }
    }

    /// Payload layout of a fixed-width integer tag.
    ///
    /// Returns `None` for fixints (self-contained) and every non-integer tag.
    #[must_use]
    pub fn int_layout(self) -> Option<(Width, Signedness)> {
        let layout = match self {
            Self::U8 => (Width::W8, Signedness::Unsigned),
            Self::U16 => (Width::W16, Signedness::Unsigned),
            Self::U32 => (Width::W32, Signedness::Unsigned),
            Self::U64 => (Width::W64, Signedness::Unsigned),
            Self::I8 => (Width::W8, Signedness::Signed),
            Self::I16 => (Width::W16, Signedness::Signed),
            Self::I32 => (Width::W32, Signedness::Signed),
            Self::I64 => (Width::W64, Signedness::Signed),
            _ => return None,
        };
        Some(layout)
    }

    /// Width of the length field that follows a bin tag.
    #[must_use]
    pub fn bin_length_width(self) -> Option<Width> {
        match self {
            Self::Bin8 => Some(Width::W8),
            Self::Bin16 => Some(Width::W16),
            Self::Bin32 => Some(Width::W32),
            _ => None,
        }
    }

    /// Bytes occupied by the tag plus its fixed-size fields.
    ///
    /// For scalars this is the whole token. For bins it covers the tag
    /// and the length field; the payload follows.
    #[must_use]
    pub fn header_len(self) -> usize {
        let fixed = match self {
            Self::PosFixInt(_) | Self::NegFixInt(_) | Self::Nil | Self::False | Self::True => 0,
            Self::F32 => 4,
            Self::F64 => 8,
            Self::Bin8 | Self::Bin16 | Self::Bin32 => {
                self.bin_length_width().map_or(0, Width::bytes)
            }
            Self::U8
            | Self::U16
            | Self::U32
            | Self::U64
            | Self::I8
            | Self::I16
            | Self::I32
            | Self::I64 => self.int_layout().map_or(0, |(w, _)| w.bytes()),
        };
        1 + fixed
    }

    /// Short lowercase name, used in diagnostics and the CLI.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::PosFixInt(_) => "fixint",
            Self::NegFixInt(_) => "negfixint",
            Self::Nil => "nil",
            Self::False => "false",
            Self::True => "true",
            Self::Bin8 => "bin8",
            Self::Bin16 => "bin16",
            Self::Bin32 => "bin32",
            Self::F32 => "float32",
            Self::F64 => "float64",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
        }
    }
}

impl TryFrom<u8> for Marker {
    type Error = WireError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_u8(byte).ok_or(WireError::UnknownMarker { byte })
    }
}

impl From<Marker> for u8 {
    fn from(marker: Marker) -> Self {
        marker.to_u8()
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_byte_roundtrips() {
        for byte in 0..=u8::MAX {
            if let Some(marker) = Marker::from_u8(byte) {
                assert_eq!(marker.to_u8(), byte, "roundtrip failed for {byte:#04X}");
            }
        }
    }

    #[test]
    fn positive_fixint_range() {
        assert_eq!(Marker::from_u8(0x00), Some(Marker::PosFixInt(0)));
        assert_eq!(Marker::from_u8(0x05), Some(Marker::PosFixInt(5)));
        assert_eq!(Marker::from_u8(0x7F), Some(Marker::PosFixInt(127)));
    }

    #[test]
    fn negative_fixint_range() {
        assert_eq!(Marker::from_u8(0xE0), Some(Marker::NegFixInt(-32)));
        assert_eq!(Marker::from_u8(0xFF), Some(Marker::NegFixInt(-1)));
    }

    #[test]
    fn unsupported_families_are_rejected() {
        // fixmap, fixarray, fixstr, never-used, ext/str/array/map headers
        for byte in [0x80, 0x8F, 0x90, 0x9F, 0xA0, 0xBF, 0xC1, 0xC7, 0xC8, 0xC9] {
            assert_eq!(Marker::from_u8(byte), None, "{byte:#04X} should be unknown");
        }
        for byte in 0xD4..=0xDF {
            assert_eq!(Marker::from_u8(byte), None, "{byte:#04X} should be unknown");
        }
    }

    #[test]
    fn try_from_reports_the_byte() {
        assert_eq!(
            Marker::try_from(0xC1),
            Err(WireError::UnknownMarker { byte: 0xC1 })
        );
    }

    #[test]
    fn header_lengths() {
        assert_eq!(Marker::PosFixInt(3).header_len(), 1);
        assert_eq!(Marker::Nil.header_len(), 1);
        assert_eq!(Marker::True.header_len(), 1);
        assert_eq!(Marker::U8.header_len(), 2);
        assert_eq!(Marker::I16.header_len(), 3);
        assert_eq!(Marker::U32.header_len(), 5);
        assert_eq!(Marker::I64.header_len(), 9);
        assert_eq!(Marker::F32.header_len(), 5);
        assert_eq!(Marker::F64.header_len(), 9);
        assert_eq!(Marker::Bin8.header_len(), 2);
        assert_eq!(Marker::Bin16.header_len(), 3);
        assert_eq!(Marker::Bin32.header_len(), 5);
    }

    #[test]
    fn families() {
        assert_eq!(Marker::NegFixInt(-1).family(), Family::Int);
        assert_eq!(Marker::U64.family(), Family::Int);
        assert_eq!(Marker::False.family(), Family::Bool);
        assert_eq!(Marker::F64.family(), Family::Float);
        assert_eq!(Marker::Bin32.family(), Family::Bin);
        assert_eq!(Marker::Nil.family(), Family::Nil);
    }

    #[test]
    fn fixint_payload_is_masked_into_range() {
        assert_eq!(Marker::PosFixInt(0xFF).to_u8(), 0x7F);
        assert_eq!(Marker::NegFixInt(0).to_u8(), 0xE0);
    }
}
