/// Errors raised by the stateless wire primitives.
///
/// These carry no stream offsets: the primitives only ever see the slice
/// they were handed. The decoder attaches the absolute position when it
/// lifts a `WireError` into its own error type.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    /// The slice was shorter than the field being read.
    #[error("unexpected end of input: needed {needed} bytes, {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// The tag byte is outside the supported subset (maps, arrays,
    /// strings, extensions, or the never-used 0xC1).
    #[error("unknown marker byte {byte:#04X}")]
    UnknownMarker { byte: u8 },

    /// A uint64 payload had its high bit set and cannot be represented
    /// as an `i64` without wrapping.
    #[error("uint64 value {value} overflows i64")]
    Uint64Overflow { value: u64 },

    /// A length field does not fit in the platform's address space.
    #[error("length {length} does not fit in usize")]
    LengthOverflow { length: u64 },
}
