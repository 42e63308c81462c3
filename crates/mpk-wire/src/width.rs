use crate::error::WireError;

/// Byte width of a fixed-size integer or length field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
}

impl Width {
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::W8 => 1,
            Self::W16 => 2,
            Self::W32 => 4,
            Self::W64 => 8,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Largest unsigned value representable in this width.
    #[must_use]
    pub const fn max_unsigned(self) -> u64 {
        match self {
            Self::W8 => u8::MAX as u64,
            Self::W16 => u16::MAX as u64,
            Self::W32 => u32::MAX as u64,
            Self::W64 => u64::MAX,
        }
    }

    /// Inclusive signed range representable in this width.
    #[must_use]
    pub const fn signed_range(self) -> (i64, i64) {
        match self {
            Self::W8 => (i8::MIN as i64, i8::MAX as i64),
            Self::W16 => (i16::MIN as i64, i16::MAX as i64),
            Self::W32 => (i32::MIN as i64, i32::MAX as i64),
            Self::W64 => (i64::MIN, i64::MAX),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// Read a big-endian unsigned field of `width` bytes from the front of
/// `buf`, zero-extended to `u64`.
///
/// This is the single routine every integer, float and length read goes
/// through, so a tag can never be decoded with fewer bytes than it
/// declares.
///
/// # Errors
///
/// [`WireError::UnexpectedEof`] if `buf` is shorter than `width`. Nothing
/// is read in that case.
pub fn read_uint(buf: &[u8], width: Width) -> Result<u64, WireError> {
    let needed = width.bytes();
    let field = buf.get(..needed).ok_or(WireError::UnexpectedEof {
        needed,
        available: buf.len(),
    })?;
    Ok(field
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte)))
}

/// Read a big-endian integer field and interpret it as an `i64`.
///
/// Signed fields are sign-extended from their declared width. Unsigned
/// fields are zero-extended; a 64-bit unsigned value above `i64::MAX` is
/// rejected rather than wrapped.
///
/// # Errors
///
/// - [`WireError::UnexpectedEof`] if `buf` is shorter than `width`.
/// - [`WireError::Uint64Overflow`] for an unsigned value that does not
///   fit in `i64`.
pub fn read_int(buf: &[u8], width: Width, signedness: Signedness) -> Result<i64, WireError> {
    let raw = read_uint(buf, width)?;
    match signedness {
        Signedness::Unsigned => {
            i64::try_from(raw).map_err(|_| WireError::Uint64Overflow { value: raw })
        }
        Signedness::Signed => {
            // Park the field's sign bit in bit 63, then arithmetic-shift back.
            let shift = 64 - width.bits();
            Ok(i64::from_be_bytes((raw << shift).to_be_bytes()) >> shift)
        }
    }
}

/// Read a big-endian length field as a `usize`.
///
/// # Errors
///
/// - [`WireError::UnexpectedEof`] if `buf` is shorter than `width`.
/// - [`WireError::LengthOverflow`] if the value exceeds `usize::MAX`.
pub fn read_len(buf: &[u8], width: Width) -> Result<usize, WireError> {
    let raw = read_uint(buf, width)?;
    usize::try_from(raw).map_err(|_| WireError::LengthOverflow { length: raw })
}

/// Read a big-endian IEEE-754 single.
///
/// # Errors
///
/// [`WireError::UnexpectedEof`] if `buf` holds fewer than 4 bytes.
pub fn read_f32(buf: &[u8]) -> Result<f32, WireError> {
    let field = buf.first_chunk::<4>().ok_or(WireError::UnexpectedEof {
        needed: 4,
        available: buf.len(),
    })?;
    Ok(f32::from_be_bytes(*field))
}

/// Read a big-endian IEEE-754 double.
///
/// # Errors
///
/// [`WireError::UnexpectedEof`] if `buf` holds fewer than 8 bytes.
pub fn read_f64(buf: &[u8]) -> Result<f64, WireError> {
    let field = buf.first_chunk::<8>().ok_or(WireError::UnexpectedEof {
        needed: 8,
        available: buf.len(),
    })?;
    Ok(f64::from_be_bytes(*field))
}

/// Append the low `width` bytes of `value` to `out`, big-endian.
///
/// Signed values are passed as their two's-complement bit pattern; the
/// truncation keeps the sign as long as the value fits the width.
pub fn write_uint(out: &mut Vec<u8>, value: u64, width: Width) {
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[bytes.len() - width.bytes()..]);
}
