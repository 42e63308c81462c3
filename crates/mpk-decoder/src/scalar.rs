//! Scalar token decoders.
//!
//! Each routine looks at the unread bytes starting with the token's tag
//! and either decodes the whole token or reports `NeedMoreData` without
//! consuming anything. The caller advances the cursor on success, so a
//! suspended call can be repeated verbatim once more bytes arrive.

use mpk_wire::width::{self, Signedness, Width};
use mpk_wire::Marker;

use crate::error::DecodeError;
use crate::outcome::Outcome;

/// A typed read was issued for a token of another family.
#[cold]
#[track_caller]
pub(crate) fn contract_violation(op: &str, marker: Marker) -> ! {
    panic!("{op} called on a {marker} token; observe the tag with next() first")
}

pub(crate) fn decode_nil(marker: Marker) -> Outcome<()> {
    match marker {
        Marker::Nil => Outcome::decoded((), 1),
        other => contract_violation("read_nil", other),
    }
}

pub(crate) fn decode_bool(marker: Marker) -> Outcome<bool> {
    match marker {
        Marker::False => Outcome::decoded(false, 1),
        Marker::True => Outcome::decoded(true, 1),
        other => contract_violation("read_bool", other),
    }
}

pub(crate) fn decode_int(
    marker: Marker,
    unread: &[u8],
    offset: usize,
) -> Result<Outcome<i64>, DecodeError> {
    use Signedness::{Signed, Unsigned};

    match marker {
        Marker::PosFixInt(v) => Ok(Outcome::decoded(i64::from(v), 1)),
        Marker::NegFixInt(v) => Ok(Outcome::decoded(i64::from(v), 1)),
        Marker::U8 => fixed_width(unread, offset, Width::W8, Unsigned),
        Marker::U16 => fixed_width(unread, offset, Width::W16, Unsigned),
        Marker::U32 => fixed_width(unread, offset, Width::W32, Unsigned),
        Marker::U64 => fixed_width(unread, offset, Width::W64, Unsigned),
        Marker::I8 => fixed_width(unread, offset, Width::W8, Signed),
        Marker::I16 => fixed_width(unread, offset, Width::W16, Signed),
        Marker::I32 => fixed_width(unread, offset, Width::W32, Signed),
        Marker::I64 => fixed_width(unread, offset, Width::W64, Signed),
        Marker::Nil
        | Marker::False
        | Marker::True
        | Marker::Bin8
        | Marker::Bin16
        | Marker::Bin32
        | Marker::F32
        | Marker::F64 => contract_violation("read_int", marker),
    }
}

pub(crate) fn decode_float(
    marker: Marker,
    unread: &[u8],
    offset: usize,
) -> Result<Outcome<f64>, DecodeError> {
    let total = marker.header_len();
    let payload = match marker {
        Marker::F32 | Marker::F64 => match unread.get(1..total) {
            Some(payload) => payload,
            None => return Ok(Outcome::NeedMoreData),
        },
        other => contract_violation("read_float", other),
    };

    let value = match marker {
        Marker::F32 => width::read_f32(payload).map(f64::from),
        _ => width::read_f64(payload),
    }
    .map_err(|e| DecodeError::at(offset, e))?;

    Ok(Outcome::decoded(value, total))
}

/// Decode a tag followed by a `width`-byte integer.
///
/// The availability check covers the whole token before any payload
/// byte is read.
fn fixed_width(
    unread: &[u8],
    offset: usize,
    width: Width,
    signedness: Signedness,
) -> Result<Outcome<i64>, DecodeError> {
    let total = 1 + width.bytes();
    let Some(token) = unread.get(..total) else {
        return Ok(Outcome::NeedMoreData);
    };
    let value =
        width::read_int(&token[1..], width, signedness).map_err(|e| DecodeError::at(offset, e))?;
    Ok(Outcome::decoded(value, total))
}
