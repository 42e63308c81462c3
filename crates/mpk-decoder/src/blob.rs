use std::ops::Range;

use mpk_wire::width::{self, Width};
use mpk_wire::{Marker, WireError};

use crate::error::DecodeError;
use crate::outcome::Outcome;
use crate::scalar::contract_violation;

/// Decode a bin8/16/32 token from the front of `unread`.
///
/// On success returns the payload range relative to `unread` and the
/// total token length (tag + length field + payload). The token is taken
/// all-or-nothing: a decodable header with a partial payload still
/// yields `NeedMoreData` and leaves the header unconsumed.
///
/// ```text
/// ┌─────┬──────────────────┬─────────────────────┐
/// │ tag │ length (1/2/4 B) │ payload [length]    │
/// └─────┴──────────────────┴─────────────────────┘
///  ◄──── header_len ──────►◄──── range ─────────►
/// ```
pub(crate) fn decode_bin(
    marker: Marker,
    unread: &[u8],
    offset: usize,
    max_len: Option<usize>,
) -> Result<Outcome<Range<usize>>, DecodeError> {
    let length_width = match marker {
        Marker::Bin8 => Width::W8,
        Marker::Bin16 => Width::W16,
        Marker::Bin32 => Width::W32,
        other => contract_violation("read_bin", other),
    };

    let header_len = 1 + length_width.bytes();
    let Some(header) = unread.get(..header_len) else {
        return Ok(Outcome::NeedMoreData);
    };

    let len = width::read_len(&header[1..], length_width).map_err(|e| DecodeError::at(offset, e))?;
    if let Some(limit) = max_len
        && len > limit
    {
        return Err(DecodeError::BlobTooLarge {
            len: declared(len),
            limit,
            offset,
        });
    }

    let total = header_len
        .checked_add(len)
        .ok_or(DecodeError::at(offset, WireError::LengthOverflow { length: declared(len) }))?;
    if unread.len() < total {
        return Ok(Outcome::NeedMoreData);
    }

    Ok(Outcome::decoded(header_len..total, total))
}

fn declared(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}
