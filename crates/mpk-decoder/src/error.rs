use mpk_wire::WireError;

/// Errors surfaced by the incremental reader.
///
/// Running out of buffered bytes is not an error: it is reported as
/// [`Outcome::NeedMoreData`](crate::Outcome::NeedMoreData). What remains
/// splits into two classes with different recovery rules:
///
/// ```text
///   DecodeError
///   ├── UnknownTag        ─┐
///   ├── Uint64Overflow     │ protocol errors: abort the current message,
///   ├── BlobTooLarge       │ call discard_message(), keep the reader
///   ├── StaleView          │
///   ├── Wire(WireError)   ─┘
///   └── AllocationFailed  ← fatal: drop the reader, tear down the connection
/// ```
///
/// Offsets are relative to the arena base at the time of the failure.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The byte at the read cursor is not a supported tag.
    #[error("unrecognized tag byte {byte:#04X} at offset {offset}")]
    UnknownTag { byte: u8, offset: usize },

    /// A uint64 token holds a value above `i64::MAX`.
    #[error("uint64 value {value} at offset {offset} does not fit in i64")]
    Uint64Overflow { value: u64, offset: usize },

    /// A bin header declares a length beyond the configured limit, or
    /// beyond what the address space can hold.
    #[error("blob of {len} bytes at offset {offset} exceeds limit of {limit} bytes")]
    BlobTooLarge { len: u64, limit: usize, offset: usize },

    /// The arena could not grow to the requested capacity.
    #[error("scratch arena could not grow to {requested} bytes")]
    AllocationFailed { requested: usize },

    /// A [`BlobView`](crate::BlobView) was resolved after the arena moved
    /// its bytes.
    #[error("blob view from generation {issued} used at generation {current}")]
    StaleView { issued: u64, current: u64 },

    /// Any other wire-level failure.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl DecodeError {
    /// Attach the stream offset to a wire-level failure.
    pub(crate) fn at(offset: usize, err: WireError) -> Self {
        match err {
            WireError::UnknownMarker { byte } => Self::UnknownTag { byte, offset },
            WireError::Uint64Overflow { value } => Self::Uint64Overflow { value, offset },
            WireError::LengthOverflow { length } => Self::BlobTooLarge {
                len: length,
                limit: usize::MAX,
                offset,
            },
            other @ WireError::UnexpectedEof { .. } => Self::Wire(other),
        }
    }

    /// `true` for errors scoped to the current message.
    ///
    /// After a protocol error the reader is still usable once the
    /// offending bytes are dropped with
    /// [`discard_message`](crate::MsgPackReader::discard_message).
    #[must_use]
    pub fn is_protocol(&self) -> bool {
        !matches!(self, Self::AllocationFailed { .. })
    }
}
