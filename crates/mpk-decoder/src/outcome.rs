use mpk_wire::Marker;

/// Result of a single typed decode call.
///
/// `NeedMoreData` guarantees nothing was consumed: the caller commits more
/// bytes and repeats the identical call. Malformed input is reported via
/// the surrounding `Result` instead.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome<T> {
    /// The token was decoded and `consumed` bytes were taken off the
    /// front of the buffered input.
    Decoded { value: T, consumed: usize },

    /// The token is not fully buffered yet.
    NeedMoreData,
}

impl<T> Outcome<T> {
    pub fn decoded(value: T, consumed: usize) -> Self {
        Self::Decoded { value, consumed }
    }

    #[must_use]
    pub fn is_need_more_data(&self) -> bool {
        matches!(self, Self::NeedMoreData)
    }

    /// The decoded value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Decoded { value, .. } => Some(value),
            Self::NeedMoreData => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Decoded { value, consumed } => Outcome::Decoded {
                value: f(value),
                consumed,
            },
            Self::NeedMoreData => Outcome::NeedMoreData,
        }
    }
}

/// What [`MsgPackReader::next`](crate::MsgPackReader::next) observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Next {
    /// A token starts at the read cursor.
    Token(Marker),

    /// No bytes are buffered past the read cursor.
    NeedMoreData,

    /// The current message was marked complete.
    End,
}
