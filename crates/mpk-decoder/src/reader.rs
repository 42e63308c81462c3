use mpk_wire::{Family, Marker};

use crate::arena::ScratchArena;
use crate::blob;
use crate::config::ReaderConfig;
use crate::error::DecodeError;
use crate::outcome::{Next, Outcome};
use crate::scalar;
use crate::view::BlobView;

/// A decoded token of any supported family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bin(BlobView),
}

/// Incremental decoder for one connection's byte stream.
///
/// The reader owns a single [`ScratchArena`] for its whole life. The
/// transport fills it through [`reserve`](Self::reserve) /
/// [`commit`](Self::commit) in whatever chunk sizes the network delivers,
/// and decoding picks tokens off the front without waiting for a message
/// boundary to line up with a read.
///
/// # Driving loop
///
/// ```text
///   ┌─► reserve(n) ─► socket read ─► commit(read)
///   │                                    │
///   │        ┌───────────────────────────┘
///   │        ▼
///   │     next() ──NeedMoreData──────────────────────────┐
///   │        │ Token(marker)                             │
///   │        ▼                                           │
///   │     read_int / read_bin / … ──NeedMoreData─────────┤
///   │        │ Decoded                                   │
///   │        ▼                                           │
///   │   last value of message? ── no ──► next()          │
///   │        │ yes                                       │
///   │        ▼                                           │
///   │   end_message(); compact_for_next_message()        │
///   └────────────────────────────────────────────────────┘
/// ```
///
/// Every `NeedMoreData` leaves the reader untouched, so the caller simply
/// repeats the same call after committing more bytes.
///
/// # Example
///
/// ```
/// use mpk_decoder::{MsgPackReader, Next, Outcome, ReaderConfig};
///
/// let mut reader = MsgPackReader::with_config(ReaderConfig::default().with_initial_capacity(64))?;
///
/// // The bin8 tag arrives alone.
/// reader.feed(&[0xC4])?;
/// assert!(reader.read_bin()?.is_need_more_data());
///
/// // The rest of the token shows up in a later read.
/// reader.feed(&[0x03, b'a', b'b', b'c'])?;
/// let Outcome::Decoded { value: view, .. } = reader.read_bin()? else { unreachable!() };
/// assert_eq!(reader.view(view)?, b"abc");
///
/// reader.end_message();
/// assert_eq!(reader.next()?, Next::End);
/// reader.compact_for_next_message();
/// # Ok::<(), mpk_decoder::DecodeError>(())
/// ```
///
/// # Caller obligations
///
/// - Call the typed read matching what [`next`](Self::next) reported.
///   A mismatched read is a programming error and panics.
/// - Resolve [`BlobView`]s before the next `reserve`, `compact_for_next_message`
///   or `discard_message`; see [`BlobView`] for the exact rule.
/// - Bound message size. The reader buffers whatever it is given; see
///   [`ReaderConfig`] for the one limit it can enforce.
/// - Use one reader per connection, from one thread at a time.
#[derive(Debug)]
pub struct MsgPackReader {
    arena: ScratchArena,
    config: ReaderConfig,
}

impl MsgPackReader {
    /// Create a reader with [`ReaderConfig::default`].
    ///
    /// # Errors
    ///
    /// [`DecodeError::AllocationFailed`] if the initial arena cannot be
    /// allocated.
    pub fn new() -> Result<Self, DecodeError> {
        Self::with_config(ReaderConfig::default())
    }

    /// Create a reader with a custom configuration.
    ///
    /// # Errors
    ///
    /// [`DecodeError::AllocationFailed`] if the initial arena cannot be
    /// allocated.
    pub fn with_config(config: ReaderConfig) -> Result<Self, DecodeError> {
        Ok(Self {
            arena: ScratchArena::with_capacity(config.initial_capacity)?,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    // ── Feeding ──────────────────────────────────────────────────────────

    /// Reserve `n` writable bytes past the committed input.
    ///
    /// Growing the arena invalidates outstanding [`BlobView`]s.
    ///
    /// # Errors
    ///
    /// [`DecodeError::AllocationFailed`] if the arena cannot grow. The
    /// reader should be dropped.
    pub fn reserve(&mut self, n: usize) -> Result<&mut [u8], DecodeError> {
        self.arena.reserve(n)
    }

    /// Mark `written` bytes of the last reservation as received.
    ///
    /// # Panics
    ///
    /// Panics if `written` exceeds the outstanding reservation.
    pub fn commit(&mut self, written: usize) {
        self.arena.commit(written);
    }

    /// Append `bytes` to the buffered input (`reserve` + copy + `commit`).
    ///
    /// # Errors
    ///
    /// [`DecodeError::AllocationFailed`] if the arena cannot grow.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        self.arena.reserve(bytes.len())?.copy_from_slice(bytes);
        self.arena.commit(bytes.len());
        Ok(())
    }

    // ── Classification ───────────────────────────────────────────────────

    /// Classify the token at the read cursor without consuming it.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnknownTag`] if the byte is outside the supported
    /// subset.
    pub fn next(&self) -> Result<Next, DecodeError> {
        if self.arena.is_message_complete() {
            return Ok(Next::End);
        }
        let Some(&byte) = self.arena.unread().first() else {
            return Ok(Next::NeedMoreData);
        };
        Marker::from_u8(byte).map(Next::Token).ok_or_else(|| {
            self.rejected(DecodeError::UnknownTag {
                byte,
                offset: self.arena.read_cursor(),
            })
        })
    }

    // ── Typed reads ──────────────────────────────────────────────────────

    /// # Panics
    ///
    /// Panics if the token at the cursor is not nil, or the message was
    /// marked complete.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnknownTag`] if the cursor is on an unsupported tag.
    pub fn read_nil(&mut self) -> Result<Outcome<()>, DecodeError> {
        let Some(marker) = self.peek_marker("read_nil")? else {
            return Ok(Outcome::NeedMoreData);
        };
        Ok(self.settle(scalar::decode_nil(marker)))
    }

    /// # Panics
    ///
    /// Panics if the token at the cursor is not a boolean, or the message
    /// was marked complete.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnknownTag`] if the cursor is on an unsupported tag.
    pub fn read_bool(&mut self) -> Result<Outcome<bool>, DecodeError> {
        let Some(marker) = self.peek_marker("read_bool")? else {
            return Ok(Outcome::NeedMoreData);
        };
        Ok(self.settle(scalar::decode_bool(marker)))
    }

    /// Read a fixint, uint8..64 or int8..64 token as an `i64`.
    ///
    /// # Panics
    ///
    /// Panics if the token at the cursor is not an integer, or the message
    /// was marked complete.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Uint64Overflow`] for a uint64 above `i64::MAX`.
    ///   The token is not consumed.
    /// - [`DecodeError::UnknownTag`] if the cursor is on an unsupported tag.
    pub fn read_int(&mut self) -> Result<Outcome<i64>, DecodeError> {
        let Some(marker) = self.peek_marker("read_int")? else {
            return Ok(Outcome::NeedMoreData);
        };
        let outcome = scalar::decode_int(marker, self.arena.unread(), self.arena.read_cursor())
            .map_err(|e| self.rejected(e))?;
        Ok(self.settle(outcome))
    }

    /// Read a float32 or float64 token. Singles are widened to `f64`.
    ///
    /// # Panics
    ///
    /// Panics if the token at the cursor is not a float, or the message
    /// was marked complete.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnknownTag`] if the cursor is on an unsupported tag.
    pub fn read_float(&mut self) -> Result<Outcome<f64>, DecodeError> {
        let Some(marker) = self.peek_marker("read_float")? else {
            return Ok(Outcome::NeedMoreData);
        };
        let outcome = scalar::decode_float(marker, self.arena.unread(), self.arena.read_cursor())
            .map_err(|e| self.rejected(e))?;
        Ok(self.settle(outcome))
    }

    /// Read a bin8/16/32 token, returning a view of its payload.
    ///
    /// # Panics
    ///
    /// Panics if the token at the cursor is not a bin, or the message was
    /// marked complete.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::BlobTooLarge`] if the declared length exceeds
    ///   [`ReaderConfig::max_blob_len`] or the address space.
    /// - [`DecodeError::UnknownTag`] if the cursor is on an unsupported tag.
    pub fn read_bin(&mut self) -> Result<Outcome<BlobView>, DecodeError> {
        let Some(marker) = self.peek_marker("read_bin")? else {
            return Ok(Outcome::NeedMoreData);
        };
        let base = self.arena.read_cursor();
        let outcome = blob::decode_bin(marker, self.arena.unread(), base, self.config.max_blob_len)
            .map_err(|e| self.rejected(e))?;
        let generation = self.arena.generation();
        Ok(self.settle(outcome.map(|range| BlobView {
            begin: base + range.start,
            end: base + range.end,
            generation,
        })))
    }

    /// Read whatever token is at the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the message was marked complete.
    ///
    /// # Errors
    ///
    /// Any error the matching typed read can return.
    pub fn read_value(&mut self) -> Result<Outcome<Value>, DecodeError> {
        let marker = match self.next()? {
            Next::Token(marker) => marker,
            Next::NeedMoreData => return Ok(Outcome::NeedMoreData),
            Next::End => panic!("read_value called after end_message"),
        };
        Ok(match marker.family() {
            Family::Nil => self.read_nil()?.map(|()| Value::Nil),
            Family::Bool => self.read_bool()?.map(Value::Bool),
            Family::Int => self.read_int()?.map(Value::Int),
            Family::Float => self.read_float()?.map(Value::Float),
            Family::Bin => self.read_bin()?.map(Value::Bin),
        })
    }

    /// Resolve a blob view to its bytes.
    ///
    /// # Errors
    ///
    /// [`DecodeError::StaleView`] if the arena moved bytes since the view
    /// was issued.
    pub fn view(&self, view: BlobView) -> Result<&[u8], DecodeError> {
        let stale = DecodeError::StaleView {
            issued: view.generation,
            current: self.arena.generation(),
        };
        if view.generation != self.arena.generation() {
            return Err(stale);
        }
        self.arena.committed(view.begin..view.end).ok_or(stale)
    }

    // ── Message lifecycle ────────────────────────────────────────────────

    /// Declare the current message fully decoded.
    ///
    /// From here on [`next`](Self::next) reports [`Next::End`] until
    /// [`compact_for_next_message`](Self::compact_for_next_message).
    pub fn end_message(&mut self) {
        self.arena.mark_message_complete();
    }

    /// Drop the finished message, keeping bytes already received for the
    /// next one.
    ///
    /// # Panics
    ///
    /// Panics unless [`end_message`](Self::end_message) was called first.
    pub fn compact_for_next_message(&mut self) {
        self.arena.compact_for_next_message();
    }

    /// Abandon the current message after a protocol error.
    ///
    /// Every buffered byte is dropped, since the reader cannot tell where
    /// a malformed message ends. The arena allocation is kept.
    pub fn discard_message(&mut self) {
        tracing::debug!(
            dropped = self.arena.used_end(),
            at = self.arena.read_cursor(),
            "discarding buffered message"
        );
        self.arena.clear();
    }

    /// Release the arena. Dropping the reader has the same effect.
    pub fn close(self) {
        self.arena.close();
    }

    // ── Introspection ────────────────────────────────────────────────────

    #[must_use]
    pub fn read_cursor(&self) -> usize {
        self.arena.read_cursor()
    }

    #[must_use]
    pub fn used_end(&self) -> usize {
        self.arena.used_end()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.arena.remaining()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.arena.generation()
    }

    #[must_use]
    pub fn is_message_complete(&self) -> bool {
        self.arena.is_message_complete()
    }

    // ── Internals ────────────────────────────────────────────────────────

    /// Marker at the cursor, or `None` when nothing is buffered.
    fn peek_marker(&self, op: &str) -> Result<Option<Marker>, DecodeError> {
        assert!(
            !self.arena.is_message_complete(),
            "{op} called after end_message"
        );
        let Some(&byte) = self.arena.unread().first() else {
            return Ok(None);
        };
        Marker::from_u8(byte).map(Some).ok_or_else(|| {
            self.rejected(DecodeError::UnknownTag {
                byte,
                offset: self.arena.read_cursor(),
            })
        })
    }

    fn settle<T>(&mut self, outcome: Outcome<T>) -> Outcome<T> {
        if let Outcome::Decoded { consumed, .. } = outcome {
            self.arena.consume(consumed);
        }
        outcome
    }

    fn rejected(&self, err: DecodeError) -> DecodeError {
        tracing::debug!(
            offset = self.arena.read_cursor(),
            error = %err,
            "rejecting malformed token"
        );
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpk_encoder::MsgPackWriter;

    fn reader() -> MsgPackReader {
        MsgPackReader::with_config(ReaderConfig::default().with_initial_capacity(16)).unwrap()
    }

    #[test]
    fn next_on_empty_reader_needs_data() {
        assert_eq!(reader().next(), Ok(Next::NeedMoreData));
    }

    #[test]
    fn next_does_not_consume() {
        let mut r = reader();
        r.feed(&[0x05]).unwrap();
        assert_eq!(r.next(), Ok(Next::Token(Marker::PosFixInt(5))));
        assert_eq!(r.next(), Ok(Next::Token(Marker::PosFixInt(5))));
        assert_eq!(r.read_cursor(), 0);
    }

    #[test]
    fn unknown_tag_is_reported_at_cursor() {
        let mut r = reader();
        r.feed(&[0x01, 0xC1]).unwrap();
        assert!(matches!(r.read_int(), Ok(Outcome::Decoded { value: 1, .. })));
        assert_eq!(r.next(), Err(DecodeError::UnknownTag { byte: 0xC1, offset: 1 }));
    }

    #[test]
    fn typed_read_with_nothing_buffered_suspends() {
        let mut r = reader();
        assert_eq!(r.read_int(), Ok(Outcome::NeedMoreData));
        assert_eq!(r.read_bin(), Ok(Outcome::NeedMoreData));
    }

    #[test]
    fn reads_advance_by_token_length() {
        let mut w = MsgPackWriter::new();
        w.write_nil().write_bool(true).write_int(-300).write_f32(2.5);
        let mut r = reader();
        r.feed(w.as_bytes()).unwrap();

        assert_eq!(r.read_nil(), Ok(Outcome::decoded((), 1)));
        assert_eq!(r.read_bool(), Ok(Outcome::decoded(true, 1)));
        assert_eq!(r.read_int(), Ok(Outcome::decoded(-300, 3)));
        assert_eq!(r.read_float(), Ok(Outcome::decoded(2.5, 5)));
        assert_eq!(r.read_cursor(), 10);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn overflow_leaves_token_in_place() {
        let mut r = reader();
        r.feed(&[0xCF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF])
            .unwrap();
        assert_eq!(
            r.read_int(),
            Err(DecodeError::Uint64Overflow {
                value: u64::MAX,
                offset: 0
            })
        );
        assert_eq!(r.read_cursor(), 0);
    }

    #[test]
    fn view_resolves_within_generation() {
        let mut r = reader();
        r.feed(&[0xC4, 0x02, b'h', b'i', 0xC0]).unwrap();
        let Outcome::Decoded { value: view, consumed } = r.read_bin().unwrap() else {
            panic!("expected a decoded blob");
        };
        assert_eq!(consumed, 4);
        assert_eq!((view.begin(), view.end()), (2, 4));
        assert_eq!(r.view(view).unwrap(), b"hi");
    }

    #[test]
    fn growth_makes_views_stale() {
        let mut r = reader();
        r.feed(&[0xC4, 0x01, b'x']).unwrap();
        let view = r.read_bin().unwrap().value().unwrap();
        r.reserve(1024).unwrap();
        assert_eq!(
            r.view(view),
            Err(DecodeError::StaleView {
                issued: view.generation(),
                current: r.generation()
            })
        );
    }

    #[test]
    fn blob_limit_comes_from_config() {
        let mut r = MsgPackReader::with_config(
            ReaderConfig::default()
                .with_initial_capacity(16)
                .with_max_blob_len(4),
        )
        .unwrap();
        r.feed(&[0xC5, 0x00, 0x05]).unwrap();
        assert_eq!(
            r.read_bin(),
            Err(DecodeError::BlobTooLarge {
                len: 5,
                limit: 4,
                offset: 0
            })
        );
    }

    #[test]
    fn read_value_dispatches_on_family() {
        let mut w = MsgPackWriter::new();
        w.write_nil().write_bool(false).write_uint(200).write_f64(1.25);
        w.write_bin(b"ok").unwrap();
        let mut r = reader();
        r.feed(w.as_bytes()).unwrap();

        let mut values = Vec::new();
        while let Outcome::Decoded { value, .. } = r.read_value().unwrap() {
            values.push(value);
        }
        assert_eq!(values.len(), 5);
        assert_eq!(values[0], Value::Nil);
        assert_eq!(values[1], Value::Bool(false));
        assert_eq!(values[2], Value::Int(200));
        assert_eq!(values[3], Value::Float(1.25));
        let Value::Bin(view) = values[4] else {
            panic!("expected a blob");
        };
        assert_eq!(r.view(view).unwrap(), b"ok");
    }

    #[test]
    fn end_message_then_compact() {
        let mut r = reader();
        r.feed(&[0x01, 0x02]).unwrap();
        assert!(matches!(r.read_int(), Ok(Outcome::Decoded { value: 1, .. })));
        r.end_message();
        assert_eq!(r.next(), Ok(Next::End));

        r.compact_for_next_message();
        assert_eq!(r.read_cursor(), 0);
        assert_eq!(r.used_end(), 1);
        assert_eq!(r.next(), Ok(Next::Token(Marker::PosFixInt(2))));
    }

    #[test]
    #[should_panic(expected = "read_int called after end_message")]
    fn typed_read_after_end_panics() {
        let mut r = reader();
        r.feed(&[0x01]).unwrap();
        r.end_message();
        let _ = r.read_int();
    }

    #[test]
    #[should_panic(expected = "read_float called on a true token")]
    fn mismatched_read_panics() {
        let mut r = reader();
        r.feed(&[0xC3]).unwrap();
        let _ = r.read_float();
    }

    #[test]
    fn discard_recovers_after_protocol_error() {
        let mut r = reader();
        r.feed(&[0x91, 0x01]).unwrap();
        let err = r.next().unwrap_err();
        assert!(err.is_protocol());

        r.discard_message();
        assert_eq!(r.used_end(), 0);
        r.feed(&[0x07]).unwrap();
        assert_eq!(r.read_int(), Ok(Outcome::decoded(7, 1)));
    }

    #[test]
    fn close_consumes_reader() {
        let mut r = reader();
        r.feed(&[0xC0]).unwrap();
        r.close();
    }
}
