//! Chunked token walk shared by `inspect` and `validate`.
//!
//! The walker plays the transport: it hands the reader at most
//! `chunk_size` bytes per feed and retries whatever call reported
//! `NeedMoreData`. Offsets it reports are absolute file offsets, so it
//! tracks how many bytes earlier compactions dropped off the arena front
//! and rebases the reader's arena-relative error offsets onto the file.

use std::num::NonZeroUsize;

use mpk_decoder::{DecodeError, Marker, MsgPackReader, Next, Outcome, ReaderConfig, Value};

/// One decoded token with its payload copied out of the arena.
#[derive(Debug)]
pub struct Token {
    pub offset: u64,
    pub marker: Marker,
    pub value: Owned,
}

#[derive(Debug)]
pub enum Owned {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bin(Vec<u8>),
}

pub enum Step {
    Token(Token),
    /// Input ended inside a token.
    Truncated { offset: u64, buffered: usize },
    /// Input ended on a token boundary.
    Eof,
}

pub struct Walker<'a> {
    input: &'a [u8],
    fed: usize,
    chunk_size: usize,
    reader: MsgPackReader,
    /// Absolute offset of arena position 0.
    base: usize,
    values_per_message: Option<NonZeroUsize>,
    in_message: usize,
    messages: usize,
}

impl<'a> Walker<'a> {
    /// # Errors
    ///
    /// Fails if the reader's initial arena cannot be allocated.
    pub fn new(
        input: &'a [u8],
        chunk_size: NonZeroUsize,
        values_per_message: Option<NonZeroUsize>,
        config: ReaderConfig,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            input,
            fed: 0,
            chunk_size: chunk_size.get(),
            reader: MsgPackReader::with_config(config)?,
            base: 0,
            values_per_message,
            in_message: 0,
            messages: 0,
        })
    }

    /// Messages closed so far, counting a trailing partial one at EOF.
    pub fn messages(&self) -> usize {
        self.messages + usize::from(self.in_message > 0)
    }

    /// Absolute file offset of the reader's cursor.
    ///
    /// After a failed [`step`](Self::step) this is where the offending
    /// token starts.
    pub fn position(&self) -> u64 {
        (self.base + self.reader.read_cursor()) as u64
    }

    pub fn capacity(&self) -> usize {
        self.reader.capacity()
    }

    /// Decode the next token, feeding more input as needed.
    ///
    /// # Errors
    ///
    /// Any protocol error the reader reports, with its offset rebased to
    /// the file. The walk cannot continue past one, since the extent of
    /// the bad token is unknown.
    pub fn step(&mut self) -> Result<Step, DecodeError> {
        let base = self.base;
        self.advance().map_err(|e| rebase(e, base))
    }

    fn advance(&mut self) -> Result<Step, DecodeError> {
        loop {
            let marker = match self.reader.next()? {
                Next::Token(marker) => marker,
                Next::NeedMoreData => {
                    if !self.feed_chunk()? {
                        return Ok(Step::Eof);
                    }
                    continue;
                }
                Next::End => unreachable!("messages are compacted as soon as they end"),
            };

            let offset = self.position();
            let value = match self.reader.read_value()? {
                Outcome::Decoded { value, .. } => self.own(value)?,
                Outcome::NeedMoreData => {
                    if !self.feed_chunk()? {
                        let buffered = self.reader.remaining();
                        tracing::debug!(offset, buffered, "input ended inside a token");
                        return Ok(Step::Truncated { offset, buffered });
                    }
                    continue;
                }
            };

            self.in_message += 1;
            if self
                .values_per_message
                .is_some_and(|k| self.in_message == k.get())
            {
                self.close_message();
            }
            return Ok(Step::Token(Token {
                offset,
                marker,
                value,
            }));
        }
    }

    /// Hand the reader the next chunk. Returns `false` at end of input.
    fn feed_chunk(&mut self) -> Result<bool, DecodeError> {
        let end = self.input.len().min(self.fed + self.chunk_size);
        if end == self.fed {
            return Ok(false);
        }
        self.reader.feed(&self.input[self.fed..end])?;
        self.fed = end;
        Ok(true)
    }

    fn own(&self, value: Value) -> Result<Owned, DecodeError> {
        Ok(match value {
            Value::Nil => Owned::Nil,
            Value::Bool(b) => Owned::Bool(b),
            Value::Int(i) => Owned::Int(i),
            Value::Float(f) => Owned::Float(f),
            Value::Bin(view) => Owned::Bin(self.reader.view(view)?.to_vec()),
        })
    }

    fn close_message(&mut self) {
        let consumed = self.reader.read_cursor();
        self.reader.end_message();
        self.reader.compact_for_next_message();
        self.base += consumed;
        self.in_message = 0;
        self.messages += 1;
        tracing::debug!(
            messages = self.messages,
            consumed,
            base = self.base,
            "message closed"
        );
    }
}

/// Shift an arena-relative error offset by `base`.
fn rebase(err: DecodeError, base: usize) -> DecodeError {
    match err {
        DecodeError::UnknownTag { byte, offset } => DecodeError::UnknownTag {
            byte,
            offset: base + offset,
        },
        DecodeError::Uint64Overflow { value, offset } => DecodeError::Uint64Overflow {
            value,
            offset: base + offset,
        },
        DecodeError::BlobTooLarge { len, limit, offset } => DecodeError::BlobTooLarge {
            len,
            limit,
            offset: base + offset,
        },
        other => other,
    }
}
