use std::ops::Range;

use crate::error::DecodeError;

/// Growable byte region holding buffered-but-undecoded input for one
/// connection.
///
/// Every position is an offset from the arena base, so reallocating the
/// backing storage during growth cannot leave a dangling position behind.
///
/// ```text
///  0            read_cursor           used_end            capacity
///  ├── consumed ──────┼──── unread ──────┼──── writable ──────┤
///                     │◄── remaining() ─►│◄─ reserve(n) ─►│
/// ```
///
/// Invariant: `0 ≤ read_cursor ≤ used_end ≤ capacity`.
///
/// The arena bumps a generation counter whenever previously decoded
/// bytes may have changed place: on growth, compaction and clear.
/// [`BlobView`](crate::BlobView)s record the generation they were issued
/// in and refuse to resolve afterwards.
#[derive(Debug, Default)]
pub struct ScratchArena {
    /// Backing storage. `buf.len()` is the capacity; bytes past
    /// `used_end` are scratch space handed out by `reserve`.
    buf: Vec<u8>,
    used_end: usize,
    read_cursor: usize,
    /// Length of the region handed out by the last `reserve` that has
    /// not been committed yet.
    reserved: usize,
    message_complete: bool,
    generation: u64,
}

impl ScratchArena {
    /// Create an empty arena that allocates on first `reserve`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with `capacity` bytes allocated up front.
    ///
    /// # Errors
    ///
    /// [`DecodeError::AllocationFailed`] if the allocation is refused.
    pub fn with_capacity(capacity: usize) -> Result<Self, DecodeError> {
        let mut arena = Self::new();
        if capacity > 0 {
            arena.grow_to(capacity)?;
        }
        // A fresh arena starts at generation 0 regardless of the initial
        // allocation.
        arena.generation = 0;
        Ok(arena)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn used_end(&self) -> usize {
        self.used_end
    }

    #[must_use]
    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    /// Committed bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.used_end - self.read_cursor
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_message_complete(&self) -> bool {
        self.message_complete
    }

    /// Make room for `n` more bytes past `used_end` and return that
    /// region for the caller to fill (typically from a socket read).
    ///
    /// Growth rounds the capacity up to the next power of two and keeps
    /// every committed byte at its offset. The arena never shrinks.
    ///
    /// # Errors
    ///
    /// [`DecodeError::AllocationFailed`] if the new capacity overflows
    /// `usize` or the allocator refuses it. The arena is left unchanged.
    pub fn reserve(&mut self, n: usize) -> Result<&mut [u8], DecodeError> {
        let needed = self
            .used_end
            .checked_add(n)
            .ok_or(DecodeError::AllocationFailed {
                requested: usize::MAX,
            })?;

        if needed > self.capacity() {
            let next = needed
                .checked_next_power_of_two()
                .ok_or(DecodeError::AllocationFailed { requested: needed })?;
            self.grow_to(next)?;
        }

        self.reserved = n;
        Ok(&mut self.buf[self.used_end..needed])
    }

    /// Record that `written` bytes of the last reserved region now hold
    /// data. The read cursor does not move.
    ///
    /// A reservation may be committed in several steps.
    ///
    /// # Panics
    ///
    /// Panics if `written` exceeds what is left of the last reservation.
    pub fn commit(&mut self, written: usize) {
        assert!(
            written <= self.reserved,
            "commit of {written} bytes exceeds the {} reserved",
            self.reserved
        );
        self.used_end += written;
        self.reserved -= written;
    }

    /// Committed bytes from the read cursor on.
    #[must_use]
    pub fn unread(&self) -> &[u8] {
        &self.buf[self.read_cursor..self.used_end]
    }

    /// Committed bytes in `range`, which must lie within `[0, used_end)`.
    pub(crate) fn committed(&self, range: Range<usize>) -> Option<&[u8]> {
        if range.end > self.used_end {
            return None;
        }
        self.buf.get(range)
    }

    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.remaining(), "consumed past used_end");
        self.read_cursor += n;
    }

    pub(crate) fn mark_message_complete(&mut self) {
        self.message_complete = true;
    }

    /// Drop the finished message and move any bytes already received for
    /// the next one to the front.
    ///
    /// # Panics
    ///
    /// Panics if the current message has not been marked complete.
    pub fn compact_for_next_message(&mut self) {
        assert!(
            self.message_complete,
            "compact_for_next_message called before the message was complete"
        );

        let leftover = self.remaining();
        if self.read_cursor > 0 {
            self.buf.copy_within(self.read_cursor..self.used_end, 0);
        }
        tracing::trace!(
            consumed = self.read_cursor,
            leftover,
            "compacted scratch arena for next message"
        );

        self.read_cursor = 0;
        self.used_end = leftover;
        self.reserved = 0;
        self.message_complete = false;
        self.bump_generation();
    }

    /// Forget every buffered byte, keeping the allocation.
    pub fn clear(&mut self) {
        self.read_cursor = 0;
        self.used_end = 0;
        self.reserved = 0;
        self.message_complete = false;
        self.bump_generation();
    }

    /// Release the backing allocation.
    pub fn close(self) {
        tracing::trace!(capacity = self.capacity(), "released scratch arena");
    }

    fn grow_to(&mut self, capacity: usize) -> Result<(), DecodeError> {
        let old = self.capacity();
        self.buf
            .try_reserve_exact(capacity - old)
            .map_err(|_| DecodeError::AllocationFailed {
                requested: capacity,
            })?;
        self.buf.resize(capacity, 0);
        self.bump_generation();
        tracing::trace!(from = old, to = capacity, "grew scratch arena");
        Ok(())
    }

    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
