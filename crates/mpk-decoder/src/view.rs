/// Zero-copy reference to a decoded blob inside the reader's arena.
///
/// A view is a plain `[begin, end)` offset range tagged with the arena
/// generation it was issued in. It holds no borrow, so it can be stored
/// while more bytes are fed, but it only resolves (via
/// [`MsgPackReader::view`](crate::MsgPackReader::view)) while the arena
/// is still in that generation.
///
/// # Lifetime contract
///
/// Growth, compaction and discard bump the generation and make every
/// earlier view stale. Copy the bytes out before calling `reserve` with a
/// size that may grow the arena, `compact_for_next_message`, or
/// `discard_message`. Treat `commit` as invalidating too: it never moves
/// bytes today, but ingestion code should not depend on that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlobView {
    pub(crate) begin: usize,
    pub(crate) end: usize,
    pub(crate) generation: u64,
}

impl BlobView {
    #[must_use]
    pub fn begin(&self) -> usize {
        self.begin
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
