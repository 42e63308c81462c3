/// Default arena size for a fresh reader (1 MiB).
pub const DEFAULT_INITIAL_CAPACITY: usize = 1 << 20;

/// Configuration for a [`MsgPackReader`](crate::MsgPackReader).
///
/// ```text
/// ┌──────────────────┬──────────────────────────────────────────────────┐
/// │ Field            │ Purpose                                          │
/// ├──────────────────┼──────────────────────────────────────────────────┤
/// │ initial_capacity │ Arena bytes allocated up front (0 = on demand)   │
/// │ max_blob_len     │ Reject bin headers declaring more than this      │
/// └──────────────────┴──────────────────────────────────────────────────┘
/// ```
///
/// The reader itself never caps message size. A connection that keeps
/// sending will keep growing the arena; the ingestion layer decides when
/// that is too much, either by bounding what it passes to `reserve` or by
/// setting `max_blob_len` so an oversized blob is refused as soon as its
/// header arrives instead of after the payload has been buffered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    pub initial_capacity: usize,
    pub max_blob_len: Option<usize>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_blob_len: None,
        }
    }
}

impl ReaderConfig {
    #[must_use]
    pub fn with_initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    #[must_use]
    pub fn with_max_blob_len(mut self, bytes: usize) -> Self {
        self.max_blob_len = Some(bytes);
        self
    }
}
