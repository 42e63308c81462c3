use mpk_wire::Marker;

/// Errors that can occur while producing wire bytes.
///
/// ```text
///   EncodeError
///   ├── BlobTooLarge        ← blob longer than the bin length field allows
///   ├── Unrepresentable     ← forced marker cannot carry the given value
///   └── Io(std::io::Error)  ← from write_to
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("blob of {len} bytes does not fit the bin length field")]
    BlobTooLarge { len: usize },

    #[error("value {value} cannot be encoded as {marker}")]
    Unrepresentable { value: i128, marker: Marker },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
