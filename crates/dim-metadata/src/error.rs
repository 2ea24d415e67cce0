use thiserror::Error;

/// Errors raised while reading or writing package metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The input ended inside a record.
    #[error("unexpected end of metadata at byte {offset}")]
    UnexpectedEof { offset: usize },

    #[error("invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    /// A negative count or an overlong string length prefix.
    #[error("invalid length {length} at byte {offset}")]
    InvalidLength { length: i64, offset: usize },

    /// A type reference that must be present was written as absent.
    #[error("missing type reference at byte {offset}")]
    MissingType { offset: usize },

    /// A class type without a namespace, or an unknown primitive name.
    #[error("unresolved type {name}")]
    UnresolvedType { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
