use thiserror::Error;

/// Errors produced while decoding a profiler log stream.
///
/// Every variant except [`Error::Io`] is a format error: the stream cannot be
/// interpreted past this point and the run is aborted.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying I/O errors from std::io operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source ran out of bytes in the middle of a value.
    #[error("unexpected end of data at offset {offset}")]
    UnexpectedEof { offset: u64 },

    /// The stream does not start with the log stream magic.
    #[error("invalid stream header magic 0x{found:08X}")]
    InvalidStreamMagic { found: i32 },

    /// The stream declares a format revision this decoder does not understand.
    #[error("unsupported format version {version}; expected {min}..={max}")]
    UnsupportedFormatVersion { version: u8, min: u8, max: u8 },

    /// A buffer header does not start with the buffer magic.
    #[error("invalid buffer header magic 0x{found:08X} at offset {offset}")]
    InvalidBufferMagic { found: i32, offset: u64 },

    /// A buffer header declares a negative payload length.
    #[error("invalid buffer length {length} at offset {offset}")]
    InvalidBufferLength { length: i32, offset: u64 },

    /// A buffer payload exceeds the configured limit.
    #[error("buffer length {length} exceeds configured limit {limit}")]
    BufferTooLarge { length: usize, limit: usize },

    /// The tag byte names no known basic/extended event type combination.
    #[error("invalid event type (basic 0x{basic:X}, extended 0x{extended:02X}) at offset {offset}")]
    InvalidEventType { basic: u8, extended: u8, offset: u64 },

    /// The metadata sub-kind byte is not a known metadata type.
    #[error("invalid metadata type {code} at offset {offset}")]
    InvalidMetadataType { code: u8, offset: u64 },

    /// A known metadata type combined with a load/unload/extra form it never uses.
    #[error("invalid metadata event (type {metadata_type}, extended 0x{extended:02X}) at offset {offset}")]
    InvalidMetadataEvent {
        metadata_type: u8,
        extended: u8,
        offset: u64,
    },

    /// A counter sample names a value type with no known encoding.
    #[error("invalid counter type {code} at offset {offset}")]
    InvalidCounterType { code: u64, offset: u64 },

    /// A LEB128 value ran past the longest encoding of a 64-bit integer.
    #[error("LEB128 value at offset {offset} is longer than 10 bytes")]
    VarintOverflow { offset: u64 },

    /// A GC move list holds an odd number of object pointers.
    #[error("GC move list has odd length {count}")]
    UnpairedMoveList { count: usize },

    /// An AOT id event carries text that is not a GUID.
    #[error("invalid AOT id {value:?}")]
    InvalidAotId { value: String },
}

impl Error {
    /// Create a new `InvalidEventType` error from the raw tag parts.
    pub fn invalid_event_type(basic: u8, extended: u8, offset: u64) -> Self {
        Self::InvalidEventType {
            basic,
            extended,
            offset,
        }
    }

    /// Returns true for errors caused by malformed stream content rather than I/O.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Result type alias for the library operations.
pub type Result<T> = std::result::Result<T, Error>;
