//! Custom error types for the welllog-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum WellLogError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes were available than a fixed width read required.
    #[error("Unexpected EOF at offset {offset}: wanted {wanted} bytes, {available} available")]
    Eof {
        offset: u64,
        wanted: usize,
        available: usize,
    },

    /// A LIS record started but the file ended before it was complete.
    /// Distinct from a clean EOF at a record boundary.
    #[error("Truncated record at offset {offset}: {message}")]
    Truncated { offset: u64, message: String },

    /// Malformed Visible Record, Physical Record, TIF marker or segment header.
    #[error("Framing error at offset {offset}: {message}")]
    Framing { offset: u64, message: String },

    /// Structural violation while assembling an EFLR template or its objects.
    #[error("Malformed EFLR: {0}")]
    MalformedEflr(String),

    /// Structural violation while assembling the rows of a LIS table record.
    #[error("Table initialisation error: {0}")]
    TableInit(String),

    #[error("Unsupported representation code: {0}")]
    UnsupportedRepCode(u8),

    #[error("Truncated value for representation code {code}: expected {expected} bytes, found {found}")]
    TruncatedValue {
        code: u8,
        expected: usize,
        found: usize,
    },

    #[error("Value {value} can not be represented by representation code {code}")]
    ValueOutOfRange { code: u8, value: String },

    /// Declared and computed frame sizes disagree.
    #[error("Frame size mismatch: declared {declared} bytes, computed {computed} bytes")]
    FrameSizeMismatch { declared: usize, computed: usize },

    /// The X axis spacing can not be determined.
    #[error("No usable frame spacing: {0}")]
    NullSpacing(String),

    #[error("{what} index {index} out of range for length {len}")]
    IndexOutOfRange {
        what: &'static str,
        index: i64,
        len: usize,
    },

    /// The index has released its file handle.
    #[error("Index has been closed")]
    ClosedIndex,

    #[error("File lock poisoned")]
    LockPoisoned,

    /// A LogPass or LogicalFile could not be constructed from its records.
    #[error("Construction failed: {0}")]
    Ctor(String),

    /// Channel geometry could not be resolved into a fixed frame layout.
    #[error("Frame geometry error: {0}")]
    Geometry(String),

    /// The index snapshot could not be serialized or restored.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A unit that can not be converted, or a conversion across categories.
    #[error("Unit conversion error: {0}")]
    Units(String),

    /// The file is structurally invalid in a way not covered above.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl WellLogError {
    /// True if the error is confined to a single record so a scan can log it
    /// and move on to the next independently framed record.
    ///
    /// Everything else (I/O, framing, geometry, closed handles) invalidates the
    /// remainder of the file or the frame array being built.
    pub fn is_record_local(&self) -> bool {
        matches!(
            self,
            WellLogError::MalformedEflr(_)
                | WellLogError::TableInit(_)
                | WellLogError::UnsupportedRepCode(_)
                | WellLogError::TruncatedValue { .. }
                | WellLogError::ValueOutOfRange { .. }
        )
    }

    pub(crate) fn index(what: &'static str, index: i64, len: usize) -> Self {
        WellLogError::IndexOutOfRange { what, index, len }
    }
}

/// A convenience `Result` type alias using the crate's `WellLogError` type.
pub type Result<T> = std::result::Result<T, WellLogError>;
