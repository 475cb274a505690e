//! Error types for the merge orchestrator

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for merging page ranges
///
/// Every variant that concerns a particular input file carries its name so the
/// caller can show a precise message.
#[derive(Error, Debug)]
pub enum Error {
    /// The file does not look like a PDF (wrong extension or missing signature)
    #[error("\"{name}\" is not a valid PDF file")]
    InvalidFile { name: String },

    /// The document library could not open the bytes as a document
    #[error("Failed to parse \"{name}\": {source}")]
    Parse {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Start page is greater than end page after clamping
    #[error("In \"{name}\", start page {start} is greater than end page {end}")]
    Range { name: String, start: u32, end: u32 },

    /// The underlying file could not be read
    #[error("Unable to read \"{name}\": {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Slot index outside the active range
    #[error("Slot {0} does not exist")]
    SlotNotFound(usize),

    /// More inputs than available slots
    #[error("Too many input files: {requested} given, at most {limit} allowed")]
    TooManySlots { requested: usize, limit: usize },

    /// Slot description that cannot be understood
    #[error("Invalid slot description: {0}")]
    InvalidSlotSpec(String),

    /// Failure inside the document library while copying or serializing
    #[error("PDF error: {0}")]
    Library(Box<dyn std::error::Error + Send + Sync>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Name of the file this error refers to, if any
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Error::InvalidFile { name }
            | Error::Parse { name, .. }
            | Error::Range { name, .. }
            | Error::Read { name, .. } => Some(name),
            _ => None,
        }
    }
}
