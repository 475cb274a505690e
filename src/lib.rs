//! PDF Range Merge Library
//!
//! Pick up to ten PDF files, choose a page range from each, and produce one
//! merged PDF. This library provides:
//! - A slot manager holding the ordered list of inputs and their page ranges
//! - Range resolution against each document's real page count
//! - A merge sequencer that copies the ranges in slot order, all-or-nothing
//! - An lopdf-backed document library and filesystem/in-memory file readers
//!
//! # Example
//!
//! ```no_run
//! use pdf_range_merge::{FileRef, FsReader, LopdfLibrary, MergeConfig, Merger, SlotManager};
//!
//! # async fn run() -> pdf_range_merge::Result<()> {
//! let config = MergeConfig::default();
//! let mut slots = SlotManager::with_config(&config);
//! slots.assign_document(1, FileRef::new("1. intro.pdf"), None)?;
//! let second = slots.add_slot().expect("room for a second slot");
//! slots.assign_document(second, FileRef::new("2. advanced.pdf"), None)?;
//! slots.set_range(second, Some(2), Some(4))?;
//!
//! let mut merger = Merger::new(FsReader, LopdfLibrary::new(&config), config);
//! let result = merger
//!     .merge(&slots, "", |p| eprintln!("{:>3.0}% {}", p.percent, p.message))
//!     .await?;
//! std::fs::write(&result.filename, &result.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod merge;
pub mod pdf;
pub mod range;
pub mod reader;
pub mod slots;

// Re-export commonly used items
pub use config::{MergeConfig, DEFAULT_FILENAME, MAX_SLOTS};
pub use error::{Error, Result};
pub use merge::{MergeResult, MergeState, Merger, Progress};
pub use pdf::{DocumentLibrary, LopdfLibrary};
pub use range::{resolve_range, PageRange};
pub use reader::{FileReader, FileRef, FsReader, MemoryReader};
pub use slots::{EndBound, InputSlot, SlotEvent, SlotManager, SlotRequest};
