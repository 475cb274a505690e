//! Page range resolution

use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::slots::{EndBound, InputSlot};

/// Resolved, validated page range (0-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start_index: u32,
    pub end_index: u32,
}

// A resolved range always covers at least one page
#[allow(clippy::len_without_is_empty)]
impl PageRange {
    /// Number of pages covered
    pub fn len(&self) -> u32 {
        self.end_index - self.start_index + 1
    }

    /// 0-based page indices in document order
    pub fn indices(&self) -> RangeInclusive<u32> {
        self.start_index..=self.end_index
    }

    /// 1-based first page
    pub fn first_page(&self) -> u32 {
        self.start_index + 1
    }

    /// 1-based last page
    pub fn last_page(&self) -> u32 {
        self.end_index + 1
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first_page(), self.last_page())
    }
}

/// Resolve a slot's requested range against the document's real page count
///
/// A blank or defaulted end always means the true last page, whatever was
/// shown when the document was picked. An explicit end is clamped to the last
/// page. Fails with [`Error::Range`] when the start lands after the end.
pub fn resolve_range(slot: &InputSlot, total_pages: u32) -> Result<PageRange> {
    let start = slot.start_or_default();
    let end = match slot.requested_end() {
        EndBound::Explicit(end) if end > 0 => end.min(total_pages),
        _ => total_pages,
    };

    if start > end {
        return Err(Error::Range {
            name: slot.file().map(|file| file.name()).unwrap_or_default(),
            start,
            end,
        });
    }

    Ok(PageRange {
        start_index: start - 1,
        end_index: end - 1,
    })
}
