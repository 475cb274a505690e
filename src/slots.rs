//! Input slots and the slot manager
//!
//! A slot pairs an optional source document with a requested page range. The
//! manager owns the ordered collection of slots and is the single source of
//! truth for the presentation layer, which listens for [`SlotEvent`]s instead of
//! keeping its own copy of the state.

use std::fmt;
use std::str::FromStr;

use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::reader::FileRef;

/// Requested last page of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndBound {
    /// Left blank: the document's last page
    #[default]
    Blank,
    /// Filled in from the discovered page count, not typed by the user
    Default(u32),
    /// Typed by the user
    Explicit(u32),
}

impl EndBound {
    /// The number currently shown for the end field, if any
    pub fn value(&self) -> Option<u32> {
        match *self {
            EndBound::Blank => None,
            EndBound::Default(n) | EndBound::Explicit(n) => Some(n),
        }
    }

    pub fn is_user_set(&self) -> bool {
        matches!(self, EndBound::Explicit(_))
    }
}

/// One user-facing unit: a source document plus a page range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSlot {
    index: usize,
    file: Option<FileRef>,
    page_count: Option<u32>,
    start: Option<u32>,
    end: EndBound,
}

impl InputSlot {
    fn new(index: usize) -> Self {
        Self {
            index,
            file: None,
            page_count: None,
            start: None,
            end: EndBound::Blank,
        }
    }

    /// 1-based position of the slot
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn file(&self) -> Option<&FileRef> {
        self.file.as_ref()
    }

    /// Page count discovered for the assigned file, once known
    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }

    pub fn requested_start(&self) -> Option<u32> {
        self.start
    }

    pub fn requested_end(&self) -> EndBound {
        self.end
    }

    /// Start page with the default of 1 applied
    pub fn start_or_default(&self) -> u32 {
        self.start.unwrap_or(1).max(1)
    }
}

/// Change notification emitted by [`SlotManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEvent {
    Added(usize),
    Removed(usize),
    Updated(usize),
}

type Listener = Box<dyn FnMut(&SlotEvent)>;

/// Ordered collection of input slots, between 1 and the configured limit
pub struct SlotManager {
    slots: Vec<InputSlot>,
    limit: usize,
    listeners: Vec<Listener>,
}

impl fmt::Debug for SlotManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotManager")
            .field("slots", &self.slots)
            .field("limit", &self.limit)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for SlotManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotManager {
    /// One empty slot, default limit
    pub fn new() -> Self {
        Self::with_config(&MergeConfig::default())
    }

    /// One empty slot, limit taken from the configuration
    pub fn with_config(config: &MergeConfig) -> Self {
        Self {
            slots: vec![InputSlot::new(1)],
            limit: config.slot_limit(),
            listeners: Vec::new(),
        }
    }

    /// `count` empty slots, clamped to `[1, limit]`
    pub fn with_slots(count: usize) -> Self {
        let mut manager = Self::new();
        let count = count.clamp(1, manager.limit);
        manager.slots = (1..=count).map(InputSlot::new).collect();
        manager
    }

    /// Build slots from textual requests, one slot per request, in order
    pub fn from_requests(requests: &[SlotRequest], config: &MergeConfig) -> Result<Self> {
        let limit = config.slot_limit();
        if requests.len() > limit {
            return Err(Error::TooManySlots {
                requested: requests.len(),
                limit,
            });
        }

        let mut manager = Self::with_config(config);
        for (i, request) in requests.iter().enumerate() {
            let index = if i == 0 {
                1
            } else {
                manager
                    .add_slot()
                    .ok_or(Error::TooManySlots {
                        requested: requests.len(),
                        limit,
                    })?
            };
            manager.assign_document(index, FileRef::new(&request.path), None)?;
            manager.set_range(index, request.start, request.end)?;
        }

        Ok(manager)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: at least one slot remains
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.limit
    }

    pub fn slots(&self) -> &[InputSlot] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputSlot> {
        self.slots.iter()
    }

    /// Slots that currently hold a document, in slot order
    pub fn assigned(&self) -> impl Iterator<Item = &InputSlot> {
        self.slots.iter().filter(|slot| slot.file.is_some())
    }

    pub fn get(&self, index: usize) -> Option<&InputSlot> {
        index.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    /// Register a change listener
    pub fn subscribe(&mut self, listener: impl FnMut(&SlotEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Append a slot; returns its index, or `None` when the limit is reached
    pub fn add_slot(&mut self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let index = self.slots.len() + 1;
        self.slots.push(InputSlot::new(index));
        self.notify(SlotEvent::Added(index));
        Some(index)
    }

    /// Remove the highest-index slot; `None` when only one remains
    pub fn remove_slot(&mut self) -> Option<InputSlot> {
        if self.slots.len() <= 1 {
            return None;
        }
        let slot = self.slots.pop()?;
        self.notify(SlotEvent::Removed(slot.index));
        Some(slot)
    }

    /// Bind a document to a slot
    ///
    /// A defaulted end is dropped along with the old document; a user-typed end
    /// survives. When the page count is already known it becomes the new default.
    pub fn assign_document(
        &mut self,
        index: usize,
        file: FileRef,
        total_page_count: Option<u32>,
    ) -> Result<()> {
        let slot = self.slot_mut(index)?;
        slot.file = Some(file);
        slot.page_count = None;
        if let EndBound::Default(_) = slot.end {
            slot.end = EndBound::Blank;
        }
        if let Some(count) = total_page_count {
            apply_page_count(slot, count);
        }
        self.notify(SlotEvent::Updated(index));
        Ok(())
    }

    /// Unbind the document; the slot then contributes nothing to a merge
    pub fn clear_document(&mut self, index: usize) -> Result<()> {
        let slot = self.slot_mut(index)?;
        slot.file = None;
        slot.page_count = None;
        if let EndBound::Default(_) = slot.end {
            slot.end = EndBound::Blank;
        }
        self.notify(SlotEvent::Updated(index));
        Ok(())
    }

    /// Cache a discovered page count, but only if `file` is still the slot's document
    ///
    /// Returns whether the count was recorded.
    pub fn record_page_count(&mut self, index: usize, file: &FileRef, count: u32) -> Result<bool> {
        let slot = self.slot_mut(index)?;
        if slot.file.as_ref() != Some(file) {
            return Ok(false);
        }
        apply_page_count(slot, count);
        self.notify(SlotEvent::Updated(index));
        Ok(true)
    }

    /// Set the requested start page; `None` or 0 means the first page
    ///
    /// An end below the new start is raised to match.
    pub fn set_start(&mut self, index: usize, start: Option<u32>) -> Result<()> {
        let slot = self.slot_mut(index)?;
        slot.start = start.filter(|&page| page > 0);
        let start = slot.start_or_default();
        if let Some(end) = slot.end.value() {
            if end < start {
                slot.end = EndBound::Explicit(start);
            }
        }
        self.notify(SlotEvent::Updated(index));
        Ok(())
    }

    /// Set the requested end page; `None` or 0 leaves it blank
    ///
    /// An end below the current start is raised to the start.
    pub fn set_end(&mut self, index: usize, end: Option<u32>) -> Result<()> {
        let slot = self.slot_mut(index)?;
        let start = slot.start_or_default();
        slot.end = match end.filter(|&page| page > 0) {
            Some(end) => EndBound::Explicit(end.max(start)),
            None => EndBound::Blank,
        };
        self.notify(SlotEvent::Updated(index));
        Ok(())
    }

    /// Store both bounds exactly as submitted, without the live adjustments
    ///
    /// A start past the end is left for the resolver to reject.
    pub fn set_range(&mut self, index: usize, start: Option<u32>, end: Option<u32>) -> Result<()> {
        let slot = self.slot_mut(index)?;
        slot.start = start.filter(|&page| page > 0);
        slot.end = match end.filter(|&page| page > 0) {
            Some(end) => EndBound::Explicit(end),
            None => EndBound::Blank,
        };
        self.notify(SlotEvent::Updated(index));
        Ok(())
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut InputSlot> {
        index
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(Error::SlotNotFound(index))
    }

    fn notify(&mut self, event: SlotEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

fn apply_page_count(slot: &mut InputSlot, count: u32) {
    slot.page_count = Some(count);
    if !slot.end.is_user_set() {
        slot.end = EndBound::Default(count);
    }
}

/// Textual slot description: `path`, `path:3-7`, `path:3-`, `path:-7` or `path:5`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRequest {
    pub path: String,
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl SlotRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            start: None,
            end: None,
        }
    }
}

impl FromStr for SlotRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidSlotSpec("empty input".to_string()));
        }

        // A suffix that is not a page range belongs to the path (e.g. "C:\docs")
        if let Some((path, suffix)) = s.rsplit_once(':') {
            if !path.is_empty() {
                if let Some((start, end)) = parse_page_suffix(suffix)? {
                    return Ok(Self {
                        path: path.to_string(),
                        start,
                        end,
                    });
                }
            }
        }

        Ok(Self::new(s))
    }
}

type PageSuffix = (Option<u32>, Option<u32>);

fn parse_page_suffix(suffix: &str) -> Result<Option<PageSuffix>> {
    let suffix = suffix.trim();
    let looks_like_range =
        !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit() || c == '-' || c == ' ');
    if !looks_like_range {
        return Ok(None);
    }

    let parse = |part: &str| -> Result<Option<u32>> {
        let part = part.trim();
        if part.is_empty() {
            return Ok(None);
        }
        part.parse::<u32>()
            .map(Some)
            .map_err(|_| Error::InvalidSlotSpec(format!("invalid page number: {}", part)))
    };

    match suffix.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (parse(start)?, parse(end)?);
            if start.is_none() && end.is_none() {
                return Err(Error::InvalidSlotSpec(format!("empty page range: {}", suffix)));
            }
            Ok(Some((start, end)))
        }
        None => {
            let page = parse(suffix)?;
            Ok(Some((page, page)))
        }
    }
}
