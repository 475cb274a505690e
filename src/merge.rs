//! Merge sequencing
//!
//! Copies the resolved page range of every assigned slot, in slot order, into
//! one output document and serializes it. Sources are processed strictly one
//! after another: the next file is not read until the previous file's pages
//! have been appended. Any failure discards the output document, so the caller
//! either gets the complete merge or an error.

use tracing::{debug, info, warn};

use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::pdf::{has_pdf_extension, has_pdf_signature, DocumentLibrary};
use crate::range::resolve_range;
use crate::reader::{FileReader, FileRef};
use crate::slots::{InputSlot, SlotManager};

/// Share of the progress bar spent copying sources; serialization gets the rest
const PROCESSING_SHARE: f32 = 50.0;

/// Progress notification: what is happening and how far along the merge is
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub message: String,
    /// 0.0 to 100.0; reaches 100 only once the output is serialized
    pub percent: f32,
    /// Merger state at the time of the notification
    pub state: MergeState,
}

/// Where a merge currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum MergeState {
    Idle,
    /// Working on source `source` (0-based) of `total`
    ///
    /// Only seen while a merge runs, so callers observe it through
    /// [`Progress::state`]. During serialization `source` stays on the last
    /// source copied.
    Processing { source: usize, total: usize },
    Succeeded { pages: u32 },
    Failed(String),
}

/// Output of a successful merge
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Serialized output document
    pub bytes: Vec<u8>,
    /// Name to offer when saving the bytes
    pub filename: String,
    pub page_count: u32,
}

/// Merge orchestrator over a file reader and a document library
#[derive(Debug)]
pub struct Merger<R, L> {
    reader: R,
    library: L,
    config: MergeConfig,
    state: MergeState,
}

impl<R: FileReader, L: DocumentLibrary> Merger<R, L> {
    pub fn new(reader: R, library: L, config: MergeConfig) -> Self {
        Self {
            reader,
            library,
            config,
            state: MergeState::Idle,
        }
    }

    pub fn state(&self) -> &MergeState {
        &self.state
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Load a document to learn its page count
    ///
    /// Borrows no slots, so the slots stay editable while the load is pending
    /// and several loads can run at once. Hand the result to
    /// [`SlotManager::record_page_count`], which drops it if the slot has been
    /// given another file in the meantime.
    pub async fn page_count_of(&self, file: &FileRef) -> Result<u32> {
        let doc = self.open(file).await?;
        let count = self.library.page_count(&doc);
        debug!(file = %file.name(), pages = count, "counted pages");
        Ok(count)
    }

    /// Merge all assigned slots into one document
    ///
    /// `filename` is the name the user asked for; blank falls back to the
    /// configured default. Progress is reported through `on_progress`.
    pub async fn merge<F>(
        &mut self,
        slots: &SlotManager,
        filename: &str,
        mut on_progress: F,
    ) -> Result<MergeResult>
    where
        F: FnMut(&Progress),
    {
        self.state = MergeState::Idle;

        match self.run(slots, filename, &mut on_progress).await {
            Ok(result) => {
                info!(
                    pages = result.page_count,
                    bytes = result.bytes.len(),
                    filename = %result.filename,
                    "merge complete"
                );
                self.state = MergeState::Succeeded {
                    pages: result.page_count,
                };
                Ok(result)
            }
            Err(e) => {
                warn!("merge failed: {}", e);
                self.state = MergeState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn run<F>(
        &mut self,
        slots: &SlotManager,
        filename: &str,
        on_progress: &mut F,
    ) -> Result<MergeResult>
    where
        F: FnMut(&Progress),
    {
        let sources: Vec<(&InputSlot, &FileRef)> = slots
            .assigned()
            .filter_map(|slot| slot.file().map(|file| (slot, file)))
            .collect();

        let filename = self.config.output_filename(filename);
        let total = sources.len();
        if total == 0 {
            debug!("no documents assigned, writing an empty document");
        }
        self.state = MergeState::Processing { source: 0, total };
        let mut output = self.library.create().map_err(library_error)?;
        let mut page_count = 0;

        for (i, (slot, file)) in sources.into_iter().enumerate() {
            self.state = MergeState::Processing { source: i, total };
            let name = file.name();
            report(
                on_progress,
                &self.state,
                format!("Processing {}...", name),
                share(i, total),
            );

            let doc = self.open(file).await?;
            let range = resolve_range(slot, self.library.page_count(&doc))?;
            debug!(slot = slot.index(), file = %name, range = %range, "copying pages");

            let indices: Vec<u32> = range.indices().collect();
            let pages = self
                .library
                .copy_pages(&mut output, &doc, &indices)
                .map_err(library_error)?;
            for page in pages {
                self.library
                    .add_page(&mut output, page)
                    .map_err(library_error)?;
            }
            page_count += range.len();

            report(on_progress, &self.state, format!("Added {}", name), share(i + 1, total));
        }

        report(
            on_progress,
            &self.state,
            "Generating merged PDF...".to_string(),
            PROCESSING_SHARE,
        );
        let bytes = self
            .library
            .serialize(&mut output)
            .map_err(library_error)?;
        report(on_progress, &self.state, "Merge complete".to_string(), 100.0);

        Ok(MergeResult {
            bytes,
            filename,
            page_count,
        })
    }

    /// Validate, read and load one source file
    async fn open(&self, file: &FileRef) -> Result<L::Document> {
        let name = file.name();
        if !has_pdf_extension(file.path()) {
            return Err(Error::InvalidFile { name });
        }

        let bytes = self.reader.read(file).await?;
        if !has_pdf_signature(&bytes) {
            return Err(Error::InvalidFile { name });
        }

        self.library.load(&bytes).map_err(|e| Error::Parse {
            name,
            source: Box::new(e),
        })
    }
}

fn share(done: usize, total: usize) -> f32 {
    done as f32 / total as f32 * PROCESSING_SHARE
}

fn report<F: FnMut(&Progress)>(
    on_progress: &mut F,
    state: &MergeState,
    message: String,
    percent: f32,
) {
    on_progress(&Progress {
        message,
        percent,
        state: state.clone(),
    });
}

fn library_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
    Error::Library(Box::new(e))
}
