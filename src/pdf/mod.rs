//! Document library collaborator
//!
//! The merge sequencer only needs a handful of capabilities from a PDF engine:
//! open bytes, count pages, copy pages into another document, append them, and
//! write the result out. [`DocumentLibrary`] names exactly those; [`LopdfLibrary`]
//! provides them on top of lopdf.

pub mod library;
pub mod metadata;
pub mod validate;

// Re-export commonly used items
pub use library::{LibraryError, LopdfLibrary};
pub use metadata::{extract_metadata, PdfMetadata};
pub use validate::{has_pdf_extension, has_pdf_signature};

/// Capabilities the merge sequencer needs from a PDF engine
pub trait DocumentLibrary {
    /// Loaded document, used both for sources and for the output
    type Document;
    /// Handle to a page copied into a destination document
    type Page;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Empty output document
    fn create(&self) -> Result<Self::Document, Self::Error>;

    /// Open document bytes
    fn load(&self, bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    fn page_count(&self, doc: &Self::Document) -> u32;

    /// Copy the pages at the given 0-based indices from `src` into `dest`
    ///
    /// The returned handles follow the order of `indices`; the pages are not
    /// yet part of `dest`'s page sequence until passed to [`add_page`](Self::add_page).
    fn copy_pages(
        &self,
        dest: &mut Self::Document,
        src: &Self::Document,
        indices: &[u32],
    ) -> Result<Vec<Self::Page>, Self::Error>;

    /// Append a copied page to the end of `dest`
    fn add_page(&self, dest: &mut Self::Document, page: Self::Page) -> Result<(), Self::Error>;

    fn serialize(&self, doc: &mut Self::Document) -> Result<Vec<u8>, Self::Error>;
}
