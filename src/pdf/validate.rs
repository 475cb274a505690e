//! Cheap checks that a file is a PDF before handing it to the library

use std::path::Path;

/// How far into the file the `%PDF-` header may appear
const HEADER_SEARCH_WINDOW: usize = 1024;

/// True when the file name ends in `.pdf` (any case)
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// True when the `%PDF-` signature appears near the start of the bytes
///
/// Some producers write a few junk bytes before the header, which readers
/// tolerate within the first kilobyte.
pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}
