//! PDF metadata inspection and stamping

use chrono::{DateTime, Local};
use lopdf::{Dictionary, Document, Object};

use crate::pdf::library::LibraryError;

/// PDF metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: u32,
    /// Header version, e.g. "1.7"
    pub version: String,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Producing application (if present)
    pub producer: Option<String>,
    pub encrypted: bool,
}

/// Extract metadata from PDF bytes
pub fn extract_metadata(bytes: &[u8]) -> Result<PdfMetadata, LibraryError> {
    let doc = Document::load_mem(bytes)?;
    let info = info_dictionary(&doc);

    Ok(PdfMetadata {
        page_count: doc.get_pages().len() as u32,
        version: doc.version.clone(),
        title: info_text(info, b"Title"),
        author: info_text(info, b"Author"),
        producer: info_text(info, b"Producer"),
        encrypted: doc.is_encrypted(),
    })
}

/// Write a fresh Info dictionary naming the producer and the creation time
pub fn stamp_info(doc: &mut Document, producer: &str) {
    let timestamp = pdf_date(&Local::now());

    let mut info = Dictionary::new();
    info.set("Producer", Object::string_literal(producer));
    info.set("CreationDate", Object::string_literal(timestamp.clone()));
    info.set("ModDate", Object::string_literal(timestamp));

    let info_id = doc.add_object(info);
    doc.trailer.set("Info", Object::Reference(info_id));
}

/// Format a timestamp as a PDF date string, e.g. `D:20260114093000+01'00'`
pub fn pdf_date(when: &DateTime<Local>) -> String {
    let offset = when.format("%z").to_string();
    let (hours, minutes) = offset.split_at(offset.len().saturating_sub(2));
    format!("D:{}{}'{}'", when.format("%Y%m%d%H%M%S"), hours, minutes)
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        },
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_text(info: Option<&Dictionary>, key: &[u8]) -> Option<String> {
    info.and_then(|dict| dict.get(key).ok()).and_then(decode_text)
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise byte text)
fn decode_text(object: &Object) -> Option<String> {
    let Object::String(bytes, _) = object else {
        return None;
    };

    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).ok();
    }

    Some(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::library::tests::labelled_pdf;
    use chrono::TimeZone;
    use lopdf::StringFormat;

    #[test]
    fn test_extract_metadata_counts_pages() {
        let metadata = extract_metadata(&labelled_pdf("A", 3)).unwrap();
        assert_eq!(metadata.page_count, 3);
        assert_eq!(metadata.version, "1.5");
        assert_eq!(metadata.title, None);
    }

    #[test]
    fn test_extract_metadata_rejects_garbage() {
        assert!(extract_metadata(b"not a pdf").is_err());
    }

    #[test]
    fn test_stamped_producer_is_readable() {
        let mut doc = Document::load_mem(&labelled_pdf("A", 1)).unwrap();
        stamp_info(&mut doc, "pdf-range-merge test");
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let metadata = extract_metadata(&bytes).unwrap();
        assert_eq!(metadata.producer.as_deref(), Some("pdf-range-merge test"));
    }

    #[test]
    fn test_decode_utf16_text() {
        let object = Object::String(
            vec![0xFE, 0xFF, 0x00, b'H', 0x00, b'i'],
            StringFormat::Hexadecimal,
        );
        assert_eq!(decode_text(&object).as_deref(), Some("Hi"));
        assert_eq!(decode_text(&Object::Integer(3)), None);
    }

    #[test]
    fn test_pdf_date_format() {
        let when = Local.with_ymd_and_hms(2026, 1, 14, 9, 30, 0).unwrap();
        let formatted = pdf_date(&when);
        assert!(formatted.starts_with("D:20260114093000"));
        assert!(formatted.ends_with('\''));
    }
}
