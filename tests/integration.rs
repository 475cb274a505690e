//! Integration tests for merging page ranges from files on disk

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, Stream};
use pdf_range_merge::pdf::extract_metadata;
use pdf_range_merge::{
    Error, FileRef, FsReader, LopdfLibrary, MergeConfig, MergeState, Merger, SlotManager,
    SlotRequest,
};
use tempfile::TempDir;

/// Write a PDF whose page n shows the text "<label>-<n>"
fn write_fixture(dir: &Path, name: &str, label: &str, num_pages: u32) -> PathBuf {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for n in 1..=num_pages {
        let content = format!("BT /F1 12 Tf 72 720 Td ({}-{}) Tj ET", label, n);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(num_pages as i64));
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let path = dir.join(name);
    doc.save(&path).expect("Failed to write fixture");
    path
}

/// Page labels of a serialized document, in page order
fn page_labels(bytes: &[u8]) -> Vec<String> {
    let mut doc = Document::load_mem(bytes).expect("Merged output should load");
    doc.decompress();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).expect("Page has content");
            let text = String::from_utf8_lossy(&content).into_owned();
            let open = text.find('(').expect("Label start");
            let close = text.find(')').expect("Label end");
            text[open + 1..close].to_string()
        })
        .collect()
}

fn merger() -> Merger<FsReader, LopdfLibrary> {
    let config = MergeConfig::default();
    Merger::new(FsReader, LopdfLibrary::new(&config), config)
}

#[tokio::test]
async fn test_full_ranges_default_filename() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let a = write_fixture(temp_dir.path(), "a.pdf", "A", 3);
    let b = write_fixture(temp_dir.path(), "b.pdf", "B", 2);

    let mut slots = SlotManager::with_slots(2);
    slots.assign_document(1, FileRef::new(a), None).unwrap();
    slots.assign_document(2, FileRef::new(b), None).unwrap();

    let result = merger()
        .merge(&slots, "", |_| {})
        .await
        .expect("Failed to merge PDFs");

    assert_eq!(result.filename, "merged.pdf");
    assert_eq!(result.page_count, 5);
    assert_eq!(extract_metadata(&result.bytes).unwrap().page_count, 5);
    assert_eq!(page_labels(&result.bytes), vec!["A-1", "A-2", "A-3", "B-1", "B-2"]);
}

#[tokio::test]
async fn test_total_pages_is_sum_of_ranges() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let inputs = [
        ("a.pdf", "A", 6, "a.pdf:2-5"),
        ("b.pdf", "B", 4, "b.pdf:3-"),
        ("c.pdf", "C", 9, "c.pdf:-2"),
    ];

    let requests: Vec<SlotRequest> = inputs
        .iter()
        .map(|(name, label, pages, slot_arg)| {
            write_fixture(temp_dir.path(), name, label, *pages);
            temp_dir.path().join(slot_arg).display().to_string().parse().unwrap()
        })
        .collect();

    let slots = SlotManager::from_requests(&requests, &MergeConfig::default()).unwrap();
    let result = merger().merge(&slots, "ranges.pdf", |_| {}).await.unwrap();

    // 4 + 2 + 2
    assert_eq!(result.page_count, 8);
    assert_eq!(
        page_labels(&result.bytes),
        vec!["A-2", "A-3", "A-4", "A-5", "B-3", "B-4", "C-1", "C-2"]
    );
    assert_eq!(result.filename, "ranges.pdf");
}

#[tokio::test]
async fn test_blank_end_after_page_count_lookup() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let a = write_fixture(temp_dir.path(), "a.pdf", "A", 10);

    let file = FileRef::new(a);
    let mut slots = SlotManager::new();
    slots.assign_document(1, file.clone(), None).unwrap();
    slots.set_start(1, Some(8)).unwrap();

    let mut merger = merger();
    let count = merger.page_count_of(&file).await.unwrap();
    assert_eq!(count, 10);
    assert!(slots.record_page_count(1, &file, count).unwrap());

    let result = merger.merge(&slots, "", |_| {}).await.unwrap();
    assert_eq!(page_labels(&result.bytes), vec!["A-8", "A-9", "A-10"]);
}

#[tokio::test]
async fn test_start_after_end_produces_no_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let a = write_fixture(temp_dir.path(), "a.pdf", "A", 6);

    let mut slots = SlotManager::new();
    slots.assign_document(1, FileRef::new(a), None).unwrap();
    slots.set_range(1, Some(5), Some(3)).unwrap();

    let mut merger = merger();
    let result = merger.merge(&slots, "", |_| {}).await;

    assert!(matches!(result, Err(Error::Range { ref name, .. }) if name == "a.pdf"));
    assert!(matches!(merger.state(), MergeState::Failed(_)));
}

#[tokio::test]
async fn test_non_pdf_file_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let a = write_fixture(temp_dir.path(), "a.pdf", "A", 2);
    let text = temp_dir.path().join("notes.txt");
    std::fs::write(&text, "just some notes").unwrap();

    let mut slots = SlotManager::with_slots(2);
    slots.assign_document(1, FileRef::new(a), None).unwrap();
    slots.assign_document(2, FileRef::new(text), None).unwrap();

    let err = merger().merge(&slots, "", |_| {}).await.unwrap_err();
    assert!(matches!(err, Error::InvalidFile { ref name } if name == "notes.txt"));
    assert!(err.to_string().contains("notes.txt"));
}

#[tokio::test]
async fn test_renamed_non_pdf_rejected_by_signature() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let fake = temp_dir.path().join("image.pdf");
    std::fs::write(&fake, b"\x89PNG\r\n\x1a\n").unwrap();

    let mut slots = SlotManager::new();
    slots.assign_document(1, FileRef::new(fake), None).unwrap();

    let err = merger().merge(&slots, "", |_| {}).await.unwrap_err();
    assert!(matches!(err, Error::InvalidFile { .. }));
}

#[tokio::test]
async fn test_merge_nonexistent_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let mut slots = SlotManager::new();
    slots
        .assign_document(1, FileRef::new(temp_dir.path().join("nonexistent.pdf")), None)
        .unwrap();

    let err = merger().merge(&slots, "", |_| {}).await.unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
    assert!(
        err.to_string().contains("nonexistent.pdf"),
        "Error should name the file: {}",
        err
    );
}

#[tokio::test]
async fn test_same_file_in_two_slots() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let a = write_fixture(temp_dir.path(), "a.pdf", "A", 3);

    let mut slots = SlotManager::with_slots(2);
    slots.assign_document(1, FileRef::new(&a), None).unwrap();
    slots.set_range(1, Some(3), None).unwrap();
    slots.assign_document(2, FileRef::new(&a), None).unwrap();
    slots.set_range(2, None, Some(1)).unwrap();

    let result = merger().merge(&slots, "", |_| {}).await.unwrap();
    assert_eq!(page_labels(&result.bytes), vec!["A-3", "A-1"]);
}

#[tokio::test]
async fn test_output_carries_producer() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let a = write_fixture(temp_dir.path(), "a.pdf", "A", 1);

    let mut slots = SlotManager::new();
    slots.assign_document(1, FileRef::new(a), None).unwrap();

    let result = merger().merge(&slots, "", |_| {}).await.unwrap();
    let metadata = extract_metadata(&result.bytes).unwrap();
    assert!(metadata
        .producer
        .unwrap_or_default()
        .starts_with("pdf-range-merge"));
}

#[tokio::test]
async fn test_empty_slots_only_give_empty_output() {
    let slots = SlotManager::with_slots(3);
    let result = merger().merge(&slots, "", |_| {}).await.unwrap();

    assert_eq!(result.filename, "merged.pdf");
    assert_eq!(result.page_count, 0);
    assert_eq!(extract_metadata(&result.bytes).unwrap().page_count, 0);
}

#[test]
fn test_slot_floor_and_ceiling() {
    let mut slots = SlotManager::new();
    assert!(slots.remove_slot().is_none());
    assert_eq!(slots.len(), 1);

    while slots.add_slot().is_some() {}
    assert_eq!(slots.len(), 10);
    assert!(slots.add_slot().is_none());
    assert_eq!(slots.len(), 10);
}
