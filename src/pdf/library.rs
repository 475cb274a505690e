//! lopdf-backed document library

use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document, Object, ObjectId};
use thiserror::Error;
use tracing::debug;

use crate::config::MergeConfig;
use crate::pdf::metadata::stamp_info;
use crate::pdf::DocumentLibrary;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic Parent chains in broken files
const MAX_TREE_DEPTH: usize = 64;

/// Errors raised by [`LopdfLibrary`]
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("{0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("Malformed document: {0}")]
    Structure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: u32, count: u32 },
}

/// [`DocumentLibrary`] implementation using lopdf
#[derive(Debug, Clone)]
pub struct LopdfLibrary {
    pdf_version: String,
    compress: bool,
    producer: Option<String>,
}

impl Default for LopdfLibrary {
    fn default() -> Self {
        Self::new(&MergeConfig::default())
    }
}

impl LopdfLibrary {
    pub fn new(config: &MergeConfig) -> Self {
        Self {
            pdf_version: config.pdf_version.clone(),
            compress: config.compress,
            producer: config.producer.clone(),
        }
    }
}

impl DocumentLibrary for LopdfLibrary {
    type Document = Document;
    type Page = ObjectId;
    type Error = LibraryError;

    fn create(&self) -> Result<Document, LibraryError> {
        let mut doc = Document::with_version(self.pdf_version.clone());

        let pages_id = doc.new_object_id();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", Object::Integer(0));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.new_object_id();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        doc.objects.insert(catalog_id, Object::Dictionary(catalog));

        doc.trailer.set("Root", Object::Reference(catalog_id));

        Ok(doc)
    }

    fn load(&self, bytes: &[u8]) -> Result<Document, LibraryError> {
        Ok(Document::load_mem(bytes)?)
    }

    fn page_count(&self, doc: &Document) -> u32 {
        doc.get_pages().len() as u32
    }

    fn copy_pages(
        &self,
        dest: &mut Document,
        src: &Document,
        indices: &[u32],
    ) -> Result<Vec<ObjectId>, LibraryError> {
        let pages = src.get_pages();
        let count = pages.len() as u32;

        // get_pages is keyed by 1-based page number
        let page_ids = indices
            .iter()
            .map(|&index| {
                pages
                    .get(&(index + 1))
                    .copied()
                    .ok_or(LibraryError::PageOutOfRange { index, count })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut flattened: HashMap<ObjectId, Dictionary> = HashMap::new();
        for &page_id in &page_ids {
            if !flattened.contains_key(&page_id) {
                flattened.insert(page_id, flatten_page(src, page_id)?);
            }
        }

        // Walk everything the selected pages reference and give each object a
        // fresh id in the destination
        let mut id_map: BTreeMap<ObjectId, ObjectId> = BTreeMap::new();
        let mut pending: Vec<ObjectId> = Vec::new();
        for &page_id in &page_ids {
            if id_map.contains_key(&page_id) {
                continue;
            }
            id_map.insert(page_id, dest.new_object_id());
            collect_dictionary_refs(&flattened[&page_id], &mut pending);
        }

        while let Some(id) = pending.pop() {
            if id_map.contains_key(&id) {
                continue;
            }
            let Some(object) = src.objects.get(&id) else {
                continue;
            };
            id_map.insert(id, dest.new_object_id());
            collect_refs(object, &mut pending);
        }

        for (old_id, new_id) in &id_map {
            let object = match flattened.remove(old_id) {
                Some(page) => Object::Dictionary(page),
                None => match src.objects.get(old_id) {
                    Some(object) => object.clone(),
                    None => continue,
                },
            };
            dest.objects.insert(*new_id, remap_refs(object, &id_map));
        }

        debug!(
            pages = page_ids.len(),
            objects = id_map.len(),
            "copied pages into output document"
        );

        Ok(page_ids.iter().map(|id| id_map[id]).collect())
    }

    fn add_page(&self, dest: &mut Document, page: ObjectId) -> Result<(), LibraryError> {
        let pages_id = pages_root(dest)?;

        match dest.get_object_mut(page)? {
            Object::Dictionary(dict) => dict.set("Parent", Object::Reference(pages_id)),
            _ => return Err(LibraryError::Structure("page is not a dictionary".into())),
        }

        match dest.get_object_mut(pages_id)? {
            Object::Dictionary(pages) => {
                let mut kids = match pages.get(b"Kids") {
                    Ok(Object::Array(kids)) => kids.clone(),
                    _ => Vec::new(),
                };
                kids.push(Object::Reference(page));
                let count = kids.len() as i64;
                pages.set("Kids", Object::Array(kids));
                pages.set("Count", Object::Integer(count));
            }
            _ => return Err(LibraryError::Structure("Pages is not a dictionary".into())),
        }

        Ok(())
    }

    fn serialize(&self, doc: &mut Document) -> Result<Vec<u8>, LibraryError> {
        if let Some(producer) = &self.producer {
            stamp_info(doc, producer);
        }

        doc.prune_objects();
        if self.compress {
            doc.compress();
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

/// Find the page tree root through the trailer's catalog
fn pages_root(doc: &Document) -> Result<ObjectId, LibraryError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| LibraryError::Structure("no Root in trailer".into()))?;

    match doc.get_object(catalog_id)? {
        Object::Dictionary(catalog) => catalog
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| LibraryError::Structure("no Pages in catalog".into())),
        _ => Err(LibraryError::Structure("catalog is not a dictionary".into())),
    }
}

/// Page dictionary with inherited attributes made explicit and Parent removed
fn flatten_page(src: &Document, page_id: ObjectId) -> Result<Dictionary, LibraryError> {
    let mut page = match src.get_object(page_id)? {
        Object::Dictionary(dict) => dict.clone(),
        _ => return Err(LibraryError::Structure("page is not a dictionary".into())),
    };

    let mut parent = page.remove(b"Parent").and_then(|p| p.as_reference().ok());
    let mut depth = 0;
    while let Some(parent_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(Object::Dictionary(node)) = src.get_object(parent_id) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    Ok(page)
}

fn is_page(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Page")
}

fn collect_dictionary_refs(dict: &Dictionary, out: &mut Vec<ObjectId>) {
    // A page's Parent would drag in the whole source page tree
    let skip_parent = is_page(dict);
    for (key, value) in dict.iter() {
        if skip_parent && key == b"Parent" {
            continue;
        }
        collect_refs(value, out);
    }
}

fn collect_refs(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        Object::Dictionary(dict) => collect_dictionary_refs(dict, out),
        Object::Stream(stream) => collect_dictionary_refs(&stream.dict, out),
        _ => {}
    }
}

/// Rewrite references through `id_map`; anything not copied becomes null
fn remap_refs(object: Object, id_map: &BTreeMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(id) => match id_map.get(&id) {
            Some(new_id) => Object::Reference(*new_id),
            None => Object::Null,
        },
        Object::Array(items) => Object::Array(
            items
                .into_iter()
                .map(|item| remap_refs(item, id_map))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_refs(std::mem::replace(value, Object::Null), id_map);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_refs(std::mem::replace(value, Object::Null), id_map);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
