//! Page-tree helpers shared by the stamper and the composer.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::core::{DocumentError, DocumentResult};

/// Page attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// US Letter, used when a page declares no usable MediaBox.
pub const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

const MAX_TREE_DEPTH: usize = 32;

/// Page object ids in document order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Id of the root `Pages` node referenced by the catalog.
pub fn pages_root(doc: &Document) -> DocumentResult<ObjectId> {
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    let catalog = doc.get_dictionary(catalog_id)?;
    Ok(catalog.get(b"Pages")?.as_reference()?)
}

/// Follows a single level of indirection.
pub fn resolve(doc: &Document, object: &Object) -> Option<Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok().cloned(),
        other => Some(other.clone()),
    }
}

/// Looks `key` up on the page, then on each ancestor until one defines it.
pub fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = Some(page_id);
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current?).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// `[llx, lly, urx, ury]` of the page.
pub fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let values: Vec<f32> = match inherited(doc, page_id, b"MediaBox").and_then(|o| resolve(doc, &o)) {
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Object::Integer(i) => Some(*i as f32),
                Object::Real(r) => Some(*r as f32),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    match values.as_slice() {
        [llx, lly, urx, ury] => [*llx, *lly, *urx, *ury],
        _ => DEFAULT_MEDIA_BOX,
    }
}

/// A document with a catalog and an empty page tree.
pub fn empty_document() -> Document {
    let mut doc = Document::with_version("1.5");
    let mut tree = Dictionary::new();
    tree.set("Type", Object::Name(b"Pages".to_vec()));
    tree.set("Count", Object::Integer(0));
    tree.set("Kids", Object::Array(Vec::new()));
    let pages_id = doc.add_object(tree);

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

/// Copies inherited attributes onto the pages themselves so they survive
/// being re-parented.
pub fn materialize_inherited(doc: &mut Document, pages: &[ObjectId]) -> DocumentResult<()> {
    for &page_id in pages {
        let mut missing = Vec::new();
        {
            let page = doc.get_dictionary(page_id)?;
            for key in INHERITABLE {
                if page.has(key) {
                    continue;
                }
                if let Some(value) = inherited(doc, page_id, key) {
                    missing.push((key.to_vec(), value));
                }
            }
        }

        if missing.is_empty() {
            continue;
        }
        match doc.get_object_mut(page_id)? {
            Object::Dictionary(page) => {
                for (key, value) in missing {
                    page.set(key, value);
                }
            }
            _ => return Err(DocumentError::Pdf(format!("page {:?} is not a dictionary", page_id))),
        }
    }
    Ok(())
}
