//! Page-level composition of PDF documents: append, insert, copy.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId};

use super::pages;
use crate::core::{DocumentError, DocumentResult};

/// Writes `base` followed by every page of `extra` to `out`.
pub fn append(base: &Path, extra: &Path, out: &Path) -> DocumentResult<PathBuf> {
    let base_doc = load(base)?;
    let at = pages::page_ids(&base_doc).len();
    splice(base_doc, load(extra)?, at, out)
}

/// Writes `base` with all pages of `insert` placed after page `after_index`
/// (zero-based) to `out`. The position is clamped to the document, so a
/// negative index prepends and an index past the end appends.
pub fn insert_after(base: &Path, insert: &Path, after_index: isize, out: &Path) -> DocumentResult<PathBuf> {
    let base_doc = load(base)?;
    let at = insertion_point(after_index, pages::page_ids(&base_doc).len());
    splice(base_doc, load(insert)?, at, out)
}

/// Byte-for-byte copy of `source` to `dest`.
pub fn copy(source: &Path, dest: &Path) -> DocumentResult<PathBuf> {
    if !source.exists() {
        return Err(DocumentError::TemplateMissing(source.to_path_buf()));
    }
    std::fs::copy(source, dest)?;
    Ok(dest.to_path_buf())
}

pub fn page_count(path: &Path) -> DocumentResult<usize> {
    Ok(pages::page_ids(&load(path)?).len())
}

pub fn insertion_point(after_index: isize, base_count: usize) -> usize {
    after_index
        .saturating_add(1)
        .clamp(0, base_count as isize) as usize
}

fn load(path: &Path) -> DocumentResult<Document> {
    if !path.exists() {
        return Err(DocumentError::TemplateMissing(path.to_path_buf()));
    }
    Document::load(path).map_err(|e| DocumentError::Pdf(format!("{}: {}", path.display(), e)))
}

/// Moves every page of `insert` into `base` at position `at`. The page tree
/// is flattened under the base's root Pages node.
fn splice(mut base: Document, mut insert: Document, at: usize, out: &Path) -> DocumentResult<PathBuf> {
    let base_pages = pages::page_ids(&base);
    let insert_pages = pages::page_ids(&insert);
    pages::materialize_inherited(&mut base, &base_pages)?;
    pages::materialize_inherited(&mut insert, &insert_pages)?;

    let offset = base.max_id;
    let remapped: BTreeMap<ObjectId, Object> = std::mem::take(&mut insert.objects)
        .into_iter()
        .map(|(id, object)| ((id.0 + offset, id.1), remap_refs(object, offset)))
        .collect();
    base.objects.extend(remapped);
    base.max_id = base.max_id.max(insert.max_id + offset);

    let at = at.min(base_pages.len());
    let kids: Vec<ObjectId> = base_pages[..at]
        .iter()
        .copied()
        .chain(insert_pages.iter().map(|id| (id.0 + offset, id.1)))
        .chain(base_pages[at..].iter().copied())
        .collect();

    let root = pages::pages_root(&base)?;
    for kid in &kids {
        if let Ok(Object::Dictionary(page)) = base.get_object_mut(*kid) {
            page.set("Parent", Object::Reference(root));
        }
    }
    match base.get_object_mut(root)? {
        Object::Dictionary(node) => {
            node.set("Count", Object::Integer(kids.len() as i64));
            node.set("Kids", Object::Array(kids.into_iter().map(Object::Reference).collect()));
        }
        _ => return Err(DocumentError::Pdf("root Pages node is not a dictionary".into())),
    }

    // the inserted document's catalog and page nodes are now unreachable
    base.prune_objects();
    base.save(out)?;
    Ok(out.to_path_buf())
}

fn remap_refs(object: Object, offset: u32) -> Object {
    match object {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(items) => Object::Array(items.into_iter().map(|o| remap_refs(o, offset)).collect()),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
