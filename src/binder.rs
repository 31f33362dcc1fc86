//! Page-tree surgery on lopdf documents: adopting pages from other
//! documents, outline (bookmark) construction and the info dictionary.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, dictionary};
use std::ops::Range;
use tracing::{debug, warn};

use crate::book_config::DocumentInfo;
use crate::error::Result;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
struct Bookmark {
    title: String,
    page_index: usize,
}

/// An output document under construction.
///
/// Pages are appended in order; bookmarks refer to 0-based page indices
/// and are resolved to page objects when the document is finished.
pub struct Binder {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    bookmarks: Vec<Bookmark>,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    /// Empty document: a catalog and a page tree with no kids.
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let catalog_id = doc.new_object_id();

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(vec![]),
            "Count" => Object::Integer(0),
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        doc.objects.insert(catalog_id, Object::Dictionary(catalog));
        doc.trailer.set(b"Root", catalog_id);

        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            bookmarks: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append every page of `source`.
    pub fn append_document(&mut self, source: Document) -> Result<usize> {
        self.append_pages(source, 0..usize::MAX)
    }

    /// Append the pages of `source` whose 0-based index falls in `range`
    /// (clamped to the pages that exist). Returns the number appended.
    pub fn append_pages(&mut self, mut source: Document, range: Range<usize>) -> Result<usize> {
        source.renumber_objects_with(self.doc.max_id + 1);

        let all: Vec<ObjectId> = source.get_pages().into_values().collect();
        let end = range.end.min(all.len());
        let start = range.start.min(end);
        let picked = all[start..end].to_vec();

        for pid in &picked {
            flatten_inherited(&mut source, *pid)?;
            let dict = source.get_object_mut(*pid)?.as_dict_mut()?;
            dict.set("Parent", self.pages_id);
        }

        let source_max = source.objects.keys().map(|id| id.0).max().unwrap_or(0);
        self.doc.max_id = self.doc.max_id.max(source_max);
        // unpicked pages and the source's catalog come along as orphans and
        // are pruned in `finish`
        self.doc.objects.extend(source.objects);

        {
            let pages_dict = self.doc.get_object_mut(self.pages_id)?.as_dict_mut()?;
            let kids = pages_dict.get_mut(b"Kids")?.as_array_mut()?;
            for pid in &picked {
                kids.push(Object::Reference(*pid));
            }
            let new_count = (self.page_ids.len() + picked.len()) as i64;
            pages_dict.set("Count", Object::Integer(new_count));
        }

        self.page_ids.extend(&picked);
        debug!(appended = picked.len(), total = self.page_ids.len(), "pages appended");
        Ok(picked.len())
    }

    /// Record an outline entry targeting the page at `page_index`.
    pub fn add_bookmark(&mut self, title: impl Into<String>, page_index: usize) {
        self.bookmarks.push(Bookmark {
            title: title.into(),
            page_index,
        });
    }

    /// Write the document information dictionary.
    pub fn set_info(&mut self, info: &DocumentInfo) {
        let info_dict = dictionary! {
            "Title" => text_string(&info.title),
            "Author" => text_string(&info.author),
            "Subject" => text_string(&info.subject),
            "Producer" => text_string(&info.producer),
            "Creator" => text_string(&info.creator),
            "Keywords" => text_string(&info.keywords),
        };
        let info_id = self.doc.add_object(Object::Dictionary(info_dict));
        self.doc.trailer.set(b"Info", Object::Reference(info_id));
    }

    /// Resolve bookmarks into an outline, drop orphaned objects and
    /// return the finished document.
    pub fn finish(mut self) -> Result<Document> {
        let items: Vec<(String, ObjectId)> = self
            .bookmarks
            .iter()
            .filter_map(|b| match self.page_ids.get(b.page_index) {
                Some(page_id) => Some((b.title.clone(), *page_id)),
                None => {
                    warn!(
                        title = %b.title,
                        page_index = b.page_index,
                        "bookmark targets a page past the end of the document; dropped"
                    );
                    None
                }
            })
            .collect();

        if let Some(outline_root_id) = build_outline(&mut self.doc, &items) {
            let catalog_id = self.doc.trailer.get(b"Root")?.as_reference()?;
            let catalog = self.doc.get_object_mut(catalog_id)?.as_dict_mut()?;
            catalog.set("Outlines", outline_root_id);
            catalog.set("PageMode", "UseOutlines");
        }

        let pruned = self.doc.prune_objects();
        debug!(pruned = pruned.len(), "orphaned objects pruned");
        self.doc.renumber_objects();
        self.doc.compress();
        Ok(self.doc)
    }
}

/// Flat outline: one top-level item per entry, in order.
fn build_outline(doc: &mut Document, items: &[(String, ObjectId)]) -> Option<ObjectId> {
    if items.is_empty() {
        return None;
    }
    let item_ids: Vec<ObjectId> = items.iter().map(|_| doc.new_object_id()).collect();
    let outline_root_id = doc.add_object(dictionary! {
        "Type" => "Outlines",
        "First" => Object::Reference(item_ids[0]),
        "Last" => Object::Reference(item_ids[item_ids.len() - 1]),
        "Count" => item_ids.len() as i64,
    });

    for (i, (title, page_id)) in items.iter().enumerate() {
        let mut dict = dictionary! {
            "Title" => text_string(title),
            "Parent" => Object::Reference(outline_root_id),
            "Dest" => vec![Object::Reference(*page_id), "Fit".into()],
        };
        if i > 0 {
            dict.set("Prev", Object::Reference(item_ids[i - 1]));
        }
        if i + 1 < item_ids.len() {
            dict.set("Next", Object::Reference(item_ids[i + 1]));
        }
        doc.objects.insert(item_ids[i], Object::Dictionary(dict));
    }
    Some(outline_root_id)
}

/// Copy attributes the page inherits from its ancestors onto the page
/// itself, so it keeps its appearance under a new parent.
fn flatten_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let missing: Vec<(&[u8], Object)> = INHERITABLE
        .iter()
        .filter(|key| !page.has(key))
        .filter_map(|key| inherited_attribute(doc, page, key).map(|obj| (*key, obj)))
        .collect();

    if !missing.is_empty() {
        let dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
        for (key, value) in missing {
            dict.set(key, value);
        }
    }
    Ok(())
}

fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut cur = page;
    for _ in 0..MAX_TREE_DEPTH {
        match cur.get(b"Parent") {
            Ok(Object::Reference(pid)) => {
                cur = doc.get_object(*pid).ok()?.as_dict().ok()?;
                if let Ok(obj) = cur.get(key) {
                    return Some(obj.clone());
                }
            }
            _ => return None,
        }
    }
    None
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
pub fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::string_literal(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Inverse of [`text_string`].
pub fn decode_text_string(obj: &Object) -> Option<String> {
    let bytes = obj.as_str().ok()?;
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        _ => Some(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Serialize a finished document.
pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf)?;
    Ok(buf)
}

/// Read back the information dictionary of a document.
pub fn read_info(doc: &Document) -> Option<DocumentInfo> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    Some(DocumentInfo {
        title: text_field(info, b"Title"),
        author: text_field(info, b"Author"),
        subject: text_field(info, b"Subject"),
        producer: text_field(info, b"Producer"),
        creator: text_field(info, b"Creator"),
        keywords: text_field(info, b"Keywords"),
    })
}

fn text_field(dict: &Dictionary, key: &[u8]) -> String {
    dict.get(key)
        .ok()
        .and_then(decode_text_string)
        .unwrap_or_default()
}

/// Top-level outline entries as `(title, 0-based page index)`.
pub fn read_outline(doc: &Document) -> Vec<(String, usize)> {
    let page_index: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut out = Vec::new();

    let Ok(catalog) = doc.catalog() else {
        return out;
    };
    let Some(root) = catalog
        .get(b"Outlines")
        .ok()
        .and_then(|o| o.as_reference().ok())
        .and_then(|id| doc.get_object(id).ok())
        .and_then(|o| o.as_dict().ok())
    else {
        return out;
    };

    let mut next = root.get(b"First").ok().and_then(|o| o.as_reference().ok());
    // bounded walk: a malformed Next chain may loop
    for _ in 0..doc.objects.len() {
        let Some(item_id) = next else {
            break;
        };
        let Some(item) = doc.get_object(item_id).ok().and_then(|o| o.as_dict().ok()) else {
            break;
        };
        let title = item
            .get(b"Title")
            .ok()
            .and_then(decode_text_string)
            .unwrap_or_default();
        let target = item
            .get(b"Dest")
            .ok()
            .and_then(|d| d.as_array().ok())
            .and_then(|a| a.first())
            .and_then(|o| o.as_reference().ok())
            .and_then(|pid| page_index.iter().position(|p| *p == pid));
        if let Some(index) = target {
            out.push((title, index));
        }
        next = item.get(b"Next").ok().and_then(|o| o.as_reference().ok());
    }
    out
}
