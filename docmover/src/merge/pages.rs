//! Page-level operations for the interleaving merge.
//!
//! This module handles:
//! - Computing the alternating page order of two documents
//! - Detecting pages without visible content
//! - Rebuilding a page tree around a new page order

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::error::Result;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Operators that put marks on the page.
const PAINTING_OPERATORS: &[&str] = &[
    "Tj", "TJ", "'", "\"", // text
    "S", "s", "f", "F", "f*", "B", "B*", "b", "b*", // paths
    "Do", "sh", "BI", // xobjects, shadings, inline images
];

/// Guard against malformed, cyclic `Parent` chains.
const MAX_TREE_DEPTH: usize = 64;

/// One slot in the merged page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    /// Zero-based page index in the primary document.
    Primary(usize),
    /// Zero-based page index in the secondary document.
    Secondary(usize),
}

/// Compute the alternating page order for two documents.
///
/// For every index `i` below `max(primary, secondary)` the primary's page `i`
/// comes first, followed by the secondary's page `i`; missing counterparts
/// are skipped, never padded. With `reverse_secondary` the secondary's pages
/// are taken last-to-first.
///
/// # Examples
///
/// ```
/// use docmover::merge::pages::{interleave_order, PageSlot};
///
/// let order = interleave_order(2, 1, false);
/// assert_eq!(
///     order,
///     vec![PageSlot::Primary(0), PageSlot::Secondary(0), PageSlot::Primary(1)]
/// );
/// ```
pub fn interleave_order(primary: usize, secondary: usize, reverse_secondary: bool) -> Vec<PageSlot> {
    let mut order = Vec::with_capacity(primary + secondary);

    for i in 0..primary.max(secondary) {
        if i < primary {
            order.push(PageSlot::Primary(i));
        }
        if i < secondary {
            let index = if reverse_secondary {
                secondary - 1 - i
            } else {
                i
            };
            order.push(PageSlot::Secondary(index));
        }
    }

    order
}

/// Check whether a page has no visible content.
///
/// A page is blank when its decoded content streams contain no painting
/// operator. Content that cannot be read or decoded counts as visible.
pub fn is_blank_page(doc: &Document, page_id: ObjectId) -> bool {
    let Ok(data) = doc.get_page_content(page_id) else {
        return false;
    };

    if data.iter().all(u8::is_ascii_whitespace) {
        return true;
    }

    match Content::decode(&data) {
        Ok(content) => !content
            .operations
            .iter()
            .any(|op| PAINTING_OPERATORS.contains(&op.operator.as_str())),
        Err(_) => false,
    }
}

/// Result of interleaving two documents.
#[derive(Debug)]
pub struct Interleaved {
    /// The merged document.
    pub document: Document,
    /// Pages in the primary input.
    pub primary_pages: usize,
    /// Pages in the secondary input.
    pub secondary_pages: usize,
    /// Pages in the merged document.
    pub pages_written: usize,
    /// Pages dropped as blank.
    pages_removed: usize,
}

impl Interleaved {
    /// Pages dropped by the blank-page filter.
    pub fn pages_removed(&self) -> usize {
        self.pages_removed
    }
}

/// Builds one document from two by alternating their pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageInterleaver {
    remove_empty_pages: bool,
    reverse_secondary: bool,
}

impl PageInterleaver {
    /// Create an interleaver.
    pub fn new(remove_empty_pages: bool, reverse_secondary: bool) -> Self {
        Self {
            remove_empty_pages,
            reverse_secondary,
        }
    }

    /// Interleave the pages of `secondary` into `primary`.
    ///
    /// Returns `Ok(None)` when no page survives the blank-page filter.
    ///
    /// # Errors
    ///
    /// Returns an error if either document's page tree is malformed.
    pub fn interleave(&self, mut primary: Document, mut secondary: Document) -> Result<Option<Interleaved>> {
        let primary_ids: Vec<ObjectId> = primary.get_pages().into_values().collect();
        inline_inherited_attributes(&mut primary, &primary_ids)?;

        // Avoid object id collisions by renumbering the incoming document
        secondary.renumber_objects_with(primary.max_id + 1);
        let secondary_ids: Vec<ObjectId> = secondary.get_pages().into_values().collect();
        inline_inherited_attributes(&mut secondary, &secondary_ids)?;

        let mut removed = 0;
        let mut kids = Vec::with_capacity(primary_ids.len() + secondary_ids.len());
        for slot in interleave_order(primary_ids.len(), secondary_ids.len(), self.reverse_secondary) {
            let (doc, id) = match slot {
                PageSlot::Primary(i) => (&primary, primary_ids[i]),
                PageSlot::Secondary(i) => (&secondary, secondary_ids[i]),
            };

            if self.remove_empty_pages && is_blank_page(doc, id) {
                tracing::debug!(?slot, "dropping blank page");
                removed += 1;
                continue;
            }
            kids.push(id);
        }

        if kids.is_empty() {
            return Ok(None);
        }

        primary.max_id = primary.max_id.max(secondary.max_id);
        primary.objects.extend(secondary.objects);

        let pages_written = kids.len();
        replace_page_tree(&mut primary, &kids)?;

        primary.prune_objects();
        primary.renumber_objects();

        Ok(Some(Interleaved {
            document: primary,
            primary_pages: primary_ids.len(),
            secondary_pages: secondary_ids.len(),
            pages_written,
            pages_removed: removed,
        }))
    }
}

/// Copy attributes inherited from intermediate page tree nodes onto each page,
/// so pages stay self-contained once re-parented to the root.
fn inline_inherited_attributes(doc: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    for &page_id in page_ids {
        let page = doc.get_object(page_id)?.as_dict()?;
        let mut missing: Vec<&[u8]> = INHERITABLE_ATTRIBUTES
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut inherited = Vec::new();

        for _ in 0..MAX_TREE_DEPTH {
            let Some(parent_id) = parent else { break };
            if missing.is_empty() {
                break;
            }
            let Ok(node) = doc.get_object(parent_id).and_then(Object::as_dict) else {
                break;
            };

            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((key.to_vec(), value.clone()));
                    false
                }
                Err(_) => true,
            });
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }

        if !inherited.is_empty() {
            let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
            for (key, value) in inherited {
                page.set(key, value);
            }
        }
    }

    Ok(())
}

/// Point the catalog's root page tree node at exactly `kids`, in order.
fn replace_page_tree(doc: &mut Document, kids: &[ObjectId]) -> Result<()> {
    let pages_id = doc.catalog()?.get(b"Pages")?.as_reference()?;

    for &kid in kids {
        doc.get_object_mut(kid)?
            .as_dict_mut()?
            .set("Parent", Object::Reference(pages_id));
    }

    let pages_dict = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    pages_dict.set(
        "Kids",
        Object::Array(kids.iter().copied().map(Object::Reference).collect()),
    );
    pages_dict.set("Count", Object::Integer(kids.len() as i64));

    Ok(())
}
