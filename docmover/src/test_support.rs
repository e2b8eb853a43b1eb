//! Fixture PDFs for unit tests.
//!
//! Every page carries its label as a single text-show operation, so tests can
//! read back the page order of a merged document. An empty label produces a
//! page with an empty content stream.

use lopdf::content::Content;
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;

/// Build an in-memory document with one page per label.
pub(crate) fn labeled_document(labels: &[&str]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for label in labels {
        let content = if label.is_empty() {
            Vec::new()
        } else {
            format!("BT /F1 12 Tf 72 712 Td ({label}) Tj ET").into_bytes()
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Write a labeled document to `path`.
pub(crate) fn write_labeled_pdf(path: &Path, labels: &[&str]) -> std::io::Result<()> {
    let mut doc = labeled_document(labels);
    let mut file = std::fs::File::create(path)?;
    doc.save_to(&mut file)
}

/// Labels of a document's pages in page order; blank pages read as `""`.
pub(crate) fn document_labels(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let data = doc.get_page_content(page_id).unwrap_or_default();
            Content::decode(&data)
                .ok()
                .and_then(|content| {
                    content
                        .operations
                        .into_iter()
                        .find(|op| op.operator == "Tj")
                        .and_then(|op| op.operands.first().cloned())
                })
                .and_then(|operand| operand.as_str().map(|s| s.to_vec()).ok())
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default()
        })
        .collect()
}

/// Labels of the pages of the PDF at `path`.
pub(crate) fn pdf_labels(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    document_labels(&doc)
}
