//! End-to-end interleaving through `PdfMerger`.

use docmover::merge::PdfMerger;
use docmover::{DocMoverError, MergeOptions};
use lopdf::Document;
use rstest::rstest;
use tempfile::TempDir;

use crate::common::{read_labels, write_pdf};

fn keep_all() -> MergeOptions {
    MergeOptions {
        delete_source: false,
        remove_empty_pages: false,
        reverse_secondary: false,
    }
}

#[tokio::test]
async fn test_fronts_and_backs_alternate() {
    let temp_dir = TempDir::new().unwrap();
    let fronts = temp_dir.path().join("scan_001.pdf");
    let backs = temp_dir.path().join("scan_002.pdf");
    let output = temp_dir.path().join("scan_001-002.pdf");
    write_pdf(&fronts, &["001p1", "001p2"]);
    write_pdf(&backs, &["002p1", "002p2"]);

    let report = PdfMerger::new()
        .merge(&fronts, &backs, &output, keep_all())
        .await
        .unwrap();

    assert_eq!(report.pages_written, 4);
    assert_eq!(
        read_labels(&output),
        vec!["001p1", "002p1", "001p2", "002p2"]
    );
    assert!(fronts.exists() && backs.exists());
}

#[rstest]
#[case(&["a1", "a2", "a3"], &["b1"], &["a1", "b1", "a2", "a3"])]
#[case(&["a1"], &["b1", "b2", "b3"], &["a1", "b1", "b2", "b3"])]
#[tokio::test]
async fn test_uneven_lengths_append_tail(
    #[case] primary: &[&str],
    #[case] secondary: &[&str],
    #[case] expected: &[&str],
) {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.pdf");
    let b = temp_dir.path().join("b.pdf");
    let output = temp_dir.path().join("out.pdf");
    write_pdf(&a, primary);
    write_pdf(&b, secondary);

    PdfMerger::new()
        .merge(&a, &b, &output, keep_all())
        .await
        .unwrap();

    assert_eq!(read_labels(&output), expected);
}

#[tokio::test]
async fn test_reversed_backs_from_flipped_stack() {
    let temp_dir = TempDir::new().unwrap();
    let fronts = temp_dir.path().join("front.pdf");
    let backs = temp_dir.path().join("back.pdf");
    let output = temp_dir.path().join("out.pdf");
    write_pdf(&fronts, &["1", "3", "5"]);
    write_pdf(&backs, &["6", "4", "2"]);

    let options = MergeOptions {
        reverse_secondary: true,
        ..keep_all()
    };
    PdfMerger::new()
        .merge(&fronts, &backs, &output, options)
        .await
        .unwrap();

    assert_eq!(read_labels(&output), vec!["1", "2", "3", "4", "5", "6"]);
}

#[tokio::test]
async fn test_blank_backs_removed_and_sources_deleted() {
    let temp_dir = TempDir::new().unwrap();
    let fronts = temp_dir.path().join("front.pdf");
    let backs = temp_dir.path().join("back.pdf");
    let output = temp_dir.path().join("out.pdf");
    write_pdf(&fronts, &["F1", "F2"]);
    write_pdf(&backs, &["", "B2"]);

    let options = MergeOptions {
        delete_source: true,
        remove_empty_pages: true,
        reverse_secondary: false,
    };
    let report = PdfMerger::new()
        .merge(&fronts, &backs, &output, options)
        .await
        .unwrap();

    assert_eq!(report.pages_removed, 1);
    assert_eq!(read_labels(&output), vec!["F1", "F2", "B2"]);
    assert!(report.sources_deleted);
    assert!(!fronts.exists() && !backs.exists());
}

#[tokio::test]
async fn test_inherited_page_attributes_survive() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.pdf");
    let b = temp_dir.path().join("b.pdf");
    let output = temp_dir.path().join("out.pdf");
    write_pdf(&a, &["a1"]);
    write_pdf(&b, &["b1"]);

    PdfMerger::new()
        .merge(&a, &b, &output, keep_all())
        .await
        .unwrap();

    let doc = Document::load(&output).unwrap();
    for page_id in doc.get_pages().into_values() {
        let page = doc.get_dictionary(page_id).unwrap();
        let has_media_box = page.has(b"MediaBox")
            || page
                .get(b"Parent")
                .and_then(|p| p.as_reference())
                .and_then(|id| doc.get_dictionary(id))
                .is_ok_and(|parent| parent.has(b"MediaBox"));
        assert!(has_media_box, "page {page_id:?} lost its MediaBox");
    }
}

#[tokio::test]
async fn test_zero_page_input_is_invalid() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.pdf");
    let b = temp_dir.path().join("b.pdf");
    write_pdf(&a, &[]);
    write_pdf(&b, &["b1"]);

    let result = PdfMerger::new()
        .merge(&a, &b, &temp_dir.path().join("out.pdf"), keep_all())
        .await;

    assert!(matches!(result, Err(DocMoverError::InvalidInput { .. })));
}

#[tokio::test]
async fn test_all_blank_is_empty_result() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.pdf");
    let b = temp_dir.path().join("b.pdf");
    let output = temp_dir.path().join("out.pdf");
    write_pdf(&a, &["", ""]);
    write_pdf(&b, &[""]);

    let options = MergeOptions {
        delete_source: true,
        remove_empty_pages: true,
        reverse_secondary: false,
    };
    let result = PdfMerger::new().merge(&a, &b, &output, options).await;

    assert!(matches!(result, Err(DocMoverError::EmptyResult { .. })));
    assert!(!output.exists());
    assert!(a.exists() && b.exists());
}
