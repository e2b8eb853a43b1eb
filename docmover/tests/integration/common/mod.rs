//! Shared helpers for the integration tests.
//!
//! Fixture PDFs are generated with lopdf. Each page shows its label as a
//! single text operation so the page order of a merged document can be
//! read back.

use docmover::MoverConfig;
use docmover::mover::fs::{FileStat, FileSystem, LocalFileSystem};
use filetime::FileTime;
use lopdf::content::Content;
use lopdf::{Document, Object, Stream, dictionary};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Write a PDF with one page per label. An empty label gives a blank page.
pub fn write_pdf(path: &Path, labels: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let kids: Vec<Object> = labels
        .iter()
        .map(|label| {
            let content = if label.is_empty() {
                Vec::new()
            } else {
                format!("BT /F1 10 Tf 50 700 Td ({label}) Tj ET").into_bytes()
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    // MediaBox and Resources live on the tree root and are inherited.
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).expect("Failed to write fixture PDF");
}

/// Page labels of the PDF at `path`, in page order.
pub fn read_labels(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("Failed to load PDF");
    doc.get_pages()
        .into_values()
        .map(|id| {
            let data = doc.get_page_content(id).unwrap_or_default();
            Content::decode(&data)
                .ok()
                .and_then(|c| c.operations.into_iter().find(|op| op.operator == "Tj"))
                .and_then(|op| op.operands.first().and_then(|o| o.as_str().ok()).map(<[u8]>::to_vec))
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .unwrap_or_default()
        })
        .collect()
}

/// Set a file's mtime to `age` in the past.
pub fn backdate(path: &Path, age: Duration) {
    let mtime = FileTime::from_system_time(SystemTime::now() - age);
    filetime::set_file_mtime(path, mtime).expect("Failed to set mtime");
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Source, destination and dual-side destination under one temp dir.
pub struct Staging {
    _temp_dir: TempDir,
    pub incoming: PathBuf,
    pub archive: PathBuf,
    pub duplex: PathBuf,
}

impl Staging {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let incoming = temp_dir.path().join("incoming");
        let archive = temp_dir.path().join("archive");
        let duplex = temp_dir.path().join("duplex");
        for dir in [&incoming, &archive, &duplex] {
            std::fs::create_dir_all(dir).expect("Failed to create dir");
        }
        Self {
            _temp_dir: temp_dir,
            incoming,
            archive,
            duplex,
        }
    }

    /// Mover configuration without a stability wait.
    pub fn config(&self) -> MoverConfig {
        let mut config = MoverConfig::new(&self.incoming, &self.archive);
        config.dual_dest_dir = Some(self.duplex.clone());
        config.stability_wait = Duration::ZERO;
        config
    }

    /// Write a dual-sided scan into the incoming folder.
    pub fn scan(&self, name: &str, labels: &[&str]) -> PathBuf {
        let path = self.incoming.join(name);
        write_pdf(&path, labels);
        path
    }
}

/// Filesystem where renames between directories cross devices and copies
/// come up one byte short.
#[derive(Debug, Default)]
pub struct TruncatingFileSystem;

impl FileSystem for TruncatingFileSystem {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        LocalFileSystem.stat(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if from.parent() == to.parent() {
            return LocalFileSystem.rename(from, to);
        }
        Err(io::Error::from(io::ErrorKind::CrossesDevices))
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let copied = LocalFileSystem.copy(from, to)?;
        let file = std::fs::OpenOptions::new().write(true).open(to)?;
        file.set_len(copied.saturating_sub(1))?;
        Ok(copied.saturating_sub(1))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        LocalFileSystem.remove_file(path)
    }

    fn set_owner(&self, path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        LocalFileSystem.set_owner(path, uid, gid)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        LocalFileSystem.set_mode(path, mode)
    }
}
