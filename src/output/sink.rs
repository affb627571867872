//! CSV result sink
//!
//! Records accumulate in memory and are written exactly once, at
//! finalization. The file is first written to a temporary file in the same
//! directory and then renamed over the target path, so readers only ever see
//! either no file or a complete one.

use crate::CrawlError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Header row of the output file
pub const CSV_HEADER: [&str; 3] = ["url", "title", "description"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One row of output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Normalized final URL of the page
    pub url: String,
    pub title: String,
    pub description: String,
}

/// Ordered, in-memory collection of records bound to an output path
#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
    records: Vec<PageRecord>,
    bom: bool,
}

impl ResultSink {
    /// Creates a sink for `path`, checking up front that it can be written
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::OutputPath`] if the path is a directory, its
    /// parent directory does not exist, or a file cannot be created there.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, CrawlError> {
        let path = path.into();

        if path.is_dir() {
            return Err(CrawlError::OutputPath {
                path,
                message: "is a directory".to_string(),
            });
        }

        let dir = parent_dir(&path);
        if !dir.is_dir() {
            return Err(CrawlError::OutputPath {
                message: format!("directory {} does not exist", dir.display()),
                path,
            });
        }

        // Probe: the temporary file is removed again when dropped
        if let Err(e) = NamedTempFile::new_in(dir) {
            return Err(CrawlError::OutputPath {
                path,
                message: format!("cannot create files: {}", e),
            });
        }

        Ok(Self {
            path,
            records: Vec::new(),
            bom: false,
        })
    }

    /// Prefix the written file with a UTF-8 byte order mark
    pub fn with_bom(mut self, bom: bool) -> Self {
        self.bom = bom;
        self
    }

    /// Appends a record
    pub fn append(&mut self, record: PageRecord) {
        self.records.push(record);
    }

    /// Records collected so far
    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the header and every record to the output path
    ///
    /// An empty sink still produces a header-only file. Returns the number of
    /// data rows written.
    pub fn flush(&self) -> Result<usize, CrawlError> {
        let mut tmp = NamedTempFile::new_in(parent_dir(&self.path))?;

        if self.bom {
            tmp.write_all(UTF8_BOM)?;
        }

        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer.write_record(CSV_HEADER)?;
            for record in &self.records {
                writer.write_record([
                    record.url.as_str(),
                    record.title.as_str(),
                    record.description.as_str(),
                ])?;
            }
            writer.flush()?;
        }

        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::info!(
            "Wrote {} records to {}",
            self.records.len(),
            self.path.display()
        );

        Ok(self.records.len())
    }
}

/// Directory holding `path`; a bare file name lives in the current directory
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
