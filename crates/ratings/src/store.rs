//! Append-only record store.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use ratings_core::{DataError, Record, Result, Symbol};
use tracing::{debug, info};

/// Line that opens and closes every record.
pub const RECORD_SEPARATOR: &str = "================================================================================";

/// Line between a record's metadata and its texts.
const METADATA_SEPARATOR: &str = "--------------------------------------------------------------------------------";

const STOCK_MARKER: &str = "Stock: ";

/// A record section read back from the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordSection {
    /// Symbol named on the section's `Stock:` line.
    pub symbol: Symbol,
    /// Everything after the `Stock:` line, trimmed.
    pub body: String,
}

/// Plain-text store of collected records.
///
/// Records are only ever appended. The `Stock: <symbol>` line of a record is
/// its completion marker; the set of marked symbols is read once when the
/// store is opened and kept up to date on every append.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    index: HashSet<Symbol>,
}

impl RecordStore {
    /// Open the store at `path`, indexing the symbols already recorded.
    ///
    /// A missing file is an empty store; it is created on the first append.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(DataError::Store(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        let index: HashSet<Symbol> = content
            .lines()
            .filter_map(|line| line.strip_prefix(STOCK_MARKER))
            .map(str::trim)
            .filter(|symbol| !symbol.is_empty())
            .map(Symbol::new)
            .collect();
        debug!(path = %path.display(), recorded = index.len(), "Opened record store");

        Ok(Self { path, index })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a record for `symbol` has been stored.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.index.contains(symbol)
    }

    /// Number of distinct symbols recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Append a record and mark its symbol as done.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DataError::Store(e.to_string()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| DataError::Store(format!("Failed to open {}: {e}", self.path.display())))?;
        file.write_all(format_record(record).as_bytes())
            .map_err(|e| DataError::Store(format!("Failed to write {}: {e}", self.path.display())))?;

        self.index.insert(record.symbol.clone());
        info!(symbol = %record.symbol, path = %self.path.display(), "Added ratings record");
        Ok(())
    }

    /// Split the store into per-company sections.
    ///
    /// The file is cut at every separator line; pieces without a `Stock:`
    /// line are ignored, as are sections with nothing after it.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn sections(&self) -> Result<Vec<RecordSection>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DataError::Store(e.to_string())),
        };

        let sections = content
            .split(RECORD_SEPARATOR)
            .filter_map(|block| {
                let (_, rest) = block.split_once(STOCK_MARKER)?;
                let (symbol, body) = rest.split_once('\n').unwrap_or((rest, ""));
                let symbol = symbol.trim();
                let body = body.trim();
                (!symbol.is_empty() && !body.is_empty()).then(|| RecordSection {
                    symbol: Symbol::new(symbol),
                    body: body.to_string(),
                })
            })
            .collect();
        Ok(sections)
    }
}

/// Render a record in the store's text layout.
#[must_use]
pub fn format_record(record: &Record) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(RECORD_SEPARATOR);
    out.push('\n');
    out.push_str(&format!("{STOCK_MARKER}{}\n", record.symbol));
    out.push_str(&format!(
        "Timestamp: {}\n",
        record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    out.push_str(&format!("Company Name: {}\n", record.company_name));
    out.push_str(&format!("Market Cap: {}\n", record.market_cap));
    out.push_str(&format!("Rating Link: {}\n", record.source_link));
    out.push_str(METADATA_SEPARATOR);
    out.push('\n');

    if let Some(page_text) = record.page_text.as_deref().filter(|t| !t.is_empty()) {
        out.push_str("\nPage Text:\n");
        out.push_str(page_text);
        out.push('\n');
    }
    if let Some(pdf_text) = record.pdf_text.as_deref().filter(|t| !t.is_empty()) {
        out.push_str("\nPDF Text:\n");
        out.push_str(pdf_text);
        out.push('\n');
    }

    out.push_str(RECORD_SEPARATOR);
    out.push('\n');
    out
}
