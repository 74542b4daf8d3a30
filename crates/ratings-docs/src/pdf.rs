//! PDF text extraction.

use std::fmt::Debug;
use std::panic;

use ratings_core::{DataError, Result};

/// Extracts text from a PDF document, one string per page.
pub trait PdfTextExtractor: Send + Sync + Debug {
    /// Returns the text of each page, in page order.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>>;

    /// Returns the document text with every page followed by a newline.
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        Ok(join_pages(&self.extract_pages(bytes)?))
    }
}

/// [`PdfTextExtractor`] backed by the `pdf-extract` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtract;

impl PdfExtract {
    /// Create a new extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PdfTextExtractor for PdfExtract {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed font tables.
        match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(DataError::Pdf(format!("{e:?}"))),
            Err(_) => Err(DataError::Pdf("extractor panicked on malformed document".to_string())),
        }
    }
}

/// Concatenate page texts, appending a newline after each page.
#[must_use]
pub fn join_pages(pages: &[String]) -> String {
    let mut text = String::with_capacity(pages.iter().map(|p| p.len() + 1).sum());
    for page in pages {
        text.push_str(page);
        text.push('\n');
    }
    text
}

/// Returns true if a declared content type denotes a PDF.
#[must_use]
pub fn is_pdf_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("application/pdf")
}
