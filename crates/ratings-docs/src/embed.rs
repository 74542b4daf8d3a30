//! Embedded-document discovery and viewer URL rewriting.

use ratings_core::{DataError, Result};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Default container that wraps an embedded disclosure viewer.
pub const DEFAULT_HOLDER_SELECTOR: &str = "div.pdf_holder";

/// Default frame selector inside the holder.
pub const DEFAULT_FRAME_SELECTOR: &str = "iframe[src]";

/// Rewrites a report-viewer URL to the endpoint that serves the raw document.
///
/// A rule matches when the frame source contains `marker`. The trailing path
/// segment of the source is taken as the report ID and substituted for `{id}`
/// in `template`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerRewriteRule {
    /// Substring identifying the viewer URL.
    pub marker: String,
    /// Download URL template containing an `{id}` placeholder.
    pub template: String,
}

impl ViewerRewriteRule {
    /// Creates a new rule.
    #[must_use]
    pub fn new(marker: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            template: template.into(),
        }
    }

    /// The rating-rationale viewer used by CARE-style disclosure sites.
    #[must_use]
    pub fn rational_report() -> Self {
        Self::new(
            "/Rating/ShowRationalReportFilePdf/",
            "/Rating/GetRationalReportFilePdf?Id={id}",
        )
    }

    /// Returns the rewritten URL, or `None` if the rule does not apply.
    #[must_use]
    pub fn apply(&self, src: &str) -> Option<String> {
        if !src.contains(&self.marker) {
            return None;
        }
        let id = src.rsplit('/').next().unwrap_or_default();
        Some(self.template.replace("{id}", id))
    }
}

/// Rewrite `src` with the first matching rule, or return it unchanged.
#[must_use]
pub fn rewrite_viewer_url(src: &str, rules: &[ViewerRewriteRule]) -> String {
    rules
        .iter()
        .find_map(|rule| rule.apply(src))
        .unwrap_or_else(|| src.to_string())
}

/// Find the source of the frame inside the document holder.
///
/// Returns `Ok(None)` when the page has no holder, the holder has no frame, or
/// the frame source is blank.
pub fn find_embedded_source(
    html: &str,
    holder_selector: &str,
    frame_selector: &str,
) -> Result<Option<String>> {
    let holder_selector = parse_selector(holder_selector)?;
    let frame_selector = parse_selector(frame_selector)?;

    let document = Html::parse_document(html);
    let src = document
        .select(&holder_selector)
        .next()
        .and_then(|holder| holder.select(&frame_selector).next())
        .and_then(|frame| frame.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string);

    Ok(src)
}

/// Resolve a possibly relative URL against the origin of `page_url`.
///
/// Absolute URLs are returned as-is. Relative ones are joined to the scheme,
/// host and port of the page, never to its path.
pub fn resolve_against_origin(src: &str, page_url: &str) -> Result<Url> {
    if let Ok(absolute) = Url::parse(src) {
        return Ok(absolute);
    }

    let page = Url::parse(page_url)
        .map_err(|e| DataError::InvalidParameter(format!("Invalid page URL {page_url}: {e}")))?;
    let origin = page.origin().ascii_serialization();
    Url::parse(&format!("{origin}/"))
        .and_then(|base| base.join(src))
        .map_err(|e| DataError::Parse(format!("Cannot resolve {src} against {origin}: {e}")))
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| DataError::InvalidParameter(format!("Invalid CSS selector {selector}: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational_report_rule() {
        let rule = ViewerRewriteRule::rational_report();
        assert_eq!(
            rule.apply("/Rating/ShowRationalReportFilePdf/98765").as_deref(),
            Some("/Rating/GetRationalReportFilePdf?Id=98765")
        );
        assert_eq!(
            rule.apply("https://www.example.com/Rating/ShowRationalReportFilePdf/12")
                .as_deref(),
            Some("/Rating/GetRationalReportFilePdf?Id=12")
        );
        assert!(rule.apply("/files/report.pdf").is_none());
    }

    #[test]
    fn test_unmatched_source_kept() {
        let rules = vec![ViewerRewriteRule::rational_report()];
        assert_eq!(
            rewrite_viewer_url("/files/report.pdf", &rules),
            "/files/report.pdf"
        );
        assert_eq!(rewrite_viewer_url("/files/report.pdf", &[]), "/files/report.pdf");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            ViewerRewriteRule::new("/viewer/", "/download/{id}"),
            ViewerRewriteRule::new("/viewer/", "/other/{id}"),
        ];
        assert_eq!(rewrite_viewer_url("/viewer/7", &rules), "/download/7");
    }

    #[test]
    fn test_find_embedded_source() {
        let html = r#"<html><body>
            <iframe src="/ads/frame"></iframe>
            <div class="content pdf_holder">
              <iframe width="100%" src=" /Rating/ShowRationalReportFilePdf/55 "></iframe>
            </div></body></html>"#;
        let src = find_embedded_source(html, DEFAULT_HOLDER_SELECTOR, DEFAULT_FRAME_SELECTOR)
            .unwrap();
        assert_eq!(src.as_deref(), Some("/Rating/ShowRationalReportFilePdf/55"));
    }

    #[test]
    fn test_no_holder_or_frame() {
        let no_holder = r#"<html><body><iframe src="/x"></iframe></body></html>"#;
        assert!(
            find_embedded_source(no_holder, DEFAULT_HOLDER_SELECTOR, DEFAULT_FRAME_SELECTOR)
                .unwrap()
                .is_none()
        );

        let empty_holder = r#"<div class="pdf_holder"><iframe></iframe></div>"#;
        assert!(
            find_embedded_source(empty_holder, DEFAULT_HOLDER_SELECTOR, DEFAULT_FRAME_SELECTOR)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_invalid_selector() {
        let err = find_embedded_source("<p></p>", "div[", DEFAULT_FRAME_SELECTOR).unwrap_err();
        assert!(matches!(err, DataError::InvalidParameter(_)));
    }

    #[test]
    fn test_resolve_relative_against_origin() {
        let url = resolve_against_origin(
            "/Rating/GetRationalReportFilePdf?Id=55",
            "https://www.careratings.com/deep/path/page?x=1",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.careratings.com/Rating/GetRationalReportFilePdf?Id=55"
        );

        let url = resolve_against_origin("files/a.pdf", "http://127.0.0.1:8080/some/page").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/files/a.pdf");
    }

    #[test]
    fn test_resolve_absolute_kept() {
        let url = resolve_against_origin(
            "https://cdn.example.com/r.pdf",
            "https://www.careratings.com/page",
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/r.pdf");
    }
}
