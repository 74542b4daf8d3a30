//! Visible-text extraction from HTML.

use scraper::{Html, Node};

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style"];

/// Extract the normalized visible text of an HTML document.
///
/// Script and style contents are dropped. The remaining text is split into
/// lines, each line is trimmed and split again on double-space boundaries,
/// empty chunks are discarded and the rest is joined with single spaces.
#[must_use]
pub fn normalize_page_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut raw = String::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
            _ => false,
        });
        if !hidden {
            raw.push_str(text);
        }
    }

    collapse_whitespace(&raw)
}

/// Collapse text the way disclosure pages need it: line by line, then on
/// double spaces.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_and_styles_removed() {
        let html = r#"<html><head><title>Rating</title>
            <style>.x { color: red; }</style>
            <script>var rating = "hidden";</script></head>
            <body><h1>Press Release</h1>
            <p>Long term rating reaffirmed</p>
            <script type="text/javascript">document.write("nope")</script></body></html>"#;
        let text = normalize_page_text(html);
        assert_eq!(text, "Rating Press Release Long term rating reaffirmed");
    }

    #[test]
    fn test_double_space_split() {
        assert_eq!(
            collapse_whitespace("  Facility   Amount  \n\n  CARE A-;  Stable "),
            "Facility Amount CARE A-; Stable"
        );
    }

    #[test]
    fn test_single_spaces_preserved() {
        assert_eq!(
            collapse_whitespace("Bank facilities rated"),
            "Bank facilities rated"
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(normalize_page_text(""), "");
        assert_eq!(normalize_page_text("<html><body>\n\n</body></html>"), "");
    }
}
