//! HTML to plain text reduction

use scraper::{ElementRef, Html, Node};

/// Elements whose whole subtree is boilerplate
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "header"];

/// Reduces an HTML document to its visible text
///
/// Script, style, navigation, header and footer subtrees are dropped. Each
/// remaining text node is trimmed; the pieces are joined one per line and
/// blank lines are removed.
///
/// # Example
///
/// ```
/// use sumi_sift::retrieval::extract_text;
///
/// let html = "<html><body><nav>Menu</nav><h1>Title</h1><p>Body text</p></body></html>";
/// assert_eq!(extract_text(html), "Title\nBody text");
/// ```
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut pieces = Vec::new();
    collect_text(document.root_element(), &mut pieces);

    pieces
        .iter()
        .flat_map(|piece| piece.lines())
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, pieces: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    pieces.push(trimmed.to_string());
                }
            }
            Node::Element(el) => {
                if SKIPPED_ELEMENTS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, pieces);
                }
            }
            _ => {}
        }
    }
}

/// Returns at most `max_chars` characters, marking truncation with `...`
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boilerplate_removed() {
        let html = r#"<html>
<head><title>Guide</title><style>body { color: red; }</style></head>
<body>
  <header>Site header</header>
  <nav><a href="/">Home</a></nav>
  <main>
    <h1>Getting started</h1>
    <p>First paragraph.</p>
    <script>console.log("hidden");</script>
  </main>
  <footer>Copyright</footer>
</body>
</html>"#;

        assert_eq!(
            extract_text(html),
            "Guide\nGetting started\nFirst paragraph."
        );
    }

    #[test]
    fn test_inline_elements_split_lines() {
        let html = "<p>Hello <b>bold</b> world</p>";

        assert_eq!(extract_text(html), "Hello\nbold\nworld");
    }

    #[test]
    fn test_blank_lines_dropped() {
        let html = "<pre>one\n\n   \ntwo</pre>";

        assert_eq!(extract_text(html), "one\ntwo");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(extract_text(""), "");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("abc", 3), "abc");
        assert_eq!(preview("日本語テキスト", 2), "日本...");
    }
}
