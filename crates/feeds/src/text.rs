//! HTML to visible text.

use scraper::Html;

/// Elements whose text content never renders.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Reduce an HTML document to its visible text nodes, one per line.
///
/// Text nodes are trimmed and empty ones dropped, so a price split across
/// markup (`<span>S/</span><span>99</span>`) ends up on adjacent lines.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_visible_text_joins_nodes() {
        let html = r#"
            <html><head><title>Tienda</title></head>
            <body>
              <div class="card"><h3>iPhone 15</h3><p>Desde <b>S/ 3499</b></p></div>
              <div class="card"><h3>Moto G54</h3><p>S/ 699.90</p></div>
            </body></html>
        "#;
        assert_eq!(
            visible_text(html),
            "Tienda\niPhone 15\nDesde\nS/ 3499\nMoto G54\nS/ 699.90"
        );
    }

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let html = r#"
            <body>
              <script>var price = "S/ 1.00";</script>
              <style>.price::after { content: "S/ 2" }</style>
              <noscript><p>S/ 3</p></noscript>
              <span>S/ 150</span>
              <!-- S/ 4 -->
            </body>
        "#;
        assert_eq!(visible_text(html), "S/ 150");
    }

    #[test]
    fn test_visible_text_of_plain_text() {
        assert_eq!(visible_text("S/ 120 y S/ 80"), "S/ 120 y S/ 80");
        assert_eq!(visible_text(""), "");
    }
}
