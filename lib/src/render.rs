//! Public rendering of content documents.

use crate::block::{BlockId, BlockKind};
use crate::document::Document;
use crate::Result;

/// Display markup of a single block.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Fragment {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub html: String,
}

/// Renders the document into one fragment per displayable block, in
/// document order.
///
/// Blocks whose required fields are all empty produce no fragment, neither
/// do blocks of unknown kinds.
pub fn render(document: &Document) -> Result<Vec<Fragment>> {
    let mut fragments = Vec::with_capacity(document.len());
    for block in document {
        let Some(kind) = block.kind() else {
            tracing::trace!(block = %block.id, tag = block.payload.tag(), "skipping unknown block");
            continue;
        };
        if block.payload.is_blank() {
            continue;
        }
        fragments.push(Fragment {
            id: block.id.clone(),
            kind,
            html: block.payload.render()?,
        });
    }
    Ok(fragments)
}

/// Link target safe to place in `href` or `src` attributes.
///
/// Tabs and newlines are dropped and surrounding control characters trimmed,
/// the way browsers read urls. What remains must be relative or use one of
/// the `http`, `https` or `mailto` schemes, anything else becomes `#`.
pub fn safe_url(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c <= ' ');
    if cleaned.chars().any(char::is_control) {
        return "#".to_string();
    }
    match url::Url::parse(cleaned) {
        Ok(url) if matches!(url.scheme(), "http" | "https" | "mailto") => cleaned.to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => cleaned.to_string(),
        _ => "#".to_string(),
    }
}

/// Renders the whole document into a single markup string.
pub fn render_html(document: &Document) -> Result<String> {
    Ok(render(document)?
        .into_iter()
        .map(|f| f.html)
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::block::{Block, Stat, StatsBlock, TextBlock};

    fn text(heading: &str, text: &str) -> TextBlock {
        TextBlock {
            heading: heading.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn blank_blocks_render_nothing() {
        let mut doc = Document::new();
        for kind in [BlockKind::Text, BlockKind::Stats, BlockKind::Team, BlockKind::Cta] {
            doc.insert_block(kind);
        }
        assert!(render(&doc).unwrap().is_empty());
        assert_eq!(render_html(&doc).unwrap(), "");
    }

    #[test]
    fn unknown_blocks_render_nothing() {
        let doc = Document::from_json(
            r#"[
                { "id": "a", "type": "hologram", "content": { "text": "x" } },
                { "id": "b", "type": "quote", "content": { "text": "Ensemble" } }
            ]"#,
        )
        .unwrap();
        let fragments = render(&doc).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].id.as_str(), "b");
        assert_eq!(fragments[0].kind, BlockKind::Quote);
        assert!(fragments[0].html.contains("Ensemble"));
    }

    #[test]
    fn fragments_follow_document_order() {
        let mut doc = Document::new();
        doc.push(Block::new(BlockId::from("1"), text("First", "")));
        doc.push(Block::new(BlockId::from("2"), text("", "Second")));
        doc.push(Block::new(BlockId::from("3"), text("Third", "")));
        let ids: Vec<String> = render(&doc)
            .unwrap()
            .into_iter()
            .map(|f| f.id.to_string())
            .collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn blank_records_are_skipped_inside_block() {
        let mut doc = Document::new();
        doc.push(Block::new(
            BlockId::from("s"),
            StatsBlock {
                title: "Reach".to_string(),
                stats: vec![
                    Stat {
                        label: "Schools".to_string(),
                        value: "12".to_string(),
                    },
                    Stat::default(),
                    Stat {
                        label: "Pupils".to_string(),
                        value: "1400".to_string(),
                    },
                ]
                .into(),
            },
        ));
        let html = render_html(&doc).unwrap();
        assert_eq!(html.matches(r#"class="stat""#).count(), 2);
        assert!(html.find("Schools").unwrap() < html.find("Pupils").unwrap());
    }

    #[test]
    fn content_is_escaped() {
        let mut doc = Document::new();
        doc.push(Block::new(
            BlockId::from("t"),
            text("<script>alert(1)</script>", ""),
        ));
        let html = render_html(&doc).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn dangerous_links_are_neutralized() {
        let doc = Document::from_json(
            &json!([{
                "id": "c",
                "type": "cta",
                "content": { "title": "Give", "buttonText": "Donate", "buttonUrl": "javascript:alert(1)" }
            }])
            .to_string(),
        )
        .unwrap();
        let html = render_html(&doc).unwrap();
        assert!(html.contains(r##"href="#""##));
        assert!(!html.contains("javascript:"));

        for url in ["java\tscript:alert(1)", "java\nscript:alert(1)", "\u{1}javascript:alert(1)"] {
            let doc = Document::from_json(
                &json!([
                    { "id": "c", "type": "cta", "content": { "title": "Give", "buttonText": "Donate", "buttonUrl": url } },
                    { "id": "i", "type": "image", "content": { "src": url, "alt": "x" } }
                ])
                .to_string(),
            )
            .unwrap();
            let html = render_html(&doc).unwrap();
            assert!(!html.contains("script:"), "{url:?} leaked into {html}");
        }
    }

    #[test]
    fn safe_url_keeps_ordinary_links() {
        assert_eq!(safe_url(" https://example.org/a?b=1 "), "https://example.org/a?b=1");
        assert_eq!(safe_url("/image/42"), "/image/42");
        assert_eq!(safe_url("#goals"), "#goals");
        assert_eq!(safe_url("vbscript:msgbox(1)"), "#");
        assert_eq!(safe_url("ftp://example.org/file"), "#");
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut doc = Document::new();
        doc.push(Block::new(BlockId::from("t"), text("Bienvenue", "Un\n\nDeux")));
        assert_eq!(render(&doc).unwrap(), render(&doc).unwrap());
        let html = render_html(&doc).unwrap();
        assert!(html.contains("<p>Un</p>"));
        assert!(html.contains("<p>Deux</p>"));
    }
}
