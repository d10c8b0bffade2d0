use crate::{
    services::rich_text::{escape_html, render_rich_text},
    structs::{
        blocks::{Block, TocEntry},
        notion::plain_text,
    },
};
use slug::slugify;
use std::collections::HashMap;

const FALLBACK_ANCHOR: &str = "section";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Bulleted => "ul",
            ListKind::Numbered => "ol",
        }
    }
}

/// 單一 block 的輸出；列表項目交給 parser 決定 `<ul>`/`<ol>` 的開合
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Html(String),
    ListItem { kind: ListKind, html: String },
}

/// 目錄累加器，重複的 anchor 依序加上 `-2`、`-3`
#[derive(Debug, Default)]
pub struct Toc {
    entries: Vec<TocEntry>,
    seen: HashMap<String, usize>,
}

impl Toc {
    pub fn push(&mut self, text: String, level: u8) -> String {
        let base = match slugify(&text) {
            slug if slug.is_empty() => FALLBACK_ANCHOR.to_string(),
            slug => slug,
        };

        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;
        let id = match *count {
            1 => base,
            n => format!("{base}-{n}"),
        };

        self.entries.push(TocEntry {
            id: id.clone(),
            text,
            level,
        });
        id
    }

    pub fn into_entries(self) -> Vec<TocEntry> {
        self.entries
    }
}

/// 依 block 種類輸出固定格式的 HTML，不支援的種類不輸出
pub fn render_block(block: &Block, toc: &mut Toc) -> Option<Fragment> {
    match block {
        Block::Paragraph(text) => {
            if plain_text(text).trim().is_empty() {
                return None;
            }
            Some(Fragment::Html(format!("<p>{}</p>", render_rich_text(text))))
        }
        Block::Heading { level, text } => {
            // 空白標題不輸出，也不進目錄
            let heading = plain_text(text);
            if heading.trim().is_empty() {
                return None;
            }
            let level = (*level).clamp(1, 3);
            let id = toc.push(heading, level);
            Some(Fragment::Html(format!(
                "<h{level} id=\"{}\">{}</h{level}>",
                escape_html(&id),
                render_rich_text(text)
            )))
        }
        Block::BulletedListItem(text) => Some(Fragment::ListItem {
            kind: ListKind::Bulleted,
            html: format!("<li>{}</li>", render_rich_text(text)),
        }),
        Block::NumberedListItem(text) => Some(Fragment::ListItem {
            kind: ListKind::Numbered,
            html: format!("<li>{}</li>", render_rich_text(text)),
        }),
        Block::Code { language, text } => {
            let label = if language.trim().is_empty() {
                "plain text"
            } else {
                language.as_str()
            };
            let label = escape_html(label);
            Some(Fragment::Html(format!(
                "<figure class=\"notion-code\"><figcaption>{label}</figcaption><pre><code class=\"language-{}\">{}</code></pre></figure>",
                label.replace(' ', "-"),
                escape_html(&plain_text(text))
            )))
        }
        Block::Image { url, caption } => {
            let alt = plain_text(caption);
            let caption_html = if alt.trim().is_empty() {
                String::new()
            } else {
                format!("<figcaption>{}</figcaption>", render_rich_text(caption))
            };
            Some(Fragment::Html(format!(
                "<figure class=\"notion-image\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\">{caption_html}</figure>",
                escape_html(url),
                escape_html(&alt)
            )))
        }
        Block::Quote(text) => Some(Fragment::Html(format!(
            "<blockquote>{}</blockquote>",
            render_rich_text(text)
        ))),
        Block::Unsupported(kind) => {
            tracing::debug!("skip unsupported block type: {}", kind);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::notion::RichTextSpan;

    fn text(value: &str) -> Vec<RichTextSpan> {
        vec![RichTextSpan::plain(value)]
    }

    fn html(fragment: Option<Fragment>) -> String {
        match fragment {
            Some(Fragment::Html(html)) => html,
            other => panic!("expected html fragment, got {:?}", other),
        }
    }

    #[test]
    fn heading_gets_anchor_and_toc_entry() {
        let mut toc = Toc::default();
        let block = Block::Heading {
            level: 2,
            text: text("Getting Started"),
        };

        let fragment = html(render_block(&block, &mut toc));
        assert_eq!(fragment, "<h2 id=\"getting-started\">Getting Started</h2>");
        assert_eq!(
            toc.into_entries(),
            vec![TocEntry {
                id: "getting-started".to_string(),
                text: "Getting Started".to_string(),
                level: 2,
            }]
        );
    }

    #[test]
    fn repeated_headings_get_suffixed_anchors() {
        let mut toc = Toc::default();
        for _ in 0..3 {
            render_block(
                &Block::Heading {
                    level: 1,
                    text: text("Setup"),
                },
                &mut toc,
            );
        }

        let ids: Vec<String> = toc.into_entries().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["setup", "setup-2", "setup-3"]);
    }

    #[test]
    fn heading_without_sluggable_text_uses_fallback() {
        let mut toc = Toc::default();
        let fragment = html(render_block(
            &Block::Heading {
                level: 1,
                text: text("!!!"),
            },
            &mut toc,
        ));
        assert!(fragment.starts_with("<h1 id=\"section\">"));
    }

    #[test]
    fn empty_paragraph_produces_nothing() {
        let mut toc = Toc::default();
        assert_eq!(render_block(&Block::Paragraph(vec![]), &mut toc), None);
    }

    #[test]
    fn blank_paragraph_spans_produce_nothing() {
        let mut toc = Toc::default();
        assert_eq!(render_block(&Block::Paragraph(text("")), &mut toc), None);
        assert_eq!(
            render_block(
                &Block::Paragraph(vec![RichTextSpan::plain(" "), RichTextSpan::plain("\n")]),
                &mut toc
            ),
            None
        );
    }

    #[test]
    fn blank_heading_is_skipped_without_toc_entry() {
        let mut toc = Toc::default();
        assert_eq!(
            render_block(
                &Block::Heading {
                    level: 2,
                    text: vec![],
                },
                &mut toc,
            ),
            None
        );
        assert_eq!(
            render_block(
                &Block::Heading {
                    level: 3,
                    text: text("   "),
                },
                &mut toc,
            ),
            None
        );

        // 空白標題不佔用 anchor 編號
        render_block(
            &Block::Heading {
                level: 2,
                text: text("Intro"),
            },
            &mut toc,
        );
        let entries = toc.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "intro");
    }

    #[test]
    fn code_is_escaped_and_labelled() {
        let mut toc = Toc::default();
        let fragment = html(render_block(
            &Block::Code {
                language: "rust".to_string(),
                text: text("fn main() { println!(\"<hi>\"); }"),
            },
            &mut toc,
        ));

        assert_eq!(
            fragment,
            "<figure class=\"notion-code\"><figcaption>rust</figcaption><pre><code class=\"language-rust\">fn main() { println!(&quot;&lt;hi&gt;&quot;); }</code></pre></figure>"
        );
    }

    #[test]
    fn code_without_language_is_plain_text() {
        let mut toc = Toc::default();
        let fragment = html(render_block(
            &Block::Code {
                language: String::new(),
                text: text("x"),
            },
            &mut toc,
        ));
        assert!(fragment.contains("<figcaption>plain text</figcaption>"));
        assert!(fragment.contains("class=\"language-plain-text\""));
    }

    #[test]
    fn image_caption_is_optional() {
        let mut toc = Toc::default();
        let bare = html(render_block(
            &Block::Image {
                url: "https://img.test/a.png".to_string(),
                caption: vec![],
            },
            &mut toc,
        ));
        assert_eq!(
            bare,
            "<figure class=\"notion-image\"><img src=\"https://img.test/a.png\" alt=\"\" loading=\"lazy\"></figure>"
        );

        let captioned = html(render_block(
            &Block::Image {
                url: "https://img.test/a.png".to_string(),
                caption: text("A & B"),
            },
            &mut toc,
        ));
        assert!(captioned.contains("alt=\"A &amp; B\""));
        assert!(captioned.contains("<figcaption>A &amp; B</figcaption>"));
    }

    #[test]
    fn list_items_carry_their_kind() {
        let mut toc = Toc::default();
        assert_eq!(
            render_block(&Block::NumberedListItem(text("one")), &mut toc),
            Some(Fragment::ListItem {
                kind: ListKind::Numbered,
                html: "<li>one</li>".to_string(),
            })
        );
    }

    #[test]
    fn quote_and_unsupported() {
        let mut toc = Toc::default();
        assert_eq!(
            html(render_block(&Block::Quote(text("wise")), &mut toc)),
            "<blockquote>wise</blockquote>"
        );
        assert_eq!(
            render_block(&Block::Unsupported("table".to_string()), &mut toc),
            None
        );
    }
}
