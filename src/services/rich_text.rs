use crate::structs::notion::RichTextSpan;

/// 將 rich text span 依序轉為 inline HTML
pub fn render_rich_text(spans: &[RichTextSpan]) -> String {
    spans.iter().map(render_span).collect()
}

fn render_span(span: &RichTextSpan) -> String {
    let mut html = escape_html(&span.plain_text).replace('\n', "<br>");
    let annotations = &span.annotations;

    // 固定包裝順序，先包的在最內層
    let wrappers = [
        (annotations.bold, "strong"),
        (annotations.italic, "em"),
        (annotations.underline, "u"),
        (annotations.code, "code"),
        (annotations.strikethrough, "del"),
    ];
    for (enabled, tag) in wrappers {
        if enabled {
            html = format!("<{tag}>{html}</{tag}>");
        }
    }

    match span.href.as_deref().filter(|href| is_safe_href(href)) {
        Some(href) => format!(
            "<a href='{}' target='_blank' rel='noopener noreferrer'>{}</a>",
            escape_html(href),
            html
        ),
        None => html,
    }
}

/// 只接受 http(s)、mailto 與站內相對連結
fn is_safe_href(href: &str) -> bool {
    let href = href.trim();
    if href.starts_with('/') || href.starts_with('#') {
        return !href.starts_with("//");
    }

    let lower = href.to_ascii_lowercase();
    ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
