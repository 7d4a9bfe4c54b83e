//! Structured rich-text blocks and their text/HTML renderings.
//!
//! Span offsets are UTF-16 code-unit positions, matching the offsets the
//! content API reports.

use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichTextBlock {
    pub kind: BlockKind,
    pub text: String,
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    Preformatted,
    ListItem,
    OrderedListItem,
    Image { url: String, alt: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink { url: String },
}

impl RichTextBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
            spans: Vec::new(),
        }
    }
}

/// Plain-text rendering: block texts joined by a single space.
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// HTML rendering. Consecutive list items share one `<ul>`/`<ol>`.
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = match block.kind {
            BlockKind::ListItem => Some("ul"),
            BlockKind::OrderedListItem => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                let _ = write!(html, "</{tag}>");
            }
            if let Some(tag) = list_tag {
                let _ = write!(html, "<{tag}>");
            }
            open_list = list_tag;
        }

        match &block.kind {
            BlockKind::Paragraph => wrap(&mut html, "p", block),
            BlockKind::Heading(level) => {
                let tag = format!("h{}", (*level).clamp(1, 6));
                wrap(&mut html, &tag, block);
            }
            BlockKind::Preformatted => {
                let _ = write!(html, "<pre>{}</pre>", escape_html(&block.text));
            }
            BlockKind::ListItem | BlockKind::OrderedListItem => wrap(&mut html, "li", block),
            BlockKind::Image { url, alt } => {
                let _ = write!(
                    html,
                    r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                    escape_html(url),
                    escape_html(alt.as_deref().unwrap_or(""))
                );
            }
        }
    }

    if let Some(tag) = open_list {
        let _ = write!(html, "</{tag}>");
    }

    html
}

fn wrap(html: &mut String, tag: &str, block: &RichTextBlock) {
    let _ = write!(
        html,
        "<{tag}>{}</{tag}>",
        render_inline(&block.text, &block.spans)
    );
}

fn render_inline(text: &str, spans: &[Span]) -> String {
    let mut ordered: Vec<&Span> = spans.iter().filter(|span| span.start < span.end).collect();
    ordered.sort_by(|left, right| {
        left.start
            .cmp(&right.start)
            .then(right.end.cmp(&left.end))
    });

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<&Span> = Vec::new();
    let mut next = 0;
    let mut position = 0;

    for ch in text.chars() {
        close_finished(&mut out, &mut stack, position);

        while next < ordered.len() && ordered[next].start <= position {
            let span = ordered[next];
            out.push_str(&open_tag(&span.kind));
            stack.push(span);
            next += 1;
        }

        push_escaped(&mut out, ch);
        position += ch.len_utf16();
    }

    for span in stack.iter().rev() {
        out.push_str(close_tag(&span.kind));
    }

    out
}

// Overlapping spans are closed down to the finished one and the survivors reopened.
fn close_finished<'a>(out: &mut String, stack: &mut Vec<&'a Span>, position: usize) {
    let Some(index) = stack.iter().position(|span| span.end <= position) else {
        return;
    };

    let popped: Vec<&Span> = stack.drain(index..).collect();
    for span in popped.iter().rev() {
        out.push_str(close_tag(&span.kind));
    }
    for span in popped {
        if span.end > position {
            out.push_str(&open_tag(&span.kind));
            stack.push(span);
        }
    }
}

fn open_tag(kind: &SpanKind) -> String {
    match kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink { url } => {
            format!(r#"<a href="{}">"#, escape_html(safe_href(url)))
        }
    }
}

fn close_tag(kind: &SpanKind) -> &'static str {
    match kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink { .. } => "</a>",
    }
}

const LINK_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Relative links and the schemes in [`LINK_SCHEMES`] pass; anything else becomes `#`.
fn safe_href(url: &str) -> &str {
    // Browsers ignore embedded whitespace and control characters in schemes.
    let normalized: String = url
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace() && !ch.is_ascii_control())
        .collect();

    match normalized.find([':', '/', '?', '#']) {
        Some(index) if normalized[index..].starts_with(':') => {
            let scheme = normalized[..index].to_ascii_lowercase();
            if LINK_SCHEMES.contains(&scheme.as_str()) {
                url
            } else {
                "#"
            }
        }
        _ => url,
    }
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#x27;"),
        '\n' => out.push_str("<br />"),
        other => out.push(other),
    }
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\n' => out.push('\n'),
            other => push_escaped(&mut out, other),
        }
    }
    out
}
