//! Markdown → HTML rendering.
//!
//! pulldown-cmark does the parsing; this module rewrites its event stream in
//! two places before serialising:
//!
//! * fenced code blocks are collected and replaced by a single HTML event
//!   wrapped as `<pre class="hljs"><code>…</code></pre>`, highlighted when
//!   the language is known and escaped otherwise;
//! * bare `http(s)://` and `www.` URLs in ordinary text become links. Text
//!   inside code, links and image alt text is left alone.
//!
//! Raw HTML in the source passes through unchanged.

use crate::config::ConversionConfig;
use crate::pipeline::highlight::Highlighter;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream};
use regex::Regex;
use tracing::debug;

static RE_BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\b(?:https?://|www\.)[^\s<>"'`]+"#).unwrap());

/// Escape the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders Markdown with a fixed option set and highlighter.
///
/// Build once and reuse: construction loads the syntect definitions.
#[derive(Debug)]
pub struct MarkdownRenderer {
    options: Options,
    highlighter: Highlighter,
}

impl MarkdownRenderer {
    pub fn new(config: &ConversionConfig) -> Self {
        Self::with_theme(&config.highlight_theme)
    }

    pub fn with_theme(theme: &str) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        Self {
            options,
            highlighter: Highlighter::new(theme),
        }
    }

    /// Render `markdown` to an HTML fragment. Same input, same output.
    pub fn render_html(&self, markdown: &str) -> String {
        let parser = TextMergeStream::new(Parser::new_ext(markdown, self.options));

        let mut events: Vec<Event<'_>> = Vec::new();
        let mut fence: Option<(String, String)> = None;
        let mut link_depth = 0usize;
        let mut in_indented_code = false;

        for event in parser {
            if fence.is_some() {
                match event {
                    Event::Text(text) => {
                        if let Some((_, code)) = fence.as_mut() {
                            code.push_str(&text);
                        }
                    }
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some((lang, code)) = fence.take() {
                            events.push(Event::Html(self.fenced_block_html(&lang, &code).into()));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    fence = Some((fence_language(&info).to_string(), String::new()));
                }
                Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)) => {
                    in_indented_code = true;
                    events.push(event);
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_indented_code = false;
                    events.push(event);
                }
                Event::InlineHtml(ref raw) if is_anchor_open(raw) => {
                    link_depth += 1;
                    events.push(event);
                }
                Event::InlineHtml(ref raw) if is_anchor_close(raw) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(event);
                }
                Event::Start(Tag::Link { .. }) | Event::Start(Tag::Image { .. }) => {
                    link_depth += 1;
                    events.push(event);
                }
                Event::End(TagEnd::Link) | Event::End(TagEnd::Image) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(event);
                }
                Event::Text(text) if link_depth == 0 && !in_indented_code => linkify(text, &mut events),
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    fn fenced_block_html(&self, lang: &str, code: &str) -> String {
        let inner = if lang.is_empty() {
            escape_html(code)
        } else {
            match self.highlighter.highlight(code, lang) {
                Ok(highlighted) => highlighted,
                Err(e) => {
                    debug!("Highlight fallback for '{}': {}", lang, e);
                    escape_html(code)
                }
            }
        };
        format!("<pre class=\"hljs\"><code>{inner}</code></pre>\n")
    }
}

/// `<a ...>` or `<a>` written as raw inline HTML.
fn is_anchor_open(raw: &str) -> bool {
    let b = raw.as_bytes();
    b.len() >= 3
        && b[0] == b'<'
        && b[1].eq_ignore_ascii_case(&b'a')
        && (b[2] == b'>' || b[2].is_ascii_whitespace())
}

fn is_anchor_close(raw: &str) -> bool {
    let b = raw.as_bytes();
    b.len() >= 4
        && b.starts_with(b"</")
        && b[2].eq_ignore_ascii_case(&b'a')
        && (b[3] == b'>' || b[3].is_ascii_whitespace())
}

/// First token of a fence info string: "rust,ignore" and "rust title" both give "rust".
fn fence_language(info: &str) -> &str {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .unwrap_or("")
        .trim()
}

/// Push `text` as plain text interleaved with anchor elements for every bare URL.
fn linkify<'a>(text: CowStr<'a>, events: &mut Vec<Event<'a>>) {
    if !RE_BARE_URL.is_match(&text) {
        events.push(Event::Text(text));
        return;
    }

    let mut last = 0;
    for m in RE_BARE_URL.find_iter(&text) {
        let url = m
            .as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
        if url.is_empty() {
            continue;
        }
        let start = m.start();
        let end = start + url.len();
        if start > last {
            events.push(Event::Text(CowStr::from(text[last..start].to_string())));
        }
        let href = if url.starts_with("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        events.push(Event::InlineHtml(CowStr::from(format!(
            "<a href=\"{}\">{}</a>",
            escape_html(&href),
            escape_html(url)
        ))));
        last = end;
    }
    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}
