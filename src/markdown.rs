//! Detail Markdown
//!
//! Renders curator writeups for the detail panel:
//! - fenced code highlighted with syntect
//! - outbound links open in a new tab
//! - raw HTML in the source is escaped, never passed through

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use pulldown_cmark::{html::push_html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

const THEME_NAME: &str = "InspiredGitHub";

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> Option<&'static Theme> {
    THEME_SET.get_or_init(ThemeSet::load_defaults).themes.get(THEME_NAME)
}

// Characters that break out of an attribute or path
const URL_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Encode a media URL for use in `src`
pub fn encode_url(url: &str) -> String {
    utf8_percent_encode(url.trim(), URL_ENCODE_SET).to_string()
}

/// Render a writeup to HTML
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES);
    let events = transform_events(parser);
    let mut html = String::new();
    push_html(&mut html, events.into_iter());
    html
}

enum State {
    Normal,
    InCodeBlock { lang: Option<String>, content: String },
}

fn transform_events(parser: Parser<'_>) -> Vec<Event<'_>> {
    let mut events = Vec::new();
    let mut state = State::Normal;

    for event in parser {
        match state {
            State::Normal => match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(l) if !l.is_empty() => Some(l.to_string()),
                        _ => None,
                    };
                    state = State::InCodeBlock { lang, content: String::new() };
                }
                Event::Start(Tag::Link { dest_url, title, .. }) if is_external(&dest_url) => {
                    let mut html = format!(
                        r#"<a href="{}" target="_blank" rel="noopener noreferrer""#,
                        encode_url(&dest_url)
                    );
                    if !title.is_empty() {
                        html.push_str(&format!(r#" title="{}""#, escape_html(&title)));
                    }
                    html.push('>');
                    events.push(Event::Html(CowStr::from(html)));
                }
                Event::End(TagEnd::Link) => events.push(Event::Html(CowStr::from("</a>"))),
                Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
                other => events.push(other),
            },
            State::InCodeBlock { ref lang, ref mut content } => match event {
                Event::Text(t) => content.push_str(&t),
                Event::End(TagEnd::CodeBlock) => {
                    events.push(Event::Html(CowStr::from(highlight_code(content, lang.as_deref()))));
                    state = State::Normal;
                }
                _ => {}
            },
        }
    }

    events
}

fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn highlight_code(code: &str, lang: Option<&str>) -> String {
    let ss = syntax_set();
    let syntax = lang
        .and_then(|l| ss.find_syntax_by_token(l))
        .unwrap_or_else(|| ss.find_syntax_plain_text());

    theme()
        .and_then(|theme| highlighted_html_for_string(code, ss, syntax, theme).ok())
        .unwrap_or_else(|| format!("<pre><code>{}</code></pre>", escape_html(code)))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
