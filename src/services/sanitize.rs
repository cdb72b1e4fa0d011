// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Markup sanitization for index-bound text fields.
//!
//! Pure functions, no state, never panic. The HTML path parses with a real
//! HTML parser and collects text nodes only, so no partial markup can ever
//! survive into the index.

use pulldown_cmark::{html, Options, Parser};
use scraper::Html;

/// How a registered field's raw value is cleaned before indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeMode {
    /// Pass through unchanged.
    None,
    /// Strip all markup and control characters, collapse whitespace.
    Html,
    /// Render Markdown to HTML first (tables, fenced code), then strip.
    Markdown,
    /// Apply the HTML path only when angle-bracket markup is detected.
    Auto,
}

/// Sanitize `text` according to `mode`. Returns an empty string rather than
/// failing; a sanitization fault never aborts document construction.
pub fn sanitize(text: &str, mode: SanitizeMode) -> String {
    match mode {
        SanitizeMode::None => text.to_string(),
        SanitizeMode::Html => strip_html(text),
        SanitizeMode::Markdown => strip_html(&render_markdown(text)),
        SanitizeMode::Auto => {
            if looks_like_markup(text) {
                strip_html(text)
            } else {
                text.to_string()
            }
        }
    }
}

/// Parse as HTML and keep only text nodes, skipping script/style bodies.
/// Control characters are dropped and whitespace collapsed.
fn strip_html(input: &str) -> String {
    let document = Html::parse_document(input);

    let mut text = String::new();
    for node in document.root_element().descendants() {
        let Some(content) = node.value().as_text() else {
            continue;
        };
        let inside_raw_text = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name()))
            .is_some_and(|name| name == "script" || name == "style");
        if inside_raw_text {
            continue;
        }
        let trimmed = content.trim();
        if trimmed.is_empty() {
            continue;
        }
        text.push(' ');
        text.extend(trimmed.chars().filter(|c| !c.is_control()));
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render Markdown to HTML with table and fenced-code support enabled.
fn render_markdown(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(input, options);
    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);
    rendered
}

/// Heuristic for the auto mode: a '<' immediately followed by a tag-ish
/// character, with a '>' somewhere after it.
fn looks_like_markup(text: &str) -> bool {
    let bytes = text.as_bytes();
    let has_open = bytes
        .windows(2)
        .any(|w| w[0] == b'<' && (w[1].is_ascii_alphabetic() || w[1] == b'/' || w[1] == b'!'));
    has_open && text.contains('>')
}
