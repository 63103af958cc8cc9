//! HTML element classification used by the tokenizer and the renderer.

/// Void elements: never expanded into an open/close pair when written as `<x/>`.
const VOID_ELEMENTS: &[&str] = &[
    "br", "area", "base", "embed", "hr", "iframe", "img", "input",
    "link", "meta", "param", "source", "track",
];

/// Inline formatting elements. Wrapping unchanged text in one of these is
/// reported as `<ins class='mod'>` instead of a tag insert/delete pair.
const FORMATTING_ELEMENTS: &[&str] = &[
    "strong", "b", "i", "em", "big", "small", "u", "sub", "sup",
    "strike", "s", "span",
];

/// Tokens starting with one of these prefixes look like tags but are diffed
/// as content, so an image appears inside `<ins>`/`<del>` like a word.
const CONTENT_TAG_PREFIXES: &[&str] = &["<img"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|name| name.eq_ignore_ascii_case(tag))
}

pub fn is_formatting_element(tag: &str) -> bool {
    FORMATTING_ELEMENTS.iter().any(|name| name.eq_ignore_ascii_case(tag))
}

pub fn is_content_tag(token: &str) -> bool {
    CONTENT_TAG_PREFIXES.iter().any(|prefix| token.starts_with(prefix))
}
