//! Token classification.
//!
//! Tokens are stored as plain strings. Their kind is recomputed from the text
//! wherever it is needed, so the tokenizer, matcher and renderer never have to
//! agree on a stored tag.

use std::borrow::Cow;

use crate::html;

/// Character references that render as whitespace.
const WHITESPACE_ENTITIES: &[&str] = &["&nbsp;", "&#160;", "&#xa0;"];

/// Kind of a token, derived from its text
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Word,
    Whitespace,
    Tag,
    Entity,
    Other,
}

pub fn classify(token: &str) -> TokenKind {
    if is_tag(token) {
        TokenKind::Tag
    } else if is_whitespace(token) {
        TokenKind::Whitespace
    } else if is_entity(token) {
        TokenKind::Entity
    } else if !token.is_empty() && token.chars().all(is_word_char) {
        TokenKind::Word
    } else {
        TokenKind::Other
    }
}

/// Characters that join into a single word token
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '#' || c == '@'
}

/// Characters allowed between `&` and `;`
pub fn is_entity_char(c: char) -> bool {
    is_word_char(c) || c == '-'
}

/// `<...>` with no `>` inside, surrounding whitespace allowed. Does not
/// exclude content tags like `<img>`.
fn is_tag_shaped(token: &str) -> bool {
    let t = token.trim();
    t.len() >= 3 && t.starts_with('<') && t.ends_with('>') && !t[1..t.len() - 1].contains('>')
}

/// Whether the renderer and matcher treat the token as markup.
pub fn is_tag(token: &str) -> bool {
    !html::is_content_tag(token) && is_tag_shaped(token)
}

pub fn is_closing_tag(token: &str) -> bool {
    is_tag(token) && token.trim_start().starts_with("</")
}

pub fn is_opening_tag(token: &str) -> bool {
    is_tag(token) && !token.trim_start().starts_with("</")
}

pub fn is_self_closing_tag(token: &str) -> bool {
    is_tag_shaped(token) && token.trim_end().ends_with("/>")
}

/// Element name of a tag token, as written (compare with `eq_ignore_ascii_case`).
///
/// Returns `None` for non-tags, unterminated tags, `</>` and tags whose name
/// does not directly follow the bracket (`< div>`).
pub fn tag_name(token: &str) -> Option<&str> {
    let t = token.trim();
    if !is_tag_shaped(t) {
        return None;
    }
    let inner = &t[1..t.len() - 1];
    let inner = inner.strip_prefix('/').unwrap_or(inner);
    let end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = &inner[..end];
    if name.is_empty() { None } else { Some(name) }
}

/// Whitespace characters and whitespace entities only, e.g. `" "`, `"\n  "`, `" &nbsp;"`.
pub fn is_whitespace(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let mut rest = token;
    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }
        match WHITESPACE_ENTITIES.iter().find(|e| starts_with_ignore_case(rest, e)) {
            Some(entity) => rest = &rest[entity.len()..],
            None => return false,
        }
    }
    true
}

pub fn is_whitespace_entity(token: &str) -> bool {
    WHITESPACE_ENTITIES.iter().any(|e| e.eq_ignore_ascii_case(token))
}

/// A complete character reference like `&amp;` or `&#169;`
pub fn is_entity(token: &str) -> bool {
    token.len() > 2 && token.starts_with('&') && token.ends_with(';')
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Reduce a tag to `<name>`, `</name>` or `<name/>`.
pub fn strip_tag_attributes(token: &str) -> Cow<'_, str> {
    let Some(name) = tag_name(token) else {
        return Cow::Borrowed(token);
    };
    let trimmed = token.trim();
    let slash = if trimmed.starts_with("</") { "/" } else { "" };
    let close = if trimmed.ends_with("/>") { "/>" } else { ">" };
    Cow::Owned(format!("<{slash}{name}{close}"))
}

/// Text used for equality and hashing in the matcher. Rendering always uses
/// the original token.
pub fn normalize_for_compare(token: &str, ignore_whitespace: bool) -> Cow<'_, str> {
    if is_tag(token) {
        strip_tag_attributes(token)
    } else if ignore_whitespace && is_whitespace(token) {
        Cow::Borrowed(" ")
    } else {
        Cow::Borrowed(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_name() {
        assert_eq!(tag_name(""), None);
        assert_eq!(tag_name("test"), None);
        assert_eq!(tag_name("<test"), None);
        assert_eq!(tag_name("< div >"), None);
        assert_eq!(tag_name("</ div>"), None);
        assert_eq!(tag_name("</>"), None);
        assert_eq!(tag_name("<div>"), Some("div"));
        assert_eq!(tag_name(" \t<div> \t"), Some("div"));
        assert_eq!(tag_name("<DIV>"), Some("DIV"));
        assert_eq!(tag_name("</div>"), Some("div"));
        assert_eq!(tag_name("<div attr='test'>"), Some("div"));
        assert_eq!(tag_name("<div attr=test>"), Some("div"));
        assert_eq!(tag_name("<div/>"), Some("div"));
        assert_eq!(tag_name("<div    />"), Some("div"));
    }

    #[test]
    fn test_is_tag() {
        assert!(is_tag("<p>"));
        assert!(is_tag("</p>"));
        assert!(is_tag("<br/>"));
        assert!(!is_tag("<>"));
        assert!(!is_tag("<td>n a</td>"));
        assert!(!is_tag("<img src='logo.jpg'/>"));
        assert!(!is_tag("word"));
    }

    #[test]
    fn test_opening_and_closing() {
        assert!(is_opening_tag("<b>"));
        assert!(!is_opening_tag("</b>"));
        assert!(is_closing_tag("</b>"));
        assert!(is_self_closing_tag("<td/>"));
        assert!(is_self_closing_tag("<img src='a.png' />"));
        assert!(!is_self_closing_tag("<td>"));
    }

    #[test]
    fn test_whitespace() {
        assert!(is_whitespace(" "));
        assert!(is_whitespace("\n\t "));
        assert!(is_whitespace("&nbsp;"));
        assert!(is_whitespace(" &NBSP;&#160;"));
        assert!(!is_whitespace(""));
        assert!(!is_whitespace(" a"));
        assert!(!is_whitespace("&amp;"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("hello"), TokenKind::Word);
        assert_eq!(classify("#tag"), TokenKind::Word);
        assert_eq!(classify("  "), TokenKind::Whitespace);
        assert_eq!(classify("<a href='x'>"), TokenKind::Tag);
        assert_eq!(classify("&amp;"), TokenKind::Entity);
        assert_eq!(classify(","), TokenKind::Other);
        assert_eq!(classify("中"), TokenKind::Other);
    }

    #[test]
    fn test_strip_attributes() {
        assert_eq!(strip_tag_attributes("<a title='xx'>"), "<a>");
        assert_eq!(strip_tag_attributes("</a>"), "</a>");
        assert_eq!(strip_tag_attributes("<br class='x' />"), "<br/>");
        assert_eq!(strip_tag_attributes("word"), "word");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_for_compare("<a title='yy'>", false), "<a>");
        assert_eq!(normalize_for_compare("\n\n", true), " ");
        assert_eq!(normalize_for_compare("\n\n", false), "\n\n");
        // content tags keep their attributes so a changed image source is visible
        assert_eq!(
            normalize_for_compare("<img src='a.png'>", false),
            "<img src='a.png'>"
        );
    }
}
