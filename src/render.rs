//! Output rendering.
//!
//! Equal ranges are copied from the new text. Inserted and deleted ranges are
//! wrapped in `<ins>`/`<del>`, but only around runs of non-tag tokens so the
//! markers never straddle element boundaries. Inline formatting tags that
//! were added or removed around unchanged text get an `<ins class='mod'>`
//! marker instead of being wrapped themselves.

use crate::html;
use crate::operation::{Action, Operation};
use crate::token;

/// Marker opened right after an added or removed formatting tag
const FORMAT_CHANGE_OPEN: &str = "<ins class='mod'>";
/// Closes `FORMAT_CHANGE_OPEN`
const FORMAT_CHANGE_CLOSE: &str = "</ins>";

const CLASS_INSERTED: &str = "diffins";
const CLASS_DELETED: &str = "diffdel";
const CLASS_MODIFIED: &str = "diffmod";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WrapTag {
    Ins,
    Del,
}

impl WrapTag {
    fn as_str(&self) -> &'static str {
        match self {
            WrapTag::Ins => "ins",
            WrapTag::Del => "del",
        }
    }
}

/// Where the formatting marker goes relative to the tag run
enum Injection {
    Before(&'static str),
    After(&'static str),
}

/// Render state for one diff. The formatting stack is shared across all
/// operations so a marker opened by one insert can be closed by a later one.
pub struct Renderer<'w> {
    old_words: &'w [String],
    new_words: &'w [String],
    output: String,
    /// Opening formatting tags whose marker has not been closed yet
    special_tags: Vec<&'w str>,
}

impl<'w> Renderer<'w> {
    pub fn new(old_words: &'w [String], new_words: &'w [String]) -> Self {
        Self {
            old_words,
            new_words,
            output: String::new(),
            special_tags: Vec::new(),
        }
    }

    pub fn render(mut self, operations: &[Operation]) -> String {
        for operation in operations {
            tracing::trace!(?operation, "render");
            match operation.action {
                Action::Equal => {
                    for word in operation.new_slice(self.new_words) {
                        self.output.push_str(word);
                    }
                }
                Action::Insert => {
                    self.insert_tag(WrapTag::Ins, CLASS_INSERTED, operation.new_slice(self.new_words));
                }
                Action::Delete => {
                    self.insert_tag(WrapTag::Del, CLASS_DELETED, operation.old_slice(self.old_words));
                }
                Action::Replace => {
                    self.insert_tag(WrapTag::Del, CLASS_MODIFIED, operation.old_slice(self.old_words));
                    self.insert_tag(WrapTag::Ins, CLASS_MODIFIED, operation.new_slice(self.new_words));
                }
            }
        }
        self.output
    }

    /// Emit `words` as alternating wrapped text runs and bare tag runs.
    fn insert_tag(&mut self, tag: WrapTag, css_class: &str, words: &'w [String]) {
        let mut rest = words;

        while !rest.is_empty() {
            let text_len = leading_run(rest, |w| !token::is_tag(w));
            if text_len > 0 {
                self.wrap_text(tag, css_class, &rest[..text_len]);
            }
            rest = &rest[text_len..];
            let Some(first) = rest.first() else {
                break;
            };

            // last tag of the run, before any deleted formatting tags are skipped
            let last_tag = &rest[leading_run(rest, token::is_tag) - 1];
            let mut injection = None;

            if is_formatting_open(first) {
                self.special_tags.push(first);
                injection = Some(Injection::After(FORMAT_CHANGE_OPEN));
                if tag == WrapTag::Del {
                    rest = &rest[leading_run(rest, is_formatting_open)..];
                }
            } else if is_formatting_close(first) {
                if let Some(opening) = self.special_tags.pop() {
                    if same_element(opening, last_tag) {
                        injection = Some(Injection::Before(FORMAT_CHANGE_CLOSE));
                    } else {
                        // belongs to an enclosing scope
                        self.special_tags.push(opening);
                    }
                }
                if tag == WrapTag::Del {
                    rest = &rest[leading_run(rest, is_formatting_close)..];
                }
            }

            if rest.is_empty() && injection.is_none() {
                break;
            }

            let tags_len = leading_run(rest, token::is_tag);
            if let Some(Injection::Before(marker)) = injection {
                self.output.push_str(marker);
            }
            for word in &rest[..tags_len] {
                self.output.push_str(word);
            }
            if let Some(Injection::After(marker)) = injection {
                self.output.push_str(marker);
            }
            rest = &rest[tags_len..];
        }
    }

    /// `<tag class='css'>text</tag>`. A single leading space becomes `&nbsp;`
    /// so a whitespace-only change stays visible.
    fn wrap_text(&mut self, tag: WrapTag, css_class: &str, words: &[String]) {
        let name = tag.as_str();
        self.output.push_str(&format!("<{name} class='{css_class}'>"));
        for (i, word) in words.iter().enumerate() {
            if i == 0 && word == " " {
                self.output.push_str("&nbsp;");
            } else {
                self.output.push_str(word);
            }
        }
        self.output.push_str(&format!("</{name}>"));
    }
}

/// Render `operations` against the two token streams.
pub fn render(operations: &[Operation], old_words: &[String], new_words: &[String]) -> String {
    Renderer::new(old_words, new_words).render(operations)
}

fn leading_run(words: &[String], predicate: impl Fn(&str) -> bool) -> usize {
    words.iter().position(|w| !predicate(w.as_str())).unwrap_or(words.len())
}

fn is_formatting_open(word: &str) -> bool {
    token::is_opening_tag(word)
        && !token::is_self_closing_tag(word)
        && token::tag_name(word).is_some_and(html::is_formatting_element)
}

fn is_formatting_close(word: &str) -> bool {
    token::is_closing_tag(word) && token::tag_name(word).is_some_and(html::is_formatting_element)
}

fn same_element(a: &str, b: &str) -> bool {
    match (token::tag_name(a), token::tag_name(b)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}
