//! Word-level visual diff for HTML fragments.
//!
//! Both inputs are split into tokens (words, whitespace, tags, entities,
//! punctuation), the token streams are matched, and the result is rendered as
//! the new text with `<ins>`/`<del>` markers around changed content:
//!
//! ```
//! let html = htmldiff::diff("a b c", "a d c");
//! assert_eq!(html, "a <del class='diffmod'>b</del><ins class='diffmod'>d</ins> c");
//! ```

pub mod error;
pub mod html;
pub mod matcher;
pub mod operation;
pub mod render;
pub mod token;
pub mod tokenizer;

pub use error::{DiffError, ErrorKind, TextSide};
pub use matcher::Match;
pub use operation::{Action, Operation};
pub use tokenizer::blocks::BlockPattern;
pub use tokenizer::tokenize;

use matcher::{Matcher, remove_orphans};
use operation::build_operations;
use serde::{Deserialize, Serialize};
use tokenizer::tokenize_with_blocks;

/// Tuning knobs for one diff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// From 0 to 1. Lower values let the matcher skip tokens that occur in
    /// more than this share of the new text. 1 compares every token.
    pub repeating_words_accuracy: f64,
    /// From 0 to 1. A match shorter than this share of the changed text
    /// around it is merged into the surrounding replacement. 0 keeps all
    /// matches.
    pub orphan_match_threshold: f64,
    /// Treat every whitespace run as equal to every other
    pub ignore_whitespace_differences: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            repeating_words_accuracy: 1.0,
            orphan_match_threshold: 0.0,
            ignore_whitespace_differences: false,
        }
    }
}

impl DiffOptions {
    pub fn repeating_words_accuracy(&self) -> f64 {
        clamp_unit(self.repeating_words_accuracy)
    }

    pub fn orphan_match_threshold(&self) -> f64 {
        clamp_unit(self.orphan_match_threshold)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// One diff job: two texts, options and block expressions.
pub struct HtmlDiff<'a> {
    old: &'a str,
    new: &'a str,
    options: DiffOptions,
    blocks: Vec<Box<dyn BlockPattern + 'a>>,
}

impl<'a> HtmlDiff<'a> {
    pub fn new(old: &'a str, new: &'a str) -> Self {
        Self::with_options(old, new, DiffOptions::default())
    }

    pub fn with_options(old: &'a str, new: &'a str, options: DiffOptions) -> Self {
        Self { old, new, options, blocks: Vec::new() }
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut DiffOptions {
        &mut self.options
    }

    /// Keep every match of `pattern` as one token, so a change anywhere in
    /// it replaces the whole match. Patterns must not match overlapping text.
    pub fn add_block_expression(&mut self, pattern: impl BlockPattern + 'a) -> &mut Self {
        self.blocks.push(Box::new(pattern));
        self
    }

    /// Render the diff. Identical texts are returned unchanged without
    /// evaluating block expressions.
    pub fn build(&self) -> Result<String, DiffError> {
        if self.old == self.new {
            return Ok(self.new.to_string());
        }
        let (old_words, new_words) = self.tokens()?;
        Ok(render_diff(&old_words, &new_words, &self.options))
    }

    /// The two token streams, old first.
    pub fn tokens(&self) -> Result<(Vec<String>, Vec<String>), DiffError> {
        let old_words = tokenize_with_blocks(self.old, &self.blocks).map_err(|e| e.with_side(TextSide::Old))?;
        let new_words = tokenize_with_blocks(self.new, &self.blocks).map_err(|e| e.with_side(TextSide::New))?;
        Ok((old_words, new_words))
    }

    /// The edit script `build` renders.
    pub fn operations(&self) -> Result<Vec<Operation>, DiffError> {
        let (old_words, new_words) = self.tokens()?;
        Ok(diff_operations(&old_words, &new_words, &self.options))
    }
}

/// Diff two texts with default options.
pub fn diff(old: &str, new: &str) -> String {
    diff_with(old, new, &DiffOptions::default())
}

/// Diff two texts. Never fails: only block expressions can be misconfigured.
pub fn diff_with(old: &str, new: &str, options: &DiffOptions) -> String {
    if old == new {
        return new.to_string();
    }
    render_diff(&tokenize(old), &tokenize(new), options)
}

fn render_diff(old_words: &[String], new_words: &[String], options: &DiffOptions) -> String {
    let operations = diff_operations(old_words, new_words, options);
    render::render(&operations, old_words, new_words)
}

fn diff_operations(old_words: &[String], new_words: &[String], options: &DiffOptions) -> Vec<Operation> {
    let matcher = Matcher::new(old_words, new_words, options);
    let mut matches = matcher.matching_blocks();
    let found = matches.len();

    matches.push(Match::new(old_words.len(), new_words.len(), 0));
    let matches = remove_orphans(&matches, old_words, new_words, options.orphan_match_threshold());
    let operations = build_operations(&matches);

    tracing::debug!(
        old_tokens = old_words.len(),
        new_tokens = new_words.len(),
        granularity = matcher.granularity(),
        matches = found,
        orphans = found + 1 - matches.len(),
        operations = operations.len(),
        "diff computed"
    );
    operations
}
