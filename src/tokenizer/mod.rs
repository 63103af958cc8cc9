//! HTML-aware word splitter.
//!
//! Turns markup into an ordered list of tokens: words, whitespace runs, tags,
//! entities and single punctuation characters. Concatenating the tokens gives
//! back the input, except that non-void self-closing tags (`<td/>`) come out
//! as an open/close pair so content inserted "inside" them can be diffed.

pub mod blocks;
pub mod positions;

use std::mem;
use std::ops::Range;

use crate::error::DiffError;
use crate::html;
use crate::token;
use blocks::{BlockPattern, find_blocks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    Tag,
    Whitespace,
    Entity,
}

/// Character-driven state machine over one input text
pub struct Tokenizer<'a> {
    source: &'a str,
    /// Block ranges sorted by start, pairwise disjoint
    blocks: Vec<Range<usize>>,
    next_block: usize,
    /// End of the block currently being grouped
    block_end: Option<usize>,
    mode: Mode,
    current: String,
    tokens: Vec<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str, blocks: Vec<Range<usize>>) -> Self {
        Self {
            source,
            blocks,
            next_block: 0,
            block_end: None,
            mode: Mode::Text,
            current: String::new(),
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source
    pub fn tokenize(mut self) -> Vec<String> {
        for (index, c) in self.source.char_indices() {
            if self.consume_block(index, c) {
                continue;
            }
            match self.mode {
                Mode::Text => self.process_text(c),
                Mode::Tag => self.process_tag(c),
                Mode::Whitespace => self.process_whitespace(c),
                Mode::Entity => self.process_entity(c),
            }
        }
        self.flush();

        tracing::trace!(tokens = self.tokens.len(), bytes = self.source.len(), "tokenized");
        self.tokens
    }

    /// Inside a block every character joins the token in progress. Returns
    /// `true` when `c` was consumed that way.
    fn consume_block(&mut self, index: usize, c: char) -> bool {
        if self.block_end == Some(index) {
            self.block_end = None;
            self.flush();
        }

        while self.blocks.get(self.next_block).is_some_and(|b| b.start < index) {
            self.next_block += 1;
        }
        if self.block_end.is_none() {
            if let Some(block) = self.blocks.get(self.next_block).filter(|b| b.start == index) {
                self.block_end = Some(block.end);
                self.next_block += 1;
            }
        }

        if self.block_end.is_some() {
            self.current.push(c);
            self.mode = Mode::Text;
            return true;
        }
        false
    }

    fn process_text(&mut self, c: char) {
        match c {
            '<' => self.start(c, Mode::Tag),
            '&' => self.start(c, Mode::Entity),
            c if c.is_whitespace() => self.start(c, Mode::Whitespace),
            c if token::is_word_char(c) && self.continues_word() => self.current.push(c),
            // punctuation is never merged
            c => self.start(c, Mode::Text),
        }
    }

    fn process_tag(&mut self, c: char) {
        self.current.push(c);
        if c == '>' {
            self.flush_tag();
            self.mode = Mode::Text;
        }
    }

    fn process_whitespace(&mut self, c: char) {
        match c {
            '<' => self.start(c, Mode::Tag),
            '&' => self.start(c, Mode::Entity),
            c if c.is_whitespace() => self.current.push(c),
            c => self.start(c, Mode::Text),
        }
    }

    fn process_entity(&mut self, c: char) {
        match c {
            '<' => self.start(c, Mode::Tag),
            '&' => self.start(c, Mode::Entity),
            c if c.is_whitespace() => self.start(c, Mode::Whitespace),
            ';' => {
                self.current.push(c);
                self.flush_entity();
            }
            c if token::is_entity_char(c) => self.current.push(c),
            c => self.start(c, Mode::Text),
        }
    }

    fn continues_word(&self) -> bool {
        self.current.chars().last().is_none_or(token::is_word_char)
    }

    /// Flush the token in progress and begin a new one with `c`.
    fn start(&mut self, c: char, mode: Mode) {
        self.flush();
        self.current.push(c);
        self.mode = mode;
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.tokens.push(mem::take(&mut self.current));
        }
    }

    /// Non-void `<x/>` becomes `<x>` + `</x>`.
    fn flush_tag(&mut self) {
        let tag = mem::take(&mut self.current);
        if token::is_self_closing_tag(&tag) {
            if let Some(name) = token::tag_name(&tag).filter(|name| !html::is_void_element(name)) {
                let close = format!("</{}>", name);
                let open = format!("{}>", tag[..tag.len() - 2].trim_end());
                self.tokens.push(open);
                self.tokens.push(close);
                return;
            }
        }
        self.tokens.push(tag);
    }

    /// A whitespace entity right after whitespace joins it, so runs like
    /// `" &nbsp;"` stay one token.
    fn flush_entity(&mut self) {
        let entity = mem::take(&mut self.current);
        let follows_whitespace = self.tokens.last().is_some_and(|t| token::is_whitespace(t));
        if token::is_whitespace_entity(&entity) && follows_whitespace {
            if let Some(previous) = self.tokens.pop() {
                self.current = previous + &entity;
                self.mode = Mode::Whitespace;
                return;
            }
        }
        self.tokens.push(entity);
        self.mode = Mode::Text;
    }
}

/// Tokenize text without block expressions
pub fn tokenize(source: &str) -> Vec<String> {
    Tokenizer::new(source, Vec::new()).tokenize()
}

/// Tokenize text, keeping every block expression match as a single token
pub fn tokenize_with_blocks<P: BlockPattern>(source: &str, patterns: &[P]) -> Result<Vec<String>, DiffError> {
    let blocks = find_blocks(source, patterns)?;
    Ok(Tokenizer::new(source, blocks).tokenize())
}
