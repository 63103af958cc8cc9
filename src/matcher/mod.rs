//! Token stream matching.
//!
//! Recursively partitions the old and new token streams around their longest
//! common runs, trying coarse windows first so dense matches beat fragmentary
//! ones.

mod finder;
mod orphans;

pub use finder::{MatchFinder, MatchOptions};
pub use orphans::remove_orphans;

use std::borrow::Cow;
use std::ops::Range;

use crate::DiffOptions;
use crate::token;

/// Largest window tried by the matcher. Larger windows are faster on long
/// texts and use more memory.
pub const MATCH_GRANULARITY_MAXIMUM: usize = 4;

/// `size` tokens starting at `start_in_old` equal `size` tokens starting at
/// `start_in_new` (after normalization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Match {
    pub start_in_old: usize,
    pub start_in_new: usize,
    pub size: usize,
}

impl Match {
    pub fn new(start_in_old: usize, start_in_new: usize, size: usize) -> Self {
        Self { start_in_old, start_in_new, size }
    }

    pub fn end_in_old(&self) -> usize {
        self.start_in_old + self.size
    }

    pub fn end_in_new(&self) -> usize {
        self.start_in_new + self.size
    }
}

/// Pending work for `Matcher::matching_blocks`
enum Work {
    Search { old: Range<usize>, new: Range<usize> },
    Emit(Match),
}

/// Finds all matching blocks between two token streams
pub struct Matcher<'a> {
    old_words: Vec<Cow<'a, str>>,
    new_words: Vec<Cow<'a, str>>,
    granularity: usize,
    repeating_words_accuracy: f64,
}

impl<'a> Matcher<'a> {
    pub fn new(old_words: &'a [String], new_words: &'a [String], options: &DiffOptions) -> Self {
        let ignore_whitespace = options.ignore_whitespace_differences;
        let normalize = |words: &'a [String]| -> Vec<Cow<'a, str>> {
            words
                .iter()
                .map(|w| token::normalize_for_compare(w, ignore_whitespace))
                .collect()
        };

        Self {
            granularity: MATCH_GRANULARITY_MAXIMUM.min(old_words.len().min(new_words.len())),
            old_words: normalize(old_words),
            new_words: normalize(new_words),
            repeating_words_accuracy: options.repeating_words_accuracy(),
        }
    }

    /// Window size the search starts with
    pub fn granularity(&self) -> usize {
        self.granularity
    }

    /// All matches over the full streams, ordered by position. Does not
    /// include the end sentinel.
    pub fn matching_blocks(&self) -> Vec<Match> {
        let mut blocks = Vec::new();
        let mut stack = vec![Work::Search {
            old: 0..self.old_words.len(),
            new: 0..self.new_words.len(),
        }];

        // Same order as recursing left, emitting, then recursing right.
        while let Some(work) = stack.pop() {
            match work {
                Work::Emit(found) => blocks.push(found),
                Work::Search { old, new } => {
                    let Some(found) = self.find_match(old.clone(), new.clone()) else {
                        continue;
                    };
                    tracing::trace!(
                        old = found.start_in_old,
                        new = found.start_in_new,
                        size = found.size,
                        "match"
                    );

                    if found.end_in_old() < old.end && found.end_in_new() < new.end {
                        stack.push(Work::Search {
                            old: found.end_in_old()..old.end,
                            new: found.end_in_new()..new.end,
                        });
                    }
                    stack.push(Work::Emit(found));
                    if old.start < found.start_in_old && new.start < found.start_in_new {
                        stack.push(Work::Search {
                            old: old.start..found.start_in_old,
                            new: new.start..found.start_in_new,
                        });
                    }
                }
            }
        }
        blocks
    }

    /// Longest match in the given ranges, trying the largest window first.
    pub fn find_match(&self, old: Range<usize>, new: Range<usize>) -> Option<Match> {
        (1..=self.granularity).rev().find_map(|block_size| {
            let options = MatchOptions {
                block_size,
                repeating_words_accuracy: self.repeating_words_accuracy,
            };
            MatchFinder::new(&self.old_words, &self.new_words, old.clone(), new.clone(), options).find_match()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn blocks(old: &str, new: &str, options: &DiffOptions) -> Vec<Match> {
        let old = tokenize(old);
        let new = tokenize(new);
        Matcher::new(&old, &new, options).matching_blocks()
    }

    #[test]
    fn test_identical_streams_match_whole() {
        let found = blocks("a b c", "a b c", &DiffOptions::default());
        assert_eq!(found, vec![Match::new(0, 0, 5)]);
    }

    #[test]
    fn test_insert_in_middle() {
        // a _ c  vs  a _ b _ c
        let found = blocks("a c", "a b c", &DiffOptions::default());
        assert_eq!(found, vec![Match::new(0, 0, 2), Match::new(2, 4, 1)]);
    }

    #[test]
    fn test_formatting_inserted() {
        // a _ b _ c  vs  a _ <strong> b </strong> _ c
        let found = blocks("a b c", "a <strong>b</strong> c", &DiffOptions::default());
        assert_eq!(
            found,
            vec![Match::new(0, 0, 2), Match::new(2, 3, 1), Match::new(3, 5, 2)]
        );
    }

    #[test]
    fn test_attributes_are_ignored() {
        let found = blocks("<a title='xx'>test</a>", "<a title='yy'>test</a>", &DiffOptions::default());
        assert_eq!(found, vec![Match::new(0, 0, 3)]);
    }

    #[test]
    fn test_whitespace_differences() {
        let strict = blocks("a  b", "a b", &DiffOptions::default());
        assert_eq!(strict, vec![Match::new(0, 0, 1), Match::new(2, 2, 1)]);

        let options = DiffOptions { ignore_whitespace_differences: true, ..DiffOptions::default() };
        let relaxed = blocks("a  b", "a b", &options);
        assert_eq!(relaxed, vec![Match::new(0, 0, 3)]);
    }

    #[test]
    fn test_empty_side_has_no_matches() {
        assert!(blocks("", "a b", &DiffOptions::default()).is_empty());
        assert!(blocks("a b", "", &DiffOptions::default()).is_empty());
    }

    #[test]
    fn test_granularity_is_capped() {
        let old = tokenize("a b c d e f");
        let new = tokenize("a");
        assert_eq!(Matcher::new(&old, &new, &DiffOptions::default()).granularity(), 1);
        let new = tokenize("a b c d e");
        assert_eq!(Matcher::new(&old, &new, &DiffOptions::default()).granularity(), MATCH_GRANULARITY_MAXIMUM);
    }

    #[test]
    fn test_long_input_does_not_recurse() {
        // alternating changes produce a deep partition
        let old: String = (0..2000).map(|i| format!("w{} ", i)).collect();
        let new: String = (0..2000)
            .map(|i| if i % 2 == 0 { format!("w{} ", i) } else { format!("x{} ", i) })
            .collect();
        let found = blocks(&old, &new, &DiffOptions::default());
        assert!(found.len() >= 1000);
        assert!(found.windows(2).all(|w| w[0].end_in_old() <= w[1].start_in_old));
    }
}
