use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;

use super::Match;

/// Options for a single window search
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// How many consecutive tokens are hashed together as one comparison unit
    pub block_size: usize,
    pub repeating_words_accuracy: f64,
}

/// Finds the longest run of equal tokens between two ranges, comparing
/// windows of `block_size` tokens at a time.
///
/// Tokens must already be normalized (see `token::normalize_for_compare`).
pub struct MatchFinder<'t, 'a> {
    old_words: &'t [Cow<'a, str>],
    new_words: &'t [Cow<'a, str>],
    old_range: Range<usize>,
    new_range: Range<usize>,
    options: MatchOptions,
}

type Window<'t, 'a> = &'t [Cow<'a, str>];

impl<'t, 'a> MatchFinder<'t, 'a> {
    pub fn new(
        old_words: &'t [Cow<'a, str>],
        new_words: &'t [Cow<'a, str>],
        old_range: Range<usize>,
        new_range: Range<usize>,
        options: MatchOptions,
    ) -> Self {
        Self { old_words, new_words, old_range, new_range, options }
    }

    pub fn find_match(&self) -> Option<Match> {
        let block_size = self.options.block_size;
        if block_size == 0 {
            return None;
        }

        let mut word_indices = self.index_new_words();
        self.remove_repeating_words(&mut word_indices);
        if word_indices.is_empty() {
            return None;
        }

        let mut best_in_old = self.old_range.start;
        let mut best_in_new = self.new_range.start;
        let mut best_size = 0;

        // run length of consecutive window matches, keyed by the new-side
        // position of the window's last token
        let mut match_length_at: HashMap<usize, usize> = HashMap::new();

        for index_in_old in self.old_range.clone() {
            let Some(window) = window_ending_at(self.old_words, &self.old_range, index_in_old, block_size) else {
                continue;
            };

            let mut new_match_length_at = HashMap::new();
            if let Some(positions) = word_indices.get(window) {
                for &index_in_new in positions {
                    let previous = index_in_new
                        .checked_sub(1)
                        .and_then(|p| match_length_at.get(&p))
                        .copied()
                        .unwrap_or(0);
                    let length = previous + 1;
                    new_match_length_at.insert(index_in_new, length);

                    if length > best_size {
                        best_in_old = index_in_old + 2 - length - block_size;
                        best_in_new = index_in_new + 2 - length - block_size;
                        best_size = length;
                    }
                }
            }
            match_length_at = new_match_length_at;
        }

        if best_size == 0 {
            return None;
        }
        Some(Match::new(best_in_old, best_in_new, best_size + block_size - 1))
    }

    /// Map every full window in the new range to the positions of its last token.
    fn index_new_words(&self) -> HashMap<Window<'t, 'a>, Vec<usize>> {
        let mut indices: HashMap<Window<'t, 'a>, Vec<usize>> = HashMap::new();
        for index in self.new_range.clone() {
            if let Some(window) = window_ending_at(self.new_words, &self.new_range, index, self.options.block_size) {
                indices.entry(window).or_default().push(index);
            }
        }
        indices
    }

    /// Drop windows that occur too often. Fewer comparisons, at the price of
    /// reporting some repeated words as changed.
    fn remove_repeating_words(&self, indices: &mut HashMap<Window<'t, 'a>, Vec<usize>>) {
        let threshold = self.new_words.len() as f64 * self.options.repeating_words_accuracy;
        indices.retain(|_, positions| positions.len() as f64 <= threshold);
    }
}

fn window_ending_at<'t, 'a>(
    words: &'t [Cow<'a, str>],
    range: &Range<usize>,
    end: usize,
    block_size: usize,
) -> Option<Window<'t, 'a>> {
    let start = (end + 1).checked_sub(block_size)?;
    if start < range.start {
        return None;
    }
    Some(&words[start..=end])
}
