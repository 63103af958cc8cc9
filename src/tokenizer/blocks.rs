//! Block expressions: caller-supplied patterns whose matches are kept as one
//! atomic token.

use std::ops::Range;

use regex::Regex;

use crate::error::DiffError;
use crate::tokenizer::positions::Span;

/// A pattern that can be matched against a whole input text.
pub trait BlockPattern {
    /// Ordered, non-overlapping byte ranges matched in `text`.
    fn find_spans(&self, text: &str) -> Vec<Range<usize>>;

    /// Pattern text shown in diagnostics.
    fn describe(&self) -> String;
}

impl BlockPattern for Regex {
    fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        self.find_iter(text).map(|m| m.range()).collect()
    }

    fn describe(&self) -> String {
        self.as_str().to_string()
    }
}

impl<T: BlockPattern + ?Sized> BlockPattern for &T {
    fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        (**self).find_spans(text)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: BlockPattern + ?Sized> BlockPattern for Box<T> {
    fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        (**self).find_spans(text)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Evaluate every pattern against `text` and return the matched ranges sorted
/// by start. Empty matches are skipped.
///
/// Fails when two ranges share a byte, whether they come from the same
/// pattern or from different ones. The error names the later-added pattern.
pub fn find_blocks<P: BlockPattern>(text: &str, patterns: &[P]) -> Result<Vec<Range<usize>>, DiffError> {
    let mut found: Vec<(Range<usize>, usize)> = Vec::new();
    for (index, pattern) in patterns.iter().enumerate() {
        found.extend(
            pattern
                .find_spans(text)
                .into_iter()
                .filter(|span| !span.is_empty())
                .map(|span| (span, index)),
        );
    }
    found.sort_by_key(|(span, index)| (span.start, *index));

    for pair in found.windows(2) {
        let (first, first_index) = &pair[0];
        let (second, second_index) = &pair[1];
        if second.start < first.end {
            let (offender, offender_index, other) = if second_index >= first_index {
                (second, *second_index, first)
            } else {
                (first, *first_index, second)
            };
            return Err(DiffError::overlapping_blocks(
                patterns[offender_index].describe(),
                Span::from_bytes(text, offender.start, offender.end),
            )
            .with_related(Span::from_bytes(text, other.start, other.end))
            .with_help("block expressions must match disjoint parts of the text"));
        }
    }

    tracing::trace!(blocks = found.len(), "block expressions evaluated");
    Ok(found.into_iter().map(|(span, _)| span).collect())
}
