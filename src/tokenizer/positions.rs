//! Source positions for diagnostics.
//!
//! The tokenizer works on byte offsets. Diagnostics want line and column, so
//! offsets are converted only when an error is reported.

/// Position in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset in source
    pub byte: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters)
    pub col: usize,
}

/// Span in source text (a range from start position to end position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Build a span from a byte range of `source`.
    pub fn from_bytes(source: &str, start: usize, end: usize) -> Self {
        Self {
            start: position_at(source, start),
            end: position_at(source, end),
        }
    }
}

/// Convert a byte offset to a line/column position.
///
/// Offsets past the end are clamped; offsets inside a multi-byte character
/// resolve to the start of that character.
pub fn position_at(source: &str, byte_offset: usize) -> Position {
    let mut byte = byte_offset.min(source.len());
    while !source.is_char_boundary(byte) {
        byte -= 1;
    }
    let before = &source[..byte];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let col = before[line_start..].chars().count();
    Position { byte, line, col }
}
