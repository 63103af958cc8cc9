use crate::tokenizer::positions::Span;

/// Kind of diff error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Two block expression matches share characters
    OverlappingBlocks,
}

/// Which input text a diagnostic points into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSide {
    Old,
    New,
}

/// Configuration error raised by `HtmlDiff::build` before any output is produced.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct DiffError {
    pub kind: ErrorKind,
    pub message: String,
    /// Display form of the offending block expression
    pub pattern: String,
    /// Input text the spans refer to, when known
    pub side: Option<TextSide>,
    /// Where the overlapping match starts in the input text
    pub span: Span,
    /// The earlier match it collides with
    pub related_span: Option<Span>,
    pub help: Option<String>,
}

impl DiffError {
    pub fn overlapping_blocks(pattern: impl Into<String>, span: Span) -> Self {
        let pattern = pattern.into();
        Self {
            kind: ErrorKind::OverlappingBlocks,
            message: format!(
                "block expressions match overlapping text; current expression: {}",
                pattern
            ),
            pattern,
            side: None,
            span,
            related_span: None,
            help: None,
        }
    }

    pub fn with_side(mut self, side: TextSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Add a related span (the match this one overlaps)
    pub fn with_related(mut self, span: Span) -> Self {
        self.related_span = Some(span);
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the error with source context
    pub fn render(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, true)
    }

    fn render_inner(&self, source: &str, filename: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let mut output = String::new();
        output.push('\n');

        let line = self.span.start.line + 1;
        let col = self.span.start.col + 1;
        output.push_str(&format!(" {}file:{} {}:{}:{}\n", dim, reset, filename, line, col));
        output.push_str(&format!("{}error:{} {}\n", red, reset, self.message));

        let line_num_width = format!("{}", line).len().max(2);

        if let Some(ref related) = self.related_span {
            output.push_str(&snippet(source, related, "first matched here", dim, dim, reset, line_num_width));
        }
        output.push_str(&snippet(source, &self.span, "", red, dim, reset, line_num_width));

        if let Some(ref help) = self.help {
            output.push('\n');
            for (i, help_line) in help.lines().enumerate() {
                if i == 0 {
                    output.push_str(&format!(" {}help:{} {}\n", cyan, reset, help_line));
                } else {
                    output.push_str(&format!("       {}\n", help_line));
                }
            }
        }

        output.push('\n');
        output
    }
}

/// One source line with a caret underline beneath `span`.
fn snippet(
    source: &str,
    span: &Span,
    label: &str,
    caret_color: &str,
    dim: &str,
    reset: &str,
    width: usize,
) -> String {
    let Some(source_line) = source.lines().nth(span.start.line) else {
        return String::new();
    };
    let line_no = span.start.line + 1;
    let underline_len = if span.end.line == span.start.line {
        span.end.col.saturating_sub(span.start.col).max(1)
    } else {
        source_line.chars().count().saturating_sub(span.start.col).max(1)
    };
    let label = if label.is_empty() { String::new() } else { format!(" {}", label) };

    format!(
        "{dim}{:>width$} |{reset}\n{dim}{:>width$} |{reset} {}\n{dim}{:>width$} |{reset} {}{caret_color}{}{}{reset}\n",
        "",
        line_no,
        source_line,
        "",
        " ".repeat(span.start.col),
        "^".repeat(underline_len),
        label,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ends_with_pattern() {
        let source = "a 1 Jan 2016 b";
        let err = DiffError::overlapping_blocks(r"\d+ Jan \d+", Span::from_bytes(source, 2, 12));
        assert_eq!(err.kind, ErrorKind::OverlappingBlocks);
        assert!(err.to_string().ends_with(r"\d+ Jan \d+"));
    }

    #[test]
    fn test_render_points_at_span() {
        let source = "first line\nsee 1 Jan 2016 here";
        let err = DiffError::overlapping_blocks("Jan", Span::from_bytes(source, 17, 20))
            .with_related(Span::from_bytes(source, 15, 25))
            .with_help("make the expressions match disjoint text");
        let rendered = err.render(source, "old.html");

        assert!(rendered.contains("file: old.html:2:7"));
        assert!(rendered.contains(" 2 | see 1 Jan 2016 here"));
        assert!(rendered.contains("      ^^^\n"));
        assert!(rendered.contains("first matched here"));
        assert!(rendered.contains("help: make the expressions match disjoint text"));
        assert!(!rendered.contains('\x1b'));
    }

    #[test]
    fn test_render_color() {
        let source = "x";
        let err = DiffError::overlapping_blocks("x", Span::from_bytes(source, 0, 1));
        assert!(err.render_color(source, "new.html").contains("\x1b[1;31merror:"));
    }
}
