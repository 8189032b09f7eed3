//! Delimited block recognition shared by fences and container extensions.
//!
//! A delimited block opens with a marker on its first line, optionally
//! followed by parameters, and ends either at a matching closing marker or
//! where the indentation of its body gives out. Fenced code, `:::`
//! containers, colon fences, admonitions, front matter and `$$` math all use
//! [`ContainerMatcher`] to find their extent; they differ only in the tokens
//! they emit.
use crate::{
    BlockState, ParentType, ScopedState,
    common::utils::{is_space, signed},
};

/// How an opening marker is recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// A run of one of these bytes. The closing run must repeat the byte that
    /// opened the block.
    Run(Vec<u8>),
    /// A repeated string, counted in whole repetitions.
    Pattern(String),
    /// One of a fixed set of markers, longest match first.
    Fixed(Vec<String>),
}

/// How the end of the body is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closing {
    /// A line holding at least as many marker units as the opener, indented
    /// less than four columns, followed only by whitespace.
    Marker,
    /// The body is every following line indented to the body indent. A
    /// non-blank under-indented line or two consecutive under-indented lines
    /// end it.
    Indent,
}

/// A recognized opening line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opening {
    pub line: usize,
    /// Byte offset of the marker.
    pub start: usize,
    /// Byte offset just past the marker.
    pub marker_end: usize,
    /// The marker text as written.
    pub markup: String,
    /// Marker units: bytes for [`Marker::Run`], repetitions for
    /// [`Marker::Pattern`], 1 for [`Marker::Fixed`].
    pub count: usize,
    /// Rest of the line after the marker, untrimmed.
    pub params: String,
    /// Indent the body must reach.
    pub body_indent: isize,
}

/// Where a delimited block ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Close {
    /// The closing marker line, or the first line after an auto-closed body.
    pub line: usize,
    /// A closing marker was found.
    pub explicit: bool,
    /// Closing marker text, or the opening markup when auto-closed.
    pub markup: String,
}

impl Close {
    /// First line after the block.
    #[must_use]
    pub fn next_line(&self) -> usize {
        self.line + usize::from(self.explicit)
    }

    /// Line range for the closing token.
    #[must_use]
    pub fn map(&self) -> [usize; 2] {
        if self.explicit {
            [self.line, self.line + 1]
        } else {
            [self.line.saturating_sub(1), self.line]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMatcher {
    pub marker: Marker,
    pub min_count: usize,
    pub closing: Closing,
}

impl ContainerMatcher {
    #[must_use]
    pub fn new(marker: Marker, min_count: usize, closing: Closing) -> Self {
        Self {
            marker,
            min_count,
            closing,
        }
    }

    /// Count whole marker units at `start`: returns the marker end and the
    /// unit count.
    fn scan_units(
        state: &BlockState<'_>,
        start: usize,
        max: usize,
        unit: &[u8],
    ) -> (usize, usize) {
        let len = unit.len().max(1);
        let mut pos = start;
        while pos < max && state.byte(pos) == unit.get((pos - start) % len).copied() {
            pos += 1;
        }
        let count = (pos - start) / len;
        (pos - (pos - start) % len, count)
    }

    /// Recognize an opening marker at `line`.
    ///
    /// `validate` sees the candidate and may reject it (e.g. a fence whose
    /// info string contains a backtick, a container with the wrong name).
    pub fn open(
        &self,
        state: &BlockState<'_>,
        line: usize,
        validate: impl Fn(&Opening) -> bool,
    ) -> Option<Opening> {
        if state.is_code_block(line) {
            return None;
        }
        let start = state.lines.start(line);
        let max = state.lines.end(line);
        let first = state.byte(start)?;

        let (marker_end, count, correction) = match &self.marker {
            Marker::Run(bytes) => {
                if !bytes.contains(&first) {
                    return None;
                }
                let (end, count) = Self::scan_units(state, start, max, &[first]);
                (end, count, 0)
            }
            Marker::Pattern(pattern) => {
                if pattern.as_bytes().first() != Some(&first) {
                    return None;
                }
                let (end, count) = Self::scan_units(state, start, max, pattern.as_bytes());
                (end, count, 0)
            }
            Marker::Fixed(markers) => {
                let text = state.slice(start, max);
                let shortest = markers.iter().map(String::len).min().unwrap_or_default();
                let matched = markers
                    .iter()
                    .filter(|marker| text.starts_with(marker.as_str()))
                    .max_by_key(|marker| marker.len())?;
                (
                    start + matched.len(),
                    1,
                    signed(shortest) - signed(matched.len()),
                )
            }
        };
        if count < self.min_count {
            return None;
        }

        let body_indent = match self.closing {
            Closing::Marker => state.blk_indent,
            Closing::Indent => {
                let body_start = state.skip_spaces(marker_end);
                state.blk_indent + signed(body_start - start) + correction
            }
        };
        let opening = Opening {
            line,
            start,
            marker_end,
            markup: state.slice(start, marker_end).to_string(),
            count,
            params: state.slice(marker_end, max).to_string(),
            body_indent,
        };
        validate(&opening).then_some(opening)
    }

    /// Whether `line` closes the block opened by `opening`; returns the
    /// closing marker text.
    #[must_use]
    pub fn closing_marker(&self, state: &BlockState<'_>, line: usize, opening: &Opening) -> Option<String> {
        if self.closing != Closing::Marker {
            return None;
        }
        let start = state.lines.start(line);
        let max = state.lines.end(line);
        let unit: &[u8] = match &self.marker {
            Marker::Run(_) => opening.markup.as_bytes().get(..1)?,
            Marker::Pattern(pattern) => pattern.as_bytes(),
            Marker::Fixed(_) => opening.markup.as_bytes(),
        };
        if state.byte(start) != unit.first().copied() {
            return None;
        }
        if state.is_code_block(line) {
            return None;
        }
        let (end, count) = Self::scan_units(state, start, max, unit);
        if count < opening.count {
            return None;
        }
        if state.skip_spaces(end) < max {
            return None;
        }
        Some(state.slice(start, end).to_string())
    }

    /// Find where the block opened by `opening` ends, scanning no further
    /// than `end_line`.
    #[must_use]
    pub fn find_close(&self, state: &BlockState<'_>, opening: &Opening, end_line: usize) -> Close {
        let mut next_line = opening.line;
        let mut was_under_indented = false;
        loop {
            next_line += 1;
            if next_line >= end_line {
                break;
            }
            let start = state.lines.start(next_line);
            let max = state.lines.end(next_line);
            let indent = state.lines.indent(next_line);
            match self.closing {
                Closing::Marker => {
                    if start < max && indent < state.blk_indent {
                        break;
                    }
                    if let Some(markup) = self.closing_marker(state, next_line, opening) {
                        return Close {
                            line: next_line,
                            explicit: true,
                            markup,
                        };
                    }
                }
                Closing::Indent => {
                    let under_indented = indent < opening.body_indent;
                    if under_indented && was_under_indented {
                        break;
                    }
                    was_under_indented = under_indented;
                    if start < max && under_indented {
                        break;
                    }
                }
            }
        }
        Close {
            line: next_line.min(end_line),
            explicit: false,
            markup: opening.markup.clone(),
        }
    }

    /// Narrow the state to the body of a nested block.
    ///
    /// Lazy continuation can never run past the close, the parent type is
    /// switched and the block indent becomes the body indent. Everything is
    /// restored when the returned guard drops.
    pub fn body_scope<'s, 'a>(
        state: &'s mut BlockState<'a>,
        opening: &Opening,
        close: &Close,
        parent: ParentType,
    ) -> ScopedState<'s, 'a> {
        let mut scope = ScopedState::new(state);
        scope.line_max = close.line;
        scope.parent_type = parent;
        scope.blk_indent = opening.body_indent;
        scope
    }

    /// Body lines verbatim, with the opener's indentation removed.
    #[must_use]
    pub fn verbatim(state: &BlockState<'_>, opening: &Opening, close: &Close) -> String {
        state.get_lines(
            opening.line + 1,
            close.line,
            state.lines.indent(opening.line),
            true,
        )
    }
}

/// Whether `text` is empty or whitespace only.
pub(crate) fn is_blank(text: &str) -> bool {
    text.bytes().all(|byte| is_space(byte) || byte == b'\n')
}

#[cfg(test)]
#[allow(clippy::unreachable)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Env, MarkdownParser};

    fn colons() -> ContainerMatcher {
        ContainerMatcher::new(Marker::Run(vec![b':']), 3, Closing::Marker)
    }

    #[test]
    fn test_open_and_close_marker_run() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let state = BlockState::new("::::: note x\nbody\n:::\n::::::  \nafter\n", &md, &mut env);
        let matcher = colons();
        let opening = matcher.open(&state, 0, |_| true);
        assert_eq!(
            opening.as_ref().map(|o| (o.markup.as_str(), o.count, o.params.as_str())),
            Some((":::::", 5, " note x"))
        );
        let Some(opening) = opening else { return };
        assert_eq!(matcher.closing_marker(&state, 2, &opening), None);
        let close = matcher.find_close(&state, &opening, state.line_max);
        assert_eq!(
            close,
            Close {
                line: 3,
                explicit: true,
                markup: "::::::".to_string()
            }
        );
        assert_eq!(close.next_line(), 4);
        assert_eq!(close.map(), [3, 4]);
    }

    #[test]
    fn test_unterminated_block_closes_at_end() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let state = BlockState::new(":::\na\nb\n", &md, &mut env);
        let matcher = colons();
        let Some(opening) = matcher.open(&state, 0, |_| true) else {
            unreachable!("opening marker expected")
        };
        let close = matcher.find_close(&state, &opening, state.line_max);
        assert!(!close.explicit);
        assert_eq!(close.line, 3);
        assert_eq!(close.map(), [2, 3]);
        assert_eq!(ContainerMatcher::verbatim(&state, &opening, &close), "a\nb\n");
    }

    #[test]
    fn test_pattern_marker_counts_whole_repetitions() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let state = BlockState::new("-+-+-+-x\n", &md, &mut env);
        let matcher = ContainerMatcher::new(Marker::Pattern("-+".to_string()), 3, Closing::Marker);
        let opening = matcher.open(&state, 0, |_| true);
        assert_eq!(
            opening.map(|o| (o.markup, o.count, o.params)),
            Some(("-+-+-+".to_string(), 3, "-x".to_string()))
        );
    }

    #[test]
    fn test_fixed_markers_prefer_longest_and_set_body_indent() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let state = BlockState::new("???+ note\n    body\n\n\nafter\n", &md, &mut env);
        let matcher = ContainerMatcher::new(
            Marker::Fixed(vec!["!!!".to_string(), "???".to_string(), "???+".to_string()]),
            1,
            Closing::Indent,
        );
        let Some(opening) = matcher.open(&state, 0, |_| true) else {
            unreachable!("opening marker expected")
        };
        assert_eq!(opening.markup, "???+");
        assert_eq!(opening.body_indent, 4);
        let close = matcher.find_close(&state, &opening, state.line_max);
        assert_eq!(close.line, 3);
        assert!(!close.explicit);
    }

    #[test]
    fn test_indented_code_is_never_a_marker() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let state = BlockState::new("    :::\n", &md, &mut env);
        assert_eq!(colons().open(&state, 0, |_| true), None);
    }
}
