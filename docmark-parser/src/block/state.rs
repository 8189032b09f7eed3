use std::borrow::Cow;

use crate::{
    Env, MarkdownParser, Nesting, Token,
    common::utils::{is_space, signed, unsigned},
};

/// Per-line offsets into the source buffer.
///
/// For every line: where it begins, where it ends (excluding the newline),
/// how many bytes of leading whitespace precede the first content byte, the
/// visual indent of that content with tabs expanded to stops of four, and the
/// column offset at which tab expansion started. A sentinel entry at the end
/// points at the end of the source so that reads one past the last line stay
/// in bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    pub(crate) begin: Vec<usize>,
    pub(crate) end: Vec<usize>,
    pub(crate) shift: Vec<usize>,
    pub(crate) indent: Vec<isize>,
    pub(crate) tab_offset: Vec<isize>,
}

/// All per-line fields of a single line, used to save and restore overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRecord {
    pub begin: usize,
    pub shift: usize,
    pub indent: isize,
    pub tab_offset: isize,
}

impl LineIndex {
    #[must_use]
    pub fn new(src: &str) -> Self {
        let mut index = Self::default();
        let mut start = 0;
        for line in src.split_inclusive('\n') {
            let content = line.strip_suffix('\n').unwrap_or(line);
            let mut shift = 0;
            let mut offset = 0isize;
            for byte in content.bytes() {
                match byte {
                    b' ' => offset += 1,
                    b'\t' => offset += 4 - offset % 4,
                    _ => break,
                }
                shift += 1;
            }
            index.begin.push(start);
            index.end.push(start + content.len());
            index.shift.push(shift);
            index.indent.push(offset);
            index.tab_offset.push(0);
            start += line.len();
        }
        index.begin.push(src.len());
        index.end.push(src.len());
        index.shift.push(0);
        index.indent.push(0);
        index.tab_offset.push(0);
        index
    }

    /// Number of real lines, the sentinel excluded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.begin.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sentinel(&self) -> usize {
        self.end.last().copied().unwrap_or_default()
    }

    /// Byte offset where `line` begins.
    #[must_use]
    pub fn begin(&self, line: usize) -> usize {
        self.begin
            .get(line)
            .copied()
            .unwrap_or_else(|| self.sentinel())
    }

    /// Byte offset of the newline ending `line` (or end of source).
    #[must_use]
    pub fn end(&self, line: usize) -> usize {
        self.end
            .get(line)
            .copied()
            .unwrap_or_else(|| self.sentinel())
    }

    /// Leading whitespace bytes before the first content byte.
    #[must_use]
    pub fn shift(&self, line: usize) -> usize {
        self.shift.get(line).copied().unwrap_or_default()
    }

    /// Byte offset of the first content byte.
    #[must_use]
    pub fn start(&self, line: usize) -> usize {
        self.begin(line) + self.shift(line)
    }

    /// Visual indent of the first content byte, tabs expanded.
    #[must_use]
    pub fn indent(&self, line: usize) -> isize {
        self.indent.get(line).copied().unwrap_or_default()
    }

    /// Column at which tab stops are computed for this line.
    #[must_use]
    pub fn tab_offset(&self, line: usize) -> isize {
        self.tab_offset.get(line).copied().unwrap_or_default()
    }

    pub fn set_begin(&mut self, line: usize, value: usize) {
        if let Some(slot) = self.begin.get_mut(line) {
            *slot = value;
        }
    }

    pub fn set_shift(&mut self, line: usize, value: usize) {
        if let Some(slot) = self.shift.get_mut(line) {
            *slot = value;
        }
    }

    pub fn set_indent(&mut self, line: usize, value: isize) {
        if let Some(slot) = self.indent.get_mut(line) {
            *slot = value;
        }
    }

    pub fn set_tab_offset(&mut self, line: usize, value: isize) {
        if let Some(slot) = self.tab_offset.get_mut(line) {
            *slot = value;
        }
    }

    #[must_use]
    pub fn record(&self, line: usize) -> LineRecord {
        LineRecord {
            begin: self.begin(line),
            shift: self.shift(line),
            indent: self.indent(line),
            tab_offset: self.tab_offset(line),
        }
    }

    pub fn restore(&mut self, line: usize, record: LineRecord) {
        self.set_begin(line, record.begin);
        self.set_shift(line, record.shift);
        self.set_indent(line, record.indent);
        self.set_tab_offset(line, record.tab_offset);
    }
}

/// The innermost block construct currently being tokenized.
///
/// Rules consult it to decide whether they may interrupt the enclosing
/// construct, e.g. a list may only interrupt a paragraph under stricter
/// conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParentType {
    #[default]
    Root,
    Paragraph,
    Blockquote,
    List,
    Reference,
    Footnote,
    Deflist,
    FieldList,
    Admonition,
    Container,
    Custom(&'static str),
}

/// Mutable cursor over the source while block rules run.
pub struct BlockState<'a> {
    /// Source with newlines normalized. Owned only while a rule patches it.
    pub src: Cow<'a, str>,
    pub md: &'a MarkdownParser,
    pub env: &'a mut Env,
    pub tokens: Vec<Token>,
    pub lines: LineIndex,
    /// Required indent of the current nested block.
    pub blk_indent: isize,
    /// Line the cursor is at.
    pub line: usize,
    /// Lines at or past this are invisible to rules, even lazily.
    pub line_max: usize,
    /// Whether the current list is tight.
    pub tight: bool,
    /// Indent of the current definition-list body, -1 outside one.
    pub dd_indent: isize,
    /// Indent of the current list item, -1 outside one.
    pub list_indent: isize,
    pub parent_type: ParentType,
    pub level: usize,
}

impl std::fmt::Debug for BlockState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockState")
            .field("line", &self.line)
            .field("line_max", &self.line_max)
            .field("blk_indent", &self.blk_indent)
            .field("parent_type", &self.parent_type)
            .field("level", &self.level)
            .field("tokens", &self.tokens.len())
            .finish_non_exhaustive()
    }
}

impl<'a> BlockState<'a> {
    #[must_use]
    pub fn new(src: &'a str, md: &'a MarkdownParser, env: &'a mut Env) -> Self {
        let lines = LineIndex::new(src);
        let line_max = lines.len();
        Self {
            src: Cow::Borrowed(src),
            md,
            env,
            tokens: Vec::new(),
            lines,
            blk_indent: 0,
            line: 0,
            line_max,
            tight: false,
            dd_indent: -1,
            list_indent: -1,
            parent_type: ParentType::Root,
            level: 0,
        }
    }

    /// Append a block token, maintaining `level`.
    pub fn push(&mut self, kind: &str, tag: &str, nesting: Nesting) -> &mut Token {
        let mut token = Token::new(kind, tag, nesting);
        token.block = true;
        if nesting == Nesting::Closing {
            self.level = self.level.saturating_sub(1);
        }
        token.level = self.level;
        if nesting == Nesting::Opening {
            self.level += 1;
        }
        push_last(&mut self.tokens, token)
    }

    #[must_use]
    pub fn byte(&self, pos: usize) -> Option<u8> {
        self.src.as_bytes().get(pos).copied()
    }

    /// Source text between two byte offsets, empty when out of range.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.src.get(start..end).unwrap_or_default()
    }

    /// Content of `line` after its leading whitespace.
    #[must_use]
    pub fn line_text(&self, line: usize) -> &str {
        self.slice(self.lines.start(line), self.lines.end(line))
    }

    #[must_use]
    pub fn is_empty(&self, line: usize) -> bool {
        self.lines.start(line) >= self.lines.end(line)
    }

    #[must_use]
    pub fn skip_empty_lines(&self, mut from: usize) -> usize {
        while from < self.line_max && self.is_empty(from) {
            from += 1;
        }
        from
    }

    #[must_use]
    pub fn skip_spaces(&self, mut pos: usize) -> usize {
        while self.byte(pos).is_some_and(is_space) {
            pos += 1;
        }
        pos
    }

    #[must_use]
    pub fn skip_spaces_back(&self, mut pos: usize, min: usize) -> usize {
        while pos > min {
            pos -= 1;
            if !self.byte(pos).is_some_and(is_space) {
                return pos + 1;
            }
        }
        pos
    }

    #[must_use]
    pub fn skip_chars(&self, mut pos: usize, marker: u8) -> usize {
        while self.byte(pos) == Some(marker) {
            pos += 1;
        }
        pos
    }

    #[must_use]
    pub fn skip_chars_back(&self, mut pos: usize, marker: u8, min: usize) -> usize {
        while pos > min {
            pos -= 1;
            if self.byte(pos) != Some(marker) {
                return pos + 1;
            }
        }
        pos
    }

    /// Whether `line` is indented enough to be an indented code block.
    #[must_use]
    pub fn is_code_block(&self, line: usize) -> bool {
        self.lines.indent(line) - self.blk_indent >= 4
    }

    /// Join lines `[begin, end)`, stripping up to `indent` columns from each.
    ///
    /// Bytes inside a line's shifted prefix count as one column each, so
    /// markers hidden by a container rule read as indentation.
    #[must_use]
    pub fn get_lines(&self, begin: usize, end: usize, indent: isize, keep_last_lf: bool) -> String {
        if begin >= end {
            return String::new();
        }
        let src_len = self.src.len();
        let mut out = String::new();
        for line in begin..end {
            let line_start = self.lines.begin(line);
            let mut first = line_start;
            let last = if line + 1 < end || keep_last_lf {
                (self.lines.end(line) + 1).min(src_len)
            } else {
                self.lines.end(line)
            };
            let mut line_indent = 0isize;
            while first < last && line_indent < indent {
                match self.byte(first) {
                    Some(b'\t') => {
                        line_indent += 4 - (line_indent + self.lines.tab_offset(line)) % 4;
                    }
                    Some(b' ') => line_indent += 1,
                    Some(_) | None if first - line_start < self.lines.shift(line) => line_indent += 1,
                    Some(_) | None => break,
                }
                first += 1;
            }
            while first < last && !self.src.is_char_boundary(first) {
                first += 1;
            }
            if line_indent > indent {
                out.push_str(&" ".repeat(unsigned(line_indent - indent)));
            }
            out.push_str(self.slice(first, last));
        }
        out
    }

    /// Visual column of byte `pos` on `line`, counting from the line's
    /// recorded indent.
    #[must_use]
    pub fn column_at(&self, line: usize, pos: usize) -> isize {
        let start = self.lines.start(line);
        let mut offset = self.lines.indent(line);
        let mut cursor = start;
        while cursor < pos {
            match self.byte(cursor) {
                Some(b'\t') => {
                    offset += 4 - (offset + self.lines.tab_offset(line)) % 4;
                }
                Some(_) | None => offset += 1,
            }
            cursor += 1;
        }
        offset
    }

    /// Current block indent as a column count, never negative.
    #[must_use]
    pub fn blk_indent_columns(&self) -> usize {
        unsigned(self.blk_indent)
    }

    /// Convert a byte count to the signed column arithmetic used by indents.
    #[must_use]
    pub fn columns(count: usize) -> isize {
        signed(count)
    }
}

/// Push `item` and hand back a mutable reference to it.
pub(crate) fn push_last<T>(items: &mut Vec<T>, item: T) -> &mut T {
    let index = items.len();
    items.push(item);
    #[allow(clippy::indexing_slicing)]
    &mut items[index]
}
