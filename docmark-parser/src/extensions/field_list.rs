//! Field lists: `:name: body`, rendered as a `dl.field-list`.
//!
//! The body indent is the smallest indent among the non-blank lines that
//! follow the marker, capped by the column where the first line's body
//! starts. A body that only has a first line uses that column; an empty
//! field defaults to two columns.
use crate::{
    BlockState, Error, LineRecord, MarkdownParser, Nesting, ParentType, ScopedState,
    common::utils::{signed, unsigned},
};

/// # Errors
///
/// Fails if the `paragraph` rule was removed from the block ruler.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    md.block.ruler.before(
        "paragraph",
        "fieldlist",
        Box::new(field_list),
        &["paragraph", "reference", "blockquote"],
    )
}

/// Parse `:name:` at the start of `line`; returns the position after the
/// closing colon and the name.
fn parse_name_marker(state: &BlockState<'_>, line: usize) -> Option<(usize, String)> {
    let start = state.lines.start(line);
    let max = state.lines.end(line);
    if start + 2 >= max || state.byte(start) != Some(b':') {
        return None;
    }
    let rest = state.slice(start + 1, max);
    let close = rest.find(':')?;
    let name = rest.get(..close)?;
    if name.trim().is_empty() {
        return None;
    }
    Some((start + 1 + close + 1, name.to_string()))
}

/// Indent of the field body: the minimum over the following non-blank lines
/// that are indented past the list, combined with the first line's column.
fn body_indent(
    state: &BlockState<'_>,
    start_line: usize,
    end_line: usize,
    first_line_indent: isize,
    has_first_line: bool,
) -> isize {
    let mut min_indent: Option<isize> = None;
    for line in start_line + 1..end_line {
        if state.is_empty(line) {
            continue;
        }
        let indent = state.lines.indent(line);
        if indent <= state.blk_indent {
            break;
        }
        min_indent = Some(min_indent.map_or(indent, |min| min.min(indent)));
    }
    match (min_indent, has_first_line) {
        (Some(min), _) => min.min(first_line_indent),
        (None, true) => first_line_indent,
        (None, false) => state.blk_indent + 2,
    }
}

/// Blank out `len` bytes ending at `end`, widening to a character boundary
/// so the buffer keeps its length and stays valid UTF-8.
fn blank_before(src: &str, end: usize, len: usize) -> String {
    let mut from = end.saturating_sub(len);
    while from > 0 && !src.is_char_boundary(from) {
        from -= 1;
    }
    let mut out = String::with_capacity(src.len());
    out.push_str(src.get(..from).unwrap_or_default());
    out.push_str(&" ".repeat(end - from));
    out.push_str(src.get(end..).unwrap_or_default());
    out
}

pub fn field_list(
    state: &mut BlockState<'_>,
    start_line: usize,
    end_line: usize,
    silent: bool,
) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    let Some((mut after_name, mut name)) = parse_name_marker(state, start_line) else {
        return false;
    };
    if silent {
        return true;
    }

    let md = state.md;
    let list_open = state.tokens.len();
    let token = state.push("field_list_open", "dl", Nesting::Opening);
    token.attr_set("class", "field-list");

    let mut field_line = start_line;
    let mut next_line = start_line;
    {
        let mut list = ScopedState::new(state);
        list.parent_type = ParentType::FieldList;
        let state = &mut *list;
        while next_line < end_line {
            let line_map = Some([field_line, field_line + 1]);
            state.push("fieldlist_name_open", "dt", Nesting::Opening).map = line_map;
            let token = state.push("inline", "", Nesting::SelfClosing);
            token.map = line_map;
            token.content = std::mem::take(&mut name);
            token.children = Some(Vec::new());
            state.push("fieldlist_name_close", "dt", Nesting::Closing);

            let max = state.lines.end(field_line);
            let begin = state.lines.begin(field_line);
            let tab_offset = state.lines.tab_offset(field_line);
            let mut first_line_indent =
                state.lines.indent(field_line) + signed(after_name - state.lines.start(field_line));
            let mut pos = after_name;
            while pos < max {
                match state.byte(pos) {
                    Some(b'\t') => first_line_indent += 4 - (first_line_indent + tab_offset) % 4,
                    Some(b' ') => first_line_indent += 1,
                    Some(_) | None => break,
                }
                pos += 1;
            }
            let content_start = pos;
            let has_first_line = content_start < max;
            let block_indent =
                body_indent(state, field_line, end_line, first_line_indent, has_first_line);

            let body_open = state.tokens.len();
            state.push("fieldlist_body_open", "dd", Nesting::Opening);
            {
                let mut scope = ScopedState::new(state);
                // Pull the first line left onto the body indent, padding the hole
                // with spaces so byte offsets stay valid.
                let mut diff = 0;
                if has_first_line && block_indent < first_line_indent {
                    diff = unsigned(first_line_indent - block_indent).min(content_start - begin);
                    let patched = blank_before(&scope.src, content_start, diff);
                    scope.replace_src(patched);
                }
                scope.override_line(
                    field_line,
                    LineRecord {
                        begin,
                        shift: content_start - diff - begin,
                        indent: first_line_indent - signed(diff),
                        tab_offset,
                    },
                );
                scope.blk_indent = block_indent;
                md.block.tokenize(&mut scope, field_line, end_line);
            }
            state.push("fieldlist_body_close", "dd", Nesting::Closing);

            next_line = state.line;
            if let Some(token) = state.tokens.get_mut(body_open) {
                token.map = Some([field_line, next_line]);
            }
            field_line = next_line;

            if next_line >= end_line
                || state.lines.indent(next_line) < state.blk_indent
                || state.is_code_block(next_line)
            {
                break;
            }
            let Some((after, next_name)) = parse_name_marker(state, next_line) else {
                break;
            };
            after_name = after;
            name = next_name;
        }
    }

    state.push("field_list_close", "dl", Nesting::Closing);
    if let Some(token) = state.tokens.get_mut(list_open) {
        token.map = Some([start_line, next_line]);
    }
    state.line = next_line;
    true
}
