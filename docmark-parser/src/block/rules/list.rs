//! Bullet and ordered lists.
use crate::{
    BlockState, Nesting, ParentType, ScopedState,
    common::utils::{is_space, signed},
};

/// Position after a `*`, `-` or `+` marker, if `line` starts with one.
fn skip_bullet_marker(state: &BlockState<'_>, line: usize) -> Option<usize> {
    let max = state.lines.end(line);
    let pos = state.lines.start(line);
    if !matches!(state.byte(pos), Some(b'*' | b'-' | b'+')) {
        return None;
    }
    let pos = pos + 1;
    if pos < max && !state.byte(pos).is_some_and(is_space) {
        return None;
    }
    Some(pos)
}

/// Position after a `1.` or `1)` marker of at most nine digits.
fn skip_ordered_marker(state: &BlockState<'_>, line: usize) -> Option<usize> {
    let start = state.lines.start(line);
    let max = state.lines.end(line);
    if start + 1 >= max || !state.byte(start).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut pos = start + 1;
    loop {
        if pos >= max {
            return None;
        }
        let byte = state.byte(pos)?;
        pos += 1;
        if byte.is_ascii_digit() {
            if pos - start >= 10 {
                return None;
            }
            continue;
        }
        if byte == b')' || byte == b'.' {
            break;
        }
        return None;
    }
    if pos < max && !state.byte(pos).is_some_and(is_space) {
        return None;
    }
    Some(pos)
}

/// Hide the paragraphs directly inside the items of a tight list.
pub(crate) fn mark_tight_paragraphs(state: &mut BlockState<'_>, list_open: usize) {
    let level = state.level + 2;
    let end = state.tokens.len().saturating_sub(2);
    let mut index = list_open + 2;
    while index < end {
        let is_paragraph = state
            .tokens
            .get(index)
            .is_some_and(|token| token.level == level && token.is("paragraph_open"));
        if is_paragraph {
            for offset in [0, 2] {
                if let Some(token) = state.tokens.get_mut(index + offset) {
                    token.hidden = true;
                }
            }
            index += 2;
        }
        index += 1;
    }
}

#[allow(clippy::too_many_lines)]
pub fn list(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    let mut next_line = start_line;
    if state.is_code_block(next_line) {
        return false;
    }
    // Indented code inside an outer list item, not a nested list.
    let indent = state.lines.indent(next_line);
    if state.list_indent >= 0 && indent - state.list_indent >= 4 && indent < state.blk_indent {
        return false;
    }

    // Only lists starting with `1` or holding content may interrupt a paragraph.
    let terminating_paragraph =
        silent && state.parent_type == ParentType::Paragraph && indent >= state.blk_indent;

    let mut start = state.lines.start(next_line);
    let (ordered, mut pos_after_marker, marker_value) =
        if let Some(pos) = skip_ordered_marker(state, next_line) {
            let value = state
                .slice(start, pos - 1)
                .parse::<u64>()
                .unwrap_or_default();
            if terminating_paragraph && value != 1 {
                return false;
            }
            (true, pos, value)
        } else if let Some(pos) = skip_bullet_marker(state, next_line) {
            (false, pos, 0)
        } else {
            return false;
        };

    if terminating_paragraph && state.skip_spaces(pos_after_marker) >= state.lines.end(next_line) {
        return false;
    }
    if silent {
        return true;
    }

    let marker = state.byte(pos_after_marker - 1).unwrap_or(b'-');
    let markup = char::from(marker).to_string();
    let (open_kind, close_kind, tag) = if ordered {
        ("ordered_list_open", "ordered_list_close", "ol")
    } else {
        ("bullet_list_open", "bullet_list_close", "ul")
    };

    let md = state.md;
    let list_open = state.tokens.len();
    let token = state.push(open_kind, tag, Nesting::Opening);
    if ordered && marker_value != 1 {
        token.attr_set("start", marker_value.to_string());
    }
    token.map = Some([start_line, 0]);
    token.markup.clone_from(&markup);

    let mut tight = true;
    let mut prev_empty_end = false;
    let mut scope = ScopedState::new(state);
    scope.parent_type = ParentType::List;

    while next_line < end_line {
        let max = scope.lines.end(next_line);
        let line_start = scope.lines.start(next_line);
        let initial = scope.lines.indent(next_line) + signed(pos_after_marker - line_start);
        let mut offset = initial;
        let mut pos = pos_after_marker;
        while pos < max {
            match scope.byte(pos) {
                Some(b'\t') => offset += 4 - (offset + scope.lines.tab_offset(next_line)) % 4,
                Some(b' ') => offset += 1,
                Some(_) | None => break,
            }
            pos += 1;
        }

        let content_start = pos;
        let mut indent_after_marker = if content_start >= max {
            1
        } else {
            offset - initial
        };
        if indent_after_marker > 4 {
            indent_after_marker = 1;
        }
        let item_indent = initial + indent_after_marker;

        let info = if ordered {
            scope.slice(start, pos_after_marker - 1).to_string()
        } else {
            String::new()
        };
        let item_open = scope.tokens.len();
        let token = scope.push("list_item_open", "li", Nesting::Opening);
        token.markup.clone_from(&markup);
        token.map = Some([next_line, 0]);
        token.info = info;

        let item_end;
        {
            let mut item = ScopedState::new(&mut scope);
            item.list_indent = item.blk_indent;
            item.blk_indent = item_indent;
            item.tight = true;
            let begin = item.lines.begin(next_line);
            item.save_line(next_line);
            item.lines.set_shift(next_line, content_start - begin);
            item.lines.set_indent(next_line, offset);

            if content_start >= max && item.is_empty(next_line + 1) {
                // An empty first line followed by a blank line ends the item.
                item.line = (item.line + 2).min(end_line);
            } else {
                md.block.tokenize(&mut item, next_line, end_line);
            }

            if !item.tight || prev_empty_end {
                tight = false;
            }
            item_end = item.line;
            prev_empty_end = item_end.saturating_sub(next_line) > 1
                && item_end.checked_sub(1).is_some_and(|line| item.is_empty(line));
        }

        let token = scope.push("list_item_close", "li", Nesting::Closing);
        token.markup.clone_from(&markup);

        next_line = item_end;
        scope.line = item_end;
        if let Some(token) = scope.tokens.get_mut(item_open) {
            token.map = Some([token.map.map_or(next_line, |map| map[0]), next_line]);
        }

        if next_line >= end_line {
            break;
        }
        if scope.lines.indent(next_line) < scope.blk_indent {
            break;
        }
        if scope.is_code_block(next_line) {
            break;
        }
        if md.block.terminates("list", &mut scope, next_line, end_line) {
            break;
        }

        let next_marker = if ordered {
            let found = skip_ordered_marker(&scope, next_line);
            start = scope.lines.start(next_line);
            found
        } else {
            skip_bullet_marker(&scope, next_line)
        };
        let Some(found) = next_marker else { break };
        pos_after_marker = found;
        if scope.byte(pos_after_marker - 1) != Some(marker) {
            break;
        }
    }
    drop(scope);

    let token = state.push(close_kind, tag, Nesting::Closing);
    token.markup = markup;
    if let Some(token) = state.tokens.get_mut(list_open) {
        token.map = Some([start_line, next_line]);
    }
    state.line = next_line;

    if tight {
        mark_tight_paragraphs(state, list_open);
    }
    true
}
