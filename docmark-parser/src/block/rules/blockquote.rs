//! Block quotes: `> text`.
use crate::{BlockState, Nesting, ParentType, ScopedState};

pub fn blockquote(
    state: &mut BlockState<'_>,
    start_line: usize,
    end_line: usize,
    silent: bool,
) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    if state.byte(state.lines.start(start_line)) != Some(b'>') {
        return false;
    }
    if silent {
        return true;
    }

    let md = state.md;
    let mut scope = ScopedState::new(state);
    scope.parent_type = ParentType::Blockquote;

    let mut last_line_empty = false;
    let mut next_line = start_line;
    while next_line < end_line {
        // Lines indented less than an enclosing list item are outside the quote.
        let is_outdented = scope.lines.indent(next_line) < scope.blk_indent;
        let mut pos = scope.lines.start(next_line);
        let max = scope.lines.end(next_line);
        if pos >= max {
            break;
        }

        if scope.byte(pos) == Some(b'>') && !is_outdented {
            pos += 1;
            let mut initial = scope.lines.indent(next_line) + 1;
            let tab_offset = scope.lines.tab_offset(next_line);
            let space_after_marker;
            let mut adjust_tab = false;
            match scope.byte(pos) {
                Some(b' ') => {
                    pos += 1;
                    initial += 1;
                    space_after_marker = true;
                }
                Some(b'\t') => {
                    space_after_marker = true;
                    if (tab_offset + initial) % 4 == 3 {
                        pos += 1;
                        initial += 1;
                    } else {
                        adjust_tab = true;
                    }
                }
                Some(_) | None => space_after_marker = false,
            }

            let mut offset = initial;
            scope.save_line(next_line);
            scope.lines.set_begin(next_line, pos);
            while pos < max {
                match scope.byte(pos) {
                    Some(b'\t') => {
                        offset += 4 - (offset + tab_offset + isize::from(adjust_tab)) % 4;
                    }
                    Some(b' ') => offset += 1,
                    Some(_) | None => break,
                }
                pos += 1;
            }
            last_line_empty = pos >= max;

            let indent = scope.lines.indent(next_line);
            scope
                .lines
                .set_tab_offset(next_line, indent + 1 + isize::from(space_after_marker));
            scope.lines.set_indent(next_line, offset - initial);
            let begin = scope.lines.begin(next_line);
            scope.lines.set_shift(next_line, pos - begin);
            next_line += 1;
            continue;
        }

        // Lazy continuation ends at an empty line.
        if last_line_empty {
            break;
        }

        if md.block.terminates("blockquote", &mut scope, next_line, end_line) {
            // Hard termination: paragraphs inside must not look past this line.
            scope.line_max = next_line;
            if scope.blk_indent != 0 {
                scope.save_line(next_line);
                let indent = scope.lines.indent(next_line) - scope.blk_indent;
                scope.lines.set_indent(next_line, indent);
            }
            break;
        }

        scope.save_line(next_line);
        // A negative indent marks a lazy paragraph continuation.
        scope.lines.set_indent(next_line, -1);
        next_line += 1;
    }

    scope.blk_indent = 0;
    let open_index = scope.tokens.len();
    let token = scope.push("blockquote_open", "blockquote", Nesting::Opening);
    token.markup = ">".to_string();
    token.map = Some([start_line, 0]);

    md.block.tokenize(&mut scope, start_line, next_line);

    let token = scope.push("blockquote_close", "blockquote", Nesting::Closing);
    token.markup = ">".to_string();
    let end = scope.line;
    if let Some(token) = scope.tokens.get_mut(open_index) {
        token.map = Some([start_line, end]);
    }
    true
}
