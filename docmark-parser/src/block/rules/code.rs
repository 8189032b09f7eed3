//! Indented code blocks.
use crate::{BlockState, Nesting};

pub fn code(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    if !state.is_code_block(start_line) {
        return false;
    }
    if silent {
        return true;
    }

    let mut next_line = start_line + 1;
    let mut last = next_line;
    while next_line < end_line {
        if state.is_empty(next_line) {
            next_line += 1;
            continue;
        }
        if state.is_code_block(next_line) {
            next_line += 1;
            last = next_line;
            continue;
        }
        break;
    }

    state.line = last;
    let mut content = state.get_lines(start_line, last, 4 + state.blk_indent, false);
    content.push('\n');
    let token = state.push("code_block", "code", Nesting::SelfClosing);
    token.content = content;
    token.map = Some([start_line, last]);
    true
}
