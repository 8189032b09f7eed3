//! Thematic breaks.
use crate::{BlockState, Nesting, common::utils::is_space};

pub fn hr(state: &mut BlockState<'_>, start_line: usize, _end_line: usize, silent: bool) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    let mut pos = state.lines.start(start_line);
    let max = state.lines.end(start_line);
    let Some(marker) = state.byte(pos) else {
        return false;
    };
    if !matches!(marker, b'*' | b'-' | b'_') {
        return false;
    }
    pos += 1;

    let mut count = 1;
    while pos < max {
        let Some(byte) = state.byte(pos) else { break };
        pos += 1;
        if byte != marker && !is_space(byte) {
            return false;
        }
        if byte == marker {
            count += 1;
        }
    }
    if count < 3 {
        return false;
    }
    if silent {
        return true;
    }

    state.line = start_line + 1;
    let token = state.push("hr", "hr", Nesting::SelfClosing);
    token.map = Some([start_line, start_line + 1]);
    token.markup = char::from(marker).to_string().repeat(count);
    true
}
