//! Line breaks: two trailing spaces make a hard break, anything else soft.
use crate::{InlineState, Nesting, common::utils::is_space};

pub fn newline(state: &mut InlineState<'_>, silent: bool) -> bool {
    let mut pos = state.pos;
    if state.byte(pos) != Some(b'\n') {
        return false;
    }

    if !silent {
        let trimmed = state.pending.trim_end_matches(' ').len();
        let kind = if state.pending.len() - trimmed >= 2 {
            "hardbreak"
        } else {
            "softbreak"
        };
        state.pending.truncate(trimmed);
        state.push(kind, "br", Nesting::SelfClosing);
    }

    pos += 1;
    // Leading spaces of the next line are not content.
    while pos < state.pos_max && state.byte(pos).is_some_and(is_space) {
        pos += 1;
    }
    state.pos = pos;
    true
}
