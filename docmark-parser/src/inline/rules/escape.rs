//! Backslash escapes and backslash hard breaks.
use crate::{InlineState, Nesting, common::utils::is_space};

const ESCAPABLE: &[u8] = b"\\!\"#$%&'()*+,./:;<=>?@[]^_`{|}~-";

pub fn escape(state: &mut InlineState<'_>, silent: bool) -> bool {
    let mut pos = state.pos;
    if state.byte(pos) != Some(b'\\') {
        return false;
    }
    pos += 1;
    if pos >= state.pos_max {
        return false;
    }

    if state.byte(pos) == Some(b'\n') {
        if !silent {
            state.push("hardbreak", "br", Nesting::SelfClosing);
        }
        pos += 1;
        while pos < state.pos_max && state.byte(pos).is_some_and(is_space) {
            pos += 1;
        }
        state.pos = pos;
        return true;
    }

    let Some(escaped) = state.src.get(pos..).and_then(|rest| rest.chars().next()) else {
        return false;
    };
    if !silent {
        let original = format!("\\{escaped}");
        let is_escapable = u8::try_from(escaped).is_ok_and(|byte| ESCAPABLE.contains(&byte));
        let token = state.push("text_special", "", Nesting::SelfClosing);
        token.content = if is_escapable {
            escaped.to_string()
        } else {
            original.clone()
        };
        token.markup = original;
        token.info = "escape".to_string();
    }
    state.pos = pos + escaped.len_utf8();
    true
}
