//! Character references: `&amp;`, `&#35;`, `&#x22;`.
use crate::{InlineState, Nesting, common::utils::decode_entity};

pub fn entity(state: &mut InlineState<'_>, silent: bool) -> bool {
    let pos = state.pos;
    if state.byte(pos) != Some(b'&') || pos + 1 >= state.pos_max {
        return false;
    }
    let Some((decoded, len)) = decode_entity(state.slice(pos, state.pos_max)) else {
        return false;
    };
    if !silent {
        let markup = state.slice(pos, pos + len);
        let token = state.push("text_special", "", Nesting::SelfClosing);
        token.content = decoded;
        token.markup = markup.to_string();
        token.info = "entity".to_string();
    }
    state.pos += len;
    true
}
