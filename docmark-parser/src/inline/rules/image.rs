//! Images: `![alt](src "title")`, `![alt][label]`.
use super::link::{Target, parse_target, resolve_reference};
use crate::{InlineState, Nesting};

pub fn image(state: &mut InlineState<'_>, silent: bool) -> bool {
    let start = state.pos;
    if state.byte(start) != Some(b'!') || state.byte(start + 1) != Some(b'[') {
        return false;
    }
    let md = state.md;
    let max = state.pos_max;
    let label_start = start + 2;
    let Some(label_end) = md.inline.parse_link_label(state, start + 1, false) else {
        return false;
    };

    let resolved = if label_end + 1 < max && state.byte(label_end + 1) == Some(b'(') {
        match parse_target(state, label_end + 1) {
            Target::Parsed { href, title, end } => Some((href, title, end)),
            Target::Unterminated | Target::Invalid => None,
        }
    } else {
        resolve_reference(state, label_start, label_end)
    };
    let Some((href, title, end)) = resolved else {
        return false;
    };

    if !silent {
        let content = state.slice(label_start, label_end);
        let children = md.inline.parse(content, md, state.env);
        let token = state.push("image", "img", Nesting::SelfClosing);
        token.attr_set("src", href);
        token.attr_set("alt", "");
        if !title.is_empty() {
            token.attr_set("title", title);
        }
        token.content = content.to_string();
        token.children = Some(children);
    }
    state.pos = end;
    true
}
