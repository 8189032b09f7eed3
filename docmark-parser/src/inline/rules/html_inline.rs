//! Raw inline HTML.
use crate::{InlineState, Nesting, common::html_re::html_tag_len};

fn is_link_open(html: &str) -> bool {
    let bytes = html.as_bytes();
    bytes.len() > 2
        && bytes.get(..2).is_some_and(|head| head.eq_ignore_ascii_case(b"<a"))
        && bytes.get(2).is_some_and(|b| *b == b'>' || b.is_ascii_whitespace())
}

fn is_link_close(html: &str) -> bool {
    html.get(..3).is_some_and(|head| head.eq_ignore_ascii_case("</a"))
        && html.get(3..).is_some_and(|rest| rest.trim_start() == ">")
}

pub fn html_inline(state: &mut InlineState<'_>, silent: bool) -> bool {
    if !state.md.options.html {
        return false;
    }
    let pos = state.pos;
    let max = state.pos_max;
    if state.byte(pos) != Some(b'<') || pos + 2 >= max {
        return false;
    }
    let next = state.byte(pos + 1).unwrap_or_default();
    if !matches!(next, b'!' | b'?' | b'/') && !next.is_ascii_alphabetic() {
        return false;
    }
    let Some(len) = html_tag_len(state.slice(pos, max)) else {
        return false;
    };

    if !silent {
        let content = state.slice(pos, pos + len);
        let token = state.push("html_inline", "", Nesting::SelfClosing);
        token.content = content.to_string();
        if is_link_open(content) {
            state.link_level += 1;
        }
        if is_link_close(content) {
            state.link_level = state.link_level.saturating_sub(1);
        }
    }
    state.pos += len;
    true
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("<a href='x'>", true, false)]
    #[case("<A>", true, false)]
    #[case("<abbr>", false, false)]
    #[case("</a >", false, true)]
    fn test_link_detection(#[case] html: &str, #[case] open: bool, #[case] close: bool) {
        assert_eq!((is_link_open(html), is_link_close(html)), (open, close));
    }
}
