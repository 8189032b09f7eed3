//! Code spans: `` `code` ``.
use crate::{InlineState, Nesting};

pub fn backticks(state: &mut InlineState<'_>, silent: bool) -> bool {
    let start = state.pos;
    if state.byte(start) != Some(b'`') {
        return false;
    }
    let max = state.pos_max;
    let mut pos = start + 1;
    while pos < max && state.byte(pos) == Some(b'`') {
        pos += 1;
    }
    let marker = state.slice(start, pos);
    let opener_len = marker.len();

    // A previous scan proved no closer of this length follows.
    let no_closer = state.backticks_scanned
        && state.backticks.get(&opener_len).copied().unwrap_or_default() <= start;
    if !no_closer {
        let mut match_end = pos;
        while let Some(offset) = state.slice(match_end, max).find('`') {
            let match_start = match_end + offset;
            match_end = match_start + 1;
            while match_end < max && state.byte(match_end) == Some(b'`') {
                match_end += 1;
            }
            let closer_len = match_end - match_start;
            if closer_len == opener_len {
                if !silent {
                    let content = state.slice(pos, match_start).replace('\n', " ");
                    let token = state.push("code_inline", "code", Nesting::SelfClosing);
                    token.markup = marker.to_string();
                    token.content = strip_padding(&content).to_string();
                }
                state.pos = match_end;
                return true;
            }
            // Upper bound for where a closer of that length can be found.
            state.backticks.insert(closer_len, match_start);
        }
        state.backticks_scanned = true;
    }

    if !silent {
        state.pending.push_str(marker);
    }
    state.pos += opener_len;
    true
}

/// Remove one space from each end when both ends have one and the content
/// is not all spaces.
fn strip_padding(content: &str) -> &str {
    if content.len() >= 2
        && content.starts_with(' ')
        && content.ends_with(' ')
        && !content.bytes().all(|byte| byte == b' ')
    {
        content.get(1..content.len() - 1).unwrap_or(content)
    } else {
        content
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{Env, MarkdownParser};

    #[rstest]
    #[case(" a ", "a")]
    #[case("  ", "  ")]
    #[case(" a", " a")]
    #[case("  a  ", " a ")]
    fn test_strip_padding(#[case] content: &str, #[case] expected: &str) {
        assert_eq!(strip_padding(content), expected);
    }

    #[test]
    fn test_code_span_and_unmatched_run() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let tokens = md.inline.parse("``a`b`` ```x", &md, &mut env);
        let summary: Vec<_> = tokens
            .iter()
            .map(|t| (t.kind.as_str(), t.content.as_str()))
            .collect();
        assert_eq!(summary, vec![("code_inline", "a`b"), ("text", " ```x")]);
    }
}
