//! `*` and `_` emphasis: delimiter collection and pairing into `em`/`strong`.
use crate::{Delimiter, InlineState, Nesting};

/// Push one text token per marker and record them as delimiters.
pub fn tokenize(state: &mut InlineState<'_>, silent: bool) -> bool {
    if silent {
        return false;
    }
    let start = state.pos;
    let marker = match state.byte(start) {
        Some(marker @ (b'_' | b'*')) => marker,
        Some(_) | None => return false,
    };
    let run = state.scan_delims(start, marker == b'*');
    for _ in 0..run.length {
        let token = state.push("text", "", Nesting::SelfClosing);
        token.content = char::from(marker).to_string();
        let index = state.tokens.len() - 1;
        state.push_delimiter(Delimiter {
            marker,
            length: run.length,
            token: index,
            end: None,
            open: run.can_open,
            close: run.can_close,
        });
    }
    state.pos += run.length;
    true
}

/// Turn paired delimiters of one list into tags. Two nested pairs on
/// adjacent markers collapse into a single `strong`.
fn process(state: &mut InlineState<'_>, list: usize) {
    let Some(delimiters) = state.delimiter_lists.get(list).cloned() else {
        return;
    };
    let mut index = delimiters.len();
    while index > 0 {
        index -= 1;
        let Some(start) = delimiters.get(index) else {
            continue;
        };
        if start.marker != b'_' && start.marker != b'*' {
            continue;
        }
        let Some(end_index) = start.end else {
            continue;
        };
        let Some(end) = delimiters.get(end_index) else {
            continue;
        };

        let outer = index
            .checked_sub(1)
            .and_then(|prev| delimiters.get(prev))
            .zip(delimiters.get(end_index + 1));
        let strong = outer.is_some_and(|(before, after)| {
            before.end == Some(end_index + 1)
                && before.marker == start.marker
                && before.token + 1 == start.token
                && after.token == end.token + 1
        });

        let ch = char::from(start.marker);
        let (open, close, tag, markup) = if strong {
            ("strong_open", "strong_close", "strong", format!("{ch}{ch}"))
        } else {
            ("em_open", "em_close", "em", ch.to_string())
        };
        for (token_index, kind, nesting) in [
            (start.token, open, Nesting::Opening),
            (end.token, close, Nesting::Closing),
        ] {
            if let Some(token) = state.tokens.get_mut(token_index) {
                token.kind = kind.to_string();
                token.tag = tag.to_string();
                token.nesting = nesting;
                token.markup.clone_from(&markup);
                token.content.clear();
            }
        }

        if strong {
            if let Some((before, after)) = outer {
                for token_index in [before.token, after.token] {
                    if let Some(token) = state.tokens.get_mut(token_index) {
                        token.content.clear();
                    }
                }
            }
            index = index.saturating_sub(1);
        }
    }
}

pub fn post_process(state: &mut InlineState<'_>) {
    for list in 0..state.delimiter_lists.len() {
        process(state, list);
    }
}
