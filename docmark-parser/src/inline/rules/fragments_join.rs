//! Merge adjacent text tokens and recompute levels after pairing turned some
//! of them into tags.
use crate::{InlineState, Nesting};

pub fn fragments_join(state: &mut InlineState<'_>) {
    let tokens = std::mem::take(&mut state.tokens);
    let mut joined: Vec<crate::Token> = Vec::with_capacity(tokens.len());
    let mut level = 0usize;
    for mut token in tokens {
        if token.nesting == Nesting::Closing {
            level = level.saturating_sub(1);
        }
        token.level = level;
        if token.nesting == Nesting::Opening {
            level += 1;
        }
        if token.is("text") {
            if let Some(last) = joined.last_mut().filter(|last| last.is("text")) {
                last.content.push_str(&token.content);
                continue;
            }
        }
        joined.push(token);
    }
    // Indices shifted, delimiter bookkeeping no longer applies.
    state.tokens_meta = vec![None; joined.len()];
    state.tokens = joined;
}
