//! Inline tokenizer: turns the content of `inline` tokens into children.
use crate::{Env, MarkdownParser, Ruler, Token};

pub mod rules;
mod state;

pub use state::{DelimRun, Delimiter, InlineState};

/// Signature of an inline rule: `(state, silent)`.
///
/// A matching rule advances `state.pos` and returns `true`; in silent mode it
/// only advances the position, without emitting tokens. Rules never move the
/// position backwards.
pub type InlineRule = dyn for<'s, 'a> Fn(&'s mut InlineState<'a>, bool) -> bool + Send + Sync;

/// Signature of an inline post-processing rule, run once over the finished
/// token list (delimiter pairing, fragment merging).
pub type InlinePostRule = dyn for<'s, 'a> Fn(&'s mut InlineState<'a>) + Send + Sync;

pub struct InlineParser {
    pub ruler: Ruler<InlineRule>,
    pub ruler2: Ruler<InlinePostRule>,
}

impl std::fmt::Debug for InlineParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineParser")
            .field("ruler", &self.ruler)
            .field("ruler2", &self.ruler2)
            .finish()
    }
}

impl Default for InlineParser {
    fn default() -> Self {
        let mut ruler: Ruler<InlineRule> = Ruler::new();
        ruler.push("text", Box::new(rules::text::text), &[]);
        ruler.push("newline", Box::new(rules::newline::newline), &[]);
        ruler.push("escape", Box::new(rules::escape::escape), &[]);
        ruler.push("backticks", Box::new(rules::backticks::backticks), &[]);
        ruler.push("emphasis", Box::new(rules::emphasis::tokenize), &[]);
        ruler.push("link", Box::new(rules::link::link), &[]);
        ruler.push("image", Box::new(rules::image::image), &[]);
        ruler.push("autolink", Box::new(rules::autolink::autolink), &[]);
        ruler.push("html_inline", Box::new(rules::html_inline::html_inline), &[]);
        ruler.push("entity", Box::new(rules::entity::entity), &[]);

        let mut ruler2: Ruler<InlinePostRule> = Ruler::new();
        ruler2.push(
            "balance_pairs",
            Box::new(rules::balance_pairs::balance_pairs),
            &[],
        );
        ruler2.push("emphasis", Box::new(rules::emphasis::post_process), &[]);
        ruler2.push(
            "fragments_join",
            Box::new(rules::fragments_join::fragments_join),
            &[],
        );
        Self { ruler, ruler2 }
    }
}

impl InlineParser {
    /// Skip over the construct at `state.pos` without emitting tokens.
    ///
    /// Used by link label scanning; results are memoized per position.
    pub fn skip_token(&self, state: &mut InlineState<'_>) {
        let pos = state.pos;
        if let Some(&end) = state.cache.get(&pos) {
            state.pos = end;
            return;
        }

        let mut matched = false;
        if state.level < state.md.options.max_nesting {
            for rule in self.ruler.rules_for("") {
                state.level += 1;
                matched = rule(state, true);
                state.level -= 1;
                if matched {
                    debug_assert!(state.pos > pos, "inline rule matched without advancing");
                    break;
                }
            }
        } else {
            // Too deep: the rest of the span is opaque.
            state.pos = state.pos_max;
            state.cache.insert(pos, state.pos);
            return;
        }

        if !matched || state.pos <= pos {
            state.pos = pos + char_len(state, pos);
        }
        state.cache.insert(pos, state.pos);
    }

    /// Run the inline rules over `state.src[state.pos..state.pos_max]`.
    pub fn tokenize(&self, state: &mut InlineState<'_>) {
        let end = state.pos_max;
        let max_nesting = state.md.options.max_nesting;
        if state.level >= max_nesting {
            tracing::warn!(max_nesting, "inline nesting limit reached, span kept as text");
        }

        while state.pos < end {
            let prev = state.pos;
            let mut matched = false;
            if state.level < max_nesting {
                for rule in self.ruler.rules_for("") {
                    if rule(state, false) {
                        matched = true;
                        break;
                    }
                }
            }
            if matched && state.pos > prev {
                if state.pos >= end {
                    break;
                }
                continue;
            }
            debug_assert!(!matched, "inline rule matched at {prev} without advancing");
            if matched {
                tracing::error!(pos = prev, "inline rule matched without advancing");
            }
            let len = char_len(state, prev);
            let text = state.slice(prev, prev + len);
            state.pending.push_str(text);
            state.pos = prev + len;
        }

        if !state.pending.is_empty() {
            state.push_pending();
        }
    }

    /// Tokenize `src` and run post-processing; returns the children.
    #[tracing::instrument(level = "trace", skip_all, fields(len = src.len()))]
    pub fn parse(&self, src: &str, md: &MarkdownParser, env: &mut Env) -> Vec<Token> {
        let mut state = InlineState::new(src, md, env);
        self.tokenize(&mut state);
        for rule in self.ruler2.rules_for("") {
            rule(&mut state);
        }
        state.tokens
    }

    /// Find the `]` closing the label whose `[` is at `start`.
    ///
    /// Nested brackets are balanced, and anything another rule claims (code
    /// spans, autolinks, raw HTML) is skipped. With `disable_nested`, a
    /// nested link inside the label fails the scan. The cursor is restored.
    pub fn parse_link_label(
        &self,
        state: &mut InlineState<'_>,
        start: usize,
        disable_nested: bool,
    ) -> Option<usize> {
        let old_pos = state.pos;
        let max = state.pos_max;
        let mut level = 1;
        let mut found = false;
        state.pos = start + 1;

        while state.pos < max {
            let marker = state.byte(state.pos);
            if marker == Some(b']') {
                level -= 1;
                if level == 0 {
                    found = true;
                    break;
                }
            }
            let prev = state.pos;
            self.skip_token(state);
            if marker == Some(b'[') {
                if prev + 1 == state.pos {
                    level += 1;
                } else if disable_nested {
                    state.pos = old_pos;
                    return None;
                }
            }
        }

        let label_end = found.then_some(state.pos);
        state.pos = old_pos;
        label_end
    }
}

/// Byte length of the character at `pos`, at least one.
fn char_len(state: &InlineState<'_>, pos: usize) -> usize {
    crate::common::utils::char_len_at(state.src, pos).max(1)
}
