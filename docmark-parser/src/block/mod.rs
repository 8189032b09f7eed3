//! Line-oriented block tokenizer.
use crate::{Env, MarkdownParser, Ruler, Token};

pub mod container;
pub mod rules;
mod scope;
mod state;

pub use scope::ScopedState;
pub use state::{BlockState, LineIndex, LineRecord, ParentType};
pub(crate) use state::push_last;

/// Signature of a block rule.
///
/// `(state, start_line, end_line, silent)`. In silent mode the rule only
/// answers whether it would match at `start_line`; it must not emit tokens or
/// move the cursor. Otherwise a matching rule emits its tokens, advances
/// `state.line` past what it consumed and returns `true`.
pub type BlockRule =
    dyn for<'s, 'a> Fn(&'s mut BlockState<'a>, usize, usize, bool) -> bool + Send + Sync;

/// Drives block rules over a line range.
pub struct BlockParser {
    pub ruler: Ruler<BlockRule>,
}

impl std::fmt::Debug for BlockParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockParser")
            .field("ruler", &self.ruler)
            .finish()
    }
}

impl Default for BlockParser {
    fn default() -> Self {
        const INTERRUPTS: &[&str] = &["paragraph", "reference", "blockquote", "list"];
        const INTERRUPTS_NO_LIST: &[&str] = &["paragraph", "reference", "blockquote"];

        let mut ruler: Ruler<BlockRule> = Ruler::new();
        ruler.push("code", Box::new(rules::code::code), &[]);
        ruler.push("fence", Box::new(rules::fence::fence), INTERRUPTS);
        ruler.push(
            "blockquote",
            Box::new(rules::blockquote::blockquote),
            INTERRUPTS,
        );
        ruler.push("hr", Box::new(rules::hr::hr), INTERRUPTS);
        ruler.push("list", Box::new(rules::list::list), INTERRUPTS_NO_LIST);
        ruler.push("reference", Box::new(rules::reference::reference), &[]);
        ruler.push(
            "html_block",
            Box::new(rules::html_block::html_block),
            INTERRUPTS_NO_LIST,
        );
        ruler.push(
            "heading",
            Box::new(rules::heading::heading),
            INTERRUPTS_NO_LIST,
        );
        ruler.push("lheading", Box::new(rules::lheading::lheading), &[]);
        ruler.push("paragraph", Box::new(rules::paragraph::paragraph), &[]);
        Self { ruler }
    }
}

impl BlockParser {
    /// Tokenize lines `[start_line, end_line)` into `state.tokens`.
    ///
    /// Stops early at a line indented less than `state.blk_indent`: that line
    /// belongs to an enclosing construct.
    #[tracing::instrument(level = "trace", skip_all, fields(start_line, end_line))]
    pub fn tokenize(&self, state: &mut BlockState<'_>, start_line: usize, end_line: usize) {
        let max_nesting = state.md.options.max_nesting;
        let mut line = start_line;
        let mut has_empty_lines = false;

        while line < end_line {
            line = state.skip_empty_lines(line);
            state.line = line;
            if line >= end_line {
                break;
            }
            if state.lines.indent(line) < state.blk_indent {
                break;
            }
            if state.level >= max_nesting {
                tracing::warn!(
                    line,
                    max_nesting,
                    "block nesting limit reached, remaining lines are skipped"
                );
                state.line = end_line;
                break;
            }

            let prev_line = state.line;
            let mut matched = false;
            for rule in self.ruler.rules_for("") {
                if rule(state, line, end_line, false) {
                    matched = true;
                    tracing::trace!(line, next = state.line, "block rule accepted");
                    break;
                }
            }

            if !matched || state.line <= prev_line {
                tracing::error!(
                    line,
                    matched,
                    "no block rule consumed the line, forcing progress"
                );
                debug_assert!(
                    matched,
                    "no block rule matched line {line}; is the paragraph rule disabled?"
                );
                debug_assert!(
                    state.line > prev_line,
                    "block rule matched line {line} without advancing"
                );
                state.line = prev_line + 1;
            }

            state.tight = !has_empty_lines;
            line = state.line;

            if line.checked_sub(1).is_some_and(|prev| state.is_empty(prev)) {
                has_empty_lines = true;
            }
            if line < end_line && state.is_empty(line) {
                has_empty_lines = true;
                line += 1;
                state.line = line;
            }
        }
    }

    /// Whether any rule in `chain` would start a block at `line`.
    pub fn terminates(
        &self,
        chain: &str,
        state: &mut BlockState<'_>,
        line: usize,
        end_line: usize,
    ) -> bool {
        self.ruler
            .rules_for(chain)
            .any(|rule| rule(state, line, end_line, true))
    }

    /// Tokenize a whole source buffer.
    #[must_use]
    pub fn parse(&self, src: &str, md: &MarkdownParser, env: &mut Env) -> Vec<Token> {
        if src.is_empty() {
            return Vec::new();
        }
        let mut state = BlockState::new(src, md, env);
        let end_line = state.line_max;
        self.tokenize(&mut state, 0, end_line);
        state.tokens
    }
}
