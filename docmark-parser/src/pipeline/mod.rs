//! Top-level pass list: normalize the source, run the block and inline
//! tokenizers, then post-process the finished stream.
use crate::{Env, MarkdownParser, Nesting, Ruler, Token};

/// Signature of a core rule. Core rules see the whole token stream.
pub type CoreRule = dyn for<'s, 'a> Fn(&'s mut CoreState<'a>) + Send + Sync;

/// State shared by the core passes of one parse.
pub struct CoreState<'a> {
    pub src: String,
    pub md: &'a MarkdownParser,
    pub env: &'a mut Env,
    pub tokens: Vec<Token>,
    /// Parse `src` as a single inline span instead of a document.
    pub inline_mode: bool,
}

impl std::fmt::Debug for CoreState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreState")
            .field("src_len", &self.src.len())
            .field("tokens", &self.tokens.len())
            .field("inline_mode", &self.inline_mode)
            .finish_non_exhaustive()
    }
}

pub struct CoreParser {
    pub ruler: Ruler<CoreRule>,
}

impl std::fmt::Debug for CoreParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreParser")
            .field("ruler", &self.ruler)
            .finish()
    }
}

impl Default for CoreParser {
    fn default() -> Self {
        let mut ruler: Ruler<CoreRule> = Ruler::new();
        ruler.push("normalize", Box::new(normalize), &[]);
        ruler.push("block", Box::new(block), &[]);
        ruler.push("inline", Box::new(inline), &[]);
        ruler.push("text_join", Box::new(text_join), &[]);
        Self { ruler }
    }
}

impl CoreParser {
    pub fn process(&self, state: &mut CoreState<'_>) {
        for rule in self.ruler.rules_for("") {
            rule(state);
        }
    }
}

/// Unify line endings and replace NUL characters.
pub fn normalize(state: &mut CoreState<'_>) {
    if state.src.contains(['\r', '\0']) {
        state.src = state
            .src
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\0', "\u{FFFD}");
    }
}

pub fn block(state: &mut CoreState<'_>) {
    if state.inline_mode {
        let mut token = Token::new("inline", "", Nesting::SelfClosing);
        token.content.clone_from(&state.src);
        token.map = Some([0, 1]);
        token.children = Some(Vec::new());
        state.tokens.push(token);
        return;
    }
    let md = state.md;
    let tokens = md.block.parse(&state.src, md, state.env);
    state.tokens.extend(tokens);
}

/// Fill the children of every `inline` token.
pub fn inline(state: &mut CoreState<'_>) {
    let md = state.md;
    for token in state.tokens.iter_mut().filter(|token| token.is("inline")) {
        token.children = Some(md.inline.parse(&token.content, md, state.env));
    }
}

/// Fold `text_special` tokens into text and merge adjacent text tokens.
pub fn text_join(state: &mut CoreState<'_>) {
    for token in state.tokens.iter_mut().filter(|token| token.is("inline")) {
        if let Some(children) = token.children.take() {
            token.children = Some(join_text(children));
        }
    }
}

pub(crate) fn join_text(children: Vec<Token>) -> Vec<Token> {
    let mut joined: Vec<Token> = Vec::with_capacity(children.len());
    for mut child in children {
        if child.is("text_special") {
            child.kind = "text".to_string();
        }
        if child.is("text") {
            if let Some(last) = joined.last_mut().filter(|last| last.is("text")) {
                last.content.push_str(&child.content);
                continue;
            }
        }
        joined.push(child);
    }
    joined
}
