use rustc_hash::FxHashMap;

use crate::{
    Env, MarkdownParser, Nesting, Token,
    block::push_last,
    common::utils::{is_md_ascii_punct, is_punct_char, is_white_space},
};

/// An emphasis-like delimiter run waiting to be paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter {
    /// `*`, `_`, `~`, `=` or any marker an extension balances.
    pub marker: u8,
    /// Total length of the run this delimiter belongs to.
    pub length: usize,
    /// Index of the text token holding this delimiter.
    pub token: usize,
    /// Index of the matching closer, once paired.
    pub end: Option<usize>,
    pub open: bool,
    pub close: bool,
}

/// Flanking analysis of a delimiter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimRun {
    pub can_open: bool,
    pub can_close: bool,
    pub length: usize,
}

/// Cursor over one inline span while inline rules run.
pub struct InlineState<'a> {
    pub src: &'a str,
    pub md: &'a MarkdownParser,
    pub env: &'a mut Env,
    pub tokens: Vec<Token>,
    /// For every token, the delimiter list it opened, if any.
    pub tokens_meta: Vec<Option<usize>>,
    /// Delimiter lists by id. Every opening token starts a fresh list, so
    /// emphasis never pairs across link boundaries.
    pub delimiter_lists: Vec<Vec<Delimiter>>,
    /// Id of the list new delimiters go to.
    pub delimiters: usize,
    prev_delimiters: Vec<usize>,
    pub pos: usize,
    pub pos_max: usize,
    pub level: usize,
    pub pending: String,
    pub pending_level: usize,
    /// Positions already known to be skippable, mapped to where they end.
    pub cache: FxHashMap<usize, usize>,
    /// Position of the last backtick run of each length, once scanned.
    pub backticks: FxHashMap<usize, usize>,
    pub backticks_scanned: bool,
    /// Depth of links being parsed; autolinks are off inside them.
    pub link_level: usize,
}

impl std::fmt::Debug for InlineState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineState")
            .field("pos", &self.pos)
            .field("pos_max", &self.pos_max)
            .field("level", &self.level)
            .field("pending", &self.pending)
            .field("tokens", &self.tokens.len())
            .finish_non_exhaustive()
    }
}

impl<'a> InlineState<'a> {
    #[must_use]
    pub fn new(src: &'a str, md: &'a MarkdownParser, env: &'a mut Env) -> Self {
        Self {
            src,
            md,
            env,
            tokens: Vec::new(),
            tokens_meta: Vec::new(),
            delimiter_lists: vec![Vec::new()],
            delimiters: 0,
            prev_delimiters: Vec::new(),
            pos: 0,
            pos_max: src.len(),
            level: 0,
            pending: String::new(),
            pending_level: 0,
            cache: FxHashMap::default(),
            backticks: FxHashMap::default(),
            backticks_scanned: false,
            link_level: 0,
        }
    }

    #[must_use]
    pub fn byte(&self, pos: usize) -> Option<u8> {
        self.src.as_bytes().get(pos).copied()
    }

    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        self.src.get(start..end).unwrap_or_default()
    }

    /// Flush pending text into a `text` token.
    pub fn push_pending(&mut self) -> &mut Token {
        let mut token = Token::new("text", "", Nesting::SelfClosing);
        token.content = std::mem::take(&mut self.pending);
        token.level = self.pending_level;
        self.tokens_meta.push(None);
        push_last(&mut self.tokens, token)
    }

    /// Append a token, flushing pending text first and maintaining `level`
    /// and the delimiter list stack.
    pub fn push(&mut self, kind: &str, tag: &str, nesting: Nesting) -> &mut Token {
        if !self.pending.is_empty() {
            self.push_pending();
        }
        let mut token = Token::new(kind, tag, nesting);
        let mut meta = None;
        if nesting == Nesting::Closing {
            self.level = self.level.saturating_sub(1);
            self.delimiters = self.prev_delimiters.pop().unwrap_or_default();
        }
        token.level = self.level;
        if nesting == Nesting::Opening {
            self.level += 1;
            self.prev_delimiters.push(self.delimiters);
            self.delimiter_lists.push(Vec::new());
            self.delimiters = self.delimiter_lists.len() - 1;
            meta = Some(self.delimiters);
        }
        self.pending_level = self.level;
        self.tokens_meta.push(meta);
        push_last(&mut self.tokens, token)
    }

    /// Record a delimiter in the current list.
    pub fn push_delimiter(&mut self, delimiter: Delimiter) {
        if let Some(list) = self.delimiter_lists.get_mut(self.delimiters) {
            list.push(delimiter);
        }
    }

    /// Scan a run of the byte at `start` and classify it as a potential
    /// opener and/or closer. `can_split_word` is false for `_`, which may
    /// not open or close inside a word.
    #[must_use]
    pub fn scan_delims(&self, start: usize, can_split_word: bool) -> DelimRun {
        let marker = self.byte(start);
        let last_char = self
            .src
            .get(..start)
            .and_then(|before| before.chars().next_back())
            .unwrap_or(' ');
        let mut pos = start;
        while pos < self.pos_max && self.byte(pos) == marker {
            pos += 1;
        }
        let length = pos - start;
        let next_char = if pos < self.pos_max {
            self.src.get(pos..).and_then(|rest| rest.chars().next()).unwrap_or(' ')
        } else {
            ' '
        };

        let last_punct = is_md_ascii_punct(last_char) || is_punct_char(last_char);
        let next_punct = is_md_ascii_punct(next_char) || is_punct_char(next_char);
        let last_white = is_white_space(last_char);
        let next_white = is_white_space(next_char);

        let left_flanking = !next_white && (!next_punct || last_white || last_punct);
        let right_flanking = !last_white && (!last_punct || next_white || next_punct);

        DelimRun {
            can_open: left_flanking && (can_split_word || !right_flanking || last_punct),
            can_close: right_flanking && (can_split_word || !left_flanking || next_punct),
            length,
        }
    }
}
