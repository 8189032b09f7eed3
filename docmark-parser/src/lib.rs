//! Extensible Markdown tokenizer.
//!
//! `docmark-parser` turns Markdown into a flat stream of [`Token`]s in the
//! markdown-it tradition: block rules walk the source line by line and emit
//! open/close/content tokens, then inline rules fill the children of every
//! `inline` token. Both layers are driven by ordered, named rule lists
//! ([`Ruler`]) so syntax extensions can slot their own rules in before or
//! after the built-in ones.
//!
//! The crate ships the `CommonMark` base rules plus a set of
//! documentation-oriented extensions (admonitions, containers, math,
//! footnotes, definition and field lists, task lists, attributes,
//! substitutions, word count and heading anchors), selected through
//! [`Options`].
//!
//! # Example
//!
//! ```
//! use docmark_parser::{Env, MarkdownParser, Options};
//!
//! let md = MarkdownParser::new(Options::default())?;
//! let mut env = Env::default();
//! let tokens = md.parse("!!! note\n    Body text\n", &mut env);
//! assert_eq!(tokens.first().map(|t| t.kind.as_str()), Some("admonition_open"));
//! # Ok::<(), docmark_parser::Error>(())
//! ```
use serde::Serialize;

pub mod block;
mod common;
mod env;
mod error;
pub mod extensions;
pub mod html;
pub mod inline;
mod options;
pub mod pipeline;
mod ruler;
mod token;

#[cfg(test)]
mod proptests;

pub use block::{
    BlockParser, BlockRule, BlockState, LineIndex, LineRecord, ParentType, ScopedState,
    container::{Close, Closing, ContainerMatcher, Marker, Opening},
};
pub use common::{
    link::{normalize_link, normalize_link_text, validate_link},
    utils::{escape_html, normalize_reference, unescape_all},
};
pub use env::{Env, FootnoteEntry, FootnoteRef, FootnoteRegistry, Reference, WordCount};
pub use error::{AttrParseError, Error};
pub use inline::{DelimRun, Delimiter, InlineParser, InlinePostRule, InlineRule, InlineState};
pub use options::{
    AnchorsOptions, AttrsOptions, ContainerOptions, DollarMathOptions, Extension, Extensions,
    FootnoteOptions, Options, OptionsBuilder, SubstitutionOptions, TaskListOptions,
    TexMathDelimiters, TexMathOptions, WordCountOptions,
};
pub use pipeline::{CoreParser, CoreRule, CoreState};
pub use ruler::Ruler;
pub use token::{Attrs, Meta, MetaValue, Nesting, Token};

/// A configured tokenizer: the three rule engines plus the options they
/// were built from.
///
/// Building one is the only fallible step; parsing never fails. A parser is
/// immutable once built and can be shared between threads.
#[derive(Debug)]
pub struct MarkdownParser {
    pub block: BlockParser,
    pub inline: InlineParser,
    pub core: CoreParser,
    pub options: Options,
}

impl MarkdownParser {
    /// Build a parser with the base rules and every extension enabled in
    /// `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if an extension option is invalid (e.g. an empty
    /// substitution delimiter or container name).
    pub fn new(options: Options) -> Result<Self, Error> {
        let mut md = Self {
            block: BlockParser::default(),
            inline: InlineParser::default(),
            core: CoreParser::default(),
            options,
        };
        extensions::register_enabled(&mut md)?;
        tracing::debug!(
            extensions = ?md.options.extensions,
            block_rules = ?md.block.ruler.names(""),
            "parser built"
        );
        Ok(md)
    }

    /// A parser with the `CommonMark` rules only.
    #[must_use]
    pub fn commonmark() -> Self {
        Self {
            block: BlockParser::default(),
            inline: InlineParser::default(),
            core: CoreParser::default(),
            options: Options::commonmark(),
        }
    }

    /// Tokenize a document. Side results (link references, footnotes, word
    /// count) are collected in `env`.
    #[tracing::instrument(skip_all, fields(len = src.len()))]
    pub fn parse(&self, src: &str, env: &mut Env) -> Vec<Token> {
        self.run(src, env, false)
    }

    /// Tokenize `src` as a single inline span: the result is one `inline`
    /// token whose children hold the inline tokens.
    #[tracing::instrument(skip_all, fields(len = src.len()))]
    pub fn parse_inline(&self, src: &str, env: &mut Env) -> Vec<Token> {
        self.run(src, env, true)
    }

    fn run(&self, src: &str, env: &mut Env, inline_mode: bool) -> Vec<Token> {
        let mut state = CoreState {
            src: src.to_string(),
            md: self,
            env,
            tokens: Vec::new(),
            inline_mode,
        };
        self.core.process(&mut state);
        state.tokens
    }

    /// Percent-encode a link destination.
    #[must_use]
    pub fn normalize_link(&self, url: &str) -> String {
        normalize_link(url)
    }

    /// Decode a link destination for display.
    #[must_use]
    pub fn normalize_link_text(&self, url: &str) -> String {
        normalize_link_text(url)
    }

    /// Whether a normalized destination is safe to emit.
    #[must_use]
    pub fn validate_link(&self, url: &str) -> bool {
        validate_link(url)
    }
}

/// Tokens and side results of one parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub tokens: Vec<Token>,
    pub env: Env,
}

/// Build a parser from `options` and tokenize `input` with a fresh [`Env`].
///
/// # Errors
///
/// Returns an error if `options` is invalid; see [`MarkdownParser::new`].
pub fn parse(input: &str, options: &Options) -> Result<Document, Error> {
    let md = MarkdownParser::new(options.clone())?;
    let mut env = Env::default();
    let tokens = md.parse(input, &mut env);
    Ok(Document { tokens, env })
}
