use std::{
    fmt::Display,
    fs,
    io::{self, BufReader, IsTerminal, Read},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Args as ClapArgs;
use crossterm::style::{ContentStyle, StyledContent};
use docmark_parser::{Extension, Extensions, Options};

pub mod env;
pub mod html;
pub mod tokens;

/// Parser configuration shared by the subcommands that tokenize Markdown
#[derive(ClapArgs, Debug, Clone)]
pub struct ParserArgs {
    /// JSON file with parser options; absent fields keep their defaults
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Comma separated extensions to enable, replacing the configured set
    #[arg(long, value_delimiter = ',', value_name = "NAME,..")]
    pub extensions: Option<Vec<Extension>>,

    /// Disable raw HTML recognition
    #[arg(long)]
    pub no_html: bool,
}

impl ParserArgs {
    pub fn options(&self) -> anyhow::Result<Options> {
        let mut options = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Options::default(),
        };
        if let Some(extensions) = &self.extensions {
            options.extensions = Extensions::only(extensions);
        }
        if self.no_html {
            options.html = false;
        }
        tracing::debug!(?options, "parser options");
        Ok(options)
    }
}

pub fn read_stdin() -> anyhow::Result<String> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .context("reading standard input")?;
    Ok(input)
}

pub fn read_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Read `file`, or standard input when no file is given.
pub fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => read_file(path),
        None => read_stdin(),
    }
}

/// Shorten `text` to at most `max_len` characters for display.
pub fn truncate(text: &str, max_len: usize) -> String {
    let escaped = text.escape_debug().to_string();
    match escaped.char_indices().nth(max_len) {
        Some((cut, _)) => format!(
            "{}... ({} chars)",
            escaped.get(..cut).unwrap_or_default(),
            text.chars().count()
        ),
        None => escaped,
    }
}

/// Tree connectors for a line at `depth`, given whether each ancestor (and
/// the line itself) is the last of its siblings.
pub fn tree_prefix(is_last_stack: &[bool]) -> String {
    let mut prefix = String::new();
    let depth = is_last_stack.len();
    for (i, &is_last) in is_last_stack.iter().enumerate() {
        let piece = match (i + 1 == depth, is_last) {
            (true, true) => "└─ ",
            (true, false) => "├─ ",
            (false, true) => "   ",
            (false, false) => "│  ",
        };
        prefix.push_str(piece);
    }
    prefix
}

/// Terminal styling for tree output, applied only when stdout is a terminal.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    styled: bool,
}

impl Palette {
    #[must_use]
    pub fn for_stdout() -> Self {
        Self {
            styled: io::stdout().is_terminal(),
        }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self { styled: false }
    }

    #[must_use]
    pub fn paint<D, F>(self, text: D, style: F) -> String
    where
        D: Display,
        F: FnOnce(StyledContent<D>) -> StyledContent<D>,
    {
        if self.styled {
            style(StyledContent::new(ContentStyle::new(), text)).to_string()
        } else {
            text.to_string()
        }
    }
}
