use std::{
    io::{self, Write},
    path::PathBuf,
    time::Instant,
};

use anyhow::bail;
use clap::Args as ClapArgs;
use crossterm::style::Stylize;
use docmark_parser::{Env, MarkdownParser, Nesting, Token};
use rayon::prelude::*;
use serde::Serialize;

use super::{Palette, ParserArgs, read_file, read_stdin, tree_prefix, truncate};

/// Print the token stream of Markdown documents
#[derive(ClapArgs, Debug)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are naturally booleans
pub struct Args {
    /// Markdown files to tokenize
    #[arg(conflicts_with = "stdin")]
    pub files: Vec<PathBuf>,

    /// Read a single document from stdin
    #[arg(long, conflicts_with = "files")]
    pub stdin: bool,

    /// Print the tokens as JSON instead of a tree
    #[arg(long)]
    pub json: bool,

    /// Show the source line range of block tokens
    #[arg(long)]
    pub show_maps: bool,

    /// Maximum depth to display (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub max_depth: usize,

    /// Show timing information
    #[arg(long)]
    pub timings: bool,

    #[command(flatten)]
    pub parser: ParserArgs,
}

/// A token with the tokens it encloses: the children of an opening token up
/// to its closer, or the inline children of an `inline` token.
#[derive(Debug)]
struct TokenNode<'t> {
    token: &'t Token,
    children: Vec<TokenNode<'t>>,
}

fn attach<'t>(stack: &mut [TokenNode<'t>], roots: &mut Vec<TokenNode<'t>>, node: TokenNode<'t>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

/// Fold the flat stream into a tree. Closing tokens are dropped; an opener
/// left unclosed at the end keeps whatever followed it.
fn nest(tokens: &[Token]) -> Vec<TokenNode<'_>> {
    let mut roots = Vec::new();
    let mut stack: Vec<TokenNode<'_>> = Vec::new();
    for token in tokens {
        match token.nesting {
            Nesting::Opening => stack.push(TokenNode {
                token,
                children: Vec::new(),
            }),
            Nesting::Closing => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut roots, node);
                }
            }
            Nesting::SelfClosing => {
                let children = token.children.as_deref().map(nest).unwrap_or_default();
                attach(&mut stack, &mut roots, TokenNode { token, children });
            }
        }
    }
    while let Some(node) = stack.pop() {
        attach(&mut stack, &mut roots, node);
    }
    roots
}

struct TreePrinter<W: Write> {
    writer: W,
    palette: Palette,
    is_last_stack: Vec<bool>,
    show_maps: bool,
    max_depth: usize,
}

impl<W: Write> TreePrinter<W> {
    fn new(writer: W, palette: Palette, show_maps: bool, max_depth: usize) -> Self {
        Self {
            writer,
            palette,
            is_last_stack: Vec::new(),
            show_maps,
            max_depth,
        }
    }

    fn should_show(&self) -> bool {
        self.max_depth == 0 || self.is_last_stack.len() <= self.max_depth
    }

    fn print_document(&mut self, label: &str, tokens: &[Token]) -> io::Result<()> {
        writeln!(self.writer, "{}", self.palette.paint(label, |s| s.blue().bold()))?;
        let nodes = nest(tokens);
        for (i, node) in nodes.iter().enumerate() {
            self.print_node(node, i + 1 == nodes.len())?;
        }
        Ok(())
    }

    fn print_node(&mut self, node: &TokenNode<'_>, is_last: bool) -> io::Result<()> {
        self.is_last_stack.push(is_last);
        if self.should_show() {
            self.print_line(node.token)?;
            for (i, child) in node.children.iter().enumerate() {
                self.print_node(child, i + 1 == node.children.len())?;
            }
        }
        self.is_last_stack.pop();
        Ok(())
    }

    fn print_line(&mut self, token: &Token) -> io::Result<()> {
        let name = token.kind.strip_suffix("_open").unwrap_or(&token.kind);
        write!(
            self.writer,
            "{}{}",
            tree_prefix(&self.is_last_stack),
            self.palette.paint(name, |s| s.cyan().bold())
        )?;

        let detail = if token.content.is_empty() {
            &token.info
        } else {
            &token.content
        };
        if !detail.is_empty() {
            write!(self.writer, ": {}", self.palette.paint(truncate(detail, 50), Stylize::yellow))?;
        }

        if !token.attrs.is_empty() {
            let attrs: Vec<_> = token
                .attrs
                .iter()
                .map(|(name, value)| format!("{name}={value:?}"))
                .collect();
            let attrs = format!("{{{}}}", attrs.join(" "));
            write!(self.writer, " {}", self.palette.paint(attrs, Stylize::magenta))?;
        }

        if let (true, Some([start, end])) = (self.show_maps, token.map) {
            let map = format!("@{start}..{end}");
            write!(self.writer, " {}", self.palette.paint(map, Stylize::dark_grey))?;
        }

        writeln!(self.writer)
    }
}

#[derive(Serialize)]
struct FileTokens<'a> {
    file: String,
    tokens: &'a [Token],
}

fn tokenize(md: &MarkdownParser, src: &str, timings: bool, label: &str) -> Vec<Token> {
    let now = Instant::now();
    let tokens = md.parse(src, &mut Env::default());
    if timings {
        eprintln!("  Parsed {label} in {:?}", now.elapsed());
    }
    tokens
}

pub fn run(args: &Args) -> anyhow::Result<()> {
    if !args.stdin && args.files.is_empty() {
        bail!("pass at least one file, or --stdin");
    }
    let md = MarkdownParser::new(args.parser.options()?)?;

    let documents: Vec<(String, anyhow::Result<Vec<Token>>)> = if args.stdin {
        let label = "<stdin>".to_string();
        let tokens = read_stdin().map(|src| tokenize(&md, &src, args.timings, &label));
        vec![(label, tokens)]
    } else {
        args.files
            .par_iter()
            .map(|file| {
                let label = file.display().to_string();
                let tokens = read_file(file).map(|src| tokenize(&md, &src, args.timings, &label));
                (label, tokens)
            })
            .collect()
    };

    let (parsed, errors): (Vec<_>, Vec<_>) = documents
        .into_iter()
        .partition(|(_label, result)| result.is_ok());
    let parsed: Vec<(String, Vec<Token>)> = parsed
        .into_iter()
        .filter_map(|(label, result)| result.ok().map(|tokens| (label, tokens)))
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        if let [(_, tokens)] = parsed.as_slice() {
            serde_json::to_writer_pretty(&mut out, tokens)?;
        } else {
            let files: Vec<_> = parsed
                .iter()
                .map(|(label, tokens)| FileTokens {
                    file: label.clone(),
                    tokens,
                })
                .collect();
            serde_json::to_writer_pretty(&mut out, &files)?;
        }
        writeln!(out)?;
    } else {
        let mut printer =
            TreePrinter::new(&mut out, Palette::for_stdout(), args.show_maps, args.max_depth);
        for (label, tokens) in &parsed {
            printer.print_document(label, tokens)?;
        }
    }
    out.flush()?;

    if !errors.is_empty() {
        eprintln!("\nFailed to process {} file(s):", errors.len());
        for (idx, (label, result)) in errors.iter().enumerate() {
            if let Err(error) = result {
                eprintln!("\n{}. File: {label}\n   {error:#}", idx + 1);
            }
        }
        bail!("{} of the inputs could not be read", errors.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(src: &str, show_maps: bool) -> anyhow::Result<String> {
        let md = MarkdownParser::commonmark();
        let tokens = md.parse(src, &mut Env::default());
        let mut out = Vec::new();
        TreePrinter::new(&mut out, Palette::plain(), show_maps, 0)
            .print_document("doc", &tokens)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_nest_follows_nesting() {
        let md = MarkdownParser::commonmark();
        let tokens = md.parse("> a *b*\n", &mut Env::default());
        let nodes = nest(&tokens);
        assert_eq!(nodes.len(), 1);
        let quote = nodes.first();
        assert_eq!(quote.map(|n| n.token.kind.as_str()), Some("blockquote_open"));
        let paragraph = quote.and_then(|n| n.children.first());
        let inline = paragraph.and_then(|n| n.children.first());
        let kinds: Vec<_> = inline
            .map(|n| n.children.iter().map(|c| c.token.kind.as_str()).collect())
            .unwrap_or_default();
        assert_eq!(kinds, vec!["text", "em_open"]);
    }

    #[test]
    fn test_tree_output() -> anyhow::Result<()> {
        let output = render("# Hi\n\n- one\n", true)?;
        let expected = [
            "doc",
            "├─ heading @0..1",
            "│  └─ inline: Hi @0..1",
            "│     └─ text: Hi",
            "└─ bullet_list @2..3",
            "   └─ list_item @2..3",
            "      └─ paragraph @2..3",
            "         └─ inline: one @2..3",
            "            └─ text: one",
        ];
        assert_eq!(output.lines().collect::<Vec<_>>(), expected);
        Ok(())
    }

    #[test]
    fn test_max_depth_prunes_children() -> anyhow::Result<()> {
        let md = MarkdownParser::commonmark();
        let tokens = md.parse("> quoted\n", &mut Env::default());
        let mut out = Vec::new();
        TreePrinter::new(&mut out, Palette::plain(), false, 1)
            .print_document("doc", &tokens)?;
        let output = String::from_utf8(out)?;
        assert_eq!(output.lines().collect::<Vec<_>>(), ["doc", "└─ blockquote"]);
        Ok(())
    }
}
