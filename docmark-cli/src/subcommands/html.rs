use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::Args as ClapArgs;
use crossterm::style::Stylize;
use docmark_parser::html::{HtmlTree, NodeId, NodeKind, parse_html};

use super::{Palette, read_input, tree_prefix, truncate};

/// Parse an HTML fragment into a node tree
#[derive(ClapArgs, Debug)]
pub struct Args {
    /// HTML file to parse; standard input when omitted
    #[arg(conflicts_with = "stdin")]
    pub file: Option<PathBuf>,

    /// Read the fragment from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Print the fragment rendered back from the tree
    #[arg(long, conflicts_with = "json")]
    pub render: bool,

    /// Print the tree as JSON
    #[arg(long)]
    pub json: bool,
}

struct NodePrinter<'t, W: Write> {
    tree: &'t HtmlTree,
    writer: W,
    palette: Palette,
    is_last_stack: Vec<bool>,
}

impl<'t, W: Write> NodePrinter<'t, W> {
    fn new(tree: &'t HtmlTree, writer: W, palette: Palette) -> Self {
        Self {
            tree,
            writer,
            palette,
            is_last_stack: Vec::new(),
        }
    }

    fn print(&mut self) -> io::Result<()> {
        writeln!(self.writer, "{}", self.palette.paint("root", |s| s.blue().bold()))?;
        self.print_children(self.tree.root())
    }

    fn print_children(&mut self, id: NodeId) -> io::Result<()> {
        let children = self.tree.children(id);
        for (i, &child) in children.iter().enumerate() {
            self.is_last_stack.push(i + 1 == children.len());
            self.print_line(child)?;
            self.print_children(child)?;
            self.is_last_stack.pop();
        }
        Ok(())
    }

    fn print_line(&mut self, id: NodeId) -> io::Result<()> {
        let Some(kind) = self.tree.kind(id) else {
            return Ok(());
        };
        write!(
            self.writer,
            "{}{}",
            tree_prefix(&self.is_last_stack),
            self.palette.paint(kind.type_name(), |s| s.cyan().bold())
        )?;
        if let Some(name) = kind.name() {
            write!(self.writer, " {}", self.palette.paint(name, Stylize::green))?;
            for attr in kind.attrs() {
                match &attr.value {
                    Some(value) => write!(
                        self.writer,
                        " {}",
                        self.palette.paint(format!("{}={value:?}", attr.name), Stylize::magenta)
                    )?,
                    None => write!(
                        self.writer,
                        " {}",
                        self.palette.paint(attr.name.as_str(), Stylize::magenta)
                    )?,
                }
            }
        }
        if let Some(text) = kind.text() {
            write!(self.writer, ": {}", self.palette.paint(truncate(text, 50), Stylize::yellow))?;
        }
        if let NodeKind::Entity(entity) = kind {
            let decoded = self.tree.text(id);
            if decoded != *entity {
                let decoded = format!("({decoded})");
                write!(self.writer, " {}", self.palette.paint(decoded, Stylize::dark_grey))?;
            }
        }
        writeln!(self.writer)
    }
}

pub fn run(args: &Args) -> anyhow::Result<()> {
    let source = read_input(args.file.as_deref())?;
    let tree = parse_html(&source);
    tracing::debug!(nodes = tree.len(), "parsed html fragment");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.render {
        write!(out, "{}", tree.render())?;
    } else if args.json {
        serde_json::to_writer_pretty(&mut out, &tree)?;
        writeln!(out)?;
    } else {
        NodePrinter::new(&tree, &mut out, Palette::for_stdout()).print()?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print(source: &str) -> anyhow::Result<Vec<String>> {
        let tree = parse_html(source);
        let mut out = Vec::new();
        NodePrinter::new(&tree, &mut out, Palette::plain()).print()?;
        Ok(String::from_utf8(out)?.lines().map(str::to_string).collect())
    }

    #[test]
    fn test_tree_output() -> anyhow::Result<()> {
        let lines = print("<p class=\"x\">a &amp; <br>b</p><!-- c -->")?;
        assert_eq!(
            lines,
            [
                "root",
                "├─ tag p class=\"x\"",
                "│  ├─ data: a ",
                "│  ├─ entity: &amp; (&)",
                "│  ├─ data:  ",
                "│  ├─ void_tag br",
                "│  └─ data: b",
                "└─ comment:  c ",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_bare_attribute_has_no_value() -> anyhow::Result<()> {
        let lines = print("<input disabled>")?;
        assert_eq!(lines, ["root", "└─ void_tag input disabled"]);
        Ok(())
    }
}
