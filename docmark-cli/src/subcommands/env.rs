use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::Args as ClapArgs;
use docmark_parser::{Document, Env, MarkdownParser, Options};
use serde::Serialize;

use super::{ParserArgs, read_input};

/// Print what parsing a document leaves behind besides tokens
#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Markdown file to parse; standard input when omitted
    pub file: Option<PathBuf>,

    /// Include the token count in the output
    #[arg(long)]
    pub count_tokens: bool,

    #[command(flatten)]
    pub parser: ParserArgs,
}

#[derive(Serialize)]
struct Summary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<usize>,
    env: &'a Env,
}

fn summarize(source: &str, options: &Options, count_tokens: bool) -> anyhow::Result<serde_json::Value> {
    let Document { tokens, env } = docmark_parser::parse(source, options)?;
    let summary = Summary {
        tokens: count_tokens.then_some(tokens.len()),
        env: &env,
    };
    Ok(serde_json::to_value(summary)?)
}

pub fn run(args: &Args) -> anyhow::Result<()> {
    let options = args.parser.options()?;
    // Surface configuration errors before waiting on stdin.
    MarkdownParser::new(options.clone())?;
    let source = read_input(args.file.as_deref())?;
    let summary = summarize(&source, &options, args.count_tokens)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &summary)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
