use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod error;
mod subcommands;

/// Inspect how docmark tokenizes Markdown documents and HTML fragments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the token stream of one or more documents
    Tokens(subcommands::tokens::Args),

    /// Parse an HTML fragment and print its tree or rendering
    Html(subcommands::html::Args),

    /// Print the side results of parsing a document (references, footnotes, word count)
    Env(subcommands::env::Args),
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Tokens(args) => subcommands::tokens::run(args),
        Command::Html(args) => subcommands::html::run(args),
        Command::Env(args) => subcommands::env::run(args),
    };

    if let Err(e) = result {
        error::display(&e);
    }
}
