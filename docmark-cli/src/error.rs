use std::process::exit;

use docmark_parser::Error as ParserError;
use miette::Diagnostic;

/// A parser configuration error, carrying the parser's advice as help text
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(docmark::parser))]
pub(crate) struct ParserDiagnostic {
    message: String,

    #[help]
    advice: Option<String>,
}

impl From<&ParserError> for ParserDiagnostic {
    fn from(error: &ParserError) -> Self {
        Self {
            message: error.to_string(),
            advice: error.advice().map(str::to_string),
        }
    }
}

/// Build the report for `e`. A parser error anywhere in the chain becomes the
/// diagnostic, wrapped in the outer context when there is any.
pub(crate) fn report(e: &anyhow::Error) -> miette::Report {
    let parser_error = e.chain().find_map(|cause| cause.downcast_ref::<ParserError>());
    match parser_error {
        Some(parser_error) => {
            let report = miette::Report::new(ParserDiagnostic::from(parser_error));
            if e.to_string() == parser_error.to_string() {
                report
            } else {
                report.wrap_err(e.to_string())
            }
        }
        None => miette::miette!("{e:#}"),
    }
}

pub(crate) fn display(e: &anyhow::Error) -> ! {
    eprintln!("{:?}", report(e));
    exit(1);
}

#[cfg(test)]
mod tests {
    use docmark_parser::Extension;

    use super::*;

    fn unknown_extension() -> anyhow::Error {
        match "nope".parse::<Extension>() {
            Ok(extension) => anyhow::anyhow!("unexpectedly parsed {extension:?}"),
            Err(error) => error.into(),
        }
    }

    #[test]
    fn test_parser_error_carries_advice() {
        let error = unknown_extension();
        let report = report(&error);
        assert_eq!(report.to_string(), "unknown extension: nope");
        let help = report.help().map(|help| help.to_string());
        assert!(help.is_some_and(|help| help.starts_with("Known extensions:")));
    }

    #[test]
    fn test_context_wraps_parser_diagnostic() {
        let error = unknown_extension().context("reading config demo.json");
        let report = report(&error);
        assert_eq!(report.to_string(), "reading config demo.json");
        let inner = report.chain().nth(1).map(ToString::to_string);
        assert_eq!(inner.as_deref(), Some("unknown extension: nope"));
    }

    #[test]
    fn test_other_errors_keep_their_chain() {
        let error = anyhow::anyhow!("disk on fire").context("reading a.md");
        let report = report(&error);
        assert_eq!(report.to_string(), "reading a.md: disk on fire");
        assert!(report.help().is_none());
    }
}
