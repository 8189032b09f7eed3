//! AMS math environments: `\begin{align*}` ... `\end{align*}`.
use crate::{BlockState, Error, MarkdownParser, Nesting, extensions::INTERRUPTS};

const ENVIRONMENTS: &[&str] = &[
    "equation", "multline", "gather", "align", "alignat", "flalign", "matrix", "pmatrix",
    "bmatrix", "Bmatrix", "vmatrix", "Vmatrix", "eqnarray",
];

/// # Errors
///
/// Fails if the `blockquote` rule was removed from the block ruler.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    md.block
        .ruler
        .before("blockquote", "amsmath", Box::new(amsmath), INTERRUPTS)
}

#[derive(Debug, PartialEq, Eq)]
struct Environment<'a> {
    name: &'a str,
    starred: bool,
    /// Byte offset just past `\end{...}`.
    end: usize,
}

/// Match `\begin{env}` at the start of `text` and find its `\end{env}`.
fn match_environment(text: &str) -> Option<Environment<'_>> {
    let rest = text.strip_prefix("\\begin{")?;
    let close = rest.find('}')?;
    let head = rest.get(..close)?;
    let (name, starred) = match head.strip_suffix('*') {
        Some(name) => (name, true),
        None => (head, false),
    };
    if !ENVIRONMENTS.contains(&name) {
        return None;
    }
    let end_marker = format!("\\end{{{head}}}");
    let end = text.find(&end_marker)? + end_marker.len();
    Some(Environment { name, starred, end })
}

pub fn amsmath(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    let Some(last) = end_line.checked_sub(1) else {
        return false;
    };
    let begin = state.lines.start(start_line);
    let limit = state.lines.end(last);
    let window = state.slice(begin, limit);
    let Some(environment) = match_environment(window) else {
        return false;
    };
    if silent {
        return true;
    }

    let consumed = window.get(..environment.end).unwrap_or_default();
    let content = consumed.to_string();
    let name = environment.name.to_string();
    let numbered = !environment.starred;
    state.line = start_line + consumed.matches('\n').count() + 1;
    let line = state.line;
    let token = state.push("amsmath", "math", Nesting::SelfClosing);
    token.block = true;
    token.content = content;
    token.set_meta("environment", name);
    token.set_meta("numbered", numbered);
    token.map = Some([start_line, line]);
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{Env, Extension, Extensions, MetaValue, Options, Token};

    fn parse(src: &str) -> Result<Vec<Token>, Error> {
        let options = Options::builder()
            .with_extensions(Extensions::only(&[Extension::AmsMath]))
            .build();
        Ok(MarkdownParser::new(options)?.parse(src, &mut Env::default()))
    }

    #[rstest]
    #[case("\\begin{align*}a\\end{align*}", Some(("align", true, 27)))]
    #[case("\\begin{equation}x\\end{equation} tail", Some(("equation", false, 31)))]
    #[case("\\begin{align}a\\end{align*}", None)]
    #[case("\\begin{figure}a\\end{figure}", None)]
    #[case("\\begin{align}", None)]
    fn test_match_environment(#[case] text: &str, #[case] expected: Option<(&str, bool, usize)>) {
        assert_eq!(
            match_environment(text).map(|env| (env.name, env.starred, env.end)),
            expected
        );
    }

    #[test]
    fn test_environment_token() -> Result<(), Error> {
        let tokens = parse("\\begin{gather*}\na = 1\n\\end{gather*}\nafter\n")?;
        let token = tokens.first();
        assert_eq!(token.map(|t| t.kind.as_str()), Some("amsmath"));
        assert_eq!(
            token.map(|t| t.content.as_str()),
            Some("\\begin{gather*}\na = 1\n\\end{gather*}")
        );
        assert_eq!(token.and_then(|t| t.meta_text("environment")), Some("gather"));
        assert_eq!(
            token.and_then(|t| t.meta.get("numbered")),
            Some(&MetaValue::Flag(false))
        );
        assert_eq!(token.and_then(|t| t.map), Some([0, 3]));
        assert_eq!(tokens.get(1).map(|t| t.kind.as_str()), Some("paragraph_open"));
        Ok(())
    }

    #[test]
    fn test_unstarred_environment_is_numbered() -> Result<(), Error> {
        let tokens = parse("\\begin{align}\nx\n\\end{align}\n")?;
        let token = tokens.first();
        assert_eq!(token.and_then(|t| t.meta_text("environment")), Some("align"));
        assert_eq!(
            token.and_then(|t| t.meta.get("numbered")),
            Some(&MetaValue::Flag(true))
        );
        assert_eq!(token.and_then(|t| t.map), Some([0, 3]));
        Ok(())
    }

    #[test]
    fn test_unclosed_environment_is_text() -> Result<(), Error> {
        let tokens = parse("\\begin{align}\na\n")?;
        assert_eq!(tokens.first().map(|t| t.kind.as_str()), Some("paragraph_open"));
        Ok(())
    }

    #[test]
    fn test_closing_outside_the_container_is_not_seen() -> Result<(), Error> {
        let tokens = parse("> \\begin{align}\n> a\n\n\\end{align}\n")?;
        assert!(tokens.iter().all(|t| !t.is("amsmath")));
        Ok(())
    }
}
