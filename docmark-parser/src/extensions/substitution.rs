//! Jinja-style substitutions: `{{ key }}` inline, or alone on a line as a
//! block. The delimiters are configurable; each is doubled in the source.
use crate::{
    BlockState, Error, Extension, InlineState, MarkdownParser, Nesting, SubstitutionOptions,
    extensions::{block_rule, inline_rule},
    inline::rules::text::is_terminator,
};

#[derive(Debug, Clone)]
struct Delimiters {
    open: String,
    close: String,
    markup: String,
}

impl Delimiters {
    fn new(options: &SubstitutionOptions) -> Result<Self, Error> {
        let start = options.start_delimiter.as_str();
        let end = options.end_delimiter.as_str();
        if start.is_empty() || end.is_empty() {
            return Err(Error::invalid_option(
                Extension::Substitution,
                "delimiters must not be empty",
            ));
        }
        if start == end {
            return Err(Error::invalid_option(
                Extension::Substitution,
                format!("start and end delimiters are both {start:?}"),
            ));
        }
        if !start.bytes().next().is_some_and(is_terminator) {
            return Err(Error::invalid_option(
                Extension::Substitution,
                format!("start delimiter {start:?} does not begin with a punctuation character"),
            ));
        }
        Ok(Self {
            open: start.repeat(2),
            close: end.repeat(2),
            markup: format!("{start}{end}"),
        })
    }
}

/// # Errors
///
/// Returns [`Error::InvalidOption`] for unusable delimiters, or fails if the
/// `fence` or `escape` base rules were removed.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    let delimiters = Delimiters::new(&md.options.substitution)?;
    let block = delimiters.clone();
    md.block.ruler.before(
        "fence",
        "substitution_block",
        block_rule(move |state, start_line, end_line, silent| {
            substitution_block(state, start_line, end_line, silent, &block)
        }),
        &[],
    )?;
    md.inline.ruler.before(
        "escape",
        "substitution_inline",
        inline_rule(move |state, silent| substitution_inline(state, silent, &delimiters)),
        &[],
    )
}

fn substitution_inline(state: &mut InlineState<'_>, silent: bool, delimiters: &Delimiters) -> bool {
    let start = state.pos;
    let max = state.pos_max;
    let src = state.slice(start, max);
    if !src.starts_with(&delimiters.open) {
        return false;
    }
    let body = delimiters.open.len();
    let Some(close) = src.get(body..).and_then(|rest| rest.find(&delimiters.close)) else {
        return false;
    };
    let text = src.get(body..body + close).unwrap_or_default().trim();
    state.pos = start + body + close + delimiters.close.len();
    if silent {
        return true;
    }
    let token = state.push("substitution_inline", "span", Nesting::SelfClosing);
    token.content = text.to_string();
    token.attr_set("class", "substitution");
    token.attr_set("text", text);
    token.markup.clone_from(&delimiters.markup);
    true
}

fn substitution_block(
    state: &mut BlockState<'_>,
    start_line: usize,
    _end_line: usize,
    silent: bool,
    delimiters: &Delimiters,
) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    let line = state.line_text(start_line).trim();
    let Some(inner) = line
        .strip_prefix(delimiters.open.as_str())
        .and_then(|rest| rest.strip_suffix(delimiters.close.as_str()))
    else {
        return false;
    };
    let text = inner.trim();
    // `{{a}} {{b}}` is two inline substitutions, not one block.
    if text.is_empty() || text.contains(delimiters.close.as_str()) {
        return false;
    }
    if silent {
        return true;
    }
    let text = text.to_string();
    state.line = start_line + 1;
    let token = state.push("substitution_block", "div", Nesting::SelfClosing);
    token.attr_set("class", "substitution");
    token.attr_set("text", text.as_str());
    token.content = text;
    token.markup.clone_from(&delimiters.markup);
    token.map = Some([start_line, start_line + 1]);
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{Env, Extensions, Options, Token};

    fn parser(start: &str, end: &str) -> Result<MarkdownParser, Error> {
        let options = Options::builder()
            .with_extensions(Extensions::only(&[Extension::Substitution]))
            .with_substitution_delimiters(start, end)
            .build();
        MarkdownParser::new(options)
    }

    fn summary(tokens: &[Token]) -> Vec<(&str, &str)> {
        tokens
            .iter()
            .map(|t| (t.kind.as_str(), t.content.as_str()))
            .collect()
    }

    #[test]
    fn test_inline_substitution() -> Result<(), Error> {
        let md = parser("{", "}")?;
        let tokens = md.parse_inline("Hi {{ name }}!", &mut Env::default());
        let children = tokens
            .into_iter()
            .flat_map(|t| t.children.unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(
            summary(&children),
            vec![("text", "Hi "), ("substitution_inline", "name"), ("text", "!")]
        );
        let token = children.get(1);
        assert_eq!(token.and_then(|t| t.attr_get("class")), Some("substitution"));
        assert_eq!(token.and_then(|t| t.attr_get("text")), Some("name"));
        assert_eq!(token.map(|t| t.markup.as_str()), Some("{}"));
        Ok(())
    }

    #[test]
    fn test_block_substitution() -> Result<(), Error> {
        let md = parser("{", "}")?;
        let tokens = md.parse("  {{ key.path }}  \npara\n", &mut Env::default());
        let first = tokens.first();
        assert_eq!(first.map(|t| t.kind.as_str()), Some("substitution_block"));
        assert_eq!(first.map(|t| t.content.as_str()), Some("key.path"));
        assert_eq!(first.and_then(|t| t.map), Some([0, 1]));
        assert_eq!(tokens.get(1).map(|t| t.kind.as_str()), Some("paragraph_open"));
        Ok(())
    }

    #[test]
    fn test_two_on_one_line_stay_inline() -> Result<(), Error> {
        let md = parser("{", "}")?;
        let tokens = md.parse("{{a}} {{b}}\n", &mut Env::default());
        assert_eq!(tokens.first().map(|t| t.kind.as_str()), Some("paragraph_open"));
        let inline = tokens.get(1).and_then(|t| t.children.as_ref());
        let count = inline.map_or(0, |children| {
            children.iter().filter(|t| t.is("substitution_inline")).count()
        });
        assert_eq!(count, 2);
        Ok(())
    }

    #[test]
    fn test_custom_delimiters() -> Result<(), Error> {
        let md = parser("<", ">")?;
        let tokens = md.parse("<< key >>\n", &mut Env::default());
        assert_eq!(summary(&tokens), vec![("substitution_block", "key")]);
        assert_eq!(tokens.first().map(|t| t.markup.as_str()), Some("<>"));
        Ok(())
    }

    #[test]
    fn test_unclosed_is_text() -> Result<(), Error> {
        let md = parser("{", "}")?;
        let tokens = md.parse_inline("{{ open", &mut Env::default());
        let children = tokens
            .into_iter()
            .flat_map(|t| t.children.unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(summary(&children), vec![("text", "{{ open")]);
        Ok(())
    }

    #[rstest]
    #[case("", "}")]
    #[case("{", "")]
    #[case("|", "|")]
    #[case("a", "b")]
    fn test_invalid_delimiters(#[case] start: &str, #[case] end: &str) {
        let error = parser(start, end).err();
        assert!(
            matches!(error, Some(Error::InvalidOption(Extension::Substitution, _))),
            "{error:?}"
        );
        assert!(error.and_then(|e| e.advice()).is_some());
    }
}
