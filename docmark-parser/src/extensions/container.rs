//! Named containers: `::: name params` ... `:::`.
//!
//! One block rule is registered per configured name. The closing fence must
//! repeat the marker at least as many times as the opening one, so a longer
//! fence can enclose shorter ones.
use crate::{
    BlockState, Error, Extension, MarkdownParser, Nesting, ParentType,
    block::container::{Closing, ContainerMatcher, Marker},
    extensions::{INTERRUPTS, block_rule},
};

/// # Errors
///
/// Fails on an empty marker or an empty or whitespace-containing name, or if
/// the `fence` rule was removed from the block ruler.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    let options = md.options.containers.clone();
    if options.marker.is_empty() {
        return Err(Error::invalid_option(Extension::Container, "empty marker"));
    }
    for name in options.names {
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(Error::invalid_option(
                Extension::Container,
                format!("invalid container name {name:?}"),
            ));
        }
        let matcher = ContainerMatcher::new(
            Marker::Pattern(options.marker.clone()),
            3,
            Closing::Marker,
        );
        let rule_name = format!("container_{name}");
        md.block.ruler.before(
            "fence",
            &rule_name,
            block_rule(move |state, start_line, end_line, silent| {
                container(state, start_line, end_line, silent, &matcher, &name)
            }),
            INTERRUPTS,
        )?;
    }
    Ok(())
}

/// The first word of the parameters must be the container's name.
fn names_match(params: &str, name: &str) -> bool {
    params.split_whitespace().next() == Some(name)
}

pub fn container(
    state: &mut BlockState<'_>,
    start_line: usize,
    end_line: usize,
    silent: bool,
    matcher: &ContainerMatcher,
    name: &str,
) -> bool {
    let Some(opening) = matcher.open(state, start_line, |opening| {
        names_match(&opening.params, name)
    }) else {
        return false;
    };
    if silent {
        return true;
    }

    let md = state.md;
    let close = matcher.find_close(state, &opening, end_line);

    let token = state.push(&format!("container_{name}_open"), "div", Nesting::Opening);
    token.markup.clone_from(&opening.markup);
    token.info.clone_from(&opening.params);
    token.map = Some([start_line, close.line]);

    {
        let mut scope =
            ContainerMatcher::body_scope(state, &opening, &close, ParentType::Container);
        md.block.tokenize(&mut scope, start_line + 1, close.line);
    }

    let token = state.push(&format!("container_{name}_close"), "div", Nesting::Closing);
    token.markup.clone_from(&close.markup);
    token.map = Some(close.map());
    state.line = close.next_line();
    tracing::trace!(name, start_line, end = state.line, "container");
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{Env, Extensions, Options, Token};

    fn parser(names: &[&str], marker: &str) -> Result<MarkdownParser, Error> {
        let options = Options::builder()
            .with_extensions(Extensions::only(&[Extension::Container]))
            .with_container_names(names.iter().copied())
            .with_container_marker(marker)
            .build();
        MarkdownParser::new(options)
    }

    fn summary(tokens: &[Token]) -> Vec<(String, usize)> {
        tokens.iter().map(|t| (t.kind.clone(), t.level)).collect()
    }

    #[test]
    fn test_named_container() -> Result<(), Error> {
        let md = parser(&["note"], ":")?;
        let tokens = md.parse(":::note\nhello\n:::", &mut Env::default());
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "container_note_open",
                "paragraph_open",
                "inline",
                "paragraph_close",
                "container_note_close",
            ]
        );
        assert_eq!(tokens.first().map(|t| t.markup.as_str()), Some(":::"));
        assert_eq!(tokens.first().map(|t| t.info.as_str()), Some("note"));
        assert_eq!(tokens.first().and_then(|t| t.map), Some([0, 2]));
        Ok(())
    }

    #[test]
    fn test_longer_fence_encloses_shorter() -> Result<(), Error> {
        let md = parser(&["outer", "inner"], ":")?;
        let tokens = md.parse("::::outer\n:::inner\nx\n:::\n::::", &mut Env::default());
        assert_eq!(
            summary(&tokens),
            vec![
                ("container_outer_open".to_string(), 0),
                ("container_inner_open".to_string(), 1),
                ("paragraph_open".to_string(), 2),
                ("inline".to_string(), 3),
                ("paragraph_close".to_string(), 2),
                ("container_inner_close".to_string(), 1),
                ("container_outer_close".to_string(), 0),
            ]
        );
        Ok(())
    }

    #[rstest]
    #[case(":::", true)]
    #[case("::", false)]
    #[case(":::::", true)]
    #[case("::: x", false)]
    fn test_closing_length(#[case] closer: &str, #[case] closes: bool) -> Result<(), Error> {
        let md = parser(&["note"], ":")?;
        let tokens = md.parse(&format!("::: note\na\n{closer}\nafter\n"), &mut Env::default());
        let close = tokens.iter().find(|t| t.is("container_note_close"));
        assert_eq!(close.map(|t| t.markup == closer), Some(closes));
        Ok(())
    }

    #[test]
    fn test_unterminated_container_closes_at_end() -> Result<(), Error> {
        let md = parser(&["note"], ":")?;
        let tokens = md.parse("::: note\na\n\nb\n", &mut Env::default());
        let close = tokens.last();
        assert_eq!(close.map(|t| t.kind.as_str()), Some("container_note_close"));
        assert_eq!(close.and_then(|t| t.map), Some([3, 4]));
        assert_eq!(close.map(|t| t.markup.as_str()), Some(":::"));
        Ok(())
    }

    #[test]
    fn test_other_names_are_ignored() -> Result<(), Error> {
        let md = parser(&["note"], ":")?;
        let tokens = md.parse("::: warning\nx\n:::\n", &mut Env::default());
        assert!(tokens.iter().all(|t| !t.kind.starts_with("container_")));
        Ok(())
    }

    #[test]
    fn test_multi_char_marker() -> Result<(), Error> {
        let md = parser(&["spoiler"], "+-")?;
        let tokens = md.parse("+-+-+- spoiler\nx\n+-+-+-\n", &mut Env::default());
        assert_eq!(tokens.first().map(|t| t.markup.as_str()), Some("+-+-+-"));
        assert_eq!(tokens.last().map(|t| t.kind.as_str()), Some("container_spoiler_close"));
        Ok(())
    }

    #[rstest]
    #[case(&["bad name"], ":")]
    #[case(&[""], ":")]
    #[case(&["note"], "")]
    fn test_invalid_options(#[case] names: &[&str], #[case] marker: &str) {
        let error = parser(names, marker).err();
        assert!(matches!(
            error,
            Some(Error::InvalidOption(Extension::Container, _))
        ));
    }
}
