//! Colon fences: like backtick fences but opened with `:::`, emitting a
//! `colon_fence` token whose body is left unparsed for directive handlers.
use std::sync::LazyLock;

use crate::{
    BlockState, Error, MarkdownParser, Nesting,
    block::container::{Closing, ContainerMatcher, Marker},
    extensions::INTERRUPTS,
};

static COLON_FENCE: LazyLock<ContainerMatcher> =
    LazyLock::new(|| ContainerMatcher::new(Marker::Run(vec![b':']), 3, Closing::Marker));

/// # Errors
///
/// Fails if the `fence` rule was removed from the block ruler.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    md.block
        .ruler
        .before("fence", "colon_fence", Box::new(colon_fence), INTERRUPTS)
}

pub fn colon_fence(
    state: &mut BlockState<'_>,
    start_line: usize,
    end_line: usize,
    silent: bool,
) -> bool {
    let Some(opening) = COLON_FENCE.open(state, start_line, |_| true) else {
        return false;
    };
    if silent {
        return true;
    }

    let close = COLON_FENCE.find_close(state, &opening, end_line);
    let content = ContainerMatcher::verbatim(state, &opening, &close);
    state.line = close.next_line();
    let line = state.line;
    let token = state.push("colon_fence", "code", Nesting::SelfClosing);
    token.info = opening.params.trim().to_string();
    token.content = content;
    token.markup = opening.markup;
    token.map = Some([start_line, line]);
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Env, Extension, Extensions, Options, Token};

    fn parse(extensions: &[Extension], src: &str) -> Result<Vec<Token>, Error> {
        let options = Options::builder()
            .with_extensions(Extensions::only(extensions))
            .build();
        let md = MarkdownParser::new(options)?;
        Ok(md.parse(src, &mut Env::default()))
    }

    #[test]
    fn test_colon_fence_keeps_body_verbatim() -> Result<(), Error> {
        let tokens = parse(&[Extension::ColonFence], "::: {note} title\n*not* parsed\n:::\n")?;
        assert_eq!(tokens.len(), 1);
        let fence = tokens.first();
        assert_eq!(fence.map(|t| t.info.as_str()), Some("{note} title"));
        assert_eq!(fence.map(|t| t.content.as_str()), Some("*not* parsed\n"));
        assert_eq!(fence.and_then(|t| t.map), Some([0, 3]));
        Ok(())
    }

    #[test]
    fn test_indented_fence_strips_its_indent() -> Result<(), Error> {
        let tokens = parse(&[Extension::ColonFence], "  ::::\n  a\n    b\n  ::::\n")?;
        assert_eq!(tokens.first().map(|t| t.content.as_str()), Some("a\n  b\n"));
        Ok(())
    }

    #[test]
    fn test_named_container_takes_precedence() -> Result<(), Error> {
        let tokens = parse(
            &[Extension::Container, Extension::ColonFence],
            "::: note\nx\n:::\n::: other\ny\n:::\n",
        )?;
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "container_note_open",
                "paragraph_open",
                "inline",
                "paragraph_close",
                "container_note_close",
                "colon_fence",
            ]
        );
        Ok(())
    }
}
