//! Front matter: a `---` fenced block on the very first line of the document.
//!
//! The body is kept verbatim in a hidden `front_matter` token; interpreting
//! it (YAML, TOML, ...) is up to the consumer.
use std::sync::LazyLock;

use crate::{
    BlockState, Error, MarkdownParser, Nesting,
    block::container::{Closing, ContainerMatcher, Marker, is_blank},
};

static FRONT_MATTER: LazyLock<ContainerMatcher> =
    LazyLock::new(|| ContainerMatcher::new(Marker::Run(vec![b'-']), 3, Closing::Marker));

/// # Errors
///
/// Fails if the `code` rule was removed from the block ruler.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    md.block
        .ruler
        .before("code", "front_matter", Box::new(front_matter), &[])
}

pub fn front_matter(
    state: &mut BlockState<'_>,
    start_line: usize,
    end_line: usize,
    silent: bool,
) -> bool {
    // Only the first byte of the document can open front matter; a nested
    // scope starting at line 0 has its line start shifted past it.
    if start_line != 0 || state.lines.start(0) != 0 || state.level != 0 {
        return false;
    }
    let Some(opening) = FRONT_MATTER.open(state, start_line, |opening| is_blank(&opening.params))
    else {
        return false;
    };
    if silent {
        return true;
    }

    let close = FRONT_MATTER.find_close(state, &opening, end_line);
    let content = state.get_lines(start_line + 1, close.line, 0, false);
    state.line = close.next_line();
    let line = state.line;
    let token = state.push("front_matter", "", Nesting::SelfClosing);
    token.hidden = true;
    token.markup = opening.markup;
    token.content = content;
    token.map = Some([start_line, line]);
    tracing::trace!(lines = line, explicit = close.explicit, "front matter");
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{Env, Extension, Extensions, MarkdownParser, Options, Token};

    fn parse(src: &str) -> Result<Vec<Token>, crate::Error> {
        let options = Options::builder()
            .with_extensions(Extensions::only(&[Extension::FrontMatter]))
            .build();
        let md = MarkdownParser::new(options)?;
        Ok(md.parse(src, &mut Env::default()))
    }

    #[test]
    fn test_front_matter_token() -> Result<(), crate::Error> {
        let tokens = parse("---\ntitle: x\ntags: [a]\n---\n# Heading\n")?;
        let first = tokens.first();
        assert_eq!(first.map(|t| t.kind.as_str()), Some("front_matter"));
        assert_eq!(first.map(|t| t.content.as_str()), Some("title: x\ntags: [a]"));
        assert_eq!(first.map(|t| t.hidden), Some(true));
        assert_eq!(first.and_then(|t| t.map), Some([0, 4]));
        assert_eq!(tokens.get(1).map(|t| t.kind.as_str()), Some("heading_open"));
        Ok(())
    }

    #[test]
    fn test_unterminated_front_matter_runs_to_end() -> Result<(), crate::Error> {
        let tokens = parse("---\na: 1\nb: 2\n")?;
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens.first().map(|t| t.content.as_str()), Some("a: 1\nb: 2"));
        assert_eq!(tokens.first().and_then(|t| t.map), Some([0, 3]));
        Ok(())
    }

    #[test]
    fn test_only_at_document_start() -> Result<(), crate::Error> {
        let tokens = parse("text\n\n---\na: 1\n---\n")?;
        assert!(tokens.iter().all(|t| !t.is("front_matter")));
        let tokens = parse("- ---\n  a\n  ---\n")?;
        assert!(tokens.iter().all(|t| !t.is("front_matter")));
        Ok(())
    }

    #[test]
    fn test_marker_with_trailing_text_is_rejected() -> Result<(), crate::Error> {
        let tokens = parse("--- x\n")?;
        assert!(tokens.iter().all(|t| !t.is("front_matter")));
        Ok(())
    }
}
