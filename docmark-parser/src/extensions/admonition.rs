//! Admonitions: `!!! note "Title"` followed by an indented body.
//!
//! `???` makes the admonition collapsible (closed by default), `???+`
//! collapsible and open. The body ends at the first non-blank line indented
//! less than the body, or after two blank lines.
use std::sync::LazyLock;

use crate::{
    BlockState, Error, MarkdownParser, Nesting, ParentType,
    block::container::{Closing, ContainerMatcher, Marker},
    extensions::INTERRUPTS,
};

static ADMONITION: LazyLock<ContainerMatcher> = LazyLock::new(|| {
    ContainerMatcher::new(
        Marker::Fixed(vec!["!!!".to_string(), "???".to_string(), "???+".to_string()]),
        1,
        Closing::Indent,
    )
});

/// # Errors
///
/// Fails if the `fence` rule was removed from the block ruler.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    md.block
        .ruler
        .before("fence", "admonition", Box::new(admonition), INTERRUPTS)
}

/// Split the parameters into the lowercased tag and the title.
///
/// Without an explicit title the tag doubles as one; `""` suppresses it.
fn split_tag(params: &str) -> (String, String) {
    let params = params.trim();
    if params.is_empty() {
        return (String::new(), String::new());
    }
    let (tag, rest) = params.split_once(' ').unwrap_or((params, ""));
    let title = if rest.is_empty() {
        title_case(tag)
    } else if rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
        rest.get(1..rest.len() - 1).unwrap_or_default().to_string()
    } else {
        rest.to_string()
    };
    (tag.to_lowercase(), title)
}

fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut after_letter = false;
    for c in word.chars() {
        if after_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    out
}

fn extra_classes(markup: &str) -> &'static str {
    match (markup.starts_with('?'), markup.ends_with('+')) {
        (true, true) => " is-collapsible collapsible-open",
        (true, false) => " is-collapsible collapsible-closed",
        (false, _) => "",
    }
}

pub fn admonition(
    state: &mut BlockState<'_>,
    start_line: usize,
    end_line: usize,
    silent: bool,
) -> bool {
    let Some(opening) =
        ADMONITION.open(state, start_line, |opening| !opening.params.trim().is_empty())
    else {
        return false;
    };
    if silent {
        return true;
    }

    let md = state.md;
    let close = ADMONITION.find_close(state, &opening, end_line);
    let (tag, title) = split_tag(&opening.params);
    let markup = opening.markup.clone();

    let token = state.push("admonition_open", "div", Nesting::Opening);
    token.markup.clone_from(&markup);
    token.attr_set("class", format!("admonition {tag}{}", extra_classes(&markup)));
    token.set_meta("tag", tag.as_str());
    token.content.clone_from(&title);
    token.info.clone_from(&opening.params);
    token.map = Some([start_line, close.line]);

    if !title.is_empty() {
        let token = state.push("admonition_title_open", "p", Nesting::Opening);
        token.markup = format!("{markup} {tag}");
        token.attr_set("class", "admonition-title");
        token.map = Some([start_line, start_line + 1]);

        let token = state.push("inline", "", Nesting::SelfClosing);
        token.content = title;
        token.map = Some([start_line, start_line + 1]);
        token.children = Some(Vec::new());

        state.push("admonition_title_close", "p", Nesting::Closing);
    }

    {
        let mut scope =
            ContainerMatcher::body_scope(state, &opening, &close, ParentType::Admonition);
        md.block.tokenize(&mut scope, start_line + 1, close.line);
    }

    let token = state.push("admonition_close", "div", Nesting::Closing);
    token.markup = markup;
    token.map = Some(close.map());
    state.line = close.next_line();
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{Env, Extension, Extensions, Options, Token};

    fn parse(src: &str) -> Result<Vec<Token>, Error> {
        let options = Options::builder()
            .with_extensions(Extensions::only(&[Extension::Admonition]))
            .build();
        let md = MarkdownParser::new(options)?;
        Ok(md.parse(src, &mut Env::default()))
    }

    fn kinds(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.kind.as_str()).collect()
    }

    #[rstest]
    #[case("note", "note", "Note")]
    #[case("Danger", "danger", "Danger")]
    #[case("my-tag", "my-tag", "My-Tag")]
    #[case("note Read this", "note", "Read this")]
    #[case("note \"Quoted title\"", "note", "Quoted title")]
    #[case("note \"\"", "note", "")]
    #[case("   ", "", "")]
    fn test_split_tag(#[case] params: &str, #[case] tag: &str, #[case] title: &str) {
        assert_eq!(split_tag(params), (tag.to_string(), title.to_string()));
    }

    #[test]
    fn test_admonition_with_default_title() -> Result<(), Error> {
        let tokens = parse("!!! note\n    Body text\n")?;
        assert_eq!(
            kinds(&tokens),
            vec![
                "admonition_open",
                "admonition_title_open",
                "inline",
                "admonition_title_close",
                "paragraph_open",
                "inline",
                "paragraph_close",
                "admonition_close",
            ]
        );
        let open = tokens.first();
        assert_eq!(open.and_then(|t| t.attr_get("class")), Some("admonition note"));
        assert_eq!(open.and_then(|t| t.meta_text("tag")), Some("note"));
        assert_eq!(open.and_then(|t| t.map), Some([0, 2]));
        assert_eq!(tokens.get(2).map(|t| t.content.as_str()), Some("Note"));
        assert_eq!(tokens.get(5).map(|t| t.content.as_str()), Some("Body text"));
        assert_eq!(tokens.get(4).map(|t| t.level), Some(1));
        Ok(())
    }

    #[rstest]
    #[case("???", "admonition tip is-collapsible collapsible-closed")]
    #[case("???+", "admonition tip is-collapsible collapsible-open")]
    #[case("!!!", "admonition tip")]
    fn test_collapsible_classes(#[case] marker: &str, #[case] class: &str) -> Result<(), Error> {
        let tokens = parse(&format!("{marker} tip\n    x\n"))?;
        assert_eq!(tokens.first().and_then(|t| t.attr_get("class")), Some(class));
        assert_eq!(tokens.first().map(|t| t.markup.as_str()), Some(marker));
        Ok(())
    }

    #[test]
    fn test_empty_title_has_no_title_tokens() -> Result<(), Error> {
        let tokens = parse("!!! tip \"\"\n    x\n")?;
        assert_eq!(
            kinds(&tokens),
            vec![
                "admonition_open",
                "paragraph_open",
                "inline",
                "paragraph_close",
                "admonition_close",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_two_blank_lines_close_the_body() -> Result<(), Error> {
        let tokens = parse("!!! note\n    a\n\n\n    b\n")?;
        let close = tokens.iter().position(|t| t.is("admonition_close"));
        assert_eq!(close, Some(7));
        assert_eq!(tokens.get(8).map(|t| t.kind.as_str()), Some("code_block"));
        assert_eq!(tokens.get(7).and_then(|t| t.map), Some([2, 3]));
        Ok(())
    }

    #[test]
    fn test_marker_without_tag_is_text() -> Result<(), Error> {
        let tokens = parse("!!!\n")?;
        assert_eq!(kinds(&tokens), vec!["paragraph_open", "inline", "paragraph_close"]);
        Ok(())
    }

    #[test]
    fn test_admonition_interrupts_paragraph() -> Result<(), Error> {
        let tokens = parse("para\n!!! note\n    x\n")?;
        assert_eq!(tokens.get(3).map(|t| t.kind.as_str()), Some("admonition_open"));
        Ok(())
    }

    #[test]
    fn test_nested_admonitions() -> Result<(), Error> {
        let tokens = parse("!!! note\n    !!! tip\n        inner\n    outer\n")?;
        let opens: Vec<_> = tokens
            .iter()
            .filter(|t| t.is("admonition_open"))
            .map(|t| t.level)
            .collect();
        assert_eq!(opens, vec![0, 1]);
        let inline: Vec<_> = tokens
            .iter()
            .filter(|t| t.is("inline"))
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(inline, vec!["Note", "Tip", "inner", "outer"]);
        Ok(())
    }
}
