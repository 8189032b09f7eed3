//! Definition lists.
//!
//! ```text
//! Term
//! : Definition, indented body continues
//!   at two columns.
//! ~ A second definition
//! ```
use crate::{
    BlockState, Error, LineRecord, MarkdownParser, Nesting, ParentType, ScopedState,
    block::rules::list::mark_tight_paragraphs, common::utils::signed,
};

/// # Errors
///
/// Fails if the `paragraph` rule was removed from the block ruler.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    md.block.ruler.before(
        "paragraph",
        "deflist",
        Box::new(deflist),
        &["paragraph", "reference", "blockquote"],
    )
}

/// Position right after a `:` or `~` definition marker on `line`. The marker
/// must be followed by whitespace and then some content.
fn skip_marker(state: &BlockState<'_>, line: usize) -> Option<usize> {
    let start = state.lines.start(line);
    let max = state.lines.end(line);
    if start >= max || !matches!(state.byte(start), Some(b':' | b'~')) {
        return None;
    }
    let after = start + 1;
    let pos = state.skip_spaces(after);
    (pos != after && pos < max).then_some(after)
}

#[allow(clippy::too_many_lines)]
pub fn deflist(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    if silent {
        // Only validates a following definition, used to end a paragraph
        // inside one.
        return state.dd_indent >= 0 && skip_marker(state, start_line).is_some();
    }

    let mut next_line = start_line + 1;
    if next_line >= end_line {
        return false;
    }
    if state.is_empty(next_line) {
        next_line += 1;
        if next_line >= end_line {
            return false;
        }
    }
    if state.lines.indent(next_line) < state.blk_indent {
        return false;
    }
    let Some(mut content_start) = skip_marker(state, next_line) else {
        return false;
    };

    let md = state.md;
    let list_open = state.tokens.len();
    let mut tight = true;
    state.push("dl_open", "dl", Nesting::Opening);

    let mut dt_line = start_line;
    let mut dd_line = next_line;
    'terms: loop {
        let mut prev_empty_end = false;

        let content = state
            .get_lines(dt_line, dt_line + 1, state.blk_indent, false)
            .trim()
            .to_string();
        state.push("dt_open", "dt", Nesting::Opening).map = Some([dt_line, dt_line + 1]);
        let token = state.push("inline", "", Nesting::SelfClosing);
        token.map = Some([dt_line, dt_line + 1]);
        token.content = content;
        token.children = Some(Vec::new());
        state.push("dt_close", "dt", Nesting::Closing);

        loop {
            let dd_open = state.tokens.len();
            state.push("dd_open", "dd", Nesting::Opening);

            let max = state.lines.end(dd_line);
            let dd_begin = state.lines.begin(dd_line);
            let mut offset = state.lines.indent(dd_line)
                + signed(content_start - state.lines.start(dd_line));
            let mut pos = content_start;
            while pos < max {
                match state.byte(pos) {
                    Some(b'\t') => offset += 4 - offset % 4,
                    Some(b' ') => offset += 1,
                    Some(_) | None => break,
                }
                pos += 1;
            }
            content_start = pos;

            {
                let mut scope = ScopedState::new(state);
                let body_indent = scope.lines.indent(dd_line) + 2;
                scope.blk_indent = body_indent;
                scope.dd_indent = body_indent;
                scope.tight = true;
                scope.parent_type = ParentType::Deflist;
                let tab_offset = scope.lines.tab_offset(dd_line);
                scope.override_line(
                    dd_line,
                    LineRecord {
                        begin: dd_begin,
                        shift: content_start - dd_begin,
                        indent: offset,
                        tab_offset,
                    },
                );
                md.block.tokenize(&mut scope, dd_line, end_line);
                if !scope.tight || prev_empty_end {
                    tight = false;
                }
                let line = scope.line;
                prev_empty_end = line.saturating_sub(dd_line) > 1 && scope.is_empty(line - 1);
            }

            state.push("dd_close", "dd", Nesting::Closing);
            next_line = state.line;
            if let Some(token) = state.tokens.get_mut(dd_open) {
                token.map = Some([dd_line, next_line]);
            }

            if next_line >= end_line || state.lines.indent(next_line) < state.blk_indent {
                break 'terms;
            }
            let Some(start) = skip_marker(state, next_line) else {
                break;
            };
            content_start = start;
            dd_line = next_line;
        }

        if next_line >= end_line {
            break;
        }
        dt_line = next_line;
        if state.is_empty(dt_line) || state.lines.indent(dt_line) < state.blk_indent {
            break;
        }
        dd_line = dt_line + 1;
        if dd_line < end_line && state.is_empty(dd_line) {
            dd_line += 1;
        }
        if dd_line >= end_line || state.lines.indent(dd_line) < state.blk_indent {
            break;
        }
        let Some(start) = skip_marker(state, dd_line) else {
            break;
        };
        content_start = start;
    }

    state.push("dl_close", "dl", Nesting::Closing);
    if let Some(token) = state.tokens.get_mut(list_open) {
        token.map = Some([start_line, next_line]);
    }
    state.line = next_line;
    if tight {
        mark_tight_paragraphs(state, list_open);
    }
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{Env, Extension, Extensions, Options, Token};

    fn parser() -> Result<MarkdownParser, Error> {
        let options = Options::builder()
            .with_extensions(Extensions::only(&[Extension::Deflist]))
            .build();
        MarkdownParser::new(options)
    }

    fn parse(src: &str) -> Result<Vec<Token>, Error> {
        Ok(parser()?.parse(src, &mut Env::default()))
    }

    fn summary(tokens: &[Token]) -> Vec<(&str, usize, bool)> {
        tokens
            .iter()
            .map(|t| (t.kind.as_str(), t.level, t.hidden))
            .collect()
    }

    #[test]
    fn test_tight_definition_list() -> Result<(), Error> {
        let tokens = parse("Term\n: Definition\n")?;
        assert_eq!(
            summary(&tokens),
            vec![
                ("dl_open", 0, false),
                ("dt_open", 1, false),
                ("inline", 2, false),
                ("dt_close", 1, false),
                ("dd_open", 1, false),
                ("paragraph_open", 2, true),
                ("inline", 3, false),
                ("paragraph_close", 2, true),
                ("dd_close", 1, false),
                ("dl_close", 0, false),
            ]
        );
        assert_eq!(tokens.get(2).map(|t| t.content.as_str()), Some("Term"));
        assert_eq!(tokens.get(6).map(|t| t.content.as_str()), Some("Definition"));
        assert_eq!(tokens.first().and_then(|t| t.map), Some([0, 2]));
        Ok(())
    }

    #[test]
    fn test_several_definitions_per_term() -> Result<(), Error> {
        let tokens = parse("Term\n: one\n~ two\n")?;
        let definitions: Vec<_> = tokens
            .iter()
            .filter(|t| t.is("inline"))
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(definitions, vec!["Term", "one", "two"]);
        assert_eq!(tokens.iter().filter(|t| t.is("dd_open")).count(), 2);
        Ok(())
    }

    #[test]
    fn test_loose_list_keeps_paragraphs() -> Result<(), Error> {
        let tokens = parse("A\n: a\n\n: b\n")?;
        assert_eq!(tokens.iter().filter(|t| t.is("dd_open")).count(), 2);
        assert!(
            tokens
                .iter()
                .filter(|t| t.is("paragraph_open"))
                .all(|t| !t.hidden)
        );
        Ok(())
    }

    #[test]
    fn test_blank_line_before_next_term_stays_tight() -> Result<(), Error> {
        let tokens = parse("A\n\n: a\n\nB\n: b\n")?;
        assert_eq!(tokens.iter().filter(|t| t.is("dt_open")).count(), 2);
        assert!(
            tokens
                .iter()
                .filter(|t| t.is("paragraph_open"))
                .all(|t| t.hidden)
        );
        Ok(())
    }

    #[test]
    fn test_definition_body_spans_indented_lines() -> Result<(), Error> {
        let tokens = parse("Term\n:   first\n\n    second\nafter\n")?;
        let inline: Vec<_> = tokens
            .iter()
            .filter(|t| t.is("inline"))
            .map(|t| (t.content.as_str(), t.level))
            .collect();
        assert_eq!(
            inline,
            vec![("Term", 2), ("first", 3), ("second\nafter", 3)]
        );
        Ok(())
    }

    #[rstest]
    #[case("Term\n:no space\n")]
    #[case("Term\n: \n")]
    #[case(": lonely\n")]
    fn test_not_a_definition_list(#[case] src: &str) -> Result<(), Error> {
        let tokens = parse(src)?;
        assert!(tokens.iter().all(|t| !t.is("dl_open")), "{src:?}");
        Ok(())
    }

    #[test]
    fn test_definition_restores_line_records() -> Result<(), Error> {
        let md = parser()?;
        let mut env = Env::default();
        let mut state = BlockState::new("Term\n:\tdef\n  more\n\nnext\n", &md, &mut env);
        let before = state.lines.clone();
        let end_line = state.line_max;
        assert!(deflist(&mut state, 0, end_line, false));
        assert_eq!(state.lines, before);
        assert_eq!(state.blk_indent, 0);
        assert_eq!(state.dd_indent, -1);
        assert!(!state.tight);
        assert_eq!(state.line, 4);
        Ok(())
    }
}
