//! Paragraphs, the fallback block.
use crate::{BlockState, Nesting, ParentType, ScopedState};

pub fn paragraph(state: &mut BlockState<'_>, start_line: usize, _end_line: usize, silent: bool) -> bool {
    if silent {
        return false;
    }
    let md = state.md;
    let end_line = state.line_max;
    let mut scope = ScopedState::new(state);
    scope.parent_type = ParentType::Paragraph;

    let mut next_line = start_line + 1;
    while next_line < end_line && !scope.is_empty(next_line) {
        let indent = scope.lines.indent(next_line);
        // Indented and lazy lines continue the paragraph unconditionally.
        if indent - scope.blk_indent > 3 || indent < 0 {
            next_line += 1;
            continue;
        }
        if md.block.terminates("paragraph", &mut scope, next_line, end_line) {
            break;
        }
        next_line += 1;
    }

    let blk_indent = scope.blk_indent;
    let content = scope
        .get_lines(start_line, next_line, blk_indent, false)
        .trim()
        .to_string();
    drop(scope);

    state.line = next_line;
    let token = state.push("paragraph_open", "p", Nesting::Opening);
    token.map = Some([start_line, next_line]);

    let token = state.push("inline", "", Nesting::SelfClosing);
    token.content = content;
    token.map = Some([start_line, next_line]);
    token.children = Some(Vec::new());

    state.push("paragraph_close", "p", Nesting::Closing);
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{Env, MarkdownParser};

    #[test]
    fn test_paragraph_interrupted_by_heading() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let tokens = md.block.parse("a\n  b\n# h\n", &md, &mut env);
        let inline = tokens.get(1);
        assert_eq!(inline.map(|t| t.content.as_str()), Some("a\n  b"));
        assert_eq!(inline.and_then(|t| t.map), Some([0, 2]));
        assert_eq!(tokens.get(3).map(|t| t.kind.as_str()), Some("heading_open"));
    }

    #[test]
    fn test_ordered_list_not_starting_at_one_does_not_interrupt() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let tokens = md.block.parse("a\n2. b\n", &md, &mut env);
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            tokens.get(1).map(|t| t.content.as_str()),
            Some("a\n2. b")
        );
    }
}
