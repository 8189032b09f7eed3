//! Setext headings: a paragraph underlined with `=` or `-`.
use crate::{BlockState, Nesting, ParentType, ScopedState};

pub fn lheading(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    let md = state.md;
    let mut scope = ScopedState::new(state);
    // Terminators are the paragraph's, so pretend to be one.
    scope.parent_type = ParentType::Paragraph;

    let mut underline = None;
    let mut next_line = start_line + 1;
    while next_line < end_line && !scope.is_empty(next_line) {
        let indent = scope.lines.indent(next_line);
        if indent - scope.blk_indent > 3 {
            next_line += 1;
            continue;
        }
        if indent >= scope.blk_indent {
            let pos = scope.lines.start(next_line);
            let max = scope.lines.end(next_line);
            if let Some(marker @ (b'-' | b'=')) = scope.byte(pos) {
                let after = scope.skip_spaces(scope.skip_chars(pos, marker));
                if after >= max {
                    underline = Some(marker);
                    break;
                }
            }
        }
        if indent < 0 {
            next_line += 1;
            continue;
        }
        if md.block.terminates("paragraph", &mut scope, next_line, end_line) {
            break;
        }
        next_line += 1;
    }

    let Some(marker) = underline else {
        return false;
    };
    if silent {
        return true;
    }

    let blk_indent = scope.blk_indent;
    let content = scope
        .get_lines(start_line, next_line, blk_indent, false)
        .trim()
        .to_string();
    drop(scope);

    state.line = next_line + 1;
    let tag = if marker == b'=' { "h1" } else { "h2" };
    let markup = char::from(marker).to_string();

    let token = state.push("heading_open", tag, Nesting::Opening);
    token.markup.clone_from(&markup);
    token.map = Some([start_line, next_line + 1]);

    let token = state.push("inline", "", Nesting::SelfClosing);
    token.content = content;
    token.map = Some([start_line, next_line]);
    token.children = Some(Vec::new());

    let token = state.push("heading_close", tag, Nesting::Closing);
    token.markup = markup;
    true
}
