//! ATX headings: `# Title`.
use crate::{BlockState, Nesting, common::utils::is_space};

pub fn heading(state: &mut BlockState<'_>, start_line: usize, _end_line: usize, silent: bool) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    let mut pos = state.lines.start(start_line);
    let mut max = state.lines.end(start_line);
    if pos >= max || state.byte(pos) != Some(b'#') {
        return false;
    }

    let mut level = 1;
    pos += 1;
    while pos < max && state.byte(pos) == Some(b'#') && level <= 6 {
        level += 1;
        pos += 1;
    }
    if level > 6 || (pos < max && !state.byte(pos).is_some_and(is_space)) {
        return false;
    }
    if silent {
        return true;
    }

    // Cut trailing `  ###  ` sequences.
    max = state.skip_spaces_back(max, pos);
    let tail = state.skip_chars_back(max, b'#', pos);
    if tail > pos && tail.checked_sub(1).and_then(|p| state.byte(p)).is_some_and(is_space) {
        max = tail;
    }

    state.line = start_line + 1;
    let tag = format!("h{level}");
    let markup = "#".repeat(level);
    let content = state.slice(pos, max).trim().to_string();

    let token = state.push("heading_open", &tag, Nesting::Opening);
    token.markup.clone_from(&markup);
    token.map = Some([start_line, start_line + 1]);

    let token = state.push("inline", "", Nesting::SelfClosing);
    token.content = content;
    token.map = Some([start_line, start_line + 1]);
    token.children = Some(Vec::new());

    let token = state.push("heading_close", &tag, Nesting::Closing);
    token.markup = markup;
    true
}
