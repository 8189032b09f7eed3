//! Link reference definitions: `[label]: destination "title"`.
use crate::{
    BlockState, ParentType, Reference,
    common::{
        link::{parse_link_destination, parse_link_title},
        utils::{is_space, normalize_reference},
    },
};

/// Advance over spaces and tabs, counting newlines crossed.
fn skip_blank(bytes: &[u8], mut pos: usize, lines: &mut usize) -> usize {
    while let Some(&byte) = bytes.get(pos) {
        if byte == b'\n' {
            *lines += 1;
        } else if !is_space(byte) {
            break;
        }
        pos += 1;
    }
    pos
}

fn skip_inline_spaces(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).copied().is_some_and(is_space) {
        pos += 1;
    }
    pos
}

/// Quick rejection of `[text](url)` and `[text]` at the start of a line.
fn may_be_definition(state: &BlockState<'_>, line: usize) -> bool {
    let max = state.lines.end(line);
    let mut pos = state.lines.start(line);
    while pos + 1 < max {
        pos += 1;
        if state.byte(pos) == Some(b']') && state.byte(pos - 1) != Some(b'\\') {
            return pos + 1 < max && state.byte(pos + 1) == Some(b':');
        }
    }
    true
}

#[allow(clippy::too_many_lines)]
pub fn reference(state: &mut BlockState<'_>, start_line: usize, _end_line: usize, silent: bool) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    if state.byte(state.lines.start(start_line)) != Some(b'[') {
        return false;
    }
    if !may_be_definition(state, start_line) {
        return false;
    }

    let md = state.md;
    let end_line = state.line_max;
    let old_parent = state.parent_type;
    state.parent_type = ParentType::Reference;

    let mut next_line = start_line + 1;
    while next_line < end_line && !state.is_empty(next_line) {
        // Indented and lazy lines cannot start anything.
        let indent = state.lines.indent(next_line);
        if indent - state.blk_indent > 3 || indent < 0 {
            next_line += 1;
            continue;
        }
        if md.block.terminates("reference", state, next_line, end_line) {
            break;
        }
        next_line += 1;
    }
    state.parent_type = old_parent;

    let joined = state.get_lines(start_line, next_line, state.blk_indent, false);
    let text = joined.trim();
    let bytes = text.as_bytes();
    let max = bytes.len();

    let mut lines = 0;
    let mut label_end = None;
    let mut pos = 1;
    while pos < max {
        match bytes.get(pos) {
            Some(b'[') => return false,
            Some(b']') => {
                label_end = Some(pos);
                break;
            }
            Some(b'\n') => lines += 1,
            Some(b'\\') => {
                pos += 1;
                if bytes.get(pos) == Some(&b'\n') {
                    lines += 1;
                }
            }
            Some(_) | None => {}
        }
        pos += 1;
    }
    let Some(label_end) = label_end else {
        return false;
    };
    if bytes.get(label_end + 1) != Some(&b':') {
        return false;
    }

    let pos = skip_blank(bytes, label_end + 2, &mut lines);
    let Some(destination) = parse_link_destination(text, pos, max) else {
        return false;
    };
    let href = md.normalize_link(&destination.text);
    if !md.validate_link(&href) {
        return false;
    }

    let dest_end = destination.pos;
    let dest_lines = lines;
    let mut pos = skip_blank(bytes, dest_end, &mut lines);
    let mut title = String::new();
    match parse_link_title(text, pos, max) {
        Some(scanned) if pos < max && pos != dest_end => {
            title = scanned.text;
            pos = scanned.pos;
            lines += scanned.lines;
        }
        Some(_) | None => {
            pos = dest_end;
            lines = dest_lines;
        }
    }

    pos = skip_inline_spaces(bytes, pos);
    if pos < max && bytes.get(pos) != Some(&b'\n') && !title.is_empty() {
        // Garbage after the title: retry with the destination alone.
        title.clear();
        lines = dest_lines;
        pos = skip_inline_spaces(bytes, dest_end);
    }
    if pos < max && bytes.get(pos) != Some(&b'\n') {
        return false;
    }

    let label = normalize_reference(text.get(1..label_end).unwrap_or_default());
    if label.is_empty() {
        return false;
    }
    if silent {
        return true;
    }

    tracing::trace!(%label, %href, "link reference definition");
    state
        .env
        .references
        .entry(label)
        .or_insert(Reference { href, title });
    state.line = start_line + lines + 1;
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{Env, MarkdownParser, Reference};

    #[test]
    fn test_definition_is_recorded_once() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let tokens = md.block.parse(
            "[Foo  Bar]: /url 'title'\n[foo bar]: /other\n",
            &md,
            &mut env,
        );
        assert!(tokens.is_empty());
        assert_eq!(
            env.references.get("FOO BAR"),
            Some(&Reference {
                href: "/url".to_string(),
                title: "title".to_string()
            })
        );
        assert_eq!(env.references.len(), 1);
    }

    #[test]
    fn test_multiline_title() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let tokens = md.block.parse("[a]:\n/u\n\"t1\nt2\"\npara\n", &md, &mut env);
        assert_eq!(
            env.references.get("A").map(|r| r.title.as_str()),
            Some("t1\nt2")
        );
        assert_eq!(
            tokens.first().and_then(|t| t.map),
            Some([4, 5])
        );
    }

    #[test]
    fn test_garbage_after_title_rejects_title_only() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        md.block
            .parse("[a]: /u\n\"t\" junk\n", &md, &mut env);
        assert_eq!(
            env.references.get("A").map(|r| (r.href.as_str(), r.title.as_str())),
            Some(("/u", ""))
        );
    }

    #[test]
    fn test_inline_link_is_not_a_definition() {
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let tokens = md.block.parse("[a](/u)\n", &md, &mut env);
        assert!(env.references.is_empty());
        assert_eq!(tokens.first().map(|t| t.kind.as_str()), Some("paragraph_open"));
    }
}
