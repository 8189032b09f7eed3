//! Footnotes: `[^label]: body` definitions, `[^label]` references and
//! `^[inline]` footnotes.
//!
//! Definitions are tokenized in place between `footnote_reference_open` and
//! `footnote_reference_close`. With `move_to_end`, the `footnote_tail` core
//! pass lifts them out and appends a `footnote_block` holding one
//! `footnote_open` ... `footnote_close` group per referenced footnote, in id
//! order. Unreferenced definitions are dropped.
use std::collections::BTreeMap;

use crate::{
    BlockState, CoreState, Error, InlineState, LineRecord, MarkdownParser, Nesting, ParentType,
    ScopedState, Token,
    common::utils::signed,
    extensions::inline_rule,
};

/// # Errors
///
/// Fails if the `reference`, `image` or `inline` base rules were removed.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    let options = md.options.footnote.clone();
    md.block.ruler.before(
        "reference",
        "footnote_def",
        Box::new(footnote_def),
        &["paragraph", "reference"],
    )?;
    let mut anchor = "image";
    if options.inline {
        md.inline
            .ruler
            .after(anchor, "footnote_inline", Box::new(footnote_inline), &[])?;
        anchor = "footnote_inline";
    }
    let always_match = options.always_match_refs;
    md.inline.ruler.after(
        anchor,
        "footnote_ref",
        inline_rule(move |state, silent| footnote_ref(state, silent, always_match)),
        &[],
    )?;
    if options.move_to_end {
        md.core
            .ruler
            .after("inline", "footnote_tail", Box::new(footnote_tail), &[])?;
    }
    Ok(())
}

/// Find the `]` closing a footnote label that starts at `pos`. Labels are
/// non-empty and hold no spaces or line breaks.
fn scan_label(bytes: &[u8], start: usize, max: usize) -> Option<usize> {
    let mut pos = start;
    while pos < max {
        match bytes.get(pos) {
            Some(b' ' | b'\n') | None => return None,
            Some(b']') => return (pos > start).then_some(pos),
            Some(_) => pos += 1,
        }
    }
    None
}

pub fn footnote_def(
    state: &mut BlockState<'_>,
    start_line: usize,
    end_line: usize,
    silent: bool,
) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    let start = state.lines.start(start_line);
    let max = state.lines.end(start_line);
    if start + 4 > max || state.byte(start) != Some(b'[') || state.byte(start + 1) != Some(b'^') {
        return false;
    }
    let Some(label_end) = scan_label(state.src.as_bytes(), start + 2, max) else {
        return false;
    };
    if label_end + 1 >= max || state.byte(label_end + 1) != Some(b':') {
        return false;
    }
    if silent {
        return true;
    }

    let label = state.slice(start + 2, label_end).to_string();
    state.env.footnotes.define(&label);
    let open = state.tokens.len();
    state
        .push("footnote_reference_open", "", Nesting::Opening)
        .set_meta("label", label.as_str());

    let md = state.md;
    let after_colon = label_end + 2;
    let initial = state.lines.indent(start_line) + signed(after_colon - start);
    let mut offset = initial;
    let mut pos = after_colon;
    while pos < max {
        match state.byte(pos) {
            Some(b'\t') => offset += 4 - offset % 4,
            Some(b' ') => offset += 1,
            Some(_) | None => break,
        }
        pos += 1;
    }

    {
        let mut scope = ScopedState::new(state);
        scope.blk_indent += 4;
        scope.parent_type = ParentType::Footnote;
        let mut indent = offset - initial;
        if indent < scope.blk_indent {
            indent += scope.blk_indent;
        }
        let tab_offset = scope.lines.tab_offset(start_line);
        scope.override_line(
            start_line,
            LineRecord {
                begin: after_colon,
                shift: pos - after_colon,
                indent,
                tab_offset,
            },
        );
        md.block.tokenize(&mut scope, start_line, end_line);
    }

    let line = state.line;
    if let Some(token) = state.tokens.get_mut(open) {
        token.map = Some([start_line, line]);
    }
    state.push("footnote_reference_close", "", Nesting::Closing);
    true
}

pub fn footnote_ref(state: &mut InlineState<'_>, silent: bool, always_match: bool) -> bool {
    let start = state.pos;
    let max = state.pos_max;
    if start + 3 > max || state.byte(start) != Some(b'[') || state.byte(start + 1) != Some(b'^') {
        return false;
    }
    let Some(label_end) = scan_label(state.src.as_bytes(), start + 2, max) else {
        return false;
    };
    let label = state.slice(start + 2, label_end);
    if !always_match && !state.env.footnotes.is_defined(label) {
        return false;
    }

    if !silent {
        let reference = state.env.footnotes.reference(label);
        let token = state.push("footnote_ref", "", Nesting::SelfClosing);
        token.set_meta("id", reference.id);
        token.set_meta("subId", reference.sub_id);
        token.set_meta("label", label);
    }
    state.pos = label_end + 1;
    true
}

pub fn footnote_inline(state: &mut InlineState<'_>, silent: bool) -> bool {
    let start = state.pos;
    if start + 2 >= state.pos_max
        || state.byte(start) != Some(b'^')
        || state.byte(start + 1) != Some(b'[')
    {
        return false;
    }
    let md = state.md;
    let Some(label_end) = md.inline.parse_link_label(state, start + 1, false) else {
        return false;
    };

    if !silent {
        let content = state.slice(start + 2, label_end);
        let children = md.inline.parse(content, md, state.env);
        let reference = state.env.footnotes.add_inline(content.to_string(), children);
        let token = state.push("footnote_ref", "", Nesting::SelfClosing);
        token.set_meta("id", reference.id);
        token.set_meta("subId", reference.sub_id);
    }
    state.pos = label_end + 1;
    true
}

fn block_token(kind: &str, tag: &str, nesting: Nesting, level: usize) -> Token {
    let mut token = Token::new(kind, tag, nesting);
    token.block = true;
    token.level = level;
    token
}

/// Cut definition spans out of the stream, keyed by label and re-leveled to
/// sit inside `footnote_open`.
fn take_definitions(tokens: Vec<Token>) -> (Vec<Token>, BTreeMap<String, Vec<Token>>) {
    let mut kept = Vec::with_capacity(tokens.len());
    let mut bodies = BTreeMap::new();
    let mut open: Vec<(String, usize, Vec<Token>)> = Vec::new();
    for mut token in tokens {
        if token.is("footnote_reference_open") {
            let label = token.meta_text("label").unwrap_or_default().to_string();
            open.push((label, token.level + 1, Vec::new()));
        } else if token.is("footnote_reference_close") {
            if let Some((label, _, body)) = open.pop() {
                bodies.insert(label, body);
            }
        } else if let Some((_, base, body)) = open.last_mut() {
            token.level = token.level.saturating_sub(*base) + 2;
            body.push(token);
        } else {
            kept.push(token);
        }
    }
    (kept, bodies)
}

pub fn footnote_tail(state: &mut CoreState<'_>) {
    if state.inline_mode {
        return;
    }
    let (kept, mut bodies) = take_definitions(std::mem::take(&mut state.tokens));
    state.tokens = kept;
    let list = &state.env.footnotes.list;
    if list.is_empty() {
        return;
    }
    tracing::debug!(
        footnotes = list.len(),
        definitions = bodies.len(),
        "relocating footnotes"
    );

    let tokens = &mut state.tokens;
    tokens.push(block_token("footnote_block_open", "", Nesting::Opening, 0));
    for (id, entry) in list.iter().enumerate() {
        let mut open = block_token("footnote_open", "", Nesting::Opening, 1);
        open.set_meta("id", id);
        if let Some(label) = &entry.label {
            open.set_meta("label", label.as_str());
        }
        tokens.push(open);

        if let Some(children) = &entry.tokens {
            tokens.push(block_token("paragraph_open", "p", Nesting::Opening, 2));
            let mut inline = block_token("inline", "", Nesting::SelfClosing, 3);
            inline.content = entry.content.clone().unwrap_or_default();
            inline.children = Some(children.clone());
            tokens.push(inline);
            tokens.push(block_token("paragraph_close", "p", Nesting::Closing, 2));
        } else if let Some(body) = entry.label.as_ref().and_then(|label| bodies.remove(label)) {
            tokens.extend(body);
        }

        let last_paragraph = if tokens.last().is_some_and(|t| t.is("paragraph_close")) {
            tokens.pop()
        } else {
            None
        };
        let anchor_level = last_paragraph.as_ref().map_or(2, |p| p.level + 1);
        for sub_id in 0..entry.count.max(1) {
            let mut anchor = block_token("footnote_anchor", "", Nesting::SelfClosing, anchor_level);
            anchor.set_meta("id", id);
            anchor.set_meta("subId", sub_id);
            if let Some(label) = &entry.label {
                anchor.set_meta("label", label.as_str());
            }
            tokens.push(anchor);
        }
        tokens.extend(last_paragraph);
        tokens.push(block_token("footnote_close", "", Nesting::Closing, 1));
    }
    tokens.push(block_token("footnote_block_close", "", Nesting::Closing, 0));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Env, Extension, Extensions, FootnoteOptions, Options};

    fn parser(options: FootnoteOptions) -> Result<MarkdownParser, Error> {
        let options = Options::builder()
            .with_extensions(Extensions::only(&[Extension::Footnote]))
            .with_footnote(options)
            .build();
        MarkdownParser::new(options)
    }

    fn summary(tokens: &[Token]) -> Vec<(&str, usize)> {
        tokens.iter().map(|t| (t.kind.as_str(), t.level)).collect()
    }

    fn inline_refs(tokens: &[Token]) -> Vec<Token> {
        tokens
            .iter()
            .filter_map(|t| t.children.clone())
            .flatten()
            .filter(|t| t.is("footnote_ref"))
            .collect()
    }

    #[test]
    fn test_definition_then_reference() -> Result<(), Error> {
        let md = parser(FootnoteOptions::default())?;
        let mut env = Env::default();
        let tokens = md.parse("[^a]: body\n\nref [^a]", &mut env);
        assert_eq!(
            summary(&tokens),
            vec![
                ("paragraph_open", 0),
                ("inline", 1),
                ("paragraph_close", 0),
                ("footnote_block_open", 0),
                ("footnote_open", 1),
                ("paragraph_open", 2),
                ("inline", 3),
                ("footnote_anchor", 3),
                ("paragraph_close", 2),
                ("footnote_close", 1),
                ("footnote_block_close", 0),
            ]
        );
        assert_eq!(env.footnotes.id_of("a"), Some(0));
        assert_eq!(env.footnotes.list.first().map(|e| e.count), Some(1));
        let anchor = tokens.iter().find(|t| t.is("footnote_anchor"));
        assert_eq!(anchor.and_then(|t| t.meta_number("subId")), Some(0));
        assert_eq!(anchor.and_then(|t| t.meta_text("label")), Some("a"));
        assert_eq!(tokens.get(6).map(|t| t.content.as_str()), Some("body"));
        Ok(())
    }

    #[test]
    fn test_repeated_references_get_sub_ids() -> Result<(), Error> {
        let md = parser(FootnoteOptions::default())?;
        let tokens = md.parse("x [^n] y [^n]\n\n[^n]: note\n", &mut Env::default());
        let refs: Vec<_> = inline_refs(&tokens)
            .iter()
            .map(|t| (t.meta_number("id"), t.meta_number("subId")))
            .collect();
        assert_eq!(refs, vec![(Some(0), Some(0)), (Some(0), Some(1))]);
        let anchors = tokens.iter().filter(|t| t.is("footnote_anchor")).count();
        assert_eq!(anchors, 2);
        Ok(())
    }

    #[test]
    fn test_multi_paragraph_definition() -> Result<(), Error> {
        let md = parser(FootnoteOptions::default())?;
        let tokens = md.parse("x [^a]\n\n[^a]: one\n\n    two\n\nafter\n", &mut Env::default());
        let inline: Vec<_> = tokens
            .iter()
            .filter(|t| t.is("inline"))
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(inline, vec!["x [^a]", "after", "one", "two"]);
        let close = tokens.iter().position(|t| t.is("footnote_close"));
        assert_eq!(
            close.and_then(|i| tokens.get(i - 2)).map(|t| t.kind.as_str()),
            Some("footnote_anchor")
        );
        Ok(())
    }

    #[test]
    fn test_inline_footnote() -> Result<(), Error> {
        let md = parser(FootnoteOptions::default())?;
        let mut env = Env::default();
        let tokens = md.parse("a^[note *x*] b\n", &mut env);
        let refs = inline_refs(&tokens);
        assert_eq!(refs.first().and_then(|t| t.meta_number("id")), Some(0));
        assert_eq!(
            env.footnotes.list.first().and_then(|e| e.content.as_deref()),
            Some("note *x*")
        );
        let body = tokens
            .iter()
            .skip_while(|t| !t.is("footnote_open"))
            .find(|t| t.is("inline"));
        assert_eq!(body.map(|t| t.content.as_str()), Some("note *x*"));
        assert_eq!(
            body.and_then(|t| t.children.as_ref()).map(Vec::len),
            Some(4)
        );
        Ok(())
    }

    #[test]
    fn test_undefined_reference_is_text() -> Result<(), Error> {
        let md = parser(FootnoteOptions::default())?;
        let tokens = md.parse("see [^missing]\n", &mut Env::default());
        assert!(inline_refs(&tokens).is_empty());
        assert!(tokens.iter().all(|t| !t.is("footnote_block_open")));

        let md = parser(FootnoteOptions {
            always_match_refs: true,
            ..FootnoteOptions::default()
        })?;
        let tokens = md.parse("see [^missing]\n", &mut Env::default());
        assert_eq!(inline_refs(&tokens).len(), 1);
        Ok(())
    }

    #[test]
    fn test_unreferenced_definition_is_dropped() -> Result<(), Error> {
        let md = parser(FootnoteOptions::default())?;
        let tokens = md.parse("[^a]: body\n", &mut Env::default());
        assert_eq!(tokens, Vec::new());
        Ok(())
    }

    #[test]
    fn test_footnotes_numbered_in_reference_order() -> Result<(), Error> {
        let md = parser(FootnoteOptions::default())?;
        let mut env = Env::default();
        let tokens = md.parse("[^b]: B\n\n[^a]: A\n\n[^a] [^b]\n", &mut env);
        assert_eq!(env.footnotes.id_of("a"), Some(0));
        assert_eq!(env.footnotes.id_of("b"), Some(1));
        let labels: Vec<_> = tokens
            .iter()
            .filter(|t| t.is("footnote_open"))
            .map(|t| t.meta_text("label"))
            .collect();
        assert_eq!(labels, vec![Some("a"), Some("b")]);
        Ok(())
    }

    #[test]
    fn test_definitions_stay_in_place_without_relocation() -> Result<(), Error> {
        let md = parser(FootnoteOptions {
            move_to_end: false,
            ..FootnoteOptions::default()
        })?;
        let tokens = md.parse("[^a]: body\n", &mut Env::default());
        assert_eq!(
            summary(&tokens),
            vec![
                ("footnote_reference_open", 0),
                ("paragraph_open", 1),
                ("inline", 2),
                ("paragraph_close", 1),
                ("footnote_reference_close", 0),
            ]
        );
        assert_eq!(tokens.first().and_then(|t| t.meta_text("label")), Some("a"));
        assert_eq!(tokens.first().and_then(|t| t.map), Some([0, 1]));
        Ok(())
    }

    #[test]
    fn test_definition_restores_line_records() -> Result<(), Error> {
        let md = parser(FootnoteOptions::default())?;
        let mut env = Env::default();
        let mut state = BlockState::new("[^a]: x\n    y\n\nz\n", &md, &mut env);
        let before = state.lines.clone();
        let end_line = state.line_max;
        assert!(footnote_def(&mut state, 0, end_line, false));
        assert_eq!(state.lines, before);
        assert_eq!(state.blk_indent, 0);
        assert_eq!(state.parent_type, ParentType::Root);
        assert_eq!(state.line, 3);
        Ok(())
    }

    #[test]
    fn test_silent_mode_does_not_register() -> Result<(), Error> {
        let md = parser(FootnoteOptions::default())?;
        let mut env = Env::default();
        let mut state = BlockState::new("[^a]: x\n", &md, &mut env);
        assert!(footnote_def(&mut state, 0, 1, true));
        assert!(state.tokens.is_empty());
        assert!(!state.env.footnotes.is_defined("a"));
        Ok(())
    }
}
