//! Inline and reference links: `[text](url "title")`, `[text][label]`.
use crate::{
    InlineState, Nesting,
    common::{
        link::{parse_link_destination, parse_link_title, skip_link_whitespace},
        utils::normalize_reference,
    },
};

/// Outcome of scanning the `(...)` part of an inline link.
pub(crate) enum Target {
    /// `(` opened but the span ended before anything followed it.
    Unterminated,
    /// No closing `)`: the brackets may still form a reference link.
    Invalid,
    Parsed {
        href: String,
        title: String,
        end: usize,
    },
}

/// Scan `(destination "title")` with `open` at the `(`.
pub(crate) fn parse_target(state: &InlineState<'_>, open: usize) -> Target {
    let md = state.md;
    let max = state.pos_max;
    let bytes = state.src.as_bytes();
    let mut pos = skip_link_whitespace(bytes, open + 1, max);
    if pos >= max {
        return Target::Unterminated;
    }

    let mut href = String::new();
    let mut title = String::new();
    if let Some(destination) = parse_link_destination(state.src, pos, max) {
        let normalized = md.normalize_link(&destination.text);
        if md.validate_link(&normalized) {
            href = normalized;
            pos = destination.pos;
        }
        let start = pos;
        pos = skip_link_whitespace(bytes, pos, max);
        if pos < max && start != pos {
            if let Some(scanned) = parse_link_title(state.src, pos, max) {
                title = scanned.text;
                pos = skip_link_whitespace(bytes, scanned.pos, max);
            }
        }
    }

    if pos >= max || state.byte(pos) != Some(b')') {
        return Target::Invalid;
    }
    Target::Parsed {
        href,
        title,
        end: pos + 1,
    }
}

/// Resolve `[label]`, `[]` or nothing after the brackets ending at
/// `label_end` against the collected reference definitions.
pub(crate) fn resolve_reference(
    state: &mut InlineState<'_>,
    label_start: usize,
    label_end: usize,
) -> Option<(String, String, usize)> {
    let md = state.md;
    let max = state.pos_max;
    let mut pos = label_end + 1;
    let mut label = None;
    if pos < max && state.byte(pos) == Some(b'[') {
        let start = pos + 1;
        match md.inline.parse_link_label(state, pos, false) {
            Some(end) => {
                label = Some(state.slice(start, end));
                pos = end + 1;
            }
            None => pos = label_end + 1,
        }
    }
    // Collapsed `[]` and shortcut references use the link text.
    let label = label
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| state.slice(label_start, label_end));
    let reference = state.env.references.get(&normalize_reference(label))?;
    Some((reference.href.clone(), reference.title.clone(), pos))
}

pub fn link(state: &mut InlineState<'_>, silent: bool) -> bool {
    if state.byte(state.pos) != Some(b'[') {
        return false;
    }
    let md = state.md;
    let max = state.pos_max;
    let label_start = state.pos + 1;
    let Some(label_end) = md.inline.parse_link_label(state, state.pos, true) else {
        return false;
    };

    let mut resolved = None;
    if state.byte(label_end + 1) == Some(b'(') && label_end + 1 < max {
        match parse_target(state, label_end + 1) {
            Target::Unterminated => return false,
            Target::Invalid => {}
            Target::Parsed { href, title, end } => resolved = Some((href, title, end)),
        }
    }
    let resolved = match resolved {
        Some(found) => Some(found),
        None => resolve_reference(state, label_start, label_end),
    };
    let Some((href, title, end)) = resolved else {
        return false;
    };

    if !silent {
        state.pos = label_start;
        state.pos_max = label_end;
        let token = state.push("link_open", "a", Nesting::Opening);
        token.attr_set("href", href);
        if !title.is_empty() {
            token.attr_set("title", title);
        }
        state.link_level += 1;
        md.inline.tokenize(state);
        state.link_level -= 1;
        state.push("link_close", "a", Nesting::Closing);
    }
    state.pos = end;
    state.pos_max = max;
    true
}
