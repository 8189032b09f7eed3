use super::node::{Attribute, HtmlTree, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is never parsed as markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(name))
}

fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|raw| raw.eq_ignore_ascii_case(name))
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

#[derive(Debug, PartialEq)]
enum Markup<'a> {
    StartTag {
        name: &'a str,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag(&'a str),
    Comment(&'a str),
    Declaration(&'a str),
    ProcessingInstruction(&'a str),
    Entity(&'a str),
}

/// Parse an HTML fragment into a tree.
///
/// Never fails: unbalanced end tags are ignored, unclosed elements are
/// closed at the end of input, and a `<` or `&` that does not start
/// recognizable markup is kept as text.
#[must_use]
pub fn parse_html(text: &str) -> HtmlTree {
    let mut builder = TreeBuilder::new();
    let mut pos = 0;
    let mut data_start = 0;
    while let Some(offset) = text.get(pos..).and_then(|rest| rest.find(['<', '&'])) {
        let at = pos + offset;
        let scanned = if text.as_bytes().get(at) == Some(&b'<') {
            scan_markup(text, at)
        } else {
            scan_entity(text, at).map(|end| (Markup::Entity(text.get(at..end).unwrap_or_default()), end))
        };
        let Some((markup, end)) = scanned else {
            pos = at + 1;
            continue;
        };
        builder.data(text.get(data_start..at).unwrap_or_default());
        pos = builder.markup(markup, text, end);
        data_start = pos;
    }
    builder.data(text.get(data_start..).unwrap_or_default());
    tracing::trace!(nodes = builder.tree.len(), "parsed html fragment");
    builder.tree
}

struct TreeBuilder {
    tree: HtmlTree,
    /// Open elements; the root is implied below the first entry.
    open: Vec<(NodeId, String)>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            tree: HtmlTree::new(),
            open: Vec::new(),
        }
    }

    fn current(&self) -> NodeId {
        self.open
            .last()
            .map_or_else(|| self.tree.root(), |(id, _)| *id)
    }

    fn data(&mut self, text: &str) {
        let parent = self.current();
        self.tree.append_data(parent, text);
    }

    fn end_tag(&mut self, name: &str) {
        match self
            .open
            .iter()
            .rposition(|(_, open)| open.eq_ignore_ascii_case(name))
        {
            Some(index) => self.open.truncate(index),
            None => tracing::trace!(name, "ignoring unmatched end tag"),
        }
    }

    /// Attach `markup` and return the offset parsing resumes at.
    fn markup(&mut self, markup: Markup<'_>, text: &str, end: usize) -> usize {
        let parent = self.current();
        let kind = match markup {
            Markup::StartTag {
                name,
                attrs,
                self_closing: true,
            } => NodeKind::XTag {
                name: name.to_string(),
                attrs,
            },
            Markup::StartTag { name, attrs, .. } if is_void(name) => NodeKind::VoidTag {
                name: name.to_string(),
                attrs,
            },
            Markup::StartTag { name, attrs, .. } => {
                let id = self.tree.append(
                    parent,
                    NodeKind::Tag {
                        name: name.to_string(),
                        attrs,
                    },
                );
                self.open.push((id, name.to_string()));
                if is_raw_text(name) {
                    return self.raw_text(name, text, end);
                }
                return end;
            }
            Markup::EndTag(name) => {
                if !is_void(name) {
                    self.end_tag(name);
                }
                return end;
            }
            Markup::Comment(body) => NodeKind::Comment(body.to_string()),
            Markup::Declaration(body) => NodeKind::Declaration(body.to_string()),
            Markup::ProcessingInstruction(body) => NodeKind::ProcessingInstruction(body.to_string()),
            Markup::Entity(entity) => NodeKind::Entity(entity.to_string()),
        };
        self.tree.append(parent, kind);
        end
    }

    /// Consume the body of a `<script>`/`<style>` element as one data node.
    fn raw_text(&mut self, name: &str, text: &str, start: usize) -> usize {
        let rest = text.get(start..).unwrap_or_default();
        let needle = format!("</{}", name.to_ascii_lowercase());
        let Some(close) = rest.to_ascii_lowercase().find(&needle) else {
            self.data(rest);
            return text.len();
        };
        self.data(rest.get(..close).unwrap_or_default());
        let close = start + close;
        match scan_markup(text, close) {
            Some((Markup::EndTag(end_name), end)) => {
                self.end_tag(end_name);
                end
            }
            Some(_) | None => {
                self.end_tag(name);
                close
            }
        }
    }
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut pos = start;
    while bytes.get(pos).copied().is_some_and(is_name_byte) {
        pos += 1;
    }
    pos
}

/// Recognize the markup construct starting at the `<` at `at`. Returns the
/// construct and the offset just past it.
fn scan_markup(text: &str, at: usize) -> Option<(Markup<'_>, usize)> {
    let rest = text.get(at..)?;
    if let Some(body) = rest.strip_prefix("<!--") {
        return Some(match body.find("-->") {
            Some(close) => (Markup::Comment(body.get(..close)?), at + 4 + close + 3),
            None => (Markup::Comment(body), text.len()),
        });
    }
    if let Some(body) = rest.strip_prefix("<!") {
        let close = body.find('>')?;
        return Some((Markup::Declaration(body.get(..close)?), at + 2 + close + 1));
    }
    if let Some(body) = rest.strip_prefix("<?") {
        let close = body.find('>')?;
        return Some((
            Markup::ProcessingInstruction(body.get(..close)?),
            at + 2 + close + 1,
        ));
    }

    let bytes = text.as_bytes();
    if rest.starts_with("</") {
        let name_start = at + 2;
        if !bytes.get(name_start).is_some_and(u8::is_ascii_alphabetic) {
            return None;
        }
        let name_end = scan_name(bytes, name_start);
        let close = skip_whitespace(bytes, name_end);
        if bytes.get(close) != Some(&b'>') {
            return None;
        }
        return Some((Markup::EndTag(text.get(name_start..name_end)?), close + 1));
    }

    let name_start = at + 1;
    if !bytes.get(name_start).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    let name_end = scan_name(bytes, name_start);
    let name = text.get(name_start..name_end)?;
    let mut attrs = Vec::new();
    let mut pos = name_end;
    loop {
        let after_space = skip_whitespace(bytes, pos);
        match bytes.get(after_space) {
            Some(b'>') => {
                let markup = Markup::StartTag {
                    name,
                    attrs,
                    self_closing: false,
                };
                return Some((markup, after_space + 1));
            }
            Some(b'/') if bytes.get(after_space + 1) == Some(&b'>') => {
                let markup = Markup::StartTag {
                    name,
                    attrs,
                    self_closing: true,
                };
                return Some((markup, after_space + 2));
            }
            Some(_) if after_space > pos => {
                let (attr, end) = scan_attribute(text, after_space)?;
                attrs.push(attr);
                pos = end;
            }
            Some(_) | None => return None,
        }
    }
}

fn scan_attribute(text: &str, start: usize) -> Option<(Attribute, usize)> {
    let bytes = text.as_bytes();
    let mut name_end = start;
    while bytes
        .get(name_end)
        .is_some_and(|&b| !b.is_ascii_whitespace() && !matches!(b, b'/' | b'>' | b'=' | b'"' | b'\'' | b'<'))
    {
        name_end += 1;
    }
    if name_end == start {
        return None;
    }
    let name = text.get(start..name_end)?.to_string();

    let eq = skip_whitespace(bytes, name_end);
    if bytes.get(eq) != Some(&b'=') {
        return Some((Attribute::new(name, None), name_end));
    }
    let value_start = skip_whitespace(bytes, eq + 1);
    match bytes.get(value_start) {
        Some(&quote @ (b'"' | b'\'')) => {
            let body = text.get(value_start + 1..)?;
            let close = body.find(char::from(quote))?;
            let value = body.get(..close)?.to_string();
            Some((Attribute::new(name, Some(value)), value_start + 1 + close + 1))
        }
        Some(_) => {
            let mut value_end = value_start;
            while bytes
                .get(value_end)
                .is_some_and(|&b| !b.is_ascii_whitespace() && !matches!(b, b'>' | b'"' | b'\'' | b'<' | b'`' | b'='))
            {
                value_end += 1;
            }
            if value_end == value_start {
                return None;
            }
            let value = text.get(value_start..value_end)?.to_string();
            Some((Attribute::new(name, Some(value)), value_end))
        }
        None => None,
    }
}

/// Recognize `&name;`, `&#digits;` or `&#xhex;` at `at`, returning the
/// offset past the `;`.
fn scan_entity(text: &str, at: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = at + 1;
    let digit: fn(&u8) -> bool = match (bytes.get(pos), bytes.get(pos + 1)) {
        (Some(b'#'), Some(b'x' | b'X')) => {
            pos += 2;
            u8::is_ascii_hexdigit
        }
        (Some(b'#'), _) => {
            pos += 1;
            u8::is_ascii_digit
        }
        (Some(_) | None, _) => u8::is_ascii_alphanumeric,
    };
    let start = pos;
    while bytes.get(pos).is_some_and(digit) {
        pos += 1;
    }
    (pos > start && bytes.get(pos) == Some(&b';')).then_some(pos + 1)
}
