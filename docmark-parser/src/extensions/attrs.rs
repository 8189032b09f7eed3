//! Attribute blocks: `{#id .class key=value key2="quoted value"}`.
//!
//! Three placements are supported:
//!
//! * inline, right after an image, code span, link or span: the attributes
//!   land on that element (`attr` rule);
//! * bracketed spans `[text]{.cls}` (`span` rule, off by default);
//! * a line of its own before a block (`attrs_block`), merged into the next
//!   block token by a core pass of the same name.
//!
//! Classes accumulate; every other key keeps the last value. With
//! [`crate::AttrsOptions::allowed`] set, keys outside the list are moved to
//! the token's `insecure_attrs` meta entry instead of its attributes.
use crate::{
    AttrParseError, Attrs, BlockState, CoreState, Error, InlineState, MarkdownParser, MetaValue,
    Nesting, Token,
    extensions::{core_rule, inline_rule},
};

/// # Errors
///
/// Fails if the `link`, `fence` or `block` base rules were removed.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    let options = md.options.attrs.clone();
    if options.spans {
        let allowed = options.allowed.clone();
        md.inline.ruler.after(
            "link",
            "span",
            inline_rule(move |state, silent| span(state, silent, allowed.as_deref())),
            &[],
        )?;
    }
    if options.inline {
        let allowed = options.allowed.clone();
        let after = options.after.clone();
        md.inline.ruler.push(
            "attr",
            inline_rule(move |state, silent| {
                attr_inline(state, silent, &after, allowed.as_deref())
            }),
            &[],
        );
    }
    if options.block {
        md.block
            .ruler
            .before("fence", "attrs_block", Box::new(attrs_block), &[])?;
        let allowed = options.allowed;
        md.core.ruler.after(
            "block",
            "attrs_block",
            core_rule(move |state| attrs_resolve(state, allowed.as_deref())),
            &[],
        )?;
    }
    Ok(())
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':')
}

fn is_unquoted_value_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '{' | '}' | '"' | '\'' | '=' | '<' | '>' | '`')
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Option<char> {
        self.text.get(self.pos..).and_then(|rest| rest.chars().next())
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        self.text.get(start..self.pos).unwrap_or_default()
    }

    /// A non-empty run of name characters.
    fn name(&mut self, context: &'static str) -> Result<&'a str, AttrParseError> {
        let name = self.take_while(is_name_char);
        if name.is_empty() {
            return Err(self.unexpected(context));
        }
        Ok(name)
    }

    fn unexpected(&self, context: &'static str) -> AttrParseError {
        match self.peek() {
            Some(c) => AttrParseError::UnexpectedCharacter(self.pos, c, context),
            None => AttrParseError::Unclosed(self.pos),
        }
    }

    fn quoted(&mut self) -> Result<String, AttrParseError> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(AttrParseError::Unclosed(start)),
                Some('"') => {
                    self.bump();
                    return Ok(value);
                }
                Some('\\') => {
                    self.bump();
                    match self.peek() {
                        Some(c @ ('"' | '\\')) => {
                            value.push(c);
                            self.bump();
                        }
                        Some(_) | None => value.push('\\'),
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
    }
}

/// Parse an attribute block at the start of `text`.
///
/// Returns the byte length of the block, closing brace included, and the
/// attributes in source order.
///
/// # Errors
///
/// Fails when `text` does not start with `{`, when the block is not closed,
/// or on a character that cannot appear where it does.
pub fn parse_attrs(text: &str) -> Result<(usize, Attrs), AttrParseError> {
    if !text.starts_with('{') {
        return Err(AttrParseError::MissingOpeningBrace(0));
    }
    let mut scanner = Scanner { text, pos: 1 };
    let mut attrs = Attrs::new();
    loop {
        scanner.take_while(char::is_whitespace);
        match scanner.peek() {
            None => return Err(AttrParseError::Unclosed(scanner.pos)),
            Some('}') => return Ok((scanner.pos + 1, attrs)),
            Some('#') => {
                scanner.bump();
                let id = scanner.name("id")?;
                attrs.set("id", id);
            }
            Some('.') => {
                scanner.bump();
                let class = scanner.name("class")?;
                attrs.join("class", class);
            }
            Some('%') => {
                let start = scanner.pos;
                scanner.bump();
                scanner.take_while(|c| c != '%');
                if scanner.peek().is_none() {
                    return Err(AttrParseError::Unclosed(start));
                }
                scanner.bump();
            }
            Some(c) if is_name_char(c) => {
                let key = scanner.name("key")?;
                if scanner.peek() != Some('=') {
                    return Err(scanner.unexpected("key"));
                }
                scanner.bump();
                let value = if scanner.peek() == Some('"') {
                    scanner.quoted()?
                } else {
                    let value = scanner.take_while(is_unquoted_value_char);
                    if value.is_empty() {
                        return Err(scanner.unexpected("value"));
                    }
                    value.to_string()
                };
                if key == "class" {
                    attrs.join("class", &value);
                } else {
                    attrs.set(key, value);
                }
            }
            Some(c) => {
                return Err(AttrParseError::UnexpectedCharacter(scanner.pos, c, "attributes"));
            }
        }
        if !scanner.peek().is_some_and(|c| c.is_whitespace() || c == '}') {
            return Err(scanner.unexpected("separator"));
        }
    }
}

/// Merge `attrs` into `token`, quarantining keys outside `allowed`.
fn merge_attrs(token: &mut Token, attrs: &Attrs, allowed: Option<&[String]>) {
    let mut insecure = Attrs::new();
    for (key, value) in attrs.iter() {
        let permitted = allowed.is_none_or(|allowed| allowed.iter().any(|name| name == key));
        if !permitted {
            insecure.set(key, value);
        } else if key == "class" {
            token.attr_join("class", value);
        } else {
            token.attr_set(key, value);
        }
    }
    if insecure.is_empty() {
        return;
    }
    tracing::debug!(kind = %token.kind, count = insecure.len(), "attributes quarantined");
    if let Some(MetaValue::Attrs(existing)) = token.meta.get_mut("insecure_attrs") {
        for (key, value) in insecure.iter() {
            existing.set(key, value);
        }
    } else {
        token.set_meta("insecure_attrs", insecure);
    }
}

/// The opening token of the element that ends at `index`.
fn find_opening(tokens: &[Token], index: usize) -> Option<usize> {
    let token = tokens.get(index)?;
    if token.nesting != Nesting::Closing {
        return Some(index);
    }
    let level = token.level;
    tokens
        .get(..index)?
        .iter()
        .rposition(|candidate| candidate.level == level && candidate.nesting == Nesting::Opening)
}

pub fn attr_inline(
    state: &mut InlineState<'_>,
    silent: bool,
    after: &[String],
    allowed: Option<&[String]>,
) -> bool {
    if state.byte(state.pos) != Some(b'{') || !state.pending.is_empty() {
        return false;
    }
    let Some(last) = state.tokens.len().checked_sub(1) else {
        return false;
    };
    if !state
        .tokens
        .get(last)
        .is_some_and(|token| after.iter().any(|kind| token.is(kind)))
    {
        return false;
    }
    let Ok((len, attrs)) = parse_attrs(state.slice(state.pos, state.pos_max)) else {
        return false;
    };
    let Some(target) = find_opening(&state.tokens, last) else {
        return false;
    };
    state.pos += len;
    if !silent {
        if let Some(token) = state.tokens.get_mut(target) {
            merge_attrs(token, &attrs, allowed);
        }
    }
    true
}

pub fn span(state: &mut InlineState<'_>, silent: bool, allowed: Option<&[String]>) -> bool {
    if state.byte(state.pos) != Some(b'[') {
        return false;
    }
    let md = state.md;
    let max = state.pos_max;
    let label_start = state.pos + 1;
    let Some(label_end) = md.inline.parse_link_label(state, state.pos, false) else {
        return false;
    };
    let Ok((len, attrs)) = parse_attrs(state.slice(label_end + 1, max)) else {
        return false;
    };
    let end = label_end + 1 + len;

    if !silent {
        state.pos = label_start;
        state.pos_max = label_end;
        let token = state.push("span_open", "span", Nesting::Opening);
        merge_attrs(token, &attrs, allowed);
        md.inline.tokenize(state);
        state.push("span_close", "span", Nesting::Closing);
    }
    state.pos = end;
    state.pos_max = max;
    true
}

pub fn attrs_block(
    state: &mut BlockState<'_>,
    start_line: usize,
    _end_line: usize,
    silent: bool,
) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    let start = state.lines.start(start_line);
    let max = state.lines.end(start_line);
    if state.byte(start) != Some(b'{') {
        return false;
    }
    let Ok((len, attrs)) = parse_attrs(state.slice(start, max)) else {
        return false;
    };
    if !state.slice(start + len, max).trim().is_empty() {
        return false;
    }
    if silent {
        return true;
    }
    let token = state.push("attrs_block", "", Nesting::SelfClosing);
    token.attrs = attrs;
    token.map = Some([start_line, start_line + 1]);
    state.line = start_line + 1;
    true
}

/// Fold every run of `attrs_block` tokens into the token that follows it.
/// Blocks followed by a closing token, or by nothing, are dropped.
pub fn attrs_resolve(state: &mut CoreState<'_>, allowed: Option<&[String]>) {
    if !state.tokens.iter().any(|token| token.is("attrs_block")) {
        return;
    }
    let tokens = std::mem::take(&mut state.tokens);
    let mut resolved = Vec::with_capacity(tokens.len());
    let mut pending: Option<Attrs> = None;
    for mut token in tokens {
        if token.is("attrs_block") {
            let attrs = pending.get_or_insert_with(Attrs::new);
            for (key, value) in token.attrs.iter() {
                if key == "class" {
                    attrs.join("class", value);
                } else {
                    attrs.set(key, value);
                }
            }
            continue;
        }
        if let Some(attrs) = pending.take() {
            if token.nesting == Nesting::Closing {
                tracing::debug!(kind = %token.kind, "attribute block has no target, dropped");
            } else {
                merge_attrs(&mut token, &attrs, allowed);
            }
        }
        resolved.push(token);
    }
    if pending.is_some() {
        tracing::debug!("trailing attribute block dropped");
    }
    state.tokens = resolved;
}
