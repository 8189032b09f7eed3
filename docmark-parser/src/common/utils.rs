//! Character classes and string helpers shared by block and inline rules.

/// Space or tab, the only characters that count as line indentation.
#[must_use]
pub fn is_space(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Unicode whitespace as `CommonMark` defines it for delimiter flanking.
#[must_use]
pub fn is_white_space(c: char) -> bool {
    matches!(
        c,
        '\u{09}'..='\u{0D}'
            | '\u{20}'
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// ASCII punctuation: `!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~`.
#[must_use]
pub fn is_md_ascii_punct(c: char) -> bool {
    c.is_ascii_punctuation()
}

/// Unicode punctuation, approximated by the general punctuation blocks plus
/// ASCII punctuation.
#[must_use]
pub fn is_punct_char(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '\u{A1}'
                | '\u{A7}'
                | '\u{AB}'
                | '\u{B6}'
                | '\u{B7}'
                | '\u{BB}'
                | '\u{BF}'
                | '\u{37E}'
                | '\u{387}'
                | '\u{55A}'..='\u{55F}'
                | '\u{589}'
                | '\u{58A}'
                | '\u{5BE}'
                | '\u{5C0}'
                | '\u{5C3}'
                | '\u{5C6}'
                | '\u{5F3}'
                | '\u{5F4}'
                | '\u{609}'
                | '\u{60A}'
                | '\u{60C}'
                | '\u{60D}'
                | '\u{61B}'
                | '\u{61E}'
                | '\u{61F}'
                | '\u{66A}'..='\u{66D}'
                | '\u{6D4}'
                | '\u{2010}'..='\u{2027}'
                | '\u{2030}'..='\u{2043}'
                | '\u{2045}'..='\u{2051}'
                | '\u{2053}'..='\u{205E}'
                | '\u{207D}'
                | '\u{207E}'
                | '\u{208D}'
                | '\u{208E}'
                | '\u{2308}'..='\u{230B}'
                | '\u{2329}'
                | '\u{232A}'
                | '\u{2768}'..='\u{2775}'
                | '\u{27C5}'
                | '\u{27C6}'
                | '\u{27E6}'..='\u{27EF}'
                | '\u{2983}'..='\u{2998}'
                | '\u{29D8}'..='\u{29DB}'
                | '\u{29FC}'
                | '\u{29FD}'
                | '\u{2CF9}'..='\u{2CFC}'
                | '\u{2CFE}'
                | '\u{2CFF}'
                | '\u{2E00}'..='\u{2E2E}'
                | '\u{2E30}'..='\u{2E4F}'
                | '\u{3001}'..='\u{3003}'
                | '\u{3008}'..='\u{3011}'
                | '\u{3014}'..='\u{301F}'
                | '\u{3030}'
                | '\u{303D}'
                | '\u{30A0}'
                | '\u{30FB}'
                | '\u{FE10}'..='\u{FE19}'
                | '\u{FE30}'..='\u{FE52}'
                | '\u{FE54}'..='\u{FE61}'
                | '\u{FE63}'
                | '\u{FE68}'
                | '\u{FE6A}'
                | '\u{FE6B}'
                | '\u{FF01}'..='\u{FF03}'
                | '\u{FF05}'..='\u{FF0A}'
                | '\u{FF0C}'..='\u{FF0F}'
                | '\u{FF1A}'
                | '\u{FF1B}'
                | '\u{FF1F}'
                | '\u{FF20}'
                | '\u{FF3B}'..='\u{FF3D}'
                | '\u{FF3F}'
                | '\u{FF5B}'
                | '\u{FF5D}'
                | '\u{FF5F}'..='\u{FF65}'
        )
}

/// Whether the byte at `pos` is preceded by an odd number of backslashes.
#[must_use]
pub fn is_escaped(text: &str, pos: usize) -> bool {
    let before = text.as_bytes().get(..pos).unwrap_or_default();
    before.iter().rev().take_while(|&&byte| byte == b'\\').count() % 2 == 1
}

/// Normalize a link or footnote label for lookup: trim, collapse inner
/// whitespace, case fold.
#[must_use]
pub fn normalize_reference(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .to_uppercase()
}

/// Resolve backslash escapes and character references.
#[must_use]
pub fn unescape_all(text: &str) -> String {
    if !text.contains(['\\', '&']) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        match c {
            '\\' => {
                let mut chars = rest.chars();
                chars.next();
                match chars.next() {
                    Some(next) if next.is_ascii_punctuation() => {
                        out.push(next);
                        rest = rest.get(2..).unwrap_or_default();
                    }
                    Some(_) | None => {
                        out.push('\\');
                        rest = rest.get(1..).unwrap_or_default();
                    }
                }
            }
            '&' => {
                if let Some((decoded, len)) = decode_entity(rest) {
                    out.push_str(&decoded);
                    rest = rest.get(len..).unwrap_or_default();
                } else {
                    out.push('&');
                    rest = rest.get(1..).unwrap_or_default();
                }
            }
            other => {
                out.push(other);
                rest = rest.get(other.len_utf8()..).unwrap_or_default();
            }
        }
    }
    out
}

/// Decode a character reference at the start of `text` (which begins with
/// `&`), returning the replacement and the number of bytes consumed.
#[must_use]
pub fn decode_entity(text: &str) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    let semicolon = bytes.iter().take(34).position(|&byte| byte == b';')?;
    let body = text.get(1..semicolon)?;
    let len = semicolon + 1;
    if let Some(numeric) = body.strip_prefix('#') {
        let code = if let Some(hex) = numeric
            .strip_prefix('x')
            .or_else(|| numeric.strip_prefix('X'))
        {
            if hex.is_empty() || hex.len() > 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            u32::from_str_radix(hex, 16).ok()?
        } else {
            if numeric.is_empty() || numeric.len() > 7 || !numeric.bytes().all(|b| b.is_ascii_digit())
            {
                return None;
            }
            numeric.parse::<u32>().ok()?
        };
        let c = if is_valid_entity_code(code) {
            char::from_u32(code).unwrap_or('\u{FFFD}')
        } else {
            '\u{FFFD}'
        };
        return Some((c.to_string(), len));
    }
    let mut name_chars = body.chars();
    let starts_with_letter = name_chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter
        || body.len() < 2
        || body.len() > 32
        || !name_chars.all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    let reference = text.get(..len)?;
    let decoded = html_escape::decode_html_entities(reference);
    if decoded == reference || decoded.chars().count() > 2 {
        None
    } else {
        Some((decoded.into_owned(), len))
    }
}

/// Code points a numeric character reference may produce.
#[must_use]
pub fn is_valid_entity_code(code: u32) -> bool {
    !((0xD800..=0xDFFF).contains(&code)
        || (0xFDD0..=0xFDEF).contains(&code)
        || (code & 0xFFFF) == 0xFFFF
        || (code & 0xFFFF) == 0xFFFE
        || code <= 0x08
        || code == 0x0B
        || (0x0E..=0x1F).contains(&code)
        || (0x7F..=0x9F).contains(&code)
        || code > 0x10_FFFF)
}

/// Escape text for inclusion in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

pub(crate) fn signed(value: usize) -> isize {
    isize::try_from(value).unwrap_or(isize::MAX)
}

pub(crate) fn unsigned(value: isize) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Byte length of the character starting at `pos`, 1 when `pos` is not on a
/// character boundary.
pub(crate) fn char_len_at(text: &str, pos: usize) -> usize {
    text.get(pos..)
        .and_then(|rest| rest.chars().next())
        .map_or(1, char::len_utf8)
}
