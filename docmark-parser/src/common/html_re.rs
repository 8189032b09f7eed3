//! Scanners for the raw HTML constructs `CommonMark` recognizes.
//!
//! Each scanner looks at the start of its input and returns the byte length of
//! the construct, or `None` if the input does not start with one.

fn is_ws(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == 0x0B
}

fn skip_ws(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).copied().is_some_and(is_ws) {
        pos += 1;
    }
    pos
}

fn scan_tag_name(bytes: &[u8], pos: usize) -> Option<usize> {
    if !bytes.get(pos)?.is_ascii_alphabetic() {
        return None;
    }
    let mut pos = pos + 1;
    while bytes
        .get(pos)
        .is_some_and(|byte| byte.is_ascii_alphanumeric() || *byte == b'-')
    {
        pos += 1;
    }
    Some(pos)
}

fn scan_attr_name(bytes: &[u8], pos: usize) -> Option<usize> {
    let first = *bytes.get(pos)?;
    if !(first.is_ascii_alphabetic() || first == b'_' || first == b':') {
        return None;
    }
    let mut pos = pos + 1;
    while bytes.get(pos).is_some_and(|byte| {
        byte.is_ascii_alphanumeric() || matches!(byte, b':' | b'.' | b'_' | b'-')
    }) {
        pos += 1;
    }
    Some(pos)
}

fn scan_attr_value(bytes: &[u8], pos: usize) -> Option<usize> {
    match *bytes.get(pos)? {
        quote @ (b'"' | b'\'') => {
            let close = bytes.get(pos + 1..)?.iter().position(|byte| *byte == quote)?;
            Some(pos + 1 + close + 1)
        }
        _ => {
            let mut end = pos;
            while bytes.get(end).is_some_and(|byte| {
                !matches!(byte, b'"' | b'\'' | b'=' | b'<' | b'>' | b'`') && *byte > 0x20
            }) {
                end += 1;
            }
            (end > pos).then_some(end)
        }
    }
}

/// `<name attr="value" ...>` or `<name/>`.
#[must_use]
pub fn open_tag_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    let mut pos = scan_tag_name(bytes, 1)?;
    loop {
        let after_ws = skip_ws(bytes, pos);
        if after_ws == pos {
            break;
        }
        let Some(name_end) = scan_attr_name(bytes, after_ws) else {
            break;
        };
        pos = name_end;
        let eq = skip_ws(bytes, pos);
        if bytes.get(eq) == Some(&b'=') {
            let value_start = skip_ws(bytes, eq + 1);
            pos = scan_attr_value(bytes, value_start)?;
        }
    }
    pos = skip_ws(bytes, pos);
    if bytes.get(pos) == Some(&b'/') {
        pos += 1;
    }
    (bytes.get(pos) == Some(&b'>')).then_some(pos + 1)
}

/// `</name>`.
#[must_use]
pub fn close_tag_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes.starts_with(b"</") {
        return None;
    }
    let pos = skip_ws(bytes, scan_tag_name(bytes, 2)?);
    (bytes.get(pos) == Some(&b'>')).then_some(pos + 1)
}

fn comment_len(text: &str) -> Option<usize> {
    let rest = text.strip_prefix("<!--")?;
    if rest.starts_with('>') {
        return Some(5);
    }
    if rest.starts_with("->") {
        return Some(6);
    }
    rest.find("-->").map(|end| 4 + end + 3)
}

fn processing_len(text: &str) -> Option<usize> {
    let rest = text.strip_prefix("<?")?;
    rest.find("?>").map(|end| 2 + end + 2)
}

fn declaration_len(text: &str) -> Option<usize> {
    let rest = text.strip_prefix("<!")?;
    if !rest.as_bytes().first()?.is_ascii_alphabetic() {
        return None;
    }
    rest.find('>').map(|end| 2 + end + 1)
}

fn cdata_len(text: &str) -> Option<usize> {
    let rest = text.strip_prefix("<![CDATA[")?;
    rest.find("]]>").map(|end| 9 + end + 3)
}

/// Any inline HTML construct: tag, closing tag, comment, processing
/// instruction, declaration or CDATA section.
#[must_use]
pub fn html_tag_len(text: &str) -> Option<usize> {
    open_tag_len(text)
        .or_else(|| close_tag_len(text))
        .or_else(|| comment_len(text))
        .or_else(|| processing_len(text))
        .or_else(|| declaration_len(text))
        .or_else(|| cdata_len(text))
}

/// An open or closing tag followed only by whitespace.
#[must_use]
pub fn is_lone_tag_line(text: &str) -> bool {
    open_tag_len(text)
        .or_else(|| close_tag_len(text))
        .and_then(|len| text.get(len..))
        .is_some_and(|rest| rest.trim().is_empty())
}
