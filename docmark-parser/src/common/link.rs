//! Link destination and title scanning, URL normalization and validation.
use super::utils::{is_space, unescape_all};

/// A scanned link component: unescaped text and the position after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned {
    pub text: String,
    pub pos: usize,
    /// Newlines crossed, for multi-line titles.
    pub lines: usize,
}

/// Scan a link destination (`<...>` or a bare, paren-balanced run) starting
/// at `pos`.
#[must_use]
pub fn parse_link_destination(text: &str, start: usize, max: usize) -> Option<Scanned> {
    let bytes = text.as_bytes();
    let mut pos = start;
    if bytes.get(pos) == Some(&b'<') {
        pos += 1;
        while pos < max {
            match *bytes.get(pos)? {
                b'\n' | b'<' => return None,
                b'>' => {
                    return Some(Scanned {
                        text: unescape_all(text.get(start + 1..pos)?),
                        pos: pos + 1,
                        lines: 0,
                    });
                }
                b'\\' if pos + 1 < max => pos += 2,
                _ => pos += 1,
            }
        }
        return None;
    }

    let mut level = 0usize;
    while pos < max {
        let Some(&byte) = bytes.get(pos) else { break };
        if byte == b' ' || byte < 0x20 || byte == 0x7F {
            break;
        }
        if byte == b'\\' && pos + 1 < max {
            if bytes.get(pos + 1) == Some(&b' ') {
                break;
            }
            pos += 2;
            continue;
        }
        if byte == b'(' {
            level += 1;
            if level > 32 {
                return None;
            }
        }
        if byte == b')' {
            if level == 0 {
                break;
            }
            level -= 1;
        }
        pos += 1;
    }
    if start == pos || level != 0 {
        return None;
    }
    Some(Scanned {
        text: unescape_all(text.get(start..pos)?),
        pos,
        lines: 0,
    })
}

/// Scan a link title in `"..."`, `'...'` or `(...)` starting at `start`.
#[must_use]
pub fn parse_link_title(text: &str, start: usize, max: usize) -> Option<Scanned> {
    let bytes = text.as_bytes();
    if start >= max {
        return None;
    }
    let marker = match *bytes.get(start)? {
        b'(' => b')',
        quote @ (b'"' | b'\'') => quote,
        _ => return None,
    };
    let mut pos = start + 1;
    let mut lines = 0;
    while pos < max {
        let byte = *bytes.get(pos)?;
        if byte == marker {
            return Some(Scanned {
                text: unescape_all(text.get(start + 1..pos)?),
                pos: pos + 1,
                lines,
            });
        } else if byte == b'(' && marker == b')' {
            return None;
        } else if byte == b'\n' {
            lines += 1;
        } else if byte == b'\\' && pos + 1 < max {
            pos += 1;
            if bytes.get(pos) == Some(&b'\n') {
                lines += 1;
            }
        }
        pos += 1;
    }
    None
}

/// Skip spaces, tabs and newlines.
pub(crate) fn skip_link_whitespace(bytes: &[u8], mut pos: usize, max: usize) -> usize {
    while pos < max && bytes.get(pos).is_some_and(|&b| is_space(b) || b == b'\n') {
        pos += 1;
    }
    pos
}

const URL_SAFE: &[u8] = b";/?:@&=+$,-_.!~*'()#";

/// Percent-encode a destination, keeping valid escapes and reserved
/// characters.
#[must_use]
pub fn normalize_link(url: &str) -> String {
    let bytes = url.as_bytes();
    let mut out = String::with_capacity(url.len());
    let mut pos = 0;
    while let Some(&byte) = bytes.get(pos) {
        if byte == b'%'
            && bytes.get(pos + 1).is_some_and(u8::is_ascii_hexdigit)
            && bytes.get(pos + 2).is_some_and(u8::is_ascii_hexdigit)
        {
            out.push_str(url.get(pos..pos + 3).unwrap_or_default());
            pos += 3;
            continue;
        }
        if byte.is_ascii_alphanumeric() || URL_SAFE.contains(&byte) {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
        pos += 1;
    }
    out
}

/// Decode percent escapes for display, leaving reserved characters encoded.
#[must_use]
pub fn normalize_link_text(url: &str) -> String {
    let bytes = url.as_bytes();
    let mut decoded: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while let Some(&byte) = bytes.get(pos) {
        let escaped = if byte == b'%' {
            url.get(pos + 1..pos + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .filter(|value| !b";/?:@&=+$,#".contains(value))
        } else {
            None
        };
        if let Some(value) = escaped {
            decoded.push(value);
            pos += 3;
            continue;
        }
        decoded.push(byte);
        pos += 1;
    }
    String::from_utf8(decoded).unwrap_or_else(|_| url.to_string())
}

/// Reject script-capable protocols; `data:` is allowed only for images.
#[must_use]
pub fn validate_link(url: &str) -> bool {
    let url = url.trim().to_ascii_lowercase();
    let bad = ["vbscript:", "javascript:", "file:", "data:"]
        .iter()
        .any(|proto| url.starts_with(proto));
    if !bad {
        return true;
    }
    ["data:image/gif;", "data:image/png;", "data:image/jpeg;", "data:image/webp;"]
        .iter()
        .any(|proto| url.starts_with(proto))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("<a b>", Some(("a b", 5)))]
    #[case("foo(bar) x", Some(("foo(bar)", 8)))]
    #[case("a\\)b)", Some(("a)b", 4)))]
    #[case("foo(bar", None)]
    #[case("<a\nb>", None)]
    #[case("", None)]
    fn test_parse_link_destination(#[case] input: &str, #[case] expected: Option<(&str, usize)>) {
        let scanned = parse_link_destination(input, 0, input.len());
        assert_eq!(
            scanned.as_ref().map(|s| (s.text.as_str(), s.pos)),
            expected
        );
    }

    #[rstest]
    #[case("\"t\\\"x\" rest", Some(("t\"x", 6)))]
    #[case("(a\nb)", Some(("a\nb", 5)))]
    #[case("(a(b)", None)]
    #[case("'open", None)]
    fn test_parse_link_title(#[case] input: &str, #[case] expected: Option<(&str, usize)>) {
        let scanned = parse_link_title(input, 0, input.len());
        assert_eq!(
            scanned.as_ref().map(|s| (s.text.as_str(), s.pos)),
            expected
        );
    }

    #[test]
    fn test_normalize_link() {
        assert_eq!(normalize_link("a b%20c/ä"), "a%20b%20c/%C3%A4");
        assert_eq!(normalize_link("http://x.org/?q=1#f"), "http://x.org/?q=1#f");
    }

    #[test]
    fn test_normalize_link_text() {
        assert_eq!(normalize_link_text("a%20b%C3%A4%2F"), "a bä%2F");
    }

    #[rstest]
    #[case("https://example.org", true)]
    #[case(" JavaScript:alert(1)", false)]
    #[case("data:image/png;base64,xx", true)]
    #[case("data:text/html;base64,xx", false)]
    fn test_validate_link(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(validate_link(url), expected);
    }
}
