//! Autolinks: `<https://example.org>`, `<user@example.org>`.
use crate::{InlineState, Nesting};

/// `scheme:rest` with a 2 to 32 character scheme and no spaces or `<>`.
fn is_uri(text: &str) -> bool {
    let Some((scheme, rest)) = text.split_once(':') else {
        return false;
    };
    let mut bytes = scheme.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && (2..=32).contains(&scheme.len())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-'))
        && rest.bytes().all(|b| b > 0x20 && b != b'<' && b != b'>')
}

fn is_domain_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    (1..=63).contains(&bytes.len())
        && bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}

fn is_email(text: &str) -> bool {
    const LOCAL: &[u8] = b".!#$%&'*+/=?^_`{|}~-";
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && local.bytes().all(|b| b.is_ascii_alphanumeric() || LOCAL.contains(&b))
        && domain.split('.').all(is_domain_label)
}

pub fn autolink(state: &mut InlineState<'_>, silent: bool) -> bool {
    let start = state.pos;
    if state.byte(start) != Some(b'<') {
        return false;
    }
    let max = state.pos_max;
    let mut pos = start;
    loop {
        pos += 1;
        if pos >= max {
            return false;
        }
        match state.byte(pos) {
            Some(b'<') => return false,
            Some(b'>') => break,
            Some(_) | None => {}
        }
    }

    let url = state.slice(start + 1, pos);
    let md = state.md;
    let full = if is_uri(url) {
        md.normalize_link(url)
    } else if is_email(url) {
        md.normalize_link(&format!("mailto:{url}"))
    } else {
        return false;
    };
    if !md.validate_link(&full) {
        return false;
    }

    if !silent {
        let token = state.push("link_open", "a", Nesting::Opening);
        token.attr_set("href", full);
        token.markup = "autolink".to_string();
        token.info = "auto".to_string();
        let token = state.push("text", "", Nesting::SelfClosing);
        token.content = md.normalize_link_text(url);
        let token = state.push("link_close", "a", Nesting::Closing);
        token.markup = "autolink".to_string();
        token.info = "auto".to_string();
    }
    state.pos += url.len() + 2;
    true
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("https://example.org/a?b", true)]
    #[case("a:b", false)]
    #[case("made-up+scheme:x", true)]
    #[case("http://a b", false)]
    fn test_is_uri(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_uri(text), expected);
    }

    #[rstest]
    #[case("foo@bar.example.com", true)]
    #[case("foo+special@Bar.baz-bar0.com", true)]
    #[case("foo@-bar.com", false)]
    #[case("@bar.com", false)]
    fn test_is_email(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_email(text), expected);
    }
}
