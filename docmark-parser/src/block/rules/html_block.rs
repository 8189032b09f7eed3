//! Raw HTML blocks.
use crate::{BlockState, Nesting, common::html_re::is_lone_tag_line};

const RAW_TAGS: &[&str] = &["script", "pre", "style", "textarea"];

const BLOCK_NAMES: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "search", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

/// The seven kinds of HTML block, in recognition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Raw,
    Comment,
    Processing,
    Declaration,
    Cdata,
    Block,
    LoneTag,
}

/// Case-insensitive `tag` at `text[from..]`, followed by one of the allowed
/// terminators or the end of the line.
fn tag_at(text: &str, from: usize, names: &[&str], allow_self_close: bool) -> bool {
    let rest = text.get(from..).unwrap_or_default();
    names.iter().any(|name| {
        let Some(head) = rest.get(..name.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(name) {
            return false;
        }
        let tail = rest.get(name.len()..).unwrap_or_default();
        match tail.as_bytes().first() {
            None | Some(b'>') => true,
            Some(byte) if byte.is_ascii_whitespace() => true,
            Some(b'/') => allow_self_close && tail.as_bytes().get(1) == Some(&b'>'),
            Some(_) => false,
        }
    })
}

impl Kind {
    fn detect(text: &str) -> Option<Self> {
        let lower = text.to_ascii_lowercase();
        if tag_at(text, 1, RAW_TAGS, false) {
            Some(Self::Raw)
        } else if text.starts_with("<!--") {
            Some(Self::Comment)
        } else if text.starts_with("<?") {
            Some(Self::Processing)
        } else if text
            .as_bytes()
            .get(2)
            .is_some_and(u8::is_ascii_uppercase)
            && text.starts_with("<!")
        {
            Some(Self::Declaration)
        } else if text.starts_with("<![CDATA[") {
            Some(Self::Cdata)
        } else if tag_at(&lower, if lower.starts_with("</") { 2 } else { 1 }, BLOCK_NAMES, true) {
            Some(Self::Block)
        } else if is_lone_tag_line(text) {
            Some(Self::LoneTag)
        } else {
            None
        }
    }

    fn ends(self, line: &str) -> bool {
        match self {
            Self::Raw => {
                let lower = line.to_ascii_lowercase();
                RAW_TAGS
                    .iter()
                    .any(|tag| lower.contains(&format!("</{tag}>")))
            }
            Self::Comment => line.contains("-->"),
            Self::Processing => line.contains("?>"),
            Self::Declaration => line.contains('>'),
            Self::Cdata => line.contains("]]>"),
            Self::Block | Self::LoneTag => line.is_empty(),
        }
    }

    /// Whether this kind of block may interrupt a paragraph.
    fn interrupts(self) -> bool {
        self != Self::LoneTag
    }
}

pub fn html_block(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    if state.is_code_block(start_line) || !state.md.options.html {
        return false;
    }
    let text = state.line_text(start_line);
    if !text.starts_with('<') {
        return false;
    }
    let Some(kind) = Kind::detect(text) else {
        return false;
    };
    if silent {
        return kind.interrupts();
    }

    let mut next_line = start_line + 1;
    if !kind.ends(text) {
        while next_line < end_line {
            if state.lines.indent(next_line) < state.blk_indent {
                break;
            }
            let line = state.line_text(next_line);
            if kind.ends(line) {
                if !line.is_empty() {
                    next_line += 1;
                }
                break;
            }
            next_line += 1;
        }
    }

    state.line = next_line;
    let content = state.get_lines(start_line, next_line, state.blk_indent, true);
    let token = state.push("html_block", "", Nesting::SelfClosing);
    token.map = Some([start_line, next_line]);
    token.content = content;
    true
}
