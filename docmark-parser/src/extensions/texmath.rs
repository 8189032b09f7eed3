//! TeX math with a choice of delimiter family.
//!
//! | family     | inline                  | block                |
//! |------------|-------------------------|----------------------|
//! | `Dollars`  | `$..$`, `$$..$$`        | `$$..$$`             |
//! | `Brackets` | `\(..\)`                | `\[..\]`             |
//! | `Gitlab`   | `` $`..`$ ``            | ```` ```math..``` ```` |
//!
//! A block followed by `(eqno)` on the closing line becomes
//! `math_block_eqno` with the number in `info`.
use crate::{
    BlockState, Error, InlineState, MarkdownParser, Nesting, TexMathDelimiters,
    common::utils::{is_escaped, is_white_space},
    extensions::{INTERRUPTS, block_rule, inline_rule},
};

#[derive(Debug, Clone, Copy)]
struct InlineDelims {
    kind: &'static str,
    open: &'static str,
    close: &'static str,
    /// No whitespace just inside the delimiters, single line, no digit
    /// right outside.
    tight: bool,
}

#[derive(Debug, Clone, Copy)]
struct BlockDelims {
    open: &'static str,
    close: &'static str,
    /// Trim the content and refuse backticks in it.
    fenced: bool,
}

fn inline_delims(family: TexMathDelimiters) -> &'static [InlineDelims] {
    match family {
        TexMathDelimiters::Dollars => &[
            InlineDelims {
                kind: "math_inline_double",
                open: "$$",
                close: "$$",
                tight: false,
            },
            InlineDelims {
                kind: "math_inline",
                open: "$",
                close: "$",
                tight: true,
            },
        ],
        TexMathDelimiters::Brackets => &[InlineDelims {
            kind: "math_inline",
            open: "\\(",
            close: "\\)",
            tight: false,
        }],
        TexMathDelimiters::Gitlab => &[InlineDelims {
            kind: "math_inline",
            open: "$`",
            close: "`$",
            tight: false,
        }],
    }
}

fn block_delims(family: TexMathDelimiters) -> BlockDelims {
    match family {
        TexMathDelimiters::Dollars => BlockDelims {
            open: "$$",
            close: "$$",
            fenced: false,
        },
        TexMathDelimiters::Brackets => BlockDelims {
            open: "\\[",
            close: "\\]",
            fenced: false,
        },
        TexMathDelimiters::Gitlab => BlockDelims {
            open: "```math",
            close: "```",
            fenced: true,
        },
    }
}

/// # Errors
///
/// Fails if the `escape` or `fence` base rules were removed.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    let family = md.options.texmath.delimiters;
    for &delims in inline_delims(family) {
        md.inline.ruler.before(
            "escape",
            delims.kind,
            inline_rule(move |state, silent| math_inline(state, silent, delims)),
            &[],
        )?;
    }
    let delims = block_delims(family);
    md.block.ruler.before(
        "fence",
        "math_block_eqno",
        block_rule(move |state, start_line, end_line, silent| {
            math_block(state, start_line, end_line, silent, delims, true)
        }),
        INTERRUPTS,
    )?;
    md.block.ruler.before(
        "fence",
        "math_block",
        block_rule(move |state, start_line, end_line, silent| {
            math_block(state, start_line, end_line, silent, delims, false)
        }),
        INTERRUPTS,
    )
}

fn tight_content_ok(content: &str) -> bool {
    let first = content.chars().next();
    let last = content.chars().next_back();
    first.is_some_and(|c| !is_white_space(c))
        && last.is_some_and(|c| !is_white_space(c) && c != '\\')
}

/// Find the closing delimiter of the inline math opened at `state.pos`.
/// Returns the content and the position right after the closer.
fn match_inline<'a>(state: &InlineState<'a>, delims: InlineDelims) -> Option<(&'a str, usize)> {
    let start = state.pos;
    let max = state.pos_max;
    let src = state.src;
    if !src.get(start..max)?.starts_with(delims.open) || is_escaped(src, start) {
        return None;
    }
    let before = src.get(..start).and_then(|text| text.chars().next_back());
    if delims.tight && before.is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }

    let body = start + delims.open.len();
    let mut from = body;
    loop {
        let close = src.get(from..max)?.find(delims.close)? + from;
        let end = close + delims.close.len();
        let content = src.get(body..close)?;
        if content.is_empty() || is_escaped(src, close) {
            from = close + 1;
            continue;
        }
        if delims.tight {
            if content.contains('\n') {
                return None;
            }
            let after = src.get(end..max).and_then(|text| text.chars().next());
            if !tight_content_ok(content) || after.is_some_and(|c| c.is_ascii_digit()) {
                from = close + 1;
                continue;
            }
        }
        return Some((content, end));
    }
}

fn math_inline(state: &mut InlineState<'_>, silent: bool, delims: InlineDelims) -> bool {
    let Some((content, end)) = match_inline(state, delims) else {
        return false;
    };
    if !silent {
        let token = state.push(delims.kind, "math", Nesting::SelfClosing);
        token.content = content.to_string();
        token.markup = delims.open.to_string();
    }
    state.pos = end;
    true
}

/// Parse `(label)` trailing a closing delimiter.
fn parse_eqno(rest: &str) -> Option<&str> {
    let label = rest.trim().strip_prefix('(')?.strip_suffix(')')?;
    (!label.is_empty() && !label.contains([')', '$'])).then_some(label)
}

#[derive(Debug, PartialEq, Eq)]
struct BlockMatch {
    content: String,
    eqno: Option<String>,
    /// Last line covered by the block.
    last_line: usize,
}

fn match_block(
    state: &BlockState<'_>,
    start_line: usize,
    end_line: usize,
    delims: BlockDelims,
    want_eqno: bool,
) -> Option<BlockMatch> {
    if state.is_code_block(start_line) {
        return None;
    }
    let begin = state.lines.start(start_line);
    let limit = state.lines.end(end_line.checked_sub(1)?);
    let window = state.slice(begin, limit);
    if !window.starts_with(delims.open) {
        return None;
    }

    let body = delims.open.len();
    let mut from = body;
    loop {
        let close = window.get(from..)?.find(delims.close)? + from;
        from = close + 1;
        let after = close + delims.close.len();
        let content = window.get(body..close)?;
        let content = if delims.fenced { content.trim() } else { content };
        if content.trim().is_empty()
            || is_escaped(window, close)
            || (delims.fenced && content.contains('`'))
        {
            continue;
        }
        let rest = window.get(after..)?;
        let rest = rest.split('\n').next().unwrap_or_default();
        let eqno = if rest.trim().is_empty() {
            None
        } else if let Some(label) = parse_eqno(rest) {
            Some(label.to_string())
        } else {
            continue;
        };
        if eqno.is_some() != want_eqno {
            continue;
        }
        let consumed = window.get(..after)?;
        return Some(BlockMatch {
            content: content.to_string(),
            eqno,
            last_line: start_line + consumed.matches('\n').count(),
        });
    }
}

fn math_block(
    state: &mut BlockState<'_>,
    start_line: usize,
    end_line: usize,
    silent: bool,
    delims: BlockDelims,
    want_eqno: bool,
) -> bool {
    let Some(found) = match_block(state, start_line, end_line, delims, want_eqno) else {
        return false;
    };
    if silent {
        return true;
    }
    state.line = found.last_line + 1;
    let line = state.line;
    let kind = if want_eqno {
        "math_block_eqno"
    } else {
        "math_block"
    };
    let token = state.push(kind, "math", Nesting::SelfClosing);
    token.content = found.content;
    token.markup = delims.open.to_string();
    token.info = found.eqno.unwrap_or_default();
    token.map = Some([start_line, line]);
    true
}
