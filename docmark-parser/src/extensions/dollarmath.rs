//! Dollar math: `$inline$`, optionally `$$inline display$$`, and `$$` blocks
//! with an optional `(label)` after the closing delimiter.
use crate::{
    BlockState, DollarMathOptions, Error, InlineState, MarkdownParser, Nesting,
    common::utils::{is_escaped, is_white_space},
    extensions::{INTERRUPTS, block_rule, inline_rule},
};

/// # Errors
///
/// Fails if the `escape` or `fence` base rules were removed.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    let options = md.options.dollarmath.clone();
    let block_options = options.clone();
    md.inline.ruler.before(
        "escape",
        "math_inline",
        inline_rule(move |state, silent| math_inline(state, silent, &options)),
        &[],
    )?;
    md.block.ruler.before(
        "fence",
        "math_block",
        block_rule(move |state, start_line, end_line, silent| {
            math_block(state, start_line, end_line, silent, &block_options)
        }),
        INTERRUPTS,
    )
}

fn char_before(src: &str, pos: usize) -> Option<char> {
    src.get(..pos).and_then(|before| before.chars().next_back())
}

fn char_at(src: &str, pos: usize, max: usize) -> Option<char> {
    src.get(pos..max).and_then(|rest| rest.chars().next())
}

pub fn math_inline(state: &mut InlineState<'_>, silent: bool, options: &DollarMathOptions) -> bool {
    let start = state.pos;
    let max = state.pos_max;
    let src = state.src;
    if state.byte(start) != Some(b'$') {
        return false;
    }
    if !options.allow_space && char_at(src, start + 1, max).is_none_or(is_white_space) {
        return false;
    }
    if !options.allow_digits && char_before(src, start).is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    if is_escaped(src, start) || start + 1 >= max {
        return false;
    }

    let is_double = options.double_inline && state.byte(start + 1) == Some(b'$');
    let mut pos = start + 1 + usize::from(is_double);
    let (close_start, end) = loop {
        let Some(found) = src.get(pos..max).and_then(|rest| rest.find('$')) else {
            return false;
        };
        let found = pos + found;
        if is_escaped(src, found) {
            pos = found + 1;
            continue;
        }
        if !is_double {
            break (found, found + 1);
        }
        if found + 1 >= max {
            return false;
        }
        if state.byte(found + 1) == Some(b'$') {
            break (found, found + 2);
        }
        pos = found + 1;
    };

    if !options.allow_space && char_before(src, close_start).is_none_or(is_white_space) {
        return false;
    }
    if !options.allow_digits && char_at(src, end, max).is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    let content_start = start + 1 + usize::from(is_double);
    let text = state.slice(content_start, close_start);
    if text.is_empty() {
        return false;
    }

    if !silent {
        let (kind, markup) = if is_double {
            ("math_inline_double", "$$")
        } else {
            ("math_inline", "$")
        };
        let token = state.push(kind, "math", Nesting::SelfClosing);
        token.content = text.to_string();
        token.markup = markup.to_string();
    }
    state.pos = end;
    true
}

/// Split `... $$ (label)` into the length of the part before `$$` and the
/// label. The label is the shortest parenthesized tail that follows `$$`.
fn split_label(line: &str) -> Option<(usize, String)> {
    let inner = line.trim_end().strip_suffix(')')?;
    let floor = inner.rfind([')', '$']).map_or(0, |index| index + 1);
    let candidates = inner.get(floor..)?;
    for (open, _) in candidates.rmatch_indices('(') {
        let open = floor + open;
        let label = inner.get(open + 1..).unwrap_or_default();
        if label.is_empty() {
            continue;
        }
        let before = inner.get(..open).unwrap_or_default().trim_end();
        if let Some(content) = before.strip_suffix("$$") {
            return Some((content.len(), label.to_string()));
        }
    }
    None
}

/// Look for the closing `$$` at the end of `text`, which starts at byte
/// `offset` of the source. Returns where the math content ends and the
/// label, if any.
fn closing_on_line(text: &str, offset: usize, allow_labels: bool) -> Option<(usize, Option<String>)> {
    if let Some(body) = text.trim_end().strip_suffix("$$") {
        return Some((offset + body.len(), None));
    }
    if !allow_labels {
        return None;
    }
    split_label(text).map(|(len, label)| (offset + len, Some(label)))
}

/// Collapse whitespace runs in an equation label into `-`.
fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join("-")
}

pub fn math_block(
    state: &mut BlockState<'_>,
    start_line: usize,
    end_line: usize,
    silent: bool,
    options: &DollarMathOptions,
) -> bool {
    if state.is_code_block(start_line) {
        return false;
    }
    let start = state.lines.start(start_line);
    let max = state.lines.end(start_line);
    if start + 2 > max || state.slice(start, start + 2) != "$$" {
        return false;
    }

    let mut next_line = start_line;
    let first = state.slice(start, max);
    let mut found = if first.trim().len() > 3 {
        closing_on_line(first, start, options.allow_labels)
    } else {
        None
    };
    while found.is_none() {
        next_line += 1;
        if next_line >= end_line {
            break;
        }
        let line_start = state.lines.start(next_line);
        let line_end = state.lines.end(next_line);
        if line_start < line_end && state.lines.indent(next_line) < state.blk_indent {
            break;
        }
        let text = state.slice(line_start, line_end);
        if text.trim().is_empty() && !options.allow_blank_lines {
            break;
        }
        found = closing_on_line(text, line_start, options.allow_labels);
    }

    // An unterminated block is not math.
    let Some((content_end, label)) = found else {
        return false;
    };
    if silent {
        return true;
    }

    let content = state.slice(start + 2, content_end).to_string();
    state.line = next_line + 1;
    let line = state.line;
    let kind = if label.is_some() {
        "math_block_label"
    } else {
        "math_block"
    };
    let token = state.push(kind, "math", Nesting::SelfClosing);
    token.content = content;
    token.markup = "$$".to_string();
    token.map = Some([start_line, line]);
    if let Some(label) = label {
        token.info = normalize_label(&label);
    }
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{Env, Extension, Extensions, Options, Token};

    fn parser(options: DollarMathOptions) -> Result<MarkdownParser, Error> {
        let options = Options::builder()
            .with_extensions(Extensions::only(&[Extension::DollarMath]))
            .with_dollarmath(options)
            .build();
        MarkdownParser::new(options)
    }

    fn inline_children(md: &MarkdownParser, src: &str) -> Vec<(String, String)> {
        md.parse_inline(src, &mut Env::default())
            .into_iter()
            .flat_map(|token| token.children.unwrap_or_default())
            .map(|child: Token| (child.kind, child.content))
            .collect()
    }

    fn pair(kind: &str, content: &str) -> (String, String) {
        (kind.to_string(), content.to_string())
    }

    #[test]
    fn test_single_line_block() -> Result<(), Error> {
        let md = parser(DollarMathOptions::default())?;
        let tokens = md.parse("$$x=1$$", &mut Env::default());
        assert_eq!(tokens.len(), 1);
        let token = tokens.first();
        assert_eq!(token.map(|t| t.kind.as_str()), Some("math_block"));
        assert_eq!(token.map(|t| t.content.as_str()), Some("x=1"));
        assert_eq!(token.and_then(|t| t.map), Some([0, 1]));
        Ok(())
    }

    #[test]
    fn test_multi_line_block_with_label() -> Result<(), Error> {
        let md = parser(DollarMathOptions::default())?;
        let tokens = md.parse("$$\na = 1\n$$ (eq one)\nafter\n", &mut Env::default());
        let token = tokens.first();
        assert_eq!(token.map(|t| t.kind.as_str()), Some("math_block_label"));
        assert_eq!(token.map(|t| t.content.as_str()), Some("\na = 1\n"));
        assert_eq!(token.map(|t| t.info.as_str()), Some("eq-one"));
        assert_eq!(token.and_then(|t| t.map), Some([0, 3]));
        assert_eq!(tokens.get(1).map(|t| t.kind.as_str()), Some("paragraph_open"));
        Ok(())
    }

    #[rstest]
    #[case("$$ (a)", Some((0, "a")))]
    #[case("x = 1 $$  (eq (1))  ", None)]
    #[case("x $$ (f(x))", None)]
    #[case("x $$ (eq 1)", Some((2, "eq 1")))]
    #[case("x $$ ()", None)]
    #[case("x (a)", None)]
    fn test_split_label(#[case] line: &str, #[case] expected: Option<(usize, &str)>) {
        assert_eq!(
            split_label(line),
            expected.map(|(len, label)| (len, label.to_string()))
        );
    }

    #[test]
    fn test_unterminated_block_is_a_paragraph() -> Result<(), Error> {
        let md = parser(DollarMathOptions::default())?;
        let tokens = md.parse("$$\na\n", &mut Env::default());
        assert_eq!(tokens.first().map(|t| t.kind.as_str()), Some("paragraph_open"));
        Ok(())
    }

    #[test]
    fn test_blank_lines_can_be_disallowed() -> Result<(), Error> {
        let md = parser(DollarMathOptions {
            allow_blank_lines: false,
            ..DollarMathOptions::default()
        })?;
        let tokens = md.parse("$$\na\n\nb\n$$\n", &mut Env::default());
        assert!(tokens.iter().all(|t| !t.is("math_block")));
        let md = parser(DollarMathOptions::default())?;
        let tokens = md.parse("$$\na\n\nb\n$$\n", &mut Env::default());
        assert_eq!(tokens.first().map(|t| t.content.as_str()), Some("\na\n\nb\n"));
        Ok(())
    }

    #[test]
    fn test_inline_math() -> Result<(), Error> {
        let md = parser(DollarMathOptions::default())?;
        assert_eq!(
            inline_children(&md, "a $x^2$ b"),
            vec![pair("text", "a "), pair("math_inline", "x^2"), pair("text", " b")]
        );
        assert_eq!(
            inline_children(&md, "\\$x$"),
            vec![pair("text", "$x$")]
        );
        assert_eq!(
            inline_children(&md, "$a\\$b$"),
            vec![pair("math_inline", "a\\$b")]
        );
        Ok(())
    }

    #[test]
    fn test_inline_double_dollar() -> Result<(), Error> {
        let md = parser(DollarMathOptions {
            double_inline: true,
            ..DollarMathOptions::default()
        })?;
        assert_eq!(
            inline_children(&md, "see $$x$$."),
            vec![
                pair("text", "see "),
                pair("math_inline_double", "x"),
                pair("text", "."),
            ]
        );
        Ok(())
    }

    #[rstest]
    #[case("$ x$")]
    #[case("$x $")]
    #[case("1$x$")]
    #[case("$x$2")]
    fn test_adjacency_rules(#[case] src: &str) -> Result<(), Error> {
        let md = parser(DollarMathOptions {
            allow_space: false,
            allow_digits: false,
            ..DollarMathOptions::default()
        })?;
        let children = inline_children(&md, src);
        assert!(children.iter().all(|(kind, _)| kind == "text"), "{children:?}");
        Ok(())
    }
}
