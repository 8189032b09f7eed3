//! Tokenizer invariants checked with property-based testing.
//!
//! - P0: the engines never panic on any input
//! - P1: silent validation has no side effects, nested tokenization leaves
//!   the line index as it found it
//! - P2: container closing rules, token balance, escape parity and HTML
//!   round-trips

use proptest::prelude::*;

use super::generators::*;
use crate::{
    BlockState, Closing, ContainerMatcher, Env, Extension, InlineState, LineIndex, Marker,
    MarkdownParser, Nesting, Options, Token, common::utils::is_escaped, html::parse_html,
};

fn full_parser() -> MarkdownParser {
    let options = Options::builder()
        .without_extension(Extension::DollarMath)
        .with_extension(Extension::TexMath)
        .build();
    MarkdownParser::new(options).unwrap_or_else(|_| MarkdownParser::commonmark())
}

fn default_parser() -> MarkdownParser {
    MarkdownParser::new(Options::default()).unwrap_or_else(|_| MarkdownParser::commonmark())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10000,
        .. ProptestConfig::default()
    })]

    // ====================================================================
    // P0: CRITICAL INVARIANTS
    // ====================================================================

    #[test]
    fn parser_never_panics(input in any_document_string()) {
        let _ = default_parser().parse(&input, &mut Env::default());
    }

    #[test]
    fn parser_never_panics_on_structured_input(input in structured_document()) {
        let _ = default_parser().parse(&input, &mut Env::default());
        let _ = full_parser().parse(&input, &mut Env::default());
    }

    #[test]
    fn inline_parser_never_panics(input in unicode_inline()) {
        let _ = default_parser().parse_inline(&input, &mut Env::default());
        let _ = full_parser().parse_inline(&input, &mut Env::default());
    }

    #[test]
    fn html_parser_never_panics(input in any_document_string()) {
        let tree = parse_html(&input);
        let _ = tree.render();
    }

    #[test]
    fn html_text_never_exceeds_input(input in ascii_document()) {
        let tree = parse_html(&input);
        let text = tree.text(tree.root());
        // Markup is dropped, never invented.
        prop_assert!(text.len() <= input.len() || input.contains('&'));
    }

    // ====================================================================
    // P1: STATE INVARIANTS
    // ====================================================================

    #[test]
    fn silent_block_rules_have_no_side_effects(input in structured_document()) {
        for md in [default_parser(), full_parser()] {
            verify_silent_block_rules(&md, &input)?;
        }
    }

    #[test]
    fn silent_inline_rules_have_no_side_effects(input in unicode_inline()) {
        verify_silent_inline_rules(&default_parser(), &input)?;
    }

    #[test]
    fn tokenizing_restores_the_line_index(input in structured_document()) {
        let md = default_parser();
        let mut env = Env::default();
        let mut state = BlockState::new(&input, &md, &mut env);
        let pristine = LineIndex::new(&input);
        let end_line = state.line_max;
        md.block.tokenize(&mut state, 0, end_line);
        prop_assert!(state.lines == pristine, "line index changed by tokenizing {input:?}");
        prop_assert_eq!(state.src.as_ref(), input.as_str());
    }

    // ====================================================================
    // P2: BEHAVIORAL INVARIANTS
    // ====================================================================

    #[test]
    fn marker_closes_iff_long_enough(
        opening in 3usize..8,
        closing in 1usize..10,
        tail in "[ \tx:]{0,3}",
    ) {
        let src = format!("{}\nbody\n{}{tail}\n", ":".repeat(opening), ":".repeat(closing));
        let md = MarkdownParser::commonmark();
        let mut env = Env::default();
        let state = BlockState::new(&src, &md, &mut env);
        let matcher = ContainerMatcher::new(Marker::Run(vec![b':']), 3, Closing::Marker);
        let Some(open) = matcher.open(&state, 0, |_| true) else {
            return Err(TestCaseError::fail("opening marker not recognized"));
        };
        prop_assert_eq!(open.count, opening);
        let run = closing + tail.bytes().take_while(|&b| b == b':').count();
        let rest_blank = tail.trim_start_matches(':').trim().is_empty();
        let expected = run >= opening && rest_blank;
        prop_assert_eq!(matcher.closing_marker(&state, 2, &open).is_some(), expected);
    }

    #[test]
    fn unterminated_containers_close_at_end(depth in 1usize..4, body in "[a-z ]{1,10}") {
        let src: String = (0..depth)
            .map(|level| format!("{}note\n", ":".repeat(3 + depth - level)))
            .chain(std::iter::once(format!("{body}\n")))
            .collect();
        let tokens = default_parser().parse(&src, &mut Env::default());
        verify_balanced(&tokens)?;
        let last_line = src.lines().count();
        let closes: Vec<_> = tokens.iter().filter(|t| t.is("container_note_close")).collect();
        prop_assert_eq!(closes.len(), depth);
        for close in closes {
            prop_assert_eq!(close.map, Some([last_line - 1, last_line]));
        }
    }

    #[test]
    fn token_streams_are_balanced(input in structured_document()) {
        for md in [default_parser(), full_parser()] {
            let tokens = md.parse(&input, &mut Env::default());
            verify_balanced(&tokens)?;
            for token in &tokens {
                if let Some(children) = &token.children {
                    verify_balanced(children)?;
                }
            }
        }
    }

    #[test]
    fn escape_parity(prefix in "[a-z]{0,3}", slashes in 0usize..6, suffix in "[$a-z]{1,3}") {
        let text = format!("{prefix}{}{suffix}", "\\".repeat(slashes));
        let pos = prefix.len() + slashes;
        prop_assert_eq!(is_escaped(&text, pos), slashes % 2 == 1);
    }

    #[test]
    fn html_round_trips(fragment in html_fragment()) {
        prop_assert_eq!(parse_html(&fragment).render(), fragment);
    }
}

// ====================================================================
// Helper functions for invariant verification
// ====================================================================

/// Every block rule, run silently at every line, leaves tokens, cursor,
/// line index and `Env` untouched and answers the same way twice.
fn verify_silent_block_rules(md: &MarkdownParser, src: &str) -> Result<(), TestCaseError> {
    let mut env = Env::default();
    let mut state = BlockState::new(src, md, &mut env);
    let end_line = state.line_max;
    let names = md.block.ruler.names("");
    for line in 0..end_line {
        for (name, rule) in names.iter().zip(md.block.ruler.rules_for("")) {
            state.line = line;
            let lines = state.lines.clone();
            let env_before = state.env.clone();
            let first = rule(&mut state, line, end_line, true);
            prop_assert!(state.tokens.is_empty(), "{name} emitted tokens at line {line}");
            prop_assert_eq!(state.line, line, "{} moved the cursor", name);
            prop_assert!(state.lines == lines, "{name} changed the line index at {line}");
            prop_assert!(*state.env == env_before, "{name} changed env at line {line}");
            prop_assert_eq!(state.level, 0, "{} changed the level", name);
            let second = rule(&mut state, line, end_line, true);
            prop_assert_eq!(first, second, "{} answered differently twice", name);
        }
    }
    Ok(())
}

/// Every inline rule, run silently at every character, emits nothing and
/// leaves the cursor alone when it declines.
fn verify_silent_inline_rules(md: &MarkdownParser, src: &str) -> Result<(), TestCaseError> {
    let mut env = Env::default();
    let mut state = InlineState::new(src, md, &mut env);
    let names = md.inline.ruler.names("");
    for (pos, _) in src.char_indices() {
        for (name, rule) in names.iter().zip(md.inline.ruler.rules_for("")) {
            state.pos = pos;
            state.pos_max = src.len();
            let matched = rule(&mut state, true);
            prop_assert!(state.tokens.is_empty(), "{name} emitted tokens at {pos}");
            prop_assert!(state.pending.is_empty(), "{name} wrote pending text at {pos}");
            prop_assert_eq!(state.level, 0, "{} changed the level", name);
            if matched {
                prop_assert!(state.pos > pos, "{name} matched at {pos} without advancing");
            } else {
                prop_assert_eq!(state.pos, pos, "{} declined but moved the cursor", name);
            }
        }
    }
    Ok(())
}

/// Opening and closing tokens pair up like brackets, and paired kinds share
/// their stem (`x_open` with `x_close`).
fn verify_balanced(tokens: &[Token]) -> Result<(), TestCaseError> {
    let mut stack: Vec<&str> = Vec::new();
    for token in tokens {
        match token.nesting {
            Nesting::Opening => stack.push(&token.kind),
            Nesting::Closing => {
                let Some(open) = stack.pop() else {
                    return Err(TestCaseError::fail(format!("unmatched {}", token.kind)));
                };
                prop_assert_eq!(
                    open.strip_suffix("_open"),
                    token.kind.strip_suffix("_close"),
                    "{} closed by {}",
                    open,
                    token.kind
                );
            }
            Nesting::SelfClosing => {}
        }
    }
    prop_assert!(stack.is_empty(), "unclosed tokens: {stack:?}");
    Ok(())
}
