//! Input generators for property-based testing.
#![allow(clippy::expect_used)]
use proptest::prelude::*;

/// Any string, control characters and all.
pub fn any_document_string() -> impl Strategy<Value = String> {
    prop::string::string_regex("(?s).{0,200}").expect("Failed to create any string strategy")
}

/// Printable ASCII with newlines and tabs.
pub fn ascii_document() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x20-\x7E\n\t]{0,200}")
        .expect("Failed to create ASCII string strategy")
}

/// Documents stitched together from fragments of every supported syntax,
/// so that openers, closers and nesting collide in unusual ways.
pub fn structured_document() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("# Title\n\n".to_string()),
            Just("Some *paragraph* text.\n\n".to_string()),
            Just("- item\n- [x] done\n".to_string()),
            Just("1. first\n   second\n".to_string()),
            Just("> quoted\n> > deeper\n".to_string()),
            Just("```rust\nfn main() {}\n```\n".to_string()),
            Just("    indented code\n".to_string()),
            Just(":::note\nbody\n:::\n".to_string()),
            Just("::::warning\n:::tip\nx\n:::\n".to_string()),
            Just(":::".to_string()),
            Just("!!! note \"Title\"\n    body\n".to_string()),
            Just("???+ tip\n\tfolded\n".to_string()),
            Just("$$\nx = 1\n$$ (eq)\n".to_string()),
            Just("inline $a + b$ math\n".to_string()),
            Just("\\begin{align}\na &= b\n\\end{align}\n".to_string()),
            Just("[^1]: footnote body\n    continued\n".to_string()),
            Just("ref[^1] and ^[inline note]\n".to_string()),
            Just("Term\n: Definition\n\n".to_string()),
            Just(":field: body\n  more\n".to_string()),
            Just("{#id .class key=\"v\"}\n".to_string()),
            Just("[span]{.c} and ![img](x.png){width=2}\n".to_string()),
            Just("{{ name }}\n".to_string()),
            Just("---\ntitle: x\n---\n".to_string()),
            Just("<div>\n*html*\n</div>\n".to_string()),
            Just("[link]: /url \"title\"\n".to_string()),
            Just("\\$ \\\\$ `code $`\n".to_string()),
            Just("\n".to_string()),
            Just("   ".to_string()),
            Just("\t".to_string()),
            prop::string::string_regex(r"[a-zA-Z0-9 .,!?*_`$\[\]{}:\n]{1,20}")
                .expect("Failed to create text chunk"),
        ],
        0..16,
    )
    .prop_map(|chunks| chunks.concat())
}

/// Multi-byte text around the bytes inline rules look for.
pub fn unicode_inline() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("é"),
            Just("漢字"),
            Just("🚀"),
            Just("\u{200B}"),
            Just("$"),
            Just("$$"),
            Just("\\"),
            Just("*"),
            Just("["),
            Just("]"),
            Just("{"),
            Just("}"),
            Just("<"),
            Just("&"),
            Just("`"),
            Just(" "),
            Just("\n"),
            Just("a"),
        ],
        0..40,
    )
    .prop_map(|pieces| pieces.concat())
}

fn html_text() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-zA-Z0-9 .,!?]{1,12}").expect("Failed to create text strategy")
}

fn html_attrs() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (
            prop::string::string_regex(r"[a-z][a-z-]{0,6}").expect("Failed to create name strategy"),
            prop::option::of(
                prop::string::string_regex(r"[a-z0-9 /.#]{0,8}")
                    .expect("Failed to create value strategy"),
            ),
        ),
        0..3,
    )
    .prop_map(|attrs| {
        attrs
            .into_iter()
            .map(|(name, value)| match value {
                Some(value) => format!(" {name}=\"{value}\""),
                None => format!(" {name}"),
            })
            .collect()
    })
}

/// Well-formed HTML fragments: balanced elements, void elements, comments,
/// character references and text.
pub fn html_fragment() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        html_text(),
        Just("&amp;".to_string()),
        Just("&#65;".to_string()),
        Just("&#x263A;".to_string()),
        prop::string::string_regex(r"<!--[a-z ]{0,10}-->").expect("Failed to create comment"),
        (prop_oneof![Just("br"), Just("hr"), Just("img"), Just("input")], html_attrs())
            .prop_map(|(name, attrs)| format!("<{name}{attrs}>")),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            prop_oneof![
                Just("div"),
                Just("p"),
                Just("span"),
                Just("em"),
                Just("a"),
                Just("section"),
                Just("x-box"),
            ],
            html_attrs(),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, attrs, children)| {
                format!("<{name}{attrs}>{}</{name}>", children.concat())
            })
    })
}
