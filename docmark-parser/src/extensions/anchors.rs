//! Heading anchors: every heading within `[min_level, max_level]` gets a
//! unique slug `id`, and optionally a `¶` permalink to itself.
use rustc_hash::FxHashSet;

use crate::{
    AnchorsOptions, CoreState, Error, Extension, MarkdownParser, Nesting, Token,
    extensions::core_rule,
};

/// # Errors
///
/// Returns [`Error::InvalidOption`] for an empty or inverted level range.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    let options = md.options.anchors.clone();
    if options.min_level == 0 || options.min_level > options.max_level {
        return Err(Error::invalid_option(
            Extension::Anchors,
            format!(
                "heading levels {}..={} are not a valid range",
                options.min_level, options.max_level
            ),
        ));
    }
    md.core
        .ruler
        .push("anchors", core_rule(move |state| anchors(state, &options)), &[]);
    Ok(())
}

/// Lowercase, spaces to dashes, and drop everything that is not a word
/// character or a dash.
#[must_use]
pub fn slugify(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|&c| c.is_alphanumeric() || c == '_' || c == '-')
        .collect()
}

/// `slug`, or `slug-1`, `slug-2`, ... if already taken.
fn unique_slug(slug: String, taken: &mut FxHashSet<String>) -> String {
    let mut unique = slug.clone();
    let mut suffix = 1;
    while taken.contains(&unique) {
        unique = format!("{slug}-{suffix}");
        suffix += 1;
    }
    taken.insert(unique.clone());
    unique
}

fn heading_level(token: &Token) -> Option<usize> {
    token.tag.strip_prefix('h')?.parse().ok()
}

fn permalink(slug: &str, options: &AnchorsOptions) -> Vec<Token> {
    let mut open = Token::new("link_open", "a", Nesting::Opening);
    open.attr_set("class", "header-anchor");
    open.attr_set("href", format!("#{slug}"));
    let mut symbol = Token::new("html_inline", "", Nesting::SelfClosing);
    symbol.content.clone_from(&options.permalink_symbol);
    let close = Token::new("link_close", "a", Nesting::Closing);
    vec![open, symbol, close]
}

fn space() -> Token {
    let mut token = Token::new("text", "", Nesting::SelfClosing);
    token.content = " ".to_string();
    token
}

pub fn anchors(state: &mut CoreState<'_>, options: &AnchorsOptions) {
    let mut taken = FxHashSet::default();
    for index in 0..state.tokens.len() {
        let Some(level) = state
            .tokens
            .get(index)
            .filter(|token| token.is("heading_open"))
            .and_then(heading_level)
        else {
            continue;
        };
        if !(options.min_level..=options.max_level).contains(&level) {
            continue;
        }
        let Some(inline) = state.tokens.get_mut(index + 1) else {
            continue;
        };
        let children = inline.children.get_or_insert_with(Vec::new);
        let title: String = children
            .iter()
            .filter(|child| child.is("text") || child.is("code_inline"))
            .map(|child| child.content.as_str())
            .collect();
        let slug = unique_slug(slugify(&title), &mut taken);

        if options.permalink {
            let link = permalink(&slug, options);
            let spacer = options.permalink_space.then(space);
            if options.permalink_before {
                let rest = std::mem::take(children);
                children.extend(link);
                children.extend(spacer);
                children.extend(rest);
            } else {
                children.extend(spacer);
                children.extend(link);
            }
        }
        if let Some(heading) = state.tokens.get_mut(index) {
            heading.attr_set("id", slug);
        }
    }
}
