//! Syntax extensions.
//!
//! Every extension exposes a `register` function that slots its rules into
//! the engines of a [`MarkdownParser`] relative to the built-in ones. The
//! enabled set comes from [`crate::Options::extensions`]; registration order
//! is fixed so that competing rules (containers and colon fences, `$` math
//! flavours) resolve the same way regardless of how the set was built.
use crate::{
    BlockRule, BlockState, CoreRule, CoreState, Error, Extension, InlineRule, InlineState,
    MarkdownParser,
};

pub mod admonition;
pub mod amsmath;
pub mod anchors;
pub mod attrs;
pub mod colon_fence;
pub mod container;
pub mod deflist;
pub mod dollarmath;
pub mod field_list;
pub mod footnote;
pub mod front_matter;
pub mod substitution;
pub mod tasklists;
pub mod texmath;
pub mod wordcount;

/// Block rules that may interrupt a paragraph, a reference, a blockquote and
/// a list item.
pub(crate) const INTERRUPTS: &[&str] = &["paragraph", "reference", "blockquote", "list"];

/// Register every extension enabled in `md.options`.
///
/// # Errors
///
/// Returns [`Error::InvalidOption`] when an extension's options are unusable,
/// or [`Error::RuleNotFound`] when a base rule an extension anchors on was
/// removed.
pub fn register_enabled(md: &mut MarkdownParser) -> Result<(), Error> {
    let extensions = md.options.extensions.clone();
    let enabled = |extension| extensions.contains(extension);

    if enabled(Extension::FrontMatter) {
        front_matter::register(md)?;
    }
    if enabled(Extension::Admonition) {
        admonition::register(md)?;
    }
    if enabled(Extension::Container) {
        container::register(md)?;
    }
    if enabled(Extension::ColonFence) {
        colon_fence::register(md)?;
    }
    if enabled(Extension::DollarMath) {
        if enabled(Extension::TexMath) {
            tracing::warn!("dollarmath and texmath are both enabled, texmath is ignored");
        }
        dollarmath::register(md)?;
    } else if enabled(Extension::TexMath) {
        texmath::register(md)?;
    }
    if enabled(Extension::AmsMath) {
        amsmath::register(md)?;
    }
    if enabled(Extension::Footnote) {
        footnote::register(md)?;
    }
    if enabled(Extension::Deflist) {
        deflist::register(md)?;
    }
    if enabled(Extension::FieldList) {
        field_list::register(md)?;
    }
    if enabled(Extension::TaskLists) {
        tasklists::register(md)?;
    }
    if enabled(Extension::Attrs) {
        attrs::register(md)?;
    }
    if enabled(Extension::Substitution) {
        substitution::register(md)?;
    }
    if enabled(Extension::WordCount) {
        wordcount::register(md)?;
    }
    if enabled(Extension::Anchors) {
        anchors::register(md)?;
    }
    Ok(())
}

/// Box a closure as a block rule.
pub(crate) fn block_rule<F>(rule: F) -> Box<BlockRule>
where
    F: for<'s, 'a> Fn(&'s mut BlockState<'a>, usize, usize, bool) -> bool + Send + Sync + 'static,
{
    Box::new(rule)
}

/// Box a closure as an inline rule.
pub(crate) fn inline_rule<F>(rule: F) -> Box<InlineRule>
where
    F: for<'s, 'a> Fn(&'s mut InlineState<'a>, bool) -> bool + Send + Sync + 'static,
{
    Box::new(rule)
}

/// Box a closure as a core rule.
pub(crate) fn core_rule<F>(rule: F) -> Box<CoreRule>
where
    F: for<'s, 'a> Fn(&'s mut CoreState<'a>) + Send + Sync + 'static,
{
    Box::new(rule)
}
