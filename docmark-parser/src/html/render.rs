use std::fmt;

use rustc_hash::FxHashMap;

use super::node::{Attribute, HtmlTree, NodeId, NodeKind};

/// Replacement renderer for one element. Receives the tree and the element
/// and returns the markup to emit in its place.
pub type RenderFn = dyn Fn(&HtmlTree, NodeId) -> String + Send + Sync;

/// Per-element render overrides, keyed by lowercase tag name.
#[derive(Default)]
pub struct RenderOverrides {
    by_tag: FxHashMap<String, Box<RenderFn>>,
}

impl fmt::Debug for RenderOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.by_tag.keys().collect();
        tags.sort();
        f.debug_struct("RenderOverrides").field("tags", &tags).finish()
    }
}

impl RenderOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<F>(mut self, tag: &str, render: F) -> Self
    where
        F: Fn(&HtmlTree, NodeId) -> String + Send + Sync + 'static,
    {
        self.by_tag.insert(tag.to_ascii_lowercase(), Box::new(render));
        self
    }

    fn get(&self, tag: &str) -> Option<&RenderFn> {
        self.by_tag
            .get(&tag.to_ascii_lowercase())
            .map(AsRef::as_ref)
    }
}

fn push_attrs(out: &mut String, attrs: &[Attribute]) {
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.name);
        if let Some(value) = &attr.value {
            let quote = if value.contains('"') { '\'' } else { '"' };
            out.push('=');
            out.push(quote);
            out.push_str(value);
            out.push(quote);
        }
    }
}

impl HtmlTree {
    /// Serialize the fragment back to HTML. A fragment of well-formed,
    /// double-quoted markup renders to its source text.
    #[must_use]
    pub fn render(&self) -> String {
        self.render_with(&RenderOverrides::default())
    }

    #[must_use]
    pub fn render_with(&self, overrides: &RenderOverrides) -> String {
        let mut out = String::new();
        self.render_children(self.root(), overrides, &mut out);
        out
    }

    /// Render `id` and its subtree without overrides.
    #[must_use]
    pub fn render_node(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &RenderOverrides::default(), &mut out);
        out
    }

    /// Render the children of `id` without overrides, e.g. from inside a
    /// [`RenderFn`].
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_children(id, &RenderOverrides::default(), &mut out);
        out
    }

    fn render_children(&self, id: NodeId, overrides: &RenderOverrides, out: &mut String) {
        for &child in self.children(id) {
            self.render_into(child, overrides, out);
        }
    }

    fn render_into(&self, id: NodeId, overrides: &RenderOverrides, out: &mut String) {
        let Some(kind) = self.kind(id) else {
            return;
        };
        if let Some(render) = kind.name().and_then(|name| overrides.get(name)) {
            out.push_str(&render(self, id));
            return;
        }
        match kind {
            NodeKind::Root => self.render_children(id, overrides, out),
            NodeKind::Tag { name, attrs } => {
                out.push('<');
                out.push_str(name);
                push_attrs(out, attrs);
                out.push('>');
                self.render_children(id, overrides, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::XTag { name, attrs } => {
                out.push('<');
                out.push_str(name);
                push_attrs(out, attrs);
                out.push_str(" />");
            }
            NodeKind::VoidTag { name, attrs } => {
                out.push('<');
                out.push_str(name);
                push_attrs(out, attrs);
                out.push('>');
            }
            NodeKind::Data(text) | NodeKind::Entity(text) => out.push_str(text),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Declaration(text) => {
                out.push_str("<!");
                out.push_str(text);
                out.push('>');
            }
            NodeKind::ProcessingInstruction(text) => {
                out.push_str("<?");
                out.push_str(text);
                out.push('>');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::html::parse_html;

    #[rstest]
    #[case("<div class=\"note\"><p>One &amp; two</p></div>")]
    #[case("<!DOCTYPE html><!-- c --><?php echo 1 ?>text")]
    #[case("<p>a<br>b<hr class=\"x\"></p>")]
    #[case("<script>a < b</script>")]
    #[case("<input disabled type=\"checkbox\">")]
    #[case("<x-widget data-q='say \"hi\"'></x-widget>")]
    #[case("plain < text & more")]
    fn test_round_trip(#[case] src: &str) {
        assert_eq!(parse_html(src).render(), src);
    }

    #[rstest]
    #[case("<p>open", "<p>open</p>")]
    #[case("<img src=x/>", "<img src=\"x/\">")]
    #[case("<a  href=x >y</a>", "<a href=\"x\">y</a>")]
    #[case("<br/>", "<br />")]
    #[case("</b>stray", "stray")]
    fn test_normalizes(#[case] src: &str, #[case] expected: &str) {
        assert_eq!(parse_html(src).render(), expected);
    }

    #[test]
    fn test_overrides_replace_elements() {
        let tree = parse_html("<p>See <A href=\"/x\">this</A> and <b>that</b></p>");
        let overrides = RenderOverrides::new()
            .with("a", |tree, id| {
                format!(
                    "[{}]({})",
                    tree.inner_html(id),
                    tree.attr(id, "href").unwrap_or_default()
                )
            })
            .with("B", |tree, id| format!("**{}**", tree.text(id)));
        assert_eq!(
            tree.render_with(&overrides),
            "<p>See [this](/x) and **that**</p>"
        );
        assert_eq!(format!("{overrides:?}"), "RenderOverrides { tags: [\"a\", \"b\"] }");
    }

    #[test]
    fn test_render_node() {
        let tree = parse_html("<ul><li>one</li><li>two</li></ul>");
        let items = tree.find_all("li");
        let rendered: Vec<_> = items.iter().map(|&id| tree.render_node(id)).collect();
        assert_eq!(rendered, vec!["<li>one</li>", "<li>two</li>"]);
    }
}
