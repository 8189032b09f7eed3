//! A small, tolerant HTML fragment parser.
//!
//! Markdown lets raw HTML through as `html_block` and `html_inline` tokens;
//! this module turns such fragments into a queryable tree, and renders the
//! tree back, optionally replacing selected elements.
//!
//! ```
//! use docmark_parser::html::{RenderOverrides, parse_html};
//!
//! let tree = parse_html("<div><b>bold</b> &amp; plain</div>");
//! let b = tree.find(tree.root(), "b");
//! assert_eq!(b.map(|id| tree.text(id)), Some("bold".to_string()));
//! assert_eq!(tree.text(tree.root()), "bold & plain");
//!
//! let overrides = RenderOverrides::new().with("b", |tree, id| format!("*{}*", tree.text(id)));
//! assert_eq!(tree.render_with(&overrides), "<div>*bold* &amp; plain</div>");
//! ```
mod node;
mod parser;
mod render;

pub use node::{Attribute, Descendants, HtmlTree, Node, NodeId, NodeKind};
pub use parser::parse_html;
pub use render::{RenderFn, RenderOverrides};
