//! Arena-backed tree produced by [`super::parse_html`].
use serde::{
    Serialize,
    ser::{SerializeMap, Serializer},
};

/// Index of a node in its [`HtmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One attribute as written. A bare attribute (`<input disabled>`) has no
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    /// An element with content and a closing tag.
    Tag { name: String, attrs: Vec<Attribute> },
    /// An explicitly self-closed element, `<x/>`.
    XTag { name: String, attrs: Vec<Attribute> },
    /// A void element such as `<br>` or `<img ...>`.
    VoidTag { name: String, attrs: Vec<Attribute> },
    Data(String),
    /// Text between `<!--` and `-->`.
    Comment(String),
    /// Text between `<!` and `>`, e.g. `DOCTYPE html`.
    Declaration(String),
    /// Text between `<?` and `>`.
    ProcessingInstruction(String),
    /// A character reference as written, `&amp;` or `&#x41;`.
    Entity(String),
}

impl NodeKind {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Tag { .. } => "tag",
            NodeKind::XTag { .. } => "xtag",
            NodeKind::VoidTag { .. } => "void_tag",
            NodeKind::Data(_) => "data",
            NodeKind::Comment(_) => "comment",
            NodeKind::Declaration(_) => "declaration",
            NodeKind::ProcessingInstruction(_) => "processing_instruction",
            NodeKind::Entity(_) => "entity",
        }
    }

    /// Element name, for the three element kinds.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeKind::Tag { name, .. } | NodeKind::XTag { name, .. } | NodeKind::VoidTag { name, .. } => {
                Some(name)
            }
            NodeKind::Root
            | NodeKind::Data(_)
            | NodeKind::Comment(_)
            | NodeKind::Declaration(_)
            | NodeKind::ProcessingInstruction(_)
            | NodeKind::Entity(_) => None,
        }
    }

    #[must_use]
    pub fn attrs(&self) -> &[Attribute] {
        match self {
            NodeKind::Tag { attrs, .. }
            | NodeKind::XTag { attrs, .. }
            | NodeKind::VoidTag { attrs, .. } => attrs,
            NodeKind::Root
            | NodeKind::Data(_)
            | NodeKind::Comment(_)
            | NodeKind::Declaration(_)
            | NodeKind::ProcessingInstruction(_)
            | NodeKind::Entity(_) => &[],
        }
    }

    /// Raw text of the leaf kinds.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            NodeKind::Data(text)
            | NodeKind::Comment(text)
            | NodeKind::Declaration(text)
            | NodeKind::ProcessingInstruction(text)
            | NodeKind::Entity(text) => Some(text),
            NodeKind::Root
            | NodeKind::Tag { .. }
            | NodeKind::XTag { .. }
            | NodeKind::VoidTag { .. } => None,
        }
    }

    fn is_named(&self, wanted: &str) -> bool {
        self.name().is_some_and(|name| name.eq_ignore_ascii_case(wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A parsed fragment. Node `0` is the root; every other node is reachable
/// from it through `children`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTree {
    nodes: Vec<Node>,
}

impl Default for HtmlTree {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }
}

impl HtmlTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    /// Number of nodes, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the fragment parsed to nothing but the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub(crate) fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(id);
        }
        id
    }

    /// Append text under `parent`, extending a trailing data node.
    pub(crate) fn append_data(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        let last = self.children(parent).last().copied();
        if let Some(NodeKind::Data(existing)) = last
            .and_then(|last| self.nodes.get_mut(last.0))
            .map(|node| &mut node.kind)
        {
            existing.push_str(text);
            return;
        }
        self.append(parent, NodeKind::Data(text.to_string()));
    }

    /// Pre-order walk below `id`, yielding each node with its depth
    /// relative to `id` (children are at depth 1).
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = self
            .children(id)
            .iter()
            .rev()
            .map(|&child| (child, 1))
            .collect();
        Descendants { tree: self, stack }
    }

    /// First element named `name` below `id`, depth first. Names compare
    /// ASCII case-insensitively.
    #[must_use]
    pub fn find(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id)
            .map(|(node, _)| node)
            .find(|&node| self.kind(node).is_some_and(|kind| kind.is_named(name)))
    }

    /// Every element named `name` in the tree, in document order.
    #[must_use]
    pub fn find_all(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .map(|(node, _)| node)
            .filter(|&node| self.kind(node).is_some_and(|kind| kind.is_named(name)))
            .collect()
    }

    /// Value of attribute `name` on element `id`; `Some("")` for a bare
    /// attribute.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.kind(id)?
            .attrs()
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_deref().unwrap_or_default())
    }

    /// Concatenated text below `id`, with character references decoded.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let mut text = String::new();
        let own = std::iter::once(id).chain(self.descendants(id).map(|(node, _)| node));
        for node in own {
            match self.kind(node) {
                Some(NodeKind::Data(data)) => text.push_str(data),
                Some(NodeKind::Entity(entity)) => {
                    text.push_str(&html_escape::decode_html_entities(entity));
                }
                Some(
                    NodeKind::Root
                    | NodeKind::Tag { .. }
                    | NodeKind::XTag { .. }
                    | NodeKind::VoidTag { .. }
                    | NodeKind::Comment(_)
                    | NodeKind::Declaration(_)
                    | NodeKind::ProcessingInstruction(_),
                )
                | None => {}
            }
        }
        text
    }
}

/// Iterator returned by [`HtmlTree::descendants`].
#[derive(Debug)]
pub struct Descendants<'t> {
    tree: &'t HtmlTree,
    stack: Vec<(NodeId, usize)>,
}

impl Iterator for Descendants<'_> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        self.stack.extend(
            self.tree
                .children(id)
                .iter()
                .rev()
                .map(|&child| (child, depth + 1)),
        );
        Some((id, depth))
    }
}

/// Serializes one node and its subtree.
struct NodeView<'t> {
    tree: &'t HtmlTree,
    id: NodeId,
}

impl Serialize for NodeView<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let Some(node) = self.tree.get(self.id) else {
            return serializer.serialize_none();
        };
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", node.kind.type_name())?;
        if let Some(name) = node.kind.name() {
            map.serialize_entry("name", name)?;
        }
        if !node.kind.attrs().is_empty() {
            map.serialize_entry("attrs", node.kind.attrs())?;
        }
        if let Some(text) = node.kind.text() {
            map.serialize_entry("text", text)?;
        }
        if !node.children.is_empty() {
            let children: Vec<_> = node
                .children
                .iter()
                .map(|&id| NodeView {
                    tree: self.tree,
                    id,
                })
                .collect();
            map.serialize_entry("children", &children)?;
        }
        map.end()
    }
}

impl Serialize for HtmlTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        NodeView {
            tree: self,
            id: self.root(),
        }
        .serialize(serializer)
    }
}
