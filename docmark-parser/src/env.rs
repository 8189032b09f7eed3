//! Per-document side channel shared by every rule during one parse.
use std::collections::BTreeMap;

use serde::Serialize;

use crate::Token;

/// A link reference definition, keyed by its normalized label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub href: String,
    pub title: String,
}

/// One registered footnote, addressed by its numeric id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FootnoteEntry {
    /// `None` for inline footnotes.
    pub label: Option<String>,
    /// Number of references seen so far.
    pub count: usize,
    /// Raw source of an inline footnote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Parsed inline children of an inline footnote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<Token>>,
}

/// Footnote definitions and references collected during a parse.
///
/// A label maps to `None` until it is first referenced; ids are allocated in
/// order of first reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FootnoteRegistry {
    pub refs: BTreeMap<String, Option<usize>>,
    pub list: Vec<FootnoteEntry>,
}

/// Result of resolving a `[^label]` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FootnoteRef {
    pub id: usize,
    /// Zero-based index of this reference among all references to `id`.
    pub sub_id: usize,
}

impl FootnoteRegistry {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty() && self.list.is_empty()
    }

    /// Record a definition; an id assigned by an earlier reference is kept.
    pub fn define(&mut self, label: &str) {
        self.refs.entry(label.to_string()).or_insert(None);
    }

    #[must_use]
    pub fn is_defined(&self, label: &str) -> bool {
        self.refs.contains_key(label)
    }

    #[must_use]
    pub fn id_of(&self, label: &str) -> Option<usize> {
        self.refs.get(label).copied().flatten()
    }

    /// Resolve a reference, allocating the id on the first one.
    pub fn reference(&mut self, label: &str) -> FootnoteRef {
        let id = if let Some(id) = self.id_of(label) {
            id
        } else {
            let id = self.list.len();
            self.list.push(FootnoteEntry {
                label: Some(label.to_string()),
                ..FootnoteEntry::default()
            });
            self.refs.insert(label.to_string(), Some(id));
            id
        };
        let sub_id = self.bump(id);
        FootnoteRef { id, sub_id }
    }

    /// Register an inline footnote and return its reference.
    pub fn add_inline(&mut self, content: String, tokens: Vec<Token>) -> FootnoteRef {
        let id = self.list.len();
        self.list.push(FootnoteEntry {
            label: None,
            count: 0,
            content: Some(content),
            tokens: Some(tokens),
        });
        let sub_id = self.bump(id);
        FootnoteRef { id, sub_id }
    }

    fn bump(&mut self, id: usize) -> usize {
        self.list.get_mut(id).map_or(0, |entry| {
            let sub_id = entry.count;
            entry.count += 1;
            sub_id
        })
    }
}

/// Reading statistics gathered by the `wordcount` extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub words: usize,
    pub minutes: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
}

/// Document-wide state, threaded through every rule of a parse.
///
/// The typed fields belong to the built-in rules; `extra` is free-form storage
/// for third-party rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Env {
    pub references: BTreeMap<String, Reference>,
    #[serde(skip_serializing_if = "FootnoteRegistry::is_empty")]
    pub footnotes: FootnoteRegistry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wordcount: Option<WordCount>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
    #[serde(skip)]
    pub(crate) task_items: usize,
}

impl Env {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
