//! The token stream: the sole contract between the tokenizer and whatever
//! builds a tree or renders from it.
use std::{collections::BTreeMap, fmt};

use serde::{
    Serialize,
    ser::{SerializeMap, Serializer},
};

/// Whether a token opens a scope, closes one, or stands alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Nesting {
    Opening,
    #[default]
    SelfClosing,
    Closing,
}

impl Nesting {
    #[must_use]
    pub fn as_i8(self) -> i8 {
        match self {
            Nesting::Opening => 1,
            Nesting::SelfClosing => 0,
            Nesting::Closing => -1,
        }
    }
}

impl Serialize for Nesting {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i8(self.as_i8())
    }
}

impl fmt::Display for Nesting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// Ordered attribute list.
///
/// Insertion order is preserved because renderers emit attributes in the order
/// they were attached, and `class` values accumulate rather than overwrite when
/// joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs(Vec<(String, String)>);

impl Attrs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    /// Set `name`, replacing an existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    /// Append `value` to an existing attribute, space separated, or set it.
    pub fn join(&mut self, name: impl Into<String>, value: &str) {
        let name = name.into();
        if let Some(slot) = self.0.iter_mut().find(|(key, _)| *key == name) {
            slot.1.push(' ');
            slot.1.push_str(value);
        } else {
            self.0.push((name, value.to_string()));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attrs::new();
        for (key, value) in iter {
            attrs.set(key, value);
        }
        attrs
    }
}

impl Serialize for Attrs {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A value stored in [`Token::meta`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Number(usize),
    Text(String),
    Flag(bool),
    Attrs(Attrs),
}

impl From<usize> for MetaValue {
    fn from(value: usize) -> Self {
        MetaValue::Number(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Flag(value)
    }
}

impl From<Attrs> for MetaValue {
    fn from(value: Attrs) -> Self {
        MetaValue::Attrs(value)
    }
}

pub type Meta = BTreeMap<String, MetaValue>;

/// A single entry of the token stream.
///
/// `nesting` and `level` carry the stack discipline: every opening token of a
/// given `kind` is matched by exactly one closing token at the same `level`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Token {
    /// Token type, e.g. `paragraph_open`, `math_block`, `container_note_close`.
    #[serde(rename = "type")]
    pub kind: String,
    /// HTML tag name a renderer would use.
    pub tag: String,
    pub nesting: Nesting,
    pub level: usize,
    /// Source line range `[start, end)` for block tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<[usize; 2]>,
    #[serde(skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub markup: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub info: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: Meta,
    /// Inline children for `inline` tokens (and alt text of images).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Token>>,
    pub block: bool,
    /// Renderers skip hidden tokens (tight list paragraphs, front matter).
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

impl Token {
    #[must_use]
    pub fn new(kind: impl Into<String>, tag: impl Into<String>, nesting: Nesting) -> Self {
        Self {
            kind: kind.into(),
            tag: tag.into(),
            nesting,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attr_get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    pub fn attr_set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.set(name, value);
    }

    pub fn attr_join(&mut self, name: impl Into<String>, value: &str) {
        self.attrs.join(name, value);
    }

    #[must_use]
    pub fn meta_number(&self, key: &str) -> Option<usize> {
        match self.meta.get(key) {
            Some(MetaValue::Number(value)) => Some(*value),
            Some(MetaValue::Text(_) | MetaValue::Flag(_) | MetaValue::Attrs(_)) | None => None,
        }
    }

    #[must_use]
    pub fn meta_text(&self, key: &str) -> Option<&str> {
        match self.meta.get(key) {
            Some(MetaValue::Text(value)) => Some(value.as_str()),
            Some(MetaValue::Number(_) | MetaValue::Flag(_) | MetaValue::Attrs(_)) | None => None,
        }
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.meta.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}
