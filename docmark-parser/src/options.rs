use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A syntax extension that can be switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Extension {
    #[serde(rename = "front_matter")]
    FrontMatter,
    #[serde(rename = "admonition")]
    Admonition,
    #[serde(rename = "container")]
    Container,
    #[serde(rename = "colon_fence")]
    ColonFence,
    #[serde(rename = "dollarmath")]
    DollarMath,
    #[serde(rename = "texmath")]
    TexMath,
    #[serde(rename = "amsmath")]
    AmsMath,
    #[serde(rename = "footnote")]
    Footnote,
    #[serde(rename = "deflist")]
    Deflist,
    #[serde(rename = "field_list")]
    FieldList,
    #[serde(rename = "tasklists")]
    TaskLists,
    #[serde(rename = "attrs")]
    Attrs,
    #[serde(rename = "substitution")]
    Substitution,
    #[serde(rename = "wordcount")]
    WordCount,
    #[serde(rename = "anchors")]
    Anchors,
}

impl Extension {
    pub const ALL: [Extension; 15] = [
        Extension::FrontMatter,
        Extension::Admonition,
        Extension::Container,
        Extension::ColonFence,
        Extension::DollarMath,
        Extension::TexMath,
        Extension::AmsMath,
        Extension::Footnote,
        Extension::Deflist,
        Extension::FieldList,
        Extension::TaskLists,
        Extension::Attrs,
        Extension::Substitution,
        Extension::WordCount,
        Extension::Anchors,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Extension::FrontMatter => "front_matter",
            Extension::Admonition => "admonition",
            Extension::Container => "container",
            Extension::ColonFence => "colon_fence",
            Extension::DollarMath => "dollarmath",
            Extension::TexMath => "texmath",
            Extension::AmsMath => "amsmath",
            Extension::Footnote => "footnote",
            Extension::Deflist => "deflist",
            Extension::FieldList => "field_list",
            Extension::TaskLists => "tasklists",
            Extension::Attrs => "attrs",
            Extension::Substitution => "substitution",
            Extension::WordCount => "wordcount",
            Extension::Anchors => "anchors",
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Extension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Extension::ALL
            .into_iter()
            .find(|extension| extension.name() == wanted)
            .ok_or_else(|| Error::UnknownExtension(s.to_string()))
    }
}

/// The set of enabled extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions(BTreeSet<Extension>);

impl Default for Extensions {
    /// Everything except `texmath`, which competes with `dollarmath` for `$`.
    fn default() -> Self {
        Self(
            Extension::ALL
                .into_iter()
                .filter(|extension| *extension != Extension::TexMath)
                .collect(),
        )
    }
}

impl Extensions {
    /// Plain `CommonMark`, no extension enabled.
    #[must_use]
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    #[must_use]
    pub fn only(extensions: &[Extension]) -> Self {
        Self(extensions.iter().copied().collect())
    }

    #[must_use]
    pub fn contains(&self, extension: Extension) -> bool {
        self.0.contains(&extension)
    }

    pub fn enable(&mut self, extension: Extension) {
        self.0.insert(extension);
    }

    pub fn disable(&mut self, extension: Extension) {
        self.0.remove(&extension);
    }

    pub fn iter(&self) -> impl Iterator<Item = Extension> + '_ {
        self.0.iter().copied()
    }
}

/// `$`-delimited math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct DollarMathOptions {
    /// Parse `$$...$$ (label)` equation labels.
    pub allow_labels: bool,
    /// Allow whitespace directly inside the inline delimiters.
    pub allow_space: bool,
    /// Allow a digit directly before the opening or after the closing `$`.
    pub allow_digits: bool,
    /// Allow blank lines inside `$$` blocks.
    pub allow_blank_lines: bool,
    /// Parse `$$...$$` inside a paragraph as display math.
    pub double_inline: bool,
}

impl Default for DollarMathOptions {
    fn default() -> Self {
        Self {
            allow_labels: true,
            allow_space: true,
            allow_digits: true,
            allow_blank_lines: true,
            double_inline: false,
        }
    }
}

/// Delimiter family used by the `texmath` extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TexMathDelimiters {
    #[default]
    Dollars,
    Brackets,
    Gitlab,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct TexMathOptions {
    pub delimiters: TexMathDelimiters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct FootnoteOptions {
    /// Parse `^[inline footnotes]`.
    pub inline: bool,
    /// Relocate definitions into a trailing `footnote_block`.
    pub move_to_end: bool,
    /// Treat `[^label]` as a reference even without a definition.
    pub always_match_refs: bool,
}

impl Default for FootnoteOptions {
    fn default() -> Self {
        Self {
            inline: true,
            move_to_end: true,
            always_match_refs: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct AttrsOptions {
    /// `{...}` directly after an inline element.
    pub inline: bool,
    /// `[text]{...}` spans.
    pub spans: bool,
    /// `{...}` on its own line before a block.
    pub block: bool,
    /// Token types an inline attribute block may attach to.
    pub after: Vec<String>,
    /// Attribute names kept on the token; others go to `meta.insecure_attrs`.
    pub allowed: Option<Vec<String>>,
}

impl Default for AttrsOptions {
    fn default() -> Self {
        Self {
            inline: true,
            spans: false,
            block: true,
            after: ["image", "code_inline", "link_close", "span_close"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct SubstitutionOptions {
    /// Doubled to form the opening marker, `{` gives `{{`.
    pub start_delimiter: String,
    pub end_delimiter: String,
}

impl Default for SubstitutionOptions {
    fn default() -> Self {
        Self {
            start_delimiter: "{".to_string(),
            end_delimiter: "}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct TaskListOptions {
    /// Render checkboxes without `disabled`.
    pub enabled: bool,
    /// Wrap the item text in a `<label>`.
    pub label: bool,
    /// Put the label after the checkbox rather than around it.
    pub label_after: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct WordCountOptions {
    pub per_minute: usize,
    /// Keep the raw text of every counted block in `env.wordcount.text`.
    pub store_text: bool,
}

impl Default for WordCountOptions {
    fn default() -> Self {
        Self {
            per_minute: 200,
            store_text: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct AnchorsOptions {
    pub min_level: usize,
    pub max_level: usize,
    pub permalink: bool,
    pub permalink_symbol: String,
    pub permalink_before: bool,
    pub permalink_space: bool,
}

impl Default for AnchorsOptions {
    fn default() -> Self {
        Self {
            min_level: 1,
            max_level: 2,
            permalink: false,
            permalink_symbol: "¶".to_string(),
            permalink_before: false,
            permalink_space: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct ContainerOptions {
    /// One `container_<name>` rule is registered per name.
    pub names: Vec<String>,
    /// Fence string; repeated at least three times to open.
    pub marker: String,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            names: ["note", "tip", "warning", "important", "caution"]
                .into_iter()
                .map(String::from)
                .collect(),
            marker: ":".to_string(),
        }
    }
}

/// Parser configuration.
///
/// Deserializable so the CLI (or any host) can load it from JSON; every field
/// falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Options {
    /// Recognize raw HTML blocks and inline tags.
    pub html: bool,
    /// Nesting depth after which block and inline rules stop recursing.
    pub max_nesting: usize,
    pub extensions: Extensions,
    pub dollarmath: DollarMathOptions,
    pub texmath: TexMathOptions,
    pub footnote: FootnoteOptions,
    pub attrs: AttrsOptions,
    pub substitution: SubstitutionOptions,
    pub tasklists: TaskListOptions,
    pub wordcount: WordCountOptions,
    pub anchors: AnchorsOptions,
    pub containers: ContainerOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            html: true,
            max_nesting: 100,
            extensions: Extensions::default(),
            dollarmath: DollarMathOptions::default(),
            texmath: TexMathOptions::default(),
            footnote: FootnoteOptions::default(),
            attrs: AttrsOptions::default(),
            substitution: SubstitutionOptions::default(),
            tasklists: TaskListOptions::default(),
            wordcount: WordCountOptions::default(),
            anchors: AnchorsOptions::default(),
            containers: ContainerOptions::default(),
        }
    }
}

impl Options {
    /// Create a new `OptionsBuilder` for fluent configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use docmark_parser::{Extension, Options};
    ///
    /// let options = Options::builder()
    ///     .without_extension(Extension::DollarMath)
    ///     .with_extension(Extension::TexMath)
    ///     .with_max_nesting(20)
    ///     .build();
    /// assert!(options.extensions.contains(Extension::TexMath));
    /// ```
    #[must_use]
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Create a new `Options` with default settings.
    ///
    /// Equivalent to `Options::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain `CommonMark` settings: no extension enabled.
    #[must_use]
    pub fn commonmark() -> Self {
        Self {
            extensions: Extensions::none(),
            ..Self::default()
        }
    }
}

/// Builder for [`Options`].
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    #[must_use]
    pub fn with_html(mut self, html: bool) -> Self {
        self.options.html = html;
        self
    }

    #[must_use]
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.options.max_nesting = max_nesting;
        self
    }

    /// Replace the whole extension set.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.options.extensions = extensions;
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.options.extensions.enable(extension);
        self
    }

    #[must_use]
    pub fn without_extension(mut self, extension: Extension) -> Self {
        self.options.extensions.disable(extension);
        self
    }

    #[must_use]
    pub fn with_dollarmath(mut self, dollarmath: DollarMathOptions) -> Self {
        self.options.dollarmath = dollarmath;
        self
    }

    #[must_use]
    pub fn with_texmath_delimiters(mut self, delimiters: TexMathDelimiters) -> Self {
        self.options.texmath.delimiters = delimiters;
        self
    }

    #[must_use]
    pub fn with_footnote(mut self, footnote: FootnoteOptions) -> Self {
        self.options.footnote = footnote;
        self
    }

    #[must_use]
    pub fn with_attrs(mut self, attrs: AttrsOptions) -> Self {
        self.options.attrs = attrs;
        self
    }

    /// Set the substitution delimiters, `("{", "}")` by default.
    #[must_use]
    pub fn with_substitution_delimiters(
        mut self,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        self.options.substitution = SubstitutionOptions {
            start_delimiter: start.into(),
            end_delimiter: end.into(),
        };
        self
    }

    #[must_use]
    pub fn with_tasklists(mut self, tasklists: TaskListOptions) -> Self {
        self.options.tasklists = tasklists;
        self
    }

    #[must_use]
    pub fn with_wordcount(mut self, wordcount: WordCountOptions) -> Self {
        self.options.wordcount = wordcount;
        self
    }

    #[must_use]
    pub fn with_anchors(mut self, anchors: AnchorsOptions) -> Self {
        self.options.anchors = anchors;
        self
    }

    /// Register one `container_<name>` rule per name.
    #[must_use]
    pub fn with_container_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.containers.names = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_container_marker(mut self, marker: impl Into<String>) -> Self {
        self.options.containers.marker = marker.into();
        self
    }

    #[must_use]
    pub fn build(self) -> Options {
        self.options
    }
}
