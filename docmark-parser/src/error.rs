use crate::options::Extension;

/// Errors raised while configuring a parser.
///
/// Tokenizing itself never fails: malformed input degrades to paragraphs and
/// plain text.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("rule not found: {0}")]
    RuleNotFound(String),

    #[error("invalid {0} option: {1}")]
    InvalidOption(Extension, String),

    #[error("unknown extension: {0}")]
    UnknownExtension(String),
}

impl Error {
    #[must_use]
    pub(crate) fn invalid_option(extension: Extension, message: impl Into<String>) -> Self {
        Self::InvalidOption(extension, message.into())
    }

    /// Get advice for this error if available.
    /// Returns helpful information for resolving the error.
    #[must_use]
    pub fn advice(&self) -> Option<&'static str> {
        match self {
            Self::RuleNotFound(..) => Some(
                "Rules can only be inserted relative to a rule already registered in the same chain (e.g. 'fence', 'paragraph', 'escape')",
            ),
            Self::InvalidOption(Extension::Substitution, _) => {
                Some(
                    "Substitution delimiters must be non-empty and distinct; the start delimiter must begin with ASCII punctuation such as '{' or '<'",
                )
            }
            Self::InvalidOption(Extension::Container, _) => Some(
                "Container names must be non-empty and contain no whitespace; the marker must be a non-empty string",
            ),
            Self::InvalidOption(..) => None,
            Self::UnknownExtension(..) => Some(
                "Known extensions: front_matter, admonition, container, colon_fence, dollarmath, texmath, amsmath, footnote, deflist, field_list, tasklists, attrs, substitution, wordcount, anchors",
            ),
        }
    }
}

/// Errors raised by the attribute block scanner (`{#id .class key=value}`).
///
/// These never escape the tokenizer: a failed scan means the text is not an
/// attribute block and is left as literal text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AttrParseError {
    #[error("attribute block must start with '{{', position {0}")]
    MissingOpeningBrace(usize),

    #[error("unexpected character {1:?} while scanning {2}, position {0}")]
    UnexpectedCharacter(usize, char, &'static str),

    #[error("attribute block is not closed, position {0}")]
    Unclosed(usize),
}

impl AttrParseError {
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Self::MissingOpeningBrace(position)
            | Self::UnexpectedCharacter(position, ..)
            | Self::Unclosed(position) => *position,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_rule_not_found_display_and_advice() {
        let error = Error::RuleNotFound("tables".to_string());
        assert_eq!(format!("{error}"), "rule not found: tables");
        assert!(error.advice().is_some());
    }

    #[test]
    fn test_invalid_option_display() {
        let error = Error::invalid_option(Extension::Substitution, "empty start delimiter");
        assert_eq!(
            format!("{error}"),
            "invalid substitution option: empty start delimiter"
        );
    }

    #[test]
    fn test_attr_parse_error_position() {
        let error = AttrParseError::UnexpectedCharacter(4, '!', "identifier");
        assert_eq!(error.position(), 4);
        assert_eq!(
            format!("{error}"),
            "unexpected character '!' while scanning identifier, position 4"
        );
    }
}
