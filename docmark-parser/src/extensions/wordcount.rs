//! Reading statistics. Counts whitespace-separated words in text tokens and
//! accumulates them in [`crate::Env::wordcount`], so several parses sharing
//! an `Env` add up.
use crate::{
    CoreState, Error, Extension, MarkdownParser, WordCount, WordCountOptions, extensions::core_rule,
};

/// # Errors
///
/// Returns [`Error::InvalidOption`] when `per_minute` is zero.
pub fn register(md: &mut MarkdownParser) -> Result<(), Error> {
    let options = md.options.wordcount.clone();
    if options.per_minute == 0 {
        return Err(Error::invalid_option(
            Extension::WordCount,
            "per_minute must be greater than zero",
        ));
    }
    md.core
        .ruler
        .push("wordcount", core_rule(move |state| wordcount(state, &options)), &[]);
    Ok(())
}

pub fn wordcount(state: &mut CoreState<'_>, options: &WordCountOptions) {
    let mut words = 0;
    let mut text = Vec::new();
    let texts = state.tokens.iter().flat_map(|token| {
        let own = token.is("text").then_some(token);
        let children = token
            .is("inline")
            .then_some(token.children.as_deref())
            .flatten()
            .unwrap_or_default()
            .iter()
            .filter(|child| child.is("text"));
        own.into_iter().chain(children)
    });
    for token in texts {
        words += token.content.split_whitespace().count();
        if options.store_text {
            text.push(token.content.clone());
        }
    }

    let stats = state.env.wordcount.get_or_insert_with(WordCount::default);
    stats.words += words;
    stats.text.extend(text);
    // Rounded to the nearest minute, halves up.
    stats.minutes = (stats.words + options.per_minute / 2) / options.per_minute;
    tracing::trace!(words = stats.words, minutes = stats.minutes, "word count updated");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{Env, Extensions, Options};

    fn parser(options: WordCountOptions) -> Result<MarkdownParser, Error> {
        let options = Options::builder()
            .with_extensions(Extensions::only(&[Extension::WordCount]))
            .with_wordcount(options)
            .build();
        MarkdownParser::new(options)
    }

    #[test]
    fn test_counts_words_in_text() -> Result<(), Error> {
        let md = parser(WordCountOptions::default())?;
        let mut env = Env::default();
        md.parse("# One two\n\nthree *four* five\n\n    code is skipped\n", &mut env);
        assert_eq!(
            env.wordcount,
            Some(WordCount {
                words: 5,
                minutes: 0,
                text: Vec::new(),
            })
        );
        Ok(())
    }

    #[test]
    fn test_accumulates_across_parses_and_stores_text() -> Result<(), Error> {
        let md = parser(WordCountOptions {
            per_minute: 2,
            store_text: true,
        })?;
        let mut env = Env::default();
        md.parse("a b c\n", &mut env);
        md.parse("d\n", &mut env);
        let stats = env.wordcount.unwrap_or_default();
        assert_eq!(stats.words, 4);
        assert_eq!(stats.minutes, 2);
        assert_eq!(stats.text, vec!["a b c".to_string(), "d".to_string()]);
        Ok(())
    }

    #[rstest]
    #[case(199, 1)]
    #[case(99, 0)]
    #[case(100, 1)]
    #[case(300, 2)]
    fn test_minutes_round_half_up(#[case] words: usize, #[case] minutes: usize) -> Result<(), Error> {
        let md = parser(WordCountOptions::default())?;
        let mut env = Env::default();
        md.parse(&"w ".repeat(words), &mut env);
        assert_eq!(env.wordcount.map(|stats| stats.minutes), Some(minutes));
        Ok(())
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let error = parser(WordCountOptions {
            per_minute: 0,
            store_text: false,
        })
        .err();
        assert!(matches!(
            error,
            Some(Error::InvalidOption(Extension::WordCount, _))
        ));
    }
}
