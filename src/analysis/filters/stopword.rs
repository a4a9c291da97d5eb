use std::collections::HashSet;
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::TokenStream;

pub struct StopWordFilter {
    pub stop_words: HashSet<String>,
}

impl StopWordFilter {
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StopWordFilter {
            stop_words: stop_words.into_iter().map(Into::into).collect(),
        }
    }
}

pub const ITALIAN_STOP_WORDS: &[&str] = &["di", "a", "da", "dei", "il", "la"];

impl TokenFilter for StopWordFilter {
    fn filter<'a>(&'a self, tokens: TokenStream<'a>) -> TokenStream<'a> {
        Box::new(tokens.filter(move |token| !self.stop_words.contains(&token.text)))
    }

    fn name(&self) -> &str {
        "stop_words"
    }
}
