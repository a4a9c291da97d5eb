use rust_stemmers::{Algorithm, Stemmer};
use serde::{Serialize, Deserialize};
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::TokenStream;

/// Languages exposed for the Snowball stemmer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StemLanguage {
    English,
    French,
    German,
    Italian,
    Portuguese,
    Spanish,
}

impl StemLanguage {
    pub fn algorithm(self) -> Algorithm {
        match self {
            StemLanguage::English => Algorithm::English,
            StemLanguage::French => Algorithm::French,
            StemLanguage::German => Algorithm::German,
            StemLanguage::Italian => Algorithm::Italian,
            StemLanguage::Portuguese => Algorithm::Portuguese,
            StemLanguage::Spanish => Algorithm::Spanish,
        }
    }
}

pub struct StemmerFilter {
    pub language: StemLanguage,
}

impl StemmerFilter {
    pub fn new(language: StemLanguage) -> Self {
        StemmerFilter { language }
    }
}

impl TokenFilter for StemmerFilter {
    fn filter<'a>(&'a self, tokens: TokenStream<'a>) -> TokenStream<'a> {
        let stemmer = Stemmer::create(self.language.algorithm());

        Box::new(tokens.map(move |mut token| {
            token.text = stemmer.stem(&token.text).into_owned();
            token
        }))
    }

    fn name(&self) -> &str {
        "stemmer"
    }
}
