use crate::analysis::filter::TokenFilter;
use crate::analysis::token::TokenStream;

pub struct LowercaseFilter;

impl TokenFilter for LowercaseFilter {
    fn filter<'a>(&'a self, tokens: TokenStream<'a>) -> TokenStream<'a> {
        Box::new(tokens.map(|mut token| {
            token.text = token.text.to_lowercase();
            token
        }))
    }

    fn name(&self) -> &str {
        "lowercase"
    }
}
