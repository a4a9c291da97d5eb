use crate::analysis::token::TokenStream;

/// Stream-to-stream token transformation.
///
/// Filters may drop or add tokens, but never renumber positions.
pub trait TokenFilter: Send + Sync {
    fn filter<'a>(&'a self, tokens: TokenStream<'a>) -> TokenStream<'a>;

    fn name(&self) -> &str;
}
