use crate::analysis::filter::TokenFilter;
use crate::analysis::token::{Token, TokenStream};

/// For name-like fields: `report.txt` also yields `report` at the same position.
///
/// Only a trailing, short, alphanumeric extension is stripped; dot-files such
/// as `.profile` are left alone.
pub struct ExtensionFilter {
    pub max_extension_len: usize,
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        ExtensionFilter {
            max_extension_len: 8,
        }
    }
}

impl ExtensionFilter {
    fn stem<'t>(&self, text: &'t str) -> Option<&'t str> {
        let dot = text.rfind('.')?;
        let (stem, ext) = (&text[..dot], &text[dot + 1..]);
        let valid_ext = !ext.is_empty()
            && ext.chars().count() <= self.max_extension_len
            && ext.chars().all(char::is_alphanumeric);
        (valid_ext && !stem.is_empty()).then_some(stem)
    }
}

impl TokenFilter for ExtensionFilter {
    fn filter<'a>(&'a self, tokens: TokenStream<'a>) -> TokenStream<'a> {
        Box::new(tokens.flat_map(move |token| {
            let stripped = self.stem(&token.text).map(|stem| Token {
                text: stem.to_string(),
                position: token.position,
                offset: token.offset,
                length: token.length,
            });
            std::iter::once(token).chain(stripped)
        }))
    }

    fn name(&self) -> &str {
        "extension"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(filter: &ExtensionFilter, words: &[&str]) -> Vec<(String, u32)> {
        let tokens: Vec<Token> = words
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(w.to_string(), i as u32, 0))
            .collect();
        filter
            .filter(Box::new(tokens.into_iter()))
            .map(|t| (t.text, t.position))
            .collect()
    }

    #[test]
    fn test_strips_extension_at_same_position() {
        let filter = ExtensionFilter::default();
        assert_eq!(run(&filter, &["notes.txt"]), vec![
            ("notes.txt".to_string(), 0),
            ("notes".to_string(), 0),
        ]);
    }

    #[test]
    fn test_leaves_dotfiles_and_plain_words() {
        let filter = ExtensionFilter::default();
        assert_eq!(run(&filter, &[".profile", "readme"]), vec![
            (".profile".to_string(), 0),
            ("readme".to_string(), 1),
        ]);
    }

    #[test]
    fn test_only_last_extension_is_stripped() {
        let filter = ExtensionFilter::default();
        let out = run(&filter, &["backup.tar.gz"]);
        assert_eq!(out[1].0, "backup.tar");
    }
}
