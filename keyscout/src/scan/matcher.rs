use std::collections::HashSet;

use crate::keywords::KeywordSet;

/// Whether `c` separates tokens.
///
/// Unicode whitespace plus the ASCII information separators U+001C..U+001F,
/// which standard text tokenization also splits on.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Splits `content` into maximal runs of non-whitespace characters
pub fn tokenize(content: &str) -> impl Iterator<Item = &str> {
    content.split(is_separator).filter(|t| !t.is_empty())
}

/// Finds which keywords occur as whole tokens in a text
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: KeywordSet,
}

impl KeywordMatcher {
    pub fn new(keywords: &KeywordSet) -> Self {
        Self {
            keywords: keywords.clone(),
        }
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Returns the keywords that equal at least one token of `content`
    pub fn find_keywords<'a>(&'a self, content: &str) -> HashSet<&'a str> {
        let mut found = HashSet::new();
        if self.keywords.is_empty() {
            return found;
        }

        for token in tokenize(content) {
            if let Some(keyword) = self.keywords.get(token) {
                found.insert(keyword);
                if found.len() == self.keywords.len() {
                    break;
                }
            }
        }
        found
    }
}

/// Returns the subset of `keywords` that appear as complete tokens in `content`
pub fn match_keywords(content: &str, keywords: &KeywordSet) -> HashSet<String> {
    KeywordMatcher::new(keywords)
        .find_keywords(content)
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_whole_token_matching() {
        let keywords = KeywordSet::parse("foo,bar,qux");
        assert_eq!(match_keywords("foo bar", &keywords), set(&["foo", "bar"]));
    }

    #[test]
    fn test_substring_does_not_match() {
        let keywords = KeywordSet::parse("foo");
        assert!(match_keywords("foobar barfoo", &keywords).is_empty());
    }

    #[test]
    fn test_punctuation_is_not_stripped() {
        let keywords = KeywordSet::parse("foo,foo.");
        assert_eq!(match_keywords("say foo. now", &keywords), set(&["foo."]));
    }

    #[test]
    fn test_whitespace_runs_and_kinds() {
        let keywords = KeywordSet::parse("a,b,c,d,e");
        let content = "  a\t\tb\r\nc\u{00a0}d\u{1f}e\n";
        assert_eq!(match_keywords(content, &keywords), set(&["a", "b", "c", "d", "e"]));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(match_keywords("", &KeywordSet::parse("foo")).is_empty());
        assert!(match_keywords("foo bar", &KeywordSet::new()).is_empty());
    }

    #[test]
    fn test_keyword_with_internal_whitespace_never_matches() {
        let keywords = KeywordSet::parse("foo bar");
        assert!(match_keywords("foo bar", &keywords).is_empty());
    }

    #[test]
    fn test_case_sensitive() {
        let keywords = KeywordSet::parse("Foo");
        assert!(match_keywords("foo FOO", &keywords).is_empty());
        assert_eq!(match_keywords("Foo", &keywords), set(&["Foo"]));
    }

    #[test]
    fn test_tokenize() {
        let tokens: Vec<_> = tokenize(" one  two\nthree ").collect();
        assert_eq!(tokens, vec!["one", "two", "three"]);
        assert_eq!(tokenize(" \n\t ").count(), 0);
    }

    #[test]
    fn test_deterministic() {
        let keywords = KeywordSet::parse("x,y,z");
        let content = "z y x y z";
        let first = match_keywords(content, &keywords);
        for _ in 0..10 {
            assert_eq!(match_keywords(content, &keywords), first);
        }
    }
}
