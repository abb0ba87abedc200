/// `CharFilter` - Iterator that skips over string literals
///
/// Wraps a char iterator and tracks whether the cursor sits inside a quoted
/// string. Only characters outside strings are yielded, so callers can search
/// for closing delimiters without being fooled by `"%}"` or `'>'` inside a
/// literal value.
use std::iter::Peekable;
use std::str::CharIndices;

/// When a quote character starts a string literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteRule {
    /// Any quote opens a string (template tag contents)
    #[default]
    Anywhere,
    /// Only a quote right after `=` opens a string (HTML attribute values)
    AfterEquals,
}

/// Iterator adapter that filters out string literal contents
///
/// Yields `(position, character)` pairs, positions relative to the full text.
/// Quote characters themselves are not yielded.
pub struct CharFilter<'a> {
    chars: Peekable<CharIndices<'a>>,
    base: usize,
    quotes: &'a [char],
    rule: QuoteRule,
    instring: Option<char>,
    after_equals: bool,
}

impl<'a> CharFilter<'a> {
    /// Create a filter over `text[start..]`
    ///
    /// # Arguments
    /// * `text` - The full source text
    /// * `start` - Byte offset to start at (must be a char boundary)
    /// * `quotes` - Characters that open and close string literals
    /// * `rule` - When a quote is allowed to open a string
    #[must_use]
    pub fn new(text: &'a str, start: usize, quotes: &'a [char], rule: QuoteRule) -> Self {
        Self {
            chars: text[start..].char_indices().peekable(),
            base: start,
            quotes,
            rule,
            instring: None,
            after_equals: false,
        }
    }

    /// Check if we're currently inside a string
    #[must_use]
    pub fn instring(&self) -> bool {
        self.instring.is_some()
    }

    /// Discard characters until the absolute position `pos`
    pub fn skip_to(&mut self, pos: usize) {
        while let Some(&(offset, _)) = self.chars.peek() {
            if self.base + offset >= pos {
                break;
            }
            self.chars.next();
        }
    }

    fn opens_string(&self, c: char) -> bool {
        self.quotes.contains(&c)
            && match self.rule {
                QuoteRule::Anywhere => true,
                QuoteRule::AfterEquals => self.after_equals,
            }
    }
}

impl Iterator for CharFilter<'_> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (offset, c) = self.chars.next()?;

            if let Some(quote) = self.instring {
                if c == quote {
                    self.instring = None;
                }
                continue;
            }

            if self.opens_string(c) {
                self.instring = Some(c);
                self.after_equals = false;
                continue;
            }

            if c == '=' {
                self.after_equals = true;
            } else if !c.is_whitespace() {
                self.after_equals = false;
            }

            return Some((self.base + offset, c));
        }
    }
}

/// Find the first `close` delimiter at or after `start` that is outside string literals
///
/// Falls back to the first raw occurrence when a string literal never closes.
#[must_use]
pub fn find_close(text: &str, start: usize, close: &str, quotes: &[char]) -> Option<usize> {
    let mut filter = CharFilter::new(text, start, quotes, QuoteRule::Anywhere);
    while let Some((pos, _)) = filter.next() {
        if text[pos..].starts_with(close) {
            return Some(pos);
        }
    }
    if filter.instring() {
        return text[start..].find(close).map(|offset| start + offset);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTES: &[char] = &['"', '\''];

    #[test]
    fn test_no_strings() {
        let input = "x = 5";
        let filter = CharFilter::new(input, 0, QUOTES, QuoteRule::Anywhere);
        let positions: Vec<usize> = filter.map(|(pos, _)| pos).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_filter_strings() {
        let input = r#"include "a%}b" only"#;
        let filter = CharFilter::new(input, 0, QUOTES, QuoteRule::Anywhere);
        let result: String = filter.map(|(_, c)| c).collect();
        assert_eq!(result, "include  only");
    }

    #[test]
    fn test_start_offset() {
        let input = "ab'c'd";
        let filter = CharFilter::new(input, 1, QUOTES, QuoteRule::Anywhere);
        let result: Vec<(usize, char)> = filter.collect();
        assert_eq!(result, vec![(1, 'b'), (5, 'd')]);
    }

    #[test]
    fn test_after_equals_rule() {
        let input = r#"a title="x>y" it's>"#;
        let filter = CharFilter::new(input, 0, QUOTES, QuoteRule::AfterEquals);
        let result: String = filter.map(|(_, c)| c).collect();
        assert_eq!(result, "a title= it's>");
    }

    #[test]
    fn test_after_equals_allows_whitespace() {
        let input = r#"a= "x>" >"#;
        let filter = CharFilter::new(input, 0, QUOTES, QuoteRule::AfterEquals);
        let result: String = filter.map(|(_, c)| c).collect();
        assert_eq!(result, "a=  >");
    }

    #[test]
    fn test_instring_check() {
        let input = r#"x "hello"#;
        let mut filter = CharFilter::new(input, 0, QUOTES, QuoteRule::Anywhere);
        while filter.next().is_some() {}
        assert!(filter.instring());
    }

    #[test]
    fn test_find_close() {
        let text = r#"{% url "a%}" %}"#;
        assert_eq!(find_close(text, 2, "%}", QUOTES), Some(13));
        assert_eq!(find_close("{% x ", 2, "%}", QUOTES), None);
    }

    #[test]
    fn test_find_close_unclosed_quote_falls_back() {
        let text = r#"{{ don't }}"#;
        assert_eq!(find_close(text, 2, "}}", QUOTES), Some(9));
    }

    #[test]
    fn test_skip_to() {
        let text = "abcdef";
        let mut filter = CharFilter::new(text, 0, QUOTES, QuoteRule::Anywhere);
        filter.skip_to(4);
        assert_eq!(filter.next(), Some((4, 'e')));
    }
}
