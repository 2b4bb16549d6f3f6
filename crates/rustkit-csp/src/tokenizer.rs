//! Policy header grammar.
//!
//! ```text
//! policy          = [ directive *( ";" [ directive ] ) ]
//! directive       = *WSP [ directive-name [ WSP directive-value ] ]
//! directive-name  = 1*( ALPHA / DIGIT / "-" )
//! directive-value = *( WSP / <VCHAR except ";"> )
//! ```
//!
//! The tokenizer is pure: it classifies each `;`-separated span and leaves
//! reporting to the directive list.

/// Outcome of scanning one `;`-delimited span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveToken<'a> {
    /// Nothing but whitespace, e.g. the middle of `;;`.
    Empty,
    /// A well-formed directive. `value` may be empty.
    Directive { name: &'a str, value: &'a str },
    /// The name was empty or not followed by whitespace; carries the
    /// offending text up to the next whitespace.
    Unsupported(&'a str),
    /// The value contains a character outside the value grammar; carries
    /// the raw value text.
    InvalidValue { name: &'a str, value: &'a str },
}

/// Iterator over the directive spans of a policy header.
#[derive(Debug, Clone)]
pub struct DirectiveTokenizer<'a> {
    rest: Option<&'a str>,
}

impl<'a> DirectiveTokenizer<'a> {
    pub fn new(header: &'a str) -> Self {
        Self { rest: Some(header) }
    }
}

impl<'a> Iterator for DirectiveTokenizer<'a> {
    type Item = DirectiveToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest.filter(|rest| !rest.is_empty())?;
        let span = match rest.find(';') {
            Some(index) => {
                self.rest = Some(&rest[index + 1..]);
                &rest[..index]
            }
            None => {
                self.rest = None;
                rest
            }
        };
        Some(parse_directive(span))
    }
}

/// Classify a single directive span (no `;` inside).
pub fn parse_directive(span: &str) -> DirectiveToken<'_> {
    let mut position = skip_while(span, 0, is_ascii_space);
    if position == span.len() {
        return DirectiveToken::Empty;
    }

    let name_begin = position;
    position = skip_while(span, position, is_directive_name_character);
    if position == name_begin {
        position = skip_while(span, position, |c| !is_ascii_space(c));
        return DirectiveToken::Unsupported(&span[name_begin..position]);
    }

    let name = &span[name_begin..position];
    if position == span.len() {
        return DirectiveToken::Directive { name, value: "" };
    }

    match span[position..].chars().next() {
        Some(c) if is_ascii_space(c) => position += c.len_utf8(),
        _ => {
            position = skip_while(span, position, |c| !is_ascii_space(c));
            return DirectiveToken::Unsupported(&span[name_begin..position]);
        }
    }

    position = skip_while(span, position, is_ascii_space);
    let value_begin = position;
    position = skip_while(span, position, is_directive_value_character);
    if position != span.len() {
        return DirectiveToken::InvalidValue {
            name,
            value: &span[value_begin..],
        };
    }

    DirectiveToken::Directive {
        name,
        value: &span[value_begin..],
    }
}

/// HTML "ASCII whitespace" plus vertical tab.
pub fn is_ascii_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{0b}' | '\u{0c}' | '\r')
}

pub fn is_directive_name_character(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

pub fn is_directive_value_character(c: char) -> bool {
    is_ascii_space(c) || ('\u{21}'..='\u{7e}').contains(&c)
}

/// Byte offset of the first char at or after `from` that fails `predicate`.
pub(crate) fn skip_while(s: &str, from: usize, predicate: impl Fn(char) -> bool) -> usize {
    s[from..]
        .char_indices()
        .find(|&(_, c)| !predicate(c))
        .map_or(s.len(), |(offset, _)| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(header: &str) -> Vec<DirectiveToken<'_>> {
        DirectiveTokenizer::new(header).collect()
    }

    #[test]
    fn test_empty_header() {
        assert!(tokens("").is_empty());
    }

    #[test]
    fn test_splits_on_semicolons() {
        assert_eq!(
            tokens("default-src 'none'; img-src https://example.com"),
            vec![
                DirectiveToken::Directive { name: "default-src", value: "'none'" },
                DirectiveToken::Directive { name: "img-src", value: "https://example.com" },
            ]
        );
    }

    #[test]
    fn test_empty_directives() {
        assert_eq!(
            tokens(";;  ;"),
            vec![DirectiveToken::Empty, DirectiveToken::Empty, DirectiveToken::Empty]
        );
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(
            parse_directive("  sandbox"),
            DirectiveToken::Directive { name: "sandbox", value: "" }
        );
        assert_eq!(
            parse_directive("sandbox   "),
            DirectiveToken::Directive { name: "sandbox", value: "" }
        );
    }

    #[test]
    fn test_garbage_name() {
        assert_eq!(parse_directive(" !!!bad!!! "), DirectiveToken::Unsupported("!!!bad!!!"));
    }

    #[test]
    fn test_missing_separator() {
        assert_eq!(
            parse_directive("script-src'self' foo"),
            DirectiveToken::Unsupported("script-src'self'")
        );
    }

    #[test]
    fn test_invalid_value_character() {
        assert_eq!(
            parse_directive("script-src 'self' \u{e9}vil"),
            DirectiveToken::InvalidValue { name: "script-src", value: "'self' \u{e9}vil" }
        );
    }

    #[test]
    fn test_value_keeps_trailing_whitespace() {
        assert_eq!(
            parse_directive("reflected-xss block "),
            DirectiveToken::Directive { name: "reflected-xss", value: "block " }
        );
    }
}
