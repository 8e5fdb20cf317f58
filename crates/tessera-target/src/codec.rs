//! Quoting and escaping for target strings.
//!
//! Target strings use a single quote character (`'`) to protect separators
//! and a single escape character (`\`) to protect the next character.
//! [`interpret`] decodes a token, [`uninterpret`] is its inverse:
//!
//! ```text
//! blah                -> blah         nothing happens
//! 'blah'              -> blah         enclosing quotes removed
//! 'bl'ah              -> 'bl'ah       non-enclosing quotes remain
//! '\'blah\''          -> 'blah'       enclosing quotes removed, escapes interpreted
//! ```

/// The quote character.
pub const QUOTE: char = '\'';
/// The escape character.
pub const ESCAPE: char = '\\';

/// Whether the whole string is enclosed in one pair of unescaped quotes.
///
/// An unescaped quote in the interior means the outer quotes are not a pair,
/// and a trailing escape means the closing quote itself is escaped.
pub fn is_quoted(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 2 || chars[0] != QUOTE || chars[chars.len() - 1] != QUOTE {
        return false;
    }
    let mut escaping = false;
    for &c in &chars[1..chars.len() - 1] {
        if escaping {
            escaping = false;
        } else if c == ESCAPE {
            escaping = true;
        } else if c == QUOTE {
            return false;
        }
    }
    !escaping
}

/// Wrap `s` in quotes. The interior is not escaped.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(QUOTE);
    out.push_str(s);
    out.push(QUOTE);
    out
}

/// Join pieces with `separator`.
///
/// # Panics
///
/// Panics if `separator` is the quote or escape character.
pub fn join<S: AsRef<str>>(pieces: &[S], separator: char) -> String {
    assert!(
        separator != QUOTE && separator != ESCAPE,
        "string join separator cannot be {QUOTE} or {ESCAPE}"
    );
    let mut out = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(piece.as_ref());
    }
    out
}

/// Decode quotes and escapes.
///
/// A fully quoted string loses its outer quotes first and is then treated as
/// unquoted. Outside a quoted span an escape sequence decodes to the escaped
/// character; inside one the whole sequence is kept. Quotes that are not
/// escaped toggle the quoted span and are kept.
pub fn interpret(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = s.chars().collect();
    let body = if is_quoted(s) {
        &chars[1..chars.len() - 1]
    } else {
        &chars[..]
    };

    let mut out = String::with_capacity(s.len());
    let mut inside_quote = false;
    let mut escaping = false;
    for &c in body {
        if escaping {
            escaping = false;
        } else if c == ESCAPE {
            escaping = true;
            if !inside_quote {
                continue;
            }
        } else if c == QUOTE {
            inside_quote = !inside_quote;
        }
        out.push(c);
    }
    out
}

/// Escape every quote and escape character so that
/// `interpret(&uninterpret(s)) == s`.
pub fn uninterpret(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == ESCAPE || c == QUOTE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_detection() {
        assert!(is_quoted("'abc'"));
        assert!(is_quoted("''"));
        assert!(!is_quoted("'ab'c"));
        assert!(!is_quoted("'a'b'"));
        assert!(is_quoted(r"'a\'b'"));
        assert!(!is_quoted("'"));
        assert!(!is_quoted("abc"));
    }

    #[test]
    fn escaped_closing_quote_is_not_a_pair() {
        assert!(!is_quoted(r"'abc\'"));
    }

    #[test]
    fn interpret_examples() {
        assert_eq!(interpret("blah"), "blah");
        assert_eq!(interpret("'blah'"), "blah");
        assert_eq!(interpret("'bl'ah"), "'bl'ah");
        assert_eq!(interpret(r"'\'blah\''"), "'blah'");
        assert_eq!(interpret(r"'\'\\\'blah\\\'\''"), r"'\'blah\''");
        assert_eq!(interpret(""), "");
    }

    #[test]
    fn interpret_twice_peels_layers() {
        let once = interpret(r"'\'\\\'blah\\\'\''");
        assert_eq!(interpret(&once), "'blah'");
    }

    #[test]
    fn escapes_inside_quotes_are_kept() {
        assert_eq!(interpret(r"a'b\'c'd"), r"a'b\'c'd");
        assert_eq!(interpret(r"a\ b"), "a b");
    }

    #[test]
    fn uninterpret_escapes_specials() {
        assert_eq!(uninterpret("it's"), r"it\'s");
        assert_eq!(uninterpret(r"a\b"), r"a\\b");
        assert_eq!(uninterpret("plain"), "plain");
    }

    #[test]
    fn quote_wraps_verbatim() {
        assert_eq!(quote("a b"), "'a b'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn join_with_separator() {
        assert_eq!(join(&["a", "b", "c"], ','), "a,b,c");
        assert_eq!(join::<&str>(&[], ','), "");
    }

    #[test]
    #[should_panic(expected = "separator")]
    fn join_rejects_quote_separator() {
        join(&["a"], QUOTE);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::super::*;

        proptest! {
            #[test]
            fn uninterpret_round_trips(s in "[ -~]{0,32}") {
                prop_assert_eq!(interpret(&uninterpret(&s)), s);
            }

            #[test]
            fn plain_strings_are_fixed_points(s in "[a-zA-Z0-9 ,=_.-]{0,32}") {
                prop_assert_eq!(interpret(&s), s.clone());
                prop_assert_eq!(uninterpret(&s), s);
            }
        }
    }
}
