//! Minimal RFC 4180 field quoting and record splitting.

use std::borrow::Cow;
use std::fmt;

/// Quote `field` if it contains a delimiter, quote, CR or LF.
pub(crate) fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Why a line could not be split into fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SplitError {
    /// A quoted field is still open at the end of the input. The record may
    /// continue on the next physical line.
    Unterminated,
    /// Something other than a delimiter follows a closing quote.
    TrailingAfterQuote {
        /// Byte offset of the offending character.
        at: usize,
    },
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unterminated => write!(f, "unterminated quoted field"),
            Self::TrailingAfterQuote { at } => {
                write!(f, "unexpected character after closing quote at byte {at}")
            }
        }
    }
}

/// Split one record into fields.
///
/// Quotes inside unquoted fields are kept literally.
pub(crate) fn split_record(record: &str) -> Result<Vec<String>, SplitError> {
    let mut fields = Vec::new();
    let mut chars = record.char_indices().peekable();

    loop {
        let mut field = String::new();
        if let Some(&(_, '"')) = chars.peek() {
            chars.next();
            loop {
                match chars.next() {
                    None => return Err(SplitError::Unterminated),
                    Some((_, '"')) => {
                        if let Some(&(_, '"')) = chars.peek() {
                            chars.next();
                            field.push('"');
                        } else {
                            break;
                        }
                    }
                    Some((_, c)) => field.push(c),
                }
            }
            match chars.next() {
                None => {
                    fields.push(field);
                    return Ok(fields);
                }
                Some((_, ',')) => fields.push(field),
                Some((at, _)) => return Err(SplitError::TrailingAfterQuote { at }),
            }
        } else {
            loop {
                match chars.next() {
                    None => {
                        fields.push(field);
                        return Ok(fields);
                    }
                    Some((_, ',')) => break,
                    Some((_, c)) => field.push(c),
                }
            }
            fields.push(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_plain_and_special() {
        assert_eq!(escape_field("v12"), "v12");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn split_plain() {
        assert_eq!(split_record("a,1,2,3").unwrap(), ["a", "1", "2", "3"]);
        assert_eq!(split_record("").unwrap(), [""]);
        assert_eq!(split_record("a,,b,").unwrap(), ["a", "", "b", ""]);
    }

    #[test]
    fn split_quoted() {
        assert_eq!(
            split_record("\"a,b\",\"x\"\"y\",3").unwrap(),
            ["a,b", "x\"y", "3"]
        );
        assert_eq!(split_record("\"\",1").unwrap(), ["", "1"]);
    }

    #[test]
    fn split_errors() {
        assert_eq!(split_record("\"open,1"), Err(SplitError::Unterminated));
        assert_eq!(
            split_record("\"a\"b,1"),
            Err(SplitError::TrailingAfterQuote { at: 3 })
        );
    }

    #[test]
    fn escape_then_split_restores_fields() {
        let fields = ["plain", "com,ma", "qu\"ote", "new\nline"];
        let line: Vec<String> = fields.iter().map(|f| escape_field(f).into_owned()).collect();
        assert_eq!(split_record(&line.join(",")).unwrap(), fields);
    }
}
