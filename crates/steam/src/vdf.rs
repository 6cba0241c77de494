//! Text VDF parser.
//!
//! Steam's configuration documents (libraryfolders.vdf, appmanifest
//! `.acf` files, loginusers.vdf) use a nested key-value text format:
//! quoted or bare string keys mapping to either a string or a braced
//! block. The parser produces a generic [`Value`] tree with no schema;
//! callers pick expected sub-keys defensively and substitute defaults.
//! Duplicate keys are last-write-wins, matching the format's de facto
//! semantics.

use std::collections::HashMap;

/// Errors from VDF parsing.
#[derive(Debug, thiserror::Error)]
pub enum VdfError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("line {line}: unexpected '{found}'")]
    Unexpected { line: usize, found: String },

    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },
}

/// A node in a parsed VDF document: a scalar string or a nested map.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Obj(HashMap<String, Value>),
}

impl Value {
    /// Returns the scalar string, if this node is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Obj(_) => None,
        }
    }

    /// Returns the nested map, if this node is one.
    pub fn as_obj(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Str(_) => None,
            Value::Obj(map) => Some(map),
        }
    }

    /// Looks up a child by exact key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_obj().and_then(|map| map.get(key))
    }

    /// Looks up a child scalar by exact key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Looks up a child by key, ignoring ASCII case. Manifest files mix
    /// key casing across Steam versions ("StateFlags" vs "stateflags").
    pub fn get_ignore_case(&self, key: &str) -> Option<&Value> {
        self.as_obj()
            .and_then(|map| map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)))
            .map(|(_, v)| v)
    }

    /// Case-insensitive scalar lookup.
    pub fn get_str_ignore_case(&self, key: &str) -> Option<&str> {
        self.get_ignore_case(key).and_then(Value::as_str)
    }
}

/// Parses a VDF document into its root object.
pub fn parse(text: &str) -> Result<Value, VdfError> {
    let mut tokens = Tokenizer::new(text);
    let map = parse_pairs(&mut tokens, true)?;
    Ok(Value::Obj(map))
}

/// Parses key-value pairs until end of input (`top_level`) or a closing
/// brace.
fn parse_pairs(tokens: &mut Tokenizer<'_>, top_level: bool) -> Result<HashMap<String, Value>, VdfError> {
    let mut map = HashMap::new();

    loop {
        match tokens.next()? {
            None => {
                if top_level {
                    return Ok(map);
                }
                return Err(VdfError::UnexpectedEof);
            }
            Some(Token::Close) => {
                if top_level {
                    return Err(VdfError::Unexpected {
                        line: tokens.line,
                        found: "}".into(),
                    });
                }
                return Ok(map);
            }
            Some(Token::Open) => {
                return Err(VdfError::Unexpected {
                    line: tokens.line,
                    found: "{".into(),
                });
            }
            Some(Token::Str(key)) => {
                let value = match tokens.next()? {
                    Some(Token::Str(s)) => Value::Str(s),
                    Some(Token::Open) => Value::Obj(parse_pairs(tokens, false)?),
                    Some(Token::Close) => {
                        return Err(VdfError::Unexpected {
                            line: tokens.line,
                            found: "}".into(),
                        });
                    }
                    None => return Err(VdfError::UnexpectedEof),
                };
                // Last write wins on duplicate keys.
                map.insert(key, value);
            }
        }
    }
}

enum Token {
    Str(String),
    Open,
    Close,
}

struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn next(&mut self) -> Result<Option<Token>, VdfError> {
        loop {
            let Some(&c) = self.chars.peek() else {
                return Ok(None);
            };

            match c {
                '\n' => {
                    self.line += 1;
                    self.chars.next();
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '/' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'/') {
                        // Comment runs to end of line.
                        while let Some(&c) = self.chars.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.chars.next();
                        }
                    } else {
                        return Err(VdfError::Unexpected {
                            line: self.line,
                            found: "/".into(),
                        });
                    }
                }
                '{' => {
                    self.chars.next();
                    return Ok(Some(Token::Open));
                }
                '}' => {
                    self.chars.next();
                    return Ok(Some(Token::Close));
                }
                '"' => {
                    self.chars.next();
                    return Ok(Some(Token::Str(self.quoted_string()?)));
                }
                _ => return Ok(Some(Token::Str(self.bare_string()))),
            }
        }
    }

    fn quoted_string(&mut self) -> Result<String, VdfError> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err(VdfError::UnterminatedString { line: self.line }),
                Some('"') => return Ok(out),
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some(other) => {
                        // Unknown escape: keep both characters.
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(VdfError::UnterminatedString { line: self.line }),
                },
                Some('\n') => {
                    self.line += 1;
                    out.push('\n');
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn bare_string(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == '{' || c == '}' || c == '"' {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scalar_pairs() {
        let doc = parse(r#""name" "Half-Life" "appid" "70""#).unwrap();
        assert_eq!(doc.get_str("name"), Some("Half-Life"));
        assert_eq!(doc.get_str("appid"), Some("70"));
    }

    #[test]
    fn parse_nested_blocks() {
        let doc = parse(
            r#"
            "AppState"
            {
                "appid"     "440"
                "name"      "Team Fortress 2"
                "UserConfig"
                {
                    "language"  "english"
                }
            }
            "#,
        )
        .unwrap();

        let app = doc.get("AppState").unwrap();
        assert_eq!(app.get_str("appid"), Some("440"));
        assert_eq!(
            app.get("UserConfig").unwrap().get_str("language"),
            Some("english")
        );
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        let doc = parse(r#""k" "first" "k" "second""#).unwrap();
        assert_eq!(doc.get_str("k"), Some("second"));
    }

    #[test]
    fn escapes_in_quoted_strings() {
        let doc = parse(r#""path" "C:\\Games\\Steam" "quote" "say \"hi\"""#).unwrap();
        assert_eq!(doc.get_str("path"), Some(r"C:\Games\Steam"));
        assert_eq!(doc.get_str("quote"), Some(r#"say "hi""#));
    }

    #[test]
    fn comments_are_skipped() {
        let doc = parse(
            "// header comment\n\"key\" \"value\" // trailing\n\"other\" \"x\"",
        )
        .unwrap();
        assert_eq!(doc.get_str("key"), Some("value"));
        assert_eq!(doc.get_str("other"), Some("x"));
    }

    #[test]
    fn bare_tokens_parse() {
        let doc = parse("key value").unwrap();
        assert_eq!(doc.get_str("key"), Some("value"));
    }

    #[test]
    fn unterminated_block_is_an_error() {
        assert!(matches!(
            parse(r#""root" { "a" "b""#),
            Err(VdfError::UnexpectedEof)
        ));
    }

    #[test]
    fn unterminated_string_reports_line() {
        match parse("\n\n\"open") {
            Err(VdfError::UnterminatedString { line }) => assert_eq!(line, 3),
            other => panic!("expected UnterminatedString, got {other:?}"),
        }
    }

    #[test]
    fn stray_close_is_an_error() {
        assert!(matches!(parse("}"), Err(VdfError::Unexpected { .. })));
    }

    #[test]
    fn key_without_value_is_an_error() {
        assert!(matches!(parse(r#""lonely""#), Err(VdfError::UnexpectedEof)));
    }

    #[test]
    fn case_insensitive_lookup() {
        let doc = parse(r#""StateFlags" "4""#).unwrap();
        assert_eq!(doc.get_str_ignore_case("stateflags"), Some("4"));
        assert_eq!(doc.get_str("stateflags"), None);
    }

    #[test]
    fn empty_input_is_an_empty_object() {
        let doc = parse("").unwrap();
        assert_eq!(doc.as_obj().unwrap().len(), 0);
    }
}
