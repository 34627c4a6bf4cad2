//! path lookup into documents
//!
//! Paths use the small subset of JMESPath that configuration authors actually write:
//!
//! | **syntax**       | **meaning**                                  |
//! |------------------|----------------------------------------------|
//! | `vars.region`    | object members by identifier                 |
//! | `abc."123"`      | quoted member names (`\"` and `\\` escapes)  |
//! | `list[0]`        | array element                                |
//! | `list[-1]`       | array element counted from the end           |
//! | `@`              | the root itself                              |
//!
//! Reading a path that does not resolve is an error ([Error::NotFound]); there is no `null` fallback.
use crate::error::{Error, Result};
use crate::value::Value;
use std::iter::Peekable;
use std::str::Chars;

/// One step of a [Path]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(i64),
}

impl Segment {
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }

    fn get<'v>(&self, node: &'v Value) -> Option<&'v Value> {
        match (self, node) {
            (Segment::Key(key), Value::Object(object)) => object.get(key),
            (Segment::Index(index), Value::Array(array)) => {
                resolve_index(*index, array.len()).map(|index| &array[index])
            }
            _ => None,
        }
    }

    fn get_mut<'v>(&self, node: &'v mut Value) -> Option<&'v mut Value> {
        match (self, node) {
            (Segment::Key(key), Value::Object(object)) => object.get_mut(key),
            (Segment::Index(index), Value::Array(array)) => {
                resolve_index(*index, array.len()).map(|index| &mut array[index])
            }
            _ => None,
        }
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        i64::try_from(len).ok()? + index
    } else {
        index
    };

    usize::try_from(resolved).ok().filter(|index| *index < len)
}

/// Parsed path expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl Path {
    pub fn locate<'v>(&self, root: &'v Value) -> Result<&'v Value> {
        let mut node = root;
        for (depth, segment) in self.segments.iter().enumerate() {
            node = segment.get(node).ok_or_else(|| self.not_found(depth))?;
        }
        Ok(node)
    }

    pub fn locate_mut<'v>(&self, root: &'v mut Value) -> Result<&'v mut Value> {
        let mut node = root;
        for (depth, segment) in self.segments.iter().enumerate() {
            node = segment.get_mut(node).ok_or_else(|| self.not_found(depth))?;
        }
        Ok(node)
    }

    /// Set `at` on the object or array this path points to
    ///
    /// Mutates `root` in place. Callers that need the original must clone first.
    pub fn assign(&self, root: &mut Value, at: &At, value: Value) -> Result<()> {
        let mismatch = |message: String| Error::TypeMismatch {
            path: self.to_string(),
            message,
        };

        match (self.locate_mut(root)?, at) {
            (Value::Object(object), At::Key(key)) => {
                object.insert(key.clone(), value);
            }
            (Value::Object(object), At::Index(index)) => {
                object.insert(index.to_string(), value);
            }
            (Value::Array(array), At::Index(index)) => {
                let len = array.len();
                let slot = array.get_mut(*index).ok_or_else(|| {
                    mismatch(format!(
                        "index {index} is out of bounds for an array of length {len}"
                    ))
                })?;
                *slot = value;
            }
            (Value::Array(array), At::Key(key)) => {
                return Err(mismatch(format!(
                    "index of an array must be a number - cannot set index '{key}' in '{}'",
                    Value::Array(array.clone())
                )));
            }
            (other, _) => {
                return Err(mismatch(format!(
                    "path must point to an object or array - found {} '{other}'",
                    other.type_name()
                )));
            }
        }

        Ok(())
    }

    fn not_found(&self, depth: usize) -> Error {
        Error::NotFound {
            path: self.to_string(),
            segment: Path::from(self.segments[..=depth].to_vec()).to_string(),
        }
    }
}

/// Read the value `path` points to
pub fn locate<'v>(root: &'v Value, path: &str) -> Result<&'v Value> {
    path.parse::<Path>()?.locate(root)
}

/// Resolve `path` to an object or array and set `at` on it
pub fn assign(root: &mut Value, path: &str, at: &At, value: Value) -> Result<()> {
    path.parse::<Path>()?.assign(root, at, value)
}

/// Key or index written by [assign]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum At {
    Key(String),
    Index(usize),
}

impl TryFrom<&Value> for At {
    type Error = String;

    fn try_from(value: &Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::String(key) => Ok(At::Key(key.clone())),
            Value::Integer(index) => usize::try_from(*index)
                .map(At::Index)
                .map_err(|_| format!("index {index} must not be negative")),
            other => Err(format!(
                "expected a key name or an index number, found {}",
                other.type_name()
            )),
        }
    }
}

impl std::fmt::Display for At {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            At::Key(key) => f.write_str(key),
            At::Index(index) => write!(f, "{index}"),
        }
    }
}

#[derive(Clone, Copy)]
enum Expect {
    Start,
    Key,
    Continuation,
}

impl std::str::FromStr for Path {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidPath {
            path: input.to_string(),
            reason,
        };

        let text = input.trim();
        if text == "@" {
            return Ok(Path::default());
        }

        let mut segments = Vec::new();
        let mut chars = text.chars().peekable();
        let mut state = Expect::Start;

        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            let Some(&next) = chars.peek() else {
                break;
            };

            match (state, next) {
                (Expect::Start | Expect::Continuation, '[') => {
                    chars.next();
                    segments.push(Segment::Index(parse_index(&mut chars).map_err(&invalid)?));
                    state = Expect::Continuation;
                }
                (Expect::Continuation, '.') => {
                    chars.next();
                    state = Expect::Key;
                }
                (Expect::Start | Expect::Key, '"') => {
                    chars.next();
                    segments.push(Segment::Key(parse_quoted(&mut chars).map_err(&invalid)?));
                    state = Expect::Continuation;
                }
                (Expect::Start | Expect::Key, c) if is_identifier_start(c) => {
                    let mut key = String::new();
                    while let Some(c) = chars.next_if(|c| is_identifier_char(*c)) {
                        key.push(c);
                    }
                    segments.push(Segment::Key(key));
                    state = Expect::Continuation;
                }
                (_, c) => return Err(invalid(format!("unexpected character '{c}'"))),
            }
        }

        match state {
            Expect::Start => Err(invalid("path is empty".to_string())),
            Expect::Key => Err(invalid("expected an identifier after '.'".to_string())),
            Expect::Continuation => Ok(Path { segments }),
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_identifier_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

fn parse_index(chars: &mut Peekable<Chars>) -> std::result::Result<i64, String> {
    let mut digits = String::new();
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
    if let Some(sign) = chars.next_if_eq(&'-') {
        digits.push(sign);
    }
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    while chars.next_if(|c| c.is_whitespace()).is_some() {}

    if chars.next() != Some(']') {
        return Err("expected ']' after index".to_string());
    }

    digits
        .parse()
        .map_err(|_| format!("'{digits}' is not a valid index"))
}

fn parse_quoted(chars: &mut Peekable<Chars>) -> std::result::Result<String, String> {
    let mut key = String::new();
    loop {
        match chars.next() {
            None => return Err("unterminated quoted identifier".to_string()),
            Some('"') => return Ok(key),
            Some('\\') => match chars.next() {
                Some(c @ ('"' | '\\' | '/')) => key.push(c),
                Some('n') => key.push('\n'),
                Some('t') => key.push('\t'),
                Some(c) => return Err(format!("unknown escape sequence '\\{c}'")),
                None => return Err("unterminated quoted identifier".to_string()),
            },
            Some(c) => key.push(c),
        }
    }
}

/// Writes the path back in a form [Path::from_str] accepts
impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("@");
        }

        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    let plain = key.starts_with(is_identifier_start)
                        && key.chars().all(is_identifier_char);
                    if plain {
                        f.write_str(key)?;
                    } else {
                        write!(f, "\"{}\"", key.replace('\\', "\\\\").replace('"', "\\\""))?;
                    }
                }
            }
        }

        Ok(())
    }
}
