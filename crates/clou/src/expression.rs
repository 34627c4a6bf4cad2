//! single expression evaluation
//!
//! The text between `{{` and `}}` is one expression:
//! - `ref <path>` looks up [crate::path] `<path>` in the root document
//! - `file <path>` returns the contents of a file, read through a [ContentProvider]
use crate::error::{Error, Result};
use crate::path;
use crate::value::Value;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Reference(String),
    FileRead(String),
}

impl std::str::FromStr for Expression {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidExpression {
            expression: text.to_string(),
        };

        let (keyword, argument) = text
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(invalid)?;
        let argument = argument.trim().to_string();

        match keyword {
            "ref" => Ok(Expression::Reference(argument)),
            "file" => Ok(Expression::FileRead(argument)),
            _ => Err(invalid()),
        }
    }
}

/// Source of `file` expression contents
pub trait ContentProvider {
    fn read(&self, path: &str) -> Result<String>;
}

/// In-memory [ContentProvider]
#[derive(Debug, Default, Clone)]
pub struct StaticContent {
    files: IndexMap<String, String>,
}

impl StaticContent {
    pub fn with(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl ContentProvider for StaticContent {
    fn read(&self, path: &str) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| Error::Io {
            path: path.into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        })
    }
}

#[derive(derive_new::new, Clone, Copy)]
pub struct Evaluator<'c> {
    content: &'c dyn ContentProvider,
}

impl<'c> Evaluator<'c> {
    #[tracing::instrument(level = "trace", skip(self, root))]
    pub fn evaluate(&self, root: &Value, expression: &str) -> Result<Value> {
        match expression.parse::<Expression>()? {
            Expression::Reference(path) => path::locate(root, &path).cloned(),
            Expression::FileRead(path) => self.content.read(&path).map(Value::String),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_expressions() {
        assert_eq!(
            " ref abc.abc123[1] ".parse::<Expression>().unwrap(),
            Expression::Reference("abc.abc123[1]".into())
        );
        assert_eq!(
            "file\tschemas/config.json".parse::<Expression>().unwrap(),
            Expression::FileRead("schemas/config.json".into())
        );

        for invalid in ["", "ref", "refabc", "sub x", " file"] {
            let error = invalid.parse::<Expression>().unwrap_err();
            assert!(
                matches!(&error, Error::InvalidExpression { expression } if expression == invalid),
                "{invalid}: {error}"
            );
        }
    }

    #[test]
    fn reference_values() {
        let content = StaticContent::default();
        let evaluator = Evaluator::new(&content);
        let root = doc!("abc: { abc123: [ {}, 999, { key: value } ] }");

        assert_eq!(
            evaluator.evaluate(&root, " ref abc.abc123[1] ").unwrap(),
            Value::Integer(999)
        );
        assert_eq!(
            evaluator.evaluate(&root, " ref abc.abc123[2] ").unwrap(),
            doc!("key: value")
        );
    }

    #[test]
    fn file_contents() {
        let content = StaticContent::default().with("schemas/config.json", "{ \"type\": \"object\" }");
        let evaluator = Evaluator::new(&content);

        assert_eq!(
            evaluator
                .evaluate(&Value::Null, " file schemas/config.json ")
                .unwrap(),
            Value::from("{ \"type\": \"object\" }")
        );

        let error = evaluator.evaluate(&Value::Null, "file missing.txt").unwrap_err();
        assert!(matches!(error, Error::Io { .. }));
        assert_eq!(error.to_string(), "unable to read 'missing.txt'");
    }
}
