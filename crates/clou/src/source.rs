//! loading documents from yaml/json sources
//!
//! Besides parsing this module provides the filesystem backed collaborators of the core:
//! - [FsContentProvider] serves `{{ file ... }}` expressions
//! - [TemplateDirectory] serves named templates
//!
//! CloudFormation short-form tags (`!Ref`, `!GetAtt`, `!Sub`, ...) are turned into their long form while parsing.
//! Output is always written in long form, so a rendered template parses back into an equal [Value].
use crate::error::{Error, Result};
use crate::expression::ContentProvider;
use crate::template::TemplateLoader;
use crate::value::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Tags that map to `Fn::<Tag>`
const FUNCTION_TAGS: &[&str] = &[
    "And",
    "Base64",
    "Cidr",
    "Equals",
    "FindInMap",
    "GetAZs",
    "If",
    "ImportValue",
    "Join",
    "Not",
    "Or",
    "Select",
    "Split",
    "Sub",
    "Transform",
];

pub fn parse_yaml(text: &str, source_name: &str) -> Result<Value> {
    let parse_error = |message: String| Error::Parse {
        source_name: source_name.to_string(),
        message,
    };

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
    from_yaml(yaml).map_err(parse_error)
}

pub fn parse_json(text: &str, source_name: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::Parse {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}

/// Parse by file extension, `.json` is json and everything else yaml
pub fn parse_document(text: &str, path: &Path) -> Result<Value> {
    let source_name = path.display().to_string();
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("json") => parse_json(text, &source_name),
        _ => parse_yaml(text, &source_name),
    }
}

pub fn load_file(path: &Path) -> Result<Value> {
    let io_error = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    let file_path = path.canonicalize().map_err(io_error)?;
    tracing::info!(path=%file_path.display(), "loading file");

    let contents = std::fs::read_to_string(&file_path).map_err(io_error)?;
    parse_document(&contents, &file_path)
}

pub fn to_yaml(value: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

pub fn to_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn from_yaml(value: serde_yaml::Value) -> std::result::Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(value) => Value::Boolean(value),
        Yaml::Number(number) => match number.as_i64() {
            Some(int) => Value::Integer(int),
            None => Value::Decimal(number.as_f64().unwrap_or(f64::NAN)),
        },
        Yaml::String(value) => Value::String(value),
        Yaml::Sequence(sequence) => Value::Array(
            sequence
                .into_iter()
                .map(from_yaml)
                .collect::<std::result::Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut object = Mapping::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, from_yaml(value)?);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            long_form(tag.trim_start_matches('!'), from_yaml(tagged.value)?)?
        }
    })
}

fn yaml_key(key: serde_yaml::Value) -> std::result::Result<String, String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(key) => Ok(key),
        Yaml::Number(number) => Ok(number.to_string()),
        Yaml::Bool(value) => Ok(value.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Sequence(_) | Yaml::Mapping(_) | Yaml::Tagged(_) => {
            Err("mapping keys must be scalars".to_string())
        }
    }
}

/// `!Tag value` -> `{ "Fn::Tag": value }`
fn long_form(tag: &str, value: Value) -> std::result::Result<Value, String> {
    let key = match tag {
        "Ref" | "Condition" => tag.to_string(),
        "GetAtt" => {
            let value = match value {
                Value::String(text) => {
                    let parts = text
                        .split_once('.')
                        .map(|(resource, attribute)| Value::from(vec![resource, attribute]));
                    parts.unwrap_or(Value::String(text))
                }
                other => other,
            };
            return Ok(Value::Object(Mapping::from([(
                "Fn::GetAtt".to_string(),
                value,
            )])));
        }
        tag if FUNCTION_TAGS.contains(&tag) => format!("Fn::{tag}"),
        unknown => return Err(format!("unsupported tag '!{unknown}'")),
    };

    Ok(Value::Object(Mapping::from([(key, value)])))
}

/// `{{ file ... }}` contents from disk
///
/// Relative paths are resolved against `base`.
#[derive(derive_new::new, Debug, Clone)]
pub struct FsContentProvider {
    base: PathBuf,
}

impl ContentProvider for FsContentProvider {
    fn read(&self, path: &str) -> Result<String> {
        let file_path = self.base.join(path);
        tracing::debug!(path=%file_path.display(), "reading file contents");

        std::fs::read_to_string(&file_path).map_err(|source| Error::Io {
            path: file_path,
            source,
        })
    }
}

/// Templates stored as `<name>.yml`, `<name>.yaml` or `<name>.json` in one directory
#[derive(derive_new::new, Debug, Clone)]
pub struct TemplateDirectory {
    directory: PathBuf,
}

impl TemplateLoader for TemplateDirectory {
    fn load(&self, name: &str) -> Result<Value> {
        ["yml", "yaml", "json"]
            .iter()
            .map(|extension| self.directory.join(format!("{name}.{extension}")))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| Error::TemplateNotFound {
                name: name.to_string(),
            })
            .and_then(|path| load_file(&path))
    }
}

/// Utility macro to create a [Value] from yaml
///
/// ```
/// # use clou::doc;
/// let value = doc!("vars: { count: 5 }");
/// assert_eq!(value.get("vars").and_then(|vars| vars.get("count")), Some(&clou::value::Value::Integer(5)));
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use clou::doc;
/// doc!("not: [valid");
/// ```
#[macro_export]
macro_rules! doc {
    { $expr:expr } => {
        $crate::source::parse_yaml($expr, "inline document").expect("document must parse")
    };
}
