//! infrastructure templates and their substitution map
//!
//! A template declares where deployment parameters go in `Metadata.Substitution`:
//!
//! ```yaml
//! Metadata:
//!   Substitution:
//!     Sub1:
//!       Path: Resources.MyResource.Properties   # object or array to write into
//!       At: Prop1                               # key name or index number
//! Resources:
//!   MyResource:
//!     Type: abc
//!     Properties:
//!       Prop1: []
//! ```
//!
//! With the parameters `{ Sub1: abc123 }` the rendered template has `Prop1: abc123`.
use crate::error::{Error, Result};
use crate::path::{self, At, Segment};
use crate::value::{Mapping, Value};
use indexmap::IndexMap;

pub const METADATA: &str = "Metadata";
pub const SUBSTITUTION: &str = "Substitution";
pub const RESOURCES: &str = "Resources";
pub const CONDITIONS: &str = "Conditions";
pub const OUTPUTS: &str = "Outputs";
pub const PARAMETERS: &str = "Parameters";
pub const MAPPINGS: &str = "Mappings";
pub const RULES: &str = "Rules";

/// Source of named templates
pub trait TemplateLoader {
    fn load(&self, name: &str) -> Result<Value>;
}

impl TemplateLoader for IndexMap<String, Value> {
    fn load(&self, name: &str) -> Result<Value> {
        self.get(name).cloned().ok_or_else(|| Error::TemplateNotFound {
            name: name.to_string(),
        })
    }
}

/// One declared injection point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub path: String,
    pub at: At,
}

impl Substitution {
    /// Read one `{ Path, At }` entry of the section
    pub fn parse(name: &str, entry: &Value) -> Result<Self> {
        let invalid = |message: String| Error::InvalidSubstitution {
            name: name.to_string(),
            message,
        };

        let path = entry
            .get("Path")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("'Path' must be a string".to_string()))?;
        let at = entry
            .get("At")
            .ok_or_else(|| invalid("'At' is missing".to_string()))
            .and_then(|at| At::try_from(at).map_err(&invalid))?;

        Ok(Substitution {
            path: path.to_string(),
            at,
        })
    }
}

/// The raw `Metadata.Substitution` entries
///
/// A missing or empty (`null`) section, or a `Metadata` that is not an object, has no entries.
fn substitution_section(template: &Value) -> Result<Option<&Mapping>> {
    match template.get(METADATA).and_then(|metadata| metadata.get(SUBSTITUTION)) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(entries)) => Ok(Some(entries)),
        Some(other) => Err(Error::InvalidSubstitution {
            name: SUBSTITUTION.to_string(),
            message: format!("expected an object, found {}", other.type_name()),
        }),
    }
}

/// Clone `template` and write every parameter that has a matching substitution into it
///
/// Parameters without a substitution are ignored, and so are entries no parameter names. `template` itself is never
/// changed.
#[tracing::instrument(level = "debug", skip_all)]
pub fn apply_substitution_map(template: &Value, parameters: &Mapping) -> Result<Value> {
    let mut cloned = template.clone();
    let Some(entries) = substitution_section(template)? else {
        return Ok(cloned);
    };

    for (name, entry) in entries {
        let Some(value) = parameters.get(name) else {
            continue;
        };

        let substitution = Substitution::parse(name, entry)?;
        tracing::debug!(%name, path=%substitution.path, at=%substitution.at, "applying substitution");
        path::assign(&mut cloned, &substitution.path, &substitution.at, value.clone()).map_err(
            |error| {
                error.at(&[
                    Segment::key(METADATA),
                    Segment::key(SUBSTITUTION),
                    Segment::key(name.as_str()),
                ])
            },
        )?;
    }

    Ok(cloned)
}

/// Remove the build-time only `Metadata.Substitution` section
///
/// `Metadata` is dropped as well when nothing else is left in it.
pub fn strip_substitution(template: &mut Value) {
    let Some(sections) = template.as_object_mut() else {
        return;
    };

    let Some(Value::Object(metadata)) = sections.get_mut(METADATA) else {
        return;
    };

    metadata.shift_remove(SUBSTITUTION);
    if metadata.is_empty() {
        sections.shift_remove(METADATA);
    }
}
