//! several templates composed into one
//!
//! Every spec instantiates its template under a prefix (`<spec name>xx`). Resources, conditions and outputs are
//! renamed with it so two instances of the same template can live side by side:
//!
//! ```yaml
//! specs:
//!   a: { using: queue }
//!   b: { using: queue }
//! ```
//!
//! turns the template's `MyQueue` into `axxMyQueue` and `bxxMyQueue`. Everything else (`Parameters`,
//! `Mappings`, `AWSTemplateFormatVersion`, ...) is shared and must agree between the specs.
use crate::config::Spec;
use crate::error::{Error, Result};
use crate::rewrite::prefix_template;
use crate::substitute::Substitutor;
use crate::template::{
    apply_substitution_map, strip_substitution, TemplateLoader, CONDITIONS, MAPPINGS, METADATA,
    OUTPUTS, PARAMETERS, RESOURCES, RULES,
};
use crate::value::{Mapping, Value};
use indexmap::map::Entry;
use indexmap::IndexMap;

#[derive(derive_new::new)]
pub struct Composer<'a> {
    substitutor: Substitutor<'a>,
    templates: &'a dyn TemplateLoader,
    prefix_suffix: &'a str,
}

/// How a top-level template section merges with the same section of other specs
enum Merge {
    /// entries are prefixed, a repeated key is a conflict
    Disjoint,
    /// entries are shared, a repeated key must have an equal value
    SharedEntries,
    /// the whole section is shared and must be equal
    Shared,
}

impl Merge {
    fn of(section: &str) -> Self {
        match section {
            RESOURCES | CONDITIONS | OUTPUTS => Merge::Disjoint,
            PARAMETERS | METADATA | MAPPINGS | RULES => Merge::SharedEntries,
            _ => Merge::Shared,
        }
    }
}

impl<'a> Composer<'a> {
    /// Compose all `specs` (in order) into one template
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compose(&self, specs: &IndexMap<String, Spec>) -> Result<Value> {
        let mut composed = Mapping::new();

        for (name, spec) in specs {
            let sections = self.instantiate(name, spec).map_err(|error| error.in_spec(name))?;
            for (section, value) in sections {
                merge_section(&mut composed, name, section, value)?;
            }
        }

        composed
            .entry(RESOURCES.to_string())
            .or_insert_with(|| Value::Object(Mapping::new()));

        Ok(Value::Object(composed))
    }

    /// The prefixed sections of a single spec's template
    pub fn instantiate(&self, name: &str, spec: &Spec) -> Result<Mapping> {
        let template = self.templates.load(&spec.using)?;
        let template = self.substitutor.substitute_in(&spec.to_value(), &template)?;
        let mut template = apply_substitution_map(&template, &spec.parameters)?;
        strip_substitution(&mut template);

        let prefix = self.prefix(name);
        tracing::debug!(spec = %name, template = %spec.using, %prefix, "renaming resources");
        prefix_template(template, &prefix)
    }

    /// `<spec name>xx`, reduced to the characters allowed in logical ids
    pub fn prefix(&self, spec_name: &str) -> String {
        let mut prefix: String = spec_name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        prefix.push_str(self.prefix_suffix);
        prefix
    }
}

fn merge_section(composed: &mut Mapping, spec: &str, section: String, value: Value) -> Result<()> {
    let conflict = |key: &str| Error::CompositionConflict {
        spec: spec.to_string(),
        section: section.clone(),
        key: key.to_string(),
    };

    let strategy = Merge::of(&section);
    let existing = match composed.entry(section.clone()) {
        Entry::Vacant(vacant) => {
            vacant.insert(value);
            return Ok(());
        }
        Entry::Occupied(occupied) => occupied.into_mut(),
    };

    match (strategy, existing, value) {
        (Merge::Disjoint, Value::Object(existing), Value::Object(entries)) => {
            for (key, entry) in entries {
                if existing.contains_key(&key) {
                    return Err(conflict(&key));
                }
                existing.insert(key, entry);
            }
        }
        (Merge::SharedEntries, Value::Object(existing), Value::Object(entries)) => {
            for (key, entry) in entries {
                match existing.get(&key) {
                    Some(present) if *present != entry => return Err(conflict(&key)),
                    Some(_) => {}
                    None => {
                        existing.insert(key, entry);
                    }
                }
            }
        }
        (_, existing, value) => {
            if *existing != value {
                return Err(conflict(&section));
            }
        }
    }

    Ok(())
}
