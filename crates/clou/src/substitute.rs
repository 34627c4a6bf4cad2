//! deep substitution over whole documents
//!
//! Every string leaf is passed through [interpolate], everything else is copied. Keys are never substituted.
//!
//! All placeholders are evaluated against the *unsubstituted* root. A `ref` to a string that itself holds a
//! placeholder yields that placeholder text verbatim, so references cannot chain into cycles.
use crate::error::{Error, Result};
use crate::expression::Evaluator;
use crate::interpolate::interpolate;
use crate::path::Segment;
use crate::value::{Mapping, Value};

#[derive(derive_new::new, Clone, Copy)]
pub struct Substitutor<'c> {
    evaluator: Evaluator<'c>,
    max_depth: usize,
}

impl<'c> Substitutor<'c> {
    pub fn evaluator(&self) -> &Evaluator<'c> {
        &self.evaluator
    }

    /// Substitute a document against itself
    pub fn substitute_all(&self, root: &Value) -> Result<Value> {
        self.substitute_in(root, root)
    }

    /// Substitute `value` against the context `root`
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn substitute_in(&self, root: &Value, value: &Value) -> Result<Value> {
        let mut location = Vec::new();
        self.walk(root, value, &mut location)
    }

    fn walk(&self, root: &Value, value: &Value, location: &mut Vec<Segment>) -> Result<Value> {
        if location.len() > self.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
            }
            .at(location));
        }

        match value {
            Value::String(text) => {
                interpolate(&self.evaluator, root, text).map_err(|error| error.at(location))
            }
            Value::Array(array) => array
                .iter()
                .enumerate()
                .map(|(index, element)| {
                    location.push(Segment::Index(index as i64));
                    let substituted = self.walk(root, element, location);
                    location.pop();
                    substituted
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(object) => object
                .iter()
                .map(|(key, element)| {
                    location.push(Segment::key(key.as_str()));
                    let substituted = self.walk(root, element, location);
                    location.pop();
                    substituted.map(|substituted| (key.clone(), substituted))
                })
                .collect::<Result<Mapping>>()
                .map(Value::Object),
            Value::Null | Value::Boolean(_) | Value::Integer(_) | Value::Decimal(_) => {
                Ok(value.clone())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::doc;
    use crate::expression::StaticContent;
    use pretty_assertions::assert_eq;

    fn substituted(root: &Value) -> Result<Value> {
        let content = StaticContent::default().with("motd.txt", "welcome");
        let substitutor = Substitutor::new(Evaluator::new(&content), 256);
        substitutor.substitute_all(root)
    }

    #[test]
    fn replace_arbitrarily_nested_strings() {
        let input = doc!(
            r#"
            vars: { value1: abc, value2: def, value3: ghi }
            stacks:
              abc:
                name: '{{ ref vars.value1 }}'
                motd: '{{ file motd.txt }}'
                parameters:
                  MyParameter: '{{ ref vars.value2 }}'
                  MyList: [ '{{ ref vars.value3 }}', 7 ]
            "#
        );
        let expected = doc!(
            r#"
            vars: { value1: abc, value2: def, value3: ghi }
            stacks:
              abc:
                name: abc
                motd: welcome
                parameters:
                  MyParameter: def
                  MyList: [ ghi, 7 ]
            "#
        );

        let result = substituted(&input).unwrap();
        assert_eq!(result, expected);
        assert_ne!(result, input);
    }

    #[test]
    fn identity_without_placeholders() {
        let input = doc!(
            r#"
            a: [ 1, 2.5, true, null, "{ not a placeholder }" ]
            b: { "{{": keys are never substituted }
            "#
        );
        assert_eq!(substituted(&input).unwrap(), input);
    }

    #[test]
    fn references_see_the_unsubstituted_root() {
        let input = doc!(
            r#"
            vars: { a: '{{ ref vars.b }}', b: value }
            out: '{{ ref vars.a }}'
            self: '{{ ref self }}'
            "#
        );
        let result = substituted(&input).unwrap();
        assert_eq!(result.get("out"), Some(&Value::from("{{ ref vars.b }}")));
        assert_eq!(result.get("self"), Some(&Value::from("{{ ref self }}")));
    }

    #[test]
    fn errors_name_their_location() {
        let input = doc!("deployments: { web: { parameters: [ ok, '{{ ref vars.missing }}' ] } }");
        let error = substituted(&input).unwrap_err();
        assert_eq!(error.to_string(), "at 'deployments.web.parameters[1]'");
        assert!(matches!(error.root_cause(), Error::NotFound { path, .. } if path == "vars.missing"));
    }

    #[test]
    fn substitute_in_other_context() {
        let content = StaticContent::default();
        let substitutor = Substitutor::new(Evaluator::new(&content), 256);
        let context = doc!("parameters: { Size: 3 }");
        let template = doc!("Resources: { R: { Properties: { Count: '{{ ref parameters.Size }}' } } }");

        assert_eq!(
            substitutor.substitute_in(&context, &template).unwrap(),
            doc!("Resources: { R: { Properties: { Count: 3 } } }")
        );
    }

    #[test]
    fn depth_limit() {
        let content = StaticContent::default();
        let substitutor = Substitutor::new(Evaluator::new(&content), 2);

        assert!(substitutor.substitute_all(&doc!("a: { b: c }")).is_ok());

        let error = substitutor.substitute_all(&doc!("a: { b: { c: d } }")).unwrap_err();
        assert!(matches!(error.root_cause(), Error::DepthExceeded { limit: 2 }));
    }
}
