use crate::error::{Error, Result};
use crate::template::{CONDITIONS, OUTPUTS, RESOURCES};
use crate::value::{Mapping, Value};
use crate::visit::{self, Reference, ReferenceKind, VisitReferencesMut};
use std::collections::HashSet;

const CONDITION: &str = "Condition";
const DEPENDS_ON: &str = "DependsOn";

/// Prefix references to entries declared by the same template
///
/// Parameters, pseudo parameters (`AWS::Region`) and anything else not declared locally is left alone.
#[derive(derive_new::new)]
pub(crate) struct ReferencePrefixer<'r> {
    prefix: &'r str,
    resources: &'r HashSet<String>,
    conditions: &'r HashSet<String>,
}

impl<'r> visit::VisitMut<Reference> for ReferencePrefixer<'r> {
    #[tracing::instrument(level = "trace", skip(self))]
    fn visit_mut(&mut self, reference: &mut Reference) {
        let local = match reference.kind {
            ReferenceKind::Condition => self.conditions,
            ReferenceKind::Ref
            | ReferenceKind::GetAtt
            | ReferenceKind::Sub
            | ReferenceKind::DependsOn => self.resources,
        };

        if !local.contains(&reference.name) {
            return;
        }

        reference.name.insert_str(0, self.prefix);
    }
}

/// Prefix every resource, condition and output of `template` and all references to them
pub(crate) fn prefix_template(template: Value, prefix: &str) -> Result<Mapping> {
    let mut sections = match template {
        Value::Object(sections) => sections,
        other => {
            return Err(Error::TypeMismatch {
                path: "@".to_string(),
                message: format!("a template must be an object - found {}", other.type_name()),
            })
        }
    };

    let resources = match sections.get(RESOURCES) {
        Some(Value::Object(resources)) => declared_names(resources),
        Some(other) => {
            return Err(Error::TypeMismatch {
                path: RESOURCES.to_string(),
                message: format!("expected an object - found {}", other.type_name()),
            })
        }
        None => {
            return Err(Error::TypeMismatch {
                path: RESOURCES.to_string(),
                message: "a template requires a 'Resources' section".to_string(),
            })
        }
    };
    let conditions = sections
        .get(CONDITIONS)
        .and_then(Value::as_object)
        .map(declared_names)
        .unwrap_or_default();

    let mut prefixer = ReferencePrefixer::new(prefix, &resources, &conditions);

    for (section, value) in sections.iter_mut() {
        let Value::Object(entries) = value else {
            continue;
        };

        match section.as_str() {
            RESOURCES | OUTPUTS => {
                for body in entries.values_mut() {
                    prefix_entry_attributes(body, prefix, &mut prefixer);
                }
            }
            CONDITIONS => {
                for body in entries.values_mut() {
                    body.visit_condition_references_mut(&mut prefixer);
                }
            }
            _ => continue,
        }

        *entries = std::mem::take(entries)
            .into_iter()
            .map(|(name, body)| (format!("{prefix}{name}"), body))
            .collect();
    }

    Ok(sections)
}

fn declared_names(entries: &Mapping) -> HashSet<String> {
    entries.keys().cloned().collect()
}

/// Rewrite a resource or output body
///
/// The `Condition` attribute is always prefixed, `DependsOn` only when naming a local resource.
fn prefix_entry_attributes(body: &mut Value, prefix: &str, prefixer: &mut ReferencePrefixer) {
    let attributes = match body {
        Value::Object(attributes) => attributes,
        other => return other.visit_references_mut(prefixer),
    };

    for (attribute, value) in attributes.iter_mut() {
        match attribute.as_str() {
            CONDITION => for_each_name(value, |name| name.insert_str(0, prefix)),
            DEPENDS_ON => for_each_name(value, |name| {
                visit::visit_name(ReferenceKind::DependsOn, name, &mut *prefixer)
            }),
            _ => value.visit_references_mut(prefixer),
        }
    }
}

/// Apply `f` to a single name or to every name of a list
fn for_each_name(value: &mut Value, mut f: impl FnMut(&mut String)) {
    match value {
        Value::String(name) => f(name),
        Value::Array(names) => {
            for name in names {
                if let Value::String(name) = name {
                    f(name)
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::doc;
    use pretty_assertions::assert_eq;

    fn prefixed(template: &str) -> Value {
        Value::Object(prefix_template(doc!(template), "axx").unwrap())
    }

    #[test]
    fn prefix_declarations_and_local_references() {
        let result = prefixed(
            r#"
            AWSTemplateFormatVersion: '2010-09-09'
            Parameters: { Env: { Type: String } }
            Conditions:
              IsProd: !Equals [ !Ref Env, prd ]
              IsBig: !And [ !Condition IsProd, !Equals [ !Ref "AWS::Region", eu-west-1 ] ]
            Resources:
              Bucket:
                Type: AWS::S3::Bucket
                Condition: IsProd
                Properties:
                  BucketName: !Sub "${Env}-${AWS::AccountId}-bucket"
              Policy:
                Type: AWS::S3::BucketPolicy
                DependsOn: [ Bucket, External ]
                Properties:
                  Bucket: !Ref Bucket
                  Arn: !GetAtt Bucket.Arn
                  Size: !If [ IsBig, 10, 1 ]
            Outputs:
              BucketName:
                Condition: IsProd
                Value: !Sub "${Bucket}"
            "#,
        );

        let expected = doc!(
            r#"
            AWSTemplateFormatVersion: '2010-09-09'
            Parameters: { Env: { Type: String } }
            Conditions:
              axxIsProd: { "Fn::Equals": [ { Ref: Env }, prd ] }
              axxIsBig:
                "Fn::And":
                  - { Condition: axxIsProd }
                  - { "Fn::Equals": [ { Ref: "AWS::Region" }, eu-west-1 ] }
            Resources:
              axxBucket:
                Type: AWS::S3::Bucket
                Condition: axxIsProd
                Properties:
                  BucketName: { "Fn::Sub": "${Env}-${AWS::AccountId}-bucket" }
              axxPolicy:
                Type: AWS::S3::BucketPolicy
                DependsOn: [ axxBucket, External ]
                Properties:
                  Bucket: { Ref: axxBucket }
                  Arn: { "Fn::GetAtt": [ axxBucket, Arn ] }
                  Size: { "Fn::If": [ axxIsBig, 10, 1 ] }
            Outputs:
              axxBucketName:
                Condition: axxIsProd
                Value: { "Fn::Sub": "${axxBucket}" }
            "#
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn resource_condition_lists_are_prefixed() {
        let result = prefixed("Resources: { R: { Type: t, Condition: [ A, B ] } }");
        assert_eq!(
            result,
            doc!("Resources: { axxR: { Type: t, Condition: [ axxA, axxB ] } }")
        );
    }

    #[test]
    fn condition_shaped_properties_are_data() {
        let result = prefixed(
            r#"
            Conditions:
              IsProd: !Equals [ a, a ]
              NotProd: !Condition IsProd
            Resources:
              Rule:
                Type: AWS::Events::Rule
                Properties:
                  Pattern: { Condition: IsProd }
            "#,
        );
        assert_eq!(
            result,
            doc!(
                r#"
                Conditions:
                  axxIsProd: { "Fn::Equals": [ a, a ] }
                  axxNotProd: { Condition: axxIsProd }
                Resources:
                  axxRule:
                    Type: AWS::Events::Rule
                    Properties:
                      Pattern: { Condition: IsProd }
                "#
            )
        );
    }

    #[test]
    fn resources_are_required() {
        for template in ["Parameters: {}", "Resources: []", "[]"] {
            let error = prefix_template(doc!(template), "axx").unwrap_err();
            assert!(matches!(error, Error::TypeMismatch { .. }), "{template}: {error}");
        }
    }
}
