use super::{Reference, ReferenceKind, VisitMut};
use crate::value::Value;

/// Recursively visit all [Reference]s mutably
pub trait VisitReferencesMut {
    fn visit_references_mut(&mut self, visitor: &mut dyn VisitMut<Reference>);

    /// Visit a condition definition, where `{ Condition: name }` names another condition
    fn visit_condition_references_mut(&mut self, visitor: &mut dyn VisitMut<Reference>);
}

impl VisitReferencesMut for Value {
    fn visit_references_mut(&mut self, visitor: &mut dyn VisitMut<Reference>) {
        walk(self, visitor, false)
    }

    fn visit_condition_references_mut(&mut self, visitor: &mut dyn VisitMut<Reference>) {
        walk(self, visitor, true)
    }
}

/// `in_condition` is set inside condition definitions and the arguments of `Fn::And`, `Fn::Or` and `Fn::Not`.
/// Anywhere else `{ Condition: name }` is plain data, e.g. a resource property.
fn walk(value: &mut Value, visitor: &mut dyn VisitMut<Reference>, in_condition: bool) {
    match value {
        Value::Object(object) => {
            // intrinsic functions are single key objects
            if object.len() == 1 {
                if let Some((function, argument)) = object.iter_mut().next() {
                    if visit_intrinsic(function, argument, visitor, in_condition) {
                        return;
                    }
                }
            }

            for value in object.values_mut() {
                walk(value, visitor, false);
            }
        }
        Value::Array(array) => {
            for value in array {
                walk(value, visitor, in_condition);
            }
        }
        Value::Null
        | Value::Boolean(_)
        | Value::Integer(_)
        | Value::Decimal(_)
        | Value::String(_) => {}
    }
}

/// Visit a plain name in place
///
/// A standalone name is wrapped into a [Reference], visited, and written back.
pub fn visit_name(kind: ReferenceKind, name: &mut String, visitor: &mut dyn VisitMut<Reference>) {
    let mut reference = Reference {
        kind,
        name: std::mem::take(name),
    };
    visitor.visit_mut(&mut reference);
    *name = reference.name;
}

/// Returns `true` when the function was recognized and its argument fully visited
fn visit_intrinsic(
    function: &str,
    argument: &mut Value,
    visitor: &mut dyn VisitMut<Reference>,
    in_condition: bool,
) -> bool {
    match (function, argument) {
        ("Ref", Value::String(name)) => visit_name(ReferenceKind::Ref, name, visitor),
        ("Condition", Value::String(name)) if in_condition => {
            visit_name(ReferenceKind::Condition, name, visitor)
        }
        ("Fn::And" | "Fn::Or" | "Fn::Not", argument) => walk(argument, visitor, true),
        ("Fn::GetAtt", Value::String(dotted)) => {
            let Some((name, attribute)) = dotted.split_once('.') else {
                return false;
            };
            let (mut name, attribute) = (name.to_string(), attribute.to_string());
            visit_name(ReferenceKind::GetAtt, &mut name, visitor);
            *dotted = format!("{name}.{attribute}");
        }
        ("Fn::GetAtt", Value::Array(arguments)) => {
            visit_leading_name(ReferenceKind::GetAtt, arguments, visitor)
        }
        ("Fn::If", Value::Array(arguments)) => {
            visit_leading_name(ReferenceKind::Condition, arguments, visitor)
        }
        ("Fn::Sub", Value::String(template)) => visit_sub(template, &[], visitor),
        ("Fn::Sub", Value::Array(arguments)) => {
            // names bound in the variable map shadow template entries
            let locals: Vec<String> = arguments
                .get(1)
                .and_then(Value::as_object)
                .map(|variables| variables.keys().cloned().collect())
                .unwrap_or_default();

            if let Some(Value::String(template)) = arguments.first_mut() {
                visit_sub(template, &locals, visitor);
            }
            for value in arguments.iter_mut().skip(1) {
                value.visit_references_mut(visitor);
            }
        }
        _ => return false,
    }

    true
}

fn visit_leading_name(
    kind: ReferenceKind,
    arguments: &mut [Value],
    visitor: &mut dyn VisitMut<Reference>,
) {
    let Some((first, rest)) = arguments.split_first_mut() else {
        return;
    };

    match first {
        Value::String(name) => visit_name(kind, name, visitor),
        other => other.visit_references_mut(visitor),
    }
    for value in rest {
        value.visit_references_mut(visitor);
    }
}

/// Visit the `${name}` / `${name.attribute}` variables of a `Fn::Sub` template
///
/// `${!literal}` escapes and names in `locals` are left alone.
fn visit_sub(template: &mut String, locals: &[String], visitor: &mut dyn VisitMut<Reference>) {
    let mut output = String::with_capacity(template.len());
    let mut rest = template.as_str();

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            output.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let variable = &after[..end];
        let (name, attribute) = match variable.split_once('.') {
            Some((name, attribute)) => (name, Some(attribute)),
            None => (variable, None),
        };

        output.push_str("${");
        if variable.starts_with('!') || locals.iter().any(|local| local == name) {
            output.push_str(variable);
        } else {
            let mut name = name.to_string();
            visit_name(ReferenceKind::Sub, &mut name, visitor);
            output.push_str(&name);
            if let Some(attribute) = attribute {
                output.push('.');
                output.push_str(attribute);
            }
        }
        output.push('}');

        rest = &after[end + 1..];
    }

    output.push_str(rest);
    *template = output;
}
