//! visiting the references between template entries
//!
//! CloudFormation entries point at each other by name, through intrinsic functions (`Ref`, `Fn::GetAtt`, `Fn::Sub`,
//! `Fn::If`, `Condition`) and resource attributes (`DependsOn`). Each such name is handed to a [VisitMut] as a
//! [Reference] that may be renamed in place.
mod visit_references;
pub use visit_references::{visit_name, VisitReferencesMut};

/// Visitor that may change what it visits
pub trait VisitMut<T> {
    fn visit_mut(&mut self, value: &mut T);
}

// closures are visitors
impl<T, F> VisitMut<T> for F
where
    F: FnMut(&mut T),
{
    fn visit_mut(&mut self, value: &mut T) {
        self(value)
    }
}

/// Name of another template entry, as used by an intrinsic function or attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `{ Ref: name }`
    Ref,
    /// `{ Fn::GetAtt: [name, attribute] }` or `{ Fn::GetAtt: name.attribute }`
    GetAtt,
    /// `${name}` or `${name.attribute}` inside `Fn::Sub`
    Sub,
    /// `DependsOn: name` or `DependsOn: [name, ...]`
    DependsOn,
    /// `{ Condition: name }` in condition definitions and the first argument of `Fn::If`
    Condition,
}
