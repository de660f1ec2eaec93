// Brook Dot-Notation Resolver
// One walk over `a.b.c` paths used by both the parser (against its shadow
// scope) and the interpreter (against live values)

use crate::ast::{ClassInstance, MethodDefinition, Value};
use crate::scope::Scope;
use std::borrow::Cow;
use std::rc::Rc;
use thiserror::Error;

/// How intermediate hops are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Every hop must already hold a class instance.
    Live,
    /// A hop that is not yet an instance stands in for one when its declared
    /// type names a known class.
    Shadow,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("'{0}' is not a class instance")]
    NotAnInstance(String),
    #[error("'{owner}' has no member '{member}'")]
    UnknownMember { owner: String, member: String },
}

/// The final hop of a variable path.
#[derive(Debug, Clone)]
pub struct Member<'a> {
    pub declared_type: String,
    pub value: Cow<'a, Value>,
}

fn instance_of<'a>(
    scope: &'a Scope,
    name: &str,
    declared_type: &str,
    value: Cow<'a, Value>,
    walk: Walk,
) -> Result<Cow<'a, ClassInstance>, PathError> {
    match value {
        Cow::Borrowed(Value::Instance(instance)) => Ok(Cow::Borrowed(instance)),
        Cow::Owned(Value::Instance(instance)) => Ok(Cow::Owned(instance)),
        _ if walk == Walk::Shadow => scope
            .class(declared_type)
            .map(|class| Cow::Owned(class.instantiate()))
            .ok_or_else(|| PathError::NotAnInstance(name.to_string())),
        _ => Err(PathError::NotAnInstance(name.to_string())),
    }
}

/// Resolves every segment but the last to the instance that owns it.
/// Returns `None` for single-segment paths, which are owned by the scope.
pub fn owner<'a>(
    scope: &'a Scope,
    path: &[String],
    walk: Walk,
) -> Result<Option<Cow<'a, ClassInstance>>, PathError> {
    let Some((first, rest)) = path.split_first() else {
        return Err(PathError::Empty);
    };
    if rest.is_empty() {
        return Ok(None);
    }

    let binding = scope
        .variable(first)
        .ok_or_else(|| PathError::UnknownVariable(first.clone()))?;
    let mut current = instance_of(
        scope,
        first,
        &binding.declared_type,
        Cow::Borrowed(&binding.value),
        walk,
    )?;

    for segment in &rest[..rest.len() - 1] {
        current = match current {
            Cow::Borrowed(instance) => {
                let property = instance.properties.get(segment).ok_or_else(|| {
                    PathError::UnknownMember {
                        owner: instance.class_name.clone(),
                        member: segment.clone(),
                    }
                })?;
                instance_of(
                    scope,
                    segment,
                    &property.declared_type,
                    Cow::Borrowed(&property.value),
                    walk,
                )?
            }
            Cow::Owned(mut instance) => {
                let property = instance.properties.shift_remove(segment).ok_or_else(|| {
                    PathError::UnknownMember {
                        owner: instance.class_name.clone(),
                        member: segment.clone(),
                    }
                })?;
                instance_of(
                    scope,
                    segment,
                    &property.declared_type,
                    Cow::Owned(property.value),
                    walk,
                )?
            }
        };
    }

    Ok(Some(current))
}

/// Looks up the variable or property a path names.
pub fn variable<'a>(scope: &'a Scope, path: &[String], walk: Walk) -> Result<Member<'a>, PathError> {
    let last = path.last().ok_or(PathError::Empty)?;
    match owner(scope, path, walk)? {
        None => scope
            .variable(last)
            .map(|binding| Member {
                declared_type: binding.declared_type.clone(),
                value: Cow::Borrowed(&binding.value),
            })
            .ok_or_else(|| PathError::UnknownVariable(last.clone())),
        Some(Cow::Borrowed(instance)) => instance
            .properties
            .get(last)
            .map(|property| Member {
                declared_type: property.declared_type.clone(),
                value: Cow::Borrowed(&property.value),
            })
            .ok_or_else(|| PathError::UnknownMember {
                owner: instance.class_name.clone(),
                member: last.clone(),
            }),
        Some(Cow::Owned(mut instance)) => instance
            .properties
            .shift_remove(last)
            .map(|property| Member {
                declared_type: property.declared_type,
                value: Cow::Owned(property.value),
            })
            .ok_or_else(|| PathError::UnknownMember {
                owner: instance.class_name.clone(),
                member: last.clone(),
            }),
    }
}

/// Looks up the function or method a path names, together with the instance
/// that owns it.
pub fn method<'a>(
    scope: &'a Scope,
    path: &[String],
    walk: Walk,
) -> Result<(Rc<MethodDefinition>, Option<Cow<'a, ClassInstance>>), PathError> {
    let last = path.last().ok_or(PathError::Empty)?;
    match owner(scope, path, walk)? {
        None => scope
            .function(last)
            .map(|method| (Rc::clone(method), None))
            .ok_or_else(|| PathError::UnknownFunction(last.clone())),
        Some(instance) => {
            let method = instance.methods.get(last).cloned().ok_or_else(|| {
                PathError::UnknownMember {
                    owner: instance.class_name.clone(),
                    member: last.clone(),
                }
            })?;
            Ok((method, Some(instance)))
        }
    }
}

/// Overwrites the variable or property a path names, mutating instances in
/// place along the way.
pub fn assign(scope: &mut Scope, path: &[String], value: Value) -> Result<(), PathError> {
    let (first, rest) = path.split_first().ok_or(PathError::Empty)?;
    let binding = scope
        .variables
        .get_mut(first)
        .ok_or_else(|| PathError::UnknownVariable(first.clone()))?;

    let mut current = &mut binding.value;
    let mut current_name = first;
    for segment in rest {
        current = match current {
            Value::Instance(instance) => {
                let class_name = instance.class_name.clone();
                &mut instance
                    .properties
                    .get_mut(segment)
                    .ok_or_else(|| PathError::UnknownMember {
                        owner: class_name,
                        member: segment.clone(),
                    })?
                    .value
            }
            _ => return Err(PathError::NotAnInstance(current_name.clone())),
        };
        current_name = segment;
    }

    *current = value;
    Ok(())
}
