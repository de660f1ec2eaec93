// Brook Scope
// Copy-on-enter, merge-on-exit name tables shared by the parser's shadow
// scope and the interpreter's live scope

use crate::ast::{ClassDefinition, MethodDefinition, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub declared_type: String,
    pub value: Value,
}

impl Binding {
    pub fn new(declared_type: impl Into<String>, value: Value) -> Self {
        Self {
            declared_type: declared_type.into(),
            value,
        }
    }
}

/// One level of names. A child is a full copy of its parent; lookups never
/// walk outward, and a child's writes reach the parent only through
/// [`Scope::merge_back`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub variables: IndexMap<String, Binding>,
    pub functions: IndexMap<String, Rc<MethodDefinition>>,
    pub classes: IndexMap<String, Rc<ClassDefinition>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        self.clone()
    }

    pub fn variable(&self, name: &str) -> Option<&Binding> {
        self.variables.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Rc<MethodDefinition>> {
        self.functions.get(name)
    }

    pub fn class(&self, name: &str) -> Option<&Rc<ClassDefinition>> {
        self.classes.get(name)
    }

    /// Binds a new variable. Returns `false` if the name is already bound here.
    pub fn declare(&mut self, name: impl Into<String>, binding: Binding) -> bool {
        let name = name.into();
        if self.variables.contains_key(&name) {
            return false;
        }
        self.variables.insert(name, binding);
        true
    }

    /// Replaces the value of an existing variable.
    pub fn set_variable(&mut self, name: &str, value: Value) -> bool {
        match self.variables.get_mut(name) {
            Some(binding) => {
                binding.value = value;
                true
            }
            None => false,
        }
    }

    pub fn define_function(&mut self, method: Rc<MethodDefinition>) {
        self.functions.insert(method.name.clone(), method);
    }

    pub fn define_class(&mut self, class: Rc<ClassDefinition>) {
        self.classes.insert(class.name.clone(), class);
    }

    /// Writes a finished child's variables back into `self`. Only names the
    /// parent already binds are updated; `shadowed` names were introduced by
    /// the child itself and never overwrite the parent's binding.
    pub fn merge_back(&mut self, child: Scope, shadowed: &[String]) {
        for (name, binding) in child.variables {
            if shadowed.iter().any(|s| *s == name) {
                continue;
            }
            if let Some(existing) = self.variables.get_mut(&name) {
                existing.value = binding.value;
            }
        }
    }

    /// Adds every binding of `other`; later bindings shadow earlier ones.
    pub fn append(&mut self, other: Scope) {
        self.variables.extend(other.variables);
        self.functions.extend(other.functions);
        self.classes.extend(other.classes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope_with(name: &str, value: i64) -> Scope {
        let mut scope = Scope::new();
        scope.declare(name, Binding::new("int", Value::int(value)));
        scope
    }

    #[test]
    fn test_child_declarations_do_not_leak() {
        let mut parent = scope_with("a", 1);
        let mut child = parent.child();
        child.declare("b", Binding::new("int", Value::int(2)));
        parent.merge_back(child, &[]);

        assert!(parent.variable("b").is_none());
    }

    #[test]
    fn test_child_mutation_visible_only_after_merge() {
        let mut parent = scope_with("a", 1);
        let mut child = parent.child();
        child.set_variable("a", Value::int(5));

        assert_eq!(parent.variable("a").unwrap().value, Value::int(1));
        parent.merge_back(child, &[]);
        assert_eq!(parent.variable("a").unwrap().value, Value::int(5));
    }

    #[test]
    fn test_shadowed_names_are_not_merged() {
        let mut parent = scope_with("x", 1);
        let mut child = parent.child();
        child.set_variable("x", Value::int(9));
        parent.merge_back(child, &["x".to_string()]);

        assert_eq!(parent.variable("x").unwrap().value, Value::int(1));
    }

    #[test]
    fn test_declare_rejects_duplicates() {
        let mut scope = scope_with("a", 1);
        assert!(!scope.declare("a", Binding::new("int", Value::int(2))));
    }
}
