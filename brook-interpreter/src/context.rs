//! Runtime context for the Brook interpreter
//!
//! Owns the live scope stack, the call frames and the I/O sinks. Scopes follow
//! the copy-on-enter, merge-on-exit discipline of [`Scope`]: the current scope
//! is always a full copy of its parent and only writes to names the parent
//! already binds survive the exit.

use crate::builtins::BuiltinRegistry;
use crate::config::{InterpreterConfig, Io};
use crate::error::{Result, RuntimeError};
use crate::library::LibraryRegistry;
use brook_parser::Scope;
use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

/// A call frame representing a script function call on the stack
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    /// Name of the function being called
    pub function_name: String,
    /// Type a `return` inside this call is resolved toward
    pub return_type: String,
    /// Whether a mismatched return value is an error
    pub strict_return: bool,
}

impl CallFrame {
    pub fn new(function_name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            return_type: return_type.into(),
            strict_return: true,
        }
    }

    /// The synthetic frame top-level statements run under.
    pub fn main() -> Self {
        Self {
            function_name: "main".to_string(),
            return_type: brook_parser::types::INT.to_string(),
            strict_return: false,
        }
    }
}

/// The main runtime context for the Brook interpreter
pub struct InterpreterContext {
    current: Scope,
    saved: Vec<Scope>,
    call_stack: Vec<CallFrame>,
    max_stack_depth: usize,
    /// Directory script libraries loaded at run time are relative to.
    pub(crate) base_dir: PathBuf,
    pub(crate) builtins: Rc<BuiltinRegistry>,
    pub(crate) libraries: Rc<LibraryRegistry>,
    pub io: Io,
}

impl InterpreterContext {
    pub fn new(
        config: &InterpreterConfig,
        builtins: Rc<BuiltinRegistry>,
        libraries: Rc<LibraryRegistry>,
        io: Io,
    ) -> Self {
        Self {
            current: Scope::new(),
            saved: Vec::new(),
            call_stack: Vec::new(),
            max_stack_depth: config.max_call_depth,
            base_dir: config.base_dir.clone(),
            builtins,
            libraries,
            io,
        }
    }

    // Scope Management

    pub fn scope(&self) -> &Scope {
        &self.current
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.current
    }

    /// Number of scopes above the global one.
    pub fn scope_depth(&self) -> usize {
        self.saved.len()
    }

    /// Enter a child scope that starts as a copy of the current one.
    pub fn push_scope(&mut self) {
        let child = self.current.child();
        self.saved.push(mem::replace(&mut self.current, child));
        tracing::trace!(depth = self.saved.len(), "entered scope");
    }

    /// Leave the current scope, merging its writes back except for the
    /// `shadowed` names it introduced itself. The global scope is never left.
    pub fn pop_scope(&mut self, shadowed: &[String]) {
        let Some(parent) = self.saved.pop() else {
            return;
        };
        let child = mem::replace(&mut self.current, parent);
        self.current.merge_back(child, shadowed);
        tracing::trace!(depth = self.saved.len(), "exited scope");
    }

    /// Close every scope opened above `depth`.
    pub fn close_scopes_to(&mut self, depth: usize) {
        while self.saved.len() > depth {
            self.pop_scope(&[]);
        }
    }

    // Call Stack Management

    /// Push a new call frame onto the stack
    pub fn push_call_frame(&mut self, frame: CallFrame) -> Result<()> {
        if self.call_stack.len() >= self.max_stack_depth {
            return Err(RuntimeError::StackOverflow {
                max_depth: self.max_stack_depth,
            }
            .into());
        }
        self.call_stack.push(frame);
        Ok(())
    }

    pub fn pop_call_frame(&mut self) -> Option<CallFrame> {
        self.call_stack.pop()
    }

    /// Get the current call stack depth
    pub fn call_stack_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Get a reference to the current call frame (top of stack)
    pub fn current_call_frame(&self) -> Option<&CallFrame> {
        self.call_stack.last()
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    /// Get a debug representation of the current state
    pub fn debug_state(&self) -> String {
        format!(
            "InterpreterContext {{\n  call_stack_depth: {},\n  scope_depth: {},\n  variables: {},\n}}",
            self.call_stack.len(),
            self.saved.len(),
            self.current.variables.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Unwind;
    use brook_parser::{Binding, Value};

    fn context(max_call_depth: usize) -> InterpreterContext {
        InterpreterContext::new(
            &InterpreterConfig::default().with_max_call_depth(Some(max_call_depth)),
            Rc::new(BuiltinRegistry::standard()),
            Rc::new(LibraryRegistry::new()),
            Io::new(
                Box::new(std::io::sink()),
                Box::new(std::io::sink()),
                Box::new(std::io::empty()),
            ),
        )
    }

    #[test]
    fn test_child_scope_copies_and_merges() {
        let mut ctx = context(10);
        ctx.scope_mut()
            .declare("x", Binding::new("int", Value::int(1)));

        ctx.push_scope();
        assert_eq!(ctx.scope().variable("x").unwrap().value, Value::int(1));
        ctx.scope_mut().set_variable("x", Value::int(2));
        ctx.scope_mut()
            .declare("inner", Binding::new("int", Value::int(3)));
        ctx.pop_scope(&[]);

        assert_eq!(ctx.scope().variable("x").unwrap().value, Value::int(2));
        assert!(ctx.scope().variable("inner").is_none());
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut ctx = context(10);
        ctx.scope_mut()
            .declare("x", Binding::new("int", Value::int(1)));
        ctx.pop_scope(&[]);
        assert!(ctx.scope().variable("x").is_some());
    }

    #[test]
    fn test_close_scopes_to() {
        let mut ctx = context(10);
        ctx.push_scope();
        ctx.push_scope();
        ctx.push_scope();
        ctx.close_scopes_to(1);
        assert_eq!(ctx.scope_depth(), 1);
    }

    #[test]
    fn test_stack_overflow_protection() {
        let mut ctx = context(2);

        ctx.push_call_frame(CallFrame::new("func1", "int")).unwrap();
        ctx.push_call_frame(CallFrame::new("func2", "int")).unwrap();

        let overflow = ctx.push_call_frame(CallFrame::new("func3", "int"));
        assert!(matches!(overflow, Err(Unwind::Exception(_))));
        assert_eq!(ctx.pop_call_frame().unwrap().function_name, "func2");
    }
}
