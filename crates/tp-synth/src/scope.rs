//! Bindings visible while a statement tree is being built.

use crate::names::{preferred_name, unique_name};
use serde::{Deserialize, Serialize};
use tp_core::stmt::Expr;
use tp_core::ty::Type;
use tp_core::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Read,
    Write,
    ReadWrite,
}

impl Mode {
    pub fn can_read(self) -> bool {
        matches!(self, Mode::Read | Mode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, Mode::Write | Mode::ReadWrite)
    }

    /// Whether a binding in this mode serves a request for `wanted`.
    pub fn satisfies(self, wanted: Mode) -> bool {
        (!wanted.can_read() || self.can_read()) && (!wanted.can_write() || self.can_write())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Binding {
    Named(String),
    /// A pure expression with no name of its own.
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub ty: Type,
    pub binding: Binding,
    pub mode: Mode,
    pub visible: bool,
}

impl Variable {
    /// A named variable that still has to be bound into a scope.
    pub fn named(name: impl Into<String>, ty: Type, mode: Mode) -> Self {
        Self {
            ty,
            binding: Binding::Named(name.into()),
            mode,
            visible: false,
        }
    }

    /// A named variable the caller already has in scope (a parameter, a
    /// receiver field, ...).
    pub fn existing(name: impl Into<String>, ty: Type, mode: Mode) -> Self {
        Self {
            visible: true,
            ..Self::named(name, ty, mode)
        }
    }

    pub fn anonymous(expr: Expr, ty: Type) -> Self {
        Self {
            ty,
            binding: Binding::Expr(expr),
            mode: Mode::Read,
            visible: true,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn name(&self) -> Option<&str> {
        match &self.binding {
            Binding::Named(name) => Some(name),
            Binding::Expr(_) => None,
        }
    }

    /// The expression that denotes this variable's value.
    pub fn expr(&self) -> Expr {
        match &self.binding {
            Binding::Named(name) => Expr::ident(name.clone()),
            Binding::Expr(expr) => expr.clone(),
        }
    }

    /// Both are the same named binding.
    pub fn is_same(&self, other: &Variable) -> bool {
        matches!((self.name(), other.name()), (Some(a), Some(b)) if a == b)
    }

    /// A field of this variable, keeping its capability.
    pub fn field(&self, name: &str, ty: Type) -> Variable {
        Variable {
            ty,
            binding: Binding::Expr(self.expr().field(name)),
            mode: self.mode,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    File,
    Function,
    Block,
}

/// How far a lookup may walk outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeBound {
    Local,
    Function,
    File,
}

#[derive(Debug)]
struct ScopeBlock {
    kind: ScopeKind,
    vars: Vec<Variable>,
}

#[derive(Debug)]
pub struct ScopeManager {
    blocks: Vec<ScopeBlock>,
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeManager {
    /// A manager holding only the file scope.
    pub fn new() -> Self {
        Self {
            blocks: vec![ScopeBlock {
                kind: ScopeKind::File,
                vars: Vec::new(),
            }],
        }
    }

    /// A manager positioned inside a fresh function body.
    pub fn for_function() -> Self {
        let mut scope = Self::new();
        scope.enter(ScopeKind::Function);
        scope
    }

    pub fn enter(&mut self, kind: ScopeKind) {
        self.blocks.push(ScopeBlock {
            kind,
            vars: Vec::new(),
        });
    }

    pub fn exit(&mut self) -> Result<()> {
        ensure_invariant!(self.blocks.len() > 1, "cannot leave the file scope");
        self.blocks.pop();
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    /// Every name visible from the innermost block.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks
            .iter()
            .flat_map(|block| block.vars.iter())
            .filter_map(Variable::name)
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Binds a fresh variable into the innermost block, renaming on collision.
    pub fn bind(&mut self, ty: Type, preferred: &str, mode: Mode) -> Variable {
        let name = unique_name(self.names(), preferred);
        let var = Variable {
            ty,
            binding: Binding::Named(name),
            mode,
            visible: true,
        };
        self.push(var.clone());
        var
    }

    /// Like [`bind`](Self::bind), naming the variable after its type.
    pub fn bind_for(&mut self, ty: Type, mode: Mode) -> Variable {
        let preferred = preferred_name(&ty);
        self.bind(ty, &preferred, mode)
    }

    /// Binds a caller-built variable. Named ones may be renamed to stay
    /// unique; anonymous ones need no binding.
    pub fn declare(&mut self, var: &Variable) -> Variable {
        match var.name() {
            Some(name) => self.bind(var.ty.clone(), name, var.mode),
            None => var.clone(),
        }
    }

    /// Registers a variable that already exists in the emitted code under
    /// its own name, without renaming.
    pub fn adopt(&mut self, var: &Variable) -> Variable {
        let mut var = var.clone();
        var.visible = true;
        if let Some(name) = var.name() {
            if !self.is_visible(name) {
                self.push(var.clone());
            }
        }
        var
    }

    fn push(&mut self, var: Variable) {
        if let Some(block) = self.blocks.last_mut() {
            block.vars.push(var);
        }
    }

    /// The innermost, most recently bound variable of type `ty` whose mode
    /// satisfies `mode`, searching no further out than `bound`.
    pub fn lookup(&self, ty: &Type, mode: Mode, bound: ScopeBound) -> Option<&Variable> {
        for block in self.blocks.iter().rev() {
            if let Some(var) = block
                .vars
                .iter()
                .rev()
                .find(|v| v.ty == *ty && v.mode.satisfies(mode))
            {
                return Some(var);
            }
            let stop = match bound {
                ScopeBound::Local => true,
                ScopeBound::Function => block.kind == ScopeKind::Function,
                ScopeBound::File => false,
            };
            if stop {
                break;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bind_renames_on_collision() {
        let mut scope = ScopeManager::for_function();
        let first = scope.bind(Type::int(), "n", Mode::ReadWrite);
        scope.enter(ScopeKind::Block);
        let second = scope.bind(Type::int(), "n", Mode::ReadWrite);
        assert_eq!(first.name(), Some("n"));
        assert_eq!(second.name(), Some("n1"));
        assert!(second.visible);
    }

    #[test]
    fn exit_drops_inner_bindings() -> Result<()> {
        let mut scope = ScopeManager::for_function();
        scope.enter(ScopeKind::Block);
        scope.bind(Type::int(), "n", Mode::Read);
        scope.exit()?;
        assert!(!scope.is_visible("n"));
        assert_eq!(scope.bind(Type::int(), "n", Mode::Read).name(), Some("n"));
        Ok(())
    }

    #[test]
    fn file_scope_cannot_be_left() {
        let mut scope = ScopeManager::new();
        assert!(scope.exit().is_err());
    }

    #[test]
    fn lookup_respects_mode_and_bound() {
        let mut scope = ScopeManager::new();
        scope.bind(Type::string(), "global", Mode::Read);
        scope.enter(ScopeKind::Function);
        scope.bind(Type::int(), "param", Mode::Read);
        scope.enter(ScopeKind::Block);
        scope.bind(Type::int(), "out", Mode::Write);

        let found = scope.lookup(&Type::int(), Mode::Read, ScopeBound::Function);
        assert_eq!(found.and_then(Variable::name), Some("param"));
        let found = scope.lookup(&Type::int(), Mode::Write, ScopeBound::Local);
        assert_eq!(found.and_then(Variable::name), Some("out"));
        assert!(scope.lookup(&Type::int(), Mode::Read, ScopeBound::Local).is_none());
        assert!(scope
            .lookup(&Type::string(), Mode::Read, ScopeBound::Function)
            .is_none());
        let found = scope.lookup(&Type::string(), Mode::Read, ScopeBound::File);
        assert_eq!(found.and_then(Variable::name), Some("global"));
    }

    #[test]
    fn adopt_keeps_the_callers_name() {
        let mut scope = ScopeManager::for_function();
        let src = scope.adopt(&Variable::named("src", Type::int(), Mode::Read));
        assert!(src.visible);
        assert_eq!(src.name(), Some("src"));
        let again = scope.adopt(&src);
        assert_eq!(again.name(), Some("src"));
        assert_eq!(scope.names().count(), 1);
    }

    #[test]
    fn read_write_satisfies_both() {
        assert!(Mode::ReadWrite.satisfies(Mode::Read));
        assert!(Mode::ReadWrite.satisfies(Mode::Write));
        assert!(!Mode::Read.satisfies(Mode::Write));
        assert!(!Mode::Write.satisfies(Mode::ReadWrite));
    }
}
