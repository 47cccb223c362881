use super::{FunctionType, Type};
use crate::error::Result;
use std::collections::HashMap;

/// The external type-resolution collaborator: turns pending type
/// expressions and qualified function names into fully formed types.
pub trait TypeResolver {
    fn resolve_type(&self, expr: &str) -> Option<Type>;

    fn resolve_function(&self, _name: &str) -> Option<FunctionType> {
        None
    }
}

/// A resolver that knows nothing; any placeholder reaching it is a bug.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl TypeResolver for NoResolver {
    fn resolve_type(&self, _expr: &str) -> Option<Type> {
        None
    }
}

/// In-memory declarations, filled in two phases: declare every name
/// first (bodies may refer to any declared name through
/// `Type::Unresolved`), then resolve lazily on use.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Type>,
    functions: HashMap<String, FunctionType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` as a named type over `underlying` and returns it.
    pub fn declare(&mut self, name: impl Into<String>, underlying: Type) -> Type {
        let name = name.into();
        let ty = Type::named(name.clone(), underlying);
        self.types.insert(name, ty.clone());
        ty
    }

    pub fn declare_alias(&mut self, name: impl Into<String>, aliased: Type) -> Type {
        let name = name.into();
        let ty = Type::alias(name.clone(), aliased);
        self.types.insert(name, ty.clone());
        ty
    }

    pub fn register_function(&mut self, name: impl Into<String>, func: FunctionType) {
        self.functions.insert(name.into(), func);
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionType> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve_type(&self, expr: &str) -> Option<Type> {
        self.types.get(expr).cloned()
    }

    fn resolve_function(&self, name: &str) -> Option<FunctionType> {
        self.functions.get(name).cloned()
    }
}

const MAX_INDIRECTIONS: usize = 32;

/// Replaces a top-level placeholder by what it resolves to. Nested
/// placeholders are left for whoever reaches them.
pub fn resolve_shallow(ty: &Type, resolver: &dyn TypeResolver) -> Result<Type> {
    let mut current = ty.clone();
    for _ in 0..MAX_INDIRECTIONS {
        let expr = match current.unalias() {
            Type::Unresolved(expr) => expr.clone(),
            _ => return Ok(current),
        };
        match resolver.resolve_type(&expr) {
            Some(resolved) => current = resolved,
            None => invariant!("unresolved type `{expr}` reached a structural algorithm"),
        }
    }
    invariant!("type `{ty}` does not resolve to a concrete shape")
}
