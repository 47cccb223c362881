use super::{Field, FunctionType, Type, ANY_TYPE_NAMES};
use std::hash::{Hash, Hasher};

impl Type {
    pub fn equal_to(&self, other: &Type) -> bool {
        self == other
    }

    /// Equality, plus: anything is assignable to an empty interface.
    pub fn assignable_to(&self, target: &Type) -> bool {
        target.accepts_any() || self == target
    }

    pub fn accepts_any(&self) -> bool {
        match self.resolved() {
            Type::Basic(name) => ANY_TYPE_NAMES.contains(&name.as_str()),
            Type::Interface(methods) => methods.is_empty(),
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        let (lhs, rhs) = (self.unalias(), other.unalias());
        match (lhs.nominal_name(), rhs.nominal_name()) {
            (Some(a), Some(b)) => return a == b,
            (Some(_), None) | (None, Some(_)) => return false,
            (None, None) => {}
        }
        match (lhs, rhs) {
            (Type::Basic(a), Type::Basic(b)) => a == b,
            (
                Type::Pointer { base: a, depth: da },
                Type::Pointer { base: b, depth: db },
            ) => da == db && a == b,
            (Type::Slice { elem: a, dims: da }, Type::Slice { elem: b, dims: db }) => {
                da == db && a == b
            }
            (
                Type::FixedArray { elem: a, len: la },
                Type::FixedArray { elem: b, len: lb },
            ) => la == lb && a == b,
            (Type::Map { key: ka, value: va }, Type::Map { key: kb, value: vb }) => {
                ka == kb && va == vb
            }
            (Type::Record(a), Type::Record(b)) => a == b,
            (Type::Function(a), Type::Function(b)) => a == b,
            (Type::Interface(a), Type::Interface(b)) => same_method_set(a, b),
            _ => false,
        }
    }
}

impl Eq for Type {}

fn same_method_set(a: &[Field], b: &[Field]) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|m| b.iter().any(|n| n.name == m.name && n.ty == m.ty))
}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let ty = self.unalias();
        if let Some(name) = ty.nominal_name() {
            0u8.hash(state);
            name.hash(state);
            return;
        }
        match ty {
            Type::Basic(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            Type::Pointer { base, depth } => {
                2u8.hash(state);
                depth.hash(state);
                base.hash(state);
            }
            Type::Slice { elem, dims } => {
                3u8.hash(state);
                dims.hash(state);
                elem.hash(state);
            }
            Type::FixedArray { elem, len } => {
                4u8.hash(state);
                len.hash(state);
                elem.hash(state);
            }
            Type::Map { key, value } => {
                5u8.hash(state);
                key.hash(state);
                value.hash(state);
            }
            Type::Record(fields) => {
                6u8.hash(state);
                fields.hash(state);
            }
            Type::Function(func) => {
                7u8.hash(state);
                func.hash(state);
            }
            Type::Interface(methods) => {
                // order-independent, consistent with `same_method_set`
                8u8.hash(state);
                let mut names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
                names.sort_unstable();
                names.hash(state);
            }
            Type::Named { .. } | Type::Alias { .. } | Type::Unresolved(_) => {}
        }
    }
}

/// Annotations are metadata and never part of a field's identity.
impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ty == other.ty
    }
}

impl Eq for Field {}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.ty.hash(state);
    }
}

/// Parameter and result names do not participate.
impl PartialEq for FunctionType {
    fn eq(&self, other: &Self) -> bool {
        let receivers_match = match (&self.receiver, &other.receiver) {
            (Some(a), Some(b)) => a.ty == b.ty,
            (None, None) => true,
            _ => false,
        };
        receivers_match
            && self.params.len() == other.params.len()
            && self.results.len() == other.results.len()
            && self.params.iter().zip(&other.params).all(|(a, b)| a.ty == b.ty)
            && self.results.iter().zip(&other.results).all(|(a, b)| a.ty == b.ty)
    }
}

impl Eq for FunctionType {}

impl Hash for FunctionType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.receiver.as_ref().map(|r| &r.ty).hash(state);
        self.params.len().hash(state);
        for param in &self.params {
            param.ty.hash(state);
        }
        self.results.len().hash(state);
        for result in &self.results {
            result.ty.hash(state);
        }
    }
}
