use super::Type;
use crate::error::Result;
use crate::stmt::{Expr, Literal};

const INTEGER_NAMES: &[&str] = &[
    "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
    "uintptr", "byte", "rune", "complex64", "complex128",
];
const FLOAT_NAMES: &[&str] = &["float32", "float64"];

fn basic_default(name: &str, ty: &Type) -> Expr {
    match name {
        name if INTEGER_NAMES.contains(&name) => Expr::Literal(Literal::Int(0)),
        name if FLOAT_NAMES.contains(&name) => Expr::Literal(Literal::Float(0.0)),
        "string" => Expr::Literal(Literal::Str(String::new())),
        "bool" => Expr::Literal(Literal::Bool(false)),
        "error" | "any" | "interface" => Expr::nil(),
        _ => Expr::Zero(ty.clone()),
    }
}

impl Type {
    /// The zero value of this type.
    pub fn default_value(&self) -> Result<Expr> {
        match self {
            Type::Basic(name) => Ok(basic_default(name, self)),
            Type::Pointer { .. }
            | Type::Slice { .. }
            | Type::Map { .. }
            | Type::Function(_)
            | Type::Interface(_) => Ok(Expr::nil()),
            Type::Record(_) | Type::FixedArray { .. } => Ok(Expr::Composite(self.clone())),
            Type::Named { underlying, .. } | Type::Alias { aliased: underlying, .. } => {
                let shape = underlying.resolved();
                match shape {
                    Type::Basic(_) => Ok(Expr::convert(self.clone(), shape.default_value()?)),
                    Type::Record(_) | Type::FixedArray { .. } => Ok(Expr::Composite(self.clone())),
                    Type::Unresolved(expr) => {
                        invariant!("zero value requested for unresolved type `{expr}`")
                    }
                    _ => Ok(Expr::nil()),
                }
            }
            Type::Unresolved(expr) => invariant!("zero value requested for unresolved type `{expr}`"),
        }
    }

    /// A usable, non-placeholder instance: empty collections instead of
    /// null ones, and the address of a zeroed value for single-level
    /// pointers to non-basic types.
    pub fn init_value(&self) -> Result<Expr> {
        match self.resolved() {
            Type::Slice { .. } | Type::Map { .. } | Type::FixedArray { .. } => {
                Ok(Expr::Composite(self.clone()))
            }
            Type::Pointer { base, depth } => {
                if base.is_unresolved() {
                    invariant!("init value requested for pointer to unresolved `{base}`");
                }
                if *depth > 1 || base.is_basic() {
                    Ok(Expr::nil())
                } else {
                    Ok(Expr::address_of(Expr::Composite((**base).clone())))
                }
            }
            _ => self.default_value(),
        }
    }
}
