#![allow(dead_code)]

use tp_core::ty::{Field, FunctionType, Type};
use tp_synth::{Edge, FunctionRef};

pub fn record(name: &str, fields: Vec<Field>) -> Type {
    Type::named(name, Type::record(fields))
}

pub fn x() -> Type {
    Type::named("X", Type::int())
}

pub fn a() -> Type {
    record("A", vec![Field::new("ID", Type::int())])
}

pub fn b() -> Type {
    record("B", vec![Field::new("x", x())])
}

/// `func ConvertAToB(*A) (*B, error)`
pub fn convert_a_to_b() -> Edge {
    conversion("ConvertAToB", Type::pointer(a()), Type::pointer(b()))
}

/// A registered conversion `name(from) (to, error)`.
pub fn conversion(name: &str, from: Type, to: Type) -> Edge {
    let func = FunctionType::new(vec![from.clone()], vec![to.clone(), Type::error()]);
    Edge::known(from, to, FunctionRef::new(name, func))
}
