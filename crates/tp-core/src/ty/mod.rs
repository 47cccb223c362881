//! The closed set of type shapes the engine reasons about.
//!
//! Types are immutable values. Identity is structural (see `equality.rs`):
//! two separately built `Type`s with the same shape are the same type.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

mod equality;
mod resolve;
mod values;


pub use resolve::{resolve_shallow, NoResolver, TypeRegistry, TypeResolver};

/// Basic type names that accept any value.
pub const ANY_TYPE_NAMES: &[&str] = &["any", "interface"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Empty for an embedded (anonymous) field.
    pub name: String,
    pub ty: Type,
    #[serde(default)]
    pub annotation: String,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            annotation: String::new(),
        }
    }

    pub fn embedded(ty: Type) -> Self {
        Self::new("", ty)
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    pub fn is_embedded(&self) -> bool {
        self.name.is_empty()
    }

    /// The name the field is accessed by. Embedded fields are accessed
    /// through the unqualified name of their type.
    pub fn access_name(&self) -> String {
        if !self.is_embedded() {
            return self.name.clone();
        }
        let mut ty = self.ty.unalias();
        while let Type::Pointer { base, .. } = ty {
            ty = base.unalias();
        }
        let name = match ty {
            Type::Named { name, .. } | Type::Unresolved(name) => name.as_str(),
            Type::Basic(name) => name.as_str(),
            _ => "",
        };
        unqualified(name).to_string()
    }

    /// Value stored under `tag` in an annotation of the form
    /// `key:"value" other:"value"`.
    pub fn tag_value(&self, tag: &str) -> Option<&str> {
        let mut rest = self.annotation.trim();
        while !rest.is_empty() {
            let colon = rest.find(':')?;
            let key = rest[..colon].trim();
            let after = rest[colon + 1..].trim_start();
            let after = after.strip_prefix('"')?;
            let close = after.find('"')?;
            if key == tag {
                return Some(&after[..close]);
            }
            rest = after[close + 1..].trim_start();
        }
        None
    }

    /// Splits the tag value into its leading name and trailing options.
    pub fn tag_options(&self, tag: &str) -> Option<(&str, Vec<&str>)> {
        let value = self.tag_value(tag)?;
        let mut parts = value.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        Some((name, parts.filter(|p| !p.is_empty()).collect()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionType {
    pub receiver: Option<Box<Field>>,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

impl FunctionType {
    pub fn new(params: Vec<Type>, results: Vec<Type>) -> Self {
        let unnamed = |tys: Vec<Type>| tys.into_iter().map(|ty| Field::new("", ty)).collect();
        Self {
            receiver: None,
            params: unnamed(params),
            results: unnamed(results),
        }
    }

    pub fn with_receiver(mut self, receiver: Field) -> Self {
        self.receiver = Some(Box::new(receiver));
        self
    }

    pub fn returns_error(&self) -> bool {
        self.results.iter().any(|r| r.ty.is_error())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Type {
    Basic(String),
    Pointer { base: Box<Type>, depth: usize },
    Slice { elem: Box<Type>, dims: usize },
    FixedArray { elem: Box<Type>, len: usize },
    Map { key: Box<Type>, value: Box<Type> },
    Record(Vec<Field>),
    Function(FunctionType),
    Interface(Vec<Field>),
    Named { name: String, underlying: Box<Type> },
    Alias { name: String, aliased: Box<Type> },
    /// Placeholder for a type the resolver has not filled in yet. It is
    /// identified by the declared name it stands for.
    Unresolved(String),
}

impl Type {
    pub fn basic(name: impl Into<String>) -> Self {
        Type::Basic(name.into())
    }

    pub fn int() -> Self {
        Type::basic("int")
    }

    pub fn string() -> Self {
        Type::basic("string")
    }

    pub fn bool() -> Self {
        Type::basic("bool")
    }

    pub fn error() -> Self {
        Type::basic("error")
    }

    pub fn any() -> Self {
        Type::basic("any")
    }

    /// One more level of indirection; stacked pointers merge their depth.
    pub fn pointer(base: Type) -> Self {
        match base {
            Type::Pointer { base, depth } => Type::Pointer {
                base,
                depth: depth + 1,
            },
            base => Type::Pointer {
                base: Box::new(base),
                depth: 1,
            },
        }
    }

    pub fn pointer_n(base: Type, depth: usize) -> Self {
        (0..depth).fold(base, |ty, _| Type::pointer(ty))
    }

    /// One more sequence dimension; nested slices merge their dims.
    pub fn slice(elem: Type) -> Self {
        match elem {
            Type::Slice { elem, dims } => Type::Slice {
                elem,
                dims: dims + 1,
            },
            elem => Type::Slice {
                elem: Box::new(elem),
                dims: 1,
            },
        }
    }

    pub fn array(elem: Type, len: usize) -> Self {
        Type::FixedArray {
            elem: Box::new(elem),
            len,
        }
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn record(fields: Vec<Field>) -> Self {
        Type::Record(fields)
    }

    pub fn function(params: Vec<Type>, results: Vec<Type>) -> Self {
        Type::Function(FunctionType::new(params, results))
    }

    pub fn interface(methods: Vec<Field>) -> Self {
        Type::Interface(methods)
    }

    pub fn named(name: impl Into<String>, underlying: Type) -> Self {
        Type::Named {
            name: name.into(),
            underlying: Box::new(underlying),
        }
    }

    pub fn alias(name: impl Into<String>, aliased: Type) -> Self {
        Type::Alias {
            name: name.into(),
            aliased: Box::new(aliased),
        }
    }

    pub fn unresolved(expr: impl Into<String>) -> Self {
        Type::Unresolved(expr.into())
    }

    /// Unwraps one Named or Alias level.
    pub fn underlying(&self) -> &Type {
        match self {
            Type::Named { underlying, .. } => underlying,
            Type::Alias { aliased, .. } => aliased,
            other => other,
        }
    }

    /// Unwraps every Named and Alias level.
    pub fn resolved(&self) -> &Type {
        let mut ty = self;
        loop {
            match ty {
                Type::Named { underlying, .. } => ty = underlying,
                Type::Alias { aliased, .. } => ty = aliased,
                other => return other,
            }
        }
    }

    /// Unwraps aliases only; named types keep their identity.
    pub fn unalias(&self) -> &Type {
        let mut ty = self;
        while let Type::Alias { aliased, .. } = ty {
            ty = aliased;
        }
        ty
    }

    /// The pointee after one dereference, `None` if this is not a pointer.
    pub fn deref_once(&self) -> Option<Type> {
        match self.unalias() {
            Type::Pointer { base, depth } if *depth > 1 => Some(Type::Pointer {
                base: base.clone(),
                depth: depth - 1,
            }),
            Type::Pointer { base, .. } => Some((**base).clone()),
            _ => None,
        }
    }

    /// The element after one level of indexing, `None` if not a sequence.
    pub fn index_once(&self) -> Option<Type> {
        match self.unalias() {
            Type::Slice { elem, dims } if *dims > 1 => Some(Type::Slice {
                elem: elem.clone(),
                dims: dims - 1,
            }),
            Type::Slice { elem, .. } | Type::FixedArray { elem, .. } => Some((**elem).clone()),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.resolved(), Type::Pointer { .. })
    }

    pub fn is_basic(&self) -> bool {
        matches!(self.resolved(), Type::Basic(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.unalias(), Type::Basic(name) if name == "error")
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.unalias(), Type::Unresolved(_))
    }

    /// True for shapes whose zero value is a null reference.
    pub fn is_nullable(&self) -> bool {
        match self.resolved() {
            Type::Pointer { .. }
            | Type::Slice { .. }
            | Type::Map { .. }
            | Type::Function(_)
            | Type::Interface(_) => true,
            Type::Basic(name) => name == "error" || ANY_TYPE_NAMES.contains(&name.as_str()),
            _ => false,
        }
    }

    /// Fields of the record this type denotes, looking through named types.
    pub fn record_fields(&self) -> Option<&[Field]> {
        match self.resolved() {
            Type::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Declared name for Named/Alias types.
    pub fn name(&self) -> Option<&str> {
        match self {
            Type::Named { name, .. } | Type::Alias { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The name a placeholder or declared type is identified by.
    pub(crate) fn nominal_name(&self) -> Option<&str> {
        match self {
            Type::Named { name, .. } | Type::Unresolved(name) => Some(name),
            _ => None,
        }
    }
}

pub(crate) fn unqualified(name: &str) -> &str {
    let name = name.rsplit("::").next().unwrap_or(name);
    name.rsplit('.').next().unwrap_or(name)
}

fn write_fields(f: &mut Formatter<'_>, fields: &[Field]) -> fmt::Result {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        if field.is_embedded() {
            write!(f, "{}", field.ty)?;
        } else {
            write!(f, "{}: {}", field.name, field.ty)?;
        }
    }
    Ok(())
}

impl Display for FunctionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "fn")?;
        if let Some(receiver) = &self.receiver {
            write!(f, " [{}]", receiver.ty)?;
        }
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.ty)?;
        }
        write!(f, ")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " -> {}", single.ty),
            results => {
                write!(f, " -> (")?;
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", result.ty)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(name) => write!(f, "{name}"),
            Type::Pointer { base, depth } => write!(f, "{}{}", "*".repeat(*depth), base),
            Type::Slice { elem, dims } => write!(f, "{}{}", "[]".repeat(*dims), elem),
            Type::FixedArray { elem, len } => write!(f, "[{len}]{elem}"),
            Type::Map { key, value } => write!(f, "map[{key}]{value}"),
            Type::Record(fields) => {
                write!(f, "record {{ ")?;
                write_fields(f, fields)?;
                write!(f, " }}")
            }
            Type::Function(func) => write!(f, "{func}"),
            Type::Interface(methods) => {
                write!(f, "interface {{ ")?;
                write_fields(f, methods)?;
                write!(f, " }}")
            }
            Type::Named { name, .. } | Type::Alias { name, .. } => write!(f, "{name}"),
            Type::Unresolved(expr) => write!(f, "?{expr}"),
        }
    }
}
