use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use tp_core::ty::{FunctionType, Type};
use tp_core::Result;

/// The closed vocabulary of single-step transformations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum Step {
    #[display("identity")]
    Identity,
    #[display("deref")]
    Deref,
    #[display("index")]
    Index,
    #[display("field")]
    FieldSelect,
    #[display("invoke")]
    Invoke,
    #[display("ref")]
    Ref,
    #[display("collect")]
    Collect,
    #[display("convert")]
    Convert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Name the field is accessed by.
    pub name: String,
    pub ty: Type,
    /// Position in the declaring record.
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRef {
    /// Qualified name used at the call site.
    pub name: String,
    pub ty: FunctionType,
}

impl FunctionRef {
    pub fn new(name: impl Into<String>, ty: FunctionType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
pub enum Payload {
    #[from(ignore)]
    None,
    Field(FieldRef),
    Function(FunctionRef),
    Target(Type),
}

/// One transformation from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: Type,
    pub to: Type,
    pub step: Step,
    pub payload: Payload,
}

impl Edge {
    pub fn new(from: Type, to: Type, step: Step, payload: impl Into<Payload>) -> Self {
        Self {
            from,
            to,
            step,
            payload: payload.into(),
        }
    }

    fn bare(from: Type, to: Type, step: Step) -> Self {
        Self {
            from,
            to,
            step,
            payload: Payload::None,
        }
    }

    pub fn identity(ty: Type) -> Self {
        Self::bare(ty.clone(), ty, Step::Identity)
    }

    /// A caller-registered conversion through `function`.
    pub fn known(from: Type, to: Type, function: FunctionRef) -> Self {
        Self::new(from, to, Step::Invoke, function)
    }

    pub fn deref(from: Type, to: Type) -> Self {
        Self::bare(from, to, Step::Deref)
    }

    pub fn index(from: Type, to: Type) -> Self {
        Self::bare(from, to, Step::Index)
    }

    pub fn field(from: Type, field: FieldRef) -> Self {
        let to = field.ty.clone();
        Self::new(from, to, Step::FieldSelect, field)
    }

    pub fn collect(from: Type) -> Self {
        let to = Type::slice(from.clone());
        Self::bare(from, to, Step::Collect)
    }

    pub fn reference(from: Type) -> Self {
        let to = Type::pointer(from.clone());
        Self::bare(from, to, Step::Ref)
    }

    pub fn convert(from: Type, to: Type) -> Self {
        let target = to.clone();
        Self::new(from, to, Step::Convert, target)
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Field(field) => write!(f, "{} -{}({})-> {}", self.from, self.step, field.name, self.to),
            Payload::Function(func) => write!(f, "{} -{}({})-> {}", self.from, self.step, func.name, self.to),
            Payload::Target(_) | Payload::None => write!(f, "{} -{}-> {}", self.from, self.step, self.to),
        }
    }
}

/// An ordered, connected chain of edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Edge>", into = "Vec<Edge>")]
pub struct Path {
    edges: Vec<Edge>,
}

impl Path {
    /// Builds a path, checking that each edge starts where the previous ended.
    pub fn new(edges: Vec<Edge>) -> Result<Self> {
        if edges.is_empty() {
            invariant!("a path needs at least one edge");
        }
        for (i, pair) in edges.windows(2).enumerate() {
            if pair[0].to != pair[1].from {
                invariant!(
                    "edge {} ends at `{}` but edge {} starts at `{}`",
                    i,
                    pair[0].to,
                    i + 1,
                    pair[1].from
                );
            }
        }
        Ok(Self { edges })
    }

    pub fn identity(ty: Type) -> Self {
        Self {
            edges: vec![Edge::identity(ty)],
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn steps(&self) -> Vec<Step> {
        self.edges.iter().map(|e| e.step).collect()
    }

    pub fn source(&self) -> &Type {
        &self.edges[0].from
    }

    pub fn target(&self) -> &Type {
        &self.edges[self.edges.len() - 1].to
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn is_identity(&self) -> bool {
        self.steps() == [Step::Identity]
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let hops = self.edges[1..]
            .iter()
            .format_with("", |edge, f| f(&format_args!(" -{}-> {}", edge.step, edge.to)));
        write!(f, "{}{}", self.source(), hops)
    }
}

impl TryFrom<Vec<Edge>> for Path {
    type Error = tp_core::Error;

    fn try_from(edges: Vec<Edge>) -> Result<Self> {
        Path::new(edges)
    }
}

impl From<Path> for Vec<Edge> {
    fn from(path: Path) -> Self {
        path.edges
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Edge;
    type IntoIter = std::slice::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}
