//! Bounded breadth-first search over single-step type transformations.
//!
//! Nodes are types, edges are [`Edge`]s. From every frontier type the
//! candidates are generated in a fixed priority order: registered (known)
//! edges first, then edges that descend into the type's shape, then edges
//! that wrap it (`Collect` before `Ref`). Within a level the first edge to
//! reach the target wins, so this order decides between equally short
//! paths.

use crate::path::{Edge, FieldRef, Path};
use std::collections::HashSet;
use tp_core::config;
use tp_core::ty::{resolve_shallow, NoResolver, Type, TypeResolver};
use tp_core::{Error, Result};

#[cfg(test)]
mod tests;

/// Number of search levels, the identity edge being level 0. A found path
/// therefore has at most this many edges.
pub const MAX_DEPTH: usize = 7;

/// Finds a path from `source` to `target` using `known` edges alongside
/// the structural ones.
pub fn find_path(source: &Type, target: &Type, known: &[Edge]) -> Result<Path> {
    PathFinder::new()
        .with_known(known.iter().cloned())
        .find(source, target)
}

pub struct PathFinder<'r> {
    known: Vec<Edge>,
    resolver: &'r dyn TypeResolver,
}

impl PathFinder<'static> {
    pub fn new() -> Self {
        Self {
            known: Vec::new(),
            resolver: &NoResolver,
        }
    }
}

impl Default for PathFinder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> PathFinder<'r> {
    pub fn with_known(mut self, edges: impl IntoIterator<Item = Edge>) -> Self {
        self.known.extend(edges);
        self
    }

    /// Placeholders met during the search are filled in through `resolver`.
    pub fn with_resolver<'a>(self, resolver: &'a dyn TypeResolver) -> PathFinder<'a> {
        PathFinder {
            known: self.known,
            resolver,
        }
    }

    pub fn find(&self, source: &Type, target: &Type) -> Result<Path> {
        if source == target {
            return Ok(Path::identity(source.clone()));
        }
        debug!("searching path from `{}` to `{}`", source, target);
        let search = Search::new(self, target);
        match search.run(source) {
            Ok(path) => {
                debug!("found path {}", path);
                Ok(path)
            }
            Err(err) => {
                debug!("{}", err);
                Err(err)
            }
        }
    }

    /// Whether any path exists; resolution failures count as unreachable.
    pub fn reachable(&self, source: &Type, target: &Type) -> bool {
        self.find(source, target).is_ok()
    }
}

struct Node {
    edge: Edge,
    /// Named-to-underlying hop with no runtime effect; folded away when
    /// the path is rebuilt.
    transparent: bool,
    parent: Option<usize>,
}

struct Search<'f, 'r> {
    finder: &'f PathFinder<'r>,
    target: &'f Type,
    nodes: Vec<Node>,
    visited: HashSet<(Type, Type)>,
}

impl<'f, 'r> Search<'f, 'r> {
    fn new(finder: &'f PathFinder<'r>, target: &'f Type) -> Self {
        Self {
            finder,
            target,
            nodes: Vec::new(),
            visited: HashSet::new(),
        }
    }

    fn run(mut self, source: &Type) -> Result<Path> {
        let source = resolve_shallow(source, self.finder.resolver)?;
        self.visited.insert((source.clone(), source.clone()));
        self.nodes.push(Node {
            edge: Edge::identity(source.clone()),
            transparent: false,
            parent: None,
        });

        let mut level = vec![0];
        for depth in 1..MAX_DEPTH {
            let mut next = Vec::new();
            for &parent in &level {
                let from = self.nodes[parent].edge.to.clone();
                for (edge, transparent) in self.expand(&from)? {
                    if !self.visited.insert((edge.from.clone(), edge.to.clone())) {
                        continue;
                    }
                    if config::trace_search() {
                        debug!("level {}: {}", depth, edge);
                    }
                    let reached = edge.to == *self.target;
                    self.nodes.push(Node {
                        edge,
                        transparent,
                        parent: Some(parent),
                    });
                    let id = self.nodes.len() - 1;
                    if reached {
                        return self.rebuild(id);
                    }
                    next.push(id);
                }
            }
            trace!("level {} holds {} edges", depth, next.len());
            if next.is_empty() {
                break;
            }
            level = next;
        }
        Err(Error::not_reachable(
            &source,
            self.target,
            MAX_DEPTH,
            self.nodes.len(),
        ))
    }

    /// Candidate edges out of `ty`, in priority order.
    fn expand(&self, ty: &Type) -> Result<Vec<(Edge, bool)>> {
        let resolver = self.finder.resolver;
        let ty = resolve_shallow(ty, resolver)?;
        let mut out = Vec::new();

        for known in &self.finder.known {
            if known.from == ty {
                out.push((known.clone(), false));
            }
        }

        match ty.unalias() {
            Type::Named { underlying, .. } => {
                let under = resolve_shallow(underlying, resolver)?;
                match under.unalias() {
                    Type::Named { .. } | Type::Basic(_) => {
                        out.push((Edge::convert(ty.clone(), under), false))
                    }
                    _ => out.push((Edge::convert(ty.clone(), under), true)),
                }
            }
            Type::Pointer { .. } => {
                if let Some(to) = ty.deref_once() {
                    out.push((Edge::deref(ty.clone(), resolve_shallow(&to, resolver)?), false));
                }
            }
            Type::Slice { .. } | Type::FixedArray { .. } => {
                if let Some(to) = ty.index_once() {
                    out.push((Edge::index(ty.clone(), resolve_shallow(&to, resolver)?), false));
                }
            }
            Type::Record(fields) => {
                for (index, field) in fields.iter().enumerate() {
                    let field = FieldRef {
                        name: field.access_name(),
                        ty: resolve_shallow(&field.ty, resolver)?,
                        index,
                    };
                    out.push((Edge::field(ty.clone(), field), false));
                }
            }
            _ => {}
        }

        out.push((Edge::collect(ty.clone()), false));
        out.push((Edge::reference(ty), false));
        Ok(out)
    }

    fn rebuild(&self, id: usize) -> Result<Path> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(idx) = cursor {
            chain.push(&self.nodes[idx]);
            cursor = self.nodes[idx].parent;
        }
        chain.reverse();

        let last = chain.len() - 1;
        let mut edges = Vec::with_capacity(chain.len());
        let mut pending_from: Option<Type> = None;
        for (i, node) in chain.into_iter().enumerate() {
            let mut edge = node.edge.clone();
            if node.transparent && i != last {
                pending_from.get_or_insert(edge.from);
                continue;
            }
            if let Some(from) = pending_from.take() {
                edge.from = from;
            }
            edges.push(edge);
        }
        Path::new(edges)
    }
}
