//! Record-to-record composition.
//!
//! Each side is first reduced to its holder (a record, or one pointer over
//! a record). The destination is then filled by the first strategy that
//! applies: unwrap a source field that already reaches the destination,
//! nest the whole source into a destination field, or pair fields by
//! normalized name and realize a path for every pair.

use crate::finder::PathFinder;
use crate::options::EmissionOptions;
use crate::path::{Edge, Path, Step};
use crate::realize::PathRealizer;
use crate::scope::{Mode, ScopeKind, ScopeManager, Variable};
use fields::{flatten, record_fields, FlatField};
use std::collections::HashMap;
use tp_core::config;
use tp_core::diagnostics::{Diagnostic, DiagnosticBag};
use tp_core::stmt::{Block, Expr, Stmt};
use tp_core::ty::{resolve_shallow, NoResolver, Type, TypeResolver};
use tp_core::{Error, Result};

mod fields;


/// Statements filling the destination, plus what was left out on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub block: Block,
    pub diagnostics: DiagnosticBag,
}

/// Composes `destination` from `source`, matching fields by their name
/// under annotation `tag`. Skipped fields are logged.
pub fn compose_records(
    source: &Variable,
    destination: &Variable,
    tag: &str,
    known: &[Edge],
) -> Result<Block> {
    let composition = RecordComposer::new(tag)
        .with_known(known.iter().cloned())
        .compose(source, destination)?;
    for diagnostic in &composition.diagnostics {
        warn!("{}", diagnostic);
    }
    Ok(composition.block)
}

/// A record-shaped side reduced to its holder.
struct Shape {
    holder: Type,
    /// The record under the holder's pointer, if any.
    core: Type,
    fields: Vec<FlatField>,
}

enum Strategy {
    /// `destination = source.field`
    Unwrap(FlatField, Path),
    /// `destination.field = source`
    Nest(FlatField),
    Pairwise,
}

pub struct RecordComposer<'r> {
    tag: String,
    known: Vec<Edge>,
    options: EmissionOptions,
    resolver: &'r dyn TypeResolver,
    strict: bool,
}

impl RecordComposer<'static> {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            known: Vec::new(),
            options: EmissionOptions::default(),
            resolver: &NoResolver,
            strict: config::strict_fields(),
        }
    }
}

impl<'r> RecordComposer<'r> {
    pub fn with_known(mut self, edges: impl IntoIterator<Item = Edge>) -> Self {
        self.known.extend(edges);
        self
    }

    pub fn with_options(mut self, options: EmissionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_resolver<'a>(self, resolver: &'a dyn TypeResolver) -> RecordComposer<'a> {
        RecordComposer {
            tag: self.tag,
            known: self.known,
            options: self.options,
            resolver,
            strict: self.strict,
        }
    }

    /// Treat every destination field as required.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn compose(&self, source: &Variable, destination: &Variable) -> Result<Composition> {
        let mut scope = ScopeManager::for_function();
        let source = scope.adopt(source);
        let destination = if destination.visible {
            scope.adopt(destination)
        } else {
            destination.clone()
        };
        self.compose_in(&mut scope, &source, &destination)
    }

    /// Composes inside a caller-owned scope so generated names stay unique
    /// across several compositions in one function.
    pub fn compose_in(
        &self,
        scope: &mut ScopeManager,
        source: &Variable,
        destination: &Variable,
    ) -> Result<Composition> {
        ensure_invariant!(
            source.visible,
            "composition source `{}` is not in scope",
            source.expr()
        );
        let src = self.shape(&source.ty)?;
        let dst = self.shape(&destination.ty)?;
        let strategy = self.choose(source, destination, src.as_ref(), dst.as_ref())?;

        let mut run = Run {
            composer: self,
            scope,
            block: Block::new(),
            diagnostics: DiagnosticBag::new(),
            source,
            destination,
        };
        match (strategy, src, dst) {
            (Strategy::Unwrap(field, path), Some(src), _) => {
                debug!("composing `{}` from its field `{}`", destination.ty, field.label);
                let holder = run.source_holder(&src)?;
                run.guarded(&holder, |run| {
                    let from = field.member_of(&holder, Mode::Read);
                    run.realize(&path, &from, Some(destination), &field.label)
                })?;
            }
            (Strategy::Nest(field), _, Some(dst)) => {
                debug!("nesting `{}` into field `{}`", source.ty, field.label);
                let (holder, stands_in) = run.destination_holder(&dst)?;
                let into = field.member_of(&holder, Mode::ReadWrite);
                let path = self.finder(true).find(&source.ty, &field.ty)?;
                run.realize(&path, source, Some(&into), &field.label)?;
                if stands_in {
                    run.write_back(&holder)?;
                }
            }
            (Strategy::Pairwise, Some(src), Some(dst)) => {
                debug!("pairing fields of `{}` and `{}`", source.ty, destination.ty);
                let from = run.source_holder(&src)?;
                let (into, stands_in) = run.destination_holder(&dst)?;
                run.guarded(&from, |run| run.pair_fields(&from, &into, &src, &dst))?;
                if stands_in {
                    run.write_back(&into)?;
                }
            }
            _ => invariant!("composition strategy does not match the record shapes"),
        }
        Ok(Composition {
            block: run.block,
            diagnostics: run.diagnostics,
        })
    }

    fn finder(&self, with_known: bool) -> PathFinder<'r> {
        let known = if with_known { self.known.clone() } else { Vec::new() };
        PathFinder::new().with_known(known).with_resolver(self.resolver)
    }

    fn shape(&self, ty: &Type) -> Result<Option<Shape>> {
        let ty = resolve_shallow(ty, self.resolver)?;
        let (holder, core) = match ty.resolved() {
            Type::Pointer { base, .. } => {
                let core = resolve_shallow(base, self.resolver)?;
                (Type::pointer(core.clone()), core)
            }
            _ => (ty.clone(), ty.clone()),
        };
        let Some(fields) = record_fields(&core, self.resolver)? else {
            return Ok(None);
        };
        Ok(Some(Shape {
            holder,
            core,
            fields: flatten(&fields, &self.tag, self.resolver)?,
        }))
    }

    /// A path that only changes indirection or converts between a named
    /// type and its underlying shape.
    fn direct_path(&self, from: &Type, to: &Type) -> Option<Path> {
        self.finder(false).find(from, to).ok().filter(|path| {
            path.steps().iter().all(|step| {
                matches!(step, Step::Identity | Step::Deref | Step::Ref | Step::Convert)
            })
        })
    }

    fn choose(
        &self,
        source: &Variable,
        destination: &Variable,
        src: Option<&Shape>,
        dst: Option<&Shape>,
    ) -> Result<Strategy> {
        let same_core = matches!((src, dst), (Some(s), Some(d)) if s.core == d.core);
        if !same_core {
            if let Some(src) = src {
                for field in &src.fields {
                    if let Some(path) = self.direct_path(&field.ty, &destination.ty) {
                        return Ok(Strategy::Unwrap(field.clone(), path));
                    }
                }
            }
            if let Some(dst) = dst {
                if let Some(field) = dst
                    .fields
                    .iter()
                    .find(|field| self.direct_path(&source.ty, &field.ty).is_some())
                {
                    return Ok(Strategy::Nest(field.clone()));
                }
            }
        }
        if src.is_some() && dst.is_some() {
            return Ok(Strategy::Pairwise);
        }
        let reason = match (src, dst) {
            (None, None) => "neither side is a record",
            (Some(_), _) => "no source field reaches the destination",
            (_, Some(_)) => "no destination field accepts the source",
        };
        Err(self.failure(source, destination, "", "", reason))
    }

    fn failure(
        &self,
        source: &Variable,
        destination: &Variable,
        field: &str,
        field_type: impl ToString,
        reason: impl Into<String>,
    ) -> Error {
        Error::CompositionFailure {
            source_type: source.ty.to_string(),
            destination_type: destination.ty.to_string(),
            field: field.to_string(),
            field_type: field_type.to_string(),
            reason: reason.into(),
        }
    }
}

/// State of one composition while statements are emitted.
struct Run<'c, 'r, 's> {
    composer: &'c RecordComposer<'r>,
    scope: &'s mut ScopeManager,
    block: Block,
    diagnostics: DiagnosticBag,
    source: &'c Variable,
    destination: &'c Variable,
}

impl Run<'_, '_, '_> {
    /// The source as its holder, converting into a fresh variable when
    /// the source has more indirection than the holder.
    fn source_holder(&mut self, shape: &Shape) -> Result<Variable> {
        if self.source.ty == shape.holder {
            return Ok(self.source.clone());
        }
        let holder = self.scope.bind_for(shape.holder.clone(), Mode::ReadWrite);
        self.declare(&holder, None);
        let path = self.composer.finder(false).find(&self.source.ty, &shape.holder)?;
        let source = self.source;
        self.realize(&path, source, Some(&holder), "")?;
        Ok(holder)
    }

    /// The variable destination fields are written through, and whether it
    /// stands in for the destination and must be assigned back by
    /// [`write_back`](Self::write_back).
    fn destination_holder(&mut self, shape: &Shape) -> Result<(Variable, bool)> {
        let destination = self.destination;
        if destination.ty == shape.holder {
            if destination.visible {
                return Ok((destination.clone(), false));
            }
            let holder = self.scope.declare(destination);
            self.declare(&holder, Some(shape.holder.init_value()?));
            return Ok((holder, false));
        }
        let holder = self.scope.bind_for(shape.holder.clone(), Mode::ReadWrite);
        self.declare(&holder, Some(shape.holder.init_value()?));
        Ok((holder, true))
    }

    fn write_back(&mut self, holder: &Variable) -> Result<()> {
        let destination = self.destination;
        let path = self.composer.finder(true).find(&holder.ty, &destination.ty)?;
        let holder = holder.clone().with_mode(Mode::Read);
        self.realize(&path, &holder, Some(destination), "")
    }

    /// Runs `emit` inside `if holder != nil` when the holder is a pointer.
    fn guarded(
        &mut self,
        holder: &Variable,
        emit: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        if !holder.ty.is_pointer() {
            return emit(self);
        }
        let outer = std::mem::take(&mut self.block);
        self.scope.enter(ScopeKind::Block);
        let emitted = emit(self);
        self.scope.exit()?;
        let body = std::mem::replace(&mut self.block, outer);
        emitted?;
        self.block.push(Stmt::if_then(holder.expr().is_not_nil(), body));
        Ok(())
    }

    fn pair_fields(
        &mut self,
        from: &Variable,
        into: &Variable,
        src: &Shape,
        dst: &Shape,
    ) -> Result<()> {
        let by_key: HashMap<&str, &FlatField> =
            src.fields.iter().map(|f| (f.key.as_str(), f)).collect();
        let mut paired = 0;
        for field in &dst.fields {
            let Some(matched) = by_key.get(field.key.as_str()) else {
                self.unmatched(field)?;
                continue;
            };
            let path = match self.composer.finder(true).find(&matched.ty, &field.ty) {
                Ok(path) => path,
                Err(err) if err.is_not_reachable() => {
                    return Err(self.composer.failure(
                        self.source,
                        self.destination,
                        &field.label,
                        &field.ty,
                        format!("no path from source field type `{}`", matched.ty),
                    ));
                }
                Err(err) => return Err(err.context(format!("field `{}`", field.label))),
            };
            trace!("field `{}` via {}", field.label, path);
            let value = matched.member_of(from, Mode::Read);
            let target = field.member_of(into, Mode::ReadWrite);
            self.realize(&path, &value, Some(&target), &field.label)?;
            paired += 1;
        }
        if let (0, Some(first)) = (paired, dst.fields.first()) {
            return Err(self.composer.failure(
                self.source,
                self.destination,
                &first.label,
                &first.ty,
                "no destination field matches a source field",
            ));
        }
        Ok(())
    }

    fn unmatched(&mut self, field: &FlatField) -> Result<()> {
        if field.required || self.composer.strict {
            return Err(self.composer.failure(
                self.source,
                self.destination,
                &field.label,
                &field.ty,
                "no source field matches",
            ));
        }
        self.diagnostics.push(
            Diagnostic::warning(format!(
                "destination field `{}` of `{}` has no source field in `{}`; left untouched",
                field.label, self.destination.ty, self.source.ty
            ))
            .with_source_context("composition")
            .with_suggestion("add `,required` to its annotation to make this an error"),
        );
        Ok(())
    }

    /// Realizes `path` with the composer's options, keying captures by
    /// `label` when there is one.
    fn realize(
        &mut self,
        path: &Path,
        source: &Variable,
        destination: Option<&Variable>,
        label: &str,
    ) -> Result<()> {
        let mut options = self.composer.options.clone();
        if let Some(capture) = options.capture.as_mut() {
            if !label.is_empty() {
                capture.key = label.to_string();
            }
        }
        let realized = PathRealizer::new(self.scope, &options)
            .realize(path, source, destination)
            .map_err(|err| {
                if label.is_empty() {
                    err
                } else {
                    err.context(format!("field `{label}`"))
                }
            })?;
        self.block.extend(realized.block);
        Ok(())
    }

    fn declare(&mut self, var: &Variable, init: Option<Expr>) {
        if let Some(name) = var.name() {
            self.block.push(Stmt::Declare {
                name: name.to_string(),
                ty: var.ty.clone(),
                init,
            });
        }
    }
}
