//! Turns a found [`Path`] into statements that compute the target value.
//!
//! The walk carries a current value from step to step. Guards and loops
//! open blocks that stay open for the rest of the path (a `Collect` closes
//! the loop its `Index` opened), so every later statement lands inside the
//! branch where the value is known to exist.

use crate::options::{EmissionOptions, ErrorPolicy};
use crate::path::{Edge, FunctionRef, Path, Payload, Step};
use crate::scope::{Mode, ScopeBound, ScopeKind, ScopeManager, Variable};
use frames::{Closed, Frames};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use tp_core::stmt::{Block, Expr, Stmt};
use tp_core::ty::{Field, Type};
use tp_core::Result;

mod frames;


/// The statements realizing a path and the variable holding its result.
#[derive(Debug, Clone, PartialEq)]
pub struct Realized {
    pub block: Block,
    pub output: Variable,
}

/// Realizes `path` from `source` into `destination` (or into a variable
/// of its own when none is given) in a fresh function scope.
pub fn realize(
    path: &Path,
    source: &Variable,
    destination: Option<&Variable>,
    options: &EmissionOptions,
) -> Result<Realized> {
    let mut scope = ScopeManager::for_function();
    let source = scope.adopt(source);
    let destination = destination.map(|dst| {
        if dst.visible {
            scope.adopt(dst)
        } else {
            dst.clone()
        }
    });
    PathRealizer::new(&mut scope, options).realize(path, &source, destination.as_ref())
}

/// Names proven non-null earlier on the path. Copy-on-write so each step
/// hands the next an updated set without touching its own.
#[derive(Debug, Clone, Default)]
struct NonNullSet(Rc<BTreeSet<String>>);

impl NonNullSet {
    fn contains(&self, var: &Variable) -> bool {
        var.name().is_some_and(|name| self.0.contains(name))
    }

    fn with(&self, name: &str) -> Self {
        let mut names = (*self.0).clone();
        names.insert(name.to_string());
        Self(Rc::new(names))
    }
}

#[derive(Debug, Clone)]
struct Cursor {
    value: Variable,
    non_null: NonNullSet,
}

impl Cursor {
    fn advance(self, value: Variable) -> Self {
        Self {
            value,
            non_null: self.non_null,
        }
    }
}

/// Which `Index` opens the loop a `Collect` closes.
struct LoopPlan {
    /// index step -> (collect step, accumulator type)
    accumulators: HashMap<usize, (usize, Type)>,
    closing: BTreeSet<usize>,
    /// collect steps that close a loop not nested in any other
    outermost: BTreeSet<usize>,
}

impl LoopPlan {
    fn new(path: &Path) -> Self {
        let mut plan = LoopPlan {
            accumulators: HashMap::new(),
            closing: BTreeSet::new(),
            outermost: BTreeSet::new(),
        };
        let mut open: Vec<usize> = Vec::new();
        for (i, edge) in path.edges().iter().enumerate() {
            match edge.step {
                Step::Index => open.push(i),
                Step::Collect => match open.pop() {
                    Some(index) => {
                        plan.accumulators.insert(index, (i, edge.to.clone()));
                        plan.closing.insert(i);
                        if open.is_empty() {
                            plan.outermost.insert(i);
                        }
                    }
                    None => {
                        plan.outermost.insert(i);
                    }
                },
                _ => {}
            }
        }
        plan
    }
}

struct Destination {
    var: Variable,
    /// Declared by this realization, so it holds nothing the caller cares about.
    fresh: bool,
    /// Given by the caller, as opposed to synthesized for the output.
    supplied: bool,
}

pub struct PathRealizer<'a> {
    scope: &'a mut ScopeManager,
    options: &'a EmissionOptions,
    frames: Frames,
    accumulators: HashMap<usize, Variable>,
}

impl<'a> PathRealizer<'a> {
    pub fn new(scope: &'a mut ScopeManager, options: &'a EmissionOptions) -> Self {
        Self {
            scope,
            options,
            frames: Frames::default(),
            accumulators: HashMap::new(),
        }
    }

    pub fn scope(&self) -> &ScopeManager {
        &*self.scope
    }

    pub fn realize(
        &mut self,
        path: &Path,
        source: &Variable,
        destination: Option<&Variable>,
    ) -> Result<Realized> {
        ensure_invariant!(
            source.ty == *path.source(),
            "source `{}` does not match the start of path {}",
            source.ty,
            path
        );
        self.frames = Frames::default();
        self.accumulators.clear();

        let plan = LoopPlan::new(path);
        let destination = self.prepare_destination(path, destination)?;
        self.reuse_destination(path, &plan, destination.as_ref());

        let mut cursor = Cursor {
            value: source.clone(),
            non_null: NonNullSet::default(),
        };
        for (idx, edge) in path.edges().iter().enumerate() {
            trace!("realizing step {} ({})", idx, edge);
            cursor = self
                .step(idx, edge, cursor, &plan)
                .map_err(|err| err.context(format!("step {idx} of {path}")))?;
        }
        let output = self.assign_destination(cursor, destination)?;

        while self.frames.depth() > 0 {
            self.close()?;
        }
        let block = std::mem::take(&mut self.frames).into_root()?;
        Ok(Realized { block, output })
    }

    fn prepare_destination(
        &mut self,
        path: &Path,
        destination: Option<&Variable>,
    ) -> Result<Option<Destination>> {
        match destination {
            Some(dst) if dst.visible => Ok(Some(Destination {
                var: dst.clone(),
                fresh: false,
                supplied: true,
            })),
            Some(dst) => {
                let var = self.scope.declare(dst);
                self.declare(&var, None);
                Ok(Some(Destination {
                    var,
                    fresh: true,
                    supplied: true,
                }))
            }
            None if opens_blocks(path) => {
                let var = self.scope.bind_for(path.target().clone(), Mode::ReadWrite);
                self.declare(&var, None);
                Ok(Some(Destination {
                    var,
                    fresh: true,
                    supplied: false,
                }))
            }
            None => Ok(None),
        }
    }

    /// A final outermost `Collect` appends straight into a destination this
    /// realization declared itself.
    fn reuse_destination(&mut self, path: &Path, plan: &LoopPlan, dst: Option<&Destination>) {
        let Some(dst) = dst else { return };
        let last = path.len() - 1;
        let edge = &path.edges()[last];
        let plain = !dst.supplied || !self.options.decorates_assignment();
        if edge.step == Step::Collect
            && plan.outermost.contains(&last)
            && dst.fresh
            && plain
            && dst.var.ty == edge.to
        {
            self.accumulators.insert(last, dst.var.clone());
        }
    }

    fn declare(&mut self, var: &Variable, init: Option<Expr>) {
        if let Some(name) = var.name() {
            self.frames.push(Stmt::Declare {
                name: name.to_string(),
                ty: var.ty.clone(),
                init,
            });
        }
    }

    fn step(&mut self, idx: usize, edge: &Edge, cursor: Cursor, plan: &LoopPlan) -> Result<Cursor> {
        ensure_invariant!(
            cursor.value.ty == edge.from,
            "current value has type `{}` but the edge starts at `{}`",
            cursor.value.ty,
            edge.from
        );
        match edge.step {
            Step::Identity => {
                ensure_invariant!(edge.from == edge.to, "identity edge changes the type");
                Ok(cursor)
            }
            Step::Deref => self.deref(edge, cursor),
            Step::Index => self.index(idx, edge, cursor, plan),
            Step::FieldSelect => {
                let Payload::Field(field) = &edge.payload else {
                    invariant!("field step without a field payload: {:?}", edge.payload);
                };
                let value = Variable::anonymous(cursor.value.expr().field(&field.name), edge.to.clone());
                Ok(cursor.advance(value))
            }
            Step::Invoke => self.invoke(edge, cursor),
            Step::Ref => self.reference(edge, cursor),
            Step::Collect => self.collect(idx, edge, cursor, plan),
            Step::Convert => {
                match &edge.payload {
                    Payload::Target(target) if *target == edge.to => {}
                    Payload::None => {}
                    other => invariant!("convert step with payload {:?}", other),
                }
                let value = Variable::anonymous(
                    Expr::convert(edge.to.clone(), cursor.value.expr()),
                    edge.to.clone(),
                );
                Ok(cursor.advance(value))
            }
        }
    }

    fn deref(&mut self, edge: &Edge, cursor: Cursor) -> Result<Cursor> {
        let value = cursor.value.expr();
        if !cursor.non_null.contains(&cursor.value) {
            match self.options.nil_error.clone() {
                Some(error) => self.handle_error(value.clone().is_nil(), error)?,
                None => self.open_then(value.clone().is_not_nil()),
            }
        }
        let value = Variable::anonymous(Expr::deref(value), edge.to.clone());
        Ok(cursor.advance(value))
    }

    fn index(&mut self, idx: usize, edge: &Edge, cursor: Cursor, plan: &LoopPlan) -> Result<Cursor> {
        if let Some((collect, ty)) = plan.accumulators.get(&idx) {
            if !self.accumulators.contains_key(collect) {
                let acc = self.scope.bind_for(ty.clone(), Mode::ReadWrite);
                self.declare(&acc, None);
                self.accumulators.insert(*collect, acc);
            }
        }
        self.scope.enter(ScopeKind::Block);
        let item = self.scope.bind_for(edge.to.clone(), Mode::Read);
        let name = item.name().unwrap_or_default().to_string();
        self.frames.open_loop(name, cursor.value.expr());
        Ok(cursor.advance(item))
    }

    fn invoke(&mut self, edge: &Edge, cursor: Cursor) -> Result<Cursor> {
        let Payload::Function(func) = &edge.payload else {
            invariant!("invoke step without a function payload: {:?}", edge.payload);
        };
        if cursor.value.ty.is_pointer() && !cursor.non_null.contains(&cursor.value) {
            self.open_then(cursor.value.expr().is_not_nil());
        }
        let call = self.call_expr(func, &cursor.value)?;

        let mut targets = Vec::with_capacity(func.ty.results.len());
        let mut result = None;
        let mut error = None;
        for field in &func.ty.results {
            if result.is_none() && field.ty == edge.to {
                let var = self.scope.bind_for(field.ty.clone(), Mode::ReadWrite);
                targets.push(var.name().map(str::to_string));
                result = Some(var);
            } else if error.is_none() && field.ty.is_error() {
                let var = self.scope.bind(field.ty.clone(), "err", Mode::Read);
                targets.push(var.name().map(str::to_string));
                error = Some(var);
            } else {
                targets.push(None);
            }
        }
        let Some(result) = result else {
            invariant!("`{}` returns no `{}`", func.name, edge.to);
        };
        self.frames.push(Stmt::Define {
            targets,
            value: call,
        });
        if let Some(err) = error {
            self.handle_error(err.expr().is_not_nil(), err.expr())?;
        }
        Ok(cursor.advance(result))
    }

    fn call_expr(&self, func: &FunctionRef, current: &Variable) -> Result<Expr> {
        if let Some(receiver) = &func.ty.receiver {
            ensure_invariant!(
                current.ty.assignable_to(&receiver.ty),
                "`{}` cannot be called on `{}`",
                func.name,
                current.ty
            );
            let args = self.lookup_arguments(func, &func.ty.params)?;
            let method = func.name.rsplit('.').next().unwrap_or(&func.name);
            return Ok(Expr::method_call(current.expr(), method, args));
        }
        let Some((first, rest)) = func.ty.params.split_first() else {
            invariant!("`{}` takes no argument to pass `{}` to", func.name, current.ty);
        };
        ensure_invariant!(
            current.ty.assignable_to(&first.ty),
            "`{}` expects `{}` but the current value is `{}`",
            func.name,
            first.ty,
            current.ty
        );
        let mut args = vec![current.expr()];
        args.extend(self.lookup_arguments(func, rest)?);
        Ok(Expr::call(func.name.clone(), args))
    }

    /// Fills the remaining parameters from what is visible in the function.
    fn lookup_arguments(&self, func: &FunctionRef, params: &[Field]) -> Result<Vec<Expr>> {
        params
            .iter()
            .map(|param| {
                match self.scope.lookup(&param.ty, Mode::Read, ScopeBound::Function) {
                    Some(var) => Ok(var.expr()),
                    None => invariant!(
                        "no `{}` in scope for a parameter of `{}`",
                        param.ty,
                        func.name
                    ),
                }
            })
            .collect()
    }

    fn reference(&mut self, edge: &Edge, cursor: Cursor) -> Result<Cursor> {
        let var = self.scope.bind_for(edge.to.clone(), Mode::Read);
        let name = var.name().unwrap_or_default().to_string();
        self.frames
            .push(Stmt::define(name.clone(), Expr::address_of(cursor.value.expr())));
        Ok(Cursor {
            non_null: cursor.non_null.with(&name),
            value: var,
        })
    }

    fn collect(&mut self, idx: usize, edge: &Edge, cursor: Cursor, plan: &LoopPlan) -> Result<Cursor> {
        let acc = match self.accumulators.remove(&idx) {
            Some(acc) => acc,
            None => {
                let acc = self.scope.bind_for(edge.to.clone(), Mode::ReadWrite);
                self.declare(&acc, None);
                acc
            }
        };
        ensure_invariant!(
            acc.ty == edge.to,
            "accumulator has type `{}`, expected `{}`",
            acc.ty,
            edge.to
        );
        let append = Stmt::Append {
            target: acc.expr(),
            value: cursor.value.expr(),
        };
        if cursor.value.ty.is_pointer() && !cursor.non_null.contains(&cursor.value) {
            self.frames.push(Stmt::if_then(
                cursor.value.expr().is_not_nil(),
                Block::from(vec![append]),
            ));
        } else {
            self.frames.push(append);
        }
        if plan.closing.contains(&idx) {
            self.close_loop()?;
        }
        Ok(cursor.advance(acc))
    }

    fn assign_destination(
        &mut self,
        cursor: Cursor,
        destination: Option<Destination>,
    ) -> Result<Variable> {
        let Some(dst) = destination else {
            return Ok(cursor.value);
        };
        if cursor.value.is_same(&dst.var) {
            return Ok(dst.var);
        }
        ensure_invariant!(
            dst.var.mode.can_write(),
            "destination `{}` is not writable",
            dst.var.expr()
        );
        ensure_invariant!(
            cursor.value.ty.assignable_to(&dst.var.ty),
            "`{}` is not assignable to destination of type `{}`",
            cursor.value.ty,
            dst.var.ty
        );

        let target = dst.var.expr();
        let value = cursor.value.expr();
        let options = self.options;
        let capture = options.capture.as_ref().filter(|_| dst.supplied);

        let mut body = Block::new();
        let captured = |into: &Option<String>, key: &str| {
            into.as_ref().map(|into| {
                Stmt::assign(
                    Expr::index(Expr::ident(into.clone()), Expr::string(key)),
                    target.clone(),
                )
            })
        };
        if let Some(stmt) = capture.and_then(|c| captured(&c.before, &c.key)) {
            body.push(stmt);
        }
        body.push(Stmt::assign(target.clone(), value.clone()));
        if let Some(stmt) = capture.and_then(|c| captured(&c.after, &c.key)) {
            body.push(stmt);
        }

        if dst.supplied && options.diff_check {
            self.frames
                .push(Stmt::if_then(Expr::not_equal(target, value), body));
        } else {
            for stmt in body.stmts {
                self.frames.push(stmt);
            }
        }
        Ok(dst.var)
    }

    /// Emits the configured handling for `error` under `cond`.
    fn handle_error(&mut self, cond: Expr, error: Expr) -> Result<()> {
        let options = self.options;
        self.open_then(cond);
        match &options.error_policy {
            ErrorPolicy::EarlyReturn => {
                self.frames.push(Stmt::Return(error));
                self.close()?;
            }
            ErrorPolicy::WrapWith { function } => {
                self.frames
                    .push(Stmt::Return(Expr::call(function.clone(), vec![error])));
                self.close()?;
            }
            ErrorPolicy::Accumulate { collector } => {
                self.frames.push(Stmt::Append {
                    target: Expr::ident(collector.clone()),
                    value: error,
                });
                self.frames.switch_to_else()?;
                self.scope.exit()?;
                self.scope.enter(ScopeKind::Block);
            }
        }
        Ok(())
    }

    fn open_then(&mut self, cond: Expr) {
        self.scope.enter(ScopeKind::Block);
        self.frames.open_then(cond);
    }

    fn close(&mut self) -> Result<Closed> {
        let closed = self.frames.close()?;
        self.scope.exit()?;
        Ok(closed)
    }

    fn close_loop(&mut self) -> Result<()> {
        while self.close()? != Closed::Loop {}
        Ok(())
    }
}

/// Whether realizing `path` opens a guard or loop that the result must
/// outlive.
fn opens_blocks(path: &Path) -> bool {
    path.edges()
        .iter()
        .any(|e| matches!(e.step, Step::Deref | Step::Index | Step::Invoke))
}
