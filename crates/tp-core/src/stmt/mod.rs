//! Language-neutral statement trees produced by the synthesis engine.
//!
//! Rendering into concrete source text belongs to a printer outside this
//! crate; the `PrettyPrintable` impl here only exists for inspection.

use crate::ty::Type;
use serde::{Deserialize, Serialize};

mod pretty;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident(String),
    Literal(Literal),
    Field {
        base: Box<Expr>,
        name: String,
    },
    Deref(Box<Expr>),
    AddressOf(Box<Expr>),
    Convert {
        ty: Type,
        expr: Box<Expr>,
    },
    Call {
        func: String,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// Zeroed composite value of a record, array, slice or map type.
    Composite(Type),
    /// Zero value of a type with no literal form; the printer decides.
    Zero(Type),
    Index {
        base: Box<Expr>,
        key: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn nil() -> Self {
        Expr::Literal(Literal::Nil)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::Str(value.into()))
    }

    pub fn field(self, name: impl Into<String>) -> Self {
        Expr::Field {
            base: Box::new(self),
            name: name.into(),
        }
    }

    pub fn deref(expr: Expr) -> Self {
        Expr::Deref(Box::new(expr))
    }

    pub fn address_of(expr: Expr) -> Self {
        Expr::AddressOf(Box::new(expr))
    }

    pub fn convert(ty: Type, expr: Expr) -> Self {
        Expr::Convert {
            ty,
            expr: Box::new(expr),
        }
    }

    pub fn call(func: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: func.into(),
            args,
        }
    }

    pub fn method_call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            receiver: Box::new(receiver),
            method: method.into(),
            args,
        }
    }

    pub fn index(base: Expr, key: Expr) -> Self {
        Expr::Index {
            base: Box::new(base),
            key: Box::new(key),
        }
    }

    pub fn not_equal(lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op: BinOp::Ne,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn equal(lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op: BinOp::Eq,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn is_nil(self) -> Self {
        Expr::equal(self, Expr::nil())
    }

    pub fn is_not_nil(self) -> Self {
        Expr::not_equal(self, Expr::nil())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Declares a variable, optionally initialised.
    Declare {
        name: String,
        ty: Type,
        init: Option<Expr>,
    },
    /// Binds the results of `value`; `None` discards that result.
    Define {
        targets: Vec<Option<String>>,
        value: Expr,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    /// Appends `value` to the sequence held by `target`.
    Append {
        target: Expr,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Block,
        otherwise: Option<Block>,
    },
    ForEach {
        item: String,
        over: Expr,
        body: Block,
    },
    /// Returns the error from the enclosing function; other results take
    /// their zero values.
    Return(Expr),
    Expr(Expr),
}

impl Stmt {
    pub fn define(name: impl Into<String>, value: Expr) -> Self {
        Stmt::Define {
            targets: vec![Some(name.into())],
            value,
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Stmt::Assign { target, value }
    }

    pub fn if_then(cond: Expr, then: Block) -> Self {
        Stmt::If {
            cond,
            then,
            otherwise: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

/// What the engine hands to the printing collaborator.
pub type StatementTree = Block;

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    pub fn extend(&mut self, other: Block) {
        self.stmts.extend(other.stmts);
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stmt> {
        self.stmts.iter()
    }

    /// Depth-first walk over every statement, nested ones included.
    pub fn walk(&self) -> Vec<&Stmt> {
        let mut out = Vec::new();
        walk_into(self, &mut out);
        out
    }
}

fn walk_into<'a>(block: &'a Block, out: &mut Vec<&'a Stmt>) {
    for stmt in &block.stmts {
        out.push(stmt);
        match stmt {
            Stmt::If {
                then, otherwise, ..
            } => {
                walk_into(then, out);
                if let Some(otherwise) = otherwise {
                    walk_into(otherwise, out);
                }
            }
            Stmt::ForEach { body, .. } => walk_into(body, out),
            _ => {}
        }
    }
}

impl From<Vec<Stmt>> for Block {
    fn from(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

impl<'a> IntoIterator for &'a Block {
    type Item = &'a Stmt;
    type IntoIter = std::slice::Iter<'a, Stmt>;

    fn into_iter(self) -> Self::IntoIter {
        self.stmts.iter()
    }
}
