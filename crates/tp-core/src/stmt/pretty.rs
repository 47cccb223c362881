use super::{BinOp, Block, Expr, Literal, Stmt};
use crate::pretty::{pretty, PrettyCtx, PrettyOptions, PrettyPrintable};
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Nil => write!(f, "nil"),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value:?}"),
            Literal::Str(value) => write!(f, "{value:?}"),
        }
    }
}

fn is_compound(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Deref(_) | Expr::AddressOf(_) | Expr::Binary { .. }
    )
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{name}"),
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::Field { base, name } if is_compound(base) => write!(f, "({base}).{name}"),
            Expr::Field { base, name } => write!(f, "{base}.{name}"),
            Expr::Deref(inner) if is_compound(inner) => write!(f, "*({inner})"),
            Expr::Deref(inner) => write!(f, "*{inner}"),
            Expr::AddressOf(inner) => write!(f, "&{inner}"),
            Expr::Convert { ty, expr } => write!(f, "{ty}({expr})"),
            Expr::Call { func, args } => write!(f, "{func}({})", args.iter().join(", ")),
            Expr::MethodCall {
                receiver,
                method,
                args,
            } => write!(f, "{receiver}.{method}({})", args.iter().join(", ")),
            Expr::Composite(ty) => write!(f, "{ty} {{}}"),
            Expr::Zero(ty) => write!(f, "zero({ty})"),
            Expr::Index { base, key } => write!(f, "{base}[{key}]"),
            Expr::Binary { op, lhs, rhs } => {
                let op = match op {
                    BinOp::Eq => "==",
                    BinOp::Ne => "!=",
                };
                write!(f, "{lhs} {op} {rhs}")
            }
        }
    }
}

fn fmt_block(block: &Block, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
    ctx.with_indent(|ctx| {
        for stmt in &block.stmts {
            stmt.fmt_pretty(f, ctx)?;
        }
        Ok(())
    })
}

impl PrettyPrintable for Stmt {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        match self {
            Stmt::Declare { name, ty, init } => {
                let mut line = format!("let {name}");
                if ctx.options.show_types {
                    line.push_str(&format!(": {ty}"));
                }
                if let Some(init) = init {
                    line.push_str(&format!(" = {init}"));
                }
                ctx.writeln(f, line)
            }
            Stmt::Define { targets, value } => {
                let names = targets
                    .iter()
                    .map(|t| t.as_deref().unwrap_or("_"))
                    .collect::<Vec<_>>();
                match names.as_slice() {
                    [single] => ctx.writeln(f, format!("let {single} = {value}")),
                    many => ctx.writeln(f, format!("let ({}) = {value}", many.join(", "))),
                }
            }
            Stmt::Assign { target, value } => ctx.writeln(f, format!("{target} = {value}")),
            Stmt::Append { target, value } => ctx.writeln(f, format!("{target}.push({value})")),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                ctx.writeln(f, format!("if {cond} {{"))?;
                fmt_block(then, f, ctx)?;
                if let Some(otherwise) = otherwise {
                    ctx.writeln(f, "} else {")?;
                    fmt_block(otherwise, f, ctx)?;
                }
                ctx.writeln(f, "}")
            }
            Stmt::ForEach { item, over, body } => {
                ctx.writeln(f, format!("for {item} in {over} {{"))?;
                fmt_block(body, f, ctx)?;
                ctx.writeln(f, "}")
            }
            Stmt::Return(expr) => ctx.writeln(f, format!("return {expr}")),
            Stmt::Expr(expr) => ctx.writeln(f, format!("{expr}")),
        }
    }
}

impl PrettyPrintable for Block {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        for stmt in &self.stmts {
            stmt.fmt_pretty(f, ctx)?;
        }
        Ok(())
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        pretty(self, PrettyOptions::default()).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Type;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_nested_blocks() {
        let block = Block::from(vec![
            Stmt::Declare {
                name: "out".into(),
                ty: Type::slice(Type::int()),
                init: None,
            },
            Stmt::ForEach {
                item: "i".into(),
                over: Expr::ident("values"),
                body: Block::from(vec![Stmt::if_then(
                    Expr::ident("i").is_not_nil(),
                    Block::from(vec![Stmt::Append {
                        target: Expr::ident("out"),
                        value: Expr::deref(Expr::ident("i")),
                    }]),
                )]),
            },
        ]);
        assert_eq!(
            block.to_string(),
            "let out: []int\n\
             for i in values {\n    \
                 if i != nil {\n        \
                     out.push(*i)\n    \
                 }\n\
             }\n"
        );
    }

    #[test]
    fn hides_types_when_asked() {
        let block = Block::from(vec![
            Stmt::Declare {
                name: "n".into(),
                ty: Type::int(),
                init: Some(Expr::Literal(Literal::Int(0))),
            },
            Stmt::Define {
                targets: vec![Some("b".into()), None],
                value: Expr::call("Convert", vec![Expr::ident("a")]),
            },
        ]);
        let options = PrettyOptions {
            show_types: false,
            ..PrettyOptions::default()
        };
        assert_eq!(
            pretty(&block, options).to_string(),
            "let n = 0\nlet (b, _) = Convert(a)\n"
        );
    }

    #[test]
    fn string_keys_are_quoted_and_escaped() {
        let expr = Expr::index(Expr::ident("changes"), Expr::string("say \"hi\"\n"));
        assert_eq!(expr.to_string(), r#"changes["say \"hi\"\n"]"#);
    }

    #[test]
    fn parenthesises_compound_bases() {
        let expr = Expr::deref(Expr::ident("p")).field("name");
        assert_eq!(expr.to_string(), "(*p).name");
        let expr = Expr::deref(Expr::address_of(Expr::ident("v")));
        assert_eq!(expr.to_string(), "*(&v)");
    }
}
