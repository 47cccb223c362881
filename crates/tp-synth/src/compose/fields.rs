use crate::scope::{Mode, Variable};
use std::collections::HashSet;
use tp_core::stmt::Expr;
use tp_core::ty::{resolve_shallow, Field, Type, TypeResolver};
use tp_core::Result;

const MAX_EMBEDDING: usize = 16;
const REQUIRED: &str = "required";
const SKIP: &str = "-";

/// A field as the composer matches it: embedded records are flattened
/// into their parent, and the annotation may rename it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FlatField {
    /// Name used for matching and reporting.
    pub label: String,
    /// `label` lowercased with underscores removed.
    pub key: String,
    /// Field names leading from the record to this field.
    pub chain: Vec<String>,
    pub ty: Type,
    pub required: bool,
}

impl FlatField {
    /// The field read or written through `holder`.
    pub fn member_of(&self, holder: &Variable, mode: Mode) -> Variable {
        let base = if holder.ty.is_pointer() {
            Expr::deref(holder.expr())
        } else {
            holder.expr()
        };
        let expr = self.chain.iter().fold(base, |expr, name| expr.field(name.clone()));
        Variable::anonymous(expr, self.ty.clone()).with_mode(mode)
    }
}

pub(crate) fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// The record fields `ty` denotes once named types and placeholders are
/// looked through, `None` for any other shape.
pub(crate) fn record_fields(ty: &Type, resolver: &dyn TypeResolver) -> Result<Option<Vec<Field>>> {
    let mut shape = resolve_shallow(ty, resolver)?;
    for _ in 0..MAX_EMBEDDING {
        match shape.resolved() {
            Type::Record(fields) => return Ok(Some(fields.clone())),
            Type::Unresolved(_) => shape = resolve_shallow(shape.resolved(), resolver)?,
            _ => return Ok(None),
        }
    }
    invariant!("type `{ty}` does not resolve to a concrete shape")
}

/// Flattens `fields` for matching under annotation `tag`.
pub(crate) fn flatten(
    fields: &[Field],
    tag: &str,
    resolver: &dyn TypeResolver,
) -> Result<Vec<FlatField>> {
    let mut flat = Vec::new();
    let mut seen = HashSet::new();
    walk(fields, tag, resolver, &[], &mut seen, &mut flat)?;
    Ok(flat)
}

fn walk(
    fields: &[Field],
    tag: &str,
    resolver: &dyn TypeResolver,
    prefix: &[String],
    seen: &mut HashSet<String>,
    flat: &mut Vec<FlatField>,
) -> Result<()> {
    ensure_invariant!(
        prefix.len() < MAX_EMBEDDING,
        "embedded records nest deeper than {} levels at `{}`",
        MAX_EMBEDDING,
        prefix.join(".")
    );
    for field in fields {
        let (name, options) = match field.tag_options(tag).filter(|_| !tag.is_empty()) {
            Some((name, options)) => (name, options),
            None => ("", Vec::new()),
        };
        if name == SKIP {
            continue;
        }
        let mut chain = prefix.to_vec();
        chain.push(field.access_name());

        if name.is_empty() && field.is_embedded() {
            if let Some(inner) = record_fields(&field.ty, resolver)? {
                walk(&inner, tag, resolver, &chain, seen, flat)?;
                continue;
            }
        }

        let label = if name.is_empty() {
            field.access_name()
        } else {
            name.to_string()
        };
        let key = normalize(&label);
        if !seen.insert(key.clone()) {
            continue;
        }
        flat.push(FlatField {
            label,
            key,
            chain,
            ty: field.ty.clone(),
            required: options.contains(&REQUIRED),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tp_core::ty::{NoResolver, TypeRegistry};

    fn labels(flat: &[FlatField]) -> Vec<&str> {
        flat.iter().map(|f| f.label.as_str()).collect()
    }

    #[test]
    fn normalizes_case_and_underscores() {
        assert_eq!(normalize("User_ID"), "userid");
        assert_eq!(normalize("userId"), "userid");
    }

    #[test]
    fn annotations_rename_and_skip() -> Result<()> {
        let fields = vec![
            Field::new("Name", Type::string()).with_annotation(r#"map:"full_name""#),
            Field::new("Secret", Type::string()).with_annotation(r#"map:"-""#),
            Field::new("Age", Type::int()).with_annotation(r#"json:"age" map:",required""#),
        ];
        let flat = flatten(&fields, "map", &NoResolver)?;
        assert_eq!(labels(&flat), vec!["full_name", "Age"]);
        assert_eq!(flat[0].key, "fullname");
        assert!(flat[1].required);
        assert!(!flat[0].required);
        Ok(())
    }

    #[test]
    fn embedded_records_are_walked_into() -> Result<()> {
        let base = Type::named(
            "model.Base",
            Type::record(vec![
                Field::new("ID", Type::int()),
                Field::new("Name", Type::string()),
            ]),
        );
        let fields = vec![
            Field::embedded(base),
            Field::new("Name", Type::string()),
            Field::new("Email", Type::string()),
        ];
        let flat = flatten(&fields, "", &NoResolver)?;
        assert_eq!(labels(&flat), vec!["ID", "Name", "Email"]);
        assert_eq!(flat[1].chain, vec!["Base".to_string(), "Name".to_string()]);

        let holder = Variable::existing("u", Type::int(), Mode::Read);
        assert_eq!(flat[1].member_of(&holder, Mode::Read).expr().to_string(), "u.Base.Name");
        Ok(())
    }

    #[test]
    fn embedded_placeholders_resolve_through_registry() -> Result<()> {
        let mut registry = TypeRegistry::new();
        registry.declare("Base", Type::record(vec![Field::new("ID", Type::int())]));
        let fields = vec![Field::embedded(Type::unresolved("Base"))];
        let flat = flatten(&fields, "", &registry)?;
        assert_eq!(labels(&flat), vec!["ID"]);
        assert!(flatten(&fields, "", &NoResolver).is_err());
        Ok(())
    }

    #[test]
    fn embedded_with_a_name_stays_one_field() -> Result<()> {
        let base = Type::named("Base", Type::record(vec![Field::new("ID", Type::int())]));
        let fields = vec![Field::embedded(base).with_annotation(r#"map:"base""#)];
        let flat = flatten(&fields, "map", &NoResolver)?;
        assert_eq!(labels(&flat), vec!["base"]);
        assert_eq!(flat[0].chain, vec!["Base".to_string()]);
        Ok(())
    }
}
