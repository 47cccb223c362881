use super::*;
use crate::path::{FunctionRef, Payload, Step};
use pretty_assertions::assert_eq;
use tp_core::ty::{Field, FunctionType, TypeRegistry};

fn record(name: &str, fields: Vec<Field>) -> Type {
    Type::named(name, Type::record(fields))
}

fn a() -> Type {
    record("A", vec![Field::new("ID", Type::int())])
}

fn b() -> Type {
    record("B", vec![Field::new("X", x())])
}

fn x() -> Type {
    Type::named("X", Type::int())
}

fn convert_a_to_b() -> Edge {
    let from = Type::pointer(a());
    let to = Type::pointer(b());
    let func = FunctionType::new(vec![from.clone()], vec![to.clone(), Type::error()]);
    Edge::known(from, to, FunctionRef::new("ConvertAToB", func))
}

#[test]
fn identity_needs_no_search() -> Result<()> {
    let path = find_path(&a(), &a(), &[convert_a_to_b()])?;
    assert_eq!(path.steps(), vec![Step::Identity]);
    assert!(path.is_identity());
    Ok(())
}

#[test]
fn field_extraction_folds_named_unwrap() -> Result<()> {
    let path = find_path(&b(), &x(), &[])?;
    assert_eq!(path.steps(), vec![Step::Identity, Step::FieldSelect]);
    let select = &path.edges()[1];
    assert_eq!(select.from, b());
    assert_eq!(select.to, x());
    match &select.payload {
        Payload::Field(field) => assert_eq!(field.name, "X"),
        other => panic!("unexpected payload {other:?}"),
    }
    Ok(())
}

#[test]
fn two_record_levels_take_three_edges() -> Result<()> {
    let c = record("C", vec![Field::new("N", Type::int())]);
    let d = record("D", vec![Field::new("C", c)]);
    let path = find_path(&d, &Type::int(), &[])?;
    assert_eq!(
        path.steps(),
        vec![Step::Identity, Step::FieldSelect, Step::FieldSelect]
    );
    Ok(())
}

#[test]
fn pointer_then_field() -> Result<()> {
    let path = find_path(&Type::pointer(b()), &x(), &[])?;
    assert_eq!(
        path.steps(),
        vec![Step::Identity, Step::Deref, Step::FieldSelect]
    );
    Ok(())
}

#[test]
fn known_edge_round_trip() -> Result<()> {
    let known = [convert_a_to_b()];
    let path = find_path(&Type::pointer(a()), &Type::pointer(b()), &known)?;
    assert_eq!(path.steps(), vec![Step::Identity, Step::Invoke]);

    let path = find_path(&a(), &b(), &known)?;
    assert_eq!(
        path.steps(),
        vec![Step::Identity, Step::Ref, Step::Invoke, Step::Deref]
    );

    let path = find_path(&Type::pointer(a()), &b(), &known)?;
    assert_eq!(path.steps(), vec![Step::Identity, Step::Invoke, Step::Deref]);

    let path = find_path(&Type::pointer_n(a(), 2), &Type::pointer(b()), &known)?;
    assert_eq!(path.steps(), vec![Step::Identity, Step::Deref, Step::Invoke]);
    Ok(())
}

#[test]
fn slices_convert_elementwise() -> Result<()> {
    let known = [convert_a_to_b()];
    let path = find_path(
        &Type::slice(Type::pointer(a())),
        &Type::slice(Type::pointer(b())),
        &known,
    )?;
    assert_eq!(
        path.steps(),
        vec![Step::Identity, Step::Index, Step::Invoke, Step::Collect]
    );

    let path = find_path(&Type::slice(a()), &Type::slice(b()), &known)?;
    assert_eq!(
        path.steps(),
        vec![
            Step::Identity,
            Step::Index,
            Step::Ref,
            Step::Invoke,
            Step::Deref,
            Step::Collect
        ]
    );
    Ok(())
}

#[test]
fn named_basic_converts() -> Result<()> {
    let path = find_path(&x(), &Type::int(), &[])?;
    assert_eq!(path.steps(), vec![Step::Identity, Step::Convert]);
    assert_eq!(path.edges()[1].payload, Payload::Target(Type::int()));
    Ok(())
}

#[test]
fn trailing_unwrap_becomes_explicit_conversion() -> Result<()> {
    let map = Type::map(Type::string(), Type::any());
    let named = Type::named("Extra", map.clone());
    let path = find_path(&named, &map, &[])?;
    assert_eq!(path.steps(), vec![Step::Identity, Step::Convert]);
    assert_eq!(path.target(), &map);
    Ok(())
}

#[test]
fn unrelated_types_are_not_reachable() {
    let err = find_path(&x(), &b(), &[]).unwrap_err();
    match err {
        Error::NotReachable { from, to, depth, .. } => {
            assert_eq!(from, "X");
            assert_eq!(to, "B");
            assert_eq!(depth, MAX_DEPTH);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn depth_bound_rejects_deep_nesting() -> Result<()> {
    let leaf = record("L", vec![Field::new("V", Type::int())]);
    let mid = record("M", vec![Field::new("L", leaf)]);
    let top = record("T", vec![Field::new("M", mid)]);
    let root = record("R", vec![Field::new("T", top.clone())]);
    assert!(find_path(&top, &Type::int(), &[]).is_ok());
    let err = find_path(&root, &Type::int(), &[]).unwrap_err();
    assert!(err.is_not_reachable());

    // unnamed records need no unwrap hop and fit in the bound
    let anon = Type::record(vec![Field::new(
        "A",
        Type::record(vec![Field::new("B", Type::record(vec![Field::new("C", Type::int())]))]),
    )]);
    let path = find_path(&anon, &Type::int(), &[])?;
    assert_eq!(path.len(), 4);
    Ok(())
}

#[test]
fn known_edges_win_over_structural_ties() -> Result<()> {
    let from = Type::pointer(a());
    let load = FunctionRef::new("LoadA", FunctionType::new(vec![from.clone()], vec![a()]));
    let known = [Edge::known(from.clone(), a(), load)];
    let path = find_path(&from, &a(), &known)?;
    assert_eq!(path.steps(), vec![Step::Identity, Step::Invoke]);

    let path = find_path(&from, &a(), &[])?;
    assert_eq!(path.steps(), vec![Step::Identity, Step::Deref]);
    Ok(())
}

#[test]
fn candidate_order_is_known_descend_ascend() -> Result<()> {
    let finder = PathFinder::new().with_known([convert_a_to_b()]);
    let target = Type::int();
    let search = Search::new(&finder, &target);

    let steps: Vec<Step> = search
        .expand(&Type::pointer(a()))?
        .into_iter()
        .map(|(edge, _)| edge.step)
        .collect();
    assert_eq!(
        steps,
        vec![Step::Invoke, Step::Deref, Step::Collect, Step::Ref]
    );

    let pair = Type::record(vec![
        Field::new("Left", Type::int()),
        Field::new("Right", Type::string()),
    ]);
    let edges = search.expand(&pair)?;
    let names: Vec<String> = edges
        .iter()
        .map(|(edge, _)| match &edge.payload {
            Payload::Field(field) => field.name.clone(),
            _ => edge.step.to_string(),
        })
        .collect();
    assert_eq!(names, vec!["Left", "Right", "collect", "ref"]);

    let unwrap = search.expand(&a())?;
    assert_eq!(unwrap[0].0.step, Step::Convert);
    assert!(unwrap[0].1, "named record unwrap is transparent");
    Ok(())
}

#[test]
fn placeholders_resolve_through_registry() -> Result<()> {
    let mut registry = TypeRegistry::new();
    registry.declare(
        "Node",
        Type::record(vec![
            Field::new("Value", Type::int()),
            Field::new("Next", Type::pointer(Type::unresolved("Node"))),
        ]),
    );
    let source = Type::pointer(Type::unresolved("Node"));

    let path = PathFinder::new()
        .with_resolver(&registry)
        .find(&source, &Type::int())?;
    assert_eq!(
        path.steps(),
        vec![Step::Identity, Step::Deref, Step::FieldSelect]
    );

    let err = find_path(&source, &Type::int(), &[]).unwrap_err();
    assert!(matches!(err, Error::InvariantViolation(_)));
    Ok(())
}

#[test]
fn aliases_expand_as_their_target() -> Result<()> {
    let ids = Type::alias("IDs", Type::slice(Type::int()));
    let path = find_path(&ids, &Type::int(), &[])?;
    assert_eq!(path.steps(), vec![Step::Identity, Step::Index]);
    Ok(())
}
