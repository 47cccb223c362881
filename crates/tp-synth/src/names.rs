//! Variable naming. Everything here is a pure function of its inputs.

use std::collections::HashSet;
use tp_core::ty::Type;

const ABBREVIATIONS: &[(&str, &str)] = &[
    ("context", "ctx"),
    ("error", "err"),
    ("int", "i"),
    ("string", "s"),
    ("bool", "ok"),
    ("interface", "v"),
    ("any", "v"),
    ("request", "req"),
    ("response", "resp"),
    ("config", "cfg"),
    ("message", "msg"),
];

const RESERVED: &[&str] = &[
    "break", "case", "const", "continue", "default", "else", "enum", "fn", "for", "func", "if",
    "impl", "in", "let", "loop", "map", "match", "mod", "nil", "range", "return", "self",
    "select", "struct", "switch", "trait", "type", "var", "while",
];

/// `preferred` if nobody uses it yet, otherwise its stem (trailing digits
/// stripped) followed by the smallest free numeric suffix.
pub fn unique_name<'a>(existing: impl IntoIterator<Item = &'a str>, preferred: &str) -> String {
    let taken: HashSet<&str> = existing.into_iter().collect();
    let preferred = if preferred.is_empty() { "v" } else { preferred };
    if !taken.contains(preferred) {
        return preferred.to_string();
    }
    let stem = preferred.trim_end_matches(|c: char| c.is_ascii_digit());
    let stem = if stem.is_empty() { "v" } else { stem };
    (1..)
        .map(|n| format!("{stem}{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| stem.to_string())
}

/// A readable variable name for a value of type `ty`.
pub fn preferred_name(ty: &Type) -> String {
    let name = match ty {
        Type::Named { name, .. } | Type::Alias { name, .. } | Type::Unresolved(name) => {
            from_type_name(name)
        }
        Type::Basic(name) => from_type_name(name),
        Type::Pointer { base, .. } => return preferred_name(base),
        Type::Slice { elem, .. } | Type::FixedArray { elem, .. } => {
            format!("{}List", preferred_name(elem))
        }
        Type::Map { value, .. } => format!("{}Map", preferred_name(value)),
        Type::Record(_) => "record".to_string(),
        Type::Function(_) => "callback".to_string(),
        Type::Interface(_) => "v".to_string(),
    };
    if RESERVED.contains(&name.as_str()) {
        format!("{name}Value")
    } else {
        name
    }
}

fn from_type_name(name: &str) -> String {
    let name = name.rsplit("::").next().unwrap_or(name);
    let name = name.rsplit('.').next().unwrap_or(name);
    let lowered = name.to_ascii_lowercase();
    if let Some((_, short)) = ABBREVIATIONS.iter().find(|(long, _)| *long == lowered) {
        return short.to_string();
    }
    lower_camel(name)
}

/// `HTTPServer` -> `httpServer`, `UserID` -> `userID`, `Name` -> `name`.
fn lower_camel(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let upper_run = chars.iter().take_while(|c| c.is_ascii_uppercase()).count();
    let lower_until = match upper_run {
        0 => return name.to_string(),
        n if n == chars.len() => n,
        1 => 1,
        // keep the last capital of an acronym as the start of the next word
        n => n - 1,
    };
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < lower_until { c.to_ascii_lowercase() } else { *c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn free_names_are_kept() {
        assert_eq!(unique_name(["a", "b"], "user"), "user");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        assert_eq!(unique_name(["user"], "user"), "user1");
        assert_eq!(unique_name(["user", "user1"], "user"), "user2");
        assert_eq!(unique_name(["user2"], "user2"), "user1");
        assert_eq!(unique_name(["t2", "t1"], "t2"), "t3");
        assert_eq!(unique_name(["1"], "1"), "v1");
        assert_eq!(unique_name([], ""), "v");
    }

    #[test]
    fn names_follow_the_type() {
        let user = Type::named("model.User", Type::record(vec![]));
        assert_eq!(preferred_name(&user), "user");
        assert_eq!(preferred_name(&Type::pointer_n(user.clone(), 2)), "user");
        assert_eq!(preferred_name(&Type::slice(user.clone())), "userList");
        assert_eq!(preferred_name(&Type::map(Type::string(), user)), "userMap");
        assert_eq!(preferred_name(&Type::error()), "err");
        assert_eq!(preferred_name(&Type::named("context.Context", Type::interface(vec![]))), "ctx");
        assert_eq!(preferred_name(&Type::named("HTTPServer", Type::record(vec![]))), "httpServer");
        assert_eq!(preferred_name(&Type::named("ID", Type::int())), "id");
        assert_eq!(preferred_name(&Type::named("Type", Type::int())), "typeValue");
    }

    proptest! {
        #[test]
        fn unique_name_never_collides(
            existing in prop::collection::vec("[a-c][0-3]?", 0..12),
            preferred in "[a-c][0-3]?",
        ) {
            let name = unique_name(existing.iter().map(String::as_str), &preferred);
            prop_assert!(!existing.contains(&name));
            let again = unique_name(existing.iter().map(String::as_str), &preferred);
            prop_assert_eq!(name, again);
        }
    }
}
