use std::sync::OnceLock;

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

fn bool_from_env(key: &str) -> bool {
    env_true(key).unwrap_or(false)
}

/// Log every edge the path finder generates, not just the outcome.
pub fn trace_search() -> bool {
    static TRACE: OnceLock<bool> = OnceLock::new();
    *TRACE.get_or_init(|| bool_from_env("TYPEPATH_TRACE_SEARCH"))
}

/// Treat every unmatched destination field as a composition failure.
pub fn strict_fields() -> bool {
    static STRICT: OnceLock<bool> = OnceLock::new();
    *STRICT.get_or_init(|| bool_from_env("TYPEPATH_STRICT_FIELDS"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_flag_parsing() {
        std::env::set_var("TYPEPATH_TEST_FLAG_ON", "1");
        std::env::set_var("TYPEPATH_TEST_FLAG_OFF", "false");
        std::env::set_var("TYPEPATH_TEST_FLAG_BLANK", "  ");
        assert!(bool_from_env("TYPEPATH_TEST_FLAG_ON"));
        assert!(!bool_from_env("TYPEPATH_TEST_FLAG_OFF"));
        assert!(!bool_from_env("TYPEPATH_TEST_FLAG_BLANK"));
        assert!(!bool_from_env("TYPEPATH_TEST_FLAG_MISSING"));
    }
}
