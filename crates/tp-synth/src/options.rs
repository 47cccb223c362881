use serde::{Deserialize, Serialize};
use tp_core::stmt::Expr;

/// What generated code does with an error-typed result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// `return err`
    #[default]
    EarlyReturn,
    /// Push the error onto `collector` and skip the rest of this value.
    Accumulate { collector: String },
    /// `return function(err)`
    WrapWith { function: String },
}

/// Extra writes of the destination value around the final assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryCapture {
    /// Keyed collection receiving the value before assignment.
    pub before: Option<String>,
    /// Keyed collection receiving the value after assignment.
    pub after: Option<String>,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmissionOptions {
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    /// Error reported when a dereference meets null. Without one, a null
    /// pointer leaves the destination untouched.
    #[serde(default)]
    pub nil_error: Option<Expr>,
    #[serde(default)]
    pub diff_check: bool,
    #[serde(default)]
    pub capture: Option<AuxiliaryCapture>,
}

impl EmissionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_nil_error(mut self, error: Expr) -> Self {
        self.nil_error = Some(error);
        self
    }

    pub fn with_diff_check(mut self, diff_check: bool) -> Self {
        self.diff_check = diff_check;
        self
    }

    pub fn with_capture(mut self, capture: AuxiliaryCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Whether the final assignment needs more than a plain store.
    pub(crate) fn decorates_assignment(&self) -> bool {
        self.diff_check || self.capture.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn loads_from_json_with_defaults() -> tp_core::Result<()> {
        let options: EmissionOptions = serde_json::from_str(
            r#"{
                "error_policy": { "WrapWith": { "function": "errors.Wrap" } },
                "diff_check": true
            }"#,
        )?;
        assert_eq!(
            options,
            EmissionOptions::new()
                .with_error_policy(ErrorPolicy::WrapWith {
                    function: "errors.Wrap".into()
                })
                .with_diff_check(true)
        );
        Ok(())
    }
}
