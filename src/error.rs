//! Calculation error taxonomy. Every failure is data handed back to the
//! boundary, never a panic.

use thiserror::Error;

use crate::audit::AuditIssue;
use crate::optimizer::SearchError;

/// Failure modes of one calculation request.
#[derive(Debug, Error)]
pub enum CalcError {
    /// The request failed shape validation. `field` names the offender.
    #[error("invalid input: {field}: {message}")]
    InvalidInput { field: String, message: String },
    /// The optimizer could not produce two acceptable sizes.
    #[error("optimizer infeasible: {0}")]
    Infeasible(#[from] SearchError),
    /// The audit found blocking inconsistencies; the itemized list is
    /// returned instead of the computed numbers.
    #[error("audit failed with {} issue(s)", .issues.len())]
    AuditFailed { issues: Vec<AuditIssue> },
}

impl CalcError {
    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_names_the_field() {
        let err = CalcError::invalid_input("production.monthly_kwh", "must hold 12 values");
        assert_eq!(
            err.to_string(),
            "invalid input: production.monthly_kwh: must hold 12 values"
        );
    }

    #[test]
    fn search_error_converts() {
        let err: CalcError = SearchError::NoViableCandidate.into();
        assert!(err.to_string().contains("no viable candidate"));
    }
}
