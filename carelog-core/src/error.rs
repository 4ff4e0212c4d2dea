/// Errors raised at the boundary of the analytics functions.
///
/// Missing reference data or empty histories are not errors; they surface as
/// `None` or dedicated outcome variants instead.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("input is missing the minimum required data")]
    MissingData,
    #[error("could not parse input: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidInput { field: String, reason: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("store query failed: {0}")]
    Store(String),
    #[error("{0}")]
    Other(String),
}

impl AnalyticsError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
