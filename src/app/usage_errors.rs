//! Usage errors: malformed input rejected before any model call or AWS request

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("thread id must not be empty")]
    EmptyThreadId,

    /// Exactly one half of an account/role pair was supplied
    #[error("cross-account access requires both account_id and role_name ({missing} is missing)")]
    PartialCrossAccount { missing: &'static str },

    #[error("{field} must be greater than 0 (got {value})")]
    NonPositive { field: &'static str, value: i64 },

    #[error("{field} must be at most {max} (got {value})")]
    TooLarge {
        field: &'static str,
        value: i64,
        max: i64,
    },

    #[error("session_id must be a string")]
    NonStringThreadId,
}
