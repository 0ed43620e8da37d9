//! AWS SDK error categorization for tool results and diagnostics.
//!
//! Retries happen inside the SDK (adaptive mode, bounded attempts). By the time an error
//! reaches a tool it is final; this module only classifies it so the tool error handed back
//! to the reasoning policy says whether the failure was throttling, a permission problem, or
//! something else, and so skipped log groups are logged with a consistent label.

use aws_smithy_types::error::display::DisplayErrorContext;

/// Categorized error types for AWS SDK errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Request was throttled and retries were exhausted
    Throttled { service: String, error_code: String },
    /// Request timed out
    Timeout { operation: String },
    /// Network connectivity issues
    NetworkError { message: String },
    /// AWS service temporarily unavailable
    ServiceUnavailable { service: String, message: String },
    /// Non-retryable error (permissions, validation, missing resources)
    NonRetryable {
        code: String,
        message: String,
        is_permission_error: bool,
    },
}

impl ErrorCategory {
    /// Short label for log lines
    pub fn short_label(&self) -> &'static str {
        match self {
            ErrorCategory::Throttled { .. } => "throttled",
            ErrorCategory::Timeout { .. } => "timeout",
            ErrorCategory::NetworkError { .. } => "network",
            ErrorCategory::ServiceUnavailable { .. } => "unavailable",
            ErrorCategory::NonRetryable {
                is_permission_error: true,
                ..
            } => "access-denied",
            ErrorCategory::NonRetryable { .. } => "error",
        }
    }

    /// One-line hint attached to a tool error as its `detail`
    pub fn hint(&self) -> String {
        match self {
            ErrorCategory::Throttled { service, error_code } => format!(
                "{} throttled the request ({}) after retries; try again with a narrower query",
                service, error_code
            ),
            ErrorCategory::Timeout { operation } => {
                format!("{} timed out after retries", operation)
            }
            ErrorCategory::NetworkError { .. } => {
                "network error reaching AWS after retries".to_string()
            }
            ErrorCategory::ServiceUnavailable { service, .. } => {
                format!("{} is temporarily unavailable", service)
            }
            ErrorCategory::NonRetryable {
                code,
                is_permission_error: true,
                ..
            } => format!(
                "{}: the caller or assumed role lacks permission; check the IAM policy and role trust policy",
                code
            ),
            ErrorCategory::NonRetryable { code, .. } => format!("{} (not retryable)", code),
        }
    }
}

/// Render an SDK error with its full source chain
///
/// `SdkError`'s own `Display` only says "service error"; the context wrapper includes the
/// service error code and message.
pub fn sdk_error_message<E>(error: &E) -> String
where
    E: std::error::Error,
{
    DisplayErrorContext(error).to_string()
}

/// Categorize an `anyhow::Error` produced by the AWS plumbing
pub fn categorize_error(error: &anyhow::Error, service: &str, operation: &str) -> ErrorCategory {
    categorize_error_string(&format!("{:#}", error), service, operation)
}

/// Categorize an error based on its string representation
pub fn categorize_error_string(error_str: &str, service: &str, operation: &str) -> ErrorCategory {
    if error_str.contains("ThrottlingException")
        || error_str.contains("Throttling")
        || error_str.contains("TooManyRequestsException")
        || error_str.contains("RequestLimitExceeded")
        || error_str.contains("LimitExceededException")
        || error_str.contains("RateExceeded")
    {
        let error_code = extract_error_code(error_str).unwrap_or_else(|| "Throttling".to_string());
        return ErrorCategory::Throttled {
            service: service.to_string(),
            error_code,
        };
    }

    if error_str.contains("TimeoutError")
        || error_str.contains("timeout")
        || error_str.contains("timed out")
    {
        return ErrorCategory::Timeout {
            operation: operation.to_string(),
        };
    }

    if error_str.contains("DispatchFailure")
        || error_str.contains("connection")
        || error_str.contains("Connection")
        || error_str.contains("dns error")
        || error_str.contains("DNS")
    {
        return ErrorCategory::NetworkError {
            message: truncate_message(error_str, 100),
        };
    }

    if error_str.contains("ServiceUnavailable")
        || error_str.contains("InternalServerError")
        || error_str.contains("InternalServerException")
        || error_str.contains("InternalFailure")
    {
        return ErrorCategory::ServiceUnavailable {
            service: service.to_string(),
            message: truncate_message(error_str, 100),
        };
    }

    let is_permission_error = error_str.contains("AccessDenied")
        || error_str.contains("UnauthorizedOperation")
        || error_str.contains("is not authorized to perform")
        || error_str.contains("InvalidClientTokenId")
        || error_str.contains("ExpiredToken")
        || error_str.contains("SignatureDoesNotMatch");

    let code = extract_error_code(error_str).unwrap_or_else(|| {
        if is_permission_error {
            "AccessDenied".to_string()
        } else {
            "Error".to_string()
        }
    });

    ErrorCategory::NonRetryable {
        code,
        message: truncate_message(error_str, 200),
        is_permission_error,
    }
}

/// Extract an AWS error code such as `AccessDeniedException` from an error message
fn extract_error_code(error_str: &str) -> Option<String> {
    error_str
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|word| {
            word.len() < 50
                && word.chars().next().is_some_and(|c| c.is_ascii_uppercase())
                && (word.ends_with("Exception")
                    || word.ends_with("Denied")
                    || word.ends_with("Throttling")
                    || word.ends_with("Fault"))
        })
        .map(str::to_string)
}

/// Truncate a message to at most `max_chars` characters, adding an ellipsis when cut
pub fn truncate_message(msg: &str, max_chars: usize) -> String {
    if msg.chars().count() <= max_chars {
        msg.to_string()
    } else {
        let kept: String = msg.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
