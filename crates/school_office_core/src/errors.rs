//! crates/school_office_core/src/errors.rs
//!
//! Classification of failures by HTTP status into user-facing categories,
//! plus the retry policy used for retryable ones.

use serde::Serialize;
use std::time::Duration;

/// Fraction of the computed delay that jitter may add or remove.
pub const JITTER_RATIO: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    ServerError,
    Network,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// A failure ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    /// `None` when the request never got a response.
    pub status: Option<u16>,
    pub message: String,
    pub is_retryable: bool,
}

/// Maps an HTTP status (or its absence) to category, severity and retryability.
pub fn classify_status(status: Option<u16>) -> (ErrorCategory, ErrorSeverity, bool) {
    use ErrorCategory::*;
    use ErrorSeverity::*;
    match status {
        None => (Network, High, true),
        Some(400) | Some(422) => (Validation, Low, false),
        Some(401) => (Authentication, High, false),
        Some(403) => (Authorization, High, false),
        Some(404) => (NotFound, Medium, false),
        Some(409) => (Conflict, Medium, false),
        Some(429) => (ServerError, Medium, true),
        Some(500..=599) => (ServerError, Critical, true),
        Some(_) => (Unknown, Medium, false),
    }
}

impl ClassifiedError {
    pub fn from_status(status: Option<u16>, message: impl Into<String>) -> Self {
        let (category, severity, is_retryable) = classify_status(status);
        Self {
            category,
            severity,
            status,
            message: message.into(),
            is_retryable,
        }
    }

    /// A fallback message per category, for failures that carry none.
    pub fn default_message(category: ErrorCategory) -> &'static str {
        match category {
            ErrorCategory::Validation => "Please check the submitted data.",
            ErrorCategory::Authentication => "Please sign in again.",
            ErrorCategory::Authorization => "You do not have permission to do this.",
            ErrorCategory::NotFound => "The requested record no longer exists.",
            ErrorCategory::Conflict => "The record was changed by someone else.",
            ErrorCategory::ServerError => "The server could not complete the request.",
            ErrorCategory::Network => "The server could not be reached.",
            ErrorCategory::Unknown => "Something went wrong.",
        }
    }
}

//=========================================================================================
// Retry Policy
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Whether another attempt may follow the failed attempt number `attempt` (0-based).
    pub fn should_retry(&self, error: &ClassifiedError, attempt: u32) -> bool {
        error.is_retryable && attempt.saturating_add(1) < self.max_attempts
    }
}

/// The exponential delay before retry `attempt` (0-based), capped at `max_delay_ms`.
pub fn backoff_delay_ms(attempt: u32, policy: &RetryPolicy) -> f64 {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let raw = policy.base_delay_ms as f64 * policy.backoff_multiplier.powi(exponent);
    raw.min(policy.max_delay_ms as f64)
}

/// Delay before retry `attempt`.
///
/// Without jitter this is exactly the backoff delay. With jitter the delay is
/// scaled by `1 ± JITTER_RATIO`, where `jitter_sample` in `[0, 1]` picks the
/// point in that band. The result never exceeds `max_delay_ms`.
pub fn calculate_retry_delay(attempt: u32, policy: &RetryPolicy, jitter_sample: f64) -> Duration {
    let base = backoff_delay_ms(attempt, policy);
    let delay = if policy.jitter {
        let offset = (jitter_sample.clamp(0.0, 1.0) * 2.0 - 1.0) * JITTER_RATIO;
        base * (1.0 + offset)
    } else {
        base
    };
    let capped = delay.min(policy.max_delay_ms as f64).max(0.0);
    Duration::from_secs_f64(capped / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(d: Duration) -> f64 {
        d.as_secs_f64() * 1000.0
    }

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        for status in [500u16, 502, 503, 504, 429] {
            let e = ClassifiedError::from_status(Some(status), "boom");
            assert!(e.is_retryable, "{} should be retryable", status);
            assert_eq!(e.category, ErrorCategory::ServerError);
        }
        assert!(ClassifiedError::from_status(None, "offline").is_retryable);
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let cases = [
            (400, ErrorCategory::Validation),
            (401, ErrorCategory::Authentication),
            (403, ErrorCategory::Authorization),
            (404, ErrorCategory::NotFound),
            (409, ErrorCategory::Conflict),
            (418, ErrorCategory::Unknown),
        ];
        for (status, category) in cases {
            let e = ClassifiedError::from_status(Some(status), "nope");
            assert_eq!(e.category, category);
            assert!(!e.is_retryable);
        }
    }

    #[test]
    fn without_jitter_delay_is_exactly_the_backoff() {
        let policy = RetryPolicy { jitter: false, ..RetryPolicy::default() };
        assert_eq!(calculate_retry_delay(0, &policy, 0.9), Duration::from_millis(200));
        assert_eq!(calculate_retry_delay(2, &policy, 0.1), Duration::from_millis(800));
    }

    #[test]
    fn jitter_stays_within_five_percent() {
        let policy = RetryPolicy { base_delay_ms: 333, ..RetryPolicy::default() };
        for attempt in 0..4 {
            let base = backoff_delay_ms(attempt, &policy);
            for sample in [0.0, 0.1, 0.37, 0.5, 0.81, 1.0] {
                let d = ms(calculate_retry_delay(attempt, &policy, sample));
                assert!(
                    d >= base * 0.95 - 1e-6 && d <= base * 1.05 + 1e-6,
                    "{} outside band of {}",
                    d,
                    base
                );
            }
        }
    }

    #[test]
    fn never_exceeds_max_delay() {
        let policy = RetryPolicy { max_delay_ms: 1_000, ..RetryPolicy::default() };
        for attempt in [5, 10, 40, u32::MAX] {
            let d = ms(calculate_retry_delay(attempt, &policy, 1.0));
            assert!(d <= 1_000.0 + 1e-6);
        }
    }

    #[test]
    fn retries_stop_at_max_attempts() {
        let policy = RetryPolicy::default();
        let retryable = ClassifiedError::from_status(Some(503), "busy");
        let fatal = ClassifiedError::from_status(Some(400), "bad");
        assert!(policy.should_retry(&retryable, 0));
        assert!(policy.should_retry(&retryable, 1));
        assert!(!policy.should_retry(&retryable, 2));
        assert!(!policy.should_retry(&fatal, 0));
    }
}
