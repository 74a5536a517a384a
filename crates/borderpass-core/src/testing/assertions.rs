//! Test assertion macros and helpers.

use crate::error::BorderpassError;

/// Assert that a result is Ok.
///
/// # Example
///
/// ```ignore
/// let result = engine.submit_process(42, kind, payload).await;
/// assert_ok!(result);
/// assert_ok!(result, "traveler submission should succeed");
/// ```
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match &$expr {
            Ok(_) => (),
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $($arg:tt)+) => {
        match &$expr {
            Ok(_) => (),
            Err(e) => panic!("assertion failed: {}: expected Ok, got Err({:?})", format_args!($($arg)+), e),
        }
    };
}

/// Assert that a result is Err.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match &$expr {
            Err(_) => (),
            Ok(v) => panic!("assertion failed: expected Err, got Ok({:?})", v),
        }
    };
    ($expr:expr, $($arg:tt)+) => {
        match &$expr {
            Err(_) => (),
            Ok(v) => panic!("assertion failed: {}: expected Err, got Ok({:?})", format_args!($($arg)+), v),
        }
    };
}

/// Assert that an error matches a specific variant.
///
/// # Example
///
/// ```ignore
/// let result = engine.get_process(Role::Traveler, 43, id).await;
/// assert_err_variant!(result, BorderpassError::AccessDenied(_));
/// ```
#[macro_export]
macro_rules! assert_err_variant {
    ($expr:expr, $variant:pat) => {
        match &$expr {
            Err($variant) => (),
            Err(e) => panic!(
                "assertion failed: expected {}, got {:?}",
                stringify!($variant),
                e
            ),
            Ok(v) => panic!(
                "assertion failed: expected Err({}), got Ok({:?})",
                stringify!($variant),
                v
            ),
        }
    };
}

/// Check if an error message contains a substring.
pub fn error_contains(error: &BorderpassError, substring: &str) -> bool {
    error.to_string().contains(substring)
}

/// Check if a validation error mentions a specific field.
pub fn validation_error_for_field(error: &BorderpassError, field: &str) -> bool {
    match error {
        BorderpassError::Validation(msg) => msg.contains(field),
        _ => false,
    }
}

/// Partial JSON match: the pattern only needs the fields you want to verify.
pub fn assert_json_matches(actual: &serde_json::Value, pattern: &serde_json::Value) -> bool {
    match (actual, pattern) {
        (serde_json::Value::Object(a), serde_json::Value::Object(p)) => p.iter().all(|(key, expected)| {
            a.get(key)
                .is_some_and(|actual_value| assert_json_matches(actual_value, expected))
        }),
        (serde_json::Value::Array(a), serde_json::Value::Array(p)) => {
            a.len() == p.len() && a.iter().zip(p.iter()).all(|(a, p)| assert_json_matches(a, p))
        }
        (a, p) => a == p,
    }
}
