#![allow(dead_code)]

//! Helper functions for common test assertions

use memento_calc::CalcError;

pub fn assert_error_contains(err: &CalcError, expected: &str, context: &str) {
    assert!(
        err.message().to_lowercase().contains(&expected.to_lowercase()),
        "{}: Error should contain '{}', got: {}",
        context,
        expected,
        err
    );
}

pub fn assert_validation_error(err: &CalcError, expected: &str) {
    assert!(err.is_validation(), "Expected validation error, got: {err:?}");
    assert_eq!(err.message(), expected);
}

pub fn csv_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|line| !line.is_empty()).collect()
}
