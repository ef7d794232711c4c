//! Custom assertion macros and utilities
//!
//! Provides assertion macros for engine tests with more descriptive
//! failure messages than a bare `assert!`.

/// Assert that a result is ok and return the value
///
/// This macro unwraps a Result, providing a better error message
/// if the result is an error.
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a result is an error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        assert!($result.is_err(), "Expected Err, got Ok");
    };
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => panic!("Expected different error variant, got: {:?}", e),
        }
    };
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}

/// Assert the names of the events a recording channel has sent, in order
#[macro_export]
macro_rules! assert_sent {
    ($engine:expr, [$($name:expr),* $(,)?]) => {
        let expected: Vec<&str> = vec![$($name),*];
        pretty_assertions::assert_eq!(
            $engine.channel().names(),
            expected,
            "Unexpected outbound events"
        );
    };
}

/// Assert the message ids of a snapshot, in display order
#[macro_export]
macro_rules! assert_message_order {
    ($snapshot:expr, [$($id:expr),* $(,)?]) => {
        let actual: Vec<&str> = $snapshot.messages().map(|m| m.message_id.as_str()).collect();
        let expected: Vec<&str> = vec![$($id),*];
        pretty_assertions::assert_eq!(actual, expected, "Unexpected message order");
    };
}
