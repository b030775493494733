//! Assertion primitives for case bodies
//!
//! Every primitive returns [`CaseResult`]. Bodies propagate failures with `?`,
//! so the first failing check ends the case; later checks never run.
//!
//! # API
//!
//! - `check(condition, message)`: fail with `message` if `condition` is false
//! - `check_false(condition, message)`: fail with `message` if `condition` is true
//! - `check_equal(actual, expected)`: fail if the values differ
//! - `fail(message)`: fail unconditionally
//!
//! The `check!`, `check_text!` and `check_equal!` macros wrap these with
//! messages built from the checked expression.
//!
//! All primitives record the caller's source location.

use serde::Serialize;
use std::fmt;

/// Outcome of a case body
pub type CaseResult = Result<(), AssertionFailure>;

/// A source position (`file:line`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location of the caller of the enclosing `#[track_caller]` function
    #[track_caller]
    pub fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A failed check: its message and where it was raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    pub message: String,
    pub location: Location,
}

impl AssertionFailure {
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
        }
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for AssertionFailure {}

// ============================================================================
// Primitives
// ============================================================================

/// Fails with `message` if `condition` is false.
#[track_caller]
pub fn check(condition: bool, message: impl Into<String>) -> CaseResult {
    if condition {
        Ok(())
    } else {
        Err(AssertionFailure::new(message))
    }
}

/// Fails with `message` if `condition` is true.
#[track_caller]
pub fn check_false(condition: bool, message: impl Into<String>) -> CaseResult {
    if condition {
        Err(AssertionFailure::new(message))
    } else {
        Ok(())
    }
}

/// Fails unless `actual == expected`; the message shows both values.
#[track_caller]
pub fn check_equal<A, E>(actual: A, expected: E) -> CaseResult
where
    A: PartialEq<E> + fmt::Debug,
    E: fmt::Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(AssertionFailure::new(format!(
            "expected <{:?}>\n but was <{:?}>",
            expected, actual
        )))
    }
}

/// Fails unconditionally.
#[track_caller]
pub fn fail(message: impl Into<String>) -> CaseResult {
    Err(AssertionFailure::new(message))
}

// ============================================================================
// Macros
// ============================================================================

/// `check!(condition)`: fails with `CHECK(condition) failed`.
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        $crate::assertions::check($cond, concat!("CHECK(", stringify!($cond), ") failed"))
    };
}

/// `check_text!(condition, text)`: fails with `text` and the checked expression.
#[macro_export]
macro_rules! check_text {
    ($cond:expr, $text:expr $(,)?) => {
        $crate::assertions::check(
            $cond,
            format!(
                "Message: {}\nCHECK_TEXT({}) failed",
                $text,
                stringify!($cond)
            ),
        )
    };
}

/// `check_equal!(actual, expected)`: same as [`check_equal`].
#[macro_export]
macro_rules! check_equal {
    ($actual:expr, $expected:expr $(,)?) => {
        $crate::assertions::check_equal($actual, $expected)
    };
}
