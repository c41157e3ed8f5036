//! Common error infrastructure for rules-core.
//!
//! Domain-specific errors (`BusError`, `ConditionError`, `DiceError`) live next to
//! the component that raises them. This module holds the pieces they share:
//!
//! - **Severity Classification**: errors are categorized so callers can tell
//!   rejected input apart from a failing rule fragment
//! - **Open listener errors**: rule fragments are authored independently, so the
//!   error a listener returns is boxed rather than drawn from a closed enum

/// Error returned by listeners and modifiers.
///
/// Any `std::error::Error` converts into it with `?` or `.into()`, and plain strings
/// work too (`Err("out of ki points".into())`).
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Invalid input, should not retry without changes.
    ///
    /// Examples: unknown condition id, exhaustion already at its cap
    Validation,

    /// A rule fragment failed while handling an event.
    ///
    /// The dispatch it belonged to was aborted; earlier mutations remain.
    Rule,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Rule => "rule",
        }
    }
}

/// Common trait for all rules-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait RulesError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Useful for log fields and for asserting on error kinds in tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
