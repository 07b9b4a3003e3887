//! Error handling for skipdict.
//!
//! Every fallible dictionary operation reports a [`DictError`] carrying a
//! category, a message and key/value context. A missing key is never an
//! error; operations report it through `bool` or `Option` results instead.

use std::collections::TryReserveError;
use std::fmt;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error category for skipdict errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The dictionary was torn down before the call.
    Destroyed,
    /// Node storage could not be grown.
    Allocation,
    /// A structural check found a broken link, order or level.
    Invariant,
    /// Construction options were out of range.
    Config,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Destroyed => write!(f, "destroyed"),
            ErrorCategory::Allocation => write!(f, "allocation"),
            ErrorCategory::Invariant => write!(f, "invariant"),
            ErrorCategory::Config => write!(f, "config"),
        }
    }
}

/// Dictionary error with category and context
#[derive(Debug)]
pub struct DictError {
    message: String,
    category: ErrorCategory,
    source: Option<BoxedSource>,
    context: Vec<(String, String)>,
}

impl DictError {
    pub fn new(message: impl Into<String>, category: ErrorCategory) -> Self {
        Self {
            message: message.into(),
            category,
            source: None,
            context: Vec::new(),
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        category: ErrorCategory,
        source: impl Into<BoxedSource>,
    ) -> Self {
        Self {
            message: message.into(),
            category,
            source: Some(source.into()),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.push((key.into(), value.to_string()));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    pub fn is_destroyed(&self) -> bool {
        self.category == ErrorCategory::Destroyed
    }

    pub fn is_allocation(&self) -> bool {
        self.category == ErrorCategory::Allocation
    }

    pub fn is_invariant(&self) -> bool {
        self.category == ErrorCategory::Invariant
    }
}

impl fmt::Display for DictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)?;

        if !self.context.is_empty() {
            write!(f, " (")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, ")")?;
        }

        if let Some(source) = &self.source {
            write!(f, "\nCaused by: {}", source)?;
        }

        Ok(())
    }
}

impl std::error::Error for DictError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// Result type alias for dictionary operations
pub type Result<T> = std::result::Result<T, DictError>;

/// An operation was attempted after `destroy()`.
pub fn destroyed_error(operation: &str) -> DictError {
    DictError::new("dictionary has been destroyed", ErrorCategory::Destroyed)
        .with_context("operation", operation)
}

/// Node storage could not reserve room for a new node.
pub fn allocation_error(source: TryReserveError) -> DictError {
    DictError::with_source("failed to allocate node", ErrorCategory::Allocation, source)
}

/// A structural check failed.
pub fn invariant_error(message: impl Into<String>) -> DictError {
    DictError::new(message, ErrorCategory::Invariant)
}

pub fn config_error(message: impl Into<String>) -> DictError {
    DictError::new(message, ErrorCategory::Config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_category_display() {
        assert_eq!(format!("{}", ErrorCategory::Destroyed), "destroyed");
        assert_eq!(format!("{}", ErrorCategory::Allocation), "allocation");
        assert_eq!(format!("{}", ErrorCategory::Invariant), "invariant");
        assert_eq!(format!("{}", ErrorCategory::Config), "config");
    }

    #[test]
    fn test_destroyed_error_carries_operation() {
        let err = destroyed_error("insert");
        assert!(err.is_destroyed());
        assert_eq!(err.context(), &[("operation".to_string(), "insert".to_string())]);
        assert_eq!(
            err.to_string(),
            "[destroyed] dictionary has been destroyed (operation=insert)"
        );
    }

    #[test]
    fn test_allocation_error_has_source() {
        let reserve = Vec::<u64>::new().try_reserve(usize::MAX).unwrap_err();
        let err = allocation_error(reserve);
        assert!(err.is_allocation());
        assert!(err.source().is_some());
        assert!(err.to_string().contains("Caused by:"));
    }

    #[test]
    fn test_invariant_error_with_context() {
        let err = invariant_error("keys out of order")
            .with_context("level", 0)
            .with_context("position", 3);

        assert!(err.is_invariant());
        assert_eq!(err.context().len(), 2);
        assert!(err.to_string().contains("level=0, position=3"));
    }

    #[test]
    fn test_config_error() {
        let err = config_error("sample_size must be positive");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert_eq!(err.message(), "sample_size must be positive");
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<DictError>();
    }

    #[test]
    fn test_converts_into_anyhow() {
        let err: anyhow::Error = destroyed_error("search").into();
        assert!(err.to_string().contains("destroyed"));
    }

    #[test]
    fn test_category_survives_anyhow_context() {
        use anyhow::Context;

        let result: std::result::Result<(), DictError> =
            Err(config_error("promotion bits must be in 1..=8").with_context("bits", 0));
        let err = result.context("build dictionary").unwrap_err();

        let inner = err.downcast_ref::<DictError>().unwrap();
        assert_eq!(inner.category(), ErrorCategory::Config);
        assert_eq!(inner.context(), &[("bits".to_string(), "0".to_string())]);
        assert_eq!(err.to_string(), "build dictionary");
    }
}
