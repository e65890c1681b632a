//! Error types for the Sable runtime.
//!
//! Language-level exceptions travel as [`Error::Raised`]; the remaining
//! variants report host misuse of the runtime and are never caught by
//! [`Vm::rescue`](crate::Vm::rescue).

use std::fmt;

use crate::runtime::{ClassId, Value};

/// A raised language-level exception.
///
/// Carries enough to be reported after the VM scope that created the error
/// object has been released: the message and backtrace are owned strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    class: ClassId,
    class_name: String,
    value: Value,
    message: String,
    backtrace: Vec<String>,
}

impl Exception {
    pub(crate) fn new(
        class: ClassId,
        class_name: String,
        value: Value,
        message: String,
        backtrace: Vec<String>,
    ) -> Self {
        Exception {
            class,
            class_name,
            value,
            message,
            backtrace,
        }
    }

    /// Class of the error object.
    #[must_use]
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Name of the error class, e.g. `"TypeError"`.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The error object itself.
    #[must_use]
    pub fn value(&self) -> Value {
        self.value
    }

    /// Message given at the raise point.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `Class#method` frames active at the raise point, innermost first.
    #[must_use]
    pub fn backtrace(&self) -> &[String] {
        &self.backtrace
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class_name, self.message)
    }
}

/// Errors that can occur in the Sable runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A language-level exception is unwinding.
    Raised(Exception),

    /// A reference was used after the scope that owned its object ended.
    StaleReference {
        /// Pool slot the reference pointed at.
        index: u32,
    },

    /// Including a module would make the ancestry cyclic.
    InheritanceCycle,
}

impl Error {
    /// The exception, if this is a language-level error.
    #[must_use]
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            Error::Raised(exc) => Some(exc),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Raised(exc) => write!(f, "{exc}"),
            Error::StaleReference { index } => {
                write!(f, "Stale reference to object slot {index}")
            }
            Error::InheritanceCycle => write!(f, "Inheritance cycle detected"),
        }
    }
}

impl std::error::Error for Error {}

impl From<Exception> for Error {
    fn from(exc: Exception) -> Self {
        Error::Raised(exc)
    }
}

/// Result type for Sable runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Exception {
        Exception::new(
            ClassId::new(3),
            "TypeError".to_string(),
            Value::Nil,
            "Uniterable type in range".to_string(),
            vec!["Range::Enumerator#next".to_string()],
        )
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", Error::Raised(sample())),
            "TypeError: Uniterable type in range"
        );
        assert_eq!(
            format!("{}", Error::StaleReference { index: 7 }),
            "Stale reference to object slot 7"
        );
        assert_eq!(
            format!("{}", Error::InheritanceCycle),
            "Inheritance cycle detected"
        );
    }

    #[test]
    fn test_exception_accessors() {
        let err: Error = sample().into();
        let exc = err.exception().unwrap();

        assert_eq!(exc.class(), ClassId::new(3));
        assert_eq!(exc.class_name(), "TypeError");
        assert_eq!(exc.backtrace(), ["Range::Enumerator#next"]);
        assert_eq!(Error::InheritanceCycle.exception(), None);
    }
}
