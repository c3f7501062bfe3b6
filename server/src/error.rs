//! Error types for the Listkeeper server.
//!
//! # Error Types
//!
//! - [`ListError`] - Recoverable list/todo failures reported back to the visitor
//! - [`ServerError`] - Top-level server errors (startup, session store, I/O)
//!
//! Every [`ListError`] displays as the exact message flashed to the visitor,
//! so handlers can store `err.to_string()` directly.

use std::error::Error;
use std::fmt;

use thiserror::Error as ThisError;

use crate::config::ConfigError;
use crate::session::SessionError;

/// Which kind of input failed a length check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// A list name.
    ListName,
    /// The text of a todo item.
    Todo,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Self::ListName => "List name",
            Self::Todo => "Todo",
        }
    }
}

/// Failures of list and todo operations.
///
/// None of these are fatal. The handler decides whether to re-render a form
/// or redirect with the message as an error flash.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListError {
    /// Input is empty or longer than the allowed maximum.
    #[error("{} must be between {min} and {max} characters.", .field.label())]
    InvalidLength {
        /// The field that failed validation.
        field: Field,
        /// Minimum allowed length, inclusive.
        min: usize,
        /// Maximum allowed length, inclusive.
        max: usize,
    },

    /// Another list in the session already uses this name.
    #[error("List name must be unique.")]
    DuplicateName,

    /// No list with the requested id exists in the session.
    #[error("The specified list was not found.")]
    ListNotFound {
        /// The id that was looked up.
        id: u64,
    },

    /// The list exists but holds no todo with the requested id.
    #[error("The specified todo was not found.")]
    TodoNotFound {
        /// The parent list's id.
        list_id: u64,
        /// The todo id that was looked up.
        todo_id: u64,
    },
}

/// Top-level error type for the Listkeeper server.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration could not be loaded.
    Config(ConfigError),

    /// The session store refused or lost a session.
    Session(SessionError),

    /// Binding or serving the listener failed.
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Session(err) => write!(f, "session error: {err}"),
            Self::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<SessionError> for ServerError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// A specialized Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_name_length_message() {
        let err = ListError::InvalidLength {
            field: Field::ListName,
            min: 1,
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "List name must be between 1 and 100 characters."
        );
    }

    #[test]
    fn todo_length_message() {
        let err = ListError::InvalidLength {
            field: Field::Todo,
            min: 1,
            max: 100,
        };
        assert_eq!(err.to_string(), "Todo must be between 1 and 100 characters.");
    }

    #[test]
    fn duplicate_and_not_found_messages() {
        assert_eq!(
            ListError::DuplicateName.to_string(),
            "List name must be unique."
        );
        assert_eq!(
            ListError::ListNotFound { id: 4 }.to_string(),
            "The specified list was not found."
        );
        assert_eq!(
            ListError::TodoNotFound {
                list_id: 1,
                todo_id: 9
            }
            .to_string(),
            "The specified todo was not found."
        );
    }

    #[test]
    fn session_error_converts_with_question_mark() {
        fn inner() -> Result<()> {
            let _: () = Err(SessionError::AtCapacity { max_capacity: 1 })?;
            Ok(())
        }

        let err = inner().unwrap_err();
        assert!(matches!(err, ServerError::Session(_)));
        assert_eq!(
            err.to_string(),
            "session error: session store at maximum capacity (1 sessions)"
        );
    }

    #[test]
    fn server_error_source_is_wrapped_error() {
        let err = ServerError::from(ConfigError::InvalidFormat {
            var: "PORT".to_string(),
            message: "contains invalid unicode".to_string(),
        });
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "configuration error: invalid format for PORT: contains invalid unicode"
        );
    }
}
