//! Error types for pool operations.
//!
//! Errors are explicit and typed (no stringly-typed errors). Task panics
//! are isolated at the worker: a plain submission swallows them, a
//! submission with a result handle surfaces them as
//! [`ErrorKind::TaskPanicked`] when the handle is read.

use core::fmt;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Configuration rejected at pool construction.
    InvalidConfig,
    /// A worker thread could not be spawned.
    ThreadSpawn,
    /// Submission refused because the pool is shutting down.
    ShuttingDown,
    /// A task submitted with a result handle panicked.
    TaskPanicked,
}

impl ErrorKind {
    /// Returns a static description of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidConfig => "invalid configuration",
            Self::ThreadSpawn => "worker thread spawn failed",
            Self::ShuttingDown => "pool is shutting down",
            Self::TaskPanicked => "task panicked",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type for pool operations.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Attaches a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the attached message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns true if this error was caused by pool shutdown.
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        matches!(self.kind, ErrorKind::ShuttingDown)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.kind),
            None => self.kind.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
