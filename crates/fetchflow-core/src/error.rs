//! Application error types with rich context

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Remote/Orchestration Errors
    // ─────────────────────────────────────────────────────────────
    /// A recoverable failure reported by the remote data source.
    ///
    /// Displayed verbatim so the UI can show the cause as-is.
    #[error("{message}")]
    Remote { message: String },

    /// The wrapped work did not finish within `limit`.
    #[error("{message} ({}ms)", .limit.as_millis())]
    Timeout { message: String, limit: Duration },

    /// The operation was cancelled on purpose (superseded or user request).
    ///
    /// Never retried and never converted into another variant.
    #[error("Operation cancelled")]
    Cancelled,

    /// Every retry attempt failed. Displays the last attempt's error.
    #[error("{last}")]
    RetriesExhausted { attempts: u32, last: Box<Error> },

    /// A spawned background task panicked or was aborted unexpectedly.
    #[error("Background task failed: {message}")]
    Task { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>, limit: Duration) -> Self {
        Self::Timeout {
            message: message.into(),
            limit,
        }
    }

    pub fn retries_exhausted(attempts: u32, last: Error) -> Self {
        Self::RetriesExhausted {
            attempts,
            last: Box::new(last),
        }
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    /// Check if this error is a deliberate cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Check if this error came from a timer firing first
    pub fn is_timeout(&self) -> bool {
        matches!(self.last_attempt_error(), Error::Timeout { .. })
    }

    /// The error of the final attempt.
    ///
    /// For [`Error::RetriesExhausted`] this unwraps to the error the last
    /// attempt produced; every other variant returns itself.
    pub fn last_attempt_error(&self) -> &Error {
        match self {
            Error::RetriesExhausted { last, .. } => last.last_attempt_error(),
            other => other,
        }
    }

    /// Check if retrying the same operation could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Remote { .. } | Error::Timeout { .. } | Error::RetriesExhausted { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_displays_verbatim() {
        let err = Error::remote("Sporadic connection error");
        assert_eq!(err.to_string(), "Sporadic connection error");
    }

    #[test]
    fn test_timeout_display_includes_limit_in_millis() {
        let err = Error::timeout("Timeout fetching users", Duration::from_secs(3));
        assert_eq!(err.to_string(), "Timeout fetching users (3000ms)");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_retries_exhausted_displays_last_error() {
        let err = Error::retries_exhausted(3, Error::remote("attempt #3 failed"));
        assert_eq!(err.to_string(), "attempt #3 failed");
        assert_eq!(err.last_attempt_error().to_string(), "attempt #3 failed");
    }

    #[test]
    fn test_retries_exhausted_of_timeouts_is_timeout() {
        let err = Error::retries_exhausted(
            2,
            Error::timeout("slow", Duration::from_millis(10)),
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_context_keeps_the_underlying_error() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = io.context("Failed to write settings").unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        let ok: Result<u32> = Ok::<u32, Error>(7).with_context(|| "unused".to_string());
        assert_eq!(ok.unwrap(), 7);
    }

    #[test]
    fn test_cancelled_is_not_recoverable() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Cancelled.is_recoverable());
        assert!(!Error::remote("x").is_cancelled());
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::remote("test").is_recoverable());
        assert!(Error::timeout("t", Duration::from_millis(1)).is_recoverable());
        assert!(!Error::config("bad").is_recoverable());
        assert!(!Error::ChannelClosed.is_recoverable());
    }

    #[test]
    fn test_error_constructors() {
        let _ = Error::task("panicked");
        let _ = Error::config("test");
        let _ = Error::config_invalid("test");
    }
}
