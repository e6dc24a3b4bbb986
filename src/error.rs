//! Error handling for stack-probe
//!
//! This module defines the probe error taxonomy and a Result alias for use
//! throughout the crate. Per-command failures are produced here and consumed
//! by the dispatcher, which logs them and moves on to the next command.

use thiserror::Error;

/// Main error type for probe operations
#[derive(Error, Debug)]
pub enum ProbeError {
    /// No component with the given class or instance name is in the stack
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// No invokable operation with matching name and arity
    #[error("Operation {operation} not found in {component}")]
    OperationNotFound { operation: String, component: String },

    /// A raw string could not be converted to the declared type
    #[error("Cannot convert {value:?} to {target}: {reason}")]
    ArgumentConversion {
        value: String,
        target: String,
        reason: String,
    },

    /// Neither a field nor a setter accepted the write
    #[error("Failed setting {name} to {value}: {reason}")]
    AttributeNotWritable {
        name: String,
        value: String,
        reason: String,
    },

    /// The command text does not follow the grammar
    #[error("Malformed command {command:?}: {reason}")]
    MalformedCommand { command: String, reason: String },

    /// CPU or contention monitoring is not available on this platform
    #[error("Unsupported platform capability: {0}")]
    UnsupportedPlatformCapability(String),

    /// Two components in one stack share an instance name
    #[error("Duplicate component name: {0}")]
    DuplicateComponent(String),

    /// Failure raised by an operation body or setter
    #[error("Operation failed: {0}")]
    Operation(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// No reply arrived from the probe handler in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProbeError>,
    },
}

impl ProbeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProbeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a [`ProbeError::MalformedCommand`]
    pub fn malformed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        ProbeError::MalformedCommand {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProbeError::ComponentNotFound("UDP".to_string());
        assert_eq!(err.to_string(), "Component not found: UDP");
    }

    #[test]
    fn test_operation_not_found_names_both_sides() {
        let err = ProbeError::OperationNotFound {
            operation: "flush".to_string(),
            component: "NAKACK".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("flush"));
        assert!(text.contains("NAKACK"));
    }

    #[test]
    fn test_error_with_context() {
        let err = ProbeError::malformed("op=A.m[1", "] not found");
        let with_ctx = err.with_context("invoking A.m");
        assert!(with_ctx.to_string().starts_with("invoking A.m"));
        assert!(with_ctx.to_string().contains("] not found"));
    }

    #[test]
    fn test_result_ext_context() {
        let res: Result<()> = Err(ProbeError::Operation("boom".to_string()));
        let err = res.context("calling A.reset").unwrap_err();
        assert!(matches!(err, ProbeError::WithContext { .. }));
    }
}
