//! Unified error handling system
//!
//! Infrastructure failures (storage, configuration, hashing) carry an
//! [`ErrorContext`] so a log line can be correlated with what the operator saw.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

pub type GatehouseResult<T> = Result<T, GatehouseError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for Gatehouse infrastructure
#[derive(Error, Debug)]
pub enum GatehouseError {
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// A uniqueness constraint rejected an insert.
    #[error("Duplicate entry: {message}")]
    Duplicate {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Password hashing error: {message}")]
    Hashing {
        message: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

}

impl GatehouseError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            GatehouseError::Storage { context, .. } => Some(context),
            GatehouseError::Duplicate { context, .. } => Some(context),
            GatehouseError::Config { context, .. } => Some(context),
            GatehouseError::Hashing { context, .. } => Some(context),
            GatehouseError::Io(_) => None,
        }
    }

    /// Wrap a storage driver error
    pub fn storage<E>(message: impl Into<String>, component: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GatehouseError::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
            context: ErrorContext::new(component),
        }
    }

    /// Whether this error reports a uniqueness violation
    pub fn is_duplicate(&self) -> bool {
        matches!(self, GatehouseError::Duplicate { .. })
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            GatehouseError::Storage { .. } => {
                error!(error_id = ?error_id, error = %self, "Storage error occurred");
            }
            GatehouseError::Config { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration error");
            }
            GatehouseError::Duplicate { .. } => {
                warn!(error_id = ?error_id, error = %self, "Uniqueness constraint rejected write");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::GatehouseError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::GatehouseError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::GatehouseError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'gatehouse config init' to create a default config"),
        }
    };
}

#[macro_export]
macro_rules! duplicate_error {
    ($msg:expr, $component:expr) => {
        $crate::GatehouseError::Duplicate {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let context = ErrorContext::new("store")
            .with_operation("insert_user")
            .with_metadata("table", "user")
            .with_suggestion("retry later");

        assert_eq!(context.component, "store");
        assert_eq!(context.operation.as_deref(), Some("insert_user"));
        assert_eq!(context.metadata.get("table").map(String::as_str), Some("user"));
        assert_eq!(context.recovery_suggestions.len(), 1);
        assert!(!context.error_id.is_empty());
    }

    #[test]
    fn test_duplicate_detection() {
        let dup = duplicate_error!("username taken", "store");
        assert!(dup.is_duplicate());
        assert!(dup.context().is_some());

        let storage = storage_error!("disk full", "store");
        assert!(!storage.is_duplicate());
        assert_eq!(storage.to_string(), "Storage error: disk full");
    }
}
