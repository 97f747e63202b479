//! Error types shared by the engine.
//!
//! Two kinds of failure matter to callers: a [`BabbageError::Binding`] means
//! the model cannot be mapped onto the physical schema (a deployment defect),
//! a [`BabbageError::Query`] means the request itself is malformed. Neither is
//! retried. Backend failures pass through untouched.

use serde::Serialize;

use crate::config::SettingsError;

/// Structured detail attached to binding and query errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Query-language construct the error belongs to (cut, field, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construct: Option<String>,
    /// Byte offset into the query string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use = "builders have no effect until used"]
    pub fn with_construct(mut self, construct: impl Into<String>) -> Self {
        self.construct = Some(construct.into());
        self
    }

    #[must_use = "builders have no effect until used"]
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BabbageError {
    /// The logical model does not fit the physical schema.
    #[error("Binding error: {message}")]
    Binding {
        message: String,
        context: ErrorContext,
    },

    /// The caller's request is malformed or invalid against the model.
    #[error("Query error: {message}")]
    Query {
        message: String,
        context: ErrorContext,
    },

    /// A model spec could not be read or violates a structural invariant.
    #[error("Invalid model: {0}")]
    Model(String),

    #[error("No such cube: {0:?}")]
    NoSuchCube(String),

    #[error("Configuration error: {0}")]
    Config(#[from] SettingsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure inside the SQL backend, propagated unmodified.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

pub type BabbageResult<T> = Result<T, BabbageError>;

impl BabbageError {
    pub fn binding(message: impl Into<String>, context: ErrorContext) -> Self {
        BabbageError::Binding {
            message: message.into(),
            context,
        }
    }

    pub fn query(message: impl Into<String>, context: ErrorContext) -> Self {
        BabbageError::Query {
            message: message.into(),
            context,
        }
    }

    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        BabbageError::Backend(Box::new(err))
    }

    pub fn is_binding(&self) -> bool {
        matches!(self, BabbageError::Binding { .. })
    }

    pub fn is_query(&self) -> bool {
        matches!(self, BabbageError::Query { .. })
    }

    /// Structured context, when the error carries one.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            BabbageError::Binding { context, .. } | BabbageError::Query { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// HTTP-equivalent status for API layers sitting on top of the engine.
    pub fn http_status(&self) -> u16 {
        match self {
            BabbageError::Query { .. } => 400,
            BabbageError::NoSuchCube(_) => 404,
            _ => 500,
        }
    }
}

impl From<rusqlite::Error> for BabbageError {
    fn from(err: rusqlite::Error) -> Self {
        BabbageError::backend(err)
    }
}

impl From<serde_json::Error> for BabbageError {
    fn from(err: serde_json::Error) -> Self {
        BabbageError::Model(err.to_string())
    }
}
