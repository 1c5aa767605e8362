use thiserror::Error;

/// Failure of a registry operation.
///
/// This type:
/// - Separates caller mistakes (`Validation`) and missing resources (`NotFound`)
///   from everything else (`Internal`)
/// - Keeps the underlying cause of internal failures for logging
/// - Carries no protocol-specific error codes; the tool layer maps them
///
/// # Example
///
/// ```rust,ignore
/// use crate::service::error::{ServiceError, ServiceErrorExt};
///
/// let projects = client
///     .list_projects()
///     .await
///     .internal_err("Failed to get projects")?;
///
/// if name.is_empty() {
///     return Err(ServiceError::validation("project_name is required"));
/// }
/// ```
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required input was missing or empty; no remote call was made
    #[error("{0}")]
    Validation(String),

    /// The named resource (or tag/version within it) does not exist
    #[error("{0}")]
    NotFound(String),

    /// The remote call failed or an internal invariant broke
    #[error("{message}{}", .cause.as_ref().map(|c| format!(": {:#}", c)).unwrap_or_default())]
    Internal {
        /// Which high-level operation failed
        message: String,
        cause: Option<anyhow::Error>,
    },
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Internal failure without an underlying error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            cause: None,
        }
    }

    pub fn internal_anyhow(cause: anyhow::Error, message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            cause: Some(cause),
        }
    }
}

/// Extension trait for Result types to wrap any error as [`ServiceError::Internal`]
///
/// ```rust,ignore
/// let artifacts = client
///     .list_artifacts(project, repository)
///     .await
///     .internal_err("Failed to get tags")?;
/// ```
pub trait ServiceErrorExt<T> {
    fn internal_err(self, message: impl Into<String>) -> Result<T, ServiceError>;
}

impl<T, E> ServiceErrorExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn internal_err(self, message: impl Into<String>) -> Result<T, ServiceError> {
        self.map_err(|e| ServiceError::internal_anyhow(e.into(), message))
    }
}
