use thiserror::Error;

/// 設定書き込み時に同期的に返すモデルエラー
///
/// Validation errors are surfaced to the administrative caller verbatim;
/// permission and not-found errors abort the operation without side effects.
/// Conflicts come out of the dispatch compare-and-set and are handled by the
/// dispatcher, never by the administrative caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl ModelError {
    pub fn validation(message: impl Into<String>) -> Self {
        ModelError::Validation(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        ModelError::PermissionDenied(message.into())
    }
}
