use std::fmt::Debug;

use thiserror::Error;

/// Typed error for DAO and record service operations.
///
/// Directive-level problems (unknown attributes, values that do not coerce)
/// never show up here; those directives are dropped while the query is built.
#[derive(Debug, Error)]
pub enum DaoError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    #[error("{entity} already exists: {key}")]
    Conflict { entity: String, key: String },

    #[error(transparent)]
    Store(#[from] sea_orm::DbErr),
}

impl DaoError {
    pub fn not_found(entity: impl Into<String>, key: impl Debug) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: format!("{key:?}"),
        }
    }

    pub fn conflict(entity: impl Into<String>, key: impl Debug) -> Self {
        Self::Conflict {
            entity: entity.into(),
            key: format!("{key:?}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Library-local result type.
pub type DaoResult<T> = Result<T, DaoError>;
