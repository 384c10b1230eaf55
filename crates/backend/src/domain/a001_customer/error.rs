use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, CustomerStoreError>;

/// Исходы операций над клиентским агрегатом.
///
/// `NotFound` и `VersionConflict` восстановимы на стороне вызывающего
/// (перечитать и повторить); `InvalidCriteria` — ошибка программиста;
/// `HydrationTimeout` повторяется перезапуском всего чтения, обе фазы.
#[derive(Debug, Error)]
pub enum CustomerStoreError {
    #[error("customer {0} not found")]
    NotFound(Uuid),

    #[error("version conflict: expected {expected}, stored {actual}")]
    VersionConflict { expected: i32, actual: i32 },

    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("hydration phase exceeded budget of {0:?}")]
    HydrationTimeout(Duration),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),
}

impl CustomerStoreError {
    /// Можно ли повторить операцию после перечитывания состояния
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CustomerStoreError::NotFound(_)
                | CustomerStoreError::VersionConflict { .. }
                | CustomerStoreError::HydrationTimeout(_)
        )
    }
}
