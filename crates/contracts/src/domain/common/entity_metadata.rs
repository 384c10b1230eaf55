use serde::{Deserialize, Serialize};

/// Метаданные экземпляра агрегата (lifecycle tracking)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Дата создания записи
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Дата последнего обновления
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Кто создал запись
    pub created_by: Option<String>,
    /// Кто обновил запись последним
    pub updated_by: Option<String>,
    /// Версия для optimistic locking
    pub version: i32,
}

impl EntityMetadata {
    /// Создать новые метаданные для нового агрегата
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
            version: 0,
        }
    }

    /// Проставить audit-штампы из контекста вызова
    pub fn stamp(&mut self, ctx: &AuditContext) {
        self.updated_at = ctx.at;
        self.updated_by = Some(ctx.actor.clone());
    }

    /// Увеличить версию
    pub fn increment_version(&mut self) {
        self.version += 1;
    }
}

impl Default for EntityMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Явный контекст мутации: кто и когда.
///
/// Передаётся параметром в каждый мутирующий вызов вместо thread-local
/// "текущего пользователя".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditContext {
    /// Идентификатор оператора (логин бэк-офиса или имя системного процесса)
    pub actor: String,
    /// Момент операции
    pub at: chrono::DateTime<chrono::Utc>,
}

impl AuditContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            at: chrono::Utc::now(),
        }
    }

    /// Контекст системного процесса (миграции, бутстрап)
    pub fn system() -> Self {
        Self::new("system")
    }
}
