//! Сервис клиентского агрегата: мутации через optimistic concurrency guard.
//!
//! Каждая мутация выполняется в одной транзакции: load → проверка версии →
//! условная запись с version-предикатом в WHERE. Конфликт версий никогда
//! не разрешается молча в пользу последней записи — он возвращается
//! вызывающему как `VersionConflict`.

use std::time::Duration;

use contracts::domain::a001_customer::aggregate::{Customer, CustomerStatus};
use contracts::domain::a001_customer::patch::{CustomerDto, CustomerPatch};
use contracts::domain::a001_customer::search::{
    CustomerSearchCriteria, CustomerSort, FetchTier, Page, PageRequest,
};
use contracts::domain::common::AuditContext;
use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use super::error::{CustomerStoreError, StoreResult};
use super::repository;

/// Создать нового клиента: статус ACTIVE, версия 0.
///
/// Дочерние коллекции при создании пусты; они наполняются через `update`.
pub async fn create(
    db: &DatabaseConnection,
    dto: CustomerDto,
    ctx: &AuditContext,
) -> StoreResult<Customer> {
    let code = dto
        .code
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| format!("CUS-{}", Uuid::new_v4()));

    let mut aggregate = Customer::new_for_insert(code, dto.first_name, dto.last_name);
    aggregate.middle_name = dto.middle_name;
    aggregate.date_of_birth = dto.date_of_birth;
    aggregate.email = dto.email;
    aggregate.phone = dto.phone;
    aggregate.base.comment = dto.comment;
    aggregate.segment_code = dto.segment_code;
    aggregate.risk_level_code = dto.risk_level_code;
    aggregate.kyc_status_code = dto.kyc_status_code;
    aggregate.occupation_code = dto.occupation_code;
    aggregate.industry_code = dto.industry_code;
    aggregate.sector_code = dto.sector_code;

    aggregate.validate().map_err(CustomerStoreError::Validation)?;

    aggregate.base.metadata.created_at = ctx.at;
    aggregate.base.metadata.created_by = Some(ctx.actor.clone());
    aggregate.base.metadata.stamp(ctx);

    repository::insert(db, &aggregate).await?;
    Ok(aggregate)
}

/// Частичное обновление под version guard-ом.
///
/// Применяются только присутствующие в patch-е поля (merge patch, не полная
/// замена). Успешная мутация увеличивает версию ровно на единицу.
pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    expected_version: i32,
    patch: CustomerPatch,
    ctx: &AuditContext,
) -> StoreResult<Customer> {
    let txn = db.begin().await.map_err(CustomerStoreError::Storage)?;

    let model = repository::find_model(&txn, id)
        .await?
        .ok_or(CustomerStoreError::NotFound(id))?;
    if model.status == CustomerStatus::Deleted.as_str() {
        return Err(CustomerStoreError::Validation(
            "Обновление удалённого клиента запрещено".into(),
        ));
    }
    if model.version != expected_version {
        return Err(CustomerStoreError::VersionConflict {
            expected: expected_version,
            actual: model.version,
        });
    }

    let mut aggregate: Customer = model.into();
    patch.apply_scalar(&mut aggregate);

    // Замена дочерних коллекций: не более одного default на коллекцию,
    // последняя отметка выигрывает
    let addresses = patch.addresses.map(|items| {
        let mut list: Vec<_> = items.into_iter().map(|i| i.into_address()).collect();
        normalize_primary(&mut list, |a| a.is_primary, |a| a.is_primary = false);
        list
    });
    let identifications = patch.identifications.map(|items| {
        let mut list: Vec<_> = items.into_iter().map(|i| i.into_identification()).collect();
        normalize_primary(&mut list, |i| i.is_primary, |i| i.is_primary = false);
        list
    });
    let relationships = patch.relationships.map(|items| {
        let mut list: Vec<_> = items.into_iter().map(|i| i.into_relationship()).collect();
        normalize_primary(&mut list, |r| r.is_primary, |r| r.is_primary = false);
        list
    });
    let products = patch.products.map(|items| {
        let mut list: Vec<_> = items.into_iter().map(|i| i.into_product()).collect();
        normalize_primary(&mut list, |p| p.is_primary, |p| p.is_primary = false);
        list
    });

    aggregate.validate().map_err(CustomerStoreError::Validation)?;
    aggregate.base.metadata.stamp(ctx);

    repository::update_scalars_conditional(&txn, &aggregate, expected_version).await?;

    let id_str = aggregate.to_string_id();
    if let Some(list) = &addresses {
        repository::replace_addresses(&txn, &id_str, list).await?;
    }
    if let Some(list) = &identifications {
        repository::replace_identifications(&txn, &id_str, list).await?;
    }
    if let Some(list) = &relationships {
        repository::replace_relationships(&txn, &id_str, list).await?;
    }
    if let Some(list) = &products {
        repository::replace_products(&txn, &id_str, list).await?;
    }

    txn.commit().await.map_err(CustomerStoreError::Storage)?;

    repository::get_by_id(db, id, FetchTier::Full).await
}

pub async fn activate(
    db: &DatabaseConnection,
    id: Uuid,
    expected_version: Option<i32>,
    ctx: &AuditContext,
) -> StoreResult<()> {
    set_status(db, id, CustomerStatus::Active, expected_version, ctx).await
}

pub async fn deactivate(
    db: &DatabaseConnection,
    id: Uuid,
    expected_version: Option<i32>,
    ctx: &AuditContext,
) -> StoreResult<()> {
    set_status(db, id, CustomerStatus::Inactive, expected_version, ctx).await
}

/// Мягкое удаление: status → DELETED под version guard-ом.
/// Запись остаётся читаемой через `get_by_id`.
pub async fn soft_delete(
    db: &DatabaseConnection,
    id: Uuid,
    expected_version: Option<i32>,
    ctx: &AuditContext,
) -> StoreResult<()> {
    set_status(db, id, CustomerStatus::Deleted, expected_version, ctx).await
}

/// Переход статуса. Без явной ожидаемой версии guard работает по последней
/// загруженной; вызывающему, которому нужна строгая детекция конфликтов,
/// следует передать её явно. Из `DELETED` возврата нет.
async fn set_status(
    db: &DatabaseConnection,
    id: Uuid,
    target: CustomerStatus,
    expected_version: Option<i32>,
    ctx: &AuditContext,
) -> StoreResult<()> {
    let txn = db.begin().await.map_err(CustomerStoreError::Storage)?;

    let model = repository::find_model(&txn, id)
        .await?
        .ok_or(CustomerStoreError::NotFound(id))?;

    if model.status == CustomerStatus::Deleted.as_str() {
        if target == CustomerStatus::Deleted {
            // повторное мягкое удаление — no-op
            return Ok(());
        }
        return Err(CustomerStoreError::Validation(
            "Возврат из статуса DELETED не предусмотрен".into(),
        ));
    }

    let expected = expected_version.unwrap_or(model.version);
    repository::update_status_conditional(&txn, id, target, expected, ctx.at, &ctx.actor).await?;

    txn.commit().await.map_err(CustomerStoreError::Storage)?;
    Ok(())
}

/// Жёсткое удаление: деструктивно, без version guard-а (last write wins
/// by design), сносит корень и дочерние строки
pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> StoreResult<()> {
    let txn = db.begin().await.map_err(CustomerStoreError::Storage)?;
    repository::hard_delete(&txn, id).await?;
    txn.commit().await.map_err(CustomerStoreError::Storage)?;
    Ok(())
}

pub async fn get_by_id(
    db: &DatabaseConnection,
    id: Uuid,
    tier: FetchTier,
) -> StoreResult<Customer> {
    repository::get_by_id(db, id, tier).await
}

pub async fn search(
    db: &DatabaseConnection,
    criteria: &CustomerSearchCriteria,
    tier: FetchTier,
    page: PageRequest,
    sort: CustomerSort,
    hydration_budget: Duration,
) -> StoreResult<Page<Customer>> {
    repository::search_page(db, criteria, tier, page, sort, hydration_budget).await
}

pub async fn list_all(
    db: &DatabaseConnection,
    criteria: &CustomerSearchCriteria,
    tier: FetchTier,
    sort: CustomerSort,
) -> StoreResult<Vec<Customer>> {
    repository::list_all(db, criteria, tier, sort).await
}

/// Оставить не более одной default-отметки; при нескольких выигрывает
/// последняя по порядку списка
fn normalize_primary<T>(
    items: &mut [T],
    is_primary: impl Fn(&T) -> bool,
    clear: impl Fn(&mut T),
) {
    if let Some(keep) = items.iter().rposition(&is_primary) {
        for (i, item) in items.iter_mut().enumerate() {
            if i != keep && is_primary(item) {
                clear(item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_test;
    use contracts::domain::a001_customer::patch::AddressInput;

    fn ctx(actor: &str) -> AuditContext {
        AuditContext::new(actor)
    }

    fn dto(first: &str, last: &str) -> CustomerDto {
        CustomerDto {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: Some("anna@example.com".into()),
            segment_code: Some("RETAIL".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_get_full_round_trip() {
        let db = connect_test().await;
        let created = create(&db, dto("Anna", "Ivanova"), &ctx("operator1"))
            .await
            .unwrap();
        assert_eq!(created.status, CustomerStatus::Active);
        assert_eq!(created.base.metadata.version, 0);

        let loaded = get_by_id(&db, created.base.id.value(), FetchTier::Full)
            .await
            .unwrap();
        assert_eq!(loaded.first_name, "Anna");
        assert_eq!(loaded.last_name, "Ivanova");
        assert_eq!(loaded.email.as_deref(), Some("anna@example.com"));
        assert_eq!(loaded.segment_code.as_deref(), Some("RETAIL"));
        assert_eq!(loaded.base.metadata.created_by.as_deref(), Some("operator1"));
        assert!(loaded.addresses.is_empty());
        assert!(loaded.identifications.is_empty());
        assert!(loaded.relationships.is_empty());
        assert!(loaded.products.is_empty());
    }

    #[tokio::test]
    async fn generated_code_when_absent() {
        let db = connect_test().await;
        let created = create(&db, dto("Anna", "Ivanova"), &ctx("op")).await.unwrap();
        assert!(created.base.code.starts_with("CUS-"));
    }

    #[tokio::test]
    async fn merge_patch_applies_only_present_fields() {
        let db = connect_test().await;
        let created = create(&db, dto("Anna", "Ivanova"), &ctx("op")).await.unwrap();
        let id = created.base.id.value();

        let patch = CustomerPatch {
            phone: Some("+7-900-000-00-00".into()),
            ..Default::default()
        };
        let updated = update(&db, id, 0, patch, &ctx("operator2")).await.unwrap();

        // версия строго +1, незатронутые поля не меняются
        assert_eq!(updated.base.metadata.version, 1);
        assert_eq!(updated.phone.as_deref(), Some("+7-900-000-00-00"));
        assert_eq!(updated.email.as_deref(), Some("anna@example.com"));
        assert_eq!(updated.first_name, "Anna");
        assert_eq!(updated.base.metadata.updated_by.as_deref(), Some("operator2"));
    }

    #[tokio::test]
    async fn stale_version_is_conflict_and_leaves_record_unchanged() {
        let db = connect_test().await;
        let created = create(&db, dto("Anna", "Ivanova"), &ctx("op")).await.unwrap();
        let id = created.base.id.value();

        let first = CustomerPatch {
            email: Some("new@example.com".into()),
            ..Default::default()
        };
        update(&db, id, 0, first, &ctx("op1")).await.unwrap();

        let second = CustomerPatch {
            email: Some("loser@example.com".into()),
            ..Default::default()
        };
        let err = update(&db, id, 0, second, &ctx("op2")).await.unwrap_err();
        assert!(matches!(
            err,
            CustomerStoreError::VersionConflict {
                expected: 0,
                actual: 1
            }
        ));

        let loaded = get_by_id(&db, id, FetchTier::Summary).await.unwrap();
        assert_eq!(loaded.email.as_deref(), Some("new@example.com"));
        assert_eq!(loaded.base.metadata.version, 1);
    }

    #[tokio::test]
    async fn two_writers_loaded_same_version_only_first_commits() {
        let db = connect_test().await;
        let created = create(&db, dto("Anna", "Ivanova"), &ctx("op")).await.unwrap();
        let id = created.base.id.value();

        // довести запись до версии 3
        for v in 0..3 {
            let patch = CustomerPatch {
                comment: Some(format!("правка {}", v)),
                ..Default::default()
            };
            update(&db, id, v, patch, &ctx("op")).await.unwrap();
        }

        // оба "загрузили" версию 3
        let winner = CustomerPatch {
            segment_code: Some("PREMIUM".into()),
            ..Default::default()
        };
        let loser = CustomerPatch {
            segment_code: Some("MASS".into()),
            ..Default::default()
        };

        let updated = update(&db, id, 3, winner, &ctx("writer1")).await.unwrap();
        assert_eq!(updated.base.metadata.version, 4);

        let err = update(&db, id, 3, loser, &ctx("writer2")).await.unwrap_err();
        assert!(matches!(err, CustomerStoreError::VersionConflict { .. }));

        let loaded = get_by_id(&db, id, FetchTier::Summary).await.unwrap();
        assert_eq!(loaded.segment_code.as_deref(), Some("PREMIUM"));
    }

    #[tokio::test]
    async fn soft_delete_keeps_record_hard_delete_removes_it() {
        let db = connect_test().await;
        let created = create(&db, dto("Anna", "Ivanova"), &ctx("op")).await.unwrap();
        let id = created.base.id.value();

        soft_delete(&db, id, None, &ctx("op")).await.unwrap();
        let loaded = get_by_id(&db, id, FetchTier::Summary).await.unwrap();
        assert_eq!(loaded.status, CustomerStatus::Deleted);

        hard_delete(&db, id).await.unwrap();
        let err = get_by_id(&db, id, FetchTier::Summary).await.unwrap_err();
        assert!(matches!(err, CustomerStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn soft_deleted_hidden_from_default_search() {
        let db = connect_test().await;
        let created = create(&db, dto("Anna", "Ivanova"), &ctx("op")).await.unwrap();
        soft_delete(&db, created.base.id.value(), None, &ctx("op"))
            .await
            .unwrap();

        let visible = list_all(
            &db,
            &CustomerSearchCriteria::default(),
            FetchTier::Summary,
            CustomerSort::default(),
        )
        .await
        .unwrap();
        assert!(visible.is_empty());

        let with_deleted = list_all(
            &db,
            &CustomerSearchCriteria {
                status: Some(CustomerStatus::Deleted),
                ..Default::default()
            },
            FetchTier::Summary,
            CustomerSort::default(),
        )
        .await
        .unwrap();
        assert_eq!(with_deleted.len(), 1);
    }

    #[tokio::test]
    async fn no_way_back_from_deleted() {
        let db = connect_test().await;
        let created = create(&db, dto("Anna", "Ivanova"), &ctx("op")).await.unwrap();
        let id = created.base.id.value();
        soft_delete(&db, id, None, &ctx("op")).await.unwrap();

        let err = activate(&db, id, None, &ctx("op")).await.unwrap_err();
        assert!(matches!(err, CustomerStoreError::Validation(_)));

        let err = update(&db, id, 1, CustomerPatch::default(), &ctx("op"))
            .await
            .unwrap_err();
        assert!(matches!(err, CustomerStoreError::Validation(_)));

        // повторное мягкое удаление — no-op
        soft_delete(&db, id, None, &ctx("op")).await.unwrap();
    }

    #[tokio::test]
    async fn status_transition_bumps_version_once() {
        let db = connect_test().await;
        let created = create(&db, dto("Anna", "Ivanova"), &ctx("op")).await.unwrap();
        let id = created.base.id.value();

        deactivate(&db, id, None, &ctx("op")).await.unwrap();
        let loaded = get_by_id(&db, id, FetchTier::Summary).await.unwrap();
        assert_eq!(loaded.status, CustomerStatus::Inactive);
        assert_eq!(loaded.base.metadata.version, 1);

        // строгая детекция по явной версии
        let err = deactivate(&db, id, Some(0), &ctx("op")).await.unwrap_err();
        assert!(matches!(err, CustomerStoreError::VersionConflict { .. }));
    }

    #[tokio::test]
    async fn primary_flag_is_normalized_on_write() {
        let db = connect_test().await;
        let created = create(&db, dto("Anna", "Ivanova"), &ctx("op")).await.unwrap();
        let id = created.base.id.value();

        let mk = |city: &str| AddressInput {
            address_type: "RESIDENTIAL".into(),
            line1: "дом 1".into(),
            city: city.into(),
            country_code: "RU".into(),
            is_active: true,
            is_primary: true,
            ..Default::default()
        };
        let patch = CustomerPatch {
            addresses: Some(vec![mk("Казань"), mk("Москва")]),
            ..Default::default()
        };
        let updated = update(&db, id, 0, patch, &ctx("op")).await.unwrap();

        let primaries: Vec<_> = updated
            .addresses
            .iter()
            .filter(|a| a.is_primary)
            .collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].city, "Москва");
    }

    #[tokio::test]
    async fn empty_last_name_is_validation_error() {
        let db = connect_test().await;
        let err = create(&db, dto("Anna", "  "), &ctx("op")).await.unwrap_err();
        assert!(matches!(err, CustomerStoreError::Validation(_)));
    }
}
