//! Хранилище агрегата клиента: двухфазное чтение и условные записи.
//!
//! Пагинация и жадная загрузка one-to-many коллекций в одном запросе
//! несовместимы: каждая дочерняя строка размножает корень до применения
//! окна страницы. Поэтому чтение двухфазное:
//!
//! 1. фильтр + сортировка + offset/limit только по корневой таблице,
//!    на выходе идентификаторы страницы и отдельный COUNT без join-ов;
//! 2. догрузка строк и дочерних коллекций по `id IN (страница)`,
//!    без offset/limit, с восстановлением порядка фазы 1.

use std::collections::HashMap;
use std::time::Duration;

use contracts::domain::a001_customer::aggregate::{Customer, CustomerStatus};
use contracts::domain::a001_customer::search::{
    CustomerSearchCriteria, CustomerSort, CustomerSortBy, FetchTier, Page, PageRequest,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::entity::{address, customer, identification, product, relationship};
use super::error::{CustomerStoreError, StoreResult};
use super::filter;
use super::hydration::{self, ChildCollection};

fn sort_column(sort_by: CustomerSortBy) -> customer::Column {
    match sort_by {
        CustomerSortBy::Code => customer::Column::Code,
        CustomerSortBy::Description => customer::Column::Description,
        CustomerSortBy::LastName => customer::Column::LastName,
        CustomerSortBy::DateOfBirth => customer::Column::DateOfBirth,
        CustomerSortBy::CreatedAt => customer::Column::CreatedAt,
        CustomerSortBy::UpdatedAt => customer::Column::UpdatedAt,
    }
}

/// Двухфазное постраничное чтение.
///
/// Бюджет `hydration_budget` покрывает только фазу 2; по его истечении
/// операция завершается `HydrationTimeout` — частично гидратированные
/// корни не возвращаются никогда.
pub async fn search_page<C: ConnectionTrait>(
    db: &C,
    criteria: &CustomerSearchCriteria,
    tier: FetchTier,
    page: PageRequest,
    sort: CustomerSort,
    hydration_budget: Duration,
) -> StoreResult<Page<Customer>> {
    if page.size == 0 {
        return Err(CustomerStoreError::InvalidCriteria(
            "page size must be positive".into(),
        ));
    }

    let cond = filter::compose(criteria)?;

    // Фаза 1: общее количество считается по корням, без join-ов
    let total = customer::Entity::find()
        .filter(cond.clone())
        .count(db)
        .await?;

    let order = if sort.sort_desc { Order::Desc } else { Order::Asc };
    let ids: Vec<String> = customer::Entity::find()
        .filter(cond)
        .order_by(sort_column(sort.sort_by), order)
        // стабильный tiebreak: одинаковые значения сортировки не должны
        // перемешивать страницы между запросами
        .order_by(customer::Column::Id, Order::Asc)
        .select_only()
        .column(customer::Column::Id)
        .offset(page.offset())
        .limit(page.size)
        .into_tuple()
        .all(db)
        .await?;

    if ids.is_empty() {
        return Ok(Page {
            items: Vec::new(),
            total,
            page: page.page,
            size: page.size,
        });
    }

    // Фаза 2: гидратация ровно этой страницы идентификаторов
    let items = tokio::time::timeout(hydration_budget, hydrate_ids(db, &ids, tier))
        .await
        .map_err(|_| CustomerStoreError::HydrationTimeout(hydration_budget))??;

    Ok(Page {
        items,
        total,
        page: page.page,
        size: page.size,
    })
}

/// Непагинированный список: фаза 1 без окна, гидратация той же дисциплиной
pub async fn list_all<C: ConnectionTrait>(
    db: &C,
    criteria: &CustomerSearchCriteria,
    tier: FetchTier,
    sort: CustomerSort,
) -> StoreResult<Vec<Customer>> {
    let cond = filter::compose(criteria)?;
    let order = if sort.sort_desc { Order::Desc } else { Order::Asc };
    let ids: Vec<String> = customer::Entity::find()
        .filter(cond)
        .order_by(sort_column(sort.sort_by), order)
        .order_by(customer::Column::Id, Order::Asc)
        .select_only()
        .column(customer::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    hydrate_ids(db, &ids, tier).await
}

/// Чтение по ID: вырожденный случай двухфазного чтения с одноэлементным
/// множеством идентификаторов. Мягко удалённый клиент остаётся читаемым.
pub async fn get_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    tier: FetchTier,
) -> StoreResult<Customer> {
    let ids = vec![id.to_string()];
    hydrate_ids(db, &ids, tier)
        .await?
        .pop()
        .ok_or(CustomerStoreError::NotFound(id))
}

/// Точечное чтение сырой модели (для guard-а мутаций)
pub async fn find_model<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> StoreResult<Option<customer::Model>> {
    Ok(customer::Entity::find_by_id(id.to_string()).one(db).await?)
}

/// Гидратация набора идентификаторов выбранным уровнем.
///
/// Дочерние коллекции читаются отдельными `IN`-запросами: корень с пустой
/// коллекцией не может выпасть из результата. Порядок входных
/// идентификаторов сохраняется; дубликаты схлопываются; корень, удалённый
/// между фазами, просто даёт на одну строку меньше.
async fn hydrate_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[String],
    tier: FetchTier,
) -> StoreResult<Vec<Customer>> {
    let rows = customer::Entity::find()
        .filter(customer::Column::Id.is_in(ids.to_vec()))
        .all(db)
        .await?;

    let mut by_id: HashMap<String, Customer> = rows
        .into_iter()
        .map(|m| (m.id.clone(), Customer::from(m)))
        .collect();

    if hydration::includes(tier, ChildCollection::Addresses) {
        let children = address::Entity::find()
            .filter(address::Column::CustomerId.is_in(ids.to_vec()))
            .order_by(address::Column::Id, Order::Asc)
            .all(db)
            .await?;
        for m in children {
            if let Some(c) = by_id.get_mut(&m.customer_id) {
                c.addresses.push(m.into());
            }
        }
    }
    if hydration::includes(tier, ChildCollection::Identifications) {
        let children = identification::Entity::find()
            .filter(identification::Column::CustomerId.is_in(ids.to_vec()))
            .order_by(identification::Column::Id, Order::Asc)
            .all(db)
            .await?;
        for m in children {
            if let Some(c) = by_id.get_mut(&m.customer_id) {
                c.identifications.push(m.into());
            }
        }
    }
    if hydration::includes(tier, ChildCollection::Relationships) {
        let children = relationship::Entity::find()
            .filter(relationship::Column::CustomerId.is_in(ids.to_vec()))
            .order_by(relationship::Column::Id, Order::Asc)
            .all(db)
            .await?;
        for m in children {
            if let Some(c) = by_id.get_mut(&m.customer_id) {
                c.relationships.push(m.into());
            }
        }
    }
    if hydration::includes(tier, ChildCollection::Products) {
        let children = product::Entity::find()
            .filter(product::Column::CustomerId.is_in(ids.to_vec()))
            .order_by(product::Column::Id, Order::Asc)
            .all(db)
            .await?;
        for m in children {
            if let Some(c) = by_id.get_mut(&m.customer_id) {
                c.products.push(m.into());
            }
        }
    }

    // порядок фазы 1, дедупликация по id
    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

// ============================================================================
// Записи
// ============================================================================

pub async fn insert<C: ConnectionTrait>(db: &C, aggregate: &Customer) -> StoreResult<()> {
    customer::Entity::insert(customer_active(aggregate))
        .exec(db)
        .await?;
    let id_str = aggregate.to_string_id();
    replace_addresses(db, &id_str, &aggregate.addresses).await?;
    replace_identifications(db, &id_str, &aggregate.identifications).await?;
    replace_relationships(db, &id_str, &aggregate.relationships).await?;
    replace_products(db, &id_str, &aggregate.products).await?;
    Ok(())
}

/// Условная запись скалярных полей: WHERE несёт и id, и ожидаемую версию,
/// так что гонка между проверкой и записью закрыта самим UPDATE-ом.
/// Успех записывает `version = expected + 1`.
pub async fn update_scalars_conditional<C: ConnectionTrait>(
    db: &C,
    aggregate: &Customer,
    expected_version: i32,
) -> StoreResult<()> {
    let id_str = aggregate.to_string_id();
    let result = customer::Entity::update_many()
        .col_expr(customer::Column::Code, Expr::value(aggregate.base.code.clone()))
        .col_expr(
            customer::Column::Description,
            Expr::value(aggregate.base.description.clone()),
        )
        .col_expr(
            customer::Column::Comment,
            Expr::value(aggregate.base.comment.clone()),
        )
        .col_expr(
            customer::Column::Status,
            Expr::value(aggregate.status.as_str()),
        )
        .col_expr(
            customer::Column::FirstName,
            Expr::value(aggregate.first_name.clone()),
        )
        .col_expr(
            customer::Column::LastName,
            Expr::value(aggregate.last_name.clone()),
        )
        .col_expr(
            customer::Column::MiddleName,
            Expr::value(aggregate.middle_name.clone()),
        )
        .col_expr(
            customer::Column::DateOfBirth,
            Expr::value(aggregate.date_of_birth),
        )
        .col_expr(customer::Column::Email, Expr::value(aggregate.email.clone()))
        .col_expr(customer::Column::Phone, Expr::value(aggregate.phone.clone()))
        .col_expr(
            customer::Column::SegmentCode,
            Expr::value(aggregate.segment_code.clone()),
        )
        .col_expr(
            customer::Column::RiskLevelCode,
            Expr::value(aggregate.risk_level_code.clone()),
        )
        .col_expr(
            customer::Column::KycStatusCode,
            Expr::value(aggregate.kyc_status_code.clone()),
        )
        .col_expr(
            customer::Column::OccupationCode,
            Expr::value(aggregate.occupation_code.clone()),
        )
        .col_expr(
            customer::Column::IndustryCode,
            Expr::value(aggregate.industry_code.clone()),
        )
        .col_expr(
            customer::Column::SectorCode,
            Expr::value(aggregate.sector_code.clone()),
        )
        .col_expr(
            customer::Column::UpdatedAt,
            Expr::value(Some(aggregate.base.metadata.updated_at)),
        )
        .col_expr(
            customer::Column::UpdatedBy,
            Expr::value(aggregate.base.metadata.updated_by.clone()),
        )
        .col_expr(
            customer::Column::Version,
            Expr::value(expected_version + 1),
        )
        .filter(customer::Column::Id.eq(id_str.as_str()))
        .filter(customer::Column::Version.eq(expected_version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(conflict_or_missing(db, aggregate.base.id.value(), expected_version).await?);
    }
    Ok(())
}

/// Условная смена статуса под тем же version guard-ом
pub async fn update_status_conditional<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    new_status: CustomerStatus,
    expected_version: i32,
    updated_at: chrono::DateTime<chrono::Utc>,
    updated_by: &str,
) -> StoreResult<()> {
    let result = customer::Entity::update_many()
        .col_expr(customer::Column::Status, Expr::value(new_status.as_str()))
        .col_expr(customer::Column::UpdatedAt, Expr::value(Some(updated_at)))
        .col_expr(
            customer::Column::UpdatedBy,
            Expr::value(Some(updated_by.to_string())),
        )
        .col_expr(
            customer::Column::Version,
            Expr::value(expected_version + 1),
        )
        .filter(customer::Column::Id.eq(id.to_string()))
        .filter(customer::Column::Version.eq(expected_version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(conflict_or_missing(db, id, expected_version).await?);
    }
    Ok(())
}

/// Нулевая затронутая строка у условного UPDATE-а неоднозначна:
/// либо записи нет, либо версия ушла вперёд. Разбирается точечным чтением.
async fn conflict_or_missing<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    expected: i32,
) -> StoreResult<CustomerStoreError> {
    match find_model(db, id).await? {
        None => Ok(CustomerStoreError::NotFound(id)),
        Some(m) => Ok(CustomerStoreError::VersionConflict {
            expected,
            actual: m.version,
        }),
    }
}

/// Жёсткое удаление: деструктивно, без version guard-а, удаляет корень
/// вместе со всеми дочерними строками
pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> StoreResult<()> {
    let id_str = id.to_string();
    address::Entity::delete_many()
        .filter(address::Column::CustomerId.eq(id_str.as_str()))
        .exec(db)
        .await?;
    identification::Entity::delete_many()
        .filter(identification::Column::CustomerId.eq(id_str.as_str()))
        .exec(db)
        .await?;
    relationship::Entity::delete_many()
        .filter(relationship::Column::CustomerId.eq(id_str.as_str()))
        .exec(db)
        .await?;
    product::Entity::delete_many()
        .filter(product::Column::CustomerId.eq(id_str.as_str()))
        .exec(db)
        .await?;
    let result = customer::Entity::delete_many()
        .filter(customer::Column::Id.eq(id_str.as_str()))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(CustomerStoreError::NotFound(id));
    }
    Ok(())
}

// ============================================================================
// Замена дочерних коллекций (delete + insert, в транзакции вызывающего)
// ============================================================================

pub async fn replace_addresses<C: ConnectionTrait>(
    db: &C,
    customer_id: &str,
    items: &[contracts::domain::a001_customer::aggregate::Address],
) -> StoreResult<()> {
    address::Entity::delete_many()
        .filter(address::Column::CustomerId.eq(customer_id))
        .exec(db)
        .await?;
    if items.is_empty() {
        return Ok(());
    }
    let models: Vec<address::ActiveModel> = items
        .iter()
        .map(|a| address::ActiveModel {
            id: Set(a.id.to_string()),
            customer_id: Set(customer_id.to_string()),
            address_type: Set(a.address_type.clone()),
            line1: Set(a.line1.clone()),
            line2: Set(a.line2.clone()),
            city: Set(a.city.clone()),
            province_code: Set(a.province_code.clone()),
            postal_code: Set(a.postal_code.clone()),
            country_code: Set(a.country_code.clone()),
            is_active: Set(a.is_active),
            is_primary: Set(a.is_primary),
            valid_from: Set(a.valid_from),
            valid_to: Set(a.valid_to),
        })
        .collect();
    address::Entity::insert_many(models).exec(db).await?;
    Ok(())
}

pub async fn replace_identifications<C: ConnectionTrait>(
    db: &C,
    customer_id: &str,
    items: &[contracts::domain::a001_customer::aggregate::Identification],
) -> StoreResult<()> {
    identification::Entity::delete_many()
        .filter(identification::Column::CustomerId.eq(customer_id))
        .exec(db)
        .await?;
    if items.is_empty() {
        return Ok(());
    }
    let models: Vec<identification::ActiveModel> = items
        .iter()
        .map(|i| identification::ActiveModel {
            id: Set(i.id.to_string()),
            customer_id: Set(customer_id.to_string()),
            id_type: Set(i.id_type.clone()),
            number: Set(i.number.clone()),
            issuing_country_code: Set(i.issuing_country_code.clone()),
            issue_date: Set(i.issue_date),
            expiry_date: Set(i.expiry_date),
            is_active: Set(i.is_active),
            is_primary: Set(i.is_primary),
        })
        .collect();
    identification::Entity::insert_many(models).exec(db).await?;
    Ok(())
}

pub async fn replace_relationships<C: ConnectionTrait>(
    db: &C,
    customer_id: &str,
    items: &[contracts::domain::a001_customer::aggregate::CustomerRelationship],
) -> StoreResult<()> {
    relationship::Entity::delete_many()
        .filter(relationship::Column::CustomerId.eq(customer_id))
        .exec(db)
        .await?;
    if items.is_empty() {
        return Ok(());
    }
    let models: Vec<relationship::ActiveModel> = items
        .iter()
        .map(|r| relationship::ActiveModel {
            id: Set(r.id.to_string()),
            customer_id: Set(customer_id.to_string()),
            related_customer_id: Set(r.related_customer_id.to_string()),
            relationship_type: Set(r.relationship_type.clone()),
            is_active: Set(r.is_active),
            is_primary: Set(r.is_primary),
            valid_from: Set(r.valid_from),
            valid_to: Set(r.valid_to),
        })
        .collect();
    relationship::Entity::insert_many(models).exec(db).await?;
    Ok(())
}

pub async fn replace_products<C: ConnectionTrait>(
    db: &C,
    customer_id: &str,
    items: &[contracts::domain::a001_customer::aggregate::CustomerProduct],
) -> StoreResult<()> {
    product::Entity::delete_many()
        .filter(product::Column::CustomerId.eq(customer_id))
        .exec(db)
        .await?;
    if items.is_empty() {
        return Ok(());
    }
    let models: Vec<product::ActiveModel> = items
        .iter()
        .map(|p| product::ActiveModel {
            id: Set(p.id.to_string()),
            customer_id: Set(customer_id.to_string()),
            product_code: Set(p.product_code.clone()),
            account_number: Set(p.account_number.clone()),
            is_active: Set(p.is_active),
            is_primary: Set(p.is_primary),
            enrolled_at: Set(p.enrolled_at),
            closed_at: Set(p.closed_at),
        })
        .collect();
    product::Entity::insert_many(models).exec(db).await?;
    Ok(())
}

fn customer_active(c: &Customer) -> customer::ActiveModel {
    customer::ActiveModel {
        id: Set(c.to_string_id()),
        code: Set(c.base.code.clone()),
        description: Set(c.base.description.clone()),
        comment: Set(c.base.comment.clone()),
        status: Set(c.status.as_str().to_string()),
        first_name: Set(c.first_name.clone()),
        last_name: Set(c.last_name.clone()),
        middle_name: Set(c.middle_name.clone()),
        date_of_birth: Set(c.date_of_birth),
        email: Set(c.email.clone()),
        phone: Set(c.phone.clone()),
        segment_code: Set(c.segment_code.clone()),
        risk_level_code: Set(c.risk_level_code.clone()),
        kyc_status_code: Set(c.kyc_status_code.clone()),
        occupation_code: Set(c.occupation_code.clone()),
        industry_code: Set(c.industry_code.clone()),
        sector_code: Set(c.sector_code.clone()),
        created_at: Set(Some(c.base.metadata.created_at)),
        updated_at: Set(Some(c.base.metadata.updated_at)),
        created_by: Set(c.base.metadata.created_by.clone()),
        updated_by: Set(c.base.metadata.updated_by.clone()),
        version: Set(c.base.metadata.version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_test;
    use contracts::domain::a001_customer::aggregate::Address;
    use std::collections::HashSet;

    fn budget() -> Duration {
        Duration::from_secs(5)
    }

    async fn seed_customer(
        db: &sea_orm::DatabaseConnection,
        code: &str,
        first: &str,
        last: &str,
    ) -> Customer {
        let customer = Customer::new_for_insert(code.to_string(), first.to_string(), last.to_string());
        insert(db, &customer).await.unwrap();
        customer
    }

    #[tokio::test]
    async fn pages_cover_total_without_overlap() {
        let db = connect_test().await;
        // 5 клиентов с "An" в имени и двое посторонних
        for i in 0..5 {
            seed_customer(&db, &format!("CUS-{}", i), "Anna", &format!("Ivanova{}", i)).await;
        }
        seed_customer(&db, "CUS-X", "Boris", "Petrov").await;
        seed_customer(&db, "CUS-Y", "Olga", "Sidorova").await;

        let criteria = CustomerSearchCriteria {
            status: Some(CustomerStatus::Active),
            name_contains: Some("An".into()),
            ..Default::default()
        };
        let sort = CustomerSort::default();

        let mut seen: HashSet<String> = HashSet::new();
        let mut sizes = Vec::new();
        for page_no in 0..3 {
            let page = search_page(
                &db,
                &criteria,
                FetchTier::Summary,
                PageRequest::new(page_no, 2),
                sort,
                budget(),
            )
            .await
            .unwrap();
            assert_eq!(page.total, 5);
            assert!(page.items.len() <= 2);
            sizes.push(page.items.len());
            for item in &page.items {
                // идентификатор не встречается на двух страницах
                assert!(seen.insert(item.to_string_id()));
            }
        }
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn tier_never_changes_matched_set() {
        let db = connect_test().await;
        let with_children = seed_customer(&db, "CUS-1", "Anna", "Ivanova").await;
        seed_customer(&db, "CUS-2", "Andrey", "Ivanov").await;
        replace_addresses(
            &db,
            &with_children.to_string_id(),
            &[Address {
                id: Uuid::new_v4(),
                address_type: "REGISTRATION".into(),
                line1: "ул. Ленина, 1".into(),
                line2: None,
                city: "Казань".into(),
                province_code: Some("16".into()),
                postal_code: None,
                country_code: "RU".into(),
                is_active: true,
                is_primary: true,
                valid_from: None,
                valid_to: None,
            }],
        )
        .await
        .unwrap();

        let criteria = CustomerSearchCriteria {
            name_contains: Some("Ivanov".into()),
            ..Default::default()
        };
        let mut matched: Vec<HashSet<String>> = Vec::new();
        for tier in [FetchTier::Summary, FetchTier::Basic, FetchTier::Full] {
            let page = search_page(
                &db,
                &criteria,
                tier,
                PageRequest::new(0, 10),
                CustomerSort::default(),
                budget(),
            )
            .await
            .unwrap();
            matched.push(page.items.iter().map(|c| c.to_string_id()).collect());
        }
        assert_eq!(matched[0], matched[1]);
        assert_eq!(matched[1], matched[2]);

        // а наполнение отличается
        let basic = search_page(
            &db,
            &criteria,
            FetchTier::Basic,
            PageRequest::new(0, 10),
            CustomerSort::default(),
            budget(),
        )
        .await
        .unwrap();
        let hydrated = basic
            .items
            .iter()
            .find(|c| c.to_string_id() == with_children.to_string_id())
            .unwrap();
        assert_eq!(hydrated.addresses.len(), 1);
        let summary = search_page(
            &db,
            &criteria,
            FetchTier::Summary,
            PageRequest::new(0, 10),
            CustomerSort::default(),
            budget(),
        )
        .await
        .unwrap();
        assert!(summary.items.iter().all(|c| c.addresses.is_empty()));
    }

    #[tokio::test]
    async fn stable_order_across_page_fetches() {
        let db = connect_test().await;
        // одинаковое описание: порядок держит tiebreak по id
        for i in 0..4 {
            seed_customer(&db, &format!("CUS-{}", i), "Anna", "Ivanova").await;
        }
        let criteria = CustomerSearchCriteria::default();
        let first = search_page(
            &db,
            &criteria,
            FetchTier::Summary,
            PageRequest::new(0, 2),
            CustomerSort::default(),
            budget(),
        )
        .await
        .unwrap();
        let repeat = search_page(
            &db,
            &criteria,
            FetchTier::Summary,
            PageRequest::new(0, 2),
            CustomerSort::default(),
            budget(),
        )
        .await
        .unwrap();
        let ids: Vec<String> = first.items.iter().map(|c| c.to_string_id()).collect();
        let ids_repeat: Vec<String> = repeat.items.iter().map(|c| c.to_string_id()).collect();
        assert_eq!(ids, ids_repeat);
    }

    #[tokio::test]
    async fn zero_matches_is_empty_page_not_error() {
        let db = connect_test().await;
        seed_customer(&db, "CUS-1", "Anna", "Ivanova").await;
        let criteria = CustomerSearchCriteria {
            name_contains: Some("нет такого".into()),
            ..Default::default()
        };
        let page = search_page(
            &db,
            &criteria,
            FetchTier::Summary,
            PageRequest::new(0, 10),
            CustomerSort::default(),
            budget(),
        )
        .await
        .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let db = connect_test().await;
        let err = get_by_id(&db, Uuid::new_v4(), FetchTier::Summary)
            .await
            .unwrap_err();
        assert!(matches!(err, CustomerStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn zero_page_size_is_invalid_criteria() {
        let db = connect_test().await;
        let err = search_page(
            &db,
            &CustomerSearchCriteria::default(),
            FetchTier::Summary,
            PageRequest::new(0, 0),
            CustomerSort::default(),
            budget(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CustomerStoreError::InvalidCriteria(_)));
    }

    #[tokio::test]
    async fn exhausted_hydration_budget_is_timeout_not_partial_page() {
        let db = connect_test().await;
        seed_customer(&db, "CUS-1", "Anna", "Ivanova").await;

        let err = search_page(
            &db,
            &CustomerSearchCriteria::default(),
            FetchTier::Full,
            PageRequest::new(0, 10),
            CustomerSort::default(),
            Duration::from_millis(0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CustomerStoreError::HydrationTimeout(_)));
    }

    #[tokio::test]
    async fn root_gone_between_phases_shortens_result() {
        let db = connect_test().await;
        let kept = seed_customer(&db, "CUS-1", "Anna", "Ivanova").await;

        // идентификатор фазы 1, чья строка исчезла до фазы 2
        let ids = vec![kept.to_string_id(), Uuid::new_v4().to_string()];
        let items = hydrate_ids(&db, &ids, FetchTier::Full).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].to_string_id(), kept.to_string_id());
    }

    #[tokio::test]
    async fn existential_search_finds_customer_by_child_row() {
        let db = connect_test().await;
        let with_doc = seed_customer(&db, "CUS-1", "Anna", "Ivanova").await;
        seed_customer(&db, "CUS-2", "Boris", "Petrov").await;
        replace_identifications(
            &db,
            &with_doc.to_string_id(),
            &[contracts::domain::a001_customer::aggregate::Identification {
                id: Uuid::new_v4(),
                id_type: "PASSPORT".into(),
                number: "AB123456".into(),
                issuing_country_code: Some("RU".into()),
                issue_date: None,
                expiry_date: None,
                is_active: false, // просроченный документ всё равно ищется
                is_primary: false,
            }],
        )
        .await
        .unwrap();

        let criteria = CustomerSearchCriteria {
            identification_number: Some("AB123456".into()),
            ..Default::default()
        };
        let found = list_all(&db, &criteria, FetchTier::Summary, CustomerSort::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].to_string_id(), with_doc.to_string_id());
    }
}
