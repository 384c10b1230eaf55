//! Сборка дерева предикатов из независимо-опциональных критериев поиска.
//!
//! Чистая функция критериев: без побочных эффектов, без обращения к БД.
//! Пустой критерий не добавляет ограничения; заполненные комбинируются
//! через AND. Критерии по дочерним таблицам экзистенциальные: выражены
//! подзапросом `id IN (SELECT customer_id …)`, поэтому достаточно одной
//! подходящей дочерней строки и размножение корня join-ом невозможно.

use contracts::domain::a001_customer::aggregate::CustomerStatus;
use contracts::domain::a001_customer::search::CustomerSearchCriteria;
use sea_orm::sea_query::{Alias, Expr, Query as SeaQuery, SimpleExpr};
use sea_orm::{ColumnTrait, Condition};
use uuid::Uuid;

use super::entity::customer;
use super::error::CustomerStoreError;

/// Составить предикат по критериям поиска.
///
/// Если статус не задан и `include_deleted` не взведён, добавляется
/// защитное условие `status <> 'DELETED'`: списки по умолчанию не
/// показывают мягко удалённых клиентов.
pub fn compose(criteria: &CustomerSearchCriteria) -> Result<Condition, CustomerStoreError> {
    let mut cond = Condition::all();

    match criteria.status {
        Some(status) => {
            cond = cond.add(customer::Column::Status.eq(status.as_str()));
        }
        None if !criteria.include_deleted => {
            cond = cond.add(customer::Column::Status.ne(CustomerStatus::Deleted.as_str()));
        }
        None => {}
    }

    if let Some(v) = non_blank(&criteria.segment_code) {
        cond = cond.add(customer::Column::SegmentCode.eq(v));
    }
    if let Some(v) = non_blank(&criteria.risk_level_code) {
        cond = cond.add(customer::Column::RiskLevelCode.eq(v));
    }
    if let Some(v) = non_blank(&criteria.kyc_status_code) {
        cond = cond.add(customer::Column::KycStatusCode.eq(v));
    }
    if let Some(v) = non_blank(&criteria.name_contains) {
        cond = cond.add(customer::Column::Description.contains(v));
    }
    if let Some(v) = non_blank(&criteria.email) {
        cond = cond.add(customer::Column::Email.eq(v));
    }

    // Диапазоны: каждая граница независима, отсутствие границы означает
    // неограниченность в эту сторону
    if let Some(d) = criteria.birth_date_from {
        cond = cond.add(customer::Column::DateOfBirth.gte(d));
    }
    if let Some(d) = criteria.birth_date_to {
        cond = cond.add(customer::Column::DateOfBirth.lte(d));
    }
    if let Some(t) = criteria.created_from {
        cond = cond.add(customer::Column::CreatedAt.gte(t));
    }
    if let Some(t) = criteria.created_to {
        cond = cond.add(customer::Column::CreatedAt.lte(t));
    }

    // Экзистенциальные критерии по дочерним таблицам. Неактивные дочерние
    // строки участвуют: клиент остаётся находимым по просроченному документу.
    if let Some(v) = non_blank(&criteria.address_province_code) {
        cond = cond.add(child_eq("a001_customer_address", "province_code", v));
    }
    if let Some(v) = non_blank(&criteria.address_city) {
        cond = cond.add(child_like("a001_customer_address", "city", v));
    }
    if let Some(v) = non_blank(&criteria.identification_number) {
        cond = cond.add(child_eq("a001_customer_identification", "number", v));
    }
    if let Some(v) = non_blank(&criteria.related_customer_id) {
        let related = Uuid::parse_str(v).map_err(|e| {
            CustomerStoreError::InvalidCriteria(format!("relatedCustomerId: {}", e))
        })?;
        cond = cond.add(child_eq(
            "a001_customer_relationship",
            "related_customer_id",
            &related.to_string(),
        ));
    }
    if let Some(v) = non_blank(&criteria.product_code) {
        cond = cond.add(child_eq("a001_customer_product", "product_code", v));
    }

    // Свободный текст: OR по нескольким полям, сам по себе добавляется
    // к остальным критериям через AND
    if let Some(v) = non_blank(&criteria.free_text) {
        cond = cond.add(
            Condition::any()
                .add(customer::Column::Description.contains(v))
                .add(customer::Column::Code.contains(v))
                .add(customer::Column::Email.contains(v))
                .add(customer::Column::Phone.contains(v)),
        );
    }

    Ok(cond)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `id IN (SELECT customer_id FROM <table> WHERE <column> = <value>)`
fn child_eq(table: &str, column: &str, value: &str) -> SimpleExpr {
    customer::Column::Id.in_subquery(
        SeaQuery::select()
            .column(Alias::new("customer_id"))
            .from(Alias::new(table))
            .and_where(Expr::col(Alias::new(column)).eq(value))
            .to_owned(),
    )
}

/// `id IN (SELECT customer_id FROM <table> WHERE <column> LIKE '%<value>%')`
fn child_like(table: &str, column: &str, value: &str) -> SimpleExpr {
    customer::Column::Id.in_subquery(
        SeaQuery::select()
            .column(Alias::new("customer_id"))
            .from(Alias::new(table))
            .and_where(Expr::col(Alias::new(column)).like(format!("%{}%", value)))
            .to_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    fn to_sql(cond: Condition) -> String {
        customer::Entity::find()
            .filter(cond)
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn empty_criteria_only_hide_deleted() {
        let cond = compose(&CustomerSearchCriteria::default()).unwrap();
        let sql = to_sql(cond);
        assert!(sql.contains(r#""status" <> 'DELETED'"#), "sql: {}", sql);
        assert!(!sql.contains(" AND "), "sql: {}", sql);
    }

    #[test]
    fn empty_criteria_with_deleted_have_no_constraint() {
        let criteria = CustomerSearchCriteria {
            include_deleted: true,
            ..Default::default()
        };
        let sql = to_sql(compose(&criteria).unwrap());
        assert!(!sql.contains("WHERE"), "sql: {}", sql);
    }

    #[test]
    fn explicit_status_replaces_deleted_guard() {
        let criteria = CustomerSearchCriteria {
            status: Some(CustomerStatus::Deleted),
            ..Default::default()
        };
        let sql = to_sql(compose(&criteria).unwrap());
        assert!(sql.contains(r#""status" = 'DELETED'"#), "sql: {}", sql);
        assert!(!sql.contains("<>"), "sql: {}", sql);
    }

    #[test]
    fn each_criterion_adds_one_conjunct() {
        let criteria = CustomerSearchCriteria {
            status: Some(CustomerStatus::Active),
            segment_code: Some("RETAIL".into()),
            name_contains: Some("An".into()),
            ..Default::default()
        };
        let sql = to_sql(compose(&criteria).unwrap());
        assert!(sql.contains(r#""status" = 'ACTIVE'"#), "sql: {}", sql);
        assert!(sql.contains(r#""segment_code" = 'RETAIL'"#), "sql: {}", sql);
        assert!(sql.contains(r#""description" LIKE '%An%'"#), "sql: {}", sql);
        assert_eq!(sql.matches(" AND ").count(), 2, "sql: {}", sql);
    }

    #[test]
    fn blank_criteria_contribute_nothing() {
        let criteria = CustomerSearchCriteria {
            segment_code: Some("   ".into()),
            name_contains: Some(String::new()),
            include_deleted: true,
            ..Default::default()
        };
        let sql = to_sql(compose(&criteria).unwrap());
        assert!(!sql.contains("WHERE"), "sql: {}", sql);
    }

    #[test]
    fn range_bounds_are_independent() {
        let criteria = CustomerSearchCriteria {
            birth_date_from: Some(chrono::NaiveDate::from_ymd_opt(1980, 1, 1).unwrap()),
            include_deleted: true,
            ..Default::default()
        };
        let sql = to_sql(compose(&criteria).unwrap());
        assert!(sql.contains(r#""date_of_birth" >="#), "sql: {}", sql);
        assert!(!sql.contains("<="), "sql: {}", sql);
    }

    #[test]
    fn child_criteria_become_existential_subqueries() {
        let criteria = CustomerSearchCriteria {
            identification_number: Some("AB123456".into()),
            ..Default::default()
        };
        let sql = to_sql(compose(&criteria).unwrap());
        assert!(
            sql.contains(r#"IN (SELECT "customer_id" FROM "a001_customer_identification""#),
            "sql: {}",
            sql
        );
        assert!(sql.contains(r#""number" = 'AB123456'"#), "sql: {}", sql);
        // без фильтра активности: история документов тоже ищется
        assert!(!sql.contains("is_active"), "sql: {}", sql);
    }

    #[test]
    fn free_text_expands_to_or_of_fields() {
        let criteria = CustomerSearchCriteria {
            status: Some(CustomerStatus::Active),
            free_text: Some("ivanov".into()),
            ..Default::default()
        };
        let sql = to_sql(compose(&criteria).unwrap());
        assert!(sql.contains(r#""description" LIKE '%ivanov%'"#), "sql: {}", sql);
        assert!(sql.contains(r#""code" LIKE '%ivanov%'"#), "sql: {}", sql);
        assert!(sql.contains(" OR "), "sql: {}", sql);
        // OR-группа целиком соединяется с остальным через AND
        assert!(sql.contains(" AND ("), "sql: {}", sql);
    }

    #[test]
    fn malformed_related_id_is_invalid_criteria() {
        let criteria = CustomerSearchCriteria {
            related_customer_id: Some("not-a-uuid".into()),
            ..Default::default()
        };
        let err = compose(&criteria).unwrap_err();
        assert!(matches!(err, CustomerStoreError::InvalidCriteria(_)));
    }
}
