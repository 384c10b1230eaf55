use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use contracts::domain::a001_customer::aggregate::{Customer, CustomerStatus};
use contracts::domain::a001_customer::patch::{CustomerDto, CustomerPatch};
use contracts::domain::a001_customer::search::{
    CustomerSearchCriteria, CustomerSort, CustomerSortBy, FetchTier, Page, PageRequest,
};
use contracts::domain::common::AuditContext;

use crate::domain::a001_customer::error::CustomerStoreError;
use crate::domain::a001_customer::service;
use crate::shared::config;
use crate::shared::data::db::get_connection;

fn status_for(err: &CustomerStoreError) -> StatusCode {
    match err {
        CustomerStoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CustomerStoreError::VersionConflict { .. } => StatusCode::CONFLICT,
        CustomerStoreError::InvalidCriteria(_) => StatusCode::BAD_REQUEST,
        CustomerStoreError::HydrationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        CustomerStoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CustomerStoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn fail(err: CustomerStoreError) -> StatusCode {
    let status = status_for(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("customer handler error: {}", err);
    } else {
        tracing::debug!("customer handler outcome: {}", err);
    }
    status
}

fn audit_ctx(headers: &HeaderMap) -> AuditContext {
    let actor = headers
        .get("x-actor")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("system");
    AuditContext::new(actor)
}

fn parse_id(id: &str) -> Result<uuid::Uuid, StatusCode> {
    uuid::Uuid::parse_str(id).map_err(|_| StatusCode::BAD_REQUEST)
}

/// Параметры GET /api/customer
#[derive(Debug, Deserialize, Default)]
pub struct CustomerListParams {
    pub status: Option<CustomerStatus>,
    #[serde(rename = "segmentCode")]
    pub segment_code: Option<String>,
    #[serde(rename = "riskLevelCode")]
    pub risk_level_code: Option<String>,
    #[serde(rename = "kycStatusCode")]
    pub kyc_status_code: Option<String>,
    #[serde(rename = "nameContains")]
    pub name_contains: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "birthDateFrom")]
    pub birth_date_from: Option<chrono::NaiveDate>,
    #[serde(rename = "birthDateTo")]
    pub birth_date_to: Option<chrono::NaiveDate>,
    #[serde(rename = "createdFrom")]
    pub created_from: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "createdTo")]
    pub created_to: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "addressProvinceCode")]
    pub address_province_code: Option<String>,
    #[serde(rename = "addressCity")]
    pub address_city: Option<String>,
    #[serde(rename = "identificationNumber")]
    pub identification_number: Option<String>,
    #[serde(rename = "relatedCustomerId")]
    pub related_customer_id: Option<String>,
    #[serde(rename = "productCode")]
    pub product_code: Option<String>,
    #[serde(rename = "freeText")]
    pub free_text: Option<String>,
    #[serde(rename = "includeDeleted", default)]
    pub include_deleted: bool,
    pub tier: Option<FetchTier>,
    pub page: Option<u64>,
    pub size: Option<u64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<CustomerSortBy>,
    #[serde(rename = "sortDesc", default)]
    pub sort_desc: bool,
}

impl CustomerListParams {
    fn criteria(&self) -> CustomerSearchCriteria {
        CustomerSearchCriteria {
            status: self.status,
            segment_code: self.segment_code.clone(),
            risk_level_code: self.risk_level_code.clone(),
            kyc_status_code: self.kyc_status_code.clone(),
            name_contains: self.name_contains.clone(),
            email: self.email.clone(),
            birth_date_from: self.birth_date_from,
            birth_date_to: self.birth_date_to,
            created_from: self.created_from,
            created_to: self.created_to,
            address_province_code: self.address_province_code.clone(),
            address_city: self.address_city.clone(),
            identification_number: self.identification_number.clone(),
            related_customer_id: self.related_customer_id.clone(),
            product_code: self.product_code.clone(),
            free_text: self.free_text.clone(),
            include_deleted: self.include_deleted,
        }
    }
}

/// GET /api/customer
pub async fn search(
    Query(params): Query<CustomerListParams>,
) -> Result<Json<Page<Customer>>, StatusCode> {
    let criteria = params.criteria();
    let tier = params.tier.unwrap_or_default();
    let page = PageRequest::new(params.page.unwrap_or(0), params.size.unwrap_or(50));
    let sort = CustomerSort {
        sort_by: params.sort_by.unwrap_or_default(),
        sort_desc: params.sort_desc,
    };
    let budget = config::current().read.hydration_budget();

    service::search(get_connection(), &criteria, tier, page, sort, budget)
        .await
        .map(Json)
        .map_err(fail)
}

#[derive(Debug, Deserialize, Default)]
pub struct TierParam {
    pub tier: Option<FetchTier>,
}

/// GET /api/customer/:id
pub async fn get_by_id(
    Path(id): Path<String>,
    Query(params): Query<TierParam>,
) -> Result<Json<Customer>, StatusCode> {
    let uuid = parse_id(&id)?;
    service::get_by_id(get_connection(), uuid, params.tier.unwrap_or(FetchTier::Full))
        .await
        .map(Json)
        .map_err(fail)
}

/// POST /api/customer
pub async fn create(
    headers: HeaderMap,
    Json(dto): Json<CustomerDto>,
) -> Result<Json<Customer>, StatusCode> {
    let ctx = audit_ctx(&headers);
    service::create(get_connection(), dto, &ctx)
        .await
        .map(Json)
        .map_err(fail)
}

/// Тело PUT /api/customer/:id: ожидаемая версия + merge patch
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(rename = "expectedVersion")]
    pub expected_version: i32,
    #[serde(flatten)]
    pub patch: CustomerPatch,
}

/// PUT /api/customer/:id
pub async fn update(
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Customer>, StatusCode> {
    let uuid = parse_id(&id)?;
    let ctx = audit_ctx(&headers);
    service::update(
        get_connection(),
        uuid,
        request.expected_version,
        request.patch,
        &ctx,
    )
    .await
    .map(Json)
    .map_err(fail)
}

#[derive(Debug, Deserialize, Default)]
pub struct VersionParam {
    #[serde(rename = "expectedVersion")]
    pub expected_version: Option<i32>,
}

/// POST /api/customer/:id/activate
pub async fn activate(
    Path(id): Path<String>,
    Query(version): Query<VersionParam>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let uuid = parse_id(&id)?;
    let ctx = audit_ctx(&headers);
    service::activate(get_connection(), uuid, version.expected_version, &ctx)
        .await
        .map(|_| Json(json!({"id": id})))
        .map_err(fail)
}

/// POST /api/customer/:id/deactivate
pub async fn deactivate(
    Path(id): Path<String>,
    Query(version): Query<VersionParam>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let uuid = parse_id(&id)?;
    let ctx = audit_ctx(&headers);
    service::deactivate(get_connection(), uuid, version.expected_version, &ctx)
        .await
        .map(|_| Json(json!({"id": id})))
        .map_err(fail)
}

/// DELETE /api/customer/:id — мягкое удаление (status → DELETED)
pub async fn soft_delete(
    Path(id): Path<String>,
    Query(version): Query<VersionParam>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let uuid = parse_id(&id)?;
    let ctx = audit_ctx(&headers);
    service::soft_delete(get_connection(), uuid, version.expected_version, &ctx)
        .await
        .map(|_| Json(json!({"id": id})))
        .map_err(fail)
}

/// DELETE /api/customer/:id/hard — жёсткое удаление вместе с дочерними строками
pub async fn hard_delete(Path(id): Path<String>) -> Result<Json<serde_json::Value>, StatusCode> {
    let uuid = parse_id(&id)?;
    service::hard_delete(get_connection(), uuid)
        .await
        .map(|_| Json(json!({"id": id})))
        .map_err(fail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_carry_every_criterion() {
        let from = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let to = chrono::DateTime::parse_from_rfc3339("2026-06-30T23:59:59Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let params = CustomerListParams {
            segment_code: Some("RETAIL".into()),
            created_from: Some(from),
            created_to: Some(to),
            ..Default::default()
        };

        let criteria = params.criteria();
        assert_eq!(criteria.segment_code.as_deref(), Some("RETAIL"));
        assert_eq!(criteria.created_from, Some(from));
        assert_eq!(criteria.created_to, Some(to));
    }
}
