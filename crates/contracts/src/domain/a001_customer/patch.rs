use super::aggregate::{
    Address, Customer, CustomerProduct, CustomerRelationship, Identification,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Merge-patch запрос на изменение клиента.
///
/// Применяются только присутствующие (`Some`) поля; отсутствующие поля
/// не трогаются. Это не полная замена записи.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomerPatch {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    #[serde(rename = "middleName")]
    pub middle_name: Option<String>,
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub comment: Option<String>,
    #[serde(rename = "segmentCode")]
    pub segment_code: Option<String>,
    #[serde(rename = "riskLevelCode")]
    pub risk_level_code: Option<String>,
    #[serde(rename = "kycStatusCode")]
    pub kyc_status_code: Option<String>,
    #[serde(rename = "occupationCode")]
    pub occupation_code: Option<String>,
    #[serde(rename = "industryCode")]
    pub industry_code: Option<String>,
    #[serde(rename = "sectorCode")]
    pub sector_code: Option<String>,

    /// Полная замена коллекции адресов (внутри той же транзакции)
    pub addresses: Option<Vec<AddressInput>>,
    /// Полная замена коллекции документов
    pub identifications: Option<Vec<IdentificationInput>>,
    /// Полная замена коллекции связей
    pub relationships: Option<Vec<RelationshipInput>>,
    /// Полная замена коллекции продуктов
    pub products: Option<Vec<ProductInput>>,
}

impl CustomerPatch {
    /// Наложить скалярные поля patch-а на агрегат.
    ///
    /// Коллекции здесь не трогаются: их замену выполняет слой мутаций,
    /// чтобы нормализация default-флагов прошла в одной транзакции.
    pub fn apply_scalar(&self, customer: &mut Customer) {
        if let Some(v) = &self.first_name {
            customer.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            customer.last_name = v.clone();
        }
        if let Some(v) = &self.middle_name {
            customer.middle_name = Some(v.clone());
        }
        if let Some(v) = self.date_of_birth {
            customer.date_of_birth = Some(v);
        }
        if let Some(v) = &self.email {
            customer.email = Some(v.clone());
        }
        if let Some(v) = &self.phone {
            customer.phone = Some(v.clone());
        }
        if let Some(v) = &self.comment {
            customer.base.comment = Some(v.clone());
        }
        if let Some(v) = &self.segment_code {
            customer.segment_code = Some(v.clone());
        }
        if let Some(v) = &self.risk_level_code {
            customer.risk_level_code = Some(v.clone());
        }
        if let Some(v) = &self.kyc_status_code {
            customer.kyc_status_code = Some(v.clone());
        }
        if let Some(v) = &self.occupation_code {
            customer.occupation_code = Some(v.clone());
        }
        if let Some(v) = &self.industry_code {
            customer.industry_code = Some(v.clone());
        }
        if let Some(v) = &self.sector_code {
            customer.sector_code = Some(v.clone());
        }
        if self.first_name.is_some() || self.last_name.is_some() {
            customer.refresh_description();
        }
    }
}

/// Данные для создания нового клиента
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomerDto {
    pub code: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "middleName")]
    pub middle_name: Option<String>,
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub comment: Option<String>,
    #[serde(rename = "segmentCode")]
    pub segment_code: Option<String>,
    #[serde(rename = "riskLevelCode")]
    pub risk_level_code: Option<String>,
    #[serde(rename = "kycStatusCode")]
    pub kyc_status_code: Option<String>,
    #[serde(rename = "occupationCode")]
    pub occupation_code: Option<String>,
    #[serde(rename = "industryCode")]
    pub industry_code: Option<String>,
    #[serde(rename = "sectorCode")]
    pub sector_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AddressInput {
    pub id: Option<Uuid>,
    #[serde(rename = "addressType")]
    pub address_type: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    #[serde(rename = "provinceCode")]
    pub province_code: Option<String>,
    #[serde(rename = "postalCode")]
    pub postal_code: Option<String>,
    #[serde(rename = "countryCode")]
    pub country_code: String,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "isPrimary", default)]
    pub is_primary: bool,
    #[serde(rename = "validFrom")]
    pub valid_from: Option<NaiveDate>,
    #[serde(rename = "validTo")]
    pub valid_to: Option<NaiveDate>,
}

impl AddressInput {
    pub fn into_address(self) -> Address {
        Address {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            address_type: self.address_type,
            line1: self.line1,
            line2: self.line2,
            city: self.city,
            province_code: self.province_code,
            postal_code: self.postal_code,
            country_code: self.country_code,
            is_active: self.is_active,
            is_primary: self.is_primary,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdentificationInput {
    pub id: Option<Uuid>,
    #[serde(rename = "idType")]
    pub id_type: String,
    pub number: String,
    #[serde(rename = "issuingCountryCode")]
    pub issuing_country_code: Option<String>,
    #[serde(rename = "issueDate")]
    pub issue_date: Option<NaiveDate>,
    #[serde(rename = "expiryDate")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "isPrimary", default)]
    pub is_primary: bool,
}

impl IdentificationInput {
    pub fn into_identification(self) -> Identification {
        Identification {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            id_type: self.id_type,
            number: self.number,
            issuing_country_code: self.issuing_country_code,
            issue_date: self.issue_date,
            expiry_date: self.expiry_date,
            is_active: self.is_active,
            is_primary: self.is_primary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelationshipInput {
    pub id: Option<Uuid>,
    #[serde(rename = "relatedCustomerId")]
    pub related_customer_id: Uuid,
    #[serde(rename = "relationshipType")]
    pub relationship_type: String,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "isPrimary", default)]
    pub is_primary: bool,
    #[serde(rename = "validFrom")]
    pub valid_from: Option<NaiveDate>,
    #[serde(rename = "validTo")]
    pub valid_to: Option<NaiveDate>,
}

impl RelationshipInput {
    pub fn into_relationship(self) -> CustomerRelationship {
        CustomerRelationship {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            related_customer_id: self.related_customer_id,
            relationship_type: self.relationship_type,
            is_active: self.is_active,
            is_primary: self.is_primary,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductInput {
    pub id: Option<Uuid>,
    #[serde(rename = "productCode")]
    pub product_code: String,
    #[serde(rename = "accountNumber")]
    pub account_number: Option<String>,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(rename = "isPrimary", default)]
    pub is_primary: bool,
    #[serde(rename = "enrolledAt")]
    pub enrolled_at: Option<NaiveDate>,
    #[serde(rename = "closedAt")]
    pub closed_at: Option<NaiveDate>,
}

impl ProductInput {
    pub fn into_product(self) -> CustomerProduct {
        CustomerProduct {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            product_code: self.product_code,
            account_number: self.account_number,
            is_active: self.is_active,
            is_primary: self.is_primary,
            enrolled_at: self.enrolled_at,
            closed_at: self.closed_at,
        }
    }
}

fn default_true() -> bool {
    true
}
