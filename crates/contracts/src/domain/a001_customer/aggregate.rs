use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for CustomerId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(CustomerId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Lifecycle status
// ============================================================================

/// Статус жизненного цикла клиента.
///
/// Переходы односторонние: из `Deleted` возврата нет.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    Active,
    Inactive,
    Suspended,
    Closed,
    Deleted,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "ACTIVE",
            CustomerStatus::Inactive => "INACTIVE",
            CustomerStatus::Suspended => "SUSPENDED",
            CustomerStatus::Closed => "CLOSED",
            CustomerStatus::Deleted => "DELETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(CustomerStatus::Active),
            "INACTIVE" => Some(CustomerStatus::Inactive),
            "SUSPENDED" => Some(CustomerStatus::Suspended),
            "CLOSED" => Some(CustomerStatus::Closed),
            "DELETED" => Some(CustomerStatus::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(flatten)]
    pub base: BaseAggregate<CustomerId>,

    pub status: CustomerStatus,

    // Identity
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "middleName")]
    pub middle_name: Option<String>,
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: Option<NaiveDate>,

    // Contacts
    pub email: Option<String>,
    pub phone: Option<String>,

    // Classification (reference codes, not expanded here)
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

    // Owned child collections (empty unless the read hydrated them)
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub identifications: Vec<Identification>,
    #[serde(default)]
    pub relationships: Vec<CustomerRelationship>,
    #[serde(default)]
    pub products: Vec<CustomerProduct>,
}

impl Customer {
    pub fn new_for_insert(code: String, first_name: String, last_name: String) -> Self {
        let description = format!("{} {}", last_name, first_name).trim().to_string();
        let base = BaseAggregate::new(CustomerId::new_v4(), code, description);

        Self {
            base,
            status: CustomerStatus::Active,
            first_name,
            last_name,
            middle_name: None,
            date_of_birth: None,
            email: None,
            phone: None,
            segment_code: None,
            risk_level_code: None,
            kyc_status_code: None,
            occupation_code: None,
            industry_code: None,
            sector_code: None,
            addresses: Vec::new(),
            identifications: Vec::new(),
            relationships: Vec::new(),
            products: Vec::new(),
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    /// Производное отображаемое имя, хранится в `base.description`
    pub fn refresh_description(&mut self) {
        self.base.description = format!("{} {}", self.last_name, self.first_name)
            .trim()
            .to_string();
    }

    pub fn is_deleted(&self) -> bool {
        self.status == CustomerStatus::Deleted
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.last_name.trim().is_empty() {
            return Err("Фамилия не может быть пустой".into());
        }
        if self.base.code.trim().is_empty() {
            return Err("Код не может быть пустым".into());
        }
        if self.addresses.iter().filter(|a| a.is_primary).count() > 1 {
            return Err("Более одного основного адреса".into());
        }
        if self.identifications.iter().filter(|i| i.is_primary).count() > 1 {
            return Err("Более одного основного документа".into());
        }
        Ok(())
    }
}

impl AggregateRoot for Customer {
    type Id = CustomerId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "customer"
    }

    fn element_name() -> &'static str {
        "Клиент"
    }

    fn list_name() -> &'static str {
        "Клиенты"
    }
}

// ============================================================================
// Child collections (composition: owned by the Customer aggregate)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: Uuid,
    /// Тип адреса: "REGISTRATION", "RESIDENTIAL", "MAILING"
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
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
    #[serde(rename = "isPrimary", default)]
    pub is_primary: bool,
    #[serde(rename = "validFrom")]
    pub valid_from: Option<NaiveDate>,
    #[serde(rename = "validTo")]
    pub valid_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub id: Uuid,
    /// Тип документа: "PASSPORT", "NATIONAL_ID", "DRIVER_LICENSE"
    #[serde(rename = "idType")]
    pub id_type: String,
    pub number: String,
    #[serde(rename = "issuingCountryCode")]
    pub issuing_country_code: Option<String>,
    #[serde(rename = "issueDate")]
    pub issue_date: Option<NaiveDate>,
    #[serde(rename = "expiryDate")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
    #[serde(rename = "isPrimary", default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRelationship {
    pub id: Uuid,
    #[serde(rename = "relatedCustomerId")]
    pub related_customer_id: Uuid,
    /// Тип связи: "SPOUSE", "GUARDIAN", "EMPLOYER", "BENEFICIARY"
    #[serde(rename = "relationshipType")]
    pub relationship_type: String,
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
    #[serde(rename = "isPrimary", default)]
    pub is_primary: bool,
    #[serde(rename = "validFrom")]
    pub valid_from: Option<NaiveDate>,
    #[serde(rename = "validTo")]
    pub valid_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProduct {
    pub id: Uuid,
    #[serde(rename = "productCode")]
    pub product_code: String,
    #[serde(rename = "accountNumber")]
    pub account_number: Option<String>,
    #[serde(rename = "isActive", default)]
    pub is_active: bool,
    #[serde(rename = "isPrimary", default)]
    pub is_primary: bool,
    #[serde(rename = "enrolledAt")]
    pub enrolled_at: Option<NaiveDate>,
    #[serde(rename = "closedAt")]
    pub closed_at: Option<NaiveDate>,
}
