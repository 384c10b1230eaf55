//! sea-orm модели корневой таблицы клиента и дочерних таблиц.
//!
//! Дочерние таблицы носят префикс агрегата (`a001_customer_`), см.
//! `AggregateRoot::table_prefix`.

pub mod customer {
    use chrono::Utc;
    use contracts::domain::a001_customer::aggregate::{Customer, CustomerId, CustomerStatus};
    use contracts::domain::common::{BaseAggregate, EntityMetadata};
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a001_customer")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub code: String,
        pub description: String,
        pub comment: Option<String>,
        pub status: String,
        pub first_name: String,
        pub last_name: String,
        pub middle_name: Option<String>,
        pub date_of_birth: Option<chrono::NaiveDate>,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub segment_code: Option<String>,
        pub risk_level_code: Option<String>,
        pub kyc_status_code: Option<String>,
        pub occupation_code: Option<String>,
        pub industry_code: Option<String>,
        pub sector_code: Option<String>,
        pub created_at: Option<chrono::DateTime<chrono::Utc>>,
        pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
        pub created_by: Option<String>,
        pub updated_by: Option<String>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Customer {
        fn from(m: Model) -> Self {
            let metadata = EntityMetadata {
                created_at: m.created_at.unwrap_or_else(Utc::now),
                updated_at: m.updated_at.unwrap_or_else(Utc::now),
                created_by: m.created_by,
                updated_by: m.updated_by,
                version: m.version,
            };
            let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

            Customer {
                base: BaseAggregate::with_metadata(
                    CustomerId::new(uuid),
                    m.code,
                    m.description,
                    m.comment,
                    metadata,
                ),
                status: CustomerStatus::parse(&m.status).unwrap_or(CustomerStatus::Inactive),
                first_name: m.first_name,
                last_name: m.last_name,
                middle_name: m.middle_name,
                date_of_birth: m.date_of_birth,
                email: m.email,
                phone: m.phone,
                segment_code: m.segment_code,
                risk_level_code: m.risk_level_code,
                kyc_status_code: m.kyc_status_code,
                occupation_code: m.occupation_code,
                industry_code: m.industry_code,
                sector_code: m.sector_code,
                addresses: Vec::new(),
                identifications: Vec::new(),
                relationships: Vec::new(),
                products: Vec::new(),
            }
        }
    }
}

pub mod address {
    use contracts::domain::a001_customer::aggregate::Address;
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a001_customer_address")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub customer_id: String,
        pub address_type: String,
        pub line1: String,
        pub line2: Option<String>,
        pub city: String,
        pub province_code: Option<String>,
        pub postal_code: Option<String>,
        pub country_code: String,
        pub is_active: bool,
        pub is_primary: bool,
        pub valid_from: Option<chrono::NaiveDate>,
        pub valid_to: Option<chrono::NaiveDate>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Address {
        fn from(m: Model) -> Self {
            Address {
                id: Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4()),
                address_type: m.address_type,
                line1: m.line1,
                line2: m.line2,
                city: m.city,
                province_code: m.province_code,
                postal_code: m.postal_code,
                country_code: m.country_code,
                is_active: m.is_active,
                is_primary: m.is_primary,
                valid_from: m.valid_from,
                valid_to: m.valid_to,
            }
        }
    }
}

pub mod identification {
    use contracts::domain::a001_customer::aggregate::Identification;
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a001_customer_identification")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub customer_id: String,
        pub id_type: String,
        pub number: String,
        pub issuing_country_code: Option<String>,
        pub issue_date: Option<chrono::NaiveDate>,
        pub expiry_date: Option<chrono::NaiveDate>,
        pub is_active: bool,
        pub is_primary: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Identification {
        fn from(m: Model) -> Self {
            Identification {
                id: Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4()),
                id_type: m.id_type,
                number: m.number,
                issuing_country_code: m.issuing_country_code,
                issue_date: m.issue_date,
                expiry_date: m.expiry_date,
                is_active: m.is_active,
                is_primary: m.is_primary,
            }
        }
    }
}

pub mod relationship {
    use contracts::domain::a001_customer::aggregate::CustomerRelationship;
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a001_customer_relationship")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub customer_id: String,
        pub related_customer_id: String,
        pub relationship_type: String,
        pub is_active: bool,
        pub is_primary: bool,
        pub valid_from: Option<chrono::NaiveDate>,
        pub valid_to: Option<chrono::NaiveDate>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for CustomerRelationship {
        fn from(m: Model) -> Self {
            CustomerRelationship {
                id: Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4()),
                related_customer_id: Uuid::parse_str(&m.related_customer_id)
                    .unwrap_or_else(|_| Uuid::new_v4()),
                relationship_type: m.relationship_type,
                is_active: m.is_active,
                is_primary: m.is_primary,
                valid_from: m.valid_from,
                valid_to: m.valid_to,
            }
        }
    }
}

pub mod product {
    use contracts::domain::a001_customer::aggregate::CustomerProduct;
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "a001_customer_product")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub customer_id: String,
        pub product_code: String,
        pub account_number: Option<String>,
        pub is_active: bool,
        pub is_primary: bool,
        pub enrolled_at: Option<chrono::NaiveDate>,
        pub closed_at: Option<chrono::NaiveDate>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for CustomerProduct {
        fn from(m: Model) -> Self {
            CustomerProduct {
                id: Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4()),
                product_code: m.product_code,
                account_number: m.account_number,
                is_active: m.is_active,
                is_primary: m.is_primary,
                enrolled_at: m.enrolled_at,
                closed_at: m.closed_at,
            }
        }
    }
}
