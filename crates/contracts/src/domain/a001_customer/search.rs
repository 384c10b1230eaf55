use super::aggregate::CustomerStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Уровень жадной загрузки дочерних коллекций при чтении.
///
/// Выбор уровня меняет только наполнение найденных агрегатов,
/// но никогда — состав выборки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchTier {
    /// Только скалярные поля корня (для списков)
    #[default]
    Summary,
    /// + адреса и документы
    Basic,
    /// + связи, продукты
    Full,
}

/// Независимо-опциональные критерии поиска клиентов.
///
/// Пустой критерий не даёт ограничения; заполненные комбинируются через AND.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomerSearchCriteria {
    pub status: Option<CustomerStatus>,
    #[serde(rename = "segmentCode")]
    pub segment_code: Option<String>,
    #[serde(rename = "riskLevelCode")]
    pub risk_level_code: Option<String>,
    #[serde(rename = "kycStatusCode")]
    pub kyc_status_code: Option<String>,

    /// Подстрока в отображаемом имени (без учета регистра)
    #[serde(rename = "nameContains")]
    pub name_contains: Option<String>,
    pub email: Option<String>,

    #[serde(rename = "birthDateFrom")]
    pub birth_date_from: Option<NaiveDate>,
    #[serde(rename = "birthDateTo")]
    pub birth_date_to: Option<NaiveDate>,
    #[serde(rename = "createdFrom")]
    pub created_from: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "createdTo")]
    pub created_to: Option<chrono::DateTime<chrono::Utc>>,

    // Экзистенциальные критерии по дочерним таблицам:
    // достаточно одной подходящей дочерней строки
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

    /// Свободный текст: OR по имени, коду, email и телефону
    #[serde(rename = "freeText")]
    pub free_text: Option<String>,

    /// Включать soft-deleted записи (по умолчанию скрыты)
    #[serde(rename = "includeDeleted", default)]
    pub include_deleted: bool,
}

/// Поле сортировки списка клиентов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSortBy {
    Code,
    #[default]
    Description,
    LastName,
    DateOfBirth,
    CreatedAt,
    UpdatedAt,
}

/// Сортировка: поле + направление
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct CustomerSort {
    #[serde(rename = "sortBy", default)]
    pub sort_by: CustomerSortBy,
    #[serde(rename = "sortDesc", default)]
    pub sort_desc: bool,
}

/// Запрошенная страница (нумерация с нуля)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    /// Смещение первой строки страницы; при абсурдно большом номере
    /// страницы насыщается вместо переполнения
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 50 }
    }
}

/// Страница результата с общим количеством по фильтру
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Общее число корневых записей под фильтром (без пагинации)
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

impl<T> Page<T> {
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: request.page,
            size: request.size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_page_times_size() {
        assert_eq!(PageRequest::new(0, 50).offset(), 0);
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
    }

    #[test]
    fn offset_saturates_instead_of_overflowing() {
        let request = PageRequest::new(u64::MAX, 50);
        assert_eq!(request.offset(), u64::MAX);
    }
}
