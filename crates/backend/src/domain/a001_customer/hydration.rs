use contracts::domain::a001_customer::search::FetchTier;

/// Дочерняя коллекция агрегата клиента
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildCollection {
    Addresses,
    Identifications,
    Relationships,
    Products,
}

/// Какие дочерние коллекции грузить для данного уровня.
///
/// Выбор уровня не участвует в фильтрации: гидратация выполняется
/// отдельными запросами `customer_id IN (…)` и не может выкинуть
/// корень с пустыми коллекциями из результата.
pub fn collections_for(tier: FetchTier) -> &'static [ChildCollection] {
    match tier {
        FetchTier::Summary => &[],
        FetchTier::Basic => &[ChildCollection::Addresses, ChildCollection::Identifications],
        FetchTier::Full => &[
            ChildCollection::Addresses,
            ChildCollection::Identifications,
            ChildCollection::Relationships,
            ChildCollection::Products,
        ],
    }
}

pub fn includes(tier: FetchTier, collection: ChildCollection) -> bool {
    collections_for(tier).contains(&collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_nested() {
        // Summary ⊆ Basic ⊆ Full
        for c in collections_for(FetchTier::Summary) {
            assert!(includes(FetchTier::Basic, *c));
        }
        for c in collections_for(FetchTier::Basic) {
            assert!(includes(FetchTier::Full, *c));
        }
        assert_eq!(collections_for(FetchTier::Summary).len(), 0);
        assert_eq!(collections_for(FetchTier::Basic).len(), 2);
        assert_eq!(collections_for(FetchTier::Full).len(), 4);
    }
}
