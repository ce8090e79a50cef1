use std::cmp::Ordering;

use super::catalog::Catalog;
use crate::domain::item::Item;

/// Source of popularity-ranked items for the fallback path
pub trait PopularitySource {
    fn popular_items(&self, limit: usize) -> Vec<Item>;
}

/// Rank by hearts, then rating, both descending; ties by id.
pub fn popularity_ranking(items: impl IntoIterator<Item = Item>, limit: usize) -> Vec<Item> {
    let mut ranked: Vec<Item> = items.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.hearts
            .cmp(&a.hearts)
            .then_with(|| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(limit);
    ranked
}

impl PopularitySource for Catalog {
    fn popular_items(&self, limit: usize) -> Vec<Item> {
        popularity_ranking(self.items().cloned(), limit)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::item::ItemId;

    fn item(id: &str, hearts: u32, rating: f64) -> Item {
        Item {
            id: ItemId::from(id),
            name: id.to_uppercase(),
            price: Decimal::new(500, 2),
            hearts,
            rating,
            available: true,
        }
    }

    #[test]
    fn hearts_rank_before_rating() {
        let ranked = popularity_ranking(
            vec![item("a", 3, 4.9), item("b", 10, 3.1), item("c", 10, 4.2), item("d", 1, 5.0)],
            10,
        );

        let order: Vec<&str> = ranked.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn ranking_is_limited() {
        let catalog = Catalog::new((0..15).map(|n| item(&format!("i{n:02}"), n, 4.0)));

        let popular = catalog.popular_items(10);

        assert_eq!(popular.len(), 10);
        assert_eq!(popular[0].id, ItemId::from("i14"));
    }
}
