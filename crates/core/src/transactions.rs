//! Order history to transaction conversion.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::item::ItemId;
use crate::domain::order::Order;

/// One completed purchase as a set of item identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction(BTreeSet<ItemId>);

impl Transaction {
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        Self(items.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.0.contains(item)
    }

    pub fn contains_all<'a, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        items.into_iter().all(|item| self.0.contains(item))
    }

    pub fn intersects<'a, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        items.into_iter().any(|item| self.0.contains(item))
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Maps an order line's item reference to a catalog identifier.
pub trait ItemResolver {
    fn resolve(&self, reference: &str) -> Option<ItemId>;
}

/// Builds one transaction per order, keeping input order.
///
/// Lines that do not resolve are skipped; an order with no resolvable line is
/// dropped entirely rather than kept as an empty transaction.
pub fn build_transactions<'a, I, R>(orders: I, resolver: &R) -> Vec<Transaction>
where
    I: IntoIterator<Item = &'a Order>,
    R: ItemResolver + ?Sized,
{
    let mut transactions = Vec::new();

    for order in orders {
        let mut items = BTreeSet::new();
        for line in &order.lines {
            match resolver.resolve(&line.item_name) {
                Some(item_id) => {
                    items.insert(item_id);
                }
                None => debug!(
                    event_name = "transactions.line.unresolved",
                    order_id = %order.id.0,
                    item_name = %line.item_name,
                    "skipping order line with unknown item"
                ),
            }
        }

        if items.is_empty() {
            debug!(
                event_name = "transactions.order.dropped",
                order_id = %order.id.0,
                "order resolved to zero known items"
            );
            continue;
        }

        transactions.push(Transaction(items));
    }

    transactions
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::{build_transactions, ItemResolver, Transaction};
    use crate::domain::item::ItemId;
    use crate::domain::order::{Order, OrderId, OrderLine, OrderStatus};

    struct NameTable(HashMap<&'static str, &'static str>);

    impl ItemResolver for NameTable {
        fn resolve(&self, reference: &str) -> Option<ItemId> {
            self.0.get(reference).map(|id| ItemId::from(*id))
        }
    }

    fn resolver() -> NameTable {
        NameTable(HashMap::from([("Latte", "latte"), ("Bagel", "bagel"), ("Muffin", "muffin")]))
    }

    fn order(id: &str, names: &[&str]) -> Order {
        Order {
            id: OrderId(id.to_string()),
            status: OrderStatus::Delivered,
            lines: names
                .iter()
                .map(|name| OrderLine { item_name: name.to_string(), quantity: 1 })
                .collect(),
            placed_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_lines_collapse_into_one_item() {
        let orders = vec![order("o-1", &["Latte", "Latte", "Bagel"])];
        let transactions = build_transactions(&orders, &resolver());

        assert_eq!(transactions, vec![Transaction::new(["bagel", "latte"])]);
        assert_eq!(transactions[0].len(), 2);
    }

    #[test]
    fn unknown_lines_are_skipped_without_dropping_the_order() {
        let orders = vec![order("o-1", &["Latte", "Espresso Tonic"])];
        let transactions = build_transactions(&orders, &resolver());

        assert_eq!(transactions, vec![Transaction::new(["latte"])]);
    }

    #[test]
    fn orders_without_known_items_are_dropped() {
        let orders = vec![
            order("o-1", &["Espresso Tonic"]),
            order("o-2", &[]),
            order("o-3", &["Muffin"]),
        ];
        let transactions = build_transactions(&orders, &resolver());

        assert_eq!(transactions, vec![Transaction::new(["muffin"])]);
    }

    #[test]
    fn output_keeps_order_sequence() {
        let orders = vec![order("o-1", &["Muffin"]), order("o-2", &["Bagel"]), order("o-3", &["Latte"])];
        let transactions = build_transactions(&orders, &resolver());

        let firsts: Vec<&str> = transactions
            .iter()
            .filter_map(|transaction| transaction.items().next())
            .map(ItemId::as_str)
            .collect();
        assert_eq!(firsts, vec!["muffin", "bagel", "latte"]);
    }

    #[test]
    fn intersection_helpers() {
        let transaction = Transaction::new(["a", "b"]);
        let a = ItemId::from("a");
        let b = ItemId::from("b");
        let c = ItemId::from("c");

        assert!(transaction.contains_all([&a, &b]));
        assert!(!transaction.contains_all([&a, &c]));
        assert!(transaction.intersects([&c, &b]));
        assert!(!transaction.intersects([&c]));
    }
}
