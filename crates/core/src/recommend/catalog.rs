use std::collections::HashMap;

use crate::domain::item::{Item, ItemId};
use crate::transactions::ItemResolver;

/// Identifier to catalog record lookup, used for presentation only
pub trait ItemCatalog {
    fn item(&self, id: &ItemId) -> Option<&Item>;
}

/// In-memory snapshot of the item catalog.
///
/// Loaded by the caller before mining so the core never performs I/O.
/// Resolves order references by identifier or by case-insensitive name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<ItemId, Item>,
    by_name: HashMap<String, ItemId>,
}

impl Catalog {
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let mut catalog = Self::default();
        for item in items {
            catalog.by_name.insert(normalize_name(&item.name), item.id.clone());
            catalog.items.insert(item.id.clone(), item);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }
}

impl ItemCatalog for Catalog {
    fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }
}

impl ItemResolver for Catalog {
    fn resolve(&self, reference: &str) -> Option<ItemId> {
        let reference = reference.trim();
        if let Some(item) = self.items.get(&ItemId::from(reference)) {
            return Some(item.id.clone());
        }
        self.by_name.get(&normalize_name(reference)).cloned()
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
