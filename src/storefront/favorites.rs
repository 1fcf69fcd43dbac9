//! Persisted favorites: product snapshots keyed by product id.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::storage::{get_json, set_json, ClientStorage};

pub const FAVORITES_STORAGE_KEY: &str = "favorite_products";

/// Snapshot of a product at the moment it was favorited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteProduct {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
}

/// Store for the customer's favorite products. Independent of the cart.
#[derive(Debug)]
pub struct FavoritesStore<S: ClientStorage> {
    storage: S,
    favorites: BTreeMap<String, FavoriteProduct>,
}

impl<S: ClientStorage> FavoritesStore<S> {
    pub fn load(storage: S) -> Self {
        let favorites = get_json(&storage, FAVORITES_STORAGE_KEY).unwrap_or_default();
        Self { storage, favorites }
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.favorites.contains_key(product_id)
    }

    /// Adds the product if absent, removes it if present. Returns whether
    /// the product is a favorite afterwards.
    pub fn toggle(&mut self, product: FavoriteProduct) -> bool {
        let now_favorite = if self.favorites.contains_key(&product.product_id) {
            self.favorites.remove(&product.product_id);
            false
        } else {
            self.favorites.insert(product.product_id.clone(), product);
            true
        };
        self.persist();
        now_favorite
    }

    pub fn remove(&mut self, product_id: &str) -> bool {
        let removed = self.favorites.remove(product_id).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    pub fn all(&self) -> impl Iterator<Item = &FavoriteProduct> {
        self.favorites.values()
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    fn persist(&self) {
        if self.favorites.is_empty() {
            self.storage.remove(FAVORITES_STORAGE_KEY);
        } else {
            set_json(&self.storage, FAVORITES_STORAGE_KEY, &self.favorites);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront::storage::MemoryStorage;
    use rust_decimal_macros::dec;

    fn pad_thai() -> FavoriteProduct {
        FavoriteProduct {
            product_id: "prod-a".into(),
            name: "Pad Thai".into(),
            unit_price: dec!(50),
        }
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut favorites = FavoritesStore::load(MemoryStorage::new());
        assert!(favorites.toggle(pad_thai()));
        assert!(favorites.contains("prod-a"));
        assert!(!favorites.toggle(pad_thai()));
        assert!(favorites.is_empty());
    }

    #[test]
    fn favorites_survive_reload() {
        let storage = MemoryStorage::new();
        {
            let mut favorites = FavoritesStore::load(&storage);
            favorites.toggle(pad_thai());
        }
        let favorites = FavoritesStore::load(&storage);
        assert_eq!(favorites.len(), 1);
        assert!(favorites.contains("prod-a"));
    }
}
