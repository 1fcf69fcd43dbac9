//! Client-local cart state.
//!
//! One cart item is one unit of a product; there is no quantity field, so
//! "add 3" produces three separate items, each with its own editable note.
//! Every mutation bumps the last-modified timestamp and persists the whole
//! cart; a cart left untouched past the idle-expiry window is discarded on
//! the next load.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use super::storage::{get_json, set_json, ClientStorage};

pub const CART_STORAGE_KEY: &str = "storefront_cart";

/// One unsubmitted unit of a product, with its own note and option
/// selection. The product fields are snapshots taken at add time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl CartItem {
    /// Display-grouping key: same product with the same option selection
    /// collapses into one visual group.
    fn group_key(&self) -> String {
        let options = serde_json::to_string(&self.options).unwrap_or_default();
        format!("{}|{}", self.product_id, options)
    }
}

/// A visually collapsed group of identical product+option configurations.
/// The contained items stay individually addressable for note edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartGroup {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub options: BTreeMap<String, String>,
    pub items: Vec<CartItem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCart {
    items: Vec<CartItem>,
    last_modified: DateTime<Utc>,
}

/// The cart state container. Reads are synchronous from the in-memory
/// mirror; every mutation writes through to storage.
#[derive(Debug)]
pub struct CartStore<S: ClientStorage> {
    storage: S,
    idle_expiry: Duration,
    items: Vec<CartItem>,
    last_modified: DateTime<Utc>,
}

impl<S: ClientStorage> CartStore<S> {
    /// Loads the cart from storage, running the idle-expiry check once: a
    /// cart untouched for longer than `idle_expiry` comes back empty.
    pub fn load(storage: S, idle_expiry: Duration) -> Self {
        let persisted: Option<PersistedCart> = get_json(&storage, CART_STORAGE_KEY);
        let (items, last_modified) = match persisted {
            Some(persisted) => (persisted.items, persisted.last_modified),
            None => (Vec::new(), Utc::now()),
        };

        let mut store = Self {
            storage,
            idle_expiry,
            items,
            last_modified,
        };
        store.expire_if_idle();
        store
    }

    /// Discards the cart if it has sat untouched past the idle-expiry
    /// window. Returns whether anything was discarded.
    pub fn expire_if_idle(&mut self) -> bool {
        if self.items.is_empty() || Utc::now() - self.last_modified <= self.idle_expiry {
            return false;
        }

        info!(
            idle_hours = (Utc::now() - self.last_modified).num_hours(),
            "Discarding idle cart"
        );
        self.items.clear();
        self.touch_and_persist();
        true
    }

    /// Adds one unit of a product with an empty note; returns the new item's
    /// local id.
    pub fn add_item(
        &mut self,
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        options: BTreeMap<String, String>,
    ) -> Uuid {
        let item = CartItem {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            note: String::new(),
            options,
        };
        let id = item.id;
        self.items.push(item);
        self.touch_and_persist();
        id
    }

    /// Removes a single item by its local id.
    pub fn remove_item(&mut self, item_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        let removed = self.items.len() != before;
        if removed {
            self.touch_and_persist();
        }
        removed
    }

    /// Edits one item's free-text note in place.
    pub fn update_note(&mut self, item_id: Uuid, note: impl Into<String>) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) else {
            return false;
        };
        item.note = note.into();
        self.touch_and_persist();
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch_and_persist();
    }

    /// Sum of unit prices. No quantity multiplication: each unit is its
    /// own entry.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|item| item.unit_price).sum()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Display view: identical product+option configurations collapse into
    /// one group, in first-added order, with every physical item preserved.
    pub fn grouped(&self) -> Vec<CartGroup> {
        let mut groups: Vec<(String, CartGroup)> = Vec::new();

        for item in &self.items {
            let key = item.group_key();
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, group)) => group.items.push(item.clone()),
                None => groups.push((
                    key,
                    CartGroup {
                        product_id: item.product_id.clone(),
                        name: item.name.clone(),
                        unit_price: item.unit_price,
                        options: item.options.clone(),
                        items: vec![item.clone()],
                    },
                )),
            }
        }

        groups.into_iter().map(|(_, group)| group).collect()
    }

    fn touch_and_persist(&mut self) {
        self.last_modified = Utc::now();
        if self.items.is_empty() {
            self.storage.remove(CART_STORAGE_KEY);
        } else {
            set_json(
                &self.storage,
                CART_STORAGE_KEY,
                &PersistedCart {
                    items: self.items.clone(),
                    last_modified: self.last_modified,
                },
            );
        }
    }
}
