//! Persisted customer profile, used to pre-fill checkout.

use serde::{Deserialize, Serialize};

use super::storage::{get_json, set_json, ClientStorage};

pub const PROFILE_STORAGE_KEY: &str = "customer_profile";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub landmark: String,
}

/// Store for the customer profile. Independent of any specific order.
#[derive(Debug)]
pub struct ProfileStore<S: ClientStorage> {
    storage: S,
}

impl<S: ClientStorage> ProfileStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn load(&self) -> Option<CustomerProfile> {
        get_json(&self.storage, PROFILE_STORAGE_KEY)
    }

    pub fn save(&self, profile: &CustomerProfile) {
        set_json(&self.storage, PROFILE_STORAGE_KEY, profile);
    }

    pub fn clear(&self) {
        self.storage.remove(PROFILE_STORAGE_KEY);
    }
}
