//! Storefront client state.
//!
//! The storefront runs inside a chat app's in-app browser and keeps its
//! mutable state device-local until checkout: the cart, the customer
//! profile, and favorites. Each concern is its own store with its own
//! persistence key; there is deliberately no monolithic global store.
//! Persistence is a convenience: storage failures degrade to no-ops with a
//! warning and never break the ordering flow.

pub mod cart;
pub mod checkout;
pub mod delivery;
pub mod favorites;
pub mod profile;
pub mod storage;

pub use cart::{CartGroup, CartItem, CartStore};
pub use checkout::{CheckoutError, OrderDraft};
pub use delivery::{classify, haversine_km, Coordinates, DeliveryClass, GeolocationError};
pub use favorites::{FavoriteProduct, FavoritesStore};
pub use profile::{CustomerProfile, ProfileStore};
pub use storage::{ClientStorage, JsonFileStorage, MemoryStorage};
