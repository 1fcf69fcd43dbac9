//! Order submission flow: cart + customer info + delivery/payment choice
//! assemble into a create-order request.
//!
//! Validation here mirrors the server's so the customer sees problems
//! before the request leaves the device. The cart is cleared only after the
//! server confirms the order; the returned room key is what the storefront
//! joins to track status in real time.

use rust_decimal::Decimal;

use super::cart::CartStore;
use super::profile::CustomerProfile;
use super::storage::ClientStorage;
use crate::entities::{DeliveryMode, LineItem, PaymentMethod};
use crate::events::Room;
use crate::services::orders::{CreateOrderRequest, OrderResponse};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("customer name is required")]
    MissingName,
    #[error("customer phone is required")]
    MissingPhone,
    #[error("delivery address is required for delivery orders")]
    MissingAddress,
}

/// Everything the checkout form collects on top of the cart.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub profile: CustomerProfile,
    pub delivery_mode: DeliveryMode,
    pub payment_method: PaymentMethod,
    /// Distance computed by the delivery assist, if geolocation succeeded.
    pub distance_km: Option<Decimal>,
    /// Chat-platform user id, when the storefront runs inside the chat app.
    pub line_user_id: Option<String>,
}

impl OrderDraft {
    /// Assembles the create-order request from the draft and the current
    /// cart. The cart is left untouched; it is cleared only once the
    /// server accepts the order.
    pub fn build_request<S: ClientStorage>(
        &self,
        cart: &CartStore<S>,
    ) -> Result<CreateOrderRequest, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if self.profile.name.trim().is_empty() {
            return Err(CheckoutError::MissingName);
        }
        if self.profile.phone.trim().is_empty() {
            return Err(CheckoutError::MissingPhone);
        }

        let needs_address = self.delivery_mode != DeliveryMode::Pickup;
        if needs_address && self.profile.address.trim().is_empty() {
            return Err(CheckoutError::MissingAddress);
        }

        let line_items = cart
            .items()
            .iter()
            .map(|item| LineItem {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                unit_price: item.unit_price,
                note: match item.note.trim() {
                    "" => None,
                    note => Some(note.to_string()),
                },
                options: item.options.clone(),
            })
            .collect();

        Ok(CreateOrderRequest {
            customer_name: self.profile.name.trim().to_string(),
            customer_phone: self.profile.phone.trim().to_string(),
            line_items,
            total_amount: cart.total(),
            delivery_mode: self.delivery_mode,
            delivery_address: needs_address.then(|| self.profile.address.trim().to_string()),
            landmark: (needs_address && !self.profile.landmark.trim().is_empty())
                .then(|| self.profile.landmark.trim().to_string()),
            distance_km: self.distance_km,
            payment_method: self.payment_method,
            line_user_id: self.line_user_id.clone(),
        })
    }
}

/// Room the storefront joins to track a created order in real time.
pub fn tracking_room(order: &OrderResponse) -> Room {
    Room::Order(order.id.clone())
}

/// Post-submission bookkeeping: clears the cart and hands back the room to
/// subscribe to. Call only after the server accepted the order.
pub fn complete_checkout<S: ClientStorage>(cart: &mut CartStore<S>, order: &OrderResponse) -> Room {
    cart.clear();
    tracking_room(order)
}
