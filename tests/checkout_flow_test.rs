//! Checkout flow tests: cart + profile + delivery/payment choice assemble
//! into an order, the server accepts it, the cart clears, and the customer
//! tracks the order's room.

mod common;

use chrono::Duration as ChronoDuration;
use common::TestApp;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::time::Duration;

use khrua_api::{
    entities::{DeliveryMode, OrderStatus, PaymentMethod},
    events::{Room, RoomEvent},
    storefront::{
        checkout::complete_checkout, CartStore, CheckoutError, CustomerProfile, MemoryStorage,
        OrderDraft, ProfileStore,
    },
};

fn loaded_cart() -> CartStore<MemoryStorage> {
    let mut cart = CartStore::load(MemoryStorage::new(), ChronoDuration::hours(24));
    cart.add_item("prod-a", "Product A", dec!(50), BTreeMap::new());
    cart.add_item("prod-b", "Product B", dec!(60), BTreeMap::new());
    cart
}

fn profile() -> CustomerProfile {
    CustomerProfile {
        name: "สมชาย ใจดี".into(),
        phone: "0812345678".into(),
        address: "99/1 Rama IV Rd".into(),
        landmark: "opposite the temple".into(),
    }
}

fn pickup_draft() -> OrderDraft {
    OrderDraft {
        profile: profile(),
        delivery_mode: DeliveryMode::Pickup,
        payment_method: PaymentMethod::Cash,
        distance_km: None,
        line_user_id: Some("U1234".into()),
    }
}

#[test]
fn draft_builds_a_request_mirroring_the_cart() {
    let cart = loaded_cart();
    let request = pickup_draft().build_request(&cart).unwrap();

    assert_eq!(request.total_amount, dec!(110));
    assert_eq!(request.line_items.len(), 2);
    assert_eq!(request.customer_name, "สมชาย ใจดี");
    // Pickup orders carry no address even when the profile has one.
    assert_eq!(request.delivery_address, None);
    assert_eq!(request.landmark, None);
}

#[test]
fn delivery_draft_carries_address_and_landmark() {
    let cart = loaded_cart();
    let mut draft = pickup_draft();
    draft.delivery_mode = DeliveryMode::FreeDelivery;
    draft.distance_km = Some(dec!(1.2));

    let request = draft.build_request(&cart).unwrap();
    assert_eq!(request.delivery_address.as_deref(), Some("99/1 Rama IV Rd"));
    assert_eq!(request.landmark.as_deref(), Some("opposite the temple"));
    assert_eq!(request.distance_km, Some(dec!(1.2)));
}

#[test]
fn draft_validation_mirrors_the_server() {
    let empty_cart = CartStore::load(MemoryStorage::new(), ChronoDuration::hours(24));
    assert_eq!(
        pickup_draft().build_request(&empty_cart).unwrap_err(),
        CheckoutError::EmptyCart
    );

    let cart = loaded_cart();

    let mut no_name = pickup_draft();
    no_name.profile.name = "  ".into();
    assert_eq!(
        no_name.build_request(&cart).unwrap_err(),
        CheckoutError::MissingName
    );

    let mut no_phone = pickup_draft();
    no_phone.profile.phone = String::new();
    assert_eq!(
        no_phone.build_request(&cart).unwrap_err(),
        CheckoutError::MissingPhone
    );

    let mut no_address = pickup_draft();
    no_address.delivery_mode = DeliveryMode::EasyDelivery;
    no_address.profile.address = String::new();
    assert_eq!(
        no_address.build_request(&cart).unwrap_err(),
        CheckoutError::MissingAddress
    );
}

#[test]
fn saved_profile_prefills_the_next_checkout() {
    let storage = MemoryStorage::new();
    let store = ProfileStore::new(&storage);
    assert_eq!(store.load(), None);

    store.save(&profile());

    // A new session sees the saved profile and can draft an order from it.
    let restored = ProfileStore::new(&storage).load().expect("saved profile");
    assert_eq!(restored, profile());

    let cart = loaded_cart();
    let draft = OrderDraft {
        profile: restored,
        delivery_mode: DeliveryMode::Pickup,
        payment_method: PaymentMethod::Cash,
        distance_km: None,
        line_user_id: None,
    };
    assert!(draft.build_request(&cart).is_ok());
}

#[tokio::test]
async fn submitted_order_clears_the_cart_and_tracks_its_room() {
    let app = TestApp::new().await;
    let svc = app.state.services.order.clone();

    let mut cart = loaded_cart();
    let request = pickup_draft().build_request(&cart).unwrap();

    let order = svc.create_order(request).await.unwrap();
    assert_eq!(order.total_amount, dec!(110));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.line_user_id.as_deref(), Some("U1234"));

    // Only after the server accepted the order does the cart clear.
    let room = complete_checkout(&mut cart, &order);
    assert!(cart.is_empty());
    assert_eq!(room, Room::Order(order.id.clone()));

    // Track the order: join its room, then the kitchen confirms it.
    let mut subscription = app.state.broadcaster.subscribe(room);
    svc.update_status(&order.id, OrderStatus::Confirmed)
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), subscription.recv())
        .await
        .expect("timed out waiting for room event")
        .expect("room closed");

    match event {
        RoomEvent::OrderStatusUpdated {
            order_id, status, ..
        } => {
            assert_eq!(order_id, order.id);
            assert_eq!(status, OrderStatus::Confirmed);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}
