//! Store status singleton tests: lazy default row, open/closed flips with
//! broadcast, and the special-menu / opening-hours settings.

mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, TestApp};
use serde_json::json;
use std::time::Duration;

use khrua_api::{
    events::{Room, RoomEvent},
    services::store_status::SetStoreStatusRequest,
};

#[tokio::test]
async fn first_read_creates_an_open_store() {
    let app = TestApp::new().await;

    let status = app.state.services.store_status.get().await.unwrap();
    assert!(status.is_open);
    assert_eq!(status.message, None);
}

#[tokio::test]
async fn closing_the_store_broadcasts_exactly_one_event() {
    let app = TestApp::new().await;
    let svc = app.state.services.store_status.clone();

    let mut subscription = app.state.broadcaster.subscribe(Room::StoreStatus);

    svc.set_status(SetStoreStatusRequest {
        is_open: false,
        message: Some("ปิดวันนี้".into()),
        close_time: None,
    })
    .await
    .unwrap();

    // A fresh fetch shows the closed state and the exact message.
    let fetched = svc.get().await.unwrap();
    assert!(!fetched.is_open);
    assert_eq!(fetched.message.as_deref(), Some("ปิดวันนี้"));

    let event = tokio::time::timeout(Duration::from_secs(2), subscription.recv())
        .await
        .expect("timed out waiting for store status event")
        .expect("room closed");

    match event {
        RoomEvent::StoreStatusChanged(payload) => {
            assert!(!payload.is_open);
            assert_eq!(payload.message.as_deref(), Some("ปิดวันนี้"));
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // At-most-once per emission: nothing else arrives for this change.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(subscription.try_recv().is_err());
}

#[tokio::test]
async fn special_menu_and_hours_are_persisted_settings() {
    let app = TestApp::new().await;
    let svc = app.state.services.store_status.clone();

    let menu = json!([{"product_id": "prod-a", "name": "Pad Thai", "price": "50"}]);
    let updated = svc.set_special_menu(menu.clone()).await.unwrap();
    assert_eq!(updated.special_menu, Some(menu.clone()));

    let hours = json!({"mon": "10:00-20:00", "tue": "10:00-20:00"});
    let updated = svc.set_opening_hours(hours.clone()).await.unwrap();
    assert_eq!(updated.opening_hours, Some(hours));
    // Earlier settings survive later updates.
    assert_eq!(updated.special_menu, Some(menu));
}

#[tokio::test]
async fn rest_store_status_read_is_public_and_write_is_admin_only() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/store/status", None).await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["is_open"], true);

    let payload = json!({"is_open": false, "message": "ปิดวันนี้"});
    let response = app
        .request(Method::POST, "/api/v1/store/status", Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request_authenticated(Method::POST, "/api/v1/store/status", Some(payload))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["data"]["is_open"], false);
    assert_eq!(body["data"]["message"], "ปิดวันนี้");
}
