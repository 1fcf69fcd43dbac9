//! Delivery-mode assist: distance from the store and free-delivery
//! classification.
//!
//! The result only pre-selects a delivery-mode choice in the checkout form;
//! it never gates submission and is not re-validated server-side. A failed
//! geolocation lookup resolves to an explicit [`GeolocationError`] rather
//! than throwing into the surrounding flow.

use serde::{Deserialize, Serialize};

use crate::entities::DeliveryMode;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Great-circle distance between two points, in kilometers (haversine).
/// Deterministic for fixed coordinate pairs.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryClass {
    /// Inside the free radius: store-operated delivery at no charge.
    FreeDelivery,
    /// Outside the radius: third-party rider, paid by the customer.
    EasyDelivery,
}

/// Classifies a distance against the free-delivery radius (inclusive).
pub fn classify(distance_km: f64, free_radius_km: f64) -> DeliveryClass {
    if distance_km <= free_radius_km {
        DeliveryClass::FreeDelivery
    } else {
        DeliveryClass::EasyDelivery
    }
}

/// Delivery mode the checkout form should pre-select for a distance.
pub fn suggest_delivery_mode(distance_km: f64, free_radius_km: f64) -> DeliveryMode {
    match classify(distance_km, free_radius_km) {
        DeliveryClass::FreeDelivery => DeliveryMode::FreeDelivery,
        DeliveryClass::EasyDelivery => DeliveryMode::EasyDelivery,
    }
}

/// Geolocation failure taxonomy. Each case maps to its own user-facing
/// message; callers render the message and fall back to manual mode choice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum GeolocationError {
    #[error("geolocation is not supported on this device")]
    Unsupported,
    #[error("location permission was denied")]
    PermissionDenied,
    #[error("current position is unavailable")]
    PositionUnavailable,
    #[error("location lookup timed out")]
    Timeout,
    #[error("location lookup failed: {0}")]
    Other(String),
}

impl GeolocationError {
    /// Message shown to the customer in the checkout form.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unsupported => "This device does not support location lookup",
            Self::PermissionDenied => {
                "Location permission was denied, please choose a delivery option yourself"
            }
            Self::PositionUnavailable => "Could not determine your location",
            Self::Timeout => "Location lookup took too long, please try again",
            Self::Other(_) => "Location lookup failed, please choose a delivery option yourself",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Coordinates {
        Coordinates {
            latitude: 13.7563,
            longitude: 100.5018,
        }
    }

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(haversine_km(store(), store()), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = Coordinates {
            latitude: 13.0,
            longitude: 100.0,
        };
        let b = Coordinates {
            latitude: 14.0,
            longitude: 100.0,
        };
        let distance = haversine_km(a, b);
        assert!((distance - 111.19).abs() < 0.05, "got {}", distance);
    }

    #[test]
    fn distance_is_symmetric() {
        let customer = Coordinates {
            latitude: 13.7649,
            longitude: 100.5383,
        };
        let there = haversine_km(store(), customer);
        let back = haversine_km(customer, store());
        assert!((there - back).abs() < 1e-9);
        // Victory Monument area: a few kilometers from the default store.
        assert!(there > 3.5 && there < 4.5, "got {}", there);
    }

    #[test]
    fn classification_boundary_is_inclusive() {
        assert_eq!(classify(1.99, 2.0), DeliveryClass::FreeDelivery);
        assert_eq!(classify(2.0, 2.0), DeliveryClass::FreeDelivery);
        assert_eq!(classify(2.001, 2.0), DeliveryClass::EasyDelivery);
    }

    #[test]
    fn suggested_mode_follows_classification() {
        assert_eq!(suggest_delivery_mode(0.8, 2.0), DeliveryMode::FreeDelivery);
        assert_eq!(suggest_delivery_mode(5.2, 2.0), DeliveryMode::EasyDelivery);
    }

    #[test]
    fn every_failure_has_a_distinct_message() {
        let errors = [
            GeolocationError::Unsupported,
            GeolocationError::PermissionDenied,
            GeolocationError::PositionUnavailable,
            GeolocationError::Timeout,
        ];
        for (i, a) in errors.iter().enumerate() {
            for b in errors.iter().skip(i + 1) {
                assert_ne!(a.user_message(), b.user_message());
            }
        }
    }
}
