//! Domain DTOs for the venue API.
//!
//! Every success body arrives wrapped as `{"meta": {...}, "response": {...}}`;
//! `Envelope` strips that wrapper before the payload is mapped.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub response: T,
}

/// A venue in the food category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub formatted_address: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Price {
    pub tier: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Restaurants near a coordinate, in the order the server ranked them.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedRestaurants {
    pub list: Vec<Restaurant>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VenuesPayload {
    pub venues: Vec<Restaurant>,
}

/// A single restaurant with the fields only the detail endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestaurantDetail {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VenuePayload {
    pub venue: RestaurantDetail,
}

/// A check-in recorded by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub id: String,
    pub venue_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shout: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckinPayload {
    pub checkin: Checkin,
}
