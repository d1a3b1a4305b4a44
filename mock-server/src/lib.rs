use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub formatted_address: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Price {
    pub tier: u8,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub formatted_phone: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub id: String,
    pub venue_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shout: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinRequest {
    pub venue_id: String,
    pub shout: Option<String>,
    #[serde(rename = "client_id")]
    pub client_id: Option<String>,
    #[serde(rename = "client_secret")]
    pub client_secret: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    venues: Arc<Vec<Venue>>,
    checkins: Arc<RwLock<Vec<Checkin>>>,
    latency: Duration,
}

impl AppState {
    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

/// A failure rendered in the API error envelope.
pub struct ApiFailure {
    status: StatusCode,
    error_type: &'static str,
    detail: String,
}

impl ApiFailure {
    fn param(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error_type: "param_error",
            detail: detail.into(),
        }
    }

    fn auth() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error_type: "invalid_auth",
            detail: "Missing access credentials.".to_string(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({
            "meta": {
                "code": self.status.as_u16(),
                "errorType": self.error_type,
                "errorDetail": self.detail,
            },
            "response": {},
        });
        (self.status, Json(body)).into_response()
    }
}

fn envelope(response: Value) -> Json<Value> {
    Json(json!({ "meta": { "code": 200 }, "response": response }))
}

pub fn fixtures() -> Vec<Venue> {
    vec![
        Venue {
            id: "49d51ce3f964a520675c1fe3".to_string(),
            name: "Katz's Delicatessen".to_string(),
            location: Location {
                address: Some("205 E Houston St".to_string()),
                formatted_address: vec![
                    "205 E Houston St (at Ludlow St)".to_string(),
                    "New York, NY 10002".to_string(),
                ],
            },
            rating: Some(9.1),
            price: Some(Price {
                tier: 2,
                message: "Moderate".to_string(),
            }),
            verified: true,
            url: Some("http://katzsdelicatessen.com".to_string()),
            contact: Some(Contact {
                formatted_phone: "(212) 254-2246".to_string(),
            }),
        },
        Venue {
            id: "4a3ad0e8f964a52088a01fe3".to_string(),
            name: "Joe's Pizza".to_string(),
            location: Location {
                address: None,
                formatted_address: vec!["7 Carmine St".to_string(), "New York, NY 10014".to_string()],
            },
            rating: None,
            price: Some(Price {
                tier: 1,
                message: "Cheap".to_string(),
            }),
            verified: false,
            url: None,
            contact: None,
        },
        Venue {
            id: "3fd66200f964a52000e71ee3".to_string(),
            name: "Russ & Daughters".to_string(),
            location: Location {
                address: Some("179 E Houston St".to_string()),
                formatted_address: vec!["179 E Houston St".to_string(), "New York, NY 10002".to_string()],
            },
            rating: Some(9.3),
            price: None,
            verified: true,
            url: None,
            contact: None,
        },
    ]
}

pub fn app() -> Router {
    app_with_latency(Duration::ZERO)
}

/// Same routes, but every handler waits `latency` before answering.
pub fn app_with_latency(latency: Duration) -> Router {
    let state = AppState {
        venues: Arc::new(fixtures()),
        checkins: Arc::new(RwLock::new(Vec::new())),
        latency,
    };
    Router::new()
        .route("/v2/venues/search", get(search_venues))
        .route("/v2/venues/{id}", get(get_venue))
        .route("/v2/checkins/add", post(add_checkin))
        .route("/v2/checkins/recent", get(recent_checkins))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_latency(listener: TcpListener, latency: Duration) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_latency(latency)).await
}

fn authorize(client_id: Option<&str>, client_secret: Option<&str>) -> Result<(), ApiFailure> {
    match (client_id, client_secret) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok(()),
        _ => Err(ApiFailure::auth()),
    }
}

fn authorize_query(query: &HashMap<String, String>) -> Result<(), ApiFailure> {
    authorize(
        query.get("client_id").map(String::as_str),
        query.get("client_secret").map(String::as_str),
    )
}

fn parse_ll(raw: &str) -> Option<(f64, f64)> {
    let (lat, lng) = raw.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)).then_some((lat, lng))
}

async fn search_venues(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiFailure> {
    state.pause().await;
    authorize_query(&query)?;
    let ll = query
        .get("ll")
        .ok_or_else(|| ApiFailure::param("Must provide parameter ll"))?;
    let (lat, lng) = parse_ll(ll).ok_or_else(|| ApiFailure::param(format!("Invalid ll {ll}")))?;
    let limit = match query.get("limit") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiFailure::param(format!("Invalid limit {raw}")))?,
        None => usize::MAX,
    };

    tracing::debug!(lat, lng, limit, "search venues");
    let venues: Vec<&Venue> = state.venues.iter().take(limit).collect();
    Ok(envelope(json!({ "venues": venues })))
}

async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiFailure> {
    state.pause().await;
    authorize_query(&query)?;
    let venue = state
        .venues
        .iter()
        .find(|venue| venue.id == id)
        .ok_or_else(|| ApiFailure::param(format!("Value {id} is invalid for venue id")))?;
    Ok(envelope(json!({ "venue": venue })))
}

async fn add_checkin(
    State(state): State<AppState>,
    Json(input): Json<CheckinRequest>,
) -> Result<Json<Value>, ApiFailure> {
    state.pause().await;
    authorize(input.client_id.as_deref(), input.client_secret.as_deref())?;
    if !state.venues.iter().any(|venue| venue.id == input.venue_id) {
        return Err(ApiFailure::param(format!(
            "Value {} is invalid for venueId",
            input.venue_id
        )));
    }
    let checkin = Checkin {
        id: Uuid::new_v4().simple().to_string(),
        venue_id: input.venue_id,
        shout: input.shout,
    };
    state.checkins.write().await.push(checkin.clone());
    Ok(envelope(json!({ "checkin": checkin })))
}

/// Check-ins recorded by this server, newest first.
async fn recent_checkins(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiFailure> {
    state.pause().await;
    authorize_query(&query)?;
    let checkins: Vec<Checkin> = state.checkins.read().await.iter().rev().cloned().collect();
    Ok(envelope(json!({ "checkins": checkins })))
}
