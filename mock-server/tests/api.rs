use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::ServiceExt;

const AUTH: &str = "client_id=id&client_secret=secret&v=20170801";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- search ---

#[tokio::test]
async fn search_returns_venues_in_envelope() {
    let resp = app()
        .oneshot(get(&format!("/v2/venues/search?ll=40.7,-74.0&{AUTH}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["meta"]["code"], 200);
    let venues = json["response"]["venues"].as_array().unwrap();
    assert_eq!(venues.len(), 3);
    assert_eq!(venues[0]["name"], "Katz's Delicatessen");
}

#[tokio::test]
async fn search_honors_limit() {
    let resp = app()
        .oneshot(get(&format!("/v2/venues/search?ll=40.7,-74.0&limit=1&{AUTH}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["response"]["venues"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn search_without_ll_is_param_error() {
    let resp = app()
        .oneshot(get(&format!("/v2/venues/search?{AUTH}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["meta"]["code"], 400);
    assert_eq!(json["meta"]["errorType"], "param_error");
    assert_eq!(json["meta"]["errorDetail"], "Must provide parameter ll");
}

#[tokio::test]
async fn search_without_credentials_is_auth_error() {
    let resp = app()
        .oneshot(get("/v2/venues/search?ll=40.7,-74.0"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(resp).await;
    assert_eq!(json["meta"]["errorType"], "invalid_auth");
}

// --- detail ---

#[tokio::test]
async fn venue_detail_found() {
    let resp = app()
        .oneshot(get(&format!("/v2/venues/49d51ce3f964a520675c1fe3?{AUTH}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["response"]["venue"]["rating"], 9.1);
    assert_eq!(json["response"]["venue"]["price"]["tier"], 2);
}

#[tokio::test]
async fn venue_detail_unknown_id() {
    let resp = app()
        .oneshot(get(&format!("/v2/venues/nope?{AUTH}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["meta"]["errorDetail"], "Value nope is invalid for venue id");
}

// --- check-in ---

#[tokio::test]
async fn checkin_is_recorded() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/v2/checkins/add",
            r#"{"venueId":"49d51ce3f964a520675c1fe3","shout":"pastrami","client_id":"id","client_secret":"secret"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let checkin = &json["response"]["checkin"];
    assert_eq!(checkin["venueId"], "49d51ce3f964a520675c1fe3");
    assert_eq!(checkin["shout"], "pastrami");
    assert_eq!(checkin["id"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn checkin_unknown_venue() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/v2/checkins/add",
            r#"{"venueId":"nope","client_id":"id","client_secret":"secret"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkin_malformed_json_is_not_an_envelope() {
    let resp = app()
        .oneshot(json_request("POST", "/v2/checkins/add", r#"{"shout":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_bytes(resp).await;
    assert!(serde_json::from_slice::<Value>(&body).is_err());
}

#[tokio::test]
async fn recent_checkins_lists_newest_first() {
    let app = app();
    for (venue, shout) in [("49d51ce3f964a520675c1fe3", "first"), ("3fd66200f964a52000e71ee3", "second")] {
        let body = format!(
            r#"{{"venueId":"{venue}","shout":"{shout}","client_id":"id","client_secret":"secret"}}"#
        );
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/v2/checkins/add", &body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app
        .clone()
        .oneshot(get(&format!("/v2/checkins/recent?{AUTH}")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let checkins = json["response"]["checkins"].as_array().unwrap();
    assert_eq!(checkins.len(), 2);
    assert_eq!(checkins[0]["shout"], "second");
    assert_eq!(checkins[1]["venueId"], "49d51ce3f964a520675c1fe3");
}

#[tokio::test]
async fn recent_checkins_requires_credentials() {
    let resp = app().oneshot(get("/v2/checkins/recent")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn fresh_server_has_no_checkins() {
    let resp = app()
        .oneshot(get(&format!("/v2/checkins/recent?{AUTH}")))
        .await
        .unwrap();

    let json = body_json(resp).await;
    assert!(json["response"]["checkins"].as_array().unwrap().is_empty());
}

// --- routing ---

#[tokio::test]
async fn unknown_route_is_404_with_empty_body() {
    let resp = app().oneshot(get("/v2/users/self")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());
}
