//! Endpoint catalogue for the venue API.
//!
//! # Design
//! `NearbyApi` holds only an `ApiConfig` and carries no mutable state between
//! calls. Each operation returns a `Resource` that pairs the encoded request
//! with the decoder for its envelope. Executing the round-trip is left to the
//! host (`nearby-client`, or anything that can turn an `HttpRequest` into an
//! `HttpResponse`).

use serde_json::{Map, Value};

use crate::config::ApiConfig;
use crate::error::RequestError;
use crate::http::HttpMethod;
use crate::resource::Resource;
use crate::router::{path_segment, RequestDescriptor};
use crate::types::{
    Checkin, CheckinPayload, Envelope, RestaurantDetail, SuggestedRestaurants, VenuePayload,
    VenuesPayload,
};

/// Top-level "Food" category of the venue taxonomy.
pub const FOOD_CATEGORY_ID: &str = "4d4b7105d754a06374d81259";

pub const DEFAULT_SEARCH_LIMIT: u32 = 30;

#[derive(Debug, Clone)]
pub struct NearbyApi {
    config: ApiConfig,
}

impl NearbyApi {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Restaurants around `(lat, lng)`.
    pub fn suggested_restaurants(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<Resource<SuggestedRestaurants>, RequestError> {
        let descriptor = self
            .descriptor(HttpMethod::Get, "/v2/venues/search")
            .parameter("ll", format!("{lat},{lng}"))
            .parameter("categoryId", FOOD_CATEGORY_ID)
            .parameter("intent", "checkin")
            .parameter("limit", DEFAULT_SEARCH_LIMIT);
        Resource::new(descriptor, |json| {
            let envelope: Envelope<VenuesPayload> = serde_json::from_value(json)?;
            Ok(SuggestedRestaurants {
                list: envelope.response.venues,
            })
        })
    }

    pub fn restaurant_detail(&self, id: &str) -> Result<Resource<RestaurantDetail>, RequestError> {
        let path = format!("/v2/venues/{}", path_segment(id)?);
        let descriptor = self.descriptor(HttpMethod::Get, &path);
        Resource::new(descriptor, |json| {
            let envelope: Envelope<VenuePayload> = serde_json::from_value(json)?;
            Ok(envelope.response.venue)
        })
    }

    pub fn check_in(&self, venue_id: &str, shout: Option<&str>) -> Result<Resource<Checkin>, RequestError> {
        let mut descriptor = self
            .descriptor(HttpMethod::Post, "/v2/checkins/add")
            .parameter("venueId", venue_id);
        if let Some(shout) = shout {
            descriptor = descriptor.parameter("shout", shout);
        }
        Resource::new(descriptor, |json| {
            let envelope: Envelope<CheckinPayload> = serde_json::from_value(json)?;
            Ok(envelope.response.checkin)
        })
    }

    /// Every call carries the client credentials and the version date.
    fn descriptor(&self, method: HttpMethod, path: &str) -> RequestDescriptor {
        let mut auth = Map::new();
        auth.insert("client_id".to_string(), Value::from(self.config.client_id.as_str()));
        auth.insert(
            "client_secret".to_string(),
            Value::from(self.config.client_secret.as_str()),
        );
        auth.insert("v".to_string(), Value::from(self.config.api_version.as_str()));

        let mut descriptor = RequestDescriptor::new(method, self.config.base_url.as_str(), path)
            .header("Accept", "application/json");
        descriptor.parameters = Some(auth);
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::error::ApplicationError;
    use crate::http::HttpResponse;

    fn api() -> NearbyApi {
        NearbyApi::new(ApiConfig::new("http://localhost:3000", "id", "secret"))
    }

    fn query(url: &str) -> Vec<(String, String)> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn suggested_restaurants_produces_correct_request() {
        let resource = api().suggested_restaurants(40.7, -74.0).unwrap();
        let req = resource.request();
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.url.starts_with("http://localhost:3000/v2/venues/search?"));
        assert!(req.body.is_none());
        let pairs = query(&req.url);
        let get = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        assert_eq!(get("ll"), Some("40.7,-74"));
        assert_eq!(get("categoryId"), Some(FOOD_CATEGORY_ID));
        assert_eq!(get("intent"), Some("checkin"));
        assert_eq!(get("limit"), Some("30"));
        assert_eq!(get("client_id"), Some("id"));
        assert_eq!(get("client_secret"), Some("secret"));
        assert_eq!(get("v"), Some("20170801"));
    }

    #[test]
    fn restaurant_detail_produces_correct_request() {
        let resource = api().restaurant_detail("49d51ce3f964a520675c1fe3").unwrap();
        let req = resource.request();
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req
            .url
            .starts_with("http://localhost:3000/v2/venues/49d51ce3f964a520675c1fe3?"));
        assert_eq!(req.header("accept"), Some("application/json"));
    }

    #[test]
    fn check_in_sends_json_body() {
        let resource = api().check_in("v1", Some("lunch")).unwrap();
        let req = resource.request();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/v2/checkins/add");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["venueId"], "v1");
        assert_eq!(body["shout"], "lunch");
        assert_eq!(body["client_id"], "id");
    }

    #[test]
    fn check_in_without_shout_omits_field() {
        let resource = api().check_in("v1", None).unwrap();
        let body: Value = serde_json::from_str(resource.request().body.as_deref().unwrap()).unwrap();
        assert!(body.get("shout").is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let api = NearbyApi::new(ApiConfig::new("http://localhost:3000/", "id", "secret"));
        let resource = api.restaurant_detail("abc").unwrap();
        assert!(resource
            .request()
            .url
            .starts_with("http://localhost:3000/v2/venues/abc?"));
    }

    #[test]
    fn restaurant_detail_keeps_id_in_one_segment() {
        for (id, segment) in [
            ("../search", "..%2Fsearch"),
            ("abc?limit=1", "abc%3Flimit%3D1"),
            ("x#y", "x%23y"),
            ("a/b?c#d", "a%2Fb%3Fc%23d"),
        ] {
            let resource = api().restaurant_detail(id).unwrap();
            let url = Url::parse(&resource.request().url).unwrap();
            assert_eq!(url.path(), format!("/v2/venues/{segment}"), "{id}");
            assert_eq!(url.fragment(), None, "{id}");
            assert!(url.query_pairs().all(|(k, _)| k != "limit"), "{id}");
            assert_eq!(url.path_segments().unwrap().count(), 3, "{id}");
        }
    }

    #[test]
    fn restaurant_detail_rejects_dot_ids() {
        let err = api().restaurant_detail("..").unwrap_err();
        assert!(matches!(err, RequestError::PathSegment(_)), "{err:?}");
    }

    #[test]
    fn parse_suggested_restaurants_success() {
        let response = HttpResponse::new(
            200,
            r#"{"meta":{"code":200},"response":{"venues":[
                {"id":"1","name":"Katz's","location":{"address":"205 E Houston St","formattedAddress":["205 E Houston St","New York, NY"]},"verified":true},
                {"id":"2","name":"Joe's","location":{}}
            ]}}"#,
        );
        let suggested = api()
            .suggested_restaurants(40.7, -74.0)
            .unwrap()
            .parse_response(&response, true)
            .unwrap();
        assert_eq!(suggested.list.len(), 2);
        assert_eq!(suggested.list[0].name, "Katz's");
        assert!(suggested.list[0].verified);
        assert_eq!(suggested.list[1].location.address, None);
        assert!(suggested.list[1].location.formatted_address.is_empty());
    }

    #[test]
    fn parse_restaurant_detail_success() {
        let response = HttpResponse::new(
            200,
            r#"{"meta":{"code":200},"response":{"venue":{
                "id":"1","name":"Katz's","location":{"address":"205 E Houston St"},
                "rating":9.1,"price":{"tier":2,"message":"Moderate"},
                "contact":{"formattedPhone":"(212) 254-2246"},"url":"https://katzsdelicatessen.com"
            }}}"#,
        );
        let detail = api()
            .restaurant_detail("1")
            .unwrap()
            .parse_response(&response, true)
            .unwrap();
        assert_eq!(detail.restaurant.rating, Some(9.1));
        assert_eq!(detail.restaurant.price.as_ref().map(|p| p.tier), Some(2));
        assert_eq!(
            detail.contact.and_then(|c| c.formatted_phone).as_deref(),
            Some("(212) 254-2246")
        );
        assert_eq!(detail.url.as_deref(), Some("https://katzsdelicatessen.com"));
    }

    #[test]
    fn parse_detail_with_missing_venue_is_parsing_error() {
        let response = HttpResponse::new(200, r#"{"meta":{"code":200},"response":{}}"#);
        let err = api()
            .restaurant_detail("1")
            .unwrap()
            .parse_response(&response, true)
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Parsing { .. }));
    }

    #[test]
    fn parse_detail_not_found_is_api_error() {
        let response = HttpResponse::new(
            400,
            r#"{"meta":{"code":400,"errorType":"param_error","errorDetail":"Value nope is invalid for venue id"},"response":{}}"#,
        );
        let err = api()
            .restaurant_detail("nope")
            .unwrap()
            .parse_response(&response, true)
            .unwrap_err();
        assert_eq!(err.message(), "Value nope is invalid for venue id");
    }
}
