//! AmapClient against a local fake of the AMap REST endpoints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use geomemory::{AmapClient, ClientError, Coordinate, GeocodingProvider};
use serde_json::{json, Value};

type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

#[derive(Clone)]
struct Fake {
    captured: Captured,
    regeo: Value,
    around: Value,
    delay: Duration,
}

async fn handle(state: &Fake, params: HashMap<String, String>, body: &Value) -> Json<Value> {
    state.captured.lock().unwrap().push(params);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    Json(body.clone())
}

async fn regeo(State(state): State<Fake>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let body = state.regeo.clone();
    handle(&state, params, &body).await
}

async fn around(State(state): State<Fake>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let body = state.around.clone();
    handle(&state, params, &body).await
}

/// Starts the fake on an ephemeral port; returns its base URL and the captured query strings.
async fn spawn_fake(regeo_body: Value, around_body: Value, delay: Duration) -> (String, Captured) {
    let captured: Captured = Arc::default();
    let state = Fake {
        captured: captured.clone(),
        regeo: regeo_body,
        around: around_body,
        delay,
    };
    let app = Router::new()
        .route("/v3/geocode/regeo", get(regeo))
        .route("/v3/place/around", get(around))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), captured)
}

fn regeo_ok() -> Value {
    json!({
        "status": "1",
        "info": "OK",
        "infocode": "10000",
        "regeocode": {
            "formatted_address": "123 Lake Rd, Xihu District",
            "addressComponent": { "adcode": "330106", "city": [] },
            "pois": [
                { "name": "Pleasant Bakery", "address": "123 Lake Rd" },
                { "name": "Lake View Tea House", "address": "125 Lake Rd" }
            ]
        }
    })
}

fn around_ok(n: usize) -> Value {
    let pois: Vec<Value> = (1..=n)
        .map(|i| json!({ "id": format!("B{}", i), "name": format!("Place {}", i), "address": [], "distance": "42" }))
        .collect();
    json!({ "status": "1", "info": "OK", "count": n.to_string(), "pois": pois })
}

fn here() -> Coordinate {
    Coordinate::new(30.263, 120.122).unwrap()
}

fn client(base_url: &str, timeout: Duration) -> AmapClient {
    AmapClient::new("test-key", base_url, timeout).unwrap()
}

/// **Scenario**: Reverse geocoding sends lon,lat and parses name, address and adcode.
///
/// Given: a fake regeo endpoint returning a bakery as first POI
/// When: reverse_geocode(30.263, 120.122) is called
/// Then: location="120.122000,30.263000", extensions=all, and the place is the bakery
#[tokio::test]
async fn reverse_geocode_sends_longitude_first() {
    let (url, captured) = spawn_fake(regeo_ok(), around_ok(0), Duration::ZERO).await;
    let place = client(&url, Duration::from_secs(5))
        .reverse_geocode(here())
        .await
        .unwrap();

    assert_eq!(place.name.as_deref(), Some("Pleasant Bakery"));
    assert_eq!(place.address.as_deref(), Some("123 Lake Rd, Xihu District"));
    assert_eq!(place.admin_code.as_deref(), Some("330106"));

    let params = captured.lock().unwrap()[0].clone();
    assert_eq!(params["location"], "120.122000,30.263000");
    assert_eq!(params["key"], "test-key");
    assert_eq!(params["extensions"], "all");
    assert_eq!(params["output"], "JSON");
}

#[tokio::test]
async fn reverse_geocode_is_idempotent() {
    let (url, captured) = spawn_fake(regeo_ok(), around_ok(0), Duration::ZERO).await;
    let c = client(&url, Duration::from_secs(5));
    let first = c.reverse_geocode(here()).await.unwrap();
    let second = c.reverse_geocode(here()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(captured.lock().unwrap().len(), 2);
}

/// **Scenario**: Nearby search passes radius, offset and empty types; caps at 20 POIs.
#[tokio::test]
async fn search_nearby_sends_radius_and_caps_results() {
    let (url, captured) = spawn_fake(regeo_ok(), around_ok(25), Duration::ZERO).await;
    let pois = client(&url, Duration::from_secs(5))
        .search_nearby(here(), 800)
        .await
        .unwrap();

    assert_eq!(pois.len(), 20);
    assert_eq!(pois[0].name, "Place 1");
    assert_eq!(pois[0].address, "");
    assert_eq!(pois[0].raw_fields["id"], "B1");

    let params = captured.lock().unwrap()[0].clone();
    assert_eq!(params["location"], "120.122000,30.263000");
    assert_eq!(params["radius"], "800");
    assert_eq!(params["offset"], "20");
    assert_eq!(params["types"], "");
}

#[tokio::test]
async fn failure_status_is_a_provider_error() {
    let denied = json!({ "status": "0", "info": "INVALID_USER_KEY", "infocode": "10001" });
    let (url, _) = spawn_fake(denied.clone(), denied, Duration::ZERO).await;
    let c = client(&url, Duration::from_secs(5));

    let err = c.reverse_geocode(here()).await.unwrap_err();
    match err {
        ClientError::Provider(msg) => {
            assert!(msg.contains("INVALID_USER_KEY"), "{}", msg);
            assert!(msg.contains("10001"), "{}", msg);
        }
        other => panic!("expected Provider, got {:?}", other),
    }
    assert!(matches!(
        c.search_nearby(here(), 500).await.unwrap_err(),
        ClientError::Provider(_)
    ));
}

/// **Scenario**: A provider slower than the client timeout yields Timeout.
#[tokio::test]
async fn slow_provider_times_out() {
    let (url, _) = spawn_fake(regeo_ok(), around_ok(1), Duration::from_secs(3)).await;
    let err = client(&url, Duration::from_millis(200))
        .reverse_geocode(here())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)), "{:?}", err);
}

#[tokio::test]
async fn blank_key_fails_without_network() {
    let (url, captured) = spawn_fake(regeo_ok(), around_ok(1), Duration::ZERO).await;
    let c = AmapClient::new("  ", url, Duration::from_secs(5)).unwrap();
    let err = c.search_nearby(here(), 500).await.unwrap_err();
    assert!(matches!(err, ClientError::Configuration(_)));
    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client(&format!("http://{}", addr), Duration::from_secs(5))
        .reverse_geocode(here())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "{:?}", err);
}
