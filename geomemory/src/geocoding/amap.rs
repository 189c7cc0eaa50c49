//! AMap (Gaode) REST v3 client: `/v3/geocode/regeo` and `/v3/place/around`.
//!
//! AMap expects `location=lon,lat`; [`location_param`] is the only place that axis order
//! is decided. Absent string fields come back as empty arrays (`[]`) and are treated as absent.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{GeocodingProvider, MAX_SEARCH_RESULTS};
use crate::error::ClientError;
use crate::model::{Coordinate, PlaceInfo, PointOfInterest};

/// Production endpoint. Overridable for tests and proxies.
pub const DEFAULT_AMAP_BASE_URL: &str = "https://restapi.amap.com";

const REGEO_PATH: &str = "/v3/geocode/regeo";
const AROUND_PATH: &str = "/v3/place/around";
/// AMap's success value for the `status` field.
const STATUS_OK: &str = "1";

/// Formats a coordinate as AMap's `location` parameter: longitude first, 6 decimals each.
pub fn location_param(coord: Coordinate) -> String {
    format!("{:.6},{:.6}", coord.longitude, coord.latitude)
}

/// Geocoding client for the AMap web service API.
///
/// Holds a reqwest client (with its timeout), the API key and the base URL. Cheap to share
/// behind `Arc`; no per-request state.
pub struct AmapClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AmapClient {
    /// Creates a client against `base_url` whose requests time out after `timeout`.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Configuration(format!("http client: {}", e)))?;
        Ok(Self::with_client(client, api_key, base_url))
    }

    /// Creates a client with a custom reqwest client (proxies, custom timeouts).
    pub fn with_client(
        client: reqwest::Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn api_key(&self) -> Result<&str, ClientError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ClientError::Configuration(
                "AMAP_API_KEY is not set".to_string(),
            ));
        }
        Ok(key)
    }

    /// GETs `path` with `params` and returns the decoded JSON body.
    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "amap request");
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest("amap request failed", e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Provider(format!(
                "amap HTTP {}: {}",
                status,
                if text.is_empty() { "no body" } else { &text }
            )));
        }
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest("amap response read failed", e))?;
        serde_json::from_str(&text)
            .map_err(|e| ClientError::InvalidResponse(format!("amap response json: {}", e)))
    }
}

#[async_trait]
impl GeocodingProvider for AmapClient {
    async fn reverse_geocode(&self, coord: Coordinate) -> Result<PlaceInfo, ClientError> {
        let key = self.api_key()?;
        let location = location_param(coord);
        let body = self
            .get_json(
                REGEO_PATH,
                &[
                    ("key", key),
                    ("location", location.as_str()),
                    ("extensions", "all"),
                    ("output", "JSON"),
                ],
            )
            .await?;
        parse_regeocode(&body)
    }

    async fn search_nearby(
        &self,
        coord: Coordinate,
        radius_meters: u32,
    ) -> Result<Vec<PointOfInterest>, ClientError> {
        let key = self.api_key()?;
        let location = location_param(coord);
        let radius = radius_meters.to_string();
        let offset = MAX_SEARCH_RESULTS.to_string();
        let body = self
            .get_json(
                AROUND_PATH,
                &[
                    ("key", key),
                    ("location", location.as_str()),
                    ("radius", radius.as_str()),
                    ("output", "JSON"),
                    ("offset", offset.as_str()),
                    // Empty means all POI types.
                    ("types", ""),
                ],
            )
            .await?;
        parse_pois(&body)
    }
}

/// Returns the string value if it is a non-empty JSON string. AMap sends `[]` for blanks.
fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn check_status(body: &Value) -> Result<(), ClientError> {
    let ok = match body.get("status") {
        Some(Value::String(s)) => s == STATUS_OK,
        Some(Value::Number(n)) => n.as_u64() == Some(1),
        _ => false,
    };
    if ok {
        return Ok(());
    }
    let info = non_empty_str(body.get("info")).unwrap_or_else(|| "unknown error".to_string());
    let code = non_empty_str(body.get("infocode"));
    Err(ClientError::Provider(match code {
        Some(code) => format!("amap: {} (infocode {})", info, code),
        None => format!("amap: {}", info),
    }))
}

fn parse_regeocode(body: &Value) -> Result<PlaceInfo, ClientError> {
    check_status(body)?;
    let regeocode = body
        .get("regeocode")
        .ok_or_else(|| ClientError::InvalidResponse("amap: missing regeocode".to_string()))?;
    let address = non_empty_str(regeocode.get("formatted_address"));
    let admin_code = non_empty_str(
        regeocode
            .get("addressComponent")
            .and_then(|c| c.get("adcode")),
    );
    let first_poi_name = regeocode
        .get("pois")
        .and_then(Value::as_array)
        .and_then(|pois| pois.first())
        .and_then(|poi| non_empty_str(poi.get("name")));
    let name = first_poi_name.or_else(|| address.clone());
    Ok(PlaceInfo {
        name,
        address,
        admin_code,
    })
}

fn parse_pois(body: &Value) -> Result<Vec<PointOfInterest>, ClientError> {
    check_status(body)?;
    let pois = match body.get("pois") {
        Some(Value::Array(pois)) => pois,
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(other) => {
            return Err(ClientError::InvalidResponse(format!(
                "amap: pois is not an array: {}",
                other
            )))
        }
    };
    Ok(pois
        .iter()
        .filter_map(Value::as_object)
        .take(MAX_SEARCH_RESULTS)
        .map(|obj| PointOfInterest {
            name: non_empty_str(obj.get("name")).unwrap_or_default(),
            address: non_empty_str(obj.get("address")).unwrap_or_default(),
            raw_fields: obj.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: location puts longitude first with exactly six decimals.
    #[test]
    fn location_param_is_lon_lat_six_decimals() {
        let coord = Coordinate::new(30.263, 120.122).unwrap();
        assert_eq!(location_param(coord), "120.122000,30.263000");
        let coord = Coordinate::new(-33.8688, 151.2093).unwrap();
        assert_eq!(location_param(coord), "151.209300,-33.868800");
    }

    #[test]
    fn parse_regeocode_uses_first_poi_name() {
        let body = json!({
            "status": "1",
            "info": "OK",
            "regeocode": {
                "formatted_address": "123 Lake Rd",
                "addressComponent": { "adcode": "330106" },
                "pois": [{ "name": "Pleasant Bakery" }, { "name": "Lake Park" }]
            }
        });
        let place = parse_regeocode(&body).unwrap();
        assert_eq!(place.name.as_deref(), Some("Pleasant Bakery"));
        assert_eq!(place.address.as_deref(), Some("123 Lake Rd"));
        assert_eq!(place.admin_code.as_deref(), Some("330106"));
    }

    /// **Scenario**: With no POIs the name falls back to the formatted address.
    #[test]
    fn parse_regeocode_without_pois_falls_back_to_address() {
        let body = json!({
            "status": "1",
            "regeocode": {
                "formatted_address": "123 Lake Rd",
                "addressComponent": { "adcode": [] },
                "pois": []
            }
        });
        let place = parse_regeocode(&body).unwrap();
        assert_eq!(place.name.as_deref(), Some("123 Lake Rd"));
        assert_eq!(place.admin_code, None);
    }

    #[test]
    fn parse_regeocode_treats_empty_array_address_as_absent() {
        let body = json!({ "status": "1", "regeocode": { "formatted_address": [] } });
        assert_eq!(parse_regeocode(&body).unwrap(), PlaceInfo::default());
    }

    /// **Scenario**: A failure status becomes a Provider error carrying `info`.
    #[test]
    fn parse_regeocode_failure_status_is_provider_error() {
        let body = json!({ "status": "0", "info": "INVALID_USER_KEY", "infocode": "10001" });
        let err = parse_regeocode(&body).unwrap_err();
        match err {
            ClientError::Provider(msg) => {
                assert!(msg.contains("INVALID_USER_KEY"), "{}", msg);
                assert!(msg.contains("10001"), "{}", msg);
            }
            other => panic!("expected Provider, got {:?}", other),
        }
    }

    #[test]
    fn parse_pois_keeps_order_and_raw_fields() {
        let body = json!({
            "status": "1",
            "pois": [
                { "id": "B1", "name": "Cafe", "address": "1 Main St", "distance": "12" },
                { "id": "B2", "name": "Bookshop", "address": [] }
            ]
        });
        let pois = parse_pois(&body).unwrap();
        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].name, "Cafe");
        assert_eq!(pois[0].raw_fields.get("id"), Some(&json!("B1")));
        assert_eq!(pois[1].name, "Bookshop");
        assert_eq!(pois[1].address, "");
    }

    #[test]
    fn parse_pois_failure_status_is_provider_error() {
        let body = json!({ "status": "0", "info": "DAILY_QUERY_OVER_LIMIT" });
        let err = parse_pois(&body).unwrap_err();
        assert!(matches!(err, ClientError::Provider(ref m) if m.contains("DAILY_QUERY_OVER_LIMIT")));
    }

    /// **Scenario**: An empty API key is a configuration error, raised without any request.
    #[tokio::test]
    async fn missing_api_key_is_configuration_error() {
        // Port 9 is discard; a request would fail as Transport, not Configuration.
        let client = AmapClient::new("  ", "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let coord = Coordinate::new(30.0, 120.0).unwrap();
        let err = client.reverse_geocode(coord).await.unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)), "{:?}", err);
        let err = client.search_nearby(coord, 500).await.unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)), "{:?}", err);
    }
}
