//! Tool source exposing the service operations: `publish_checkin`, `explore_nearby`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};
use crate::checkin::CheckinRequest;
use crate::explore::ExploreRequest;
use crate::geocoding::{DEFAULT_SEARCH_RADIUS_METERS, MAX_SEARCH_RADIUS_METERS};
use crate::service::GeoMemoryService;

/// Tool name: decode, store, geocode and persist a check-in.
pub const TOOL_PUBLISH_CHECKIN: &str = "publish_checkin";
/// Tool name: nearby POIs plus nearby memories.
pub const TOOL_EXPLORE_NEARBY: &str = "explore_nearby";

fn publish_checkin_spec() -> ToolSpec {
    ToolSpec {
        name: TOOL_PUBLISH_CHECKIN.to_string(),
        description: Some(
            "Publish a check-in at the user's location: store the photo, resolve the place \
             and save it as a memory."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "image_base64": { "type": "string", "description": "Photo, Base64-encoded" },
                "latitude": { "type": "number", "minimum": -90, "maximum": 90 },
                "longitude": { "type": "number", "minimum": -180, "maximum": 180 },
                "user_comment": { "type": "string", "description": "Optional comment" }
            },
            "required": ["image_base64", "latitude", "longitude"]
        }),
    }
}

fn explore_nearby_spec() -> ToolSpec {
    ToolSpec {
        name: TOOL_EXPLORE_NEARBY.to_string(),
        description: Some(
            "Discover points of interest and memories left by users around a location."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "latitude": { "type": "number", "minimum": -90, "maximum": 90 },
                "longitude": { "type": "number", "minimum": -180, "maximum": 180 },
                "radius": {
                    "type": "integer",
                    "description": "Search radius in meters",
                    "minimum": 1,
                    "maximum": MAX_SEARCH_RADIUS_METERS,
                    "default": DEFAULT_SEARCH_RADIUS_METERS
                }
            },
            "required": ["latitude", "longitude"]
        }),
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolSourceError> {
    // Tools without arguments may be called with null.
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments)
        .map_err(|e| ToolSourceError::InvalidInput(format!("{}: {}", tool, e)))
}

/// Tool source backed by a [`GeoMemoryService`].
pub struct GeoMemoryToolSource {
    service: Arc<GeoMemoryService>,
}

impl GeoMemoryToolSource {
    pub fn new(service: Arc<GeoMemoryService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolSource for GeoMemoryToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(vec![publish_checkin_spec(), explore_nearby_spec()])
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallContent, ToolSourceError> {
        let text = match name {
            TOOL_PUBLISH_CHECKIN => {
                let request: CheckinRequest = parse_args(name, arguments)?;
                self.service.publish_checkin(&request).await?
            }
            TOOL_EXPLORE_NEARBY => {
                let request: ExploreRequest = parse_args(name, arguments)?;
                self.service.explore_nearby(&request).await?
            }
            _ => return Err(ToolSourceError::NotFound(name.to_string())),
        };
        Ok(ToolCallContent { text })
    }
}
