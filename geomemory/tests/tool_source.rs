//! GeoMemoryToolSource end to end over in-memory capabilities.
#![cfg(feature = "in-memory")]

use std::sync::Arc;

use geomemory::{
    GeoMemoryService, GeoMemoryToolSource, InMemoryBlobStore, InMemoryRepository, MockGeocoder,
    PipelineError, ToolSource, ToolSourceError, TOOL_EXPLORE_NEARBY, TOOL_PUBLISH_CHECKIN,
};
use serde_json::json;

const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8/5+hHgAHggJ/PchI7wAAAABJRU5ErkJggg==";

fn source_with(repo: Arc<InMemoryRepository>) -> GeoMemoryToolSource {
    let service = GeoMemoryService::new(
        Arc::new(MockGeocoder::bakery_example()),
        Arc::new(InMemoryBlobStore::new()),
        repo,
    );
    GeoMemoryToolSource::new(Arc::new(service))
}

#[tokio::test]
async fn tool_specs_declare_required_arguments() {
    let tools = source_with(Arc::new(InMemoryRepository::new()))
        .list_tools()
        .await
        .unwrap();
    let checkin = tools.iter().find(|t| t.name == TOOL_PUBLISH_CHECKIN).unwrap();
    assert!(checkin.description.is_some());
    let required = checkin.input_schema["required"].as_array().unwrap();
    assert!(required.contains(&json!("image_base64")));
    assert!(!required.contains(&json!("user_comment")));

    let explore = tools.iter().find(|t| t.name == TOOL_EXPLORE_NEARBY).unwrap();
    assert_eq!(explore.input_schema["properties"]["radius"]["type"], "integer");

    let wire = serde_json::to_value(checkin).unwrap();
    assert!(wire.get("inputSchema").is_some());
}

/// **Scenario**: A check-in made through the tool shows up in a later exploration.
///
/// Given: an empty repository
/// When: publish_checkin is called, then explore_nearby at the same spot
/// Then: the summary lists one memory with the composed content
#[tokio::test]
async fn checkin_then_explore_shows_new_memory() {
    let repo = Arc::new(InMemoryRepository::new());
    let source = source_with(repo.clone());

    let confirm = source
        .call_tool(
            TOOL_PUBLISH_CHECKIN,
            json!({
                "image_base64": PNG_1X1,
                "latitude": 30.263,
                "longitude": 120.122,
                "user_comment": "great coffee"
            }),
        )
        .await
        .unwrap();
    assert_eq!(confirm.text, "✅ Check-in published! Location: 123 Lake Rd");

    let summary = source
        .call_tool(
            TOOL_EXPLORE_NEARBY,
            json!({ "latitude": 30.263, "longitude": 120.122, "radius": 200 }),
        )
        .await
        .unwrap();
    assert!(summary.text.contains("1 memories nearby"), "{}", summary.text);
    assert!(
        summary
            .text
            .contains("  • Pleasant Bakery - A good time at 123 Lake Rd, great coffee"),
        "{}",
        summary.text
    );
    assert_eq!(repo.records().len(), 1);
}

#[tokio::test]
async fn wrong_argument_type_is_invalid_input() {
    let err = source_with(Arc::new(InMemoryRepository::new()))
        .call_tool(
            TOOL_EXPLORE_NEARBY,
            json!({ "latitude": "north", "longitude": 120.122 }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ToolSourceError::InvalidInput(_)), "{:?}", err);
}

#[tokio::test]
async fn persistence_failure_surfaces_through_tool() {
    let source = source_with(Arc::new(InMemoryRepository::new().failing_insert()));
    let err = source
        .call_tool(
            TOOL_PUBLISH_CHECKIN,
            json!({ "image_base64": PNG_1X1, "latitude": 30.263, "longitude": 120.122 }),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(err, ToolSourceError::Pipeline(PipelineError::Persistence { .. })),
        "{:?}",
        err
    );
}
