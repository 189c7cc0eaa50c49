//! Proximity exploration: nearby POIs and nearby memories, fetched concurrently and merged.
//!
//! The POI search is required: its failure fails the request. The memory query is
//! supplementary: its failure is logged and treated as "no memories".

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::geocoding::{GeocodingProvider, DEFAULT_SEARCH_RADIUS_METERS, MAX_SEARCH_RADIUS_METERS};
use crate::model::{Coordinate, ExplorationResult};
use crate::repository::GeoRepository;

/// Places shown in a summary.
pub const MAX_PLACES_SHOWN: usize = 5;
/// Memories shown in a summary.
pub const MAX_MEMORIES_SHOWN: usize = 3;
/// Memory content longer than this many characters is cut and suffixed with "...".
pub const MEMORY_PREVIEW_CHARS: usize = 50;

/// Arguments of the `explore_nearby` operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExploreRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in meters; defaults to 500.
    #[serde(default)]
    pub radius: Option<u32>,
}

impl ExploreRequest {
    /// Effective radius, validated against the provider's range.
    pub fn radius_meters(&self) -> Result<u32, PipelineError> {
        let radius = self.radius.unwrap_or(DEFAULT_SEARCH_RADIUS_METERS);
        if radius == 0 || radius > MAX_SEARCH_RADIUS_METERS {
            return Err(PipelineError::Validation(format!(
                "radius must be within 1..={} meters, got {}",
                MAX_SEARCH_RADIUS_METERS, radius
            )));
        }
        Ok(radius)
    }
}

/// Cuts `s` to `max_chars` characters, appending "..." when something was removed.
fn truncate_preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

fn or_default<'a>(s: &'a str, default: &'a str) -> &'a str {
    if s.trim().is_empty() {
        default
    } else {
        s
    }
}

/// Renders an exploration result as the human-readable summary returned to callers.
pub fn format_summary(result: &ExplorationResult) -> String {
    let mut text = String::from("🔍 Recommended places nearby:\n\n");

    if result.nearby_places.is_empty() {
        text.push_str("📍 No points of interest nearby\n");
    } else {
        text.push_str("📍 Nearby places:\n");
        for poi in &result.nearby_places {
            text.push_str(&format!(
                "  • {} - {}\n",
                or_default(&poi.name, "Unknown place"),
                or_default(&poi.address, "Address unknown")
            ));
        }
    }

    if result.nearby_memories.is_empty() {
        text.push_str("\n💭 You have no memories nearby yet. Check in to leave the first one!");
    } else {
        text.push_str(&format!("\n💭 {} memories nearby:\n", result.memories_found));
        for memory in &result.nearby_memories {
            text.push_str(&format!(
                "  • {} - {}\n",
                or_default(&memory.poi_name, "Unknown place"),
                truncate_preview(&memory.content, MEMORY_PREVIEW_CHARS)
            ));
        }
    }
    text
}

/// Fans out to the geocoder and the repository, then merges.
///
/// **Interaction**: Called by `GeoMemoryService::explore_nearby`.
pub struct ExplorePipeline {
    geocoder: Arc<dyn GeocodingProvider>,
    repository: Arc<dyn GeoRepository>,
}

impl ExplorePipeline {
    pub fn new(geocoder: Arc<dyn GeocodingProvider>, repository: Arc<dyn GeoRepository>) -> Self {
        Self {
            geocoder,
            repository,
        }
    }

    /// Runs both lookups concurrently and merges them into a capped result.
    ///
    /// Both futures belong to this call: dropping it abandons both lookups.
    pub async fn run(&self, request: &ExploreRequest) -> Result<ExplorationResult, PipelineError> {
        let coord = Coordinate::new(request.latitude, request.longitude)?;
        let radius = request.radius_meters()?;

        let (places, memories) = tokio::join!(
            self.geocoder.search_nearby(coord, radius),
            self.repository.query_nearby(coord, radius),
        );

        let places = places.map_err(PipelineError::Geocoding)?;
        let memories = memories.unwrap_or_else(|e| {
            warn!(error = %e, "nearby memory query failed; continuing without memories");
            Vec::new()
        });

        info!(
            radius,
            places = places.len(),
            memories = memories.len(),
            "exploration merged"
        );
        let places_found = places.len();
        let memories_found = memories.len();
        Ok(ExplorationResult {
            nearby_places: places.into_iter().take(MAX_PLACES_SHOWN).collect(),
            nearby_memories: memories.into_iter().take(MAX_MEMORIES_SHOWN).collect(),
            places_found,
            memories_found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PointOfInterest;

    #[test]
    fn truncate_preview_counts_characters() {
        assert_eq!(truncate_preview("short", 50), "short");
        let exact = "a".repeat(50);
        assert_eq!(truncate_preview(&exact, 50), exact);
        let long = "好".repeat(60);
        let cut = truncate_preview(&long, 50);
        assert_eq!(cut.chars().count(), 53);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn radius_defaults_and_bounds() {
        let mut req = ExploreRequest {
            latitude: 0.0,
            longitude: 0.0,
            radius: None,
        };
        assert_eq!(req.radius_meters().unwrap(), 500);
        req.radius = Some(0);
        assert!(matches!(req.radius_meters(), Err(PipelineError::Validation(_))));
        req.radius = Some(50_001);
        assert!(req.radius_meters().is_err());
        req.radius = Some(50_000);
        assert_eq!(req.radius_meters().unwrap(), 50_000);
    }

    /// **Scenario**: Empty sections render their placeholder lines.
    #[test]
    fn format_summary_empty_result() {
        let text = format_summary(&ExplorationResult::default());
        assert!(text.starts_with("🔍 Recommended places nearby:"));
        assert!(text.contains("📍 No points of interest nearby"));
        assert!(text.contains("You have no memories nearby yet"));
        assert!(!text.contains("  • "));
    }

    #[test]
    fn format_summary_substitutes_blank_poi_fields() {
        let result = ExplorationResult {
            nearby_places: vec![PointOfInterest::new("", "")],
            places_found: 1,
            ..Default::default()
        };
        let text = format_summary(&result);
        assert!(text.contains("  • Unknown place - Address unknown\n"), "{}", text);
    }
}
