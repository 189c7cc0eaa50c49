//! Memory text composition.
//!
//! The check-in pipeline asks a [`ContentComposer`] for the memory text, tags and mood. The
//! default [`TemplateComposer`] is a fixed template; a generative composer can be plugged in
//! behind the same trait.

use std::collections::BTreeSet;

use crate::model::PlaceInfo;

/// Text, tags and mood for a new memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedContent {
    pub content: String,
    pub tags: BTreeSet<String>,
    pub mood: String,
}

/// Turns a resolved place and the user's comment into memory content.
///
/// **Interaction**: Called by `CheckinPipeline` after reverse geocoding, before persisting.
pub trait ContentComposer: Send + Sync {
    fn compose(&self, place: &PlaceInfo, user_comment: Option<&str>) -> ComposedContent;
}

/// Deterministic template: `"A good time at {place}"`, plus `", {comment}"` when given.
///
/// `{place}` is the address, else the place name, else "somewhere". Tags and mood stay empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateComposer;

impl ContentComposer for TemplateComposer {
    fn compose(&self, place: &PlaceInfo, user_comment: Option<&str>) -> ComposedContent {
        let mut content = format!("A good time at {}", place.label().unwrap_or("somewhere"));
        if let Some(comment) = user_comment.map(str::trim).filter(|c| !c.is_empty()) {
            content.push_str(", ");
            content.push_str(comment);
        }
        ComposedContent {
            content,
            ..ComposedContent::default()
        }
    }
}
