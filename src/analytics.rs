// Analytics events. Fire-and-forget: sinks swallow their own failures.
// See DESIGN.md: Analytics

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::Millis;

/// Event names the controller emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    VideoError,
    PageLoaded,
    ScrollDepth,
    TimeOnPage,
    ApplicationError,
    EmailSubmitted,
    EmailSubmissionFailed,
    FormValidationFailed,
    SuggestionSubmitted,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::VideoError => "video_error",
            EventName::PageLoaded => "page_loaded",
            EventName::ScrollDepth => "scroll_depth",
            EventName::TimeOnPage => "time_on_page",
            EventName::ApplicationError => "application_error",
            EventName::EmailSubmitted => "email_submitted",
            EventName::EmailSubmissionFailed => "email_submission_failed",
            EventName::FormValidationFailed => "form_validation_failed",
            EventName::SuggestionSubmitted => "suggestion_submitted",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked event with its free-form properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub name: EventName,
    pub properties: Map<String, Value>,
}

impl AnalyticsEvent {
    pub fn new(name: EventName) -> Self {
        AnalyticsEvent {
            name,
            properties: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// External analytics collaborator.
pub trait AnalyticsSink {
    fn track(&self, event: &AnalyticsEvent);
}

/// Log and forward an event.
pub fn emit(sink: &dyn AnalyticsSink, event: AnalyticsEvent) {
    log::debug!("analytics event {} {:?}", event.name, event.properties);
    sink.track(&event);
}

/// Scroll percentages reported once each.
pub const SCROLL_MARKERS: [u32; 4] = [25, 50, 75, 100];

/// Remembers which scroll-depth markers were already reported.
#[derive(Debug, Clone, Default)]
pub struct ScrollDepthTracker {
    reached: BTreeSet<u32>,
}

impl ScrollDepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers newly crossed at `percent`, in ascending order.
    pub fn observe(&mut self, percent: u32) -> Vec<u32> {
        SCROLL_MARKERS
            .iter()
            .copied()
            .filter(|marker| percent >= *marker && self.reached.insert(*marker))
            .collect()
    }
}

/// Whole seconds between page load and `now`.
pub fn seconds_on_page(loaded_at: Millis, now: Millis) -> u64 {
    (now.saturating_sub(loaded_at).as_millis() + 500) / 1000
}

/// Privacy-safe 32-bit string hash (`h = h*31 + unit` over UTF-16 units, wrapping).
pub fn hash_email(email: &str) -> String {
    let hash = email
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32)
        });
    hash.to_string()
}
