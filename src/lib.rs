// landing_core: Rust/WASM controller for the Trillion Stream landing page.
// The core is synchronous and DOM-free; `browser` is the only module that touches web_sys.
// See DESIGN.md for the module map.

mod analytics;
mod app;
#[cfg(target_arch = "wasm32")]
mod browser;
mod error;
mod fluid;
mod form;
mod logging;
mod scheduler;
mod service;
mod styles;
mod suggestion;
#[cfg(test)]
mod testing;
mod types;
mod video_guard;
mod viewport;
mod visibility;

use wasm_bindgen::prelude::*;

pub use analytics::{AnalyticsEvent, AnalyticsSink, EventName, ScrollDepthTracker};
pub use app::{LandingApp, MediaSignal, NoticeSurface, PageBindings, PageEvent};
pub use error::LandingError;
pub use fluid::{calculate_fluid_size, Dimension, FluidRange, SizeSet};
pub use form::{EmailCaptureForm, EmailValidity, FormSurface};
pub use logging::init_logging;
pub use scheduler::{Debouncer, Scheduler, Throttle, TimerSlot, TimerTicket};
pub use service::{
    run_job, ReadinessGate, SubmissionJob, SubmissionOutcome, SubmissionResponse,
    SubmissionService,
};
pub use styles::{ResponsiveStyleApplier, Role, StyleTarget, StyleTargetRegistry};
pub use suggestion::{SuggestionField, SuggestionForm, SuggestionPayload, SuggestionSurface};
pub use types::*;
pub use video_guard::{GuardPolicy, MediaSurface, VideoGuardState, VideoPlaybackGuard};
pub use viewport::{classify, PageEnvironment, ScrollPosition, ViewportMetrics};
pub use visibility::{IntersectionSample, VisibilityController};

/// Initialize panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    init_logging(log::LevelFilter::Info);
}

/// Parse the JS-side configuration. An empty string means all defaults.
pub fn parse_config(config_json: &str) -> Result<LandingConfig, LandingError> {
    if config_json.trim().is_empty() {
        return Ok(LandingConfig::default());
    }
    serde_json::from_str(config_json).map_err(|e| LandingError::InvalidConfig(e.to_string()))
}

/// Page controller exposed to JavaScript.
/// Construction wires every listener; the methods are the manual hooks the page script keeps.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct LandingPage {
    runtime: browser::PageRuntime,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl LandingPage {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<LandingPage, JsValue> {
        let config = parse_config(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        init_logging(config.log_level_filter());

        let runtime = browser::start(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(LandingPage { runtime })
    }

    /// Re-run the full layout pass now.
    pub fn force_update(&self) {
        self.runtime.send(PageEvent::ForceUpdate);
    }

    /// Returns JSON with { width, height, device_class, is_landscape }.
    pub fn current_device(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.runtime.current_metrics())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Replace the hero video with the static fallback.
    pub fn show_fallback(&self, reason: &str) {
        self.runtime.send(PageEvent::ForceFallback(reason.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parsing() {
        let config = parse_config(r#"{"load_timeout_ms":3000,"log_level":"debug"}"#).unwrap();
        assert_eq!(config.load_timeout(), Millis::new(3000));
        assert_eq!(config.log_level_filter(), log::LevelFilter::Debug);

        assert_eq!(parse_config("  ").unwrap().load_timeout(), Millis::new(2000));
        assert!(matches!(
            parse_config("{\"load_timeout_ms\":\"soon\"}"),
            Err(LandingError::InvalidConfig(_))
        ));
    }
}
