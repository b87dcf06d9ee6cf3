// Strong typing over strings. Newtypes for durations, device classes and style values.
// See DESIGN.md: Types & Configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds on the page clock. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Millis(u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn new(ms: u64) -> Self {
        Millis(ms)
    }

    /// Clamp a float clock reading (e.g. `Date.now()`) into a non-negative value.
    pub fn from_f64(ms: f64) -> Self {
        if ms.is_finite() && ms > 0.0 {
            Millis(ms.round() as u64)
        } else {
            Millis(0)
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    pub fn saturating_add(self, other: Millis) -> Millis {
        Millis(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Millis) -> Millis {
        Millis(self.0.saturating_sub(other.0))
    }

    /// `self * factor`, used for linear backoff.
    pub fn times(self, factor: u32) -> Millis {
        Millis(self.0.saturating_mul(factor as u64))
    }
}

/// Discrete viewport bucket. Ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
    Large,
    XLarge,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
            DeviceClass::Large => "large",
            DeviceClass::XLarge => "xlarge",
        }
    }

    pub fn is_mobile(&self) -> bool {
        matches!(self, DeviceClass::Mobile)
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A computed style value: a pixel quantity or a raw CSS string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeValue {
    Px(f64),
    Raw(String),
}

impl SizeValue {
    pub fn raw(value: &str) -> Self {
        SizeValue::Raw(value.to_string())
    }

    /// Numeric value, if this is a pixel quantity.
    pub fn px(&self) -> Option<f64> {
        match self {
            SizeValue::Px(v) => Some(*v),
            SizeValue::Raw(_) => None,
        }
    }

    /// CSS text: numbers get a `px` suffix, strings pass through.
    pub fn to_css(&self) -> String {
        match self {
            SizeValue::Px(v) => px(*v),
            SizeValue::Raw(s) => s.clone(),
        }
    }
}

/// Format a pixel quantity the way CSS expects it (`48px`, `337.5px`).
pub fn px(value: f64) -> String {
    format!("{}px", value)
}

/// Controller configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingConfig {
    /// Window for the first media-ready signal before the fallback is shown.
    #[serde(default = "default_load_timeout")]
    pub load_timeout_ms: u64,
    #[serde(default = "default_resize_debounce")]
    pub resize_debounce_ms: u64,
    #[serde(default = "default_orientation_debounce")]
    pub orientation_debounce_ms: u64,
    /// Delay before re-laying out when the document becomes visible again.
    #[serde(default = "default_visibility_refresh")]
    pub visibility_refresh_ms: u64,
    /// Fraction of the media element that must be on screen to count as visible.
    #[serde(default = "default_intersection_threshold")]
    pub intersection_threshold: f64,
    #[serde(default = "default_max_reload_attempts")]
    pub max_reload_attempts: u32,
    /// Base delay of the linear reload backoff (`base * attempt`).
    #[serde(default = "default_reload_backoff")]
    pub reload_backoff_ms: u64,
    #[serde(default = "default_button_revert")]
    pub button_revert_ms: u64,
    #[serde(default = "default_submit_cooldown")]
    pub submit_cooldown_ms: u64,
    /// Lifetime of transient success messages and the error banner.
    #[serde(default = "default_notice")]
    pub notice_ms: u64,
    #[serde(default = "default_scroll_throttle")]
    pub scroll_throttle_ms: u64,
    #[serde(default = "default_scroll_depth_throttle")]
    pub scroll_depth_throttle_ms: u64,
    #[serde(default = "default_parallax_speed")]
    pub parallax_speed: f64,
    #[serde(default = "default_fallback_image")]
    pub fallback_image: String,
    #[serde(default = "default_fallback_alt")]
    pub fallback_alt: String,
    /// Window event announcing that the submission service is ready.
    #[serde(default = "default_readiness_event")]
    pub readiness_event: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LandingConfig {
    fn default() -> Self {
        LandingConfig {
            load_timeout_ms: default_load_timeout(),
            resize_debounce_ms: default_resize_debounce(),
            orientation_debounce_ms: default_orientation_debounce(),
            visibility_refresh_ms: default_visibility_refresh(),
            intersection_threshold: default_intersection_threshold(),
            max_reload_attempts: default_max_reload_attempts(),
            reload_backoff_ms: default_reload_backoff(),
            button_revert_ms: default_button_revert(),
            submit_cooldown_ms: default_submit_cooldown(),
            notice_ms: default_notice(),
            scroll_throttle_ms: default_scroll_throttle(),
            scroll_depth_throttle_ms: default_scroll_depth_throttle(),
            parallax_speed: default_parallax_speed(),
            fallback_image: default_fallback_image(),
            fallback_alt: default_fallback_alt(),
            readiness_event: default_readiness_event(),
            log_level: default_log_level(),
        }
    }
}

impl LandingConfig {
    pub fn load_timeout(&self) -> Millis {
        Millis::new(self.load_timeout_ms)
    }

    pub fn resize_debounce(&self) -> Millis {
        Millis::new(self.resize_debounce_ms)
    }

    pub fn orientation_debounce(&self) -> Millis {
        Millis::new(self.orientation_debounce_ms)
    }

    pub fn visibility_refresh(&self) -> Millis {
        Millis::new(self.visibility_refresh_ms)
    }

    pub fn reload_backoff(&self) -> Millis {
        Millis::new(self.reload_backoff_ms)
    }

    pub fn button_revert(&self) -> Millis {
        Millis::new(self.button_revert_ms)
    }

    pub fn submit_cooldown(&self) -> Millis {
        Millis::new(self.submit_cooldown_ms)
    }

    pub fn notice(&self) -> Millis {
        Millis::new(self.notice_ms)
    }

    /// Parsed log level; unknown names fall back to `Info`.
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

fn default_load_timeout() -> u64 {
    2000
}

fn default_resize_debounce() -> u64 {
    100
}

fn default_orientation_debounce() -> u64 {
    200
}

fn default_visibility_refresh() -> u64 {
    100
}

fn default_intersection_threshold() -> f64 {
    0.1
}

fn default_max_reload_attempts() -> u32 {
    3
}

fn default_reload_backoff() -> u64 {
    1000
}

fn default_button_revert() -> u64 {
    3000
}

fn default_submit_cooldown() -> u64 {
    2000
}

fn default_notice() -> u64 {
    5000
}

fn default_scroll_throttle() -> u64 {
    16 // one frame at 60Hz
}

fn default_scroll_depth_throttle() -> u64 {
    100
}

fn default_parallax_speed() -> f64 {
    0.5
}

fn default_fallback_image() -> String {
    "Fallback-image.jpg".to_string()
}

fn default_fallback_alt() -> String {
    "TrillionStream Gaming Experience".to_string()
}

fn default_readiness_event() -> String {
    "firebaseReady".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
