// Viewport metrics reader and device classifier.
// A fresh ViewportMetrics snapshot is taken on every layout trigger and dropped after use.
// See DESIGN.md: Viewport Metrics Reader

use serde::{Deserialize, Serialize};

use crate::types::{DeviceClass, Millis};

/// Upper (inclusive) width bound of each device class, narrowest first.
/// Anything wider than the last entry is `XLarge`.
pub const BREAKPOINTS: [(DeviceClass, u32); 4] = [
    (DeviceClass::Mobile, 480),
    (DeviceClass::Tablet, 768),
    (DeviceClass::Desktop, 1024),
    (DeviceClass::Large, 1440),
];

/// Mobile-first ascending scan: the first bound the width fits under wins.
pub fn classify(width: u32) -> DeviceClass {
    BREAKPOINTS
        .iter()
        .find(|(_, bound)| width <= *bound)
        .map(|(class, _)| *class)
        .unwrap_or(DeviceClass::XLarge)
}

/// Immutable snapshot of the window size and what it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportMetrics {
    pub width: u32,
    pub height: u32,
    pub device_class: DeviceClass,
    pub is_landscape: bool,
}

impl ViewportMetrics {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        ViewportMetrics {
            width,
            height,
            device_class: classify(width),
            is_landscape: width > height,
        }
    }

    pub fn is_mobile(&self) -> bool {
        self.device_class.is_mobile()
    }

    /// Mobile held upright: the form stacks into a column.
    pub fn is_mobile_portrait(&self) -> bool {
        self.is_mobile() && !self.is_landscape
    }

    pub fn orientation(&self) -> &'static str {
        if self.is_landscape {
            "landscape"
        } else {
            "portrait"
        }
    }
}

/// Document scroll state, for parallax and scroll-depth tracking.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollPosition {
    pub scroll_y: f64,
    /// Full scrollable height of the document body.
    pub document_height: f64,
    pub viewport_height: f64,
}

impl ScrollPosition {
    /// Percentage of the scrollable range covered so far, rounded.
    /// A page that cannot scroll counts as fully read.
    pub fn percent(&self) -> u32 {
        let range = self.document_height - self.viewport_height;
        if range <= 0.0 {
            return 100;
        }
        let pct = (self.scroll_y / range * 100.0).round();
        pct.clamp(0.0, 100.0) as u32
    }
}

/// Read-only view of the hosting page: clock, identity and geometry.
pub trait PageEnvironment {
    fn now(&self) -> Millis;
    /// Wall-clock time as an ISO-8601 string for analytics payloads.
    fn iso_timestamp(&self) -> String;
    fn user_agent(&self) -> String;
    fn url(&self) -> String;
    /// Current inner window size in CSS pixels.
    fn window_size(&self) -> (u32, u32);
    fn scroll_position(&self) -> ScrollPosition;

    fn viewport_metrics(&self) -> ViewportMetrics {
        let (width, height) = self.window_size();
        ViewportMetrics::from_dimensions(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify(480), DeviceClass::Mobile);
        assert_eq!(classify(481), DeviceClass::Tablet);
        assert_eq!(classify(768), DeviceClass::Tablet);
        assert_eq!(classify(1024), DeviceClass::Desktop);
        assert_eq!(classify(1440), DeviceClass::Large);
        assert_eq!(classify(1441), DeviceClass::XLarge);
        assert_eq!(classify(0), DeviceClass::Mobile);
    }

    #[test]
    fn landscape_is_strictly_wider() {
        assert!(ViewportMetrics::from_dimensions(800, 600).is_landscape);
        assert!(!ViewportMetrics::from_dimensions(600, 600).is_landscape);
        assert!(ViewportMetrics::from_dimensions(375, 812).is_mobile_portrait());
        assert!(!ViewportMetrics::from_dimensions(480, 320).is_mobile_portrait());
    }

    #[test]
    fn scroll_percent() {
        let pos = ScrollPosition {
            scroll_y: 500.0,
            document_height: 2000.0,
            viewport_height: 1000.0,
        };
        assert_eq!(pos.percent(), 50);

        let short_page = ScrollPosition {
            scroll_y: 0.0,
            document_height: 600.0,
            viewport_height: 800.0,
        };
        assert_eq!(short_page.percent(), 100);
    }

    proptest! {
        /// Property: device class never decreases as the window widens.
        #[test]
        fn classification_is_monotonic(a in 0u32..4000, b in 0u32..4000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(lo) <= classify(hi));
        }
    }
}
