// Fluid size calculator: continuous interpolation between design bounds.
// Every fluid dimension is a fixed (min, max, minWidth, maxWidth) tuple.
// See DESIGN.md: Fluid Size Calculator

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{DeviceClass, SizeValue};
use crate::viewport::ViewportMetrics;

pub const DEFAULT_MIN_WIDTH: f64 = 320.0;
pub const DEFAULT_MAX_WIDTH: f64 = 1440.0;

/// Interpolate a size for `current_width`, clamped to the bounds outside
/// `[min_width, max_width]` and rounded to a whole pixel.
pub fn calculate_fluid_size(
    current_width: f64,
    min_size: f64,
    max_size: f64,
    min_width: f64,
    max_width: f64,
) -> f64 {
    if current_width <= min_width {
        return min_size;
    }
    if current_width >= max_width {
        return max_size;
    }

    let ratio = (current_width - min_width) / (max_width - min_width);
    round_half_up(min_size + (max_size - min_size) * ratio)
}

// Half-way cases round toward +inf, so negative sizes round like positive ones.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Design bounds for one fluid dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidRange {
    pub min_size: f64,
    pub max_size: f64,
    pub min_width: f64,
    pub max_width: f64,
}

impl FluidRange {
    pub const fn new(min_size: f64, max_size: f64) -> Self {
        FluidRange {
            min_size,
            max_size,
            min_width: DEFAULT_MIN_WIDTH,
            max_width: DEFAULT_MAX_WIDTH,
        }
    }

    pub const fn up_to(self, max_width: f64) -> Self {
        FluidRange { max_width, ..self }
    }

    pub fn at(&self, width: f64) -> f64 {
        calculate_fluid_size(
            width,
            self.min_size,
            self.max_size,
            self.min_width,
            self.max_width,
        )
    }
}

/// Named dimensions of the layout. Declaration order is the order they are mirrored
/// onto CSS custom properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Dimension {
    LogoHeight,
    LogoFontSize,
    LogoPadding,
    HeroTitleSize,
    HeroSubtitleSize,
    HeroWidth,
    HeroTopPosition,
    FormWidth,
    InputHeight,
    InputFontSize,
    InputPadding,
    BtnFontSize,
    BtnWidth,
    FormTopPosition,
    FormGap,
    MetricsContainerWidth,
    MetricsGap,
    MetricsPadding,
    MetricsHeight,
    MetricsTitleSize,
    MetricsTextSize,
    MetricsSmallSize,
    FooterTitleSize,
    FooterPadding,
    EmailFontSize,
    BaseSpacing,
    SectionPadding,
}

impl Dimension {
    /// camelCase key used by declarative styling.
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::LogoHeight => "logoHeight",
            Dimension::LogoFontSize => "logoFontSize",
            Dimension::LogoPadding => "logoPadding",
            Dimension::HeroTitleSize => "heroTitleSize",
            Dimension::HeroSubtitleSize => "heroSubtitleSize",
            Dimension::HeroWidth => "heroWidth",
            Dimension::HeroTopPosition => "heroTopPosition",
            Dimension::FormWidth => "formWidth",
            Dimension::InputHeight => "inputHeight",
            Dimension::InputFontSize => "inputFontSize",
            Dimension::InputPadding => "inputPadding",
            Dimension::BtnFontSize => "btnFontSize",
            Dimension::BtnWidth => "btnWidth",
            Dimension::FormTopPosition => "formTopPosition",
            Dimension::FormGap => "formGap",
            Dimension::MetricsContainerWidth => "metricsContainerWidth",
            Dimension::MetricsGap => "metricsGap",
            Dimension::MetricsPadding => "metricsPadding",
            Dimension::MetricsHeight => "metricsHeight",
            Dimension::MetricsTitleSize => "metricsTitleSize",
            Dimension::MetricsTextSize => "metricsTextSize",
            Dimension::MetricsSmallSize => "metricsSmallSize",
            Dimension::FooterTitleSize => "footerTitleSize",
            Dimension::FooterPadding => "footerPadding",
            Dimension::EmailFontSize => "emailFontSize",
            Dimension::BaseSpacing => "baseSpacing",
            Dimension::SectionPadding => "sectionPadding",
        }
    }
}

/// Fluid dimensions and their design bounds.
pub const FLUID_TABLE: [(Dimension, FluidRange); 21] = [
    (Dimension::LogoHeight, FluidRange::new(48.0, 64.0)),
    (Dimension::LogoFontSize, FluidRange::new(24.0, 40.0)),
    (Dimension::LogoPadding, FluidRange::new(8.0, 16.0)),
    (Dimension::HeroTitleSize, FluidRange::new(20.0, 35.0)),
    (Dimension::HeroSubtitleSize, FluidRange::new(14.0, 22.0)),
    (Dimension::InputHeight, FluidRange::new(48.0, 56.0)),
    (Dimension::InputFontSize, FluidRange::new(16.0, 22.0)),
    (Dimension::InputPadding, FluidRange::new(12.0, 24.0)),
    (Dimension::BtnFontSize, FluidRange::new(14.0, 18.0)),
    (Dimension::BtnWidth, FluidRange::new(120.0, 160.0)),
    (Dimension::MetricsGap, FluidRange::new(8.0, 24.0)),
    (Dimension::MetricsPadding, FluidRange::new(16.0, 32.0).up_to(1920.0)),
    (Dimension::MetricsHeight, FluidRange::new(300.0, 670.0)),
    (Dimension::MetricsTitleSize, FluidRange::new(28.0, 43.0)),
    (Dimension::MetricsTextSize, FluidRange::new(16.0, 32.0)),
    (Dimension::MetricsSmallSize, FluidRange::new(22.0, 36.0)),
    (Dimension::FooterTitleSize, FluidRange::new(32.0, 48.0)),
    (Dimension::FooterPadding, FluidRange::new(16.0, 32.0)),
    (Dimension::EmailFontSize, FluidRange::new(16.0, 19.0)),
    (Dimension::BaseSpacing, FluidRange::new(8.0, 32.0)),
    (Dimension::SectionPadding, FluidRange::new(16.0, 64.0)),
];

/// Every computed dimension for one viewport snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SizeSet {
    values: BTreeMap<Dimension, SizeValue>,
}

impl SizeSet {
    /// Derive the full set from a viewport snapshot.
    pub fn compute(metrics: &ViewportMetrics) -> Self {
        let width = metrics.width as f64;
        let mobile = metrics.device_class == DeviceClass::Mobile;
        let mut values = BTreeMap::new();

        for (dimension, range) in FLUID_TABLE.iter() {
            values.insert(*dimension, SizeValue::Px(range.at(width)));
        }

        let hero_cap = if mobile { width * 0.95 } else { 800.0 };
        values.insert(Dimension::HeroWidth, SizeValue::Px((width * 0.9).min(hero_cap)));
        values.insert(
            Dimension::HeroTopPosition,
            SizeValue::raw(match (mobile, metrics.is_landscape) {
                (true, true) => "25%",
                (true, false) => "30%",
                (false, _) => "36%",
            }),
        );

        let form_share = if mobile { 0.95 } else { 0.8 };
        values.insert(Dimension::FormWidth, SizeValue::Px((width * form_share).min(600.0)));
        values.insert(
            Dimension::FormTopPosition,
            SizeValue::raw(if mobile && !metrics.is_landscape { "70%" } else { "65%" }),
        );
        values.insert(
            Dimension::FormGap,
            SizeValue::raw(if metrics.is_mobile_portrait() { "12px" } else { "0" }),
        );

        values.insert(
            Dimension::MetricsContainerWidth,
            SizeValue::Px((width * 0.95).min(1400.0)),
        );

        SizeSet { values }
    }

    pub fn get(&self, dimension: Dimension) -> Option<&SizeValue> {
        self.values.get(&dimension)
    }

    /// Pixel value of a numeric dimension; zero if it is a raw string.
    pub fn px(&self, dimension: Dimension) -> f64 {
        self.get(dimension).and_then(SizeValue::px).unwrap_or(0.0)
    }

    /// CSS text of a dimension, empty if it was never computed.
    pub fn css(&self, dimension: Dimension) -> String {
        self.get(dimension).map(SizeValue::to_css).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Dimension, &SizeValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
