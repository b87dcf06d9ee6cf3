// Responsive style applier.
// Turns a SizeSet + device class into style writes against a fixed registry of roles.
// Roles missing from the document are skipped; nothing here ever fails.
// See DESIGN.md: Responsive Style Applier

use std::collections::HashMap;

use crate::fluid::{Dimension, SizeSet};
use crate::types::{px, DeviceClass};
use crate::viewport::ViewportMetrics;

/// Write-only handle on one styled element.
pub trait StyleTarget {
    /// Set a CSS property (kebab-case, custom properties included).
    fn set_style(&self, property: &str, value: &str);
}

/// Logical element roles the applier controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Document element; carries the custom-property namespace.
    Root,
    LogoBar,
    LogoText,
    VideoSection,
    Video,
    HeroBlock,
    HeroTitle,
    HeroSubtitle,
    FormRow,
    EmailInput,
    SubmitButton,
    MetricsSection,
    MetricsRow,
    MetricCard,
    MetricTitle,
    MetricListItem,
    MetricSmallItem,
    Footer,
    FooterTitle,
    EmailContact,
}

impl Role {
    pub const ALL: [Role; 20] = [
        Role::Root,
        Role::LogoBar,
        Role::LogoText,
        Role::VideoSection,
        Role::Video,
        Role::HeroBlock,
        Role::HeroTitle,
        Role::HeroSubtitle,
        Role::FormRow,
        Role::EmailInput,
        Role::SubmitButton,
        Role::MetricsSection,
        Role::MetricsRow,
        Role::MetricCard,
        Role::MetricTitle,
        Role::MetricListItem,
        Role::MetricSmallItem,
        Role::Footer,
        Role::FooterTitle,
        Role::EmailContact,
    ];

    /// CSS selector used to resolve the role at startup.
    pub fn selector(&self) -> &'static str {
        match self {
            Role::Root => ":root",
            Role::LogoBar => ".textlogodiv",
            Role::LogoText => "#textlogo",
            Role::VideoSection => "#proofvideosection",
            Role::Video => "#video1",
            Role::HeroBlock => "#accessbenefitdiv",
            Role::HeroTitle => "#accessbenefitinfo",
            Role::HeroSubtitle => "#accessbenefitsubinfo",
            Role::FormRow => "#requestaccessdiv",
            Role::EmailInput => "#requestaccessemail",
            Role::SubmitButton => "#getaccessbtn",
            Role::MetricsSection => "#punchymetricssection",
            Role::MetricsRow => "#punchymetrics",
            Role::MetricCard => "#pm1, #pm2, #pm3",
            Role::MetricTitle => "#pm1head1, #pm2head1, #pm3head1",
            Role::MetricListItem => ".pm1li, .pm2li",
            Role::MetricSmallItem => ".pm3li",
            Role::Footer => "#footer",
            Role::FooterTitle => "#footertitle",
            Role::EmailContact => ".emaildiv",
        }
    }
}

/// Live elements per role, resolved once at startup.
#[derive(Default)]
pub struct StyleTargetRegistry {
    targets: HashMap<Role, Vec<Box<dyn StyleTarget>>>,
}

impl StyleTargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every role through `resolve`; empty results are simply not registered.
    pub fn lookup<F>(mut resolve: F) -> Self
    where
        F: FnMut(Role) -> Vec<Box<dyn StyleTarget>>,
    {
        let mut registry = Self::new();
        for role in Role::ALL {
            let elements = resolve(role);
            if !elements.is_empty() {
                registry.targets.insert(role, elements);
            }
        }
        registry
    }

    pub fn register(&mut self, role: Role, target: Box<dyn StyleTarget>) {
        self.targets.entry(role).or_default().push(target);
    }

    pub fn has(&self, role: Role) -> bool {
        self.targets.contains_key(&role)
    }

    /// Write to every element of `role`. Returns how many elements were touched.
    pub fn write(&self, role: Role, property: &str, value: &str) -> usize {
        match self.targets.get(&role) {
            Some(elements) => {
                for element in elements {
                    element.set_style(property, value);
                }
                elements.len()
            }
            None => 0,
        }
    }
}

/// One planned style mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleWrite {
    pub role: Role,
    pub property: String,
    pub value: String,
}

impl StyleWrite {
    fn new(role: Role, property: &str, value: impl Into<String>) -> Self {
        StyleWrite {
            role,
            property: property.to_string(),
            value: value.into(),
        }
    }
}

/// `logoHeight` → `--logo-height`.
pub fn css_custom_property(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 4);
    name.push_str("--");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push('-');
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}

/// Every per-element write for one layout pass, in application order.
pub fn layout_plan(sizes: &SizeSet, metrics: &ViewportMetrics) -> Vec<StyleWrite> {
    let mut plan = Vec::with_capacity(96);
    logo_writes(&mut plan, sizes, metrics);
    video_writes(&mut plan, metrics);
    hero_writes(&mut plan, sizes, metrics);
    form_writes(&mut plan, sizes, metrics);
    metrics_writes(&mut plan, sizes, metrics);
    footer_writes(&mut plan, sizes, metrics);
    plan
}

fn logo_writes(plan: &mut Vec<StyleWrite>, sizes: &SizeSet, metrics: &ViewportMetrics) {
    let padding = sizes.px(Dimension::LogoPadding);
    plan.push(StyleWrite::new(Role::LogoBar, "height", sizes.css(Dimension::LogoHeight)));
    plan.push(StyleWrite::new(
        Role::LogoBar,
        "padding",
        format!("{} {}", px(padding), px(padding * 1.5)),
    ));

    if metrics.is_mobile() {
        plan.push(StyleWrite::new(Role::LogoBar, "width", "100%"));
        plan.push(StyleWrite::new(Role::LogoBar, "text-align", "center"));
        plan.push(StyleWrite::new(Role::LogoBar, "left", "0"));
        plan.push(StyleWrite::new(Role::LogoBar, "background-color", "rgba(0, 0, 0, 0.9)"));
    } else {
        plan.push(StyleWrite::new(Role::LogoBar, "width", "auto"));
        plan.push(StyleWrite::new(Role::LogoBar, "text-align", "left"));
        plan.push(StyleWrite::new(Role::LogoBar, "background-color", "transparent"));
    }

    plan.push(StyleWrite::new(Role::LogoText, "font-size", sizes.css(Dimension::LogoFontSize)));
}

fn video_writes(plan: &mut Vec<StyleWrite>, metrics: &ViewportMetrics) {
    let (height, min_height) = if metrics.is_mobile() {
        ("70vh", "400px")
    } else {
        ("100vh", "500px")
    };
    plan.push(StyleWrite::new(Role::VideoSection, "height", height));
    plan.push(StyleWrite::new(Role::VideoSection, "min-height", min_height));
}

fn hero_writes(plan: &mut Vec<StyleWrite>, sizes: &SizeSet, metrics: &ViewportMetrics) {
    let spacing = sizes.px(Dimension::BaseSpacing);

    plan.push(StyleWrite::new(Role::HeroBlock, "width", sizes.css(Dimension::HeroWidth)));
    plan.push(StyleWrite::new(Role::HeroBlock, "top", sizes.css(Dimension::HeroTopPosition)));
    plan.push(StyleWrite::new(Role::HeroBlock, "padding", px(spacing)));
    if metrics.is_mobile() {
        plan.push(StyleWrite::new(Role::HeroBlock, "left", "50%"));
        plan.push(StyleWrite::new(Role::HeroBlock, "transform", "translateX(-50%)"));
    }

    plan.push(StyleWrite::new(Role::HeroTitle, "font-size", sizes.css(Dimension::HeroTitleSize)));
    plan.push(StyleWrite::new(Role::HeroTitle, "line-height", "1.3"));
    plan.push(StyleWrite::new(Role::HeroTitle, "margin-bottom", px(spacing * 0.8)));

    plan.push(StyleWrite::new(
        Role::HeroSubtitle,
        "font-size",
        sizes.css(Dimension::HeroSubtitleSize),
    ));
    plan.push(StyleWrite::new(Role::HeroSubtitle, "line-height", "1.4"));
    plan.push(StyleWrite::new(Role::HeroSubtitle, "margin-top", px(spacing)));
}

fn form_writes(plan: &mut Vec<StyleWrite>, sizes: &SizeSet, metrics: &ViewportMetrics) {
    let stacked = metrics.is_mobile_portrait();
    let form_width = sizes.px(Dimension::FormWidth);
    let btn_width = sizes.px(Dimension::BtnWidth);
    let input_padding = sizes.px(Dimension::InputPadding);

    plan.push(StyleWrite::new(Role::FormRow, "width", px(form_width)));
    plan.push(StyleWrite::new(Role::FormRow, "top", sizes.css(Dimension::FormTopPosition)));
    plan.push(StyleWrite::new(Role::FormRow, "gap", sizes.css(Dimension::FormGap)));
    plan.push(StyleWrite::new(
        Role::FormRow,
        "flex-direction",
        if stacked { "column" } else { "row" },
    ));

    plan.push(StyleWrite::new(Role::EmailInput, "height", sizes.css(Dimension::InputHeight)));
    plan.push(StyleWrite::new(Role::EmailInput, "font-size", sizes.css(Dimension::InputFontSize)));
    plan.push(StyleWrite::new(Role::EmailInput, "padding", px(input_padding)));
    if stacked {
        plan.push(StyleWrite::new(Role::EmailInput, "width", "100%"));
        plan.push(StyleWrite::new(Role::EmailInput, "border-radius", "0.5rem"));
    } else {
        plan.push(StyleWrite::new(Role::EmailInput, "width", px(form_width - btn_width)));
        plan.push(StyleWrite::new(Role::EmailInput, "border-radius", "0.5rem 0 0 0.5rem"));
    }

    plan.push(StyleWrite::new(Role::SubmitButton, "height", sizes.css(Dimension::InputHeight)));
    plan.push(StyleWrite::new(Role::SubmitButton, "font-size", sizes.css(Dimension::BtnFontSize)));
    plan.push(StyleWrite::new(
        Role::SubmitButton,
        "padding",
        format!("{} {}", px(input_padding * 0.5), px(input_padding)),
    ));
    if stacked {
        plan.push(StyleWrite::new(Role::SubmitButton, "width", "100%"));
        plan.push(StyleWrite::new(Role::SubmitButton, "border-radius", "0.5rem"));
    } else {
        plan.push(StyleWrite::new(Role::SubmitButton, "width", px(btn_width)));
        plan.push(StyleWrite::new(Role::SubmitButton, "border-radius", "0 0.5rem 0.5rem 0"));
    }
}

fn metrics_writes(plan: &mut Vec<StyleWrite>, sizes: &SizeSet, metrics: &ViewportMetrics) {
    let mobile = metrics.is_mobile();
    let gap = sizes.px(Dimension::MetricsGap);
    let spacing = sizes.px(Dimension::BaseSpacing);

    plan.push(StyleWrite::new(
        Role::MetricsSection,
        "padding",
        format!("{} 0", sizes.css(Dimension::SectionPadding)),
    ));
    plan.push(StyleWrite::new(Role::MetricsSection, "height", "auto"));
    plan.push(StyleWrite::new(Role::MetricsSection, "min-height", "500px"));

    plan.push(StyleWrite::new(
        Role::MetricsRow,
        "max-width",
        sizes.css(Dimension::MetricsContainerWidth),
    ));
    plan.push(StyleWrite::new(Role::MetricsRow, "margin", "0 auto"));
    plan.push(StyleWrite::new(Role::MetricsRow, "padding", format!("0 {}", px(gap))));
    plan.push(StyleWrite::new(Role::MetricsRow, "gap", px(gap)));
    plan.push(StyleWrite::new(
        Role::MetricsRow,
        "flex-direction",
        if mobile { "column" } else { "row" },
    ));

    plan.push(StyleWrite::new(Role::MetricCard, "padding", sizes.css(Dimension::MetricsPadding)));
    plan.push(StyleWrite::new(Role::MetricCard, "min-height", sizes.css(Dimension::MetricsHeight)));
    plan.push(StyleWrite::new(Role::MetricCard, "height", "auto"));
    plan.push(StyleWrite::new(Role::MetricCard, "width", if mobile { "100%" } else { "30%" }));
    plan.push(StyleWrite::new(Role::MetricCard, "flex", if mobile { "none" } else { "1" }));

    plan.push(StyleWrite::new(
        Role::MetricTitle,
        "font-size",
        sizes.css(Dimension::MetricsTitleSize),
    ));
    plan.push(StyleWrite::new(Role::MetricTitle, "line-height", "1.3"));
    plan.push(StyleWrite::new(Role::MetricTitle, "margin-bottom", px(spacing)));

    for (role, size) in [
        (Role::MetricListItem, Dimension::MetricsTextSize),
        (Role::MetricSmallItem, Dimension::MetricsSmallSize),
    ] {
        plan.push(StyleWrite::new(role, "font-size", sizes.css(size)));
        plan.push(StyleWrite::new(role, "line-height", "1.4"));
        plan.push(StyleWrite::new(role, "margin-top", px(spacing * 0.75)));
    }
}

fn footer_writes(plan: &mut Vec<StyleWrite>, sizes: &SizeSet, metrics: &ViewportMetrics) {
    let padding = sizes.px(Dimension::FooterPadding);
    let mobile = metrics.is_mobile();

    plan.push(StyleWrite::new(
        Role::Footer,
        "padding",
        format!("{} {}", px(padding), px(padding * 0.5)),
    ));
    plan.push(StyleWrite::new(Role::Footer, "height", "auto"));
    plan.push(StyleWrite::new(Role::Footer, "text-align", if mobile { "center" } else { "left" }));
    plan.push(StyleWrite::new(Role::Footer, "margin-left", if mobile { "0" } else { "1.2rem" }));

    plan.push(StyleWrite::new(
        Role::FooterTitle,
        "font-size",
        sizes.css(Dimension::FooterTitleSize),
    ));

    plan.push(StyleWrite::new(
        Role::EmailContact,
        "font-size",
        sizes.css(Dimension::EmailFontSize),
    ));
    if mobile {
        plan.push(StyleWrite::new(
            Role::EmailContact,
            "margin",
            format!("{} 0", sizes.css(Dimension::BaseSpacing)),
        ));
        plan.push(StyleWrite::new(Role::EmailContact, "text-align", "center"));
    } else {
        plan.push(StyleWrite::new(Role::EmailContact, "margin", "0.2rem 0 0 1.2rem"));
        plan.push(StyleWrite::new(Role::EmailContact, "text-align", "left"));
    }
}

/// Custom properties mirrored on the root: every size plus device flags.
pub fn custom_properties(sizes: &SizeSet, metrics: &ViewportMetrics) -> Vec<(String, String)> {
    let mut props: Vec<(String, String)> = sizes
        .iter()
        .map(|(dimension, value)| (css_custom_property(dimension.key()), value.to_css()))
        .collect();

    let device = metrics.device_class;
    let flag = |on: bool| String::from(if on { "1" } else { "0" });
    props.push(("--device".to_string(), device.as_str().to_string()));
    props.push(("--is-mobile".to_string(), flag(device.is_mobile())));
    props.push(("--is-tablet".to_string(), flag(device == DeviceClass::Tablet)));
    props.push(("--is-desktop".to_string(), flag(device == DeviceClass::Desktop)));
    props
}

/// Viewport unit helpers that stay correct under mobile browser chrome.
pub fn viewport_units(metrics: &ViewportMetrics) -> Vec<(String, String)> {
    let width = metrics.width as f64;
    let height = metrics.height as f64;
    vec![
        ("--vh".to_string(), px(height * 0.01)),
        ("--vw".to_string(), px(width * 0.01)),
        ("--screen-width".to_string(), px(width)),
        ("--screen-height".to_string(), px(height)),
    ]
}

/// Scroll-linked writes: video parallax and the logo bar's frosted state.
pub fn scroll_plan(scroll_y: f64, parallax_speed: f64) -> Vec<StyleWrite> {
    let mut plan = vec![StyleWrite::new(
        Role::Video,
        "transform",
        format!("translateY({})", px(scroll_y * parallax_speed)),
    )];
    if scroll_y > 100.0 {
        plan.push(StyleWrite::new(Role::LogoBar, "backdrop-filter", "blur(10px)"));
    } else {
        plan.push(StyleWrite::new(Role::LogoBar, "background-color", "transparent"));
        plan.push(StyleWrite::new(Role::LogoBar, "backdrop-filter", "none"));
    }
    plan
}

/// Owns the registry and applies full layout passes.
pub struct ResponsiveStyleApplier {
    registry: StyleTargetRegistry,
}

impl ResponsiveStyleApplier {
    pub fn new(registry: StyleTargetRegistry) -> Self {
        ResponsiveStyleApplier { registry }
    }

    pub fn registry(&self) -> &StyleTargetRegistry {
        &self.registry
    }

    /// Compute and write every style for `metrics`. Returns the number of element writes.
    pub fn apply(&self, metrics: &ViewportMetrics) -> usize {
        let sizes = SizeSet::compute(metrics);
        let mut writes = self.apply_writes(&layout_plan(&sizes, metrics));
        for (name, value) in custom_properties(&sizes, metrics) {
            writes += self.registry.write(Role::Root, &name, &value);
        }
        writes
    }

    pub fn apply_viewport_units(&self, metrics: &ViewportMetrics) {
        for (name, value) in viewport_units(metrics) {
            self.registry.write(Role::Root, &name, &value);
        }
    }

    pub fn apply_writes(&self, plan: &[StyleWrite]) -> usize {
        plan.iter()
            .map(|w| self.registry.write(w.role, &w.property, &w.value))
            .sum()
    }
}
