// Landing page context.
// One LandingApp per page load owns every component and is the only thing the runtime
// talks to: DOM callbacks become PageEvents, dispatch() runs them to completion and hands
// back any submission jobs that need the async worker.
// See DESIGN.md: Application Context

use crate::analytics::{
    emit, seconds_on_page, AnalyticsEvent, AnalyticsSink, EventName, ScrollDepthTracker,
};
use crate::form::{EmailCaptureForm, FormContext, FormSurface};
use crate::scheduler::{Debouncer, Scheduler, Throttle, TimerSlot, TimerTicket};
use crate::service::{ReadinessGate, SubmissionJob, SubmissionOutcome};
use crate::styles::{scroll_plan, ResponsiveStyleApplier, StyleTargetRegistry};
use crate::suggestion::{SuggestionField, SuggestionForm, SuggestionSurface};
use crate::types::{LandingConfig, Millis};
use crate::video_guard::{
    FallbackVisual, GuardContext, GuardEvent, GuardPolicy, MediaSurface, SuccessSignal,
    VideoGuardState, VideoPlaybackGuard, UNKNOWN_ERROR_REASON,
};
use crate::viewport::{PageEnvironment, ViewportMetrics};
use crate::visibility::{IntersectionSample, PlaybackCommand, VisibilityController};

pub const ERROR_BANNER: &str = "Something went wrong. Please refresh the page.";

/// Transient page-level banner.
pub trait NoticeSurface {
    fn show_banner(&self, text: &str);
    fn hide_banner(&self);
}

/// Media element lifecycle signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSignal {
    CanPlay,
    LoadedData,
    /// A `play()` call resolved.
    Playing,
    Error(Option<String>),
    PlayRejected(String),
}

/// Named event channels feeding the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    DomReady,
    Load,
    Resize,
    OrientationChange,
    VisibilityChange { hidden: bool },
    TimerFired(TimerTicket),
    Media(MediaSignal),
    Intersection(IntersectionSample),
    Scroll,
    EmailInput,
    EmailBlur,
    EmailSubmit,
    EmailEscape,
    SuggestionInput(SuggestionField),
    SuggestionBlur(SuggestionField),
    SuggestionSubmit,
    Submission(SubmissionOutcome),
    ServiceReady,
    ForceFallback(String),
    ForceUpdate,
    Unload,
    UncaughtError { message: String, stack: Option<String> },
}

/// Host capabilities handed to the app at construction.
pub struct PageBindings {
    pub env: Box<dyn PageEnvironment>,
    pub scheduler: Box<dyn Scheduler>,
    pub analytics: Box<dyn AnalyticsSink>,
    pub notice: Box<dyn NoticeSurface>,
    pub styles: StyleTargetRegistry,
    /// `None` when the page has no hero video.
    pub media: Option<Box<dyn MediaSurface>>,
    pub form: Option<Box<dyn FormSurface>>,
    pub suggestion: Option<(Box<dyn SuggestionSurface>, String)>,
}

pub struct LandingApp {
    config: LandingConfig,
    env: Box<dyn PageEnvironment>,
    scheduler: Box<dyn Scheduler>,
    analytics: Box<dyn AnalyticsSink>,
    notice: Box<dyn NoticeSurface>,
    media: Option<Box<dyn MediaSurface>>,
    form_surface: Option<Box<dyn FormSurface>>,
    suggestion_surface: Option<Box<dyn SuggestionSurface>>,

    applier: ResponsiveStyleApplier,
    guard: VideoPlaybackGuard,
    visibility: VisibilityController,
    email_form: EmailCaptureForm,
    suggestion_form: SuggestionForm,
    gate: ReadinessGate,

    resize_debounce: Debouncer,
    orientation_debounce: Debouncer,
    visibility_debounce: Debouncer,
    scroll_throttle: Throttle,
    depth_throttle: Throttle,
    depth: ScrollDepthTracker,

    initialized: bool,
    loaded_at: Millis,
    layout_passes: u32,
    last_metrics: Option<ViewportMetrics>,
}

impl LandingApp {
    pub fn new(config: LandingConfig, bindings: PageBindings) -> Self {
        let (suggestion_surface, suggestion_label) = match bindings.suggestion {
            Some((surface, label)) => (Some(surface), label),
            None => (None, String::new()),
        };

        let loaded_at = bindings.env.now();

        LandingApp {
            guard: VideoPlaybackGuard::new(
                GuardPolicy::from_config(&config),
                FallbackVisual::from_config(&config),
            ),
            visibility: VisibilityController::new(config.intersection_threshold),
            email_form: EmailCaptureForm::new(&config),
            suggestion_form: SuggestionForm::new(&suggestion_label, &config),
            gate: ReadinessGate::new(),
            resize_debounce: Debouncer::new(TimerSlot::ResizeLayout, config.resize_debounce()),
            orientation_debounce: Debouncer::new(
                TimerSlot::OrientationLayout,
                config.orientation_debounce(),
            ),
            visibility_debounce: Debouncer::new(
                TimerSlot::VisibilityLayout,
                config.visibility_refresh(),
            ),
            scroll_throttle: Throttle::new(Millis::new(config.scroll_throttle_ms)),
            depth_throttle: Throttle::new(Millis::new(config.scroll_depth_throttle_ms)),
            depth: ScrollDepthTracker::new(),
            applier: ResponsiveStyleApplier::new(bindings.styles),
            env: bindings.env,
            scheduler: bindings.scheduler,
            analytics: bindings.analytics,
            notice: bindings.notice,
            media: bindings.media,
            form_surface: bindings.form,
            suggestion_surface,
            initialized: false,
            loaded_at,
            layout_passes: 0,
            last_metrics: None,
            config,
        }
    }

    pub fn config(&self) -> &LandingConfig {
        &self.config
    }

    /// Readiness gate the submission worker waits on.
    pub fn gate(&self) -> ReadinessGate {
        self.gate.clone()
    }

    pub fn guard_state(&self) -> &VideoGuardState {
        self.guard.state()
    }

    pub fn fallback_shown(&self) -> bool {
        self.guard.fallback_shown()
    }

    pub fn layout_passes(&self) -> u32 {
        self.layout_passes
    }

    /// Metrics of the most recent layout pass, or a fresh reading before the first one.
    pub fn current_metrics(&self) -> ViewportMetrics {
        self.last_metrics.unwrap_or_else(|| self.env.viewport_metrics())
    }

    /// Run one event to completion. Returned jobs go to the submission worker.
    pub fn dispatch(&mut self, event: PageEvent) -> Vec<SubmissionJob> {
        let mut jobs = Vec::new();

        match event {
            PageEvent::DomReady => self.start(),
            PageEvent::Load | PageEvent::ForceUpdate => self.refresh_layout(),
            PageEvent::Resize => self.resize_debounce.trigger(self.scheduler.as_mut()),
            PageEvent::OrientationChange => {
                self.orientation_debounce.trigger(self.scheduler.as_mut())
            }
            PageEvent::VisibilityChange { hidden } => {
                if !hidden {
                    self.visibility_debounce.trigger(self.scheduler.as_mut());
                }
            }
            PageEvent::TimerFired(ticket) => {
                if self.scheduler.claim(ticket) {
                    self.on_timer(ticket.slot);
                } else {
                    log::debug!("dropping superseded {:?} expiry", ticket.slot);
                }
            }
            PageEvent::Media(signal) => self.on_media(signal),
            PageEvent::Intersection(sample) => self.on_intersection(sample),
            PageEvent::Scroll => self.on_scroll(),

            PageEvent::EmailInput => {
                if let Some(surface) = self.form_surface.as_deref() {
                    self.email_form.on_input(surface);
                }
            }
            PageEvent::EmailBlur => {
                if let Some(surface) = self.form_surface.as_deref() {
                    self.email_form.on_blur(surface);
                }
            }
            PageEvent::EmailEscape => {
                if let Some(surface) = self.form_surface.as_deref() {
                    self.email_form.on_escape(surface);
                }
            }
            PageEvent::EmailSubmit => {
                if let Some(surface) = self.form_surface.as_deref() {
                    let mut ctx = FormContext {
                        scheduler: self.scheduler.as_mut(),
                        analytics: self.analytics.as_ref(),
                        env: self.env.as_ref(),
                    };
                    if let Some(email) = self.email_form.submit(surface, &mut ctx) {
                        jobs.push(SubmissionJob::Email(email));
                    }
                }
            }

            PageEvent::SuggestionInput(field) => {
                if let Some(surface) = self.suggestion_surface.as_deref() {
                    self.suggestion_form.on_input(field, surface);
                }
            }
            PageEvent::SuggestionBlur(field) => {
                if let Some(surface) = self.suggestion_surface.as_deref() {
                    self.suggestion_form.on_blur(field, surface);
                }
            }
            PageEvent::SuggestionSubmit => {
                if let Some(surface) = self.suggestion_surface.as_deref() {
                    let mut ctx = FormContext {
                        scheduler: self.scheduler.as_mut(),
                        analytics: self.analytics.as_ref(),
                        env: self.env.as_ref(),
                    };
                    if let Some(payload) = self.suggestion_form.submit(surface, &mut ctx) {
                        jobs.push(SubmissionJob::Suggestion(payload));
                    }
                }
            }
            PageEvent::Submission(outcome) => self.on_submission(outcome),

            PageEvent::ServiceReady => self.gate.open(),
            PageEvent::ForceFallback(reason) => self.guard_event(GuardEvent::Fallback(reason)),
            PageEvent::Unload => {
                let seconds = seconds_on_page(self.loaded_at, self.env.now());
                emit(
                    self.analytics.as_ref(),
                    AnalyticsEvent::new(EventName::TimeOnPage).with("seconds", seconds),
                );
            }
            PageEvent::UncaughtError { message, stack } => self.handle_error(&message, stack),
        }

        jobs
    }

    /// Top-level error handler. Never fails.
    pub fn handle_error(&mut self, message: &str, stack: Option<String>) {
        log::error!("application error: {}", message);

        let mut event = AnalyticsEvent::new(EventName::ApplicationError)
            .with("message", message)
            .with("timestamp", self.env.iso_timestamp());
        if let Some(stack) = stack {
            event = event.with("stack", stack);
        }
        emit(self.analytics.as_ref(), event);

        self.notice.show_banner(ERROR_BANNER);
        self.scheduler.schedule(TimerSlot::ErrorBanner, self.config.notice());
    }

    fn start(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.loaded_at = self.env.now();

        self.refresh_layout();

        if let Some(surface) = self.form_surface.as_deref() {
            self.email_form.reset(surface);
        } else {
            log::warn!("email form elements not found");
        }
        if let Some(surface) = self.suggestion_surface.as_deref() {
            self.suggestion_form.update_counter(surface);
        }

        if self.media.is_some() {
            self.guard_event(GuardEvent::Setup);
        } else {
            log::warn!("video element not found");
        }

        let metrics = self.current_metrics();
        emit(
            self.analytics.as_ref(),
            AnalyticsEvent::new(EventName::PageLoaded)
                .with("timestamp", self.env.iso_timestamp())
                .with("userAgent", self.env.user_agent())
                .with("viewport", format!("{}x{}", metrics.width, metrics.height)),
        );

        log::info!("landing page initialized ({})", metrics.device_class);
    }

    /// Full layout pass plus viewport units.
    fn refresh_layout(&mut self) {
        let metrics = self.env.viewport_metrics();
        self.applier.apply_viewport_units(&metrics);
        let writes = self.applier.apply(&metrics);
        self.layout_passes += 1;
        self.last_metrics = Some(metrics);
        log::debug!(
            "layout pass {} at {}x{} ({}): {} writes",
            self.layout_passes,
            metrics.width,
            metrics.height,
            metrics.device_class,
            writes
        );
    }

    fn on_timer(&mut self, slot: TimerSlot) {
        match slot {
            TimerSlot::LoadFallback => self.guard_event(GuardEvent::LoadTimerExpired),
            TimerSlot::MediaReload => self.guard_event(GuardEvent::ReloadTimerExpired),
            TimerSlot::ResizeLayout => {
                if self.resize_debounce.fire() {
                    self.refresh_layout();
                }
            }
            TimerSlot::OrientationLayout => {
                if self.orientation_debounce.fire() {
                    self.refresh_layout();
                }
            }
            TimerSlot::VisibilityLayout => {
                if self.visibility_debounce.fire() {
                    self.refresh_layout();
                }
            }
            TimerSlot::ErrorBanner => self.notice.hide_banner(),
            TimerSlot::ButtonRevert | TimerSlot::SubmitCooldown | TimerSlot::FormNotice => {
                if let Some(surface) = self.form_surface.as_deref() {
                    self.email_form.on_timer(slot, surface);
                }
            }
            TimerSlot::SuggestionRevert
            | TimerSlot::SuggestionCooldown
            | TimerSlot::SuggestionStatus => {
                if let Some(surface) = self.suggestion_surface.as_deref() {
                    self.suggestion_form.on_timer(slot, surface);
                }
            }
        }
    }

    fn on_media(&mut self, signal: MediaSignal) {
        let event = match signal {
            MediaSignal::CanPlay => GuardEvent::Success(SuccessSignal::CanPlay),
            MediaSignal::LoadedData => GuardEvent::Success(SuccessSignal::LoadedData),
            MediaSignal::Playing => GuardEvent::Success(SuccessSignal::Playing),
            MediaSignal::Error(message) => GuardEvent::Failure(
                message.unwrap_or_else(|| UNKNOWN_ERROR_REASON.to_string()),
            ),
            MediaSignal::PlayRejected(reason) => GuardEvent::Failure(reason),
        };
        self.guard_event(event);
    }

    fn on_intersection(&mut self, sample: IntersectionSample) {
        let Some(media) = self.media.as_deref() else {
            return;
        };
        match self.visibility.observe(sample, self.guard.fallback_shown()) {
            Some(PlaybackCommand::Play) => media.play(),
            Some(PlaybackCommand::Pause) => media.pause(),
            None => {}
        }
    }

    fn on_scroll(&mut self) {
        let now = self.env.now();
        let position = self.env.scroll_position();

        if self.scroll_throttle.allow(now) {
            self.applier
                .apply_writes(&scroll_plan(position.scroll_y, self.config.parallax_speed));
        }

        if self.depth_throttle.allow(now) {
            for marker in self.depth.observe(position.percent()) {
                emit(
                    self.analytics.as_ref(),
                    AnalyticsEvent::new(EventName::ScrollDepth).with("percent", marker),
                );
            }
        }
    }

    fn on_submission(&mut self, outcome: SubmissionOutcome) {
        let mut ctx = FormContext {
            scheduler: self.scheduler.as_mut(),
            analytics: self.analytics.as_ref(),
            env: self.env.as_ref(),
        };
        match outcome {
            SubmissionOutcome::Email(result) => {
                if let Some(surface) = self.form_surface.as_deref() {
                    self.email_form.on_result(result, surface, &mut ctx);
                }
            }
            SubmissionOutcome::Suggestion(result) => {
                if let Some(surface) = self.suggestion_surface.as_deref() {
                    self.suggestion_form.on_result(result, surface, &mut ctx);
                }
            }
        }
    }

    fn guard_event(&mut self, event: GuardEvent) {
        let Some(media) = self.media.as_deref() else {
            return;
        };
        let mut ctx = GuardContext {
            media,
            scheduler: self.scheduler.as_mut(),
            analytics: self.analytics.as_ref(),
        };
        self.guard.handle(event, &mut ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{
        MessageKind, ACCESS_REQUESTED, INVALID_EMAIL, REQUEST_ACCESS, SUCCESS_MESSAGE,
    };
    use crate::service::run_job;
    use crate::styles::{Role, StyleTarget};
    use crate::suggestion::SuggestionFields;
    use crate::testing::{
        FakeEnvironment, FakeForm, FakeMedia, FakeNotice, FakeService, FakeSuggestion,
        ManualScheduler, RecordingAnalytics, RecordingTarget,
    };
    use crate::video_guard::GuardPhase;
    use futures::executor::block_on;

    struct Rig {
        app: LandingApp,
        timers: ManualScheduler,
        env: FakeEnvironment,
        analytics: RecordingAnalytics,
        media: FakeMedia,
        form: FakeForm,
        suggestion: FakeSuggestion,
        notice: FakeNotice,
        root: RecordingTarget,
        video: RecordingTarget,
    }

    impl Rig {
        fn new(width: u32, height: u32) -> Self {
            Self::with_media(width, height, true)
        }

        fn with_media(width: u32, height: u32, has_media: bool) -> Self {
            Self::build(width, height, has_media, ManualScheduler::new())
        }

        fn with_clock(width: u32, height: u32, timers: ManualScheduler) -> Self {
            Self::build(width, height, true, timers)
        }

        fn build(width: u32, height: u32, has_media: bool, timers: ManualScheduler) -> Self {
            let env = FakeEnvironment::new(width, height).with_clock(&timers);
            let analytics = RecordingAnalytics::new();
            let media = FakeMedia::new();
            let form = FakeForm::new();
            let suggestion = FakeSuggestion::new(SuggestionFields::default());
            let notice = FakeNotice::new();
            let root = RecordingTarget::new();
            let video = RecordingTarget::new();

            let root_target = root.clone();
            let video_target = video.clone();
            let styles = StyleTargetRegistry::lookup(|role| match role {
                Role::Root => vec![Box::new(root_target.clone()) as Box<dyn StyleTarget>],
                Role::Video => vec![Box::new(video_target.clone()) as Box<dyn StyleTarget>],
                _ => Vec::new(),
            });

            let bindings = PageBindings {
                env: Box::new(env.clone()),
                scheduler: Box::new(timers.clone()),
                analytics: Box::new(analytics.clone()),
                notice: Box::new(notice.clone()),
                styles,
                media: if has_media {
                    Some(Box::new(media.clone()))
                } else {
                    None
                },
                form: Some(Box::new(form.clone())),
                suggestion: Some((Box::new(suggestion.clone()), "Submit Suggestion".to_string())),
            };

            Rig {
                app: LandingApp::new(LandingConfig::default(), bindings),
                timers,
                env,
                analytics,
                media,
                form,
                suggestion,
                notice,
                root,
                video,
            }
        }

        fn advance(&mut self, ms: u64) {
            for ticket in self.timers.advance_tickets(Millis::new(ms)) {
                self.app.dispatch(PageEvent::TimerFired(ticket));
            }
        }

        /// Dispatch, then run any submission jobs against `service` to completion.
        fn dispatch_with(&mut self, event: PageEvent, service: &FakeService) {
            for job in self.app.dispatch(event) {
                let outcome = block_on(run_job(service, &self.app.gate(), job));
                self.app.dispatch(PageEvent::Submission(outcome));
            }
        }
    }

    #[test]
    fn dom_ready_lays_out_and_arms_guard() {
        let mut rig = Rig::new(375, 800);
        rig.app.dispatch(PageEvent::DomReady);
        rig.app.dispatch(PageEvent::DomReady);

        assert_eq!(rig.app.layout_passes(), 1);
        assert_eq!(rig.root.get("--device").as_deref(), Some("mobile"));
        assert_eq!(rig.root.get("--vh").as_deref(), Some("8px"));
        assert_eq!(rig.app.guard_state().phase, GuardPhase::TimerArmed);
        assert_eq!(rig.analytics.count(EventName::PageLoaded), 1);
        let loaded = &rig.analytics.events()[0];
        assert_eq!(
            loaded.property("viewport").and_then(|v| v.as_str()),
            Some("375x800")
        );
        assert!(rig.form.button().disabled);
    }

    #[test]
    fn load_timeout_shows_fallback() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::DomReady);
        rig.advance(2000);

        assert!(rig.app.fallback_shown());
        assert_eq!(rig.media.fallback_insertions(), 1);
        assert_eq!(rig.analytics.count(EventName::VideoError), 1);
    }

    #[test]
    fn canplay_before_deadline_wins_the_race() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::DomReady);
        rig.advance(1999);
        rig.app.dispatch(PageEvent::Media(MediaSignal::CanPlay));
        rig.advance(10_000);

        assert!(!rig.app.fallback_shown());
        assert_eq!(rig.app.guard_state().phase, GuardPhase::Resolved);
        assert_eq!(rig.media.loaded_marks(), 1);
    }

    #[test]
    fn visibility_and_timer_share_one_latch() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::DomReady);
        rig.advance(2000);

        let plays = rig.media.plays();
        rig.app.dispatch(PageEvent::Intersection(IntersectionSample {
            is_intersecting: true,
            ratio: 1.0,
        }));
        rig.app
            .dispatch(PageEvent::Media(MediaSignal::PlayRejected("NotAllowedError".to_string())));
        rig.app.dispatch(PageEvent::ForceFallback("manual".to_string()));

        assert_eq!(rig.media.plays(), plays);
        assert_eq!(rig.media.fallback_insertions(), 1);
        assert_eq!(rig.analytics.count(EventName::VideoError), 1);
    }

    #[test]
    fn intersection_plays_and_pauses() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::DomReady);
        rig.app.dispatch(PageEvent::Intersection(IntersectionSample {
            is_intersecting: true,
            ratio: 0.5,
        }));
        rig.app.dispatch(PageEvent::Media(MediaSignal::Playing));
        rig.app.dispatch(PageEvent::Intersection(IntersectionSample {
            is_intersecting: false,
            ratio: 0.0,
        }));

        assert_eq!(rig.media.plays(), 1);
        assert_eq!(rig.media.pauses(), 1);
        assert_eq!(rig.app.guard_state().phase, GuardPhase::Resolved);
    }

    #[test]
    fn resize_burst_collapses_to_one_layout_pass() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::DomReady);
        let before = rig.app.layout_passes();

        for i in 0..10u32 {
            rig.env.set_size(1280 - i * 50, 800);
            rig.app.dispatch(PageEvent::Resize);
            rig.advance(5);
        }
        rig.advance(94);
        assert_eq!(rig.app.layout_passes(), before);
        rig.advance(1);
        assert_eq!(rig.app.layout_passes(), before + 1);
        assert_eq!(rig.app.current_metrics().width, 830);
        rig.advance(1000);
        assert_eq!(rig.app.layout_passes(), before + 1);
    }

    #[test]
    fn queued_expiry_behind_new_resize_is_ignored() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::DomReady);
        let before = rig.app.layout_passes();

        rig.app.dispatch(PageEvent::Resize);
        let queued = rig.timers.advance_tickets(Millis::new(100));
        assert_eq!(queued.len(), 1);

        // A second resize lands before the queued expiry is handled.
        rig.env.set_size(900, 800);
        rig.app.dispatch(PageEvent::Resize);
        rig.app.dispatch(PageEvent::TimerFired(queued[0]));
        assert_eq!(rig.app.layout_passes(), before);

        rig.advance(99);
        assert_eq!(rig.app.layout_passes(), before);
        rig.advance(1);
        assert_eq!(rig.app.layout_passes(), before + 1);
        assert_eq!(rig.app.current_metrics().width, 900);
    }

    #[test]
    fn orientation_change_waits_longer() {
        let mut rig = Rig::new(800, 400);
        rig.app.dispatch(PageEvent::DomReady);
        rig.env.set_size(400, 800);
        rig.app.dispatch(PageEvent::OrientationChange);
        rig.advance(199);
        assert!(rig.app.current_metrics().is_landscape);
        rig.advance(1);
        assert!(!rig.app.current_metrics().is_landscape);
        assert_eq!(rig.root.get("--device").as_deref(), Some("mobile"));
    }

    #[test]
    fn returning_to_the_tab_refreshes_layout() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::DomReady);
        let before = rig.app.layout_passes();

        rig.app.dispatch(PageEvent::VisibilityChange { hidden: true });
        rig.advance(500);
        assert_eq!(rig.app.layout_passes(), before);

        rig.app.dispatch(PageEvent::VisibilityChange { hidden: false });
        rig.advance(100);
        assert_eq!(rig.app.layout_passes(), before + 1);
    }

    #[test]
    fn email_happy_path_end_to_end() {
        let mut rig = Rig::new(1280, 800);
        let service = FakeService::succeeding();
        rig.app.dispatch(PageEvent::DomReady);
        rig.app.dispatch(PageEvent::ServiceReady);

        rig.form.type_email("user@example.com");
        rig.app.dispatch(PageEvent::EmailInput);
        assert!(!rig.form.button().disabled);

        rig.dispatch_with(PageEvent::EmailSubmit, &service);

        assert_eq!(service.emails(), vec!["user@example.com".to_string()]);
        assert_eq!(
            rig.form.message(),
            Some((MessageKind::Success, SUCCESS_MESSAGE.to_string()))
        );
        assert_eq!(rig.form.email(), "");
        assert_eq!(rig.form.button().label, ACCESS_REQUESTED);
        assert_eq!(rig.analytics.count(EventName::EmailSubmitted), 1);

        rig.advance(3000);
        assert_eq!(rig.form.button().label, REQUEST_ACCESS);
    }

    #[test]
    fn invalid_email_never_reaches_service() {
        let mut rig = Rig::new(1280, 800);
        let service = FakeService::succeeding();
        rig.app.dispatch(PageEvent::DomReady);
        rig.app.dispatch(PageEvent::ServiceReady);

        rig.form.type_email("not-an-email");
        rig.app.dispatch(PageEvent::EmailInput);
        assert!(rig.form.button().disabled);
        assert_eq!(rig.form.button().label, INVALID_EMAIL);

        rig.dispatch_with(PageEvent::EmailSubmit, &service);
        assert!(service.emails().is_empty());
        assert_eq!(rig.analytics.count(EventName::FormValidationFailed), 1);
    }

    #[test]
    fn suggestion_submission_end_to_end() {
        let mut rig = Rig::new(1280, 800);
        let service = FakeService::succeeding();
        rig.app.dispatch(PageEvent::DomReady);
        rig.app.dispatch(PageEvent::ServiceReady);

        rig.suggestion.fill(SuggestionFields {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            kind: "feature".to_string(),
            message: "Add leaderboards".to_string(),
        });
        rig.dispatch_with(PageEvent::SuggestionSubmit, &service);

        let sent = service.suggestions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name, "Ada");
        assert_eq!(sent[0].url, rig.env.url());
        assert_eq!(rig.analytics.count(EventName::SuggestionSubmitted), 1);
        assert_eq!(rig.suggestion.fields(), SuggestionFields::default());
    }

    #[test]
    fn scroll_applies_parallax_and_reports_depth_once() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::DomReady);

        rig.env.set_scroll(600.0, 2000.0);
        rig.app.dispatch(PageEvent::Scroll);
        assert_eq!(rig.video.get("transform").as_deref(), Some("translateY(300px)"));

        rig.advance(200);
        rig.env.set_scroll(1200.0, 2000.0);
        rig.app.dispatch(PageEvent::Scroll);
        rig.advance(200);
        rig.app.dispatch(PageEvent::Scroll);

        let percents: Vec<u64> = rig
            .analytics
            .events()
            .iter()
            .filter(|e| e.name == EventName::ScrollDepth)
            .filter_map(|e| e.property("percent").and_then(|v| v.as_u64()))
            .collect();
        assert_eq!(percents, vec![25, 50, 75, 100]);
    }

    #[test]
    fn unload_reports_time_on_page() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::DomReady);
        rig.app.dispatch(PageEvent::Media(MediaSignal::CanPlay));
        rig.advance(42_400);
        rig.app.dispatch(PageEvent::Unload);

        let events = rig.analytics.events();
        let last = events.last().unwrap();
        assert_eq!(last.name, EventName::TimeOnPage);
        assert_eq!(last.property("seconds").and_then(|v| v.as_u64()), Some(42));
    }

    #[test]
    fn unload_before_dom_ready_counts_from_construction() {
        let timers = ManualScheduler::new();
        timers.advance(Millis::new(1_700_000_000_000));
        let mut rig = Rig::with_clock(1280, 800, timers);
        rig.advance(3_000);
        rig.app.dispatch(PageEvent::Unload);

        let events = rig.analytics.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, EventName::TimeOnPage);
        assert_eq!(events[0].property("seconds").and_then(|v| v.as_u64()), Some(3));
    }

    #[test]
    fn media_error_without_message_reports_unknown_error() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::DomReady);
        rig.app.dispatch(PageEvent::Media(MediaSignal::CanPlay));

        for _ in 0..4 {
            rig.app.dispatch(PageEvent::Media(MediaSignal::Error(None)));
            rig.advance(5000);
        }

        assert!(rig.app.fallback_shown());
        assert_eq!(rig.media.reloads(), 3);
        let errors: Vec<_> = rig
            .analytics
            .events()
            .into_iter()
            .filter(|e| e.name == EventName::VideoError)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].property("error").and_then(|v| v.as_str()),
            Some(UNKNOWN_ERROR_REASON)
        );
    }

    #[test]
    fn uncaught_errors_show_transient_banner() {
        let mut rig = Rig::new(1280, 800);
        rig.app.dispatch(PageEvent::UncaughtError {
            message: "boom".to_string(),
            stack: Some("at main.js:1".to_string()),
        });

        assert_eq!(rig.notice.banner().as_deref(), Some(ERROR_BANNER));
        let event = &rig.analytics.events()[0];
        assert_eq!(event.name, EventName::ApplicationError);
        assert_eq!(event.property("stack").and_then(|v| v.as_str()), Some("at main.js:1"));

        rig.advance(5000);
        assert_eq!(rig.notice.banner(), None);
    }

    #[test]
    fn page_without_video_skips_guard() {
        let mut rig = Rig::with_media(1280, 800, false);
        rig.app.dispatch(PageEvent::DomReady);
        rig.advance(5000);
        rig.app.dispatch(PageEvent::ForceFallback("manual".to_string()));

        assert_eq!(rig.app.guard_state().phase, GuardPhase::Idle);
        assert_eq!(rig.analytics.count(EventName::VideoError), 0);
    }
}
