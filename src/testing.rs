// In-memory fakes for every page capability, shared by the unit tests.
// Each fake is a cheap Rc handle: clone one into the app, keep one to inspect.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use crate::analytics::{AnalyticsEvent, AnalyticsSink, EventName};
use crate::app::NoticeSurface;
use crate::error::LandingError;
use crate::form::{ButtonTone, ButtonView, EmailValidity, FormSurface, MessageKind};
use crate::scheduler::{Scheduler, TimerSlot, TimerTicket};
use crate::service::{SubmissionResponse, SubmissionService};
use crate::styles::StyleTarget;
use crate::suggestion::{
    CounterLevel, SuggestionField, SuggestionFields, SuggestionPayload, SuggestionSurface,
};
use crate::types::Millis;
use crate::video_guard::{FallbackVisual, MediaSurface};
use crate::viewport::{PageEnvironment, ScrollPosition};

// =============================================================================
// Clock
// =============================================================================

#[derive(Default)]
struct TimerState {
    now: Millis,
    seq: u64,
    pending: BTreeMap<TimerSlot, (Millis, u64)>,
    /// Latest unclaimed generation per slot, fired or not.
    live: BTreeMap<TimerSlot, u64>,
}

/// Virtual clock; timers only fire when the test advances it.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<TimerState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Millis {
        self.state.borrow().now
    }

    /// Absolute due time of the timer pending in `slot`.
    pub fn due(&self, slot: TimerSlot) -> Option<Millis> {
        self.state.borrow().pending.get(&slot).map(|(due, _)| *due)
    }

    /// Move the clock forward and return the slots that expired, earliest first.
    pub fn advance(&self, delta: Millis) -> Vec<TimerSlot> {
        self.advance_tickets(delta)
            .into_iter()
            .map(|ticket| ticket.slot)
            .collect()
    }

    /// Like `advance`, but hands back tickets for `Scheduler::claim`.
    pub fn advance_tickets(&self, delta: Millis) -> Vec<TimerTicket> {
        let mut state = self.state.borrow_mut();
        let target = state.now.saturating_add(delta);

        let mut fired: Vec<(Millis, u64, TimerSlot)> = state
            .pending
            .iter()
            .filter(|(_, (due, _))| *due <= target)
            .map(|(slot, (due, seq))| (*due, *seq, *slot))
            .collect();
        fired.sort();

        for (_, _, slot) in &fired {
            state.pending.remove(slot);
        }
        state.now = target;
        fired
            .into_iter()
            .map(|(_, generation, slot)| TimerTicket { slot, generation })
            .collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, slot: TimerSlot, delay: Millis) {
        let mut state = self.state.borrow_mut();
        let due = state.now.saturating_add(delay);
        state.seq += 1;
        let seq = state.seq;
        state.pending.insert(slot, (due, seq));
        state.live.insert(slot, seq);
    }

    fn cancel(&mut self, slot: TimerSlot) {
        let mut state = self.state.borrow_mut();
        state.pending.remove(&slot);
        state.live.remove(&slot);
    }

    fn claim(&mut self, ticket: TimerTicket) -> bool {
        let mut state = self.state.borrow_mut();
        if state.live.get(&ticket.slot) == Some(&ticket.generation) {
            state.live.remove(&ticket.slot);
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Styles & analytics
// =============================================================================

#[derive(Clone, Default)]
pub struct RecordingTarget {
    styles: Rc<RefCell<HashMap<String, String>>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: &str) -> Option<String> {
        self.styles.borrow().get(property).cloned()
    }
}

impl StyleTarget for RecordingTarget {
    fn set_style(&self, property: &str, value: &str) {
        self.styles
            .borrow_mut()
            .insert(property.to_string(), value.to_string());
    }
}

#[derive(Clone, Default)]
pub struct RecordingAnalytics {
    events: Rc<RefCell<Vec<AnalyticsEvent>>>,
}

impl RecordingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, name: EventName) -> usize {
        self.events.borrow().iter().filter(|e| e.name == name).count()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn track(&self, event: &AnalyticsEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

// =============================================================================
// Media
// =============================================================================

#[derive(Default)]
struct MediaLog {
    plays: usize,
    pauses: usize,
    reloads: usize,
    loaded_marks: usize,
    hidden: bool,
    fallbacks: Vec<FallbackVisual>,
}

#[derive(Clone, Default)]
pub struct FakeMedia {
    log: Rc<RefCell<MediaLog>>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plays(&self) -> usize {
        self.log.borrow().plays
    }

    pub fn pauses(&self) -> usize {
        self.log.borrow().pauses
    }

    pub fn reloads(&self) -> usize {
        self.log.borrow().reloads
    }

    pub fn loaded_marks(&self) -> usize {
        self.log.borrow().loaded_marks
    }

    pub fn hidden(&self) -> bool {
        self.log.borrow().hidden
    }

    pub fn fallback_insertions(&self) -> usize {
        self.log.borrow().fallbacks.len()
    }
}

impl MediaSurface for FakeMedia {
    fn play(&self) {
        self.log.borrow_mut().plays += 1;
    }

    fn pause(&self) {
        self.log.borrow_mut().pauses += 1;
    }

    fn reload(&self) {
        self.log.borrow_mut().reloads += 1;
    }

    fn mark_loaded(&self) {
        self.log.borrow_mut().loaded_marks += 1;
    }

    fn hide(&self) {
        self.log.borrow_mut().hidden = true;
    }

    fn insert_fallback(&self, visual: &FallbackVisual) {
        self.log.borrow_mut().fallbacks.push(visual.clone());
    }
}

// =============================================================================
// Forms & notices
// =============================================================================

struct FormState {
    email: String,
    validity: EmailValidity,
    button: ButtonView,
    message: Option<(MessageKind, String)>,
    announcements: Vec<String>,
}

#[derive(Clone)]
pub struct FakeForm {
    state: Rc<RefCell<FormState>>,
}

impl FakeForm {
    pub fn new() -> Self {
        FakeForm {
            state: Rc::new(RefCell::new(FormState {
                email: String::new(),
                validity: EmailValidity::Empty,
                button: ButtonView::new("", false, ButtonTone::Idle),
                message: None,
                announcements: Vec::new(),
            })),
        }
    }

    /// What the user typed, before any event is dispatched.
    pub fn type_email(&self, value: &str) {
        self.state.borrow_mut().email = value.to_string();
    }

    pub fn email(&self) -> String {
        self.state.borrow().email.clone()
    }

    pub fn validity(&self) -> EmailValidity {
        self.state.borrow().validity
    }

    pub fn button(&self) -> ButtonView {
        self.state.borrow().button.clone()
    }

    pub fn message(&self) -> Option<(MessageKind, String)> {
        self.state.borrow().message.clone()
    }

    pub fn announcements(&self) -> Vec<String> {
        self.state.borrow().announcements.clone()
    }
}

impl FormSurface for FakeForm {
    fn email_value(&self) -> String {
        self.email()
    }

    fn set_email_value(&self, value: &str) {
        self.type_email(value);
    }

    fn set_validity(&self, validity: EmailValidity) {
        self.state.borrow_mut().validity = validity;
    }

    fn set_button(&self, view: &ButtonView) {
        self.state.borrow_mut().button = view.clone();
    }

    fn show_message(&self, kind: MessageKind, text: &str) {
        self.state.borrow_mut().message = Some((kind, text.to_string()));
    }

    fn clear_message(&self) {
        self.state.borrow_mut().message = None;
    }

    fn announce(&self, text: &str) {
        self.state.borrow_mut().announcements.push(text.to_string());
    }
}

struct SuggestionState {
    fields: SuggestionFields,
    errors: HashSet<SuggestionField>,
    counter: (usize, CounterLevel),
    button: ButtonView,
    status: Option<(MessageKind, String)>,
}

#[derive(Clone)]
pub struct FakeSuggestion {
    state: Rc<RefCell<SuggestionState>>,
}

impl FakeSuggestion {
    pub fn new(fields: SuggestionFields) -> Self {
        FakeSuggestion {
            state: Rc::new(RefCell::new(SuggestionState {
                fields,
                errors: HashSet::new(),
                counter: (0, CounterLevel::Normal),
                button: ButtonView::new("", false, ButtonTone::Idle),
                status: None,
            })),
        }
    }

    pub fn fill(&self, fields: SuggestionFields) {
        self.state.borrow_mut().fields = fields;
    }

    pub fn has_error(&self, field: SuggestionField) -> bool {
        self.state.borrow().errors.contains(&field)
    }

    pub fn counter(&self) -> (usize, CounterLevel) {
        self.state.borrow().counter
    }

    pub fn button(&self) -> ButtonView {
        self.state.borrow().button.clone()
    }

    pub fn status(&self) -> Option<(MessageKind, String)> {
        self.state.borrow().status.clone()
    }
}

impl SuggestionSurface for FakeSuggestion {
    fn fields(&self) -> SuggestionFields {
        self.state.borrow().fields.clone()
    }

    fn set_field_error(&self, field: SuggestionField, error: bool) {
        let mut state = self.state.borrow_mut();
        if error {
            state.errors.insert(field);
        } else {
            state.errors.remove(&field);
        }
    }

    fn set_message_text(&self, text: &str) {
        self.state.borrow_mut().fields.message = text.to_string();
    }

    fn set_counter(&self, count: usize, level: CounterLevel) {
        self.state.borrow_mut().counter = (count, level);
    }

    fn set_button(&self, view: &ButtonView) {
        self.state.borrow_mut().button = view.clone();
    }

    fn show_status(&self, kind: MessageKind, text: &str) {
        self.state.borrow_mut().status = Some((kind, text.to_string()));
    }

    fn hide_status(&self) {
        self.state.borrow_mut().status = None;
    }

    fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.fields = SuggestionFields::default();
        state.errors.clear();
    }
}

#[derive(Clone, Default)]
pub struct FakeNotice {
    banner: Rc<RefCell<Option<String>>>,
}

impl FakeNotice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn banner(&self) -> Option<String> {
        self.banner.borrow().clone()
    }
}

impl NoticeSurface for FakeNotice {
    fn show_banner(&self, text: &str) {
        *self.banner.borrow_mut() = Some(text.to_string());
    }

    fn hide_banner(&self) {
        *self.banner.borrow_mut() = None;
    }
}

// =============================================================================
// Service & environment
// =============================================================================

enum ServiceMode {
    Succeed,
    Reject(String),
    Fail(String),
}

pub struct FakeService {
    mode: ServiceMode,
    emails: RefCell<Vec<String>>,
    suggestions: RefCell<Vec<SuggestionPayload>>,
}

impl FakeService {
    fn with_mode(mode: ServiceMode) -> Self {
        FakeService {
            mode,
            emails: RefCell::new(Vec::new()),
            suggestions: RefCell::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_mode(ServiceMode::Succeed)
    }

    /// Answers `{success: false, error}`.
    pub fn rejecting(error: &str) -> Self {
        Self::with_mode(ServiceMode::Reject(error.to_string()))
    }

    /// Fails before reaching the backend.
    pub fn failing(error: &str) -> Self {
        Self::with_mode(ServiceMode::Fail(error.to_string()))
    }

    pub fn emails(&self) -> Vec<String> {
        self.emails.borrow().clone()
    }

    pub fn suggestions(&self) -> Vec<SuggestionPayload> {
        self.suggestions.borrow().clone()
    }

    fn respond(&self) -> Result<SubmissionResponse, LandingError> {
        match &self.mode {
            ServiceMode::Succeed => Ok(SubmissionResponse::ok()),
            ServiceMode::Reject(error) => Ok(SubmissionResponse::rejected(error)),
            ServiceMode::Fail(error) => Err(LandingError::ServiceUnavailable(error.clone())),
        }
    }
}

impl SubmissionService for FakeService {
    async fn submit_email(&self, email: &str) -> Result<SubmissionResponse, LandingError> {
        self.emails.borrow_mut().push(email.to_string());
        self.respond()
    }

    async fn submit_suggestion(
        &self,
        payload: &SuggestionPayload,
    ) -> Result<SubmissionResponse, LandingError> {
        self.suggestions.borrow_mut().push(payload.clone());
        self.respond()
    }
}

struct EnvState {
    width: u32,
    height: u32,
    scroll_y: f64,
    document_height: f64,
}

#[derive(Clone)]
pub struct FakeEnvironment {
    state: Rc<RefCell<EnvState>>,
    clock: Option<ManualScheduler>,
}

impl FakeEnvironment {
    pub fn new(width: u32, height: u32) -> Self {
        FakeEnvironment {
            state: Rc::new(RefCell::new(EnvState {
                width,
                height,
                scroll_y: 0.0,
                document_height: height as f64,
            })),
            clock: None,
        }
    }

    /// Read time from `scheduler` so timers and `now()` agree.
    pub fn with_clock(mut self, scheduler: &ManualScheduler) -> Self {
        self.clock = Some(scheduler.clone());
        self
    }

    pub fn set_size(&self, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        state.width = width;
        state.height = height;
    }

    pub fn set_scroll(&self, scroll_y: f64, document_height: f64) {
        let mut state = self.state.borrow_mut();
        state.scroll_y = scroll_y;
        state.document_height = document_height;
    }
}

impl PageEnvironment for FakeEnvironment {
    fn now(&self) -> Millis {
        self.clock.as_ref().map_or(Millis::ZERO, |clock| clock.now())
    }

    fn iso_timestamp(&self) -> String {
        "2026-01-01T00:00:00.000Z".to_string()
    }

    fn user_agent(&self) -> String {
        "Mozilla/5.0 (test)".to_string()
    }

    fn url(&self) -> String {
        "https://trillionstream.test/".to_string()
    }

    fn window_size(&self) -> (u32, u32) {
        let state = self.state.borrow();
        (state.width, state.height)
    }

    fn scroll_position(&self) -> ScrollPosition {
        let state = self.state.borrow();
        ScrollPosition {
            scroll_y: state.scroll_y,
            document_height: state.document_height,
            viewport_height: state.height as f64,
        }
    }
}
