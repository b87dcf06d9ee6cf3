// Browser runtime (wasm32 only).
// DOM callbacks push PageEvents into one unbounded channel; a single spawn_local task
// drains it into LandingApp::dispatch. Everything here is plumbing around web_sys.
// See DESIGN.md: Browser Runtime

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedSender};
use futures::StreamExt;
use gloo_timers::callback::Timeout;
use js_sys::{Function, Promise, Reflect, JSON};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    AddEventListenerOptions, Document, Element, ErrorEvent, Event, EventTarget, FormData,
    HtmlButtonElement, HtmlElement, HtmlFormElement, HtmlImageElement, HtmlInputElement,
    HtmlMediaElement, HtmlTextAreaElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, KeyboardEvent, PromiseRejectionEvent, Window,
};

use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::app::{LandingApp, MediaSignal, NoticeSurface, PageBindings, PageEvent};
use crate::error::LandingError;
use crate::form::{ButtonView, EmailValidity, FormSurface, MessageKind};
use crate::scheduler::{Scheduler, TimerSlot, TimerTicket};
use crate::service::{run_job, SubmissionJob, SubmissionResponse, SubmissionService};
use crate::styles::{Role, StyleTarget, StyleTargetRegistry};
use crate::suggestion::{
    CounterLevel, SuggestionField, SuggestionFields, SuggestionPayload, SuggestionSurface,
};
use crate::types::{LandingConfig, Millis};
use crate::video_guard::{FallbackVisual, MediaSurface};
use crate::viewport::{PageEnvironment, ScrollPosition, ViewportMetrics};
use crate::visibility::IntersectionSample;

const VIDEO_ID: &str = "video1";
const VIDEO_CONTAINER_ID: &str = "proofvideo";
const EMAIL_INPUT_ID: &str = "requestaccessemail";
const EMAIL_BUTTON_ID: &str = "getaccessbtn";
const LIVE_REGION_ID: &str = "status-live-region";
const SUGGESTION_FORM_ID: &str = "suggestionform";
const SUGGESTION_BUTTON_ID: &str = "submitsuggestion";
const SUGGESTION_STATUS_ID: &str = "suggestionstatus";
const SUGGESTION_MESSAGE_ID: &str = "suggestionmessage";
const CHAR_COUNT_ID: &str = "charcount";
const BANNER_ID: &str = "landing-error-banner";

/// Best-effort text for a thrown JS value.
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

fn dom_error(target: &str, message: &str) -> LandingError {
    LandingError::Dom {
        target: target.to_string(),
        message: message.to_string(),
    }
}

fn by_id<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<T>().ok())
}

// =============================================================================
// Event channel & scheduler
// =============================================================================

#[derive(Clone)]
pub struct EventSender(UnboundedSender<PageEvent>);

impl EventSender {
    pub fn send(&self, event: PageEvent) {
        if self.0.unbounded_send(event).is_err() {
            log::debug!("event loop closed, dropping event");
        }
    }
}

/// Slot timers on `setTimeout`. Dropping a `Timeout` clears it.
/// An entry stays until its expiry is claimed, so a fired-but-queued ticket can still
/// be superseded by a later schedule.
pub struct BrowserScheduler {
    timers: HashMap<TimerSlot, (u64, Timeout)>,
    generation: u64,
    events: EventSender,
}

impl BrowserScheduler {
    pub fn new(events: EventSender) -> Self {
        BrowserScheduler {
            timers: HashMap::new(),
            generation: 0,
            events,
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&mut self, slot: TimerSlot, delay: Millis) {
        self.generation += 1;
        let ticket = TimerTicket {
            slot,
            generation: self.generation,
        };
        let events = self.events.clone();
        let delay = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        let timeout = Timeout::new(delay, move || events.send(PageEvent::TimerFired(ticket)));
        self.timers.insert(slot, (ticket.generation, timeout));
    }

    fn cancel(&mut self, slot: TimerSlot) {
        self.timers.remove(&slot);
    }

    fn claim(&mut self, ticket: TimerTicket) -> bool {
        match self.timers.get(&ticket.slot) {
            Some((generation, _)) if *generation == ticket.generation => {
                self.timers.remove(&ticket.slot);
                true
            }
            _ => false,
        }
    }
}

// =============================================================================
// Environment, styles, analytics, notices
// =============================================================================

pub struct BrowserEnvironment {
    window: Window,
    document: Document,
}

impl PageEnvironment for BrowserEnvironment {
    fn now(&self) -> Millis {
        Millis::from_f64(js_sys::Date::now())
    }

    fn iso_timestamp(&self) -> String {
        String::from(js_sys::Date::new_0().to_iso_string())
    }

    fn user_agent(&self) -> String {
        self.window.navigator().user_agent().unwrap_or_default()
    }

    fn url(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn window_size(&self) -> (u32, u32) {
        let read = |value: Result<JsValue, JsValue>| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0).max(0.0) as u32
        };
        (read(self.window.inner_width()), read(self.window.inner_height()))
    }

    fn scroll_position(&self) -> ScrollPosition {
        let viewport_height = self
            .window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        ScrollPosition {
            scroll_y: self.window.scroll_y().unwrap_or(0.0),
            document_height: self
                .document
                .body()
                .map(|body| body.scroll_height() as f64)
                .unwrap_or(viewport_height),
            viewport_height,
        }
    }
}

pub struct DomStyleTarget(HtmlElement);

impl StyleTarget for DomStyleTarget {
    fn set_style(&self, property: &str, value: &str) {
        if let Err(err) = self.0.style().set_property(property, value) {
            log::debug!("style {} rejected: {}", property, js_error_message(&err));
        }
    }
}

fn resolve_role(document: &Document, role: Role) -> Vec<Box<dyn StyleTarget>> {
    if role == Role::Root {
        return document
            .document_element()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .map(|el| vec![Box::new(DomStyleTarget(el)) as Box<dyn StyleTarget>])
            .unwrap_or_default();
    }

    let Ok(nodes) = document.query_selector_all(role.selector()) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .map(|el| Box::new(DomStyleTarget(el)) as Box<dyn StyleTarget>)
        .collect()
}

/// Forwards events to `gtag` and `fbq` when the page loaded them.
pub struct GlobalAnalytics;

impl AnalyticsSink for GlobalAnalytics {
    fn track(&self, event: &AnalyticsEvent) {
        let properties = serde_json::to_string(&event.properties)
            .ok()
            .and_then(|json| JSON::parse(&json).ok())
            .unwrap_or(JsValue::UNDEFINED);
        let name = JsValue::from_str(event.name.as_str());

        for (global, verb) in [("gtag", "event"), ("fbq", "track")] {
            let Some(func) = Reflect::get(&js_sys::global(), &JsValue::from_str(global))
                .ok()
                .and_then(|f| f.dyn_into::<Function>().ok())
            else {
                continue;
            };
            let verb = JsValue::from_str(verb);
            if let Err(err) = func.call3(&JsValue::NULL, &verb, &name, &properties) {
                log::debug!("{} failed: {}", global, js_error_message(&err));
            }
        }
    }
}

pub struct BannerNotice {
    document: Document,
}

impl NoticeSurface for BannerNotice {
    fn show_banner(&self, text: &str) {
        self.hide_banner();
        let Ok(banner) = self.document.create_element("div") else {
            return;
        };
        banner.set_id(BANNER_ID);
        banner.set_text_content(Some(text));
        let _ = banner.set_attribute(
            "style",
            "position: fixed; top: 20px; right: 20px; background-color: greenyellow; \
             color: black; padding: 1.2rem; border-radius: 0.5rem; z-index: 9999; \
             font-family: 'Sora', sans-serif;",
        );
        if let Some(body) = self.document.body() {
            let _ = body.append_child(&banner);
        }
    }

    fn hide_banner(&self) {
        if let Some(existing) = self.document.get_element_by_id(BANNER_ID) {
            existing.remove();
        }
    }
}

// =============================================================================
// Media
// =============================================================================

pub struct DomMedia {
    document: Document,
    video: HtmlMediaElement,
    container: Option<Element>,
    events: EventSender,
}

impl MediaSurface for DomMedia {
    fn play(&self) {
        let events = self.events.clone();
        match self.video.play() {
            Ok(promise) => spawn_local(async move {
                match JsFuture::from(promise).await {
                    Ok(_) => events.send(PageEvent::Media(MediaSignal::Playing)),
                    Err(err) => events.send(PageEvent::Media(MediaSignal::PlayRejected(
                        js_error_message(&err),
                    ))),
                }
            }),
            Err(err) => events.send(PageEvent::Media(MediaSignal::PlayRejected(
                js_error_message(&err),
            ))),
        }
    }

    fn pause(&self) {
        let _ = self.video.pause();
    }

    fn reload(&self) {
        self.video.load();
    }

    fn mark_loaded(&self) {
        let _ = self.video.class_list().add_1("loaded");
    }

    fn hide(&self) {
        let _ = self.video.style().set_property("display", "none");
    }

    fn insert_fallback(&self, visual: &FallbackVisual) {
        let Some(container) = &self.container else {
            log::warn!("video container missing, fallback not inserted");
            return;
        };
        let (Ok(wrapper), Ok(img)) = (
            self.document.create_element("div"),
            self.document.create_element("img"),
        ) else {
            return;
        };
        wrapper.set_class_name("video-fallback");
        let _ = wrapper.set_attribute(
            "style",
            "position: absolute; top: 0; left: 0; width: 100%; height: 100%; \
             display: flex; align-items: center; justify-content: center;",
        );
        if let Ok(img) = img.dyn_into::<HtmlImageElement>() {
            img.set_src(&visual.image_src);
            img.set_alt(&visual.alt);
            let _ = img.set_attribute(
                "style",
                "width: 100%; height: 100%; object-fit: cover; object-position: center; \
                 opacity: 0.8;",
            );
            let _ = img.set_attribute("onerror", "this.style.display='none';");
            let _ = wrapper.append_child(&img);
        }
        let _ = container.append_child(&wrapper);
    }
}

fn media_error_message(video: &HtmlMediaElement) -> Option<String> {
    let error = Reflect::get(video, &JsValue::from_str("error")).ok()?;
    if error.is_null() || error.is_undefined() {
        return None;
    }
    Reflect::get(&error, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .filter(|m| !m.is_empty())
}

// =============================================================================
// Forms
// =============================================================================

fn apply_button(button: &HtmlButtonElement, view: &ButtonView) {
    button.set_text_content(Some(&view.label));
    button.set_disabled(view.disabled);
    let classes = button.class_list();
    let _ = classes.remove_3("loading", "success", "error");
    if let Some(class) = view.tone.class() {
        let _ = classes.add_1(class);
    }
}

pub struct DomEmailForm {
    document: Document,
    input: HtmlInputElement,
    button: HtmlButtonElement,
}

impl DomEmailForm {
    fn set_live_region(&self, text: &str) {
        if let Some(region) = self.document.get_element_by_id(LIVE_REGION_ID) {
            region.set_text_content(Some(text));
        }
    }
}

impl FormSurface for DomEmailForm {
    fn email_value(&self) -> String {
        self.input.value()
    }

    fn set_email_value(&self, value: &str) {
        self.input.set_value(value);
    }

    fn set_validity(&self, validity: EmailValidity) {
        let classes = self.input.class_list();
        let _ = classes.remove_2("valid", "invalid");
        match validity {
            EmailValidity::Valid => {
                let _ = classes.add_1("valid");
            }
            EmailValidity::Invalid => {
                let _ = classes.add_1("invalid");
            }
            EmailValidity::Empty => {}
        }
    }

    fn set_button(&self, view: &ButtonView) {
        apply_button(&self.button, view);
    }

    fn show_message(&self, kind: MessageKind, text: &str) {
        self.clear_message();
        let (Some(parent), Ok(div)) = (
            self.input.parent_element(),
            self.document.create_element("div"),
        ) else {
            return;
        };
        div.set_class_name(&format!("{}-message", kind.as_str()));
        div.set_text_content(Some(text));
        let _ = div.set_attribute("role", "alert");
        let _ = parent.append_child(&div);
        self.set_live_region(text);
    }

    fn clear_message(&self) {
        let Some(parent) = self.input.parent_element() else {
            return;
        };
        if let Ok(Some(existing)) = parent.query_selector(".error-message, .success-message") {
            existing.remove();
        }
    }

    fn announce(&self, text: &str) {
        self.set_live_region(text);
    }
}

pub struct DomSuggestionForm {
    form: HtmlFormElement,
    message: HtmlTextAreaElement,
    counter: Option<Element>,
    button: HtmlButtonElement,
    status: Option<HtmlElement>,
}

impl DomSuggestionForm {
    fn control(&self, field: SuggestionField) -> Option<HtmlElement> {
        self.form
            .query_selector(&format!("[name=\"{}\"]", field.name()))
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }
}

impl SuggestionSurface for DomSuggestionForm {
    fn fields(&self) -> SuggestionFields {
        let Ok(data) = FormData::new_with_form(&self.form) else {
            return SuggestionFields::default();
        };
        let get = |field: SuggestionField| data.get(field.name()).as_string().unwrap_or_default();
        SuggestionFields {
            name: get(SuggestionField::Name),
            email: get(SuggestionField::Email),
            kind: get(SuggestionField::Kind),
            message: get(SuggestionField::Message),
        }
    }

    fn set_field_error(&self, field: SuggestionField, error: bool) {
        let Some(control) = self.control(field) else {
            return;
        };
        let _ = if error {
            control.class_list().add_1("error")
        } else {
            control.class_list().remove_1("error")
        };
        let color = if error { "#ff0033" } else { "" };
        let _ = control.style().set_property("border-color", color);
    }

    fn set_message_text(&self, text: &str) {
        self.message.set_value(text);
    }

    fn set_counter(&self, count: usize, level: CounterLevel) {
        let Some(counter) = &self.counter else {
            return;
        };
        counter.set_text_content(Some(&count.to_string()));
        if let Some(parent) = counter.parent_element() {
            let classes = parent.class_list();
            let _ = classes.remove_2("warning", "danger");
            match level {
                CounterLevel::Normal => {}
                CounterLevel::Warning => {
                    let _ = classes.add_1("warning");
                }
                CounterLevel::Danger => {
                    let _ = classes.add_2("warning", "danger");
                }
            }
        }
    }

    fn set_button(&self, view: &ButtonView) {
        apply_button(&self.button, view);
    }

    fn show_status(&self, kind: MessageKind, text: &str) {
        if let Some(status) = &self.status {
            status.set_text_content(Some(text));
            status.set_class_name(&format!("status-message {}", kind.as_str()));
            let _ = status.style().set_property("display", "block");
        }
    }

    fn hide_status(&self) {
        if let Some(status) = &self.status {
            let _ = status.style().set_property("display", "none");
        }
    }

    fn reset(&self) {
        self.form.reset();
    }
}

// =============================================================================
// Submission service
// =============================================================================

/// `window.firebaseManager`, the page's managed backend.
pub struct FirebaseService;

impl FirebaseService {
    async fn call(&self, method: &str, arg: &JsValue) -> Result<SubmissionResponse, LandingError> {
        let manager = Reflect::get(&js_sys::global(), &JsValue::from_str("firebaseManager"))
            .ok()
            .filter(|m| !m.is_undefined() && !m.is_null())
            .ok_or_else(|| {
                LandingError::ServiceUnavailable(
                    "Firebase not initialized. Please refresh the page.".to_string(),
                )
            })?;
        let func = Reflect::get(&manager, &JsValue::from_str(method))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| {
                LandingError::ServiceUnavailable(format!("{} is not available", method))
            })?;

        let returned = func
            .call1(&manager, arg)
            .map_err(|e| LandingError::SubmissionFailed(js_error_message(&e)))?;
        let value = JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(|e| LandingError::SubmissionFailed(js_error_message(&e)))?;
        let json = JSON::stringify(&value)
            .map_err(|e| LandingError::Serialization(js_error_message(&e)))?;
        SubmissionResponse::from_json(&String::from(json))
    }
}

impl SubmissionService for FirebaseService {
    async fn submit_email(&self, email: &str) -> Result<SubmissionResponse, LandingError> {
        log::debug!("submitting email to firebaseManager");
        self.call("submitEmail", &JsValue::from_str(email)).await
    }

    async fn submit_suggestion(
        &self,
        payload: &SuggestionPayload,
    ) -> Result<SubmissionResponse, LandingError> {
        let json = serde_json::to_string(payload)?;
        let arg =
            JSON::parse(&json).map_err(|e| LandingError::Serialization(js_error_message(&e)))?;
        self.call("submitSuggestion", &arg).await
    }
}

fn service_present() -> bool {
    Reflect::get(&js_sys::global(), &JsValue::from_str("firebaseManager"))
        .map(|m| !m.is_undefined() && !m.is_null())
        .unwrap_or(false)
}

// =============================================================================
// Wiring
// =============================================================================

/// Attach a page-lifetime listener that maps the DOM event to a `PageEvent`.
fn listen<E, F>(target: &EventTarget, kind: &str, mut handler: F) -> Result<(), LandingError>
where
    E: JsCast + 'static,
    F: FnMut(E) + 'static,
{
    let closure = Closure::wrap(Box::new(move |event: Event| {
        if let Ok(event) = event.dyn_into::<E>() {
            handler(event);
        }
    }) as Box<dyn FnMut(Event)>);
    target
        .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
        .map_err(|e| dom_error(kind, &js_error_message(&e)))?;
    closure.forget();
    Ok(())
}

fn forward(
    target: &EventTarget,
    kind: &str,
    events: &EventSender,
    event: PageEvent,
) -> Result<(), LandingError> {
    let events = events.clone();
    listen(target, kind, move |_: Event| events.send(event.clone()))
}

/// Handle the `LandingPage` wrapper keeps to talk to the running app.
pub struct PageRuntime {
    app: Rc<RefCell<LandingApp>>,
    events: EventSender,
}

impl PageRuntime {
    pub fn send(&self, event: PageEvent) {
        self.events.send(event);
    }

    pub fn current_metrics(&self) -> ViewportMetrics {
        match self.app.try_borrow() {
            Ok(app) => app.current_metrics(),
            Err(_) => web_sys::window()
                .and_then(|window| window.document().map(|document| (window, document)))
                .map(|(window, document)| {
                    BrowserEnvironment { window, document }.viewport_metrics()
                })
                .unwrap_or_else(|| ViewportMetrics::from_dimensions(0, 0)),
        }
    }
}

/// Build the app against the live document, wire every listener and start the loop.
pub fn start(config: LandingConfig) -> Result<PageRuntime, LandingError> {
    let window = web_sys::window().ok_or_else(|| dom_error("window", "no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| dom_error("document", "window has no document"))?;

    let (sender, mut receiver) = mpsc::unbounded::<PageEvent>();
    let events = EventSender(sender);

    let video: Option<HtmlMediaElement> = by_id(&document, VIDEO_ID);
    let email_input: Option<HtmlInputElement> = by_id(&document, EMAIL_INPUT_ID);
    let email_button: Option<HtmlButtonElement> = by_id(&document, EMAIL_BUTTON_ID);
    let suggestion_form: Option<HtmlFormElement> = by_id(&document, SUGGESTION_FORM_ID);

    let media = video.clone().map(|video| {
        Box::new(DomMedia {
            document: document.clone(),
            video,
            container: document.get_element_by_id(VIDEO_CONTAINER_ID),
            events: events.clone(),
        }) as Box<dyn MediaSurface>
    });

    let form = match (&email_input, &email_button) {
        (Some(input), Some(button)) => Some(Box::new(DomEmailForm {
            document: document.clone(),
            input: input.clone(),
            button: button.clone(),
        }) as Box<dyn FormSurface>),
        _ => None,
    };

    let suggestion = match (
        &suggestion_form,
        by_id::<HtmlTextAreaElement>(&document, SUGGESTION_MESSAGE_ID),
        by_id::<HtmlButtonElement>(&document, SUGGESTION_BUTTON_ID),
    ) {
        (Some(form), Some(message), Some(button)) => {
            let label = button.text_content().unwrap_or_default();
            let surface = DomSuggestionForm {
                form: form.clone(),
                message,
                counter: document.get_element_by_id(CHAR_COUNT_ID),
                button,
                status: by_id(&document, SUGGESTION_STATUS_ID),
            };
            Some((Box::new(surface) as Box<dyn SuggestionSurface>, label.trim().to_string()))
        }
        _ => None,
    };

    let styles = StyleTargetRegistry::lookup(|role| resolve_role(&document, role));
    let readiness_event = config.readiness_event.clone();
    let threshold = config.intersection_threshold;

    let bindings = PageBindings {
        env: Box::new(BrowserEnvironment {
            window: window.clone(),
            document: document.clone(),
        }),
        scheduler: Box::new(BrowserScheduler::new(events.clone())),
        analytics: Box::new(GlobalAnalytics),
        notice: Box::new(BannerNotice {
            document: document.clone(),
        }),
        styles,
        media,
        form,
        suggestion,
    };
    let app = Rc::new(RefCell::new(LandingApp::new(config, bindings)));

    // Window & document lifecycle.
    let win: &EventTarget = window.as_ref();
    let doc: &EventTarget = document.as_ref();
    forward(win, "load", &events, PageEvent::Load)?;
    forward(win, "resize", &events, PageEvent::Resize)?;
    forward(win, "orientationchange", &events, PageEvent::OrientationChange)?;
    forward(win, "beforeunload", &events, PageEvent::Unload)?;
    {
        let events = events.clone();
        let document = document.clone();
        listen(doc, "visibilitychange", move |_: Event| {
            events.send(PageEvent::VisibilityChange {
                hidden: document.hidden(),
            })
        })?;
    }
    {
        let events = events.clone();
        let closure = Closure::wrap(Box::new(move |_: Event| {
            events.send(PageEvent::Scroll)
        }) as Box<dyn FnMut(Event)>);
        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        win.add_event_listener_with_callback_and_add_event_listener_options(
            "scroll",
            closure.as_ref().unchecked_ref(),
            &options,
        )
        .map_err(|e| dom_error("scroll", &js_error_message(&e)))?;
        closure.forget();
    }
    {
        let events = events.clone();
        listen(win, "error", move |event: ErrorEvent| {
            let stack = Reflect::get(&event.error(), &JsValue::from_str("stack"))
                .ok()
                .and_then(|s| s.as_string());
            events.send(PageEvent::UncaughtError {
                message: event.message(),
                stack,
            })
        })?;
    }
    {
        let events = events.clone();
        listen(win, "unhandledrejection", move |event: PromiseRejectionEvent| {
            events.send(PageEvent::UncaughtError {
                message: js_error_message(&event.reason()),
                stack: None,
            })
        })?;
    }

    // Readiness of the submission service.
    if service_present() {
        events.send(PageEvent::ServiceReady);
    } else {
        forward(win, &readiness_event, &events, PageEvent::ServiceReady)?;
    }

    // Hero video.
    if let Some(video) = &video {
        let target: &EventTarget = video.as_ref();
        forward(target, "canplay", &events, PageEvent::Media(MediaSignal::CanPlay))?;
        forward(target, "loadeddata", &events, PageEvent::Media(MediaSignal::LoadedData))?;
        {
            let events = events.clone();
            let element = video.clone();
            listen(target, "error", move |_: Event| {
                events.send(PageEvent::Media(MediaSignal::Error(media_error_message(
                    &element,
                ))))
            })?;
        }
        observe_visibility(video, threshold, &events)?;
    }

    // Email capture.
    if let (Some(input), Some(button)) = (&email_input, &email_button) {
        let input_target: &EventTarget = input.as_ref();
        forward(input_target, "input", &events, PageEvent::EmailInput)?;
        forward(input_target, "blur", &events, PageEvent::EmailBlur)?;
        {
            let events = events.clone();
            listen(input_target, "keypress", move |event: KeyboardEvent| {
                if event.key() == "Enter" {
                    event.prevent_default();
                    events.send(PageEvent::EmailSubmit);
                }
            })?;
        }
        {
            let events = events.clone();
            listen(button.as_ref(), "click", move |event: Event| {
                event.prevent_default();
                events.send(PageEvent::EmailSubmit);
            })?;
        }
        if let Ok(Some(form)) = input.closest("form") {
            let events = events.clone();
            listen(form.as_ref(), "submit", move |event: Event| {
                event.prevent_default();
                events.send(PageEvent::EmailSubmit);
            })?;
        }
        {
            let events = events.clone();
            let document = document.clone();
            let input = input.clone();
            listen(doc, "keydown", move |event: KeyboardEvent| {
                let focused = document
                    .active_element()
                    .map(|active| active.is_same_node(Some(input.as_ref())))
                    .unwrap_or(false);
                if event.key() == "Escape" && focused {
                    events.send(PageEvent::EmailEscape);
                }
            })?;
        }
    }

    // Suggestion form.
    if let Some(form) = &suggestion_form {
        {
            let events = events.clone();
            listen(form.as_ref(), "submit", move |event: Event| {
                event.prevent_default();
                events.send(PageEvent::SuggestionSubmit);
            })?;
        }
        for field in SuggestionField::ALL {
            let Ok(Some(control)) = form.query_selector(&format!("[name=\"{}\"]", field.name()))
            else {
                continue;
            };
            let target: &EventTarget = control.as_ref();
            forward(target, "blur", &events, PageEvent::SuggestionBlur(field))?;
            forward(target, "input", &events, PageEvent::SuggestionInput(field))?;
        }
    }

    // DOM readiness last, so every listener is in place before the first dispatch.
    if document.ready_state() == "loading" {
        forward(doc, "DOMContentLoaded", &events, PageEvent::DomReady)?;
    } else {
        events.send(PageEvent::DomReady);
    }

    let service = Rc::new(FirebaseService);
    {
        let app = app.clone();
        let events = events.clone();
        spawn_local(async move {
            while let Some(event) = receiver.next().await {
                let jobs = app.borrow_mut().dispatch(event);
                for job in jobs {
                    spawn_job(job, &app, &service, &events);
                }
            }
        });
    }

    log::info!("landing runtime started");
    Ok(PageRuntime { app, events })
}

fn spawn_job(
    job: SubmissionJob,
    app: &Rc<RefCell<LandingApp>>,
    service: &Rc<FirebaseService>,
    events: &EventSender,
) {
    let gate = app.borrow().gate();
    let service = service.clone();
    let events = events.clone();
    spawn_local(async move {
        let outcome = run_job(service.as_ref(), &gate, job).await;
        events.send(PageEvent::Submission(outcome));
    });
}

fn observe_visibility(
    video: &HtmlMediaElement,
    threshold: f64,
    events: &EventSender,
) -> Result<(), LandingError> {
    let events = events.clone();
    let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, _: IntersectionObserver| {
        for entry in entries.iter() {
            if let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() {
                events.send(PageEvent::Intersection(IntersectionSample {
                    is_intersecting: entry.is_intersecting(),
                    ratio: entry.intersection_ratio(),
                }));
            }
        }
    }) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

    let init = IntersectionObserverInit::new();
    init.set_threshold(&JsValue::from_f64(threshold));
    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
            .map_err(|e| dom_error("IntersectionObserver", &js_error_message(&e)))?;
    observer.observe(video.as_ref());
    callback.forget();
    Ok(())
}
