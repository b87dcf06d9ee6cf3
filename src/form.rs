// Email capture form.
// Live validation drives the submit button; a submission locks the form until its result
// arrives, then the button reverts after a delay and a short cooldown blocks resubmits.
// See DESIGN.md: Email Capture Form

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analytics::{emit, hash_email, AnalyticsEvent, AnalyticsSink, EventName};
use crate::error::LandingError;
use crate::scheduler::{Scheduler, TimerSlot};
use crate::types::{LandingConfig, Millis};
use crate::viewport::PageEnvironment;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

pub const REQUEST_ACCESS: &str = "Request Access";
pub const INVALID_EMAIL: &str = "Invalid Email";
pub const REQUESTING: &str = "Requesting...";
pub const ACCESS_REQUESTED: &str = "Access Requested!";
pub const TRY_AGAIN: &str = "Try Again";

pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const SUBMIT_FAILED_MESSAGE: &str = "Something went wrong. Please try again.";
pub const SUCCESS_MESSAGE: &str = "ACCESS REQUEST VERIFIED.";
pub const SUBMITTING_ANNOUNCEMENT: &str = "Submitting email request...";
pub const SUCCESS_ANNOUNCEMENT: &str = "Access requested successfully!";

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailValidity {
    Empty,
    Valid,
    Invalid,
}

impl EmailValidity {
    /// Classify raw input; surrounding whitespace is ignored.
    pub fn of(raw: &str) -> Self {
        let email = raw.trim();
        if email.is_empty() {
            EmailValidity::Empty
        } else if is_valid_email(email) {
            EmailValidity::Valid
        } else {
            EmailValidity::Invalid
        }
    }
}

/// Visual tone of a submit button (maps to a CSS class).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonTone {
    Idle,
    Loading,
    Success,
    Error,
}

impl ButtonTone {
    pub fn class(&self) -> Option<&'static str> {
        match self {
            ButtonTone::Idle => None,
            ButtonTone::Loading => Some("loading"),
            ButtonTone::Success => Some("success"),
            ButtonTone::Error => Some("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub disabled: bool,
    pub tone: ButtonTone,
}

impl ButtonView {
    pub fn new(label: &str, disabled: bool, tone: ButtonTone) -> Self {
        ButtonView {
            label: label.to_string(),
            disabled,
            tone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Success => "success",
            MessageKind::Error => "error",
        }
    }
}

/// The email input, its submit button and the inline message slot next to them.
pub trait FormSurface {
    fn email_value(&self) -> String;
    fn set_email_value(&self, value: &str);
    /// Mark the input `valid`/`invalid`; `Empty` clears both.
    fn set_validity(&self, validity: EmailValidity);
    fn set_button(&self, view: &ButtonView);
    /// Replace the inline message, if any, with `text`.
    fn show_message(&self, kind: MessageKind, text: &str);
    fn clear_message(&self);
    /// Polite live-region announcement for assistive tech.
    fn announce(&self, text: &str);
}

/// Everything a form handler touches besides its own state.
pub struct FormContext<'a> {
    pub scheduler: &'a mut dyn Scheduler,
    pub analytics: &'a dyn AnalyticsSink,
    pub env: &'a dyn PageEnvironment,
}

#[derive(Debug, Clone)]
pub struct EmailCaptureForm {
    cooldown: bool,
    in_flight: Option<String>,
    /// Button shows a submission outcome until the revert timer fires.
    button_locked: bool,
    notice_visible: bool,
    button_revert: Millis,
    submit_cooldown: Millis,
    notice: Millis,
}

impl EmailCaptureForm {
    pub fn new(config: &LandingConfig) -> Self {
        EmailCaptureForm {
            cooldown: false,
            in_flight: None,
            button_locked: false,
            notice_visible: false,
            button_revert: config.button_revert(),
            submit_cooldown: config.submit_cooldown(),
            notice: config.notice(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_cooldown(&self) -> bool {
        self.cooldown
    }

    /// Initial state: empty input, disabled button.
    pub fn reset(&mut self, surface: &dyn FormSurface) {
        self.validate(surface, false);
    }

    /// Live validation on every keystroke, without an inline error.
    pub fn on_input(&mut self, surface: &dyn FormSurface) -> EmailValidity {
        self.validate(surface, false)
    }

    pub fn on_blur(&mut self, surface: &dyn FormSurface) -> EmailValidity {
        self.validate(surface, true)
    }

    /// Escape inside the input clears it.
    pub fn on_escape(&mut self, surface: &dyn FormSurface) {
        surface.set_email_value("");
        self.validate(surface, false);
    }

    pub fn validate(&mut self, surface: &dyn FormSurface, show_error: bool) -> EmailValidity {
        let validity = EmailValidity::of(&surface.email_value());
        surface.set_validity(validity);

        let button = match validity {
            EmailValidity::Empty => ButtonView::new(REQUEST_ACCESS, true, ButtonTone::Idle),
            EmailValidity::Valid => ButtonView::new(REQUEST_ACCESS, false, ButtonTone::Idle),
            EmailValidity::Invalid => ButtonView::new(INVALID_EMAIL, true, ButtonTone::Idle),
        };
        if !self.button_locked {
            surface.set_button(&button);
        }

        match validity {
            EmailValidity::Valid => self.clear_message(surface),
            EmailValidity::Invalid if show_error => {
                self.notice_visible = false;
                surface.show_message(MessageKind::Error, INVALID_EMAIL_MESSAGE);
                surface.announce(INVALID_EMAIL_MESSAGE);
            }
            _ => {}
        }

        validity
    }

    /// Start a submission. Returns the trimmed email to hand to the service, or `None`
    /// when the form is cooling down or the input is not a valid address.
    pub fn submit(
        &mut self,
        surface: &dyn FormSurface,
        ctx: &mut FormContext<'_>,
    ) -> Option<String> {
        if self.cooldown || self.in_flight.is_some() {
            log::debug!("email submit ignored: cooldown active");
            return None;
        }

        if self.validate(surface, true) != EmailValidity::Valid {
            emit(
                ctx.analytics,
                AnalyticsEvent::new(EventName::FormValidationFailed).with("error", "invalid_email"),
            );
            return None;
        }

        let email = surface.email_value().trim().to_string();
        self.cooldown = true;
        self.button_locked = true;
        self.in_flight = Some(email.clone());

        surface.announce(SUBMITTING_ANNOUNCEMENT);
        surface.set_button(&ButtonView::new(REQUESTING, true, ButtonTone::Loading));
        log::info!("submitting email request");

        Some(email)
    }

    /// Outcome of the submission started by `submit`.
    pub fn on_result(
        &mut self,
        result: Result<(), LandingError>,
        surface: &dyn FormSurface,
        ctx: &mut FormContext<'_>,
    ) {
        let Some(email) = self.in_flight.take() else {
            log::warn!("email submission result without a pending request");
            return;
        };

        match result {
            Ok(()) => {
                log::info!("email submission succeeded");
                surface.show_message(MessageKind::Success, SUCCESS_MESSAGE);
                surface.announce(SUCCESS_ANNOUNCEMENT);
                self.notice_visible = true;
                ctx.scheduler.schedule(TimerSlot::FormNotice, self.notice);

                surface.set_button(&ButtonView::new(ACCESS_REQUESTED, true, ButtonTone::Success));
                surface.set_email_value("");
                surface.set_validity(EmailValidity::Empty);

                emit(
                    ctx.analytics,
                    AnalyticsEvent::new(EventName::EmailSubmitted)
                        .with("email", hash_email(&email))
                        .with("timestamp", ctx.env.iso_timestamp()),
                );
            }
            Err(err) => {
                log::error!("email submission error: {}", err);
                self.notice_visible = false;
                surface.show_message(MessageKind::Error, SUBMIT_FAILED_MESSAGE);
                surface.announce(SUBMIT_FAILED_MESSAGE);
                surface.set_button(&ButtonView::new(TRY_AGAIN, true, ButtonTone::Error));

                emit(
                    ctx.analytics,
                    AnalyticsEvent::new(EventName::EmailSubmissionFailed)
                        .with("error", err.to_string())
                        .with("timestamp", ctx.env.iso_timestamp()),
                );
            }
        }

        ctx.scheduler.schedule(TimerSlot::ButtonRevert, self.button_revert);
        ctx.scheduler.schedule(TimerSlot::SubmitCooldown, self.submit_cooldown);
    }

    /// Handle one of this form's timer slots. Returns `false` for foreign slots.
    pub fn on_timer(&mut self, slot: TimerSlot, surface: &dyn FormSurface) -> bool {
        match slot {
            TimerSlot::ButtonRevert => {
                self.button_locked = false;
                surface.set_button(&ButtonView::new(REQUEST_ACCESS, false, ButtonTone::Idle));
            }
            TimerSlot::SubmitCooldown => self.cooldown = false,
            TimerSlot::FormNotice => {
                if self.notice_visible {
                    self.clear_message(surface);
                }
            }
            _ => return false,
        }
        true
    }

    fn clear_message(&mut self, surface: &dyn FormSurface) {
        self.notice_visible = false;
        surface.clear_message();
    }
}
