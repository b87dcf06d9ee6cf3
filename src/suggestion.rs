// Suggestion form: required fields, message counter and submission lifecycle.
// See DESIGN.md: Suggestion Form

use serde::{Deserialize, Serialize};

use crate::analytics::{emit, AnalyticsEvent, EventName};
use crate::error::LandingError;
use crate::form::{is_valid_email, ButtonTone, ButtonView, FormContext, MessageKind};
use crate::scheduler::TimerSlot;
use crate::types::{LandingConfig, Millis};

pub const MAX_MESSAGE_CHARS: usize = 500;

pub const SENDING: &str = "Sending...";
pub const SENT: &str = "Sent Successfully!";
pub const TRY_AGAIN: &str = "Try Again";

pub const THANKS_STATUS: &str = "Thank you for your suggestion! We appreciate your feedback.";
pub const FAILED_STATUS: &str =
    "Sorry, there was an error sending your suggestion. Please try again.";
pub const INCOMPLETE_STATUS: &str = "Please fill in all required fields correctly.";

const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuggestionField {
    Name,
    Email,
    Kind,
    Message,
}

impl SuggestionField {
    pub const ALL: [SuggestionField; 4] = [
        SuggestionField::Name,
        SuggestionField::Email,
        SuggestionField::Kind,
        SuggestionField::Message,
    ];

    /// Form control name.
    pub fn name(&self) -> &'static str {
        match self {
            SuggestionField::Name => "name",
            SuggestionField::Email => "email",
            SuggestionField::Kind => "type",
            SuggestionField::Message => "message",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, SuggestionField::Kind | SuggestionField::Message)
    }
}

/// Raw control values as read from the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionFields {
    pub name: String,
    pub email: String,
    pub kind: String,
    pub message: String,
}

impl SuggestionFields {
    pub fn get(&self, field: SuggestionField) -> &str {
        match field {
            SuggestionField::Name => &self.name,
            SuggestionField::Email => &self.email,
            SuggestionField::Kind => &self.kind,
            SuggestionField::Message => &self.message,
        }
    }
}

pub fn validate_field(field: SuggestionField, raw: &str) -> bool {
    let value = raw.trim();
    if field.is_required() && value.is_empty() {
        return false;
    }
    if field == SuggestionField::Email && !value.is_empty() {
        return is_valid_email(value);
    }
    true
}

/// Body sent to the submission service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionPayload {
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub timestamp: String,
    pub user_agent: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterLevel {
    Normal,
    /// Above 80% of the limit.
    Warning,
    /// At the limit.
    Danger,
}

impl CounterLevel {
    pub fn class(&self) -> Option<&'static str> {
        match self {
            CounterLevel::Normal => None,
            CounterLevel::Warning => Some("warning"),
            CounterLevel::Danger => Some("danger"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterReading {
    pub count: usize,
    pub level: CounterLevel,
    /// Replacement text when the message ran over the limit.
    pub truncated: Option<String>,
}

/// Counts UTF-16 units, the way the browser measures `value.length`.
pub fn measure_message(message: &str) -> CounterReading {
    let count = message.encode_utf16().count();

    if count > MAX_MESSAGE_CHARS {
        let mut units = 0;
        let truncated: String = message
            .chars()
            .take_while(|c| {
                units += c.len_utf16();
                units <= MAX_MESSAGE_CHARS
            })
            .collect();
        return CounterReading {
            count: truncated.encode_utf16().count(),
            level: CounterLevel::Danger,
            truncated: Some(truncated),
        };
    }

    let level = if count >= MAX_MESSAGE_CHARS {
        CounterLevel::Danger
    } else if count * 5 > MAX_MESSAGE_CHARS * 4 {
        CounterLevel::Warning
    } else {
        CounterLevel::Normal
    };
    CounterReading {
        count,
        level,
        truncated: None,
    }
}

pub trait SuggestionSurface {
    fn fields(&self) -> SuggestionFields;
    fn set_field_error(&self, field: SuggestionField, error: bool);
    fn set_message_text(&self, text: &str);
    fn set_counter(&self, count: usize, level: CounterLevel);
    fn set_button(&self, view: &ButtonView);
    fn show_status(&self, kind: MessageKind, text: &str);
    fn hide_status(&self);
    /// Clear every control.
    fn reset(&self);
}

#[derive(Debug, Clone)]
pub struct SuggestionForm {
    idle_label: String,
    cooldown: bool,
    in_flight: Option<SuggestionPayload>,
    button_revert: Millis,
    submit_cooldown: Millis,
    notice: Millis,
}

impl SuggestionForm {
    /// `idle_label` is the button text restored after each submission.
    pub fn new(idle_label: &str, config: &LandingConfig) -> Self {
        SuggestionForm {
            idle_label: idle_label.to_string(),
            cooldown: false,
            in_flight: None,
            button_revert: config.button_revert(),
            submit_cooldown: config.submit_cooldown(),
            notice: config.notice(),
        }
    }

    pub fn in_cooldown(&self) -> bool {
        self.cooldown
    }

    pub fn on_blur(&self, field: SuggestionField, surface: &dyn SuggestionSurface) -> bool {
        let ok = validate_field(field, surface.fields().get(field));
        surface.set_field_error(field, !ok);
        ok
    }

    /// Typing clears the field's error; message edits also refresh the counter.
    pub fn on_input(&self, field: SuggestionField, surface: &dyn SuggestionSurface) {
        surface.set_field_error(field, false);
        if field == SuggestionField::Message {
            self.update_counter(surface);
        }
    }

    pub fn update_counter(&self, surface: &dyn SuggestionSurface) -> CounterReading {
        let reading = measure_message(&surface.fields().message);
        if let Some(text) = &reading.truncated {
            surface.set_message_text(text);
        }
        surface.set_counter(reading.count, reading.level);
        reading
    }

    pub fn submit(
        &mut self,
        surface: &dyn SuggestionSurface,
        ctx: &mut FormContext<'_>,
    ) -> Option<SuggestionPayload> {
        if self.cooldown || self.in_flight.is_some() {
            return None;
        }

        let fields = surface.fields();
        let mut valid = true;
        for field in SuggestionField::ALL {
            let ok = validate_field(field, fields.get(field));
            surface.set_field_error(field, !ok);
            valid &= ok;
        }
        if !valid {
            surface.show_status(MessageKind::Error, INCOMPLETE_STATUS);
            return None;
        }

        self.cooldown = true;
        surface.set_button(&ButtonView::new(SENDING, true, ButtonTone::Loading));
        surface.hide_status();

        let name = fields.name.trim();
        let payload = SuggestionPayload {
            name: if name.is_empty() { ANONYMOUS.to_string() } else { name.to_string() },
            email: fields.email.trim().to_string(),
            kind: fields.kind.trim().to_string(),
            message: fields.message.trim().to_string(),
            timestamp: ctx.env.iso_timestamp(),
            user_agent: ctx.env.user_agent(),
            url: ctx.env.url(),
        };
        self.in_flight = Some(payload.clone());
        log::info!("submitting suggestion ({})", payload.kind);

        Some(payload)
    }

    pub fn on_result(
        &mut self,
        result: Result<(), LandingError>,
        surface: &dyn SuggestionSurface,
        ctx: &mut FormContext<'_>,
    ) {
        let Some(payload) = self.in_flight.take() else {
            log::warn!("suggestion result without a pending request");
            return;
        };

        match result {
            Ok(()) => {
                surface.show_status(MessageKind::Success, THANKS_STATUS);
                ctx.scheduler.schedule(TimerSlot::SuggestionStatus, self.notice);
                surface.set_button(&ButtonView::new(SENT, true, ButtonTone::Success));
                surface.reset();
                self.update_counter(surface);

                emit(
                    ctx.analytics,
                    AnalyticsEvent::new(EventName::SuggestionSubmitted)
                        .with("event_category", "suggestions")
                        .with("event_label", payload.kind),
                );
            }
            Err(err) => {
                log::error!("suggestion submission error: {}", err);
                surface.show_status(MessageKind::Error, FAILED_STATUS);
                surface.set_button(&ButtonView::new(TRY_AGAIN, true, ButtonTone::Error));
            }
        }

        ctx.scheduler.schedule(TimerSlot::SuggestionRevert, self.button_revert);
        ctx.scheduler.schedule(TimerSlot::SuggestionCooldown, self.submit_cooldown);
    }

    pub fn on_timer(&mut self, slot: TimerSlot, surface: &dyn SuggestionSurface) -> bool {
        match slot {
            TimerSlot::SuggestionRevert => {
                surface.set_button(&ButtonView::new(&self.idle_label, false, ButtonTone::Idle));
            }
            TimerSlot::SuggestionCooldown => self.cooldown = false,
            TimerSlot::SuggestionStatus => surface.hide_status(),
            _ => return false,
        }
        true
    }
}
