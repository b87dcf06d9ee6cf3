// Video playback guard: one-shot fallback latch raced against media-ready signals.
// The transition function is pure; VideoPlaybackGuard runs its effects against the page.
// Rule: FallbackShown is absorbing. Nothing after it touches the DOM or analytics.
// See DESIGN.md: Video Playback Guard

use crate::analytics::{emit, AnalyticsEvent, AnalyticsSink, EventName};
use crate::scheduler::{Scheduler, TimerSlot};
use crate::types::{LandingConfig, Millis};

pub const LOAD_TIMEOUT_REASON: &str = "Load timeout";
pub const UNKNOWN_ERROR_REASON: &str = "Unknown error";

/// The media element and its container, as far as the guard is concerned.
pub trait MediaSurface {
    /// Start playback. The outcome comes back as `PlaybackStarted` or `PlayRejected`.
    fn play(&self);
    fn pause(&self);
    /// Re-fetch the media source.
    fn reload(&self);
    /// Flag the element as loaded (CSS fade-in).
    fn mark_loaded(&self);
    fn hide(&self);
    /// Insert the static replacement visual into the media container.
    fn insert_fallback(&self, visual: &FallbackVisual);
}

/// Static replacement shown when the media cannot play.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackVisual {
    pub image_src: String,
    pub alt: String,
}

impl FallbackVisual {
    pub fn from_config(config: &LandingConfig) -> Self {
        FallbackVisual {
            image_src: config.fallback_image.clone(),
            alt: config.fallback_alt.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Idle,
    TimerArmed,
    Resolved,
    FallbackShown,
}

/// Guard state. Owned by exactly one guard per page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoGuardState {
    pub phase: GuardPhase,
    pub load_timer_active: bool,
    /// Reloads scheduled over the page lifetime. Never reset.
    pub reload_attempts: u32,
    pub reload_pending: bool,
    pub media_loaded: bool,
}

impl Default for VideoGuardState {
    fn default() -> Self {
        VideoGuardState {
            phase: GuardPhase::Idle,
            load_timer_active: false,
            reload_attempts: 0,
            reload_pending: false,
            media_loaded: false,
        }
    }
}

impl VideoGuardState {
    pub fn fallback_shown(&self) -> bool {
        self.phase == GuardPhase::FallbackShown
    }
}

/// Signals that the media is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessSignal {
    CanPlay,
    LoadedData,
    /// A play attempt resolved.
    Playing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEvent {
    Setup,
    Success(SuccessSignal),
    /// Media error or rejected play; goes through the reload budget first.
    Failure(String),
    LoadTimerExpired,
    ReloadTimerExpired,
    /// Direct fallback trigger, bypassing the reload budget.
    Fallback(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEffect {
    ArmLoadTimer(Millis),
    CancelLoadTimer,
    ScheduleReload(Millis),
    CancelReload,
    ReloadMedia,
    MarkLoaded,
    ShowFallback { reason: String },
}

/// Timing knobs of the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardPolicy {
    pub load_timeout: Millis,
    pub max_reload_attempts: u32,
    pub reload_backoff: Millis,
}

impl GuardPolicy {
    pub fn from_config(config: &LandingConfig) -> Self {
        GuardPolicy {
            load_timeout: config.load_timeout(),
            max_reload_attempts: config.max_reload_attempts,
            reload_backoff: config.reload_backoff(),
        }
    }
}

impl Default for GuardPolicy {
    fn default() -> Self {
        GuardPolicy::from_config(&LandingConfig::default())
    }
}

/// `(state, event) -> (state', effects)`.
pub fn transition(
    state: &VideoGuardState,
    event: GuardEvent,
    policy: &GuardPolicy,
) -> (VideoGuardState, Vec<GuardEffect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    if state.fallback_shown() {
        return (next, effects);
    }

    match event {
        GuardEvent::Setup => {
            if state.phase == GuardPhase::Idle {
                next.phase = GuardPhase::TimerArmed;
                next.load_timer_active = true;
                effects.push(GuardEffect::ArmLoadTimer(policy.load_timeout));
            }
        }

        GuardEvent::Success(signal) => {
            if next.load_timer_active {
                next.load_timer_active = false;
                effects.push(GuardEffect::CancelLoadTimer);
            }
            if next.reload_pending {
                next.reload_pending = false;
                effects.push(GuardEffect::CancelReload);
            }
            if signal == SuccessSignal::CanPlay && !next.media_loaded {
                next.media_loaded = true;
                effects.push(GuardEffect::MarkLoaded);
            }
            next.phase = GuardPhase::Resolved;
        }

        GuardEvent::Failure(reason) => {
            if next.reload_pending {
                // A reload is already queued; this failure is part of the same attempt.
                return (next, effects);
            }
            if next.reload_attempts < policy.max_reload_attempts {
                next.reload_attempts += 1;
                next.reload_pending = true;
                effects.push(GuardEffect::ScheduleReload(
                    policy.reload_backoff.times(next.reload_attempts),
                ));
            } else {
                latch_fallback(&mut next, &mut effects, reason);
            }
        }

        GuardEvent::ReloadTimerExpired => {
            if next.reload_pending {
                next.reload_pending = false;
                effects.push(GuardEffect::ReloadMedia);
            }
        }

        GuardEvent::LoadTimerExpired => {
            if next.load_timer_active {
                latch_fallback(&mut next, &mut effects, LOAD_TIMEOUT_REASON.to_string());
            }
        }

        GuardEvent::Fallback(reason) => {
            latch_fallback(&mut next, &mut effects, reason);
        }
    }

    (next, effects)
}

fn latch_fallback(state: &mut VideoGuardState, effects: &mut Vec<GuardEffect>, reason: String) {
    if state.load_timer_active {
        state.load_timer_active = false;
        effects.push(GuardEffect::CancelLoadTimer);
    }
    if state.reload_pending {
        state.reload_pending = false;
        effects.push(GuardEffect::CancelReload);
    }
    state.phase = GuardPhase::FallbackShown;
    effects.push(GuardEffect::ShowFallback { reason });
}

/// Collaborators the guard's effects need.
pub struct GuardContext<'a> {
    pub media: &'a dyn MediaSurface,
    pub scheduler: &'a mut dyn Scheduler,
    pub analytics: &'a dyn AnalyticsSink,
}

/// Runs the transition function and applies its effects.
pub struct VideoPlaybackGuard {
    state: VideoGuardState,
    policy: GuardPolicy,
    visual: FallbackVisual,
}

impl VideoPlaybackGuard {
    pub fn new(policy: GuardPolicy, visual: FallbackVisual) -> Self {
        VideoPlaybackGuard {
            state: VideoGuardState::default(),
            policy,
            visual,
        }
    }

    pub fn state(&self) -> &VideoGuardState {
        &self.state
    }

    pub fn fallback_shown(&self) -> bool {
        self.state.fallback_shown()
    }

    pub fn handle(&mut self, event: GuardEvent, ctx: &mut GuardContext<'_>) {
        let before = self.state.phase;
        let (next, effects) = transition(&self.state, event, &self.policy);
        self.state = next;
        if before != self.state.phase {
            log::debug!("video guard {:?} -> {:?}", before, self.state.phase);
        }

        for effect in effects {
            self.run(effect, ctx);
        }
    }

    /// Idempotent fallback trigger.
    pub fn show_fallback(&mut self, reason: &str, ctx: &mut GuardContext<'_>) {
        self.handle(GuardEvent::Fallback(reason.to_string()), ctx);
    }

    fn run(&self, effect: GuardEffect, ctx: &mut GuardContext<'_>) {
        match effect {
            GuardEffect::ArmLoadTimer(delay) => {
                ctx.scheduler.schedule(TimerSlot::LoadFallback, delay);
            }
            GuardEffect::CancelLoadTimer => ctx.scheduler.cancel(TimerSlot::LoadFallback),
            GuardEffect::ScheduleReload(delay) => {
                log::info!(
                    "retrying video load ({}/{}) in {}ms",
                    self.state.reload_attempts,
                    self.policy.max_reload_attempts,
                    delay.as_millis()
                );
                ctx.scheduler.schedule(TimerSlot::MediaReload, delay);
            }
            GuardEffect::CancelReload => ctx.scheduler.cancel(TimerSlot::MediaReload),
            GuardEffect::ReloadMedia => {
                ctx.media.reload();
                ctx.media.play();
            }
            GuardEffect::MarkLoaded => ctx.media.mark_loaded(),
            GuardEffect::ShowFallback { reason } => {
                log::warn!("video unavailable ({}), showing fallback image", reason);
                ctx.media.hide();
                ctx.media.insert_fallback(&self.visual);
                emit(
                    ctx.analytics,
                    AnalyticsEvent::new(EventName::VideoError).with("error", reason),
                );
            }
        }
    }
}
