// Timer slots, debounce and throttle.
// A slot holds at most one pending timer; scheduling into it replaces whatever was there.
// See DESIGN.md: Scheduler

use crate::types::Millis;

/// Logical identity of every timer the controller can arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerSlot {
    /// One-shot media load deadline.
    LoadFallback,
    /// Backoff before reloading the media after a failure.
    MediaReload,
    ResizeLayout,
    OrientationLayout,
    /// Re-layout once the document becomes visible again.
    VisibilityLayout,
    ButtonRevert,
    SubmitCooldown,
    FormNotice,
    SuggestionRevert,
    SuggestionCooldown,
    SuggestionStatus,
    ErrorBanner,
}

/// One armed timer: its slot plus the generation it was scheduled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerTicket {
    pub slot: TimerSlot,
    pub generation: u64,
}

/// Arms and cancels slot timers. Expiry comes back as `PageEvent::TimerFired(ticket)`.
pub trait Scheduler {
    /// Arm `slot` to fire after `delay`, cancelling any timer already pending there.
    fn schedule(&mut self, slot: TimerSlot, delay: Millis);
    /// Cancel the pending timer in `slot`, if any.
    fn cancel(&mut self, slot: TimerSlot);
    /// Accept an expiry. `false` if the slot was rescheduled or cancelled after `ticket`
    /// was issued, or the ticket was already claimed.
    fn claim(&mut self, ticket: TimerTicket) -> bool;
}

/// Collapses a burst of triggers into one run, `delay` after the last trigger.
#[derive(Debug, Clone)]
pub struct Debouncer {
    slot: TimerSlot,
    delay: Millis,
    pending: bool,
}

impl Debouncer {
    pub fn new(slot: TimerSlot, delay: Millis) -> Self {
        Debouncer {
            slot,
            delay,
            pending: false,
        }
    }

    pub fn slot(&self) -> TimerSlot {
        self.slot
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Restart the window; the previously scheduled run is cancelled.
    pub fn trigger(&mut self, scheduler: &mut dyn Scheduler) {
        scheduler.schedule(self.slot, self.delay);
        self.pending = true;
    }

    /// Timer expiry. Returns `true` exactly once per settled burst.
    pub fn fire(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }

    pub fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
        if self.pending {
            scheduler.cancel(self.slot);
            self.pending = false;
        }
    }
}

/// Leading-edge throttle: runs at most once per `limit`, dropping calls in between.
#[derive(Debug, Clone)]
pub struct Throttle {
    limit: Millis,
    last_run: Option<Millis>,
}

impl Throttle {
    pub fn new(limit: Millis) -> Self {
        Throttle {
            limit,
            last_run: None,
        }
    }

    pub fn allow(&mut self, now: Millis) -> bool {
        match self.last_run {
            Some(last) if now.saturating_sub(last) < self.limit => false,
            _ => {
                self.last_run = Some(now);
                true
            }
        }
    }
}
