/// Notification emitted when the countdown runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Expired,
}

/// One-second countdown for timed sessions.
///
/// The timer does not own a thread; the event loop feeds it the current time
/// through [`CountdownTimer::advance`] and it applies one tick per elapsed
/// whole second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTimer {
    limit_secs: u64,
    remaining_secs: u64,
    running: bool,
    started: bool,
    next_tick_at_ms: u64,
}

impl CountdownTimer {
    pub fn new(limit_secs: u64) -> Self {
        Self {
            limit_secs,
            remaining_secs: limit_secs,
            running: false,
            started: false,
            next_tick_at_ms: 0,
        }
    }

    /// Begin counting down. Only the first call after `new`/`reset` has any effect.
    pub fn start(&mut self, now_ms: u64) {
        if self.started {
            return;
        }
        self.started = true;
        self.running = self.remaining_secs > 0;
        self.next_tick_at_ms = now_ms + 1000;
        tracing::debug!(limit_secs = self.limit_secs, "countdown started");
    }

    /// Apply a single one-second tick.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.stop();
            tracing::info!("countdown expired");
            return Some(TimerEvent::Expired);
        }
        None
    }

    /// Apply every tick that falls due at or before `now_ms`.
    pub fn advance(&mut self, now_ms: u64) -> Option<TimerEvent> {
        while self.running && now_ms >= self.next_tick_at_ms {
            self.next_tick_at_ms += 1000;
            if let Some(event) = self.tick() {
                return Some(event);
            }
        }
        None
    }

    /// Halt the countdown. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self, limit_secs: u64) {
        *self = Self::new(limit_secs);
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn limit_secs(&self) -> u64 {
        self.limit_secs
    }
}
