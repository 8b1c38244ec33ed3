use std::{collections::HashMap, time::Duration};

pub type GameTime = Duration;

/// Periodic triggers. The derived `Ord` is the dispatch priority for triggers due at the same instant.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimerEvent {
    Gravity,
    SpawnCheck,
}

/// Logical-clock scheduler for the gravity and spawn triggers.
///
/// Invariants:
/// * Either both triggers are armed or none is.
/// * A fired trigger is immediately re-armed one period later, so pending times only move forward.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickScheduler {
    gravity_period: Duration,
    spawn_period: Duration,
    events: HashMap<TimerEvent, GameTime>,
}

impl TickScheduler {
    /// Zero periods are raised to one millisecond; a trigger must never re-fire at the instant it fired.
    pub fn new(gravity_period: Duration, spawn_period: Duration) -> Self {
        let min_period = Duration::from_millis(1);
        Self {
            gravity_period: gravity_period.max(min_period),
            spawn_period: spawn_period.max(min_period),
            events: HashMap::new(),
        }
    }

    pub fn period(&self, event: TimerEvent) -> Duration {
        match event {
            TimerEvent::Gravity => self.gravity_period,
            TimerEvent::SpawnCheck => self.spawn_period,
        }
    }

    /// (Re)starts both triggers, each due one period after `now`.
    pub fn arm(&mut self, now: GameTime) {
        for event in [TimerEvent::Gravity, TimerEvent::SpawnCheck] {
            self.events.insert(event, now + self.period(event));
        }
    }

    pub fn cancel_all(&mut self) {
        self.events.clear();
    }

    pub fn is_armed(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn due_at(&self, event: TimerEvent) -> Option<GameTime> {
        self.events.get(&event).copied()
    }

    /// Earliest pending trigger, ties broken by priority.
    pub fn peek(&self) -> Option<(TimerEvent, GameTime)> {
        self.events
            .iter()
            .min_by_key(|(&event, &event_time)| (event_time, event))
            .map(|(&event, &event_time)| (event, event_time))
    }

    /// Pops the next trigger due at or before `until` (strictly before, if `inclusive` is false),
    /// re-arming it for its next period.
    pub fn pop_due(&mut self, until: GameTime, inclusive: bool) -> Option<(TimerEvent, GameTime)> {
        let (event, event_time) = self.peek()?;
        let due = if inclusive {
            event_time <= until
        } else {
            event_time < until
        };
        if !due {
            return None;
        }
        self.events.insert(event, event_time + self.period(event));
        Some((event, event_time))
    }
}
