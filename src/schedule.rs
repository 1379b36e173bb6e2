//! One-shot timers backing autoplay.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::events::CarouselEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

pub trait Scheduler {
    /// Arms a timer that expires `delay` after `now`.
    fn schedule(&mut self, delay: Duration, now: Instant) -> TimerId;
    /// Disarms a timer; unknown or already expired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

/// Timers as tokio tasks that report expiry on a carousel's event channel.
#[derive(Debug)]
pub struct TokioScheduler {
    events: mpsc::Sender<CarouselEvent>,
    armed: HashMap<TimerId, CancellationToken>,
    next_id: u64,
}

impl TokioScheduler {
    pub fn new(events: mpsc::Sender<CarouselEvent>) -> Self {
        Self {
            events,
            armed: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn armed(&self) -> usize {
        self.armed.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, _now: Instant) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let cancel = CancellationToken::new();
        self.armed.insert(id, cancel.clone());
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = sleep(delay) => {
                    if events.send(CarouselEvent::AutoplayElapsed(id)).await.is_err() {
                        debug!(?id, "carousel gone before timer expiry");
                    }
                }
            }
        });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(token) = self.armed.remove(&id) {
            token.cancel();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        if !self.armed.is_empty() {
            debug!(armed = self.armed.len(), "dropping scheduler with armed timers");
        }
        for (_, token) in self.armed.drain() {
            token.cancel();
        }
    }
}

/// Deadline bookkeeping for hosts that run their own event loop.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    deadlines: BTreeMap<TimerId, Instant>,
    next_id: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.deadlines.len()
    }

    pub fn deadline(&self, id: TimerId) -> Option<Instant> {
        self.deadlines.get(&id).copied()
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<(TimerId, Instant)> {
        self.deadlines
            .iter()
            .min_by_key(|(_, at)| **at)
            .map(|(id, at)| (*id, *at))
    }

    /// Removes and returns the timers that have expired at `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerId> {
        let due: Vec<TimerId> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in &due {
            self.deadlines.remove(id);
        }
        due
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, now: Instant) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.deadlines.insert(id, now + delay);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.deadlines.remove(&id);
    }
}
