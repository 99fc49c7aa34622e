//! Poll timers
//!
//! A `PollSchedule` never fires while its previous request is still in
//! flight. Each `start` hands out a fresh lease, so a completion that was
//! issued before a stop/start cycle cannot re-arm the new schedule.

use crate::game::Millis;
use std::time::Duration;

/// Identifies one run of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease(u64);

/// How the next poll is timed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Next poll `interval` after the previous one completes
    AfterCompletion,
    /// Polls `interval` apart, skipping ticks while one is in flight
    Fixed,
}

#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Millis,
    cadence: Cadence,
    next_due: Option<Millis>,
    in_flight: bool,
    rush: bool,
    generation: u64,
}

impl PollSchedule {
    pub fn after_completion(interval: Duration) -> Self {
        Self::new(interval, Cadence::AfterCompletion)
    }

    pub fn fixed(interval: Duration) -> Self {
        Self::new(interval, Cadence::Fixed)
    }

    fn new(interval: Duration, cadence: Cadence) -> Self {
        Self {
            interval: interval.as_millis() as Millis,
            cadence,
            next_due: None,
            in_flight: false,
            rush: false,
            generation: 0,
        }
    }

    /// Begin polling; the first poll is due immediately
    pub fn start(&mut self, now: Millis) {
        self.generation += 1;
        self.next_due = Some(now);
        self.in_flight = false;
        self.rush = false;
    }

    /// Stop polling. Completions from the stopped run are ignored.
    pub fn stop(&mut self) {
        self.generation += 1;
        self.next_due = None;
        self.in_flight = false;
        self.rush = false;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    #[cfg(test)]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// If a poll is due, mark it in flight and return its lease
    pub fn poll_due(&mut self, now: Millis) -> Option<Lease> {
        let due = self.next_due?;
        if self.in_flight || now < due {
            return None;
        }

        self.in_flight = true;
        if self.cadence == Cadence::Fixed {
            let next = due + self.interval;
            self.next_due = Some(if next > now { next } else { now + self.interval });
        }
        Some(Lease(self.generation))
    }

    /// Record that the poll issued under `lease` has finished
    pub fn complete(&mut self, lease: Lease, now: Millis) {
        if lease.0 != self.generation || !self.is_running() {
            return;
        }
        self.in_flight = false;
        if std::mem::take(&mut self.rush) {
            self.next_due = Some(now);
        } else if self.cadence == Cadence::AfterCompletion {
            self.next_due = Some(now + self.interval);
        }
    }

    /// Make the next poll due now (after an action changed server state).
    /// With a poll in flight, the next one follows as soon as it completes.
    pub fn expedite(&mut self, now: Millis) {
        if self.in_flight {
            self.rush = true;
            return;
        }
        if let Some(due) = self.next_due {
            if due > now {
                self.next_due = Some(now);
            }
        }
    }
}
