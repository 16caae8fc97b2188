//! Timed motion primitives.
//!
//! Physical actuation is modeled as a start instant plus a configured
//! duration; completion is observed by polling against the injected clock,
//! so nothing here ever sleeps. A primitive that has not completed by twice
//! its nominal duration reports a timeout — the sequencer turns that into
//! cycle 888.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::types::{ForkSide, Row};

/// Vertical offset applied to an engine move target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OffsetMode {
    Exact,
    /// Raise one row above the target, lifting the tray off the rack.
    PickupOffset,
    /// Lower one row below the target, settling the tray onto the rack.
    PlaceOffset,
}

impl OffsetMode {
    pub fn applied_to(self, target: Row) -> Row {
        match self {
            OffsetMode::Exact => target,
            OffsetMode::PickupOffset => target + 1,
            OffsetMode::PlaceOffset => target - 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionKind {
    Engine { target: Row, offset: OffsetMode },
    Fork { target: ForkSide },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionStatus {
    InProgress,
    Done,
    TimedOut,
}

/// One in-flight primitive. No queueing: the lift owns at most one.
#[derive(Clone, Copy, Debug)]
pub struct ActiveMotion {
    pub kind: MotionKind,
    started: Instant,
    duration: Duration,
    /// Fault injection for commissioning tests: a stalled primitive never
    /// completes and runs into its deadline instead.
    stalled: bool,
}

impl ActiveMotion {
    pub fn engine(target: Row, offset: OffsetMode, duration: Duration, now: Instant) -> Self {
        Self {
            kind: MotionKind::Engine { target, offset },
            started: now,
            duration,
            stalled: false,
        }
    }

    pub fn fork(target: ForkSide, duration: Duration, now: Instant) -> Self {
        Self {
            kind: MotionKind::Fork { target },
            started: now,
            duration,
            stalled: false,
        }
    }

    pub fn stall(&mut self) {
        self.stalled = true;
    }

    pub fn status(&self, now: Instant) -> MotionStatus {
        let elapsed = now.saturating_duration_since(self.started);
        if self.stalled {
            if elapsed > self.duration * 2 {
                MotionStatus::TimedOut
            } else {
                MotionStatus::InProgress
            }
        } else if elapsed >= self.duration {
            MotionStatus::Done
        } else {
            MotionStatus::InProgress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_after_nominal_duration() {
        let t0 = Instant::now();
        let m = ActiveMotion::engine(5, OffsetMode::Exact, Duration::from_millis(100), t0);
        assert_eq!(m.status(t0), MotionStatus::InProgress);
        assert_eq!(m.status(t0 + Duration::from_millis(99)), MotionStatus::InProgress);
        assert_eq!(m.status(t0 + Duration::from_millis(100)), MotionStatus::Done);
    }

    #[test]
    fn stalled_motion_times_out_at_twice_nominal() {
        let t0 = Instant::now();
        let mut m = ActiveMotion::fork(ForkSide::Left, Duration::from_millis(100), t0);
        m.stall();
        assert_eq!(m.status(t0 + Duration::from_millis(150)), MotionStatus::InProgress);
        assert_eq!(m.status(t0 + Duration::from_millis(201)), MotionStatus::TimedOut);
    }

    #[test]
    fn offsets_shift_the_final_row_by_one() {
        assert_eq!(OffsetMode::Exact.applied_to(7), 7);
        assert_eq!(OffsetMode::PickupOffset.applied_to(7), 8);
        assert_eq!(OffsetMode::PlaceOffset.applied_to(7), 6);
    }
}
