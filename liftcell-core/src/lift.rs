//! Per-lift physical and sequencing state.
//!
//! A `Lift` is plain state data owned by the `Cell`; the sequencer advances
//! it one step per tick. The peer lift is never referenced directly — the
//! Cell hands the sequencer a `PeerView` snapshot instead.

use std::time::Instant;

use crate::error::CellError;
use crate::motion::{ActiveMotion, MotionKind, MotionStatus, OffsetMode};
use crate::sequencer::{cycle, is_flow_terminal};
use crate::types::{
    CancelCode, Cycle, ForkSide, HandshakeKind, JobRequest, LiftId, Reach, Row, StationStatus,
};
use crate::validator::requested_reach;

pub struct Lift {
    pub id: LiftId,
    /// Current row; 0 until the first commanded move (park / undefined).
    pub row: Row,
    pub fork_side: ForkSide,
    pub tray_present: bool,
    /// Row interval reserved until the next safe checkpoint. Recomputed by
    /// the Cell every tick.
    pub reach: Reach,
    pub cycle: Cycle,
    pub error_code: i32,
    pub cancel_reason: Option<CancelCode>,
    pub seq_comment: String,
    pub alarm_description: String,
    pub alarm_solution: String,
    /// Acknowledgement the sequencer is currently waiting for, if any.
    pub handshake: Option<HandshakeKind>,
    pub(crate) job: Option<JobRequest>,
    pub(crate) motion: Option<ActiveMotion>,
    /// Edge-and-drop gate: a rising `xAcknowledgeMovement` edge only counts
    /// after the signal was seen low for the current handshake point.
    pub(crate) ack_armed: bool,
    /// A supervisor cancel arrived while a primitive was in flight.
    pub(crate) cancel_pending: bool,
    /// The flow is parked at a safe checkpoint waiting for the shaft.
    /// Reach collapses to the current row so the peer can move clear.
    pub(crate) holding: bool,
    pub(crate) prev_clear_error: bool,
}

impl Lift {
    pub fn new(id: LiftId) -> Self {
        Self {
            id,
            row: 0,
            fork_side: ForkSide::Middle,
            tray_present: false,
            reach: Reach::EMPTY,
            cycle: cycle::INIT,
            error_code: 0,
            cancel_reason: None,
            seq_comment: "Initializing".to_string(),
            alarm_description: String::new(),
            alarm_solution: String::new(),
            handshake: None,
            job: None,
            motion: None,
            ack_armed: false,
            cancel_pending: false,
            holding: false,
            prev_clear_error: false,
        }
    }

    pub fn job(&self) -> Option<&JobRequest> {
        self.job.as_ref()
    }

    /// A job has been admitted and its flow has not yet reached a terminal
    /// or fault state. The peer Validator treats such a lift's reach as
    /// reserved.
    pub fn job_active(&self) -> bool {
        self.job.is_some()
            && self.cycle >= cycle::ACCEPTED
            && self.cycle < cycle::REJECTED
            && !is_flow_terminal(self.cycle)
    }

    pub fn in_error(&self) -> bool {
        self.cycle == cycle::ERROR
    }

    pub fn station_status(&self) -> StationStatus {
        match self.cycle {
            cycle::INIT => StationStatus::Booting,
            cycle::IDLE => StationStatus::Stop,
            cycle::ERROR => StationStatus::Error,
            cycle::REJECTED => StationStatus::Notification,
            _ => StationStatus::Ok,
        }
    }

    /// Recompute the reserved row interval from the current row and the
    /// active job. Tray-transfer flows widen by one row for the pick/place
    /// offset excursions.
    pub fn recompute_reach(&mut self) {
        self.reach = match (self.job_active() && !self.holding, self.job) {
            (true, Some(job)) => requested_reach(&job, self.row),
            _ => Reach::over([self.row]),
        };
    }

    pub(crate) fn start_engine_move(
        &mut self,
        target: Row,
        offset: OffsetMode,
        duration: std::time::Duration,
        now: Instant,
    ) -> Result<(), CellError> {
        if self.motion.is_some() {
            return Err(CellError::MotionInProgress {
                lift: self.id.number(),
            });
        }
        self.motion = Some(ActiveMotion::engine(target, offset, duration, now));
        Ok(())
    }

    pub(crate) fn start_fork_move(
        &mut self,
        target: ForkSide,
        duration: std::time::Duration,
        now: Instant,
    ) -> Result<(), CellError> {
        if self.motion.is_some() {
            return Err(CellError::MotionInProgress {
                lift: self.id.number(),
            });
        }
        self.motion = Some(ActiveMotion::fork(target, duration, now));
        Ok(())
    }

    /// Poll the in-flight primitive. On completion the physical effect is
    /// applied (row or fork side updated) and the primitive is consumed.
    pub(crate) fn poll_motion(&mut self, now: Instant) -> MotionPoll {
        let Some(motion) = self.motion else {
            return MotionPoll::Idle;
        };
        match motion.status(now) {
            MotionStatus::InProgress => MotionPoll::InProgress,
            MotionStatus::Done => {
                self.motion = None;
                match motion.kind {
                    MotionKind::Engine { target, offset } => self.row = offset.applied_to(target),
                    MotionKind::Fork { target } => self.fork_side = target,
                }
                MotionPoll::Completed(motion.kind)
            }
            MotionStatus::TimedOut => {
                self.motion = None;
                MotionPoll::TimedOut(motion.kind)
            }
        }
    }

    pub(crate) fn stall_motion(&mut self) -> bool {
        match self.motion.as_mut() {
            Some(m) => {
                m.stall();
                true
            }
            None => false,
        }
    }
}

/// Outcome of polling a lift's primitive this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MotionPoll {
    Idle,
    InProgress,
    Completed(MotionKind),
    TimedOut(MotionKind),
}

/// Per-tick snapshot of the peer lift. The sequencer and Validator consult
/// this instead of holding a reference to the other `Lift`.
#[derive(Clone, Copy, Debug)]
pub struct PeerView {
    pub active: bool,
    pub errored: bool,
    pub row: Row,
    pub reach: Reach,
}

impl PeerView {
    pub fn of(lift: &Lift) -> Self {
        Self {
            active: lift.job_active(),
            errored: lift.in_error(),
            row: lift.row,
            reach: lift.reach,
        }
    }

    /// Whether this peer stands in the way of a planned row span: an active
    /// peer blocks with its reserved reach, an idle or stuck one with the
    /// row it is sitting on. A peer still in the park bay blocks nothing.
    pub fn blocks(&self, span: &Reach) -> bool {
        if self.active {
            span.overlaps(&self.reach)
        } else {
            self.row > 0 && span.contains(self.row)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskType;
    use std::time::Duration;

    #[test]
    fn reach_degenerates_when_no_job_is_active() {
        let mut lift = Lift::new(LiftId::One);
        lift.recompute_reach();
        assert!(lift.reach.is_empty());

        lift.row = 6;
        lift.recompute_reach();
        assert_eq!(lift.reach, Reach { min: 6, max: 6 });
    }

    #[test]
    fn full_job_reach_covers_offset_excursions() {
        let mut lift = Lift::new(LiftId::One);
        lift.cycle = cycle::ACCEPTED;
        lift.job = Some(JobRequest {
            task: TaskType::Full,
            origin: 3,
            destination: 10,
        });
        lift.recompute_reach();
        assert_eq!(lift.reach, Reach { min: 2, max: 11 });
    }

    #[test]
    fn second_motion_start_is_a_programming_error() {
        let now = Instant::now();
        let mut lift = Lift::new(LiftId::One);
        lift.start_engine_move(5, OffsetMode::Exact, Duration::from_secs(1), now)
            .unwrap();
        let err = lift.start_fork_move(ForkSide::Left, Duration::from_secs(1), now);
        assert!(matches!(err, Err(CellError::MotionInProgress { lift: 1 })));
    }

    #[test]
    fn completed_engine_move_updates_the_row() {
        let now = Instant::now();
        let mut lift = Lift::new(LiftId::Two);
        lift.start_engine_move(8, OffsetMode::PickupOffset, Duration::from_millis(10), now)
            .unwrap();
        assert_eq!(lift.poll_motion(now), MotionPoll::InProgress);
        let done = lift.poll_motion(now + Duration::from_millis(10));
        assert!(matches!(done, MotionPoll::Completed(MotionKind::Engine { .. })));
        assert_eq!(lift.row, 9);
    }
}
