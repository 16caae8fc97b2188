//! The per-lift sequencer.
//!
//! The integer cycle code IS the state — supervisor UIs display it, so the
//! numbering is part of the external contract. Each tick advances one lift by
//! at most one step: `(state, inputs, clock) -> (state', events, primitive
//! starts)`. Nothing in here sleeps or spawns; the Cell drives both lifts in
//! a fixed order inside a single tick.

use std::time::Instant;

use crate::config::CellConfig;
use crate::error::CellError;
use crate::events::{CellEvent, EventLog};
use crate::lift::{Lift, MotionPoll, PeerView};
use crate::motion::{MotionKind, OffsetMode};
use crate::types::{
    fault, CancelCode, Cycle, ForkSide, HandshakeKind, JobInputs, JobRequest, Reach, Row, TaskType,
};
use crate::validator::validate;

/// Cycle codes. The supervisor displays these verbatim.
pub mod cycle {
    use crate::types::Cycle;

    pub const INIT: Cycle = -10;
    pub const IDLE: Cycle = 0;
    pub const READY: Cycle = 10;
    pub const VALIDATION: Cycle = 25;
    pub const ACCEPTED: Cycle = 30;
    pub const REJECTED: Cycle = 650;
    pub const ERROR: Cycle = 888;

    // Full flow (task 1). BringAway (task 4) joins at SET_TRAY_HANDSHAKE.
    pub const FULL_GET_TRAY_HANDSHAKE: Cycle = 100;
    pub const FULL_FORKS_HOME: Cycle = 101;
    pub const FULL_TO_ORIGIN_START: Cycle = 102;
    pub const FULL_TO_ORIGIN_WAIT: Cycle = 103;
    pub const FULL_TO_ORIGIN_ARRIVED: Cycle = 104;
    pub const FULL_TO_ORIGIN_DONE: Cycle = 105;
    pub const FULL_EXTEND_PICKUP_SELECT: Cycle = 150;
    pub const FULL_EXTEND_PICKUP_START: Cycle = 151;
    pub const FULL_EXTEND_PICKUP_WAIT: Cycle = 152;
    pub const FULL_EXTEND_PICKUP_DONE: Cycle = 153;
    pub const FULL_PICKUP_RAISE: Cycle = 155;
    pub const FULL_PICKUP_SETTLE: Cycle = 156;
    pub const FULL_RETRACT_PICKUP_START: Cycle = 160;
    pub const FULL_RETRACT_PICKUP_WAIT: Cycle = 161;
    pub const FULL_RETRACT_PICKUP_ARRIVED: Cycle = 162;
    pub const FULL_RETRACT_PICKUP_DONE: Cycle = 163;
    pub const FULL_PICKUP_COMPLETE: Cycle = 199;
    pub const FULL_SET_TRAY_HANDSHAKE: Cycle = 201;
    pub const FULL_TO_DEST_START: Cycle = 202;
    pub const FULL_TO_DEST_WAIT: Cycle = 203;
    pub const FULL_TO_DEST_ARRIVED: Cycle = 204;
    pub const FULL_TO_DEST_DONE: Cycle = 205;
    pub const FULL_EXTEND_PLACE_SELECT: Cycle = 250;
    pub const FULL_EXTEND_PLACE_START: Cycle = 251;
    pub const FULL_EXTEND_PLACE_WAIT: Cycle = 252;
    pub const FULL_EXTEND_PLACE_DONE: Cycle = 253;
    pub const FULL_PLACE_LOWER: Cycle = 255;
    pub const FULL_PLACE_SETTLE: Cycle = 256;
    pub const FULL_RETRACT_PLACE_START: Cycle = 260;
    pub const FULL_RETRACT_PLACE_WAIT: Cycle = 261;
    pub const FULL_RETRACT_PLACE_ARRIVED: Cycle = 262;
    pub const FULL_RETRACT_PLACE_DONE: Cycle = 263;
    pub const FULL_COMPLETE: Cycle = 299;

    // MoveTo flow (task 2).
    pub const MOVETO_CHECK: Cycle = 300;
    pub const MOVETO_START: Cycle = 301;
    pub const MOVETO_WAIT: Cycle = 302;
    pub const MOVETO_COMPLETE: Cycle = 399;

    // PreparePickup flow (task 3).
    pub const PREPARE_GET_TRAY_HANDSHAKE: Cycle = 400;
    pub const PREPARE_TO_ORIGIN_START: Cycle = 401;
    pub const PREPARE_TO_ORIGIN_WAIT: Cycle = 402;
    pub const PREPARE_EXTEND_START: Cycle = 403;
    pub const PREPARE_EXTEND_WAIT: Cycle = 404;
    pub const PREPARE_COMPLETE: Cycle = 499;
}

/// Terminal step of a completed flow: the job is done, the sequencer waits
/// for the supervisor to clear the inputs.
pub fn is_flow_terminal(c: Cycle) -> bool {
    matches!(
        c,
        cycle::FULL_COMPLETE | cycle::MOVETO_COMPLETE | cycle::PREPARE_COMPLETE
    )
}

/// Range in which a supervisor cancel (code 7) is honored.
fn in_cancelable_flow(c: Cycle) -> bool {
    (cycle::VALIDATION..cycle::REJECTED).contains(&c) && !is_flow_terminal(c)
}

/// Everything one sequencer step may look at, beyond the lift itself.
pub(crate) struct TickCtx<'a> {
    pub inputs: JobInputs,
    pub peer: PeerView,
    pub cfg: &'a CellConfig,
    pub now: Instant,
    pub auto_mode: bool,
    /// At most one admission per tick cell-wide, lift 1 first.
    pub admission_free: &'a mut bool,
    pub events: &'a mut EventLog,
}

/// Advance one lift by one step.
pub(crate) fn tick_lift(lift: &mut Lift, ctx: &mut TickCtx<'_>) -> Result<(), CellError> {
    let clear_edge = ctx.inputs.clear_error && !lift.prev_clear_error;
    lift.prev_clear_error = ctx.inputs.clear_error;
    lift.holding = false;

    if lift.cycle == cycle::ERROR {
        if clear_edge {
            ctx.events.push(CellEvent::ErrorCleared {
                lift: lift.id.number(),
            });
            tracing::info!(lift = lift.id.number(), "error cleared by supervisor");
            reinit(lift);
        }
        return Ok(());
    }

    // Supervisor cancel: observed at the top of the tick, before any new
    // primitive may start. An in-flight primitive runs to completion first.
    if in_cancelable_flow(lift.cycle) && ctx.inputs.cancel_request != 0 && !lift.cancel_pending {
        if lift.motion.is_some() {
            lift.cancel_pending = true;
        } else {
            cancel_by_supervisor(lift, ctx.events);
            return Ok(());
        }
    }

    match lift.cycle {
        cycle::INIT => init_step(lift, ctx),
        cycle::IDLE => {
            if ctx.auto_mode {
                to_ready(lift);
            }
            Ok(())
        }
        cycle::READY => {
            if ctx.inputs.task_type != 0 {
                ctx.events.push(CellEvent::JobRequested {
                    lift: lift.id.number(),
                    task_type: ctx.inputs.task_type,
                });
                lift.seq_comment = "Validating assignment".to_string();
                lift.cycle = cycle::VALIDATION;
            }
            Ok(())
        }
        cycle::VALIDATION => validation_step(lift, ctx),
        cycle::ACCEPTED => dispatch_step(lift),
        c if (cycle::FULL_GET_TRAY_HANDSHAKE..=cycle::FULL_COMPLETE).contains(&c) => {
            full_flow(lift, ctx)
        }
        c if (cycle::MOVETO_CHECK..=cycle::MOVETO_COMPLETE).contains(&c) => moveto_flow(lift, ctx),
        c if (cycle::PREPARE_GET_TRAY_HANDSHAKE..=cycle::PREPARE_COMPLETE).contains(&c) => {
            prepare_flow(lift, ctx)
        }
        cycle::REJECTED => {
            if ctx.inputs.task_type == 0 {
                lift.cancel_reason = None;
                lift.job = None;
                lift.cancel_pending = false;
                to_ready(lift);
            }
            Ok(())
        }
        other => {
            tracing::warn!(lift = lift.id.number(), cycle = other, "unknown cycle, reinitializing");
            reinit(lift);
            Ok(())
        }
    }
}

/// Force a lift into cycle 888 from outside the state machine (watchdog).
pub(crate) fn force_error(
    lift: &mut Lift,
    code: i32,
    description: &str,
    solution: &str,
    events: &mut EventLog,
) {
    enter_error(lift, code, description, solution, events);
}

// ─── Shared transitions ───────────────────────────────────────

fn reinit(lift: &mut Lift) {
    lift.cycle = cycle::INIT;
    lift.job = None;
    lift.motion = None;
    lift.cancel_reason = None;
    lift.cancel_pending = false;
    lift.holding = false;
    lift.error_code = 0;
    lift.alarm_description.clear();
    lift.alarm_solution.clear();
    lift.handshake = None;
    lift.ack_armed = false;
    lift.seq_comment = "Initializing".to_string();
}

fn to_ready(lift: &mut Lift) {
    lift.cycle = cycle::READY;
    lift.handshake = None;
    lift.ack_armed = false;
    lift.seq_comment = "Ready, waiting for assignment".to_string();
}

fn enter_error(lift: &mut Lift, code: i32, description: &str, solution: &str, events: &mut EventLog) {
    lift.cycle = cycle::ERROR;
    lift.error_code = code;
    lift.alarm_description = description.to_string();
    lift.alarm_solution = solution.to_string();
    lift.motion = None;
    lift.handshake = None;
    lift.ack_armed = false;
    lift.seq_comment = "Error".to_string();
    events.push(CellEvent::ErrorEntered {
        lift: lift.id.number(),
        code,
    });
    tracing::warn!(lift = lift.id.number(), code, description, "lift entered error state");
}

fn reject(lift: &mut Lift, code: CancelCode, events: &mut EventLog) {
    lift.cycle = cycle::REJECTED;
    lift.cancel_reason = Some(code);
    lift.seq_comment = format!("Assignment rejected: {}", code.description());
    events.push(CellEvent::JobRejected {
        lift: lift.id.number(),
        code,
    });
    tracing::info!(lift = lift.id.number(), code = code.as_wire(), "assignment rejected");
}

fn cancel_by_supervisor(lift: &mut Lift, events: &mut EventLog) {
    lift.cycle = cycle::REJECTED;
    lift.cancel_reason = Some(CancelCode::ByEcosystem);
    lift.cancel_pending = false;
    lift.handshake = None;
    lift.ack_armed = false;
    lift.seq_comment = "Cancelled by supervisor".to_string();
    events.push(CellEvent::JobCancelled {
        lift: lift.id.number(),
    });
    tracing::info!(lift = lift.id.number(), "assignment cancelled by supervisor");
}

fn complete_job(lift: &mut Lift, terminal: Cycle, comment: &str, events: &mut EventLog) {
    lift.cycle = terminal;
    lift.seq_comment = comment.to_string();
    events.push(CellEvent::JobCompleted {
        lift: lift.id.number(),
        cycle: terminal,
    });
    tracing::info!(lift = lift.id.number(), cycle = terminal, "job complete");
}

fn terminal_wait_clear(lift: &mut Lift, ctx: &TickCtx<'_>) {
    if ctx.inputs.task_type == 0 {
        lift.job = None;
        lift.cancel_pending = false;
        to_ready(lift);
    }
}

// ─── Step helpers ─────────────────────────────────────────────

/// Motion poll outcome after cancel and timeout handling.
enum StepMotion {
    Idle,
    Busy,
    Completed(MotionKind),
    /// The flow was diverted (cancel honored or fault entered); the caller
    /// must not advance.
    Interrupted,
}

fn motion_step(lift: &mut Lift, ctx: &mut TickCtx<'_>) -> StepMotion {
    match lift.poll_motion(ctx.now) {
        MotionPoll::Idle => StepMotion::Idle,
        MotionPoll::InProgress => StepMotion::Busy,
        MotionPoll::Completed(kind) => {
            ctx.events.push(CellEvent::MotionCompleted {
                lift: lift.id.number(),
            });
            if lift.cancel_pending {
                cancel_by_supervisor(lift, ctx.events);
                StepMotion::Interrupted
            } else {
                StepMotion::Completed(kind)
            }
        }
        MotionPoll::TimedOut(kind) => {
            ctx.events.push(CellEvent::MotionTimedOut {
                lift: lift.id.number(),
            });
            let (code, description) = match kind {
                MotionKind::Engine { .. } => {
                    (fault::ENGINE_MOVE_TIMEOUT, "Engine move did not complete in time")
                }
                MotionKind::Fork { .. } => {
                    (fault::FORK_MOVE_TIMEOUT, "Fork move did not complete in time")
                }
            };
            enter_error(
                lift,
                code,
                description,
                "Inspect the drive, then toggle xClearError",
                ctx.events,
            );
            StepMotion::Interrupted
        }
    }
}

/// Start an engine move unless the peer stands inside the travel span.
/// Returns whether the primitive was started; on hold the cycle is left
/// unchanged so the step retries next tick.
fn try_start_engine(
    lift: &mut Lift,
    ctx: &mut TickCtx<'_>,
    target: Row,
    offset: OffsetMode,
) -> Result<bool, CellError> {
    let span = Reach::over([lift.row, target, offset.applied_to(target)]);
    if ctx.peer.blocks(&span) {
        lift.holding = true;
        lift.seq_comment = "Holding: shaft blocked by peer lift".to_string();
        return Ok(false);
    }
    lift.start_engine_move(target, offset, ctx.cfg.engine_move_duration(), ctx.now)?;
    ctx.events.push(CellEvent::EngineMoveStarted {
        lift: lift.id.number(),
        target,
        offset,
    });
    Ok(true)
}

fn start_fork(lift: &mut Lift, ctx: &mut TickCtx<'_>, side: ForkSide) -> Result<(), CellError> {
    lift.start_fork_move(side, ctx.cfg.fork_move_duration(), ctx.now)?;
    ctx.events.push(CellEvent::ForkMoveStarted {
        lift: lift.id.number(),
        side,
    });
    Ok(())
}

/// Handshake wait with the edge-and-drop rule: after this point is
/// advertised, `xAcknowledgeMovement` must be seen low once before a rising
/// edge counts. Returns true when the edge is consumed.
fn handshake_wait(lift: &mut Lift, kind: HandshakeKind, ctx: &mut TickCtx<'_>) -> bool {
    if lift.handshake != Some(kind) {
        lift.handshake = Some(kind);
        lift.ack_armed = false;
        ctx.events.push(CellEvent::HandshakePublished {
            lift: lift.id.number(),
            kind,
        });
    }
    if !lift.ack_armed {
        if !ctx.inputs.acknowledge {
            lift.ack_armed = true;
        }
        return false;
    }
    if ctx.inputs.acknowledge {
        lift.handshake = None;
        lift.ack_armed = false;
        ctx.events.push(CellEvent::HandshakeAcknowledged {
            lift: lift.id.number(),
            kind,
        });
        true
    } else {
        false
    }
}

// ─── Control states ───────────────────────────────────────────

fn init_step(lift: &mut Lift, ctx: &mut TickCtx<'_>) -> Result<(), CellError> {
    match motion_step(lift, ctx) {
        StepMotion::Idle => {
            if lift.fork_side == ForkSide::Middle {
                lift.cycle = cycle::IDLE;
                lift.seq_comment = "Idle".to_string();
            } else {
                start_fork(lift, ctx, ForkSide::Middle)?;
            }
        }
        StepMotion::Completed(_) => {
            lift.cycle = cycle::IDLE;
            lift.seq_comment = "Idle".to_string();
        }
        StepMotion::Busy | StepMotion::Interrupted => {}
    }
    Ok(())
}

fn validation_step(lift: &mut Lift, ctx: &mut TickCtx<'_>) -> Result<(), CellError> {
    if ctx.inputs.task_type == 0 {
        // Request withdrawn before validation ran.
        to_ready(lift);
        return Ok(());
    }
    if !*ctx.admission_free {
        return Ok(());
    }
    match TaskType::from_wire(ctx.inputs.task_type) {
        None => reject(lift, CancelCode::InvalidAssignment, ctx.events),
        Some(task) => {
            let req = JobRequest {
                task,
                origin: ctx.inputs.origin,
                destination: ctx.inputs.destination,
            };
            match validate(&req, lift, &ctx.peer, ctx.cfg) {
                Ok(()) => {
                    *ctx.admission_free = false;
                    lift.job = Some(req);
                    lift.cancel_reason = None;
                    lift.cycle = cycle::ACCEPTED;
                    lift.seq_comment = "Assignment accepted".to_string();
                    ctx.events.push(CellEvent::JobAccepted {
                        lift: lift.id.number(),
                        task,
                        origin: req.origin,
                        destination: req.destination,
                    });
                    tracing::info!(
                        lift = lift.id.number(),
                        task = task.as_wire(),
                        origin = req.origin,
                        destination = req.destination,
                        "assignment accepted"
                    );
                }
                Err(code) => reject(lift, code, ctx.events),
            }
        }
    }
    Ok(())
}

fn dispatch_step(lift: &mut Lift) -> Result<(), CellError> {
    let Some(job) = lift.job else {
        reinit(lift);
        return Ok(());
    };
    lift.cycle = match job.task {
        TaskType::Full => cycle::FULL_GET_TRAY_HANDSHAKE,
        TaskType::MoveTo => cycle::MOVETO_CHECK,
        TaskType::PreparePickup => cycle::PREPARE_GET_TRAY_HANDSHAKE,
        // The tray is already on board (validated), so BringAway joins the
        // Full flow at its delivery leg.
        TaskType::BringAway => cycle::FULL_SET_TRAY_HANDSHAKE,
    };
    Ok(())
}

// ─── Full flow ────────────────────────────────────────────────

fn full_flow(lift: &mut Lift, ctx: &mut TickCtx<'_>) -> Result<(), CellError> {
    let Some(job) = lift.job else {
        reinit(lift);
        return Ok(());
    };
    match lift.cycle {
        cycle::FULL_GET_TRAY_HANDSHAKE => {
            lift.seq_comment = "Waiting for GetTray acknowledge".to_string();
            if handshake_wait(lift, HandshakeKind::GetTray, ctx) {
                lift.cycle = cycle::FULL_FORKS_HOME;
            }
        }
        cycle::FULL_FORKS_HOME => match motion_step(lift, ctx) {
            StepMotion::Idle => {
                if lift.fork_side == ForkSide::Middle {
                    lift.cycle = cycle::FULL_TO_ORIGIN_START;
                } else {
                    lift.seq_comment = "Retracting forks".to_string();
                    start_fork(lift, ctx, ForkSide::Middle)?;
                }
            }
            StepMotion::Completed(_) => lift.cycle = cycle::FULL_TO_ORIGIN_START,
            StepMotion::Busy | StepMotion::Interrupted => {}
        },
        cycle::FULL_TO_ORIGIN_START => {
            lift.seq_comment = format!("Moving to origin row {}", job.origin);
            if try_start_engine(lift, ctx, job.origin, OffsetMode::Exact)? {
                lift.cycle = cycle::FULL_TO_ORIGIN_WAIT;
            }
        }
        cycle::FULL_TO_ORIGIN_WAIT => {
            if let StepMotion::Completed(_) = motion_step(lift, ctx) {
                lift.cycle = cycle::FULL_TO_ORIGIN_ARRIVED;
            }
        }
        cycle::FULL_TO_ORIGIN_ARRIVED => {
            lift.seq_comment = format!("Arrived at origin row {}", lift.row);
            lift.cycle = cycle::FULL_TO_ORIGIN_DONE;
        }
        cycle::FULL_TO_ORIGIN_DONE => lift.cycle = cycle::FULL_EXTEND_PICKUP_SELECT,
        cycle::FULL_EXTEND_PICKUP_SELECT => {
            lift.seq_comment = "Extending forks for pickup".to_string();
            lift.cycle = cycle::FULL_EXTEND_PICKUP_START;
        }
        cycle::FULL_EXTEND_PICKUP_START => {
            let side = ctx.cfg.tray_side;
            start_fork(lift, ctx, side)?;
            lift.cycle = cycle::FULL_EXTEND_PICKUP_WAIT;
        }
        cycle::FULL_EXTEND_PICKUP_WAIT => {
            if let StepMotion::Completed(_) = motion_step(lift, ctx) {
                lift.cycle = cycle::FULL_EXTEND_PICKUP_DONE;
            }
        }
        cycle::FULL_EXTEND_PICKUP_DONE => lift.cycle = cycle::FULL_PICKUP_RAISE,
        cycle::FULL_PICKUP_RAISE => match motion_step(lift, ctx) {
            StepMotion::Idle => {
                lift.seq_comment = "Lifting tray off rack".to_string();
                try_start_engine(lift, ctx, job.origin, OffsetMode::PickupOffset)?;
            }
            StepMotion::Completed(_) => lift.cycle = cycle::FULL_PICKUP_SETTLE,
            StepMotion::Busy | StepMotion::Interrupted => {}
        },
        cycle::FULL_PICKUP_SETTLE => match motion_step(lift, ctx) {
            StepMotion::Idle => {
                try_start_engine(lift, ctx, job.origin, OffsetMode::Exact)?;
            }
            StepMotion::Completed(_) => {
                lift.tray_present = true;
                ctx.events.push(CellEvent::TrayPicked {
                    lift: lift.id.number(),
                    row: lift.row,
                });
                lift.cycle = cycle::FULL_RETRACT_PICKUP_START;
            }
            StepMotion::Busy | StepMotion::Interrupted => {}
        },
        cycle::FULL_RETRACT_PICKUP_START => {
            lift.seq_comment = "Retracting forks".to_string();
            start_fork(lift, ctx, ForkSide::Middle)?;
            lift.cycle = cycle::FULL_RETRACT_PICKUP_WAIT;
        }
        cycle::FULL_RETRACT_PICKUP_WAIT => {
            if let StepMotion::Completed(_) = motion_step(lift, ctx) {
                lift.cycle = cycle::FULL_RETRACT_PICKUP_ARRIVED;
            }
        }
        cycle::FULL_RETRACT_PICKUP_ARRIVED => lift.cycle = cycle::FULL_RETRACT_PICKUP_DONE,
        cycle::FULL_RETRACT_PICKUP_DONE => lift.cycle = cycle::FULL_PICKUP_COMPLETE,
        cycle::FULL_PICKUP_COMPLETE => {
            lift.seq_comment = "Pickup complete".to_string();
            lift.cycle = cycle::FULL_SET_TRAY_HANDSHAKE;
        }
        cycle::FULL_SET_TRAY_HANDSHAKE => {
            lift.seq_comment = "Waiting for SetTray acknowledge".to_string();
            if handshake_wait(lift, HandshakeKind::SetTray, ctx) {
                lift.cycle = cycle::FULL_TO_DEST_START;
            }
        }
        cycle::FULL_TO_DEST_START => {
            lift.seq_comment = format!("Moving to destination row {}", job.destination);
            if try_start_engine(lift, ctx, job.destination, OffsetMode::Exact)? {
                lift.cycle = cycle::FULL_TO_DEST_WAIT;
            }
        }
        cycle::FULL_TO_DEST_WAIT => {
            if let StepMotion::Completed(_) = motion_step(lift, ctx) {
                lift.cycle = cycle::FULL_TO_DEST_ARRIVED;
            }
        }
        cycle::FULL_TO_DEST_ARRIVED => {
            lift.seq_comment = format!("Arrived at destination row {}", lift.row);
            lift.cycle = cycle::FULL_TO_DEST_DONE;
        }
        cycle::FULL_TO_DEST_DONE => lift.cycle = cycle::FULL_EXTEND_PLACE_SELECT,
        cycle::FULL_EXTEND_PLACE_SELECT => {
            lift.seq_comment = "Extending forks for place".to_string();
            lift.cycle = cycle::FULL_EXTEND_PLACE_START;
        }
        cycle::FULL_EXTEND_PLACE_START => {
            let side = ctx.cfg.tray_side;
            start_fork(lift, ctx, side)?;
            lift.cycle = cycle::FULL_EXTEND_PLACE_WAIT;
        }
        cycle::FULL_EXTEND_PLACE_WAIT => {
            if let StepMotion::Completed(_) = motion_step(lift, ctx) {
                lift.cycle = cycle::FULL_EXTEND_PLACE_DONE;
            }
        }
        cycle::FULL_EXTEND_PLACE_DONE => lift.cycle = cycle::FULL_PLACE_LOWER,
        cycle::FULL_PLACE_LOWER => match motion_step(lift, ctx) {
            StepMotion::Idle => {
                lift.seq_comment = "Lowering tray onto rack".to_string();
                try_start_engine(lift, ctx, job.destination, OffsetMode::PlaceOffset)?;
            }
            StepMotion::Completed(_) => lift.cycle = cycle::FULL_PLACE_SETTLE,
            StepMotion::Busy | StepMotion::Interrupted => {}
        },
        cycle::FULL_PLACE_SETTLE => match motion_step(lift, ctx) {
            StepMotion::Idle => {
                try_start_engine(lift, ctx, job.destination, OffsetMode::Exact)?;
            }
            StepMotion::Completed(_) => {
                lift.tray_present = false;
                ctx.events.push(CellEvent::TrayPlaced {
                    lift: lift.id.number(),
                    row: lift.row,
                });
                lift.cycle = cycle::FULL_RETRACT_PLACE_START;
            }
            StepMotion::Busy | StepMotion::Interrupted => {}
        },
        cycle::FULL_RETRACT_PLACE_START => {
            lift.seq_comment = "Retracting forks".to_string();
            start_fork(lift, ctx, ForkSide::Middle)?;
            lift.cycle = cycle::FULL_RETRACT_PLACE_WAIT;
        }
        cycle::FULL_RETRACT_PLACE_WAIT => {
            if let StepMotion::Completed(_) = motion_step(lift, ctx) {
                lift.cycle = cycle::FULL_RETRACT_PLACE_ARRIVED;
            }
        }
        cycle::FULL_RETRACT_PLACE_ARRIVED => lift.cycle = cycle::FULL_RETRACT_PLACE_DONE,
        cycle::FULL_RETRACT_PLACE_DONE => {
            complete_job(lift, cycle::FULL_COMPLETE, "Job complete", ctx.events);
        }
        cycle::FULL_COMPLETE => terminal_wait_clear(lift, ctx),
        _ => reinit(lift),
    }
    Ok(())
}

// ─── MoveTo flow ──────────────────────────────────────────────

fn moveto_flow(lift: &mut Lift, ctx: &mut TickCtx<'_>) -> Result<(), CellError> {
    let Some(job) = lift.job else {
        reinit(lift);
        return Ok(());
    };
    match lift.cycle {
        cycle::MOVETO_CHECK => {
            if lift.row == job.destination {
                complete_job(
                    lift,
                    cycle::MOVETO_COMPLETE,
                    "Already at destination row",
                    ctx.events,
                );
            } else {
                let span = Reach::over([lift.row, job.destination]);
                if ctx.peer.blocks(&span) {
                    lift.holding = true;
                    lift.seq_comment = "Waiting for shaft".to_string();
                } else {
                    lift.cycle = cycle::MOVETO_START;
                }
            }
        }
        cycle::MOVETO_START => {
            lift.seq_comment = format!("Moving to row {}", job.destination);
            if try_start_engine(lift, ctx, job.destination, OffsetMode::Exact)? {
                lift.cycle = cycle::MOVETO_WAIT;
            }
        }
        cycle::MOVETO_WAIT => match motion_step(lift, ctx) {
            StepMotion::Completed(_) => {
                complete_job(lift, cycle::MOVETO_COMPLETE, "Move complete", ctx.events);
            }
            StepMotion::Idle => lift.cycle = cycle::MOVETO_START,
            StepMotion::Busy | StepMotion::Interrupted => {}
        },
        cycle::MOVETO_COMPLETE => terminal_wait_clear(lift, ctx),
        _ => reinit(lift),
    }
    Ok(())
}

// ─── PreparePickup flow ───────────────────────────────────────

fn prepare_flow(lift: &mut Lift, ctx: &mut TickCtx<'_>) -> Result<(), CellError> {
    let Some(job) = lift.job else {
        reinit(lift);
        return Ok(());
    };
    match lift.cycle {
        cycle::PREPARE_GET_TRAY_HANDSHAKE => {
            lift.seq_comment = "Waiting for GetTray acknowledge".to_string();
            if handshake_wait(lift, HandshakeKind::GetTray, ctx) {
                lift.cycle = cycle::PREPARE_TO_ORIGIN_START;
            }
        }
        cycle::PREPARE_TO_ORIGIN_START => {
            lift.seq_comment = format!("Moving to origin row {}", job.origin);
            if try_start_engine(lift, ctx, job.origin, OffsetMode::Exact)? {
                lift.cycle = cycle::PREPARE_TO_ORIGIN_WAIT;
            }
        }
        cycle::PREPARE_TO_ORIGIN_WAIT => {
            if let StepMotion::Completed(_) = motion_step(lift, ctx) {
                lift.cycle = cycle::PREPARE_EXTEND_START;
            }
        }
        cycle::PREPARE_EXTEND_START => {
            lift.seq_comment = "Extending forks for pickup".to_string();
            let side = ctx.cfg.tray_side;
            start_fork(lift, ctx, side)?;
            lift.cycle = cycle::PREPARE_EXTEND_WAIT;
        }
        cycle::PREPARE_EXTEND_WAIT => {
            if let StepMotion::Completed(_) = motion_step(lift, ctx) {
                complete_job(
                    lift,
                    cycle::PREPARE_COMPLETE,
                    "Prepared for pickup, forks extended",
                    ctx.events,
                );
            }
        }
        cycle::PREPARE_COMPLETE => terminal_wait_clear(lift, ctx),
        _ => reinit(lift),
    }
    Ok(())
}
