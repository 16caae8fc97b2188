//! The cell supervisor: one tick loop over two lift sequencers.
//!
//! All state transitions for both lifts happen inside `tick`, in a fixed
//! order (lift 1, then lift 2), so the Validator always sees a coherent
//! snapshot and no locking is needed between the sequencers. The clock is
//! injected; callers decide the cadence.

use std::time::Instant;

use serde::Serialize;

use crate::config::CellConfig;
use crate::error::CellError;
use crate::events::{CellEvent, EventLog};
use crate::lift::{Lift, PeerView};
use crate::paths;
use crate::publish;
use crate::sequencer::{self, TickCtx};
use crate::types::{fault, CancelCode, Cycle, ForkSide, LiftId, Row};
use crate::varspace::VarSpace;

pub struct Cell {
    vars: VarSpace,
    lifts: [Lift; 2],
    cfg: CellConfig,
    events: EventLog,
    auto_mode: bool,
    watchdog_last_kick: Instant,
    watchdog_tripped: bool,
}

impl Cell {
    pub fn new(cfg: CellConfig, now: Instant) -> Result<Self, CellError> {
        cfg.validate()?;
        let mut vars = VarSpace::new();
        publish::seed(&mut vars);
        let events = EventLog::new(cfg.event_log_capacity);
        let auto_mode = cfg.auto_start;
        Ok(Self {
            vars,
            lifts: [Lift::new(LiftId::One), Lift::new(LiftId::Two)],
            cfg,
            events,
            auto_mode,
            watchdog_last_kick: now,
            watchdog_tripped: false,
        })
    }

    /// One supervisor tick: watchdog, input sampling, override adoption,
    /// both sequencers in order, reach recomputation, publication.
    pub fn tick(&mut self, now: Instant) -> Result<(), CellError> {
        self.service_watchdog(now)?;

        let inputs = [
            publish::sample_inputs(&self.vars, LiftId::One)?,
            publish::sample_inputs(&self.vars, LiftId::Two)?,
        ];

        self.adopt_tray_overrides()?;

        let mut admission_free = true;
        for id in LiftId::BOTH {
            let peer = PeerView::of(&self.lifts[id.peer().index()]);
            let mut ctx = TickCtx {
                inputs: inputs[id.index()],
                peer,
                cfg: &self.cfg,
                now,
                auto_mode: self.auto_mode,
                admission_free: &mut admission_free,
                events: &mut self.events,
            };
            sequencer::tick_lift(&mut self.lifts[id.index()], &mut ctx)?;
            self.lifts[id.index()].recompute_reach();
        }

        let main = publish::main_status(&self.lifts);
        self.vars.write_i16(paths::MAIN_STATUS, main.as_wire())?;
        for lift in &self.lifts {
            publish::publish_lift(&mut self.vars, lift)?;
        }
        Ok(())
    }

    fn service_watchdog(&mut self, now: Instant) -> Result<(), CellError> {
        if self.vars.read_bool(paths::WATCHDOG)? {
            self.vars.write_bool(paths::WATCHDOG, false)?;
            self.watchdog_last_kick = now;
            self.watchdog_tripped = false;
        } else if !self.watchdog_tripped
            && now.saturating_duration_since(self.watchdog_last_kick) > self.cfg.watchdog_window()
        {
            self.watchdog_tripped = true;
            self.events.push(CellEvent::WatchdogExpired);
            tracing::warn!("watchdog expired, forcing both lifts into error");
            for lift in &mut self.lifts {
                if !lift.in_error() {
                    sequencer::force_error(
                        lift,
                        fault::WATCHDOG_EXPIRED,
                        "Supervisor watchdog expired",
                        "Resume toggling xWatchDog, then toggle xClearError",
                        &mut self.events,
                    );
                }
            }
        }
        Ok(())
    }

    /// The single tolerated supervisor write into `PlcToEco`: a testing
    /// backdoor that forces the tray flag, used to stage BringAway flows.
    fn adopt_tray_overrides(&mut self) -> Result<(), CellError> {
        for lift in &mut self.lifts {
            let published = self.vars.read_bool(&paths::tray_in_elevator(lift.id))?;
            if published != lift.tray_present {
                lift.tray_present = published;
                self.events.push(CellEvent::TrayOverrideAdopted {
                    lift: lift.id.number(),
                    present: published,
                });
                tracing::info!(
                    lift = lift.id.number(),
                    present = published,
                    "tray override adopted from supervisor"
                );
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &CellConfig {
        &self.cfg
    }

    pub fn vars(&self) -> &VarSpace {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VarSpace {
        &mut self.vars
    }

    pub fn lift(&self, id: LiftId) -> &Lift {
        &self.lifts[id.index()]
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn set_auto_mode(&mut self, enabled: bool) {
        self.auto_mode = enabled;
    }

    /// Fault injection for commissioning tests: stall the lift's in-flight
    /// primitive so it runs into its deadline. Returns false when no
    /// primitive is in flight.
    pub fn inject_motion_fault(&mut self, id: LiftId) -> bool {
        self.lifts[id.index()].stall_motion()
    }

    pub fn snapshot(&self) -> CellSnapshot {
        CellSnapshot {
            main_status: publish::main_status(&self.lifts).as_wire(),
            station_count: 2,
            lifts: [
                LiftSnapshot::of(&self.lifts[0]),
                LiftSnapshot::of(&self.lifts[1]),
            ],
        }
    }
}

/// JSON-facing snapshot of the whole cell.
#[derive(Clone, Debug, Serialize)]
pub struct CellSnapshot {
    pub main_status: i16,
    pub station_count: i16,
    pub lifts: [LiftSnapshot; 2],
}

#[derive(Clone, Debug, Serialize)]
pub struct LiftSnapshot {
    pub lift: u8,
    pub cycle: Cycle,
    pub row: Row,
    pub fork_side: ForkSide,
    pub tray_present: bool,
    pub reach_min: Row,
    pub reach_max: Row,
    pub station_status: i16,
    pub cancel_reason: i16,
    pub error_code: i32,
    pub seq_comment: String,
}

impl LiftSnapshot {
    fn of(lift: &Lift) -> Self {
        Self {
            lift: lift.id.number(),
            cycle: lift.cycle,
            row: lift.row,
            fork_side: lift.fork_side,
            tray_present: lift.tray_present,
            reach_min: lift.reach.min,
            reach_max: lift.reach.max,
            station_status: lift.station_status().as_wire(),
            cancel_reason: lift.cancel_reason.map(CancelCode::as_wire).unwrap_or(0),
            error_code: lift.error_code,
            seq_comment: lift.seq_comment.clone(),
        }
    }
}
