//! Variable publication and input sampling.
//!
//! Each tick the Cell samples the `EcoToPlc` side into per-lift job views and
//! mirrors model state onto the `PlcToEco` side. Publication goes through
//! `VarSpace::write`, which only stores (and notifies) on change, so a
//! listener on the fieldbus sees tick-scoped diffs. Supervisor writes into
//! `PlcToEco` are plain overwrites here and get reverted by the next diff —
//! except `xTrayInElevator`, which the Cell adopts before publishing.

use crate::error::CellError;
use crate::lift::Lift;
use crate::paths;
use crate::types::{JobInputs, LiftId, StationStatus};
use crate::varspace::{Value, VarSpace};

/// Declare the whole fixed address space with typed defaults.
pub(crate) fn seed(vars: &mut VarSpace) {
    vars.declare(paths::WATCHDOG, Value::Bool(false));
    vars.declare(paths::AMOUNT_OF_STATIONS, Value::I16(2));
    vars.declare(paths::MAIN_STATUS, Value::I16(StationStatus::Booting.as_wire()));

    for lift in LiftId::BOTH {
        vars.declare(&paths::acknowledge_movement(lift), Value::Bool(false));
        vars.declare(&paths::cancel_assignment_in(lift), Value::I64(0));
        if let Some(alias) = paths::cancel_assignment_in_alias(lift) {
            vars.declare(&alias, Value::I64(0));
        }
        vars.declare(&paths::clear_error(lift), Value::Bool(false));
        vars.declare(&paths::task_type(lift), Value::I64(0));
        vars.declare(&paths::origination(lift), Value::I64(0));
        vars.declare(&paths::destination(lift), Value::I64(0));

        vars.declare(&paths::cycle(lift), Value::I32(0));
        vars.declare(&paths::station_status(lift), Value::I16(0));
        vars.declare(&paths::handshake_job_type(lift), Value::I32(0));
        vars.declare(&paths::handshake_row_nr(lift), Value::I32(0));
        vars.declare(&paths::cancel_assignment_out(lift), Value::I16(0));
        if let Some(alias) = paths::cancel_assignment_out_alias(lift) {
            vars.declare(&alias, Value::I16(0));
        }
        vars.declare(&paths::short_alarm_description(lift), Value::Str(String::new()));
        vars.declare(&paths::alarm_solution(lift), Value::Str(String::new()));
        vars.declare(&paths::station_state_description(lift), Value::Str(String::new()));
        vars.declare(&paths::seq_step_comment(lift), Value::Str(String::new()));
        vars.declare(&paths::elevator_row_location(lift), Value::I32(0));
        vars.declare(&paths::tray_in_elevator(lift), Value::Bool(false));
        vars.declare(
            &paths::current_fork_side(lift),
            Value::I32(crate::types::ForkSide::Middle.as_wire()),
        );
        vars.declare(&paths::error_code(lift), Value::I32(0));
    }
}

/// Snapshot one lift's supervisor inputs. On lift 1 the historic
/// `iCancelAssignent` spelling is honored alongside the corrected one.
pub(crate) fn sample_inputs(vars: &VarSpace, lift: LiftId) -> Result<JobInputs, CellError> {
    let mut cancel_request = vars.read_i64(&paths::cancel_assignment_in(lift))?;
    if cancel_request == 0 {
        if let Some(alias) = paths::cancel_assignment_in_alias(lift) {
            cancel_request = vars.read_i64(&alias)?;
        }
    }
    Ok(JobInputs {
        task_type: vars.read_i64(&paths::task_type(lift))?,
        origin: vars.read_i64(&paths::origination(lift))?,
        destination: vars.read_i64(&paths::destination(lift))?,
        acknowledge: vars.read_bool(&paths::acknowledge_movement(lift))?,
        cancel_request,
        clear_error: vars.read_bool(&paths::clear_error(lift))?,
    })
}

/// Mirror one lift onto its `PlcToEco` paths.
pub(crate) fn publish_lift(vars: &mut VarSpace, lift: &Lift) -> Result<(), CellError> {
    let id = lift.id;
    let status = lift.station_status();

    vars.write_i32(&paths::cycle(id), lift.cycle)?;
    vars.write_i16(&paths::station_status(id), status.as_wire())?;
    vars.write_str(&paths::station_state_description(id), status.description())?;
    vars.write_i32(
        &paths::handshake_job_type(id),
        lift.handshake.map(|h| h.as_wire()).unwrap_or(0),
    )?;
    // Declared on the wire but never consumed by the supervisor.
    vars.write_i32(&paths::handshake_row_nr(id), 0)?;

    let cancel = lift.cancel_reason.map(|c| c.as_wire()).unwrap_or(0);
    vars.write_i16(&paths::cancel_assignment_out(id), cancel)?;
    if let Some(alias) = paths::cancel_assignment_out_alias(id) {
        vars.write_i16(&alias, cancel)?;
    }

    vars.write_str(&paths::short_alarm_description(id), &lift.alarm_description)?;
    vars.write_str(&paths::alarm_solution(id), &lift.alarm_solution)?;
    vars.write_str(&paths::seq_step_comment(id), &lift.seq_comment)?;
    vars.write_i32(&paths::elevator_row_location(id), lift.row as i32)?;
    vars.write_bool(&paths::tray_in_elevator(id), lift.tray_present)?;
    vars.write_i32(&paths::current_fork_side(id), lift.fork_side.as_wire())?;
    vars.write_i32(&paths::error_code(id), lift.error_code)?;
    Ok(())
}

/// Aggregate main status: the worst lift wins.
pub(crate) fn main_status(lifts: &[Lift; 2]) -> StationStatus {
    let ranked = [
        StationStatus::Error,
        StationStatus::Warning,
        StationStatus::Notification,
        StationStatus::Booting,
        StationStatus::Stop,
    ];
    for status in ranked {
        if lifts.iter().any(|l| l.station_status() == status) {
            return status;
        }
    }
    StationStatus::Ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_space_samples_to_default_inputs() {
        let mut vars = VarSpace::new();
        seed(&mut vars);
        let inputs = sample_inputs(&vars, LiftId::One).unwrap();
        assert_eq!(inputs, JobInputs::default());
    }

    #[test]
    fn lift_one_cancel_alias_is_honored() {
        let mut vars = VarSpace::new();
        seed(&mut vars);
        vars.write_i64("EcoToPlc/Elevator1/iCancelAssignent", 7).unwrap();
        assert_eq!(sample_inputs(&vars, LiftId::One).unwrap().cancel_request, 7);
        // The corrected spelling wins when both are set.
        vars.write_i64(&paths::cancel_assignment_in(LiftId::One), 3).unwrap();
        assert_eq!(sample_inputs(&vars, LiftId::One).unwrap().cancel_request, 3);
    }

    #[test]
    fn publish_mirrors_lift_state_as_diffs() {
        let mut vars = VarSpace::new();
        seed(&mut vars);
        let mut lift = Lift::new(LiftId::Two);
        lift.row = 9;
        lift.cycle = 10;
        publish_lift(&mut vars, &lift).unwrap();
        assert_eq!(vars.read_i32(&paths::cycle(LiftId::Two)).unwrap(), 10);
        assert_eq!(
            vars.read_i32(&paths::elevator_row_location(LiftId::Two)).unwrap(),
            9
        );
        // Unchanged republication must not count as a change.
        assert!(!vars
            .write_i32(&paths::elevator_row_location(LiftId::Two), 9)
            .unwrap());
    }
}
