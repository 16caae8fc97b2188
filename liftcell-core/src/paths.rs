//! Fixed fieldbus paths under the `EcoToPlc` and `PlcToEco` roots.
//!
//! Spellings here are the deployed wire contract, historic typos included:
//! lift 1 carries `iCancelAssignent` (missing 't') as an accepted and
//! published alias, and the station count is published as `iAmountOfSations`.

use crate::types::LiftId;

// ─── EcoToPlc: supervisor writes, core reads ──────────────────

pub const WATCHDOG: &str = "EcoToPlc/xWatchDog";

pub fn acknowledge_movement(lift: LiftId) -> String {
    format!("EcoToPlc/Elevator{}/xAcknowledgeMovement", lift.number())
}

pub fn cancel_assignment_in(lift: LiftId) -> String {
    format!("EcoToPlc/Elevator{}/iCancelAssignment", lift.number())
}

/// Historic misspelling, accepted on lift 1 only.
pub fn cancel_assignment_in_alias(lift: LiftId) -> Option<String> {
    match lift {
        LiftId::One => Some("EcoToPlc/Elevator1/iCancelAssignent".to_string()),
        LiftId::Two => None,
    }
}

pub fn clear_error(lift: LiftId) -> String {
    format!("EcoToPlc/Elevator{}/xClearError", lift.number())
}

fn assignment(lift: LiftId, field: &str) -> String {
    let n = lift.number();
    format!("EcoToPlc/Elevator{n}/Elevator{n}EcoSystAssignment/{field}")
}

pub fn task_type(lift: LiftId) -> String {
    assignment(lift, "iTaskType")
}

pub fn origination(lift: LiftId) -> String {
    assignment(lift, "iOrigination")
}

pub fn destination(lift: LiftId) -> String {
    assignment(lift, "iDestination")
}

// ─── PlcToEco: core writes, supervisor reads ──────────────────

pub const AMOUNT_OF_STATIONS: &str = "PlcToEco/StationDataToEco/iAmountOfSations";
pub const MAIN_STATUS: &str = "PlcToEco/StationDataToEco/iMainStatus";

fn station_data(lift: LiftId, field: &str) -> String {
    format!("PlcToEco/StationData/{}/{field}", lift.number())
}

pub fn cycle(lift: LiftId) -> String {
    station_data(lift, "iCycle")
}

pub fn station_status(lift: LiftId) -> String {
    station_data(lift, "iStationStatus")
}

pub fn handshake_job_type(lift: LiftId) -> String {
    station_data(lift, "Handshake/iJobType")
}

pub fn handshake_row_nr(lift: LiftId) -> String {
    station_data(lift, "Handshake/iRowNr")
}

pub fn cancel_assignment_out(lift: LiftId) -> String {
    station_data(lift, "iCancelAssignment")
}

/// Historic misspelling, published on lift 1 only.
pub fn cancel_assignment_out_alias(lift: LiftId) -> Option<String> {
    match lift {
        LiftId::One => Some(station_data(lift, "iCancelAssignent")),
        LiftId::Two => None,
    }
}

pub fn short_alarm_description(lift: LiftId) -> String {
    station_data(lift, "sShortAlarmDescription")
}

pub fn alarm_solution(lift: LiftId) -> String {
    station_data(lift, "sAlarmSolution")
}

pub fn station_state_description(lift: LiftId) -> String {
    station_data(lift, "sStationStateDescription")
}

fn elevator(lift: LiftId, field: &str) -> String {
    format!("PlcToEco/Elevator{}/{field}", lift.number())
}

pub fn seq_step_comment(lift: LiftId) -> String {
    elevator(lift, "sSeq_Step_comment")
}

pub fn elevator_row_location(lift: LiftId) -> String {
    elevator(lift, "iElevatorRowLocation")
}

/// Supervisor-writable override, the one tolerated write into `PlcToEco`.
pub fn tray_in_elevator(lift: LiftId) -> String {
    elevator(lift, "xTrayInElevator")
}

pub fn current_fork_side(lift: LiftId) -> String {
    elevator(lift, "iCurrentForkSide")
}

pub fn error_code(lift: LiftId) -> String {
    elevator(lift, "iErrorCode")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_paths_nest_the_lift_number_twice() {
        assert_eq!(
            task_type(LiftId::Two),
            "EcoToPlc/Elevator2/Elevator2EcoSystAssignment/iTaskType"
        );
    }

    #[test]
    fn cancel_alias_exists_only_on_lift_one() {
        assert!(cancel_assignment_in_alias(LiftId::One).is_some());
        assert!(cancel_assignment_in_alias(LiftId::Two).is_none());
        assert_eq!(
            cancel_assignment_out_alias(LiftId::One).unwrap(),
            "PlcToEco/StationData/1/iCancelAssignent"
        );
    }
}
