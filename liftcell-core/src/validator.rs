//! Job admission checks.
//!
//! `validate` is a pure function over the request, the target lift, a
//! snapshot of the peer, and the configured row range. Checks run in a fixed
//! order and the first failure wins — the resulting cancel codes are part of
//! the wire contract, so the ordering is load-bearing.

use crate::config::CellConfig;
use crate::lift::{Lift, PeerView};
use crate::types::{CancelCode, JobRequest, Reach, Row, TaskType};

/// Row interval the requested job would reserve, seen from `current_row`.
/// Tray-transfer flows widen by one row for the pick/place offset
/// excursions; park rows (0) never contribute.
pub fn requested_reach(req: &JobRequest, current_row: Row) -> Reach {
    let span = match req.task {
        TaskType::Full => Reach::over([current_row, req.origin, req.destination]),
        TaskType::MoveTo => Reach::over([current_row, req.destination]),
        TaskType::PreparePickup => Reach::over([current_row, req.origin]),
        TaskType::BringAway => Reach::over([current_row, req.destination]),
    };
    match req.task {
        TaskType::Full | TaskType::BringAway => span.widened_for_tray_transfer(),
        TaskType::MoveTo | TaskType::PreparePickup => span,
    }
}

/// Admission check. Returns the cancel code of the first failed check.
pub fn validate(
    req: &JobRequest,
    lift: &Lift,
    peer: &PeerView,
    cfg: &CellConfig,
) -> Result<(), CancelCode> {
    // 1. Crossing the peer's reserved shaft interval.
    if peer.active && requested_reach(req, lift.row).overlaps(&peer.reach) {
        return Err(CancelCode::LiftsCross);
    }

    // 2. Zero positions. MoveTo is destination-driven; its origin input is
    //    informational only.
    match req.task {
        TaskType::Full => {
            if req.origin == 0 || req.destination == 0 {
                return Err(CancelCode::InvalidZeroPosition);
            }
        }
        TaskType::PreparePickup | TaskType::BringAway => {
            if req.origin == 0 {
                return Err(CancelCode::InvalidZeroPosition);
            }
        }
        TaskType::MoveTo => {}
    }

    // 3. Pickup precondition. BringAway starts from a tray already on the
    //    forks, so its precondition is inverted.
    match req.task {
        TaskType::Full | TaskType::PreparePickup => {
            if lift.tray_present {
                return Err(CancelCode::PickupWithTray);
            }
        }
        TaskType::BringAway => {
            if !lift.tray_present {
                return Err(CancelCode::PickupWithTray);
            }
        }
        TaskType::MoveTo => {}
    }

    // 4. Destination inside the physical range.
    if req.destination > 0 && !cfg.row_range().contains(&req.destination) {
        return Err(CancelCode::DestinationOutOfReach);
    }

    // 5. Flows that require a destination.
    if matches!(req.task, TaskType::MoveTo | TaskType::BringAway) && req.destination <= 0 {
        return Err(CancelCode::InvalidAssignment);
    }

    // 6. Origin inside the physical range.
    if req.origin > 0 && !cfg.row_range().contains(&req.origin) {
        return Err(CancelCode::OriginOutOfReach);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LiftId;

    fn idle_peer() -> PeerView {
        PeerView {
            active: false,
            errored: false,
            row: 0,
            reach: Reach::EMPTY,
        }
    }

    fn busy_peer(min: Row, max: Row) -> PeerView {
        PeerView {
            active: true,
            errored: false,
            row: min,
            reach: Reach { min, max },
        }
    }

    fn req(task: TaskType, origin: Row, destination: Row) -> JobRequest {
        JobRequest {
            task,
            origin,
            destination,
        }
    }

    fn lift() -> Lift {
        Lift::new(LiftId::One)
    }

    fn cfg() -> CellConfig {
        CellConfig::default()
    }

    #[test]
    fn accepts_a_plain_full_job() {
        let r = req(TaskType::Full, 5, 12);
        assert_eq!(validate(&r, &lift(), &idle_peer(), &cfg()), Ok(()));
    }

    #[test]
    fn crossing_check_runs_first() {
        // Origin 0 would be code 4, but the peer conflict must win.
        let r = req(TaskType::Full, 0, 7);
        let peer = busy_peer(3, 10);
        assert_eq!(
            validate(&r, &lift(), &peer, &cfg()),
            Err(CancelCode::LiftsCross)
        );
    }

    #[test]
    fn moveto_into_peer_reach_is_a_crossing() {
        let r = req(TaskType::MoveTo, 0, 7);
        assert_eq!(
            validate(&r, &lift(), &busy_peer(3, 10), &cfg()),
            Err(CancelCode::LiftsCross)
        );
    }

    #[test]
    fn zero_positions_reject_with_code_4() {
        assert_eq!(
            validate(&req(TaskType::Full, 0, 9), &lift(), &idle_peer(), &cfg()),
            Err(CancelCode::InvalidZeroPosition)
        );
        assert_eq!(
            validate(&req(TaskType::Full, 9, 0), &lift(), &idle_peer(), &cfg()),
            Err(CancelCode::InvalidZeroPosition)
        );
        assert_eq!(
            validate(
                &req(TaskType::PreparePickup, 0, 0),
                &lift(),
                &idle_peer(),
                &cfg()
            ),
            Err(CancelCode::InvalidZeroPosition)
        );
    }

    #[test]
    fn moveto_origin_is_not_zero_checked() {
        let r = req(TaskType::MoveTo, 0, 8);
        assert_eq!(validate(&r, &lift(), &idle_peer(), &cfg()), Ok(()));
    }

    #[test]
    fn pickup_with_tray_rejects_with_code_1() {
        let mut l = lift();
        l.tray_present = true;
        assert_eq!(
            validate(&req(TaskType::Full, 4, 9), &l, &idle_peer(), &cfg()),
            Err(CancelCode::PickupWithTray)
        );
        assert_eq!(
            validate(&req(TaskType::PreparePickup, 4, 0), &l, &idle_peer(), &cfg()),
            Err(CancelCode::PickupWithTray)
        );
    }

    #[test]
    fn bring_away_requires_the_tray() {
        assert_eq!(
            validate(&req(TaskType::BringAway, 4, 9), &lift(), &idle_peer(), &cfg()),
            Err(CancelCode::PickupWithTray)
        );
        let mut l = lift();
        l.tray_present = true;
        assert_eq!(
            validate(&req(TaskType::BringAway, 4, 9), &l, &idle_peer(), &cfg()),
            Ok(())
        );
    }

    #[test]
    fn destination_range_beats_missing_destination_ordering() {
        // Destination beyond row_max is code 2; missing destination is 6.
        assert_eq!(
            validate(&req(TaskType::MoveTo, 0, 99), &lift(), &idle_peer(), &cfg()),
            Err(CancelCode::DestinationOutOfReach)
        );
        assert_eq!(
            validate(&req(TaskType::MoveTo, 0, 0), &lift(), &idle_peer(), &cfg()),
            Err(CancelCode::InvalidAssignment)
        );
    }

    #[test]
    fn origin_range_is_checked_last() {
        assert_eq!(
            validate(&req(TaskType::Full, 99, 9), &lift(), &idle_peer(), &cfg()),
            Err(CancelCode::OriginOutOfReach)
        );
        // A bad origin together with a bad destination reports the
        // destination first.
        assert_eq!(
            validate(&req(TaskType::Full, 99, 77), &lift(), &idle_peer(), &cfg()),
            Err(CancelCode::DestinationOutOfReach)
        );
    }

    #[test]
    fn requested_reach_matches_the_documented_span() {
        let r = req(TaskType::Full, 3, 10);
        assert_eq!(requested_reach(&r, 0), Reach { min: 2, max: 11 });
        let m = req(TaskType::MoveTo, 0, 7);
        assert_eq!(requested_reach(&m, 0), Reach { min: 7, max: 7 });
    }
}
