use serde::{Deserialize, Serialize};

// ─── Scalar aliases ───────────────────────────────────────────

/// Vertical stop position. 0 means undefined / park bay (outside the shaft).
pub type Row = i64;

/// Sequencer step code. Exposed externally as `iCycle`.
pub type Cycle = i32;

// ─── Lift identity ────────────────────────────────────────────

/// One of the two lifts sharing the shaft.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiftId {
    One,
    Two,
}

impl LiftId {
    pub const BOTH: [LiftId; 2] = [LiftId::One, LiftId::Two];

    /// Wire number, 1-based.
    pub fn number(self) -> u8 {
        match self {
            LiftId::One => 1,
            LiftId::Two => 2,
        }
    }

    pub fn index(self) -> usize {
        match self {
            LiftId::One => 0,
            LiftId::Two => 1,
        }
    }

    pub fn peer(self) -> LiftId {
        match self {
            LiftId::One => LiftId::Two,
            LiftId::Two => LiftId::One,
        }
    }
}

// ─── Task types ───────────────────────────────────────────────

/// Job kind requested by the supervisor via `iTaskType`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TaskType {
    Full,
    MoveTo,
    PreparePickup,
    BringAway,
}

impl TaskType {
    pub fn from_wire(raw: i64) -> Option<TaskType> {
        match raw {
            1 => Some(TaskType::Full),
            2 => Some(TaskType::MoveTo),
            3 => Some(TaskType::PreparePickup),
            4 => Some(TaskType::BringAway),
            _ => None,
        }
    }

    pub fn as_wire(self) -> i64 {
        match self {
            TaskType::Full => 1,
            TaskType::MoveTo => 2,
            TaskType::PreparePickup => 3,
            TaskType::BringAway => 4,
        }
    }
}

// ─── Cancel codes ─────────────────────────────────────────────

/// Reason a job was rejected or aborted. The wire values {1..7} are part of
/// the external contract; 0 on the wire means "no cancel".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CancelCode {
    PickupWithTray,
    DestinationOutOfReach,
    OriginOutOfReach,
    InvalidZeroPosition,
    LiftsCross,
    InvalidAssignment,
    ByEcosystem,
}

impl CancelCode {
    pub fn as_wire(self) -> i16 {
        match self {
            CancelCode::PickupWithTray => 1,
            CancelCode::DestinationOutOfReach => 2,
            CancelCode::OriginOutOfReach => 3,
            CancelCode::InvalidZeroPosition => 4,
            CancelCode::LiftsCross => 5,
            CancelCode::InvalidAssignment => 6,
            CancelCode::ByEcosystem => 7,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CancelCode::PickupWithTray => "pickup precondition violated",
            CancelCode::DestinationOutOfReach => "destination outside physical range",
            CancelCode::OriginOutOfReach => "origin outside physical range",
            CancelCode::InvalidZeroPosition => "origin or destination is zero",
            CancelCode::LiftsCross => "lifts would cross in the shaft",
            CancelCode::InvalidAssignment => "assignment is invalid",
            CancelCode::ByEcosystem => "cancelled by supervisor",
        }
    }
}

// ─── Fork side ────────────────────────────────────────────────

/// Lateral extension state of the fork.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForkSide {
    Left,
    #[default]
    Middle,
    Right,
}

impl ForkSide {
    pub fn as_wire(self) -> i32 {
        match self {
            ForkSide::Left => 0,
            ForkSide::Middle => 1,
            ForkSide::Right => 2,
        }
    }
}

// ─── Station status ───────────────────────────────────────────

/// Per-station status enum published as `iStationStatus`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StationStatus {
    NotApplicable,
    Ok,
    Notification,
    Warning,
    Error,
    Booting,
    Offline,
    SemiAuto,
    Teach,
    Hand,
    Home,
    Stop,
}

impl StationStatus {
    pub fn as_wire(self) -> i16 {
        match self {
            StationStatus::NotApplicable => 0,
            StationStatus::Ok => 1,
            StationStatus::Notification => 2,
            StationStatus::Warning => 3,
            StationStatus::Error => 4,
            StationStatus::Booting => 5,
            StationStatus::Offline => 6,
            StationStatus::SemiAuto => 7,
            StationStatus::Teach => 8,
            StationStatus::Hand => 9,
            StationStatus::Home => 10,
            StationStatus::Stop => 11,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StationStatus::NotApplicable => "not applicable",
            StationStatus::Ok => "running",
            StationStatus::Notification => "assignment rejected",
            StationStatus::Warning => "warning",
            StationStatus::Error => "error, clear required",
            StationStatus::Booting => "initializing",
            StationStatus::Offline => "offline",
            StationStatus::SemiAuto => "semi automatic",
            StationStatus::Teach => "teach mode",
            StationStatus::Hand => "hand mode",
            StationStatus::Home => "homing",
            StationStatus::Stop => "stopped",
        }
    }
}

// ─── Handshake ────────────────────────────────────────────────

/// Acknowledgement the sequencer is waiting for, published as
/// `Handshake/iJobType`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HandshakeKind {
    GetTray,
    SetTray,
}

impl HandshakeKind {
    pub fn as_wire(self) -> i32 {
        match self {
            HandshakeKind::GetTray => 1,
            HandshakeKind::SetTray => 2,
        }
    }
}

// ─── Reach ────────────────────────────────────────────────────

/// Closed row interval a lift occupies or has reserved. Row 0 (park) never
/// participates: a span built only from park rows is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Reach {
    pub min: Row,
    pub max: Row,
}

impl Reach {
    pub const EMPTY: Reach = Reach { min: 0, max: -1 };

    /// Span over the given rows, ignoring park (<= 0) entries.
    pub fn over<I: IntoIterator<Item = Row>>(rows: I) -> Reach {
        let mut min = Row::MAX;
        let mut max = Row::MIN;
        for row in rows {
            if row > 0 {
                min = min.min(row);
                max = max.max(row);
            }
        }
        if min > max {
            Reach::EMPTY
        } else {
            Reach { min, max }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max < self.min
    }

    pub fn contains(&self, row: Row) -> bool {
        !self.is_empty() && row >= self.min && row <= self.max
    }

    pub fn overlaps(&self, other: &Reach) -> bool {
        !self.is_empty() && !other.is_empty() && self.min <= other.max && other.min <= self.max
    }

    /// Widen by one row on each side to cover the pick/place offset
    /// excursions, clamped to stay out of the park position.
    pub fn widened_for_tray_transfer(self) -> Reach {
        if self.is_empty() {
            self
        } else {
            Reach {
                min: (self.min - 1).max(1),
                max: self.max + 1,
            }
        }
    }
}

// ─── Job views ────────────────────────────────────────────────

/// An admitted assignment, latched by the sequencer at validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    pub task: TaskType,
    pub origin: Row,
    pub destination: Row,
}

/// Raw per-lift supervisor inputs, sampled from `EcoToPlc` once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobInputs {
    pub task_type: i64,
    pub origin: Row,
    pub destination: Row,
    pub acknowledge: bool,
    pub cancel_request: i64,
    pub clear_error: bool,
}

// ─── Fault codes ──────────────────────────────────────────────

/// `iErrorCode` values surfaced with cycle 888.
pub mod fault {
    pub const WATCHDOG_EXPIRED: i32 = 10;
    pub const ENGINE_MOVE_TIMEOUT: i32 = 21;
    pub const FORK_MOVE_TIMEOUT: i32 = 22;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reach_ignores_park_rows() {
        assert!(Reach::over([0, 0]).is_empty());
        assert_eq!(Reach::over([0, 5, 12]), Reach { min: 5, max: 12 });
    }

    #[test]
    fn reach_overlap_is_symmetric_and_ignores_empty() {
        let a = Reach { min: 3, max: 10 };
        let b = Reach { min: 7, max: 7 };
        let c = Reach { min: 11, max: 15 };
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&Reach::EMPTY));
        assert!(!Reach::EMPTY.overlaps(&Reach::EMPTY));
    }

    #[test]
    fn widening_clamps_at_first_shaft_row() {
        let r = Reach { min: 1, max: 9 }.widened_for_tray_transfer();
        assert_eq!(r, Reach { min: 1, max: 10 });
    }

    #[test]
    fn task_type_wire_round_trip() {
        for raw in 1..=4 {
            assert_eq!(TaskType::from_wire(raw).unwrap().as_wire(), raw);
        }
        assert!(TaskType::from_wire(0).is_none());
        assert!(TaskType::from_wire(9).is_none());
    }
}
