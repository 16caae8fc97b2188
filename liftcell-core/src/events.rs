use std::collections::VecDeque;

use serde::Serialize;

use crate::motion::OffsetMode;
use crate::types::{CancelCode, Cycle, ForkSide, HandshakeKind, Row, TaskType};

/// Runtime events — the in-memory audit trail of everything the cell does.
#[derive(Clone, Debug, Serialize)]
pub enum CellEvent {
    JobRequested {
        lift: u8,
        task_type: i64,
    },
    JobAccepted {
        lift: u8,
        task: TaskType,
        origin: Row,
        destination: Row,
    },
    JobRejected {
        lift: u8,
        code: CancelCode,
    },
    JobCancelled {
        lift: u8,
    },
    JobCompleted {
        lift: u8,
        cycle: Cycle,
    },
    HandshakePublished {
        lift: u8,
        kind: HandshakeKind,
    },
    HandshakeAcknowledged {
        lift: u8,
        kind: HandshakeKind,
    },
    EngineMoveStarted {
        lift: u8,
        target: Row,
        offset: OffsetMode,
    },
    ForkMoveStarted {
        lift: u8,
        side: ForkSide,
    },
    MotionCompleted {
        lift: u8,
    },
    MotionTimedOut {
        lift: u8,
    },
    TrayPicked {
        lift: u8,
        row: Row,
    },
    TrayPlaced {
        lift: u8,
        row: Row,
    },
    TrayOverrideAdopted {
        lift: u8,
        present: bool,
    },
    ErrorEntered {
        lift: u8,
        code: i32,
    },
    ErrorCleared {
        lift: u8,
    },
    WatchdogExpired,
}

/// Bounded, sequence-numbered event log. Oldest entries fall off the front;
/// sequence numbers keep climbing so readers can page with `read_from`.
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<(u64, CellEvent)>,
    next_seq: u64,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            next_seq: 1,
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, event: CellEvent) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        tracing::debug!(seq, ?event, "cell event");
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((seq, event));
        seq
    }

    pub fn read_from(&self, from_seq: u64) -> Vec<(u64, CellEvent)> {
        self.entries
            .iter()
            .filter(|(seq, _)| *seq >= from_seq)
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u64, CellEvent)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_survive_eviction() {
        let mut log = EventLog::new(2);
        log.push(CellEvent::WatchdogExpired);
        log.push(CellEvent::WatchdogExpired);
        log.push(CellEvent::WatchdogExpired);
        let entries = log.read_from(0);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, 2);
        assert_eq!(entries[1].0, 3);
        assert_eq!(log.read_from(3).len(), 1);
    }
}
