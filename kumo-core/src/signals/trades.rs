//! Trade extraction: turns a per-bar active/inactive series into trade windows.
//!
//! The series is encoded as a signed state (+1 long / -1 short when active,
//! 0 otherwise) and differenced. Every nonzero difference is a transition.
//! Transitions are paired in order: the first of a pair is the entry, the
//! second the exit. An unpaired final entry is reported as an open position.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::BarTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Signed encoding of an active/inactive state.
    pub fn encode(self, active: bool) -> i8 {
        match (self, active) {
            (_, false) => 0,
            (Side::Long, true) => 1,
            (Side::Short, true) => -1,
        }
    }
}

/// A completed entry/exit pair. The exit bar is the first bar at which the
/// signal is no longer active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeWindow {
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub exit_index: usize,
    pub exit_time: NaiveDateTime,
}

impl TradeWindow {
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}

/// An entry still active at the last bar of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
}

/// Trade windows for one side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLog {
    pub closed: Vec<TradeWindow>,
    pub open: Option<OpenPosition>,
}

/// Positions where the encoded state differs from the one before it.
///
/// The state before the first bar is taken as inactive.
pub fn transitions(side: Side, states: &[bool]) -> Vec<usize> {
    let mut previous = 0i8;
    let mut edges = Vec::new();
    for (i, &active) in states.iter().enumerate() {
        let current = side.encode(active);
        if current - previous != 0 {
            edges.push(i);
        }
        previous = current;
    }
    edges
}

/// Pair the transitions of `states` into trade windows stamped from `table`.
///
/// `states` is indexed like `table`; positions past the table are ignored.
pub fn extract_trades(side: Side, states: &[bool], table: &BarTable) -> TradeLog {
    let usable = &states[..states.len().min(table.len())];
    let stamp = |i: usize| table.bars()[i].timestamp;

    let mut log = TradeLog::default();
    for pair in transitions(side, usable).chunks(2) {
        match *pair {
            [entry, exit] => log.closed.push(TradeWindow {
                entry_index: entry,
                entry_time: stamp(entry),
                exit_index: exit,
                exit_time: stamp(exit),
            }),
            [entry] => {
                log.open = Some(OpenPosition {
                    entry_index: entry,
                    entry_time: stamp(entry),
                })
            }
            _ => {}
        }
    }
    log
}
