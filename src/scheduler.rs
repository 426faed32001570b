//! Deferred boost actions.
//!
//! A `boost` request turns a channel on immediately and leaves behind an
//! [`Action`] that turns it off again once a temperature or a wall-clock
//! deadline is reached.  The Controller evaluates the pending set once
//! per cycle:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  pending (sorted by metric, threshold, pin, state)           │
//! │                                                              │
//! │   (temp, 40, 3, off)  (temp, 60, 1, off)  (time, 1e9, 2, off)│
//! │          │                                                   │
//! │          ▼  first whose condition holds                      │
//! │   remove ──▶ ChannelControl::control ──▶ acked?              │
//! │                                            │ no              │
//! │                                            ▼                 │
//! │                                     re-insert unchanged      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! At most one action fires per cycle.

use core::cmp::Ordering;
use core::fmt;

use log::{error, info, warn};

use crate::app::ports::ChannelControl;
use crate::radio::Channel;

// ═══════════════════════════════════════════════════════════════
//  Action types
// ═══════════════════════════════════════════════════════════════

/// What an action's threshold is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    /// Local temperature in °C.
    Temp,
    /// Wall-clock seconds since the Unix epoch.
    Time,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temp => "temp",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Switch {
    Off,
    On,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

impl From<bool> for Switch {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::On => "on",
        })
    }
}

/// One deferred relay command.
#[derive(Debug, Clone, Copy)]
pub struct Action {
    pub metric: Metric,
    /// °C for [`Metric::Temp`], absolute epoch seconds for [`Metric::Time`].
    pub threshold: f64,
    pub channel: Channel,
    pub state: Switch,
}

impl Action {
    /// Whether this action is due given the current readings.
    ///
    /// A `temp` action is never due while no local temperature has been
    /// read yet.
    pub fn is_due(&self, temperature: Option<f64>, now: f64) -> bool {
        match self.metric {
            Metric::Temp => temperature.is_some_and(|t| t >= self.threshold),
            Metric::Time => now >= self.threshold,
        }
    }

    /// Evaluation order: metric (`temp` first), threshold ascending, wire
    /// pin ascending, then `off` before `on`.
    pub fn evaluation_order(&self, other: &Self) -> Ordering {
        self.metric
            .cmp(&other.metric)
            .then_with(|| self.threshold.total_cmp(&other.threshold))
            .then_with(|| self.channel.to_wire().cmp(&other.channel.to_wire()))
            .then_with(|| self.state.cmp(&other.state))
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.evaluation_order(other) == Ordering::Equal
    }
}

impl Eq for Action {}

impl PartialOrd for Action {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Action {
    fn cmp(&self, other: &Self) -> Ordering {
        self.evaluation_order(other)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.metric, self.threshold, self.channel, self.state
        )
    }
}

/// Result of one evaluation that found a due action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Firing {
    pub action: Action,
    /// `false` when the command went unacknowledged and the action was
    /// put back.
    pub succeeded: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Pending actions, always held in evaluation order.
#[derive(Debug, Default)]
pub struct ActionScheduler {
    pending: Vec<Action>,
}

impl ActionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, action: Action) {
        let at = self.pending.partition_point(|a| a <= &action);
        info!("scheduler: queued {}", action);
        self.pending.insert(at, action);
    }

    /// Pending actions in evaluation order.
    pub fn pending(&self) -> &[Action] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// `[(temp, 60, 1, off), (time, 1700000000, 2, off)]`
    pub fn describe(&self) -> String {
        let items: Vec<String> = self.pending.iter().map(Action::to_string).collect();
        format!("[{}]", items.join(", "))
    }

    /// Fire the first due action, if any.
    ///
    /// An unacknowledged command puts the action back for the next cycle.
    /// A channel that does not exist can never succeed, so that action is
    /// logged and dropped instead.
    pub fn evaluate(
        &mut self,
        temperature: Option<f64>,
        now: f64,
        ctl: &mut impl ChannelControl,
    ) -> Option<Firing> {
        let index = self
            .pending
            .iter()
            .position(|a| a.is_due(temperature, now))?;
        let action = self.pending.remove(index);
        info!("scheduler: firing {}", action);

        let succeeded = match ctl.control(action.channel, action.state.is_on()) {
            Ok(true) => true,
            Ok(false) => {
                warn!("scheduler: {} not acknowledged, will retry", action);
                self.schedule(action);
                false
            }
            Err(e) => {
                error!("scheduler: dropping {}: {}", action, e);
                false
            }
        };
        Some(Firing { action, succeeded })
    }
}
