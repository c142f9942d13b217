//! Rate oracle seam: the exchange-side randomness the core reacts to.
//!
//! The core never touches an entropy source directly. Whether the rate
//! window is open, how many instructions a drain may dispatch, and how many
//! operations the exchange acknowledges per tick all come through
//! [`RateOracle`], so the whole engine is deterministic under a scripted
//! implementation and reproducible under a seeded one.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the exchange-side rate decisions.
pub trait RateOracle {
    /// Is the rate window open for an immediate send? Only consulted when
    /// the throttle queue is empty — a non-empty queue keeps the window
    /// closed regardless.
    fn window_open(&mut self) -> bool;

    /// How many instructions the window admits for this drain.
    fn drain_window(&mut self) -> u32;

    /// How many `SentToMarket` operations the exchange acknowledges this
    /// tick.
    fn ack_quota(&mut self) -> u32;
}

/// Seeded pseudo-random oracle: Bernoulli window-open draws and uniform
/// drain/ack windows.
pub struct RandomOracle {
    rng: StdRng,
    open_probability: f64,
    max_drain: u32,
    max_acks: u32,
}

impl RandomOracle {
    /// `closed_probability` is the chance a fresh send attempt finds the
    /// window closed.
    pub fn new(seed: u64, closed_probability: f64, max_drain: u32, max_acks: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            open_probability: 1.0 - closed_probability,
            max_drain,
            max_acks,
        }
    }
}

impl RateOracle for RandomOracle {
    fn window_open(&mut self) -> bool {
        self.rng.gen_bool(self.open_probability)
    }

    fn drain_window(&mut self) -> u32 {
        self.rng.gen_range(0..=self.max_drain)
    }

    fn ack_quota(&mut self) -> u32 {
        self.rng.gen_range(0..=self.max_acks)
    }
}

/// Fully deterministic oracle for tests: draws are popped from scripts,
/// with generous defaults once a script runs dry (window open, maximal
/// drain and ack windows).
#[derive(Default)]
pub struct ScriptedOracle {
    window: VecDeque<bool>,
    drains: VecDeque<u32>,
    acks: VecDeque<u32>,
}

impl ScriptedOracle {
    /// An oracle whose window is always open and whose drain/ack windows
    /// are always 10.
    pub fn always_open() -> Self {
        Self::default()
    }

    /// Script the next window-open draws.
    pub fn with_window(mut self, draws: &[bool]) -> Self {
        self.window.extend(draws);
        self
    }

    /// Script the next drain windows.
    pub fn with_drains(mut self, draws: &[u32]) -> Self {
        self.drains.extend(draws);
        self
    }

    /// Script the next ack quotas.
    pub fn with_acks(mut self, draws: &[u32]) -> Self {
        self.acks.extend(draws);
        self
    }
}

impl RateOracle for ScriptedOracle {
    fn window_open(&mut self) -> bool {
        self.window.pop_front().unwrap_or(true)
    }

    fn drain_window(&mut self) -> u32 {
        self.drains.pop_front().unwrap_or(10)
    }

    fn ack_quota(&mut self) -> u32 {
        self.acks.pop_front().unwrap_or(10)
    }
}
