//! Driving a compactor to a fixed point.
//!
//! Combining can make segments eligible for condensing and condensing can
//! make segments eligible for combining, so one pass of each is not enough.
//! The driver runs cycles of "combine until no progress, then condense until
//! no progress" and stops after the first cycle in which neither primitive
//! changed anything:
//!
//! ```text
//!            progress                progress
//!           ┌────────┐              ┌────────┐
//!           ▼        │              ▼        │
//!       Combining ───┘──none──► Condensing ──┘
//!           ▲                       │
//!           └── cycle had progress ─┤
//!                                   └── no progress in cycle ──► Stable
//! ```

use crate::compactor::LogCompactor;
use crate::error::CombineResult;
use serde::Serialize;
use tracing::{debug, info};

/// Phase of the fixed-point loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    /// Calling `combine_logs` until it reports no progress.
    Combining,
    /// Calling `condense_old_logs` until it reports no progress.
    Condensing,
    /// A full cycle made no progress.
    Stable,
}

/// Counters collected while driving a compactor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    /// Calls to `combine_logs`.
    pub combine_calls: usize,
    /// Calls to `combine_logs` that reported progress.
    pub combined: usize,
    /// Calls to `condense_old_logs`.
    pub condense_calls: usize,
    /// Calls to `condense_old_logs` that reported progress.
    pub condensed: usize,
    /// Completed combine/condense cycles.
    pub cycles: usize,
}

/// Runs a compactor's primitives until neither makes progress.
#[derive(Debug)]
pub struct ConsolidationDriver<C: LogCompactor> {
    compactor: C,
    phase: DriverPhase,
    cycle_progress: bool,
    stats: DriverStats,
}

impl<C: LogCompactor> ConsolidationDriver<C> {
    /// Creates a driver in the `Combining` phase.
    pub fn new(compactor: C) -> Self {
        Self {
            compactor,
            phase: DriverPhase::Combining,
            cycle_progress: false,
            stats: DriverStats::default(),
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// Returns the counters so far.
    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Performs one primitive call and advances the phase.
    ///
    /// A no-op once `Stable`. Errors are returned as-is and leave the phase
    /// unchanged; they are not retried.
    pub fn step(&mut self) -> CombineResult<DriverPhase> {
        match self.phase {
            DriverPhase::Combining => {
                self.stats.combine_calls += 1;
                if self.compactor.combine_logs()? {
                    self.stats.combined += 1;
                    self.cycle_progress = true;
                } else {
                    self.phase = DriverPhase::Condensing;
                }
            }
            DriverPhase::Condensing => {
                self.stats.condense_calls += 1;
                if self.compactor.condense_old_logs()? {
                    self.stats.condensed += 1;
                    self.cycle_progress = true;
                } else {
                    self.stats.cycles += 1;
                    self.phase = if self.cycle_progress {
                        DriverPhase::Combining
                    } else {
                        DriverPhase::Stable
                    };
                    debug!(
                        cycle = self.stats.cycles,
                        progress = self.cycle_progress,
                        "finished combine and condense cycle"
                    );
                    self.cycle_progress = false;
                }
            }
            DriverPhase::Stable => {}
        }
        Ok(self.phase)
    }

    /// Steps until the compactor reaches a fixed point.
    pub fn run_to_fixed_point(&mut self) -> CombineResult<DriverStats> {
        while self.step()? != DriverPhase::Stable {}
        info!(
            iterations = self.stats.cycles,
            combined = self.stats.combined,
            condensed = self.stats.condensed,
            "completed combine and condense loop"
        );
        Ok(self.stats)
    }

    /// Drives to a fixed point, then flushes and shuts the compactor down.
    pub fn finish(mut self) -> CombineResult<DriverStats> {
        let stats = self.run_to_fixed_point()?;
        self.compactor.flush()?;
        self.compactor.shutdown()?;
        Ok(stats)
    }
}
