#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic claiming system responsible for emitting continuous claim commands.

use std::time::Duration;

use keeper_core::{Command, Event, PlayerId, TileCoord};

/// Configuration parameters required to construct the claiming system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    claim_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided claim cadence.
    #[must_use]
    pub const fn new(claim_interval: Duration) -> Self {
        Self { claim_interval }
    }
}

/// A worker standing on or next to a tile it is claiming for its keeper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClaimAssignment {
    /// Keeper the worker serves.
    pub player: PlayerId,
    /// Tile being worked.
    pub tile: TileCoord,
}

impl ClaimAssignment {
    /// Creates a new assignment.
    #[must_use]
    pub const fn new(player: PlayerId, tile: TileCoord) -> Self {
        Self { player, tile }
    }
}

/// Pure system that converts elapsed simulation time into `ApplyClaim` commands.
///
/// Every full interval each assignment receives one claim application. Time
/// does not bank while nobody is assigned.
#[derive(Debug)]
pub struct Claiming {
    claim_interval: Duration,
    accumulator: Duration,
}

impl Claiming {
    /// Creates a new claiming system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            claim_interval: config.claim_interval,
            accumulator: Duration::ZERO,
        }
    }

    /// Consumes events and the current assignments to emit claim commands.
    ///
    /// The `still_claimable` closure should mirror the world's claim
    /// predicates so that finished tiles stop receiving work.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        assignments: &[ClaimAssignment],
        mut still_claimable: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(&ClaimAssignment) -> bool,
    {
        if assignments.is_empty() {
            self.accumulator = Duration::ZERO;
            return;
        }

        if self.claim_interval.is_zero() {
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let rounds = self.resolve_claim_rounds();

        for _ in 0..rounds {
            for assignment in assignments {
                if still_claimable(assignment) {
                    out.push(Command::ApplyClaim {
                        tile: assignment.tile,
                        player: assignment.player,
                    });
                }
            }
        }
    }

    fn resolve_claim_rounds(&mut self) -> usize {
        if self.claim_interval.is_zero() {
            return 0;
        }

        let mut rounds = 0;
        while self.accumulator >= self.claim_interval {
            self.accumulator -= self.claim_interval;
            rounds += 1;
        }
        rounds
    }
}
