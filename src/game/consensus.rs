//! Global hint consensus
//!
//! A hint is revealed to everyone once every currently-eligible player has asked for it.
//! Eligible means: at least one wrong attempt this round, not solved, not failed.
//! The reveal is a one-shot latch per round.

use crate::types::PlayerId;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub requested: usize,
    pub eligible: usize,
}

impl Progress {
    pub fn is_unanimous(&self) -> bool {
        self.eligible > 0 && self.requested == self.eligible
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    NotEligible,
    AlreadyRevealed,
    AlreadyRequested(Progress),
    Recorded(Progress),
    /// This vote completed the set; the latch is now set
    Unanimous(Progress),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityUpdate {
    pub progress: Progress,
    /// The change completed the set and set the latch
    pub unanimous: bool,
}

#[derive(Debug, Default)]
pub struct GlobalHintConsensus {
    requesters: HashSet<PlayerId>,
    revealed: bool,
}

impl GlobalHintConsensus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Requesters that are still eligible over everyone eligible
    pub fn progress(&self, eligible: &HashSet<PlayerId>) -> Progress {
        Progress {
            requested: self
                .requesters
                .iter()
                .filter(|id| eligible.contains(*id))
                .count(),
            eligible: eligible.len(),
        }
    }

    pub fn vote(&mut self, player: &PlayerId, eligible: &HashSet<PlayerId>) -> VoteOutcome {
        if self.revealed {
            return VoteOutcome::AlreadyRevealed;
        }
        if !eligible.contains(player) {
            return VoteOutcome::NotEligible;
        }
        if !self.requesters.insert(player.clone()) {
            return VoteOutcome::AlreadyRequested(self.progress(eligible));
        }

        let progress = self.progress(eligible);
        if progress.is_unanimous() {
            self.revealed = true;
            VoteOutcome::Unanimous(progress)
        } else {
            VoteOutcome::Recorded(progress)
        }
    }

    /// Re-evaluate after a player entered or left the eligible set.
    ///
    /// Returns `None` when nothing is worth announcing: already revealed, or nobody has voted.
    pub fn eligibility_changed(
        &mut self,
        eligible: &HashSet<PlayerId>,
    ) -> Option<EligibilityUpdate> {
        if self.revealed {
            return None;
        }
        let progress = self.progress(eligible);
        if progress.requested == 0 {
            return None;
        }
        let unanimous = progress.is_unanimous();
        if unanimous {
            self.revealed = true;
        }
        Some(EligibilityUpdate {
            progress,
            unanimous,
        })
    }
}
