//! Skip / go-back vote tallies

use crate::types::{VoteKind, VoteOutcome};
use queuer_core::RequesterId;
use std::collections::HashSet;

/// Distinct requesters voting for each action
#[derive(Debug, Clone, Default)]
pub struct VoteBox {
    next: HashSet<RequesterId>,
    previous: HashSet<RequesterId>,
}

impl VoteBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a vote
    ///
    /// Requesters outside `participants` are ignored. Each requester counts
    /// once. The action triggers once the count exceeds
    /// `threshold * participants`.
    pub fn cast(
        &mut self,
        kind: VoteKind,
        requester: RequesterId,
        participants: &[RequesterId],
        threshold: f64,
    ) -> VoteOutcome {
        if !participants.contains(&requester) {
            return VoteOutcome::Ignored;
        }

        let tally = self.tally_mut(kind);
        tally.insert(requester);
        let votes = tally.len();

        let needed = threshold * participants.len() as f64;
        if votes as f64 > needed {
            VoteOutcome::Triggered
        } else {
            VoteOutcome::Recorded {
                votes,
                required: required_votes(participants.len(), threshold),
            }
        }
    }

    /// Votes recorded for an action
    pub fn count(&self, kind: VoteKind) -> usize {
        match kind {
            VoteKind::Next => self.next.len(),
            VoteKind::Previous => self.previous.len(),
        }
    }

    /// Reset both tallies
    pub fn clear(&mut self) {
        self.next.clear();
        self.previous.clear();
    }

    fn tally_mut(&mut self, kind: VoteKind) -> &mut HashSet<RequesterId> {
        match kind {
            VoteKind::Next => &mut self.next,
            VoteKind::Previous => &mut self.previous,
        }
    }
}

/// Smallest vote count strictly above `threshold * participants`
fn required_votes(participants: usize, threshold: f64) -> usize {
    (threshold * participants as f64).floor() as usize + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people(n: usize) -> Vec<RequesterId> {
        (0..n).map(|i| RequesterId::new(format!("user-{i}"))).collect()
    }

    #[test]
    fn half_of_four_needs_three() {
        let participants = people(4);
        let mut votes = VoteBox::new();

        let first = votes.cast(VoteKind::Next, participants[0].clone(), &participants, 0.5);
        assert_eq!(first, VoteOutcome::Recorded { votes: 1, required: 3 });

        let second = votes.cast(VoteKind::Next, participants[1].clone(), &participants, 0.5);
        assert_eq!(second, VoteOutcome::Recorded { votes: 2, required: 3 });

        let third = votes.cast(VoteKind::Next, participants[2].clone(), &participants, 0.5);
        assert_eq!(third, VoteOutcome::Triggered);
    }

    #[test]
    fn repeated_votes_count_once() {
        let participants = people(4);
        let mut votes = VoteBox::new();

        for _ in 0..5 {
            votes.cast(VoteKind::Previous, participants[0].clone(), &participants, 0.5);
        }
        assert_eq!(votes.count(VoteKind::Previous), 1);
        assert_eq!(votes.count(VoteKind::Next), 0);
    }

    #[test]
    fn outsiders_are_ignored() {
        let participants = people(2);
        let mut votes = VoteBox::new();

        let outcome = votes.cast(
            VoteKind::Next,
            RequesterId::new("stranger"),
            &participants,
            0.5,
        );
        assert_eq!(outcome, VoteOutcome::Ignored);
        assert_eq!(votes.count(VoteKind::Next), 0);
    }

    #[test]
    fn single_listener_triggers_immediately() {
        let participants = people(1);
        let mut votes = VoteBox::new();
        let outcome = votes.cast(VoteKind::Next, participants[0].clone(), &participants, 0.5);
        assert_eq!(outcome, VoteOutcome::Triggered);
    }

    #[test]
    fn clear_resets_both_tallies() {
        let participants = people(5);
        let mut votes = VoteBox::new();
        votes.cast(VoteKind::Next, participants[0].clone(), &participants, 0.5);
        votes.cast(VoteKind::Previous, participants[1].clone(), &participants, 0.5);

        votes.clear();
        assert_eq!(votes.count(VoteKind::Next), 0);
        assert_eq!(votes.count(VoteKind::Previous), 0);
    }
}
