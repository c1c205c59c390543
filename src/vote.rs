//! majority voting over neighbor labels
//!
//! votes for a record can arrive in any order so the tally is kept in a
//! [`BTreeMap`] and always walked in ascending label order. the leader is
//! only replaced by a strictly greater count, which means that when several
//! labels share the highest count the smallest label wins.
use std::collections::BTreeMap;

use crate::record::Label;

/// occurrence count of every label seen among the votes of one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    counts: BTreeMap<Label, u32>,
    total: u32,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: Label) {
        self.counts
            .entry(label)
            // increment if the label was previously added
            .and_modify(|counter| *counter += 1)
            // insert if not already existing
            .or_insert(1);

        self.total += 1;
    }

    /// total number of votes counted
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn count(&self, label: Label) -> u32 {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// labels with their counts in ascending label order
    pub fn iter(&self) -> impl Iterator<Item = (Label, u32)> + '_ {
        self.counts.iter().map(|(label, count)| (*label, *count))
    }

    /// the fraction of all votes that went to the given label
    pub fn share(&self, label: Label) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        self.count(label) as f64 / self.total as f64
    }

    /// the label with the highest count. ties go to the smallest label.
    /// returns [`None`] if no votes were counted
    pub fn winner(&self) -> Option<Label> {
        let mut max = 0;
        let mut leader = None;

        for (label, count) in self.iter() {
            if count > max {
                leader = Some(label);
                max = count;
            }
        }

        leader
    }
}

impl FromIterator<Label> for VoteTally {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        let mut tally = Self::new();

        for label in iter {
            tally.add(label);
        }

        tally
    }
}

/// counts the given votes and returns the majority label
pub fn aggregate<I>(votes: I) -> Option<Label>
where
    I: IntoIterator<Item = Label>,
{
    votes.into_iter().collect::<VoteTally>().winner()
}
