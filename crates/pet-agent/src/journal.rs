//! Bounded log of executed actions and the preferences they build up

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Records considered when computing action rates
pub const RATE_WINDOW: usize = 50;

/// Who initiated an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    /// Chosen by the learning policy
    Autonomous,
    /// Chosen by the fallback behavior tree
    Tree,
    /// Requested by the owner
    User,
}

/// One journal line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRecord {
    /// Action name
    pub action: String,
    /// Whether it took effect
    pub success: bool,
    /// Outcome text
    pub message: String,
    /// Initiator
    pub source: ActionSource,
    /// When it happened
    pub at: DateTime<Utc>,
}

/// Action history with preference scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorJournal {
    records: VecDeque<JournalRecord>,
    preferences: BTreeMap<String, f64>,
    capacity: usize,
}

impl BehaviorJournal {
    /// Create a journal keeping at most `capacity` records
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            preferences: BTreeMap::new(),
            capacity,
        }
    }

    /// Record an action
    pub fn record(
        &mut self,
        action: &str,
        success: bool,
        message: &str,
        source: ActionSource,
    ) {
        self.records.push_back(JournalRecord {
            action: action.to_string(),
            success,
            message: message.to_string(),
            source,
            at: Utc::now(),
        });
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }

        let mut delta = if success { 0.1 } else { -0.05 };
        if source == ActionSource::User {
            delta += 0.2;
            if success {
                delta += 0.15;
            }
        }
        *self.preferences.entry(action.to_string()).or_insert(0.0) += delta;
    }

    /// Records, oldest first
    pub fn records(&self) -> impl Iterator<Item = &JournalRecord> {
        self.records.iter()
    }

    /// Number of records held
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Preference score per action name
    #[must_use]
    pub fn preferences(&self) -> &BTreeMap<String, f64> {
        &self.preferences
    }

    /// Share of each action among the most recent records
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn action_rates(&self) -> BTreeMap<String, f64> {
        let skip = self.records.len().saturating_sub(RATE_WINDOW);
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in self.records.iter().skip(skip) {
            *counts.entry(record.action.clone()).or_default() += 1;
        }

        let total: usize = counts.values().sum();
        counts
            .into_iter()
            .map(|(action, n)| (action, n as f64 / total as f64))
            .collect()
    }
}

impl Default for BehaviorJournal {
    fn default() -> Self {
        Self::new(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_preferences() {
        let mut journal = BehaviorJournal::default();
        journal.record("feed", true, "ok", ActionSource::Autonomous);
        journal.record("feed", false, "no", ActionSource::Autonomous);
        journal.record("play", true, "ok", ActionSource::User);
        journal.record("clean", false, "no", ActionSource::User);

        let prefs = journal.preferences();
        assert_relative_eq!(prefs["feed"], 0.05, epsilon = 1e-12);
        assert_relative_eq!(prefs["play"], 0.45, epsilon = 1e-12);
        assert_relative_eq!(prefs["clean"], 0.15, epsilon = 1e-12);
    }

    #[test]
    fn test_bounded_and_rates_use_window() {
        let mut journal = BehaviorJournal::new(60);
        for _ in 0..40 {
            journal.record("sleep", true, "", ActionSource::Tree);
        }
        for _ in 0..40 {
            journal.record("rest", true, "", ActionSource::Autonomous);
        }
        assert_eq!(journal.len(), 60);

        let rates = journal.action_rates();
        assert_relative_eq!(rates["rest"], 0.8);
        assert_relative_eq!(rates["sleep"], 0.2);
    }

    #[test]
    fn test_empty_rates() {
        assert!(BehaviorJournal::default().action_rates().is_empty());
    }
}
