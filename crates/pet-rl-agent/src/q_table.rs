//! Tabular action-value storage keyed by discrete state

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use pet_rl_core::{DiscreteState, PetAction};

/// One persisted row of a [`QTable`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTableRow {
    /// State key, as its flat tuple
    pub state: DiscreteState,
    /// Stored action values
    pub values: IndexMap<PetAction, f64>,
}

/// Map from state to per-action value.
///
/// Reads never create entries: a missing state or action reads as `0.0`.
/// Rows are created only by [`QTable::set`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<QTableRow>", from = "Vec<QTableRow>")]
pub struct QTable {
    rows: HashMap<DiscreteState, IndexMap<PetAction, f64>>,
}

impl QTable {
    /// Value returned for anything not stored
    pub const DEFAULT_VALUE: f64 = 0.0;

    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value or the default
    #[must_use]
    pub fn get(&self, state: &DiscreteState, action: PetAction) -> f64 {
        self.rows
            .get(state)
            .and_then(|row| row.get(&action))
            .copied()
            .unwrap_or(Self::DEFAULT_VALUE)
    }

    /// Store a value, creating the row if needed
    pub fn set(&mut self, state: DiscreteState, action: PetAction, value: f64) {
        self.rows.entry(state).or_default().insert(action, value);
    }

    /// Stored row for a state
    #[must_use]
    pub fn row(&self, state: &DiscreteState) -> Option<&IndexMap<PetAction, f64>> {
        self.rows.get(state)
    }

    /// Whether the state has been written at least once
    #[must_use]
    pub fn contains(&self, state: &DiscreteState) -> bool {
        self.rows.contains_key(state)
    }

    /// First action with the highest value, ties resolved by `actions` order.
    /// `None` for an unseen state or an empty action list.
    #[must_use]
    pub fn greedy_action(&self, state: &DiscreteState, actions: &[PetAction]) -> Option<PetAction> {
        if !self.contains(state) {
            return None;
        }
        let mut best: Option<(PetAction, f64)> = None;
        for &action in actions {
            let value = self.get(state, action);
            if best.map_or(true, |(_, v)| value > v) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Like [`QTable::greedy_action`] but `None` when every action ties, so
    /// the caller can break the tie randomly
    #[must_use]
    pub fn best_action(&self, state: &DiscreteState, actions: &[PetAction]) -> Option<PetAction> {
        let first = actions.first()?;
        let reference = self.get(state, *first);
        #[allow(clippy::float_cmp)]
        let all_tied = actions.iter().all(|a| self.get(state, *a) == reference);
        if all_tied {
            return None;
        }
        self.greedy_action(state, actions)
    }

    /// Highest value over `actions`, `None` for an unseen state
    #[must_use]
    pub fn max_value(&self, state: &DiscreteState, actions: &[PetAction]) -> Option<f64> {
        if !self.contains(state) {
            return None;
        }
        actions
            .iter()
            .map(|a| self.get(state, *a))
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }

    /// Drop entries with `|value| <= threshold`, then empty rows.
    /// Returns the number of entries removed.
    pub fn compress(&mut self, threshold: f64) -> usize {
        let before = self.entry_count();
        for row in self.rows.values_mut() {
            row.retain(|_, value| value.abs() > threshold);
        }
        self.rows.retain(|_, row| !row.is_empty());
        before - self.entry_count()
    }

    /// Number of states with a row
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no state has been written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of (state, action) entries
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.rows.values().map(IndexMap::len).sum()
    }

    /// Rows sorted by state, for stable output
    #[must_use]
    pub fn to_rows(&self) -> Vec<QTableRow> {
        let mut rows: Vec<QTableRow> = self
            .rows
            .iter()
            .map(|(state, values)| QTableRow {
                state: *state,
                values: values.clone(),
            })
            .collect();
        rows.sort_by_key(|row| row.state);
        rows
    }
}

impl From<QTable> for Vec<QTableRow> {
    fn from(table: QTable) -> Self {
        table.to_rows()
    }
}

impl From<Vec<QTableRow>> for QTable {
    fn from(rows: Vec<QTableRow>) -> Self {
        let mut table = QTable::new();
        for row in rows {
            let entry = table.rows.entry(row.state).or_default();
            entry.extend(row.values);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pet_rl_core::StateFlags;

    fn state(level: u8) -> DiscreteState {
        DiscreteState::new([level, 0, 0, 0, 0], Some(StateFlags::default()))
    }

    #[test]
    fn test_reads_do_not_create_rows() {
        let table = QTable::new();
        assert_eq!(table.get(&state(1), PetAction::Feed), 0.0);
        assert!(table.is_empty());
        assert_eq!(table.max_value(&state(1), &PetAction::ALL), None);
        assert_eq!(table.greedy_action(&state(1), &PetAction::ALL), None);
    }

    #[test]
    fn test_best_action_and_ties() {
        let mut table = QTable::new();
        let s = state(2);
        table.set(s, PetAction::Feed, 0.0);
        assert_eq!(table.best_action(&s, &PetAction::ALL), None);
        assert_eq!(table.greedy_action(&s, &PetAction::ALL), Some(PetAction::Feed));

        table.set(s, PetAction::Sleep, 1.5);
        assert_eq!(table.best_action(&s, &PetAction::ALL), Some(PetAction::Sleep));

        table.set(s, PetAction::Play, 1.5);
        assert_eq!(table.best_action(&s, &PetAction::ALL), Some(PetAction::Play));
        assert_eq!(table.max_value(&s, &PetAction::ALL), Some(1.5));
    }

    #[test]
    fn test_negative_only_row_prefers_unvisited() {
        let mut table = QTable::new();
        let s = state(3);
        table.set(s, PetAction::Feed, -2.0);
        assert_eq!(table.best_action(&s, &PetAction::ALL), Some(PetAction::Play));
        assert_eq!(table.max_value(&s, &[PetAction::Feed]), Some(-2.0));
    }

    #[test]
    fn test_compress_drops_small_entries_and_empty_rows() {
        let mut table = QTable::new();
        table.set(state(0), PetAction::Feed, 0.05);
        table.set(state(0), PetAction::Rest, 0.1);
        table.set(state(1), PetAction::Play, -0.3);
        table.set(state(1), PetAction::Clean, 0.01);

        assert_eq!(table.compress(0.1), 3);
        assert_eq!(table.len(), 1);
        assert!(!table.contains(&state(0)));
        assert_eq!(table.get(&state(1), PetAction::Play), -0.3);
    }

    #[test]
    fn test_json_rows_round_trip() {
        let mut table = QTable::new();
        table.set(state(1), PetAction::Feed, 1.25);
        table.set(state(0), PetAction::Sleep, -0.5);

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json[0]["state"], serde_json::json!([0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(json[1]["values"]["feed"], 1.25);

        let back: QTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }
}
