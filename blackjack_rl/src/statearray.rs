use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use crate::{Action, Observation, NUMBER_OF_ACTIONS};

/// `[value(STICK), value(HIT)]`.
pub type ActionValues = [f64; NUMBER_OF_ACTIONS];

/// Action values keyed by observation. Indexing mutably with an unseen
/// observation inserts the table's default row first, so the table only ever
/// grows.
#[derive(Debug, Clone)]
pub struct QTable {
    data: HashMap<Observation, ActionValues>,
    default_values: ActionValues,
}

impl QTable {
    pub fn new(default_values: ActionValues) -> QTable {
        QTable {
            data: HashMap::new(),
            default_values,
        }
    }

    pub fn with_capacity(default_values: ActionValues, capacity: usize) -> Self {
        Self {
            data: HashMap::with_capacity(capacity),
            default_values,
        }
    }

    /// Looks up a row without inserting it.
    pub fn get(&self, observation: &Observation) -> Option<&ActionValues> {
        self.data.get(observation)
    }

    /// Row for the observation, inserting the default row if unseen.
    pub fn values_mut(&mut self, observation: &Observation) -> &mut ActionValues {
        self.data
            .entry(*observation)
            .or_insert(self.default_values)
    }

    /// Greatest value of the row, inserting the default row if unseen.
    pub fn max_value(&mut self, observation: &Observation) -> f64 {
        let values = *self.values_mut(observation);
        values[0].max(values[1])
    }

    /// Index of the strictly greatest value. Ties go to the lower index.
    pub fn argmax(&mut self, observation: &Observation) -> Action {
        let values = *self.values_mut(observation);
        if values[Action::Hit.index()] > values[Action::Stick.index()] {
            Action::Hit
        } else {
            Action::Stick
        }
    }

    pub fn contains_state(&self, observation: &Observation) -> bool {
        self.data.contains_key(observation)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Observation, &ActionValues)> {
        self.data.iter()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Index<&Observation> for QTable {
    type Output = ActionValues;

    /// Panics if the observation was never inserted. Use `get` to probe.
    fn index(&self, index: &Observation) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<&Observation> for QTable {
    fn index_mut(&mut self, index: &Observation) -> &mut Self::Output {
        self.values_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use crate::InfiniteObservation;

    use super::*;

    fn obs(hand_sum: u8) -> Observation {
        Observation::Infinite(InfiniteObservation {
            hand_sum,
            usable_ace: false,
        })
    }

    #[test]
    fn unseen_lookup_inserts_default() {
        let mut table = QTable::new([0.0, 500.0]);
        assert!(table.get(&obs(12)).is_none());
        assert!(table.is_empty());

        assert_eq!(*table.values_mut(&obs(12)), [0.0, 500.0]);
        assert_eq!(table[&obs(12)], [0.0, 500.0]);
        assert!(table.contains_state(&obs(12)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&obs(12)), Some(&[0.0, 500.0]));
    }

    #[test]
    fn argmax_prefers_stick_on_ties() {
        let mut table = QTable::new([0.0, 0.0]);
        assert_eq!(table.argmax(&obs(5)), Action::Stick);
        table[&obs(5)][Action::Hit.index()] = 0.1;
        assert_eq!(table.argmax(&obs(5)), Action::Hit);
        table[&obs(5)][Action::Stick.index()] = 0.1;
        assert_eq!(table.argmax(&obs(5)), Action::Stick);
    }

    #[test]
    fn max_value_inserts_and_reads() {
        let mut table = QTable::with_capacity([1.0, -1.0], 4);
        assert_eq!(table.max_value(&obs(20)), 1.0);
        assert_eq!(table.len(), 1);
        table[&obs(20)][1] = 3.0;
        assert_eq!(table.max_value(&obs(20)), 3.0);
    }

    #[test]
    fn clear_forgets_every_row() {
        let mut table = QTable::new([0.0, 500.0]);
        table[&obs(14)][Action::Hit.index()] = 7.0;
        table.values_mut(&obs(15));
        assert_eq!(table.len(), 2);
        table.clear();
        assert!(table.is_empty());
        assert!(!table.contains_state(&obs(14)));
        assert_eq!(*table.values_mut(&obs(14)), [0.0, 500.0]);
    }

    #[test]
    #[should_panic]
    fn immutable_index_of_unseen_panics() {
        let table = QTable::new([0.0, 0.0]);
        let _ = table[&obs(3)];
    }
}
