use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::record::Record;

pub type FloorCounts = BTreeMap<i32, u64>;

// Every critical section is a single increment, so state behind a poisoned
// lock is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Occurrence count per distinct record.
#[derive(Debug, Default)]
pub struct DuplicateCounter {
    hits: Mutex<HashMap<Record, u64>>,
}

impl DuplicateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_occurrence(&self, record: Record) {
        let mut hits = lock(&self.hits);
        *hits.entry(record).or_default() += 1;
    }

    #[cfg(test)]
    pub(crate) fn count(&self, record: &Record) -> u64 {
        lock(&self.hits).get(record).copied().unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn distinct(&self) -> usize {
        lock(&self.hits).len()
    }

    /// Records seen more than once, with their counts.
    pub fn snapshot_duplicates(&self) -> BTreeMap<Record, u64> {
        lock(&self.hits)
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(record, count)| (record.clone(), *count))
            .collect()
    }
}

/// Per-city histogram of floor counts.
#[derive(Debug, Default)]
pub struct FloorHistogram {
    cities: Mutex<BTreeMap<String, FloorCounts>>,
}

impl FloorHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds or creates the city's histogram and bumps `floor`, all under one lock.
    pub fn record_value(&self, city: &str, floor: i32) {
        let mut cities = lock(&self.cities);
        let floors = cities.entry(city.to_owned()).or_default();
        *floors.entry(floor).or_default() += 1;
    }

    pub fn snapshot(&self) -> BTreeMap<String, FloorCounts> {
        lock(&self.cities).clone()
    }
}
