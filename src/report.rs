use std::{collections::BTreeMap, fmt};

use crate::{
    record::Record,
    statistic::{DuplicateCounter, FloorCounts, FloorHistogram},
};

/// Final two-section summary, taken after the pool has drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    duplicates: BTreeMap<Record, u64>,
    floors: BTreeMap<String, FloorCounts>,
}

impl Report {
    pub fn generate(duplicates: &DuplicateCounter, floors: &FloorHistogram) -> Self {
        Report {
            duplicates: duplicates.snapshot_duplicates(),
            floors: floors.snapshot(),
        }
    }

    /// Repeated records in natural record order.
    pub fn duplicates(&self) -> impl Iterator<Item = (&Record, u64)> {
        self.duplicates.iter().map(|(record, count)| (record, *count))
    }

    pub fn floors(&self) -> &BTreeMap<String, FloorCounts> {
        &self.floors
    }
}

impl fmt::Display for Report {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        writeln!(out, "I. Duplicate entries")?;
        for (n, (record, count)) in self.duplicates().enumerate() {
            writeln!(out, "{}. {}. Number of repetitions: {}", n + 1, record, count)?;
        }

        writeln!(out)?;
        writeln!(
            out,
            "II. Information on the number of buildings with 1, 2, 3, 4 5 floors"
        )?;
        for (n, (city, floors)) in self.floors.iter().enumerate() {
            writeln!(out, "{}. {}", n + 1, city)?;
            for (floor, count) in floors {
                writeln!(out, " {}-floor(s): {}", floor, count)?;
            }
        }
        Ok(())
    }
}
