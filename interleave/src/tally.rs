//! Aggregation of outcomes into a frequency report.

use std::fmt::{self, Display, Formatter};

use indexmap::map::Iter;
use indexmap::IndexMap;
use serde::Serialize;

/// Count of interleavings per distinct serialized outcome.
///
/// Outcomes iterate in the order they were first seen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    counts: IndexMap<String, u64>,
    total: u64,
}

impl OutcomeTally {
    #[inline]
    pub fn new() -> Self {
        OutcomeTally::default()
    }

    pub fn record(&mut self, outcome: String) {
        *self.counts.entry(outcome).or_insert(0) += 1;
        self.total += 1;
    }

    #[inline]
    pub fn get(&self, outcome: &str) -> Option<u64> {
        self.counts.get(outcome).copied()
    }

    /// The number of interleavings recorded.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The number of distinct outcomes.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, String, u64> {
        self.counts.iter()
    }

    /// Orders the outcomes by descending count. Ties keep first-seen order.
    pub fn report(&self) -> Report {
        let mut entries = self
            .counts
            .iter()
            .map(|(outcome, &count)| Entry {
                outcome: outcome.clone(),
                count,
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        Report {
            entries,
            total: self.total,
        }
    }
}

impl FromIterator<String> for OutcomeTally {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let mut tally = OutcomeTally::new();
        for outcome in iter {
            tally.record(outcome);
        }
        tally
    }
}

impl<'a> IntoIterator for &'a OutcomeTally {
    type Item = (&'a String, &'a u64);
    type IntoIter = Iter<'a, String, u64>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Entry {
    pub outcome: String,
    pub count: u64,
}

/// Outcomes sorted for presentation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Report {
    pub entries: Vec<Entry>,
    pub total: u64,
}

impl Display for Report {
    /// Renders a two-column table of outcome and `count / total`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        const RESULT: &str = "Result";
        const FREQUENCY: &str = "Frequency / Total";
        let width = self
            .entries
            .iter()
            .map(|entry| entry.outcome.chars().count())
            .fold(RESULT.len(), usize::max);
        writeln!(f, "{RESULT:<width$}  {FREQUENCY}")?;
        for entry in &self.entries {
            let Entry { outcome, count } = entry;
            writeln!(f, "{outcome:<width$}  {count} / {}", self.total)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(outcomes: &[&str]) -> OutcomeTally {
        outcomes.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn counts_and_total() {
        let tally = tally(&["4", "3", "4"]);
        assert_eq!(tally.get("4"), Some(2));
        assert_eq!(tally.get("3"), Some(1));
        assert_eq!(tally.get("5"), None);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally.iter().map(|(_, &n)| n).sum::<u64>(), tally.total());
    }

    #[test]
    fn first_seen_order() {
        let tally = tally(&["b", "a", "b", "c"]);
        let keys = tally.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn report_is_stable() {
        let report = tally(&["x", "y", "z", "y", "x", "w"]).report();
        let order = report
            .entries
            .iter()
            .map(|e| (e.outcome.as_str(), e.count))
            .collect::<Vec<_>>();
        assert_eq!(order, [("x", 2), ("y", 2), ("z", 1), ("w", 1)]);
        assert_eq!(report.total, 6);
    }

    #[test]
    fn table() {
        let report = tally(&["[3,3]", "[4,3]", "[3,3]"]).report();
        assert_eq!(
            report.to_string(),
            "Result  Frequency / Total\n[3,3]   2 / 3\n[4,3]   1 / 3\n",
        );
    }

    #[test]
    fn json() {
        let report = tally(&["\"a\"", "undefined", "undefined"]).report();
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"entries":[{"outcome":"undefined","count":2},{"outcome":"\"a\"","count":1}],"total":3}"#,
        );
    }

    #[test]
    fn empty() {
        let tally = OutcomeTally::new();
        assert!(tally.is_empty());
        assert_eq!(tally.report().to_string(), "Result  Frequency / Total\n");
    }
}
