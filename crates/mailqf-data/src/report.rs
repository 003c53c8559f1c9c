//! Attribute tallying and report emission.
//!
//! While a report mode is active, every matching record feeds the
//! [`ReportTally`] instead of being written out directly; the sorted
//! two-column report is emitted once, after all input is consumed.

use std::collections::BTreeMap;
use std::io::Write;

use serde_json::Value;

/// Direction of the count sort in an emitted report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Occurrence counts keyed by extracted attribute value.
///
/// Keys live in a `BTreeMap`, so equal counts tie-break in lexicographic
/// key order when emitted — the output is deterministic regardless of
/// insertion order.
#[derive(Debug, Default)]
pub struct ReportTally {
    counts: BTreeMap<String, u64>,
}

impl ReportTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count one occurrence of `value`.
    ///
    /// With a separator, only the substring after its first occurrence
    /// is counted (e.g. the domain of an address); a value without the
    /// separator is counted whole. Empty derived keys are ignored.
    pub fn add(&mut self, value: &str, separator: Option<char>) {
        let key = match separator {
            Some(sep) => value
                .split_once(sep)
                .map(|(_, rest)| rest)
                .unwrap_or(value),
            None => value,
        };
        if key.is_empty() {
            return;
        }
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Tally one recipient-level field across a record's recipient list.
    /// Entries without the field contribute nothing.
    pub fn add_recipients(&mut self, recipients: &[Value], field: &str, separator: Option<char>) {
        for rcpt in recipients {
            if let Some(value) = rcpt.get(field).and_then(Value::as_str) {
                self.add(value, separator);
            }
        }
    }

    /// Look up the count for one key. Test convenience.
    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// The tally as `(count, key)` rows, sorted by count in the given
    /// order. Ties keep lexicographic key order (always ascending).
    pub fn rows(&self, order: SortOrder) -> Vec<(u64, String)> {
        let mut rows: Vec<(u64, String)> = self
            .counts
            .iter()
            .map(|(key, &count)| (count, key.clone()))
            .collect();
        // BTreeMap iteration yields keys in ascending order; a stable
        // sort on the count preserves that order within ties.
        match order {
            SortOrder::Ascending => rows.sort_by_key(|&(count, _)| count),
            SortOrder::Descending => rows.sort_by_key(|&(count, _)| std::cmp::Reverse(count)),
        }
        rows
    }

    /// Write the report, one `"<count> <key>"` line per entry.
    pub fn write_to(&self, out: &mut dyn Write, order: SortOrder) -> std::io::Result<()> {
        for (count, key) in self.rows(order) {
            writeln!(out, "{} {}", count, key)?;
        }
        Ok(())
    }
}
