//! Coverage accumulation
//!
//! [`Coverage`] collects the leaves and values exercised by walker rows,
//! across any number of walk sessions. It belongs to the caller; the walker
//! never holds or updates it. [`CoverageReport`] is its serializable summary.

use crate::error::Result;
use crate::walker::{Row, WalkStats};
use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Leaves and values seen so far
#[derive(Debug, Clone, Default)]
pub struct Coverage {
    sessions: usize,
    rows: usize,
    expected: IndexSet<String>,
    seen: IndexMap<String, IndexSet<String>>,
}

impl Coverage {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one row
    pub fn record_row(&mut self, row: &Row) {
        self.rows += 1;
        for assignment in &row.assignments {
            self.expected.insert(assignment.path.clone());
            self.seen
                .entry(assignment.path.clone())
                .or_default()
                .insert(assignment.value.clone());
        }
    }

    /// Record the end of a session; every walkable leaf becomes expected
    pub fn record_session(&mut self, stats: &WalkStats) {
        self.sessions += 1;
        for path in stats.participated.iter().chain(&stats.omitted) {
            self.expected.insert(path.clone());
        }
    }

    /// Add leaves that should be covered even if no session walks them
    pub fn expect<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected.extend(paths.into_iter().map(Into::into));
    }

    /// Fold another accumulator into this one
    pub fn merge(&mut self, other: &Coverage) {
        self.sessions += other.sessions;
        self.rows += other.rows;
        self.expected.extend(other.expected.iter().cloned());
        for (path, values) in &other.seen {
            self.seen
                .entry(path.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    /// Sessions recorded
    pub fn sessions(&self) -> usize {
        self.sessions
    }

    /// Rows recorded
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Whether a leaf has appeared in some row
    pub fn is_covered(&self, path: &str) -> bool {
        self.seen.contains_key(path)
    }

    /// Distinct values seen for a leaf, in first-seen order
    pub fn values(&self, path: &str) -> Vec<&str> {
        self.seen
            .get(path)
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Expected leaves never seen
    pub fn uncovered(&self) -> Vec<&str> {
        self.expected
            .iter()
            .filter(|p| !self.seen.contains_key(p.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Build a report stamped with the current time
    pub fn report(&self) -> CoverageReport {
        let total = self.expected.len();
        let covered = self.expected.iter().filter(|p| self.seen.contains_key(p.as_str())).count();
        CoverageReport {
            generated_at: Utc::now().to_rfc3339(),
            sessions: self.sessions,
            rows: self.rows,
            leaves_total: total,
            leaves_covered: covered,
            ratio: if total == 0 {
                1.0
            } else {
                covered as f64 / total as f64
            },
            uncovered: self.uncovered().into_iter().map(str::to_string).collect(),
            values: self
                .seen
                .iter()
                .map(|(path, values)| (path.clone(), values.iter().cloned().collect()))
                .collect(),
        }
    }
}

/// Serializable coverage summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverageReport {
    /// RFC 3339 timestamp
    pub generated_at: String,
    /// Sessions recorded
    pub sessions: usize,
    /// Rows recorded
    pub rows: usize,
    /// Expected leaves
    pub leaves_total: usize,
    /// Expected leaves seen in some row
    pub leaves_covered: usize,
    /// `leaves_covered / leaves_total` (1.0 when nothing is expected)
    pub ratio: f64,
    /// Expected leaves never seen
    pub uncovered: Vec<String>,
    /// Distinct values per leaf
    pub values: IndexMap<String, Vec<String>>,
}

impl CoverageReport {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NodeId;
    use crate::walker::Assignment;
    use pretty_assertions::assert_eq;

    fn row(values: &[(&str, &str)]) -> Row {
        Row {
            index: 0,
            assignments: values
                .iter()
                .enumerate()
                .map(|(i, (path, value))| Assignment {
                    node: NodeId(i),
                    path: path.to_string(),
                    data_path: path.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_accumulates_distinct_values() {
        let mut coverage = Coverage::new();
        coverage.record_row(&row(&[("/a", "1"), ("/b", "x")]));
        coverage.record_row(&row(&[("/a", "2")]));
        coverage.record_row(&row(&[("/a", "1")]));
        assert_eq!(coverage.rows(), 3);
        assert_eq!(coverage.values("/a"), vec!["1", "2"]);
        assert!(coverage.is_covered("/b"));
        assert!(!coverage.is_covered("/c"));
    }

    #[test]
    fn test_report_counts_uncovered() {
        let mut coverage = Coverage::new();
        coverage.record_row(&row(&[("/a", "1")]));
        coverage.record_session(&WalkStats {
            participated: vec!["/a".into()],
            omitted: vec!["/z".into()],
            ..Default::default()
        });
        let report = coverage.report();
        assert_eq!(report.sessions, 1);
        assert_eq!(report.leaves_total, 2);
        assert_eq!(report.leaves_covered, 1);
        assert_eq!(report.uncovered, vec!["/z".to_string()]);
        assert!((report.ratio - 0.5).abs() < f64::EPSILON);

        let text = report.to_json().unwrap();
        let back: CoverageReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_merge() {
        let mut a = Coverage::new();
        a.record_row(&row(&[("/a", "1")]));
        let mut b = Coverage::new();
        b.record_row(&row(&[("/a", "2"), ("/b", "y")]));
        b.expect(["/c"]);
        a.merge(&b);
        assert_eq!(a.rows(), 2);
        assert_eq!(a.values("/a"), vec!["1", "2"]);
        assert_eq!(a.uncovered(), vec!["/c"]);
    }
}
