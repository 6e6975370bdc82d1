//! In-memory job table built from one queue snapshot.

use std::collections::HashMap;

use crate::error::IndexError;

use super::job::{JobKey, JobRow};

/// Rows of one snapshot, addressable by `JobKey`.
///
/// Row order is the order squeue printed them in. The index is never
/// mutated after `build`; a refresh replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobIndex {
    rows: Vec<JobRow>,
    positions: HashMap<JobKey, usize>,
}

impl JobIndex {
    /// Build an index, rejecting snapshots where two rows share a key.
    pub fn build(rows: Vec<JobRow>) -> Result<Self, IndexError> {
        let mut positions = HashMap::with_capacity(rows.len());
        for (pos, row) in rows.iter().enumerate() {
            if positions.insert(row.key(), pos).is_some() {
                return Err(IndexError::DuplicateKey(row.key()));
            }
        }
        Ok(Self { rows, positions })
    }

    #[must_use]
    pub fn get(&self, key: &JobKey) -> Option<&JobRow> {
        self.positions.get(key).map(|&pos| &self.rows[pos])
    }

    /// Rows in squeue order.
    #[must_use]
    pub fn rows(&self) -> &[JobRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobRow> {
        self.rows.iter()
    }

    /// Find the row for a plain job id (matches `job_id`, not the array id).
    #[must_use]
    pub fn find_by_job_id(&self, job_id: &str) -> Option<&JobRow> {
        self.rows.iter().find(|row| row.job_id == job_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count of rows whose state means logs may exist.
    #[must_use]
    pub fn started_count(&self) -> usize {
        self.rows.iter().filter(|row| row.has_started()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_row;

    fn row(line: &str) -> JobRow {
        parse_row(2, line).unwrap()
    }

    #[test]
    fn test_build_and_lookup() {
        let index = JobIndex::build(vec![
            row("10|10|N/A|debug|a|RUNNING|0:01|1|n1|a.out|a.err"),
            row("21|20|1|debug|b|PENDING|0:00|1|(None)|b.out|b.err"),
            row("22|20|2|debug|b|PENDING|0:00|1|(None)|b.out|b.err"),
        ])
        .unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.get(&JobKey::new("20", "2")).unwrap().job_id, "22");
        assert!(index.get(&JobKey::new("10", "N/A")).is_some());
        assert!(index.get(&JobKey::new("10", "1")).is_none());
        assert_eq!(index.find_by_job_id("21").unwrap().array_task_id, "1");
        assert_eq!(index.started_count(), 1);
    }

    #[test]
    fn test_preserves_squeue_order() {
        let index = JobIndex::build(vec![
            row("30|30|N/A|debug|c|RUNNING|0:01|1|n1|c.out|c.err"),
            row("10|10|N/A|debug|a|RUNNING|0:01|1|n1|a.out|a.err"),
        ])
        .unwrap();
        let ids: Vec<&str> = index.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["30", "10"]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = JobIndex::build(vec![
            row("21|20|1|debug|b|RUNNING|0:01|1|n1|b.out|b.err"),
            row("99|20|1|debug|b|RUNNING|0:01|1|n1|b.out|b.err"),
        ])
        .unwrap_err();
        assert_eq!(err, IndexError::DuplicateKey(JobKey::new("20", "1")));
    }

    #[test]
    fn test_empty_index() {
        let index = JobIndex::build(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert!(index.get(&JobKey::new("1", "N/A")).is_none());
    }
}
