use crate::Value;
use std::sync::Arc;

/// Labels of a result set, shared by all of its rows.
pub type RowNames = Arc<[String]>;
pub type Row = Box<[Value]>;

/// One row of a result set. Labels come from the driver, either plain (`email`) or
/// qualified with the table (`user.email`).
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    pub labels: RowNames,
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    /// Pairs of unqualified label and value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.labels
            .iter()
            .map(|v| unqualified_label(v))
            .zip(self.values.iter())
    }
    /// Value of `column`, matched against labels with and without the table qualifier.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == column || unqualified_label(v) == column)
            .map(|i| &self.values[i])
    }
    /// First value of the row, what plucks and counts read.
    pub fn into_first_value(self) -> Option<Value> {
        self.values.into_vec().into_iter().next()
    }
}

fn unqualified_label(label: &str) -> &str {
    label.rsplit_once('.').map_or(label, |(_, v)| v)
}

impl<S: Into<String>> FromIterator<(S, Value)> for RowLabeled {
    fn from_iter<T: IntoIterator<Item = (S, Value)>>(iter: T) -> Self {
        let (labels, values): (Vec<String>, Vec<Value>) =
            iter.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self::new(labels.into(), values.into())
    }
}

/// Outcome of a write statement.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    pub rows_affected: u64,
    /// Generated key of the last inserted row, when the driver reports one.
    pub last_affected_id: Option<i64>,
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for v in iter {
            self.rows_affected += v.rows_affected;
            self.last_affected_id = v.last_affected_id.or(self.last_affected_id);
        }
    }
}

/// Item of the stream an executor yields: rows of a read, or the count of a write.
#[derive(Debug)]
pub enum QueryResult {
    Row(RowLabeled),
    Affected(RowsAffected),
}
