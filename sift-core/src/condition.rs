use crate::{Model, Operator, Value, Values};

/// A single boolean term of a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// SQL fragment with `?` placeholders, list arguments expand to comma separated values.
    Raw { sql: String, args: Vec<Value> },
    /// `column <operator> value`.
    Compare {
        column: String,
        operator: Operator,
        value: Value,
    },
    /// Conjunction of `column = value` pairs, `IS NULL` for null values.
    Columns(Vec<(String, Value)>),
}

impl Condition {
    pub fn raw(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Condition::Raw {
            sql: sql.into(),
            args,
        }
    }
    pub fn compare(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Condition::Compare {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Equals, value)
    }
    pub fn columns(values: Values) -> Self {
        Condition::Columns(values.into_iter().collect())
    }
    /// Matches every non zero field of the model.
    pub fn model<M: Model>(model: &M) -> Self {
        Condition::Columns(
            model
                .row()
                .into_vec()
                .into_iter()
                .filter(|(_, v)| !v.is_zero())
                .map(|(c, v)| (c.to_string(), v))
                .collect(),
        )
    }
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Raw { sql, .. } => sql.trim().is_empty(),
            Condition::Compare { column, .. } => column.is_empty(),
            Condition::Columns(v) => v.is_empty(),
        }
    }
}
