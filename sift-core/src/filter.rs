use crate::{Condition, DbError, Error, Result, Value};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Map based filters: keys are `[?]column[$operator][#tag]`, every entry becomes one
/// condition and all of them are joined with AND.
///
/// - `?` skips the entry when its value is the zero value of its type.
/// - `$operator` is one of `eq`, `ne`, `gte`, `gt`, `lte`, `lt`, `like`, `notLike`,
///   `in`, `notIn`. Without it lists become `IN` and anything else `=`.
/// - `#tag` is ignored, it lets the same column appear more than once.
///
/// Entries whose value is null are skipped.
pub type Filters = BTreeMap<String, Value>;

/// Builds [`Filters`] from `key => value` pairs.
///
/// ```rust
/// use sift_core::filters;
/// let filters = filters! {
///     "name$like" => "john",
///     "?age$gte" => 0,
/// };
/// assert_eq!(filters.len(), 2);
/// ```
#[macro_export]
macro_rules! filters {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut filters = $crate::Filters::new();
        $(filters.insert(::std::string::String::from($key), $crate::Value::from($value));)*
        filters
    }};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterEquals,
    Greater,
    LessEquals,
    Less,
    Like,
    NotLike,
    In,
    NotIn,
}

impl Operator {
    /// The name used in filter keys.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equals => "eq",
            Operator::NotEquals => "ne",
            Operator::GreaterEquals => "gte",
            Operator::Greater => "gt",
            Operator::LessEquals => "lte",
            Operator::Less => "lt",
            Operator::Like => "like",
            Operator::NotLike => "notLike",
            Operator::In => "in",
            Operator::NotIn => "notIn",
        }
    }
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "<>",
            Operator::GreaterEquals => ">=",
            Operator::Greater => ">",
            Operator::LessEquals => "<=",
            Operator::Less => "<",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "eq" => Operator::Equals,
            "ne" => Operator::NotEquals,
            "gte" => Operator::GreaterEquals,
            "gt" => Operator::Greater,
            "lte" => Operator::LessEquals,
            "lt" => Operator::Less,
            "like" => Operator::Like,
            "notLike" => Operator::NotLike,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            _ => return Err(DbError::Symbol(s.to_string()).into()),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A filter key split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterKey<'a> {
    pub column: &'a str,
    /// Text after `$`, empty when absent.
    pub operator: &'a str,
    pub ignore_zero_value: bool,
}

impl<'a> FilterKey<'a> {
    pub fn parse(key: &'a str) -> Self {
        let (key, ignore_zero_value) = match key.strip_prefix('?') {
            Some(rest) => (rest, true),
            None => (key, false),
        };
        let key = key.split_once('#').map_or(key, |(key, _)| key);
        let (column, operator) = key.split_once('$').unwrap_or((key, ""));
        FilterKey {
            column,
            operator,
            ignore_zero_value,
        }
    }

    /// The operator named by the key. When absent or unknown, the value decides: lists
    /// become `IN`, anything else `=`.
    pub fn resolve_operator(&self, value: &Value) -> Operator {
        if !self.operator.is_empty() {
            match self.operator.parse() {
                Ok(operator) => return operator,
                Err(..) => log::debug!(
                    "Unknown filter operator `{}` on `{}`, matching by value",
                    self.operator,
                    self.column
                ),
            }
        }
        if value.is_list() {
            Operator::In
        } else {
            Operator::Equals
        }
    }
}

/// Turns filters into conditions, in key order.
pub fn filter_conditions(filters: &Filters) -> Result<Vec<Condition>> {
    let mut result = Vec::with_capacity(filters.len());
    for (key, value) in filters {
        if value.is_null() {
            continue;
        }
        let key = FilterKey::parse(key);
        if key.ignore_zero_value && value.is_zero() {
            continue;
        }
        let operator = key.resolve_operator(value);
        let value = match operator {
            Operator::Like | Operator::NotLike => Value::Varchar(Some(format!("%{value}%"))),
            _ => value.clone(),
        };
        result.push(Condition::Compare {
            column: key.column.to_string(),
            operator,
            value,
        });
    }
    Ok(result)
}
