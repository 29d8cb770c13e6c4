use crate::{Condition, Error, ErrorFactory, Filters, Model, Value, Values};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Page request: `page` starts from 1, `sort` is an optional raw ORDER BY term.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pageable {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub sort: String,
}

impl Pageable {
    pub fn new(page: u64, size: u64, sort: impl Into<String>) -> Self {
        Self {
            page,
            size,
            sort: sort.into(),
        }
    }
    /// Rows to skip, pages below 1 count as the first one. Saturates on huge pages.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.size)
    }
}

/// Values to write in an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Updates {
    /// Written as they are, zero values included.
    Columns(Values),
    /// Taken from a model: a plain update writes only its non zero fields.
    Model(Values),
}

impl Updates {
    pub fn values(&self) -> &Values {
        match self {
            Updates::Columns(v) | Updates::Model(v) => v,
        }
    }
    pub fn into_values(self) -> Values {
        match self {
            Updates::Columns(v) | Updates::Model(v) => v,
        }
    }
}

impl From<Values> for Updates {
    fn from(value: Values) -> Self {
        Updates::Columns(value)
    }
}

impl<M: Model> From<&M> for Updates {
    fn from(value: &M) -> Self {
        Updates::Model(value.to_values())
    }
}

/// Options shaping a repository call: what to select, which rows, how to sort and page,
/// and which errors to raise.
///
/// Built by chaining, every `*_if` variant applies only when its flag is true.
///
/// ```rust
/// use sift_core::{Pageable, QueryOptions};
/// let options = QueryOptions::new()
///     .where_raw("age > ?", vec![18.into()])
///     .omit(["password"])
///     .pageable_if(true, Pageable::new(2, 20, "name"));
/// assert_eq!(options.wheres.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct QueryOptions {
    pub table: Option<String>,
    pub primary_key: Option<String>,
    pub updates: Values,
    pub select: Option<(String, Vec<Value>)>,
    pub omit: Vec<String>,
    pub attend: Vec<String>,
    pub joins: Vec<Condition>,
    pub wheres: Vec<Condition>,
    pub ors: Vec<Condition>,
    pub filters: Filters,
    pub group: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub pageable: Option<Pageable>,
    pub sorts: Vec<String>,
    pub pluck: Option<String>,
    pub first: bool,
    pub last: bool,
    pub with_deleted: bool,
    pub ignore_not_found: bool,
    pub must_affected: bool,
    pub error_not_found: Option<ErrorFactory>,
    pub error_not_affected: Option<ErrorFactory>,
    pub error_not_single: Option<ErrorFactory>,
}

macro_rules! conditional {
    ($(#[$meta:meta])* $name:ident => $target:ident($($arg:ident: $ty:ty),*)) => {
        $(#[$meta])*
        pub fn $name(self, condition: bool, $($arg: $ty),*) -> Self {
            if condition { self.$target($($arg),*) } else { self }
        }
    };
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads from or writes to `table` instead of the table of the model.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
    /// Column identifying a single record, instead of the declared primary key.
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }
    /// Extra values written by updates.
    pub fn updates(mut self, values: Values) -> Self {
        self.updates.extend(values);
        self
    }
    /// Explicit select list, appended with a comma to any previous one.
    pub fn select(mut self, query: impl Into<String>, args: Vec<Value>) -> Self {
        let query = query.into();
        if let Some((current, current_args)) = self.select.as_mut().filter(|(v, _)| !v.is_empty())
        {
            current.push(',');
            current.push_str(&query);
            current_args.extend(args);
        } else {
            self.select = Some((query, args));
        }
        self
    }
    conditional!(select_if => select(query: impl Into<String>, args: Vec<Value>));
    /// Leaves columns out of selects, inserts and updates.
    pub fn omit<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.omit.extend(columns.into_iter().map(Into::into));
        self
    }
    /// Restricts updates to these columns.
    pub fn attend<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.attend.extend(columns.into_iter().map(Into::into));
        self
    }
    pub fn join(mut self, query: impl Into<String>, args: Vec<Value>) -> Self {
        self.joins.push(Condition::raw(query, args));
        self
    }
    conditional!(join_if => join(query: impl Into<String>, args: Vec<Value>));
    pub fn where_raw(mut self, query: impl Into<String>, args: Vec<Value>) -> Self {
        self.wheres.push(Condition::raw(query, args));
        self
    }
    conditional!(where_if => where_raw(query: impl Into<String>, args: Vec<Value>));
    pub fn where_condition(mut self, condition: Condition) -> Self {
        self.wheres.push(condition);
        self
    }
    /// Matches the non zero fields of `model`.
    pub fn where_model<M: Model>(self, model: &M) -> Self {
        self.where_condition(Condition::model(model))
    }
    pub fn wheres(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.wheres.extend(conditions);
        self
    }
    conditional!(wheres_if => wheres(conditions: Vec<Condition>));
    pub fn or_raw(mut self, query: impl Into<String>, args: Vec<Value>) -> Self {
        self.ors.push(Condition::raw(query, args));
        self
    }
    conditional!(or_if => or_raw(query: impl Into<String>, args: Vec<Value>));
    pub fn or_condition(mut self, condition: Condition) -> Self {
        self.ors.push(condition);
        self
    }
    pub fn or_model<M: Model>(self, model: &M) -> Self {
        self.or_condition(Condition::model(model))
    }
    /// Merges filters, see [`Filters`] for the key syntax.
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters.extend(filters);
        self
    }
    conditional!(filters_if => filters(filters: Filters));
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
    conditional!(group_if => group(group: impl Into<String>));
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
    conditional!(limit_if => limit(limit: u64));
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
    conditional!(offset_if => offset(offset: u64));
    pub fn page(self, page: u64, size: u64, sort: impl Into<String>) -> Self {
        self.pageable(Pageable::new(page, size, sort))
    }
    pub fn pageable(mut self, pageable: Pageable) -> Self {
        self.pageable = Some(pageable);
        self
    }
    conditional!(pageable_if => pageable(pageable: Pageable));
    /// Appends a raw ORDER BY term, like `name desc`.
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sorts.push(sort.into());
        self
    }
    conditional!(sort_if => sort(sort: impl Into<String>));
    pub fn pluck(mut self, column: impl Into<String>) -> Self {
        self.pluck = Some(column.into());
        self
    }
    /// Finds the record with the lowest primary key.
    pub fn first(mut self) -> Self {
        self.first = true;
        self
    }
    /// Finds the record with the highest primary key.
    pub fn last(mut self) -> Self {
        self.last = true;
        self
    }
    /// Includes soft deleted rows.
    pub fn with_deleted(mut self) -> Self {
        self.with_deleted = true;
        self
    }
    conditional!(with_deleted_if => with_deleted());
    pub fn ignore_not_found(mut self) -> Self {
        self.ignore_not_found = true;
        self
    }
    /// Updates and deletes fail when they affect no row.
    pub fn must_affected(mut self) -> Self {
        self.must_affected = true;
        self
    }
    pub fn error_not_found(mut self, f: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        self.error_not_found = Some(Arc::new(f));
        self
    }
    pub fn error_not_affected(mut self, f: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        self.error_not_affected = Some(Arc::new(f));
        self
    }
    pub fn error_not_single(mut self, f: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        self.error_not_single = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .field("select", &self.select)
            .field("omit", &self.omit)
            .field("attend", &self.attend)
            .field("wheres", &self.wheres)
            .field("ors", &self.ors)
            .field("filters", &self.filters)
            .field("pageable", &self.pageable)
            .field("sorts", &self.sorts)
            .finish_non_exhaustive()
    }
}
