use crate::{
    ColumnRole, Condition, Model, Operator, PrimaryKey, QueryOptions, Result, Source, Value,
    filter_conditions,
};

/// Dialect independent description of a statement, produced from [`QueryOptions`] and
/// rendered by a [`crate::SqlWriter`].
///
/// The WHERE clause is `(wheres AND ... OR ors OR ...) AND soft delete AND filters AND keys`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub source: Source,
    /// Explicit select list, with arguments.
    pub select: Option<(String, Vec<Value>)>,
    /// Columns selected when no explicit list is given.
    pub columns: Vec<&'static str>,
    pub joins: Vec<Condition>,
    pub wheres: Vec<Condition>,
    pub ors: Vec<Condition>,
    pub soft_delete: Option<Condition>,
    pub filters: Vec<Condition>,
    /// Conditions pinning a record, usually its primary key.
    pub keys: Vec<Condition>,
    pub group: Option<String>,
    pub order: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Statement {
    pub fn build<M: Model>(options: &QueryOptions) -> Result<Self> {
        let source = match &options.table {
            Some(table) if !table.trim().is_empty() => Source::Raw(table.clone()),
            _ => Source::Table(M::table_ref()),
        };
        let columns = M::columns()
            .iter()
            .filter(|c| !options.omit.iter().any(|o| c.matches(o)))
            .map(|c| c.name)
            .collect();
        let soft_delete = match M::role_column(ColumnRole::Deleted) {
            Some(column) if !options.with_deleted => Some(Condition::compare(
                qualified(&source, column.name),
                Operator::Equals,
                Value::Int64(Some(0)),
            )),
            _ => None,
        };
        let mut order = options.sorts.clone();
        let mut limit = None;
        let mut offset = None;
        if let Some(pageable) = options.pageable.as_ref().filter(|v| v.size > 0) {
            if !pageable.sort.trim().is_empty() {
                order.push(pageable.sort.clone());
            }
            limit = Some(pageable.size);
            offset = Some(pageable.offset());
        }
        if options.limit.is_some() {
            limit = options.limit;
        }
        if options.offset.is_some() {
            offset = options.offset;
        }
        Ok(Self {
            source,
            select: options.select.clone().filter(|(v, _)| !v.trim().is_empty()),
            columns,
            joins: options.joins.iter().filter(|v| !v.is_empty()).cloned().collect(),
            wheres: options.wheres.iter().filter(|v| !v.is_empty()).cloned().collect(),
            ors: options.ors.iter().filter(|v| !v.is_empty()).cloned().collect(),
            soft_delete,
            filters: filter_conditions(&options.filters)?,
            keys: Vec::new(),
            group: options.group.clone().filter(|v| !v.trim().is_empty()),
            order,
            limit,
            offset,
        })
    }

    /// Sorts by primary key descending when nothing else orders the rows.
    pub fn with_default_sort<M: Model>(mut self) -> Self {
        if self.order.is_empty() {
            if let Some(column) = M::primary_key_def() {
                self.order.push(format!("{} desc", column.name));
            }
        }
        self
    }

    /// Pins the statement to the record identified by `key`.
    pub fn with_key(mut self, key: PrimaryKey) -> Self {
        let column = qualified(&self.source, key.column);
        self.keys
            .push(Condition::compare(column, Operator::Equals, key.value));
        self
    }

    /// True when something besides the soft delete marker restricts the rows.
    pub fn has_condition(&self) -> bool {
        !(self.wheres.is_empty()
            && self.ors.is_empty()
            && self.filters.is_empty()
            && self.keys.is_empty())
    }
}

fn qualified(source: &Source, column: &str) -> String {
    match source.qualifier() {
        "" => column.to_string(),
        table => format!("{table}.{column}"),
    }
}
