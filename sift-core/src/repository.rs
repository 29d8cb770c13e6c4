use crate::{
    AsValue, ColumnRole, DbError, Driver, Error, Executor, Model, PrimaryKey, QueryOptions,
    Result, RowLabeled, RowsAffected, SqlWriter, Statement, Updates, Value, Values,
    changed_values, reconcile_write_error,
};
use futures::TryStreamExt;
use std::future::Future;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Data access operations available on every [`Model`].
///
/// Each operation takes the executor explicitly, pass a connection or a transaction. The
/// [`QueryOptions`] decide which rows are involved and how failures are reported.
///
/// Operations addressing a single record by id use the declared primary key, or the column
/// named by [`QueryOptions::primary_key`], and fail with [`DbError::PrimaryKeyEmpty`] when
/// its value is zero. Bulk updates and deletes refuse to run without a condition.
pub trait Repository: Model {
    /// Inserts the model. An empty primary key is left to the database and filled back
    /// from the generated id, duplicate keys are reported through the unique indexes.
    fn create<Exec: Executor>(
        &mut self,
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        async move {
            stamp_time(self, ColumnRole::CreatedAt)?;
            stamp_time(self, ColumnRole::UpdatedAt)?;
            let statement = Statement::build::<Self>(&options)?;
            let row: Vec<(&'static str, Value)> = self
                .row()
                .into_vec()
                .into_iter()
                .filter(|(column, value)| {
                    let primary_key = Self::column_def(column).is_some_and(|c| c.primary_key);
                    !(primary_key && value.is_zero()) && !is_omitted::<Self>(&options, column)
                })
                .collect();
            let sql = write_sql(executor, |w, out| {
                w.write_insert(out, &statement.source, &row)
            });
            let affected = executor
                .execute(sql)
                .await
                .map_err(reconcile_write_error::<Self>)?;
            if let (Some(column), Some(id)) = (
                Self::primary_key_def(),
                affected.last_affected_id.filter(|v| *v != 0),
            ) {
                if self.get_column(column.name).is_none_or(|v| v.is_zero()) {
                    self.set_column(column.name, Value::Int64(Some(id)))?;
                }
            }
            Ok(affected)
        }
    }

    fn count<Exec: Executor>(
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<u64>> + Send {
        async move {
            let statement = Statement::build::<Self>(&options)?;
            count_matching(executor, &statement).await
        }
    }

    /// Loads the record identified by the primary key of `self` into `self`.
    fn find_by_id<Exec: Executor>(
        &mut self,
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<bool>> + Send {
        async move {
            let key = self.validate_primary_key(options.primary_key.as_deref())?;
            let mut statement = Statement::build::<Self>(&options)?.with_key(key);
            statement.limit = Some(1);
            let sql = write_sql(executor, |w, out| w.write_select(out, &statement));
            match fetch_rows(executor, sql).await?.into_iter().next() {
                Some(row) => {
                    self.assign_row(row)?;
                    Ok(true)
                }
                None => missing::<Self>(&options).map(|_| false),
            }
        }
    }

    /// Loads the only record matching the options into `self`, more than one is an error.
    fn find_one<Exec: Executor>(
        &mut self,
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<bool>> + Send {
        async move {
            let statement = Statement::build::<Self>(&options)?;
            match find_single::<Self, _>(executor, &statement, &options).await? {
                Some(row) => {
                    self.assign_row(row)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    /// Fresh copy of the stored record with the primary key of `self`, `None` when it is
    /// missing and not found errors are ignored.
    fn clone_by_id<Exec: Executor>(
        &self,
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        async move {
            let key = self.validate_primary_key(options.primary_key.as_deref())?;
            let mut clone = Self::default();
            clone.set_column(key.column, key.value)?;
            let found = clone.find_by_id(executor, options).await?;
            Ok(found.then_some(clone))
        }
    }

    /// Like [`Repository::find_one`], leaving `self` untouched.
    fn clone_one<Exec: Executor>(
        &self,
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<Option<Self>>> + Send {
        async move {
            let mut clone = Self::default();
            for (column, value) in self.row().into_vec() {
                clone.set_column(column, value)?;
            }
            let found = clone.find_one(executor, options).await?;
            Ok(found.then_some(clone))
        }
    }

    /// Deletes every row matching the options.
    fn delete_all<Exec: Executor>(
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<u64>> + Send {
        async move {
            let statement = Statement::build::<Self>(&options)?;
            delete_matching::<Self, _>(executor, statement, &options).await
        }
    }

    fn delete_by_id<Exec: Executor>(
        &self,
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<u64>> + Send {
        async move {
            let key = self.validate_primary_key(options.primary_key.as_deref())?;
            let statement = Statement::build::<Self>(&options)?.with_key(key);
            delete_matching::<Self, _>(executor, statement, &options).await
        }
    }

    /// Deletes the only row matching the options.
    fn delete_one<Exec: Executor>(
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<u64>> + Send {
        async move {
            let statement = Statement::build::<Self>(&options)?;
            let Some(row) = find_single::<Self, _>(executor, &statement, &options).await? else {
                return Ok(0);
            };
            let statement = pin_to_row::<Self>(statement, &row);
            delete_matching::<Self, _>(executor, statement, &options).await
        }
    }

    /// Updates every row matching the options. Model updates write their non zero fields.
    fn update_all<Exec: Executor>(
        executor: &mut Exec,
        updates: impl Into<Updates>,
        options: QueryOptions,
    ) -> impl Future<Output = Result<u64>> + Send {
        let values = plain_values::<Self>(updates.into());
        async move {
            let statement = Statement::build::<Self>(&options)?;
            update_matching::<Self, _>(executor, statement, values, &options).await
        }
    }

    /// Updates the record with the primary key of `self`. Column maps are written as they
    /// are, models only write the fields that differ from the stored record.
    fn update_by_id<Exec: Executor>(
        &self,
        executor: &mut Exec,
        updates: impl Into<Updates>,
        options: QueryOptions,
    ) -> impl Future<Output = Result<u64>> + Send {
        let updates = updates.into();
        async move {
            match updates {
                Updates::Model(values) => Ok(update_changes_by_id(self, executor, values, options)
                    .await?
                    .map_or(0, |(_, affected)| affected)),
                Updates::Columns(values) => {
                    let key = self.validate_primary_key(options.primary_key.as_deref())?;
                    let statement = Statement::build::<Self>(&options)?.with_key(key);
                    update_matching::<Self, _>(executor, statement, values, &options).await
                }
            }
        }
    }

    /// Writes only the values differing from the stored record and returns them, `None`
    /// when the record is missing and not found errors are ignored.
    fn update_by_id_with_changed_values<Exec: Executor>(
        &self,
        executor: &mut Exec,
        updates: impl Into<Updates>,
        options: QueryOptions,
    ) -> impl Future<Output = Result<Option<Values>>> + Send {
        let values = updates.into().into_values();
        async move {
            Ok(update_changes_by_id(self, executor, values, options)
                .await?
                .map(|(changes, _)| changes))
        }
    }

    /// Updates the only row matching the options.
    fn update_one<Exec: Executor>(
        &self,
        executor: &mut Exec,
        updates: impl Into<Updates>,
        options: QueryOptions,
    ) -> impl Future<Output = Result<u64>> + Send {
        let updates = updates.into();
        async move {
            match updates {
                Updates::Model(values) => Ok(update_changes_one(self, executor, values, options)
                    .await?
                    .map_or(0, |(_, affected)| affected)),
                Updates::Columns(values) => {
                    let statement = Statement::build::<Self>(&options)?;
                    let Some(row) = find_single::<Self, _>(executor, &statement, &options).await?
                    else {
                        return Ok(0);
                    };
                    let statement = pin_to_row::<Self>(statement, &row);
                    update_matching::<Self, _>(executor, statement, values, &options).await
                }
            }
        }
    }

    fn update_one_with_changed_values<Exec: Executor>(
        &self,
        executor: &mut Exec,
        updates: impl Into<Updates>,
        options: QueryOptions,
    ) -> impl Future<Output = Result<Option<Values>>> + Send {
        let values = updates.into().into_values();
        async move {
            Ok(update_changes_one(self, executor, values, options)
                .await?
                .map(|(changes, _)| changes))
        }
    }

    /// Loads the first matching row into `self`, ordered by primary key when `first` or
    /// `last` is set. Returns whether a row was found, a missing one is never an error.
    fn find<Exec: Executor>(
        &mut self,
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<bool>> + Send {
        async move {
            let mut statement = Statement::build::<Self>(&options)?;
            if let Some(column) = Self::primary_key_def() {
                if options.first {
                    statement.order.push(format!("{} asc", column.name));
                } else if options.last {
                    statement.order.push(format!("{} desc", column.name));
                }
            }
            statement.limit = Some(1);
            let sql = write_sql(executor, |w, out| w.write_select(out, &statement));
            match fetch_rows(executor, sql).await?.into_iter().next() {
                Some(row) => {
                    self.assign_row(row)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    /// Every matching row, newest primary key first unless sorted otherwise.
    fn find_all<Exec: Executor>(
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<Vec<Self>>> + Send {
        async move {
            let statement = Statement::build::<Self>(&options)?.with_default_sort::<Self>();
            let sql = write_sql(executor, |w, out| w.write_select(out, &statement));
            fetch_rows(executor, sql)
                .await?
                .into_iter()
                .map(Self::from_row)
                .collect()
        }
    }

    /// Like [`Repository::find_all`], also counting every match when a page is requested.
    fn find_page<Exec: Executor>(
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<(Vec<Self>, u64)>> + Send {
        async move {
            let statement = Statement::build::<Self>(&options)?.with_default_sort::<Self>();
            let sql = write_sql(executor, |w, out| w.write_select(out, &statement));
            let list = fetch_rows(executor, sql)
                .await?
                .into_iter()
                .map(Self::from_row)
                .collect::<Result<Vec<_>>>()?;
            let total = if options.pageable.is_some() {
                count_matching(executor, &statement).await?
            } else {
                0
            };
            Ok((list, total))
        }
    }

    /// Values of the column named by [`QueryOptions::pluck`].
    fn pluck<T: AsValue + Send, Exec: Executor>(
        executor: &mut Exec,
        options: QueryOptions,
    ) -> impl Future<Output = Result<Vec<T>>> + Send {
        async move {
            let column = options
                .pluck
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or(DbError::Pluck)?;
            let mut statement = Statement::build::<Self>(&options)?;
            statement.select = Some((column, Vec::new()));
            let sql = write_sql(executor, |w, out| w.write_select(out, &statement));
            fetch_rows(executor, sql)
                .await?
                .into_iter()
                .filter_map(|row| row.into_first_value())
                .map(T::try_from_value)
                .collect()
        }
    }
}

impl<M: Model> Repository for M {}

fn write_sql<Exec: Executor>(executor: &Exec, f: impl FnOnce(&dyn SqlWriter, &mut String)) -> String {
    let mut out = String::new();
    let writer = executor.driver().sql_writer();
    f(writer.as_dyn(), &mut out);
    out
}

async fn fetch_rows<Exec: Executor>(executor: &mut Exec, sql: String) -> Result<Vec<RowLabeled>> {
    executor
        .fetch(sql)
        .try_collect()
        .await
        .map_err(|e: Error| e.context(DbError::Query))
}

async fn count_matching<Exec: Executor>(executor: &mut Exec, statement: &Statement) -> Result<u64> {
    let sql = write_sql(executor, |w, out| w.write_count(out, statement));
    let value = fetch_rows(executor, sql)
        .await?
        .into_iter()
        .next()
        .and_then(|row| row.into_first_value());
    match value {
        Some(value) => u64::try_from_value(value),
        None => Ok(0),
    }
}

/// The single row matched by `statement`. `None` when nothing matched and not found errors
/// are ignored.
async fn find_single<M: Model, Exec: Executor>(
    executor: &mut Exec,
    statement: &Statement,
    options: &QueryOptions,
) -> Result<Option<RowLabeled>> {
    let mut statement = statement.clone();
    statement.limit.get_or_insert(2);
    let sql = write_sql(executor, |w, out| w.write_select(out, &statement));
    let mut rows = fetch_rows(executor, sql).await?;
    if rows.len() > 1 {
        return Err(not_single_error(options));
    }
    match rows.pop() {
        Some(row) => Ok(Some(row)),
        None => missing::<M>(options).map(|_| None),
    }
}

async fn delete_matching<M: Model, Exec: Executor>(
    executor: &mut Exec,
    statement: Statement,
    options: &QueryOptions,
) -> Result<u64> {
    if !statement.has_condition() {
        return Err(DbError::MissingCondition.into());
    }
    let sql = write_sql(executor, |w, out| w.write_delete(out, &statement));
    let affected = executor
        .execute(sql)
        .await
        .map_err(|e| e.context(DbError::Query))?;
    if affected.rows_affected == 0 && options.must_affected {
        return Err(not_affected_error::<M>(options));
    }
    Ok(affected.rows_affected)
}

async fn update_matching<M: Model, Exec: Executor>(
    executor: &mut Exec,
    statement: Statement,
    mut values: Values,
    options: &QueryOptions,
) -> Result<u64> {
    for (column, value) in &options.updates {
        values.entry(column.clone()).or_insert_with(|| value.clone());
    }
    let mut set = Vec::<(&'static str, Value)>::with_capacity(values.len() + 1);
    for (key, value) in values {
        let column = M::column_def(&key).ok_or_else(|| {
            DbError::Value(format!("`{key}` is not a column of `{}`", M::table_name()))
        })?;
        set.push((column.name, value));
    }
    if !set.is_empty() {
        if let Some(column) = M::role_column(ColumnRole::UpdatedAt) {
            if !set.iter().any(|(c, _)| *c == column.name) {
                if let Some(now) = current_time(&column.value) {
                    set.push((column.name, now));
                }
            }
        }
    }
    if !options.attend.is_empty() {
        set.retain(|(column, _)| {
            options
                .attend
                .iter()
                .any(|v| M::column_def(v).is_some_and(|c| c.name == *column))
        });
    }
    set.retain(|(column, _)| !is_omitted::<M>(options, column));
    if set.is_empty() {
        log::debug!("Nothing to update in `{}`", M::table_name());
        return Ok(0);
    }
    if !statement.has_condition() {
        return Err(DbError::MissingCondition.into());
    }
    let sql = write_sql(executor, |w, out| w.write_update(out, &statement, &set));
    let affected = executor
        .execute(sql)
        .await
        .map_err(reconcile_write_error::<M>)?;
    if affected.rows_affected == 0 && options.must_affected {
        return Err(not_affected_error::<M>(options));
    }
    Ok(affected.rows_affected)
}

async fn update_changes_by_id<M: Model, Exec: Executor>(
    model: &M,
    executor: &mut Exec,
    proposed: Values,
    options: QueryOptions,
) -> Result<Option<(Values, u64)>> {
    let Some(current) = model.clone_by_id(executor, options.clone()).await? else {
        return Ok(None);
    };
    let changes = changed_values(&current, &proposed);
    if changes.is_empty() {
        return Ok(Some((changes, 0)));
    }
    let key = model.validate_primary_key(options.primary_key.as_deref())?;
    let statement = Statement::build::<M>(&options)?.with_key(key);
    let affected = update_matching::<M, _>(executor, statement, changes.clone(), &options).await?;
    Ok(Some((changes, affected)))
}

async fn update_changes_one<M: Model, Exec: Executor>(
    model: &M,
    executor: &mut Exec,
    proposed: Values,
    options: QueryOptions,
) -> Result<Option<(Values, u64)>> {
    let Some(current) = model.clone_one(executor, options.clone()).await? else {
        return Ok(None);
    };
    let changes = changed_values(&current, &proposed);
    if changes.is_empty() {
        return Ok(Some((changes, 0)));
    }
    let mut statement = Statement::build::<M>(&options)?;
    if let Ok(key) = current.validate_primary_key(options.primary_key.as_deref()) {
        statement = statement.with_key(key);
    }
    let affected = update_matching::<M, _>(executor, statement, changes.clone(), &options).await?;
    Ok(Some((changes, affected)))
}

/// Narrows `statement` to the primary key found in `row`, when the model has one.
fn pin_to_row<M: Model>(statement: Statement, row: &RowLabeled) -> Statement {
    let key = M::primary_key_def().and_then(|column| {
        Some(PrimaryKey {
            column: column.name,
            value: row.get(column.name)?.clone(),
        })
    });
    match key.filter(|v| !v.value.is_zero()) {
        Some(key) => statement.with_key(key),
        None => statement,
    }
}

/// Values of a plain update: model updates keep only non zero fields besides the primary key.
fn plain_values<M: Model>(updates: Updates) -> Values {
    match updates {
        Updates::Columns(values) => values,
        Updates::Model(values) => values
            .into_iter()
            .filter(|(column, value)| {
                !value.is_zero() && M::column_def(column).is_some_and(|c| !c.primary_key)
            })
            .collect(),
    }
}

fn is_omitted<M: Model>(options: &QueryOptions, column: &str) -> bool {
    options
        .omit
        .iter()
        .any(|v| v == column || M::column_def(v).is_some_and(|c| c.name == column))
}

/// Sets the column with `role` to the current time when it is still zero.
fn stamp_time<M: Model>(model: &mut M, role: ColumnRole) -> Result<()> {
    let Some(column) = M::role_column(role) else {
        return Ok(());
    };
    if !model.get_column(column.name).is_none_or(|v| v.is_zero()) {
        return Ok(());
    }
    match current_time(&column.value) {
        Some(now) => model.set_column(column.name, now),
        None => Ok(()),
    }
}

/// Current time in the representation of `template`, unix seconds for integer columns.
pub(crate) fn current_time(template: &Value) -> Option<Value> {
    let now = OffsetDateTime::now_utc();
    Some(match template {
        Value::Timestamp(..) => {
            Value::Timestamp(Some(PrimitiveDateTime::new(now.date(), now.time())))
        }
        Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(Some(now)),
        Value::Date(..) => Value::Date(Some(now.date())),
        Value::Int32(..) | Value::Int64(..) | Value::UInt32(..) | Value::UInt64(..) => {
            Value::Int64(Some(now.unix_timestamp()))
        }
        _ => return None,
    })
}

fn missing<M: Model>(options: &QueryOptions) -> Result<()> {
    if options.ignore_not_found {
        return Ok(());
    }
    Err(match &options.error_not_found {
        Some(f) => f(),
        None => DbError::RecordNotFound(M::record_not_found_message().into()).into(),
    })
}

fn not_affected_error<M: Model>(options: &QueryOptions) -> Error {
    match &options.error_not_affected {
        Some(f) => f(),
        None => DbError::RecordNotAffected(M::not_affected_message().into()).into(),
    }
}

fn not_single_error(options: &QueryOptions) -> Error {
    match &options.error_not_single {
        Some(f) => f(),
        None => DbError::RecordNotUnique.into(),
    }
}
