use crate::{
    AsValue, ColumnRole, DbError, Error, Executor, Filters, Model, Pageable, QueryOptions,
    Repository, Result, Value, is_record_not_found_error,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, marker::PhantomData};
use time::OffsetDateTime;

/// Identifier sent by a client, kept as a JSON number so integer and decimal keys both fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdReq {
    pub id: serde_json::Number,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterReq {
    #[serde(default)]
    pub filters: BTreeMap<String, serde_json::Value>,
}

impl FilterReq {
    pub fn filters(&self) -> Filters {
        json_filters(&self.filters)
    }
}

/// Page request, `{"page": 1, "size": 20, "sort": "id desc", "filters": {"name$like": "a"}}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReq {
    #[serde(flatten)]
    pub pageable: Pageable,
    #[serde(default)]
    pub filters: BTreeMap<String, serde_json::Value>,
}

impl PageReq {
    pub fn filters(&self) -> Filters {
        json_filters(&self.filters)
    }
}

fn json_filters(filters: &BTreeMap<String, serde_json::Value>) -> Filters {
    filters
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.clone())))
        .collect()
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRes<T> {
    pub list: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRes {
    pub title: String,
}

type TitleFn<M> = Box<dyn Fn(&M) -> String + Send + Sync>;

/// Create, update, soft delete and lookup of one model type, the usual backing of a CRUD
/// endpoint.
///
/// Records are addressed by primary key, either the one declared on the model or the
/// column given to [`Service::with_primary_key`]. Every lookup accepts extra [`Filters`].
pub struct Service<M: Model> {
    title: Option<TitleFn<M>>,
    primary_key: Option<String>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Default for Service<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> fmt::Debug for Service<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("table", &M::table_name())
            .field("primary_key", &self.primary_key)
            .field("title", &self.title.is_some())
            .finish()
    }
}

impl<M: Model> Service<M> {
    pub fn new() -> Self {
        Self {
            title: None,
            primary_key: None,
            _model: PhantomData,
        }
    }
    /// Function producing the title returned by [`Service::find_title`].
    pub fn with_title(mut self, title: impl Fn(&M) -> String + Send + Sync + 'static) -> Self {
        self.title = Some(Box::new(title));
        self
    }
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn primary_key(&self) -> Result<&str> {
        match &self.primary_key {
            Some(column) => Ok(column),
            None => Ok(M::primary_key_def().ok_or(DbError::PrimaryKeyUnset)?.name),
        }
    }

    pub fn new_model(&self) -> M {
        M::default()
    }
    pub fn new_model_with_id(&self, id: impl AsValue) -> Result<M> {
        let mut model = M::default();
        model.set_column(self.primary_key()?, id.as_value())?;
        Ok(model)
    }
    /// New model carrying the primary key value found in `value`.
    pub fn new_model_with_value<V: Model>(&self, value: &V) -> Result<M> {
        let column = self.primary_key()?;
        let id = value
            .get_column(column)
            .ok_or(DbError::PrimaryKeyInvalid)?;
        let mut model = M::default();
        model.set_column(column, id)?;
        Ok(model)
    }

    fn options(&self) -> QueryOptions {
        match &self.primary_key {
            Some(column) => QueryOptions::new().primary_key(column.clone()),
            None => QueryOptions::new(),
        }
    }

    pub async fn create<Exec: Executor>(&self, executor: &mut Exec, model: &mut M) -> Result<()> {
        model.create(executor, self.options()).await?;
        Ok(())
    }
    pub async fn create_with_user_id<Exec: Executor>(
        &self,
        executor: &mut Exec,
        model: &mut M,
        user_id: i64,
    ) -> Result<()> {
        set_created_by(model, user_id)?;
        self.create(executor, model).await
    }

    /// Writes the fields of `model` that differ from the stored record, creation columns
    /// excluded, then reloads `model`.
    pub async fn update<Exec: Executor>(
        &self,
        executor: &mut Exec,
        model: &mut M,
        filters: Filters,
    ) -> Result<()> {
        let omit = [ColumnRole::CreatedAt, ColumnRole::CreatedBy]
            .into_iter()
            .filter_map(M::role_column)
            .map(|c| c.name);
        let options = self.options().omit(omit).filters(filters);
        model.update_by_id(executor, &*model, options).await?;
        model.find_by_id(executor, self.options()).await?;
        Ok(())
    }
    pub async fn update_with_user_id<Exec: Executor>(
        &self,
        executor: &mut Exec,
        model: &mut M,
        user_id: i64,
        filters: Filters,
    ) -> Result<()> {
        set_updated_by(model, user_id)?;
        self.update(executor, model, filters).await
    }
    /// Updates the record, creating it when it does not exist.
    pub async fn update_or_create_with_user_id<Exec: Executor>(
        &self,
        executor: &mut Exec,
        model: &mut M,
        user_id: i64,
        filters: Filters,
    ) -> Result<()> {
        set_updated_by(model, user_id)?;
        match self.update(executor, model, filters).await {
            Err(e) if is_record_not_found_error(&e) => {
                log::debug!("No `{}` to update, creating it", M::table_name());
                self.create_with_user_id(executor, model, user_id).await
            }
            result => result,
        }
    }

    /// Soft deletes the record: marks the deleted column and writes nothing else besides
    /// the update bookkeeping columns.
    pub async fn remove<Exec: Executor>(
        &self,
        executor: &mut Exec,
        model: &mut M,
        filters: Filters,
    ) -> Result<()> {
        if M::role_column(ColumnRole::Deleted).is_none() {
            return Err(Error::new(DbError::Model).context(format!(
                "`{}` has no deleted column, it cannot be removed",
                M::table_name()
            )));
        }
        set_deleted(model)?;
        let attend = [
            ColumnRole::UpdatedAt,
            ColumnRole::UpdatedBy,
            ColumnRole::Deleted,
        ]
        .into_iter()
        .filter_map(M::role_column)
        .map(|c| c.name);
        let options = self.options().attend(attend).filters(filters);
        model.update_by_id(executor, &*model, options).await?;
        Ok(())
    }
    pub async fn remove_by_id<Exec: Executor>(
        &self,
        executor: &mut Exec,
        id: impl AsValue,
        filters: Filters,
    ) -> Result<()> {
        let mut model = self.new_model_with_id(id)?;
        self.remove(executor, &mut model, filters).await
    }
    pub async fn remove_by_id_with_user_id<Exec: Executor>(
        &self,
        executor: &mut Exec,
        id: impl AsValue,
        user_id: i64,
        filters: Filters,
    ) -> Result<()> {
        let mut model = self.new_model_with_id(id)?;
        set_updated_by(&mut model, user_id)?;
        self.remove(executor, &mut model, filters).await
    }

    pub async fn find_title<Exec: Executor>(
        &self,
        executor: &mut Exec,
        id: impl AsValue,
        filters: Filters,
    ) -> Result<TitleRes> {
        let Some(title) = &self.title else {
            return Err(Error::msg(format!(
                "No title function for `{}`",
                M::table_name()
            )));
        };
        let model = self.find_by_id(executor, id, filters).await?;
        Ok(TitleRes {
            title: title(&model),
        })
    }
    pub async fn find_by_id<Exec: Executor>(
        &self,
        executor: &mut Exec,
        id: impl AsValue,
        filters: Filters,
    ) -> Result<M> {
        let mut model = self.new_model_with_id(id)?;
        model
            .find_by_id(executor, self.options().filters(filters))
            .await?;
        Ok(model)
    }
    pub async fn find_all<Exec: Executor>(
        &self,
        executor: &mut Exec,
        filters: Filters,
    ) -> Result<Vec<M>> {
        M::find_all(executor, self.options().filters(filters)).await
    }
    pub async fn find_page<Exec: Executor>(
        &self,
        executor: &mut Exec,
        pageable: Pageable,
        filters: Filters,
    ) -> Result<PageRes<M>> {
        let options = self.options().filters(filters).pageable(pageable);
        let (list, total) = M::find_page(executor, options).await?;
        Ok(PageRes { list, total })
    }
    /// The only record matching `filters`, `None` when there is none.
    pub async fn find_one<Exec: Executor>(
        &self,
        executor: &mut Exec,
        filters: Filters,
    ) -> Result<Option<M>> {
        let mut model = M::default();
        let found = model
            .find_one(executor, self.options().filters(filters).ignore_not_found())
            .await?;
        Ok(found.then_some(model))
    }
}

fn set_role<M: Model>(model: &mut M, role: ColumnRole, value: Value) -> Result<()> {
    match M::role_column(role) {
        Some(column) => model.set_column(column.name, value),
        None => Ok(()),
    }
}

/// Assigns `user_id` to the created by and updated by columns, when the model has them.
pub fn set_created_by<M: Model>(model: &mut M, user_id: i64) -> Result<()> {
    set_role(model, ColumnRole::CreatedBy, Value::Int64(Some(user_id)))?;
    set_updated_by(model, user_id)
}

pub fn set_updated_by<M: Model>(model: &mut M, user_id: i64) -> Result<()> {
    set_role(model, ColumnRole::UpdatedBy, Value::Int64(Some(user_id)))
}

/// Marks the model deleted with the current unix time.
pub fn set_deleted<M: Model>(model: &mut M) -> Result<()> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    set_role(model, ColumnRole::Deleted, Value::Int64(Some(now)))
}
