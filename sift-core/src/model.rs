use crate::{
    ColumnDef, ColumnRole, DbError, Result, RowLabeled, TableRef, UniqueIndex, Value, Values,
};

/// A struct mapped to a table, usually implemented through `#[derive(Model)]`.
///
/// Implementors describe their columns and move values in and out by column name, the
/// provided methods build everything else on top of that.
pub trait Model: Default + Send + Sync + Sized {
    fn table_ref() -> &'static TableRef;
    /// Columns in declaration order.
    fn columns() -> &'static [ColumnDef];
    /// Current value of every column, in declaration order.
    fn row(&self) -> Box<[(&'static str, Value)]>;
    /// Assigns a column, found by column or field name.
    fn set_column(&mut self, column: &str, value: Value) -> Result<()>;

    /// Unique indexes and the messages reported when they are violated. `None` when the
    /// model declares none.
    fn unique_indexes() -> Option<&'static [UniqueIndex]> {
        None
    }
    fn record_not_found_message() -> &'static str {
        "record not found"
    }
    fn not_affected_message() -> &'static str {
        "record for update not found"
    }

    fn table_name() -> &'static str {
        Self::table_ref().name
    }
    fn column_def(name: &str) -> Option<&'static ColumnDef> {
        Self::columns().iter().find(|c| c.matches(name))
    }
    fn primary_key_def() -> Option<&'static ColumnDef> {
        Self::columns().iter().find(|c| c.primary_key)
    }
    fn role_column(role: ColumnRole) -> Option<&'static ColumnDef> {
        Self::columns().iter().find(|c| c.role == role)
    }
    fn get_column(&self, name: &str) -> Option<Value> {
        let column = Self::column_def(name)?;
        self.row()
            .into_vec()
            .into_iter()
            .find_map(|(c, v)| (c == column.name).then_some(v))
    }
    fn to_values(&self) -> Values {
        self.row()
            .into_vec()
            .into_iter()
            .map(|(c, v)| (c.to_string(), v))
            .collect()
    }
    /// Overwrites the columns present in `row`, labels unknown to the model are skipped.
    fn assign_row(&mut self, row: RowLabeled) -> Result<()> {
        for (label, value) in row.iter() {
            if Self::column_def(label).is_some() {
                self.set_column(label, value.clone())?;
            }
        }
        Ok(())
    }
    fn from_row(row: RowLabeled) -> Result<Self> {
        let mut result = Self::default();
        result.assign_row(row)?;
        Ok(result)
    }
    fn primary_key_value(&self) -> Option<Value> {
        self.get_column(Self::primary_key_def()?.name)
    }
    /// Column and value identifying this record. `column` overrides the declared primary
    /// key, the value must not be zero.
    fn validate_primary_key(&self, column: Option<&str>) -> Result<PrimaryKey> {
        let column = match column.filter(|v| !v.is_empty()) {
            Some(column) => column,
            None => Self::primary_key_def().ok_or(DbError::PrimaryKeyUnset)?.name,
        };
        let column = Self::column_def(column).ok_or(DbError::PrimaryKeyInvalid)?;
        let value = self
            .get_column(column.name)
            .ok_or(DbError::PrimaryKeyInvalid)?;
        if value.is_zero() {
            return Err(DbError::PrimaryKeyEmpty.into());
        }
        Ok(PrimaryKey {
            column: column.name,
            value,
        })
    }
    fn set_primary_key(&mut self, value: Value) -> Result<()> {
        let column = Self::primary_key_def().ok_or(DbError::PrimaryKeyUnset)?;
        self.set_column(column.name, value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey {
    pub column: &'static str,
    pub value: Value,
}
