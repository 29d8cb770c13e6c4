use crate::Value;

/// Bookkeeping purpose of a column, recognised by the repository and the service layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    #[default]
    Regular,
    /// Soft delete marker, `0` while the row is alive.
    Deleted,
    CreatedAt,
    CreatedBy,
    UpdatedAt,
    UpdatedBy,
}

/// Metadata of a model column.
#[derive(Debug, Default)]
pub struct ColumnDef {
    /// Column name in the database.
    pub name: &'static str,
    /// Name of the Rust field.
    pub field: &'static str,
    /// Empty value of the field type, it tells the variant the column decodes to.
    pub value: Value,
    pub nullable: bool,
    pub primary_key: bool,
    pub role: ColumnRole,
}

impl ColumnDef {
    pub fn name(&self) -> &'static str {
        self.name
    }
    /// True when `name` is either the column or the field name.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.field == name
    }
}
