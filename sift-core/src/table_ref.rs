/// Static name of the table a model maps to.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef {
    pub name: &'static str,
    /// Schema name (may be empty).
    pub schema: &'static str,
}

impl TableRef {
    pub fn full_name(&self) -> String {
        let mut result = String::new();
        if !self.schema.is_empty() {
            result.push_str(self.schema);
            result.push('.');
        }
        result.push_str(self.name);
        result
    }
}

/// Where a statement reads from or writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The table of the model, columns get qualified with its name.
    Table(&'static TableRef),
    /// Verbatim SQL fragment, for example an aliased table or a view.
    Raw(String),
}

impl Source {
    /// Prefix used to qualify the columns of the model, empty for raw sources.
    pub fn qualifier(&self) -> &str {
        match self {
            Source::Table(table) => table.name,
            Source::Raw(..) => "",
        }
    }
}
