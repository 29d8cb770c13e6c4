use crate::{
    Condition, Operator, Source, Statement, TableRef, Value, possibly_parenthesized, separated_by,
};
use std::fmt::Write;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($this:ident, $out:ident, $value:expr) => {{
        if $value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format_finite($value));
        } else {
            $this.write_value_none($out);
        }
    }};
}

/// Renders statements as SQL text with values written inline as escaped literals.
///
/// Every method has a default producing standard SQL, drivers override the ones their
/// dialect spells differently (identifier quoting, string escapes, paging).
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    /// Quotes each part of a possibly qualified column name, expressions are written as they are.
    fn write_column_name(&self, out: &mut String, value: &str) {
        if value == "*" || value.contains([' ', '(', '"', '`', '*']) {
            out.push_str(value);
            return;
        }
        separated_by(
            out,
            value.split('.'),
            |out, v| self.write_identifier_quoted(out, v),
            ".",
        );
    }

    fn write_table_ref(&self, out: &mut String, value: &TableRef) {
        if !value.schema.is_empty() {
            self.write_identifier_quoted(out, value.schema);
            out.push('.');
        }
        self.write_identifier_quoted(out, value.name);
    }

    fn write_source(&self, out: &mut String, value: &Source) {
        match value {
            Source::Table(table) => self.write_table_ref(out, table),
            Source::Raw(raw) => out.push_str(raw),
        }
    }

    fn write_value(&self, out: &mut String, value: &Value) {
        if value.is_null() {
            return self.write_value_none(out);
        }
        match value {
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Int8(Some(v)) => write_integer!(out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::UInt8(Some(v)) => write_integer!(out, *v),
            Value::UInt16(Some(v)) => write_integer!(out, *v),
            Value::UInt32(Some(v)) => write_integer!(out, *v),
            Value::UInt64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) => write_float!(self, out, *v),
            Value::Float64(Some(v)) => write_float!(self, out, *v),
            Value::Decimal(Some(v)) => {
                let _ = write!(out, "{}", v);
            }
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v),
            Value::Date(Some(v)) => {
                out.push('\'');
                self.write_value_date(out, v);
                out.push('\'');
            }
            Value::Time(Some(v)) => {
                out.push('\'');
                self.write_value_time(out, v);
                out.push('\'');
            }
            Value::Timestamp(Some(v)) => self.write_value_timestamp(out, v),
            Value::TimestampWithTimezone(Some(v)) => self.write_value_timestamptz(out, v),
            Value::Uuid(Some(v)) => {
                let _ = write!(out, "'{}'", v);
            }
            Value::List(Some(v), ..) => {
                out.push('(');
                separated_by(out, v, |out, v| self.write_value(out, v), ", ");
                out.push(')');
            }
            _ => self.write_value_none(out),
        }
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL")
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize])
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    fn write_value_date(&self, out: &mut String, value: &Date) {
        let _ = write!(
            out,
            "{:04}-{:02}-{:02}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    fn write_value_time(&self, out: &mut String, value: &Time) {
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}",
            value.hour(),
            value.minute(),
            value.second(),
        );
        let mut subsecond = value.nanosecond();
        if subsecond == 0 {
            return;
        }
        let mut width = 9;
        while subsecond % 10 == 0 {
            subsecond /= 10;
            width -= 1;
        }
        let _ = write!(out, ".{:0width$}", subsecond);
    }

    fn write_value_timestamp(&self, out: &mut String, value: &PrimitiveDateTime) {
        out.push('\'');
        self.write_value_date(out, &value.date());
        out.push(' ');
        self.write_value_time(out, &value.time());
        out.push('\'');
    }

    fn write_value_timestamptz(&self, out: &mut String, value: &OffsetDateTime) {
        out.push('\'');
        self.write_value_date(out, &value.date());
        out.push(' ');
        self.write_value_time(out, &value.time());
        let offset = value.offset();
        let _ = write!(
            out,
            "{}{:02}:{:02}",
            if offset.is_negative() { '-' } else { '+' },
            offset.whole_hours().abs(),
            offset.minutes_past_hour().abs()
        );
        out.push('\'');
    }

    /// Writes `sql` replacing each `?` outside string literals with the next argument.
    fn write_fragment(&self, out: &mut String, sql: &str, args: &[Value]) {
        let mut args = args.iter();
        let mut quoted = false;
        let mut position = 0;
        for (i, c) in sql.char_indices() {
            match c {
                '\'' => quoted = !quoted,
                '?' if !quoted => {
                    let Some(arg) = args.next() else {
                        continue;
                    };
                    out.push_str(&sql[position..i]);
                    match arg {
                        Value::List(Some(values), ..) => {
                            separated_by(out, values, |out, v| self.write_value(out, v), ", ")
                        }
                        _ => self.write_value(out, arg),
                    }
                    position = i + 1;
                }
                _ => {}
            }
        }
        out.push_str(&sql[position..]);
    }

    fn write_condition(&self, out: &mut String, value: &Condition) {
        match value {
            Condition::Raw { sql, args } => {
                out.push('(');
                self.write_fragment(out, sql, args);
                out.push(')');
            }
            Condition::Compare {
                column,
                operator,
                value,
            } => self.write_comparison(out, column, *operator, value),
            Condition::Columns(columns) => {
                possibly_parenthesized!(
                    out,
                    columns.len() > 1,
                    separated_by(
                        out,
                        columns,
                        |out, (column, value)| {
                            self.write_comparison(out, column, Operator::Equals, value)
                        },
                        " AND ",
                    )
                );
            }
        }
    }

    fn write_comparison(&self, out: &mut String, column: &str, operator: Operator, value: &Value) {
        match (operator, value) {
            (Operator::In | Operator::NotIn, Value::List(values, ..)) => {
                if values.as_ref().is_none_or(Vec::is_empty) {
                    out.push_str(if operator == Operator::In {
                        "1 = 0"
                    } else {
                        "1 = 1"
                    });
                    return;
                }
                self.write_column_name(out, column);
                out.push(' ');
                out.push_str(operator.sql());
                out.push(' ');
                self.write_value(out, value);
            }
            (Operator::In | Operator::NotIn, _) => {
                self.write_column_name(out, column);
                out.push(' ');
                out.push_str(operator.sql());
                out.push_str(" (");
                self.write_value(out, value);
                out.push(')');
            }
            (Operator::Equals | Operator::NotEquals, v) if v.is_null() => {
                self.write_column_name(out, column);
                out.push_str(if operator == Operator::Equals {
                    " IS NULL"
                } else {
                    " IS NOT NULL"
                });
            }
            _ => {
                self.write_column_name(out, column);
                out.push(' ');
                out.push_str(operator.sql());
                out.push(' ');
                self.write_value(out, value);
            }
        }
    }

    fn write_where(&self, out: &mut String, statement: &Statement) {
        let main = !statement.wheres.is_empty() || !statement.ors.is_empty();
        let rest: Vec<&Condition> = statement
            .soft_delete
            .iter()
            .chain(&statement.filters)
            .chain(&statement.keys)
            .collect();
        if !main && rest.is_empty() {
            return;
        }
        out.push_str("\nWHERE ");
        if main {
            possibly_parenthesized!(out, !statement.ors.is_empty() && !rest.is_empty(), {
                separated_by(
                    out,
                    &statement.wheres,
                    |out, v| self.write_condition(out, v),
                    " AND ",
                );
                if !statement.wheres.is_empty() && !statement.ors.is_empty() {
                    out.push_str(" OR ");
                }
                separated_by(
                    out,
                    &statement.ors,
                    |out, v| self.write_condition(out, v),
                    " OR ",
                );
            });
            if !rest.is_empty() {
                out.push_str(" AND ");
            }
        }
        separated_by(out, rest, |out, v| self.write_condition(out, v), " AND ");
    }

    fn write_select_list(&self, out: &mut String, statement: &Statement) {
        if let Some((sql, args)) = &statement.select {
            return self.write_fragment(out, sql, args);
        }
        if statement.columns.is_empty() {
            return out.push('*');
        }
        let qualifier = statement.source.qualifier();
        separated_by(
            out,
            &statement.columns,
            |out, v| {
                if !qualifier.is_empty() {
                    self.write_identifier_quoted(out, qualifier);
                    out.push('.');
                }
                self.write_identifier_quoted(out, v);
            },
            ", ",
        );
    }

    /// `FROM`, joins and `WHERE`.
    fn write_from(&self, out: &mut String, statement: &Statement) {
        out.push_str("\nFROM ");
        self.write_source(out, &statement.source);
        for join in &statement.joins {
            if let Condition::Raw { sql, args } = join {
                out.push('\n');
                self.write_fragment(out, sql, args);
            }
        }
        self.write_where(out, statement);
    }

    fn write_group(&self, out: &mut String, statement: &Statement) {
        if let Some(group) = &statement.group {
            out.push_str("\nGROUP BY ");
            out.push_str(group);
        }
    }

    fn write_limit_offset(&self, out: &mut String, limit: Option<u64>, offset: Option<u64>) {
        if let Some(limit) = limit {
            let _ = write!(out, "\nLIMIT {}", limit);
        }
        if let Some(offset) = offset {
            let _ = write!(out, "\nOFFSET {}", offset);
        }
    }

    fn write_select(&self, out: &mut String, statement: &Statement) {
        out.push_str("SELECT ");
        self.write_select_list(out, statement);
        self.write_from(out, statement);
        self.write_group(out, statement);
        if !statement.order.is_empty() {
            out.push_str("\nORDER BY ");
            separated_by(out, &statement.order, |out, v| out.push_str(v), ", ");
        }
        self.write_limit_offset(out, statement.limit, statement.offset);
        out.push(';');
    }

    /// Counts the rows `statement` matches, ignoring ordering and paging.
    fn write_count(&self, out: &mut String, statement: &Statement) {
        if statement.group.is_some() {
            out.push_str("SELECT COUNT(*) FROM (SELECT ");
            self.write_select_list(out, statement);
            self.write_from(out, statement);
            self.write_group(out, statement);
            out.push_str(") AS counted;");
        } else {
            out.push_str("SELECT COUNT(*)");
            self.write_from(out, statement);
            out.push(';');
        }
    }

    fn write_insert(&self, out: &mut String, source: &Source, row: &[(&str, Value)]) {
        out.push_str("INSERT INTO ");
        self.write_source(out, source);
        out.push_str(" (");
        separated_by(
            out,
            row,
            |out, v| self.write_identifier_quoted(out, v.0),
            ", ",
        );
        out.push_str(") VALUES (");
        separated_by(out, row, |out, v| self.write_value(out, &v.1), ", ");
        out.push_str(");");
    }

    fn write_update(&self, out: &mut String, statement: &Statement, values: &[(&str, Value)]) {
        out.push_str("UPDATE ");
        self.write_source(out, &statement.source);
        out.push_str(" SET ");
        separated_by(
            out,
            values,
            |out, (column, value)| {
                self.write_identifier_quoted(out, column);
                out.push_str(" = ");
                self.write_value(out, value);
            },
            ", ",
        );
        self.write_where(out, statement);
        out.push(';');
    }

    fn write_delete(&self, out: &mut String, statement: &Statement) {
        out.push_str("DELETE FROM ");
        self.write_source(out, &statement.source);
        self.write_where(out, statement);
        out.push(';');
    }
}

/// Standard SQL with double quoted identifiers.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;
impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}
impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
