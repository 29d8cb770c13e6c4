use sift_core::SqlWriter;
use std::fmt::Write;
use time::{OffsetDateTime, UtcOffset};

/// MySQL dialect: backtick identifiers, backslash aware string literals and `LIMIT` required
/// by `OFFSET`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySQLSqlWriter {}

impl SqlWriter for MySQLSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        for c in value.chars() {
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                '\0' => out.push_str("\\0"),
                _ => out.push(c),
            }
        }
        out.push('\'');
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(["0", "1"][value as usize]);
    }

    /// DATETIME has no zone, values are stored in UTC.
    fn write_value_timestamptz(&self, out: &mut String, value: &OffsetDateTime) {
        let value = value.to_offset(UtcOffset::UTC);
        out.push('\'');
        self.write_value_date(out, &value.date());
        out.push(' ');
        self.write_value_time(out, &value.time());
        out.push('\'');
    }

    fn write_limit_offset(&self, out: &mut String, limit: Option<u64>, offset: Option<u64>) {
        match (limit, offset) {
            (None, Some(..)) => out.push_str("\nLIMIT 18446744073709551615"),
            (Some(limit), _) => {
                let _ = write!(out, "\nLIMIT {}", limit);
            }
            _ => {}
        }
        if let Some(offset) = offset {
            let _ = write!(out, "\nOFFSET {}", offset);
        }
    }
}
