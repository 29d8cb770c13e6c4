use rust_decimal::Decimal;
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Write},
};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Column values keyed by column (or field) name.
pub type Values = BTreeMap<String, Value>;

#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
    List(Option<Vec<Value>>, /* type: */ Box<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::List(l, ..), Self::List(r, ..)) => l == r && self.same_type(other),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(.., l), Self::List(.., r)) => l.same_type(r),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }

    /// True for `Null` and for every typed variant without a payload.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::List(v, ..) => v.is_none(),
        }
    }

    /// Whether the value is the zero value of its type: null, `false`, `0`, the empty string,
    /// an empty blob or list, or the nil uuid.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Boolean(Some(v)) => !v,
            Value::Int8(Some(v)) => *v == 0,
            Value::Int16(Some(v)) => *v == 0,
            Value::Int32(Some(v)) => *v == 0,
            Value::Int64(Some(v)) => *v == 0,
            Value::UInt8(Some(v)) => *v == 0,
            Value::UInt16(Some(v)) => *v == 0,
            Value::UInt32(Some(v)) => *v == 0,
            Value::UInt64(Some(v)) => *v == 0,
            Value::Float32(Some(v)) => *v == 0.0,
            Value::Float64(Some(v)) => *v == 0.0,
            Value::Decimal(Some(v)) => v.is_zero(),
            Value::Varchar(Some(v)) => v.is_empty(),
            Value::Blob(Some(v)) => v.is_empty(),
            Value::Uuid(Some(v)) => v.is_nil(),
            Value::List(Some(v), ..) => v.is_empty(),
            Value::Date(Some(..))
            | Value::Time(Some(..))
            | Value::Timestamp(Some(..))
            | Value::TimestampWithTimezone(Some(..)) => false,
            _ => self.is_null(),
        }
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Value::Date(..) | Value::Time(..) | Value::Timestamp(..) | Value::TimestampWithTimezone(..)
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(..))
    }

    /// Equality that also accepts two values rendering to the same text, `Int64(5)` and
    /// `Varchar("5")` for example. Null only matches null.
    pub fn loosely_eq(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        if self.is_null() || other.is_null() {
            return self.is_null() && other.is_null();
        }
        self.to_string() == other.to_string()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("NULL");
        }
        match self {
            Value::Boolean(Some(v)) => v.fmt(f),
            Value::Int8(Some(v)) => v.fmt(f),
            Value::Int16(Some(v)) => v.fmt(f),
            Value::Int32(Some(v)) => v.fmt(f),
            Value::Int64(Some(v)) => v.fmt(f),
            Value::UInt8(Some(v)) => v.fmt(f),
            Value::UInt16(Some(v)) => v.fmt(f),
            Value::UInt32(Some(v)) => v.fmt(f),
            Value::UInt64(Some(v)) => v.fmt(f),
            Value::Float32(Some(v)) => v.fmt(f),
            Value::Float64(Some(v)) => v.fmt(f),
            Value::Decimal(Some(v)) => v.fmt(f),
            Value::Varchar(Some(v)) => f.write_str(v),
            Value::Blob(Some(v)) => f.write_str(&hex::encode_upper(v)),
            Value::Date(Some(v)) => v.fmt(f),
            Value::Time(Some(v)) => v.fmt(f),
            Value::Timestamp(Some(v)) => v.fmt(f),
            Value::TimestampWithTimezone(Some(v)) => v.fmt(f),
            Value::Uuid(Some(v)) => v.fmt(f),
            Value::List(Some(v), ..) => {
                f.write_char('[')?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt(f)?;
                }
                f.write_char(']')
            }
            _ => f.write_str("NULL"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(v) => Value::Boolean(Some(v)),
            serde_json::Value::Number(v) => {
                if let Some(v) = v.as_i64() {
                    Value::Int64(Some(v))
                } else if let Some(v) = v.as_u64() {
                    Value::UInt64(Some(v))
                } else {
                    Value::Float64(v.as_f64())
                }
            }
            serde_json::Value::String(v) => Value::Varchar(Some(v)),
            serde_json::Value::Array(v) => {
                let values: Vec<Value> = v.into_iter().map(Into::into).collect();
                let element = values
                    .first()
                    .map(|v| match v {
                        Value::Boolean(..) => Value::Boolean(None),
                        Value::Int64(..) => Value::Int64(None),
                        Value::UInt64(..) => Value::UInt64(None),
                        Value::Float64(..) => Value::Float64(None),
                        Value::Varchar(..) => Value::Varchar(None),
                        _ => Value::Null,
                    })
                    .unwrap_or_default();
                Value::List(Some(values), Box::new(element))
            }
            object @ serde_json::Value::Object(..) => Value::Varchar(Some(object.to_string())),
        }
    }
}
