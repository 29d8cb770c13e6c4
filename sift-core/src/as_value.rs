use crate::{Error, Result, Value, truncate_long};
use anyhow::Context;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, str::FromStr};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// Every model field implements it: `as_value` encodes the field for statements,
/// `try_from_value` decodes whatever the driver returned. Text based protocols hand
/// back most columns as `Varchar` or `Blob`, so decoding falls back to [`AsValue::parse`]
/// for those.
///
/// ```rust
/// use sift_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(Value::Varchar(Some("42".into()))).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The null value of the variant this type encodes to.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Parse from the textual representation a database returns.
    fn parse(input: &str) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input),
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

fn cannot_convert<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

fn text(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).context("The value is not valid utf-8 text")
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                #[allow(unreachable_patterns)]
                let wide: i128 = match value {
                    $destination(Some(v)) => return Ok(v),
                    Value::Boolean(Some(v)) => v as i128,
                    Value::Int8(Some(v)) => v as i128,
                    Value::Int16(Some(v)) => v as i128,
                    Value::Int32(Some(v)) => v as i128,
                    Value::Int64(Some(v)) => v as i128,
                    Value::UInt8(Some(v)) => v as i128,
                    Value::UInt16(Some(v)) => v as i128,
                    Value::UInt32(Some(v)) => v as i128,
                    Value::UInt64(Some(v)) => v as i128,
                    Value::Decimal(Some(v)) => {
                        let error = Error::msg(format!(
                            "Value {v}: Decimal does not fit into {}",
                            any::type_name::<Self>()
                        ));
                        if !v.is_integer() {
                            return Err(error.context("The value is not a integer"));
                        }
                        v.to_i128().ok_or(error)?
                    }
                    Value::Varchar(Some(v)) => return <Self as AsValue>::parse(&v),
                    Value::Blob(Some(v)) => return <Self as AsValue>::parse(text(&v)?),
                    other => return Err(cannot_convert::<Self>(&other)),
                };
                <$source>::try_from(wide).map_err(|_| {
                    Error::msg(format!(
                        "Value {wide} is out of range for {}",
                        any::type_name::<Self>()
                    ))
                })
            }
            fn parse(input: &str) -> Result<Self> {
                input.trim().parse::<$source>().with_context(|| {
                    format!(
                        "Cannot parse `{}` as {}",
                        truncate_long!(input),
                        any::type_name::<Self>()
                    )
                })
            }
        }
    };
}
impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(v != 0),
            Value::Int16(Some(v)) => Ok(v != 0),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::UInt8(Some(v)) => Ok(v != 0),
            Value::UInt16(Some(v)) => Ok(v != 0),
            Value::UInt32(Some(v)) => Ok(v != 0),
            Value::UInt64(Some(v)) => Ok(v != 0),
            Value::Varchar(Some(v)) => <Self as AsValue>::parse(&v),
            Value::Blob(Some(v)) => <Self as AsValue>::parse(text(&v)?),
            other => Err(cannot_convert::<Self>(&other)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        match input.trim() {
            x if x.eq_ignore_ascii_case("true") || x.eq_ignore_ascii_case("t") || x == "1" => {
                Ok(true)
            }
            x if x.eq_ignore_ascii_case("false") || x.eq_ignore_ascii_case("f") || x == "0" => {
                Ok(false)
            }
            _ => Err(Error::msg(format!(
                "Cannot parse boolean from `{}`",
                truncate_long!(input)
            ))),
        }
    }
}

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path, $to_float:ident) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Float32(Some(v)) => Ok(v as _),
                    Value::Float64(Some(v)) => Ok(v as _),
                    Value::Int8(Some(v)) => Ok(v as _),
                    Value::Int16(Some(v)) => Ok(v as _),
                    Value::Int32(Some(v)) => Ok(v as _),
                    Value::Int64(Some(v)) => Ok(v as _),
                    Value::UInt8(Some(v)) => Ok(v as _),
                    Value::UInt16(Some(v)) => Ok(v as _),
                    Value::UInt32(Some(v)) => Ok(v as _),
                    Value::UInt64(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v)) => v.$to_float().ok_or(Error::msg(format!(
                        "Value {v}: Decimal does not fit into {}",
                        any::type_name::<Self>()
                    ))),
                    Value::Varchar(Some(v)) => <Self as AsValue>::parse(&v),
                    Value::Blob(Some(v)) => <Self as AsValue>::parse(text(&v)?),
                    other => Err(cannot_convert::<Self>(&other)),
                }
            }
            fn parse(input: &str) -> Result<Self> {
                input.trim().parse::<$source>().with_context(|| {
                    format!(
                        "Cannot extract a floating point value from `{}`",
                        truncate_long!(input)
                    )
                })
            }
        }
    };
}
impl_as_value_float!(f32, Value::Float32, to_f32);
impl_as_value_float!(f64, Value::Float64, to_f64);

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        let converted = match value {
            Value::Decimal(Some(v)) => return Ok(v),
            Value::Int8(Some(v)) => Decimal::from_i8(v),
            Value::Int16(Some(v)) => Decimal::from_i16(v),
            Value::Int32(Some(v)) => Decimal::from_i32(v),
            Value::Int64(Some(v)) => Decimal::from_i64(v),
            Value::UInt8(Some(v)) => Decimal::from_u8(v),
            Value::UInt16(Some(v)) => Decimal::from_u16(v),
            Value::UInt32(Some(v)) => Decimal::from_u32(v),
            Value::UInt64(Some(v)) => Decimal::from_u64(v),
            Value::Float32(Some(v)) => Decimal::from_f32(v),
            Value::Float64(Some(v)) => Decimal::from_f64(v),
            Value::Varchar(Some(v)) => return <Self as AsValue>::parse(&v),
            Value::Blob(Some(v)) => return <Self as AsValue>::parse(text(&v)?),
            other => return Err(cannot_convert::<Self>(&other)),
        };
        converted.ok_or(Error::msg("The value does not fit into a Decimal"))
    }
    fn parse(input: &str) -> Result<Self> {
        Decimal::from_str(input.trim())
            .with_context(|| format!("Cannot parse `{}` as Decimal", truncate_long!(input)))
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Blob(Some(v)) => Ok(text(&v)?.to_owned()),
            other if !other.is_null() => Ok(other.to_string()),
            other => Err(cannot_convert::<Self>(&other)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        Ok(input.to_owned())
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            other => Err(cannot_convert::<Self>(&other)),
        }
    }
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::TimestampWithTimezone(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(v)) => <Self as AsValue>::parse(&v),
            Value::Blob(Some(v)) => <Self as AsValue>::parse(text(&v)?),
            other => Err(cannot_convert::<Self>(&other)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        Date::parse(input.trim(), format_description!("[year]-[month]-[day]"))
            .with_context(|| format!("Cannot parse `{}` as Date", truncate_long!(input)))
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => <Self as AsValue>::parse(&v),
            Value::Blob(Some(v)) => <Self as AsValue>::parse(text(&v)?),
            other => Err(cannot_convert::<Self>(&other)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        Time::parse(
            input,
            format_description!("[hour]:[minute]:[second].[subsecond]"),
        )
        .or_else(|_| Time::parse(input, format_description!("[hour]:[minute]:[second]")))
        .with_context(|| format!("Cannot parse `{}` as Time", truncate_long!(input)))
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::TimestampWithTimezone(Some(v)) => {
                let v = v.to_offset(time::UtcOffset::UTC);
                Ok(PrimitiveDateTime::new(v.date(), v.time()))
            }
            Value::Date(Some(v)) => Ok(PrimitiveDateTime::new(v, Time::MIDNIGHT)),
            Value::Varchar(Some(v)) => <Self as AsValue>::parse(&v),
            Value::Blob(Some(v)) => <Self as AsValue>::parse(text(&v)?),
            other => Err(cannot_convert::<Self>(&other)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        PrimitiveDateTime::parse(
            input,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
        )
        .or_else(|_| {
            PrimitiveDateTime::parse(
                input,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            )
        })
        .or_else(|_| {
            PrimitiveDateTime::parse(
                input,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            )
        })
        .or_else(|_| Date::parse(input, format_description!("[year]-[month]-[day]")).map(|v| PrimitiveDateTime::new(v, Time::MIDNIGHT)))
        .with_context(|| format!("Cannot parse `{}` as a timestamp", truncate_long!(input)))
    }
}

impl AsValue for OffsetDateTime {
    fn as_empty_value() -> Value {
        Value::TimestampWithTimezone(None)
    }
    fn as_value(self) -> Value {
        Value::TimestampWithTimezone(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            Value::Varchar(Some(v)) => <Self as AsValue>::parse(&v),
            Value::Blob(Some(v)) => <Self as AsValue>::parse(text(&v)?),
            other => Err(cannot_convert::<Self>(&other)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        OffsetDateTime::parse(input, &Rfc3339)
            .or_else(|_| <PrimitiveDateTime as AsValue>::parse(input).map(PrimitiveDateTime::assume_utc))
            .with_context(|| {
                format!(
                    "Cannot parse `{}` as a timestamp with time zone",
                    truncate_long!(input)
                )
            })
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Blob(Some(v)) if v.len() == 16 => Ok(Uuid::from_slice(&v)?),
            Value::Varchar(Some(v)) => <Self as AsValue>::parse(&v),
            Value::Blob(Some(v)) => <Self as AsValue>::parse(text(&v)?),
            other => Err(cannot_convert::<Self>(&other)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        Uuid::parse_str(input.trim())
            .with_context(|| format!("Cannot parse `{}` as Uuid", truncate_long!(input)))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(T::try_from_value(value)?))
    }
    fn parse(input: &str) -> Result<Self> {
        if input.eq_ignore_ascii_case("null") {
            return Ok(None);
        }
        Ok(Some(T::parse(input)?))
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_empty_value() -> Value {
        Value::List(None, Box::new(T::as_empty_value()))
    }
    fn as_value(self) -> Value {
        Value::List(
            Some(self.into_iter().map(AsValue::as_value).collect()),
            Box::new(T::as_empty_value()),
        )
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(Some(v), ..) => v.into_iter().map(T::try_from_value).collect(),
            other => Err(cannot_convert::<Self>(&other)),
        }
    }
}
